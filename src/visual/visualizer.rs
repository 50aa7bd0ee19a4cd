//! Visualisation collaborator.
//!
//! The core never renders anything. It tells a [`Visualizer`] where the
//! nodes are and which colour each node should show from a given instant on.

use std::cell::RefCell;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};

use crate::topology::{Node, NodeId};

/// 8-bit RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// One colour change as issued by the core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorCommand {
    #[serde(with = "humantime_serde")]
    pub at: Duration,
    pub node: NodeId,
    pub color: Rgb,
}

/// Rendering engine as seen by the simulation core
pub trait Visualizer {
    /// Announce the node set and positions. Called once before the clock runs.
    fn describe_nodes(&mut self, _nodes: &[Node]) {}

    fn set_node_color(&mut self, at: Duration, node: NodeId, color: Rgb);

    /// Persist whatever was collected. Called once after the run.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Discards every command
#[derive(Debug, Default)]
pub struct NullVisualizer;

impl Visualizer for NullVisualizer {
    fn set_node_color(&mut self, _at: Duration, _node: NodeId, _color: Rgb) {}
}

/// Keeps colour commands in memory
///
/// Clones share the same command list, so a caller can keep one handle and
/// give the other to the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct RecordingVisualizer {
    commands: Rc<RefCell<Vec<ColorCommand>>>,
}

impl RecordingVisualizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<ColorCommand> {
        self.commands.borrow().clone()
    }

    /// Colour commands issued for `node`, in issue order
    pub fn commands_for(&self, node: NodeId) -> Vec<ColorCommand> {
        self.commands
            .borrow()
            .iter()
            .filter(|command| command.node == node)
            .cloned()
            .collect()
    }
}

impl Visualizer for RecordingVisualizer {
    fn set_node_color(&mut self, at: Duration, node: NodeId, color: Rgb) {
        self.commands.borrow_mut().push(ColorCommand { at, node, color });
    }
}

#[derive(Debug, Serialize)]
struct AnimationDocument<'a> {
    nodes: &'a [Node],
    commands: &'a [ColorCommand],
}

/// Writes node positions and colour commands as a JSON animation trace
#[derive(Debug)]
pub struct AnimationTrace {
    path: PathBuf,
    nodes: Vec<Node>,
    commands: Vec<ColorCommand>,
}

impl AnimationTrace {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            nodes: Vec::new(),
            commands: Vec::new(),
        }
    }
}

impl Visualizer for AnimationTrace {
    fn describe_nodes(&mut self, nodes: &[Node]) {
        self.nodes = nodes.to_vec();
    }

    fn set_node_color(&mut self, at: Duration, node: NodeId, color: Rgb) {
        self.commands.push(ColorCommand { at, node, color });
    }

    fn finish(&mut self) -> io::Result<()> {
        let document = AnimationDocument {
            nodes: &self.nodes,
            commands: &self.commands,
        };
        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, &document)?;
        writer.flush()?;
        info!(
            "Animation trace with {} colour commands written to {}",
            self.commands.len(),
            self.path.display()
        );
        Ok(())
    }
}

//! Visualisation: the rendering collaborator and transmission highlighting.

pub mod highlighter;
pub mod visualizer;

pub use highlighter::{role_color, AttackHighlighter, HighlightEvent, HighlightState, Reversion};
pub use visualizer::{AnimationTrace, ColorCommand, NullVisualizer, RecordingVisualizer, Rgb, Visualizer};

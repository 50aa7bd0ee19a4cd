//! Durable telemetry sinks.
//!
//! The CSV format matches what the plotting scripts of the reference
//! scenario read: a `Time (s),Node ID,Remaining Energy (J)` header and one
//! row per sample with three decimals.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::{info, warn};

use crate::telemetry::recorder::EnergySample;

pub const CSV_HEADER: &str = "Time (s),Node ID,Remaining Energy (J)";

/// Append-only destination of energy samples
pub trait TelemetrySink {
    /// Append one sample. Samples must be written in the order given.
    fn append(&mut self, sample: &EnergySample) -> io::Result<()>;

    /// Flush and release the sink. Further appends fail.
    fn close(&mut self) -> io::Result<()>;
}

/// Format one sample as a CSV row (without line terminator)
pub fn format_row(sample: &EnergySample) -> String {
    format!(
        "{:.3},{},{:.3}",
        sample.at.as_secs_f64(),
        sample.node,
        sample.remaining_joules
    )
}

/// CSV sink over any writer
///
/// The writer is flushed on drop, so samples already appended survive an
/// aborted run.
pub struct CsvTelemetrySink<W: Write> {
    writer: Option<BufWriter<W>>,
}

impl CsvTelemetrySink<File> {
    /// Create (truncate) `path` and write the header
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        info!("Telemetry sink opened at {}", path.display());
        Self::new(file)
    }
}

impl<W: Write> CsvTelemetrySink<W> {
    pub fn new(writer: W) -> io::Result<Self> {
        let mut writer = BufWriter::new(writer);
        writeln!(writer, "{}", CSV_HEADER)?;
        Ok(Self {
            writer: Some(writer),
        })
    }

    fn writer(&mut self) -> io::Result<&mut BufWriter<W>> {
        self.writer
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "telemetry sink is closed"))
    }
}

impl<W: Write> TelemetrySink for CsvTelemetrySink<W> {
    fn append(&mut self, sample: &EnergySample) -> io::Result<()> {
        let row = format_row(sample);
        writeln!(self.writer()?, "{}", row)
    }

    fn close(&mut self) -> io::Result<()> {
        match self.writer.take() {
            Some(mut writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

impl<W: Write> Drop for CsvTelemetrySink<W> {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                warn!("Failed to flush telemetry sink on drop: {}", e);
            }
        }
    }
}

/// Sink that accepts and forgets every sample
#[derive(Debug, Default)]
pub struct NullTelemetrySink;

impl TelemetrySink for NullTelemetrySink {
    fn append(&mut self, _sample: &EnergySample) -> io::Result<()> {
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

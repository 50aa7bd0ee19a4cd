//! Energy telemetry: the periodic recorder and the sinks it writes to.

pub mod recorder;
pub mod sink;

pub use recorder::{EnergySample, TelemetryRecorder};
pub use sink::{CsvTelemetrySink, NullTelemetrySink, TelemetrySink};

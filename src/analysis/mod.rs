//! Live audio analysis.
//!
//! Bridges the samples that reach the output device into two fixed-length
//! byte buffers per refresh: an oscilloscope snapshot and per-bin magnitudes.

pub mod buffer;
pub mod source;

pub use buffer::{AnalysisBuffer, SampleTap};
pub use source::{AnalyserSettings, AudioAnalysisSource};

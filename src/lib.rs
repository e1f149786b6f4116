//! Feature dataset construction for speech-emotion corpora.
//!
//! The pipeline scans a corpus of labeled WAV clips, decodes and
//! conditions each clip once, summarizes it into a fixed-order feature
//! vector, and joins the vectors onto the corpus metadata as flat CSV
//! tables ready for model training.

/// Per-clip decoding, conditioning, and feature extraction.
pub mod analysis;
/// Corpus scanning and dataset table construction.
pub mod dataset;
/// Tracing subscriber setup for the command-line tools.
pub mod logging;

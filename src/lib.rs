//! QBJ Exporter
//!
//! Converts a recorded quiz bowl match into a QBJ `Match` document, the
//! interchange format read by quiz bowl statistics tools.
//!
//! This library provides:
//! - `roster`: teams, players and starting lineups
//! - `reducer`: replays each question cycle into lineups, stats and notes
//! - `export`: assembles and serializes the document
//! - `stats`: box scores from an exported document
//!
//! Binaries:
//! - `qbj-export`: convert snapshots, batch convert, print box scores

pub mod export;
pub mod model;
pub mod pipeline;
pub mod qbj;
pub mod reducer;
pub mod roster;
pub mod stats;

pub use export::{export_match, to_qbj, ExportError, ExportOptions, ExportWarning, MatchExport};
pub use model::MatchSnapshot;
pub use qbj::Match;

//! linetrace - Line tracking across file revisions
//!
//! Maps every line of an old file revision onto a new revision through a
//! staged pipeline (exact alignment, fingerprint pruning, similarity scoring
//! with greedy matching, line-split detection), and uses that mapping to walk
//! a file's commit history back to the commit that introduced a line.

pub mod attribution;
pub mod blame;
pub mod cli;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod history;
pub mod matching;

pub use error::{LinetraceError, Result};
pub use matching::{track_lines, LineMapping, LineMatcher, LineSequence};

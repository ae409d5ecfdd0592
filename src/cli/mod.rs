//! CLI command definitions and parsing
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::error::{LinetraceError, Result};

#[derive(Parser, Debug)]
#[command(
    name = "linetrace",
    version,
    author = "neur0map",
    about = "Track source lines across file revisions and trace them back through history",
    long_about = "linetrace maps every line of an old file revision onto the new revision (exact, \
                  modified, split or deleted), walks a file's commit history to find the commit \
                  that introduced a line, and runs SZZ-style bug-inducing commit detection."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/linetrace/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Profile or operating mode to apply ("tracking", "attribution", "forced" or a
    /// profile from the config file)
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Map the lines of an old file revision onto a new one
    Diff {
        /// Old revision of the file
        old: PathBuf,

        /// New revision of the file
        new: PathBuf,

        /// Commit message; tags each mapped line with its bug potential
        #[arg(short, long)]
        message: Option<String>,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Find the commit that introduced each given line
    Blame {
        #[command(flatten)]
        history: HistoryArgs,

        /// Commit whose file content holds the lines (defaults to the newest)
        #[arg(long)]
        commit: Option<String>,

        /// 1-based line numbers, e.g. "3,7-9"
        #[arg(short, long)]
        lines: String,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Detect bug-fix commits and the commits that introduced the fixed lines
    Szz {
        #[command(flatten)]
        history: HistoryArgs,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Measure mapping accuracy against a ground-truth mapping
    Eval {
        /// Old revision of the file
        old: PathBuf,

        /// New revision of the file
        new: PathBuf,

        /// JSON object of old index -> expected new index (or null)
        truth: PathBuf,
    },

    /// Compare many file pairs listed in a JSON manifest
    Batch {
        /// Manifest: array of {"name", "old", "new", "truth"} entries
        manifest: PathBuf,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Where a commit history comes from
#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    /// JSON file with an array of commit records, oldest first
    #[arg(long, value_name = "FILE", conflicts_with = "repo", required_unless_present = "repo")]
    pub history: Option<PathBuf>,

    /// Git repository to read the history from
    #[arg(long, value_name = "DIR", requires = "path")]
    pub repo: Option<PathBuf>,

    /// File path inside the repository
    #[arg(long, requires = "repo")]
    pub path: Option<PathBuf>,

    /// Revision to start from
    #[arg(long, default_value = "HEAD")]
    pub rev: String,

    /// Stop after this many commits touching the file
    #[arg(long)]
    pub max_commits: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Show only a specific section
        #[arg(short, long, value_parser = ["matching", "attribution", "profiles"])]
        section: Option<String>,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// A 1-based line selection ("3", "1,4", "7-9") held as 0-based inclusive
/// ranges
///
/// Ranges stay unexpanded until the file length is known, so a huge upper
/// bound costs nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSpec {
    ranges: Vec<(usize, usize)>,
}

impl LineSpec {
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = || LinetraceError::InvalidLineSpec(spec.to_string());
        let parse_line = |s: &str| -> Result<usize> {
            match s.trim().parse::<usize>() {
                Ok(0) | Err(_) => Err(invalid()),
                Ok(n) => Ok(n - 1),
            }
        };

        let mut ranges = Vec::new();
        for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.split_once('-') {
                Some((start, end)) => {
                    let (start, end) = (parse_line(start)?, parse_line(end)?);
                    if start > end {
                        return Err(invalid());
                    }
                    ranges.push((start, end));
                }
                None => {
                    let line = parse_line(part)?;
                    ranges.push((line, line));
                }
            }
        }

        if ranges.is_empty() {
            return Err(invalid());
        }
        Ok(Self { ranges })
    }

    /// Sorted, distinct 0-based positions for a file of `line_count` lines
    ///
    /// Range ends are clamped to the last line (but never below the range
    /// start), so a range that starts past the end keeps just its first
    /// position and is reported as unknown by the tracer.
    pub fn positions(&self, line_count: usize) -> Vec<usize> {
        let last = line_count.saturating_sub(1);
        let mut positions: Vec<usize> = self
            .ranges
            .iter()
            .flat_map(|&(start, end)| start..=end.min(last).max(start))
            .collect();
        positions.sort_unstable();
        positions.dedup();
        positions
    }
}

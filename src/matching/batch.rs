// Batch comparison of many file pairs across the rayon pool
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::MatchingConfig;
use crate::error::{LinetraceError, Result};
use crate::matching::types::{LineMapping, LineSequence, MatchStats};
use crate::matching::LineMatcher;

/// Two revisions of one file, already split into lines
#[derive(Debug, Clone)]
pub struct FilePair {
    pub name: String,
    pub old: LineSequence,
    pub new: LineSequence,
}

impl FilePair {
    pub fn new(name: impl Into<String>, old_content: &str, new_content: &str) -> Self {
        Self {
            name: name.into(),
            old: LineSequence::from_content(old_content),
            new: LineSequence::from_content(new_content),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchResult {
    pub name: String,
    pub mapping: LineMapping,
    pub stats: MatchStats,
}

/// Compare every pair independently; results keep the input order
pub fn compare_all(pairs: &[FilePair], config: &MatchingConfig) -> Vec<BatchResult> {
    let matcher = LineMatcher::new(config.clone());

    pairs
        .par_iter()
        .map(|pair| {
            let (mapping, stats) = matcher.run(&pair.old, &pair.new);
            tracing::debug!(
                "batch: {} ({} exact, {} matched, {} split, {} deleted)",
                pair.name,
                stats.exact,
                stats.matched,
                stats.split,
                stats.deleted
            );
            BatchResult {
                name: pair.name.clone(),
                mapping,
                stats,
            }
        })
        .collect()
}

/// One line of a batch manifest
///
/// Relative paths are resolved against the manifest's directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(default)]
    pub name: Option<String>,
    pub old: PathBuf,
    pub new: PathBuf,
    /// Optional ground-truth mapping for accuracy evaluation
    #[serde(default)]
    pub truth: Option<PathBuf>,
}

impl ManifestEntry {
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.new.display().to_string())
    }
}

/// Load a JSON manifest (array of entries) and read every referenced file
///
/// # Returns
/// The manifest entries (paths made absolute) paired with loaded file pairs
pub fn load_manifest(path: &Path) -> Result<Vec<(ManifestEntry, FilePair)>> {
    let content = std::fs::read_to_string(path).map_err(|e| LinetraceError::Io {
        source: e,
        context: format!("Failed to read manifest: {:?}", path),
    })?;
    let entries: Vec<ManifestEntry> =
        serde_json::from_str(&content).map_err(|e| LinetraceError::Json {
            source: e,
            context: format!("Failed to parse manifest: {:?}", path),
        })?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    entries
        .into_iter()
        .map(|mut entry| {
            entry.old = base.join(&entry.old);
            entry.new = base.join(&entry.new);
            entry.truth = entry.truth.map(|t| base.join(t));

            let old = read_file(&entry.old)?;
            let new = read_file(&entry.new)?;
            let pair = FilePair::new(entry.display_name(), &old, &new);
            Ok((entry, pair))
        })
        .collect()
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| LinetraceError::Io {
        source: e,
        context: format!("Failed to read {:?}", path),
    })
}

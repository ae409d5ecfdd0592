// Bug attribution: commit intent, change risk and the SZZ-style driver that
// traces lines removed by bug fixes back to the commits that introduced them

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::blame::{BlameReport, BlameTracer};
use crate::config::{AttributionConfig, MatchingConfig};
use crate::error::{LinetraceError, Result};
use crate::history::CommitChain;
use crate::matching::{removed_lines, LineMapping};

/// What a commit message says the change is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommitIntent {
    BugFix,
    FeatureOrRefactor,
    Neutral,
}

impl fmt::Display for CommitIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitIntent::BugFix => write!(f, "BUG_FIX"),
            CommitIntent::FeatureOrRefactor => write!(f, "FEATURE_OR_REFACTOR"),
            CommitIntent::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Keyword-based commit message classifier
///
/// Keywords match case-insensitively at the start of a word, so "fix"
/// also catches "fixes" and "fixed". Bug-fix keywords win over feature
/// keywords.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    bug_fix: Option<Regex>,
    feature: Option<Regex>,
}

impl IntentClassifier {
    pub fn new(config: &AttributionConfig) -> Result<Self> {
        Ok(Self {
            bug_fix: keyword_pattern(&config.bug_fix_keywords)?,
            feature: keyword_pattern(&config.feature_keywords)?,
        })
    }

    pub fn classify(&self, message: &str) -> CommitIntent {
        let hit = |pattern: &Option<Regex>| pattern.as_ref().is_some_and(|re| re.is_match(message));

        if hit(&self.bug_fix) {
            CommitIntent::BugFix
        } else if hit(&self.feature) {
            CommitIntent::FeatureOrRefactor
        } else {
            CommitIntent::Neutral
        }
    }
}

fn keyword_pattern(keywords: &[String]) -> Result<Option<Regex>> {
    let alternatives: Vec<String> = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(regex::escape)
        .collect();
    if alternatives.is_empty() {
        return Ok(None);
    }

    let pattern = format!(r"(?i)\b(?:{})", alternatives.join("|"));
    Regex::new(&pattern)
        .map(Some)
        .map_err(|e| LinetraceError::Config(format!("Invalid keyword pattern: {}", e)))
}

/// Risk band of a mapped line, from its combined similarity score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeRisk {
    Low,
    Moderate,
    High,
}

impl ChangeRisk {
    pub fn from_score(score: f64) -> Self {
        if score > 0.9 {
            ChangeRisk::Low
        } else if score >= 0.5 {
            ChangeRisk::Moderate
        } else {
            ChangeRisk::High
        }
    }
}

/// Bug-potential tag attached to each mapped line in attribution mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BugPotential {
    NeutralChange,
    BugFix,
    BugIntroducingRiskModerate,
    BugIntroducingRiskHigh,
}

impl BugPotential {
    pub fn categorize(intent: CommitIntent, risk: ChangeRisk) -> Self {
        match (intent, risk) {
            (CommitIntent::BugFix, _) => BugPotential::BugFix,
            (CommitIntent::FeatureOrRefactor, ChangeRisk::Moderate) => {
                BugPotential::BugIntroducingRiskModerate
            }
            (CommitIntent::FeatureOrRefactor, ChangeRisk::High) => {
                BugPotential::BugIntroducingRiskHigh
            }
            _ => BugPotential::NeutralChange,
        }
    }
}

impl fmt::Display for BugPotential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BugPotential::NeutralChange => "NEUTRAL_CHANGE",
            BugPotential::BugFix => "BUG_FIX",
            BugPotential::BugIntroducingRiskModerate => "BUG_INTRODUCING_RISK_MODERATE",
            BugPotential::BugIntroducingRiskHigh => "BUG_INTRODUCING_RISK_HIGH",
        };
        write!(f, "{}", label)
    }
}

/// Tag every mapped old line of a commit; deleted lines carry no tag
pub fn classify_mapping(mapping: &LineMapping, intent: CommitIntent) -> BTreeMap<usize, BugPotential> {
    mapping
        .iter()
        .filter_map(|(old, entry)| {
            entry.map(|m| (old, BugPotential::categorize(intent, ChangeRisk::from_score(m.score))))
        })
        .collect()
}

/// Analysis of one bug-fix commit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixAnalysis {
    pub commit: String,
    pub message: String,
    /// Pre-image positions the fix removed or rewrote
    pub removed_lines: Vec<usize>,
    /// Blame of the removed lines from the fix's parent; absent when there
    /// is nothing to trace
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blame: Option<BlameReport>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SzzReport {
    pub fixes: Vec<FixAnalysis>,
    pub bug_inducing: BTreeSet<String>,
}

/// SZZ-style driver over a linear commit chain
pub struct BugIdentifier {
    classifier: IntentClassifier,
    tracer: BlameTracer,
}

impl BugIdentifier {
    /// # Arguments
    /// * `matching` - Matching settings for every blame step
    /// * `attribution` - Keyword lists and the blame depth bound
    pub fn new(matching: MatchingConfig, attribution: &AttributionConfig) -> Result<Self> {
        Ok(Self {
            classifier: IntentClassifier::new(attribution)?,
            tracer: BlameTracer::new(matching).with_max_depth(attribution.max_depth),
        })
    }

    pub fn identify(&self, chain: &CommitChain) -> Result<SzzReport> {
        let mut report = SzzReport::default();

        for commit in chain.commits() {
            if self.classifier.classify(&commit.message) != CommitIntent::BugFix {
                continue;
            }
            tracing::info!("Fix commit found: {} ({})", commit.id, commit.message);

            let removed = removed_lines(commit.before_lines().lines(), commit.after_lines().lines());
            let blame = match (&commit.parent, removed.is_empty()) {
                (_, true) => {
                    tracing::debug!("Fix {} removes no lines, nothing to trace", commit.id);
                    None
                }
                (None, false) => {
                    tracing::warn!("Fix {} has no parent, skipping", commit.id);
                    None
                }
                (Some(parent), false) if chain.get(parent).is_none() => {
                    tracing::warn!("Parent {} of fix {} not in history, skipping", parent, commit.id);
                    None
                }
                (Some(parent), false) => Some(self.tracer.trace(chain, parent, &removed)?),
            };

            if let Some(blame) = &blame {
                report.bug_inducing.extend(blame.bug_inducing_commits());
            }
            report.fixes.push(FixAnalysis {
                commit: commit.id.clone(),
                message: commit.message.clone(),
                removed_lines: removed,
                blame,
            });
        }

        tracing::info!(
            "{} fix commits, {} bug-inducing commits",
            report.fixes.len(),
            report.bug_inducing.len()
        );
        Ok(report)
    }
}

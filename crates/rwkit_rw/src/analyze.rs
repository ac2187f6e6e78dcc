//! Aggregate statistics over the entries of an archive.

use std::collections::BTreeMap;

use tracing::{debug, instrument, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::detect::{classify, DetectionResult, FileFormat};
use crate::error::Result;
use crate::version::GameLabel;

/// An entry that could not be analyzed
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntryError {
    pub name: String,
    pub reason: String,
}

/// Statistics for one pass over a collection of entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ArchiveSummary {
    /// Every entry seen, including the ones that errored
    pub total_entries: usize,
    pub counts_by_format: BTreeMap<FileFormat, usize>,
    pub counts_by_game: BTreeMap<GameLabel, usize>,
    /// Keyed by the dotted version string
    pub counts_by_version: BTreeMap<String, usize>,
    /// Entries only recognized through their extension
    pub filename_fallbacks: usize,
    pub errored: usize,
    /// Sorted by entry name
    pub errors: Vec<EntryError>,
}

impl ArchiveSummary {
    /// Entries that produced a detection result
    pub fn analyzed(&self) -> usize {
        self.total_entries - self.errored
    }

    /// Entries detected as DFF, TXD or COL
    pub fn renderware_entries(&self) -> usize {
        self.counts_by_format
            .iter()
            .filter(|(format, _)| format.is_renderware())
            .map(|(_, count)| count)
            .sum()
    }

    pub fn count_for_format(&self, format: FileFormat) -> usize {
        self.counts_by_format.get(&format).copied().unwrap_or(0)
    }

    pub fn count_for_game(&self, game: GameLabel) -> usize {
        self.counts_by_game.get(&game).copied().unwrap_or(0)
    }
}

/// Accumulates detection results into an [`ArchiveSummary`]
///
/// Analyzers fed with disjoint entries can be combined with
/// [`ArchiveAnalyzer::merge`], the result does not depend on the order entries
/// were added in.
#[derive(Debug, Clone, Default)]
pub struct ArchiveAnalyzer {
    summary: ArchiveSummary,
}

impl ArchiveAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify one entry and record the outcome.
    pub fn add(&mut self, name: &str, data: &[u8]) -> Option<DetectionResult> {
        let result = classify(data, Some(name));
        self.record(name, &result);
        result.ok()
    }

    /// Record the outcome of a classification made elsewhere.
    pub fn record(&mut self, name: &str, result: &Result<DetectionResult>) {
        match result {
            Ok(detection) => {
                let summary = &mut self.summary;
                summary.total_entries += 1;
                *summary.counts_by_format.entry(detection.format).or_default() += 1;
                if let Some(game) = detection.game {
                    *summary.counts_by_game.entry(game).or_default() += 1;
                }
                if let Some(version) = &detection.version {
                    *summary
                        .counts_by_version
                        .entry(version.version_string())
                        .or_default() += 1;
                }
                if !detection.is_confident() {
                    summary.filename_fallbacks += 1;
                }
            }
            Err(err) => self.record_error(name, err),
        }
    }

    /// Record an entry that could not be analyzed, e.g. because it could not be read.
    pub fn record_error(&mut self, name: &str, reason: impl ToString) {
        let reason = reason.to_string();
        debug!(name, %reason, "entry errored");

        self.summary.total_entries += 1;
        self.summary.errored += 1;
        self.summary.errors.push(EntryError {
            name: name.to_owned(),
            reason,
        });
    }

    /// Fold the counts of another analyzer into this one
    pub fn merge(&mut self, other: ArchiveAnalyzer) {
        let other = other.summary;
        let summary = &mut self.summary;

        summary.total_entries += other.total_entries;
        summary.filename_fallbacks += other.filename_fallbacks;
        summary.errored += other.errored;
        summary.errors.extend(other.errors);
        for (format, count) in other.counts_by_format {
            *summary.counts_by_format.entry(format).or_default() += count;
        }
        for (game, count) in other.counts_by_game {
            *summary.counts_by_game.entry(game).or_default() += count;
        }
        for (version, count) in other.counts_by_version {
            *summary.counts_by_version.entry(version).or_default() += count;
        }
    }

    pub fn finish(self) -> ArchiveSummary {
        let mut summary = self.summary;
        summary.errors.sort();
        if summary.errored > 0 {
            warn!(
                errored = summary.errored,
                total = summary.total_entries,
                "some entries could not be analyzed"
            );
        }
        summary
    }
}

/// Classify every entry and summarize the results.
///
/// ```
/// use rwkit_rw::{analyze_archive, FileFormat};
///
/// let entries = [("a.col", b"COL3".to_vec()), ("b.dff", Vec::new())];
/// let summary = analyze_archive(entries);
///
/// assert_eq!(summary.total_entries, 2);
/// assert_eq!(summary.count_for_format(FileFormat::Col3), 1);
/// assert_eq!(summary.errored, 1);
/// ```
#[instrument(skip(entries))]
pub fn analyze_archive<I, N, B>(entries: I) -> ArchiveSummary
where
    I: IntoIterator<Item = (N, B)>,
    N: AsRef<str>,
    B: AsRef<[u8]>,
{
    let mut analyzer = ArchiveAnalyzer::new();
    for (name, data) in entries {
        analyzer.add(name.as_ref(), data.as_ref());
    }
    analyzer.finish()
}

/// Like [`analyze_archive`], classifying entries on the rayon thread pool.
#[cfg(feature = "rayon")]
#[instrument(skip(entries), fields(entries = entries.len()))]
pub fn analyze_archive_par<N, B>(entries: &[(N, B)]) -> ArchiveSummary
where
    N: AsRef<str> + Sync,
    B: AsRef<[u8]> + Sync,
{
    use rayon::prelude::*;

    entries
        .par_iter()
        .fold(ArchiveAnalyzer::new, |mut analyzer, (name, data)| {
            analyzer.add(name.as_ref(), data.as_ref());
            analyzer
        })
        .reduce(ArchiveAnalyzer::new, |mut left, right| {
            left.merge(right);
            left
        })
        .finish()
}

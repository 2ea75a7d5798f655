//! Running a whole modification payload against a document.

use crate::apply::{ChangeApplier, ChangeOutcome};
use crate::change::{Change, ModificationRequest, SlideModification, TargetType};
use crate::settings::StyleSettings;
use crate::style::StyleNormalizer;
use crate::types::Document;
use crate::Result;
use serde::Serialize;

/// Summary of one modification run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModificationReport {
    /// Changes that rewrote, inserted or removed something.
    pub applied: usize,
    /// Changes that had no effect.
    pub skipped: usize,
    /// 1-based numbers of slides with at least one applied change.
    pub slides_touched: Vec<usize>,
    /// Whether the style normalization pass ran.
    pub style_applied: bool,
}

impl ModificationReport {
    fn record(&mut self, slide: usize, outcome: ChangeOutcome) {
        if outcome.is_applied() {
            self.applied += 1;
            if !self.slides_touched.contains(&slide) {
                self.slides_touched.push(slide);
            }
        } else {
            self.skipped += 1;
        }
    }
}

/// Apply every entry of `request` to `document`, then normalize style once.
///
/// Style settings are merged and validated before the first mutation, so
/// an invalid payload leaves the document untouched.
pub fn apply_modifications(
    document: &mut Document,
    request: &ModificationRequest,
) -> Result<ModificationReport> {
    let settings = StyleSettings::merged(request.style_overrides())?;
    let mut report = ModificationReport::default();

    let mut entries: Vec<&SlideModification> = request
        .entries
        .iter()
        .filter(|entry| entry.target_type != TargetType::Style)
        .collect();
    entries.sort_by_key(|entry| entry.slide_index.unwrap_or(0));

    for entry in &request.entries {
        if entry.target_type != TargetType::Style {
            continue;
        }
        for change in &entry.changes {
            if !matches!(change, Change::NormalizeStyle(_)) {
                log::warn!("Ignoring {} in a style entry", change.name());
                report.skipped += 1;
            }
        }
    }

    let total = document.slides.len();
    for entry in entries {
        let number = entry
            .slide_index
            .filter(|&n| n >= 1)
            .and_then(|n| usize::try_from(n).ok())
            .filter(|&n| n <= total);
        let Some(number) = number else {
            log::warn!(
                "Skipping {} change(s) for invalid slide index {:?} (deck has {} slides)",
                entry.changes.len(),
                entry.slide_index,
                total
            );
            report.skipped += entry.changes.len();
            continue;
        };
        let Some(slide) = document.slide_mut(number) else {
            report.skipped += entry.changes.len();
            continue;
        };

        let outcomes = ChangeApplier::new(slide).apply_all(entry.target_type, &entry.changes);
        for outcome in outcomes {
            report.record(number, outcome);
        }
    }

    report.style_applied = StyleNormalizer::new(settings).normalize(document);
    report.slides_touched.sort_unstable();

    log::info!(
        "Applied {} change(s), skipped {}, touched slides {:?}, style {}",
        report.applied,
        report.skipped,
        report.slides_touched,
        if report.style_applied { "normalized" } else { "unchanged" }
    );
    Ok(report)
}

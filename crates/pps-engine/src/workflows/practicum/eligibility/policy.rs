use serde::{Deserialize, Serialize};

use super::super::canonical::SpecialtyArea;
use super::super::ledger::LedgerTotals;
use super::config::EligibilityConfig;

/// Reason a student cannot be accredited yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum GraduationBlocker {
    InsufficientTotalHours {
        required: u32,
        actual: u32,
    },
    InsufficientSpecialtyHours {
        specialty: Option<SpecialtyArea>,
        required: u32,
        actual: u32,
    },
    InsufficientRotation {
        required: usize,
        actual: usize,
    },
    ActivePractice,
    UngradedReports,
}

impl GraduationBlocker {
    pub fn summary(&self) -> String {
        match self {
            GraduationBlocker::InsufficientTotalHours { required, actual } => format!(
                "{} of {required} total hours ({} remaining)",
                actual,
                required.saturating_sub(*actual)
            ),
            GraduationBlocker::InsufficientSpecialtyHours {
                specialty: Some(area),
                required,
                actual,
            } => format!("{actual} of {required} hours in {area}"),
            GraduationBlocker::InsufficientSpecialtyHours {
                specialty: None,
                required,
                ..
            } => format!("no specialty chosen ({required} specialty hours required)"),
            GraduationBlocker::InsufficientRotation { required, actual } => {
                format!("{actual} of {required} rotation areas covered")
            }
            GraduationBlocker::ActivePractice => {
                "a practice is still in progress or pending".to_string()
            }
            GraduationBlocker::UngradedReports => {
                "a submitted report is awaiting a grade".to_string()
            }
        }
    }
}

// An empty ledger meets nothing, even against zero thresholds.
pub(crate) fn meets_total_hours(totals: &LedgerTotals, config: &EligibilityConfig) -> bool {
    totals.practice_count > 0 && totals.total_hours >= config.hours_total_required
}

pub(crate) fn meets_specialty_hours(totals: &LedgerTotals, config: &EligibilityConfig) -> bool {
    totals.practice_count > 0 && totals.specialty_hours >= config.hours_specialty_required
}

pub(crate) fn meets_rotation(totals: &LedgerTotals, config: &EligibilityConfig) -> bool {
    totals.practice_count > 0 && totals.unique_areas_count() >= config.rotation_areas_required
}

pub(crate) fn collect_blockers(
    totals: &LedgerTotals,
    chosen: Option<&SpecialtyArea>,
    config: &EligibilityConfig,
) -> Vec<GraduationBlocker> {
    let mut blockers = Vec::new();

    if !meets_total_hours(totals, config) {
        blockers.push(GraduationBlocker::InsufficientTotalHours {
            required: config.hours_total_required,
            actual: totals.total_hours,
        });
    }

    if !meets_specialty_hours(totals, config) {
        blockers.push(GraduationBlocker::InsufficientSpecialtyHours {
            specialty: chosen.cloned(),
            required: config.hours_specialty_required,
            actual: totals.specialty_hours,
        });
    }

    if !meets_rotation(totals, config) {
        blockers.push(GraduationBlocker::InsufficientRotation {
            required: config.rotation_areas_required,
            actual: totals.unique_areas_count(),
        });
    }

    if totals.has_blocking_active_practice {
        blockers.push(GraduationBlocker::ActivePractice);
    }

    if config.require_graded_reports && totals.has_ungraded_reports {
        blockers.push(GraduationBlocker::UngradedReports);
    }

    blockers
}

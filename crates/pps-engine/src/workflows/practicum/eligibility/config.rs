use serde::{Deserialize, Serialize};

pub const DEFAULT_HOURS_TOTAL_REQUIRED: u32 = 250;
pub const DEFAULT_HOURS_SPECIALTY_REQUIRED: u32 = 70;
pub const DEFAULT_ROTATION_AREAS_REQUIRED: usize = 3;

/// Thresholds a student's ledger must reach before accreditation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityConfig {
    pub hours_total_required: u32,
    pub hours_specialty_required: u32,
    pub rotation_areas_required: usize,
    /// Also block accreditation while a submitted report awaits a grade.
    #[serde(default)]
    pub require_graded_reports: bool,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            hours_total_required: DEFAULT_HOURS_TOTAL_REQUIRED,
            hours_specialty_required: DEFAULT_HOURS_SPECIALTY_REQUIRED,
            rotation_areas_required: DEFAULT_ROTATION_AREAS_REQUIRED,
            require_graded_reports: false,
        }
    }
}

mod config;
mod policy;

pub use config::{
    EligibilityConfig, DEFAULT_HOURS_SPECIALTY_REQUIRED, DEFAULT_HOURS_TOTAL_REQUIRED,
    DEFAULT_ROTATION_AREAS_REQUIRED,
};
pub use policy::GraduationBlocker;

use serde::{Deserialize, Serialize};

use super::canonical::SpecialtyArea;
use super::domain::PracticeRecord;
use super::ledger;
use policy::{collect_blockers, meets_rotation, meets_specialty_hours, meets_total_hours};

/// Stateless evaluator that applies the accreditation thresholds to a ledger.
#[derive(Debug, Clone, Default)]
pub struct EligibilityEvaluator {
    config: EligibilityConfig,
}

impl EligibilityEvaluator {
    pub fn new(config: EligibilityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EligibilityConfig {
        &self.config
    }

    pub fn evaluate(
        &self,
        records: &[PracticeRecord],
        chosen: Option<&SpecialtyArea>,
    ) -> EligibilityCriteria {
        let totals = ledger::aggregate(records, chosen);
        let blockers = collect_blockers(&totals, chosen, &self.config);

        EligibilityCriteria {
            total_hours: totals.total_hours,
            remaining_total_hours: self
                .config
                .hours_total_required
                .saturating_sub(totals.total_hours),
            meets_total_hours: meets_total_hours(&totals, &self.config),
            specialty: chosen.cloned(),
            specialty_hours: totals.specialty_hours,
            remaining_specialty_hours: self
                .config
                .hours_specialty_required
                .saturating_sub(totals.specialty_hours),
            meets_specialty_hours: meets_specialty_hours(&totals, &self.config),
            unique_areas_count: totals.unique_areas_count(),
            meets_rotation: meets_rotation(&totals, &self.config),
            has_blocking_active_practice: totals.has_blocking_active_practice,
            has_ungraded_reports: totals.has_ungraded_reports,
            can_graduate: blockers.is_empty(),
            unique_areas: totals.unique_areas.into_iter().collect(),
            blockers,
        }
    }
}

/// Derived accreditation criteria. Never persisted; rebuilt from the ledger on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityCriteria {
    pub total_hours: u32,
    pub remaining_total_hours: u32,
    pub meets_total_hours: bool,
    pub specialty: Option<SpecialtyArea>,
    pub specialty_hours: u32,
    pub remaining_specialty_hours: u32,
    pub meets_specialty_hours: bool,
    pub unique_areas: Vec<SpecialtyArea>,
    pub unique_areas_count: usize,
    pub meets_rotation: bool,
    pub has_blocking_active_practice: bool,
    pub has_ungraded_reports: bool,
    pub can_graduate: bool,
    pub blockers: Vec<GraduationBlocker>,
}

impl EligibilityCriteria {
    pub fn summary(&self) -> String {
        if self.can_graduate {
            return "eligible for accreditation".to_string();
        }
        let reasons: Vec<String> = self.blockers.iter().map(GraduationBlocker::summary).collect();
        format!("not yet eligible: {}", reasons.join("; "))
    }
}

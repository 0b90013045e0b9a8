//! Reduction of a student's practice records into the totals used by eligibility and scoring.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::canonical::SpecialtyArea;
use super::domain::{PracticeId, PracticeRecord, PracticeStatus, ReportGrade};

/// Aggregate view over one student's ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTotals {
    pub total_hours: u32,
    pub specialty_hours: u32,
    pub unique_areas: BTreeSet<SpecialtyArea>,
    pub has_blocking_active_practice: bool,
    pub has_ungraded_reports: bool,
    pub practice_count: usize,
}

impl LedgerTotals {
    pub fn unique_areas_count(&self) -> usize {
        self.unique_areas.len()
    }
}

pub fn total_hours(records: &[PracticeRecord]) -> u32 {
    records
        .iter()
        .fold(0u32, |acc, record| acc.saturating_add(record.hours_completed))
}

/// Hours logged in the chosen area; zero when no area was chosen.
pub fn specialty_hours(records: &[PracticeRecord], chosen: Option<&SpecialtyArea>) -> u32 {
    let Some(chosen) = chosen else {
        return 0;
    };

    records
        .iter()
        .filter(|record| record.specialty.as_ref() == Some(chosen))
        .fold(0u32, |acc, record| acc.saturating_add(record.hours_completed))
}

pub fn unique_areas(records: &[PracticeRecord]) -> BTreeSet<SpecialtyArea> {
    records
        .iter()
        .filter_map(|record| record.specialty.clone())
        .collect()
}

pub fn has_blocking_active_practice(records: &[PracticeRecord]) -> bool {
    records.iter().any(|record| record.status.is_active())
}

pub fn has_ungraded_reports(records: &[PracticeRecord]) -> bool {
    records
        .iter()
        .any(|record| record.report == ReportGrade::SubmittedUngraded)
}

pub fn aggregate(records: &[PracticeRecord], chosen: Option<&SpecialtyArea>) -> LedgerTotals {
    LedgerTotals {
        total_hours: total_hours(records),
        specialty_hours: specialty_hours(records, chosen),
        unique_areas: unique_areas(records),
        has_blocking_active_practice: has_blocking_active_practice(records),
        has_ungraded_reports: has_ungraded_reports(records),
        practice_count: records.len(),
    }
}

/// Ids of in-progress practices whose end date is before `today`.
pub fn overdue_practices(records: &[PracticeRecord], today: NaiveDate) -> Vec<PracticeId> {
    records
        .iter()
        .filter(|record| record.is_overdue(today))
        .map(|record| record.id.clone())
        .collect()
}

/// Apply the automatic InProgress -> Finished transition in place, returning touched ids.
pub fn finish_overdue(records: &mut [PracticeRecord], today: NaiveDate) -> Vec<PracticeId> {
    let mut finished = Vec::new();
    for record in records.iter_mut().filter(|record| record.is_overdue(today)) {
        record.status = PracticeStatus::Finished;
        finished.push(record.id.clone());
    }
    finished
}

//! Ordering of scored applicants for a single opening.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::domain::{EnrollmentId, EnrollmentStatus, OpeningId, OpeningStatus, StudentId};
use super::scoring::ScoreBreakdown;

/// One applicant after scoring, before or after ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub enrollment_id: EnrollmentId,
    pub student_id: StudentId,
    pub student_name: String,
    pub score: i32,
    pub total_hours: u32,
    pub penalty_points: u32,
    pub works: bool,
    pub status: EnrollmentStatus,
    /// 1-based position; zero until `rank_candidates` runs.
    pub rank: usize,
    pub within_capacity: bool,
    pub breakdown: ScoreBreakdown,
}

/// Score descending, then hours descending, then student and enrollment ids ascending.
pub fn compare_candidates(left: &RankedCandidate, right: &RankedCandidate) -> Ordering {
    right
        .score
        .cmp(&left.score)
        .then_with(|| right.total_hours.cmp(&left.total_hours))
        .then_with(|| left.student_id.cmp(&right.student_id))
        .then_with(|| left.enrollment_id.cmp(&right.enrollment_id))
}

/// Sort candidates and assign ranks plus the capacity cut-off marker.
pub fn rank_candidates(mut candidates: Vec<RankedCandidate>, capacity: u32) -> Vec<RankedCandidate> {
    candidates.sort_by(compare_candidates);
    let capacity = usize::try_from(capacity).unwrap_or(usize::MAX);
    for (index, candidate) in candidates.iter_mut().enumerate() {
        candidate.rank = index + 1;
        candidate.within_capacity = index < capacity;
    }
    candidates
}

/// Ranked applicant list for one opening, as shown to staff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingView {
    pub opening_id: OpeningId,
    pub opening_name: String,
    pub opening_status: OpeningStatus,
    pub capacity: u32,
    pub selected_count: usize,
    pub excluded_enrollments: Vec<EnrollmentId>,
    pub candidates: Vec<RankedCandidate>,
}

mod config;
mod rules;

pub use config::ScoreWeights;
pub use rules::ScoringInput;

use serde::{Deserialize, Serialize};

use super::domain::{EnrollmentId, EnrollmentRecord};

/// Stateless scorer applying the configured weights to one applicant.
#[derive(Debug, Clone, Default)]
pub struct CandidateScorer {
    weights: ScoreWeights,
}

impl CandidateScorer {
    pub fn new(weights: ScoreWeights) -> Self {
        Self {
            weights: sanitize(weights),
        }
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    pub fn score(&self, input: &ScoringInput<'_>) -> ScoreBreakdown {
        let (components, total) = rules::score_candidate(input, &self.weights);
        ScoreBreakdown { total, components }
    }

    /// Score an enrollment given the student's whole-ledger hours and accumulated penalties.
    pub fn score_enrollment(
        &self,
        enrollment: &EnrollmentRecord,
        total_hours: u32,
        penalty_points: u32,
        works: bool,
    ) -> ScoredEnrollment {
        let breakdown = self.score(&ScoringInput {
            standing: &enrollment.standing,
            total_hours,
            penalty_points,
            works,
        });

        ScoredEnrollment {
            enrollment_id: enrollment.id.clone(),
            score: breakdown.total,
            breakdown,
        }
    }
}

// Negative or non-finite hour weights would break monotonicity in hours.
fn sanitize(mut weights: ScoreWeights) -> ScoreWeights {
    let defaults = ScoreWeights::default();
    if !weights.per_hour.is_finite() || weights.per_hour < 0.0 {
        weights.per_hour = defaults.per_hour;
    }
    for weight in [
        &mut weights.finished_coursework,
        &mut weights.taking_electives,
        &mut weights.owes_finals,
    ] {
        if !weight.is_finite() {
            *weight = 0.0;
        }
    }
    weights.works_bonus = weights.works_bonus.filter(|bonus| bonus.is_finite());
    weights
}

/// Rubric factor contributing to a candidate score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFactor {
    AcademicStanding,
    AccumulatedHours,
    Employment,
    Penalties,
}

/// Discrete contribution to a score, kept so rankings can be audited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: ScoreFactor,
    pub points: f64,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub total: i32,
    pub components: Vec<ScoreComponent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEnrollment {
    pub enrollment_id: EnrollmentId,
    pub score: i32,
    pub breakdown: ScoreBreakdown,
}

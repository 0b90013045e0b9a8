use super::super::domain::AcademicStanding;
use super::config::ScoreWeights;
use super::{ScoreComponent, ScoreFactor};

/// Raw facts about one applicant that feed the rubric.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    pub standing: &'a AcademicStanding,
    pub total_hours: u32,
    pub penalty_points: u32,
    pub works: bool,
}

pub(crate) fn score_candidate(
    input: &ScoringInput<'_>,
    weights: &ScoreWeights,
) -> (Vec<ScoreComponent>, i32) {
    let mut components = Vec::new();

    let standing = input.standing;
    let academic = if standing.finished_coursework {
        ScoreComponent {
            factor: ScoreFactor::AcademicStanding,
            points: weights.finished_coursework,
            notes: "coursework finished".to_string(),
        }
    } else if standing.taking_electives {
        ScoreComponent {
            factor: ScoreFactor::AcademicStanding,
            points: weights.taking_electives,
            notes: "taking electives".to_string(),
        }
    } else {
        let owes = standing.owes_finals.trim();
        ScoreComponent {
            factor: ScoreFactor::AcademicStanding,
            points: weights.owes_finals,
            notes: if owes.is_empty() {
                "owes finals".to_string()
            } else {
                format!("owes finals: {owes}")
            },
        }
    };
    components.push(academic);

    components.push(ScoreComponent {
        factor: ScoreFactor::AccumulatedHours,
        points: f64::from(input.total_hours) * weights.per_hour,
        notes: format!("{} practicum hours logged", input.total_hours),
    });

    if let (true, Some(bonus)) = (input.works, weights.works_bonus) {
        components.push(ScoreComponent {
            factor: ScoreFactor::Employment,
            points: bonus,
            notes: "applicant works".to_string(),
        });
    }

    if input.penalty_points > 0 {
        components.push(ScoreComponent {
            factor: ScoreFactor::Penalties,
            points: -f64::from(input.penalty_points),
            notes: format!("{} penalty points", input.penalty_points),
        });
    }

    let raw: f64 = components.iter().map(|component| component.points).sum();
    (components, round_half_up(raw))
}

// Halves round toward positive infinity, so -2.5 becomes -2.
fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

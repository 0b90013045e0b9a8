use serde::{Deserialize, Serialize};

/// Additive weights used to rank applicants to an opening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub finished_coursework: f64,
    pub taking_electives: f64,
    pub owes_finals: f64,
    pub per_hour: f64,
    /// Bonus for applicants who work; disabled unless configured.
    #[serde(default)]
    pub works_bonus: Option<f64>,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            finished_coursework: 100.0,
            taking_electives: 50.0,
            owes_finals: 30.0,
            per_hour: 0.5,
            works_bonus: None,
        }
    }
}

//! Practicum (PPS) eligibility evaluation and candidate selection.
//!
//! Pure evaluation lives in `ledger`, `eligibility`, `scoring`, and `ranking`. The
//! `service` module drives the selection state machine of an opening against the store
//! and notifier traits declared in `repository`; `router` exposes it over HTTP.

pub mod cache;
pub mod canonical;
pub mod domain;
pub mod eligibility;
pub mod ledger;
pub mod ranking;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use canonical::{canonicalize, SpecialtyArea};
pub use domain::{
    AcademicStanding, EnrollmentId, EnrollmentRecord, EnrollmentStatus, Opening, OpeningId,
    OpeningStatus, PenaltyRecord, PracticeId, PracticeRecord, PracticeStatus, PracticeUpdate,
    ReportGrade, StudentId, StudentProfile,
};
pub use eligibility::{
    EligibilityConfig, EligibilityCriteria, EligibilityEvaluator, GraduationBlocker,
};
pub use ranking::{rank_candidates, RankedCandidate, RankingView};
pub use repository::{
    EnrollmentStore, LedgerStore, NotificationError, OpeningStore, PenaltyStore,
    PracticumRepository, RepositoryError, SelectionNotice, SelectionNotifier, StudentDirectory,
};
pub use router::practicum_router;
pub use scoring::{CandidateScorer, ScoreBreakdown, ScoreComponent, ScoreFactor, ScoreWeights};
pub use service::{
    CandidateOutcome, CloseReport, EligibilityReport, LedgerOutcome, LedgerSync,
    NotificationOutcome, SelectionChange, SelectionService, SelectionServiceError,
};

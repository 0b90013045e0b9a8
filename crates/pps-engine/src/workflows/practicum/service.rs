use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::{resolve_thresholds, AcademicConfig, ThresholdProvider};

use super::cache::ReadThroughCache;
use super::domain::{
    total_penalty_points, EnrollmentId, EnrollmentRecord, EnrollmentStatus, Opening, OpeningId,
    OpeningStatus, PracticeId, PracticeRecord, PracticeStatus, PracticeUpdate, ReportGrade,
    StudentId,
};
use super::eligibility::{EligibilityCriteria, EligibilityEvaluator};
use super::ledger;
use super::ranking::{rank_candidates, RankedCandidate, RankingView};
use super::repository::{
    PracticumRepository, RepositoryError, SelectionNotice, SelectionNotifier,
};
use super::scoring::CandidateScorer;

const UNCONFIRMED_SCHEDULE: &str = "to be confirmed";

/// Service composing the stores, the eligibility evaluator, and the candidate scorer.
///
/// Ledgers are cached per student and enrollment lists per opening. Every write performed
/// here invalidates the affected entries.
pub struct SelectionService<R, N> {
    repository: Arc<R>,
    notifier: Arc<N>,
    evaluator: Arc<EligibilityEvaluator>,
    scorer: Arc<CandidateScorer>,
    ledgers: ReadThroughCache<StudentId, Vec<PracticeRecord>>,
    enrollments: ReadThroughCache<OpeningId, Vec<EnrollmentRecord>>,
}

fn new_practice_id() -> PracticeId {
    PracticeId(format!("pps-{}", Uuid::new_v4()))
}

impl<R, N> SelectionService<R, N>
where
    R: PracticumRepository + 'static,
    N: SelectionNotifier + 'static,
{
    pub fn new(repository: Arc<R>, notifier: Arc<N>, config: AcademicConfig) -> Self {
        Self {
            repository,
            notifier,
            evaluator: Arc::new(EligibilityEvaluator::new(config.eligibility)),
            scorer: Arc::new(CandidateScorer::new(config.weights)),
            ledgers: ReadThroughCache::new(),
            enrollments: ReadThroughCache::new(),
        }
    }

    /// Build the service from a provider, using default thresholds when it has none.
    pub fn from_provider(
        repository: Arc<R>,
        notifier: Arc<N>,
        provider: &dyn ThresholdProvider,
    ) -> Self {
        Self::new(repository, notifier, resolve_thresholds(provider))
    }

    pub fn evaluator(&self) -> &EligibilityEvaluator {
        &self.evaluator
    }

    pub fn scorer(&self) -> &CandidateScorer {
        &self.scorer
    }

    /// Drop the cached ledger of a student after an external write.
    pub fn invalidate_student(&self, student_id: &StudentId) {
        self.ledgers.invalidate(student_id);
    }

    /// Drop the cached enrollment list of an opening after an external write.
    pub fn invalidate_opening(&self, opening_id: &OpeningId) {
        self.enrollments.invalidate(opening_id);
    }

    fn ledger(&self, student_id: &StudentId) -> Result<Vec<PracticeRecord>, RepositoryError> {
        self.ledgers.get_or_load(student_id, || {
            self.repository.practices_for_student(student_id)
        })
    }

    fn opening_enrollments(
        &self,
        opening_id: &OpeningId,
    ) -> Result<Vec<EnrollmentRecord>, RepositoryError> {
        self.enrollments.get_or_load(opening_id, || {
            self.repository.enrollments_for_opening(opening_id)
        })
    }

    fn opening(&self, opening_id: &OpeningId) -> Result<Opening, SelectionServiceError> {
        self.repository
            .fetch_opening(opening_id)?
            .ok_or_else(|| SelectionServiceError::OpeningNotFound(opening_id.clone()))
    }

    /// Persist the InProgress -> Finished transition for practices whose end date has passed.
    pub fn sync_overdue_practices(
        &self,
        student_id: &StudentId,
        today: NaiveDate,
    ) -> Result<Vec<PracticeId>, SelectionServiceError> {
        let records = self.ledger(student_id)?;
        let overdue = ledger::overdue_practices(&records, today);
        if overdue.is_empty() {
            return Ok(overdue);
        }

        for id in &overdue {
            let update = PracticeUpdate {
                status: Some(PracticeStatus::Finished),
                ..PracticeUpdate::default()
            };
            if let Err(err) = self.repository.update_practice(id, update) {
                self.ledgers.invalidate(student_id);
                return Err(err.into());
            }
        }
        self.ledgers.invalidate(student_id);

        info!(student_id = %student_id, finished = overdue.len(), "finished overdue practices");
        Ok(overdue)
    }

    /// Evaluate accreditation criteria for a student as of `today`.
    pub fn eligibility(
        &self,
        student_id: &StudentId,
        today: NaiveDate,
    ) -> Result<EligibilityReport, SelectionServiceError> {
        let student = self
            .repository
            .fetch_student(student_id)?
            .ok_or_else(|| SelectionServiceError::StudentNotFound(student_id.clone()))?;

        let finished_overdue = self.sync_overdue_practices(student_id, today)?;
        let records = self.ledger(student_id)?;
        let criteria = self
            .evaluator
            .evaluate(&records, student.chosen_specialty.as_ref());

        Ok(EligibilityReport {
            student_id: student.id,
            student_name: student.name,
            evaluated_on: today,
            finished_overdue,
            criteria,
        })
    }

    /// Score and rank every resolvable applicant of an opening.
    pub fn rank_opening(
        &self,
        opening_id: &OpeningId,
    ) -> Result<RankingView, SelectionServiceError> {
        let opening = self.opening(opening_id)?;
        let enrollments = self.opening_enrollments(opening_id)?;

        let mut candidates = Vec::with_capacity(enrollments.len());
        let mut excluded = Vec::new();

        for enrollment in &enrollments {
            let Some(student) = self.repository.fetch_student(&enrollment.student_id)? else {
                warn!(
                    enrollment_id = %enrollment.id,
                    student_id = %enrollment.student_id,
                    "excluding candidate without a student record"
                );
                excluded.push(enrollment.id.clone());
                continue;
            };

            let total_hours = ledger::total_hours(&self.ledger(&student.id)?);
            let penalties = self.repository.penalties_for_student(&student.id)?;
            let penalty_points = total_penalty_points(&penalties);
            let works = enrollment.works || student.works;

            let scored = self
                .scorer
                .score_enrollment(enrollment, total_hours, penalty_points, works);

            candidates.push(RankedCandidate {
                enrollment_id: scored.enrollment_id,
                student_id: student.id,
                student_name: student.name,
                score: scored.score,
                total_hours,
                penalty_points,
                works,
                status: enrollment.status.effective(opening.status),
                rank: 0,
                within_capacity: false,
                breakdown: scored.breakdown,
            });
        }

        let candidates = rank_candidates(candidates, opening.capacity);
        let selected_count = candidates
            .iter()
            .filter(|candidate| candidate.status == EnrollmentStatus::Selected)
            .count();

        Ok(RankingView {
            opening_id: opening.id,
            opening_name: opening.name,
            opening_status: opening.status,
            capacity: opening.capacity,
            selected_count,
            excluded_enrollments: excluded,
            candidates,
        })
    }

    /// Mark an enrollment selected or back to enrolled, keeping the ledger in step.
    pub fn set_selection(
        &self,
        enrollment_id: &EnrollmentId,
        selected: bool,
    ) -> Result<SelectionChange, SelectionServiceError> {
        let enrollment = self
            .repository
            .fetch_enrollment(enrollment_id)?
            .ok_or_else(|| SelectionServiceError::EnrollmentNotFound(enrollment_id.clone()))?;
        let opening = self.opening(&enrollment.opening_id)?;

        if !opening.accepts_selection_changes() {
            return Err(SelectionServiceError::OpeningNotOpen {
                opening_id: opening.id,
                status: opening.status,
            });
        }

        let status = if selected {
            EnrollmentStatus::Selected
        } else {
            EnrollmentStatus::Enrolled
        };

        self.repository
            .update_enrollment_status(&enrollment.id, status)?;
        self.enrollments.invalidate(&opening.id);

        let ledger = if selected {
            upsert_practice(self.repository.as_ref(), &opening, &enrollment.student_id)
        } else {
            remove_practices(self.repository.as_ref(), &opening, &enrollment.student_id)
        };
        self.ledgers.invalidate(&enrollment.student_id);

        // The stored status must match the ledger, so a failed ledger write undoes it.
        let ledger = match ledger {
            Ok(ledger) => ledger,
            Err(err) => {
                if let Err(revert) = self
                    .repository
                    .update_enrollment_status(&enrollment.id, enrollment.status)
                {
                    error!(
                        enrollment_id = %enrollment.id,
                        error = %revert,
                        "failed to restore enrollment status after ledger error"
                    );
                }
                warn!(
                    enrollment_id = %enrollment.id,
                    error = %err,
                    "ledger write failed, selection change reverted"
                );
                return Err(err.into());
            }
        };

        info!(
            enrollment_id = %enrollment.id,
            opening_id = %opening.id,
            status = status.label(),
            ?ledger,
            "selection updated"
        );

        Ok(SelectionChange {
            enrollment_id: enrollment.id,
            student_id: enrollment.student_id,
            opening_id: opening.id,
            status,
            ledger,
        })
    }

    /// Flip the stored selection of an enrollment.
    pub fn toggle_selection(
        &self,
        enrollment_id: &EnrollmentId,
    ) -> Result<SelectionChange, SelectionServiceError> {
        let enrollment = self
            .repository
            .fetch_enrollment(enrollment_id)?
            .ok_or_else(|| SelectionServiceError::EnrollmentNotFound(enrollment_id.clone()))?;
        let currently_selected = enrollment.status == EnrollmentStatus::Selected;
        self.set_selection(enrollment_id, !currently_selected)
    }

    /// Close an opening and finalize every selected candidate.
    ///
    /// Each candidate is reconciled and notified in its own task; failures are collected in
    /// the report instead of aborting the rest. Closing an already closed opening does
    /// nothing.
    pub async fn close_opening(
        &self,
        opening_id: &OpeningId,
    ) -> Result<CloseReport, SelectionServiceError> {
        let opening = self.opening(opening_id)?;

        if opening.status == OpeningStatus::Closed {
            info!(opening_id = %opening.id, "opening already closed");
            return Ok(CloseReport {
                opening_id: opening.id,
                already_closed: true,
                outcomes: Vec::new(),
            });
        }

        // A failed read here must leave the opening open for a retry.
        self.enrollments.invalidate(&opening.id);
        let selected: Vec<EnrollmentRecord> = self
            .opening_enrollments(&opening.id)?
            .into_iter()
            .filter(|enrollment| enrollment.status == EnrollmentStatus::Selected)
            .collect();

        self.repository
            .update_opening_status(&opening.id, OpeningStatus::Closed)?;
        self.enrollments.invalidate(&opening.id);

        let opening = Arc::new(Opening {
            status: OpeningStatus::Closed,
            ..opening
        });

        let mut handles = Vec::with_capacity(selected.len());
        for enrollment in selected {
            let repository = Arc::clone(&self.repository);
            let notifier = Arc::clone(&self.notifier);
            let opening = Arc::clone(&opening);
            let enrollment_id = enrollment.id.clone();
            let student_id = enrollment.student_id.clone();
            let handle = tokio::task::spawn_blocking(move || {
                finalize_candidate(repository.as_ref(), notifier.as_ref(), &opening, &enrollment)
            });
            handles.push((enrollment_id, student_id, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (enrollment_id, student_id, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(enrollment_id = %enrollment_id, error = %err, "candidate task failed");
                    CandidateOutcome {
                        enrollment_id,
                        student_id: student_id.clone(),
                        ledger: LedgerOutcome::Failed {
                            error: format!("task failed: {err}"),
                        },
                        notification: NotificationOutcome::Skipped {
                            reason: "candidate task did not complete".to_string(),
                        },
                    }
                }
            };
            self.ledgers.invalidate(&student_id);
            outcomes.push(outcome);
        }

        let report = CloseReport {
            opening_id: opening.id.clone(),
            already_closed: false,
            outcomes,
        };

        info!(
            opening_id = %report.opening_id,
            selected = report.outcomes.len(),
            notified = report.notified_count(),
            failures = report.failures().len(),
            "opening closed"
        );

        Ok(report)
    }
}

/// Create the (student, opening) practice if missing, otherwise align it with the opening.
fn upsert_practice<R>(
    repository: &R,
    opening: &Opening,
    student_id: &StudentId,
) -> Result<LedgerSync, RepositoryError>
where
    R: PracticumRepository + ?Sized,
{
    let existing = repository
        .practices_for_student(student_id)?
        .into_iter()
        .find(|record| record.opening_id.as_ref() == Some(&opening.id));

    let Some(existing) = existing else {
        let created = repository.create_practice(PracticeRecord {
            id: new_practice_id(),
            student_id: student_id.clone(),
            opening_id: Some(opening.id.clone()),
            institution_name: opening.name.clone(),
            specialty: opening.specialty.clone(),
            hours_completed: 0,
            status: PracticeStatus::InProgress,
            report: ReportGrade::NotSubmitted,
            start_date: opening.start_date,
            end_date: opening.end_date,
        })?;
        return Ok(LedgerSync::Created {
            practice_id: created.id,
        });
    };

    let mut update = PracticeUpdate::default();
    if existing.institution_name != opening.name {
        update.institution_name = Some(opening.name.clone());
    }
    if opening.specialty.is_some() && existing.specialty != opening.specialty {
        update.specialty = opening.specialty.clone();
    }

    if update.is_empty() {
        return Ok(LedgerSync::Unchanged {
            practice_id: existing.id,
        });
    }

    repository.update_practice(&existing.id, update)?;
    Ok(LedgerSync::Reconciled {
        practice_id: existing.id,
    })
}

fn remove_practices<R>(
    repository: &R,
    opening: &Opening,
    student_id: &StudentId,
) -> Result<LedgerSync, RepositoryError>
where
    R: PracticumRepository + ?Sized,
{
    let linked: Vec<PracticeId> = repository
        .practices_for_student(student_id)?
        .into_iter()
        .filter(|record| record.opening_id.as_ref() == Some(&opening.id))
        .map(|record| record.id)
        .collect();

    for id in &linked {
        repository.delete_practice(id)?;
    }

    Ok(LedgerSync::Removed {
        count: linked.len(),
    })
}

/// One unit of the close fan-out: reconcile the ledger, then notify.
fn finalize_candidate<R, N>(
    repository: &R,
    notifier: &N,
    opening: &Opening,
    enrollment: &EnrollmentRecord,
) -> CandidateOutcome
where
    R: PracticumRepository + ?Sized,
    N: SelectionNotifier + ?Sized,
{
    let ledger = match upsert_practice(repository, opening, &enrollment.student_id) {
        Ok(sync) => LedgerOutcome::Synced { sync },
        Err(err) => {
            error!(
                enrollment_id = %enrollment.id,
                student_id = %enrollment.student_id,
                error = %err,
                "ledger reconciliation failed"
            );
            return CandidateOutcome {
                enrollment_id: enrollment.id.clone(),
                student_id: enrollment.student_id.clone(),
                ledger: LedgerOutcome::Failed {
                    error: err.to_string(),
                },
                notification: NotificationOutcome::Skipped {
                    reason: "ledger reconciliation failed".to_string(),
                },
            };
        }
    };

    let notification = match repository.fetch_student(&enrollment.student_id) {
        Ok(Some(student)) => {
            let notice = SelectionNotice {
                student_id: student.id,
                student_name: student.name,
                student_email: student.email,
                opening_id: opening.id.clone(),
                opening_name: opening.name.clone(),
                schedule: enrollment
                    .submitted_schedule
                    .as_deref()
                    .map(str::trim)
                    .filter(|schedule| !schedule.is_empty())
                    .unwrap_or(UNCONFIRMED_SCHEDULE)
                    .to_string(),
            };
            match notifier.notify_selected(notice) {
                Ok(()) => NotificationOutcome::Sent,
                Err(err) => {
                    error!(
                        enrollment_id = %enrollment.id,
                        error = %err,
                        "selection notification failed"
                    );
                    NotificationOutcome::Failed {
                        error: err.to_string(),
                    }
                }
            }
        }
        Ok(None) => {
            warn!(student_id = %enrollment.student_id, "no student record to notify");
            NotificationOutcome::Skipped {
                reason: "student record not found".to_string(),
            }
        }
        Err(err) => NotificationOutcome::Failed {
            error: err.to_string(),
        },
    };

    CandidateOutcome {
        enrollment_id: enrollment.id.clone(),
        student_id: enrollment.student_id.clone(),
        ledger,
        notification,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityReport {
    pub student_id: StudentId,
    pub student_name: String,
    pub evaluated_on: NaiveDate,
    pub finished_overdue: Vec<PracticeId>,
    pub criteria: EligibilityCriteria,
}

/// Effect a selection change had on the practice ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum LedgerSync {
    Created { practice_id: PracticeId },
    Reconciled { practice_id: PracticeId },
    Unchanged { practice_id: PracticeId },
    Removed { count: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionChange {
    pub enrollment_id: EnrollmentId,
    pub student_id: StudentId,
    pub opening_id: OpeningId,
    pub status: EnrollmentStatus,
    pub ledger: LedgerSync,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "result")]
pub enum LedgerOutcome {
    Synced { sync: LedgerSync },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "result")]
pub enum NotificationOutcome {
    Sent,
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateOutcome {
    pub enrollment_id: EnrollmentId,
    pub student_id: StudentId,
    pub ledger: LedgerOutcome,
    pub notification: NotificationOutcome,
}

impl CandidateOutcome {
    pub fn is_clean(&self) -> bool {
        matches!(self.ledger, LedgerOutcome::Synced { .. })
            && self.notification == NotificationOutcome::Sent
    }
}

/// Aggregated result of closing an opening, for operator follow-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseReport {
    pub opening_id: OpeningId,
    pub already_closed: bool,
    pub outcomes: Vec<CandidateOutcome>,
}

impl CloseReport {
    pub fn notified_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.notification == NotificationOutcome::Sent)
            .count()
    }

    pub fn failures(&self) -> Vec<&CandidateOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| !outcome.is_clean())
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.outcomes.iter().all(CandidateOutcome::is_clean)
    }
}

/// Error raised by the selection service.
#[derive(Debug, thiserror::Error)]
pub enum SelectionServiceError {
    #[error("student {0} not found")]
    StudentNotFound(StudentId),
    #[error("opening {0} not found")]
    OpeningNotFound(OpeningId),
    #[error("enrollment {0} not found")]
    EnrollmentNotFound(EnrollmentId),
    #[error("opening {opening_id} is {} and no longer accepts selection changes", .status.label())]
    OpeningNotOpen {
        opening_id: OpeningId,
        status: OpeningStatus,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

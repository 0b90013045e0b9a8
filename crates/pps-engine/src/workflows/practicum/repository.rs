use serde::{Deserialize, Serialize};

use super::domain::{
    EnrollmentId, EnrollmentRecord, EnrollmentStatus, Opening, OpeningId, OpeningStatus,
    PenaltyRecord, PracticeId, PracticeRecord, PracticeUpdate, StudentId, StudentProfile,
};

/// Practice ledger storage.
pub trait LedgerStore: Send + Sync {
    fn practices_for_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<PracticeRecord>, RepositoryError>;
    fn create_practice(&self, record: PracticeRecord) -> Result<PracticeRecord, RepositoryError>;
    fn update_practice(
        &self,
        id: &PracticeId,
        update: PracticeUpdate,
    ) -> Result<PracticeRecord, RepositoryError>;
    fn delete_practice(&self, id: &PracticeId) -> Result<(), RepositoryError>;
}

/// Applications to openings.
pub trait EnrollmentStore: Send + Sync {
    fn enrollments_for_opening(
        &self,
        opening_id: &OpeningId,
    ) -> Result<Vec<EnrollmentRecord>, RepositoryError>;
    fn fetch_enrollment(
        &self,
        id: &EnrollmentId,
    ) -> Result<Option<EnrollmentRecord>, RepositoryError>;
    fn update_enrollment_status(
        &self,
        id: &EnrollmentId,
        status: EnrollmentStatus,
    ) -> Result<(), RepositoryError>;
}

pub trait PenaltyStore: Send + Sync {
    fn penalties_for_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<PenaltyRecord>, RepositoryError>;
}

pub trait StudentDirectory: Send + Sync {
    fn fetch_student(&self, id: &StudentId) -> Result<Option<StudentProfile>, RepositoryError>;
}

pub trait OpeningStore: Send + Sync {
    fn fetch_opening(&self, id: &OpeningId) -> Result<Option<Opening>, RepositoryError>;
    fn update_opening_status(
        &self,
        id: &OpeningId,
        status: OpeningStatus,
    ) -> Result<(), RepositoryError>;
}

/// Everything the selection service reads and writes, usually one backend.
pub trait PracticumRepository:
    LedgerStore + EnrollmentStore + PenaltyStore + StudentDirectory + OpeningStore
{
}

impl<T> PracticumRepository for T where
    T: LedgerStore + EnrollmentStore + PenaltyStore + StudentDirectory + OpeningStore
{
}

/// Error enumeration for storage failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook telling a student they were selected (e-mail, push, ...).
pub trait SelectionNotifier: Send + Sync {
    fn notify_selected(&self, notice: SelectionNotice) -> Result<(), NotificationError>;
}

/// Payload handed to the notifier; formatting is the transport's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionNotice {
    pub student_id: StudentId,
    pub student_name: String,
    pub student_email: String,
    pub opening_id: OpeningId,
    pub opening_name: String,
    pub schedule: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
    #[error("recipient rejected: {0}")]
    Rejected(String),
}

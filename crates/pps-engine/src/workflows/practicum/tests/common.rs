use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::config::AcademicConfig;
use crate::workflows::practicum::domain::{
    AcademicStanding, EnrollmentId, EnrollmentRecord, EnrollmentStatus, Opening, OpeningId,
    OpeningStatus, PenaltyRecord, PracticeId, PracticeRecord, PracticeStatus, PracticeUpdate,
    ReportGrade, StudentId, StudentProfile,
};
use crate::workflows::practicum::repository::{
    EnrollmentStore, LedgerStore, NotificationError, OpeningStore, PenaltyStore,
    RepositoryError, SelectionNotice, SelectionNotifier, StudentDirectory,
};
use crate::workflows::practicum::{SelectionService, SpecialtyArea};

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn today() -> NaiveDate {
    date(2025, 6, 15)
}

pub(super) fn opening(id: &str, status: OpeningStatus) -> Opening {
    Opening {
        id: OpeningId(id.to_string()),
        name: "Hospital Italiano - Guardia".to_string(),
        specialty: Some(SpecialtyArea::Clinical),
        capacity: 2,
        start_date: Some(date(2025, 7, 1)),
        end_date: Some(date(2025, 11, 30)),
        status,
    }
}

pub(super) fn student(id: &str, name: &str) -> StudentProfile {
    StudentProfile {
        id: StudentId(id.to_string()),
        name: name.to_string(),
        file_number: format!("L-{id}"),
        email: format!("{id}@uni.example"),
        chosen_specialty: Some(SpecialtyArea::Clinical),
        works: false,
    }
}

pub(super) fn enrollment(
    id: &str,
    student_id: &str,
    opening_id: &str,
    standing: AcademicStanding,
) -> EnrollmentRecord {
    EnrollmentRecord {
        id: EnrollmentId(id.to_string()),
        student_id: StudentId(student_id.to_string()),
        opening_id: OpeningId(opening_id.to_string()),
        standing,
        works: false,
        submitted_schedule: Some("Mon/Wed 9-13".to_string()),
        status: EnrollmentStatus::Enrolled,
    }
}

pub(super) fn finished_coursework() -> AcademicStanding {
    AcademicStanding {
        finished_coursework: true,
        taking_electives: false,
        owes_finals: String::new(),
    }
}

pub(super) fn taking_electives() -> AcademicStanding {
    AcademicStanding {
        finished_coursework: false,
        taking_electives: true,
        owes_finals: String::new(),
    }
}

pub(super) fn practice(
    id: &str,
    student_id: &str,
    area: &str,
    hours: u32,
    status: PracticeStatus,
) -> PracticeRecord {
    PracticeRecord {
        id: PracticeId(id.to_string()),
        student_id: StudentId(student_id.to_string()),
        opening_id: None,
        institution_name: format!("Institution {id}"),
        specialty: SpecialtyArea::parse(area),
        hours_completed: hours,
        status,
        report: ReportGrade::Graded(8),
        start_date: Some(date(2024, 3, 1)),
        end_date: Some(date(2024, 6, 30)),
    }
}

pub(super) fn penalty(student_id: &str, points: u32) -> PenaltyRecord {
    PenaltyRecord {
        student_id: StudentId(student_id.to_string()),
        points,
        reason: "Withdrew after selection".to_string(),
    }
}

#[derive(Default)]
pub(super) struct MemoryState {
    pub(super) practices: BTreeMap<PracticeId, PracticeRecord>,
    pub(super) enrollments: BTreeMap<EnrollmentId, EnrollmentRecord>,
    pub(super) openings: BTreeMap<OpeningId, Opening>,
    pub(super) students: BTreeMap<StudentId, StudentProfile>,
    pub(super) penalties: Vec<PenaltyRecord>,
    pub(super) ledger_reads: usize,
    pub(super) failing_ledgers: HashSet<StudentId>,
    pub(super) failing_enrollment_reads: usize,
    pub(super) offline: bool,
}

#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    pub(super) state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub(super) fn with<F: FnOnce(&mut MemoryState)>(&self, f: F) {
        f(&mut self.state.lock().expect("store mutex poisoned"));
    }

    pub(super) fn add_opening(&self, opening: Opening) {
        self.with(|state| {
            state.openings.insert(opening.id.clone(), opening);
        });
    }

    pub(super) fn add_student(&self, student: StudentProfile) {
        self.with(|state| {
            state.students.insert(student.id.clone(), student);
        });
    }

    pub(super) fn add_enrollment(&self, enrollment: EnrollmentRecord) {
        self.with(|state| {
            state.enrollments.insert(enrollment.id.clone(), enrollment);
        });
    }

    pub(super) fn add_practice(&self, practice: PracticeRecord) {
        self.with(|state| {
            state.practices.insert(practice.id.clone(), practice);
        });
    }

    pub(super) fn add_penalty(&self, penalty: PenaltyRecord) {
        self.with(|state| state.penalties.push(penalty));
    }

    pub(super) fn fail_ledger_writes_for(&self, student_id: &str) {
        self.with(|state| {
            state
                .failing_ledgers
                .insert(StudentId(student_id.to_string()));
        });
    }

    pub(super) fn fail_next_enrollment_reads(&self, count: usize) {
        self.with(|state| state.failing_enrollment_reads = count);
    }

    pub(super) fn go_offline(&self) {
        self.with(|state| state.offline = true);
    }

    pub(super) fn practices_for(&self, student_id: &str, opening_id: &str) -> Vec<PracticeRecord> {
        let state = self.state.lock().expect("store mutex poisoned");
        state
            .practices
            .values()
            .filter(|record| {
                record.student_id.0 == student_id
                    && record.opening_id.as_ref().map(|id| id.0.as_str()) == Some(opening_id)
            })
            .cloned()
            .collect()
    }

    pub(super) fn practice_count(&self) -> usize {
        self.state
            .lock()
            .expect("store mutex poisoned")
            .practices
            .len()
    }

    pub(super) fn ledger_reads(&self) -> usize {
        self.state.lock().expect("store mutex poisoned").ledger_reads
    }

    pub(super) fn enrollment_status(&self, id: &str) -> EnrollmentStatus {
        self.state
            .lock()
            .expect("store mutex poisoned")
            .enrollments
            .get(&EnrollmentId(id.to_string()))
            .map(|record| record.status)
            .expect("enrollment present")
    }

    pub(super) fn opening_status(&self, id: &str) -> OpeningStatus {
        self.state
            .lock()
            .expect("store mutex poisoned")
            .openings
            .get(&OpeningId(id.to_string()))
            .map(|opening| opening.status)
            .expect("opening present")
    }
}

impl LedgerStore for MemoryStore {
    fn practices_for_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<PracticeRecord>, RepositoryError> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        state.ledger_reads += 1;
        Ok(state
            .practices
            .values()
            .filter(|record| &record.student_id == student_id)
            .cloned()
            .collect())
    }

    fn create_practice(&self, record: PracticeRecord) -> Result<PracticeRecord, RepositoryError> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        if state.failing_ledgers.contains(&record.student_id) {
            return Err(RepositoryError::Unavailable("ledger offline".to_string()));
        }
        if state.practices.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        state.practices.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update_practice(
        &self,
        id: &PracticeId,
        update: PracticeUpdate,
    ) -> Result<PracticeRecord, RepositoryError> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        let record = state
            .practices
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        update.apply(record);
        Ok(record.clone())
    }

    fn delete_practice(&self, id: &PracticeId) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        state
            .practices
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

impl EnrollmentStore for MemoryStore {
    fn enrollments_for_opening(
        &self,
        opening_id: &OpeningId,
    ) -> Result<Vec<EnrollmentRecord>, RepositoryError> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        if state.failing_enrollment_reads > 0 {
            state.failing_enrollment_reads -= 1;
            return Err(RepositoryError::Unavailable("enrollments offline".to_string()));
        }
        Ok(state
            .enrollments
            .values()
            .filter(|record| &record.opening_id == opening_id)
            .cloned()
            .collect())
    }

    fn fetch_enrollment(
        &self,
        id: &EnrollmentId,
    ) -> Result<Option<EnrollmentRecord>, RepositoryError> {
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(state.enrollments.get(id).cloned())
    }

    fn update_enrollment_status(
        &self,
        id: &EnrollmentId,
        status: EnrollmentStatus,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        let record = state
            .enrollments
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        record.status = status;
        Ok(())
    }
}

impl PenaltyStore for MemoryStore {
    fn penalties_for_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<PenaltyRecord>, RepositoryError> {
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(state
            .penalties
            .iter()
            .filter(|penalty| &penalty.student_id == student_id)
            .cloned()
            .collect())
    }
}

impl StudentDirectory for MemoryStore {
    fn fetch_student(&self, id: &StudentId) -> Result<Option<StudentProfile>, RepositoryError> {
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(state.students.get(id).cloned())
    }
}

impl OpeningStore for MemoryStore {
    fn fetch_opening(&self, id: &OpeningId) -> Result<Option<Opening>, RepositoryError> {
        let state = self.state.lock().expect("store mutex poisoned");
        if state.offline {
            return Err(RepositoryError::Unavailable("openings offline".to_string()));
        }
        Ok(state.openings.get(id).cloned())
    }

    fn update_opening_status(
        &self,
        id: &OpeningId,
        status: OpeningStatus,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        let opening = state.openings.get_mut(id).ok_or(RepositoryError::NotFound)?;
        opening.status = status;
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    sent: Arc<Mutex<Vec<SelectionNotice>>>,
    rejected_emails: Arc<Mutex<HashSet<String>>>,
}

impl MemoryNotifier {
    pub(super) fn sent(&self) -> Vec<SelectionNotice> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }

    pub(super) fn reject(&self, email: &str) {
        self.rejected_emails
            .lock()
            .expect("notifier mutex poisoned")
            .insert(email.to_string());
    }
}

impl SelectionNotifier for MemoryNotifier {
    fn notify_selected(&self, notice: SelectionNotice) -> Result<(), NotificationError> {
        if self
            .rejected_emails
            .lock()
            .expect("notifier mutex poisoned")
            .contains(&notice.student_email)
        {
            return Err(NotificationError::Rejected(notice.student_email));
        }
        self.sent
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice);
        Ok(())
    }
}

/// Opening `op-1` with two applicants: `e-ana` (finished coursework, 40 h) and `e-bruno`
/// (taking electives, 10 h, 50 penalty points).
pub(super) fn seeded_store() -> MemoryStore {
    let store = MemoryStore::default();
    store.add_opening(opening("op-1", OpeningStatus::Open));

    store.add_student(student("st-ana", "Ana Ferreyra"));
    store.add_student(student("st-bruno", "Bruno Paz"));

    store.add_practice(practice("p-ana-1", "st-ana", "Educacional", 40, PracticeStatus::Finished));
    store.add_practice(practice("p-bruno-1", "st-bruno", "Laboral", 10, PracticeStatus::Finished));
    store.add_penalty(penalty("st-bruno", 50));

    store.add_enrollment(enrollment("e-ana", "st-ana", "op-1", finished_coursework()));
    store.add_enrollment(enrollment("e-bruno", "st-bruno", "op-1", taking_electives()));
    store
}

pub(super) fn build_service(
    store: &MemoryStore,
) -> (
    SelectionService<MemoryStore, MemoryNotifier>,
    Arc<MemoryStore>,
    Arc<MemoryNotifier>,
) {
    let store = Arc::new(store.clone());
    let notifier = Arc::new(MemoryNotifier::default());
    let service = SelectionService::new(store.clone(), notifier.clone(), AcademicConfig::default());
    (service, store, notifier)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use pps_engine::workflows::practicum::{
    AcademicStanding, EnrollmentId, EnrollmentRecord, EnrollmentStatus, EnrollmentStore,
    LedgerStore, NotificationError, Opening, OpeningId, OpeningStatus, OpeningStore,
    PenaltyRecord, PenaltyStore, PracticeId, PracticeRecord, PracticeStatus, PracticeUpdate,
    ReportGrade, RepositoryError, SelectionNotice, SelectionNotifier, SpecialtyArea,
    StudentDirectory, StudentId, StudentProfile,
};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct PracticumTables {
    practices: HashMap<PracticeId, PracticeRecord>,
    enrollments: HashMap<EnrollmentId, EnrollmentRecord>,
    openings: HashMap<OpeningId, Opening>,
    students: HashMap<StudentId, StudentProfile>,
    penalties: Vec<PenaltyRecord>,
}

/// Process-local backend used by the demo and the development server.
#[derive(Default, Clone)]
pub(crate) struct InMemoryPracticumStore {
    tables: Arc<Mutex<PracticumTables>>,
}

impl InMemoryPracticumStore {
    fn lock(&self) -> MutexGuard<'_, PracticumTables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn insert_student(&self, student: StudentProfile) {
        let mut guard = self.lock();
        guard.students.insert(student.id.clone(), student);
    }

    pub(crate) fn insert_opening(&self, opening: Opening) {
        let mut guard = self.lock();
        guard.openings.insert(opening.id.clone(), opening);
    }

    pub(crate) fn insert_enrollment(&self, enrollment: EnrollmentRecord) {
        let mut guard = self.lock();
        guard.enrollments.insert(enrollment.id.clone(), enrollment);
    }

    pub(crate) fn insert_practice(&self, practice: PracticeRecord) {
        let mut guard = self.lock();
        guard.practices.insert(practice.id.clone(), practice);
    }

    pub(crate) fn insert_penalty(&self, penalty: PenaltyRecord) {
        let mut guard = self.lock();
        guard.penalties.push(penalty);
    }
}

impl LedgerStore for InMemoryPracticumStore {
    fn practices_for_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<PracticeRecord>, RepositoryError> {
        let guard = self.lock();
        let mut records: Vec<PracticeRecord> = guard
            .practices
            .values()
            .filter(|record| &record.student_id == student_id)
            .cloned()
            .collect();
        records.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(records)
    }

    fn create_practice(&self, record: PracticeRecord) -> Result<PracticeRecord, RepositoryError> {
        let mut guard = self.lock();
        if guard.practices.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.practices.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update_practice(
        &self,
        id: &PracticeId,
        update: PracticeUpdate,
    ) -> Result<PracticeRecord, RepositoryError> {
        let mut guard = self.lock();
        let record = guard
            .practices
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        update.apply(record);
        Ok(record.clone())
    }

    fn delete_practice(&self, id: &PracticeId) -> Result<(), RepositoryError> {
        let mut guard = self.lock();
        guard
            .practices
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

impl EnrollmentStore for InMemoryPracticumStore {
    fn enrollments_for_opening(
        &self,
        opening_id: &OpeningId,
    ) -> Result<Vec<EnrollmentRecord>, RepositoryError> {
        let guard = self.lock();
        Ok(guard
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
        let guard = self.lock();
        Ok(guard.enrollments.get(id).cloned())
    }

    fn update_enrollment_status(
        &self,
        id: &EnrollmentId,
        status: EnrollmentStatus,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.lock();
        let record = guard
            .enrollments
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        record.status = status;
        Ok(())
    }
}

impl PenaltyStore for InMemoryPracticumStore {
    fn penalties_for_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<PenaltyRecord>, RepositoryError> {
        let guard = self.lock();
        Ok(guard
            .penalties
            .iter()
            .filter(|penalty| &penalty.student_id == student_id)
            .cloned()
            .collect())
    }
}

impl StudentDirectory for InMemoryPracticumStore {
    fn fetch_student(&self, id: &StudentId) -> Result<Option<StudentProfile>, RepositoryError> {
        let guard = self.lock();
        Ok(guard.students.get(id).cloned())
    }
}

impl OpeningStore for InMemoryPracticumStore {
    fn fetch_opening(&self, id: &OpeningId) -> Result<Option<Opening>, RepositoryError> {
        let guard = self.lock();
        Ok(guard.openings.get(id).cloned())
    }

    fn update_opening_status(
        &self,
        id: &OpeningId,
        status: OpeningStatus,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.lock();
        let opening = guard
            .openings
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        opening.status = status;
        Ok(())
    }
}

/// Notifier that logs each notice instead of sending mail.
#[derive(Default, Clone)]
pub(crate) struct LoggingNotifier {
    sent: Arc<Mutex<Vec<SelectionNotice>>>,
}

impl SelectionNotifier for LoggingNotifier {
    fn notify_selected(&self, notice: SelectionNotice) -> Result<(), NotificationError> {
        info!(
            student_id = %notice.student_id,
            opening_id = %notice.opening_id,
            schedule = %notice.schedule,
            "selection notice queued"
        );
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
        Ok(())
    }
}

impl LoggingNotifier {
    pub(crate) fn sent(&self) -> Vec<SelectionNotice> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

pub(crate) const DEMO_OPENING: &str = "op-hospital-italiano";

/// Seed the store with one open opening, three applicants, and their ledgers.
pub(crate) fn seed_demo(store: &InMemoryPracticumStore) {
    store.insert_opening(Opening {
        id: OpeningId(DEMO_OPENING.to_string()),
        name: "Hospital Italiano - Salud Mental".to_string(),
        specialty: Some(SpecialtyArea::Clinical),
        capacity: 2,
        start_date: NaiveDate::from_ymd_opt(2025, 8, 1),
        end_date: NaiveDate::from_ymd_opt(2025, 12, 15),
        status: OpeningStatus::Open,
    });

    let students = [
        ("st-ana", "Ana Ferreyra", "L-1021", false),
        ("st-bruno", "Bruno Paz", "L-1188", true),
        ("st-carla", "Carla Medina", "L-0975", false),
    ];
    for (id, name, file_number, works) in students {
        store.insert_student(StudentProfile {
            id: StudentId(id.to_string()),
            name: name.to_string(),
            file_number: file_number.to_string(),
            email: format!("{id}@alumnos.example.edu"),
            chosen_specialty: Some(SpecialtyArea::Clinical),
            works,
        });
    }

    let ledger = [
        ("pps-demo-01", "st-ana", "Clínica", 40, PracticeStatus::Finished),
        ("pps-demo-02", "st-bruno", "Laboral", 10, PracticeStatus::Finished),
        ("pps-demo-03", "st-carla", "Clinica", 80, PracticeStatus::Finished),
        ("pps-demo-04", "st-carla", "CLINICA", 90, PracticeStatus::Finished),
        ("pps-demo-05", "st-carla", "clínica ", 80, PracticeStatus::Finished),
    ];
    for (id, student_id, area, hours, status) in ledger {
        store.insert_practice(PracticeRecord {
            id: PracticeId(id.to_string()),
            student_id: StudentId(student_id.to_string()),
            opening_id: None,
            institution_name: format!("Centro {id}"),
            specialty: SpecialtyArea::parse(area),
            hours_completed: hours,
            status,
            report: ReportGrade::Graded(8),
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 7, 31),
        });
    }

    store.insert_penalty(PenaltyRecord {
        student_id: StudentId("st-bruno".to_string()),
        points: 50,
        reason: "Withdrew after being selected".to_string(),
    });

    let enrollments = [
        (
            "enr-ana",
            "st-ana",
            AcademicStanding {
                finished_coursework: true,
                taking_electives: false,
                owes_finals: String::new(),
            },
            Some("Lunes y miércoles 9 a 13"),
        ),
        (
            "enr-bruno",
            "st-bruno",
            AcademicStanding {
                finished_coursework: false,
                taking_electives: true,
                owes_finals: String::new(),
            },
            None,
        ),
        (
            "enr-carla",
            "st-carla",
            AcademicStanding {
                finished_coursework: false,
                taking_electives: false,
                owes_finals: "Psicopatología II".to_string(),
            },
            Some("Martes 14 a 18"),
        ),
    ];
    for (id, student_id, standing, schedule) in enrollments {
        store.insert_enrollment(EnrollmentRecord {
            id: EnrollmentId(id.to_string()),
            student_id: StudentId(student_id.to_string()),
            opening_id: OpeningId(DEMO_OPENING.to_string()),
            standing,
            works: false,
            submitted_schedule: schedule.map(str::to_string),
            status: EnrollmentStatus::Enrolled,
        });
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

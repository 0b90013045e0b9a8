use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use super::canonical::{canonicalize, deserialize_optional_area, SpecialtyArea};

/// Identifier wrapper for students.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StudentId(pub String);

/// Identifier wrapper for published internship openings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OpeningId(pub String);

/// Identifier wrapper for a student's application to an opening.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EnrollmentId(pub String);

/// Identifier wrapper for practice ledger entries.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PracticeId(pub String);

macro_rules! display_id {
    ($($name:ident),+) => {
        $(impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        })+
    };
}

display_id!(StudentId, OpeningId, EnrollmentId, PracticeId);

/// Deserialize a status through its `parse`, which compares canonicalized labels.
macro_rules! deserialize_status {
    ($($name:ident => $expected:literal),+) => {
        $(impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                $name::parse(&raw).ok_or_else(|| {
                    serde::de::Error::custom(format!("unknown {}: {raw:?}", $expected))
                })
            }
        })+
    };
}

/// Lifecycle of a supervised practice placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PracticeStatus {
    InProgress,
    Pending,
    Finished,
}

impl PracticeStatus {
    /// Accepts the snake_case labels and the portal's Spanish ones, ignoring case and accents.
    pub fn parse(raw: &str) -> Option<Self> {
        match canonicalize(raw).as_str() {
            "in_progress" | "en curso" | "en proceso" => Some(Self::InProgress),
            "pending" | "pendiente" => Some(Self::Pending),
            "finished" | "finalizada" | "pps realizada" | "convenio realizado" | "aprobada" => {
                Some(Self::Finished)
            }
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            PracticeStatus::InProgress => "in_progress",
            PracticeStatus::Pending => "pending",
            PracticeStatus::Finished => "finished",
        }
    }

    /// Active practices keep a student from being accredited.
    pub const fn is_active(self) -> bool {
        matches!(self, PracticeStatus::InProgress | PracticeStatus::Pending)
    }
}

/// Grading state of the deliverable report attached to a practice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "grade")]
pub enum ReportGrade {
    #[default]
    NotSubmitted,
    SubmittedUngraded,
    Graded(u8),
}

/// One placement in a student's practice ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeRecord {
    pub id: PracticeId,
    pub student_id: StudentId,
    #[serde(default)]
    pub opening_id: Option<OpeningId>,
    #[serde(default)]
    pub institution_name: String,
    #[serde(default, deserialize_with = "deserialize_optional_area")]
    pub specialty: Option<SpecialtyArea>,
    pub hours_completed: u32,
    pub status: PracticeStatus,
    #[serde(default)]
    pub report: ReportGrade,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl PracticeRecord {
    /// An active practice whose end date has already passed.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status == PracticeStatus::InProgress
            && self.end_date.map(|end| end < today).unwrap_or(false)
    }
}

/// Partial update applied to a ledger entry; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeUpdate {
    pub hours_completed: Option<u32>,
    pub status: Option<PracticeStatus>,
    pub institution_name: Option<String>,
    pub specialty: Option<SpecialtyArea>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl PracticeUpdate {
    pub fn is_empty(&self) -> bool {
        *self == PracticeUpdate::default()
    }

    pub fn apply(self, record: &mut PracticeRecord) {
        if let Some(hours) = self.hours_completed {
            record.hours_completed = hours;
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(name) = self.institution_name {
            record.institution_name = name;
        }
        if let Some(area) = self.specialty {
            record.specialty = Some(area);
        }
        if let Some(start) = self.start_date {
            record.start_date = Some(start);
        }
        if let Some(end) = self.end_date {
            record.end_date = Some(end);
        }
    }
}

/// Student directory entry needed for scoring and notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub id: StudentId,
    pub name: String,
    pub file_number: String,
    pub email: String,
    #[serde(default, deserialize_with = "deserialize_optional_area")]
    pub chosen_specialty: Option<SpecialtyArea>,
    #[serde(default)]
    pub works: bool,
}

/// Publication state of an opening. Closing is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OpeningStatus {
    Open,
    Closed,
    Hidden,
}

impl OpeningStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match canonicalize(raw).as_str() {
            "open" | "abierta" | "abierto" => Some(Self::Open),
            "closed" | "cerrado" | "cerrada" => Some(Self::Closed),
            "hidden" | "oculto" | "oculta" => Some(Self::Hidden),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            OpeningStatus::Open => "open",
            OpeningStatus::Closed => "closed",
            OpeningStatus::Hidden => "hidden",
        }
    }
}

/// A published internship slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opening {
    pub id: OpeningId,
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_optional_area")]
    pub specialty: Option<SpecialtyArea>,
    pub capacity: u32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: OpeningStatus,
}

impl Opening {
    pub fn accepts_selection_changes(&self) -> bool {
        self.status == OpeningStatus::Open
    }
}

/// Academic situation declared by the student when applying.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicStanding {
    pub finished_coursework: bool,
    pub taking_electives: bool,
    #[serde(default)]
    pub owes_finals: String,
}

/// Stored selection status of an enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    /// "Inscripto": applied, awaiting a decision.
    Enrolled,
    /// "Seleccionado".
    Selected,
    /// "No Seleccionado".
    NotSelected,
}

impl EnrollmentStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match canonicalize(raw).as_str() {
            "enrolled" | "inscripto" => Some(Self::Enrolled),
            "selected" | "seleccionado" => Some(Self::Selected),
            "not_selected" | "no seleccionado" | "noseleccionado" => Some(Self::NotSelected),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            EnrollmentStatus::Enrolled => "enrolled",
            EnrollmentStatus::Selected => "selected",
            EnrollmentStatus::NotSelected => "not_selected",
        }
    }

    /// Status shown to users: pending applicants of a closed opening read as not selected.
    pub const fn effective(self, opening: OpeningStatus) -> Self {
        match (self, opening) {
            (EnrollmentStatus::Enrolled, OpeningStatus::Closed) => EnrollmentStatus::NotSelected,
            (status, _) => status,
        }
    }
}

deserialize_status!(
    PracticeStatus => "practice status",
    OpeningStatus => "opening status",
    EnrollmentStatus => "enrollment status"
);

/// A student's application to one opening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    pub id: EnrollmentId,
    pub student_id: StudentId,
    pub opening_id: OpeningId,
    pub standing: AcademicStanding,
    #[serde(default)]
    pub works: bool,
    #[serde(default)]
    pub submitted_schedule: Option<String>,
    pub status: EnrollmentStatus,
}

/// Demerit recorded against a student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyRecord {
    pub student_id: StudentId,
    pub points: u32,
    pub reason: String,
}

pub fn total_penalty_points(penalties: &[PenaltyRecord]) -> u32 {
    penalties
        .iter()
        .fold(0u32, |acc, penalty| acc.saturating_add(penalty.points))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enrolled_candidates_read_as_not_selected_after_closing() {
        assert_eq!(
            EnrollmentStatus::Enrolled.effective(OpeningStatus::Closed),
            EnrollmentStatus::NotSelected
        );
        assert_eq!(
            EnrollmentStatus::Enrolled.effective(OpeningStatus::Open),
            EnrollmentStatus::Enrolled
        );
        assert_eq!(
            EnrollmentStatus::Selected.effective(OpeningStatus::Closed),
            EnrollmentStatus::Selected
        );
    }

    #[test]
    fn statuses_accept_portal_labels() {
        let status: EnrollmentStatus =
            serde_json::from_str("\"Seleccionado\"").expect("portal label");
        assert_eq!(status, EnrollmentStatus::Selected);
        let practice: PracticeStatus = serde_json::from_str("\"En curso\"").expect("portal label");
        assert_eq!(practice, PracticeStatus::InProgress);
        let opening: OpeningStatus = serde_json::from_str("\"Cerrado\"").expect("portal label");
        assert_eq!(opening, OpeningStatus::Closed);
    }

    #[test]
    fn status_labels_ignore_case_and_accents() {
        for raw in ["en curso", "EN CURSO", " En Proceso "] {
            let status: PracticeStatus = serde_json::from_str(&format!("{raw:?}")).expect(raw);
            assert_eq!(status, PracticeStatus::InProgress, "{raw}");
        }
        for raw in ["FINALIZADA", "pps realizada", "Aprobada"] {
            let status: PracticeStatus = serde_json::from_str(&format!("{raw:?}")).expect(raw);
            assert_eq!(status, PracticeStatus::Finished, "{raw}");
        }
        assert_eq!(
            EnrollmentStatus::parse("NO SELECCIONADO"),
            Some(EnrollmentStatus::NotSelected)
        );
        assert!(serde_json::from_str::<PracticeStatus>("\"cancelada\"").is_err());
    }

    #[test]
    fn serialized_statuses_parse_back() {
        for status in [
            PracticeStatus::InProgress,
            PracticeStatus::Pending,
            PracticeStatus::Finished,
        ] {
            assert_eq!(PracticeStatus::parse(status.label()), Some(status));
        }
        let encoded = serde_json::to_string(&EnrollmentStatus::NotSelected).expect("serializes");
        let decoded: EnrollmentStatus = serde_json::from_str(&encoded).expect("parses");
        assert_eq!(decoded, EnrollmentStatus::NotSelected);
    }

    #[test]
    fn overdue_only_applies_to_in_progress_practices() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 10).expect("valid");
        let mut record = PracticeRecord {
            id: PracticeId("pps-1".to_string()),
            student_id: StudentId("st-1".to_string()),
            opening_id: None,
            institution_name: "Hospital Central".to_string(),
            specialty: Some(SpecialtyArea::Clinical),
            hours_completed: 40,
            status: PracticeStatus::InProgress,
            report: ReportGrade::NotSubmitted,
            start_date: None,
            end_date: NaiveDate::from_ymd_opt(2025, 6, 9),
        };
        assert!(record.is_overdue(today));

        record.end_date = Some(today);
        assert!(!record.is_overdue(today));

        record.end_date = NaiveDate::from_ymd_opt(2025, 1, 1);
        record.status = PracticeStatus::Pending;
        assert!(!record.is_overdue(today));
    }

    #[test]
    fn penalty_points_accumulate() {
        let penalties = vec![
            PenaltyRecord {
                student_id: StudentId("st-1".to_string()),
                points: 20,
                reason: "Late withdrawal".to_string(),
            },
            PenaltyRecord {
                student_id: StudentId("st-1".to_string()),
                points: 30,
                reason: "Missed orientation".to_string(),
            },
        ];
        assert_eq!(total_penalty_points(&penalties), 50);
        assert_eq!(total_penalty_points(&[]), 0);
    }
}

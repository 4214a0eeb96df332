use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Entity, Stamp};
use crate::config::FieldDefaults;

/// A student on the class roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Grade level label, e.g. "10th Grade".
    pub grade: String,
    pub date_of_birth: NaiveDate,
    /// Parent phone number or email.
    pub parent_contact: Option<String>,
    pub notes: Option<String>,
    pub status: StudentStatus,
}

impl Student {
    /// "First Last", the name shown everywhere a student is referenced.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_active(&self) -> bool {
        self.status == StudentStatus::Active
    }
}

/// Enrollment status of a student.
///
/// - `Active`: currently enrolled
/// - `Inactive`: withdrawn or transferred out
/// - `Pending`: enrollment not yet confirmed
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StudentStatus {
    #[default]
    Active,
    Inactive,
    Pending,
}

impl StudentStatus {
    pub const ALL: [StudentStatus; 3] = [Self::Active, Self::Inactive, Self::Pending];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Pending => "pending",
        }
    }

    /// Case-insensitive parse; the backend has been seen sending both
    /// "Active" and "active".
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "pending" => Some(Self::Pending),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::Pending => "Pending",
        }
    }
}

/// Input for adding a student to the roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStudentInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub grade: String,
    pub date_of_birth: NaiveDate,
    #[serde(default)]
    pub parent_contact: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Defaults to [`FieldDefaults`]' student status when omitted.
    #[serde(default)]
    pub status: Option<StudentStatus>,
}

/// Input for updating a student. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateStudentInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub grade: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub parent_contact: Option<String>,
    pub notes: Option<String>,
    pub status: Option<StudentStatus>,
}

/// Read filter for students.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StudentStatus>,
}

impl Entity for Student {
    type Create = CreateStudentInput;
    type Update = UpdateStudentInput;
    type Query = StudentQuery;

    const COLLECTION: &'static str = "students";
    const LABEL: &'static str = "student";

    fn id(&self) -> i64 {
        self.id
    }

    fn matches(&self, query: &StudentQuery) -> bool {
        query.status.map_or(true, |status| self.status == status)
    }

    fn build(id: i64, input: CreateStudentInput, defaults: &FieldDefaults, _stamp: Stamp) -> Self {
        let defaults = &defaults.student;
        Self {
            id,
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            grade: input.grade,
            date_of_birth: input.date_of_birth,
            parent_contact: input.parent_contact.or_else(|| defaults.parent_contact.clone()),
            notes: input.notes.or_else(|| defaults.notes.clone()),
            status: input.status.unwrap_or(defaults.status),
        }
    }

    fn apply(&mut self, input: UpdateStudentInput) {
        if let Some(first_name) = input.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = input.last_name {
            self.last_name = last_name;
        }
        if let Some(email) = input.email {
            self.email = email;
        }
        if let Some(grade) = input.grade {
            self.grade = grade;
        }
        if let Some(date_of_birth) = input.date_of_birth {
            self.date_of_birth = date_of_birth;
        }
        self.parent_contact = input.parent_contact.or(self.parent_contact.take());
        self.notes = input.notes.or(self.notes.take());
        if let Some(status) = input.status {
            self.status = status;
        }
    }
}

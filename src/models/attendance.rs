use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Entity, Link, Stamp};
use crate::config::FieldDefaults;

/// One student's attendance on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendance {
    pub id: i64,
    #[serde(rename = "student_id")]
    pub student: Link,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

/// Attendance outcome for a day.
///
/// Only `Present` counts towards the attendance rate; `Late` and `Excused`
/// are tracked separately.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 4] = [Self::Present, Self::Absent, Self::Late, Self::Excused];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Late => "late",
            Self::Excused => "excused",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "present" => Some(Self::Present),
            "absent" => Some(Self::Absent),
            "late" => Some(Self::Late),
            "excused" => Some(Self::Excused),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Present => "Present",
            Self::Absent => "Absent",
            Self::Late => "Late",
            Self::Excused => "Excused",
        }
    }

    /// Single-letter grid symbol.
    pub fn symbol(&self) -> char {
        match self {
            Self::Present => 'P',
            Self::Absent => 'A',
            Self::Late => 'L',
            Self::Excused => 'E',
        }
    }
}

/// Input for recording attendance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAttendanceInput {
    pub student_id: i64,
    /// Defaults to today when omitted.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<AttendanceStatus>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Input for updating an attendance record. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAttendanceInput {
    pub student_id: Option<i64>,
    pub date: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
    pub notes: Option<String>,
}

/// Read filter for attendance records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttendanceQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl Entity for Attendance {
    type Create = CreateAttendanceInput;
    type Update = UpdateAttendanceInput;
    type Query = AttendanceQuery;

    const COLLECTION: &'static str = "attendance";
    const LABEL: &'static str = "attendance record";

    fn id(&self) -> i64 {
        self.id
    }

    fn matches(&self, query: &AttendanceQuery) -> bool {
        query.student_id.map_or(true, |id| self.student.id == id)
            && query.date.map_or(true, |date| self.date == date)
    }

    fn build(id: i64, input: CreateAttendanceInput, defaults: &FieldDefaults, stamp: Stamp) -> Self {
        let defaults = &defaults.attendance;
        Self {
            id,
            student: Link::bare(input.student_id),
            date: input.date.unwrap_or_else(|| defaults.date.resolve(stamp.today)),
            status: input.status.unwrap_or(defaults.status),
            notes: input.notes.or_else(|| defaults.notes.clone()),
        }
    }

    fn apply(&mut self, input: UpdateAttendanceInput) {
        if let Some(student_id) = input.student_id {
            if student_id != self.student.id {
                self.student = Link::bare(student_id);
            }
        }
        if let Some(date) = input.date {
            self.date = date;
        }
        if let Some(status) = input.status {
            self.status = status;
        }
        self.notes = input.notes.or(self.notes.take());
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Entity, Link, Stamp};
use crate::config::FieldDefaults;

/// A score for one student on one assignment.
///
/// `score` is expected in `0..=total_points` of the referenced assignment but
/// is stored as given; display code clamps the derived percentage instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub id: i64,
    #[serde(rename = "student_id")]
    pub student: Link,
    #[serde(rename = "assignment_id")]
    pub assignment: Link,
    pub score: f64,
    /// `None` means the work has not been submitted.
    pub submitted_date: Option<DateTime<Utc>>,
    pub comments: Option<String>,
}

impl Grade {
    pub fn is_submitted(&self) -> bool {
        self.submitted_date.is_some()
    }
}

/// Input for entering a grade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGradeInput {
    pub student_id: i64,
    pub assignment_id: i64,
    pub score: f64,
    /// Stamped per [`FieldDefaults`] when omitted.
    #[serde(default)]
    pub submitted_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub comments: Option<String>,
}

/// Input for updating a grade. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateGradeInput {
    pub student_id: Option<i64>,
    pub assignment_id: Option<i64>,
    pub score: Option<f64>,
    pub submitted_date: Option<DateTime<Utc>>,
    pub comments: Option<String>,
}

/// Read filter for grades.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GradeQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_id: Option<i64>,
}

impl Entity for Grade {
    type Create = CreateGradeInput;
    type Update = UpdateGradeInput;
    type Query = GradeQuery;

    const COLLECTION: &'static str = "grades";
    const LABEL: &'static str = "grade";

    fn id(&self) -> i64 {
        self.id
    }

    fn matches(&self, query: &GradeQuery) -> bool {
        query.student_id.map_or(true, |id| self.student.id == id)
            && query.assignment_id.map_or(true, |id| self.assignment.id == id)
    }

    fn build(id: i64, input: CreateGradeInput, defaults: &FieldDefaults, stamp: Stamp) -> Self {
        let defaults = &defaults.grade;
        Self {
            id,
            student: Link::bare(input.student_id),
            assignment: Link::bare(input.assignment_id),
            score: input.score,
            submitted_date: input.submitted_date.or_else(|| defaults.submitted_date.resolve(stamp.now)),
            comments: input.comments.or_else(|| defaults.comments.clone()),
        }
    }

    fn apply(&mut self, input: UpdateGradeInput) {
        if let Some(student_id) = input.student_id {
            if student_id != self.student.id {
                self.student = Link::bare(student_id);
            }
        }
        if let Some(assignment_id) = input.assignment_id {
            if assignment_id != self.assignment.id {
                self.assignment = Link::bare(assignment_id);
            }
        }
        if let Some(score) = input.score {
            self.score = score;
        }
        self.submitted_date = input.submitted_date.or(self.submitted_date);
        self.comments = input.comments.or(self.comments.take());
    }
}

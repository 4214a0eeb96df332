//! Id joins between grades/attendance and the students and assignments they
//! reference. References are never trusted to resolve.

use std::collections::HashMap;

use crate::models::{Assignment, Entity, Grade, Link, Student};

use super::stats::{clamp_percentage, percentage, GradingScale, LetterGrade};

pub const UNKNOWN_STUDENT: &str = "Unknown Student";
pub const UNKNOWN_ASSIGNMENT: &str = "Unknown Assignment";

/// Point total assumed when a grade's assignment cannot be found.
pub const DEFAULT_TOTAL_POINTS: f64 = 100.0;

/// Linear scan for the row with `id`.
pub fn find_by_id<E: Entity>(rows: &[E], id: i64) -> Option<&E> {
    rows.iter().find(|row| row.id() == id)
}

/// Display name for a student reference: the embedded name if the backend
/// sent one, else the roster entry's full name, else [`UNKNOWN_STUDENT`].
pub fn student_name(students: &[Student], link: &Link) -> String {
    resolve_name(
        link,
        || find_by_id(students, link.id).map(Student::full_name),
        UNKNOWN_STUDENT,
    )
}

/// Display name for an assignment reference, falling back to [`UNKNOWN_ASSIGNMENT`].
pub fn assignment_name(assignments: &[Assignment], link: &Link) -> String {
    resolve_name(
        link,
        || find_by_id(assignments, link.id).map(|a| a.name.clone()),
        UNKNOWN_ASSIGNMENT,
    )
}

fn resolve_name(link: &Link, lookup: impl FnOnce() -> Option<String>, placeholder: &str) -> String {
    link.name
        .clone()
        .or_else(lookup)
        .unwrap_or_else(|| placeholder.to_string())
}

/// Hash index over students and assignments for views that join many rows.
///
/// When ids are duplicated the first row wins, matching [`find_by_id`].
#[derive(Debug, Clone, Default)]
pub struct Roster<'a> {
    students: HashMap<i64, &'a Student>,
    assignments: HashMap<i64, &'a Assignment>,
}

impl<'a> Roster<'a> {
    pub fn new(students: &'a [Student], assignments: &'a [Assignment]) -> Self {
        let mut roster = Self::default();
        for student in students {
            roster.students.entry(student.id).or_insert(student);
        }
        for assignment in assignments {
            roster.assignments.entry(assignment.id).or_insert(assignment);
        }
        roster
    }

    pub fn student(&self, id: i64) -> Option<&'a Student> {
        self.students.get(&id).copied()
    }

    pub fn assignment(&self, id: i64) -> Option<&'a Assignment> {
        self.assignments.get(&id).copied()
    }

    pub fn student_name(&self, link: &Link) -> String {
        resolve_name(
            link,
            || self.student(link.id).map(Student::full_name),
            UNKNOWN_STUDENT,
        )
    }

    pub fn assignment_name(&self, link: &Link) -> String {
        resolve_name(
            link,
            || self.assignment(link.id).map(|a| a.name.clone()),
            UNKNOWN_ASSIGNMENT,
        )
    }

    pub fn grade_row(&self, grade: &'a Grade) -> GradeRow<'a> {
        let assignment = self.assignment(grade.assignment.id);
        let total_points = assignment.map_or(DEFAULT_TOTAL_POINTS, |a| a.total_points);
        GradeRow {
            grade,
            student_name: self.student_name(&grade.student),
            assignment_name: self.assignment_name(&grade.assignment),
            category: assignment.map(|a| a.category.as_str()),
            total_points,
            percentage: percentage(grade.score, total_points),
        }
    }

    pub fn grade_rows(&self, grades: &'a [Grade]) -> Vec<GradeRow<'a>> {
        grades.iter().map(|grade| self.grade_row(grade)).collect()
    }
}

/// A grade joined with its student and assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeRow<'a> {
    pub grade: &'a Grade,
    pub student_name: String,
    pub assignment_name: String,
    /// `None` when the assignment is missing from the loaded set.
    pub category: Option<&'a str>,
    pub total_points: f64,
    /// Unclamped `score / total_points * 100`.
    pub percentage: f64,
}

impl GradeRow<'_> {
    /// Percentage clamped to `0..=100` for progress bars.
    pub fn display_percentage(&self) -> f64 {
        clamp_percentage(self.percentage)
    }

    pub fn letter(&self, scale: &GradingScale) -> LetterGrade {
        scale.letter(self.percentage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn student(id: i64, first: &str, last: &str) -> Student {
        Student {
            id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}@school.edu", first.to_lowercase()),
            grade: "10th Grade".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(2008, 1, 1).unwrap(),
            parent_contact: None,
            notes: None,
            status: Default::default(),
        }
    }

    fn assignment(id: i64, name: &str, total_points: f64) -> Assignment {
        Assignment {
            id,
            name: name.to_string(),
            category: "Science".to_string(),
            total_points,
            due_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            weight: None,
        }
    }

    fn grade(student: Link, assignment: Link, score: f64) -> Grade {
        Grade {
            id: 1,
            student,
            assignment,
            score,
            submitted_date: None,
            comments: None,
        }
    }

    #[test]
    fn embedded_name_wins_over_lookup() {
        let students = vec![student(1, "Ana", "Lee")];
        let name = student_name(&students, &Link::named(1, "A. Lee"));
        assert_eq!(name, "A. Lee");
    }

    #[test]
    fn bare_id_resolves_through_roster() {
        let students = vec![student(1, "Ana", "Lee")];
        assert_eq!(student_name(&students, &Link::bare(1)), "Ana Lee");
    }

    #[test]
    fn dangling_references_use_placeholders() {
        assert_eq!(student_name(&[], &Link::bare(5)), UNKNOWN_STUDENT);
        assert_eq!(assignment_name(&[], &Link::bare(9)), UNKNOWN_ASSIGNMENT);
        assert!(find_by_id::<Student>(&[], 5).is_none());
    }

    #[test]
    fn roster_keeps_first_duplicate() {
        let students = vec![student(1, "Ana", "Lee"), student(1, "Bob", "Ng")];
        let roster = Roster::new(&students, &[]);
        assert_eq!(roster.student_name(&Link::bare(1)), "Ana Lee");
    }

    #[test]
    fn grade_row_joins_points_and_category() {
        let students = vec![student(1, "Ana", "Lee")];
        let assignments = vec![assignment(2, "Lab Report", 50.0)];
        let grades = vec![grade(Link::bare(1), Link::bare(2), 45.0)];
        let roster = Roster::new(&students, &assignments);

        let row = roster.grade_row(&grades[0]);
        assert_eq!(row.student_name, "Ana Lee");
        assert_eq!(row.assignment_name, "Lab Report");
        assert_eq!(row.category, Some("Science"));
        assert_eq!(row.total_points, 50.0);
        assert_eq!(row.percentage, 90.0);
        assert_eq!(row.letter(&GradingScale::default()), LetterGrade::A);
    }

    #[test]
    fn grade_row_for_missing_assignment_assumes_hundred_points() {
        let grades = vec![grade(Link::bare(7), Link::named(3, "Essay"), 120.0)];
        let roster = Roster::new(&[], &[]);

        let row = roster.grade_row(&grades[0]);
        assert_eq!(row.student_name, UNKNOWN_STUDENT);
        assert_eq!(row.assignment_name, "Essay");
        assert_eq!(row.category, None);
        assert_eq!(row.total_points, DEFAULT_TOTAL_POINTS);
        assert_eq!(row.percentage, 120.0);
        assert_eq!(row.display_percentage(), 100.0);
    }
}

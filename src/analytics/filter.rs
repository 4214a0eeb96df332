//! Search and categorical filters for list views.
//!
//! Each filter is a stateless predicate. A view's filter set matches a row
//! only when every member accepts it, so the order in which members are
//! applied never changes the result.

use chrono::NaiveDate;

use crate::models::{Assignment, Attendance, AttendanceStatus, Student, StudentStatus};

use super::lookup::GradeRow;

/// A dropdown value: either the "all" sentinel or one concrete choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<T> {
    All,
    Only(T),
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Self::All
    }
}

impl<T: PartialEq> Selection<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == value,
        }
    }
}

impl<T> Selection<T> {
    /// `""` and `"all"` (any case) select everything; anything else must
    /// parse with `parse_value`.
    pub fn parse(raw: &str, parse_value: impl FnOnce(&str) -> Option<T>) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            return Some(Self::All);
        }
        parse_value(raw).map(Self::Only)
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn as_option(&self) -> Option<&T> {
        match self {
            Self::All => None,
            Self::Only(value) => Some(value),
        }
    }
}

impl<T> From<Option<T>> for Selection<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::All, Self::Only)
    }
}

/// A predicate over rows of type `T`.
pub trait Criterion<T: ?Sized> {
    fn accepts(&self, row: &T) -> bool;
}

/// Rows accepted by every criterion, in input order.
pub fn apply_all<'a, T>(rows: &'a [T], criteria: &[&dyn Criterion<T>]) -> Vec<&'a T> {
    rows.iter()
        .filter(|row| criteria.iter().all(|c| c.accepts(row)))
        .collect()
}

// ============================================================
// Search
// ============================================================

/// Case-insensitive substring search. The empty term matches every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchTerm(String);

impl SearchTerm {
    pub fn new(term: &str) -> Self {
        Self(term.trim().to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the term occurs in any of `fields`.
    pub fn matches_any<'f>(&self, fields: impl IntoIterator<Item = &'f str>) -> bool {
        self.is_empty()
            || fields
                .into_iter()
                .any(|field| field.to_lowercase().contains(&self.0))
    }
}

impl Criterion<Student> for SearchTerm {
    fn accepts(&self, student: &Student) -> bool {
        let name = student.full_name();
        self.matches_any([name.as_str(), &student.email, &student.grade])
    }
}

impl Criterion<GradeRow<'_>> for SearchTerm {
    fn accepts(&self, row: &GradeRow<'_>) -> bool {
        self.matches_any([row.student_name.as_str(), &row.assignment_name])
    }
}

impl Criterion<Assignment> for SearchTerm {
    fn accepts(&self, assignment: &Assignment) -> bool {
        self.matches_any([assignment.name.as_str(), &assignment.category])
    }
}

// ============================================================
// Categorical filters
// ============================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusIs(pub Selection<StudentStatus>);

impl Criterion<Student> for StatusIs {
    fn accepts(&self, student: &Student) -> bool {
        self.0.matches(&student.status)
    }
}

/// Exact match on the grade-level label, e.g. "10th Grade".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GradeLevelIs(pub Selection<String>);

impl Criterion<Student> for GradeLevelIs {
    fn accepts(&self, student: &Student) -> bool {
        self.0.matches(&student.grade)
    }
}

/// Exact match on an assignment category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryIs(pub Selection<String>);

impl CategoryIs {
    fn matches_label(&self, category: Option<&str>) -> bool {
        match &self.0 {
            Selection::All => true,
            Selection::Only(wanted) => category == Some(wanted.as_str()),
        }
    }
}

impl Criterion<Assignment> for CategoryIs {
    fn accepts(&self, assignment: &Assignment) -> bool {
        self.matches_label(Some(&assignment.category))
    }
}

/// Grades whose assignment is missing have no category and only pass "all".
impl Criterion<GradeRow<'_>> for CategoryIs {
    fn accepts(&self, row: &GradeRow<'_>) -> bool {
        self.matches_label(row.category)
    }
}

// ============================================================
// Per-view filter sets
// ============================================================

/// Student list: search plus grade level plus status.
#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    pub search: SearchTerm,
    pub grade_level: GradeLevelIs,
    pub status: StatusIs,
}

impl StudentFilter {
    pub fn matches(&self, student: &Student) -> bool {
        self.search.accepts(student)
            && self.grade_level.accepts(student)
            && self.status.accepts(student)
    }

    pub fn apply<'a>(&self, students: &'a [Student]) -> Vec<&'a Student> {
        students.iter().filter(|s| self.matches(s)).collect()
    }
}

/// Grade list: search over joined names plus assignment category.
#[derive(Debug, Clone, Default)]
pub struct GradeFilter {
    pub search: SearchTerm,
    pub category: CategoryIs,
}

impl GradeFilter {
    pub fn matches(&self, row: &GradeRow<'_>) -> bool {
        self.search.accepts(row) && self.category.accepts(row)
    }

    pub fn apply<'r, 'a>(&self, rows: &'r [GradeRow<'a>]) -> Vec<&'r GradeRow<'a>> {
        rows.iter().filter(|row| self.matches(row)).collect()
    }
}

/// Assignment list and calendar: search plus category.
#[derive(Debug, Clone, Default)]
pub struct AssignmentFilter {
    pub search: SearchTerm,
    pub category: CategoryIs,
}

impl AssignmentFilter {
    pub fn matches(&self, assignment: &Assignment) -> bool {
        self.search.accepts(assignment) && self.category.accepts(assignment)
    }

    pub fn apply<'a>(&self, assignments: &'a [Assignment]) -> Vec<&'a Assignment> {
        assignments.iter().filter(|a| self.matches(a)).collect()
    }
}

/// Attendance list: by student, by day and by status.
#[derive(Debug, Clone, Default)]
pub struct AttendanceFilter {
    pub student: Selection<i64>,
    pub date: Selection<NaiveDate>,
    pub status: Selection<AttendanceStatus>,
}

impl Criterion<Attendance> for AttendanceFilter {
    fn accepts(&self, record: &Attendance) -> bool {
        self.matches(record)
    }
}

impl AttendanceFilter {
    pub fn matches(&self, record: &Attendance) -> bool {
        self.student.matches(&record.student.id)
            && self.date.matches(&record.date)
            && self.status.matches(&record.status)
    }

    pub fn apply<'a>(&self, records: &'a [Attendance]) -> Vec<&'a Attendance> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::lookup::Roster;
    use crate::models::{Grade, Link};

    fn student(id: i64, first: &str, last: &str, grade: &str, status: StudentStatus) -> Student {
        Student {
            id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}.{}@school.edu", first.to_lowercase(), last.to_lowercase()),
            grade: grade.to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(2008, 1, 1).unwrap(),
            parent_contact: None,
            notes: None,
            status,
        }
    }

    fn roster() -> Vec<Student> {
        vec![
            student(1, "Ana", "Lee", "10th Grade", StudentStatus::Active),
            student(2, "Bob", "Ng", "11th Grade", StudentStatus::Active),
            student(3, "Dana", "Ruiz", "10th Grade", StudentStatus::Inactive),
        ]
    }

    #[test]
    fn selection_parses_all_sentinel() {
        assert_eq!(Selection::parse("all", StudentStatus::from_str), Some(Selection::All));
        assert_eq!(Selection::parse("", StudentStatus::from_str), Some(Selection::All));
        assert_eq!(
            Selection::parse("Inactive", StudentStatus::from_str),
            Some(Selection::Only(StudentStatus::Inactive))
        );
        assert_eq!(Selection::parse("graduated", StudentStatus::from_str), None);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let students = roster();
        let filter = StudentFilter {
            search: SearchTerm::new("ANA"),
            ..Default::default()
        };
        // "Ana Lee" and "Dana Ruiz" both contain "ana".
        let ids: Vec<i64> = filter.apply(&students).iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn search_covers_email_and_grade_label() {
        let students = roster();
        assert!(SearchTerm::new("bob.ng@").accepts(&students[1]));
        assert!(SearchTerm::new("11th").accepts(&students[1]));
        assert!(!SearchTerm::new("12th").accepts(&students[1]));
    }

    #[test]
    fn empty_filters_match_everything() {
        let students = roster();
        assert_eq!(StudentFilter::default().apply(&students).len(), students.len());
    }

    #[test]
    fn filters_combine_with_and() {
        let students = roster();
        let filter = StudentFilter {
            search: SearchTerm::new("a"),
            grade_level: GradeLevelIs(Selection::Only("10th Grade".to_string())),
            status: StatusIs(Selection::Only(StudentStatus::Active)),
        };
        let ids: Vec<i64> = filter.apply(&students).iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn grade_search_matches_placeholder_name() {
        let grades = vec![Grade {
            id: 1,
            student: Link::bare(99),
            assignment: Link::named(1, "Quiz"),
            score: 80.0,
            submitted_date: None,
            comments: None,
        }];
        let roster = Roster::new(&[], &[]);
        let rows = roster.grade_rows(&grades);

        let filter = GradeFilter {
            search: SearchTerm::new("unknown"),
            ..Default::default()
        };
        assert_eq!(filter.apply(&rows).len(), 1);

        let by_category = GradeFilter {
            category: CategoryIs(Selection::Only("Science".to_string())),
            ..Default::default()
        };
        assert!(by_category.apply(&rows).is_empty());
    }

    #[test]
    fn attendance_filter_by_student_and_day() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let record = |id, student, date, status| Attendance {
            id,
            student: Link::bare(student),
            date,
            status,
            notes: None,
        };
        let records = vec![
            record(1, 1, day, AttendanceStatus::Present),
            record(2, 2, day, AttendanceStatus::Absent),
            record(3, 1, day.succ_opt().unwrap(), AttendanceStatus::Late),
        ];

        let filter = AttendanceFilter {
            student: Selection::Only(1),
            date: Selection::Only(day),
            ..Default::default()
        };
        let ids: Vec<i64> = filter.apply(&records).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1]);
    }
}

//! Aggregates shown on the dashboard and report pages.
//!
//! Every ratio is zero when its denominator is zero. Values keep full
//! precision; rounding happens only in [`round1`] / [`format_percent`] at the
//! display edge.

use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Assignment, Attendance, AttendanceStatus, Grade, Student};

/// Arithmetic mean, or 0 for an empty input.
pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count > 0 {
        sum / count as f64
    } else {
        0.0
    }
}

/// `100 * part / total`, or 0 when `total` is 0.
pub fn ratio_percent(part: usize, total: usize) -> f64 {
    if total > 0 {
        100.0 * part as f64 / total as f64
    } else {
        0.0
    }
}

/// `score / total_points * 100`, unclamped. 0 when the point total is not
/// positive.
pub fn percentage(score: f64, total_points: f64) -> f64 {
    if total_points > 0.0 {
        score / total_points * 100.0
    } else {
        0.0
    }
}

/// Clamp a percentage into `0..=100` for display.
pub fn clamp_percentage(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Round to one decimal place, half away from zero.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// One-decimal percentage label, e.g. `66.7%`.
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", round1(value))
}

/// Mean raw score over `grades`.
pub fn average_score<'a>(grades: impl IntoIterator<Item = &'a Grade>) -> f64 {
    mean(grades.into_iter().map(|g| g.score))
}

/// Share of `records` marked present, in `0..=100`.
pub fn attendance_rate<'a>(records: impl IntoIterator<Item = &'a Attendance>) -> f64 {
    AttendanceBreakdown::tally(records).rate()
}

/// Number of distinct students referenced by `grades`.
pub fn graded_student_count<'a>(grades: impl IntoIterator<Item = &'a Grade>) -> usize {
    grades
        .into_iter()
        .map(|g| g.student.id)
        .collect::<HashSet<_>>()
        .len()
}

// ============================================================
// Attendance breakdown
// ============================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceBreakdown {
    pub total: usize,
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    pub excused: usize,
}

impl AttendanceBreakdown {
    pub fn tally<'a>(records: impl IntoIterator<Item = &'a Attendance>) -> Self {
        let mut breakdown = Self::default();
        for record in records {
            breakdown.total += 1;
            match record.status {
                AttendanceStatus::Present => breakdown.present += 1,
                AttendanceStatus::Absent => breakdown.absent += 1,
                AttendanceStatus::Late => breakdown.late += 1,
                AttendanceStatus::Excused => breakdown.excused += 1,
            }
        }
        breakdown
    }

    pub fn rate(&self) -> f64 {
        ratio_percent(self.present, self.total)
    }
}

// ============================================================
// Grading scale
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LetterGrade {
    A,
    B,
    C,
    D,
    F,
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        };
        f.write_str(letter)
    }
}

/// Percentage thresholds, highest first. Anything below the last band is `F`.
#[derive(Debug, Clone, PartialEq)]
pub struct GradingScale {
    bands: Vec<(f64, LetterGrade)>,
}

impl Default for GradingScale {
    fn default() -> Self {
        Self {
            bands: vec![
                (90.0, LetterGrade::A),
                (80.0, LetterGrade::B),
                (70.0, LetterGrade::C),
                (60.0, LetterGrade::D),
            ],
        }
    }
}

impl GradingScale {
    pub fn letter(&self, percentage: f64) -> LetterGrade {
        self.bands
            .iter()
            .find(|(min, _)| percentage >= *min)
            .map_or(LetterGrade::F, |(_, letter)| *letter)
    }
}

// ============================================================
// Page-level aggregates
// ============================================================

/// Headline numbers for the dashboard. Attendance covers `today` only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_students: usize,
    pub active_students: usize,
    pub average_score: f64,
    pub attendance_rate: f64,
    pub attendance_today: AttendanceBreakdown,
    pub total_assignments: usize,
    pub graded_students: usize,
}

impl DashboardStats {
    pub fn compute(
        students: &[Student],
        grades: &[Grade],
        attendance: &[Attendance],
        assignments: &[Assignment],
        today: NaiveDate,
    ) -> Self {
        let attendance_today =
            AttendanceBreakdown::tally(attendance.iter().filter(|a| a.date == today));
        Self {
            total_students: students.len(),
            active_students: students.iter().filter(|s| s.is_active()).count(),
            average_score: average_score(grades),
            attendance_rate: attendance_today.rate(),
            attendance_today,
            total_assignments: assignments.len(),
            graded_students: graded_student_count(grades),
        }
    }
}

/// Whole-class report over every loaded record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassReport {
    pub total_students: usize,
    pub active_students: usize,
    pub average_score: f64,
    pub attendance: AttendanceBreakdown,
    pub attendance_rate: f64,
    pub total_assignments: usize,
}

impl ClassReport {
    pub fn compute(
        students: &[Student],
        grades: &[Grade],
        attendance: &[Attendance],
        assignments: &[Assignment],
    ) -> Self {
        let breakdown = AttendanceBreakdown::tally(attendance);
        Self {
            total_students: students.len(),
            active_students: students.iter().filter(|s| s.is_active()).count(),
            average_score: average_score(grades),
            attendance: breakdown,
            attendance_rate: breakdown.rate(),
            total_assignments: assignments.len(),
        }
    }
}

/// One student's grade and attendance aggregates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentSummary {
    pub student_id: i64,
    pub name: String,
    pub grade_level: String,
    pub average_score: f64,
    pub graded_count: usize,
    pub attendance: AttendanceBreakdown,
    pub attendance_rate: f64,
}

impl StudentSummary {
    pub fn compute(student: &Student, grades: &[Grade], attendance: &[Attendance]) -> Self {
        let own_grades: Vec<&Grade> = grades.iter().filter(|g| g.student.id == student.id).collect();
        let breakdown =
            AttendanceBreakdown::tally(attendance.iter().filter(|a| a.student.id == student.id));
        Self {
            student_id: student.id,
            name: student.full_name(),
            grade_level: student.grade.clone(),
            average_score: average_score(own_grades.iter().copied()),
            graded_count: own_grades.len(),
            attendance: breakdown,
            attendance_rate: breakdown.rate(),
        }
    }
}

/// Per-student summaries in roster order.
pub fn student_summaries(
    students: &[Student],
    grades: &[Grade],
    attendance: &[Attendance],
) -> Vec<StudentSummary> {
    students
        .iter()
        .map(|student| StudentSummary::compute(student, grades, attendance))
        .collect()
}

// ============================================================
// Categories
// ============================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Distinct non-empty categories in first-seen order.
pub fn distinct_categories(assignments: &[Assignment]) -> Vec<String> {
    category_counts(assignments)
        .into_iter()
        .map(|c| c.category)
        .collect()
}

/// Assignment count per category, in first-seen order. Blank labels are skipped.
pub fn category_counts(assignments: &[Assignment]) -> Vec<CategoryCount> {
    let mut counts: Vec<CategoryCount> = Vec::new();
    for assignment in assignments {
        if assignment.category.trim().is_empty() {
            continue;
        }
        match counts.iter_mut().find(|c| c.category == assignment.category) {
            Some(entry) => entry.count += 1,
            None => counts.push(CategoryCount {
                category: assignment.category.clone(),
                count: 1,
            }),
        }
    }
    counts
}

// ============================================================
// Recent activity
// ============================================================

/// Most recently submitted grades, newest first. Unsubmitted grades are skipped.
pub fn recent_grades(grades: &[Grade], limit: usize) -> Vec<&Grade> {
    let mut submitted: Vec<&Grade> = grades.iter().filter(|g| g.is_submitted()).collect();
    submitted.sort_by(|a, b| b.submitted_date.cmp(&a.submitted_date));
    submitted.truncate(limit);
    submitted
}

/// Latest attendance records by date, newest first.
pub fn recent_attendance(records: &[Attendance], limit: usize) -> Vec<&Attendance> {
    let mut recent: Vec<&Attendance> = records.iter().collect();
    recent.sort_by(|a, b| b.date.cmp(&a.date));
    recent.truncate(limit);
    recent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Link;

    fn record(status: AttendanceStatus) -> Attendance {
        Attendance {
            id: 1,
            student: Link::bare(1),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            status,
            notes: None,
        }
    }

    #[test]
    fn mean_of_nothing_is_zero() {
        assert_eq!(mean(std::iter::empty()), 0.0);
        assert_eq!(mean([2.0, 4.0]), 3.0);
    }

    #[test]
    fn ratio_guards_zero_denominator() {
        assert_eq!(ratio_percent(0, 0), 0.0);
        assert_eq!(ratio_percent(1, 4), 25.0);
    }

    #[test]
    fn percentage_keeps_precision_until_display() {
        assert!((percentage(110.0, 100.0) - 110.0).abs() < 1e-9);
        assert_eq!(percentage(45.0, 40.0), 112.5);
        assert_eq!(clamp_percentage(110.0), 100.0);
        assert_eq!(clamp_percentage(-5.0), 0.0);
        assert_eq!(percentage(5.0, 0.0), 0.0);
    }

    #[test]
    fn formats_one_decimal() {
        assert_eq!(round1(200.0 / 3.0), 66.7);
        assert_eq!(format_percent(200.0 / 3.0), "66.7%");
        assert_eq!(format_percent(0.0), "0.0%");
    }

    #[test]
    fn breakdown_counts_each_status() {
        let records = vec![
            record(AttendanceStatus::Present),
            record(AttendanceStatus::Late),
            record(AttendanceStatus::Absent),
            record(AttendanceStatus::Excused),
        ];
        let breakdown = AttendanceBreakdown::tally(&records);
        assert_eq!(breakdown.total, 4);
        assert_eq!(breakdown.present, 1);
        assert_eq!(breakdown.late, 1);
        assert_eq!(breakdown.rate(), 25.0);
    }

    #[test]
    fn scale_boundaries_are_inclusive() {
        let scale = GradingScale::default();
        assert_eq!(scale.letter(90.0), LetterGrade::A);
        assert_eq!(scale.letter(89.99), LetterGrade::B);
        assert_eq!(scale.letter(70.0), LetterGrade::C);
        assert_eq!(scale.letter(60.0), LetterGrade::D);
        assert_eq!(scale.letter(59.9), LetterGrade::F);
        assert_eq!(scale.letter(f64::NAN), LetterGrade::F);
    }
}

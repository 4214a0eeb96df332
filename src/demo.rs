//! Sample class used by the offline build (`--source demo`) and `serve --seed`.
//!
//! Dates are laid out around `today` so the dashboard, calendar and upcoming
//! list always have something to show. One grade points at a student id that
//! is not on the roster.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};

use crate::models::*;
use crate::repository::Snapshot;

const STUDENTS: &[(&str, &str, &str, (i32, u32, u32), StudentStatus)] = &[
    ("Ana", "Lee", "10th Grade", (2009, 4, 12), StudentStatus::Active),
    ("Bob", "Ng", "10th Grade", (2009, 9, 3), StudentStatus::Active),
    ("Carmen", "Diaz", "11th Grade", (2008, 1, 27), StudentStatus::Active),
    ("Dev", "Patel", "11th Grade", (2008, 6, 18), StudentStatus::Pending),
    ("Elena", "Rossi", "12th Grade", (2007, 11, 5), StudentStatus::Active),
    ("Farid", "Haddad", "12th Grade", (2007, 2, 14), StudentStatus::Inactive),
];

/// (name, category, total points, due in days relative to today, weight)
const ASSIGNMENTS: &[(&str, &str, f64, i64, Option<f64>)] = &[
    ("Algebra Quiz", "Mathematics", 20.0, -12, Some(10.0)),
    ("Lab Report: Density", "Science", 50.0, -5, Some(20.0)),
    ("Persuasive Essay", "English", 100.0, 0, Some(25.0)),
    ("Geometry Worksheet", "Mathematics", 30.0, 3, None),
    ("Cell Structure Test", "Science", 100.0, 9, Some(30.0)),
    ("Civil War Timeline", "History", 40.0, 16, None),
];

/// (student id, assignment id, score, submitted days ago)
const GRADES: &[(i64, i64, f64, Option<u64>)] = &[
    (1, 1, 18.0, Some(12)),
    (2, 1, 14.5, Some(11)),
    (3, 1, 20.0, Some(12)),
    (5, 1, 11.0, Some(10)),
    (1, 2, 46.0, Some(5)),
    (2, 2, 38.0, Some(4)),
    (3, 2, 41.0, Some(5)),
    (5, 2, 29.0, None),
    (1, 3, 92.0, Some(0)),
    (7, 2, 44.0, Some(6)),
];

/// Attendance pattern per student over the last five school days, newest last.
const ATTENDANCE: &[(i64, [AttendanceStatus; 5])] = {
    use AttendanceStatus::*;
    &[
        (1, [Present, Present, Present, Present, Present]),
        (2, [Present, Late, Present, Absent, Present]),
        (3, [Present, Present, Excused, Present, Late]),
        (4, [Absent, Present, Present, Present, Absent]),
        (5, [Present, Present, Present, Late, Present]),
    ]
};

/// Build the sample data relative to `today`.
pub fn snapshot(today: NaiveDate) -> Snapshot {
    let students = STUDENTS
        .iter()
        .zip(1..)
        .map(|(&(first, last, grade, (y, m, d), status), id)| Student {
            id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}.{}@school.edu", first.to_lowercase(), last.to_lowercase()),
            grade: grade.to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(y, m, d).unwrap_or(today),
            parent_contact: Some(format!("555-01{:02}", id)),
            notes: None,
            status,
        })
        .collect();

    let assignments = ASSIGNMENTS
        .iter()
        .zip(1..)
        .map(|(&(name, category, total_points, due_in, weight), id)| Assignment {
            id,
            name: name.to_string(),
            category: category.to_string(),
            total_points,
            due_date: shift(today, due_in),
            weight,
        })
        .collect();

    let grades = GRADES
        .iter()
        .zip(1..)
        .map(|(&(student_id, assignment_id, score, submitted), id)| Grade {
            id,
            student: Link::bare(student_id),
            assignment: Link::bare(assignment_id),
            score,
            submitted_date: submitted.map(|days_ago| noon(shift(today, -(days_ago as i64)))),
            comments: None,
        })
        .collect();

    let attendance = ATTENDANCE
        .iter()
        .flat_map(|(student_id, pattern)| {
            pattern.iter().enumerate().map(move |(i, status)| (*student_id, 4 - i as i64, *status))
        })
        .zip(1..)
        .map(|((student_id, days_ago, status), id)| Attendance {
            id,
            student: Link::bare(student_id),
            date: shift(today, -days_ago),
            status,
            notes: (status == AttendanceStatus::Excused).then(|| "Doctor's appointment".to_string()),
        })
        .collect();

    Snapshot {
        students,
        assignments,
        grades,
        attendance,
    }
}

fn shift(date: NaiveDate, days: i64) -> NaiveDate {
    let delta = Days::new(days.unsigned_abs());
    let shifted = if days >= 0 {
        date.checked_add_days(delta)
    } else {
        date.checked_sub_days(delta)
    };
    shifted.unwrap_or(date)
}

fn noon(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default())
        .and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::lookup::{student_name, UNKNOWN_STUDENT};

    #[test]
    fn ids_are_unique_and_positive() {
        let data = snapshot(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let mut ids: Vec<i64> = data.attendance.iter().map(|a| a.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), data.attendance.len());
        assert!(data.students.iter().all(|s| s.id > 0));
    }

    #[test]
    fn includes_today_and_a_dangling_reference() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let data = snapshot(today);

        assert!(data.attendance.iter().any(|a| a.date == today));
        assert!(data.assignments.iter().any(|a| a.due_date == today));
        assert!(data
            .grades
            .iter()
            .any(|g| student_name(&data.students, &g.student) == UNKNOWN_STUDENT));
    }
}

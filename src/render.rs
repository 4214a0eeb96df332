//! Plain-text rendering of derived views for the terminal.

use chrono::{Datelike, NaiveDate};

use crate::analytics::calendar::{AttendanceGrid, MonthCalendar, Upcoming};
use crate::analytics::lookup::{GradeRow, Roster};
use crate::analytics::stats::{
    format_percent, round1, CategoryCount, ClassReport, DashboardStats, GradingScale,
    StudentSummary,
};
use crate::models::{Assignment, Attendance, Grade, Student};

/// Marks a calendar day with something due.
const DUE_MARK: char = '*';
/// Stands in for days of adjacent months in the calendar grid.
const OUTSIDE_MONTH: &str = ".";

/// Left-aligned columns separated by two spaces, header underlined.
///
/// ```text
/// ID  Name
/// --  -------
/// 1   Ana Lee
/// ```
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let header: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    push_row(&mut output, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut output, &rule, &widths);
    for row in rows {
        push_row(&mut output, row, &widths);
    }
    output
}

fn push_row(output: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (cell, width) in cells.iter().zip(widths) {
        let pad = width.saturating_sub(cell.chars().count());
        line.push_str(cell);
        line.push_str(&" ".repeat(pad + 2));
    }
    output.push_str(line.trim_end());
    output.push('\n');
}

fn short_date(date: NaiveDate) -> String {
    date.format("%b %d").to_string()
}

fn format_score(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value)
    } else {
        format!("{:.1}", value)
    }
}

// ============================================================
// Pages
// ============================================================

pub fn render_dashboard(
    stats: &DashboardStats,
    roster: &Roster<'_>,
    recent_grades: &[&Grade],
    recent_attendance: &[&Attendance],
    upcoming: &[Upcoming<'_, Assignment>],
) -> String {
    let today = &stats.attendance_today;
    let mut output = String::new();
    output.push_str(&format!(
        "Students          {} ({} active)\n",
        stats.total_students, stats.active_students
    ));
    output.push_str(&format!("Average score     {:.1}\n", round1(stats.average_score)));
    output.push_str(&format!(
        "Attendance today  {} ({}/{} present)\n",
        format_percent(stats.attendance_rate),
        today.present,
        today.total
    ));
    output.push_str(&format!("Assignments       {}\n", stats.total_assignments));
    output.push_str(&format!("Graded students   {}\n", stats.graded_students));

    output.push_str("\nRecent grades\n");
    if recent_grades.is_empty() {
        output.push_str("  (none)\n");
    }
    for grade in recent_grades {
        let row = roster.grade_row(grade);
        output.push_str(&format!(
            "  {}  {}  {}\n",
            row.student_name,
            row.assignment_name,
            format_percent(row.display_percentage())
        ));
    }

    output.push_str("\nRecent attendance\n");
    if recent_attendance.is_empty() {
        output.push_str("  (none)\n");
    }
    for record in recent_attendance {
        output.push_str(&format!(
            "  {}  {}  {}\n",
            record.date,
            roster.student_name(&record.student),
            record.status.label()
        ));
    }

    output.push_str("\nUpcoming\n");
    output.push_str(&render_upcoming(upcoming));
    output
}

pub fn render_report(
    report: &ClassReport,
    summaries: &[StudentSummary],
    categories: &[CategoryCount],
) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Students          {} ({} active)\n",
        report.total_students, report.active_students
    ));
    output.push_str(&format!("Average score     {:.1}\n", round1(report.average_score)));
    output.push_str(&format!(
        "Attendance        {} (P {} / A {} / L {} / E {})\n",
        format_percent(report.attendance_rate),
        report.attendance.present,
        report.attendance.absent,
        report.attendance.late,
        report.attendance.excused
    ));
    output.push_str(&format!("Assignments       {}\n\n", report.total_assignments));

    let rows: Vec<Vec<String>> = summaries
        .iter()
        .map(|s| {
            vec![
                s.name.clone(),
                s.grade_level.clone(),
                format!("{:.1}", round1(s.average_score)),
                s.graded_count.to_string(),
                format!("{}/{}", s.attendance.present, s.attendance.total),
                format_percent(s.attendance_rate),
            ]
        })
        .collect();
    output.push_str(&render_table(
        &["Student", "Grade", "Avg score", "Graded", "Present", "Rate"],
        &rows,
    ));

    if !categories.is_empty() {
        output.push('\n');
        let rows: Vec<Vec<String>> = categories
            .iter()
            .map(|c| vec![c.category.clone(), c.count.to_string()])
            .collect();
        output.push_str(&render_table(&["Category", "Assignments"], &rows));
    }
    output
}

pub fn render_students(students: &[&Student]) -> String {
    let rows: Vec<Vec<String>> = students
        .iter()
        .map(|s| {
            vec![
                s.id.to_string(),
                s.full_name(),
                s.email.clone(),
                s.grade.clone(),
                s.status.label().to_string(),
            ]
        })
        .collect();
    render_table(&["ID", "Name", "Email", "Grade", "Status"], &rows)
}

pub fn render_grades(rows: &[&GradeRow<'_>], scale: &GradingScale) -> String {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.grade.id.to_string(),
                row.student_name.clone(),
                row.assignment_name.clone(),
                row.category.unwrap_or("-").to_string(),
                format!(
                    "{}/{}",
                    format_score(row.grade.score),
                    format_score(row.total_points)
                ),
                format_percent(row.display_percentage()),
                row.letter(scale).to_string(),
            ]
        })
        .collect();
    render_table(
        &["ID", "Student", "Assignment", "Category", "Score", "Percent", "Letter"],
        &rows,
    )
}

/// Confirmation line after a grade is entered.
pub fn render_grade_entry(row: &GradeRow<'_>, scale: &GradingScale) -> String {
    format!(
        "Recorded {} ({}) for {} on {} (id {})\n",
        format_percent(row.display_percentage()),
        row.letter(scale),
        row.student_name,
        row.assignment_name,
        row.grade.id
    )
}

// ============================================================
// Calendar
// ============================================================

/// Month grid with day numbers; days with something due carry `*`.
pub fn render_calendar(calendar: &MonthCalendar<'_, Assignment>) -> String {
    let mut output = format!("{}\n", calendar.month);
    let header: String = calendar
        .week_start
        .day_names()
        .iter()
        .map(|name| format!("{:>4} ", name))
        .collect();
    output.push_str(header.trim_end());
    output.push('\n');

    for week in calendar.weeks() {
        let line: String = week
            .iter()
            .map(|day| {
                let label = if day.in_month {
                    day.date.day().to_string()
                } else {
                    OUTSIDE_MONTH.to_string()
                };
                let mark = if day.items.is_empty() { ' ' } else { DUE_MARK };
                format!("{:>4}{}", label, mark)
            })
            .collect();
        output.push_str(line.trim_end());
        output.push('\n');
    }

    let due: Vec<String> = calendar
        .days
        .iter()
        .filter(|day| day.in_month)
        .flat_map(|day| {
            day.items
                .iter()
                .map(move |a| format!("  {}  {} ({})", short_date(day.date), a.name, a.category))
        })
        .collect();
    if !due.is_empty() {
        output.push('\n');
        for line in due {
            output.push_str(&line);
            output.push('\n');
        }
    }
    output
}

pub fn render_upcoming(upcoming: &[Upcoming<'_, Assignment>]) -> String {
    if upcoming.is_empty() {
        return "  (nothing due)\n".to_string();
    }
    upcoming
        .iter()
        .map(|u| {
            format!(
                "  {}  {} ({})  {}\n",
                short_date(u.item.due_date),
                u.item.name,
                u.item.category,
                u.label
            )
        })
        .collect()
}

/// One line per student, one symbol per day of the month.
pub fn render_attendance_grid(grid: &AttendanceGrid<'_>) -> String {
    let names: Vec<String> = grid.rows.iter().map(|r| r.student.full_name()).collect();
    let width = names
        .iter()
        .map(|n| n.chars().count())
        .max()
        .unwrap_or(0)
        .max("Student".len());

    let mut output = format!("{}\n", grid.month);
    let days: String = grid
        .days
        .iter()
        .map(|d| char::from_digit(d.day() % 10, 10).unwrap_or(' '))
        .collect();
    output.push_str(&format!("{:<width$}  {}\n", "Student", days, width = width));
    for (name, row) in names.iter().zip(&grid.rows) {
        output.push_str(&format!("{:<width$}  {}\n", name, row.symbols(), width = width));
    }
    output
}

//! Month grids, per-day buckets and the upcoming-deadline list.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{Assignment, Attendance, AttendanceStatus, Student};

/// Shown in the attendance grid for a day without a record.
pub const NO_RECORD_SYMBOL: char = '·';

/// First column of every calendar week.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    /// Days between the start of `date`'s week and `date` (0..=6).
    pub fn offset(&self, date: NaiveDate) -> u64 {
        let weekday = date.weekday();
        u64::from(match self {
            Self::Sunday => weekday.num_days_from_sunday(),
            Self::Monday => weekday.num_days_from_monday(),
        })
    }

    /// Column headings in display order.
    pub fn day_names(&self) -> [&'static str; 7] {
        match self {
            Self::Sunday => ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"],
            Self::Monday => ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
        }
    }
}

// ============================================================
// Month
// ============================================================

/// A calendar month, stored as its first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    first: NaiveDate,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first| Self { first })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            first: date.with_day(1).unwrap_or(date),
        }
    }

    /// Parse `YYYY-MM`.
    pub fn parse(raw: &str) -> Option<Self> {
        let first = NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d").ok()?;
        Some(Self { first })
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn last_day(&self) -> NaiveDate {
        self.first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }

    /// Every day of the month, in order.
    pub fn days(&self) -> Vec<NaiveDate> {
        let last = self.last_day();
        self.first.iter_days().take_while(|day| *day <= last).collect()
    }

    pub fn next(&self) -> Self {
        self.first
            .checked_add_months(Months::new(1))
            .map_or(*self, |first| Self { first })
    }

    pub fn prev(&self) -> Self {
        self.first
            .checked_sub_months(Months::new(1))
            .map_or(*self, |first| Self { first })
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first.format("%B %Y"))
    }
}

/// Whole weeks covering `month`: from the week start on or before the 1st to
/// the week end on or after the last day.
pub fn month_grid(month: Month, week_start: WeekStart) -> Vec<NaiveDate> {
    let first = month.first_day();
    let last = month.last_day();
    let start = first
        .checked_sub_days(Days::new(week_start.offset(first)))
        .unwrap_or(first);
    let end = last
        .checked_add_days(Days::new(6 - week_start.offset(last)))
        .unwrap_or(last);
    start.iter_days().take_while(|day| *day <= end).collect()
}

// ============================================================
// Day buckets
// ============================================================

/// Anything placed on a calendar by a single day.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

impl Dated for Assignment {
    fn date(&self) -> NaiveDate {
        self.due_date
    }
}

impl Dated for Attendance {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Items falling exactly on `day`, in input order.
pub fn on_day<'a, T: Dated>(items: impl IntoIterator<Item = &'a T>, day: NaiveDate) -> Vec<&'a T> {
    items.into_iter().filter(|item| item.date() == day).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarDay<'a, T> {
    pub date: NaiveDate,
    /// False for the leading and trailing days borrowed from adjacent months.
    pub in_month: bool,
    pub is_today: bool,
    pub items: Vec<&'a T>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthCalendar<'a, T> {
    pub month: Month,
    pub week_start: WeekStart,
    pub days: Vec<CalendarDay<'a, T>>,
}

impl<'a, T: Dated> MonthCalendar<'a, T> {
    pub fn build(
        month: Month,
        week_start: WeekStart,
        items: impl IntoIterator<Item = &'a T>,
        today: NaiveDate,
    ) -> Self {
        let mut buckets: BTreeMap<NaiveDate, Vec<&'a T>> = BTreeMap::new();
        for item in items {
            buckets.entry(item.date()).or_default().push(item);
        }

        let days = month_grid(month, week_start)
            .into_iter()
            .map(|date| CalendarDay {
                date,
                in_month: month.contains(date),
                is_today: date == today,
                items: buckets.remove(&date).unwrap_or_default(),
            })
            .collect();

        Self {
            month,
            week_start,
            days,
        }
    }

    pub fn weeks(&self) -> impl Iterator<Item = &[CalendarDay<'a, T>]> {
        self.days.chunks(7)
    }

    /// Items on `date`; empty for days outside the grid.
    pub fn items_on(&self, date: NaiveDate) -> &[&'a T] {
        self.days
            .iter()
            .find(|day| day.date == date)
            .map(|day| day.items.as_slice())
            .unwrap_or(&[])
    }
}

// ============================================================
// Upcoming
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueLabel {
    Today,
    Tomorrow,
    DaysLeft(i64),
}

impl DueLabel {
    pub fn from_days(days: i64) -> Self {
        match days {
            0 => Self::Today,
            1 => Self::Tomorrow,
            n => Self::DaysLeft(n),
        }
    }
}

impl fmt::Display for DueLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Today => f.write_str("Due today"),
            Self::Tomorrow => f.write_str("Due tomorrow"),
            Self::DaysLeft(n) => write!(f, "{} days left", n),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Upcoming<'a, T> {
    pub item: &'a T,
    pub days_left: i64,
    pub label: DueLabel,
}

/// Items dated today or later, soonest first, at most `limit`. Items on the
/// same day keep their input order.
pub fn upcoming<'a, T: Dated>(
    items: impl IntoIterator<Item = &'a T>,
    today: NaiveDate,
    limit: usize,
) -> Vec<Upcoming<'a, T>> {
    let mut pending: Vec<&'a T> = items.into_iter().filter(|item| item.date() >= today).collect();
    pending.sort_by_key(|item| item.date());
    pending
        .into_iter()
        .take(limit)
        .map(|item| {
            let days_left = (item.date() - today).num_days();
            Upcoming {
                item,
                days_left,
                label: DueLabel::from_days(days_left),
            }
        })
        .collect()
}

// ============================================================
// Attendance grid
// ============================================================

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceGridRow<'a> {
    pub student: &'a Student,
    /// One entry per day of the month.
    pub cells: Vec<Option<AttendanceStatus>>,
}

impl AttendanceGridRow<'_> {
    pub fn symbols(&self) -> String {
        self.cells
            .iter()
            .map(|cell| cell.map_or(NO_RECORD_SYMBOL, |status| status.symbol()))
            .collect()
    }
}

/// Students × days of one month.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceGrid<'a> {
    pub month: Month,
    pub days: Vec<NaiveDate>,
    pub rows: Vec<AttendanceGridRow<'a>>,
}

impl<'a> AttendanceGrid<'a> {
    /// Rows for the first `max_rows` students in roster order. When a student
    /// has several records on one day the first one is shown.
    pub fn build(
        month: Month,
        students: &'a [Student],
        records: &[Attendance],
        max_rows: usize,
    ) -> Self {
        let mut index: HashMap<(i64, NaiveDate), AttendanceStatus> = HashMap::new();
        for record in records.iter().filter(|r| month.contains(r.date)) {
            index
                .entry((record.student.id, record.date))
                .or_insert(record.status);
        }

        let days = month.days();
        let rows = students
            .iter()
            .take(max_rows)
            .map(|student| AttendanceGridRow {
                student,
                cells: days
                    .iter()
                    .map(|day| index.get(&(student.id, *day)).copied())
                    .collect(),
            })
            .collect();

        Self { month, days, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Link;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn assignment(id: i64, due: NaiveDate) -> Assignment {
        Assignment {
            id,
            name: format!("Assignment {}", id),
            category: "Homework".to_string(),
            total_points: 100.0,
            due_date: due,
            weight: None,
        }
    }

    #[test]
    fn month_bounds_handle_leap_years() {
        let feb = Month::new(2024, 2).unwrap();
        assert_eq!(feb.last_day(), date(2024, 2, 29));
        assert_eq!(feb.days().len(), 29);
        assert_eq!(Month::new(2023, 2).unwrap().days().len(), 28);
        assert!(Month::new(2024, 13).is_none());
    }

    #[test]
    fn navigation_wraps_years() {
        let dec = Month::new(2023, 12).unwrap();
        assert_eq!(dec.next(), Month::new(2024, 1).unwrap());
        assert_eq!(Month::new(2024, 1).unwrap().prev(), dec);
        assert_eq!(Month::containing(date(2024, 3, 17)), Month::new(2024, 3).unwrap());
        assert_eq!(Month::parse("2024-03"), Month::new(2024, 3));
        assert_eq!(dec.to_string(), "December 2023");
    }

    #[test]
    fn sunday_grid_for_march_2024() {
        // March 1st 2024 is a Friday, March 31st a Sunday.
        let grid = month_grid(Month::new(2024, 3).unwrap(), WeekStart::Sunday);
        assert_eq!(grid.first(), Some(&date(2024, 2, 25)));
        assert_eq!(grid.last(), Some(&date(2024, 4, 6)));
        assert_eq!(grid.len(), 42);
    }

    #[test]
    fn monday_grid_for_march_2024() {
        let grid = month_grid(Month::new(2024, 3).unwrap(), WeekStart::Monday);
        assert_eq!(grid.first(), Some(&date(2024, 2, 26)));
        assert_eq!(grid.last(), Some(&date(2024, 3, 31)));
        assert_eq!(grid.len(), 35);
    }

    #[test]
    fn grid_is_whole_weeks_for_every_month() {
        for year in [2023, 2024, 2026] {
            for m in 1..=12 {
                let month = Month::new(year, m).unwrap();
                for start in [WeekStart::Sunday, WeekStart::Monday] {
                    let grid = month_grid(month, start);
                    assert_eq!(grid.len() % 7, 0);
                    assert!(grid.first().unwrap() <= &month.first_day());
                    assert!(grid.last().unwrap() >= &month.last_day());
                    assert_eq!(start.offset(grid[0]), 0);
                }
            }
        }
    }

    #[test]
    fn calendar_buckets_items_by_day() {
        let assignments = vec![
            assignment(1, date(2024, 3, 5)),
            assignment(2, date(2024, 3, 5)),
            assignment(3, date(2024, 2, 26)),
            assignment(4, date(2024, 5, 1)),
        ];
        let month = Month::new(2024, 3).unwrap();
        let calendar = MonthCalendar::build(month, WeekStart::Sunday, &assignments, date(2024, 3, 5));

        let ids: Vec<i64> = calendar.items_on(date(2024, 3, 5)).iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(calendar.items_on(date(2024, 2, 26)).len(), 1);
        assert!(calendar.items_on(date(2024, 5, 1)).is_empty());
        assert_eq!(calendar.weeks().count(), 6);

        let today = calendar.days.iter().find(|d| d.is_today).unwrap();
        assert_eq!(today.date, date(2024, 3, 5));
        assert!(!calendar.days[0].in_month);
    }

    #[test]
    fn due_labels() {
        assert_eq!(DueLabel::from_days(0).to_string(), "Due today");
        assert_eq!(DueLabel::from_days(1).to_string(), "Due tomorrow");
        assert_eq!(DueLabel::from_days(9).to_string(), "9 days left");
    }

    #[test]
    fn upcoming_sorts_and_truncates() {
        let today = date(2024, 3, 1);
        let assignments = vec![
            assignment(1, date(2024, 3, 10)),
            assignment(2, date(2024, 2, 28)),
            assignment(3, date(2024, 3, 1)),
            assignment(4, date(2024, 3, 2)),
            assignment(5, date(2024, 3, 2)),
        ];

        let list = upcoming(&assignments, today, 3);
        let ids: Vec<i64> = list.iter().map(|u| u.item.id).collect();
        assert_eq!(ids, vec![3, 4, 5]);
        assert_eq!(list[0].label, DueLabel::Today);
        assert_eq!(list[1].days_left, 1);
    }

    #[test]
    fn attendance_grid_marks_first_record_per_day() {
        let students = vec![Student {
            id: 1,
            first_name: "Ana".to_string(),
            last_name: "Lee".to_string(),
            email: "ana@school.edu".to_string(),
            grade: "10th Grade".to_string(),
            date_of_birth: date(2008, 1, 1),
            parent_contact: None,
            notes: None,
            status: Default::default(),
        }];
        let record = |id, day, status| Attendance {
            id,
            student: Link::bare(1),
            date: date(2024, 2, day),
            status,
            notes: None,
        };
        let records = vec![
            record(1, 1, AttendanceStatus::Present),
            record(2, 1, AttendanceStatus::Absent),
            record(3, 3, AttendanceStatus::Late),
        ];

        let grid = AttendanceGrid::build(Month::new(2024, 2).unwrap(), &students, &records, 10);
        assert_eq!(grid.days.len(), 29);
        let symbols = grid.rows[0].symbols();
        assert!(symbols.starts_with("P·L·"));
        assert_eq!(symbols.chars().count(), 29);
    }
}

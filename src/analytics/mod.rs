//! Derivation core: pure functions from raw entity slices to dashboard values.
//!
//! Nothing in here performs I/O or fails. Malformed or dangling input yields
//! empty results, zero-valued aggregates or placeholder names, so callers can
//! feed whatever partial data the repositories managed to load.
//!
//! - [`lookup`]: id joins with placeholder fallback, joined grade rows
//! - [`stats`]: averages, rates, per-student and per-category aggregates
//! - [`filter`]: case-insensitive search plus categorical filters
//! - [`calendar`]: month grids, day buckets, upcoming due dates

pub mod calendar;
pub mod filter;
pub mod lookup;
pub mod stats;

pub use calendar::{DueLabel, Month, MonthCalendar, Upcoming, WeekStart};
pub use filter::{Criterion, SearchTerm, Selection};
pub use lookup::{find_by_id, GradeRow, Roster, UNKNOWN_ASSIGNMENT, UNKNOWN_STUDENT};
pub use stats::{
    attendance_rate, average_score, AttendanceBreakdown, ClassReport, DashboardStats,
    GradingScale, LetterGrade,
};

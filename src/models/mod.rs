//! Domain models for the classroom dashboard.
//!
//! # Entities
//!
//! All four entities are flat rows with a stable integer id. None of them owns
//! another; references between them are weak foreign keys that the store does
//! not enforce.
//!
//! - [`Student`]: a roster entry with a lifecycle [`StudentStatus`].
//! - [`Assignment`]: gradable work with a category, point total and due date.
//! - [`Grade`]: a score for one student on one assignment.
//! - [`Attendance`]: one student's [`AttendanceStatus`] on one calendar day.
//!
//! Foreign keys are carried as [`Link`]s: always an id, optionally with the
//! display name the backend joined in. See [`EntityRef`] for the wire shape.

mod assignment;
mod attendance;
mod grade;
mod reference;
mod student;

pub use assignment::*;
pub use attendance::*;
pub use grade::*;
pub use reference::*;
pub use student::*;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::FieldDefaults;
use crate::validate::Validate;

/// When a row is created: the instant, and the calendar day on the local
/// clock that dashboards and calendars use as "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamp {
    pub now: DateTime<Utc>,
    pub today: NaiveDate,
}

impl Stamp {
    pub fn now() -> Self {
        let local = Local::now();
        Self {
            now: local.with_timezone(&Utc),
            today: local.date_naive(),
        }
    }

    /// Keep the instant but count it as falling on `today`.
    pub fn on(self, today: NaiveDate) -> Self {
        Self { today, ..self }
    }
}

/// Binds an entity to its inputs, its query filter and its collection name.
///
/// Repositories, the HTTP client and the in-memory store are generic over this
/// trait, so the CRUD contract is written once for all four entities.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Payload accepted by `create`.
    type Create: Clone + Send + Sync + Serialize + DeserializeOwned + Validate;
    /// Partial payload accepted by `update`. `None` fields keep the stored value.
    type Update: Clone + Send + Sync + Serialize + DeserializeOwned + Validate;
    /// Supplementary read filter. The default value matches every row.
    type Query: Default + Clone + Send + Sync + Serialize + DeserializeOwned;

    /// Path segment of the collection in the table API (`/students`).
    const COLLECTION: &'static str;
    /// Human-readable singular name used in logs and errors.
    const LABEL: &'static str;

    fn id(&self) -> i64;

    fn matches(&self, query: &Self::Query) -> bool;

    /// Materialise a new row from a create payload, filling optional fields
    /// from `defaults`.
    fn build(id: i64, input: Self::Create, defaults: &FieldDefaults, stamp: Stamp) -> Self;

    /// Merge a partial update into this row.
    fn apply(&mut self, input: Self::Update);
}

//! Per-entity data access.
//!
//! Reads come in two flavours. The `try_*` methods report failures; the
//! plain ones log the failure and hand back an empty result so list views
//! stay usable. Writes always report failures.
//!
//! Two stores implement the contract: [`MemoryStore`] for offline demos and
//! [`RemoteStore`] against the table API.

mod memory;
mod remote;

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::ClientError;
use crate::models::{Assignment, Attendance, Entity, Grade, Student};

pub use memory::{MemoryRepository, MemoryStore};
pub use remote::{RemoteRepository, RemoteStore};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Storage error: {0}")]
    Storage(String),
}

pub trait Repository<E: Entity>: Send + Sync {
    fn try_get_all(&self) -> impl Future<Output = Result<Vec<E>, RepositoryError>> + Send;

    /// Rows matching the entity's supplementary filter (by category, by
    /// student, by date, ...).
    fn try_get_where(
        &self,
        query: &E::Query,
    ) -> impl Future<Output = Result<Vec<E>, RepositoryError>> + Send;

    fn try_get_by_id(&self, id: i64)
        -> impl Future<Output = Result<Option<E>, RepositoryError>> + Send;

    /// Store a new row. The store assigns the id and fills omitted optional
    /// fields from its [`FieldDefaults`](crate::config::FieldDefaults).
    fn create(&self, input: E::Create) -> impl Future<Output = Result<E, RepositoryError>> + Send;

    fn update(
        &self,
        id: i64,
        input: E::Update,
    ) -> impl Future<Output = Result<E, RepositoryError>> + Send;

    /// `Ok(false)` when there was nothing to delete.
    fn delete(&self, id: i64) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    fn get_all(&self) -> impl Future<Output = Vec<E>> + Send {
        async move {
            match self.try_get_all().await {
                Ok(rows) => rows,
                Err(e) => {
                    tracing::error!("Failed to load {}: {}", E::COLLECTION, e);
                    Vec::new()
                }
            }
        }
    }

    fn get_where(&self, query: &E::Query) -> impl Future<Output = Vec<E>> + Send {
        async move {
            match self.try_get_where(query).await {
                Ok(rows) => rows,
                Err(e) => {
                    tracing::error!("Failed to query {}: {}", E::COLLECTION, e);
                    Vec::new()
                }
            }
        }
    }

    fn get_by_id(&self, id: i64) -> impl Future<Output = Option<E>> + Send {
        async move {
            match self.try_get_by_id(id).await {
                Ok(row) => row,
                Err(e) => {
                    tracing::error!("Failed to load {} {}: {}", E::LABEL, id, e);
                    None
                }
            }
        }
    }
}

/// One repository per entity, sharing a backend.
pub trait ClassroomStore: Send + Sync {
    type Students: Repository<Student>;
    type Assignments: Repository<Assignment>;
    type Grades: Repository<Grade>;
    type Attendance: Repository<Attendance>;

    fn students(&self) -> &Self::Students;
    fn assignments(&self) -> &Self::Assignments;
    fn grades(&self) -> &Self::Grades;
    fn attendance(&self) -> &Self::Attendance;
}

/// Every collection, loaded together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub students: Vec<Student>,
    pub assignments: Vec<Assignment>,
    pub grades: Vec<Grade>,
    pub attendance: Vec<Attendance>,
}

impl Snapshot {
    /// Issue all four reads concurrently. If any one fails the whole load
    /// fails; partial batches are never returned.
    pub async fn load<S: ClassroomStore>(store: &S) -> Result<Self, RepositoryError> {
        let (students, assignments, grades, attendance) = tokio::try_join!(
            store.students().try_get_all(),
            store.assignments().try_get_all(),
            store.grades().try_get_all(),
            store.attendance().try_get_all(),
        )?;
        tracing::debug!(
            students = students.len(),
            assignments = assignments.len(),
            grades = grades.len(),
            attendance = attendance.len(),
            "Loaded snapshot"
        );
        Ok(Self {
            students,
            assignments,
            grades,
            attendance,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
            && self.assignments.is_empty()
            && self.grades.is_empty()
            && self.attendance.is_empty()
    }
}

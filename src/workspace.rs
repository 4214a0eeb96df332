//! Loaded class data plus the write path that keeps it current.
//!
//! Every write is validated first, sent to the store, and followed by a full
//! reload. The in-memory snapshot only changes once that reload succeeds, so
//! a rejected write never leaves half-applied state behind.

use thiserror::Error;

use crate::models::*;
use crate::repository::{ClassroomStore, Repository, RepositoryError, Snapshot};
use crate::validate::{Validate, ValidationErrors};

#[derive(Debug, Error)]
pub enum WriteError {
    /// Caught before anything was sent.
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),

    /// The store refused or failed the write.
    #[error(transparent)]
    Rejected(#[from] RepositoryError),

    /// The write went through but the follow-up reload failed; the snapshot
    /// still shows the previous data.
    #[error("Saved, but reloading failed: {0}")]
    Unconfirmed(RepositoryError),
}

pub struct Workspace<S> {
    store: S,
    snapshot: Snapshot,
}

impl<S: ClassroomStore> Workspace<S> {
    /// Load every collection. Fails if any one of them cannot be read.
    pub async fn open(store: S) -> Result<Self, RepositoryError> {
        let snapshot = Snapshot::load(&store).await?;
        Ok(Self { store, snapshot })
    }

    /// Replace the snapshot with fresh data. On failure the old snapshot stays.
    pub async fn reload(&mut self) -> Result<(), RepositoryError> {
        self.snapshot = Snapshot::load(&self.store).await?;
        Ok(())
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn confirm<T>(&mut self, written: T) -> Result<T, WriteError> {
        self.reload().await.map_err(WriteError::Unconfirmed)?;
        Ok(written)
    }

    // ============================================================
    // Students
    // ============================================================

    pub async fn add_student(&mut self, input: CreateStudentInput) -> Result<Student, WriteError> {
        let row = create::<Student, _>(self.store.students(), input).await?;
        self.confirm(row).await
    }

    pub async fn edit_student(
        &mut self,
        id: i64,
        input: UpdateStudentInput,
    ) -> Result<Student, WriteError> {
        let row = update::<Student, _>(self.store.students(), id, input).await?;
        self.confirm(row).await
    }

    pub async fn remove_student(&mut self, id: i64) -> Result<bool, WriteError> {
        let deleted = self.store.students().delete(id).await?;
        self.confirm(deleted).await
    }

    // ============================================================
    // Assignments
    // ============================================================

    pub async fn add_assignment(
        &mut self,
        input: CreateAssignmentInput,
    ) -> Result<Assignment, WriteError> {
        let row = create::<Assignment, _>(self.store.assignments(), input).await?;
        self.confirm(row).await
    }

    pub async fn edit_assignment(
        &mut self,
        id: i64,
        input: UpdateAssignmentInput,
    ) -> Result<Assignment, WriteError> {
        let row = update::<Assignment, _>(self.store.assignments(), id, input).await?;
        self.confirm(row).await
    }

    pub async fn remove_assignment(&mut self, id: i64) -> Result<bool, WriteError> {
        let deleted = self.store.assignments().delete(id).await?;
        self.confirm(deleted).await
    }

    // ============================================================
    // Grades
    // ============================================================

    pub async fn enter_grade(&mut self, input: CreateGradeInput) -> Result<Grade, WriteError> {
        let row = create::<Grade, _>(self.store.grades(), input).await?;
        self.confirm(row).await
    }

    pub async fn edit_grade(&mut self, id: i64, input: UpdateGradeInput) -> Result<Grade, WriteError> {
        let row = update::<Grade, _>(self.store.grades(), id, input).await?;
        self.confirm(row).await
    }

    pub async fn remove_grade(&mut self, id: i64) -> Result<bool, WriteError> {
        let deleted = self.store.grades().delete(id).await?;
        self.confirm(deleted).await
    }

    // ============================================================
    // Attendance
    // ============================================================

    pub async fn mark_attendance(
        &mut self,
        input: CreateAttendanceInput,
    ) -> Result<Attendance, WriteError> {
        let row = create::<Attendance, _>(self.store.attendance(), input).await?;
        self.confirm(row).await
    }

    pub async fn edit_attendance(
        &mut self,
        id: i64,
        input: UpdateAttendanceInput,
    ) -> Result<Attendance, WriteError> {
        let row = update::<Attendance, _>(self.store.attendance(), id, input).await?;
        self.confirm(row).await
    }

    pub async fn remove_attendance(&mut self, id: i64) -> Result<bool, WriteError> {
        let deleted = self.store.attendance().delete(id).await?;
        self.confirm(deleted).await
    }
}

async fn create<E: Entity, R: Repository<E>>(repo: &R, input: E::Create) -> Result<E, WriteError> {
    input.validate()?;
    repo.create(input).await.map_err(|e| {
        tracing::warn!("Failed to create {}: {}", E::LABEL, e);
        WriteError::Rejected(e)
    })
}

async fn update<E: Entity, R: Repository<E>>(
    repo: &R,
    id: i64,
    input: E::Update,
) -> Result<E, WriteError> {
    input.validate()?;
    repo.update(id, input).await.map_err(|e| {
        tracing::warn!("Failed to update {} {}: {}", E::LABEL, id, e);
        WriteError::Rejected(e)
    })
}

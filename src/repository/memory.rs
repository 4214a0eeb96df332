use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::NaiveDate;

use super::{ClassroomStore, Repository, RepositoryError, Snapshot};
use crate::config::FieldDefaults;
use crate::models::{Assignment, Attendance, Entity, Grade, Stamp, Student};

#[derive(Debug)]
struct Table<E> {
    rows: Vec<E>,
    next_id: i64,
}

/// A collection held in process memory.
///
/// Each instance owns its rows; clones share them. Ids start above the
/// largest seeded id and are never handed out twice, even after deletes.
#[derive(Debug, Clone)]
pub struct MemoryRepository<E> {
    table: Arc<Mutex<Table<E>>>,
    defaults: Arc<FieldDefaults>,
    latency: Duration,
    today: Option<NaiveDate>,
}

impl<E: Entity> MemoryRepository<E> {
    pub fn new(defaults: Arc<FieldDefaults>) -> Self {
        Self::seeded(Vec::new(), defaults)
    }

    pub fn seeded(rows: Vec<E>, defaults: Arc<FieldDefaults>) -> Self {
        let next_id = rows.iter().map(Entity::id).max().unwrap_or(0) + 1;
        Self {
            table: Arc::new(Mutex::new(Table { rows, next_id })),
            defaults,
            latency: Duration::ZERO,
            today: None,
        }
    }

    /// Delay every call by `latency`, to mimic a network round trip.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Stamp new rows as created on `today` instead of the local clock's day.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn stamp(&self) -> Stamp {
        let stamp = Stamp::now();
        match self.today {
            Some(today) => stamp.on(today),
            None => stamp,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Table<E>> {
        self.table.lock().expect("memory store lock poisoned")
    }

    async fn pause(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn not_found(id: i64) -> RepositoryError {
        RepositoryError::NotFound {
            entity: E::LABEL,
            id,
        }
    }
}

impl<E: Entity> Repository<E> for MemoryRepository<E> {
    async fn try_get_all(&self) -> Result<Vec<E>, RepositoryError> {
        self.pause().await;
        Ok(self.lock().rows.clone())
    }

    async fn try_get_where(&self, query: &E::Query) -> Result<Vec<E>, RepositoryError> {
        self.pause().await;
        let table = self.lock();
        Ok(table
            .rows
            .iter()
            .filter(|row| row.matches(query))
            .cloned()
            .collect())
    }

    async fn try_get_by_id(&self, id: i64) -> Result<Option<E>, RepositoryError> {
        self.pause().await;
        let table = self.lock();
        Ok(table.rows.iter().find(|row| row.id() == id).cloned())
    }

    async fn create(&self, input: E::Create) -> Result<E, RepositoryError> {
        self.pause().await;
        let mut table = self.lock();
        let id = table.next_id;
        table.next_id += 1;
        let row = E::build(id, input, &self.defaults, self.stamp());
        table.rows.push(row.clone());
        tracing::debug!("Created {} {}", E::LABEL, id);
        Ok(row)
    }

    async fn update(&self, id: i64, input: E::Update) -> Result<E, RepositoryError> {
        self.pause().await;
        let mut table = self.lock();
        let row = table
            .rows
            .iter_mut()
            .find(|row| row.id() == id)
            .ok_or_else(|| Self::not_found(id))?;
        row.apply(input);
        Ok(row.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool, RepositoryError> {
        self.pause().await;
        let mut table = self.lock();
        let before = table.rows.len();
        table.rows.retain(|row| row.id() != id);
        Ok(table.rows.len() < before)
    }
}

/// All four collections in memory, for the demo build and tests.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    students: MemoryRepository<Student>,
    assignments: MemoryRepository<Assignment>,
    grades: MemoryRepository<Grade>,
    attendance: MemoryRepository<Attendance>,
}

impl MemoryStore {
    pub fn new(defaults: FieldDefaults) -> Self {
        Self::from_snapshot(Snapshot::default(), defaults)
    }

    pub fn from_snapshot(snapshot: Snapshot, defaults: FieldDefaults) -> Self {
        let defaults = Arc::new(defaults);
        Self {
            students: MemoryRepository::seeded(snapshot.students, defaults.clone()),
            assignments: MemoryRepository::seeded(snapshot.assignments, defaults.clone()),
            grades: MemoryRepository::seeded(snapshot.grades, defaults.clone()),
            attendance: MemoryRepository::seeded(snapshot.attendance, defaults),
        }
    }

    pub fn with_latency(self, latency: Duration) -> Self {
        Self {
            students: self.students.with_latency(latency),
            assignments: self.assignments.with_latency(latency),
            grades: self.grades.with_latency(latency),
            attendance: self.attendance.with_latency(latency),
        }
    }

    pub fn with_today(self, today: NaiveDate) -> Self {
        Self {
            students: self.students.with_today(today),
            assignments: self.assignments.with_today(today),
            grades: self.grades.with_today(today),
            attendance: self.attendance.with_today(today),
        }
    }
}

impl ClassroomStore for MemoryStore {
    type Students = MemoryRepository<Student>;
    type Assignments = MemoryRepository<Assignment>;
    type Grades = MemoryRepository<Grade>;
    type Attendance = MemoryRepository<Attendance>;

    fn students(&self) -> &Self::Students {
        &self.students
    }

    fn assignments(&self) -> &Self::Assignments {
        &self.assignments
    }

    fn grades(&self) -> &Self::Grades {
        &self.grades
    }

    fn attendance(&self) -> &Self::Attendance {
        &self.attendance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateAssignmentInput, UpdateAssignmentInput};
    use chrono::NaiveDate;

    fn quiz(name: &str) -> CreateAssignmentInput {
        CreateAssignmentInput {
            name: name.to_string(),
            category: "Mathematics".to_string(),
            total_points: 20.0,
            due_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            weight: None,
        }
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let repo = MemoryRepository::<Assignment>::new(Arc::default());
        let first = repo.create(quiz("Quiz 1")).await.unwrap();
        assert!(repo.delete(first.id).await.unwrap());

        let second = repo.create(quiz("Quiz 2")).await.unwrap();
        assert_ne!(first.id, second.id);
        assert!(!repo.delete(first.id).await.unwrap());
    }

    #[tokio::test]
    async fn seeded_ids_continue_after_max() {
        let repo = MemoryRepository::<Assignment>::new(Arc::default());
        let seeded = repo.create(quiz("Quiz 1")).await.unwrap();
        let rows = repo.try_get_all().await.unwrap();

        let reseeded = MemoryRepository::seeded(rows, Arc::default());
        let next = reseeded.create(quiz("Quiz 2")).await.unwrap();
        assert_eq!(next.id, seeded.id + 1);
    }

    #[tokio::test]
    async fn omitted_due_date_is_the_pinned_day() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
        let repo = MemoryRepository::<Assignment>::new(Arc::default()).with_today(today);

        let undated = repo
            .create(CreateAssignmentInput {
                due_date: None,
                ..quiz("Pop Quiz")
            })
            .await
            .unwrap();
        assert_eq!(undated.due_date, today);
    }

    #[tokio::test]
    async fn update_missing_row_is_not_found() {
        let repo = MemoryRepository::<Assignment>::new(Arc::default());
        let err = repo
            .update(42, UpdateAssignmentInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { id: 42, .. }));
    }

    #[tokio::test]
    async fn clones_share_rows() {
        let repo = MemoryRepository::<Assignment>::new(Arc::default());
        let other = repo.clone();
        repo.create(quiz("Quiz 1")).await.unwrap();
        assert_eq!(other.get_all().await.len(), 1);
    }
}

use std::marker::PhantomData;

use super::{ClassroomStore, Repository, RepositoryError};
use crate::client::{ClassroomClient, ClientError};
use crate::models::{Assignment, Attendance, Entity, Grade, Student};

/// One collection of the table API.
#[derive(Debug)]
pub struct RemoteRepository<E> {
    client: ClassroomClient,
    entity: PhantomData<fn() -> E>,
}

impl<E> Clone for RemoteRepository<E> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            entity: PhantomData,
        }
    }
}

impl<E: Entity> RemoteRepository<E> {
    pub fn new(client: ClassroomClient) -> Self {
        Self {
            client,
            entity: PhantomData,
        }
    }

    fn map_missing(id: i64, err: ClientError) -> RepositoryError {
        match err {
            ClientError::NotFound(_) => RepositoryError::NotFound {
                entity: E::LABEL,
                id,
            },
            other => other.into(),
        }
    }
}

impl<E: Entity> Repository<E> for RemoteRepository<E> {
    async fn try_get_all(&self) -> Result<Vec<E>, RepositoryError> {
        Ok(self.client.list::<E>(&E::Query::default()).await?)
    }

    async fn try_get_where(&self, query: &E::Query) -> Result<Vec<E>, RepositoryError> {
        Ok(self.client.list::<E>(query).await?)
    }

    async fn try_get_by_id(&self, id: i64) -> Result<Option<E>, RepositoryError> {
        Ok(self.client.get::<E>(id).await?)
    }

    async fn create(&self, input: E::Create) -> Result<E, RepositoryError> {
        let row = self.client.create::<E>(&input).await?;
        tracing::debug!("Created {} {}", E::LABEL, row.id());
        Ok(row)
    }

    async fn update(&self, id: i64, input: E::Update) -> Result<E, RepositoryError> {
        self.client
            .update::<E>(id, &input)
            .await
            .map_err(|e| Self::map_missing(id, e))
    }

    async fn delete(&self, id: i64) -> Result<bool, RepositoryError> {
        Ok(self.client.delete::<E>(id).await?)
    }
}

/// All four collections behind one API client.
#[derive(Debug, Clone)]
pub struct RemoteStore {
    students: RemoteRepository<Student>,
    assignments: RemoteRepository<Assignment>,
    grades: RemoteRepository<Grade>,
    attendance: RemoteRepository<Attendance>,
}

impl RemoteStore {
    pub fn new(client: ClassroomClient) -> Self {
        Self {
            students: RemoteRepository::new(client.clone()),
            assignments: RemoteRepository::new(client.clone()),
            grades: RemoteRepository::new(client.clone()),
            attendance: RemoteRepository::new(client),
        }
    }
}

impl ClassroomStore for RemoteStore {
    type Students = RemoteRepository<Student>;
    type Assignments = RemoteRepository<Assignment>;
    type Grades = RemoteRepository<Grade>;
    type Attendance = RemoteRepository<Attendance>;

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

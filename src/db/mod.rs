//! SQLite table store backing the HTTP API.
//!
//! Grade and attendance reads join the referenced student and assignment so
//! the response carries their display names. A reference to a row that no
//! longer exists comes back as a bare id.

mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};

use crate::config::FieldDefaults;
use crate::models::*;
use crate::repository::Snapshot;

/// How an entity maps onto its table.
pub trait Table: Entity {
    const TABLE: &'static str;
    /// Writable columns, in the order [`Table::values`] returns them.
    const COLUMNS: &'static [&'static str];
    /// Select list over the table aliased as `t`, without a WHERE clause.
    const SELECT: &'static str;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
    fn values(&self) -> Vec<Value>;
    /// `t.column = ?` conditions for the set fields of a query.
    fn conditions(query: &Self::Query) -> Vec<(&'static str, Value)>;
}

pub struct Database {
    conn: Arc<Mutex<Connection>>,
    defaults: Arc<FieldDefaults>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self::from_connection(conn))
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            defaults: Arc::new(FieldDefaults::default()),
        }
    }

    /// Fill omitted optional fields on create from `defaults`.
    pub fn with_defaults(mut self, defaults: FieldDefaults) -> Self {
        self.defaults = Arc::new(defaults);
        self
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Row operations
    // ============================================================

    /// All rows of `E` matching `query`, in id order.
    pub fn list<E: Table>(&self, query: &E::Query) -> Result<Vec<E>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let conditions = E::conditions(query);
        let mut sql = E::SELECT.to_string();
        if !conditions.is_empty() {
            let clauses: Vec<&str> = conditions.iter().map(|(clause, _)| *clause).collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY t.id");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params_from_iter(conditions.into_iter().map(|(_, value)| value)),
                E::from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn get<E: Table>(&self, id: i64) -> Result<Option<E>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        fetch::<E>(&conn, id)
    }

    pub fn create<E: Table>(&self, input: E::Create) -> Result<E> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let row = E::build(0, input, &self.defaults, Stamp::now());

        let placeholders = vec!["?"; E::COLUMNS.len()].join(", ");
        conn.execute(
            &format!(
                "INSERT INTO {} ({}) VALUES ({})",
                E::TABLE,
                E::COLUMNS.join(", "),
                placeholders
            ),
            params_from_iter(row.values()),
        )?;

        let id = conn.last_insert_rowid();
        fetch::<E>(&conn, id)?
            .ok_or_else(|| anyhow::anyhow!("{} {} vanished after insert", E::LABEL, id))
    }

    /// Merge `input` into the stored row. `Ok(None)` when the row is missing.
    pub fn update<E: Table>(&self, id: i64, input: E::Update) -> Result<Option<E>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let Some(mut row) = fetch::<E>(&conn, id)? else {
            return Ok(None);
        };
        row.apply(input);

        let assignments: Vec<String> = E::COLUMNS.iter().map(|c| format!("{} = ?", c)).collect();
        let mut params = row.values();
        params.push(Value::Integer(id));
        conn.execute(
            &format!("UPDATE {} SET {} WHERE id = ?", E::TABLE, assignments.join(", ")),
            params_from_iter(params),
        )?;

        // Re-read so joined names follow a changed reference.
        fetch::<E>(&conn, id)
    }

    pub fn delete<E: Table>(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute(&format!("DELETE FROM {} WHERE id = ?", E::TABLE), [id])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Bulk operations
    // ============================================================

    /// Insert every row of `snapshot`, keeping the ids it carries.
    pub fn import(&self, snapshot: &Snapshot) -> Result<()> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;
        insert_with_ids(&tx, &snapshot.students)?;
        insert_with_ids(&tx, &snapshot.assignments)?;
        insert_with_ids(&tx, &snapshot.grades)?;
        insert_with_ids(&tx, &snapshot.attendance)?;
        tx.commit()?;
        tracing::info!(
            "Imported {} students, {} assignments, {} grades, {} attendance records",
            snapshot.students.len(),
            snapshot.assignments.len(),
            snapshot.grades.len(),
            snapshot.attendance.len()
        );
        Ok(())
    }

    pub fn is_empty(&self) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let count: i64 = conn.query_row(
            "SELECT (SELECT COUNT(*) FROM students) + (SELECT COUNT(*) FROM assignments)
                  + (SELECT COUNT(*) FROM grades) + (SELECT COUNT(*) FROM attendance)",
            [],
            |row| row.get(0),
        )?;
        Ok(count == 0)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
            defaults: self.defaults.clone(),
        }
    }
}

fn fetch<E: Table>(conn: &Connection, id: i64) -> Result<Option<E>> {
    let row = conn
        .query_row(&format!("{} WHERE t.id = ?", E::SELECT), [id], E::from_row)
        .optional()?;
    Ok(row)
}

fn insert_with_ids<E: Table>(conn: &Connection, rows: &[E]) -> Result<()> {
    let placeholders = vec!["?"; E::COLUMNS.len() + 1].join(", ");
    let sql = format!(
        "INSERT INTO {} (id, {}) VALUES ({})",
        E::TABLE,
        E::COLUMNS.join(", "),
        placeholders
    );
    let mut stmt = conn.prepare(&sql)?;
    for row in rows {
        let mut params = vec![Value::Integer(row.id())];
        params.extend(row.values());
        stmt.execute(params_from_iter(params))
            .with_context(|| format!("Failed to import {} {}", E::LABEL, row.id()))?;
    }
    Ok(())
}

fn date_value(date: NaiveDate) -> Value {
    Value::Text(date.format("%Y-%m-%d").to_string())
}

fn timestamp_value(timestamp: Option<DateTime<Utc>>) -> Value {
    timestamp.map_or(Value::Null, |t| Value::Text(t.to_rfc3339()))
}

fn parse_timestamp(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn link(id: i64, name: Option<String>) -> Link {
    Link { id, name }
}

// ============================================================
// Table mappings
// ============================================================

impl Table for Student {
    const TABLE: &'static str = "students";
    const COLUMNS: &'static [&'static str] = &[
        "first_name",
        "last_name",
        "email",
        "grade",
        "date_of_birth",
        "parent_contact",
        "notes",
        "status",
    ];
    const SELECT: &'static str =
        "SELECT t.id, t.first_name, t.last_name, t.email, t.grade, t.date_of_birth,
                t.parent_contact, t.notes, t.status
         FROM students t";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Student {
            id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            email: row.get(3)?,
            grade: row.get(4)?,
            date_of_birth: row.get(5)?,
            parent_contact: row.get(6)?,
            notes: row.get(7)?,
            status: StudentStatus::from_str(&row.get::<_, String>(8)?).unwrap_or_default(),
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.first_name.clone().into(),
            self.last_name.clone().into(),
            self.email.clone().into(),
            self.grade.clone().into(),
            date_value(self.date_of_birth),
            self.parent_contact.clone().into(),
            self.notes.clone().into(),
            self.status.as_str().to_string().into(),
        ]
    }

    fn conditions(query: &StudentQuery) -> Vec<(&'static str, Value)> {
        let mut conditions = Vec::new();
        if let Some(status) = query.status {
            conditions.push(("t.status = ?", status.as_str().to_string().into()));
        }
        conditions
    }
}

impl Table for Assignment {
    const TABLE: &'static str = "assignments";
    const COLUMNS: &'static [&'static str] =
        &["name", "category", "total_points", "due_date", "weight"];
    const SELECT: &'static str =
        "SELECT t.id, t.name, t.category, t.total_points, t.due_date, t.weight
         FROM assignments t";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Assignment {
            id: row.get(0)?,
            name: row.get(1)?,
            category: row.get(2)?,
            total_points: row.get(3)?,
            due_date: row.get(4)?,
            weight: row.get(5)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.name.clone().into(),
            self.category.clone().into(),
            self.total_points.into(),
            date_value(self.due_date),
            self.weight.into(),
        ]
    }

    fn conditions(query: &AssignmentQuery) -> Vec<(&'static str, Value)> {
        let mut conditions = Vec::new();
        if let Some(category) = &query.category {
            conditions.push(("t.category = ?", category.clone().into()));
        }
        conditions
    }
}

impl Table for Grade {
    const TABLE: &'static str = "grades";
    const COLUMNS: &'static [&'static str] = &[
        "student_id",
        "assignment_id",
        "score",
        "submitted_date",
        "comments",
    ];
    const SELECT: &'static str =
        "SELECT t.id, t.student_id, s.first_name || ' ' || s.last_name,
                t.assignment_id, a.name, t.score, t.submitted_date, t.comments
         FROM grades t
         LEFT JOIN students s ON s.id = t.student_id
         LEFT JOIN assignments a ON a.id = t.assignment_id";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Grade {
            id: row.get(0)?,
            student: link(row.get(1)?, row.get(2)?),
            assignment: link(row.get(3)?, row.get(4)?),
            score: row.get(5)?,
            submitted_date: parse_timestamp(row.get(6)?),
            comments: row.get(7)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.student.id.into(),
            self.assignment.id.into(),
            self.score.into(),
            timestamp_value(self.submitted_date),
            self.comments.clone().into(),
        ]
    }

    fn conditions(query: &GradeQuery) -> Vec<(&'static str, Value)> {
        let mut conditions = Vec::new();
        if let Some(student_id) = query.student_id {
            conditions.push(("t.student_id = ?", student_id.into()));
        }
        if let Some(assignment_id) = query.assignment_id {
            conditions.push(("t.assignment_id = ?", assignment_id.into()));
        }
        conditions
    }
}

impl Table for Attendance {
    const TABLE: &'static str = "attendance";
    const COLUMNS: &'static [&'static str] = &["student_id", "date", "status", "notes"];
    const SELECT: &'static str =
        "SELECT t.id, t.student_id, s.first_name || ' ' || s.last_name, t.date, t.status, t.notes
         FROM attendance t
         LEFT JOIN students s ON s.id = t.student_id";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Attendance {
            id: row.get(0)?,
            student: link(row.get(1)?, row.get(2)?),
            date: row.get(3)?,
            status: AttendanceStatus::from_str(&row.get::<_, String>(4)?).unwrap_or_default(),
            notes: row.get(5)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.student.id.into(),
            date_value(self.date),
            self.status.as_str().to_string().into(),
            self.notes.clone().into(),
        ]
    }

    fn conditions(query: &AttendanceQuery) -> Vec<(&'static str, Value)> {
        let mut conditions = Vec::new();
        if let Some(student_id) = query.student_id {
            conditions.push(("t.student_id = ?", student_id.into()));
        }
        if let Some(date) = query.date {
            conditions.push(("t.date = ?", date_value(date)));
        }
        conditions
    }
}

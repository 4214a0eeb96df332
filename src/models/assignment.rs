use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Entity, Stamp};
use crate::config::FieldDefaults;

/// A piece of gradable work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: i64,
    pub name: String,
    /// Subject label, e.g. "Mathematics".
    pub category: String,
    /// Maximum score. Expected positive; not enforced by the store.
    pub total_points: f64,
    pub due_date: NaiveDate,
    /// Contribution to the final mark, as a percentage in 0..=100.
    pub weight: Option<f64>,
}

/// Input for creating an assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAssignmentInput {
    pub name: String,
    pub category: String,
    pub total_points: f64,
    /// Defaults to today when omitted.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub weight: Option<f64>,
}

/// Input for updating an assignment. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAssignmentInput {
    pub name: Option<String>,
    pub category: Option<String>,
    pub total_points: Option<f64>,
    pub due_date: Option<NaiveDate>,
    pub weight: Option<f64>,
}

/// Read filter for assignments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignmentQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Entity for Assignment {
    type Create = CreateAssignmentInput;
    type Update = UpdateAssignmentInput;
    type Query = AssignmentQuery;

    const COLLECTION: &'static str = "assignments";
    const LABEL: &'static str = "assignment";

    fn id(&self) -> i64 {
        self.id
    }

    fn matches(&self, query: &AssignmentQuery) -> bool {
        query
            .category
            .as_deref()
            .map_or(true, |category| self.category == category)
    }

    fn build(id: i64, input: CreateAssignmentInput, defaults: &FieldDefaults, stamp: Stamp) -> Self {
        let defaults = &defaults.assignment;
        Self {
            id,
            name: input.name,
            category: input.category,
            total_points: input.total_points,
            due_date: input.due_date.unwrap_or_else(|| defaults.due_date.resolve(stamp.today)),
            weight: input.weight.or(defaults.weight),
        }
    }

    fn apply(&mut self, input: UpdateAssignmentInput) {
        if let Some(name) = input.name {
            self.name = name;
        }
        if let Some(category) = input.category {
            self.category = category;
        }
        if let Some(total_points) = input.total_points {
            self.total_points = total_points;
        }
        if let Some(due_date) = input.due_date {
            self.due_date = due_date;
        }
        self.weight = input.weight.or(self.weight);
    }
}

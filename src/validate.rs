//! Field-level validation run before any write is attempted.
//!
//! Failures are collected per field so a form can show each message next to
//! the offending input instead of failing on the first problem.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::models::*;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern is valid"));

/// Field name → message for every rule an input breaks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }

    fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        write!(f, "Validation failed: {}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Implemented by every create/update payload.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

fn require(errors: &mut ValidationErrors, field: &'static str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.add(field, message);
    }
}

fn check_email(errors: &mut ValidationErrors, value: &str) {
    if value.trim().is_empty() {
        errors.add("email", "Email is required");
    } else if !EMAIL.is_match(value) {
        errors.add("email", "Invalid email format");
    }
}

fn check_total_points(errors: &mut ValidationErrors, value: f64) {
    if !value.is_finite() || value <= 0.0 {
        errors.add("total_points", "Total points must be greater than zero");
    }
}

fn check_weight(errors: &mut ValidationErrors, value: Option<f64>) {
    if let Some(weight) = value {
        if !(0.0..=100.0).contains(&weight) {
            errors.add("weight", "Weight must be between 0 and 100");
        }
    }
}

fn check_reference(errors: &mut ValidationErrors, field: &'static str, id: i64, message: &str) {
    if id <= 0 {
        errors.add(field, message);
    }
}

fn check_score(errors: &mut ValidationErrors, score: f64) {
    if !score.is_finite() {
        errors.add("score", "Score must be a number");
    }
}

impl Validate for CreateStudentInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require(&mut errors, "first_name", &self.first_name, "First name is required");
        require(&mut errors, "last_name", &self.last_name, "Last name is required");
        check_email(&mut errors, &self.email);
        require(&mut errors, "grade", &self.grade, "Grade is required");
        errors.into_result()
    }
}

impl Validate for UpdateStudentInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(first_name) = &self.first_name {
            require(&mut errors, "first_name", first_name, "First name is required");
        }
        if let Some(last_name) = &self.last_name {
            require(&mut errors, "last_name", last_name, "Last name is required");
        }
        if let Some(email) = &self.email {
            check_email(&mut errors, email);
        }
        if let Some(grade) = &self.grade {
            require(&mut errors, "grade", grade, "Grade is required");
        }
        errors.into_result()
    }
}

impl Validate for CreateAssignmentInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require(&mut errors, "name", &self.name, "Assignment name is required");
        require(&mut errors, "category", &self.category, "Category is required");
        check_total_points(&mut errors, self.total_points);
        check_weight(&mut errors, self.weight);
        errors.into_result()
    }
}

impl Validate for UpdateAssignmentInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &self.name {
            require(&mut errors, "name", name, "Assignment name is required");
        }
        if let Some(category) = &self.category {
            require(&mut errors, "category", category, "Category is required");
        }
        if let Some(total_points) = self.total_points {
            check_total_points(&mut errors, total_points);
        }
        check_weight(&mut errors, self.weight);
        errors.into_result()
    }
}

impl Validate for CreateGradeInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_reference(&mut errors, "student_id", self.student_id, "Student is required");
        check_reference(&mut errors, "assignment_id", self.assignment_id, "Assignment is required");
        check_score(&mut errors, self.score);
        errors.into_result()
    }
}

impl Validate for UpdateGradeInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(id) = self.student_id {
            check_reference(&mut errors, "student_id", id, "Student is required");
        }
        if let Some(id) = self.assignment_id {
            check_reference(&mut errors, "assignment_id", id, "Assignment is required");
        }
        if let Some(score) = self.score {
            check_score(&mut errors, score);
        }
        errors.into_result()
    }
}

impl Validate for CreateAttendanceInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_reference(&mut errors, "student_id", self.student_id, "Student is required");
        errors.into_result()
    }
}

impl Validate for UpdateAttendanceInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(id) = self.student_id {
            check_reference(&mut errors, "student_id", id, "Student is required");
        }
        errors.into_result()
    }
}

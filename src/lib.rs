//! Classroom dashboard: students, assignments, grades and attendance.
//!
//! Raw rows come from a [`repository`] (the table API via [`client`], or the
//! in-memory demo store). [`analytics`] turns them into dashboard values,
//! filtered lists and calendars. [`workspace`] owns a loaded snapshot and the
//! validate/write/reload cycle. [`api`] and [`db`] serve the table API itself.

pub mod analytics;
pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod demo;
pub mod models;
pub mod render;
pub mod repository;
pub mod validate;
pub mod workspace;

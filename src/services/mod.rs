// src/services/mod.rs

pub mod enrollment;
pub mod grading;
pub mod ownership;
pub mod quiz_authoring;
pub mod submission;

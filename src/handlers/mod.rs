// src/handlers/mod.rs

pub mod draft;
pub mod exams;
pub mod timer;

// src/models/mod.rs

pub mod draft;
pub mod question;
pub mod session;
pub mod timer;

// src/system/mod.rs

pub mod executor;
pub mod exit;
pub mod io;
pub mod render;

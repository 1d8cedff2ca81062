// src/core/mod.rs

pub mod app;
pub mod args;
pub mod context;
pub mod flag_set;
pub mod help;
pub mod interpolator;
pub mod reorder;
pub mod resolver;
pub mod suggest;
pub mod validation;

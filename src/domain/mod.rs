//! Core domain types and logic.

pub mod arithmetic;
pub mod bar;
pub mod cache;
pub mod config_validation;
pub mod context;
pub mod error;
pub mod indicator;
pub mod lookup;
pub mod series;

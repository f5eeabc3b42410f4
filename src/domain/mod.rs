//! Core domain types and logic.

pub mod config;
pub mod config_validation;
pub mod engine;
pub mod entry;
pub mod error;
pub mod exit;
pub mod extremes;
pub mod feed;
pub mod indicator;
pub mod position;
pub mod risk;
pub mod stats;
pub mod tick;

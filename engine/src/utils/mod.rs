//! Utility functions shared across the crate

pub mod file;
pub mod string;

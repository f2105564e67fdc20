//! Core domain types shared across modules

pub mod cache;
pub mod error;

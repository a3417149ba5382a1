//! Cohort Teams Library
//!
//! This library provides the team composition engine for the mentoring
//! program: member and team aggregates, the split/merge rules, the
//! orchestration layer around them, and the storage and notification
//! adapters.

pub mod application;
pub mod commands;
pub mod config;
pub mod domain;
pub mod infrastructure;

//! Orchestration workflows for the composite product.
//!
//! This crate provides:
//! - `Orchestrator`: the read, create and delete workflows, in synchronous and
//!   event-driven forms
//! - Best-effort compensation of partially applied creates
//! - Step names shared by logs and metric labels

pub mod orchestrator;
pub mod steps;

pub use orchestrator::Orchestrator;

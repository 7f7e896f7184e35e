pub mod aggregates;
pub mod health;
pub mod metrics;

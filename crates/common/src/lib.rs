//! Shared identifier types for the product orchestration service.

mod types;

pub use types::{InvalidProductId, ProductId, WorkflowId};

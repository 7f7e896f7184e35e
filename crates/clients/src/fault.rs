//! Fault and latency injection shared by the in-memory clients.

use std::time::Duration;

use domain::{OrchestrationError, Result};

/// Number of calls an in-memory client has served, per operation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub get: usize,
    pub create: usize,
    pub delete: usize,
}

/// Which operation a call belongs to.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Op {
    Get,
    Create,
    Delete,
}

#[derive(Debug, Default)]
pub(crate) struct Faults {
    pub latency: Duration,
    pub fail_on_get: Option<OrchestrationError>,
    pub fail_on_create: Option<OrchestrationError>,
    pub fail_on_delete: Option<OrchestrationError>,
    pub calls: CallCounts,
}

impl Faults {
    /// Counts the call and returns the latency to simulate before serving it.
    pub fn enter(&mut self, op: Op) -> Duration {
        match op {
            Op::Get => self.calls.get += 1,
            Op::Create => self.calls.create += 1,
            Op::Delete => self.calls.delete += 1,
        }
        self.latency
    }

    /// Fails the call if a fault is configured for `op`.
    pub fn check(&self, op: Op) -> Result<()> {
        let fault = match op {
            Op::Get => &self.fail_on_get,
            Op::Create => &self.fail_on_create,
            Op::Delete => &self.fail_on_delete,
        };
        match fault {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

pub(crate) async fn simulate(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

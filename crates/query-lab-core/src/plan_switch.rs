// crates/query-lab-core/src/plan_switch.rs
// ============================================================================
// Module: Plan Capture Switch
// Description: Per-request enablement flag for execution plan capture.
// Purpose: Let the executor opt a single request into plan capture.
// Dependencies: dashmap
// ============================================================================

//! ## Overview
//! Plan capture is off unless a request id has been explicitly enabled. The
//! scenario executor enables it for the duration of one run and always
//! disables it on exit, so the flag never outlives its request.

use dashmap::DashSet;

use crate::identifiers::RequestId;

/// Set of request ids with plan capture enabled.
#[derive(Debug, Default)]
pub struct PlanCaptureSwitch {
    /// Request ids currently opted in.
    enabled: DashSet<RequestId>,
}

impl PlanCaptureSwitch {
    /// Creates a switch with every request disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables plan capture for a request.
    pub fn set(&self, id: &RequestId, enabled: bool) {
        if enabled {
            self.enabled.insert(id.clone());
        } else {
            self.enabled.remove(id);
        }
    }

    /// Returns true when plan capture is enabled for the request.
    #[must_use]
    pub fn is_enabled(&self, id: &RequestId) -> bool {
        self.enabled.contains(id)
    }

    /// Returns the number of requests currently opted in.
    #[must_use]
    pub fn enabled_count(&self) -> usize {
        self.enabled.len()
    }
}

//! Row caps applied to caller-requested page sizes.

use serde::{Deserialize, Serialize};

use crate::error::{ProbeError, Result};

/// Outcome of clamping a requested row count to a server-side cap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowCap {
    pub requested_top: usize,
    pub effective_top: usize,
    pub cap_top: usize,
    pub cap_applied: bool,
}

impl RowCap {
    /// Clamps `requested` to `cap`. A request for zero rows is rejected.
    pub fn resolve(requested: usize, cap: usize) -> Result<Self> {
        if requested == 0 {
            return Err(ProbeError::invalid_argument("top must be at least 1"));
        }
        let effective_top = requested.min(cap.max(1));
        Ok(Self {
            requested_top: requested,
            effective_top,
            cap_top: cap,
            cap_applied: effective_top < requested,
        })
    }
}

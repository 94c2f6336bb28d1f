//! Warning-count advisories.
//!
//! Thresholds only decide what the dashboard suggests. A manager may demote
//! or deregister at any warning count, including zero, and nothing here
//! blocks that.

use serde::{Deserialize, Serialize};

use crate::model::Customer;

pub const DEFAULT_DEMOTE_THRESHOLD: u32 = 2;
pub const DEFAULT_DEREGISTER_THRESHOLD: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisoryThresholds {
    /// Warnings at which a VIP is advised for demotion.
    pub demote_vip: u32,
    /// Warnings at which a regular customer is advised for deregistration.
    pub deregister: u32,
}

impl Default for AdvisoryThresholds {
    fn default() -> Self {
        Self {
            demote_vip: DEFAULT_DEMOTE_THRESHOLD,
            deregister: DEFAULT_DEREGISTER_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Advisory {
    DemoteVip,
    Deregister,
}

impl Advisory {
    pub fn message(self) -> &'static str {
        match self {
            Self::DemoteVip => "VIP with too many warnings - should be demoted to regular customer",
            Self::Deregister => "Customer with too many warnings - should be deregistered",
        }
    }
}

impl std::fmt::Display for Advisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl AdvisoryThresholds {
    /// Advisory for an account with `warnings` warnings.
    ///
    /// A VIP is first advised for demotion; deregistration is only suggested
    /// once the account is a regular customer.
    pub fn evaluate(&self, warnings: u32, is_vip: bool) -> Option<Advisory> {
        if is_vip {
            (warnings >= self.demote_vip).then_some(Advisory::DemoteVip)
        } else {
            (warnings >= self.deregister).then_some(Advisory::Deregister)
        }
    }

    pub fn for_customer(&self, customer: &Customer) -> Option<Advisory> {
        self.evaluate(customer.amount_warnings, customer.vip_status)
    }
}

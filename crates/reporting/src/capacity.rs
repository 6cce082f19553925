//! Seat-capacity summary across plans. `max_users = -1` plans are counted
//! separately and never enter the numeric comparisons.

use appdesk_core::types::Plan;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanCapacity {
    pub total_plans: u64,
    pub unlimited_plans: u64,
    pub largest_user_limit: Option<u32>,
    pub smallest_user_limit: Option<u32>,
}

pub fn plan_capacity(plans: &[Plan]) -> PlanCapacity {
    let limits: Vec<u32> = plans.iter().filter_map(Plan::user_limit).collect();
    PlanCapacity {
        total_plans: plans.len() as u64,
        unlimited_plans: plans.iter().filter(|p| p.is_unlimited()).count() as u64,
        largest_user_limit: limits.iter().copied().max(),
        smallest_user_limit: limits.iter().copied().min(),
    }
}

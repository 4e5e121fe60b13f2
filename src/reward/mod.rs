// Rewards
//
// Catalog rewards gated by level, points and achievements, claimed at most
// once per user and capped globally when limited.

pub use models::{
    ClaimRewardResult, ClaimStatus, RewardDefinition, RewardType, UserRewardClaim,
};
pub use service::RewardService;

mod models;
mod service;

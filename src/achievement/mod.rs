// Achievements
//
// Catalog-defined milestones evaluated against profile counters. Evaluation is
// pure; the service persists progress and pays point rewards through the ledger.

pub use evaluator::evaluate;
pub use models::{
    AchievementCategory, AchievementDefinition, AchievementEvaluation, Rarity, Requirement,
    RequirementType, RequirementValue, UserAchievementProgress,
};
pub use service::{AchievementService, AchievementStatus};

mod evaluator;
mod models;
mod service;

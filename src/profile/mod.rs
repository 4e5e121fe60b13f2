// Public API
pub use models::UserProfile;

pub mod models;

// HTTP surface over the engine facade
pub use router::router;
pub use types::{AwardPointsRequest, HealthResponse, LeaderboardQuery, TrackEventRequest};

mod handlers;
mod router;
mod types;

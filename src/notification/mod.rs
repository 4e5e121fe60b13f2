// Notification side channel
//
// Level-ups, unlocks, claims and trigger `notify` actions are published on a
// broadcast bus. Presentation layers subscribe; nobody is required to listen.

pub use bus::NotificationBus;
pub use events::{Notification, NotificationKind};

mod bus;
mod events;

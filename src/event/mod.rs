// Activity events fed into the engine
//
// Event types, their metadata schema, and the record persisted for every
// tracked event.

// Public API - what other modules can use
pub use events::{ActivityEvent, EventType};
pub use metadata::{Metadata, MetadataValue, METADATA_SCHEMA_VERSION};

// Internal modules
mod events;
mod metadata;

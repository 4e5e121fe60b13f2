// Catalog
//
// Configuration data the engine runs on: the per-event point table and the
// achievement, reward and trigger definitions. Loaded once, validated, then
// shared read-only.

pub use definitions::{Catalog, DEFAULT_CATALOG_JSON};

mod definitions;

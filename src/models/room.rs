use serde::{Deserialize, Serialize};

/// A bookable meeting room. Immutable from the engine's point of view;
/// only used as a lookup key for availability resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub capacity: u32,
}

use serde::{Deserialize, Serialize};

/// The only part of a catalog film this crate depends on.
///
/// Decoding a full film object from the catalog keeps the `id` and drops
/// everything else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilmRef {
    pub id: String,
}

impl FilmRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

//! Recyclable item categories served by the registry.

use serde::{Deserialize, Serialize};

/// A recyclable item category, e.g. "Lâmpadas" or "Óleo de Cozinha".
///
/// The registry keys every collection point by the set of category ids it
/// accepts, so `id` is what travels in search queries and submissions while
/// `title` is what a front end shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecyclableItem {
    pub id: u64,
    pub title: String,
    /// Icon location, present when the registry serves one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl RecyclableItem {
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            image_url: None,
        }
    }
}

//! Collection-point records and search parameters.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;

/// One collection point as the search listing serializes it.
///
/// The listing carries just enough to pin the point on a map and link to
/// its detail page, contact fields only come back from the detail endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSummary {
    pub id: u64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl PointSummary {
    pub fn position(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Contact profile of a single point inside a [`PointDetail`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointProfile {
    pub name: String,
    pub email: String,
    pub whatsapp: String,
    pub city: String,
    pub uf: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// One accepted item category inside a [`PointDetail`], title only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointItem {
    pub title: String,
}

/// Full detail payload for a single collection point.
///
/// The registry nests the profile under a `serializedPoint` key and lists
/// the accepted categories next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointDetail {
    #[serde(rename = "serializedPoint")]
    pub point: PointProfile,
    pub items: Vec<PointItem>,
}

impl PointDetail {
    /// The accepted categories as a single comma-separated line, the way a
    /// front end lists them under the point name.
    pub fn item_titles(&self) -> String {
        self.items
            .iter()
            .map(|item| item.title.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Parameters of a collection-point search.
///
/// `uf` is the two-letter region code and `city` the locality name exactly
/// as the geographic directory spells it. `items` must be non-empty before
/// a search is issued, the registry treats no categories as no results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub uf: String,
    pub city: String,
    pub items: Vec<u64>,
}

impl SearchParams {
    pub fn new(uf: impl Into<String>, city: impl Into<String>, items: Vec<u64>) -> Self {
        Self {
            uf: uf.into(),
            city: city.into(),
            items,
        }
    }

    /// The `items` query value, ids joined with commas.
    pub fn items_param(&self) -> String {
        self.items
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

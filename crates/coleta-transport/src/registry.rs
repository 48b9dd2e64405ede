//! Client for the collection-point registry.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use coleta_types::{Coordinates, NewPoint, PointDetail, PointSummary, RecyclableItem, SearchParams};

use crate::error::TransportError;
use crate::http::{RequestBody, Transport};
use crate::multipart::MultipartForm;

/// Typed access to the registry's endpoints.
#[derive(Clone)]
pub struct RegistryApi {
    transport: Arc<dyn Transport>,
}

/// One entry of the `location` endpoint's reply.
#[derive(Debug, Deserialize)]
struct CityLocation {
    city: String,
    /// `[latitude, longitude]`
    location: (f64, f64),
}

impl RegistryApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// The recyclable item categories the registry knows about.
    pub async fn items(&self) -> Result<Vec<RecyclableItem>, TransportError> {
        let value = self.transport.get("items", &[]).await?;
        decode("items", value)
    }

    /// Collection points matching region, locality and item categories.
    pub async fn search_points(
        &self,
        params: &SearchParams,
    ) -> Result<Vec<PointSummary>, TransportError> {
        let query = vec![
            ("city".to_string(), params.city.clone()),
            ("uf".to_string(), params.uf.clone()),
            ("items".to_string(), params.items_param()),
        ];
        let value = self.transport.get("points", &query).await?;
        decode("points", value)
    }

    /// Full detail for one collection point.
    pub async fn point_detail(&self, id: u64) -> Result<PointDetail, TransportError> {
        let path = format!("points/{id}");
        let value = self.transport.get(&path, &[]).await?;
        decode(&path, value)
    }

    /// Geocode a locality.
    ///
    /// The query goes out with diacritics stripped because that is what the
    /// service indexes, but the reply's first entry must name the locality
    /// exactly as given or it is discarded: the service answers with its
    /// best guess even for localities it does not know.
    pub async fn locate_city(
        &self,
        uf: &str,
        city: &str,
    ) -> Result<Option<Coordinates>, TransportError> {
        let query = vec![
            ("city".to_string(), fold_diacritics(city)),
            ("uf".to_string(), uf.to_string()),
        ];
        let value = self.transport.get("location", &query).await?;
        let entries: Vec<CityLocation> = decode("location", value)?;
        let Some(first) = entries.into_iter().next() else {
            return Ok(None);
        };
        if first.city != city {
            debug!(asked = city, answered = %first.city, "location reply names another city");
            return Ok(None);
        }
        let (latitude, longitude) = first.location;
        Ok(Some(Coordinates::new(latitude, longitude)))
    }

    /// Submit a new collection point as a multipart form.
    pub async fn create_point(&self, point: &NewPoint) -> Result<Value, TransportError> {
        let mut form = MultipartForm::new()
            .text("name", &point.name)
            .text("email", &point.email)
            .text("whatsapp", &point.whatsapp)
            .text("latitude", point.position.latitude.to_string())
            .text("longitude", point.position.longitude.to_string())
            .text("city", &point.city)
            .text("uf", &point.uf)
            .text("items", point.items_param());
        if let Some(image) = &point.image {
            form = form.file(
                "image",
                &image.file_name,
                &image.content_type,
                image.bytes.clone(),
            );
        }
        self.transport
            .post("points", RequestBody::Multipart(form))
            .await
    }
}

fn decode<T: serde::de::DeserializeOwned>(path: &str, value: Value) -> Result<T, TransportError> {
    serde_json::from_value(value).map_err(|error| TransportError::decode(path, error))
}

/// Strip combining diacritics from Latin letters, `São Paulo` becomes
/// `Sao Paulo`. Other characters pass through unchanged.
pub fn fold_diacritics(input: &str) -> String {
    input.chars().map(fold_char).collect()
}

fn fold_char(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ç' => 'c',
        'Ç' => 'C',
        'ñ' => 'n',
        'Ñ' => 'N',
        other => other,
    }
}

//! Client for the geographic directory (regions and their localities).

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::error::TransportError;
use crate::http::Transport;

/// One federative region as the directory serves it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegionEntry {
    /// Two-letter code, e.g. `SP`.
    #[serde(alias = "sigla")]
    pub code: String,
}

/// One locality of a region.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LocalityEntry {
    #[serde(alias = "nome")]
    pub name: String,
}

/// Typed access to the directory's endpoints.
///
/// Both listings are requested name-ordered so option lists arrive ready
/// to display.
#[derive(Clone)]
pub struct DirectoryClient {
    transport: Arc<dyn Transport>,
}

impl DirectoryClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// All region codes, ordered by region name.
    pub async fn regions(&self) -> Result<Vec<RegionEntry>, TransportError> {
        let value = self
            .transport
            .get("estados", &[("orderBy".to_string(), "nome".to_string())])
            .await?;
        decode("estados", value)
    }

    /// The localities of one region, ordered by name.
    pub async fn localities(&self, region_code: &str) -> Result<Vec<LocalityEntry>, TransportError> {
        let path = format!("estados/{region_code}/municipios");
        let value = self
            .transport
            .get(&path, &[("orderBy".to_string(), "nome".to_string())])
            .await?;
        decode(&path, value)
    }
}

fn decode<T: serde::de::DeserializeOwned>(path: &str, value: Value) -> Result<T, TransportError> {
    serde_json::from_value(value).map_err(|error| TransportError::decode(path, error))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_entry_reads_the_wire_field() {
        let entries: Vec<RegionEntry> =
            serde_json::from_str(r#"[{"id":35,"sigla":"SP","nome":"São Paulo"}]"#).unwrap();
        assert_eq!(entries[0].code, "SP");
    }

    #[test]
    fn test_locality_entry_reads_the_wire_field() {
        let entries: Vec<LocalityEntry> =
            serde_json::from_str(r#"[{"id":3550308,"nome":"São Paulo"}]"#).unwrap();
        assert_eq!(entries[0].name, "São Paulo");
    }

    #[test]
    fn test_entries_also_accept_their_own_names() {
        let region: RegionEntry = serde_json::from_str(r#"{"code":"RJ"}"#).unwrap();
        assert_eq!(region.code, "RJ");
        let locality: LocalityEntry = serde_json::from_str(r#"{"name":"Niterói"}"#).unwrap();
        assert_eq!(locality.name, "Niterói");
    }
}

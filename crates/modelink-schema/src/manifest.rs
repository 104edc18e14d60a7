use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Media type marking the primary model payload layer.
pub const MODEL_MEDIA_TYPE: &str = "application/vnd.ollama.image.model";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse manifest: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// One content-addressed component of a manifest.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LayerDescriptor {
    #[serde(rename = "mediaType")]
    pub media_type: String,
    pub digest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl LayerDescriptor {
    pub fn is_model(&self) -> bool {
        self.media_type == MODEL_MEDIA_TYPE
    }
}

/// A decoded manifest document. Manifests carry more fields than modelink
/// needs (config, schema version); unknown fields are ignored and an absent
/// `layers` list is a valid empty manifest.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ModelManifest {
    #[serde(default)]
    pub layers: Vec<LayerDescriptor>,
}

impl ModelManifest {
    /// Layers carrying the model payload. A manifest may have zero (skip
    /// silently) or several (each processed independently).
    pub fn model_layers(&self) -> impl Iterator<Item = &LayerDescriptor> {
        self.layers.iter().filter(|l| l.is_model())
    }
}

pub fn parse_manifest_str(input: &str) -> Result<ModelManifest, ManifestError> {
    Ok(serde_json::from_str(input)?)
}

pub fn parse_manifest_file(path: impl AsRef<Path>) -> Result<ModelManifest, ManifestError> {
    let content = fs::read_to_string(path)?;
    parse_manifest_str(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEX64: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

    fn manifest_json(media_type: &str) -> String {
        format!(
            r#"{{
  "schemaVersion": 2,
  "mediaType": "application/vnd.docker.distribution.manifest.v2+json",
  "layers": [
    {{ "mediaType": "{media_type}", "digest": "sha256:{HEX64}", "size": 42 }}
  ]
}}"#
        )
    }

    #[test]
    fn parses_model_layer() {
        let manifest = parse_manifest_str(&manifest_json(MODEL_MEDIA_TYPE)).unwrap();
        let layers: Vec<_> = manifest.model_layers().collect();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].digest, format!("sha256:{HEX64}"));
    }

    #[test]
    fn filters_non_model_layers() {
        let manifest =
            parse_manifest_str(&manifest_json("application/vnd.ollama.image.params")).unwrap();
        assert_eq!(manifest.model_layers().count(), 0);
        assert_eq!(manifest.layers.len(), 1);
    }

    #[test]
    fn missing_layers_field_is_empty() {
        let manifest = parse_manifest_str(r#"{"schemaVersion": 2}"#).unwrap();
        assert!(manifest.layers.is_empty());
    }

    #[test]
    fn malformed_json_is_error() {
        let result = parse_manifest_str("{not json");
        assert!(matches!(result, Err(ManifestError::Malformed(_))));
    }

    #[test]
    fn parse_manifest_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latest");
        std::fs::write(&path, manifest_json(MODEL_MEDIA_TYPE)).unwrap();
        let manifest = parse_manifest_file(&path).unwrap();
        assert_eq!(manifest.model_layers().count(), 1);
    }

    #[test]
    fn multiple_model_layers_all_kept() {
        let json = format!(
            r#"{{"layers": [
                {{ "mediaType": "{MODEL_MEDIA_TYPE}", "digest": "sha256:{HEX64}" }},
                {{ "mediaType": "{MODEL_MEDIA_TYPE}", "digest": "sha256:{}" }}
            ]}}"#,
            "b".repeat(64)
        );
        let manifest = parse_manifest_str(&json).unwrap();
        assert_eq!(manifest.model_layers().count(), 2);
    }
}

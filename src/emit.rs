//! Output document
//!
//! Generated objects are wrapped in a `v1` `List` and printed as YAML or JSON.

use crate::compose::WarningTable;
use crate::error::{OsComposeError, Result};
use crate::platform::{Object, API_VERSION};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Annotation naming the generator of a document
pub const GENERATED_BY_ANNOTATION: &str = "openshift.io/generated-by";

/// Annotation listing the compose fields that were not honored
pub const WARNINGS_ANNOTATION: &str = "app.generate.openshift.io/warnings";

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format {:?}, expected yaml or json", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Yaml => write!(f, "yaml"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Metadata of the list document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListMeta {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// A list of objects ready to be printed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub api_version: String,
    pub kind: String,
    pub metadata: ListMeta,
    pub items: Vec<Object>,
}

impl Document {
    /// Wrap objects, annotating the document with any warnings
    pub fn new(objects: Vec<Object>, warnings: &WarningTable) -> Self {
        let mut metadata = ListMeta::default();
        metadata
            .annotations
            .insert(GENERATED_BY_ANNOTATION.to_string(), "oscompose".to_string());
        if let Some(text) = warnings.annotation() {
            metadata.annotations.insert(WARNINGS_ANNOTATION.to_string(), text);
        }
        Self {
            api_version: API_VERSION.to_string(),
            kind: "List".to_string(),
            metadata,
            items: objects,
        }
    }

    /// Serialize in the given format
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Yaml => self.to_yaml(),
            OutputFormat::Json => self.to_json(),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| OsComposeError::Conversion(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| OsComposeError::Conversion(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ImageStream;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("yaml".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("toml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_document_with_warnings() {
        let mut warnings = WarningTable::default();
        warnings.warn("web", "hostname is not supported");
        let document = Document::new(vec![ImageStream::new("web").into()], &warnings);

        let json: serde_json::Value = serde_json::from_str(&document.to_json().unwrap()).unwrap();
        assert_eq!(json["kind"], "List");
        assert_eq!(json["apiVersion"], "v1");
        assert_eq!(json["items"][0]["kind"], "ImageStream");
        assert_eq!(json["metadata"]["annotations"][GENERATED_BY_ANNOTATION], "oscompose");
        assert_eq!(
            json["metadata"]["annotations"][WARNINGS_ANNOTATION],
            "not all docker-compose fields were honored:\n* web: hostname is not supported"
        );
    }

    #[test]
    fn test_document_yaml() {
        let document = Document::new(Vec::new(), &WarningTable::default());
        let yaml = document.render(OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("kind: List"));
        assert!(!yaml.contains(WARNINGS_ANNOTATION));
    }
}

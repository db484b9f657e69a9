//! Config document types and their validator.

use crate::{Error, Result};
use jsonschema::{Draft, JSONSchema};
use once_cell::sync::OnceCell;
use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Root configuration document.
///
/// Closed at the root. Nested objects tolerate unknown keys and drop them
/// when the document is re-serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub providers: ProvidersConfig,
    pub scene: SceneConfig,
}

/// Provider binding per capability. Every binding is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ProvidersConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat: Option<ProviderRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tts: Option<TtsProviderRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stt: Option<ProviderBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vad: Option<ProviderBinding>,
}

/// Chat provider reference with optional endpoint override and credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRef {
    pub id: String,
    /// Absolute URL; checked after schema validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl ProviderRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            base_url: None,
            api_key: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TtsProviderRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ProviderBinding {
    pub id: String,
}

impl ProviderBinding {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SceneConfig {
    #[serde(default)]
    pub renderer: Renderer,
    #[serde(default)]
    pub model: SceneModel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Renderer {
    #[default]
    Three,
    Pixi,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SceneModel {
    #[default]
    Vrm,
    Live2d,
    Mmd,
}

/// One validation failure, located by JSON pointer (empty pointer is the root).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "<root>: {}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Config validator: JSON Schema generated from [`Config`], compiled once.
pub struct ConfigValidator {
    schema: JSONSchema,
    document: serde_json::Value,
}

static SHARED_VALIDATOR: OnceCell<Arc<ConfigValidator>> = OnceCell::new();

impl ConfigValidator {
    pub fn new() -> Result<Self> {
        // `Option` fields stay optional but never accept `null`.
        let generator = SchemaSettings::draft07()
            .with(|s| {
                s.option_nullable = false;
                s.option_add_null_type = false;
            })
            .into_generator();
        let document = serde_json::to_value(generator.into_root_schema_for::<Config>())?;
        let schema = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&document)
            .map_err(|e| Error::runtime(format!("Failed to compile config schema: {}", e)))?;
        Ok(Self { schema, document })
    }

    /// Process-wide compiled validator; the schema is immutable so sharing is safe.
    pub fn shared() -> Result<Arc<Self>> {
        SHARED_VALIDATOR
            .get_or_try_init(|| Self::new().map(Arc::new))
            .cloned()
    }

    /// The JSON Schema document the validator was compiled from.
    pub fn json_schema(&self) -> &serde_json::Value {
        &self.document
    }

    /// Validate a raw value and produce the typed config with defaults applied.
    pub fn validate(&self, raw: &serde_json::Value) -> Result<Config> {
        if let Err(errors) = self.schema.validate(raw) {
            let issues: Vec<ValidationIssue> = errors
                .map(|e| ValidationIssue::new(e.instance_path.to_string(), e.to_string()))
                .collect();
            return Err(Error::ConfigValidation { issues });
        }

        let config: Config = serde_json::from_value(raw.clone()).map_err(|e| {
            Error::ConfigValidation {
                issues: vec![ValidationIssue::new("", e.to_string())],
            }
        })?;

        let issues = Self::semantic_issues(&config);
        if !issues.is_empty() {
            return Err(Error::ConfigValidation { issues });
        }
        Ok(config)
    }

    /// Checks the schema cannot express.
    fn semantic_issues(config: &Config) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        if let Some(base_url) = config
            .providers
            .chat
            .as_ref()
            .and_then(|c| c.base_url.as_deref())
        {
            if let Err(e) = url::Url::parse(base_url) {
                issues.push(ValidationIssue::new(
                    "/providers/chat/baseUrl",
                    format!("invalid url '{}': {}", base_url, e),
                ));
            }
        }
        issues
    }
}

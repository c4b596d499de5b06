use std::str::FromStr;

use serde::Deserialize;

use crate::error::Error;

/// Output dialect. Only draft-07 JSON Schema is emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum TargetFormat {
    #[default]
    Json,
}

impl TargetFormat {
    pub fn schema_uri(self) -> &'static str {
        match self {
            TargetFormat::Json => "http://json-schema.org/draft-07/schema#",
        }
    }

    pub fn definitions_key(self) -> &'static str {
        match self {
            TargetFormat::Json => "definitions",
        }
    }
}

impl FromStr for TargetFormat {
    type Err = Error;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "json" => Ok(TargetFormat::Json),
            other => Err(Error::UnsupportedTarget(other.to_string())),
        }
    }
}

impl TryFrom<String> for TargetFormat {
    type Error = Error;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        tag.parse()
    }
}

/// Knobs for one translation call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslateOptions {
    pub target: TargetFormat,
    /// Emit `$schema` on the document root.
    pub schema_uri: bool,
    /// Treat fields whose meta says `writeOnly: true` as stripped.
    pub strip_write_only: bool,
    /// Prefix for vendor-extension keys.
    pub extension_prefix: String,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            target: TargetFormat::Json,
            schema_uri: true,
            strip_write_only: false,
            extension_prefix: "x-".to_string(),
        }
    }
}

impl TranslateOptions {
    pub fn for_target(tag: &str) -> Result<Self, Error> {
        Ok(Self { target: tag.parse()?, ..Self::default() })
    }

    /// `name` under the extension prefix, unless it already carries it.
    pub fn extension_key(&self, name: &str) -> String {
        if name.starts_with(&self.extension_prefix) {
            name.to_string()
        } else {
            format!("{}{}", self.extension_prefix, name)
        }
    }
}

//! Declarative nest configuration that downstream crates can serialize/deserialize.
//!
//! Example (YAML):
//! ```yaml
//! levels:
//!   - field: year
//!     sort: { reverse: true }
//!   - field: site.name
//!     access: prop
//! sort_values: { by: yield, reverse: true }
//! rollup: { op: sum, field: yield }
//! ```
//!
//! `nest-operators` turns a validated config into a `NestOperator`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NestConfig {
    /// One entry per nesting level, outermost first.
    #[serde(default)]
    pub levels: Vec<LevelConfig>,

    /// Ordering of leaf records. Ignored when a rollup is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_values: Option<SortConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollup: Option<RollupConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub field: String,

    #[serde(default)]
    pub access: FieldAccess,

    /// Present means "sort this level's keys"; absent keeps encounter order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortConfig>,
}

impl LevelConfig {
    pub fn item(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            access: FieldAccess::Item,
            sort: None,
        }
    }

    pub fn prop(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            access: FieldAccess::Prop,
            sort: None,
        }
    }

    pub fn with_sort(mut self, sort: SortConfig) -> Self {
        self.sort = Some(sort);
        self
    }
}

/// How a field name reaches into a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldAccess {
    /// Dictionary-style lookup (`record["field"]`).
    #[default]
    Item,
    /// Attribute-style lookup (`record.field`, dotted paths allowed where supported).
    Prop,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SortConfig {
    /// Field extracted as the sort key. Only meaningful for `sort_values`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by: Option<String>,

    #[serde(default)]
    pub access: FieldAccess,

    #[serde(default)]
    pub reverse: bool,
}

impl SortConfig {
    pub fn ascending() -> Self {
        Self::default()
    }

    pub fn descending() -> Self {
        Self {
            reverse: true,
            ..Self::default()
        }
    }

    pub fn by(field: impl Into<String>) -> Self {
        Self {
            by: Some(field.into()),
            ..Self::default()
        }
    }
}

/// A field reference used by the built-in rollups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRef {
    pub field: String,
    #[serde(default)]
    pub access: FieldAccess,
}

/// Built-in leaf summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RollupConfig {
    Count,
    CountDistinct(FieldRef),
    Sum(FieldRef),
    Mean(FieldRef),
    Min(FieldRef),
    Max(FieldRef),
}

impl RollupConfig {
    pub fn field(&self) -> Option<&FieldRef> {
        match self {
            RollupConfig::Count => None,
            RollupConfig::CountDistinct(f)
            | RollupConfig::Sum(f)
            | RollupConfig::Mean(f)
            | RollupConfig::Min(f)
            | RollupConfig::Max(f) => Some(f),
        }
    }
}

impl NestConfig {
    pub fn new(levels: Vec<LevelConfig>) -> Self {
        Self {
            levels,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(src: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(src)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(src: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(src)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&src),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&src),
            other => Err(Error::Config(format!(
                "unsupported config extension {:?} for {}",
                other,
                path.display()
            ))),
        }
    }

    /// Check structural rules serde cannot express.
    pub fn validate(&self) -> Result<()> {
        for (depth, level) in self.levels.iter().enumerate() {
            if level.field.trim().is_empty() {
                return Err(Error::Config(format!("level {depth}: empty field name")));
            }
            if let Some(by) = level.sort.as_ref().and_then(|s| s.by.as_ref()) {
                return Err(Error::Config(format!(
                    "level {depth}: key sort cannot use 'by' ({by}); keys are already scalars"
                )));
            }
        }

        if let Some(by) = self.sort_values.as_ref().and_then(|s| s.by.as_ref()) {
            if by.trim().is_empty() {
                return Err(Error::Config("sort_values: empty 'by' field".into()));
            }
        }

        if let Some(field) = self.rollup.as_ref().and_then(RollupConfig::field) {
            if field.field.trim().is_empty() {
                return Err(Error::Config("rollup: empty field name".into()));
            }
        }

        Ok(())
    }

    /// Content fingerprint of the canonical JSON form; equal configs share it.
    pub fn fingerprint(&self) -> Result<Fingerprint> {
        let bytes = serde_json::to_vec(self)?;
        Ok(Fingerprint(*blake3::hash(&bytes).as_bytes()))
    }
}

/// blake3 digest identifying a configuration (e.g. as a cache key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    pub fn to_hex(&self) -> String {
        use std::fmt::Write as _;
        self.0.iter().fold(String::with_capacity(64), |mut s, b| {
            let _ = write!(&mut s, "{b:02x}");
            s
        })
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_round_trip_fields() {
        let cfg = NestConfig::from_yaml_str(
            r#"
levels:
  - field: year
    sort: { reverse: true }
  - field: site.name
    access: prop
sort_values: { by: yield }
rollup: { op: mean, field: yield }
"#,
        )
        .expect("valid config");

        assert_eq!(cfg.levels.len(), 2);
        assert_eq!(cfg.levels[0].sort, Some(SortConfig::descending()));
        assert_eq!(cfg.levels[1].access, FieldAccess::Prop);
        assert_eq!(cfg.sort_values, Some(SortConfig::by("yield")));
        assert_eq!(
            cfg.rollup,
            Some(RollupConfig::Mean(FieldRef {
                field: "yield".into(),
                access: FieldAccess::Item,
            }))
        );
    }

    #[test]
    fn test_level_sort_by_is_rejected() {
        let err = NestConfig::from_json_str(
            r#"{"levels": [{"field": "year", "sort": {"by": "other"}}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_unknown_rollup_is_a_serde_error() {
        let err = NestConfig::from_yaml_str("rollup: { op: median, field: x }").unwrap_err();
        assert!(matches!(err, Error::Serde(_)));
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = NestConfig::new(vec![LevelConfig::item("year")]);
        let b = NestConfig::new(vec![LevelConfig::item("year")]);
        let c = NestConfig::new(vec![LevelConfig::item("year").with_sort(SortConfig::ascending())]);

        let fa = a.fingerprint().unwrap();
        assert_eq!(fa, b.fingerprint().unwrap());
        assert_ne!(fa, c.fingerprint().unwrap());
        assert_eq!(fa.to_hex().len(), 64);
    }
}

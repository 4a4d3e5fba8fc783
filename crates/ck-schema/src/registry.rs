//! Loads component schemas from a directory of JSON files and validates
//! component payloads against them. Grounded on `dt-schedule::loader`'s
//! directory-of-files loading pattern, generalized from CSV rows to JSON
//! schema documents.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ck_core::Value;

use crate::error::{SchemaError, SchemaResult};
use crate::node::SchemaNode;

/// Registry of named component schemas, keyed by component kind (e.g.
/// `"position"`, `"job"`, `"inventory"`).
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, SchemaNode>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.json` file in `dir` as a schema, named after its file
    /// stem (`position.json` registers under the kind `"position"`).
    pub fn load(dir: &Path) -> SchemaResult<Self> {
        if !dir.is_dir() {
            return Err(SchemaError::DirectoryMissing(dir.to_path_buf()));
        }
        let mut registry = Self::new();
        let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        entries.sort();

        for path in entries {
            let kind = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| SchemaError::Malformed {
                    path: path.clone(),
                    reason: "non-UTF-8 file name".into(),
                })?
                .to_string();
            let contents = std::fs::read_to_string(&path)?;
            let json: serde_json::Value =
                serde_json::from_str(&contents).map_err(|e| SchemaError::Malformed {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            let node = SchemaNode::parse(&kind, &json)?;
            registry.register_schema(kind, node);
        }
        Ok(registry)
    }

    /// Register (or replace) a schema directly, bypassing the filesystem —
    /// used by tests and by callers embedding schemas in code.
    pub fn register_schema(&mut self, kind: impl Into<String>, node: SchemaNode) {
        self.schemas.insert(kind.into(), node);
    }

    pub fn list_components(&self) -> Vec<&str> {
        self.schemas.keys().map(String::as_str).collect()
    }

    pub fn get_schema(&self, kind: &str) -> Option<&SchemaNode> {
        self.schemas.get(kind)
    }

    /// Validate `value` as an instance of component kind `kind`.
    pub fn validate(&self, kind: &str, value: &Value) -> SchemaResult<()> {
        let node = self
            .schemas
            .get(kind)
            .ok_or_else(|| SchemaError::UnknownKind(kind.to_string()))?;
        node.validate(kind, value, &mut Vec::new())
    }
}

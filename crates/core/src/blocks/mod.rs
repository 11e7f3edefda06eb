//! Block type registry.
//!
//! Maps a block type name to its schema, current version and default props.
//! Populated once at startup and injected into the engine; the engine
//! consults it to validate and version-tag block instances on write.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::document::model::BlockInstance;

/// Definition of a single block type available to the page builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDefinition {
    /// Machine name of the block type (e.g. "hero", "richText").
    #[serde(rename = "type")]
    pub block_type: String,
    /// Human-readable label shown in the editor.
    pub label: String,
    /// Current schema version. Instances authored against an older version
    /// are migration candidates.
    pub version: u32,
    /// JSON Schema-style description of the expected props shape. The engine
    /// enforces `required`; the rest is for the editing UI.
    pub schema: Value,
    /// Props a freshly inserted block starts with.
    pub default_props: Value,
}

/// Registry of block definitions, keyed by type name.
#[derive(Debug, Default)]
pub struct BlockRegistry {
    types: HashMap<String, BlockDefinition>,
}

impl BlockRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Create a registry pre-populated with the built-in block types.
    pub fn with_builtin_types() -> Self {
        let mut registry = Self::new();
        for definition in builtin_definitions() {
            registry.register(definition);
        }
        registry
    }

    /// Register a block type definition. Re-registering an existing type
    /// overwrites it with a warning — last writer wins, which supports
    /// hot-reload in development.
    pub fn register(&mut self, definition: BlockDefinition) {
        if self.types.contains_key(&definition.block_type) {
            warn!(block_type = %definition.block_type, "block type re-registered, overwriting");
        }
        self.types
            .insert(definition.block_type.clone(), definition);
    }

    /// Look up a block type by name.
    pub fn get(&self, block_type: &str) -> Option<&BlockDefinition> {
        self.types.get(block_type)
    }

    /// All registered definitions, sorted by type name for stable output.
    pub fn all(&self) -> Vec<&BlockDefinition> {
        let mut definitions: Vec<_> = self.types.values().collect();
        definitions.sort_by(|a, b| a.block_type.cmp(&b.block_type));
        definitions
    }

    pub fn contains(&self, block_type: &str) -> bool {
        self.types.contains_key(block_type)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// An instance authored against an older schema version than the
    /// registry's current one needs migration. Unknown types are not
    /// migration candidates; they fail validation instead.
    pub fn needs_migration(&self, instance: &BlockInstance) -> bool {
        self.get(&instance.block_type)
            .is_some_and(|definition| instance.version < definition.version)
    }

    /// Flag all migration candidates in a block sequence.
    pub fn migration_candidates<'a>(
        &self,
        blocks: &'a [BlockInstance],
    ) -> Vec<&'a BlockInstance> {
        blocks
            .iter()
            .filter(|instance| self.needs_migration(instance))
            .collect()
    }
}

/// The standard block palette registered at process start.
fn builtin_definitions() -> Vec<BlockDefinition> {
    vec![
        BlockDefinition {
            block_type: "hero".to_string(),
            label: "Hero".to_string(),
            version: 2,
            schema: json!({
                "required": ["heading"],
                "properties": {
                    "heading": {"type": "string"},
                    "subheading": {"type": "string"},
                    "backgroundImage": {"type": "string"},
                    "alignment": {"enum": ["left", "center", "right"]}
                }
            }),
            default_props: json!({"heading": "", "alignment": "center"}),
        },
        BlockDefinition {
            block_type: "richText".to_string(),
            label: "Rich Text".to_string(),
            version: 1,
            schema: json!({
                "required": ["content"],
                "properties": {"content": {"type": "string"}}
            }),
            default_props: json!({"content": ""}),
        },
        BlockDefinition {
            block_type: "image".to_string(),
            label: "Image".to_string(),
            version: 1,
            schema: json!({
                "required": ["src"],
                "properties": {
                    "src": {"type": "string"},
                    "alt": {"type": "string"},
                    "caption": {"type": "string"}
                }
            }),
            default_props: json!({"src": "", "alt": ""}),
        },
        BlockDefinition {
            block_type: "callToAction".to_string(),
            label: "Call to Action".to_string(),
            version: 1,
            schema: json!({
                "required": ["label", "href"],
                "properties": {
                    "label": {"type": "string"},
                    "href": {"type": "string"}
                }
            }),
            default_props: json!({"label": "", "href": ""}),
        },
        BlockDefinition {
            block_type: "teamGrid".to_string(),
            label: "Team Grid".to_string(),
            version: 1,
            schema: json!({
                "required": [],
                "properties": {"memberIds": {"type": "array"}}
            }),
            default_props: json!({"memberIds": []}),
        },
        BlockDefinition {
            block_type: "postList".to_string(),
            label: "Post List".to_string(),
            version: 1,
            schema: json!({
                "required": [],
                "properties": {
                    "categoryId": {"type": "string"},
                    "limit": {"type": "integer"}
                }
            }),
            default_props: json!({"limit": 10}),
        },
    ]
}

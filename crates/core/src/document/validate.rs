//! Write-boundary validation of block instances against the registry.

use thiserror::Error;

use crate::blocks::BlockRegistry;
use crate::document::model::BlockInstance;

#[derive(Debug, Error)]
pub enum BlockValidationError {
    #[error("block id cannot be empty")]
    EmptyId,

    #[error("duplicate block id '{0}'")]
    DuplicateId(String),

    #[error("unknown block type '{0}'")]
    UnknownType(String),

    #[error("block '{id}': version {version} is ahead of registry version {current}")]
    FutureVersion { id: String, version: u32, current: u32 },

    #[error("block '{id}': props must be a JSON object")]
    PropsNotObject { id: String },

    #[error("block '{id}': missing required prop '{prop}'")]
    MissingProp { id: String, prop: String },
}

/// Validate an ordered block sequence against the registry.
///
/// Checks, per instance: non-empty unique id, known type, authored version
/// not ahead of the registry, props is an object carrying every prop the
/// type's schema marks as `required`. Instances authored against an *older*
/// version pass — they are migration candidates, not errors.
pub fn validate_blocks(
    blocks: &[BlockInstance],
    registry: &BlockRegistry,
) -> Result<(), BlockValidationError> {
    let mut seen = std::collections::HashSet::new();

    for instance in blocks {
        if instance.id.is_empty() {
            return Err(BlockValidationError::EmptyId);
        }
        if !seen.insert(instance.id.as_str()) {
            return Err(BlockValidationError::DuplicateId(instance.id.clone()));
        }

        let Some(definition) = registry.get(&instance.block_type) else {
            return Err(BlockValidationError::UnknownType(instance.block_type.clone()));
        };

        if instance.version > definition.version {
            return Err(BlockValidationError::FutureVersion {
                id: instance.id.clone(),
                version: instance.version,
                current: definition.version,
            });
        }

        let Some(props) = instance.props.as_object() else {
            return Err(BlockValidationError::PropsNotObject {
                id: instance.id.clone(),
            });
        };

        if let Some(required) = definition.schema.get("required").and_then(|v| v.as_array()) {
            for prop in required.iter().filter_map(|v| v.as_str()) {
                if !props.contains_key(prop) {
                    return Err(BlockValidationError::MissingProp {
                        id: instance.id.clone(),
                        prop: prop.to_string(),
                    });
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn block(id: &str, block_type: &str, version: u32, props: serde_json::Value) -> BlockInstance {
        BlockInstance {
            id: id.to_string(),
            block_type: block_type.to_string(),
            version,
            props,
        }
    }

    #[test]
    fn valid_blocks_pass() {
        let registry = BlockRegistry::with_builtin_types();
        let blocks = vec![
            block("b1", "hero", 2, json!({"heading": "Hi"})),
            block("b2", "richText", 1, json!({"content": "<p>hi</p>"})),
        ];
        assert!(validate_blocks(&blocks, &registry).is_ok());
    }

    #[test]
    fn unknown_type_is_rejected() {
        let registry = BlockRegistry::with_builtin_types();
        let blocks = vec![block("b1", "carousel", 1, json!({}))];
        assert!(matches!(
            validate_blocks(&blocks, &registry),
            Err(BlockValidationError::UnknownType(t)) if t == "carousel"
        ));
    }

    #[test]
    fn future_version_is_rejected_older_passes() {
        let registry = BlockRegistry::with_builtin_types();

        let future = vec![block("b1", "hero", 9, json!({"heading": "x"}))];
        assert!(matches!(
            validate_blocks(&future, &registry),
            Err(BlockValidationError::FutureVersion { current: 2, .. })
        ));

        // Older versions are migration candidates, not validation failures.
        let stale = vec![block("b1", "hero", 1, json!({"heading": "x"}))];
        assert!(validate_blocks(&stale, &registry).is_ok());
    }

    #[test]
    fn missing_required_prop_is_rejected() {
        let registry = BlockRegistry::with_builtin_types();
        let blocks = vec![block("b1", "callToAction", 1, json!({"label": "Go"}))];
        assert!(matches!(
            validate_blocks(&blocks, &registry),
            Err(BlockValidationError::MissingProp { prop, .. }) if prop == "href"
        ));
    }

    #[test]
    fn non_object_props_are_rejected() {
        let registry = BlockRegistry::with_builtin_types();
        let blocks = vec![block("b1", "hero", 2, json!("not an object"))];
        assert!(matches!(
            validate_blocks(&blocks, &registry),
            Err(BlockValidationError::PropsNotObject { .. })
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let registry = BlockRegistry::with_builtin_types();
        let blocks = vec![
            block("b1", "hero", 2, json!({"heading": "a"})),
            block("b1", "richText", 1, json!({"content": "b"})),
        ];
        assert!(matches!(
            validate_blocks(&blocks, &registry),
            Err(BlockValidationError::DuplicateId(_))
        ));
    }
}

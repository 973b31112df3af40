//! Typed property decoding.
//!
//! Tiled writes properties as a list of `{"name", "type", "value"}` records.
//! Only `int`, `float`, `bool` and `string` are understood; other types
//! (`color`, `file`, `object`, `class`) are skipped with a warning unless
//! [`DecodeConfig::strict_properties`] is set.

use serde_json::Value;
use tracing::warn;

use crate::assets::properties::{Properties, PropertyValue};
use crate::config::DecodeConfig;
use crate::error::{DecodeError, DecodeResult};
use crate::loaders::Scope;
use crate::loaders::fields::{optional_array, require, require_str, to_i32};

/// Decode the `properties` field of `doc`; absent means empty.
pub(crate) fn decode_properties_of(
    doc: &Value,
    scope: &Scope<'_>,
    config: &DecodeConfig,
) -> DecodeResult<Properties> {
    decode_properties(optional_array(doc, "properties", scope)?, scope, config)
}

/// Decode a list of property records into a map keyed by name.
///
/// A later record with the same name replaces an earlier one.
pub(crate) fn decode_properties(
    records: &[Value],
    scope: &Scope<'_>,
    config: &DecodeConfig,
) -> DecodeResult<Properties> {
    let mut properties = Properties::new();

    for (index, record) in records.iter().enumerate() {
        let scope = scope.index("properties", index);
        let name = require_str(record, "name", &scope)?;
        let type_name = require_str(record, "type", &scope)?;
        let value = require(record, "value", &scope)?;

        let decoded = match type_name {
            "int" => PropertyValue::Int(to_i32(value, "value", &scope)?),
            "float" => PropertyValue::Float(
                value
                    .as_f64()
                    .ok_or_else(|| scope.invalid("value", format!("expected a float, found {value}")))?
                    as f32,
            ),
            "bool" => PropertyValue::Bool(
                value
                    .as_bool()
                    .ok_or_else(|| scope.invalid("value", format!("expected a bool, found {value}")))?,
            ),
            "string" => PropertyValue::Text(
                value
                    .as_str()
                    .ok_or_else(|| {
                        scope.invalid("value", format!("expected a string, found {value}"))
                    })?
                    .to_string(),
            ),
            other => {
                if config.strict_properties {
                    return Err(DecodeError::UnrecognizedPropertyType {
                        name: name.to_string(),
                        type_name: other.to_string(),
                        scope: scope.describe(),
                    });
                }
                warn!("Skipping property '{name}' of unsupported type '{other}' in {scope}");
                continue;
            }
        };

        properties.insert(name, decoded);
    }

    Ok(properties)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use serde_json::json;

    use super::*;

    fn decode(records: Value, config: &DecodeConfig) -> DecodeResult<Properties> {
        let file = Path::new("map.json");
        let records = records.as_array().cloned().unwrap_or_default();
        decode_properties(&records, &Scope::file(file), config)
    }

    #[test]
    fn decodes_each_supported_type() {
        let props = decode(
            json!([
                {"name": "hp", "type": "int", "value": 5},
                {"name": "speed", "type": "float", "value": 1.5},
                {"name": "solid", "type": "bool", "value": true},
                {"name": "label", "type": "string", "value": "door"},
            ]),
            &DecodeConfig::default(),
        )
        .unwrap();

        assert_eq!(props.len(), 4);
        assert_eq!(props.int("hp"), Some(5));
        assert_eq!(props.float("speed"), Some(1.5));
        assert_eq!(props.bool("solid"), Some(true));
        assert_eq!(props.text("label"), Some("door"));
    }

    #[test]
    fn unknown_types_are_skipped_unless_strict() {
        let records = json!([
            {"name": "tint", "type": "color", "value": "#ff00ff00"},
            {"name": "hp", "type": "int", "value": 2},
        ]);

        let props = decode(records.clone(), &DecodeConfig::default()).unwrap();
        assert_eq!(props.len(), 1);
        assert!(!props.contains("tint"));

        let err = decode(records, &DecodeConfig::default().strict_properties(true)).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnrecognizedPropertyType { ref name, ref type_name, .. }
                if name == "tint" && type_name == "color"
        ));
    }

    #[test]
    fn later_duplicate_wins() {
        let props = decode(
            json!([
                {"name": "hp", "type": "int", "value": 1},
                {"name": "hp", "type": "string", "value": "full"},
            ]),
            &DecodeConfig::default(),
        )
        .unwrap();
        assert_eq!(props.len(), 1);
        assert_eq!(props.text("hp"), Some("full"));
        assert_eq!(props.int("hp"), None);
    }

    #[test]
    fn mismatched_value_is_invalid() {
        let err = decode(
            json!([{"name": "hp", "type": "int", "value": "lots"}]),
            &DecodeConfig::default(),
        )
        .unwrap_err();
        match err {
            DecodeError::InvalidField { field, scope, .. } => {
                assert_eq!(field, "value");
                assert_eq!(scope, "map.json: properties[0]");
            }
            other => panic!("unexpected error: {other}"),
        }

        let props = decode(
            json!([{"name": "hp", "type": "int", "value": 2.5}]),
            &DecodeConfig::default(),
        )
        .unwrap();
        assert_eq!(props.int("hp"), Some(2));
    }

    #[test]
    fn missing_type_is_reported() {
        let err = decode(json!([{"name": "hp", "value": 1}]), &DecodeConfig::default()).unwrap_err();
        assert!(matches!(err, DecodeError::MissingField { field: "type", .. }));
    }
}

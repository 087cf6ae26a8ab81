//! Form schemas derived from entity types.
//!
//! Attribute names follow a naming convention:
//! - `_name` declares a form-level option (e.g. `_record_count`).
//! - `attr__option` declares an option on attribute `attr` (e.g. `hostname__modifier`).
//! - everything else is a field of the form.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::entity::{Attribute, EntityDefinition};
use crate::types::Value;

/// Prefix marking a form-level option.
pub const OPTION_SENTINEL: char = '_';

/// Separator between an attribute name and one of its options.
pub const ATTRIBUTE_OPTION_SEPARATOR: &str = "__";

/// Modifier applied to attributes that carry options but no explicit modifier.
pub const DEFAULT_MODIFIER: &str = "rw";

/// Form-level option limiting the number of records.
pub const RECORD_COUNT_OPTION: &str = "record_count";

/// Description of a single form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSpec {
    /// Rendered type descriptor.
    #[serde(rename = "type")]
    pub type_name: String,

    /// Evaluated default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Per-attribute options such as `modifier`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<IndexMap<String, Value>>,
}

impl AttributeSpec {
    /// The access modifier of this field, if options were declared.
    pub fn modifier(&self) -> Option<&str> {
        self.options
            .as_ref()
            .and_then(|options| options.get("modifier"))
            .and_then(Value::as_str)
    }

    /// Returns true if a default value is declared.
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// The wire description of a form, pushed to the store as an upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    /// Entity type name, also used as the form identifier.
    #[serde(rename = "type")]
    pub form_type: String,

    /// Fields in declaration order.
    pub attributes: IndexMap<String, AttributeSpec>,

    /// Form-level options.
    pub options: IndexMap<String, Value>,
}

impl FormSchema {
    /// Derive the schema of an entity type.
    ///
    /// Own attributes are collected first, then the attributes of every
    /// supertype that are not already defined by a more specific type.
    pub fn derive(entity: &dyn EntityDefinition) -> Self {
        let mut working: IndexMap<&str, &Attribute> = IndexMap::new();
        for attribute in entity.own_attributes() {
            working.insert(attribute.name.as_str(), attribute);
        }
        for parent in entity.supertypes() {
            for attribute in parent.own_attributes() {
                working.entry(attribute.name.as_str()).or_insert(attribute);
            }
        }

        let mut attributes: IndexMap<String, AttributeSpec> = IndexMap::new();
        let mut options: IndexMap<String, Value> = IndexMap::new();
        let mut attribute_options: IndexMap<String, IndexMap<String, Value>> = IndexMap::new();

        for (name, attribute) in working {
            let default = attribute.evaluate_default();

            if let Some(option) = name.strip_prefix(OPTION_SENTINEL) {
                if let Some(value) = default.as_ref().filter(|v| !v.is_null()) {
                    options.insert(option.to_string(), value.clone());
                    continue;
                }
            }

            if let Some((base, option)) = name.rsplit_once(ATTRIBUTE_OPTION_SEPARATOR) {
                if let Some(value) = default {
                    attribute_options
                        .entry(base.to_string())
                        .or_default()
                        .insert(option.to_string(), value);
                }
                continue;
            }

            attributes.insert(
                name.to_string(),
                AttributeSpec {
                    type_name: attribute.type_descriptor.to_string(),
                    default,
                    options: None,
                },
            );
        }

        for (base, mut field_options) in attribute_options {
            // Options on something that is not a field have nowhere to go.
            let Some(spec) = attributes.get_mut(&base) else {
                continue;
            };
            field_options
                .entry("modifier".to_string())
                .or_insert_with(|| Value::String(DEFAULT_MODIFIER.to_string()));
            spec.options = Some(field_options);
        }

        Self {
            form_type: entity.type_name().to_string(),
            attributes,
            options,
        }
    }

    /// The `record_count` option, if set to a whole non-negative number.
    ///
    /// `1` and `1.0` are the same count.
    pub fn record_count(&self) -> Option<u64> {
        let value = self.options.get(RECORD_COUNT_OPTION)?;
        value.as_u64().or_else(|| {
            value
                .as_f64()
                .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= u64::MAX as f64)
                .map(|n| n as u64)
        })
    }

    /// Returns true if at most one record may exist for this form.
    pub fn is_singleton(&self) -> bool {
        self.record_count() == Some(1)
    }

    /// Look up a field.
    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.get(name)
    }
}

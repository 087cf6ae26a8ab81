//! Typed entity definitions that forms are derived from.
//!
//! An entity exposes its own attributes in declaration order, its transitive
//! supertypes and a way to evaluate attribute defaults without any context.
//! The [`Entity`] type is a ready-made implementation with a fluent builder;
//! hosts with their own type system implement [`EntityDefinition`] directly.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::error::{FormError, Result};
use crate::types::Value;

/// Name of the implicit base type every entity inherits from.
pub const BASE_ENTITY: &str = "std::Entity";

/// Type of an entity attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    String,
    Number,
    Bool,
    Dict,
    Any,
    /// A list of the inner type.
    List(Box<TypeDescriptor>),
    /// A reference to another entity type.
    Entity(String),
}

impl TypeDescriptor {
    /// Infer the descriptor of a literal value.
    pub fn of_value(value: &Value) -> Self {
        match value {
            Value::String(_) => TypeDescriptor::String,
            Value::Number(_) => TypeDescriptor::Number,
            Value::Bool(_) => TypeDescriptor::Bool,
            Value::Object(_) => TypeDescriptor::Dict,
            Value::Array(_) => TypeDescriptor::List(Box::new(TypeDescriptor::Any)),
            Value::Null => TypeDescriptor::Any,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::String => f.write_str("string"),
            TypeDescriptor::Number => f.write_str("number"),
            TypeDescriptor::Bool => f.write_str("bool"),
            TypeDescriptor::Dict => f.write_str("dict"),
            TypeDescriptor::Any => f.write_str("any"),
            TypeDescriptor::List(inner) => write!(f, "{}[]", inner),
            TypeDescriptor::Entity(name) => f.write_str(name),
        }
    }
}

/// A default-value expression, evaluated without any external inputs.
pub trait DefaultExpr: fmt::Debug + Send + Sync {
    fn evaluate(&self) -> Value;
}

impl DefaultExpr for Value {
    fn evaluate(&self) -> Value {
        self.clone()
    }
}

/// A declared attribute of an entity.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub type_descriptor: TypeDescriptor,
    pub default: Option<Arc<dyn DefaultExpr>>,
}

impl Attribute {
    /// Create an attribute without a default.
    pub fn new(name: impl Into<String>, type_descriptor: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            type_descriptor,
            default: None,
        }
    }

    /// Attach a default expression.
    pub fn with_default(mut self, default: impl DefaultExpr + 'static) -> Self {
        self.default = Some(Arc::new(default));
        self
    }

    /// Evaluate the default expression, if one is declared.
    pub fn evaluate_default(&self) -> Option<Value> {
        self.default.as_ref().map(|expr| expr.evaluate())
    }
}

/// What the schema deriver needs to know about an entity type.
pub trait EntityDefinition: Send + Sync {
    /// Fully qualified type name, e.g. `infra::Server`.
    fn type_name(&self) -> &str;

    /// Attributes declared on this type itself, in declaration order.
    fn own_attributes(&self) -> &[Attribute];

    /// All supertypes, most specific first, without [`BASE_ENTITY`].
    fn supertypes(&self) -> Vec<&dyn EntityDefinition>;
}

/// A concrete entity type.
#[derive(Debug, Clone)]
pub struct Entity {
    name: String,
    attributes: Vec<Attribute>,
    parents: Vec<Arc<Entity>>,
}

impl Entity {
    /// Start building an entity type with the given name.
    pub fn builder(name: impl Into<String>) -> EntityBuilder {
        EntityBuilder::new(name)
    }

    /// Direct parents of this type.
    pub fn parents(&self) -> &[Arc<Entity>] {
        &self.parents
    }
}

impl EntityDefinition for Entity {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn own_attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    fn supertypes(&self) -> Vec<&dyn EntityDefinition> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut result: Vec<&dyn EntityDefinition> = Vec::new();
        let mut stack: Vec<&Entity> = self.parents.iter().rev().map(|p| p.as_ref()).collect();

        // Depth-first so that nearer ancestors come before remote ones.
        while let Some(parent) = stack.pop() {
            if parent.name == BASE_ENTITY || !seen.insert(parent.name.as_str()) {
                continue;
            }
            result.push(parent);
            stack.extend(parent.parents.iter().rev().map(|p| p.as_ref()));
        }

        result
    }
}

/// Builder for creating entity types with a fluent API.
#[derive(Debug)]
pub struct EntityBuilder {
    name: String,
    attributes: Vec<Attribute>,
    parents: Vec<Arc<Entity>>,
}

impl EntityBuilder {
    /// Create a new builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            parents: Vec::new(),
        }
    }

    /// Declare an attribute without a default.
    pub fn attribute(mut self, name: impl Into<String>, type_descriptor: TypeDescriptor) -> Self {
        self.attributes.push(Attribute::new(name, type_descriptor));
        self
    }

    /// Declare an attribute with a literal default.
    pub fn attribute_with_default(
        mut self,
        name: impl Into<String>,
        type_descriptor: TypeDescriptor,
        default: Value,
    ) -> Self {
        self.attributes
            .push(Attribute::new(name, type_descriptor).with_default(default));
        self
    }

    /// Declare a fully specified attribute.
    pub fn declare(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Declare a form-level option, e.g. `record_count`.
    pub fn option(self, name: &str, value: Value) -> Self {
        let type_descriptor = TypeDescriptor::of_value(&value);
        self.attribute_with_default(format!("_{}", name), type_descriptor, value)
    }

    /// Declare an option on a single attribute, e.g. `modifier`.
    pub fn attribute_option(self, attribute: &str, option: &str, value: Value) -> Self {
        let type_descriptor = TypeDescriptor::of_value(&value);
        self.attribute_with_default(format!("{}__{}", attribute, option), type_descriptor, value)
    }

    /// Inherit from another entity type.
    pub fn parent(mut self, parent: Arc<Entity>) -> Self {
        self.parents.push(parent);
        self
    }

    /// Build the entity type.
    pub fn build(self) -> Entity {
        Entity {
            name: self.name,
            attributes: self.attributes,
            parents: self.parents,
        }
    }
}

/// Lookup of entity types by name.
#[derive(Default, Clone)]
pub struct EntityCatalog {
    types: HashMap<String, Arc<dyn EntityDefinition>>,
}

impl EntityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity type under its own type name.
    pub fn register(&mut self, entity: Arc<dyn EntityDefinition>) {
        self.types.insert(entity.type_name().to_string(), entity);
    }

    /// Register an entity type, builder style.
    pub fn with(mut self, entity: Arc<dyn EntityDefinition>) -> Self {
        self.register(entity);
        self
    }

    /// Look up an entity type by name.
    pub fn get_type(&self, name: &str) -> Result<Arc<dyn EntityDefinition>> {
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| FormError::TypeNotFound {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl fmt::Debug for EntityCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityCatalog")
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_descriptor_display() {
        assert_eq!(TypeDescriptor::String.to_string(), "string");
        assert_eq!(
            TypeDescriptor::List(Box::new(TypeDescriptor::Number)).to_string(),
            "number[]"
        );
        assert_eq!(TypeDescriptor::Entity("infra::Host".into()).to_string(), "infra::Host");
    }

    #[test]
    fn test_builder_naming_convention() {
        let entity = Entity::builder("infra::Server")
            .attribute("hostname", TypeDescriptor::String)
            .option("record_count", json!(1))
            .attribute_option("hostname", "modifier", json!("ro"))
            .build();

        let names: Vec<&str> = entity
            .own_attributes()
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, vec!["hostname", "_record_count", "hostname__modifier"]);
        assert_eq!(entity.own_attributes()[1].evaluate_default(), Some(json!(1)));
    }

    #[test]
    fn test_supertypes_skip_base_and_duplicates() {
        let base = Arc::new(Entity::builder(BASE_ENTITY).build());
        let named = Arc::new(Entity::builder("std::Named").parent(base.clone()).build());
        let host = Arc::new(Entity::builder("infra::Host").parent(named.clone()).build());
        let managed = Arc::new(Entity::builder("infra::Managed").parent(named).build());
        let server = Entity::builder("infra::Server")
            .parent(host)
            .parent(managed)
            .parent(base)
            .build();

        let names: Vec<&str> = server.supertypes().iter().map(|e| e.type_name()).collect();
        assert_eq!(names, vec!["infra::Host", "std::Named", "infra::Managed"]);
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = EntityCatalog::new().with(Arc::new(Entity::builder("infra::Server").build()));

        assert!(catalog.contains("infra::Server"));
        assert_eq!(catalog.get_type("infra::Server").unwrap().type_name(), "infra::Server");
        assert!(matches!(
            catalog.get_type("infra::Missing"),
            Err(FormError::TypeNotFound { .. })
        ));
    }
}

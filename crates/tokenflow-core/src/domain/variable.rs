//! Process variables and the data-type registry they are typed through

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::element::{id_key, ElementKind, FlowElement};
use crate::domain::validation::{error_codes, ValidationContext};
use crate::{CoreError, DataPacket};

/// Shape of a value as seen by the type registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// JSON null
    Null,
    /// true / false
    Boolean,
    /// Any JSON number
    Number,
    /// UTF-8 string
    String,
    /// Ordered list
    Array,
    /// Key/value map
    Object,
}

impl ValueKind {
    /// Name the default registry uses for this kind
    pub fn builtin_name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        }
    }

    /// Kind of a concrete value
    pub fn of(value: &DataPacket) -> Self {
        match value.as_value() {
            serde_json::Value::Null => ValueKind::Null,
            serde_json::Value::Bool(_) => ValueKind::Boolean,
            serde_json::Value::Number(_) => ValueKind::Number,
            serde_json::Value::String(_) => ValueKind::String,
            serde_json::Value::Array(_) => ValueKind::Array,
            serde_json::Value::Object(_) => ValueKind::Object,
        }
    }
}

/// Data type descriptor resolved through a [`TypeRegistry`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataType {
    /// Registered name
    pub name: String,

    /// Value shape accepted by this type
    pub kind: ValueKind,
}

impl DataType {
    /// Create a descriptor
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Whether a value fits this type. Null fits every type.
    pub fn accepts(&self, value: &DataPacket) -> bool {
        value.is_null() || ValueKind::of(value) == self.kind
    }
}

/// Resolves data types by name or by inspecting a value
pub trait TypeRegistry: Send + Sync {
    /// Look up a type by name
    fn resolve(&self, name: &str) -> Option<DataType>;

    /// Infer the type of a concrete value
    fn infer(&self, value: &DataPacket) -> Option<DataType>;
}

/// Registry seeded with one type per JSON value kind
#[derive(Debug, Clone)]
pub struct DefaultTypeRegistry {
    types: HashMap<String, DataType>,
}

impl DefaultTypeRegistry {
    /// Create a registry with the built-in types
    pub fn new() -> Self {
        let mut registry = Self {
            types: HashMap::new(),
        };
        for kind in [
            ValueKind::Null,
            ValueKind::Boolean,
            ValueKind::Number,
            ValueKind::String,
            ValueKind::Array,
            ValueKind::Object,
        ] {
            registry.register(DataType::new(kind.builtin_name(), kind));
        }
        registry
    }

    /// Register or replace a type. Names are case-insensitive.
    pub fn register(&mut self, data_type: DataType) {
        self.types
            .insert(id_key(&data_type.name), data_type);
    }
}

impl Default for DefaultTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry for DefaultTypeRegistry {
    fn resolve(&self, name: &str) -> Option<DataType> {
        self.types.get(&id_key(name)).cloned()
    }

    fn infer(&self, value: &DataPacket) -> Option<DataType> {
        let kind = ValueKind::of(value);
        // Custom registrations may share a kind; the built-in name wins.
        self.resolve(kind.builtin_name()).or_else(|| {
            self.types
                .values()
                .find(|data_type| data_type.kind == kind)
                .cloned()
        })
    }
}

/// Process-scoped named value holder with a type and a default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Name, unique within the graph (case-insensitive)
    pub name: String,

    /// Data type, resolved through a registry
    pub data_type: Option<DataType>,

    /// Value used when the instance has not set one
    pub default_value: Option<DataPacket>,
}

impl Variable {
    /// Create an untyped variable without default
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: None,
            default_value: None,
        }
    }

    /// Type the variable by registered type name
    pub fn with_type(
        mut self,
        registry: &dyn TypeRegistry,
        type_name: &str,
    ) -> Result<Self, CoreError> {
        let data_type = registry
            .resolve(type_name)
            .ok_or_else(|| CoreError::UnknownDataType(type_name.to_string()))?;
        self.data_type = Some(data_type);
        Ok(self)
    }

    /// Set the default value, inferring the type when none is set yet
    pub fn with_default(
        mut self,
        registry: &dyn TypeRegistry,
        value: impl Into<DataPacket>,
    ) -> Result<Self, CoreError> {
        self.set_default(registry, value.into())?;
        Ok(self)
    }

    /// Set the default value, inferring the type when none is set yet
    pub fn set_default(
        &mut self,
        registry: &dyn TypeRegistry,
        value: DataPacket,
    ) -> Result<(), CoreError> {
        if self.data_type.is_none() {
            let inferred = registry.infer(&value).ok_or_else(|| {
                CoreError::UnknownDataType(format!("{:?}", ValueKind::of(&value)))
            })?;
            self.data_type = Some(inferred);
        }
        self.default_value = Some(value);
        Ok(())
    }
}

impl FlowElement for Variable {
    fn id(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Variable
    }

    fn validate(&self, context: &mut ValidationContext<'_>) {
        if self.name.trim().is_empty() {
            context.add_error(
                self,
                error_codes::MISSING_REQUIRED_FIELD,
                "Variable has an empty name",
            );
        }

        if let (Some(data_type), Some(default)) = (&self.data_type, &self.default_value) {
            if !data_type.accepts(default) {
                context.add_error(
                    self,
                    error_codes::TYPE_MISMATCH,
                    format!(
                        "Default value of variable {} is {:?}, expected {}",
                        self.name,
                        ValueKind::of(default),
                        data_type.name
                    ),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registry_resolves_case_insensitively() {
        let registry = DefaultTypeRegistry::new();
        assert_eq!(registry.resolve("Boolean").unwrap().kind, ValueKind::Boolean);
        assert!(registry.resolve("decimal").is_none());
    }

    #[test]
    fn test_default_infers_type() {
        let registry = DefaultTypeRegistry::new();
        let variable = Variable::new("approved")
            .with_default(&registry, true)
            .unwrap();
        assert_eq!(variable.data_type.unwrap().name, "boolean");
        assert_eq!(variable.default_value, Some(DataPacket::from_bool(true)));
    }

    #[test]
    fn test_explicit_type_is_kept() {
        let registry = DefaultTypeRegistry::new();
        let variable = Variable::new("count")
            .with_type(&registry, "string")
            .unwrap()
            .with_default(&registry, DataPacket::new(json!(3)))
            .unwrap();
        assert_eq!(variable.data_type.as_ref().unwrap().name, "string");
        assert!(!variable.data_type.unwrap().accepts(&DataPacket::new(json!(3))));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let registry = DefaultTypeRegistry::new();
        let err = Variable::new("amount").with_type(&registry, "decimal").unwrap_err();
        assert_eq!(err, CoreError::UnknownDataType("decimal".to_string()));
    }

    #[test]
    fn test_custom_registration_does_not_shadow_inference() {
        let mut registry = DefaultTypeRegistry::new();
        registry.register(DataType::new("email_address", ValueKind::String));
        assert_eq!(
            registry.infer(&DataPacket::from_string("a@b.c")).unwrap().name,
            "string"
        );
        assert_eq!(
            registry.resolve("EMAIL_ADDRESS").unwrap().kind,
            ValueKind::String
        );
    }
}

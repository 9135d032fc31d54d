//! Terraform attribute tables and the plan modifiers the provider contributes.
//!
//! Terraform core computes the diff itself. What the provider adds on top is
//! static defaults, keeping computed values stable across plans and flagging
//! attributes whose change needs the remote object to be replaced.

use schemars::schema::RootSchema;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Bool,
    Number,
    StringList,
    ObjectList,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Attribute {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: AttributeType,
    pub description: &'static str,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub requires_replace: bool,
    pub use_state_for_unknown: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Attribute {
    fn new(name: &'static str, kind: AttributeType, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            requires_replace: false,
            use_state_for_unknown: false,
            default: None,
        }
    }

    pub fn required(name: &'static str, kind: AttributeType, description: &'static str) -> Self {
        Self {
            required: true,
            ..Self::new(name, kind, description)
        }
    }

    pub fn optional(name: &'static str, kind: AttributeType, description: &'static str) -> Self {
        Self {
            optional: true,
            ..Self::new(name, kind, description)
        }
    }

    pub fn computed(name: &'static str, kind: AttributeType, description: &'static str) -> Self {
        Self {
            computed: true,
            ..Self::new(name, kind, description)
        }
    }

    /// Let the provider fill the value when the configuration leaves it out
    pub fn or_computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn requires_replace(mut self) -> Self {
        self.requires_replace = true;
        self
    }

    pub fn use_state_for_unknown(mut self) -> Self {
        self.use_state_for_unknown = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.computed = true;
        self.default = Some(default.into());
        self
    }
}

/// The schema of a resource or data source as presented to Terraform
#[derive(Serialize, Clone, Debug)]
pub struct Schema {
    pub type_name: String,
    pub description: &'static str,
    pub attributes: Vec<Attribute>,
    pub json_schema: RootSchema,
}

/// Outcome of planning a change on one resource
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Plan {
    pub planned_state: Value,
    pub requires_replace: Vec<&'static str>,
}

impl Schema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Plan the move from `prior` state (absent on create) to the `proposed` configuration
    pub fn plan(&self, prior: Option<&Value>, proposed: Value) -> Plan {
        let mut planned = match proposed {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        for attr in &self.attributes {
            let slot = planned.entry(attr.name).or_insert(Value::Null);
            if slot.is_null() {
                if let Some(default) = &attr.default {
                    *slot = default.clone();
                }
            }
        }

        let prior = prior.and_then(Value::as_object);
        let requires_replace: Vec<&'static str> = match prior {
            Some(prior) => self
                .attributes
                .iter()
                .filter(|attr| attr.requires_replace)
                .filter(|attr| {
                    let planned = &planned[attr.name];
                    !planned.is_null() && prior.get(attr.name).unwrap_or(&Value::Null) != planned
                })
                .map(|attr| attr.name)
                .collect(),
            None => Vec::new(),
        };

        if let (Some(prior), true) = (prior, requires_replace.is_empty()) {
            for attr in self.attributes.iter().filter(|a| a.use_state_for_unknown) {
                if planned[attr.name].is_null() {
                    if let Some(value) = prior.get(attr.name) {
                        planned.insert(attr.name.to_string(), value.clone());
                    }
                }
            }
        }

        Plan {
            planned_state: Value::Object(planned),
            requires_replace,
        }
    }
}

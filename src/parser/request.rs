//! Property request
//!
//! Either a named template with its inputs, a literal formula over quoted
//! variable/function references, or an already compiled property that is
//! passed through untouched.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Template inputs as given in the request, keyed by input name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateInputs {
    values: BTreeMap<String, Value>,
}

impl TemplateInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used by callers assembling requests in code
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    /// Input `key` as text; absent, null and empty values are "not given"
    pub fn get(&self, key: &str) -> Option<String> {
        let text = match self.values.get(key)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Input `key`, failing with `MissingField` when not given
    pub fn require(&self, key: &str, template: &str) -> Result<String> {
        self.get(key)
            .ok_or_else(|| Error::missing(key, format!("inputs of template `{}`", template)))
    }
}

/// A compile request for the property step
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyRequest {
    /// Named vulnerability/relation/ordering template
    General {
        template: String,
        inputs: TemplateInputs,
    },
    /// Literal LTL formula over quoted references
    Formula { formula: String },
    /// Already compiled property and propositions
    Literal {
        property: String,
        propositions: String,
    },
}

#[derive(Debug, Deserialize)]
struct RawRequest {
    #[serde(rename = "type")]
    kind: String,
    params: BTreeMap<String, Value>,
}

impl PropertyRequest {
    pub fn general(template: &str, inputs: TemplateInputs) -> Self {
        PropertyRequest::General {
            template: template.to_string(),
            inputs,
        }
    }

    pub fn formula(formula: &str) -> Self {
        PropertyRequest::Formula {
            formula: formula.to_string(),
        }
    }

    /// Decode a request document
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawRequest = Error::from_json(text, "property request")?;
        let text_param = |key: &str| -> Option<String> {
            match raw.params.get(key)? {
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            }
        };

        match raw.kind.as_str() {
            "general" => {
                let template =
                    text_param("name").ok_or_else(|| Error::missing("name", "property request params"))?;
                let inputs = match raw.params.get("inputs") {
                    Some(Value::Object(map)) => TemplateInputs {
                        values: map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                    },
                    Some(other) => {
                        return Err(Error::InvalidValue {
                            field: "inputs".to_string(),
                            value: other.to_string(),
                            reason: "expected an object".to_string(),
                        })
                    }
                    None => return Err(Error::missing("inputs", "property request params")),
                };
                Ok(PropertyRequest::General { template, inputs })
            }
            "specific" => {
                if let Some(formula) = text_param("formula") {
                    return Ok(PropertyRequest::Formula { formula });
                }
                let property = text_param("property")
                    .ok_or_else(|| Error::missing("formula", "property request params"))?;
                Ok(PropertyRequest::Literal {
                    property,
                    propositions: text_param("propositions").unwrap_or_default(),
                })
            }
            other => Err(Error::InvalidValue {
                field: "type".to_string(),
                value: other.to_string(),
                reason: "expected `general` or `specific`".to_string(),
            }),
        }
    }

    /// Variable names the request refers to
    pub fn variable_inputs(&self) -> Vec<String> {
        match self {
            PropertyRequest::General { inputs, .. } => ["selected_variable", "second_variable"]
                .iter()
                .filter_map(|key| inputs.get(key))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Function names the request refers to
    pub fn function_inputs(&self) -> Vec<String> {
        match self {
            PropertyRequest::General { inputs, .. } => ["selected_function", "second_function"]
                .iter()
                .filter_map(|key| inputs.get(key))
                .collect(),
            _ => Vec::new(),
        }
    }
}

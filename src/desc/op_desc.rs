//! Declarative operator descriptions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::attrs::{AttrValue, AttributeMap};
use crate::formatting::DebugString;

/// An operator invocation record: op type, named input/output slots (each a
/// list of variable names) and an attribute map. Built by callers or loaded
/// from a serialized program; frozen once handed to the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpDescriptor {
    pub op_type: String,
    #[serde(default)]
    pub inputs: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub outputs: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub attrs: AttributeMap,
}

impl OpDescriptor {
    pub fn new(op_type: impl Into<String>) -> Self {
        OpDescriptor {
            op_type: op_type.into(),
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            attrs: BTreeMap::new(),
        }
    }

    pub fn with_input<S: Into<String>>(
        mut self,
        slot: impl Into<String>,
        names: impl IntoIterator<Item = S>,
    ) -> Self {
        self.inputs
            .insert(slot.into(), names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_output<S: Into<String>>(
        mut self,
        slot: impl Into<String>,
        names: impl IntoIterator<Item = S>,
    ) -> Self {
        self.outputs
            .insert(slot.into(), names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: AttrValue) -> Self {
        self.attrs.insert(name.into(), value);
        self
    }

    /// Variable names bound to an input slot; empty when the slot is absent.
    pub fn input(&self, slot: &str) -> &[String] {
        self.inputs.get(slot).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Variable names bound to an output slot; empty when the slot is absent.
    pub fn output(&self, slot: &str) -> &[String] {
        self.outputs.get(slot).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    pub fn has_input(&self, slot: &str) -> bool {
        self.inputs.get(slot).is_some_and(|names| !names.is_empty())
    }

    pub fn has_output(&self, slot: &str) -> bool {
        self.outputs
            .get(slot)
            .is_some_and(|names| !names.is_empty())
    }
}

impl DebugString for OpDescriptor {
    fn debug_string(&self) -> String {
        let slot = |slots: &BTreeMap<String, Vec<String>>| -> String {
            slots
                .iter()
                .map(|(name, vars)| format!("{}[{}]", name, vars.join(", ")))
                .collect::<Vec<_>>()
                .join("; ")
        };
        format!(
            "op {} inputs = [{}] outputs = [{}] attrs = {}",
            self.op_type,
            slot(&self.inputs),
            slot(&self.outputs),
            self.attrs.debug_string(),
        )
    }
}

//! Per-op-type schemas and the attribute checker.
//!
//! An [`OpProto`] declares the slots and attributes an op type accepts,
//! mirroring the maker pattern of the host framework: slots carry
//! duplicable/intermediate/dispensable flags, attributes carry a type tag,
//! an optional default and validator predicates. Defaults materialize before
//! validators run.

use crate::attrs::{AttrType, AttrValue, AttributeMap};
use crate::error::{OpError, Result};
use crate::formatting::DebugString;
use crate::names::{FORCE_CPU_ATTR, USE_CUDNN_ATTR, USE_MKLDNN_ATTR};

/// Declared input or output slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotDef {
    pub name: String,
    pub comment: String,
    pub duplicable: bool,
    pub intermediate: bool,
    pub dispensable: bool,
}

impl SlotDef {
    pub fn new(name: impl Into<String>, comment: impl Into<String>) -> Self {
        SlotDef {
            name: name.into(),
            comment: comment.into(),
            duplicable: false,
            intermediate: false,
            dispensable: false,
        }
    }

    /// The slot accepts any number of variable names.
    pub fn duplicable(mut self) -> Self {
        self.duplicable = true;
        self
    }

    /// The slot is not visible to consumers outside the op.
    pub fn intermediate(mut self) -> Self {
        self.intermediate = true;
        self
    }

    /// The slot may be absent at call time.
    pub fn dispensable(mut self) -> Self {
        self.dispensable = true;
        self
    }
}

/// Validator predicate attached to a declared attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValidator {
    GreaterThan(f64),
    InRange { min: f64, max: f64 },
    NonEmpty,
    LenBetween { min: usize, max: usize },
    EachInRange { min: f64, max: f64 },
    Custom(fn(&AttrValue) -> anyhow::Result<()>),
}

impl AttrValidator {
    fn check(&self, value: &AttrValue) -> std::result::Result<(), String> {
        match self {
            AttrValidator::GreaterThan(bound) => {
                let v = value
                    .as_number()
                    .ok_or_else(|| "greater_than requires a numeric attribute".to_string())?;
                if v > *bound {
                    Ok(())
                } else {
                    Err(format!("{} must be greater than {}", v, bound))
                }
            }
            AttrValidator::InRange { min, max } => {
                let v = value
                    .as_number()
                    .ok_or_else(|| "in_range requires a numeric attribute".to_string())?;
                if v >= *min && v <= *max {
                    Ok(())
                } else {
                    Err(format!("{} is outside [{}, {}]", v, min, max))
                }
            }
            AttrValidator::NonEmpty => match value.list_len() {
                Some(0) => Err("list must not be empty".to_string()),
                Some(_) => Ok(()),
                None => match value {
                    AttrValue::Str(s) if s.is_empty() => {
                        Err("string must not be empty".to_string())
                    }
                    AttrValue::Str(_) => Ok(()),
                    _ => Err("non_empty requires a list or string attribute".to_string()),
                },
            },
            AttrValidator::LenBetween { min, max } => {
                let len = value
                    .list_len()
                    .ok_or_else(|| "len_between requires a list attribute".to_string())?;
                if len >= *min && len <= *max {
                    Ok(())
                } else {
                    Err(format!(
                        "list length {} is outside [{}, {}]",
                        len, min, max
                    ))
                }
            }
            AttrValidator::EachInRange { min, max } => {
                let values = value
                    .as_number_list()
                    .ok_or_else(|| "each_in_range requires a numeric list".to_string())?;
                for v in values {
                    if v < *min || v > *max {
                        return Err(format!("element {} is outside [{}, {}]", v, min, max));
                    }
                }
                Ok(())
            }
            AttrValidator::Custom(f) => f(value).map_err(|err| err.to_string()),
        }
    }
}

/// Declared attribute: name, type tag, optional default, validators.
#[derive(Debug, Clone, PartialEq)]
pub struct AttrDef {
    pub name: String,
    pub comment: String,
    pub attr_type: AttrType,
    pub default: Option<AttrValue>,
    pub validators: Vec<AttrValidator>,
}

impl AttrDef {
    pub fn new(name: impl Into<String>, attr_type: AttrType) -> Self {
        AttrDef {
            name: name.into(),
            comment: String::new(),
            attr_type,
            default: None,
            validators: Vec::new(),
        }
    }

    pub fn comment(mut self, text: impl Into<String>) -> Self {
        self.comment = text.into();
        self
    }

    pub fn with_default(mut self, value: AttrValue) -> Self {
        self.default = Some(value);
        self
    }

    pub fn greater_than(mut self, bound: f64) -> Self {
        self.validators.push(AttrValidator::GreaterThan(bound));
        self
    }

    pub fn in_range(mut self, min: f64, max: f64) -> Self {
        self.validators.push(AttrValidator::InRange { min, max });
        self
    }

    pub fn non_empty(mut self) -> Self {
        self.validators.push(AttrValidator::NonEmpty);
        self
    }

    pub fn len_between(mut self, min: usize, max: usize) -> Self {
        self.validators.push(AttrValidator::LenBetween { min, max });
        self
    }

    pub fn each_in_range(mut self, min: f64, max: f64) -> Self {
        self.validators.push(AttrValidator::EachInRange { min, max });
        self
    }

    pub fn custom(mut self, check: fn(&AttrValue) -> anyhow::Result<()>) -> Self {
        self.validators.push(AttrValidator::Custom(check));
        self
    }
}

/// Schema declared once per op type.
#[derive(Debug, Clone, PartialEq)]
pub struct OpProto {
    pub op_type: String,
    pub comment: String,
    pub inputs: Vec<SlotDef>,
    pub outputs: Vec<SlotDef>,
    pub attrs: Vec<AttrDef>,
}

impl OpProto {
    pub fn build(op_type: impl Into<String>) -> OpProtoBuilder {
        OpProtoBuilder {
            proto: OpProto {
                op_type: op_type.into(),
                comment: String::new(),
                inputs: Vec::new(),
                outputs: Vec::new(),
                attrs: Vec::new(),
            },
        }
    }

    pub fn input_slot(&self, name: &str) -> Option<&SlotDef> {
        self.inputs.iter().find(|slot| slot.name == name)
    }

    pub fn output_slot(&self, name: &str) -> Option<&SlotDef> {
        self.outputs.iter().find(|slot| slot.name == name)
    }

    pub fn attr_def(&self, name: &str) -> Option<&AttrDef> {
        self.attrs.iter().find(|attr| attr.name == name)
    }

    /// Validate a descriptor's slot bindings against this schema.
    pub fn validate_slots(
        &self,
        inputs: &std::collections::BTreeMap<String, Vec<String>>,
        outputs: &std::collections::BTreeMap<String, Vec<String>>,
    ) -> Result<()> {
        for (slot, names) in inputs {
            let def = self.input_slot(slot).ok_or_else(|| {
                OpError::validation(
                    &self.op_type,
                    format!("input slot `{}` is not declared", slot),
                )
            })?;
            if !def.duplicable && names.len() > 1 {
                return Err(OpError::validation(
                    &self.op_type,
                    format!(
                        "input slot `{}` accepts one name, got {}",
                        slot,
                        names.len()
                    ),
                ));
            }
        }
        for (slot, names) in outputs {
            let def = self.output_slot(slot).ok_or_else(|| {
                OpError::validation(
                    &self.op_type,
                    format!("output slot `{}` is not declared", slot),
                )
            })?;
            if !def.duplicable && names.len() > 1 {
                return Err(OpError::validation(
                    &self.op_type,
                    format!(
                        "output slot `{}` accepts one name, got {}",
                        slot,
                        names.len()
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Run the attribute checker: substitute defaults, then reject missing
    /// required attributes, type mismatches and validator failures.
    pub fn check_attrs(&self, attrs: &mut AttributeMap) -> Result<()> {
        for def in &self.attrs {
            if !attrs.contains_key(&def.name) {
                match &def.default {
                    Some(default) => {
                        attrs.insert(def.name.clone(), default.clone());
                    }
                    None => {
                        return Err(OpError::AttrCheck {
                            op: self.op_type.clone(),
                            attr: def.name.clone(),
                            reason: "attribute is required".to_string(),
                        });
                    }
                }
            }
            let value = &attrs[&def.name];
            if value.attr_type() != def.attr_type {
                return Err(OpError::AttrCheck {
                    op: self.op_type.clone(),
                    attr: def.name.clone(),
                    reason: format!(
                        "expected {}, got {}",
                        def.attr_type,
                        value.attr_type()
                    ),
                });
            }
            for validator in &def.validators {
                validator.check(value).map_err(|reason| OpError::AttrCheck {
                    op: self.op_type.clone(),
                    attr: def.name.clone(),
                    reason,
                })?;
            }
        }
        for name in attrs.keys() {
            if self.attr_def(name).is_none() && !is_kernel_hint(name) {
                return Err(OpError::AttrCheck {
                    op: self.op_type.clone(),
                    attr: name.clone(),
                    reason: "attribute is not declared".to_string(),
                });
            }
        }
        Ok(())
    }
}

// Kernel-hint keys are accepted on every op without declaration.
fn is_kernel_hint(name: &str) -> bool {
    name == FORCE_CPU_ATTR || name == USE_CUDNN_ATTR || name == USE_MKLDNN_ATTR
}

pub struct OpProtoBuilder {
    proto: OpProto,
}

impl OpProtoBuilder {
    pub fn comment(mut self, text: impl Into<String>) -> Self {
        self.proto.comment = text.into();
        self
    }

    pub fn input(mut self, slot: SlotDef) -> Self {
        self.proto.inputs.push(slot);
        self
    }

    pub fn output(mut self, slot: SlotDef) -> Self {
        self.proto.outputs.push(slot);
        self
    }

    pub fn attr(mut self, attr: AttrDef) -> Self {
        self.proto.attrs.push(attr);
        self
    }

    /// Finish the schema, enforcing slot/attribute name uniqueness.
    pub fn finish(self) -> Result<OpProto> {
        let proto = self.proto;
        let mut seen = std::collections::HashSet::new();
        for slot in proto.inputs.iter().chain(&proto.outputs) {
            if !seen.insert(slot.name.as_str()) {
                return Err(OpError::validation(
                    &proto.op_type,
                    format!("duplicate slot name `{}`", slot.name),
                ));
            }
        }
        let mut seen_attrs = std::collections::HashSet::new();
        for attr in &proto.attrs {
            if !seen_attrs.insert(attr.name.as_str()) {
                return Err(OpError::validation(
                    &proto.op_type,
                    format!("duplicate attribute name `{}`", attr.name),
                ));
            }
        }
        Ok(proto)
    }
}

impl DebugString for OpProto {
    fn debug_string(&self) -> String {
        let slots = |slots: &[SlotDef]| -> String {
            slots
                .iter()
                .map(|slot| {
                    let mut flags = String::new();
                    if slot.duplicable {
                        flags.push('*');
                    }
                    if slot.dispensable {
                        flags.push('?');
                    }
                    if slot.intermediate {
                        flags.push('~');
                    }
                    format!("{}{}", slot.name, flags)
                })
                .collect::<Vec<_>>()
                .join(", ")
        };
        let attrs = self
            .attrs
            .iter()
            .map(|attr| format!("{}: {}", attr.name, attr.attr_type))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "proto {} inputs = [{}] outputs = [{}] attrs = [{}]",
            self.op_type,
            slots(&self.inputs),
            slots(&self.outputs),
            attrs,
        )
    }
}

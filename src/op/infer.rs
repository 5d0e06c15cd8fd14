//! Pre-execution inference contexts.
//!
//! Var-type inference pins the payload tag and element type of outputs;
//! shape inference resolves output dims from input dims and attributes.
//! Both run against the scope before any kernel is selected, so downstream
//! consumers can rely on output metadata without executing.

use std::sync::Arc;

use crate::attrs::AttrAccess;
use crate::error::{OpError, Result};
use crate::names::EMPTY_VAR_NAME;
use crate::scope::{Scope, VarKind, Variable};
use crate::tensor::DType;

use super::operator::OperatorInstance;

fn first_bound_name<'d>(names: &'d [String]) -> Option<&'d str> {
    names
        .iter()
        .map(String::as_str)
        .find(|name| *name != EMPTY_VAR_NAME)
}

fn input_var(
    op: &OperatorInstance,
    scope: &Arc<Scope>,
    slot: &str,
    name: &str,
) -> Result<Arc<Variable>> {
    scope.find_var(name).ok_or_else(|| OpError::InputNotFound {
        op: op.op_type().to_string(),
        slot: slot.to_string(),
        name: name.to_string(),
    })
}

fn output_var(scope: &Arc<Scope>, name: &str) -> Result<Arc<Variable>> {
    match scope.find_var(name) {
        Some(var) => Ok(var),
        None => scope.var(name),
    }
}

/// Context for per-op shape inference.
pub struct InferShapeContext<'a> {
    op: &'a OperatorInstance,
    scope: &'a Arc<Scope>,
}

impl<'a> InferShapeContext<'a> {
    pub(crate) fn new(op: &'a OperatorInstance, scope: &'a Arc<Scope>) -> Self {
        InferShapeContext { op, scope }
    }

    pub fn op_type(&self) -> &str {
        self.op.op_type()
    }

    pub fn attr<T: AttrAccess>(&self, name: &str) -> Result<T> {
        self.op.attr(name)
    }

    pub fn has_input(&self, slot: &str) -> bool {
        first_bound_name(self.op.inputs(slot))
            .is_some_and(|name| self.scope.find_var(name).is_some())
    }

    pub fn has_output(&self, slot: &str) -> bool {
        first_bound_name(self.op.outputs(slot)).is_some()
    }

    pub fn input_names(&self, slot: &str) -> &[String] {
        self.op.inputs(slot)
    }

    pub fn output_names(&self, slot: &str) -> &[String] {
        self.op.outputs(slot)
    }

    /// Shape of the first variable bound to an input slot.
    pub fn input_dim(&self, slot: &str) -> Result<Vec<usize>> {
        let names = self.op.inputs(slot);
        let name = first_bound_name(names).ok_or_else(|| {
            OpError::precondition(format!(
                "op {}: input slot `{}` is unbound",
                self.op.op_type(),
                slot
            ))
        })?;
        let var = input_var(self.op, self.scope, slot, name)?;
        var.shape().ok_or_else(|| {
            OpError::precondition(format!(
                "op {}: input `{}` has no shape yet",
                self.op.op_type(),
                name
            ))
        })
    }

    /// Shapes of every variable bound to a duplicable input slot.
    pub fn input_dims(&self, slot: &str) -> Result<Vec<Vec<usize>>> {
        self.op
            .inputs(slot)
            .iter()
            .map(|name| {
                let var = input_var(self.op, self.scope, slot, name)?;
                var.shape().ok_or_else(|| {
                    OpError::precondition(format!(
                        "op {}: input `{}` has no shape yet",
                        self.op.op_type(),
                        name
                    ))
                })
            })
            .collect()
    }

    /// Element type of the first variable bound to an input slot.
    pub fn input_dtype(&self, slot: &str) -> Result<DType> {
        let names = self.op.inputs(slot);
        let name = first_bound_name(names).ok_or_else(|| {
            OpError::precondition(format!(
                "op {}: input slot `{}` is unbound",
                self.op.op_type(),
                slot
            ))
        })?;
        let var = input_var(self.op, self.scope, slot, name)?;
        var.dtype().ok_or_else(|| {
            OpError::precondition(format!(
                "op {}: input `{}` has no dtype yet",
                self.op.op_type(),
                name
            ))
        })
    }

    /// Record the shape of the first variable bound to an output slot.
    pub fn set_output_dim(&mut self, slot: &str, dims: Vec<usize>) -> Result<()> {
        let names = self.op.outputs(slot);
        let name = first_bound_name(names).ok_or_else(|| {
            OpError::precondition(format!(
                "op {}: output slot `{}` is unbound",
                self.op.op_type(),
                slot
            ))
        })?;
        output_var(self.scope, name)?.set_meta_shape(dims);
        Ok(())
    }

    /// Record shapes for every variable of a duplicable output slot.
    pub fn set_output_dims(&mut self, slot: &str, dims: Vec<Vec<usize>>) -> Result<()> {
        let names: Vec<String> = self.op.outputs(slot).to_vec();
        if names.len() != dims.len() {
            return Err(OpError::precondition(format!(
                "op {}: output slot `{}` binds {} names but {} shapes were inferred",
                self.op.op_type(),
                slot,
                names.len(),
                dims.len()
            )));
        }
        for (name, dim) in names.iter().zip(dims) {
            output_var(self.scope, name)?.set_meta_shape(dim);
        }
        Ok(())
    }
}

/// Context for per-op variable-type inference.
pub struct VarTypeContext<'a> {
    op: &'a OperatorInstance,
    scope: &'a Arc<Scope>,
}

impl<'a> VarTypeContext<'a> {
    pub(crate) fn new(op: &'a OperatorInstance, scope: &'a Arc<Scope>) -> Self {
        VarTypeContext { op, scope }
    }

    pub fn op_type(&self) -> &str {
        self.op.op_type()
    }

    pub fn attr<T: AttrAccess>(&self, name: &str) -> Result<T> {
        self.op.attr(name)
    }

    pub fn input_kind(&self, slot: &str) -> Result<Option<VarKind>> {
        let names = self.op.inputs(slot);
        let name = first_bound_name(names).ok_or_else(|| {
            OpError::precondition(format!(
                "op {}: input slot `{}` is unbound",
                self.op.op_type(),
                slot
            ))
        })?;
        Ok(input_var(self.op, self.scope, slot, name)?.kind())
    }

    pub fn input_dtype(&self, slot: &str) -> Result<Option<DType>> {
        let names = self.op.inputs(slot);
        let name = first_bound_name(names).ok_or_else(|| {
            OpError::precondition(format!(
                "op {}: input slot `{}` is unbound",
                self.op.op_type(),
                slot
            ))
        })?;
        Ok(input_var(self.op, self.scope, slot, name)?.dtype())
    }

    /// Pin the payload kind of every variable bound to an output slot.
    pub fn set_output_kind(&mut self, slot: &str, kind: VarKind) -> Result<()> {
        for name in self.op.outputs(slot) {
            if name == EMPTY_VAR_NAME {
                continue;
            }
            let var = output_var(self.scope, name)?;
            match var.kind() {
                Some(existing) if existing != kind => {
                    return Err(OpError::VariableRetype {
                        name: name.clone(),
                        requested: kind.as_str(),
                        actual: existing.as_str(),
                    })
                }
                Some(_) => {}
                None => var.set_meta_kind(kind),
            }
        }
        Ok(())
    }

    /// Record the element type of every variable bound to an output slot.
    pub fn set_output_dtype(&mut self, slot: &str, dtype: DType) -> Result<()> {
        for name in self.op.outputs(slot) {
            if name == EMPTY_VAR_NAME {
                continue;
            }
            output_var(self.scope, name)?.set_meta_dtype(dtype);
        }
        Ok(())
    }
}

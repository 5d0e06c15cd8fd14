//! The handle a kernel sees during one call.
//!
//! Accessors resolve variable names through the scope at call time; nothing
//! obtained here may be cached past the call, which the borrow on the
//! context enforces.

use std::sync::Arc;

use crate::attrs::AttrAccess;
use crate::error::{OpError, Result};
use crate::names::EMPTY_VAR_NAME;
use crate::registry::KernelSignature;
use crate::scope::{Scope, Variable};
use crate::tensor::{Place, Tensor, TensorElement, TensorValue};

use super::device::DeviceContext;
use super::operator::OperatorInstance;

pub struct ExecutionContext<'a> {
    op: &'a OperatorInstance,
    scope: &'a Arc<Scope>,
    place: Place,
    device: Arc<DeviceContext>,
    signature: Option<KernelSignature>,
}

impl<'a> ExecutionContext<'a> {
    pub(crate) fn new(
        op: &'a OperatorInstance,
        scope: &'a Arc<Scope>,
        place: Place,
        device: Arc<DeviceContext>,
        signature: Option<KernelSignature>,
    ) -> Self {
        ExecutionContext {
            op,
            scope,
            place,
            device,
            signature,
        }
    }

    /// The declared argument surface of the selected kernel, when the op
    /// type declared one.
    pub fn signature(&self) -> Option<&KernelSignature> {
        self.signature.as_ref()
    }

    pub fn op_type(&self) -> &str {
        self.op.op_type()
    }

    pub fn place(&self) -> Place {
        self.place
    }

    /// The stream/queue for the target backend.
    pub fn device_ctx(&self) -> &DeviceContext {
        &self.device
    }

    pub fn attr<T: AttrAccess>(&self, name: &str) -> Result<T> {
        self.op.attr(name)
    }

    /// Whether the slot is bound and its first variable resolves.
    pub fn has_input(&self, slot: &str) -> bool {
        self.op
            .inputs(slot)
            .first()
            .is_some_and(|name| name != EMPTY_VAR_NAME && self.scope.find_var(name).is_some())
    }

    pub fn has_output(&self, slot: &str) -> bool {
        self.op
            .outputs(slot)
            .first()
            .is_some_and(|name| name != EMPTY_VAR_NAME)
    }

    /// The variable behind a non-duplicable input slot. Rare; most kernels
    /// go through the typed accessors.
    pub fn input_var(&self, slot: &str) -> Result<Arc<Variable>> {
        let name = self.op.input(slot)?.to_string();
        self.lookup(slot, &name)
    }

    /// Dense payload of a non-duplicable input slot.
    pub fn input_value(&self, slot: &str) -> Result<TensorValue> {
        let name = self.op.input(slot)?.to_string();
        self.lookup(slot, &name)?.dense()
    }

    /// Dense payload at an index of a duplicable input slot.
    pub fn input_value_at(&self, slot: &str, index: usize) -> Result<TensorValue> {
        let names = self.op.inputs(slot);
        let name = names.get(index).ok_or_else(|| {
            OpError::validation(
                self.op_type(),
                format!("input slot `{}` has no index {}", slot, index),
            )
        })?;
        self.lookup(slot, name)?.dense()
    }

    /// Dense payloads of every name bound to a duplicable input slot.
    pub fn inputs_value(&self, slot: &str) -> Result<Vec<TensorValue>> {
        self.op
            .inputs(slot)
            .iter()
            .map(|name| self.lookup(slot, name)?.dense())
            .collect()
    }

    /// Typed tensor view of a non-duplicable input slot.
    pub fn input<T: TensorElement>(&self, slot: &str) -> Result<Tensor<T>> {
        let value = self.input_value(slot)?;
        value.typed::<T>().map_err(|err| {
            OpError::validation(self.op_type(), format!("input `{}`: {}", slot, err))
        })
    }

    /// Names bound to an output slot.
    pub fn output_names(&self, slot: &str) -> &[String] {
        self.op.outputs(slot)
    }

    /// The variable behind a non-duplicable output slot, created locally
    /// when it does not resolve anywhere up the tree.
    pub fn output_var(&self, slot: &str) -> Result<Arc<Variable>> {
        let name = self.op.output(slot)?.to_string();
        self.find_or_create(&name)
    }

    /// Write the dense payload of a non-duplicable output slot.
    pub fn set_output(&self, slot: &str, value: TensorValue) -> Result<()> {
        self.output_var(slot)?.set_dense(value)
    }

    /// Write the dense payload at an index of a duplicable output slot.
    pub fn set_output_at(&self, slot: &str, index: usize, value: TensorValue) -> Result<()> {
        let names = self.op.outputs(slot);
        let name = names
            .get(index)
            .ok_or_else(|| {
                OpError::validation(
                    self.op_type(),
                    format!("output slot `{}` has no index {}", slot, index),
                )
            })?
            .clone();
        self.find_or_create(&name)?.set_dense(value)
    }

    fn lookup(&self, slot: &str, name: &str) -> Result<Arc<Variable>> {
        self.scope
            .find_var(name)
            .ok_or_else(|| OpError::InputNotFound {
                op: self.op_type().to_string(),
                slot: slot.to_string(),
                name: name.to_string(),
            })
    }

    fn find_or_create(&self, name: &str) -> Result<Arc<Variable>> {
        match self.scope.find_var(name) {
            Some(var) => Ok(var),
            None => self.scope.var(name),
        }
    }
}

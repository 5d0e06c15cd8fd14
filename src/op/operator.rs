//! The runtime operator object and its dispatch path.

use std::sync::Arc;

use crate::attrs::AttrAccess;
use crate::desc::{OpDescriptor, OpProto};
use crate::error::{OpError, Result};
use crate::formatting::DebugString;
use crate::names::{EMPTY_VAR_NAME, FORCE_CPU_ATTR};
use crate::program::ProgramDesc;
use crate::registry::{kernel_registry, KernelKey, OpInfo};
use crate::scope::Scope;
use crate::tensor::{Backend, DType, DataLayout, Place};
use crate::trace;

use super::context::ExecutionContext;
use super::device::DeviceContextPool;
use super::infer::{InferShapeContext, VarTypeContext};

/// Everything a custom run function sees: the scope, the place, and the
/// surrounding program when an executor provides one.
pub struct RunContext<'a> {
    pub scope: &'a Arc<Scope>,
    pub place: Place,
    pub program: Option<&'a Arc<ProgramDesc>>,
}

/// The runtime object the registry materializes from a frozen descriptor.
/// Owns no tensor data; holds the descriptor copy and the op's function
/// table.
pub struct OperatorInstance {
    desc: OpDescriptor,
    info: Arc<OpInfo>,
}

impl std::fmt::Debug for OperatorInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorInstance")
            .field("op_type", &self.desc.op_type)
            .finish()
    }
}

impl OperatorInstance {
    pub(crate) fn new(desc: OpDescriptor, info: Arc<OpInfo>) -> Self {
        OperatorInstance { desc, info }
    }

    pub fn op_type(&self) -> &str {
        &self.desc.op_type
    }

    pub fn desc(&self) -> &OpDescriptor {
        &self.desc
    }

    pub fn proto(&self) -> &OpProto {
        &self.info.proto
    }

    /// The single variable name bound to a non-duplicable input slot.
    /// Returns the empty sentinel when a dispensable slot is unbound.
    pub fn input(&self, slot: &str) -> Result<&str> {
        let def = self.info.proto.input_slot(slot).ok_or_else(|| {
            OpError::validation(self.op_type(), format!("input slot `{}` is not declared", slot))
        })?;
        if def.duplicable {
            return Err(OpError::DuplicableSlotNeedsIndex {
                op: self.op_type().to_string(),
                slot: slot.to_string(),
            });
        }
        Ok(self
            .desc
            .input(slot)
            .first()
            .map(String::as_str)
            .unwrap_or(EMPTY_VAR_NAME))
    }

    /// All variable names bound to an input slot; empty when unbound.
    pub fn inputs(&self, slot: &str) -> &[String] {
        self.desc.input(slot)
    }

    /// The single variable name bound to a non-duplicable output slot.
    pub fn output(&self, slot: &str) -> Result<&str> {
        let def = self.info.proto.output_slot(slot).ok_or_else(|| {
            OpError::validation(
                self.op_type(),
                format!("output slot `{}` is not declared", slot),
            )
        })?;
        if def.duplicable {
            return Err(OpError::DuplicableSlotNeedsIndex {
                op: self.op_type().to_string(),
                slot: slot.to_string(),
            });
        }
        Ok(self
            .desc
            .output(slot)
            .first()
            .map(String::as_str)
            .unwrap_or(EMPTY_VAR_NAME))
    }

    pub fn outputs(&self, slot: &str) -> &[String] {
        self.desc.output(slot)
    }

    /// Type-checked attribute access against the frozen descriptor.
    pub fn attr<T: AttrAccess>(&self, name: &str) -> Result<T> {
        let value = self.desc.attr(name).ok_or_else(|| OpError::AttrCheck {
            op: self.op_type().to_string(),
            attr: name.to_string(),
            reason: "attribute is not set".to_string(),
        })?;
        T::from_attr(value).ok_or_else(|| OpError::AttrCheck {
            op: self.op_type().to_string(),
            attr: name.to_string(),
            reason: format!("expected {}, got {}", T::type_name(), value.attr_type()),
        })
    }

    /// Produce the gradient descriptors for this op.
    pub fn grad_descriptors(&self) -> Result<Vec<OpDescriptor>> {
        match self.info.grad {
            Some(grad) => grad(&self.desc),
            None => Err(OpError::Unimplemented {
                op: self.op_type().to_string(),
                what: "gradient".to_string(),
            }),
        }
    }

    /// Run the op's variable-type inference, when it declares one.
    pub fn infer_var_type(&self, scope: &Arc<Scope>) -> Result<()> {
        if let Some(infer) = self.info.var_type {
            let mut ctx = VarTypeContext::new(self, scope);
            infer(&mut ctx)?;
        }
        Ok(())
    }

    /// Run the op's shape inference, when it declares one.
    pub fn infer_shape(&self, scope: &Arc<Scope>) -> Result<()> {
        if let Some(infer) = self.info.shape {
            let mut ctx = InferShapeContext::new(self, scope);
            infer(&mut ctx)?;
        }
        Ok(())
    }

    /// Execute against a scope at a place.
    pub fn run(&self, scope: &Arc<Scope>, place: Place) -> Result<()> {
        self.run_with(&RunContext {
            scope,
            place,
            program: None,
        })
    }

    /// Execute with an explicit run context (used by the executor to thread
    /// the surrounding program through to control-flow ops).
    pub fn run_with(&self, ctx: &RunContext<'_>) -> Result<()> {
        if let Some(run) = self.info.run {
            return run(self, ctx);
        }

        self.check_required_inputs(ctx.scope)?;

        let requested = self.requested_kernel_key(ctx.scope, ctx.place)?;
        let (kernel, resolved, signature) = {
            let registry = kernel_registry()
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let (kernel, resolved) = registry.select(self.op_type(), &requested)?;
            (kernel, resolved, registry.signature(self.op_type()).cloned())
        };
        trace!("dispatch {}: {} -> {}", self.op_type(), requested, resolved);

        let device = DeviceContextPool::get(ctx.place);
        let exec_ctx = ExecutionContext::new(self, ctx.scope, ctx.place, device, signature);
        kernel(&exec_ctx).map_err(|err| OpError::external(self.op_type(), err))
    }

    /// Compute the requested kernel key: backend from the place (forced to
    /// the host when the `force_cpu` hint is set), layout from the first
    /// bound input, dtype from the `dtype` attribute or the first input.
    fn requested_kernel_key(&self, scope: &Arc<Scope>, place: Place) -> Result<KernelKey> {
        let force_cpu = matches!(
            self.desc.attr(FORCE_CPU_ATTR),
            Some(crate::attrs::AttrValue::Bool(true))
        );
        let backend = if force_cpu { Backend::Cpu } else { place.backend() };

        let mut layout = DataLayout::RowMajor;
        let mut input_dtype = None;
        'outer: for slot in &self.info.proto.inputs {
            for name in self.desc.input(&slot.name) {
                if name == EMPTY_VAR_NAME {
                    continue;
                }
                if let Some(var) = scope.find_var(name) {
                    layout = var.layout();
                    input_dtype = var.dtype();
                    break 'outer;
                }
            }
        }

        let dtype = match self.desc.attr("dtype") {
            Some(crate::attrs::AttrValue::Int(code)) => DType::from_code(*code)
                .map_err(|err| OpError::validation(self.op_type(), err.to_string()))?,
            _ => match input_dtype {
                Some(dtype) => dtype,
                None => {
                    return Err(OpError::precondition(format!(
                        "op {}: cannot infer kernel dtype from inputs or attributes",
                        self.op_type()
                    )))
                }
            },
        };

        Ok(KernelKey::new(backend, layout, dtype))
    }

    /// Resolve every bound input through the scope; required slots must be
    /// bound and present, dispensable slots may be absent.
    fn check_required_inputs(&self, scope: &Arc<Scope>) -> Result<()> {
        for slot in &self.info.proto.inputs {
            let names = self.desc.input(&slot.name);
            if names.is_empty() {
                if !slot.dispensable && !slot.duplicable {
                    return Err(OpError::InputNotFound {
                        op: self.op_type().to_string(),
                        slot: slot.name.clone(),
                        name: EMPTY_VAR_NAME.to_string(),
                    });
                }
                continue;
            }
            for name in names {
                if name == EMPTY_VAR_NAME {
                    continue;
                }
                if scope.find_var(name).is_none() {
                    return Err(OpError::InputNotFound {
                        op: self.op_type().to_string(),
                        slot: slot.name.clone(),
                        name: name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl DebugString for OperatorInstance {
    fn debug_string(&self) -> String {
        self.desc.debug_string()
    }
}

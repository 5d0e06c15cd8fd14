//! Operator registry: op type to function table.
//!
//! One concrete [`OperatorInstance`] type plus a per-op-type table of plain
//! `fn` pointers replaces a polymorphic operator hierarchy. Storing the
//! table by value keeps re-registration comparable: registering the exact
//! same contents twice is a no-op, differing contents conflict.

use std::collections::HashMap;
use std::sync::Arc;

use crate::desc::{OpDescriptor, OpProto};
use crate::error::{OpError, Result};
use crate::formatting::{join_sorted, DebugString};
use crate::op::{InferShapeContext, OperatorInstance, RunContext, VarTypeContext};

/// Custom execution path for ops that never touch the kernel registry
/// (control flow, readers).
pub type RunFn = fn(&OperatorInstance, &RunContext<'_>) -> Result<()>;

/// Produces the gradient descriptors for a forward descriptor.
pub type GradFn = fn(&OpDescriptor) -> Result<Vec<OpDescriptor>>;

/// Sets output payload kinds and element types ahead of execution.
pub type VarTypeFn = fn(&mut VarTypeContext<'_>) -> Result<()>;

/// Sets output shapes from input shapes and attributes.
pub type ShapeFn = fn(&mut InferShapeContext<'_>) -> Result<()>;

/// The per-op-type function table.
#[derive(Clone, PartialEq)]
pub struct OpInfo {
    pub proto: OpProto,
    pub run: Option<RunFn>,
    pub grad: Option<GradFn>,
    pub var_type: Option<VarTypeFn>,
    pub shape: Option<ShapeFn>,
}

impl OpInfo {
    pub fn new(proto: OpProto) -> Self {
        OpInfo {
            proto,
            run: None,
            grad: None,
            var_type: None,
            shape: None,
        }
    }

    pub fn op_type(&self) -> &str {
        &self.proto.op_type
    }

    pub fn with_run(mut self, run: RunFn) -> Self {
        self.run = Some(run);
        self
    }

    pub fn with_grad(mut self, grad: GradFn) -> Self {
        self.grad = Some(grad);
        self
    }

    pub fn with_var_type(mut self, var_type: VarTypeFn) -> Self {
        self.var_type = Some(var_type);
        self
    }

    pub fn with_shape(mut self, shape: ShapeFn) -> Self {
        self.shape = Some(shape);
        self
    }
}

/// Mapping from op type to its function table.
pub struct OperatorRegistry {
    ops: HashMap<String, Arc<OpInfo>>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        OperatorRegistry {
            ops: HashMap::new(),
        }
    }

    /// Register an op type. Idempotent for identical contents; differing
    /// contents fail with a registry conflict.
    pub fn register(&mut self, info: OpInfo) -> Result<()> {
        let op_type = info.op_type().to_string();
        if let Some(existing) = self.ops.get(&op_type) {
            if **existing == info {
                return Ok(());
            }
            return Err(OpError::RegistryConflict {
                op: op_type,
                reason: "op type already registered with different contents".to_string(),
            });
        }
        self.ops.insert(op_type, Arc::new(info));
        Ok(())
    }

    pub fn lookup(&self, op_type: &str) -> Option<Arc<OpInfo>> {
        self.ops.get(op_type).cloned()
    }

    /// Validate a descriptor against its proto, run the attribute checker
    /// and freeze the result into an operator instance.
    pub fn create(&self, desc: OpDescriptor) -> Result<OperatorInstance> {
        let info = self.lookup(&desc.op_type).ok_or_else(|| OpError::UnknownOp {
            op: desc.op_type.clone(),
        })?;
        info.proto.validate_slots(&desc.inputs, &desc.outputs)?;
        let mut frozen = desc;
        info.proto.check_attrs(&mut frozen.attrs)?;
        Ok(OperatorInstance::new(frozen, info))
    }

    /// Registered op types, sorted.
    pub fn op_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.ops.keys().cloned().collect();
        types.sort();
        types
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DebugString for OperatorRegistry {
    fn debug_string(&self) -> String {
        format!("op_registry{{{}}}", join_sorted(self.ops.keys().cloned()))
    }
}

//! Block executor. Each op in a block is materialized through the registry,
//! its output metadata is inferred into the scope, then it runs.

use std::sync::Arc;

use crate::error::Result;
use crate::op::RunContext;
use crate::program::ProgramDesc;
use crate::registry::op_registry;
use crate::scope::Scope;
use crate::tensor::Place;
use crate::trace;

pub struct Executor {
    place: Place,
}

impl Executor {
    pub fn new(place: Place) -> Self {
        Executor { place }
    }

    pub fn place(&self) -> Place {
        self.place
    }

    /// Run one block of the program against a scope.
    ///
    /// Declared variables are created (with their kind and any metadata)
    /// before the first op executes; control-flow ops see the program
    /// through their run context so nested blocks resolve.
    pub fn run_program(
        &self,
        program: &Arc<ProgramDesc>,
        block_idx: usize,
        scope: &Arc<Scope>,
    ) -> Result<()> {
        let block = program.block(block_idx)?.clone();
        for var_desc in &block.vars {
            let var = scope.var_typed(&var_desc.name, var_desc.kind)?;
            if let Some(dtype) = var_desc.dtype {
                var.set_meta_dtype(dtype);
            }
            if let Some(shape) = &var_desc.shape {
                var.set_meta_shape(shape.clone());
            }
        }
        for op_desc in &block.ops {
            let op = {
                let registry = op_registry()
                    .read()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                registry.create(op_desc.clone())?
            };
            trace!("exec block {}: {}", block_idx, op.op_type());
            op.infer_var_type(scope)?;
            op.infer_shape(scope)?;
            op.run_with(&RunContext {
                scope,
                place: self.place,
                program: Some(program),
            })?;
        }
        Ok(())
    }
}

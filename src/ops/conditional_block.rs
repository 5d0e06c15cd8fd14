//! `conditional_block`: run a sub-block in a private child scope when every
//! `X` input is non-empty.
//!
//! A place-less op: it registers a run function and never touches the
//! kernel registry. The child scope lives in the `Scope` output so callers
//! can inspect it; named `Out` variables are copied up to the parent after
//! the sub-block finishes.

use std::sync::Arc;

use crate::desc::{AttrDef, OpProto, SlotDef};
use crate::attrs::AttrType;
use crate::error::{OpError, Result};
use crate::executor::Executor;
use crate::names::EMPTY_VAR_NAME;
use crate::op::{OperatorInstance, RunContext};
use crate::register_op;
use crate::registry::{KernelRegistry, OperatorRegistry};
use crate::scope::VarPayload;

fn conditional_block_run(op: &OperatorInstance, ctx: &RunContext<'_>) -> Result<()> {
    let mut need_run = true;
    for name in op.inputs("X") {
        let var = ctx
            .scope
            .find_var(name)
            .ok_or_else(|| OpError::InputNotFound {
                op: op.op_type().to_string(),
                slot: "X".to_string(),
                name: name.clone(),
            })?;
        if var.dense()?.numel() == 0 {
            need_run = false;
        }
    }
    if !need_run {
        return Ok(());
    }

    let block_idx: usize = op.attr("block")?;
    let program = ctx.program.ok_or_else(|| {
        OpError::precondition("op conditional_block requires a program context")
    })?;

    let child = ctx.scope.new_child();
    let scope_name = op.output("Scope")?;
    if scope_name != EMPTY_VAR_NAME {
        ctx.scope
            .var(scope_name)?
            .set_payload(VarPayload::Scopes(vec![Arc::clone(&child)]))?;
    }

    Executor::new(ctx.place).run_program(program, block_idx, &child)?;

    for name in op.outputs("Out") {
        let produced = child.find_var(name).ok_or_else(|| OpError::VarNotFound {
            name: name.clone(),
        })?;
        let value = produced.dense()?;
        let parent = match ctx.scope.find_var(name) {
            Some(var) => var,
            None => ctx.scope.var(name)?,
        };
        if !Arc::ptr_eq(&parent, &produced) {
            parent.set_dense(value)?;
        }
    }
    Ok(())
}

pub(crate) fn register(
    ops: &mut OperatorRegistry,
    _kernels: &mut KernelRegistry,
) -> Result<()> {
    let proto = OpProto::build("conditional_block")
        .comment("Run the referenced block in a child scope when every X is non-empty.")
        .input(SlotDef::new("X", "condition tensors").duplicable())
        .input(
            SlotDef::new("Params", "parameters the block reads")
                .duplicable()
                .dispensable(),
        )
        .output(SlotDef::new("Out", "variables exposed to the parent").duplicable())
        .output(SlotDef::new("Scope", "the child scope of the taken branch"))
        .attr(AttrDef::new("block", AttrType::Block).comment("the sub-block to run"))
        .finish()?;
    register_op!(ops, proto, run = conditional_block_run)?;
    Ok(())
}

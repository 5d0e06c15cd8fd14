//! `read_next`: pop one batch from a reader variable into the `Out` slots.
//!
//! Place-less, like the other control ops: the reader state machine decides
//! legality, the op only binds the batch into the scope.

use crate::desc::{OpProto, SlotDef};
use crate::error::{OpError, Result};
use crate::op::{OperatorInstance, RunContext};
use crate::register_op;
use crate::registry::{KernelRegistry, OperatorRegistry};

fn read_next_run(op: &OperatorInstance, ctx: &RunContext<'_>) -> Result<()> {
    let reader_name = op.input("Reader")?.to_string();
    let var = ctx
        .scope
        .find_var(&reader_name)
        .ok_or_else(|| OpError::InputNotFound {
            op: op.op_type().to_string(),
            slot: "Reader".to_string(),
            name: reader_name.clone(),
        })?;
    let reader = var.reader()?;
    let batch = {
        let mut guard = reader
            .lock()
            .map_err(|_| OpError::precondition("reader lock poisoned"))?;
        guard.read_next()?
    };
    let batch = batch.ok_or_else(|| {
        OpError::precondition(format!("reader `{}` is exhausted", reader_name))
    })?;

    let outputs = op.outputs("Out");
    if outputs.len() != batch.len() {
        return Err(OpError::precondition(format!(
            "op read_next binds {} outputs but the batch holds {} tensors",
            outputs.len(),
            batch.len()
        )));
    }
    for (name, value) in outputs.iter().zip(batch) {
        let var = match ctx.scope.find_var(name) {
            Some(var) => var,
            None => ctx.scope.var(name)?,
        };
        var.set_dense(value)?;
    }
    Ok(())
}

pub(crate) fn register(
    ops: &mut OperatorRegistry,
    _kernels: &mut KernelRegistry,
) -> Result<()> {
    let proto = OpProto::build("read_next")
        .comment("Pop one batch from a reader into the output variables.")
        .input(SlotDef::new("Reader", "the reader variable"))
        .output(SlotDef::new("Out", "one variable per batch column").duplicable())
        .finish()?;
    register_op!(ops, proto, run = read_next_run)?;
    Ok(())
}

//! `empty`: allocate an output of the requested shape and dtype without
//! writing meaningful values. Host-only registration; accelerator requests
//! reach it through the host fallback tier.

use crate::attrs::{AttrType, AttrValue};
use crate::desc::{AttrDef, OpProto, SlotDef};
use crate::error::{OpError, Result};
use crate::op::{ExecutionContext, InferShapeContext, VarTypeContext};
use crate::registry::{KernelRegistry, OperatorRegistry};
use crate::scope::VarKind;
use crate::tensor::{DType, TensorValue};
use crate::{register_op, register_op_kernel};

fn infer_var_type(ctx: &mut VarTypeContext<'_>) -> Result<()> {
    let code: i32 = ctx.attr("dtype")?;
    let dtype = DType::from_code(code)
        .map_err(|err| OpError::validation(ctx.op_type(), err.to_string()))?;
    ctx.set_output_kind("Out", VarKind::Dense)?;
    ctx.set_output_dtype("Out", dtype)
}

fn infer_shape(ctx: &mut InferShapeContext<'_>) -> Result<()> {
    let shape: Vec<i64> = ctx.attr("shape")?;
    let dims: Vec<usize> = shape.iter().map(|d| *d as usize).collect();
    ctx.set_output_dim("Out", dims)
}

fn empty_cpu(ctx: &ExecutionContext<'_>) -> anyhow::Result<()> {
    let shape: Vec<i64> = ctx.attr("shape")?;
    let code: i32 = ctx.attr("dtype")?;
    let dtype = DType::from_code(code)?;
    let dims: Vec<usize> = shape.iter().map(|d| *d as usize).collect();
    ctx.set_output("Out", TensorValue::zeros(dtype, &dims))?;
    Ok(())
}

pub(crate) fn register(
    ops: &mut OperatorRegistry,
    kernels: &mut KernelRegistry,
) -> Result<()> {
    let proto = OpProto::build("empty")
        .comment("Allocate an uninitialized tensor of the given shape and dtype.")
        .output(SlotDef::new("Out", "the allocated tensor"))
        .attr(AttrDef::new("shape", AttrType::Longs).comment("shape of the output"))
        .attr(
            AttrDef::new("dtype", AttrType::Int)
                .comment("element type code of the output")
                .with_default(AttrValue::Int(DType::F32.code())),
        )
        .finish()?;
    register_op!(ops, proto, var_type = infer_var_type, shape = infer_shape)?;
    kernels.declare_signature(
        "empty",
        crate::registry::KernelSignature::new::<&str>([], ["Out"], ["shape", "dtype"]),
    )?;
    register_op_kernel!(kernels, "empty", Cpu, RowMajor, F32, empty_cpu)?;
    register_op_kernel!(kernels, "empty", Cpu, RowMajor, F64, empty_cpu)?;
    register_op_kernel!(kernels, "empty", Cpu, RowMajor, I32, empty_cpu)?;
    register_op_kernel!(kernels, "empty", Cpu, RowMajor, I64, empty_cpu)?;
    Ok(())
}

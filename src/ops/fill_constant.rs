//! `fill_constant`: fill the output with a constant scalar.

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

fn fill_constant_cpu(ctx: &ExecutionContext<'_>) -> anyhow::Result<()> {
    let shape: Vec<i64> = ctx.attr("shape")?;
    let code: i32 = ctx.attr("dtype")?;
    let value: f32 = ctx.attr("value")?;
    let dtype = DType::from_code(code)?;
    let dims: Vec<usize> = shape.iter().map(|d| *d as usize).collect();
    let out = TensorValue::splat(dtype, &dims, value as f64)?;
    ctx.set_output("Out", out)?;
    Ok(())
}

pub(crate) fn register(
    ops: &mut OperatorRegistry,
    kernels: &mut KernelRegistry,
) -> Result<()> {
    let proto = OpProto::build("fill_constant")
        .comment("Fill the output tensor with a constant scalar.")
        .output(SlotDef::new("Out", "the filled tensor"))
        .attr(
            AttrDef::new("shape", AttrType::Longs)
                .comment("shape of the output")
                .non_empty(),
        )
        .attr(
            AttrDef::new("dtype", AttrType::Int)
                .comment("element type code of the output")
                .with_default(AttrValue::Int(DType::F32.code())),
        )
        .attr(
            AttrDef::new("value", AttrType::Float)
                .comment("constant to fill with")
                .with_default(AttrValue::Float(0.0)),
        )
        .attr(
            AttrDef::new("force_cpu", AttrType::Bool)
                .comment("pin the kernel to the host backend")
                .with_default(AttrValue::Bool(false)),
        )
        .finish()?;
    register_op!(ops, proto, var_type = infer_var_type, shape = infer_shape)?;
    kernels.declare_signature(
        "fill_constant",
        crate::registry::KernelSignature::new::<&str>([], ["Out"], ["shape", "dtype", "value"]),
    )?;
    register_op_kernel!(kernels, "fill_constant", Cpu, RowMajor, F32, fill_constant_cpu)?;
    register_op_kernel!(kernels, "fill_constant", Cpu, RowMajor, F64, fill_constant_cpu)?;
    register_op_kernel!(kernels, "fill_constant", Cpu, RowMajor, I32, fill_constant_cpu)?;
    register_op_kernel!(kernels, "fill_constant", Cpu, RowMajor, I64, fill_constant_cpu)?;
    Ok(())
}

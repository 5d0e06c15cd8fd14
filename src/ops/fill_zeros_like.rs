//! `fill_zeros_like`: zero tensor with the source's shape and dtype.
//!
//! The kernel is dtype-agnostic, so it registers once through the all-dtype
//! wildcard lane with its declared dtype set.

use crate::desc::{OpProto, SlotDef};
use crate::error::Result;
use crate::op::{ExecutionContext, InferShapeContext, VarTypeContext};
use crate::register_op;
use crate::registry::{KernelRegistry, OperatorRegistry};
use crate::scope::VarKind;
use crate::tensor::{Backend, DType, DataLayout, TensorValue};

const DTYPES: &[DType] = &[
    DType::Bool,
    DType::U8,
    DType::I8,
    DType::I32,
    DType::I64,
    DType::F16,
    DType::BF16,
    DType::F32,
    DType::F64,
];

fn infer_var_type(ctx: &mut VarTypeContext<'_>) -> Result<()> {
    ctx.set_output_kind("Dst", VarKind::Dense)?;
    if let Some(dtype) = ctx.input_dtype("Src")? {
        ctx.set_output_dtype("Dst", dtype)?;
    }
    Ok(())
}

fn infer_shape(ctx: &mut InferShapeContext<'_>) -> Result<()> {
    let dims = ctx.input_dim("Src")?;
    ctx.set_output_dim("Dst", dims)
}

fn fill_zeros_like_cpu(ctx: &ExecutionContext<'_>) -> anyhow::Result<()> {
    let src = ctx.input_value("Src")?;
    let out = TensorValue::zeros(src.dtype(), src.shape());
    ctx.set_output("Dst", out)?;
    Ok(())
}

pub(crate) fn register(
    ops: &mut OperatorRegistry,
    kernels: &mut KernelRegistry,
) -> Result<()> {
    let proto = OpProto::build("fill_zeros_like")
        .comment("Produce a zero tensor shaped and typed like the source.")
        .input(SlotDef::new("Src", "the source tensor"))
        .output(SlotDef::new("Dst", "the zero-filled result"))
        .finish()?;
    register_op!(ops, proto, var_type = infer_var_type, shape = infer_shape)?;
    kernels.declare_signature(
        "fill_zeros_like",
        crate::registry::KernelSignature::new(["Src"], ["Dst"], []),
    )?;
    kernels.register_any_dtype(
        "fill_zeros_like",
        Backend::Cpu,
        DataLayout::RowMajor,
        DTYPES,
        fill_zeros_like_cpu,
    )?;
    Ok(())
}

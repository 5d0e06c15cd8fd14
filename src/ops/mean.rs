//! `mean`: full reduction of `X` to a rank-0 tensor.

use anyhow::bail;
use rayon::prelude::*;

use crate::desc::{OpProto, SlotDef};
use crate::error::Result;
use crate::op::{ExecutionContext, InferShapeContext, VarTypeContext};
use crate::registry::{KernelRegistry, OperatorRegistry};
use crate::scope::VarKind;
use crate::tensor::{Tensor, TensorValue};
use crate::{register_op, register_op_kernel};

fn infer_var_type(ctx: &mut VarTypeContext<'_>) -> Result<()> {
    ctx.set_output_kind("Out", VarKind::Dense)?;
    if let Some(dtype) = ctx.input_dtype("X")? {
        ctx.set_output_dtype("Out", dtype)?;
    }
    Ok(())
}

fn infer_shape(ctx: &mut InferShapeContext<'_>) -> Result<()> {
    ctx.input_dim("X")?;
    ctx.set_output_dim("Out", Vec::new())
}

fn mean_cpu_f32(ctx: &ExecutionContext<'_>) -> anyhow::Result<()> {
    let x: Tensor<f32> = ctx.input("X")?;
    if x.numel() == 0 {
        bail!("mean of an empty tensor");
    }
    let sum: f32 = x.as_slice().par_iter().sum();
    let out = Tensor::from_scalar(sum / x.numel() as f32);
    ctx.set_output("Out", TensorValue::F32(out))?;
    Ok(())
}

fn mean_cpu_f64(ctx: &ExecutionContext<'_>) -> anyhow::Result<()> {
    let x: Tensor<f64> = ctx.input("X")?;
    if x.numel() == 0 {
        bail!("mean of an empty tensor");
    }
    let sum: f64 = x.as_slice().par_iter().sum();
    let out = Tensor::from_scalar(sum / x.numel() as f64);
    ctx.set_output("Out", TensorValue::F64(out))?;
    Ok(())
}

pub(crate) fn register(
    ops: &mut OperatorRegistry,
    kernels: &mut KernelRegistry,
) -> Result<()> {
    let proto = OpProto::build("mean")
        .comment("Reduce X to the mean of its elements.")
        .input(SlotDef::new("X", "the tensor to reduce"))
        .output(SlotDef::new("Out", "rank-0 mean"))
        .finish()?;
    register_op!(ops, proto, var_type = infer_var_type, shape = infer_shape)?;
    kernels.declare_signature(
        "mean",
        crate::registry::KernelSignature::new(["X"], ["Out"], []),
    )?;
    register_op_kernel!(kernels, "mean", Cpu, RowMajor, F32, mean_cpu_f32)?;
    register_op_kernel!(kernels, "mean", Cpu, RowMajor, F64, mean_cpu_f64)?;
    Ok(())
}

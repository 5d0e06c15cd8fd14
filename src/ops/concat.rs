//! `concat`: join any number of tensors along one axis.

use anyhow::bail;

use crate::attrs::{AttrType, AttrValue};
use crate::desc::{AttrDef, OpProto, SlotDef};
use crate::error::{OpError, Result};
use crate::op::{ExecutionContext, InferShapeContext, VarTypeContext};
use crate::registry::{KernelRegistry, OperatorRegistry};
use crate::scope::VarKind;
use crate::tensor::{Tensor, TensorElement};
use crate::{register_op, register_op_kernel};

fn infer_var_type(ctx: &mut VarTypeContext<'_>) -> Result<()> {
    ctx.set_output_kind("Out", VarKind::Dense)?;
    if let Some(dtype) = ctx.input_dtype("X")? {
        ctx.set_output_dtype("Out", dtype)?;
    }
    Ok(())
}

fn infer_shape(ctx: &mut InferShapeContext<'_>) -> Result<()> {
    let dims = ctx.input_dims("X")?;
    if dims.is_empty() {
        return Err(OpError::precondition("concat needs at least one input"));
    }
    let axis: i32 = ctx.attr("axis")?;
    let axis = axis as usize;
    let rank = dims[0].len();
    if axis >= rank {
        return Err(OpError::precondition(format!(
            "concat axis {} is out of range for rank {}",
            axis, rank
        )));
    }
    let mut out_dims = dims[0].clone();
    for d in &dims[1..] {
        if d.len() != rank {
            return Err(OpError::precondition(format!(
                "concat inputs must agree in rank: {} vs {}",
                rank,
                d.len()
            )));
        }
        for (i, (&lhs, &rhs)) in out_dims.iter().zip(d.iter()).enumerate() {
            if i != axis && lhs != rhs {
                return Err(OpError::precondition(format!(
                    "concat inputs disagree on axis {}: {} vs {}",
                    i, lhs, rhs
                )));
            }
        }
        out_dims[axis] += d[axis];
    }
    ctx.set_output_dim("Out", out_dims)
}

fn concat_cpu<T: TensorElement>(ctx: &ExecutionContext<'_>) -> anyhow::Result<()> {
    let values = ctx.inputs_value("X")?;
    if values.is_empty() {
        bail!("concat needs at least one input");
    }
    let axis: i32 = ctx.attr("axis")?;
    let axis = axis as usize;
    let tensors: Vec<Tensor<T>> = values
        .iter()
        .map(|value| value.typed::<T>())
        .collect::<anyhow::Result<_>>()?;
    let rank = tensors[0].shape().len();
    if axis >= rank {
        bail!("concat axis {} is out of range for rank {}", axis, rank);
    }
    let outer: usize = tensors[0].shape()[..axis].iter().product();
    let inner: usize = tensors[0].shape()[axis + 1..].iter().product();
    let mut out_shape = tensors[0].shape().to_vec();
    out_shape[axis] = tensors.iter().map(|t| t.shape()[axis]).sum();

    let mut data = Vec::with_capacity(out_shape.iter().product());
    for block in 0..outer {
        for tensor in &tensors {
            let span = tensor.shape()[axis] * inner;
            let start = block * span;
            data.extend_from_slice(&tensor.as_slice()[start..start + span]);
        }
    }
    ctx.set_output("Out", T::into_value(Tensor::from_vec(data, out_shape)?))?;
    Ok(())
}

pub(crate) fn register(
    ops: &mut OperatorRegistry,
    kernels: &mut KernelRegistry,
) -> Result<()> {
    let proto = OpProto::build("concat")
        .comment("Concatenate the inputs along one axis.")
        .input(SlotDef::new("X", "tensors to join").duplicable())
        .output(SlotDef::new("Out", "the joined tensor"))
        .attr(
            AttrDef::new("axis", AttrType::Int)
                .comment("axis to join along")
                .with_default(AttrValue::Int(0))
                .in_range(0.0, 8.0),
        )
        .finish()?;
    register_op!(ops, proto, var_type = infer_var_type, shape = infer_shape)?;
    kernels.declare_signature(
        "concat",
        crate::registry::KernelSignature::new(["X"], ["Out"], ["axis"]),
    )?;
    register_op_kernel!(kernels, "concat", Cpu, RowMajor, F32, concat_cpu::<f32>)?;
    register_op_kernel!(kernels, "concat", Cpu, RowMajor, F64, concat_cpu::<f64>)?;
    register_op_kernel!(kernels, "concat", Cpu, RowMajor, I32, concat_cpu::<i32>)?;
    register_op_kernel!(kernels, "concat", Cpu, RowMajor, I64, concat_cpu::<i64>)?;
    Ok(())
}

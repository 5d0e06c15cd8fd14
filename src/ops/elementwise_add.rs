//! `elementwise_add`: same-shape `Out = X + Y`.

use anyhow::bail;
use rayon::prelude::*;

use crate::desc::{OpDescriptor, OpProto, SlotDef};
use crate::error::{OpError, Result};
use crate::names::grad_var_name;
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
    let x_dims = ctx.input_dim("X")?;
    let y_dims = ctx.input_dim("Y")?;
    if x_dims != y_dims {
        return Err(OpError::precondition(format!(
            "elementwise_add operands must agree in shape: {:?} vs {:?}",
            x_dims, y_dims
        )));
    }
    ctx.set_output_dim("Out", x_dims)
}

fn add_cpu<T>(ctx: &ExecutionContext<'_>) -> anyhow::Result<()>
where
    T: TensorElement + Copy + Send + Sync + std::ops::Add<Output = T>,
{
    let x: Tensor<T> = ctx.input("X")?;
    let y: Tensor<T> = ctx.input("Y")?;
    if x.shape() != y.shape() {
        bail!(
            "elementwise_add operands must agree in shape: {:?} vs {:?}",
            x.shape(),
            y.shape()
        );
    }
    let data: Vec<T> = x
        .as_slice()
        .par_iter()
        .zip(y.as_slice().par_iter())
        .map(|(a, b)| *a + *b)
        .collect();
    ctx.set_output(
        "Out",
        T::into_value(Tensor::from_vec(data, x.shape().to_vec())?),
    )?;
    Ok(())
}

// Both operand gradients are pass-throughs of the output gradient; the
// maker only builds descriptors, materializing them is the caller's call.
fn grad_maker(desc: &OpDescriptor) -> Result<Vec<OpDescriptor>> {
    let first = |slot: &str| -> Result<String> {
        desc.input(slot)
            .first()
            .cloned()
            .ok_or_else(|| OpError::validation(&desc.op_type, format!("slot `{}` is unbound", slot)))
    };
    let x = first("X")?;
    let y = first("Y")?;
    let out = desc
        .output("Out")
        .first()
        .cloned()
        .ok_or_else(|| OpError::validation(&desc.op_type, "slot `Out` is unbound"))?;
    Ok(vec![OpDescriptor::new("elementwise_add_grad")
        .with_input("X", [x.clone()])
        .with_input("Y", [y.clone()])
        .with_input(grad_var_name("Out"), [grad_var_name(&out)])
        .with_output(grad_var_name("X"), [grad_var_name(&x)])
        .with_output(grad_var_name("Y"), [grad_var_name(&y)])])
}

pub(crate) fn register(
    ops: &mut OperatorRegistry,
    kernels: &mut KernelRegistry,
) -> Result<()> {
    let proto = OpProto::build("elementwise_add")
        .comment("Add two tensors of identical shape.")
        .input(SlotDef::new("X", "left operand"))
        .input(SlotDef::new("Y", "right operand"))
        .output(SlotDef::new("Out", "the elementwise sum"))
        .finish()?;
    register_op!(
        ops,
        proto,
        grad = grad_maker,
        var_type = infer_var_type,
        shape = infer_shape,
    )?;
    kernels.declare_signature(
        "elementwise_add",
        crate::registry::KernelSignature::new(["X", "Y"], ["Out"], []),
    )?;
    register_op_kernel!(kernels, "elementwise_add", Cpu, RowMajor, F32, add_cpu::<f32>)?;
    register_op_kernel!(kernels, "elementwise_add", Cpu, RowMajor, F64, add_cpu::<f64>)?;
    register_op_kernel!(kernels, "elementwise_add", Cpu, RowMajor, I32, add_cpu::<i32>)?;
    register_op_kernel!(kernels, "elementwise_add", Cpu, RowMajor, I64, add_cpu::<i64>)?;
    Ok(())
}

//! `gather`: select rows of `X` along the first axis, `Out = X[Index]`.

use anyhow::{anyhow, bail};

use crate::desc::{OpDescriptor, OpProto, SlotDef};
use crate::error::{OpError, Result};
use crate::names::grad_var_name;
use crate::op::{ExecutionContext, InferShapeContext, VarTypeContext};
use crate::registry::{KernelRegistry, OperatorRegistry};
use crate::scope::VarKind;
use crate::tensor::{Tensor, TensorElement, TensorValue};
use crate::{register_op, register_op_kernel};

fn infer_var_type(ctx: &mut VarTypeContext<'_>) -> Result<()> {
    ctx.set_output_kind("Out", VarKind::Dense)?;
    if let Some(dtype) = ctx.input_dtype("X")? {
        ctx.set_output_dtype("Out", dtype)?;
    }
    Ok(())
}

fn infer_shape(ctx: &mut InferShapeContext<'_>) -> Result<()> {
    if !ctx.has_input("X") {
        return Err(OpError::precondition(
            "input X of gather op should not be null",
        ));
    }
    if !ctx.has_input("Index") {
        return Err(OpError::precondition(
            "input Index of gather op should not be null",
        ));
    }
    let x_dims = ctx.input_dim("X")?;
    let index_dims = ctx.input_dim("Index")?;
    if index_dims.len() != 1 {
        return Err(OpError::precondition(format!(
            "gather index must be rank 1, got rank {}",
            index_dims.len()
        )));
    }
    let mut out_dims = x_dims;
    out_dims[0] = index_dims[0];
    ctx.set_output_dim("Out", out_dims)
}

fn read_indices(value: &TensorValue) -> anyhow::Result<Vec<i64>> {
    match value {
        TensorValue::I32(tensor) => Ok(tensor.as_slice().iter().map(|i| *i as i64).collect()),
        TensorValue::I64(tensor) => Ok(tensor.to_vec()),
        other => Err(anyhow!(
            "gather index must be int32 or int64, got {}",
            other.dtype()
        )),
    }
}

fn gather_cpu<T: TensorElement>(ctx: &ExecutionContext<'_>) -> anyhow::Result<()> {
    let x: Tensor<T> = ctx.input("X")?;
    let indices = read_indices(&ctx.input_value("Index")?)?;
    if x.shape().is_empty() {
        bail!("gather source must have at least one axis");
    }
    let rows = x.shape()[0];
    let row_size: usize = x.shape()[1..].iter().product();
    let mut data = Vec::with_capacity(indices.len() * row_size);
    let flat = x.as_slice();
    for &idx in &indices {
        if idx < 0 || idx as usize >= rows {
            bail!("gather index {} out of range for {} rows", idx, rows);
        }
        let start = idx as usize * row_size;
        data.extend_from_slice(&flat[start..start + row_size]);
    }
    let mut out_shape = vec![indices.len()];
    out_shape.extend_from_slice(&x.shape()[1..]);
    ctx.set_output("Out", T::into_value(Tensor::from_vec(data, out_shape)?))?;
    Ok(())
}

fn grad_infer_shape(ctx: &mut InferShapeContext<'_>) -> Result<()> {
    let x_dims = ctx.input_dim("X")?;
    ctx.set_output_dim(&grad_var_name("X"), x_dims)
}

fn gather_grad_cpu<T>(ctx: &ExecutionContext<'_>) -> anyhow::Result<()>
where
    T: TensorElement + Default + Copy + std::ops::Add<Output = T>,
{
    let x: Tensor<T> = ctx.input("X")?;
    let indices = read_indices(&ctx.input_value("Index")?)?;
    let out_grad: Tensor<T> = ctx.input(&grad_var_name("Out"))?;
    let row_size: usize = x.shape()[1..].iter().product();
    let mut grad = Tensor::<T>::zeros(x.shape().to_vec());
    {
        let flat = grad.as_mut_slice();
        let src = out_grad.as_slice();
        for (row, &idx) in indices.iter().enumerate() {
            if idx < 0 || idx as usize >= x.shape()[0] {
                bail!("gather index {} out of range for {} rows", idx, x.shape()[0]);
            }
            let dst_start = idx as usize * row_size;
            let src_start = row * row_size;
            for offset in 0..row_size {
                flat[dst_start + offset] =
                    flat[dst_start + offset] + src[src_start + offset];
            }
        }
    }
    ctx.set_output(&grad_var_name("X"), T::into_value(grad))?;
    Ok(())
}

fn grad_maker(desc: &OpDescriptor) -> Result<Vec<OpDescriptor>> {
    let first = |slot: &str| -> Result<String> {
        desc.input(slot)
            .first()
            .cloned()
            .ok_or_else(|| OpError::validation(&desc.op_type, format!("slot `{}` is unbound", slot)))
    };
    let x = first("X")?;
    let index = first("Index")?;
    let out = desc
        .output("Out")
        .first()
        .cloned()
        .ok_or_else(|| OpError::validation(&desc.op_type, "slot `Out` is unbound"))?;
    Ok(vec![OpDescriptor::new("gather_grad")
        .with_input("X", [x.clone()])
        .with_input("Index", [index])
        .with_input(grad_var_name("Out"), [grad_var_name(&out)])
        .with_output(grad_var_name("X"), [grad_var_name(&x)])])
}

pub(crate) fn register(
    ops: &mut OperatorRegistry,
    kernels: &mut KernelRegistry,
) -> Result<()> {
    let proto = OpProto::build("gather")
        .comment("Gather rows of X selected by Index along the first axis.")
        .input(SlotDef::new("X", "the source tensor"))
        .input(SlotDef::new("Index", "row indices, rank 1"))
        .output(SlotDef::new("Out", "the gathered rows"))
        .finish()?;
    register_op!(
        ops,
        proto,
        grad = grad_maker,
        var_type = infer_var_type,
        shape = infer_shape,
    )?;
    kernels.declare_signature(
        "gather",
        crate::registry::KernelSignature::new(["X", "Index"], ["Out"], []),
    )?;
    register_op_kernel!(kernels, "gather", Cpu, RowMajor, F32, gather_cpu::<f32>)?;
    register_op_kernel!(kernels, "gather", Cpu, RowMajor, F64, gather_cpu::<f64>)?;
    register_op_kernel!(kernels, "gather", Cpu, RowMajor, I32, gather_cpu::<i32>)?;
    register_op_kernel!(kernels, "gather", Cpu, RowMajor, I64, gather_cpu::<i64>)?;

    let grad_proto = OpProto::build("gather_grad")
        .comment("Scatter-add the output gradient back onto the source rows.")
        .input(SlotDef::new("X", "the forward source tensor"))
        .input(SlotDef::new("Index", "row indices from the forward pass"))
        .input(SlotDef::new(grad_var_name("Out"), "gradient of the output"))
        .output(SlotDef::new(grad_var_name("X"), "gradient of the source"))
        .finish()?;
    register_op!(ops, grad_proto, shape = grad_infer_shape)?;
    kernels.declare_signature(
        "gather_grad",
        crate::registry::KernelSignature::new(
            ["X".to_string(), "Index".to_string(), grad_var_name("Out")],
            [grad_var_name("X")],
            [],
        ),
    )?;
    register_op_kernel!(kernels, "gather_grad", Cpu, RowMajor, F32, gather_grad_cpu::<f32>)?;
    register_op_kernel!(kernels, "gather_grad", Cpu, RowMajor, F64, gather_grad_cpu::<f64>)?;
    Ok(())
}

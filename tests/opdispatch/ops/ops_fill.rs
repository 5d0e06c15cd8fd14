use anyhow::Result;
use opdispatch::{
    op_registry, AttrValue, DType, OpDescriptor, Place, Scope, TensorValue, Tensor,
};

use crate::common;

#[test]
fn fill_constant_produces_the_declared_tensor() -> Result<()> {
    // shape [2, 3], dtype float32 (code 5), value 1.0
    let scope = Scope::new();
    let registry = op_registry().read().unwrap();
    let desc = OpDescriptor::new("fill_constant")
        .with_output("Out", ["o"])
        .with_attr("shape", AttrValue::Longs(vec![2, 3]))
        .with_attr("dtype", AttrValue::Int(5))
        .with_attr("value", AttrValue::Float(1.0));
    let op = registry.create(desc)?;
    op.infer_var_type(&scope)?;
    op.infer_shape(&scope)?;
    op.run(&scope, Place::Host)?;

    let out = scope.find_var("o").expect("output variable").dense()?;
    assert_eq!(out.dtype(), DType::F32);
    assert_eq!(out.shape(), &[2, 3]);
    common::assert_f32_close(&common::as_f32_vec(&out)?, &[1.0; 6]);
    Ok(())
}

#[test]
fn fill_constant_defaults_to_zero_f32() -> Result<()> {
    let scope = Scope::new();
    let registry = op_registry().read().unwrap();
    let desc = OpDescriptor::new("fill_constant")
        .with_output("Out", ["z"])
        .with_attr("shape", AttrValue::Longs(vec![4]));
    let op = registry.create(desc)?;
    op.run(&scope, Place::Host)?;

    let out = scope.find_var("z").expect("output variable").dense()?;
    assert_eq!(out.dtype(), DType::F32);
    common::assert_f32_close(&common::as_f32_vec(&out)?, &[0.0; 4]);
    Ok(())
}

#[test]
fn fill_constant_int64_payload() -> Result<()> {
    let scope = Scope::new();
    let registry = op_registry().read().unwrap();
    let desc = OpDescriptor::new("fill_constant")
        .with_output("Out", ["ones"])
        .with_attr("shape", AttrValue::Longs(vec![3]))
        .with_attr("dtype", AttrValue::Int(DType::I64.code()))
        .with_attr("value", AttrValue::Float(1.0));
    let op = registry.create(desc)?;
    op.run(&scope, Place::Host)?;

    let out = scope.find_var("ones").expect("output variable").dense()?;
    match out {
        TensorValue::I64(tensor) => assert_eq!(tensor.to_vec(), vec![1, 1, 1]),
        other => panic!("expected int64, got {}", other.dtype()),
    }
    Ok(())
}

#[test]
fn fill_zeros_like_matches_source_shape_and_dtype() -> Result<()> {
    // Src is a 4x5 tensor; Dst must be 4x5, same dtype, all zero.
    let scope = Scope::new();
    scope
        .var("src")?
        .set_dense(common::f32_tensor(vec![3.5; 20], vec![4, 5])?)?;

    let registry = op_registry().read().unwrap();
    let desc = OpDescriptor::new("fill_zeros_like")
        .with_input("Src", ["src"])
        .with_output("Dst", ["dst"]);
    let op = registry.create(desc)?;
    op.run(&scope, Place::Host)?;

    let out = scope.find_var("dst").expect("output variable").dense()?;
    assert_eq!(out.dtype(), DType::F32);
    assert_eq!(out.shape(), &[4, 5]);
    common::assert_f32_close(&common::as_f32_vec(&out)?, &[0.0; 20]);
    Ok(())
}

#[test]
fn fill_zeros_like_serves_every_declared_dtype() -> Result<()> {
    // The registration is a single all-dtype wildcard; an int64 source must
    // dispatch through the same lane.
    let scope = Scope::new();
    scope
        .var("src64")?
        .set_dense(TensorValue::I64(Tensor::from_vec(vec![9, 8, 7], vec![3])?))?;

    let registry = op_registry().read().unwrap();
    let desc = OpDescriptor::new("fill_zeros_like")
        .with_input("Src", ["src64"])
        .with_output("Dst", ["dst64"]);
    let op = registry.create(desc)?;
    op.run(&scope, Place::Host)?;

    let out = scope.find_var("dst64").expect("output variable").dense()?;
    match out {
        TensorValue::I64(tensor) => assert_eq!(tensor.to_vec(), vec![0, 0, 0]),
        other => panic!("expected int64, got {}", other.dtype()),
    }
    Ok(())
}

#[test]
fn fill_constant_rejects_empty_shape_list() -> Result<()> {
    let registry = op_registry().read().unwrap();
    let desc = OpDescriptor::new("fill_constant")
        .with_output("Out", ["o"])
        .with_attr("shape", AttrValue::Longs(vec![]));
    assert!(registry.create(desc).is_err());
    Ok(())
}

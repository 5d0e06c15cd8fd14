use anyhow::Result;
use opdispatch::{op_registry, ErrorKind, OpDescriptor, Place, Scope, TensorValue, Tensor};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::common;

#[test]
fn elementwise_add_matches_reference() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(7);
    let lhs: Vec<f32> = (0..128).map(|_| rng.gen_range(-4.0..4.0)).collect();
    let rhs: Vec<f32> = (0..128).map(|_| rng.gen_range(-4.0..4.0)).collect();
    let expected: Vec<f32> = lhs.iter().zip(&rhs).map(|(a, b)| a + b).collect();

    let scope = Scope::new();
    scope
        .var("x")?
        .set_dense(common::f32_tensor(lhs, vec![8, 16])?)?;
    scope
        .var("y")?
        .set_dense(common::f32_tensor(rhs, vec![8, 16])?)?;

    let registry = op_registry().read().unwrap();
    let desc = OpDescriptor::new("elementwise_add")
        .with_input("X", ["x"])
        .with_input("Y", ["y"])
        .with_output("Out", ["sum"]);
    let op = registry.create(desc)?;
    op.infer_var_type(&scope)?;
    op.infer_shape(&scope)?;
    op.run(&scope, Place::Host)?;

    let out = scope.find_var("sum").expect("output variable").dense()?;
    assert_eq!(out.shape(), &[8, 16]);
    common::assert_f32_close(&common::as_f32_vec(&out)?, &expected);
    Ok(())
}

#[test]
fn elementwise_add_int64_lane() -> Result<()> {
    let scope = Scope::new();
    opdispatch::scope_insert!(scope, {
        x: common::i64_tensor(vec![1, 2, 3], vec![3])?,
        y: common::i64_tensor(vec![10, 20, 30], vec![3])?,
    });

    let registry = op_registry().read().unwrap();
    let desc = OpDescriptor::new("elementwise_add")
        .with_input("X", ["x"])
        .with_input("Y", ["y"])
        .with_output("Out", ["sum"]);
    registry.create(desc)?.run(&scope, Place::Host)?;

    let out = opdispatch::scope_fetch!(scope, sum);
    match out {
        TensorValue::I64(tensor) => assert_eq!(tensor.to_vec(), vec![11, 22, 33]),
        other => panic!("expected int64, got {}", other.dtype()),
    }
    Ok(())
}

#[test]
fn mean_reduces_to_rank_zero() -> Result<()> {
    let scope = Scope::new();
    scope
        .var("x")?
        .set_dense(common::f32_tensor(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2])?)?;

    let registry = op_registry().read().unwrap();
    let desc = OpDescriptor::new("mean")
        .with_input("X", ["x"])
        .with_output("Out", ["avg"]);
    let op = registry.create(desc)?;
    op.infer_shape(&scope)?;
    op.run(&scope, Place::Host)?;

    let out = scope.find_var("avg").expect("output variable").dense()?;
    assert_eq!(out.shape(), &[] as &[usize]);
    common::assert_f32_close(&common::as_f32_vec(&out)?, &[2.5]);
    Ok(())
}

#[test]
fn mean_of_empty_tensor_is_external_error() -> Result<()> {
    let scope = Scope::new();
    scope
        .var("x")?
        .set_dense(TensorValue::F32(Tensor::from_vec(vec![], vec![0, 3])?))?;

    let registry = op_registry().read().unwrap();
    let desc = OpDescriptor::new("mean")
        .with_input("X", ["x"])
        .with_output("Out", ["avg"]);
    let err = registry.create(desc)?.run(&scope, Place::Host).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::External);
    Ok(())
}

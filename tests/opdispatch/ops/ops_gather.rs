use anyhow::Result;
use opdispatch::{grad_var_name, op_registry, OpDescriptor, Place, Scope};

use crate::common;

#[test]
fn gather_selects_rows_by_index() -> Result<()> {
    // X is [10, 3], Index is [4]; Out must be [4, 3].
    let scope = Scope::new();
    let data: Vec<f32> = (0..30).map(|v| v as f32).collect();
    scope
        .var("x")?
        .set_dense(common::f32_tensor(data, vec![10, 3])?)?;
    scope
        .var("idx")?
        .set_dense(common::i64_tensor(vec![0, 2, 4, 9], vec![4])?)?;

    let registry = op_registry().read().unwrap();
    let desc = OpDescriptor::new("gather")
        .with_input("X", ["x"])
        .with_input("Index", ["idx"])
        .with_output("Out", ["out"]);
    let op = registry.create(desc)?;
    op.infer_shape(&scope)?;
    op.run(&scope, Place::Host)?;

    let out = scope.find_var("out").expect("output variable").dense()?;
    assert_eq!(out.shape(), &[4, 3]);
    common::assert_f32_close(
        &common::as_f32_vec(&out)?,
        &[
            0.0, 1.0, 2.0, // row 0
            6.0, 7.0, 8.0, // row 2
            12.0, 13.0, 14.0, // row 4
            27.0, 28.0, 29.0, // row 9
        ],
    );
    Ok(())
}

#[test]
fn gather_accepts_int32_indices() -> Result<()> {
    let scope = Scope::new();
    scope
        .var("x")?
        .set_dense(common::f32_tensor(vec![1.0, 2.0, 3.0, 4.0], vec![4])?)?;
    scope.var("idx")?.set_dense(opdispatch::TensorValue::I32(
        opdispatch::Tensor::from_vec(vec![3, 0], vec![2])?,
    ))?;

    let registry = op_registry().read().unwrap();
    let desc = OpDescriptor::new("gather")
        .with_input("X", ["x"])
        .with_input("Index", ["idx"])
        .with_output("Out", ["out"]);
    registry.create(desc)?.run(&scope, Place::Host)?;

    let out = scope.find_var("out").expect("output variable").dense()?;
    common::assert_f32_close(&common::as_f32_vec(&out)?, &[4.0, 1.0]);
    Ok(())
}

#[test]
fn gather_grad_scatter_adds_into_source_shape() -> Result<()> {
    let scope = Scope::new();
    scope
        .var("x")?
        .set_dense(common::f32_tensor(vec![0.0; 6], vec![3, 2])?)?;
    // Index [0, 2, 0]: row 0 accumulates twice.
    scope
        .var("idx")?
        .set_dense(common::i64_tensor(vec![0, 2, 0], vec![3])?)?;
    scope.var(&grad_var_name("out"))?.set_dense(common::f32_tensor(
        vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0],
        vec![3, 2],
    )?)?;

    let registry = op_registry().read().unwrap();
    let desc = OpDescriptor::new("gather_grad")
        .with_input("X", ["x"])
        .with_input("Index", ["idx"])
        .with_input(grad_var_name("Out"), [grad_var_name("out")])
        .with_output(grad_var_name("X"), [grad_var_name("x")]);
    let op = registry.create(desc)?;
    op.infer_shape(&scope)?;
    op.run(&scope, Place::Host)?;

    let grad = scope
        .find_var(&grad_var_name("x"))
        .expect("gradient variable")
        .dense()?;
    assert_eq!(grad.shape(), &[3, 2]);
    common::assert_f32_close(
        &common::as_f32_vec(&grad)?,
        &[4.0, 4.0, 0.0, 0.0, 2.0, 2.0],
    );
    Ok(())
}

#[test]
fn concat_joins_along_the_requested_axis() -> Result<()> {
    let scope = Scope::new();
    scope
        .var("a")?
        .set_dense(common::f32_tensor(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2])?)?;
    scope
        .var("b")?
        .set_dense(common::f32_tensor(vec![5.0, 6.0, 7.0, 8.0], vec![2, 2])?)?;

    let registry = op_registry().read().unwrap();

    // Axis 0: stack rows.
    let desc = OpDescriptor::new("concat")
        .with_input("X", ["a", "b"])
        .with_output("Out", ["rows"])
        .with_attr("axis", opdispatch::AttrValue::Int(0));
    let op = registry.create(desc)?;
    op.infer_shape(&scope)?;
    op.run(&scope, Place::Host)?;
    let rows = scope.find_var("rows").expect("output variable").dense()?;
    assert_eq!(rows.shape(), &[4, 2]);
    common::assert_f32_close(
        &common::as_f32_vec(&rows)?,
        &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
    );

    // Axis 1: interleave columns.
    let desc = OpDescriptor::new("concat")
        .with_input("X", ["a", "b"])
        .with_output("Out", ["cols"])
        .with_attr("axis", opdispatch::AttrValue::Int(1));
    let op = registry.create(desc)?;
    op.run(&scope, Place::Host)?;
    let cols = scope.find_var("cols").expect("output variable").dense()?;
    assert_eq!(cols.shape(), &[2, 4]);
    common::assert_f32_close(
        &common::as_f32_vec(&cols)?,
        &[1.0, 2.0, 5.0, 6.0, 3.0, 4.0, 7.0, 8.0],
    );
    Ok(())
}

#[test]
fn concat_axis_validator_rejects_out_of_range() -> Result<()> {
    let registry = op_registry().read().unwrap();
    let desc = OpDescriptor::new("concat")
        .with_input("X", ["a"])
        .with_output("Out", ["o"])
        .with_attr("axis", opdispatch::AttrValue::Int(-3));
    assert!(registry.create(desc).is_err());

    let desc = OpDescriptor::new("concat")
        .with_input("X", ["a"])
        .with_output("Out", ["o"])
        .with_attr("axis", opdispatch::AttrValue::Int(99));
    assert!(registry.create(desc).is_err());
    Ok(())
}

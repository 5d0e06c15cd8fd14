use anyhow::Result;
use opdispatch::{grad_var_name, op_registry, AttrValue, ErrorKind, OpDescriptor};

#[test]
fn gather_grad_maker_builds_suffixed_descriptor() -> Result<()> {
    let registry = op_registry().read().unwrap();
    let desc = OpDescriptor::new("gather")
        .with_input("X", ["x"])
        .with_input("Index", ["idx"])
        .with_output("Out", ["out"]);
    let op = registry.create(desc)?;

    let grads = op.grad_descriptors()?;
    assert_eq!(grads.len(), 1);
    let grad = &grads[0];
    assert_eq!(grad.op_type, "gather_grad");
    assert_eq!(grad.input("X"), ["x"]);
    assert_eq!(grad.input("Index"), ["idx"]);
    assert_eq!(grad.input(&grad_var_name("Out")), [grad_var_name("out")]);
    assert_eq!(grad.output(&grad_var_name("X")), [grad_var_name("x")]);
    Ok(())
}

#[test]
fn grad_descriptor_is_creatable_when_grad_op_is_registered() -> Result<()> {
    let registry = op_registry().read().unwrap();
    let desc = OpDescriptor::new("gather")
        .with_input("X", ["x"])
        .with_input("Index", ["idx"])
        .with_output("Out", ["out"]);
    let grads = registry.create(desc)?.grad_descriptors()?;
    let grad_op = registry.create(grads[0].clone())?;
    assert_eq!(grad_op.op_type(), "gather_grad");
    Ok(())
}

#[test]
fn elementwise_add_grad_maker_covers_both_operands() -> Result<()> {
    let registry = op_registry().read().unwrap();
    let desc = OpDescriptor::new("elementwise_add")
        .with_input("X", ["lhs"])
        .with_input("Y", ["rhs"])
        .with_output("Out", ["sum"]);
    let grads = registry.create(desc)?.grad_descriptors()?;
    assert_eq!(grads.len(), 1);
    let grad = &grads[0];
    assert_eq!(grad.op_type, "elementwise_add_grad");
    assert_eq!(grad.output(&grad_var_name("X")), [grad_var_name("lhs")]);
    assert_eq!(grad.output(&grad_var_name("Y")), [grad_var_name("rhs")]);
    Ok(())
}

#[test]
fn op_without_grad_maker_reports_unimplemented() -> Result<()> {
    let registry = op_registry().read().unwrap();
    let desc = OpDescriptor::new("mean")
        .with_input("X", ["x"])
        .with_output("Out", ["out"]);
    let err = registry.create(desc)?.grad_descriptors().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unimplemented);
    Ok(())
}

#[test]
fn fill_constant_dtype_attr_roundtrips() -> Result<()> {
    let registry = op_registry().read().unwrap();
    let desc = OpDescriptor::new("fill_constant")
        .with_output("Out", ["o"])
        .with_attr("shape", AttrValue::Longs(vec![2]))
        .with_attr("dtype", AttrValue::Int(5))
        .with_attr("value", AttrValue::Float(1.5));
    let op = registry.create(desc)?;
    assert_eq!(op.attr::<i32>("dtype")?, 5);
    assert_eq!(op.attr::<f32>("value")?, 1.5);
    // force_cpu default materialized by the checker.
    assert!(!op.attr::<bool>("force_cpu")?);
    Ok(())
}

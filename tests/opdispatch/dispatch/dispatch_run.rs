use anyhow::Result;
use opdispatch::{
    op_registry, AttrValue, DType, ErrorKind, OpDescriptor, Place, Scope, Tensor,
    TensorValue,
};

use crate::common;

#[test]
fn host_only_op_runs_on_device_place_via_fallback() -> Result<()> {
    // Tier-4: `empty` registers host kernels only; a device place must
    // still execute, on the host kernel.
    let scope = Scope::new();
    let registry = op_registry().read().unwrap();
    let desc = OpDescriptor::new("empty")
        .with_output("Out", ["buf"])
        .with_attr("shape", AttrValue::Longs(vec![3, 2]));
    let op = registry.create(desc)?;
    op.run(&scope, Place::Device(0))?;

    let out = scope.find_var("buf").expect("output variable").dense()?;
    assert_eq!(out.dtype(), DType::F32);
    assert_eq!(out.shape(), &[3, 2]);
    Ok(())
}

#[test]
fn missing_kernel_surfaces_not_found_with_request_text() -> Result<()> {
    common::register_test_ops()?;
    let scope = Scope::new();
    scope
        .var("x")?
        .set_dense(TensorValue::I8(Tensor::from_vec(vec![1i8, 2], vec![2])?))?;

    let registry = op_registry().read().unwrap();
    let desc = OpDescriptor::new("host_f32_only")
        .with_input("X", ["x"])
        .with_output("Out", ["y"]);
    let op = registry.create(desc)?;
    let err = op.run(&scope, Place::Host).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let text = err.to_string();
    assert!(text.contains("host_f32_only"), "{}", text);
    assert!(text.contains("int8"), "{}", text);
    Ok(())
}

#[test]
fn force_cpu_hint_pins_the_host_backend() -> Result<()> {
    let scope = Scope::new();
    let registry = op_registry().read().unwrap();
    let desc = OpDescriptor::new("fill_constant")
        .with_output("Out", ["pinned"])
        .with_attr("shape", AttrValue::Longs(vec![2]))
        .with_attr("value", AttrValue::Float(7.0))
        .with_attr("force_cpu", AttrValue::Bool(true));
    let op = registry.create(desc)?;
    // Requested backend is the host even though the place is a device, so
    // this resolves in tier 1 rather than through the fallback.
    op.run(&scope, Place::Device(1))?;

    let out = scope.find_var("pinned").expect("output variable").dense()?;
    assert_eq!(common::as_f32_vec(&out)?, vec![7.0, 7.0]);
    Ok(())
}

#[test]
fn missing_required_input_fails_before_the_kernel() -> Result<()> {
    common::register_test_ops()?;
    let scope = Scope::new();
    let registry = op_registry().read().unwrap();
    let desc = OpDescriptor::new("host_f32_only")
        .with_input("X", ["ghost"])
        .with_output("Out", ["y"]);
    let op = registry.create(desc)?;
    let err = op.run(&scope, Place::Host).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains("ghost"));
    Ok(())
}

#[test]
fn kernel_failures_wrap_as_external() -> Result<()> {
    let scope = Scope::new();
    scope
        .var("one")?
        .set_dense(common::f32_tensor(vec![1.0, 2.0], vec![2])?)?;
    // Out-of-range index: the kernel itself rejects it at run time.
    scope
        .var("oob")?
        .set_dense(common::i64_tensor(vec![99], vec![1])?)?;

    let registry = op_registry().read().unwrap();
    let desc = OpDescriptor::new("gather")
        .with_input("X", ["one"])
        .with_input("Index", ["oob"])
        .with_output("Out", ["out"]);
    let op = registry.create(desc)?;
    let err = op.run(&scope, Place::Host).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::External);
    Ok(())
}

#[test]
fn builtin_ops_declare_kernel_signatures() {
    let kernels = opdispatch::kernel_registry().read().unwrap();
    let sig = kernels.signature("gather").expect("gather signature");
    assert_eq!(sig.inputs, vec!["X".to_string(), "Index".to_string()]);
    assert_eq!(sig.outputs, vec!["Out".to_string()]);
    assert_eq!(sig.to_string(), "(X, Index) -> (Out) with []");

    let fill = kernels.signature("fill_constant").expect("fill signature");
    assert_eq!(fill.attrs, vec!["shape", "dtype", "value"]);
}

#[test]
fn device_contexts_are_pooled_per_place() {
    use opdispatch::DeviceContextPool;
    let host_a = DeviceContextPool::get(Place::Host);
    let host_b = DeviceContextPool::get(Place::Host);
    assert_eq!(host_a.stream_id(), host_b.stream_id());

    let dev = DeviceContextPool::get(Place::Device(3));
    assert_ne!(dev.stream_id(), host_a.stream_id());
    assert_eq!(dev.place(), Place::Device(3));
    host_a.wait();
}

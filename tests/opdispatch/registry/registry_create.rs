use anyhow::Result;
use opdispatch::{
    op_registry, register_op, AttrDef, AttrType, AttrValue, DebugString, ErrorKind,
    OpDescriptor, OpProto, OperatorRegistry, SlotDef,
};

use crate::common;

fn cosine_proto() -> opdispatch::Result<OpProto> {
    OpProto::build("cos_sim")
        .comment("cosine demo op")
        .input(SlotDef::new("input", "input of cosine op"))
        .output(SlotDef::new("output", "output of cosine op"))
        .attr(
            AttrDef::new("scale", AttrType::Float)
                .comment("scale of cosine op")
                .with_default(AttrValue::Float(1.0))
                .greater_than(0.0),
        )
        .finish()
}

#[test]
fn create_freezes_attrs_and_defaults() -> Result<()> {
    let mut registry = OperatorRegistry::new();
    register_op!(registry, cosine_proto()?)?;

    let desc = OpDescriptor::new("cos_sim")
        .with_input("input", ["aa"])
        .with_output("output", ["bb"])
        .with_attr("scale", AttrValue::Float(3.3));
    let op = registry.create(desc)?;
    assert_eq!(op.op_type(), "cos_sim");
    assert_eq!(op.attr::<f32>("scale")?, 3.3);
    assert_eq!(op.input("input")?, "aa");
    assert_eq!(op.output("output")?, "bb");
    Ok(())
}

#[test]
fn create_substitutes_default_value() -> Result<()> {
    let mut registry = OperatorRegistry::new();
    register_op!(registry, cosine_proto()?)?;

    let desc = OpDescriptor::new("cos_sim")
        .with_input("input", ["aa"])
        .with_output("output", ["bb"]);
    let op = registry.create(desc)?;
    assert_eq!(op.attr::<f32>("scale")?, 1.0);
    Ok(())
}

#[test]
fn create_rejects_failed_validator() -> Result<()> {
    let mut registry = OperatorRegistry::new();
    register_op!(registry, cosine_proto()?)?;

    let desc = OpDescriptor::new("cos_sim")
        .with_input("input", ["aa"])
        .with_output("output", ["bb"])
        .with_attr("scale", AttrValue::Float(-2.0));
    let err = registry.create(desc).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(err.to_string().contains("scale"));
    Ok(())
}

#[test]
fn create_rejects_missing_required_attr() -> Result<()> {
    let mut registry = OperatorRegistry::new();
    let proto = OpProto::build("needs_attr")
        .input(SlotDef::new("input", ""))
        .output(SlotDef::new("output", ""))
        .attr(AttrDef::new("test_attr", AttrType::Int))
        .finish()?;
    register_op!(registry, proto)?;

    let desc = OpDescriptor::new("needs_attr")
        .with_input("input", ["ii"])
        .with_output("output", ["oo"]);
    let err = registry.create(desc).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(err.to_string().contains("test_attr"));
    Ok(())
}

#[test]
fn create_rejects_type_mismatch() -> Result<()> {
    let mut registry = OperatorRegistry::new();
    register_op!(registry, cosine_proto()?)?;

    let desc = OpDescriptor::new("cos_sim")
        .with_input("input", ["aa"])
        .with_output("output", ["bb"])
        .with_attr("scale", AttrValue::Str("big".to_string()));
    let err = registry.create(desc).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    Ok(())
}

#[test]
fn list_length_validator_rejects_both_bounds() -> Result<()> {
    let mut registry = OperatorRegistry::new();
    let proto = OpProto::build("pool_like")
        .input(SlotDef::new("input", ""))
        .output(SlotDef::new("output", ""))
        .attr(AttrDef::new("ksize", AttrType::Ints).len_between(2, 3))
        .finish()?;
    register_op!(registry, proto)?;

    let below = OpDescriptor::new("pool_like")
        .with_input("input", ["x"])
        .with_output("output", ["y"])
        .with_attr("ksize", AttrValue::Ints(vec![2]));
    assert!(registry.create(below).is_err());

    let above = OpDescriptor::new("pool_like")
        .with_input("input", ["x"])
        .with_output("output", ["y"])
        .with_attr("ksize", AttrValue::Ints(vec![1, 2, 3, 4]));
    assert!(registry.create(above).is_err());

    let fits = OpDescriptor::new("pool_like")
        .with_input("input", ["x"])
        .with_output("output", ["y"])
        .with_attr("ksize", AttrValue::Ints(vec![2, 2]));
    assert!(registry.create(fits).is_ok());
    Ok(())
}

#[test]
fn unknown_op_type_is_not_found() {
    let registry = OperatorRegistry::new();
    let err = registry
        .create(OpDescriptor::new("no_such_op"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains("no_such_op"));
}

#[test]
fn undeclared_slot_is_rejected() -> Result<()> {
    let mut registry = OperatorRegistry::new();
    register_op!(registry, cosine_proto()?)?;

    let desc = OpDescriptor::new("cos_sim")
        .with_input("bogus", ["aa"])
        .with_output("output", ["bb"]);
    let err = registry.create(desc).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(err.to_string().contains("bogus"));
    Ok(())
}

#[test]
fn non_duplicable_slot_rejects_multiple_names() -> Result<()> {
    let mut registry = OperatorRegistry::new();
    register_op!(registry, cosine_proto()?)?;

    let desc = OpDescriptor::new("cos_sim")
        .with_input("input", ["a", "b"])
        .with_output("output", ["bb"]);
    assert!(registry.create(desc).is_err());
    Ok(())
}

#[test]
fn reregistration_is_idempotent_for_identical_contents() -> Result<()> {
    let mut registry = OperatorRegistry::new();
    register_op!(registry, cosine_proto()?)?;
    register_op!(registry, cosine_proto()?)?;
    assert_eq!(registry.op_types(), vec!["cos_sim".to_string()]);
    Ok(())
}

#[test]
fn reregistration_with_different_contents_conflicts() -> Result<()> {
    let mut registry = OperatorRegistry::new();
    register_op!(registry, cosine_proto()?)?;

    let different = OpProto::build("cos_sim")
        .input(SlotDef::new("input", ""))
        .output(SlotDef::new("output", ""))
        .finish()?;
    let err = register_op!(registry, different).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(err.to_string().contains("conflict"));
    Ok(())
}

#[test]
fn proto_rejects_duplicate_slot_names() {
    let result = OpProto::build("dup")
        .input(SlotDef::new("X", ""))
        .input(SlotDef::new("X", ""))
        .finish();
    assert!(result.is_err());
}

#[test]
fn duplicable_slot_with_zero_names_is_allowed() -> Result<()> {
    common::register_test_ops()?;
    let registry = op_registry().read().unwrap();
    let desc = OpDescriptor::new("concat")
        .with_output("Out", ["joined"])
        .with_attr("axis", AttrValue::Int(0));
    let op = registry.create(desc)?;
    assert!(op.inputs("X").is_empty());
    Ok(())
}

#[test]
fn duplicable_slot_single_accessor_fails() -> Result<()> {
    common::register_test_ops()?;
    let registry = op_registry().read().unwrap();
    let desc = OpDescriptor::new("concat")
        .with_input("X", ["a", "b"])
        .with_output("Out", ["joined"]);
    let op = registry.create(desc)?;
    let err = op.input("X").unwrap_err();
    assert!(err.to_string().contains("duplicable"));
    Ok(())
}

#[test]
fn debug_strings_are_deterministic() -> Result<()> {
    let desc = OpDescriptor::new("gather")
        .with_input("X", ["x"])
        .with_input("Index", ["idx"])
        .with_output("Out", ["out"])
        .with_attr("beta", AttrValue::Float(2.0))
        .with_attr("alpha", AttrValue::Int(1));
    // Attribute and slot maps are ordered, so the rendering is stable.
    assert_eq!(
        desc.debug_string(),
        "op gather inputs = [Index[idx]; X[x]] outputs = [Out[out]] attrs = {alpha: 1, beta: 2}"
    );

    let proto = OpProto::build("demo")
        .input(SlotDef::new("X", "").duplicable())
        .input(SlotDef::new("Bias", "").dispensable())
        .output(SlotDef::new("Out", ""))
        .attr(AttrDef::new("axis", AttrType::Int))
        .finish()?;
    assert_eq!(
        proto.debug_string(),
        "proto demo inputs = [X*, Bias?] outputs = [Out] attrs = [axis: int]"
    );
    Ok(())
}

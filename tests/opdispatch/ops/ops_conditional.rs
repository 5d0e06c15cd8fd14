use std::sync::Arc;

use anyhow::Result;
use opdispatch::{
    op_registry, AttrValue, ErrorKind, Executor, OpDescriptor, Place, ProgramDesc,
    Scope, TensorValue, Tensor, VarKind,
};

use crate::common;

// Program: the root block runs conditional_block over a sub-block that fills
// a constant and exposes it as `branch_out`.
fn conditional_program() -> opdispatch::Result<Arc<ProgramDesc>> {
    let mut program = ProgramDesc::new();
    let sub = program.add_block(0);
    program.block_mut(sub)?.add_op(
        OpDescriptor::new("fill_constant")
            .with_output("Out", ["branch_out"])
            .with_attr("shape", AttrValue::Longs(vec![2]))
            .with_attr("value", AttrValue::Float(41.0)),
    );
    program.block_mut(0)?.add_op(
        OpDescriptor::new("conditional_block")
            .with_input("X", ["cond"])
            .with_output("Out", ["branch_out"])
            .with_output("Scope", ["branch_scope"])
            .with_attr("block", AttrValue::Block(sub)),
    );
    Ok(Arc::new(program))
}

#[test]
fn conditional_block_runs_when_inputs_are_non_empty() -> Result<()> {
    let program = conditional_program()?;
    let scope = Scope::new();
    scope
        .var("cond")?
        .set_dense(common::f32_tensor(vec![1.0], vec![1])?)?;

    Executor::new(Place::Host).run_program(&program, 0, &scope)?;

    // The sub-block output is exposed in the parent scope.
    let out = scope
        .find_var("branch_out")
        .expect("exposed output")
        .dense()?;
    common::assert_f32_close(&common::as_f32_vec(&out)?, &[41.0, 41.0]);

    // The child scope is recorded in the Scope output of the parent.
    let scopes = scope
        .find_var("branch_scope")
        .expect("scope variable")
        .scopes()?;
    assert_eq!(scopes.len(), 1);
    assert!(scopes[0].find_var_local("branch_out").is_some());
    assert_eq!(
        scope.find_var("branch_scope").unwrap().kind(),
        Some(VarKind::ScopeList)
    );
    Ok(())
}

#[test]
fn conditional_block_skips_when_any_input_is_empty() -> Result<()> {
    let program = conditional_program()?;
    let scope = Scope::new();
    scope
        .var("cond")?
        .set_dense(TensorValue::F32(Tensor::from_vec(vec![], vec![0])?))?;

    Executor::new(Place::Host).run_program(&program, 0, &scope)?;

    // No execution: no branch output, no child scope.
    assert!(scope.find_var("branch_out").is_none());
    let scope_var = scope.find_var("branch_scope");
    assert!(scope_var.is_none() || !scope_var.unwrap().is_initialized());
    assert_eq!(scope.kid_count(), 0);
    Ok(())
}

#[test]
fn conditional_block_without_program_context_fails() -> Result<()> {
    let scope = Scope::new();
    scope
        .var("cond")?
        .set_dense(common::f32_tensor(vec![1.0], vec![1])?)?;

    let registry = op_registry().read().unwrap();
    let desc = OpDescriptor::new("conditional_block")
        .with_input("X", ["cond"])
        .with_output("Out", ["branch_out"])
        .with_output("Scope", ["branch_scope"])
        .with_attr("block", AttrValue::Block(1));
    let op = registry.create(desc)?;
    let err = op.run(&scope, Place::Host).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionNotMet);
    assert!(err.to_string().contains("program"));
    Ok(())
}

#[test]
fn nested_scopes_are_dropped_with_their_parent() -> Result<()> {
    let program = conditional_program()?;
    let scope = Scope::new();
    scope
        .var("cond")?
        .set_dense(common::f32_tensor(vec![1.0], vec![1])?)?;
    Executor::new(Place::Host).run_program(&program, 0, &scope)?;
    assert_eq!(scope.kid_count(), 1);

    scope.drop_kids();
    assert_eq!(scope.kid_count(), 0);
    Ok(())
}

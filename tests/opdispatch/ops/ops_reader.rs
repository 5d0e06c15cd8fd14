use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::Result;
use opdispatch::{
    channel_reader, op_registry, BatchReader, ErrorKind, ManagedReader, OpDescriptor,
    Place, ReaderState, Scope, VarPayload,
};

use crate::common;

#[test]
fn reader_lifecycle_follows_the_state_machine() -> Result<()> {
    let mut reader = ManagedReader::new(Box::new(BatchReader::new(vec![vec![
        common::f32_tensor(vec![1.0], vec![1])?,
    ]])));
    assert_eq!(reader.state(), ReaderState::Uninitialized);

    // ReadNext before Start is illegal.
    let err = reader.read_next().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionNotMet);

    reader.start()?;
    assert_eq!(reader.state(), ReaderState::Running);
    assert!(reader.read_next()?.is_some());
    assert!(reader.read_next()?.is_none());

    reader.shutdown()?;
    assert_eq!(reader.state(), ReaderState::Stopped);

    // Invariant: Shutdown; Shutdown equals a single Shutdown.
    reader.shutdown()?;
    assert_eq!(reader.state(), ReaderState::Stopped);

    // ReadNext after Shutdown is illegal again.
    assert!(reader.read_next().is_err());

    // Start from Stopped rewinds the batch reader.
    reader.start()?;
    assert!(reader.read_next()?.is_some());
    Ok(())
}

#[test]
fn start_is_idempotent_while_running() -> Result<()> {
    let mut reader = ManagedReader::new(Box::new(BatchReader::new(vec![
        vec![common::f32_tensor(vec![1.0], vec![1])?],
        vec![common::f32_tensor(vec![2.0], vec![1])?],
    ])));
    reader.start()?;
    assert!(reader.read_next()?.is_some());
    // A second Start while running must not rewind.
    reader.start()?;
    let batch = reader.read_next()?.expect("second batch");
    common::assert_f32_close(&common::as_f32_vec(&batch[0])?, &[2.0]);
    Ok(())
}

#[test]
fn queue_reader_blocks_until_the_producer_sends() -> Result<()> {
    let (tx, queue) = channel_reader(2);
    let mut reader = ManagedReader::new(Box::new(queue));
    reader.start()?;

    let producer = thread::spawn(move || {
        tx.send(vec![
            opdispatch::TensorValue::zeros(opdispatch::DType::F32, &[2]),
        ])
        .expect("receiver alive");
        // Dropping the sender ends the stream.
    });

    let batch = reader.read_next()?.expect("one queued batch");
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].shape(), &[2]);

    producer.join().expect("producer thread");
    // Disconnected channel reads as exhaustion, not an error.
    assert!(reader.read_next()?.is_none());
    Ok(())
}

#[test]
fn read_next_op_binds_a_batch_into_the_scope() -> Result<()> {
    let scope = Scope::new();
    let mut managed = ManagedReader::new(Box::new(BatchReader::new(vec![vec![
        common::f32_tensor(vec![1.0, 2.0], vec![2])?,
        common::i64_tensor(vec![7], vec![1])?,
    ]])));
    managed.start()?;
    scope
        .var("source")?
        .set_payload(VarPayload::Reader(Arc::new(Mutex::new(managed))))?;

    let registry = op_registry().read().unwrap();
    let desc = OpDescriptor::new("read_next")
        .with_input("Reader", ["source"])
        .with_output("Out", ["features", "labels"]);
    let op = registry.create(desc)?;
    op.run(&scope, Place::Host)?;

    let features = scope.find_var("features").expect("bound feature").dense()?;
    common::assert_f32_close(&common::as_f32_vec(&features)?, &[1.0, 2.0]);
    let labels = scope.find_var("labels").expect("bound label").dense()?;
    assert_eq!(labels.shape(), &[1]);
    Ok(())
}

#[test]
fn read_next_op_propagates_reader_state_errors() -> Result<()> {
    let scope = Scope::new();
    // Never started: the op must surface ReaderNotRunning.
    let managed = ManagedReader::new(Box::new(BatchReader::new(vec![])));
    scope
        .var("cold")?
        .set_payload(VarPayload::Reader(Arc::new(Mutex::new(managed))))?;

    let registry = op_registry().read().unwrap();
    let desc = OpDescriptor::new("read_next")
        .with_input("Reader", ["cold"])
        .with_output("Out", ["batch"]);
    let err = registry.create(desc)?.run(&scope, Place::Host).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionNotMet);
    assert!(err.to_string().contains("not running"));
    Ok(())
}

#[test]
fn read_next_op_rejects_arity_mismatch() -> Result<()> {
    let scope = Scope::new();
    let mut managed = ManagedReader::new(Box::new(BatchReader::new(vec![vec![
        common::f32_tensor(vec![1.0], vec![1])?,
    ]])));
    managed.start()?;
    scope
        .var("source2")?
        .set_payload(VarPayload::Reader(Arc::new(Mutex::new(managed))))?;

    let registry = op_registry().read().unwrap();
    let desc = OpDescriptor::new("read_next")
        .with_input("Reader", ["source2"])
        .with_output("Out", ["a", "b"]);
    let err = registry.create(desc)?.run(&scope, Place::Host).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionNotMet);
    Ok(())
}

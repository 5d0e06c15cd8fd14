//! Operator registry and kernel dispatch core.
//!
//! The crate turns declarative operator descriptions into executable
//! invocations: an [`OpDescriptor`] is validated against a registered
//! [`OpProto`], frozen into an [`OperatorInstance`], and executed by
//! selecting a kernel from the kernel registry keyed on backend, data
//! layout and element type. Variables are bound through a tree-structured
//! [`Scope`] at call time.

mod attrs;
mod desc;
mod error;
mod executor;
mod formatting;
pub mod logging;
mod macros;
mod names;
mod op;
mod ops;
mod program;
mod reader;
mod registry;
mod scope;
mod tensor;

pub use attrs::{AttrAccess, AttrType, AttrValue, AttributeMap};
pub use desc::{
    AttrDef, AttrValidator, OpDescriptor, OpProto, OpProtoBuilder, SlotDef,
};
pub use error::{ErrorKind, OpError, Result};
pub use executor::Executor;
pub use formatting::{format_dims, format_truncated, DebugString};
pub use names::{
    grad_var_name, is_grad_var, is_temp_var, EMPTY_VAR_NAME, FORCE_CPU_ATTR,
    GRAD_VAR_SUFFIX, TEMP_VAR_PREFIX, USE_CUDNN_ATTR, USE_MKLDNN_ATTR,
    ZERO_VAR_SUFFIX,
};
pub use op::{
    DeviceContext, DeviceContextPool, ExecutionContext, InferShapeContext,
    OperatorInstance, RunContext, VarTypeContext,
};
pub use program::{BlockDesc, ProgramDesc, VarDesc};
pub use reader::{channel_reader, BatchReader, ManagedReader, QueueReader, ReaderImpl, ReaderState};
pub use registry::{
    kernel_registry, op_registry, reset_registries_for_tests, GradFn, KernelFn,
    KernelKey, KernelRegistry, KernelSignature, OpInfo, OperatorRegistry,
    ResolvedKernel, RunFn, ShapeFn, VarTypeFn,
};
pub use scope::{Scope, SparseCooTensor, SparseCsrTensor, VarKind, VarPayload, Variable};
pub use tensor::{
    compute_strides, numel, Backend, DType, DataLayout, Place, Tensor, TensorElement,
    TensorValue, C128, C64,
};

mod context;
mod device;
mod infer;
mod operator;

pub use context::ExecutionContext;
pub use device::{DeviceContext, DeviceContextPool};
pub use infer::{InferShapeContext, VarTypeContext};
pub use operator::{OperatorInstance, RunContext};

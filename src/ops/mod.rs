//! Built-in operators.
//!
//! Each module declares its proto, inference functions and kernels, and
//! registers them against the given registries. The set installs once at
//! startup through the registry accessors.

mod concat;
mod conditional_block;
mod elementwise_add;
mod empty;
mod fill_constant;
mod fill_zeros_like;
mod gather;
mod mean;
mod read_next;

use crate::error::Result;
use crate::registry::{KernelRegistry, OperatorRegistry};

pub(crate) fn register_builtins(
    ops: &mut OperatorRegistry,
    kernels: &mut KernelRegistry,
) -> Result<()> {
    fill_constant::register(ops, kernels)?;
    fill_zeros_like::register(ops, kernels)?;
    gather::register(ops, kernels)?;
    elementwise_add::register(ops, kernels)?;
    mean::register(ops, kernels)?;
    concat::register(ops, kernels)?;
    empty::register(ops, kernels)?;
    conditional_block::register(ops, kernels)?;
    read_next::register(ops, kernels)?;
    Ok(())
}

//! Process-wide operator and kernel registries.
//!
//! Both registries are populated during startup (built-in ops install on
//! first access) and are read-mostly afterwards; the locks exist so test
//! harnesses can register dynamically.

mod kernel_registry;
mod op_registry;

pub use kernel_registry::{KernelFn, KernelKey, KernelRegistry, KernelSignature, ResolvedKernel};
pub use op_registry::{GradFn, OpInfo, OperatorRegistry, RunFn, ShapeFn, VarTypeFn};

use std::sync::{OnceLock, RwLock};

use once_cell::sync::Lazy;

static OP_REGISTRY: Lazy<RwLock<OperatorRegistry>> =
    Lazy::new(|| RwLock::new(OperatorRegistry::new()));
static KERNEL_REGISTRY: Lazy<RwLock<KernelRegistry>> =
    Lazy::new(|| RwLock::new(KernelRegistry::new()));
static BUILTINS: OnceLock<()> = OnceLock::new();

fn install_builtins() {
    BUILTINS.get_or_init(|| {
        let mut ops = OP_REGISTRY
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut kernels = KERNEL_REGISTRY
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        crate::ops::register_builtins(&mut ops, &mut kernels)
            .unwrap_or_else(|err| panic!("builtin op registration failed: {}", err));
    });
}

/// The process-wide operator registry.
pub fn op_registry() -> &'static RwLock<OperatorRegistry> {
    install_builtins();
    &OP_REGISTRY
}

/// The process-wide kernel registry.
pub fn kernel_registry() -> &'static RwLock<KernelRegistry> {
    install_builtins();
    &KERNEL_REGISTRY
}

/// Clear both registries and reinstall the built-in ops.
///
/// Test-only entry point; production code treats the registries as
/// read-only after initialization.
#[doc(hidden)]
pub fn reset_registries_for_tests() {
    install_builtins();
    let mut ops = OP_REGISTRY
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let mut kernels = KERNEL_REGISTRY
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    ops.clear();
    kernels.clear();
    crate::ops::register_builtins(&mut ops, &mut kernels)
        .unwrap_or_else(|err| panic!("builtin op registration failed: {}", err));
}

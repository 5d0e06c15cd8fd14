//! Kernel registry and the dispatch algorithm.
//!
//! Per op type, concrete registrations live in a flat map keyed by
//! [`KernelKey`]; the all-dtype and all-layout wildcard tiers are separate
//! smaller maps consulted in order. Selection is deterministic and
//! observable through the dry-run [`KernelRegistry::which`].

use std::collections::{BTreeSet, HashMap};

use crate::error::{OpError, Result};
use crate::formatting::{join_sorted, DebugString};
use crate::op::ExecutionContext;
use crate::tensor::{Backend, DType, DataLayout};

/// A concrete kernel implementation bound to a registration key.
pub type KernelFn = fn(&ExecutionContext<'_>) -> anyhow::Result<()>;

/// The tuple used to select a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KernelKey {
    pub backend: Backend,
    pub layout: DataLayout,
    pub dtype: DType,
}

impl KernelKey {
    pub fn new(backend: Backend, layout: DataLayout, dtype: DType) -> Self {
        KernelKey {
            backend,
            layout,
            dtype,
        }
    }
}

impl std::fmt::Display for KernelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}, {}, {}}}", self.backend, self.layout, self.dtype)
    }
}

impl DebugString for KernelKey {
    fn debug_string(&self) -> String {
        self.to_string()
    }
}

/// The registration a dispatch request resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedKernel {
    Exact(KernelKey),
    AnyDtype {
        backend: Backend,
        layout: DataLayout,
    },
    AnyLayout {
        backend: Backend,
    },
    HostFallback(KernelKey),
}

impl std::fmt::Display for ResolvedKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolvedKernel::Exact(key) => write!(f, "exact {}", key),
            ResolvedKernel::AnyDtype { backend, layout } => {
                write!(f, "{{{}, {}, *}}", backend, layout)
            }
            ResolvedKernel::AnyLayout { backend } => write!(f, "{{{}, *, *}}", backend),
            ResolvedKernel::HostFallback(key) => write!(f, "host fallback {}", key),
        }
    }
}

struct ExactEntry {
    kernel: KernelFn,
    seq: u64,
}

struct AnyDtypeEntry {
    dtypes: BTreeSet<DType>,
    kernel: KernelFn,
    seq: u64,
}

struct AnyLayoutEntry {
    kernel: KernelFn,
}

#[derive(Default)]
struct OpKernels {
    exact: HashMap<KernelKey, ExactEntry>,
    any_dtype: HashMap<(Backend, DataLayout), Vec<AnyDtypeEntry>>,
    any_layout: HashMap<Backend, AnyLayoutEntry>,
}

/// Declared argument surface shared by every kernel of an op type: tensor
/// input slots, tensor output slots, and the attributes kernels read as
/// scalars. Checked once, when declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelSignature {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub attrs: Vec<String>,
}

impl KernelSignature {
    pub fn new<S: Into<String>>(
        inputs: impl IntoIterator<Item = S>,
        outputs: impl IntoIterator<Item = S>,
        attrs: impl IntoIterator<Item = S>,
    ) -> Self {
        KernelSignature {
            inputs: inputs.into_iter().map(Into::into).collect(),
            outputs: outputs.into_iter().map(Into::into).collect(),
            attrs: attrs.into_iter().map(Into::into).collect(),
        }
    }
}

impl std::fmt::Display for KernelSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}) -> ({}) with [{}]",
            self.inputs.join(", "),
            self.outputs.join(", "),
            self.attrs.join(", ")
        )
    }
}

/// Mapping from (op type, kernel key) to kernel, with wildcard tiers.
pub struct KernelRegistry {
    ops: HashMap<String, OpKernels>,
    signatures: HashMap<String, KernelSignature>,
    next_seq: u64,
}

impl KernelRegistry {
    pub fn new() -> Self {
        KernelRegistry {
            ops: HashMap::new(),
            signatures: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Declare the argument surface for an op type's kernels. Names must be
    /// unique within each list; identical re-declaration is a no-op.
    pub fn declare_signature(&mut self, op_type: &str, sig: KernelSignature) -> Result<()> {
        for list in [&sig.inputs, &sig.outputs, &sig.attrs] {
            let mut seen = std::collections::HashSet::new();
            for name in list {
                if !seen.insert(name.as_str()) {
                    return Err(OpError::RegistryConflict {
                        op: op_type.to_string(),
                        reason: format!("duplicate name `{}` in kernel signature", name),
                    });
                }
            }
        }
        if let Some(existing) = self.signatures.get(op_type) {
            if *existing == sig {
                return Ok(());
            }
            return Err(OpError::RegistryConflict {
                op: op_type.to_string(),
                reason: "kernel signature already declared with different contents".to_string(),
            });
        }
        self.signatures.insert(op_type.to_string(), sig);
        Ok(())
    }

    /// The declared argument surface for an op type, when any.
    pub fn signature(&self, op_type: &str) -> Option<&KernelSignature> {
        self.signatures.get(op_type)
    }

    fn bump(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Register a concrete kernel. At most one registration may exist per
    /// `(op type, backend, layout, dtype)`, counting wildcard coverage;
    /// re-registering the identical kernel is a no-op.
    pub fn register(&mut self, op_type: &str, key: KernelKey, kernel: KernelFn) -> Result<()> {
        let seq = self.bump();
        let slot = self.ops.entry(op_type.to_string()).or_default();
        if let Some(existing) = slot.exact.get(&key) {
            if existing.kernel == kernel {
                return Ok(());
            }
            return Err(OpError::RegistryConflict {
                op: op_type.to_string(),
                reason: format!("kernel key {} already registered", key),
            });
        }
        if let Some(entries) = slot.any_dtype.get(&(key.backend, key.layout)) {
            if entries.iter().any(|entry| entry.dtypes.contains(&key.dtype)) {
                return Err(OpError::RegistryConflict {
                    op: op_type.to_string(),
                    reason: format!(
                        "kernel key {} is covered by an all-dtype registration",
                        key
                    ),
                });
            }
        }
        slot.exact.insert(key, ExactEntry { kernel, seq });
        Ok(())
    }

    /// Register an all-dtype wildcard kernel for `(backend, layout)` with a
    /// declared set of compatible dtypes.
    pub fn register_any_dtype(
        &mut self,
        op_type: &str,
        backend: Backend,
        layout: DataLayout,
        dtypes: &[DType],
        kernel: KernelFn,
    ) -> Result<()> {
        if dtypes.is_empty() {
            return Err(OpError::RegistryConflict {
                op: op_type.to_string(),
                reason: "all-dtype registration declares no dtypes".to_string(),
            });
        }
        let seq = self.bump();
        let slot = self.ops.entry(op_type.to_string()).or_default();
        let declared: BTreeSet<DType> = dtypes.iter().copied().collect();
        for dtype in &declared {
            let covered = KernelKey::new(backend, layout, *dtype);
            if slot.exact.contains_key(&covered) {
                return Err(OpError::RegistryConflict {
                    op: op_type.to_string(),
                    reason: format!("kernel key {} already registered", covered),
                });
            }
        }
        let entries = slot.any_dtype.entry((backend, layout)).or_default();
        if entries
            .iter()
            .any(|entry| entry.dtypes == declared && entry.kernel == kernel)
        {
            return Ok(());
        }
        if entries
            .iter()
            .any(|entry| !entry.dtypes.is_disjoint(&declared))
        {
            return Err(OpError::RegistryConflict {
                op: op_type.to_string(),
                reason: format!(
                    "overlapping all-dtype registrations for ({}, {})",
                    backend, layout
                ),
            });
        }
        entries.push(AnyDtypeEntry {
            dtypes: declared,
            kernel,
            seq,
        });
        // Deterministic candidate order: smallest declared dtype first, then
        // registration order.
        entries.sort_by_key(|entry| (entry.dtypes.iter().next().copied(), entry.seq));
        Ok(())
    }

    /// Register an all-layout wildcard kernel for a backend.
    pub fn register_any_layout(
        &mut self,
        op_type: &str,
        backend: Backend,
        kernel: KernelFn,
    ) -> Result<()> {
        self.bump();
        let slot = self.ops.entry(op_type.to_string()).or_default();
        if let Some(existing) = slot.any_layout.get(&backend) {
            if existing.kernel == kernel {
                return Ok(());
            }
            return Err(OpError::RegistryConflict {
                op: op_type.to_string(),
                reason: format!("all-layout kernel for {} already registered", backend),
            });
        }
        slot.any_layout.insert(backend, AnyLayoutEntry { kernel });
        Ok(())
    }

    fn resolve(&self, op_type: &str, requested: &KernelKey) -> Option<(KernelFn, ResolvedKernel)> {
        let slot = self.ops.get(op_type)?;
        if requested.backend.available() {
            if let Some(entry) = slot.exact.get(requested) {
                return Some((entry.kernel, ResolvedKernel::Exact(*requested)));
            }
            if let Some(entries) = slot.any_dtype.get(&(requested.backend, requested.layout)) {
                if let Some(entry) = entries
                    .iter()
                    .find(|entry| entry.dtypes.contains(&requested.dtype))
                {
                    return Some((
                        entry.kernel,
                        ResolvedKernel::AnyDtype {
                            backend: requested.backend,
                            layout: requested.layout,
                        },
                    ));
                }
            }
            if let Some(entry) = slot.any_layout.get(&requested.backend) {
                return Some((
                    entry.kernel,
                    ResolvedKernel::AnyLayout {
                        backend: requested.backend,
                    },
                ));
            }
        }
        if requested.backend != Backend::Cpu {
            let host = KernelKey::new(Backend::Cpu, requested.layout, requested.dtype);
            if let Some(entry) = slot.exact.get(&host) {
                return Some((entry.kernel, ResolvedKernel::HostFallback(host)));
            }
            if let Some(entries) = slot.any_dtype.get(&(Backend::Cpu, requested.layout)) {
                if let Some(entry) = entries
                    .iter()
                    .find(|entry| entry.dtypes.contains(&requested.dtype))
                {
                    return Some((entry.kernel, ResolvedKernel::HostFallback(host)));
                }
            }
        }
        None
    }

    /// Dry-run dispatch: which registration would serve the request.
    pub fn which(&self, op_type: &str, requested: &KernelKey) -> Option<ResolvedKernel> {
        self.resolve(op_type, requested)
            .map(|(_, resolved)| resolved)
    }

    /// Select the best-matching kernel per the tiered fallback rules.
    pub fn select(&self, op_type: &str, requested: &KernelKey) -> Result<(KernelFn, ResolvedKernel)> {
        if let Some(found) = self.resolve(op_type, requested) {
            return Ok(found);
        }
        // A kernel registered for a backend that was not built in, with no
        // fallback, is unavailability; anything else is a plain miss.
        if !requested.backend.available() && self.has_backend_kernels(op_type, requested.backend) {
            return Err(OpError::Unavailable {
                backend: requested.backend.to_string(),
                reason: format!(
                    "backend not built and no host fallback for op {} with {}",
                    op_type, requested
                ),
            });
        }
        Err(OpError::NoKernelForOp {
            op: op_type.to_string(),
            requested: requested.to_string(),
            available: self.registered_keys(op_type).join(", "),
        })
    }

    fn has_backend_kernels(&self, op_type: &str, backend: Backend) -> bool {
        self.ops.get(op_type).is_some_and(|slot| {
            slot.exact.keys().any(|key| key.backend == backend)
                || slot.any_dtype.keys().any(|(b, _)| *b == backend)
                || slot.any_layout.contains_key(&backend)
        })
    }

    /// Deterministic rendering of every registration for an op type.
    pub fn registered_keys(&self, op_type: &str) -> Vec<String> {
        let mut keys = Vec::new();
        if let Some(slot) = self.ops.get(op_type) {
            for key in slot.exact.keys() {
                keys.push(key.to_string());
            }
            for ((backend, layout), entries) in &slot.any_dtype {
                for entry in entries {
                    let dtypes: Vec<String> =
                        entry.dtypes.iter().map(|d| d.to_string()).collect();
                    keys.push(format!(
                        "{{{}, {}, *[{}]}}",
                        backend,
                        layout,
                        dtypes.join("|")
                    ));
                }
            }
            for backend in slot.any_layout.keys() {
                keys.push(format!("{{{}, *, *}}", backend));
            }
        }
        keys.sort();
        keys
    }

    /// Op types with at least one kernel registration, sorted.
    pub fn op_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.ops.keys().cloned().collect();
        types.sort();
        types
    }

    pub fn clear(&mut self) {
        self.ops.clear();
        self.signatures.clear();
        self.next_seq = 0;
    }
}

impl Default for KernelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DebugString for KernelRegistry {
    fn debug_string(&self) -> String {
        let mut parts = Vec::new();
        for op_type in self.op_types() {
            parts.push(format!(
                "{}: [{}]",
                op_type,
                self.registered_keys(&op_type).join(", ")
            ));
        }
        format!("kernel_registry{{{}}}", join_sorted(parts))
    }
}

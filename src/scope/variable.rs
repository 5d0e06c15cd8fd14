//! Variables: named cells holding at most one typed payload.

use std::sync::{Arc, Mutex, RwLock};

use crate::error::{OpError, Result};
use crate::formatting::{format_dims, DebugString};
use crate::reader::ManagedReader;
use crate::tensor::{DType, DataLayout, Tensor, TensorValue};

use super::Scope;

/// Payload tag. Set at most once per variable lifetime; a second set with a
/// different tag fails `VariableRetype`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarKind {
    Dense,
    SparseCoo,
    SparseCsr,
    Reader,
    ScopeList,
}

impl VarKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VarKind::Dense => "dense",
            VarKind::SparseCoo => "sparse_coo",
            VarKind::SparseCsr => "sparse_csr",
            VarKind::Reader => "reader",
            VarKind::ScopeList => "scope_list",
        }
    }
}

impl std::fmt::Display for VarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sparse tensor in coordinate format.
#[derive(Debug, Clone)]
pub struct SparseCooTensor {
    pub indices: Tensor<i64>,
    pub values: TensorValue,
    pub dense_shape: Vec<usize>,
}

/// Sparse tensor in compressed-row format.
#[derive(Debug, Clone)]
pub struct SparseCsrTensor {
    pub crows: Tensor<i64>,
    pub cols: Tensor<i64>,
    pub values: TensorValue,
    pub dense_shape: Vec<usize>,
}

/// The typed payload a variable can hold.
pub enum VarPayload {
    Dense(TensorValue),
    SparseCoo(SparseCooTensor),
    SparseCsr(SparseCsrTensor),
    Reader(Arc<Mutex<ManagedReader>>),
    Scopes(Vec<Arc<Scope>>),
}

impl VarPayload {
    pub fn kind(&self) -> VarKind {
        match self {
            VarPayload::Dense(_) => VarKind::Dense,
            VarPayload::SparseCoo(_) => VarKind::SparseCoo,
            VarPayload::SparseCsr(_) => VarKind::SparseCsr,
            VarPayload::Reader(_) => VarKind::Reader,
            VarPayload::Scopes(_) => VarKind::ScopeList,
        }
    }
}

struct VarState {
    kind: Option<VarKind>,
    dtype: Option<DType>,
    shape: Option<Vec<usize>>,
    layout: DataLayout,
    payload: Option<VarPayload>,
}

/// A named cell in a scope. Metadata (kind, dtype, shape) can be populated
/// by the inference pass ahead of the payload; the payload tag is frozen on
/// first set.
pub struct Variable {
    name: String,
    state: RwLock<VarState>,
}

impl std::fmt::Debug for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Variable").field("name", &self.name).finish()
    }
}

impl Variable {
    pub(crate) fn new(name: &str) -> Self {
        Variable {
            name: name.to_string(),
            state: RwLock::new(VarState {
                kind: None,
                dtype: None,
                shape: None,
                layout: DataLayout::RowMajor,
                payload: None,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The payload tag, from the payload or from inference metadata.
    pub fn kind(&self) -> Option<VarKind> {
        let state = self
            .state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state
            .payload
            .as_ref()
            .map(VarPayload::kind)
            .or(state.kind)
    }

    pub fn is_initialized(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .payload
            .is_some()
    }

    /// Set the payload, enforcing the frozen-tag rule.
    pub fn set_payload(&self, payload: VarPayload) -> Result<()> {
        let mut state = self
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let incoming = payload.kind();
        let frozen = state.payload.as_ref().map(VarPayload::kind).or(state.kind);
        if let Some(existing) = frozen {
            if existing != incoming {
                return Err(OpError::VariableRetype {
                    name: self.name.clone(),
                    requested: incoming.as_str(),
                    actual: existing.as_str(),
                });
            }
        }
        if let VarPayload::Dense(value) = &payload {
            state.dtype = Some(value.dtype());
            state.shape = Some(value.shape().to_vec());
        }
        state.kind = Some(incoming);
        state.payload = Some(payload);
        Ok(())
    }

    pub fn set_dense(&self, value: TensorValue) -> Result<()> {
        self.set_payload(VarPayload::Dense(value))
    }

    /// Clone out the dense payload.
    pub fn dense(&self) -> Result<TensorValue> {
        let state = self
            .state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match &state.payload {
            Some(VarPayload::Dense(value)) => Ok(value.clone()),
            Some(other) => Err(OpError::precondition(format!(
                "variable `{}` holds {}, not a dense tensor",
                self.name,
                other.kind()
            ))),
            None => Err(OpError::precondition(format!(
                "variable `{}` is not initialized",
                self.name
            ))),
        }
    }

    pub fn reader(&self) -> Result<Arc<Mutex<ManagedReader>>> {
        let state = self
            .state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match &state.payload {
            Some(VarPayload::Reader(reader)) => Ok(Arc::clone(reader)),
            _ => Err(OpError::precondition(format!(
                "variable `{}` holds no reader",
                self.name
            ))),
        }
    }

    pub fn scopes(&self) -> Result<Vec<Arc<Scope>>> {
        let state = self
            .state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match &state.payload {
            Some(VarPayload::Scopes(scopes)) => Ok(scopes.clone()),
            _ => Err(OpError::precondition(format!(
                "variable `{}` holds no scope list",
                self.name
            ))),
        }
    }

    pub(crate) fn set_meta_kind(&self, kind: VarKind) {
        let mut state = self
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.kind = Some(kind);
    }

    pub fn set_meta_dtype(&self, dtype: DType) {
        let mut state = self
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.dtype = Some(dtype);
    }

    pub fn set_meta_shape(&self, shape: Vec<usize>) {
        let mut state = self
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.shape = Some(shape);
    }

    pub fn set_meta_layout(&self, layout: DataLayout) {
        let mut state = self
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.layout = layout;
    }

    /// Element type, from the payload or inference metadata.
    pub fn dtype(&self) -> Option<DType> {
        let state = self
            .state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match &state.payload {
            Some(VarPayload::Dense(value)) => Some(value.dtype()),
            Some(VarPayload::SparseCoo(coo)) => Some(coo.values.dtype()),
            Some(VarPayload::SparseCsr(csr)) => Some(csr.values.dtype()),
            _ => state.dtype,
        }
    }

    /// Shape, from the payload or inference metadata.
    pub fn shape(&self) -> Option<Vec<usize>> {
        let state = self
            .state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match &state.payload {
            Some(VarPayload::Dense(value)) => Some(value.shape().to_vec()),
            Some(VarPayload::SparseCoo(coo)) => Some(coo.dense_shape.clone()),
            Some(VarPayload::SparseCsr(csr)) => Some(csr.dense_shape.clone()),
            _ => state.shape.clone(),
        }
    }

    pub fn layout(&self) -> DataLayout {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .layout
    }
}

impl DebugString for Variable {
    fn debug_string(&self) -> String {
        let kind = match self.kind() {
            Some(kind) => kind.as_str().to_string(),
            None => "untyped".to_string(),
        };
        let dtype = self
            .dtype()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "?".to_string());
        let shape = self
            .shape()
            .map(|s| format_dims(&s))
            .unwrap_or_else(|| "[?]".to_string());
        let init = if self.is_initialized() { "" } else { ", uninit" };
        format!("{}: {}<{} {}{}>", self.name, kind, dtype, shape, init)
    }
}

//! Closed error surface of the dispatch core.
//!
//! Every failure maps to one of the six [`ErrorKind`]s; the variants carry
//! the op type and the slot or attribute name where one applies, plus a
//! single-line cause. Kernel-internal failures stay `anyhow` and are wrapped
//! as [`OpError::External`] at the dispatch boundary.

use thiserror::Error;

/// Classification of every error the core can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    PreconditionNotMet,
    Unavailable,
    External,
    Unimplemented,
}

#[derive(Debug, Error)]
pub enum OpError {
    #[error("op {op}: {reason}")]
    Validation { op: String, reason: String },

    #[error("op {op}: attribute `{attr}`: {reason}")]
    AttrCheck {
        op: String,
        attr: String,
        reason: String,
    },

    #[error("registry conflict for op {op}: {reason}")]
    RegistryConflict { op: String, reason: String },

    #[error("op {op}: slot `{slot}` is duplicable, use the indexed accessor")]
    DuplicableSlotNeedsIndex { op: String, slot: String },

    #[error("cannot create a variable named by the empty sentinel")]
    EmptyVarName,

    #[error("unknown op type `{op}`")]
    UnknownOp { op: String },

    #[error("op {op}: input `{slot}`: variable `{name}` not found in scope")]
    InputNotFound {
        op: String,
        slot: String,
        name: String,
    },

    #[error("variable `{name}` not found")]
    VarNotFound { name: String },

    #[error("op {op}: no kernel for {requested}; registered: [{available}]")]
    NoKernelForOp {
        op: String,
        requested: String,
        available: String,
    },

    #[error("{reason}")]
    PreconditionNotMet { reason: String },

    #[error("variable `{name}`: cannot hold {requested}, already holds {actual}")]
    VariableRetype {
        name: String,
        requested: &'static str,
        actual: &'static str,
    },

    #[error("variable `{name}` was already created with a different payload in this frame")]
    NameCollisionInCurrentFrame { name: String },

    #[error("reader is not running")]
    ReaderNotRunning,

    #[error("backend {backend} is unavailable: {reason}")]
    Unavailable { backend: String, reason: String },

    #[error("op {op}: kernel failed: {source}")]
    External {
        op: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("op {op}: {what} is not implemented")]
    Unimplemented { op: String, what: String },
}

impl OpError {
    /// Map the variant to its closed classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OpError::Validation { .. }
            | OpError::AttrCheck { .. }
            | OpError::RegistryConflict { .. }
            | OpError::DuplicableSlotNeedsIndex { .. }
            | OpError::EmptyVarName => ErrorKind::InvalidArgument,
            OpError::UnknownOp { .. }
            | OpError::InputNotFound { .. }
            | OpError::VarNotFound { .. }
            | OpError::NoKernelForOp { .. } => ErrorKind::NotFound,
            OpError::PreconditionNotMet { .. }
            | OpError::VariableRetype { .. }
            | OpError::NameCollisionInCurrentFrame { .. }
            | OpError::ReaderNotRunning => ErrorKind::PreconditionNotMet,
            OpError::Unavailable { .. } => ErrorKind::Unavailable,
            OpError::External { .. } => ErrorKind::External,
            OpError::Unimplemented { .. } => ErrorKind::Unimplemented,
        }
    }

    pub fn precondition(reason: impl Into<String>) -> Self {
        OpError::PreconditionNotMet {
            reason: reason.into(),
        }
    }

    pub fn validation(op: impl Into<String>, reason: impl Into<String>) -> Self {
        OpError::Validation {
            op: op.into(),
            reason: reason.into(),
        }
    }

    pub fn external(op: impl Into<String>, source: anyhow::Error) -> Self {
        OpError::External {
            op: op.into(),
            source,
        }
    }
}

pub type Result<T, E = OpError> = std::result::Result<T, E>;

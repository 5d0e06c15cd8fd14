//! Placement descriptors: where computation runs and which logical backend
//! serves it.

use serde::{Deserialize, Serialize};

/// Where a computation runs. `Device` carries the accelerator index; the
/// host has no index by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Place {
    Host,
    Device(usize),
}

impl Place {
    pub fn is_host(self) -> bool {
        matches!(self, Place::Host)
    }

    pub fn device_index(self) -> usize {
        match self {
            Place::Host => 0,
            Place::Device(idx) => idx,
        }
    }

    /// Logical backend serving this place.
    pub fn backend(self) -> Backend {
        match self {
            Place::Host => Backend::Cpu,
            Place::Device(_) => Backend::Cuda,
        }
    }
}

impl std::fmt::Display for Place {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Place::Host => write!(f, "host"),
            Place::Device(idx) => write!(f, "device({})", idx),
        }
    }
}

/// Closed set of logical kernel backends.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    Cpu,
    Cuda,
    Xpu,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Cpu => "cpu",
            Backend::Cuda => "cuda",
            Backend::Xpu => "xpu",
        }
    }

    /// Whether the backend was built into this binary. Kernels registered
    /// for unavailable backends are skipped during dispatch.
    pub fn available(self) -> bool {
        match self {
            Backend::Cpu => true,
            Backend::Cuda => cfg!(feature = "cuda"),
            Backend::Xpu => cfg!(feature = "xpu"),
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

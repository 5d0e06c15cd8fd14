use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// In-memory arrangement tag for a tensor. Each kernel registration pins one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DataLayout {
    RowMajor,
    ChannelsLast,
    PackedTile,
    SparseCoo,
    SparseCsr,
}

impl DataLayout {
    pub fn as_str(self) -> &'static str {
        match self {
            DataLayout::RowMajor => "row_major",
            DataLayout::ChannelsLast => "channels_last",
            DataLayout::PackedTile => "packed_tile",
            DataLayout::SparseCoo => "sparse_coo",
            DataLayout::SparseCsr => "sparse_csr",
        }
    }
}

impl Default for DataLayout {
    fn default() -> Self {
        DataLayout::RowMajor
    }
}

impl std::fmt::Display for DataLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DataLayout {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "row_major" => Ok(DataLayout::RowMajor),
            "channels_last" => Ok(DataLayout::ChannelsLast),
            "packed_tile" => Ok(DataLayout::PackedTile),
            "sparse_coo" => Ok(DataLayout::SparseCoo),
            "sparse_csr" => Ok(DataLayout::SparseCsr),
            _ => Err(anyhow!("unknown layout {}", value)),
        }
    }
}

//! Serialized program model: blocks of operator descriptors plus declared
//! variables. The wire format is whatever the host ecosystem dictates; the
//! core only guarantees that descriptors and scopes can be reconstructed,
//! which the JSON round-trip here provides.

use anyhow::{Context, Result as AnyResult};
use serde::{Deserialize, Serialize};

use crate::desc::OpDescriptor;
use crate::error::{OpError, Result};
use crate::formatting::DebugString;
use crate::scope::VarKind;
use crate::tensor::DType;

/// Declared variable inside a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDesc {
    pub name: String,
    pub kind: VarKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtype: Option<DType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<usize>>,
}

impl VarDesc {
    pub fn dense(name: impl Into<String>) -> Self {
        VarDesc {
            name: name.into(),
            kind: VarKind::Dense,
            dtype: None,
            shape: None,
        }
    }

    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.dtype = Some(dtype);
        self
    }

    pub fn with_shape(mut self, shape: Vec<usize>) -> Self {
        self.shape = Some(shape);
        self
    }
}

/// One block: a list of descriptors plus declared variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDesc {
    pub idx: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_idx: Option<usize>,
    #[serde(default)]
    pub vars: Vec<VarDesc>,
    #[serde(default)]
    pub ops: Vec<OpDescriptor>,
}

impl BlockDesc {
    pub fn add_var(&mut self, var: VarDesc) -> &mut Self {
        self.vars.push(var);
        self
    }

    pub fn add_op(&mut self, op: OpDescriptor) -> &mut Self {
        self.ops.push(op);
        self
    }
}

/// A program: blocks indexed by position, block 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramDesc {
    pub blocks: Vec<BlockDesc>,
}

impl ProgramDesc {
    /// A program with an empty root block.
    pub fn new() -> Self {
        ProgramDesc {
            blocks: vec![BlockDesc {
                idx: 0,
                parent_idx: None,
                vars: Vec::new(),
                ops: Vec::new(),
            }],
        }
    }

    /// Append a block under `parent`, returning its index.
    pub fn add_block(&mut self, parent: usize) -> usize {
        let idx = self.blocks.len();
        self.blocks.push(BlockDesc {
            idx,
            parent_idx: Some(parent),
            vars: Vec::new(),
            ops: Vec::new(),
        });
        idx
    }

    pub fn block(&self, idx: usize) -> Result<&BlockDesc> {
        self.blocks.get(idx).ok_or_else(|| {
            OpError::precondition(format!("program has no block {}", idx))
        })
    }

    pub fn block_mut(&mut self, idx: usize) -> Result<&mut BlockDesc> {
        self.blocks.get_mut(idx).ok_or_else(|| {
            OpError::precondition(format!("program has no block {}", idx))
        })
    }

    pub fn to_json(&self) -> AnyResult<String> {
        serde_json::to_string_pretty(self).context("serializing program")
    }

    pub fn from_json(text: &str) -> AnyResult<Self> {
        serde_json::from_str(text).context("deserializing program")
    }
}

impl Default for ProgramDesc {
    fn default() -> Self {
        Self::new()
    }
}

impl DebugString for ProgramDesc {
    fn debug_string(&self) -> String {
        let blocks: Vec<String> = self
            .blocks
            .iter()
            .map(|block| {
                let ops: Vec<String> = block
                    .ops
                    .iter()
                    .map(|op| op.op_type.clone())
                    .collect();
                format!("block {}: [{}]", block.idx, ops.join(", "))
            })
            .collect();
        format!("program{{{}}}", blocks.join("; "))
    }
}

//! Dense tensor container.
//!
//! `Tensor<T>` owns flat row-major storage plus shape/stride metadata. It is
//! deliberately narrow: the dispatch core only needs to carry payloads
//! between variables and kernels, not to provide tensor algebra.

use anyhow::{anyhow, Result};

use super::shape::{compute_strides, numel, offset_for};

/// Owned tensor with shape and stride metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T> {
    data: Vec<T>,
    shape: Vec<usize>,
    strides: Vec<usize>,
}

impl<T> Tensor<T> {
    /// Build a tensor from a flat data vector and an explicit shape.
    pub fn from_vec(data: Vec<T>, shape: Vec<usize>) -> Result<Self> {
        let expected = numel(&shape);
        if expected != data.len() {
            return Err(anyhow!(
                "tensor shape {:?} expects {} values, got {}",
                shape,
                expected,
                data.len()
            ));
        }
        let strides = compute_strides(&shape);
        Ok(Self {
            data,
            shape,
            strides,
        })
    }

    /// Create a rank-0 tensor from a single value.
    pub fn from_scalar(value: T) -> Self {
        Self {
            data: vec![value],
            shape: Vec::new(),
            strides: Vec::new(),
        }
    }

    /// Return the tensor shape.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Return the row-major strides.
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Return the logical element count.
    pub fn numel(&self) -> usize {
        numel(&self.shape)
    }

    pub fn is_empty(&self) -> bool {
        self.numel() == 0
    }

    /// Flat read-only access to the storage.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Flat mutable access to the storage.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Access a value by multidimensional indices.
    pub fn at(&self, indices: &[usize]) -> Result<&T> {
        let offset = offset_for(&self.shape, &self.strides, indices)
            .ok_or_else(|| anyhow!("index {:?} out of range for shape {:?}", indices, self.shape))?;
        Ok(&self.data[offset])
    }

    /// Consume the tensor, returning its flat storage.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T: Clone> Tensor<T> {
    /// Clone the storage into a vector.
    pub fn to_vec(&self) -> Vec<T> {
        self.data.clone()
    }
}

impl<T: Default + Clone> Tensor<T> {
    /// Zero-filled (default-filled) tensor of the given shape.
    pub fn zeros(shape: Vec<usize>) -> Self {
        let strides = compute_strides(&shape);
        Self {
            data: vec![T::default(); numel(&shape)],
            shape,
            strides,
        }
    }
}

impl<T: Clone> Tensor<T> {
    /// Tensor filled with copies of `value`.
    pub fn splat(value: T, shape: Vec<usize>) -> Self {
        let strides = compute_strides(&shape);
        Self {
            data: vec![value; numel(&shape)],
            shape,
            strides,
        }
    }
}

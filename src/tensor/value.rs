//! Type-erased tensor payloads.
//!
//! `TensorValue` pairs each [`DType`] with a typed [`Tensor`]; the
//! [`TensorElement`] trait converts between the erased and typed views at
//! kernel boundaries.

use anyhow::{anyhow, Result};
use half::{bf16, f16};

use crate::formatting::{format_dims, DebugString};

use super::scalar::{C128, C64};
use super::{DType, Tensor};

/// Element type that can be converted to/from [`TensorValue`].
pub trait TensorElement: Sized + Clone {
    const DTYPE: DType;

    /// Attempt to extract a typed tensor from an erased value.
    fn from_value(value: &TensorValue) -> Option<Tensor<Self>>;
    /// Wrap a typed tensor into an erased value.
    fn into_value(tensor: Tensor<Self>) -> TensorValue;
}

/// A dense tensor of any supported element type.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorValue {
    Bool(Tensor<bool>),
    U8(Tensor<u8>),
    I8(Tensor<i8>),
    I32(Tensor<i32>),
    I64(Tensor<i64>),
    F16(Tensor<f16>),
    BF16(Tensor<bf16>),
    F32(Tensor<f32>),
    F64(Tensor<f64>),
    C64(Tensor<C64>),
    C128(Tensor<C128>),
}

macro_rules! impl_tensor_element {
    ($($ty:ty => $variant:ident / $dtype:expr),+ $(,)?) => {
        $(impl TensorElement for $ty {
            const DTYPE: DType = $dtype;

            fn from_value(value: &TensorValue) -> Option<Tensor<Self>> {
                match value {
                    TensorValue::$variant(tensor) => Some(tensor.clone()),
                    _ => None,
                }
            }

            fn into_value(tensor: Tensor<Self>) -> TensorValue {
                TensorValue::$variant(tensor)
            }
        })+
    };
}

impl_tensor_element!(
    bool => Bool / DType::Bool,
    u8 => U8 / DType::U8,
    i8 => I8 / DType::I8,
    i32 => I32 / DType::I32,
    i64 => I64 / DType::I64,
    f16 => F16 / DType::F16,
    bf16 => BF16 / DType::BF16,
    f32 => F32 / DType::F32,
    f64 => F64 / DType::F64,
    C64 => C64 / DType::C64,
    C128 => C128 / DType::C128,
);

macro_rules! for_each_variant {
    ($value:expr, $tensor:ident => $body:expr) => {
        match $value {
            TensorValue::Bool($tensor) => $body,
            TensorValue::U8($tensor) => $body,
            TensorValue::I8($tensor) => $body,
            TensorValue::I32($tensor) => $body,
            TensorValue::I64($tensor) => $body,
            TensorValue::F16($tensor) => $body,
            TensorValue::BF16($tensor) => $body,
            TensorValue::F32($tensor) => $body,
            TensorValue::F64($tensor) => $body,
            TensorValue::C64($tensor) => $body,
            TensorValue::C128($tensor) => $body,
        }
    };
}

impl TensorValue {
    /// Element type tag of the payload.
    pub fn dtype(&self) -> DType {
        match self {
            TensorValue::Bool(_) => DType::Bool,
            TensorValue::U8(_) => DType::U8,
            TensorValue::I8(_) => DType::I8,
            TensorValue::I32(_) => DType::I32,
            TensorValue::I64(_) => DType::I64,
            TensorValue::F16(_) => DType::F16,
            TensorValue::BF16(_) => DType::BF16,
            TensorValue::F32(_) => DType::F32,
            TensorValue::F64(_) => DType::F64,
            TensorValue::C64(_) => DType::C64,
            TensorValue::C128(_) => DType::C128,
        }
    }

    pub fn shape(&self) -> &[usize] {
        for_each_variant!(self, tensor => tensor.shape())
    }

    pub fn numel(&self) -> usize {
        for_each_variant!(self, tensor => tensor.numel())
    }

    /// Zero-filled value of the given dtype and shape.
    pub fn zeros(dtype: DType, shape: &[usize]) -> TensorValue {
        let shape = shape.to_vec();
        match dtype {
            DType::Bool => TensorValue::Bool(Tensor::zeros(shape)),
            DType::U8 => TensorValue::U8(Tensor::zeros(shape)),
            DType::I8 => TensorValue::I8(Tensor::zeros(shape)),
            DType::I32 => TensorValue::I32(Tensor::zeros(shape)),
            DType::I64 => TensorValue::I64(Tensor::zeros(shape)),
            DType::F16 => TensorValue::F16(Tensor::zeros(shape)),
            DType::BF16 => TensorValue::BF16(Tensor::zeros(shape)),
            DType::F32 => TensorValue::F32(Tensor::zeros(shape)),
            DType::F64 => TensorValue::F64(Tensor::zeros(shape)),
            DType::C64 => TensorValue::C64(Tensor::zeros(shape)),
            DType::C128 => TensorValue::C128(Tensor::zeros(shape)),
        }
    }

    /// Value of the given dtype and shape filled with `value`, converted to
    /// the element type. Bool payloads treat non-zero as `true`.
    pub fn splat(dtype: DType, shape: &[usize], value: f64) -> Result<TensorValue> {
        let shape = shape.to_vec();
        let out = match dtype {
            DType::Bool => TensorValue::Bool(Tensor::splat(value != 0.0, shape)),
            DType::U8 => TensorValue::U8(Tensor::splat(value as u8, shape)),
            DType::I8 => TensorValue::I8(Tensor::splat(value as i8, shape)),
            DType::I32 => TensorValue::I32(Tensor::splat(value as i32, shape)),
            DType::I64 => TensorValue::I64(Tensor::splat(value as i64, shape)),
            DType::F16 => TensorValue::F16(Tensor::splat(f16::from_f64(value), shape)),
            DType::BF16 => TensorValue::BF16(Tensor::splat(bf16::from_f64(value), shape)),
            DType::F32 => TensorValue::F32(Tensor::splat(value as f32, shape)),
            DType::F64 => TensorValue::F64(Tensor::splat(value, shape)),
            DType::C64 => TensorValue::C64(Tensor::splat(C64::new(value as f32, 0.0), shape)),
            DType::C128 => TensorValue::C128(Tensor::splat(C128::new(value, 0.0), shape)),
        };
        Ok(out)
    }

    /// Extract a typed tensor, failing with a dtype mismatch.
    pub fn typed<T: TensorElement>(&self) -> Result<Tensor<T>> {
        T::from_value(self).ok_or_else(|| {
            anyhow!(
                "dtype mismatch: payload is {}, requested {}",
                self.dtype(),
                T::DTYPE
            )
        })
    }
}

impl DebugString for TensorValue {
    fn debug_string(&self) -> String {
        format!("tensor<{} {}>", self.dtype(), format_dims(self.shape()))
    }
}

mod dtype;
mod layout;
mod place;
mod scalar;
mod shape;
#[allow(clippy::module_inception)]
mod tensor;
mod value;

pub use dtype::DType;
pub use layout::DataLayout;
pub use place::{Backend, Place};
pub use scalar::{C128, C64};
#[allow(unused_imports)]
pub use shape::{compute_strides, numel};
pub use tensor::Tensor;
pub use value::{TensorElement, TensorValue};

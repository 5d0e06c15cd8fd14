/// Logical element count of a shape. The empty shape is a scalar.
pub fn numel(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Row-major strides for a shape.
pub fn compute_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

/// Flat offset for multidimensional indices.
pub fn offset_for(shape: &[usize], strides: &[usize], indices: &[usize]) -> Option<usize> {
    if indices.len() != shape.len() {
        return None;
    }
    let mut offset = 0;
    for ((&idx, &dim), &stride) in indices.iter().zip(shape).zip(strides) {
        if idx >= dim {
            return None;
        }
        offset += idx * stride;
    }
    Some(offset)
}

//! Deterministic rendering helpers for the debug surface.
//!
//! Every core component renders through [`DebugString`]; golden-file tests
//! rely on the output being stable across runs, so maps are iterated in
//! sorted order and values are truncated at a fixed width.

/// Deterministic single-shot rendering of a component's structure.
pub trait DebugString {
    fn debug_string(&self) -> String;
}

/// Render dims as `[2, 3]`.
pub fn format_dims(dims: &[usize]) -> String {
    let parts: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

/// Join items with `, ` after sorting; keeps map-backed output stable.
pub fn join_sorted<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut parts: Vec<String> = items.into_iter().map(Into::into).collect();
    parts.sort();
    parts.join(", ")
}

/// Truncate a rendered value list to at most `limit` entries.
pub fn format_truncated<T: std::fmt::Display>(values: &[T], limit: usize) -> String {
    if values.len() <= limit {
        let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        return format!("[{}]", parts.join(", "));
    }
    let parts: Vec<String> = values[..limit].iter().map(|v| v.to_string()).collect();
    format!("[{}, .. {} total]", parts.join(", "), values.len())
}

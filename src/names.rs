//! Reserved variable-name markers and kernel-hint attribute keys.

/// Sentinel meaning "no variable bound to this slot position".
pub const EMPTY_VAR_NAME: &str = "@EMPTY@";

/// Prefix marking temporaries created by the framework.
pub const TEMP_VAR_PREFIX: &str = "@TEMP@";

/// Suffix appended to a variable name to form its gradient companion.
pub const GRAD_VAR_SUFFIX: &str = "@GRAD";

/// Suffix for zero-initialized companion variables.
pub const ZERO_VAR_SUFFIX: &str = "@ZERO";

/// Attribute key forcing kernel selection onto the host CPU backend.
pub const FORCE_CPU_ATTR: &str = "force_cpu";

/// Attribute key hinting a cuDNN kernel preference.
pub const USE_CUDNN_ATTR: &str = "use_cudnn";

/// Attribute key hinting a MKL-DNN kernel preference.
pub const USE_MKLDNN_ATTR: &str = "use_mkldnn";

/// Form the gradient variable name for `name`.
pub fn grad_var_name(name: &str) -> String {
    format!("{}{}", name, GRAD_VAR_SUFFIX)
}

/// Whether `name` denotes a gradient variable.
pub fn is_grad_var(name: &str) -> bool {
    name.ends_with(GRAD_VAR_SUFFIX)
}

/// Whether `name` denotes a framework temporary.
pub fn is_temp_var(name: &str) -> bool {
    name.starts_with(TEMP_VAR_PREFIX)
}

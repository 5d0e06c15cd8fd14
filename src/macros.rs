/// Register an op type with its proto and optional function-table entries.
///
/// ```no_run
/// # use opdispatch::{op_registry, OpProto, SlotDef};
/// # use opdispatch::register_op;
/// # fn shape(_: &mut opdispatch::InferShapeContext<'_>) -> opdispatch::Result<()> { Ok(()) }
/// # fn main() -> opdispatch::Result<()> {
/// let mut ops = op_registry().write().unwrap();
/// let proto = OpProto::build("copy")
///     .input(SlotDef::new("X", ""))
///     .output(SlotDef::new("Out", ""))
///     .finish()?;
/// register_op!(ops, proto, shape = shape)?;
/// # Ok(()) }
/// ```
#[macro_export]
macro_rules! register_op {
    ($registry:expr, $proto:expr $(, $field:ident = $value:expr)* $(,)?) => {{
        #[allow(unused_mut)]
        let mut info = $crate::OpInfo::new($proto);
        $( info = $crate::register_op!(@set info, $field, $value); )*
        $registry.register(info)
    }};
    (@set $info:expr, run, $value:expr) => { $info.with_run($value) };
    (@set $info:expr, grad, $value:expr) => { $info.with_grad($value) };
    (@set $info:expr, var_type, $value:expr) => { $info.with_var_type($value) };
    (@set $info:expr, shape, $value:expr) => { $info.with_shape($value) };
}

/// Register a concrete kernel under `(op type, backend, layout, dtype)`.
#[macro_export]
macro_rules! register_op_kernel {
    ($registry:expr, $op:expr, $backend:ident, $layout:ident, $dtype:ident, $kernel:expr) => {
        $registry.register(
            $op,
            $crate::KernelKey::new(
                $crate::Backend::$backend,
                $crate::DataLayout::$layout,
                $crate::DType::$dtype,
            ),
            $kernel,
        )
    };
}

/// Insert dense tensors into a scope by identifier.
#[macro_export]
macro_rules! scope_insert {
    ($scope:expr, { $($name:ident : $value:expr),* $(,)? }) => {{
        $( $scope.var(stringify!($name))?.set_dense($value)?; )*
    }};
}

/// Fetch dense tensors from a scope by identifier.
#[macro_export]
macro_rules! scope_fetch {
    ($scope:expr, $name:ident) => {
        $scope
            .find_var(stringify!($name))
            .ok_or_else(|| $crate::OpError::VarNotFound {
                name: stringify!($name).to_string(),
            })?
            .dense()?
    };
}

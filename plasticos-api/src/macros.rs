//! Utility macros for reducing boilerplate.

/// Implements `FromRef<AppState>` for one of its fields, so Axum handlers
/// can take e.g. `State(store): State<Arc<dyn HypergraphStore>>` directly
/// instead of threading the whole `AppState` through every signature.
///
/// # Example
/// ```ignore
/// impl_from_ref!(Arc<dyn HypergraphStore>, store);
/// ```
#[macro_export]
macro_rules! impl_from_ref {
    ($type:ty, $field:ident) => {
        impl axum::extract::FromRef<$crate::state::AppState> for $type {
            fn from_ref(state: &$crate::state::AppState) -> Self {
                state.$field.clone()
            }
        }
    };
}

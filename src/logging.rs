/// Conditional logging module for development builds
///
/// The `log!` macro provides informational logging that is compiled out in
/// production (release) builds by default. Warnings and errors should keep
/// using `leptos::logging::warn!` and `leptos::logging::error!` directly so
/// they survive release builds.
///
/// Output goes through `leptos::logging`, which writes to the browser console
/// on wasm and to stdout on native targets (unit tests).
///
/// Logging is enabled when either:
/// - Building in debug mode (`cfg(debug_assertions)`)
/// - The `console_logging` feature is explicitly enabled
///
/// # Examples
///
/// ```rust,ignore
/// use crate::logging::log;
///
/// log!("Entering mode {}", mode);
/// log!("Draft has {} vertices", draft.len());
/// ```
#[macro_export]
macro_rules! log {
    ($($arg:expr),+ $(,)?) => {
        #[cfg(any(debug_assertions, feature = "console_logging"))]
        {
            leptos::logging::log!($($arg),+);
        }
    };
}

pub use log;

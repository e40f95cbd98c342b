//! Crate-local logging macros.
//!
//! Every event is emitted under the [`TARGET`] target so the embedding service can filter the
//! indexer's output without any global logger state. With the `tracing` feature disabled the
//! macros only borrow their field values and compile to nothing.

/// `tracing` target used by every log line of this crate.
#[allow(dead_code)]
pub(crate) const TARGET: &str = "events_indexer";

#[allow(unused_macros)]
macro_rules! error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "tracing")]
        tracing::error!(target: $crate::logging::TARGET, $($arg)*);
        #[cfg(not(feature = "tracing"))]
        $crate::__consume_log_args!($($arg)*);
    }};
}

#[allow(unused_macros)]
macro_rules! warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "tracing")]
        tracing::warn!(target: $crate::logging::TARGET, $($arg)*);
        #[cfg(not(feature = "tracing"))]
        $crate::__consume_log_args!($($arg)*);
    }};
}

#[allow(unused_macros)]
macro_rules! info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "tracing")]
        tracing::info!(target: $crate::logging::TARGET, $($arg)*);
        #[cfg(not(feature = "tracing"))]
        $crate::__consume_log_args!($($arg)*);
    }};
}

#[allow(unused_macros)]
macro_rules! debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "tracing")]
        tracing::debug!(target: $crate::logging::TARGET, $($arg)*);
        #[cfg(not(feature = "tracing"))]
        $crate::__consume_log_args!($($arg)*);
    }};
}

#[allow(unused_macros)]
macro_rules! trace {
    ($($arg:tt)*) => {{
        #[cfg(feature = "tracing")]
        tracing::trace!(target: $crate::logging::TARGET, $($arg)*);
        #[cfg(not(feature = "tracing"))]
        $crate::__consume_log_args!($($arg)*);
    }};
}

#[doc(hidden)]
#[macro_export]
#[cfg(not(feature = "tracing"))]
macro_rules! __consume_log_args {
    ($field:ident = % $value:expr, $($rest:tt)*) => {
        { let _ = &$value; $crate::__consume_log_args!($($rest)*); }
    };
    ($field:ident = ? $value:expr, $($rest:tt)*) => {
        { let _ = &$value; $crate::__consume_log_args!($($rest)*); }
    };
    ($field:ident = $value:expr, $($rest:tt)*) => {
        { let _ = &$value; $crate::__consume_log_args!($($rest)*); }
    };
    ($msg:literal $(, $arg:expr)* $(,)?) => {
        { $(let _ = &$arg;)* }
    };
    () => {};
}

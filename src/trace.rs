//! Feature-gated tracing macros.
//!
//! Spans and events are emitted under the `gridyolo` target so a subscriber
//! can filter them with `RUST_LOG=gridyolo=debug`. Without the `tracing`
//! feature every macro expands to a no-op.

/// Opens a debug-level span around a decode, suppress, or pipeline stage.
///
/// Without the `tracing` feature this yields a [`NoopSpan`], so call sites can
/// always write `let _span = trace_span!(...).entered();`.
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:literal) => {
        tracing::debug_span!(target: "gridyolo", $name)
    };
    ($name:literal, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::debug_span!(target: "gridyolo", $name, $($key = $value),+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:literal $(, $key:ident = $value:expr)* $(,)?) => {{
        $(let _ = &$value;)*
        $crate::trace::NoopSpan
    }};
}

/// Records a stage result, such as how many candidates survived.
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($stage:literal, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::info!(target: "gridyolo", stage = $stage, $($key = $value),+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($stage:literal, $($key:ident = $value:expr),+ $(,)?) => {
        $(let _ = &$value;)+
    };
}

pub(crate) use trace_event;
pub(crate) use trace_span;

/// Span stand-in used when the `tracing` feature is off.
#[cfg(not(feature = "tracing"))]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    /// Mirrors `tracing::Span::entered`.
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}

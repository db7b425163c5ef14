//! Metric events for storage access.
//!
//! Events are recorded through the `metrics` facade. Without an installed
//! recorder they are no-ops, so library code emits them unconditionally.

pub mod events;

pub use events::*;

/// Emit an [`InternalEvent`](events::InternalEvent).
#[macro_export]
macro_rules! emit {
    ($event:expr) => {
        <_ as $crate::metrics::events::InternalEvent>::emit($event)
    };
}

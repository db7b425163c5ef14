//! Seeding metric events.
//!
//! Events implement [`InternalEvent`] from `seedling-core` and are emitted
//! with [`seedling_core::emit!`].

pub mod events;

pub use seedling_core::metrics::events::InternalEvent;

//! Application layer: the use cases that sit between the HTTP surface and
//! the domain.
//!
//! Each service owns its collaborators behind `Arc<dyn Port>` so the same
//! code runs against in-memory fakes in tests and real adapters in `serve`.

pub mod fanout;
pub mod intake;
pub mod payment;
pub mod reconciler;
pub mod storefront;
pub mod wizard;

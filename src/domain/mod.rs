//! Domain layer: orders, pricing and the rules that keep them consistent.
//!
//! Nothing in here performs I/O. Collaborators the application layer needs
//! (stores, notification channels, the card processor) are described as
//! traits in [`ports`] and implemented in `infrastructure`.

pub mod catalog;
pub mod contact;
pub mod draft;
pub mod messages;
pub mod notification;
pub mod order;
pub mod period;
pub mod ports;
pub mod pricing;
pub mod settlement;
pub mod transliteration;
pub mod validation;

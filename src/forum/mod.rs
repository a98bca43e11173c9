//! The forum core: category registry, topic lifecycle, post manager,
//! authorization matrix, and moderation queue.
//!
//! Every operation takes the acting [`crate::identity::Actor`] explicitly
//! and consults [`authz::can_perform`] before touching state. Multi-field
//! mutations run inside record-store transactions; derived counters are
//! maintained in the same transaction as the write they derive from.

pub mod authz;
pub mod categories;
pub mod error;
pub mod moderation;
pub mod posts;
pub mod slug;
pub mod topics;

pub use error::ForumError;
pub use topics::ResolveAction;

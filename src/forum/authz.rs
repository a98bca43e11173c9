//! The authorization matrix.
//!
//! One pure decision function consulted by every mutation path in the
//! engine, including moderation-queue resolution. Inputs are the actor's
//! role, whether the actor authored the resource, and the resource's lock
//! state for content mutations. No side effects, no I/O.

use crate::identity::{Actor, Role};

/// Every privileged operation the engine exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateCategory,
    UpdateCategory,
    DeleteCategory,
    CreateTopic,
    EditTopic,
    DeleteTopic,
    LockTopic,
    PinTopic,
    /// Reporting is the one mutation a low-privilege actor may perform on
    /// someone else's content.
    ReportContent,
    ResolveReport,
    CreatePost,
    EditPost,
    DeletePost,
    ViewModerationQueue,
}

/// The state of the resource an action targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceContext {
    /// Does the acting actor own the resource?
    pub is_author: bool,
    /// Is the (parent) topic locked?
    pub is_locked: bool,
}

impl ResourceContext {
    /// Context for actions that do not target an existing resource.
    pub const NONE: Self = Self {
        is_author: false,
        is_locked: false,
    };

    #[must_use]
    pub fn for_resource(actor: &Actor, author_id: i64, is_locked: bool) -> Self {
        Self {
            is_author: actor.id == author_id,
            is_locked,
        }
    }
}

/// Decide whether `actor` may perform `action` against a resource in state
/// `res`.
#[must_use]
pub fn can_perform(actor: &Actor, action: Action, res: ResourceContext) -> bool {
    let role = actor.role;
    match action {
        Action::CreateCategory | Action::UpdateCategory | Action::DeleteCategory => {
            role == Role::Admin
        }
        Action::CreateTopic | Action::ReportContent => role >= Role::Member,
        // Locking restricts authors, never moderators.
        Action::EditTopic => {
            (role >= Role::Member && res.is_author && !res.is_locked) || role >= Role::Moderator
        }
        Action::DeleteTopic | Action::EditPost | Action::DeletePost => {
            (role >= Role::Member && res.is_author) || role >= Role::Moderator
        }
        Action::LockTopic | Action::PinTopic | Action::ResolveReport
        | Action::ViewModerationQueue => role >= Role::Moderator,
        Action::CreatePost => {
            role >= Role::Moderator || (role >= Role::Member && !res.is_locked)
        }
    }
}

//! Identity context.
//!
//! Credential storage and session issuance live in the surrounding
//! platform; this module only resolves a request's session token to an
//! [`Actor`] and falls back to GUEST when there is none. No forum operation
//! reads ambient request state itself — the actor is always passed in.

pub mod extract;
pub mod session;

pub use extract::CurrentActor;
pub use session::{generate_session_token, SessionDuration};

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::warn;

use crate::db;
use crate::forum::error::ForumError;

/// Privilege level of an actor, totally ordered: GUEST < MEMBER <
/// MODERATOR < ADMIN. Guests have no mutation privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Guest,
    Member,
    Moderator,
    Admin,
}

impl Role {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Member => "member",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "guest" => Some(Self::Guest),
            "member" => Some(Self::Member),
            "moderator" => Some(Self::Moderator),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// The identity invoking an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub id: i64,
    pub role: Role,
}

impl Actor {
    /// The anonymous reader. Guests carry no identity; id 0 never matches
    /// a stored author id.
    #[must_use]
    pub const fn guest() -> Self {
        Self {
            id: 0,
            role: Role::Guest,
        }
    }

    #[must_use]
    pub const fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }
}

/// Resolve a session token to an actor, falling back to GUEST.
///
/// Expired sessions are cleaned up on sight. A session row carrying an
/// unknown role string is a provisioning bug upstream and resolves to
/// GUEST rather than guessing a privilege level.
///
/// # Errors
///
/// Returns `Unavailable` if the store cannot be reached.
pub async fn resolve_actor(
    pool: &SqlitePool,
    token: Option<&str>,
) -> Result<Actor, ForumError> {
    let Some(token) = token else {
        return Ok(Actor::guest());
    };

    let Some(session) = db::get_session_by_token(pool, token).await? else {
        return Ok(Actor::guest());
    };

    let now = chrono::Utc::now().to_rfc3339();
    if session.expires_at < now {
        let _ = db::delete_session(pool, token).await;
        return Ok(Actor::guest());
    }

    let Some(role) = Role::from_str(&session.role) else {
        warn!(role = %session.role, "Session carries unknown role, treating as guest");
        return Ok(Actor::guest());
    };

    let _ = db::touch_session(pool, session.id).await;

    Ok(Actor::new(session.actor_id, role))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(Role::Guest < Role::Member);
        assert!(Role::Member < Role::Moderator);
        assert!(Role::Moderator < Role::Admin);
    }

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Guest, Role::Member, Role::Moderator, Role::Admin] {
            assert_eq!(Role::from_str(role.as_str()), Some(role));
        }
        assert_eq!(Role::from_str("superuser"), None);
    }

    #[test]
    fn test_guest_matches_no_author() {
        let guest = Actor::guest();
        assert_eq!(guest.role, Role::Guest);
        assert_eq!(guest.id, 0);
    }
}

use rand::{distributions::Alphanumeric, thread_rng, Rng};

/// Generate a cryptographically secure random session token.
pub fn generate_session_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

/// Session duration in seconds.
pub enum SessionDuration {
    /// 1 hour for non-remember-me sessions
    Short,
    /// 30 days for remember-me sessions
    Long,
}

impl SessionDuration {
    #[must_use]
    pub const fn as_seconds(&self) -> i64 {
        match self {
            Self::Short => 3600,     // 1 hour
            Self::Long => 2_592_000, // 30 days
        }
    }

    /// RFC 3339 expiry timestamp measured from now.
    #[must_use]
    pub fn expires_at(&self) -> String {
        (chrono::Utc::now() + chrono::Duration::seconds(self.as_seconds())).to_rfc3339()
    }
}

use std::fmt;

/// Opaque bearer credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        BearerToken(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// `Bearer <token>`, as sent in the Authorization header.
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

/// The `{user, token}` pair handed to every screen by the login flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: String,
    pub token: BearerToken,
}

impl Session {
    pub fn new(user: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            token: BearerToken::new(token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_token() {
        let session = Session::new("kim", "s3cret");
        let printed = format!("{:?}", session);
        assert!(printed.contains("kim"));
        assert!(!printed.contains("s3cret"));
        assert_eq!(session.token.header_value(), "Bearer s3cret");
    }
}

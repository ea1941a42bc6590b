use trailblazer_shared::models::Token;

/// An authenticated session: the bearer token handed out at login, carried
/// as an explicit value rather than process-global state. Components that
/// don't need it (the map core) never see it.
#[derive(Debug, Clone)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl From<Token> for Session {
    fn from(token: Token) -> Self {
        Self::new(token.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_from_token() {
        let token = Token {
            access_token: "abc.def.ghi".to_string(),
            token_type: "bearer".to_string(),
        };
        let session = Session::from(token);
        assert_eq!(session.token(), "abc.def.ghi");
    }
}

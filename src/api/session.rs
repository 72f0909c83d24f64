use std::{fs, path::Path};

use anyhow::{Context, Error};

/// Holds the bearer token attached to every request.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Session { token: None }
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let token = token.into();
        let token = token.trim();
        if token.is_empty() {
            Session::anonymous()
        } else {
            Session {
                token: Some(token.to_owned()),
            }
        }
    }

    /// Reads a persisted token. An empty file yields an anonymous session.
    pub fn from_token_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let token = fs::read_to_string(path)
            .with_context(|| format!("failed to read token file {}", path.display()))?;
        Ok(Session::with_token(token))
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn authorization(&self) -> Option<String> {
        self.token.as_ref().map(|token| format!("Bearer {}", token))
    }
}

// Never print the token itself.
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Session;

    #[test]
    fn bearer_header() {
        let session = Session::with_token("  abc123\n");
        assert_eq!(session.token(), Some("abc123"));
        assert_eq!(session.authorization().as_deref(), Some("Bearer abc123"));
        assert_eq!(format!("{:?}", session), "Session { authenticated: true }");
    }

    #[test]
    fn blank_token_is_anonymous() {
        assert_eq!(Session::with_token("   "), Session::anonymous());
        assert!(Session::anonymous().authorization().is_none());
    }

    #[test]
    fn token_file() {
        let path = std::env::temp_dir().join(format!("timetable-token-{}", std::process::id()));
        std::fs::write(&path, "from-disk\n").unwrap();
        let session = Session::from_token_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(session.token(), Some("from-disk"));

        assert!(Session::from_token_file(&path).is_err());
    }
}

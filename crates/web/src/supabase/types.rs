//! Supabase Auth wire types.

use beacon_core::{Email, UserId, UserIdentity};
use serde::Deserialize;

use super::AuthError;

/// The part of a stored Supabase session the server needs.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionPayload {
    /// JWT access token, verified against Supabase on every request.
    pub access_token: String,
    /// Refresh token (unused server-side; refreshing is the browser's job).
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl SessionPayload {
    /// Parse a stored session.
    ///
    /// Accepts the current object form and the legacy array form
    /// `[access_token, refresh_token, ...]`.
    #[must_use]
    pub fn from_json(json: &str) -> Option<Self> {
        let session = match serde_json::from_str::<serde_json::Value>(json).ok()? {
            serde_json::Value::Array(items) => {
                let mut items = items.into_iter();
                let access_token = items.next()?.as_str()?.to_string();
                let refresh_token = items.next().and_then(|v| v.as_str().map(String::from));
                Some(Self {
                    access_token,
                    refresh_token,
                })
            }
            value @ serde_json::Value::Object(_) => serde_json::from_value(value).ok(),
            _ => None,
        };
        session.filter(|session| !session.access_token.is_empty())
    }
}

/// User object returned by `GET /auth/v1/user`.
#[derive(Debug, Clone, Deserialize)]
pub struct SupabaseUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl TryFrom<SupabaseUser> for UserIdentity {
    type Error = AuthError;

    fn try_from(user: SupabaseUser) -> Result<Self, Self::Error> {
        let id = UserId::parse(&user.id).map_err(|e| AuthError::InvalidUser(e.to_string()))?;

        // Phone-only users have an empty email; anything unparseable is
        // dropped rather than failing the lookup.
        let email = user
            .email
            .as_deref()
            .filter(|e| !e.is_empty())
            .and_then(|e| match Email::parse(e) {
                Ok(email) => Some(email),
                Err(err) => {
                    tracing::warn!(user_id = %id, error = %err, "Ignoring unparseable user email");
                    None
                }
            });

        Ok(Self::new(id, email))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_session_from_object() {
        let session = SessionPayload::from_json(r#"{"access_token":"t1","refresh_token":"r1"}"#)
            .unwrap();
        assert_eq!(session.access_token, "t1");
        assert_eq!(session.refresh_token.as_deref(), Some("r1"));
    }

    #[test]
    fn test_session_from_legacy_array() {
        let session = SessionPayload::from_json(r#"["t1","r1",null,null,null]"#).unwrap();
        assert_eq!(session.access_token, "t1");
    }

    #[test]
    fn test_session_rejects_empty_token() {
        assert!(SessionPayload::from_json(r#"{"access_token":""}"#).is_none());
        assert!(SessionPayload::from_json("42").is_none());
    }

    #[test]
    fn test_user_into_identity() {
        let user = SupabaseUser {
            id: "u1".to_string(),
            email: Some("a@b.com".to_string()),
        };
        let identity = UserIdentity::try_from(user).unwrap();
        assert_eq!(identity.id.as_str(), "u1");
        assert_eq!(identity.email.unwrap().as_str(), "a@b.com");
    }

    #[test]
    fn test_user_without_email() {
        let user = SupabaseUser {
            id: "u2".to_string(),
            email: Some(String::new()),
        };
        let identity = UserIdentity::try_from(user).unwrap();
        assert!(identity.email.is_none());
    }

    #[test]
    fn test_user_with_empty_id_is_invalid() {
        let user = SupabaseUser {
            id: String::new(),
            email: None,
        };
        assert!(matches!(
            UserIdentity::try_from(user),
            Err(AuthError::InvalidUser(_))
        ));
    }
}

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::error::AuthError;

/// Delegated access to the photo-storage API.
///
/// `refresh_token` is the durable credential and is never empty once a token
/// exists. `access_token` and `expires_at` are advisory: they may be stale,
/// and callers fall back to a refresh when the API rejects the access token.
///
/// # Example
/// ```no_run
/// use booth_auth::auth::Token;
///
/// let token = Token::new("1//refresh", "Bearer");
/// let blob = token.serialize()?;
/// let restored = Token::deserialize(&blob)?;
/// assert_eq!(restored.refresh_token, "1//refresh");
/// # Ok::<(), booth_auth::auth::AuthError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub refresh_token: String,
    pub token_type: String,
    pub access_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// On-disk shape of a token. Only the durable fields are kept.
#[derive(Debug, Serialize, Deserialize)]
struct TokenRecord {
    #[serde(rename = "refreshToken")]
    refresh_token: String,
    token_type: String,
}

impl Token {
    /// A token holding only its durable fields, as after [`Token::deserialize`].
    pub fn new(refresh_token: impl Into<String>, token_type: impl Into<String>) -> Self {
        Self {
            refresh_token: refresh_token.into(),
            token_type: token_type.into(),
            access_token: None,
            expires_at: None,
        }
    }

    /// A token as first issued by a completed device flow.
    pub fn issued(
        refresh_token: impl Into<String>,
        token_type: impl Into<String>,
        access_token: impl Into<String>,
        expires_in_secs: u64,
    ) -> Self {
        Self {
            refresh_token: refresh_token.into(),
            token_type: token_type.into(),
            access_token: Some(access_token.into()),
            expires_at: Some(expiry_from_now(expires_in_secs)),
        }
    }

    /// Encode the refresh token and token type as a compact JSON record.
    pub fn serialize(&self) -> Result<String, AuthError> {
        let record = TokenRecord {
            refresh_token: self.refresh_token.clone(),
            token_type: self.token_type.clone(),
        };
        Ok(serde_json::to_string(&record)?)
    }

    /// Parse a record written by [`Token::serialize`].
    ///
    /// The access token and expiry are not persisted, so the result always
    /// has `access_token == None` and `expires_at == None`.
    pub fn deserialize(raw: &str) -> Result<Self, AuthError> {
        let record: TokenRecord = serde_json::from_str(raw)
            .map_err(|err| AuthError::Deserialization(err.to_string()))?;
        if record.refresh_token.is_empty() {
            return Err(AuthError::Deserialization(
                "refreshToken is empty".to_string(),
            ));
        }
        Ok(Self::new(record.refresh_token, record.token_type))
    }

    /// New token value carrying a freshly issued access token.
    ///
    /// A non-empty `rotated_refresh_token` replaces the current one.
    pub fn refreshed(
        &self,
        access_token: impl Into<String>,
        token_type: impl Into<String>,
        expires_in_secs: u64,
        rotated_refresh_token: Option<String>,
    ) -> Self {
        let refresh_token = rotated_refresh_token
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| self.refresh_token.clone());
        Self {
            refresh_token,
            token_type: token_type.into(),
            access_token: Some(access_token.into()),
            expires_at: Some(expiry_from_now(expires_in_secs)),
        }
    }

    /// Advisory check; nothing in this crate calls it before using a token.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= Utc::now(),
            None => true,
        }
    }

    /// `Authorization` header value, if an access token is present.
    pub fn authorization_header(&self) -> Option<String> {
        self.access_token
            .as_ref()
            .map(|access| format!("{} {}", self.token_type, access))
    }
}

pub(crate) fn expiry_from_now(expires_in_secs: u64) -> DateTime<Utc> {
    let now = Utc::now();
    i64::try_from(expires_in_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn live_token() -> Token {
        Token {
            refresh_token: "1//refresh".to_string(),
            token_type: "Bearer".to_string(),
            access_token: Some("ya29.access".to_string()),
            expires_at: Some(Utc::now() + Duration::hours(1)),
        }
    }

    #[test]
    fn serialize_writes_only_durable_fields() {
        let blob = live_token().serialize().unwrap();
        assert_eq!(blob, r#"{"refreshToken":"1//refresh","token_type":"Bearer"}"#);
        assert!(!blob.contains("ya29"));
    }

    #[test]
    fn deserialize_restores_durable_fields_and_drops_the_rest() {
        let token = live_token();
        let restored = Token::deserialize(&token.serialize().unwrap()).unwrap();
        assert_eq!(restored.refresh_token, token.refresh_token);
        assert_eq!(restored.token_type, token.token_type);
        assert_eq!(restored.access_token, None);
        assert_eq!(restored.expires_at, None);
    }

    #[test]
    fn deserialize_reads_records_written_by_older_installs() {
        let restored =
            Token::deserialize(r#"{"token_type": "Bearer", "refreshToken": "abc"}"#).unwrap();
        assert_eq!(restored, Token::new("abc", "Bearer"));
    }

    #[test]
    fn deserialize_rejects_missing_fields() {
        let err = Token::deserialize(r#"{"refreshToken":"abc"}"#).unwrap_err();
        assert!(matches!(err, AuthError::Deserialization(msg) if msg.contains("token_type")));
    }

    #[test]
    fn deserialize_rejects_malformed_payloads() {
        assert!(matches!(
            Token::deserialize("not json"),
            Err(AuthError::Deserialization(_))
        ));
        assert!(matches!(
            Token::deserialize("[1, 2]"),
            Err(AuthError::Deserialization(_))
        ));
    }

    #[test]
    fn deserialize_rejects_empty_refresh_token() {
        assert!(matches!(
            Token::deserialize(r#"{"refreshToken":"","token_type":"Bearer"}"#),
            Err(AuthError::Deserialization(_))
        ));
    }

    #[test]
    fn refreshed_keeps_refresh_token_unless_rotated() {
        let token = Token::new("abc", "Bearer");
        let kept = token.refreshed("xyz", "Bearer", 3600, None);
        assert_eq!(kept.refresh_token, "abc");
        assert_eq!(kept.access_token.as_deref(), Some("xyz"));

        let blank = token.refreshed("xyz", "Bearer", 3600, Some(String::new()));
        assert_eq!(blank.refresh_token, "abc");

        let rotated = token.refreshed("xyz", "Bearer", 3600, Some("def".to_string()));
        assert_eq!(rotated.refresh_token, "def");
        assert_eq!(token.access_token, None);
    }

    #[test]
    fn refreshed_sets_expiry_relative_to_now() {
        let before = Utc::now();
        let token = Token::new("abc", "Bearer").refreshed("xyz", "Bearer", 3600, None);
        let after = Utc::now();
        let expires_at = token.expires_at.unwrap();
        assert!(expires_at >= before + Duration::seconds(3600));
        assert!(expires_at <= after + Duration::seconds(3600));
        assert!(!token.is_expired());
    }

    #[test]
    fn token_without_access_is_expired_and_has_no_header() {
        let token = Token::new("abc", "Bearer");
        assert!(token.is_expired());
        assert_eq!(token.authorization_header(), None);
        assert_eq!(
            live_token().authorization_header().as_deref(),
            Some("Bearer ya29.access")
        );
    }
}

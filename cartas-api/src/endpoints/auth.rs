//! Auth endpoints (`/api/auth/*`).

use serde::{Deserialize, Serialize};

use cartas_core::constants::paths;
use cartas_core::error::CtResult;
use cartas_models::User;

use crate::client::ApiClient;

/// Login/registration response: a token and the user it belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    #[serde(alias = "accessToken", alias = "access_token")]
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

/// Registration parameters.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterParams {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MeResponse {
    Wrapped { user: User },
    Bare(User),
}

impl ApiClient {
    /// Exchange credentials for a token.
    pub async fn login(&self, email: &str, password: &str) -> CtResult<AuthSession> {
        self.post_json(paths::AUTH_LOGIN, &LoginBody { email, password }).await
    }

    /// Create an account and sign in.
    pub async fn register(&self, params: &RegisterParams) -> CtResult<AuthSession> {
        self.post_json(paths::AUTH_REGISTER, params).await
    }

    /// The user behind the current token.
    pub async fn me(&self) -> CtResult<User> {
        let resp: MeResponse = self.get_json(paths::AUTH_ME).await?;
        Ok(match resp {
            MeResponse::Wrapped { user } => user,
            MeResponse::Bare(user) => user,
        })
    }

    /// Invalidate the current token server-side.
    pub async fn logout(&self) -> CtResult<()> {
        self.post_empty(paths::AUTH_LOGOUT, &serde_json::json!({})).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_session_accepts_access_token() {
        let json = r#"{"accessToken":"t0k","user":{"id":"1","email":"a@b.co","plan":"freemium"}}"#;
        let session: AuthSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.token, "t0k");
        assert_eq!(session.user.email, "a@b.co");
    }

    #[test]
    fn test_me_response_shapes() {
        let wrapped: MeResponse =
            serde_json::from_str(r#"{"user":{"id":"1","email":"a@b.co"}}"#).unwrap();
        assert!(matches!(wrapped, MeResponse::Wrapped { .. }));
        let bare: MeResponse = serde_json::from_str(r#"{"id":"1","email":"a@b.co"}"#).unwrap();
        assert!(matches!(bare, MeResponse::Bare(_)));
    }
}

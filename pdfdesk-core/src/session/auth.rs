//! Login, logout and account recovery

use super::store::Session;
use crate::api::ApiClient;
use crate::error::{ApiError, FieldErrors, NON_FIELD_ERRORS};
use crate::model::user::{AuthUser, User};
use crate::transport::ApiRequest;
use crate::validation::forms::check_password;
use crate::validation::is_valid_email;
use crate::Result;
use serde::Deserialize;
use serde_json::{json, Value};

pub const LOGIN_PATH: &str = "auth/login/";
pub const LOGOUT_PATH: &str = "auth/logout/";

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(alias = "token")]
    access: String,
    #[serde(default)]
    refresh: Option<String>,
    user: AuthUser,
}

/// Authentication operations over an [`ApiClient`] and its session
#[derive(Debug, Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Sign in and establish the session
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthUser> {
        let mut errors = FieldErrors::new();
        if email.trim().is_empty() {
            errors.add("email", "Email is required");
        } else if !is_valid_email(email) {
            errors.add("email", "Invalid email");
        }
        if password.is_empty() {
            errors.add("password", "Password is required");
        }
        errors.into_result()?;

        let request = ApiRequest::post(LOGIN_PATH)
            .with_json(json!({ "email": email.trim(), "password": password }));
        let response = match self.client.execute_anonymous(request).await {
            Ok(response) => response,
            Err(ApiError::Unauthorized) => {
                return Err(ApiError::invalid(NON_FIELD_ERRORS, "Invalid email or password"));
            }
            Err(e) => return Err(e),
        };

        let body: LoginResponse = response.json()?;
        let user = body.user.clone();
        self.client.session().establish(Session::new(body.access, body.refresh, body.user)).await?;
        Ok(user)
    }

    /// Sign out. The backend call is best effort; the local session is
    /// always cleared.
    pub async fn logout(&self) -> Result<()> {
        let session = self.client.session();
        if let Some(refresh) = session.refresh_token() {
            let request = ApiRequest::post(LOGOUT_PATH).with_json(json!({ "refresh": refresh }));
            if let Err(e) = self.client.execute(request).await {
                log::warn!("Logout request failed, clearing session anyway: {}", e);
            }
        }
        session.clear().await
    }

    pub async fn current_user(&self) -> Result<User> {
        self.client.get("users/me/").await
    }

    /// Resume a persisted session. Returns whether one was found.
    pub async fn restore(&self) -> Result<bool> {
        self.client.session().restore().await
    }

    pub async fn verify_email(&self, token: &str) -> Result<User> {
        self.client.post("users/verify-email/", &json!({ "token": token })).await
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        if !is_valid_email(email) {
            return Err(ApiError::invalid("email", "Invalid email"));
        }
        let _: Value =
            self.client.post("users/reset-password-request/", &json!({ "email": email.trim() })).await?;
        Ok(())
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<()> {
        let mut errors = FieldErrors::new();
        check_password(&mut errors, "new_password", new_password);
        errors.into_result()?;

        let body = json!({
            "token": token,
            "new_password": new_password,
            "new_password2": new_password,
        });
        let _: Value = self.client.post("users/reset-password-confirm/", &body).await?;
        Ok(())
    }
}

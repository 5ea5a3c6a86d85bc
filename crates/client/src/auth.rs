//! Authentication endpoints under `<api_url>/auth/*`.
//!
//! Every form is validated before a request is built; a successful login
//! is written straight into the [`Session`].

use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;

use pdbw_core::CoreError;
use pdbw_core::forms::{self, ForgotPasswordForm, LoginForm, RegisterForm, ResetPasswordForm};

use crate::error::ClientError;
use crate::session::{AuthResponse, Session};
use crate::transport::{unwrap_data, HttpTransport};

const AUTH_SEGMENT: &str = "auth";

/// Client for sign-in, registration and password recovery.
#[derive(Clone)]
pub struct AuthClient {
    transport: HttpTransport,
}

impl AuthClient {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    pub fn session(&self) -> &Arc<Session> {
        self.transport.session()
    }

    fn url(&self, action: &str) -> reqwest::Url {
        self.transport.url([AUTH_SEGMENT, action])
    }

    /// `POST /auth/login`; stores the token and user on success.
    pub async fn login(&self, form: &LoginForm) -> Result<AuthResponse, ClientError> {
        forms::check(form)?;
        let value = self
            .transport
            .send_json(Method::POST, self.url("login"), form)
            .await?;
        let auth: AuthResponse = serde_json::from_value(unwrap_data(value))?;
        self.session().store_auth(&auth).await?;
        Ok(auth)
    }

    /// `POST /auth/register`.
    ///
    /// Backends that sign the user in immediately return `{token, user}`;
    /// that response is stored. Otherwise the confirmation message is
    /// returned and the session is left untouched.
    pub async fn register(&self, form: &RegisterForm) -> Result<String, ClientError> {
        forms::check(form)?;
        let value = self
            .transport
            .send_json(Method::POST, self.url("register"), form)
            .await?;
        let value = unwrap_data(value);
        if let Ok(auth) = serde_json::from_value::<AuthResponse>(value.clone()) {
            self.session().store_auth(&auth).await?;
            return Ok(format!("Welcome, {}", auth.user.name));
        }
        Ok(message_or(&value, "Registration successful. Check your email to verify your account."))
    }

    /// `POST /auth/forgot-password`.
    pub async fn forgot_password(&self, form: &ForgotPasswordForm) -> Result<String, ClientError> {
        forms::check(form)?;
        let value = self
            .transport
            .send_json(Method::POST, self.url("forgot-password"), form)
            .await?;
        Ok(message_or(&value, "If that address is registered, a reset link is on its way."))
    }

    /// `POST /auth/reset-password` with `{token, password}`.
    pub async fn reset_password(&self, form: &ResetPasswordForm) -> Result<String, ClientError> {
        forms::check(form)?;
        let value = self
            .transport
            .send_json(Method::POST, self.url("reset-password"), form)
            .await?;
        Ok(message_or(&value, "Password has been reset."))
    }

    /// `GET /auth/verify-email?token=`.
    pub async fn verify_email(&self, token: &str) -> Result<String, ClientError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(CoreError::Validation("Verification token is missing".into()).into());
        }
        let value = self
            .transport
            .get(self.url("verify-email"), &[("token", token.to_string())])
            .await?;
        Ok(message_or(&value, "Email verified."))
    }

    /// Clear the stored credentials. Purely local; no request is made.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.session().logout().await
    }
}

fn message_or(value: &Value, fallback: &str) -> String {
    value
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| fallback.to_string())
}

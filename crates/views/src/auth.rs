//! Sign-in, registration and password-recovery flows.
//!
//! Each flow validates its form, calls the auth endpoint and reports the
//! message to show plus the route to go to next.

use pdbw_client::AuthClient;
use pdbw_core::forms::{ForgotPasswordForm, LoginForm, RegisterForm, ResetPasswordForm};
use pdbw_core::routes::Route;

use crate::error::ViewResult;
use crate::notify::Snackbar;

/// What the page does after a successful submission.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthOutcome {
    pub notice: Snackbar,
    /// `None` keeps the user on the current page.
    pub redirect: Option<Route>,
}

pub struct AuthFlows {
    client: AuthClient,
}

impl AuthFlows {
    pub fn new(client: AuthClient) -> Self {
        Self { client }
    }

    pub async fn login(&self, form: &LoginForm) -> ViewResult<AuthOutcome> {
        let auth = self.client.login(form).await?;
        Ok(AuthOutcome {
            notice: Snackbar::success(format!("Welcome back, {}", auth.user.name)),
            redirect: Some(Route::Home),
        })
    }

    pub async fn register(&self, form: &RegisterForm) -> ViewResult<AuthOutcome> {
        let message = self.client.register(form).await?;
        let signed_in = self.client.session().is_logged_in().await;
        Ok(AuthOutcome {
            notice: Snackbar::success(message),
            redirect: Some(if signed_in { Route::Home } else { Route::Login }),
        })
    }

    pub async fn forgot_password(&self, form: &ForgotPasswordForm) -> ViewResult<AuthOutcome> {
        let message = self.client.forgot_password(form).await?;
        Ok(AuthOutcome {
            notice: Snackbar::info(message),
            redirect: None,
        })
    }

    pub async fn reset_password(&self, form: &ResetPasswordForm) -> ViewResult<AuthOutcome> {
        let message = self.client.reset_password(form).await?;
        Ok(AuthOutcome {
            notice: Snackbar::success(message),
            redirect: Some(Route::Login),
        })
    }

    pub async fn verify_email(&self, token: &str) -> ViewResult<AuthOutcome> {
        let message = self.client.verify_email(token).await?;
        Ok(AuthOutcome {
            notice: Snackbar::success(message),
            redirect: Some(Route::Login),
        })
    }

    pub async fn logout(&self) -> ViewResult<AuthOutcome> {
        self.client.logout().await?;
        Ok(AuthOutcome {
            notice: Snackbar::info("Signed out"),
            redirect: Some(Route::Home),
        })
    }
}

/// Where a navigation to `route` actually lands: signed-in users skip the
/// login and registration pages.
pub fn guard(route: Route, logged_in: bool) -> Route {
    match route {
        Route::Login | Route::Register if logged_in => Route::Home,
        route => route,
    }
}

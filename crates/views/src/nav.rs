//! Navigation bar state derived from the session.

use std::sync::Arc;

use pdbw_client::{ColorMode, Session};
use pdbw_core::routes::{nav_items, NavItem};

use crate::error::ViewResult;

/// Everything the navigation bar shows.
#[derive(Debug, Clone, PartialEq)]
pub struct NavBar {
    pub items: Vec<NavItem>,
    /// Greeting name when signed in.
    pub user_name: Option<String>,
    pub color_mode: ColorMode,
}

/// Snapshot the navigation bar for the current session.
pub async fn nav_bar(session: &Session) -> NavBar {
    let user = session.user().await;
    NavBar {
        items: nav_items(user.is_some()),
        user_name: user.map(|u| u.name),
        color_mode: session.color_mode().await,
    }
}

/// Flip the theme and return the refreshed bar.
pub async fn toggle_theme(session: &Arc<Session>) -> ViewResult<NavBar> {
    session.toggle_color_mode().await?;
    Ok(nav_bar(session).await)
}

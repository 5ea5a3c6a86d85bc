//! Application routes and the navigation bar model.

use std::fmt;

use crate::pdb::PdbId;
use crate::resource::ResourceKind;
use crate::types::Record;

/// A navigable page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Resource(ResourceKind),
    ProteinDetail(PdbId),
    Explorer,
    AdvancedSearch,
    Login,
    Register,
    ForgotPassword,
    ResetPassword { token: String },
    VerifyEmail { token: String },
    NotFound(String),
}

impl Route {
    /// URL path for this route.
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Resource(kind) => format!("/{}", kind.slug()),
            Self::ProteinDetail(id) => format!("/protein/{id}"),
            Self::Explorer => "/explorer".to_string(),
            Self::AdvancedSearch => "/advanced-search".to_string(),
            Self::Login => "/login".to_string(),
            Self::Register => "/register".to_string(),
            Self::ForgotPassword => "/forgot-password".to_string(),
            Self::ResetPassword { token } => format!("/reset-password/{token}"),
            Self::VerifyEmail { token } => format!("/verify-email?token={token}"),
            Self::NotFound(path) => path.clone(),
        }
    }

    /// Resolve a path (optionally with a query string) to a route.
    pub fn parse(raw: &str) -> Self {
        let (path, query) = raw.split_once('?').unwrap_or((raw, ""));
        let trimmed = path.trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Self::Home,
            ["explorer"] => Self::Explorer,
            ["advanced-search"] => Self::AdvancedSearch,
            ["login"] => Self::Login,
            ["register"] => Self::Register,
            ["forgot-password"] => Self::ForgotPassword,
            ["reset-password", token] => Self::ResetPassword {
                token: (*token).to_string(),
            },
            ["verify-email"] => match query_param(query, "token") {
                Some(token) => Self::VerifyEmail { token },
                None => Self::NotFound(raw.to_string()),
            },
            ["protein", id] => match PdbId::parse(id) {
                Ok(id) => Self::ProteinDetail(id),
                Err(_) => Self::NotFound(raw.to_string()),
            },
            [slug] => match slug.parse::<ResourceKind>() {
                Ok(kind) if kind.slug() == *slug => Self::Resource(kind),
                _ => Self::NotFound(raw.to_string()),
            },
            _ => Self::NotFound(raw.to_string()),
        }
    }

    /// Detail page for a protein row, when its `pdb_id` is well formed.
    pub fn protein_detail_for(row: &Record) -> Option<Self> {
        row.get("pdb_id")
            .and_then(|v| v.as_str())
            .and_then(|id| PdbId::parse(id).ok())
            .map(Self::ProteinDetail)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

fn query_param(query: &str, name: &str) -> Option<String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_string())
        .filter(|v| !v.is_empty())
}

/// One entry in the navigation bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    pub label: &'static str,
    pub route: Route,
}

/// Navigation bar entries; the trailing auth entries depend on whether a
/// user is signed in ("Logout" is handled by the caller, not routed).
pub fn nav_items(logged_in: bool) -> Vec<NavItem> {
    let mut items = vec![NavItem {
        label: "Home",
        route: Route::Home,
    }];
    items.extend(ResourceKind::ALL.into_iter().map(|kind| NavItem {
        label: kind.label(),
        route: Route::Resource(kind),
    }));
    items.push(NavItem {
        label: "Explorer",
        route: Route::Explorer,
    });
    items.push(NavItem {
        label: "Advanced Search",
        route: Route::AdvancedSearch,
    });
    if !logged_in {
        items.push(NavItem {
            label: "Login",
            route: Route::Login,
        });
        items.push(NavItem {
            label: "Register",
            route: Route::Register,
        });
    }
    items
}

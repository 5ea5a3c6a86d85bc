//! Client session: the auth token, signed-in user, colour-mode preference
//! and search history, with change notifications.
//!
//! [`Session`] is the only owner of persisted client state. Components read
//! and write through its typed operations and observe changes through
//! [`Session::subscribe`]. Writes made by another process sharing the same
//! store become visible after [`Session::sync`], which emits the events a
//! local change would have.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::{broadcast, RwLock};

use pdbw_core::history::{HistoryEntry, SearchHistory};

use crate::error::ClientError;
use crate::storage::{KeyValueStore, MemoryStore};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";
pub const USER_EMAIL_KEY: &str = "userEmail";
pub const USER_ID_KEY: &str = "userId";
pub const COLOR_MODE_KEY: &str = "colorMode";
pub const SEARCH_HISTORY_KEY: &str = "searchHistory";

/// Buffer capacity of the session event channel.
const EVENT_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The signed-in user as returned by the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Backends disagree on whether user ids are numbers or strings.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// Successful login response: `{token, user: {id, name, email}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
}

/// Light or dark UI theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Light,
    Dark,
}

impl ColorMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Unknown stored values fall back to the default.
    pub fn from_stored(raw: &str) -> Self {
        match raw.trim() {
            "dark" => Self::Dark,
            _ => Self::Light,
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change to session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn { user_name: String },
    LoggedOut,
    ColorModeChanged(ColorMode),
    HistoryChanged,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Shared session state; wrap in `Arc` and hand to every client.
pub struct Session {
    store: RwLock<Box<dyn KeyValueStore>>,
    events: broadcast::Sender<SessionEvent>,
}

impl Session {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store: RwLock::new(Box::new(store)),
            events,
        }
    }

    /// A session that forgets everything when dropped.
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Receive every subsequent [`SessionEvent`].
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: SessionEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    // -- auth ---------------------------------------------------------------

    /// Bearer token, if signed in.
    pub async fn token(&self) -> Option<String> {
        self.store
            .read()
            .await
            .get(TOKEN_KEY)
            .filter(|t| !t.is_empty())
    }

    pub async fn is_logged_in(&self) -> bool {
        self.token().await.is_some()
    }

    /// The signed-in user, reassembled from the separate stored keys.
    pub async fn user(&self) -> Option<UserInfo> {
        let store = self.store.read().await;
        store.get(TOKEN_KEY).filter(|t| !t.is_empty())?;
        Some(UserInfo {
            id: store.get(USER_ID_KEY).unwrap_or_default(),
            name: store.get(USER_KEY).unwrap_or_default(),
            email: store.get(USER_EMAIL_KEY).unwrap_or_default(),
        })
    }

    /// Persist a login response: token and user fields as separate keys.
    pub async fn store_auth(&self, auth: &AuthResponse) -> Result<(), ClientError> {
        {
            let mut store = self.store.write().await;
            store.set(TOKEN_KEY, &auth.token)?;
            store.set(USER_KEY, &auth.user.name)?;
            store.set(USER_EMAIL_KEY, &auth.user.email)?;
            store.set(USER_ID_KEY, &auth.user.id)?;
        }
        tracing::info!(user = %auth.user.email, "Signed in");
        self.publish(SessionEvent::LoggedIn {
            user_name: auth.user.name.clone(),
        });
        Ok(())
    }

    /// Forget the token and user fields. Preferences and history survive.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let was_logged_in = {
            let mut store = self.store.write().await;
            let was = store.get(TOKEN_KEY).is_some_and(|t| !t.is_empty());
            for key in [TOKEN_KEY, USER_KEY, USER_EMAIL_KEY, USER_ID_KEY] {
                store.remove(key)?;
            }
            was
        };
        if was_logged_in {
            tracing::info!("Signed out");
            self.publish(SessionEvent::LoggedOut);
        }
        Ok(())
    }

    // -- colour mode --------------------------------------------------------

    pub async fn color_mode(&self) -> ColorMode {
        self.store
            .read()
            .await
            .get(COLOR_MODE_KEY)
            .map(|raw| ColorMode::from_stored(&raw))
            .unwrap_or_default()
    }

    pub async fn set_color_mode(&self, mode: ColorMode) -> Result<(), ClientError> {
        self.store.write().await.set(COLOR_MODE_KEY, mode.as_str())?;
        self.publish(SessionEvent::ColorModeChanged(mode));
        Ok(())
    }

    /// Flip between light and dark, returning the new mode.
    pub async fn toggle_color_mode(&self) -> Result<ColorMode, ClientError> {
        let next = self.color_mode().await.toggled();
        self.set_color_mode(next).await?;
        Ok(next)
    }

    // -- search history -----------------------------------------------------

    pub async fn search_history(&self) -> SearchHistory {
        self.store
            .read()
            .await
            .get(SEARCH_HISTORY_KEY)
            .map(|raw| SearchHistory::from_json(&raw))
            .unwrap_or_default()
    }

    /// Add a search to the front of the persisted history.
    pub async fn record_search(&self, entry: HistoryEntry) -> Result<SearchHistory, ClientError> {
        let history = {
            let mut store = self.store.write().await;
            let mut history = store
                .get(SEARCH_HISTORY_KEY)
                .map(|raw| SearchHistory::from_json(&raw))
                .unwrap_or_default();
            history.push(entry);
            store.set(SEARCH_HISTORY_KEY, &history.to_json())?;
            history
        };
        self.publish(SessionEvent::HistoryChanged);
        Ok(history)
    }

    pub async fn clear_search_history(&self) -> Result<(), ClientError> {
        self.store.write().await.remove(SEARCH_HISTORY_KEY)?;
        self.publish(SessionEvent::HistoryChanged);
        Ok(())
    }

    // -- cross-process sync -------------------------------------------------

    /// Re-read the backing store and emit events for anything another
    /// process changed: sign-in state, colour mode, and history.
    ///
    /// Returns the events emitted.
    pub async fn sync(&self) -> Result<Vec<SessionEvent>, ClientError> {
        let mut store = self.store.write().await;

        let before = Snapshot::take(&**store);
        store.reload()?;
        let after = Snapshot::take(&**store);
        drop(store);

        let mut events = Vec::new();
        match (before.logged_in, after.logged_in) {
            (false, true) => events.push(SessionEvent::LoggedIn {
                user_name: after.user_name.unwrap_or_default(),
            }),
            (true, false) => events.push(SessionEvent::LoggedOut),
            _ => {}
        }
        if before.color_mode != after.color_mode {
            events.push(SessionEvent::ColorModeChanged(after.color_mode));
        }
        if before.history != after.history {
            events.push(SessionEvent::HistoryChanged);
        }

        for event in &events {
            tracing::debug!(?event, "Session changed externally");
            self.publish(event.clone());
        }
        Ok(events)
    }
}

/// The observable parts of the store, compared across a reload.
struct Snapshot {
    logged_in: bool,
    user_name: Option<String>,
    color_mode: ColorMode,
    history: Option<String>,
}

impl Snapshot {
    fn take(store: &dyn KeyValueStore) -> Self {
        Self {
            logged_in: store.get(TOKEN_KEY).is_some_and(|t| !t.is_empty()),
            user_name: store.get(USER_KEY),
            color_mode: store
                .get(COLOR_MODE_KEY)
                .map(|raw| ColorMode::from_stored(&raw))
                .unwrap_or_default(),
            history: store.get(SEARCH_HISTORY_KEY),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileStore;

    fn auth(name: &str) -> AuthResponse {
        AuthResponse {
            token: "tok-123".into(),
            user: UserInfo {
                id: "7".into(),
                name: name.into(),
                email: format!("{}@example.com", name.to_lowercase()),
            },
        }
    }

    #[tokio::test]
    async fn store_auth_persists_separate_keys() {
        let session = Session::in_memory();
        let mut rx = session.subscribe();

        session.store_auth(&auth("Ada")).await.unwrap();

        assert_eq!(session.token().await.as_deref(), Some("tok-123"));
        let user = session.user().await.unwrap();
        assert_eq!(user.name, "Ada");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.id, "7");
        assert_eq!(
            rx.recv().await.unwrap(),
            SessionEvent::LoggedIn { user_name: "Ada".into() }
        );
    }

    #[tokio::test]
    async fn logout_keeps_preferences() {
        let session = Session::in_memory();
        session.store_auth(&auth("Ada")).await.unwrap();
        session.set_color_mode(ColorMode::Dark).await.unwrap();

        session.logout().await.unwrap();

        assert!(!session.is_logged_in().await);
        assert!(session.user().await.is_none());
        assert_eq!(session.color_mode().await, ColorMode::Dark);
    }

    #[tokio::test]
    async fn toggle_color_mode_flips() {
        let session = Session::in_memory();
        assert_eq!(session.color_mode().await, ColorMode::Light);
        assert_eq!(session.toggle_color_mode().await.unwrap(), ColorMode::Dark);
        assert_eq!(session.toggle_color_mode().await.unwrap(), ColorMode::Light);
    }

    #[tokio::test]
    async fn history_is_capped_and_newest_first() {
        let session = Session::in_memory();
        for i in 0..11 {
            session
                .record_search(HistoryEntry::now(format!("q{i}"), "global"))
                .await
                .unwrap();
        }
        let history = session.search_history().await;
        assert_eq!(history.len(), 10);
        assert_eq!(history.entries()[0].query, "q10");
    }

    #[tokio::test]
    async fn sync_reports_login_from_another_process() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let tab_a = Session::new(FileStore::open(&path).unwrap());
        let tab_b = Session::new(FileStore::open(&path).unwrap());
        let mut rx = tab_a.subscribe();

        tab_b.store_auth(&auth("Grace")).await.unwrap();
        assert!(!tab_a.is_logged_in().await);

        let events = tab_a.sync().await.unwrap();
        assert_eq!(events, vec![SessionEvent::LoggedIn { user_name: "Grace".into() }]);
        assert_eq!(rx.recv().await.unwrap(), events[0]);
        assert!(tab_a.is_logged_in().await);

        tab_b.logout().await.unwrap();
        tab_b.set_color_mode(ColorMode::Dark).await.unwrap();
        let events = tab_a.sync().await.unwrap();
        assert_eq!(
            events,
            vec![SessionEvent::LoggedOut, SessionEvent::ColorModeChanged(ColorMode::Dark)]
        );
    }

    #[test]
    fn user_id_accepts_numbers() {
        let parsed: AuthResponse = serde_json::from_str(
            r#"{"token":"t","user":{"id":42,"name":"N","email":"n@example.com"}}"#,
        )
        .unwrap();
        assert_eq!(parsed.user.id, "42");
    }
}

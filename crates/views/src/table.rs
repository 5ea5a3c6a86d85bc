//! Generic data-table view model.
//!
//! One [`DataTableView`] drives any resource page: paging and search,
//! view/edit/add/delete dialogs, plots and notifications. All state is
//! exposed as plain data; nothing here renders.
//!
//! Every load takes a generation number and only the latest generation's
//! response is committed, so a slow, superseded request never overwrites
//! fresher rows.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use pdbw_client::{ApiService, ListQuery};
use pdbw_core::fields::{
    validate_required, value_to_plain, ColumnDef, FieldDescriptor, FieldKind,
};
use pdbw_core::pagination::{clamp_page_size, page_offset, PageCount, DEFAULT_PAGE_SIZE};
use pdbw_core::plot::{PlotConfig, RenderedPlot};
use pdbw_core::routes::Route;
use pdbw_core::row_id::{assign_row_ids, GridRow, PrimaryKey, RecordKey};
use pdbw_core::{Record, ResourceKind};

use crate::error::{ViewError, ViewResult};
use crate::notify::{Notifications, Snackbar};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Which mutations a page allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub can_add: bool,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            can_add: true,
            can_edit: true,
            can_delete: true,
        }
    }
}

impl Capabilities {
    pub fn read_only() -> Self {
        Self {
            can_add: false,
            can_edit: false,
            can_delete: false,
        }
    }
}

/// How the key for a DELETE request is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeleteKey {
    /// Use the page's primary key.
    #[default]
    PrimaryKey,
    /// Use a single named field of the row.
    Field(String),
}

/// Maps a row to the page that shows it in full.
pub type DetailRoute = fn(&Record) -> Option<Route>;

/// Everything that distinguishes one table page from another.
#[derive(Debug, Clone)]
pub struct TableConfig {
    pub title: String,
    pub resource: ResourceKind,
    pub columns: Vec<ColumnDef>,
    pub primary_key: PrimaryKey,
    pub detail_fields: Vec<FieldDescriptor>,
    pub plot_configs: Vec<PlotConfig>,
    pub capabilities: Capabilities,
    pub delete_key: DeleteKey,
    pub detail_route: Option<DetailRoute>,
    pub page_size: u32,
}

impl TableConfig {
    pub fn new(title: impl Into<String>, resource: ResourceKind, primary_key: PrimaryKey) -> Self {
        Self {
            title: title.into(),
            resource,
            columns: Vec::new(),
            primary_key,
            detail_fields: Vec::new(),
            plot_configs: Vec::new(),
            capabilities: Capabilities::default(),
            delete_key: DeleteKey::default(),
            detail_route: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn columns(mut self, columns: Vec<ColumnDef>) -> Self {
        self.columns = columns;
        self
    }

    pub fn detail_fields(mut self, fields: Vec<FieldDescriptor>) -> Self {
        self.detail_fields = fields;
        self
    }

    pub fn plots(mut self, plots: Vec<PlotConfig>) -> Self {
        self.plot_configs = plots;
        self
    }

    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn delete_key(mut self, delete_key: DeleteKey) -> Self {
        self.delete_key = delete_key;
        self
    }

    pub fn detail_route(mut self, route: DetailRoute) -> Self {
        self.detail_route = Some(route);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = clamp_page_size(Some(page_size));
        self
    }

    /// Descriptor for `key`, if the page declares one.
    fn field(&self, key: &str) -> Option<&FieldDescriptor> {
        self.detail_fields.iter().find(|f| f.key == key)
    }

    /// Fields shown in the read-only dialog: the declared detail fields, or
    /// one text field per column when none are declared.
    pub fn view_fields(&self) -> Vec<FieldDescriptor> {
        if self.detail_fields.is_empty() {
            self.columns
                .iter()
                .map(|c| FieldDescriptor::new(c.field.clone(), c.header.clone(), c.kind.clone()))
                .collect()
        } else {
            self.detail_fields.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Dialogs
// ---------------------------------------------------------------------------

/// One rendered label/value pair of the read-only dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayField {
    pub key: String,
    pub label: String,
    pub value: String,
}

/// The dialog currently open over the table, if any.
#[derive(Debug, Clone, PartialEq)]
pub enum Dialog {
    View {
        row_id: String,
        fields: Vec<DisplayField>,
    },
    Edit {
        row_id: String,
        /// Key values captured when the dialog opened; the update is sent
        /// here even if the draft changes a key field.
        original_key: RecordKey,
        draft: Record,
        error: Option<String>,
    },
    Add {
        draft: Record,
        error: Option<String>,
    },
    ConfirmDelete {
        row_id: String,
        key: RecordKey,
    },
}

impl Dialog {
    fn set_error(&mut self, message: String) {
        match self {
            Self::Edit { error, .. } | Self::Add { error, .. } => *error = Some(message),
            Self::View { .. } | Self::ConfirmDelete { .. } => {}
        }
    }
}

/// Result of asking to view a row.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewOutcome {
    /// The read-only dialog is now open.
    Dialog,
    /// The page navigates to a dedicated detail route instead.
    Navigate(Route),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct TableState {
    rows: Vec<GridRow>,
    total: u64,
    page: u32,
    page_size: u32,
    search: String,
    sort: Option<(String, SortDirection)>,
    filter: Option<(String, String)>,
    dialog: Option<Dialog>,
    loading: bool,
    show_plots: bool,
    stats: Option<Value>,
    stats_fetched: bool,
    plots: Vec<RenderedPlot>,
    notifications: Notifications,
}

/// View model behind every resource table page.
pub struct DataTableView {
    config: TableConfig,
    service: Arc<dyn ApiService>,
    state: RwLock<TableState>,
    generation: AtomicU64,
}

impl DataTableView {
    pub fn new(config: TableConfig, service: Arc<dyn ApiService>) -> Self {
        let state = TableState {
            page_size: config.page_size,
            ..TableState::default()
        };
        Self {
            config,
            service,
            state: RwLock::new(state),
            generation: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    // -- loading ------------------------------------------------------------

    /// Fetch the current page. Stale responses are dropped silently.
    pub async fn load(&self) -> ViewResult<()> {
        let generation = self.generation.fetch_add(1, AtomicOrdering::SeqCst) + 1;
        let query = {
            let mut state = self.state.write().await;
            state.loading = true;
            let query = ListQuery::page(state.page_size, page_offset(state.page, state.page_size));
            if state.search.trim().is_empty() {
                query
            } else {
                query.with_search(state.search.clone())
            }
        };

        let result = self.service.get_all(&query).await;

        let mut state = self.state.write().await;
        if self.generation.load(AtomicOrdering::SeqCst) != generation {
            tracing::debug!(resource = %self.config.resource, generation, "Discarding stale page");
            return Ok(());
        }
        state.loading = false;

        match result {
            Ok(page) => {
                tracing::debug!(
                    resource = %self.config.resource,
                    generation,
                    rows = page.rows.len(),
                    total = page.total,
                    "Page loaded"
                );
                state.rows = assign_row_ids(page.rows, &self.config.primary_key);
                state.total = page.total;
                if state.show_plots {
                    state.plots = self.render_plots(&state.rows, state.stats.as_ref());
                }
                Ok(())
            }
            Err(e) => {
                tracing::error!(resource = %self.config.resource, error = %e, "Failed to load rows");
                state
                    .notifications
                    .push(Snackbar::error(format!("Failed to load {}: {}", self.config.title, e.user_message())));
                Err(e.into())
            }
        }
    }

    pub async fn set_page(&self, page: u32) -> ViewResult<()> {
        self.state.write().await.page = page;
        self.load().await
    }

    /// Change the page size (clamped) and return to the first page.
    pub async fn set_page_size(&self, page_size: u32) -> ViewResult<()> {
        {
            let mut state = self.state.write().await;
            state.page_size = clamp_page_size(Some(page_size));
            state.page = 0;
        }
        self.load().await
    }

    /// Change the server-side search text and return to the first page.
    pub async fn set_search(&self, search: impl Into<String>) -> ViewResult<()> {
        {
            let mut state = self.state.write().await;
            state.search = search.into();
            state.page = 0;
        }
        self.load().await
    }

    pub async fn page(&self) -> u32 {
        self.state.read().await.page
    }

    pub async fn page_size(&self) -> u32 {
        self.state.read().await.page_size
    }

    /// Total reported by the backend (not the number of rows on this page).
    pub async fn total(&self) -> u64 {
        self.state.read().await.total
    }

    pub async fn page_count(&self) -> PageCount {
        let state = self.state.read().await;
        PageCount::from_total(state.total, state.page_size)
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    /// Rows of the current page, as loaded.
    pub async fn rows(&self) -> Vec<GridRow> {
        self.state.read().await.rows.clone()
    }

    // -- client-side sort and filter ---------------------------------------

    pub async fn set_sort(&self, field: impl Into<String>, direction: SortDirection) {
        self.state.write().await.sort = Some((field.into(), direction));
    }

    pub async fn clear_sort(&self) {
        self.state.write().await.sort = None;
    }

    /// Case-insensitive "contains" filter on one field of the current page.
    pub async fn set_filter(&self, field: impl Into<String>, needle: impl Into<String>) {
        self.state.write().await.filter = Some((field.into(), needle.into()));
    }

    pub async fn clear_filter(&self) {
        self.state.write().await.filter = None;
    }

    /// Current page after the client-side filter and sort.
    pub async fn visible_rows(&self) -> Vec<GridRow> {
        let state = self.state.read().await;
        let mut rows: Vec<GridRow> = match &state.filter {
            Some((field, needle)) if !needle.trim().is_empty() => {
                let needle = needle.trim().to_lowercase();
                state
                    .rows
                    .iter()
                    .filter(|row| {
                        row.record
                            .get(field)
                            .filter(|v| !v.is_null())
                            .is_some_and(|v| value_to_plain(v).to_lowercase().contains(&needle))
                    })
                    .cloned()
                    .collect()
            }
            _ => state.rows.clone(),
        };
        if let Some((field, direction)) = &state.sort {
            rows.sort_by(|a, b| {
                let (a, b) = (a.record.get(field), b.record.get(field));
                match (is_null(a), is_null(b)) {
                    (false, false) => {
                        let ord = compare_values(a, b);
                        match direction {
                            SortDirection::Asc => ord,
                            SortDirection::Desc => ord.reverse(),
                        }
                    }
                    // Nulls sort last in either direction.
                    (a_null, b_null) => a_null.cmp(&b_null),
                }
            });
        }
        rows
    }

    /// Cell text for every visible row, in column order.
    pub async fn render_rows(&self) -> Vec<(String, Vec<String>)> {
        self.visible_rows()
            .await
            .into_iter()
            .map(|row| {
                let cells = self.config.columns.iter().map(|c| c.render_cell(&row.record)).collect();
                (row.id, cells)
            })
            .collect()
    }

    // -- dialogs ------------------------------------------------------------

    pub async fn dialog(&self) -> Option<Dialog> {
        self.state.read().await.dialog.clone()
    }

    async fn find_row(&self, row_id: &str) -> ViewResult<GridRow> {
        self.state
            .read()
            .await
            .rows
            .iter()
            .find(|row| row.id == row_id)
            .cloned()
            .ok_or_else(|| ViewError::UnknownRow(row_id.to_string()))
    }

    /// Open the read-only dialog, or navigate when the page has a detail route.
    pub async fn open_view(&self, row_id: &str) -> ViewResult<ViewOutcome> {
        let row = self.find_row(row_id).await?;
        if let Some(route) = self.config.detail_route.and_then(|detail| detail(&row.record)) {
            return Ok(ViewOutcome::Navigate(route));
        }

        let fields = self
            .config
            .view_fields()
            .iter()
            .map(|f| DisplayField {
                key: f.key.clone(),
                label: f.label.clone(),
                value: f.display(&row.record),
            })
            .collect();
        self.state.write().await.dialog = Some(Dialog::View {
            row_id: row.id,
            fields,
        });
        Ok(ViewOutcome::Dialog)
    }

    /// Open the edit dialog with a draft copy of the row.
    pub async fn open_edit(&self, row_id: &str) -> ViewResult<()> {
        if !self.config.capabilities.can_edit {
            return Err(ViewError::NotPermitted("Editing"));
        }
        let row = self.find_row(row_id).await?;
        let original_key = self.config.primary_key.extract(&row.record)?;
        self.state.write().await.dialog = Some(Dialog::Edit {
            row_id: row.id,
            original_key,
            draft: row.record,
            error: None,
        });
        Ok(())
    }

    /// Open the add dialog with an empty draft of the editable fields.
    pub async fn open_add(&self) -> ViewResult<()> {
        if !self.config.capabilities.can_add {
            return Err(ViewError::NotPermitted("Adding"));
        }
        let draft = self
            .config
            .detail_fields
            .iter()
            .filter(|f| !f.read_only)
            .map(|f| (f.key.clone(), f.kind.empty_value()))
            .collect();
        self.state.write().await.dialog = Some(Dialog::Add { draft, error: None });
        Ok(())
    }

    /// Ask for confirmation before deleting a row.
    pub async fn request_delete(&self, row_id: &str) -> ViewResult<()> {
        if !self.config.capabilities.can_delete {
            return Err(ViewError::NotPermitted("Deleting"));
        }
        let row = self.find_row(row_id).await?;
        let key = match &self.config.delete_key {
            DeleteKey::PrimaryKey => self.config.primary_key.extract(&row.record)?,
            DeleteKey::Field(field) => PrimaryKey::single(field.clone()).extract(&row.record)?,
        };
        self.state.write().await.dialog = Some(Dialog::ConfirmDelete { row_id: row.id, key });
        Ok(())
    }

    /// Close any dialog, discarding its draft.
    pub async fn cancel(&self) {
        self.state.write().await.dialog = None;
    }

    /// Parse `raw` through the field's kind into the open draft.
    pub async fn set_field(&self, key: &str, raw: &str) -> ViewResult<()> {
        let (label, kind) = match self.config.field(key) {
            Some(field) if field.read_only => {
                return Err(ViewError::NotPermitted("Editing a read-only field"))
            }
            Some(field) => (field.label.clone(), field.kind.clone()),
            None => (key.to_string(), FieldKind::Text),
        };

        let mut state = self.state.write().await;
        let dialog = state.dialog.as_mut().ok_or(ViewError::NoDialog)?;
        let draft = match dialog {
            Dialog::Edit { draft, .. } | Dialog::Add { draft, .. } => draft,
            Dialog::View { .. } | Dialog::ConfirmDelete { .. } => return Err(ViewError::NoDialog),
        };
        match kind.parse_input(&label, raw) {
            Ok(value) => {
                draft.insert(key.to_string(), value);
                Ok(())
            }
            Err(e) => {
                let err = ViewError::from(e);
                dialog.set_error(err.user_message());
                Err(err)
            }
        }
    }

    /// Submit the open add/edit dialog.
    ///
    /// Missing required fields block the save with an inline message and
    /// no request. On success the dialog closes and the page reloads; on
    /// failure the dialog stays open.
    pub async fn save(&self) -> ViewResult<()> {
        let dialog = self.state.read().await.dialog.clone().ok_or(ViewError::NoDialog)?;
        let (draft, original_key) = match dialog {
            Dialog::Add { draft, .. } => (draft, None),
            Dialog::Edit {
                draft, original_key, ..
            } => (draft, Some(original_key)),
            Dialog::View { .. } | Dialog::ConfirmDelete { .. } => return Err(ViewError::NoDialog),
        };

        if let Err(e) = validate_required(&self.config.detail_fields, &draft) {
            let err = ViewError::from(e);
            if let Some(dialog) = self.state.write().await.dialog.as_mut() {
                dialog.set_error(err.user_message());
            }
            return Err(err);
        }

        let entity = self.config.resource.entity_name();
        let result = match &original_key {
            None => self.service.create(&draft).await.map(|_| format!("{entity} created")),
            Some(key) => self
                .service
                .update(key, &draft)
                .await
                .map(|_| format!("{entity} updated")),
        };

        match result {
            Ok(message) => {
                {
                    let mut state = self.state.write().await;
                    state.dialog = None;
                    state.notifications.push(Snackbar::success(message));
                }
                self.load().await
            }
            Err(e) => {
                tracing::error!(resource = %self.config.resource, error = %e, "Failed to save record");
                let message = e.user_message();
                let mut state = self.state.write().await;
                if let Some(dialog) = state.dialog.as_mut() {
                    dialog.set_error(message.clone());
                }
                state
                    .notifications
                    .push(Snackbar::error(format!("Failed to save {entity}: {message}")));
                Err(e.into())
            }
        }
    }

    /// Perform the delete confirmed in the open dialog, then reload.
    pub async fn confirm_delete(&self) -> ViewResult<()> {
        let key = match self.state.read().await.dialog.clone() {
            Some(Dialog::ConfirmDelete { key, .. }) => key,
            _ => return Err(ViewError::NoDialog),
        };

        let entity = self.config.resource.entity_name();
        match self.service.delete(&key).await {
            Ok(()) => {
                {
                    let mut state = self.state.write().await;
                    state.dialog = None;
                    state.notifications.push(Snackbar::success(format!("{entity} deleted")));
                }
                self.load().await
            }
            Err(e) => {
                tracing::error!(resource = %self.config.resource, %key, error = %e, "Failed to delete record");
                self.state
                    .write()
                    .await
                    .notifications
                    .push(Snackbar::error(format!("Failed to delete {entity}: {}", e.user_message())));
                Err(e.into())
            }
        }
    }

    // -- plots --------------------------------------------------------------

    /// Show or hide the plot panel, returning whether it is now shown.
    ///
    /// Statistics are fetched once, the first time plots are shown; a
    /// failed fetch only warns and plots are generated without them.
    pub async fn toggle_plots(&self) -> ViewResult<bool> {
        let (show, need_stats) = {
            let mut state = self.state.write().await;
            state.show_plots = !state.show_plots;
            if !state.show_plots {
                state.plots.clear();
            }
            let need_stats =
                state.show_plots && !self.config.plot_configs.is_empty() && !state.stats_fetched;
            (state.show_plots, need_stats)
        };
        if !show || self.config.plot_configs.is_empty() {
            return Ok(show);
        }

        let fetched = if need_stats {
            match self.service.get_statistics().await {
                Ok(stats) => Some(Some(stats)),
                Err(e) => {
                    tracing::warn!(resource = %self.config.resource, error = %e, "Statistics unavailable");
                    Some(None)
                }
            }
        } else {
            None
        };

        let mut state = self.state.write().await;
        if let Some(stats) = fetched {
            if stats.is_none() {
                state
                    .notifications
                    .push(Snackbar::warning("Statistics unavailable; showing page data only"));
            }
            state.stats = stats;
            state.stats_fetched = true;
        }
        if state.show_plots {
            state.plots = self.render_plots(&state.rows, state.stats.as_ref());
        }
        Ok(state.show_plots)
    }

    pub async fn plots_visible(&self) -> bool {
        self.state.read().await.show_plots
    }

    pub async fn plots(&self) -> Vec<RenderedPlot> {
        self.state.read().await.plots.clone()
    }

    fn render_plots(&self, rows: &[GridRow], stats: Option<&Value>) -> Vec<RenderedPlot> {
        let records: Vec<Record> = rows.iter().map(|row| row.record.clone()).collect();
        self.config
            .plot_configs
            .iter()
            .map(|plot| RenderedPlot {
                title: plot.title.clone(),
                layout: plot.layout.clone(),
                data: plot.generate(&records, stats),
            })
            .collect()
    }

    // -- notifications -------------------------------------------------------

    /// Drain queued notifications, oldest first.
    pub async fn take_notifications(&self) -> Vec<Snackbar> {
        self.state.write().await.notifications.take()
    }
}

fn is_null(value: Option<&Value>) -> bool {
    value.map_or(true, Value::is_null)
}

/// Order JSON values for sorting: nulls last, numbers numerically, the
/// rest by their plain text.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(x), Some(y)) => value_to_plain(x)
            .to_lowercase()
            .cmp(&value_to_plain(y).to_lowercase()),
    }
}

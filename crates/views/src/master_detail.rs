//! Master-detail view model: a searchable list of one resource and, for the
//! selected record, lazily loaded related rows from other resources joined
//! on `pdb_id`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use pdbw_client::{ApiService, ListQuery, ServiceRegistry};
use pdbw_core::fields::{validate_required, ColumnDef, FieldDescriptor, FieldKind};
use pdbw_core::pagination::{page_offset, PageCount, DEFAULT_PAGE_SIZE};
use pdbw_core::row_id::{assign_row_ids, GridRow, PrimaryKey};
use pdbw_core::{Record, ResourceKind};

use crate::error::{ViewError, ViewResult};
use crate::notify::{Notifications, Snackbar};
use crate::table::DisplayField;

/// Field joining related resources to the master record.
const JOIN_FIELD: &str = "pdb_id";

/// A related resource shown under the selected record.
#[derive(Debug, Clone)]
pub struct Relationship {
    pub key: String,
    pub label: String,
    pub resource: ResourceKind,
    pub primary_key: PrimaryKey,
    pub columns: Vec<ColumnDef>,
    pub edit_fields: Vec<FieldDescriptor>,
}

impl Relationship {
    pub fn new(
        key: impl Into<String>,
        label: impl Into<String>,
        resource: ResourceKind,
        primary_key: PrimaryKey,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            resource,
            primary_key,
            columns: Vec::new(),
            edit_fields: Vec::new(),
        }
    }

    pub fn columns(mut self, columns: Vec<ColumnDef>) -> Self {
        self.columns = columns;
        self
    }

    pub fn edit_fields(mut self, fields: Vec<FieldDescriptor>) -> Self {
        self.edit_fields = fields;
        self
    }
}

#[derive(Debug, Clone)]
pub struct MasterDetailConfig {
    pub title: String,
    pub resource: ResourceKind,
    pub primary_key: PrimaryKey,
    pub columns: Vec<ColumnDef>,
    pub detail_fields: Vec<FieldDescriptor>,
    pub relationships: Vec<Relationship>,
    pub form_fields: Vec<FieldDescriptor>,
    pub page_size: u32,
}

impl MasterDetailConfig {
    fn relationship(&self, key: &str) -> ViewResult<&Relationship> {
        self.relationships
            .iter()
            .find(|r| r.key == key)
            .ok_or_else(|| ViewError::UnknownRelationship(key.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    List,
    Detail { row_id: String },
}

#[derive(Debug)]
struct MasterDetailState {
    rows: Vec<GridRow>,
    page: u32,
    search: String,
    mode: Mode,
    selected: Option<GridRow>,
    relations: HashMap<String, Vec<GridRow>>,
    notifications: Notifications,
}

pub struct MasterDetailView {
    config: MasterDetailConfig,
    master: Arc<dyn ApiService>,
    related: HashMap<String, Arc<dyn ApiService>>,
    state: RwLock<MasterDetailState>,
    generation: AtomicU64,
    /// Bumped on every selection change; relationship fetches started under
    /// an older selection are not cached.
    selection: AtomicU64,
}

impl MasterDetailView {
    /// Resolve the master and every relationship service from `registry`.
    pub fn new(config: MasterDetailConfig, registry: &ServiceRegistry) -> ViewResult<Self> {
        let master = registry.get(config.resource)?;
        let related = config
            .relationships
            .iter()
            .map(|r| -> ViewResult<(String, Arc<dyn ApiService>)> {
                Ok((r.key.clone(), registry.get(r.resource)?))
            })
            .collect::<ViewResult<HashMap<_, _>>>()?;
        Ok(Self {
            config,
            master,
            related,
            state: RwLock::new(MasterDetailState {
                rows: Vec::new(),
                page: 0,
                search: String::new(),
                mode: Mode::List,
                selected: None,
                relations: HashMap::new(),
                notifications: Notifications::default(),
            }),
            generation: AtomicU64::new(0),
            selection: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &MasterDetailConfig {
        &self.config
    }

    fn page_size(&self) -> u32 {
        if self.config.page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            self.config.page_size
        }
    }

    // -- list mode ----------------------------------------------------------

    pub async fn load(&self) -> ViewResult<()> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let query = {
            let state = self.state.read().await;
            let query = ListQuery::page(self.page_size(), page_offset(state.page, self.page_size()));
            if state.search.trim().is_empty() {
                query
            } else {
                query.with_search(state.search.clone())
            }
        };

        let result = self.master.get_all(&query).await;
        let mut state = self.state.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(resource = %self.config.resource, generation, "Discarding stale page");
            return Ok(());
        }
        match result {
            Ok(page) => {
                state.rows = assign_row_ids(page.rows, &self.config.primary_key);
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

    pub async fn set_search(&self, search: impl Into<String>) -> ViewResult<()> {
        {
            let mut state = self.state.write().await;
            state.search = search.into();
            state.page = 0;
        }
        self.load().await
    }

    pub async fn set_page(&self, page: u32) -> ViewResult<()> {
        self.state.write().await.page = page;
        self.load().await
    }

    pub async fn next_page(&self) -> ViewResult<()> {
        let page = self.page().await;
        self.set_page(page.saturating_add(1)).await
    }

    pub async fn prev_page(&self) -> ViewResult<()> {
        let page = self.page().await;
        self.set_page(page.saturating_sub(1)).await
    }

    pub async fn page(&self) -> u32 {
        self.state.read().await.page
    }

    /// The list endpoint reports no usable total here.
    pub fn page_count(&self) -> PageCount {
        PageCount::Unknown
    }

    pub async fn has_next_page(&self) -> bool {
        self.page_count().has_next(self.page().await)
    }

    pub async fn rows(&self) -> Vec<GridRow> {
        self.state.read().await.rows.clone()
    }

    pub async fn mode(&self) -> Mode {
        self.state.read().await.mode.clone()
    }

    /// Post a new master record from the form fields, then reload the list.
    pub async fn create_record(&self, form: &Record) -> ViewResult<Record> {
        validate_required(&self.config.form_fields, form)?;
        let body: Record = form
            .iter()
            .filter(|(key, value)| {
                !value.is_null() && self.config.form_fields.iter().any(|f| &f.key == *key)
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let entity = self.config.resource.entity_name();
        match self.master.create(&body).await {
            Ok(created) => {
                self.state
                    .write()
                    .await
                    .notifications
                    .push(Snackbar::success(format!("{entity} created")));
                self.load().await?;
                Ok(created)
            }
            Err(e) => {
                tracing::error!(resource = %self.config.resource, error = %e, "Failed to create record");
                self.state
                    .write()
                    .await
                    .notifications
                    .push(Snackbar::error(format!("Failed to create {entity}: {}", e.user_message())));
                Err(e.into())
            }
        }
    }

    // -- detail mode --------------------------------------------------------

    /// Switch to detail mode for `row_id`, returning its flattened fields.
    pub async fn select(&self, row_id: &str) -> ViewResult<Vec<DisplayField>> {
        let mut state = self.state.write().await;
        let row = state
            .rows
            .iter()
            .find(|r| r.id == row_id)
            .cloned()
            .ok_or_else(|| ViewError::UnknownRow(row_id.to_string()))?;
        let fields = self.detail_fields(&row.record);
        self.selection.fetch_add(1, Ordering::SeqCst);
        state.mode = Mode::Detail {
            row_id: row.id.clone(),
        };
        state.selected = Some(row);
        state.relations.clear();
        Ok(fields)
    }

    pub async fn selected(&self) -> Option<GridRow> {
        self.state.read().await.selected.clone()
    }

    /// Return to list mode, forgetting the selection and its relationships.
    pub async fn back(&self) {
        let mut state = self.state.write().await;
        self.selection.fetch_add(1, Ordering::SeqCst);
        state.mode = Mode::List;
        state.selected = None;
        state.relations.clear();
    }

    fn detail_fields(&self, record: &Record) -> Vec<DisplayField> {
        let flat = flatten(record);
        let mut fields: Vec<DisplayField> = self
            .config
            .detail_fields
            .iter()
            .map(|f| DisplayField {
                key: f.key.clone(),
                label: f.label.clone(),
                value: f.kind.display(flat.get(&f.key).unwrap_or(&Value::Null), &flat),
            })
            .collect();
        for (key, value) in &flat {
            if !self.config.detail_fields.iter().any(|f| &f.key == key) {
                fields.push(DisplayField {
                    key: key.clone(),
                    label: key.clone(),
                    value: FieldKind::Text.display(value, &flat),
                });
            }
        }
        fields
    }

    async fn selected_pdb_id(&self) -> ViewResult<String> {
        Ok(self.selected_join().await?.0)
    }

    /// The selected record's `pdb_id` together with the selection generation
    /// it belongs to.
    async fn selected_join(&self) -> ViewResult<(String, u64)> {
        let state = self.state.read().await;
        let selected = state.selected.as_ref().ok_or(ViewError::NoSelection)?;
        let pdb_id = selected
            .record
            .get(JOIN_FIELD)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(ViewError::NoSelection)?;
        Ok((pdb_id, self.selection.load(Ordering::SeqCst)))
    }

    /// Rows of a relationship for the selected record, fetched on first use.
    pub async fn open_relationship(&self, key: &str) -> ViewResult<Vec<GridRow>> {
        if let Some(rows) = self.state.read().await.relations.get(key) {
            return Ok(rows.clone());
        }
        self.refresh_relationship(key).await
    }

    /// Re-fetch a relationship regardless of the cache.
    ///
    /// Rows fetched for a selection that has since changed are returned to
    /// the caller but never cached.
    pub async fn refresh_relationship(&self, key: &str) -> ViewResult<Vec<GridRow>> {
        let relationship = self.config.relationship(key)?;
        let service = self.service_for(key)?;
        let (pdb_id, selection) = self.selected_join().await?;

        let result = service.get_by_pdb(&pdb_id).await;
        let mut state = self.state.write().await;
        if self.selection.load(Ordering::SeqCst) != selection {
            tracing::debug!(relationship = key, %pdb_id, selection, "Discarding related rows for a previous selection");
            return result
                .map(|rows| assign_row_ids(rows, &relationship.primary_key))
                .map_err(Into::into);
        }

        let rows = match result {
            Ok(rows) => assign_row_ids(rows, &relationship.primary_key),
            Err(e) => {
                tracing::error!(relationship = key, %pdb_id, error = %e, "Failed to load related rows");
                state.notifications.push(Snackbar::error(format!(
                    "Failed to load {}: {}",
                    relationship.label,
                    e.user_message()
                )));
                return Err(e.into());
            }
        };
        tracing::debug!(relationship = key, %pdb_id, rows = rows.len(), "Relationship loaded");
        state.relations.insert(key.to_string(), rows.clone());
        Ok(rows)
    }

    /// Create a related row; the selected record's `pdb_id` is always set.
    pub async fn add_relation(&self, key: &str, draft: Record) -> ViewResult<Vec<GridRow>> {
        let relationship = self.config.relationship(key)?;
        let service = self.service_for(key)?;
        let pdb_id = self.selected_pdb_id().await?;

        validate_required(&relationship.edit_fields, &draft)?;
        let mut body = draft;
        body.insert(JOIN_FIELD.to_string(), Value::String(pdb_id));

        if let Err(e) = service.create(&body).await {
            tracing::error!(relationship = key, error = %e, "Failed to add related row");
            self.state.write().await.notifications.push(Snackbar::error(format!(
                "Failed to add to {}: {}",
                relationship.label,
                e.user_message()
            )));
            return Err(e.into());
        }
        self.state
            .write()
            .await
            .notifications
            .push(Snackbar::success(format!("Added to {}", relationship.label)));
        self.refresh_relationship(key).await
    }

    /// Delete a related row by its grid id.
    pub async fn remove_relation(&self, key: &str, row_id: &str) -> ViewResult<Vec<GridRow>> {
        let relationship = self.config.relationship(key)?;
        let service = self.service_for(key)?;
        let row = self
            .state
            .read()
            .await
            .relations
            .get(key)
            .and_then(|rows| rows.iter().find(|r| r.id == row_id).cloned())
            .ok_or_else(|| ViewError::UnknownRow(row_id.to_string()))?;
        let record_key = relationship.primary_key.extract(&row.record)?;

        if let Err(e) = service.delete(&record_key).await {
            tracing::error!(relationship = key, key = %record_key, error = %e, "Failed to remove related row");
            self.state.write().await.notifications.push(Snackbar::error(format!(
                "Failed to remove from {}: {}",
                relationship.label,
                e.user_message()
            )));
            return Err(e.into());
        }
        self.state
            .write()
            .await
            .notifications
            .push(Snackbar::success(format!("Removed from {}", relationship.label)));
        self.refresh_relationship(key).await
    }

    fn service_for(&self, key: &str) -> ViewResult<&Arc<dyn ApiService>> {
        self.related
            .get(key)
            .ok_or_else(|| ViewError::UnknownRelationship(key.to_string()))
    }

    pub async fn take_notifications(&self) -> Vec<Snackbar> {
        self.state.write().await.notifications.take()
    }
}

/// Flatten nested objects into `parent.child` keys.
pub fn flatten(record: &Record) -> Record {
    fn walk(prefix: &str, record: &Record, out: &mut Record) {
        for (key, value) in record {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            match value {
                Value::Object(inner) => walk(&path, inner, out),
                other => {
                    out.insert(path, other.clone());
                }
            }
        }
    }

    let mut out = Record::new();
    walk("", record, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::testing::{record, Call, MockService};

    struct Fixture {
        proteins: Arc<MockService>,
        ligands: Arc<MockService>,
        view: MasterDetailView,
    }

    async fn fixture() -> Fixture {
        let proteins = Arc::new(MockService::new(
            ResourceKind::ProteinInfo,
            &["pdb_id"],
            vec![
                json!({ "pdb_id": "1ABC", "title": "Lysozyme", "source": { "organism": "Gallus gallus", "tissue": "egg white" } }),
                json!({ "pdb_id": "2XYZ", "title": "Hemoglobin" }),
            ],
        ));
        let ligands = Arc::new(MockService::new(
            ResourceKind::Ligands,
            &["pdb_id", "ligand_id"],
            vec![
                json!({ "pdb_id": "1ABC", "ligand_id": "NAG" }),
                json!({ "pdb_id": "2XYZ", "ligand_id": "HEM" }),
            ],
        ));

        let mut registry = ServiceRegistry::new();
        registry.insert(proteins.clone());
        registry.insert(ligands.clone());

        let config = MasterDetailConfig {
            title: "Explorer".into(),
            resource: ResourceKind::ProteinInfo,
            primary_key: PrimaryKey::single("pdb_id"),
            columns: vec![ColumnDef::text("pdb_id", "PDB ID")],
            detail_fields: vec![FieldDescriptor::text("title", "Title")],
            relationships: vec![Relationship::new(
                "ligands",
                "Ligands",
                ResourceKind::Ligands,
                PrimaryKey::composite(["pdb_id", "ligand_id"]),
            )
            .edit_fields(vec![FieldDescriptor::text("ligand_id", "Ligand ID").required()])],
            form_fields: vec![
                FieldDescriptor::text("pdb_id", "PDB ID").required(),
                FieldDescriptor::text("title", "Title"),
            ],
            page_size: 10,
        };
        let view = MasterDetailView::new(config, &registry).unwrap();
        view.load().await.unwrap();
        Fixture {
            proteins,
            ligands,
            view,
        }
    }

    #[tokio::test]
    async fn page_count_is_indeterminate() {
        let f = fixture().await;
        assert_eq!(f.view.page_count(), PageCount::Unknown);
        assert_eq!(f.view.page_count().as_count(), -1);
        assert!(f.view.has_next_page().await);
        f.view.next_page().await.unwrap();
        assert!(f.view.has_next_page().await);
        assert!(f.proteins.calls().contains(&Call::GetAll(ListQuery::page(10, 10))));
    }

    #[tokio::test]
    async fn select_flattens_nested_fields() {
        let f = fixture().await;
        let fields = f.view.select("1ABC").await.unwrap();

        assert_eq!(fields[0].label, "Title");
        assert_eq!(fields[0].value, "Lysozyme");
        assert!(fields
            .iter()
            .any(|d| d.key == "source.organism" && d.value == "Gallus gallus"));
        assert_eq!(f.view.mode().await, Mode::Detail { row_id: "1ABC".into() });

        f.view.back().await;
        assert_eq!(f.view.mode().await, Mode::List);
        assert_eq!(f.view.selected().await, None);
    }

    #[tokio::test]
    async fn relationships_load_lazily_and_cache() {
        let f = fixture().await;
        assert_matches!(f.view.open_relationship("ligands").await, Err(ViewError::NoSelection));

        f.view.select("1ABC").await.unwrap();
        let rows = f.view.open_relationship("ligands").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "1ABC_NAG");
        f.view.open_relationship("ligands").await.unwrap();

        assert_eq!(f.ligands.count_calls(|c| matches!(c, Call::GetByPdb(_))), 1);
        assert_matches!(
            f.view.open_relationship("authors").await,
            Err(ViewError::UnknownRelationship(_))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn related_rows_for_a_previous_selection_are_not_cached() {
        let f = fixture().await;
        f.ligands.delay_pdb("1ABC", Duration::from_millis(500));
        f.view.select("1ABC").await.unwrap();

        let (earlier, current) = tokio::join!(f.view.open_relationship("ligands"), async {
            f.view.select("2XYZ").await.unwrap();
            f.view.open_relationship("ligands").await
        });

        // The slow request still answers its own caller.
        assert_eq!(earlier.unwrap()[0].id, "1ABC_NAG");
        assert_eq!(current.unwrap()[0].id, "2XYZ_HEM");

        let cached = f.view.open_relationship("ligands").await.unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].id, "2XYZ_HEM");
        assert_eq!(f.ligands.count_calls(|c| matches!(c, Call::GetByPdb(_))), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn going_back_drops_an_in_flight_relationship() {
        let f = fixture().await;
        f.ligands.delay_pdb("1ABC", Duration::from_millis(500));
        f.view.select("1ABC").await.unwrap();

        let (earlier, ()) = tokio::join!(f.view.open_relationship("ligands"), f.view.back());
        assert!(earlier.is_ok());
        assert!(f.view.state.read().await.relations.is_empty());
        assert_eq!(f.view.mode().await, Mode::List);
    }

    #[tokio::test]
    async fn add_relation_attaches_parent_pdb_id() {
        let f = fixture().await;
        f.view.select("1ABC").await.unwrap();

        let rows = f
            .view
            .add_relation("ligands", record(json!({ "ligand_id": "SO4", "pdb_id": "9ZZZ" })))
            .await
            .unwrap();

        let created = f
            .ligands
            .calls()
            .into_iter()
            .find_map(|c| match c {
                Call::Create(body) => Some(body),
                _ => None,
            })
            .unwrap();
        assert_eq!(created["pdb_id"], "1ABC");
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn remove_relation_deletes_by_composite_key() {
        let f = fixture().await;
        f.view.select("2XYZ").await.unwrap();
        f.view.open_relationship("ligands").await.unwrap();

        let rows = f.view.remove_relation("ligands", "2XYZ_HEM").await.unwrap();
        assert!(rows.is_empty());
        assert!(f
            .ligands
            .calls()
            .contains(&Call::Delete(pdbw_core::row_id::RecordKey::from_segments(["2XYZ", "HEM"]))));
    }

    #[tokio::test]
    async fn create_record_posts_form_fields_and_reloads() {
        let f = fixture().await;
        let form = record(json!({ "pdb_id": "4NEW", "title": "Fresh", "scratch": "ignored" }));
        f.view.create_record(&form).await.unwrap();

        let created = f
            .proteins
            .calls()
            .into_iter()
            .find_map(|c| match c {
                Call::Create(body) => Some(body),
                _ => None,
            })
            .unwrap();
        assert!(!created.contains_key("scratch"));
        assert_eq!(f.view.rows().await.len(), 3);

        let err = f.view.create_record(&record(json!({ "title": "No id" }))).await;
        assert_matches!(err, Err(ViewError::Core(_)));
    }

    #[test]
    fn flatten_joins_nested_keys() {
        let flat = flatten(&record(json!({ "a": 1, "b": { "c": 2, "d": { "e": 3 } } })));
        assert_eq!(flat["b.c"], 2);
        assert_eq!(flat["b.d.e"], 3);
        assert_eq!(flat.len(), 3);
    }
}

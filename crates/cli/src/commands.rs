//! Subcommand execution: each command drives a view or client and prints
//! the result.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use serde_json::{json, Value};

use pdbw_client::{
    AuthClient, ClientConfig, GlobalSearch, HttpTransport, ListQuery, ResourceClient, SearchClient,
    ServiceRegistry, Session, SessionEvent,
};
use pdbw_core::fields::value_to_plain;
use pdbw_core::forms::{ForgotPasswordForm, LoginForm, RegisterForm, ResetPasswordForm};
use pdbw_core::history::HistoryEntry;
use pdbw_core::pagination::{clamp_page_size, page_offset, PageCount};
use pdbw_core::pdb::{pdb_file_url, structure_image_url, PdbFileFormat, PdbId};
use pdbw_core::routes::Route;
use pdbw_core::row_id::{GridRow, RecordKey};
use pdbw_core::{Record, ResourceKind};
use pdbw_views::auth::{AuthFlows, AuthOutcome};
use pdbw_views::master_detail::Relationship;
use pdbw_views::nav::{nav_bar, toggle_theme};
use pdbw_views::pages::{explorer, protein_info, table_config};
use pdbw_views::table::{DisplayField, SortDirection};
use pdbw_views::{DataTableView, DebouncedSearch, MasterDetailView, SearchUpdate, Snackbar};

use crate::cli::{Command, FindArgs, ListArgs, PageArgs, ThemeArg};
use crate::output;

/// History kind for structured searches.
const ADVANCED_SEARCH_KIND: &str = "advanced";

pub struct App {
    config: ClientConfig,
    session: Arc<Session>,
    transport: HttpTransport,
    registry: ServiceRegistry,
    json: bool,
}

impl App {
    pub fn new(config: ClientConfig, session: Arc<Session>, json: bool) -> anyhow::Result<Self> {
        let transport = HttpTransport::new(&config, Arc::clone(&session))
            .context("Failed to build HTTP client")?;
        let registry = ServiceRegistry::from_transport(&transport, &config);
        Ok(Self {
            config,
            session,
            transport,
            registry,
            json,
        })
    }

    pub async fn run(&self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::List(args) => self.list(args).await,
            Command::Get { resource, key } => self.get(resource, key).await,
            Command::Create { resource, fields } => self.create(resource, fields).await,
            Command::Update {
                resource,
                row_id,
                page,
                fields,
            } => self.update(resource, &row_id, &page, fields).await,
            Command::Delete {
                resource,
                row_id,
                page,
                yes,
            } => self.delete(resource, &row_id, &page, yes).await,
            Command::Stats { resource } => self.stats(resource).await,
            Command::Count { resource } => self.count(resource).await,
            Command::Search { query, open } => self.search(&query, open).await,
            Command::Find(args) => self.find(args).await,
            Command::Explore {
                pdb_id,
                relation,
                add,
                remove,
            } => self.explore(&pdb_id, relation, add, remove).await,
            Command::Urls { pdb_id } => self.urls(&pdb_id),
            Command::History { clear } => self.history(clear).await,
            Command::Nav => self.nav().await,
            Command::Login { email, password } => {
                let outcome = self.auth().login(&LoginForm { email, password }).await?;
                self.print_outcome(outcome);
                Ok(())
            }
            Command::Logout => {
                let outcome = self.auth().logout().await?;
                self.print_outcome(outcome);
                Ok(())
            }
            Command::Register {
                name,
                email,
                password,
                confirm_password,
            } => {
                let form = RegisterForm {
                    name,
                    email,
                    password,
                    confirm_password,
                };
                let outcome = self.auth().register(&form).await?;
                self.print_outcome(outcome);
                Ok(())
            }
            Command::ForgotPassword { email } => {
                let outcome = self.auth().forgot_password(&ForgotPasswordForm { email }).await?;
                self.print_outcome(outcome);
                Ok(())
            }
            Command::ResetPassword {
                token,
                password,
                confirm_password,
            } => {
                let form = ResetPasswordForm {
                    token,
                    password,
                    confirm_password,
                };
                let outcome = self.auth().reset_password(&form).await?;
                self.print_outcome(outcome);
                Ok(())
            }
            Command::VerifyEmail { token } => {
                let outcome = self.auth().verify_email(&token).await?;
                self.print_outcome(outcome);
                Ok(())
            }
            Command::Whoami => self.whoami().await,
            Command::Theme { mode } => self.theme(mode).await,
            Command::Sync => self.sync().await,
        }
    }

    fn auth(&self) -> AuthFlows {
        AuthFlows::new(AuthClient::new(self.transport.clone()))
    }

    fn print_json(&self, value: &Value) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    fn print_outcome(&self, outcome: AuthOutcome) {
        print_notices(&[outcome.notice]);
        if let Some(route) = outcome.redirect {
            tracing::debug!(%route, "Auth flow redirect");
            println!("next: {route}");
        }
    }

    // -- tables -------------------------------------------------------------

    /// Open the table page for `kind` at the requested page and search.
    async fn table(&self, kind: ResourceKind, page: &PageArgs) -> anyhow::Result<DataTableView> {
        let mut config = table_config(kind);
        if let Some(size) = page.page_size {
            config = config.page_size(clamp_page_size(Some(size)));
        }
        let view = DataTableView::new(config, self.registry.get(kind)?);
        match page.search.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(search) => {
                view.set_search(search).await?;
                if page.page > 0 {
                    view.set_page(page.page).await?;
                }
            }
            None => view.set_page(page.page).await?,
        }
        Ok(view)
    }

    async fn list(&self, args: ListArgs) -> anyhow::Result<()> {
        let view = self.table(args.resource, &args.page).await?;
        if let Some(field) = args.sort {
            let direction = if args.desc {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            };
            view.set_sort(field, direction).await;
        }
        if let Some((field, needle)) = args.filter {
            view.set_filter(field, needle).await;
        }
        if args.plots {
            view.toggle_plots().await?;
        }

        let page = view.page().await;
        let page_count = view.page_count().await;
        if self.json {
            let rows: Vec<Value> = view.visible_rows().await.into_iter().map(row_json).collect();
            self.print_json(&json!({
                "page": page,
                "page_size": view.page_size().await,
                "total": view.total().await,
                "page_count": page_count.as_count(),
                "rows": rows,
                "plots": view.plots().await,
            }))?;
        } else {
            let headers: Vec<String> = view.config().columns.iter().map(|c| c.header.clone()).collect();
            println!("{}", view.config().title);
            println!("{}", output::table(&headers, &view.render_rows().await));
            println!("{}", pager_line(page, page_count, view.total().await));
            for plot in view.plots().await {
                println!("\n{}", output::plot(&plot));
            }
        }
        print_notices(&view.take_notifications().await);
        Ok(())
    }

    async fn get(&self, kind: ResourceKind, key: Vec<String>) -> anyhow::Result<()> {
        let key = RecordKey::from_segments(key);
        let record = self.registry.get(kind)?.get_by_id(&key).await?;
        if self.json {
            return self.print_json(&Value::Object(record));
        }
        let fields: Vec<DisplayField> = table_config(kind)
            .view_fields()
            .iter()
            .map(|f| DisplayField {
                key: f.key.clone(),
                label: f.label.clone(),
                value: f.display(&record),
            })
            .collect();
        println!("{}", output::fields(&fields));
        Ok(())
    }

    async fn create(&self, kind: ResourceKind, fields: Vec<(String, String)>) -> anyhow::Result<()> {
        let view = DataTableView::new(table_config(kind), self.registry.get(kind)?);
        view.open_add().await?;
        for (field, value) in &fields {
            view.set_field(field, value).await?;
        }
        let saved = view.save().await;
        print_notices(&view.take_notifications().await);
        Ok(saved?)
    }

    async fn update(
        &self,
        kind: ResourceKind,
        row_id: &str,
        page: &PageArgs,
        fields: Vec<(String, String)>,
    ) -> anyhow::Result<()> {
        let view = self.table(kind, page).await?;
        view.open_edit(row_id).await?;
        for (field, value) in &fields {
            view.set_field(field, value).await?;
        }
        let saved = view.save().await;
        print_notices(&view.take_notifications().await);
        Ok(saved?)
    }

    async fn delete(&self, kind: ResourceKind, row_id: &str, page: &PageArgs, yes: bool) -> anyhow::Result<()> {
        let view = self.table(kind, page).await?;
        view.request_delete(row_id).await?;
        if !yes {
            view.cancel().await;
            bail!(
                "Deleting {} '{row_id}' cannot be undone; pass --yes to confirm",
                kind.entity_name()
            );
        }
        let deleted = view.confirm_delete().await;
        print_notices(&view.take_notifications().await);
        Ok(deleted?)
    }

    async fn stats(&self, kind: ResourceKind) -> anyhow::Result<()> {
        let stats = self.registry.get(kind)?.get_statistics().await?;
        self.print_json(&stats)
    }

    async fn count(&self, kind: ResourceKind) -> anyhow::Result<()> {
        let client = ResourceClient::new(kind, self.transport.clone(), self.config.relation_path);
        let count = client.count().await?;
        if self.json {
            self.print_json(&json!({ "resource": kind.slug(), "count": count }))
        } else {
            println!("{count}");
            Ok(())
        }
    }

    // -- search -------------------------------------------------------------

    async fn search(&self, query: &str, open: Option<usize>) -> anyhow::Result<()> {
        let global = GlobalSearch::from_registry(&self.registry)?;
        let search = DebouncedSearch::with_delay(global, Arc::clone(&self.session), Duration::ZERO);
        let hits = match search.input(query).await {
            SearchUpdate::Results(hits) => hits,
            SearchUpdate::Superseded => Vec::new(),
        };

        if let Some(n) = open {
            let hit = n
                .checked_sub(1)
                .and_then(|i| hits.get(i))
                .with_context(|| format!("No search result #{n} ({} found)", hits.len()))?;
            let route = search.select(query, hit).await?;
            println!("{route}");
            if let Route::ProteinDetail(id) = &route {
                self.print_urls(id);
            }
            return Ok(());
        }

        if self.json {
            let hits: Vec<Value> = hits
                .iter()
                .map(|h| {
                    json!({
                        "pdb_id": h.pdb_id,
                        "title": h.title,
                        "subtitle": h.subtitle,
                        "source": h.source.label(),
                    })
                })
                .collect();
            return self.print_json(&Value::Array(hits));
        }
        if hits.is_empty() {
            println!("No results");
        }
        for (i, hit) in hits.iter().enumerate() {
            let subtitle = hit.subtitle.as_deref().map(|s| format!(" ({s})")).unwrap_or_default();
            println!(
                "{:>2}. {} {}  {}{subtitle}  [{}]",
                i + 1,
                hit.source.icon(),
                hit.pdb_id,
                hit.title,
                hit.source.label()
            );
        }
        Ok(())
    }

    async fn find(&self, args: FindArgs) -> anyhow::Result<()> {
        let filter = args.filter();
        let size = clamp_page_size(args.page.page_size);
        let mut paging = ListQuery::page(size, page_offset(args.page.page, size));
        if let Some(q) = &args.page.search {
            paging = paging.with_search(q.clone());
        }
        let page = SearchClient::new(self.transport.clone()).advanced(&filter, &paging).await?;

        if !filter.is_empty() {
            let summary = serde_json::to_string(&filter)?;
            self.session
                .record_search(HistoryEntry::now(summary, ADVANCED_SEARCH_KIND))
                .await?;
        }

        if self.json {
            return self.print_json(&json!({ "total": page.total, "rows": page.rows }));
        }
        let columns = protein_info::config().columns;
        let headers: Vec<String> = columns.iter().map(|c| c.header.clone()).collect();
        let rows: Vec<(String, Vec<String>)> = page
            .rows
            .iter()
            .map(|row| {
                let id = row.get("pdb_id").map(value_to_plain).unwrap_or_default();
                (id, columns.iter().map(|c| c.render_cell(row)).collect())
            })
            .collect();
        println!("{}", output::table(&headers, &rows));
        println!("{}", pager_line(args.page.page, PageCount::from_total(page.total, size), page.total));
        Ok(())
    }

    // -- explorer -----------------------------------------------------------

    async fn explore(
        &self,
        pdb_id: &str,
        relation: Option<String>,
        add: Vec<(String, String)>,
        remove: Option<String>,
    ) -> anyhow::Result<()> {
        let pdb_id = PdbId::parse(pdb_id)?;
        let view = MasterDetailView::new(explorer::config(), &self.registry)?;
        view.set_search(pdb_id.as_str()).await?;
        let row = view
            .rows()
            .await
            .into_iter()
            .find(|row| {
                row.record
                    .get("pdb_id")
                    .and_then(Value::as_str)
                    .is_some_and(|id| id.eq_ignore_ascii_case(pdb_id.as_str()))
            })
            .with_context(|| format!("No structure {pdb_id} found"))?;
        let fields = view.select(&row.id).await?;

        let relationships: Vec<Relationship> = match &relation {
            Some(key) => view
                .config()
                .relationships
                .iter()
                .filter(|r| &r.key == key)
                .cloned()
                .collect(),
            None => view.config().relationships.clone(),
        };
        if let Some(key) = &relation {
            if relationships.is_empty() {
                bail!("Unknown relationship '{key}'");
            }
        }

        let mut sections = Vec::with_capacity(relationships.len());
        for relationship in &relationships {
            let mut rows = view.open_relationship(&relationship.key).await?;
            if let Some(row_id) = &remove {
                rows = view.remove_relation(&relationship.key, row_id).await?;
            } else if !add.is_empty() {
                let draft = relation_draft(relationship, &add)?;
                rows = view.add_relation(&relationship.key, draft).await?;
            }
            sections.push((relationship, rows));
        }

        if self.json {
            let related: serde_json::Map<String, Value> = sections
                .into_iter()
                .map(|(r, rows)| (r.key.clone(), Value::Array(rows.into_iter().map(row_json).collect())))
                .collect();
            self.print_json(&json!({ "record": row.record, "related": related }))?;
        } else {
            println!("{}", output::fields(&fields));
            for (relationship, rows) in sections {
                let headers: Vec<String> = relationship.columns.iter().map(|c| c.header.clone()).collect();
                let cells: Vec<(String, Vec<String>)> = rows
                    .iter()
                    .map(|row| {
                        let cells = relationship.columns.iter().map(|c| c.render_cell(&row.record)).collect();
                        (row.id.clone(), cells)
                    })
                    .collect();
                println!("\n-- {} ({}) --", relationship.label, rows.len());
                println!("{}", output::table(&headers, &cells));
            }
        }
        print_notices(&view.take_notifications().await);
        Ok(())
    }

    // -- misc ---------------------------------------------------------------

    fn urls(&self, pdb_id: &str) -> anyhow::Result<()> {
        let id = PdbId::parse(pdb_id)?;
        println!("{}", Route::ProteinDetail(id.clone()));
        self.print_urls(&id);
        Ok(())
    }

    fn print_urls(&self, id: &PdbId) {
        println!("image: {}", structure_image_url(id));
        println!("pdb:   {}", pdb_file_url(id, PdbFileFormat::Pdb));
        println!("cif:   {}", pdb_file_url(id, PdbFileFormat::Cif));
    }

    async fn history(&self, clear: bool) -> anyhow::Result<()> {
        if clear {
            self.session.clear_search_history().await?;
            print_notices(&[Snackbar::success("Search history cleared")]);
            return Ok(());
        }
        let history = self.session.search_history().await;
        if self.json {
            return self.print_json(&serde_json::to_value(&history)?);
        }
        if history.is_empty() {
            println!("No recent searches");
        }
        for entry in history.entries() {
            println!(
                "{}  {:<8}  {}",
                entry.timestamp.format("%Y-%m-%d %H:%M"),
                entry.kind,
                entry.query
            );
        }
        Ok(())
    }

    async fn nav(&self) -> anyhow::Result<()> {
        let bar = nav_bar(&self.session).await;
        for item in &bar.items {
            println!("{:<20} {}", item.label, item.route);
        }
        match &bar.user_name {
            Some(name) => println!("Signed in as {name}"),
            None => println!("Not signed in"),
        }
        println!("Theme: {}", bar.color_mode);
        Ok(())
    }

    async fn whoami(&self) -> anyhow::Result<()> {
        match self.session.user().await {
            Some(user) if self.json => self.print_json(&serde_json::to_value(&user)?),
            Some(user) => {
                println!("{} <{}> (id {})", user.name, user.email, user.id);
                Ok(())
            }
            None => {
                println!("Not signed in");
                Ok(())
            }
        }
    }

    async fn theme(&self, mode: Option<ThemeArg>) -> anyhow::Result<()> {
        let mode = match mode {
            None => self.session.color_mode().await,
            Some(ThemeArg::Toggle) => toggle_theme(&self.session).await?.color_mode,
            Some(ThemeArg::Light) => {
                self.session.set_color_mode(pdbw_client::ColorMode::Light).await?;
                pdbw_client::ColorMode::Light
            }
            Some(ThemeArg::Dark) => {
                self.session.set_color_mode(pdbw_client::ColorMode::Dark).await?;
                pdbw_client::ColorMode::Dark
            }
        };
        println!("{mode}");
        Ok(())
    }

    async fn sync(&self) -> anyhow::Result<()> {
        let events = self.session.sync().await?;
        if events.is_empty() {
            println!("Session unchanged");
        }
        for event in events {
            println!("{}", describe_event(&event));
        }
        Ok(())
    }
}

fn row_json(row: GridRow) -> Value {
    json!({ "id": row.id, "record": row.record })
}

fn print_notices(snackbars: &[Snackbar]) {
    for line in output::notices(snackbars) {
        eprintln!("{line}");
    }
}

fn pager_line(page: u32, count: PageCount, total: u64) -> String {
    match count {
        PageCount::Known(pages) => format!(
            "Page {} of {} ({total} records)",
            u64::from(page) + 1,
            pages.max(1)
        ),
        PageCount::Unknown => format!("Page {}", u64::from(page) + 1),
    }
}

fn describe_event(event: &SessionEvent) -> String {
    match event {
        SessionEvent::LoggedIn { user_name } => format!("Signed in as {user_name}"),
        SessionEvent::LoggedOut => "Signed out".to_string(),
        SessionEvent::ColorModeChanged(mode) => format!("Theme changed to {mode}"),
        SessionEvent::HistoryChanged => "Search history changed".to_string(),
    }
}

/// Build a related-row body from `field=value` pairs, typed by the
/// relationship's edit fields. Unknown fields are sent as text.
fn relation_draft(relationship: &Relationship, assignments: &[(String, String)]) -> anyhow::Result<Record> {
    let mut draft = Record::new();
    for (field, raw) in assignments {
        let value = match relationship.edit_fields.iter().find(|f| &f.key == field) {
            Some(descriptor) => descriptor.kind.parse_input(&descriptor.label, raw)?,
            None => Value::String(raw.clone()),
        };
        draft.insert(field.clone(), value);
    }
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdbw_core::fields::FieldKind;
    use pdbw_core::fields::FieldDescriptor;
    use pdbw_core::row_id::PrimaryKey;

    #[test]
    fn pager_line_formats() {
        assert_eq!(pager_line(0, PageCount::Known(3), 70), "Page 1 of 3 (70 records)");
        assert_eq!(pager_line(0, PageCount::Known(0), 0), "Page 1 of 1 (0 records)");
        assert_eq!(pager_line(4, PageCount::Unknown, 0), "Page 5");
        assert_eq!(pager_line(u32::MAX, PageCount::Unknown, 0), "Page 4294967296");
    }

    #[test]
    fn relation_draft_types_known_fields() {
        let relationship = Relationship::new("ligands", "Ligands", ResourceKind::Ligands, PrimaryKey::single("id"))
            .edit_fields(vec![
                FieldDescriptor::text("ligand_id", "Ligand ID"),
                FieldDescriptor::new("weight", "Weight", FieldKind::Number { integer: false }),
            ]);
        let draft = relation_draft(
            &relationship,
            &[
                ("ligand_id".into(), "HEM".into()),
                ("weight".into(), "616.5".into()),
                ("note".into(), "bound".into()),
            ],
        )
        .unwrap();
        assert_eq!(draft["ligand_id"], json!("HEM"));
        assert_eq!(draft["weight"], json!(616.5));
        assert_eq!(draft["note"], json!("bound"));
    }

    #[test]
    fn relation_draft_rejects_bad_numbers() {
        let relationship = Relationship::new("ligands", "Ligands", ResourceKind::Ligands, PrimaryKey::single("id"))
            .edit_fields(vec![FieldDescriptor::new(
                "weight",
                "Weight",
                FieldKind::Number { integer: false },
            )]);
        assert!(relation_draft(&relationship, &[("weight".into(), "heavy".into())]).is_err());
    }

    #[test]
    fn events_are_described() {
        assert_eq!(
            describe_event(&SessionEvent::LoggedIn {
                user_name: "Ada".into()
            }),
            "Signed in as Ada"
        );
        assert_eq!(describe_event(&SessionEvent::HistoryChanged), "Search history changed");
    }
}

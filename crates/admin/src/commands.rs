//! Command dispatch.
//!
//! Every run builds one [`Session`], initializes it from the stored token and
//! hands it to the API wrappers it needs.

use std::sync::Arc;

use anyhow::{bail, Context};
use serde_json::json;

use cakung_client::admins::AdminApi;
use cakung_client::config::ClientConfig;
use cakung_client::org_chart::OrgChartStore;
use cakung_client::organization::OrganizationApi;
use cakung_client::postings::PostingApi;
use cakung_client::session::{LoginOutcome, Session};
use cakung_core::credentials::{NewAdmin, SetupAdmin};
use cakung_core::error::CoreError;
use cakung_core::hierarchy::{build_forest, TreeNode};
use cakung_core::layout::{LayoutConfig, LevelPolicy, OrgChartLayout};
use cakung_core::organization::{EntryDraft, Role};
use cakung_core::posting::{CategorySet, PostingDraft};
use cakung_core::svg::render_svg;

use crate::cli::{AdminsCommand, Cli, Command, EntryFields, OrgCommand, PostsCommand};
use crate::files::{load_photo, read_file_part};

/// Run one parsed command line.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        config = config.with_api_url(url);
    }
    tracing::debug!(api_url = %config.api_url, "Configuration loaded");

    let session = Arc::new(Session::from_config(&config)?);
    let snapshot = session.initialize().await;
    tracing::debug!(state = ?snapshot.state, "Session initialized");

    match cli.command {
        Command::Status => {
            let status = session.snapshot().await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("backend:        {}", config.api_url);
                println!("authenticated:  {}", status.is_authenticated());
                println!("setup mode:     {}", status.setup_mode);
                match status.auth_status {
                    Some(s) => println!("setup required: {}", s.setup_required),
                    None => println!("setup required: unknown (status endpoint unreachable)"),
                }
            }
        }
        Command::Login { username, password } => {
            match session.login(&username, &password).await {
                LoginOutcome::Success { setup_mode: true } => {
                    println!("Logged in as {username} (setup mode: create the first admin with `admins setup`)");
                }
                LoginOutcome::Success { setup_mode: false } => println!("Logged in as {username}"),
                LoginOutcome::Failure { reason } => bail!(reason),
            }
        }
        Command::Logout => {
            session.logout().await;
            println!("Logged out");
        }
        Command::Admins { command } => admins(&session, command, cli.json).await?,
        Command::Org { command } => org(&session, command, cli.json).await?,
        Command::Posts { command } => posts(&session, &config, command, cli.json).await?,
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Admins
// ---------------------------------------------------------------------------

async fn admins(session: &Arc<Session>, command: AdminsCommand, as_json: bool) -> anyhow::Result<()> {
    let api = AdminApi::new(Arc::clone(session));
    match command {
        AdminsCommand::List => {
            let accounts = api.list().await?;
            if as_json {
                println!("{}", serde_json::to_string_pretty(&accounts)?);
                return Ok(());
            }
            for account in &accounts {
                let created = account
                    .created_at
                    .map(|t| t.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{:>5}  {:<20}  {:<24}  {}", account.id, account.username, account.label(), created);
            }
        }
        AdminsCommand::Add {
            username,
            password,
            display_name,
        } => {
            api.create(&NewAdmin::new(username.as_str(), password, display_name))
                .await?;
            println!("Admin {username} created");
        }
        AdminsCommand::Remove { id } => {
            api.delete(id).await?;
            println!("Admin {id} removed");
        }
        AdminsCommand::Setup {
            username,
            password,
            confirm_password,
            display_name,
        } => {
            api.setup_first_admin(SetupAdmin {
                username: username.clone(),
                password,
                confirm_password,
                display_name,
            })
            .await?;
            println!("Admin {username} created. Log in again with the new account.");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Organization chart
// ---------------------------------------------------------------------------

fn layout_config(derived: bool) -> LayoutConfig {
    LayoutConfig {
        level_policy: if derived {
            LevelPolicy::Derived
        } else {
            LevelPolicy::Trusted
        },
        ..LayoutConfig::default()
    }
}

async fn org(session: &Arc<Session>, command: OrgCommand, as_json: bool) -> anyhow::Result<()> {
    let api = OrganizationApi::new(Arc::clone(session));
    match command {
        OrgCommand::List => {
            let mut store = OrgChartStore::new(api);
            let snapshot = store.refresh().await?;
            if as_json {
                println!("{}", serde_json::to_string_pretty(&snapshot.entries)?);
            } else {
                for line in tree_lines(&build_forest(&snapshot.entries)) {
                    println!("{line}");
                }
            }
        }
        OrgCommand::Layout { derived } => {
            let mut store = OrgChartStore::with_config(api, layout_config(derived));
            let snapshot = store.refresh().await?;
            if as_json {
                println!("{}", serde_json::to_string_pretty(&snapshot.layout)?);
            } else {
                print!("{}", layout_report(&snapshot.layout));
            }
        }
        OrgCommand::Svg { out, derived } => {
            let mut store = OrgChartStore::with_config(api, layout_config(derived));
            let snapshot = store.refresh().await?;
            let svg = render_svg(&snapshot.layout);
            match out {
                Some(path) => {
                    std::fs::write(&path, svg).with_context(|| format!("writing {}", path.display()))?;
                    tracing::info!(path = %path.display(), entries = snapshot.entries.len(), "SVG written");
                }
                None => print!("{svg}"),
            }
        }
        OrgCommand::Add { fields } => {
            let mut store = OrgChartStore::new(api);
            let draft = apply_fields(EntryDraft::default(), &fields)?;
            let snapshot = store.create(draft).await?;
            println!("Entry added ({} entries)", snapshot.entries.len());
        }
        OrgCommand::Edit { id, fields } => {
            let mut store = OrgChartStore::new(api);
            let current = store.refresh().await?;
            let entry = current
                .entries
                .iter()
                .find(|e| e.id == id)
                .ok_or(CoreError::NotFound {
                    entity: "organization entry",
                    id,
                })?;
            if let Some(parent) = fields.parent {
                let allowed = store.parent_options(Some(id)).iter().any(|o| o.id == parent);
                if !allowed {
                    bail!("Entry {parent} cannot become the parent of entry {id}");
                }
            }
            let draft = apply_fields(EntryDraft::from_entry(entry), &fields)?;
            store.update(id, draft).await?;
            println!("Entry {id} updated");
        }
        OrgCommand::Remove { id } => {
            let mut store = OrgChartStore::new(api);
            store.delete(id).await?;
            println!("Entry {id} removed");
        }
    }
    Ok(())
}

/// Overlay command-line fields on `draft`.
pub fn apply_fields(mut draft: EntryDraft, fields: &EntryFields) -> anyhow::Result<EntryDraft> {
    if let Some(name) = &fields.name {
        draft.name = name.trim().to_string();
    }
    if let Some(position) = &fields.position {
        draft.position = position.trim().to_string();
    }
    if let Some(role) = &fields.role {
        draft.role = Role::parse(role);
    }
    if fields.root {
        draft.parent_id = None;
    } else if let Some(parent) = fields.parent {
        draft.parent_id = Some(parent);
    }
    if fields.clear_photo {
        draft.photo.clear();
    } else if let Some(path) = &fields.photo {
        draft.photo = load_photo(path)?;
    }
    Ok(draft)
}

/// One line per entry, indented by depth.
pub fn tree_lines(forest: &[TreeNode<'_>]) -> Vec<String> {
    fn walk(node: &TreeNode<'_>, out: &mut Vec<String>) {
        let entry = node.entry;
        out.push(format!(
            "{}[{}] {} - {} ({}, level {})",
            "  ".repeat(node.depth as usize),
            entry.id,
            entry.position,
            entry.display_name(),
            entry.role.label(),
            entry.level,
        ));
        for child in &node.children {
            walk(child, out);
        }
    }

    let mut out = Vec::new();
    for root in forest {
        walk(root, &mut out);
    }
    out
}

/// Plain-text dump of positions and connector paths.
pub fn layout_report(layout: &OrgChartLayout) -> String {
    let mut out = format!(
        "canvas {}x{}\n",
        layout.canvas_width(),
        layout.canvas_height()
    );
    for placed in &layout.entries {
        out.push_str(&format!(
            "entry {:>4}  level {:>2}  x {:>7}  y {:>7}  {}\n",
            placed.entry.id,
            placed.entry.level,
            placed.x,
            placed.y,
            placed.entry.display_name()
        ));
    }
    for connector in &layout.connectors {
        out.push_str(&format!(
            "edge {:>4} -> {:<4}  {}\n",
            connector.parent_id,
            connector.child_id,
            connector.svg_path()
        ));
    }
    out
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

/// Category for a new post: a known one, or `name` added as a custom one.
pub fn pick_category(name: &str, custom: bool) -> anyhow::Result<String> {
    let mut categories = CategorySet::default();
    if custom && !categories.contains(name) {
        categories.add(name)?;
    }
    Ok(categories.select(name)?.to_string())
}

async fn posts(
    session: &Arc<Session>,
    config: &ClientConfig,
    command: PostsCommand,
    as_json: bool,
) -> anyhow::Result<()> {
    let api = PostingApi::with_cache_ttl(Arc::clone(session), config.cache_ttl());
    match command {
        PostsCommand::List { page, limit } => {
            let list = api.list(page, limit).await?;
            if as_json {
                let items = list.items();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({ "total": list.total(), "items": items }))?
                );
                return Ok(());
            }
            for post in list.items() {
                let date = post
                    .date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{:>5}  {}  {:<12}  {}", post.id, date, post.category, post.title);
            }
            println!("page {page}, {} of {} posts", list.items().len(), list.total());
        }
        PostsCommand::Show { id } => {
            let post = api.get(id).await?;
            println!("{}", serde_json::to_string_pretty(&post)?);
        }
        PostsCommand::Categories => {
            let categories = CategorySet::default();
            if as_json {
                println!("{}", serde_json::to_string_pretty(categories.as_slice())?);
            } else {
                for name in categories.as_slice() {
                    println!("{name}");
                }
            }
        }
        PostsCommand::Create {
            title,
            category,
            custom_category,
            body,
            date,
            images,
        } => {
            let mut draft = PostingDraft::new();
            draft.title = title;
            draft.category = pick_category(&category, custom_category)?;
            if let Some(path) = body {
                draft.excerpt = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
            }
            if let Some(date) = date {
                draft.date = date;
            }
            let files = images
                .iter()
                .map(|p| read_file_part(p))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let posting = api.publish(&draft, files).await?;
            println!("Post {} created", posting.id);
        }
        PostsCommand::Remove { id } => {
            api.delete(id).await?;
            println!("Post {id} removed");
        }
        PostsCommand::Upload { post_id, files } => {
            let parts = files
                .iter()
                .map(|p| read_file_part(p))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let assets = api.assets().upload(post_id, parts).await?;
            println!("{} file(s) attached to post {post_id}", assets.len());
        }
    }
    Ok(())
}

//! Command-line surface.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use cakung_core::types::DbId;

#[derive(Debug, Parser)]
#[command(name = "cakung-admin")]
#[command(about = "Admin console for the Kelurahan Cakung Barat backend", version)]
pub struct Cli {
    /// Backend base URL; overrides `API_URL` from the environment.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show session and backend setup status.
    Status,
    /// Sign in and remember the session.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "CAKUNG_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session.
    Logout,
    /// Manage admin accounts.
    Admins {
        #[command(subcommand)]
        command: AdminsCommand,
    },
    /// Manage the organization chart.
    Org {
        #[command(subcommand)]
        command: OrgCommand,
    },
    /// Manage posts and their images.
    Posts {
        #[command(subcommand)]
        command: PostsCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum AdminsCommand {
    List,
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        display_name: Option<String>,
    },
    Remove {
        id: DbId,
    },
    /// Create the first admin from a setup-mode session.
    Setup {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
        #[arg(long)]
        display_name: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum OrgCommand {
    /// List entries as an indented tree.
    List,
    /// Print computed card positions and connectors.
    Layout {
        /// Place rows by parent depth instead of the stored level.
        #[arg(long)]
        derived: bool,
    },
    /// Render the chart as SVG.
    Svg {
        /// Output file; stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        derived: bool,
    },
    Add {
        #[command(flatten)]
        fields: EntryFields,
    },
    Edit {
        id: DbId,
        #[command(flatten)]
        fields: EntryFields,
    },
    Remove {
        id: DbId,
    },
}

/// Entry fields settable from the command line. Unset fields keep their
/// current value when editing.
#[derive(Debug, Clone, Default, Args)]
pub struct EntryFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub position: Option<String>,
    /// lurah, sekretaris, kasi, bendahara, pengurus or staf.
    #[arg(long)]
    pub role: Option<String>,
    /// Parent entry id.
    #[arg(long, conflicts_with = "root")]
    pub parent: Option<DbId>,
    /// Make the entry a root.
    #[arg(long)]
    pub root: bool,
    /// Image file; resized and embedded.
    #[arg(long, conflicts_with = "clear_photo")]
    pub photo: Option<PathBuf>,
    #[arg(long)]
    pub clear_photo: bool,
}

#[derive(Debug, Subcommand)]
pub enum PostsCommand {
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = cakung_core::posting::DEFAULT_PAGE_LIMIT)]
        limit: u32,
    },
    Show {
        id: DbId,
    },
    /// List the categories a post can be filed under.
    Categories,
    /// Create a post and upload its images.
    Create {
        #[arg(long)]
        title: String,
        /// One of the listed categories unless `--custom-category` is set.
        #[arg(long)]
        category: String,
        /// Add `--category` as a new category.
        #[arg(long)]
        custom_category: bool,
        /// Markdown body file.
        #[arg(long)]
        body: Option<PathBuf>,
        /// Publication date (YYYY-MM-DD); today when omitted.
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long = "image")]
        images: Vec<PathBuf>,
    },
    Remove {
        id: DbId,
    },
    /// Attach images to an existing post.
    Upload {
        post_id: DbId,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

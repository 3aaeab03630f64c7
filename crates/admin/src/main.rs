//! `cakung-admin` -- command-line console for the Cakung Barat admin API.
//!
//! Signs in, keeps the refresh token between runs, and manages admins,
//! the organization chart and posts.
//!
//! # Environment variables
//!
//! | Variable               | Required | Default                             |
//! |------------------------|----------|-------------------------------------|
//! | `API_URL`              | no       | `http://localhost:8080`             |
//! | `TOKEN_STORE_PATH`     | no       | `$HOME/.cakung-admin/refresh_token` |
//! | `REQUEST_TIMEOUT_SECS` | no       | `30`                                |
//! | `CACHE_TTL_SECS`       | no       | `300`                               |
//! | `RUST_LOG`             | no       | `cakung_admin=info,cakung_client=info` |

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cakung_admin::cli::Cli;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cakung_admin=info,cakung_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = cakung_admin::commands::run(cli).await {
        tracing::debug!(error = ?e, "Command failed");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

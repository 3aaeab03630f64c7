//! `/api/organization` endpoints.

use std::sync::Arc;

use cakung_core::organization::{DirectoryEntry, EntryDraft};
use cakung_core::types::DbId;

use crate::error::ClientResult;
use crate::session::Session;
use crate::transport::ApiRequest;

const ORGANIZATION_PATH: &str = "/api/organization";

/// Typed wrapper over the organization-chart endpoints.
#[derive(Clone)]
pub struct OrganizationApi {
    session: Arc<Session>,
}

impl OrganizationApi {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// All entries, flat, in backend order.
    pub async fn list(&self) -> ClientResult<Vec<DirectoryEntry>> {
        self.session
            .authenticated_request(&ApiRequest::get(ORGANIZATION_PATH))
            .await?
            .parse()
    }

    /// Create an entry. The draft's `level` is sent as given.
    pub async fn create(&self, draft: &EntryDraft) -> ClientResult<()> {
        let request = ApiRequest::post_json(ORGANIZATION_PATH, draft)?;
        self.session
            .authenticated_request(&request)
            .await?
            .ensure_success()?;
        tracing::info!(parent_id = ?draft.parent_id, level = draft.level, "Organization entry created");
        Ok(())
    }

    pub async fn update(&self, id: DbId, draft: &EntryDraft) -> ClientResult<()> {
        let request = ApiRequest::put_json(format!("{ORGANIZATION_PATH}/{id}"), draft)?;
        self.session
            .authenticated_request(&request)
            .await?
            .ensure_success()?;
        tracing::info!(entry_id = id, "Organization entry updated");
        Ok(())
    }

    pub async fn delete(&self, id: DbId) -> ClientResult<()> {
        self.session
            .authenticated_request(&ApiRequest::delete(format!("{ORGANIZATION_PATH}/{id}")))
            .await?
            .ensure_success()?;
        tracing::info!(entry_id = id, "Organization entry deleted");
        Ok(())
    }
}

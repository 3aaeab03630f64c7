//! `/api/postings` and `/api/assets` endpoints.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use cakung_core::posting::{Asset, Posting, PostingDraft, PostingList};
use cakung_core::types::DbId;
use serde::Deserialize;

use crate::cache::{TtlCache, DEFAULT_TTL};
use crate::error::ClientResult;
use crate::session::Session;
use crate::transport::{ApiRequest, FilePart};

const POSTINGS_PATH: &str = "/api/postings";
const ASSETS_PATH: &str = "/api/assets";

/// Cache keys for post lists all contain this marker.
const POSTS_CACHE_MARKER: &str = "posts";

/// Multipart field carrying each uploaded file.
pub const UPLOAD_FIELD: &str = "file";

fn list_cache_key(page: u32, limit: u32) -> String {
    format!("{POSTS_CACHE_MARKER}:{page}:{limit}")
}

// ---------------------------------------------------------------------------
// Postings
// ---------------------------------------------------------------------------

/// Post management with a short-lived cache of list pages.
pub struct PostingApi {
    session: Arc<Session>,
    assets: AssetApi,
    cache: Mutex<TtlCache<PostingList>>,
}

impl PostingApi {
    pub fn new(session: Arc<Session>) -> Self {
        Self::with_cache_ttl(session, DEFAULT_TTL)
    }

    pub fn with_cache_ttl(session: Arc<Session>, ttl: Duration) -> Self {
        Self {
            assets: AssetApi::new(Arc::clone(&session)),
            session,
            cache: Mutex::new(TtlCache::with_default_ttl(ttl)),
        }
    }

    fn cache(&self) -> MutexGuard<'_, TtlCache<PostingList>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// One page of posts. Served from cache while fresh.
    pub async fn list(&self, page: u32, limit: u32) -> ClientResult<PostingList> {
        let key = list_cache_key(page, limit);
        let cached = self.cache().get(&key);
        if let Some(hit) = cached {
            tracing::debug!(page, limit, "Post list served from cache");
            return Ok(hit);
        }

        let request = ApiRequest::get(POSTINGS_PATH)
            .with_query("page", page)
            .with_query("limit", limit);
        let list: PostingList = self.session.authenticated_request(&request).await?.parse()?;
        self.cache().insert(key, list.clone());
        Ok(list)
    }

    pub async fn get(&self, id: DbId) -> ClientResult<Posting> {
        self.session
            .authenticated_request(&ApiRequest::get(format!("{POSTINGS_PATH}/{id}")))
            .await?
            .parse()
    }

    pub async fn create(&self, draft: &PostingDraft) -> ClientResult<Posting> {
        draft.check()?;
        let request = ApiRequest::post_json(POSTINGS_PATH, draft)?;
        let created: Posting = self.session.authenticated_request(&request).await?.parse()?;
        self.invalidate_lists();
        tracing::info!(posting_id = created.id, "Posting created");
        Ok(created)
    }

    pub async fn update(&self, id: DbId, draft: &PostingDraft) -> ClientResult<Posting> {
        draft.check()?;
        let request = ApiRequest::put_json(format!("{POSTINGS_PATH}/{id}"), draft)?;
        let updated = self.session.authenticated_request(&request).await?.parse()?;
        self.invalidate_lists();
        tracing::info!(posting_id = id, "Posting updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: DbId) -> ClientResult<()> {
        self.session
            .authenticated_request(&ApiRequest::delete(format!("{POSTINGS_PATH}/{id}")))
            .await?
            .ensure_success()?;
        self.invalidate_lists();
        tracing::info!(posting_id = id, "Posting deleted");
        Ok(())
    }

    /// Create a post, then attach `files` to it.
    ///
    /// When the upload fails the post stays created and the error is
    /// returned.
    pub async fn publish(&self, draft: &PostingDraft, files: Vec<FilePart>) -> ClientResult<Posting> {
        let posting = self.create(draft).await?;
        if !files.is_empty() {
            self.assets.upload(posting.id, files).await?;
        }
        Ok(posting)
    }

    pub fn assets(&self) -> &AssetApi {
        &self.assets
    }

    /// Drop every cached list page.
    pub fn invalidate_lists(&self) {
        self.cache().invalidate_pattern(POSTS_CACHE_MARKER);
    }
}

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

/// The upload endpoint answers with one asset or a list.
#[derive(Deserialize)]
#[serde(untagged)]
enum UploadResponse {
    Many(Vec<Asset>),
    One(Asset),
}

/// Image assets attached to posts.
#[derive(Clone)]
pub struct AssetApi {
    session: Arc<Session>,
}

impl AssetApi {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// Upload files to a post. Each part is sent under the `file` field.
    pub async fn upload(&self, post_id: DbId, files: Vec<FilePart>) -> ClientResult<Vec<Asset>> {
        let count = files.len();
        let parts = files
            .into_iter()
            .map(|part| FilePart {
                field: UPLOAD_FIELD.to_string(),
                ..part
            })
            .collect();
        let request =
            ApiRequest::new(reqwest::Method::POST, format!("{ASSETS_PATH}/posts/{post_id}"))
                .with_multipart(parts);

        let uploaded = match self
            .session
            .authenticated_request(&request)
            .await?
            .parse::<UploadResponse>()?
        {
            UploadResponse::Many(assets) => assets,
            UploadResponse::One(asset) => vec![asset],
        };
        tracing::info!(post_id, files = count, "Assets uploaded");
        Ok(uploaded)
    }

    pub async fn list(&self) -> ClientResult<Vec<Asset>> {
        self.session
            .authenticated_request(&ApiRequest::get(ASSETS_PATH))
            .await?
            .parse()
    }

    pub async fn delete(&self, id: DbId) -> ClientResult<()> {
        self.session
            .authenticated_request(&ApiRequest::delete(format!("{ASSETS_PATH}/{id}")))
            .await?
            .ensure_success()?;
        tracing::info!(asset_id = id, "Asset deleted");
        Ok(())
    }
}

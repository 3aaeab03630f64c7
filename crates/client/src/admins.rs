//! `/api/auth/admins` endpoints and the first-run bootstrap.

use std::sync::Arc;

use cakung_core::credentials::{AdminAccount, NewAdmin, SetupAdmin};
use cakung_core::types::DbId;

use crate::error::{ClientError, ClientResult};
use crate::session::Session;
use crate::transport::ApiRequest;

const ADMINS_PATH: &str = "/api/auth/admins";

/// Admin account management.
#[derive(Clone)]
pub struct AdminApi {
    session: Arc<Session>,
}

impl AdminApi {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub async fn list(&self) -> ClientResult<Vec<AdminAccount>> {
        self.session
            .authenticated_request(&ApiRequest::get(ADMINS_PATH))
            .await?
            .parse()
    }

    /// Create an account. Form rules are checked before anything is sent.
    pub async fn create(&self, admin: &NewAdmin) -> ClientResult<()> {
        admin.check()?;
        let request = ApiRequest::post_json(ADMINS_PATH, admin)?;
        self.session
            .authenticated_request(&request)
            .await?
            .ensure_success()?;
        tracing::info!(username = %admin.username, "Admin created");
        Ok(())
    }

    pub async fn delete(&self, id: DbId) -> ClientResult<()> {
        self.session
            .authenticated_request(&ApiRequest::delete(format!("{ADMINS_PATH}/{id}")))
            .await?
            .ensure_success()?;
        tracing::info!(admin_id = id, "Admin deleted");
        Ok(())
    }

    /// Create the first real admin from a setup-mode session, then log out
    /// so the operator signs in with the new account.
    pub async fn setup_first_admin(&self, form: SetupAdmin) -> ClientResult<()> {
        let snapshot = self.session.snapshot().await;
        if !snapshot.is_authenticated() {
            return Err(ClientError::Unauthenticated);
        }
        if !snapshot.setup_mode {
            return Err(ClientError::Forbidden(
                "Admin setup is only available in setup mode".into(),
            ));
        }

        form.check()?;
        self.create(&form.into_new_admin()).await?;
        self.session.logout().await;
        tracing::info!("First admin created, setup session closed");
        Ok(())
    }
}

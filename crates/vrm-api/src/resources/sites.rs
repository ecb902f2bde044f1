// User and site endpoints
//
// Sites are listed per user (`users/{id}/installations`), so the user id
// comes from the login response when there is one, else from `users/me`.

use tracing::debug;

use crate::client::VrmClient;
use crate::error::Error;
use crate::mapping;
use crate::models::{SiteList, User};

impl VrmClient {
    /// The authenticated user.
    ///
    /// `GET users/me`
    pub async fn get_me(&self) -> Result<User, Error> {
        debug!("fetching current user");
        let payload = self.get_json("users/me", &[]).await?;
        mapping::map_user(&payload)
    }

    /// All sites visible to the authenticated user.
    ///
    /// `GET users/{id}/installations`
    pub async fn get_sites(&self) -> Result<SiteList, Error> {
        let user_id = self.user_id().await?;
        debug!(user_id, "listing sites");
        let payload = self
            .get_json(&format!("users/{user_id}/installations"), &[])
            .await?;
        mapping::map_sites(&payload)
    }

    async fn user_id(&self) -> Result<i64, Error> {
        if let Some(id) = self.session_user_id().await? {
            return Ok(id);
        }
        Ok(self.get_me().await?.id)
    }
}

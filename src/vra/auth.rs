//! Bearer token exchange against the vRA identity service.

use tracing::info;

use super::types::{TokenRequest, TokenResponse};
use super::{VraClient, VraError};

const TOKEN_PATH: &str = "/identity/api/tokens";

impl VraClient {
    /// Exchanges the configured tenant, username and password for a bearer
    /// token used by every later call.
    ///
    /// # Errors
    ///
    /// Returns [`VraError::Auth`] on transport errors, non-2xx responses, or
    /// a response without an `id`.
    pub async fn authenticate(&mut self) -> Result<(), VraError> {
        let payload = TokenRequest {
            username: &self.username,
            password: &self.password,
            tenant: &self.tenant,
        };
        let response: TokenResponse = self
            .post_json(TOKEN_PATH, &payload)
            .await
            .map_err(|err| VraError::Auth {
                message: err.to_string(),
            })?;
        if response.id.trim().is_empty() {
            return Err(VraError::Auth {
                message: String::from("token response carried an empty id"),
            });
        }
        info!(tenant = %self.tenant, user = %self.username, "authenticated against vRA");
        self.token = Some(response.id);
        Ok(())
    }
}

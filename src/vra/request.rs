//! Provisioning request submission and status.

use serde_json::Value;
use tracing::{debug, info};

use super::types::{CreatedRequest, RequestDetail};
use super::{VraClient, VraError, consumer_path};
use crate::backend::{RequestState, RequestStatus};
use crate::types::{CatalogId, RequestId};

impl VraClient {
    /// Submits the customised template. There is no idempotency key, so a
    /// resubmission creates a second guest.
    pub(super) async fn create_request(
        &self,
        catalog_id: &CatalogId,
        template: &Value,
    ) -> Result<RequestId, VraError> {
        let path = consumer_path(&format!("/entitledCatalogItems/{catalog_id}/requests"));
        let created: CreatedRequest = self
            .post_json(&path, template)
            .await
            .map_err(|err| VraError::Provision {
                message: err.to_string(),
            })?;
        info!(catalog_id = %catalog_id, request_id = %created.id, "submitted provisioning request");
        Ok(created.id)
    }

    pub(super) async fn fetch_request_status(
        &self,
        request_id: &RequestId,
    ) -> Result<RequestStatus, VraError> {
        let path = consumer_path(&format!("/requests/{request_id}"));
        let detail: RequestDetail = self
            .get_json(&path, &[])
            .await
            .map_err(|err| VraError::RequestStatus {
                request_id: request_id.to_string(),
                message: err.to_string(),
            })?;
        debug!(request_id = %request_id, state = %detail.state_name, "polled request");
        Ok(RequestStatus {
            state: RequestState::from(detail.state_name.as_str()),
            explanation: detail
                .request_completion
                .and_then(|completion| completion.completion_details)
                .unwrap_or_default(),
        })
    }
}

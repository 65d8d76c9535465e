//! Inventory lookups for existing guests.
//!
//! The infrastructure listing only carries names and request ids, so a match
//! is resolved in two more steps: the provisioning request's resource list
//! yields the destroy id and IP address, and the resource itself carries the
//! `MachineStatus` entry.

use tracing::{debug, info};

use super::types::{Page, RequestResource, ResourceDetail, VirtualResource};
use super::{VraClient, VraError, consumer_path};
use crate::backend::{GuestRecord, PowerState};
use crate::types::{DestroyId, RequestId};

const VIRTUAL_RESOURCES_PATH: &str = "/resources/types/Infrastructure.Virtual/";
const INVENTORY_PAGE_LIMIT: &str = "5000";
const INFRASTRUCTURE_PROVIDER_LABEL: &str = "Infrastructure Service";
const IP_ADDRESS_KEY: &str = "ip_address";
const MACHINE_STATUS_KEY: &str = "MachineStatus";

impl VraClient {
    pub(super) async fn lookup_guest(
        &self,
        hostname: &str,
    ) -> Result<Option<GuestRecord>, VraError> {
        let lookup_error = |message: String| VraError::InventoryLookup {
            subject: hostname.to_owned(),
            message,
        };
        let page: Page<VirtualResource> = self
            .get_json(
                &consumer_path(VIRTUAL_RESOURCES_PATH),
                &[("limit", INVENTORY_PAGE_LIMIT)],
            )
            .await
            .map_err(|err| lookup_error(err.to_string()))?;

        let mut matches: Vec<VirtualResource> = page
            .content
            .into_iter()
            .filter(|resource| resource.name == hostname)
            .collect();
        if matches.len() > 1 {
            return Err(VraError::DuplicateHostname {
                hostname: hostname.to_owned(),
                count: matches.len(),
            });
        }
        let Some(found) = matches.pop() else {
            debug!(hostname, "no guest registered under hostname");
            return Ok(None);
        };
        let request_id = found
            .request_id
            .ok_or_else(|| lookup_error(String::from("inventory entry has no request id")))?;

        let resource = self
            .infrastructure_resource(&request_id)
            .await
            .map_err(lookup_error)?;
        let ip_address = resource.resource_data.text(IP_ADDRESS_KEY);
        info!(
            hostname,
            destroy_id = %resource.id,
            ip = ip_address.as_deref().unwrap_or(""),
            "found existing guest"
        );
        Ok(Some(GuestRecord {
            hostname: hostname.to_owned(),
            request_id,
            destroy_id: resource.id,
            ip_address,
        }))
    }

    async fn infrastructure_resource(
        &self,
        request_id: &RequestId,
    ) -> Result<RequestResource, String> {
        let path = consumer_path(&format!("/requests/{request_id}/resources"));
        let page: Page<RequestResource> = self
            .get_json(&path, &[])
            .await
            .map_err(|err| err.to_string())?;
        page.content
            .into_iter()
            .find(|resource| resource.provider_label() == Some(INFRASTRUCTURE_PROVIDER_LABEL))
            .ok_or_else(|| {
                format!("request {request_id} has no {INFRASTRUCTURE_PROVIDER_LABEL} resource")
            })
    }

    pub(super) async fn fetch_machine_status(
        &self,
        destroy_id: &DestroyId,
    ) -> Result<PowerState, VraError> {
        let lookup_error = |message: String| VraError::InventoryLookup {
            subject: destroy_id.to_string(),
            message,
        };
        let path = consumer_path(&format!("/resources/{destroy_id}"));
        let detail: ResourceDetail = self
            .get_json(&path, &[])
            .await
            .map_err(|err| lookup_error(err.to_string()))?;
        let status = detail
            .resource_data
            .text(MACHINE_STATUS_KEY)
            .ok_or_else(|| lookup_error(format!("resource has no {MACHINE_STATUS_KEY} entry")))?;
        Ok(PowerState::from(status.as_str()))
    }
}

//! Wire types for the vRA identity and catalog-service APIs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{CatalogId, DestroyId, RequestId};

#[derive(Serialize)]
pub(crate) struct TokenRequest<'a> {
    pub(crate) username: &'a str,
    pub(crate) password: &'a str,
    pub(crate) tenant: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    pub(crate) id: String,
}

/// Paged listing; only the first page is read. `content` is required so a
/// malformed listing is a decode error rather than an empty page.
#[derive(Deserialize)]
pub(crate) struct Page<T> {
    pub(crate) content: Vec<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EntitledCatalogItem {
    pub(crate) catalog_item: CatalogItem,
}

#[derive(Deserialize)]
pub(crate) struct CatalogItem {
    pub(crate) name: String,
    pub(crate) id: CatalogId,
}

#[derive(Deserialize)]
pub(crate) struct CreatedRequest {
    pub(crate) id: RequestId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RequestDetail {
    pub(crate) state_name: String,
    #[serde(default)]
    pub(crate) request_completion: Option<RequestCompletion>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RequestCompletion {
    #[serde(default)]
    pub(crate) completion_details: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VirtualResource {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) request_id: Option<RequestId>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RequestResource {
    pub(crate) id: DestroyId,
    #[serde(default)]
    pub(crate) provider_binding: Option<ProviderBinding>,
    #[serde(default)]
    pub(crate) resource_data: ResourceData,
}

impl RequestResource {
    pub(crate) fn provider_label(&self) -> Option<&str> {
        self.provider_binding
            .as_ref()
            .map(|binding| binding.provider_ref.label.as_str())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProviderBinding {
    pub(crate) provider_ref: ProviderRef,
}

#[derive(Deserialize)]
pub(crate) struct ProviderRef {
    pub(crate) label: String,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResourceDetail {
    #[serde(default)]
    pub(crate) resource_data: ResourceData,
}

#[derive(Default, Deserialize)]
pub(crate) struct ResourceData {
    #[serde(default)]
    pub(crate) entries: Vec<ResourceDataEntry>,
}

impl ResourceData {
    /// Returns the textual value of the entry stored under `key`. Missing
    /// entries and `null` values both yield `None`.
    pub(crate) fn text(&self, key: &str) -> Option<String> {
        let entry = self.entries.iter().find(|entry| entry.key == key)?;
        match &entry.value.as_ref()?.value {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct ResourceDataEntry {
    pub(crate) key: String,
    #[serde(default)]
    pub(crate) value: Option<TypedValue>,
}

#[derive(Deserialize)]
pub(crate) struct TypedValue {
    #[serde(default)]
    pub(crate) value: Value,
}

//! Customisation of blueprint request templates.
//!
//! A request template is the JSON document vRA returns for an entitled
//! catalog item. The machine component lives under
//! `data.<blueprint-instance-id>.data`; the fields below are overwritten in
//! place and extra disks are appended as copies of the base disk.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::backend::{ExtraDisk, GuestRequest};

/// Template key holding the CPU count.
pub const CPU_KEY: &str = "cpu";
/// Template key holding the memory size.
pub const MEMORY_KEY: &str = "memory";
/// Custom blueprint property carrying the guest hostname.
pub const HOSTNAME_KEY: &str = "Hostname";
/// Template key naming the network of the first adapter.
pub const NETWORK_KEY: &str = "VirtualMachine.Network0.Name";
/// Template key holding the ordered disk list.
pub const DISKS_KEY: &str = "disks";

/// Errors raised when a template does not have the expected shape.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TemplateError {
    /// The blueprint component is missing from the template.
    #[error("template has no component data for blueprint instance '{blueprint_instance_id}'")]
    MissingComponent {
        /// Component identifier that was looked up.
        blueprint_instance_id: String,
    },
    /// Extra disks were requested but the template lists no base disk.
    #[error("template component '{blueprint_instance_id}' has no base disk to copy")]
    MissingBaseDisk {
        /// Component identifier that was looked up.
        blueprint_instance_id: String,
    },
    /// The base disk does not carry a numeric `data.id`.
    #[error("base disk of component '{blueprint_instance_id}' has no numeric id")]
    InvalidBaseDisk {
        /// Component identifier that was looked up.
        blueprint_instance_id: String,
    },
}

/// Applies the guest request to a template in place.
///
/// CPU, memory, hostname and network are overwritten unconditionally. Each
/// extra disk becomes a copy of `disks[0]` labelled `Hard disk {n}` (the
/// first extra disk is `Hard disk 2`), with volume ids counting from 1 and
/// disk ids counting up from the base disk's id. The base disk is left
/// untouched.
///
/// # Errors
///
/// Returns [`TemplateError`] when the component, the base disk, or the base
/// disk id cannot be found.
pub fn customize(template: &mut Value, request: &GuestRequest) -> Result<(), TemplateError> {
    let component = component_data(template, &request.blueprint_instance_id)?;
    component.insert(CPU_KEY.to_owned(), Value::from(request.cpu));
    component.insert(MEMORY_KEY.to_owned(), Value::from(request.memory));
    component.insert(HOSTNAME_KEY.to_owned(), Value::from(request.hostname.as_str()));
    component.insert(
        NETWORK_KEY.to_owned(),
        Value::from(request.network_adapter.as_str()),
    );

    if request.extra_disks.is_empty() {
        return Ok(());
    }
    append_disks(component, &request.blueprint_instance_id, &request.extra_disks)
}

fn component_data<'a>(
    template: &'a mut Value,
    blueprint_instance_id: &str,
) -> Result<&'a mut Map<String, Value>, TemplateError> {
    template
        .get_mut("data")
        .and_then(|data| data.get_mut(blueprint_instance_id))
        .and_then(|component| component.get_mut("data"))
        .and_then(Value::as_object_mut)
        .ok_or_else(|| TemplateError::MissingComponent {
            blueprint_instance_id: blueprint_instance_id.to_owned(),
        })
}

fn append_disks(
    component: &mut Map<String, Value>,
    blueprint_instance_id: &str,
    extra_disks: &[ExtraDisk],
) -> Result<(), TemplateError> {
    let missing_base = || TemplateError::MissingBaseDisk {
        blueprint_instance_id: blueprint_instance_id.to_owned(),
    };
    let disks = component
        .get_mut(DISKS_KEY)
        .and_then(Value::as_array_mut)
        .ok_or_else(missing_base)?;
    let base = disks.first().cloned().ok_or_else(missing_base)?;
    let invalid_base = || TemplateError::InvalidBaseDisk {
        blueprint_instance_id: blueprint_instance_id.to_owned(),
    };
    let base_id = base_disk_id(&base).ok_or_else(invalid_base)?;

    let mut disk_id = base_id;
    let mut volume_id: u64 = 0;
    for (index, extra) in extra_disks.iter().enumerate() {
        disk_id = disk_id.checked_add(1).ok_or_else(invalid_base)?;
        volume_id += 1;
        let mut disk = base.clone();
        let Some(data) = disk.get_mut("data").and_then(Value::as_object_mut) else {
            return Err(invalid_base());
        };
        data.insert(String::from("capacity"), Value::from(extra.size_gb));
        data.insert(
            String::from("label"),
            Value::from(format!("Hard disk {}", index + 2)),
        );
        data.insert(String::from("volumeId"), Value::from(volume_id));
        data.insert(String::from("id"), Value::from(disk_id));
        data.insert(String::from("userCreated"), Value::from("true"));
        data.insert(String::from("is_clone"), Value::from("false"));
        data.insert(
            String::from("initial_location"),
            Value::from(extra.mount_point.as_str()),
        );
        disks.push(disk);
    }
    Ok(())
}

fn base_disk_id(base: &Value) -> Option<u64> {
    let id = base.get("data")?.get("id")?;
    id.as_u64()
        .or_else(|| id.as_str().and_then(|raw| raw.trim().parse().ok()))
}

//! Device registry service: inventory CRUD and the direct status pathway.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::domain::auth::Actor;
use crate::domain::authz;
use crate::domain::device::{Device, DeviceId, DeviceStatus, NewDevice};
use crate::domain::error::Error;
use crate::domain::identity_service::map_repository_error;
use crate::domain::ports::{DeviceRepository, Notifier};

fn map_validation(err: crate::domain::device::DeviceValidationError) -> Error {
    Error::invalid_request(err.to_string())
}

fn device_event_payload(device: &Device) -> serde_json::Value {
    json!({
        "id": device.id(),
        "deviceType": device.device_type(),
        "cashStatus": device.cash_status(),
        "merchant": device.merchant(),
    })
}

/// Inventory CRUD behind the authorization engine, with realtime
/// device-updated / device-deleted events.
#[derive(Clone)]
pub struct DeviceService {
    devices: Arc<dyn DeviceRepository>,
    notifier: Arc<dyn Notifier>,
}

impl DeviceService {
    pub fn new(devices: Arc<dyn DeviceRepository>, notifier: Arc<dyn Notifier>) -> Self {
        Self { devices, notifier }
    }

    /// List the devices visible to the actor.
    pub async fn list(&self, actor: &Actor) -> Result<Vec<Device>, Error> {
        let all = self.devices.list().await.map_err(map_repository_error)?;
        Ok(all
            .into_iter()
            .filter(|d| authz::device_visible(actor, d))
            .collect())
    }

    /// Fetch one device, subject to the same visibility as listing.
    pub async fn get(&self, actor: &Actor, id: &DeviceId) -> Result<Device, Error> {
        let device = self.find_required(id).await?;
        if authz::device_visible(actor, &device) {
            Ok(device)
        } else {
            Err(Error::forbidden("you may not view this device"))
        }
    }

    /// Register a device. Manager-only.
    pub async fn create(&self, actor: &Actor, draft: NewDevice) -> Result<Device, Error> {
        authz::can_manage_devices(actor)?;
        let device = Device::create(draft).map_err(map_validation)?;
        self.devices
            .insert(&device)
            .await
            .map_err(map_repository_error)?;
        info!(device_id = %device.id(), device_type = %device.device_type(), "device registered");
        self.notifier
            .broadcast_all("device-updated", device_event_payload(&device))
            .await;
        Ok(device)
    }

    /// Replace a device's editable fields. Manager-only.
    pub async fn update(
        &self,
        actor: &Actor,
        id: &DeviceId,
        draft: NewDevice,
    ) -> Result<Device, Error> {
        authz::can_manage_devices(actor)?;
        let mut device = self.find_required(id).await?;
        device.apply(draft).map_err(map_validation)?;
        self.devices
            .update(&device)
            .await
            .map_err(map_repository_error)?;
        self.notifier
            .broadcast_all("device-updated", device_event_payload(&device))
            .await;
        Ok(device)
    }

    /// Remove a device from the registry. Manager-only.
    pub async fn delete(&self, actor: &Actor, id: &DeviceId) -> Result<(), Error> {
        authz::can_manage_devices(actor)?;
        self.find_required(id).await?;
        self.devices
            .delete(id)
            .await
            .map_err(map_repository_error)?;
        info!(device_id = %id, "device deleted");
        self.notifier
            .broadcast_all("device-deleted", json!({ "id": id }))
            .await;
        Ok(())
    }

    /// Direct status write, bypassing the ticket workflow.
    ///
    /// Managers may set any value; acceptors only the values that do not
    /// require a dispatch, and only on their own devices.
    pub async fn set_status(
        &self,
        actor: &Actor,
        id: &DeviceId,
        status: DeviceStatus,
    ) -> Result<Device, Error> {
        let mut device = self.find_required(id).await?;
        authz::can_set_device_status(actor, &device, status)?;
        device.set_cash_status(status);
        self.devices
            .update(&device)
            .await
            .map_err(map_repository_error)?;
        info!(device_id = %id, status = ?status, "device status set");
        self.notifier
            .broadcast_all("device-updated", device_event_payload(&device))
            .await;
        Ok(device)
    }

    async fn find_required(&self, id: &DeviceId) -> Result<Device, Error> {
        self.devices
            .find_by_id(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("device not found"))
    }
}

#[cfg(test)]
#[path = "device_service_tests.rs"]
mod tests;

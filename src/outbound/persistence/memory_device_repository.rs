//! In-process device repository with unique serial/terminal constraints.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::ports::{DeviceRepository, RepositoryError};
use crate::domain::{Device, DeviceId};

/// Map-backed [`DeviceRepository`].
#[derive(Debug, Default)]
pub struct MemoryDeviceRepository {
    records: RwLock<HashMap<DeviceId, Device>>,
}

impl MemoryDeviceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> RepositoryError {
    RepositoryError::connection("device store lock poisoned")
}

fn identifier_clash(existing: &Device, candidate: &Device) -> Option<&'static str> {
    let a = existing.identifier();
    let b = candidate.identifier();
    if a.serial.is_some() && a.serial == b.serial {
        return Some("serial");
    }
    if a.terminal.is_some() && a.terminal == b.terminal {
        return Some("terminal");
    }
    None
}

#[async_trait]
impl DeviceRepository for MemoryDeviceRepository {
    async fn insert(&self, device: &Device) -> Result<(), RepositoryError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        if let Some(field) = records
            .values()
            .find_map(|existing| identifier_clash(existing, device))
        {
            return Err(RepositoryError::duplicate(field));
        }
        records.insert(device.id(), device.clone());
        Ok(())
    }

    async fn update(&self, device: &Device) -> Result<(), RepositoryError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        if let Some(field) = records
            .values()
            .filter(|existing| existing.id() != device.id())
            .find_map(|existing| identifier_clash(existing, device))
        {
            return Err(RepositoryError::duplicate(field));
        }
        records.insert(device.id(), device.clone());
        Ok(())
    }

    async fn delete(&self, id: &DeviceId) -> Result<(), RepositoryError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        records.remove(id);
        Ok(())
    }

    async fn find_by_id(&self, id: &DeviceId) -> Result<Option<Device>, RepositoryError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Device>, RepositoryError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        let mut devices: Vec<_> = records.values().cloned().collect();
        devices.sort_by_key(Device::created_at);
        Ok(devices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DeviceIdentifier, DeviceType, Location, NewDevice};

    fn device(serial: Option<&str>, terminal: Option<&str>) -> Device {
        Device::create(NewDevice {
            identifier: DeviceIdentifier::new(
                serial.map(str::to_owned),
                terminal.map(str::to_owned),
            )
            .expect("identifier"),
            device_type: DeviceType::Pos,
            model: "PAX-80".into(),
            software_version: "2.0".into(),
            location: Location::new("Tehran".into(), "Tehran".into()).expect("location"),
            merchant: "Ali".into(),
            cash_status: None,
        })
        .expect("valid draft")
    }

    #[actix_rt::test]
    async fn duplicate_serial_is_rejected() {
        let repo = MemoryDeviceRepository::new();
        repo.insert(&device(Some("SN-1"), None)).await.expect("insert");
        let err = repo
            .insert(&device(Some("SN-1"), Some("T-1")))
            .await
            .expect_err("duplicate rejected");
        assert_eq!(err, RepositoryError::duplicate("serial"));
    }

    #[actix_rt::test]
    async fn duplicate_terminal_is_rejected() {
        let repo = MemoryDeviceRepository::new();
        repo.insert(&device(None, Some("T-1"))).await.expect("insert");
        let err = repo
            .insert(&device(Some("SN-1"), Some("T-1")))
            .await
            .expect_err("duplicate rejected");
        assert_eq!(err, RepositoryError::duplicate("terminal"));
    }

    #[actix_rt::test]
    async fn distinct_identifiers_coexist() {
        let repo = MemoryDeviceRepository::new();
        repo.insert(&device(Some("SN-1"), None)).await.expect("insert");
        repo.insert(&device(Some("SN-2"), Some("T-1")))
            .await
            .expect("insert");
        assert_eq!(repo.list().await.expect("list").len(), 2);
    }

    #[actix_rt::test]
    async fn update_keeps_own_identifier() {
        let repo = MemoryDeviceRepository::new();
        let mut stored = device(Some("SN-1"), None);
        repo.insert(&stored).await.expect("insert");
        stored.set_cash_status(crate::domain::DeviceStatus::Active);
        repo.update(&stored).await.expect("update succeeds");
    }
}

//! Port abstraction for device persistence adapters.

use async_trait::async_trait;

use crate::domain::{Device, DeviceId};

use super::RepositoryError;

/// Port for reading and writing inventory devices.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceRepository: Send + Sync {
    /// Persist a new device. Fails with [`RepositoryError::Duplicate`] when the
    /// serial or terminal number is already registered.
    async fn insert(&self, device: &Device) -> Result<(), RepositoryError>;

    /// Replace an existing device record.
    async fn update(&self, device: &Device) -> Result<(), RepositoryError>;

    /// Remove a device record. Removing an absent id is not an error.
    async fn delete(&self, id: &DeviceId) -> Result<(), RepositoryError>;

    /// Fetch a device by identifier.
    async fn find_by_id(&self, id: &DeviceId) -> Result<Option<Device>, RepositoryError>;

    /// List every registered device.
    async fn list(&self) -> Result<Vec<Device>, RepositoryError>;
}

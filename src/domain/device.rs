//! Device registry model: payment terminals and their status labels.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::user::DeviceType;

/// Stable device identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
#[schema(value_type = String, example = "0b24dcff-31f1-4ac6-9a2c-6f1d0ee96cd4")]
pub struct DeviceId(Uuid);

impl DeviceId {
    /// Generate a new random [`DeviceId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Status label carried on a device.
///
/// The cash states (`Full`, `Empty`, `NeedsCash`, `NeedsReplenishment`,
/// `InService`, `Unknown`) are meaningful for ATMs; `Active`, `NeedsService`,
/// and `NeedsRoll` cover POS/Cashless operational conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Full,
    Empty,
    NeedsCash,
    Unknown,
    Active,
    NeedsService,
    NeedsRoll,
    InService,
    NeedsReplenishment,
}

impl DeviceStatus {
    /// Status values an acceptor may set directly, without going through a
    /// ticket. Every other value must be routed through ticket creation and
    /// only takes effect on confirmation.
    pub fn settable_without_ticket(self) -> bool {
        matches!(self, Self::Active | Self::InService)
    }
}

/// Validation errors returned by the device constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceValidationError {
    MissingIdentifier,
    EmptyModel,
    EmptySoftwareVersion,
    EmptyProvince,
    EmptyCity,
    EmptyMerchant,
    AtmWithoutCashStatus,
}

impl fmt::Display for DeviceValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingIdentifier => {
                write!(f, "at least one of serial or terminal must be provided")
            }
            Self::EmptyModel => write!(f, "model must not be empty"),
            Self::EmptySoftwareVersion => write!(f, "software version must not be empty"),
            Self::EmptyProvince => write!(f, "province must not be empty"),
            Self::EmptyCity => write!(f, "city must not be empty"),
            Self::EmptyMerchant => write!(f, "merchant must not be empty"),
            Self::AtmWithoutCashStatus => write!(f, "ATM devices require a cash status"),
        }
    }
}

impl std::error::Error for DeviceValidationError {}

/// Serial and/or terminal identifier pair.
///
/// ## Invariants
/// - At least one of the two is present and non-blank.
/// - Each is globally unique across devices when present (enforced by the
///   registry adapter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIdentifier {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal: Option<String>,
}

impl DeviceIdentifier {
    /// Validate and normalise an identifier pair, trimming both members and
    /// dropping blank entries.
    pub fn new(
        serial: Option<String>,
        terminal: Option<String>,
    ) -> Result<Self, DeviceValidationError> {
        let serial = normalise(serial);
        let terminal = normalise(terminal);
        if serial.is_none() && terminal.is_none() {
            return Err(DeviceValidationError::MissingIdentifier);
        }
        Ok(Self { serial, terminal })
    }
}

fn normalise(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Province/city pair locating a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub province: String,
    pub city: String,
}

impl Location {
    /// Validate that both members are non-blank.
    pub fn new(province: String, city: String) -> Result<Self, DeviceValidationError> {
        let province = province.trim().to_owned();
        let city = city.trim().to_owned();
        if province.is_empty() {
            return Err(DeviceValidationError::EmptyProvince);
        }
        if city.is_empty() {
            return Err(DeviceValidationError::EmptyCity);
        }
        Ok(Self { province, city })
    }
}

/// Inputs for registering a device.
#[derive(Debug, Clone)]
pub struct NewDevice {
    pub identifier: DeviceIdentifier,
    pub device_type: DeviceType,
    pub model: String,
    pub software_version: String,
    pub location: Location,
    pub merchant: String,
    pub cash_status: Option<DeviceStatus>,
}

/// Registered payment terminal.
///
/// ## Invariants
/// - `identifier` holds at least one of serial/terminal.
/// - `cash_status` is `Some` whenever `device_type` is ATM.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    id: DeviceId,
    identifier: DeviceIdentifier,
    device_type: DeviceType,
    model: String,
    software_version: String,
    location: Location,
    merchant: String,
    cash_status: Option<DeviceStatus>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Device {
    /// Build a device with a fresh id and timestamps.
    ///
    /// ATMs without an explicit cash status default to `Unknown`, matching
    /// the registry's historical behaviour.
    pub fn create(draft: NewDevice) -> Result<Self, DeviceValidationError> {
        let model = draft.model.trim().to_owned();
        if model.is_empty() {
            return Err(DeviceValidationError::EmptyModel);
        }
        let software_version = draft.software_version.trim().to_owned();
        if software_version.is_empty() {
            return Err(DeviceValidationError::EmptySoftwareVersion);
        }
        let merchant = draft.merchant.trim().to_owned();
        if merchant.is_empty() {
            return Err(DeviceValidationError::EmptyMerchant);
        }
        let cash_status = match (draft.device_type, draft.cash_status) {
            (DeviceType::Atm, None) => Some(DeviceStatus::Unknown),
            (_, status) => status,
        };
        let now = Utc::now();
        Ok(Self {
            id: DeviceId::random(),
            identifier: draft.identifier,
            device_type: draft.device_type,
            model,
            software_version,
            location: draft.location,
            merchant,
            cash_status,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn identifier(&self) -> &DeviceIdentifier {
        &self.identifier
    }

    pub fn device_type(&self) -> DeviceType {
        self.device_type
    }

    pub fn model(&self) -> &str {
        self.model.as_str()
    }

    pub fn software_version(&self) -> &str {
        self.software_version.as_str()
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn merchant(&self) -> &str {
        self.merchant.as_str()
    }

    pub fn cash_status(&self) -> Option<DeviceStatus> {
        self.cash_status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replace the editable fields of the record, revalidating the
    /// ATM-requires-cash-status invariant and refreshing `updated_at`.
    pub fn apply(&mut self, draft: NewDevice) -> Result<(), DeviceValidationError> {
        let mut updated = Self::create(draft)?;
        updated.id = self.id;
        updated.created_at = self.created_at;
        *self = updated;
        Ok(())
    }

    /// Set the status label and refresh `updated_at`.
    pub fn set_cash_status(&mut self, status: DeviceStatus) {
        self.cash_status = Some(status);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn atm_draft() -> NewDevice {
        NewDevice {
            identifier: DeviceIdentifier::new(Some("SN-1".into()), None).expect("identifier"),
            device_type: DeviceType::Atm,
            model: "NCR-22".into(),
            software_version: "4.1.0".into(),
            location: Location::new("Tehran".into(), "Tehran".into()).expect("location"),
            merchant: "Ali".into(),
            cash_status: None,
        }
    }

    #[rstest]
    #[case(None, None, false)]
    #[case(Some("  "), None, false)]
    #[case(Some("SN-1"), None, true)]
    #[case(None, Some("T-9"), true)]
    #[case(Some("SN-1"), Some("T-9"), true)]
    fn identifier_requires_at_least_one_member(
        #[case] serial: Option<&str>,
        #[case] terminal: Option<&str>,
        #[case] ok: bool,
    ) {
        let result = DeviceIdentifier::new(
            serial.map(str::to_owned),
            terminal.map(str::to_owned),
        );
        assert_eq!(result.is_ok(), ok);
    }

    #[test]
    fn atm_defaults_to_unknown_cash_status() {
        let device = Device::create(atm_draft()).expect("valid draft");
        assert_eq!(device.cash_status(), Some(DeviceStatus::Unknown));
    }

    #[test]
    fn non_atm_keeps_cash_status_absent() {
        let mut draft = atm_draft();
        draft.device_type = DeviceType::Pos;
        let device = Device::create(draft).expect("valid draft");
        assert_eq!(device.cash_status(), None);
    }

    #[test]
    fn apply_preserves_id_and_created_at() {
        let mut device = Device::create(atm_draft()).expect("valid draft");
        let id = device.id();
        let created_at = device.created_at();
        let mut updated = atm_draft();
        updated.model = "NCR-30".into();
        device.apply(updated).expect("valid update");
        assert_eq!(device.id(), id);
        assert_eq!(device.created_at(), created_at);
        assert_eq!(device.model(), "NCR-30");
    }

    #[rstest]
    #[case(DeviceStatus::Active, true)]
    #[case(DeviceStatus::InService, true)]
    #[case(DeviceStatus::NeedsService, false)]
    #[case(DeviceStatus::NeedsReplenishment, false)]
    #[case(DeviceStatus::NeedsRoll, false)]
    fn only_non_dispatch_statuses_skip_the_ticket(
        #[case] status: DeviceStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(status.settable_without_ticket(), allowed);
    }
}

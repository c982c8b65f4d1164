use ambassador::{delegatable_trait, Delegate};
use serde_derive::{Deserialize, Serialize};
use strum_macros::IntoStaticStr;
use thiserror::Error;
use validator::Validate;

use crate::db::models as db_models;

/// Common interface of per-protocol device configurations
#[delegatable_trait]
pub trait DeviceSpec: Sync + Send {
    /// Total number of addressable pixels on the strip
    fn pixel_count(&self) -> u32;

    /// Target refresh rate, in frames per second
    fn refresh_rate(&self) -> u32 {
        60
    }
}

macro_rules! impl_device_spec {
    ($t:ty) => {
        impl DeviceSpec for $t {
            fn pixel_count(&self) -> u32 {
                self.pixel_count
            }

            fn refresh_rate(&self) -> u32 {
                self.refresh_rate
            }
        }
    };
}

fn default_refresh_rate() -> u32 {
    60
}

fn default_udp_port() -> u16 {
    21324
}

fn default_wled_timeout() -> u32 {
    2500
}

/// A WLED node reached over its UDP realtime protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Wled {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(range(min = 1))]
    pub pixel_count: u32,
    #[serde(default = "default_refresh_rate")]
    pub refresh_rate: u32,
    /// Realtime timeout in milliseconds before the node resumes its own effect
    #[serde(default = "default_wled_timeout")]
    pub timeout: u32,
}

impl_device_spec!(Wled);

/// A generic strip fed raw RGB frames over UDP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Udp {
    #[validate(length(min = 1))]
    pub host: String,
    #[serde(default = "default_udp_port")]
    pub port: u16,
    #[validate(range(min = 1))]
    pub pixel_count: u32,
    #[serde(default = "default_refresh_rate")]
    pub refresh_rate: u32,
}

impl_device_spec!(Udp);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Dummy {
    #[validate(range(min = 1))]
    pub pixel_count: u32,
    #[serde(default = "default_refresh_rate")]
    pub refresh_rate: u32,
}

impl_device_spec!(Dummy);

impl Default for Dummy {
    fn default() -> Self {
        Self {
            pixel_count: 1,
            refresh_rate: default_refresh_rate(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, IntoStaticStr, Delegate)]
#[serde(rename_all = "lowercase", tag = "type")]
#[delegate(DeviceSpec)]
pub enum DeviceConfig {
    Wled(Wled),
    Udp(Udp),
    Dummy(Dummy),
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self::Dummy(Dummy::default())
    }
}

impl Validate for DeviceConfig {
    fn validate(&self) -> Result<(), validator::ValidationErrors> {
        match self {
            DeviceConfig::Wled(config) => config.validate(),
            DeviceConfig::Udp(config) => config.validate(),
            DeviceConfig::Dummy(config) => config.validate(),
        }
    }
}

/// A physical addressable strip in the device catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Device {
    /// Opaque unique identifier, distinct from `key`
    #[serde(default)]
    pub id: String,
    /// Stable human-meaningful identifier, also the catalog map key
    #[serde(skip)]
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[validate(nested)]
    pub config: DeviceConfig,
}

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("error processing JSON: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

impl Device {
    /// Fill in the identifiers derived from the catalog key after loading
    pub(crate) fn with_key(mut self, key: String) -> Self {
        if self.id.is_empty() {
            self.id = key.clone();
        }
        if self.name.is_empty() {
            self.name = key.clone();
        }
        self.key = key;
        self
    }
}

impl std::convert::TryFrom<db_models::DbDevice> for Device {
    type Error = DeviceError;

    fn try_from(db: db_models::DbDevice) -> Result<Self, Self::Error> {
        let config: DeviceConfig = serde_json::from_str(&db.config)?;
        config.validate()?;

        Ok(Self {
            id: db.device.clone(),
            key: db.device,
            name: db.name,
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_device_config() {
        let config: DeviceConfig = serde_json::from_str(
            r#"{ "type": "wled", "host": "wled-office.local", "pixelCount": 144 }"#,
        )
        .unwrap();

        assert_eq!(config.pixel_count(), 144);
        assert_eq!(config.refresh_rate(), 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_empty_strip() {
        let config: DeviceConfig =
            serde_json::from_str(r#"{ "type": "dummy", "pixelCount": 0 }"#).unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn key_backfills_id_and_name() {
        let device = Device {
            id: String::new(),
            key: String::new(),
            name: String::new(),
            config: Default::default(),
        }
        .with_key("strip1".to_owned());

        assert_eq!(device.id, "strip1");
        assert_eq!(device.key, "strip1");
        assert_eq!(device.name, "strip1");
    }
}

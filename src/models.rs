use std::collections::BTreeMap;
use std::convert::TryFrom;

use serde_derive::{Deserialize, Serialize};
use strum_macros::EnumDiscriminants;
use thiserror::Error;
use validator::Validate;

use crate::db::models as db_models;

mod devices;
pub use devices::*;

mod effects;
pub use effects::*;

mod global;
pub use global::*;

mod virtuals;
pub use virtuals::*;

pub mod backend;

fn default_false() -> bool {
    false
}

/// Common interface of TCP server configuration sections
pub trait ServerConfig {
    fn port(&self) -> u16;
}

/// A single row of the global settings table, decoded
#[derive(Debug, Clone, PartialEq)]
pub struct Setting {
    pub config: SettingData,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, EnumDiscriminants, Deserialize)]
#[strum_discriminants(name(SettingKind), derive(strum_macros::EnumString, strum_macros::IntoStaticStr))]
pub enum SettingData {
    #[strum_discriminants(strum(serialize = "general"))]
    General(General),
    #[strum_discriminants(strum(serialize = "jsonServer"))]
    JsonServer(JsonServer),
    #[strum_discriminants(strum(serialize = "webConfig"))]
    WebConfig(WebConfig),
    #[strum_discriminants(strum(serialize = "hooks"))]
    Hooks(Hooks),
    #[strum_discriminants(strum(serialize = "presets"))]
    Presets(PresetStore),
}

impl Validate for SettingData {
    fn validate(&self) -> Result<(), validator::ValidationErrors> {
        match self {
            SettingData::General(setting) => setting.validate(),
            SettingData::JsonServer(setting) => setting.validate(),
            SettingData::WebConfig(setting) => setting.validate(),
            SettingData::Hooks(setting) => setting.validate(),
            SettingData::Presets(_) => Ok(()),
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingError {
    #[error("error processing JSON: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("error parsing date: {0}")]
    Chrono(#[from] chrono::ParseError),
    #[error("validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
    #[error("unsupported setting type: {0}")]
    UnsupportedType(String),
}

impl TryFrom<db_models::DbSetting> for Setting {
    type Error = SettingError;

    fn try_from(db: db_models::DbSetting) -> Result<Self, Self::Error> {
        use std::str::FromStr;

        let kind = SettingKind::from_str(&db.ty)
            .map_err(|_| SettingError::UnsupportedType(db.ty.clone()))?;

        let config = match kind {
            SettingKind::General => SettingData::General(serde_json::from_str(&db.config)?),
            SettingKind::JsonServer => SettingData::JsonServer(serde_json::from_str(&db.config)?),
            SettingKind::WebConfig => SettingData::WebConfig(serde_json::from_str(&db.config)?),
            SettingKind::Hooks => SettingData::Hooks(serde_json::from_str(&db.config)?),
            SettingKind::Presets => SettingData::Presets(serde_json::from_str(&db.config)?),
        };

        config.validate()?;

        Ok(Self {
            config,
            updated_at: chrono::DateTime::parse_from_rfc3339(&db.updated_at)?
                .with_timezone(&chrono::Utc),
        })
    }
}

#[derive(Debug, Error)]
pub enum MetaError {
    #[error("error parsing date: {0}")]
    Chrono(#[from] chrono::ParseError),
    #[error("error parsing uuid: {0}")]
    Uuid(#[from] uuid::Error),
}

/// Installation metadata, identifying this service instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub uuid: uuid::Uuid,
    #[serde(default = "chrono::Utc::now")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Meta {
    pub fn new() -> Self {
        let host = hostname::get()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|_| "localhost".to_owned());

        Self {
            uuid: uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_DNS, host.as_bytes()),
            created_at: chrono::Utc::now(),
        }
    }
}

impl TryFrom<db_models::DbMeta> for Meta {
    type Error = MetaError;

    fn try_from(db: db_models::DbMeta) -> Result<Self, Self::Error> {
        Ok(Self {
            uuid: uuid::Uuid::parse_str(&db.uuid)?,
            created_at: chrono::DateTime::parse_from_rfc3339(&db.created_at)?
                .with_timezone(&chrono::Utc),
        })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("error querying the database: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("error loading device: {0}")]
    Device(#[from] DeviceError),
    #[error("error loading virtual display: {0}")]
    Virtual(#[from] VirtualError),
    #[error("error loading setting: {0}")]
    Setting(#[from] SettingError),
    #[error("error loading meta: {0}")]
    Meta(#[from] MetaError),
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Full service configuration, assembled from one of the backends
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub devices: BTreeMap<String, Device>,
    pub virtuals: BTreeMap<String, VirtualDisplay>,
    pub presets: PresetStore,
    pub global: GlobalConfig,
    meta: Vec<Meta>,
}

impl Config {
    pub fn new(
        devices: BTreeMap<String, Device>,
        virtuals: BTreeMap<String, VirtualDisplay>,
        presets: PresetStore,
        global: GlobalConfig,
        meta: Vec<Meta>,
    ) -> Self {
        Self {
            devices,
            virtuals,
            presets,
            global,
            meta,
        }
    }

    pub fn uuid(&self) -> uuid::Uuid {
        // There should always be a meta uuid
        self.meta.first().map(|meta| meta.uuid).unwrap_or_default()
    }

    pub fn meta(&self) -> &[Meta] {
        &self.meta
    }
}

use std::{
    collections::BTreeMap,
    convert::TryFrom,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde_derive::{Deserialize, Serialize};

use super::ConfigBackend;
use crate::models::*;

pub trait ConfigExt {
    fn to_string(&self) -> Result<String, toml::ser::Error>;
}

impl ConfigExt for Config {
    fn to_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&SerializableConfig::from(self))
    }
}

pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_owned(),
        }
    }
}

#[async_trait]
impl ConfigBackend for FileBackend {
    async fn load(&mut self) -> Result<Config, ConfigError> {
        use tokio::io::AsyncReadExt;

        let mut file = tokio::fs::File::open(&self.path).await?;
        let mut full = String::new();
        file.read_to_string(&mut full).await?;

        let config: DeserializableConfig = toml::from_str(&full)?;
        Ok(config.into())
    }
}

#[derive(Serialize)]
struct SerializableConfig<'c> {
    devices: &'c BTreeMap<String, Device>,
    virtuals: &'c BTreeMap<String, VirtualDisplay>,
    presets: &'c PresetStore,
    #[serde(flatten)]
    global: &'c GlobalConfig,
    meta: &'c [Meta],
}

impl<'c> From<&'c Config> for SerializableConfig<'c> {
    fn from(config: &'c Config) -> Self {
        Self {
            devices: &config.devices,
            virtuals: &config.virtuals,
            presets: &config.presets,
            global: &config.global,
            meta: config.meta(),
        }
    }
}

fn default_meta() -> Vec<Meta> {
    vec![Meta::new()]
}

#[derive(Deserialize)]
struct DeserializableConfig {
    #[serde(default)]
    devices: BTreeMap<String, Device>,
    #[serde(default)]
    virtuals: BTreeMap<String, VirtualDisplay>,
    #[serde(default)]
    presets: PresetStore,
    #[serde(flatten)]
    global: GlobalConfig,
    #[serde(default = "default_meta")]
    meta: Vec<Meta>,
}

impl From<DeserializableConfig> for Config {
    fn from(value: DeserializableConfig) -> Self {
        // Map keys are the authoritative identifiers
        let devices = value
            .devices
            .into_iter()
            .map(|(k, v)| (k.clone(), v.with_key(k)))
            .collect();
        let virtuals = value
            .virtuals
            .into_iter()
            .map(|(k, v)| (k.clone(), v.with_name(k)))
            .collect();

        Config::new(devices, virtuals, value.presets, value.global, value.meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DeviceSpec;

    const EXAMPLE: &str = r#"
[general]
name = "Office panel"

[jsonServer]
port = 9890

[devices.office-strip]
name = "Office strip"

[devices.office-strip.config]
type = "wled"
host = "wled-office.local"
pixelCount = 144

[virtuals.wall]
items = []
"#;

    #[test]
    fn parses_full_document() {
        let config: Config = toml::from_str::<DeserializableConfig>(EXAMPLE)
            .unwrap()
            .into();

        assert_eq!(config.global.general.name, "Office panel");
        assert_eq!(config.global.json_server.port, 9890);

        let device = &config.devices["office-strip"];
        assert_eq!(device.key, "office-strip");
        assert_eq!(device.id, "office-strip");
        assert_eq!(device.name, "Office strip");
        assert_eq!(device.config.pixel_count(), 144);

        assert_eq!(config.virtuals["wall"].name, "wall");
        assert_eq!(config.meta().len(), 1);
    }

    #[test]
    fn dumps_loaded_document() {
        let config: Config = toml::from_str::<DeserializableConfig>(EXAMPLE)
            .unwrap()
            .into();

        let dumped = ConfigExt::to_string(&config).unwrap();
        assert!(dumped.contains("office-strip"));
        assert!(dumped.contains("jsonServer"));
    }
}

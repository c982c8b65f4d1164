use std::{collections::BTreeMap, convert::TryFrom};

use async_trait::async_trait;

use super::ConfigBackend;
use crate::{
    db::{models as db_models, Db},
    models::*,
};

pub struct DbBackend {
    db: Db,
}

impl DbBackend {
    pub fn new(db: Db) -> Self {
        Self::from(db)
    }
}

impl From<Db> for DbBackend {
    fn from(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ConfigBackend for DbBackend {
    async fn load(&mut self) -> Result<Config, ConfigError> {
        let mut devices = BTreeMap::new();
        for device in sqlx::query_as::<_, db_models::DbDevice>("SELECT * FROM devices")
            .fetch_all(&mut *self.db)
            .await?
            .into_iter()
            .map(Device::try_from)
        {
            let device = device?;
            devices.insert(device.key.clone(), device);
        }

        let mut virtuals = BTreeMap::new();
        for display in sqlx::query_as::<_, db_models::DbVirtual>("SELECT * FROM virtuals")
            .fetch_all(&mut *self.db)
            .await?
            .into_iter()
            .map(VirtualDisplay::try_from)
        {
            let display = display?;
            virtuals.insert(display.name.clone(), display);
        }

        let mut global = GlobalConfigCreator::default();
        let mut presets = PresetStore::default();

        for setting in sqlx::query_as::<_, db_models::DbSetting>("SELECT * FROM settings")
            .fetch_all(&mut *self.db)
            .await?
            .into_iter()
            .map(Setting::try_from)
        {
            let setting = setting?;
            match setting.config {
                SettingData::General(config) => {
                    global.general = Some(config);
                }
                SettingData::JsonServer(config) => {
                    global.json_server = Some(config);
                }
                SettingData::WebConfig(config) => {
                    global.web_config = Some(config);
                }
                SettingData::Hooks(config) => {
                    global.hooks = Some(config);
                }
                SettingData::Presets(config) => {
                    presets = config;
                }
            }
        }

        let meta: Result<Vec<_>, _> = sqlx::query_as::<_, db_models::DbMeta>("SELECT * FROM meta")
            .fetch_all(&mut *self.db)
            .await?
            .into_iter()
            .map(Meta::try_from)
            .collect();
        let mut meta = meta?;

        if meta.is_empty() {
            meta.push(Meta::new());
        }

        let global: GlobalConfig = global.into();

        debug!(
            name = %global.general.name,
            devices = %devices.len(),
            virtuals = %virtuals.len(),
            meta = %meta.len(),
            "loaded",
        );

        Ok(Config::new(devices, virtuals, presets, global, meta))
    }
}

#[derive(Default)]
struct GlobalConfigCreator {
    general: Option<General>,
    json_server: Option<JsonServer>,
    web_config: Option<WebConfig>,
    hooks: Option<Hooks>,
}

impl From<GlobalConfigCreator> for GlobalConfig {
    fn from(creator: GlobalConfigCreator) -> Self {
        Self {
            general: creator.general.unwrap_or_default(),
            json_server: creator.json_server.unwrap_or_default(),
            web_config: creator.web_config.unwrap_or_default(),
            hooks: creator.hooks.unwrap_or_default(),
        }
    }
}

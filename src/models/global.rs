use serde_derive::{Deserialize, Serialize};
use validator::Validate;

use super::ServerConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct General {
    #[validate(length(min = 4, max = 20))]
    pub name: String,
}

impl Default for General {
    fn default() -> Self {
        Self {
            name: "My LED Panel".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct JsonServer {
    #[validate(range(min = 1024))]
    pub port: u16,
}

impl Default for JsonServer {
    fn default() -> Self {
        Self { port: 8890 }
    }
}

impl ServerConfig for JsonServer {
    fn port(&self) -> u16 {
        self.port
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct WebConfig {
    #[serde(rename = "document_root")]
    pub document_root: String,
    #[validate(range(min = 80))]
    pub port: u16,
}

impl WebConfig {
    pub const DEFAULT_DOCUMENT_ROOT: &'static str = "$SYSTEM/frontend";
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            document_root: String::new(),
            port: 8888,
        }
    }
}

impl ServerConfig for WebConfig {
    fn port(&self) -> u16 {
        self.port
    }
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Hooks {
    /// Command to run when the service starts
    pub start: Vec<String>,
    /// Command to run when the service stops
    pub stop: Vec<String>,
    /// Command to run when a virtual display is created. LEDVIRT_VIRTUAL
    /// holds the display name.
    pub virtual_create: Vec<String>,
    /// Command to run when a virtual display is deleted. LEDVIRT_VIRTUAL
    /// holds the display name.
    pub virtual_delete: Vec<String>,
    /// Command to run when a segment is attached. LEDVIRT_VIRTUAL holds the
    /// display name, LEDVIRT_SEGMENT the segment id.
    pub segment_attach: Vec<String>,
    /// Command to run when a display's effect changes. LEDVIRT_VIRTUAL holds
    /// the display name.
    pub effect_change: Vec<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct GlobalConfig {
    #[validate(nested)]
    pub general: General,
    #[validate(nested)]
    pub json_server: JsonServer,
    #[validate(nested)]
    pub web_config: WebConfig,
    #[validate(nested)]
    pub hooks: Hooks,
}

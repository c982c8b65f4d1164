use serde_derive::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{self, DeviceSpec, EffectArgs};

#[derive(Debug, Deserialize, Validate)]
pub struct ServerInfoRequest {
    pub subscribe: Option<Vec<serde_json::Value>>,
}

/// Load one virtual display's full state (the panel's Display page)
#[derive(Debug, Deserialize, Validate)]
pub struct DisplayInfoRequest {
    #[serde(rename = "virtual")]
    #[validate(length(min = 1))]
    pub virtual_name: String,
}

/// Attach a device to a virtual display as a new segment
#[derive(Debug, Deserialize, Validate)]
pub struct AddSegment {
    #[serde(rename = "virtual")]
    #[validate(length(min = 1))]
    pub virtual_name: String,
    /// Device id (or key) as offered by the selection dialog
    #[validate(length(min = 1))]
    pub device: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VirtualCommand {
    CreateVirtual,
    DeleteVirtual,
}

#[derive(Debug, Deserialize, Validate)]
pub struct Virtual {
    pub subcommand: VirtualCommand,
    #[validate(length(min = 1))]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct EffectSpec {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub config: EffectArgs,
}

#[derive(Debug, Deserialize, Validate)]
pub struct Effect {
    #[serde(rename = "virtual")]
    #[validate(length(min = 1))]
    pub virtual_name: String,
    pub effect: EffectSpec,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ClearEffect {
    #[serde(rename = "virtual")]
    #[validate(length(min = 1))]
    pub virtual_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetCommand {
    List,
    Save,
    Activate,
}

#[derive(Debug, Deserialize, Validate)]
pub struct Preset {
    pub subcommand: PresetCommand,
    /// Effect type the preset belongs to
    #[validate(length(min = 1))]
    pub effect: String,
    pub name: Option<String>,
    #[serde(rename = "virtual")]
    pub virtual_name: Option<String>,
    #[serde(default)]
    pub config: EffectArgs,
}

/// Incoming panel JSON command
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase", tag = "command")]
pub enum PanelCommand {
    AddSegment(AddSegment),
    ClearEffect(ClearEffect),
    DisplayInfo(DisplayInfoRequest),
    Effect(Effect),
    Preset(Preset),
    ServerInfo(ServerInfoRequest),
    SysInfo,
    Virtual(Virtual),
}

/// Incoming panel JSON message
#[derive(Debug, Deserialize)]
pub struct PanelMessage {
    /// Request identifier
    pub tan: Option<i32>,
    #[serde(flatten)]
    pub command: PanelCommand,
}

impl Validate for PanelMessage {
    fn validate(&self) -> Result<(), validator::ValidationErrors> {
        match &self.command {
            PanelCommand::AddSegment(add_segment) => add_segment.validate(),
            PanelCommand::ClearEffect(clear_effect) => clear_effect.validate(),
            PanelCommand::DisplayInfo(display_info) => display_info.validate(),
            PanelCommand::Effect(effect) => effect.validate(),
            PanelCommand::Preset(preset) => preset.validate(),
            PanelCommand::ServerInfo(server_info) => server_info.validate(),
            PanelCommand::SysInfo => Ok(()),
            PanelCommand::Virtual(virtual_display) => virtual_display.validate(),
        }
    }
}

/// Device catalog entry, as shown in the selection dialog
#[derive(Debug, Serialize)]
pub struct DeviceInfo {
    pub id: String,
    pub key: String,
    pub name: String,
    pub pixel_count: u32,
}

impl From<&models::Device> for DeviceInfo {
    fn from(device: &models::Device) -> Self {
        Self {
            id: device.id.clone(),
            key: device.key.clone(),
            name: device.name.clone(),
            pixel_count: device.config.pixel_count(),
        }
    }
}

/// One-line summary of a virtual display
#[derive(Debug, Serialize)]
pub struct VirtualSummary {
    pub name: String,
    pub segments: usize,
    pub pixel_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,
}

impl From<&models::VirtualDisplay> for VirtualSummary {
    fn from(display: &models::VirtualDisplay) -> Self {
        Self {
            name: display.name.clone(),
            segments: display.segment_count(),
            pixel_count: display.pixel_count(),
            effect: display.effect.as_ref().map(|effect| effect.ty.clone()),
        }
    }
}

/// Wire shape of a segment; field names match the panel's store
#[derive(Debug, Serialize)]
pub struct SegmentInfo {
    pub id: String,
    pub key: String,
    pub device_key: String,
    pub name: String,
    pub led_start: u32,
    pub led_end: u32,
    pub used_pixel: u32,
    pub order_number: u32,
    pub pixel_density: u32,
    pub invert: bool,
}

impl From<&models::Segment> for SegmentInfo {
    fn from(segment: &models::Segment) -> Self {
        Self {
            id: segment.id.clone(),
            key: segment.key.clone(),
            device_key: segment.device_key.clone(),
            name: segment.name.clone(),
            led_start: segment.led_start,
            led_end: segment.led_end,
            used_pixel: segment.used_pixel,
            order_number: segment.order_number,
            pixel_density: segment.pixel_density,
            invert: segment.invert,
        }
    }
}

/// Full state of one virtual display (the Display page payload)
#[derive(Debug, Serialize)]
pub struct DisplayState {
    pub name: String,
    pub pixel_count: u32,
    pub segments: Vec<SegmentInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect: Option<models::EffectConfig>,
}

impl From<&models::VirtualDisplay> for DisplayState {
    fn from(display: &models::VirtualDisplay) -> Self {
        Self {
            name: display.name.clone(),
            pixel_count: display.pixel_count(),
            segments: display.items.iter().map(Into::into).collect(),
            effect: display.effect.clone(),
        }
    }
}

/// Effect definition details
#[derive(Debug, Serialize)]
pub struct EffectDefinition {
    pub name: String,
    pub defaults: EffectArgs,
}

impl From<&models::EffectDefinition> for EffectDefinition {
    fn from(definition: &models::EffectDefinition) -> Self {
        Self {
            name: definition.name.clone(),
            defaults: definition.defaults.clone(),
        }
    }
}

/// Panel server info
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub devices: Vec<DeviceInfo>,
    #[serde(rename = "virtuals")]
    pub virtual_displays: Vec<VirtualSummary>,
    pub effects: Vec<EffectDefinition>,
    pub hostname: String,
}

#[derive(Debug, Serialize)]
pub struct SysInfo {
    pub version: String,
    pub id: uuid::Uuid,
    pub hostname: String,
}

impl SysInfo {
    pub fn new(id: uuid::Uuid) -> Self {
        Self {
            version: version(),
            id,
            hostname: hostname(),
        }
    }
}

/// Panel JSON response payload
#[derive(Debug, Serialize)]
#[serde(tag = "command", content = "info")]
pub enum PanelResponseInfo {
    #[serde(rename = "serverinfo")]
    ServerInfo(ServerInfo),
    #[serde(rename = "sysinfo")]
    SysInfo(SysInfo),
    #[serde(rename = "displayinfo")]
    Display(DisplayState),
    #[serde(rename = "segment-created")]
    SegmentCreated {
        #[serde(rename = "virtual")]
        virtual_name: String,
        segment: SegmentInfo,
    },
    #[serde(rename = "preset-list")]
    Presets { effect: String, presets: Vec<String> },
}

#[derive(Debug, Serialize)]
pub struct PanelResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tan: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", flatten)]
    info: Option<PanelResponseInfo>,
}

impl PanelResponse {
    pub fn with_tan(mut self, tan: Option<i32>) -> Self {
        self.tan = tan;
        self
    }

    fn success_info(info: PanelResponseInfo) -> Self {
        Self {
            success: true,
            tan: None,
            error: None,
            info: Some(info),
        }
    }

    /// Return a success response
    pub fn success() -> Self {
        Self {
            success: true,
            tan: None,
            error: None,
            info: None,
        }
    }

    /// Return an error response
    pub fn error(error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            tan: None,
            error: Some(error.to_string()),
            info: None,
        }
    }

    pub fn server_info(
        devices: Vec<DeviceInfo>,
        virtual_displays: Vec<VirtualSummary>,
        effects: Vec<EffectDefinition>,
    ) -> Self {
        Self::success_info(PanelResponseInfo::ServerInfo(ServerInfo {
            devices,
            virtual_displays,
            effects,
            hostname: hostname(),
        }))
    }

    pub fn sys_info(id: uuid::Uuid) -> Self {
        Self::success_info(PanelResponseInfo::SysInfo(SysInfo::new(id)))
    }

    pub fn display(state: DisplayState) -> Self {
        Self::success_info(PanelResponseInfo::Display(state))
    }

    pub fn segment_created(virtual_name: String, segment: SegmentInfo) -> Self {
        Self::success_info(PanelResponseInfo::SegmentCreated {
            virtual_name,
            segment,
        })
    }

    pub fn presets(effect: String, presets: Vec<String>) -> Self {
        Self::success_info(PanelResponseInfo::Presets { effect, presets })
    }
}

fn hostname() -> String {
    hostname::get()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|_| "<unknown hostname>".to_owned())
}

fn version() -> String {
    git_version::git_version!(
        prefix = "ledvirt-",
        args = ["--always", "--tags"],
        fallback = "ledvirt-0.1.0"
    )
    .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_add_segment_command() {
        let message: PanelMessage = serde_json::from_str(
            r#"{ "command": "addsegment", "tan": 7, "virtual": "wall", "device": "strip1-id" }"#,
        )
        .unwrap();

        assert_eq!(message.tan, Some(7));
        assert!(message.validate().is_ok());
        match message.command {
            PanelCommand::AddSegment(add_segment) => {
                assert_eq!(add_segment.virtual_name, "wall");
                assert_eq!(add_segment.device, "strip1-id");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn rejects_empty_virtual_name() {
        let message: PanelMessage = serde_json::from_str(
            r#"{ "command": "addsegment", "virtual": "", "device": "strip1" }"#,
        )
        .unwrap();

        assert!(message.validate().is_err());
    }

    #[test]
    fn parses_effect_command() {
        let message: PanelMessage = serde_json::from_str(
            r#"{ "command": "effect", "virtual": "wall",
                 "effect": { "type": "rainbow", "config": { "speed": 2.0 } } }"#,
        )
        .unwrap();

        match message.command {
            PanelCommand::Effect(effect) => {
                assert_eq!(effect.effect.ty, "rainbow");
                assert!(effect.effect.config.contains_key("speed"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn serializes_error_response() {
        let response = PanelResponse::error("boom").with_tan(Some(3));
        let encoded = serde_json::to_value(&response).unwrap();

        assert_eq!(encoded["success"], serde_json::json!(false));
        assert_eq!(encoded["tan"], serde_json::json!(3));
        assert_eq!(encoded["error"], serde_json::json!("boom"));
    }

    #[test]
    fn serializes_segment_created_response() {
        use crate::models::{Device, DeviceConfig, Dummy, Segment};

        let device = Device {
            id: "strip1".to_owned(),
            key: "strip1".to_owned(),
            name: "Strip 1".to_owned(),
            config: DeviceConfig::Dummy(Dummy {
                pixel_count: 10,
                refresh_rate: 60,
            }),
        };
        let segment = Segment::for_device(&device, 0);

        let response =
            PanelResponse::segment_created("wall".to_owned(), SegmentInfo::from(&segment));
        let encoded = serde_json::to_value(&response).unwrap();

        assert_eq!(encoded["command"], serde_json::json!("segment-created"));
        assert_eq!(encoded["info"]["virtual"], serde_json::json!("wall"));
        assert_eq!(encoded["info"]["segment"]["led_end"], serde_json::json!(10));
        assert_eq!(
            encoded["info"]["segment"]["id"],
            encoded["info"]["segment"]["key"]
        );
    }
}

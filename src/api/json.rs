use thiserror::Error;
use validator::Validate;

use crate::{
    global::{ClientName, Event, Global, VirtualEventKind},
    registry::SubmissionError,
};

/// Schema definitions as Serde serializable structures and enums
pub mod message;
use message::{PanelCommand, PanelMessage, PanelResponse};

#[derive(Debug, Error)]
pub enum JsonApiError {
    #[error("error validating request: {0}")]
    Validation(#[from] validator::ValidationErrors),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("request not implemented")]
    NotImplemented,
}

/// A client connected to the JSON endpoint
pub struct ClientConnection {
    name: ClientName,
}

impl ClientConnection {
    pub fn new(name: ClientName) -> Self {
        Self { name }
    }

    #[instrument(skip(request, global))]
    pub async fn handle_request(
        &mut self,
        request: PanelMessage,
        global: &Global,
    ) -> Result<Option<PanelResponse>, JsonApiError> {
        request.validate()?;

        match request.command {
            PanelCommand::ServerInfo(message::ServerInfoRequest { subscribe: _ }) => {
                // TODO: Handle subscribe field

                let (devices, virtual_displays) = global
                    .read_registry(|registry| {
                        (
                            registry.devices().map(Into::into).collect(),
                            registry.virtual_displays().map(Into::into).collect(),
                        )
                    })
                    .await;

                let effects = crate::models::BUILTIN_EFFECTS
                    .iter()
                    .map(Into::into)
                    .collect();

                return Ok(Some(PanelResponse::server_info(
                    devices,
                    virtual_displays,
                    effects,
                )));
            }

            PanelCommand::SysInfo => {
                return Ok(Some(PanelResponse::sys_info(global.uuid().await)));
            }

            PanelCommand::DisplayInfo(message::DisplayInfoRequest { virtual_name }) => {
                let state = global
                    .read_registry(|registry| {
                        registry
                            .virtual_display(&virtual_name)
                            .map(message::DisplayState::from)
                    })
                    .await
                    .ok_or(SubmissionError::UnknownVirtual(virtual_name))?;

                return Ok(Some(PanelResponse::display(state)));
            }

            PanelCommand::AddSegment(message::AddSegment {
                virtual_name,
                device,
            }) => {
                let segment = global
                    .update_registry(|registry| registry.attach_device(&virtual_name, &device))
                    .await?;

                debug!("{}: attached {} to {}", &self.name, segment.id, virtual_name);

                global
                    .get_event_tx()
                    .await
                    .send(Event::virtual_display(
                        virtual_name.clone(),
                        VirtualEventKind::SegmentAttach {
                            segment_id: segment.id.clone(),
                        },
                    ))
                    .ok();

                return Ok(Some(PanelResponse::segment_created(
                    virtual_name,
                    message::SegmentInfo::from(&segment),
                )));
            }

            PanelCommand::Virtual(message::Virtual { subcommand, name }) => {
                let kind = match subcommand {
                    message::VirtualCommand::CreateVirtual => {
                        global
                            .update_registry(|registry| {
                                registry.create_virtual(&name).map(|_| ())
                            })
                            .await?;
                        VirtualEventKind::Create
                    }
                    message::VirtualCommand::DeleteVirtual => {
                        global
                            .update_registry(|registry| {
                                registry.delete_virtual(&name).map(|_| ())
                            })
                            .await?;
                        VirtualEventKind::Delete
                    }
                };

                global
                    .get_event_tx()
                    .await
                    .send(Event::virtual_display(name, kind))
                    .ok();
            }

            PanelCommand::Effect(message::Effect {
                virtual_name,
                effect,
            }) => {
                global
                    .update_registry(|registry| {
                        registry.set_effect(
                            &virtual_name,
                            crate::models::EffectConfig {
                                ty: effect.ty,
                                config: effect.config,
                            },
                        )
                    })
                    .await?;

                global
                    .get_event_tx()
                    .await
                    .send(Event::virtual_display(
                        virtual_name,
                        VirtualEventKind::EffectChange,
                    ))
                    .ok();
            }

            PanelCommand::ClearEffect(message::ClearEffect { virtual_name }) => {
                global
                    .update_registry(|registry| registry.clear_effect(&virtual_name))
                    .await?;

                global
                    .get_event_tx()
                    .await
                    .send(Event::virtual_display(
                        virtual_name,
                        VirtualEventKind::EffectChange,
                    ))
                    .ok();
            }

            PanelCommand::Preset(message::Preset {
                subcommand,
                effect,
                name,
                virtual_name,
                config,
            }) => match subcommand {
                message::PresetCommand::List => {
                    let presets = global
                        .read_registry(|registry| registry.presets().names(&effect))
                        .await;

                    return Ok(Some(PanelResponse::presets(effect, presets)));
                }
                message::PresetCommand::Save => {
                    let name = name.ok_or(JsonApiError::MissingField("name"))?;

                    global
                        .update_registry(|registry| registry.save_preset(&effect, &name, config))
                        .await?;
                }
                message::PresetCommand::Activate => {
                    let name = name.ok_or(JsonApiError::MissingField("name"))?;
                    let virtual_name =
                        virtual_name.ok_or(JsonApiError::MissingField("virtual"))?;

                    global
                        .update_registry(|registry| {
                            registry.activate_preset(&virtual_name, &effect, &name).map(|_| ())
                        })
                        .await?;

                    global
                        .get_event_tx()
                        .await
                        .send(Event::virtual_display(
                            virtual_name,
                            VirtualEventKind::EffectChange,
                        ))
                        .ok();
                }
            },
        };

        Ok(None)
    }
}

impl std::fmt::Debug for ClientConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConnection")
            .field("name", &format!("{}", &self.name))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::models::{
        Config, Device, DeviceConfig, Dummy, GlobalConfig, Meta, PresetStore, VirtualDisplay,
    };

    fn test_global() -> Global {
        let mut devices = BTreeMap::new();
        devices.insert(
            "strip1".to_owned(),
            Device {
                id: "strip1-id".to_owned(),
                key: "strip1".to_owned(),
                name: "Strip 1".to_owned(),
                config: DeviceConfig::Dummy(Dummy {
                    pixel_count: 144,
                    refresh_rate: 60,
                }),
            },
        );

        let mut virtuals = BTreeMap::new();
        virtuals.insert("wall".to_owned(), VirtualDisplay::new("wall".to_owned()));

        let config = Config::new(
            devices,
            virtuals,
            PresetStore::default(),
            GlobalConfig::default(),
            vec![Meta::new()],
        );

        crate::global::GlobalData::new(&config).wrap()
    }

    fn client() -> ClientConnection {
        ClientConnection::new(ClientName::Json {
            peer_addr: ([127, 0, 0, 1], 12345).into(),
        })
    }

    fn parse(json: &str) -> PanelMessage {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn add_segment_round_trip() {
        let global = test_global();
        let mut client = client();

        let response = client
            .handle_request(
                parse(r#"{ "command": "addsegment", "virtual": "wall", "device": "strip1-id" }"#),
                &global,
            )
            .await
            .unwrap()
            .unwrap();

        let encoded = serde_json::to_value(&response).unwrap();
        assert_eq!(encoded["success"], serde_json::json!(true));
        assert_eq!(
            encoded["info"]["segment"]["device_key"],
            serde_json::json!("strip1")
        );
        assert_eq!(
            encoded["info"]["segment"]["order_number"],
            serde_json::json!(0)
        );

        let count = global
            .read_registry(|registry| registry.virtual_display("wall").unwrap().segment_count())
            .await;
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn add_segment_to_unknown_virtual_errors() {
        let global = test_global();
        let mut client = client();

        let result = client
            .handle_request(
                parse(r#"{ "command": "addsegment", "virtual": "ceiling", "device": "strip1" }"#),
                &global,
            )
            .await;

        assert!(matches!(
            result,
            Err(JsonApiError::Submission(SubmissionError::UnknownVirtual(_)))
        ));
    }

    #[tokio::test]
    async fn display_info_reports_pixel_count() {
        let global = test_global();
        let mut client = client();

        client
            .handle_request(
                parse(r#"{ "command": "addsegment", "virtual": "wall", "device": "strip1" }"#),
                &global,
            )
            .await
            .unwrap();

        let response = client
            .handle_request(
                parse(r#"{ "command": "displayinfo", "virtual": "wall" }"#),
                &global,
            )
            .await
            .unwrap()
            .unwrap();

        let encoded = serde_json::to_value(&response).unwrap();
        assert_eq!(encoded["info"]["pixel_count"], serde_json::json!(144));
        assert_eq!(encoded["info"]["segments"][0]["led_start"], serde_json::json!(1));
    }

    #[tokio::test]
    async fn preset_save_requires_name() {
        let global = test_global();
        let mut client = client();

        let result = client
            .handle_request(
                parse(r#"{ "command": "preset", "subcommand": "save", "effect": "rainbow" }"#),
                &global,
            )
            .await;

        assert!(matches!(result, Err(JsonApiError::MissingField("name"))));
    }
}

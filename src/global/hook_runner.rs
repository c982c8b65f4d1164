use std::{collections::BTreeMap, fmt::Display, sync::Arc};

use tokio::sync::broadcast;

use super::{Event, VirtualEvent, VirtualEventKind};
use crate::models::Hooks;

const VIRTUAL_NAME: &str = "LEDVIRT_VIRTUAL";
const SEGMENT_ID: &str = "LEDVIRT_SEGMENT";

struct HookBuilder<'s> {
    variables: BTreeMap<&'static str, String>,
    command: &'s Vec<String>,
}

impl<'s> HookBuilder<'s> {
    pub fn new(command: &'s Vec<String>) -> Self {
        Self {
            variables: Default::default(),
            command,
        }
    }

    pub fn arg(mut self, k: &'static str, v: impl Display) -> Self {
        self.variables.insert(k, v.to_string());
        self
    }

    pub async fn run(self) -> Option<Result<(), std::io::Error>> {
        if self.command.is_empty() {
            return None;
        }

        let mut process = tokio::process::Command::new(&self.command[0]);
        process.args(&self.command[1..]);
        process.envs(self.variables);

        debug!(command = ?self.command, "spawning hook");

        Some(process.spawn().map(|_| {
            // Drop child
        }))
    }
}

#[derive(Debug)]
pub struct HookRunner {
    event_rx: broadcast::Receiver<Event>,
    config: Arc<Hooks>,
}

impl HookRunner {
    pub fn new(hooks: Hooks, event_rx: broadcast::Receiver<Event>) -> Self {
        Self {
            config: Arc::new(hooks),
            event_rx,
        }
    }

    async fn handle_message(&self, message: &Event) -> Option<Result<(), std::io::Error>> {
        match message {
            Event::Start => HookBuilder::new(&self.config.start).run().await,
            Event::Stop => HookBuilder::new(&self.config.stop).run().await,
            Event::Virtual(VirtualEvent { name, kind }) => match kind {
                VirtualEventKind::Create => HookBuilder::new(&self.config.virtual_create)
                    .arg(VIRTUAL_NAME, name)
                    .run()
                    .await,
                VirtualEventKind::Delete => HookBuilder::new(&self.config.virtual_delete)
                    .arg(VIRTUAL_NAME, name)
                    .run()
                    .await,
                VirtualEventKind::SegmentAttach { segment_id } => {
                    HookBuilder::new(&self.config.segment_attach)
                        .arg(VIRTUAL_NAME, name)
                        .arg(SEGMENT_ID, segment_id)
                        .run()
                        .await
                }
                VirtualEventKind::EffectChange => HookBuilder::new(&self.config.effect_change)
                    .arg(VIRTUAL_NAME, name)
                    .run()
                    .await,
            },
        }
    }

    pub async fn run(mut self) {
        loop {
            match self.event_rx.recv().await {
                Ok(message) => match self.handle_message(&message).await {
                    Some(Ok(())) => {
                        // Hook spawned successfully
                    }
                    Some(Err(error)) => {
                        warn!(error = %error, event = ?message, "hook error");
                    }
                    None => {
                        // No hook for this event
                    }
                },
                Err(error) => match error {
                    broadcast::error::RecvError::Closed => {
                        break;
                    }
                    broadcast::error::RecvError::Lagged(skipped) => {
                        warn!(skipped = %skipped, "hook runner missed events");
                    }
                },
            }
        }
    }
}

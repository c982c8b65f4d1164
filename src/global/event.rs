#[derive(Debug, Clone)]
pub enum Event {
    Start,
    Stop,
    Virtual(VirtualEvent),
}

impl Event {
    pub fn virtual_display(name: impl Into<String>, kind: VirtualEventKind) -> Self {
        Self::Virtual(VirtualEvent {
            name: name.into(),
            kind,
        })
    }
}

#[derive(Debug, Clone)]
pub struct VirtualEvent {
    pub name: String,
    pub kind: VirtualEventKind,
}

#[derive(Debug, Clone)]
pub enum VirtualEventKind {
    Create,
    Delete,
    SegmentAttach { segment_id: String },
    EffectChange,
}

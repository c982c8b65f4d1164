//! The in-memory state repository behind the panel: device catalog, virtual
//! displays and presets. All mutation goes through this type, under the
//! global write lock, which is what makes segment submission atomic.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::models::{
    effect_definition, Config, Device, EffectArgs, EffectConfig, PresetStore, Segment,
    VirtualDisplay,
};

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("no virtual display named `{0}`")]
    UnknownVirtual(String),
    #[error("no device `{0}` in the catalog")]
    UnknownDevice(String),
    #[error("virtual display `{0}` already exists")]
    VirtualExists(String),
    #[error("unknown effect type `{0}`")]
    UnknownEffect(String),
    #[error("no preset `{name}` for effect `{effect}`")]
    UnknownPreset { effect: String, name: String },
}

pub struct VirtualRegistry {
    devices: BTreeMap<String, Device>,
    virtuals: BTreeMap<String, VirtualDisplay>,
    presets: PresetStore,
}

impl VirtualRegistry {
    pub fn new(config: &Config) -> Self {
        Self {
            devices: config.devices.clone(),
            virtuals: config.virtuals.clone(),
            presets: config.presets.clone(),
        }
    }

    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    pub fn device(&self, key: &str) -> Option<&Device> {
        self.devices.get(key)
    }

    /// Look a device up by key, falling back to its opaque id (the panel
    /// dialog submits ids)
    pub fn resolve_device(&self, id_or_key: &str) -> Option<&Device> {
        self.devices
            .get(id_or_key)
            .or_else(|| self.devices.values().find(|device| device.id == id_or_key))
    }

    pub fn virtual_display(&self, name: &str) -> Option<&VirtualDisplay> {
        self.virtuals.get(name)
    }

    pub fn virtual_displays(&self) -> impl Iterator<Item = &VirtualDisplay> {
        self.virtuals.values()
    }

    pub fn presets(&self) -> &PresetStore {
        &self.presets
    }

    pub fn create_virtual(&mut self, name: &str) -> Result<&VirtualDisplay, SubmissionError> {
        if self.virtuals.contains_key(name) {
            return Err(SubmissionError::VirtualExists(name.to_owned()));
        }

        Ok(self
            .virtuals
            .entry(name.to_owned())
            .or_insert_with(|| VirtualDisplay::new(name.to_owned())))
    }

    pub fn delete_virtual(&mut self, name: &str) -> Result<VirtualDisplay, SubmissionError> {
        self.virtuals
            .remove(name)
            .ok_or_else(|| SubmissionError::UnknownVirtual(name.to_owned()))
    }

    /// Append a segment to the named virtual display.
    ///
    /// The authoritative order number is assigned here, from the live
    /// segment list: a stale client-computed value (two dialogs racing on
    /// the same display) is overwritten rather than trusted.
    pub fn submit_segment(
        &mut self,
        virtual_name: &str,
        mut segment: Segment,
    ) -> Result<Segment, SubmissionError> {
        if !self.devices.contains_key(&segment.device_key) {
            return Err(SubmissionError::UnknownDevice(segment.device_key));
        }

        let display = self
            .virtuals
            .get_mut(virtual_name)
            .ok_or_else(|| SubmissionError::UnknownVirtual(virtual_name.to_owned()))?;

        let order_number = display.next_order_number();
        if segment.order_number != order_number {
            debug!(
                segment = %segment.id,
                stale = %segment.order_number,
                assigned = %order_number,
                "reassigned stale order number"
            );
            segment.order_number = order_number;
        }

        display.items.push(segment.clone());
        Ok(segment)
    }

    /// Create the default segment for `device` and submit it to
    /// `virtual_name` in one step. This is the dialog confirm path.
    pub fn attach_device(
        &mut self,
        virtual_name: &str,
        device: &str,
    ) -> Result<Segment, SubmissionError> {
        let device = self
            .resolve_device(device)
            .ok_or_else(|| SubmissionError::UnknownDevice(device.to_owned()))?;

        let order_number = self
            .virtuals
            .get(virtual_name)
            .ok_or_else(|| SubmissionError::UnknownVirtual(virtual_name.to_owned()))?
            .next_order_number();

        let segment = Segment::for_device(device, order_number);
        self.submit_segment(virtual_name, segment)
    }

    pub fn set_effect(
        &mut self,
        virtual_name: &str,
        effect: EffectConfig,
    ) -> Result<(), SubmissionError> {
        if effect_definition(&effect.ty).is_none() {
            return Err(SubmissionError::UnknownEffect(effect.ty));
        }

        let display = self
            .virtuals
            .get_mut(virtual_name)
            .ok_or_else(|| SubmissionError::UnknownVirtual(virtual_name.to_owned()))?;

        display.effect = Some(effect);
        Ok(())
    }

    pub fn clear_effect(&mut self, virtual_name: &str) -> Result<(), SubmissionError> {
        let display = self
            .virtuals
            .get_mut(virtual_name)
            .ok_or_else(|| SubmissionError::UnknownVirtual(virtual_name.to_owned()))?;

        display.effect = None;
        Ok(())
    }

    pub fn save_preset(
        &mut self,
        effect_ty: &str,
        name: &str,
        args: EffectArgs,
    ) -> Result<(), SubmissionError> {
        if effect_definition(effect_ty).is_none() {
            return Err(SubmissionError::UnknownEffect(effect_ty.to_owned()));
        }

        self.presets.save(effect_ty, name, args);
        Ok(())
    }

    pub fn activate_preset(
        &mut self,
        virtual_name: &str,
        effect_ty: &str,
        name: &str,
    ) -> Result<EffectConfig, SubmissionError> {
        let args = self
            .presets
            .get(effect_ty, name)
            .ok_or_else(|| SubmissionError::UnknownPreset {
                effect: effect_ty.to_owned(),
                name: name.to_owned(),
            })?
            .clone();

        let effect = EffectConfig {
            ty: effect_ty.to_owned(),
            config: args,
        };

        self.set_effect(virtual_name, effect.clone())?;
        Ok(effect)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::models::{DeviceConfig, Dummy, GlobalConfig, Meta};

    fn registry() -> VirtualRegistry {
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

        VirtualRegistry::new(&config)
    }

    #[test]
    fn attach_appends_in_order() {
        let mut registry = registry();

        for expected in 0..3 {
            let segment = registry.attach_device("wall", "strip1").unwrap();
            assert_eq!(segment.order_number, expected);
            assert!(segment.id.starts_with("strip1_"));
        }

        let display = registry.virtual_display("wall").unwrap();
        assert_eq!(display.segment_count(), 3);
        assert_eq!(display.pixel_count(), 3 * 144);
    }

    #[test]
    fn attach_resolves_opaque_id() {
        let mut registry = registry();

        let segment = registry.attach_device("wall", "strip1-id").unwrap();
        assert_eq!(segment.device_key, "strip1");
    }

    #[test]
    fn submit_reassigns_stale_order() {
        let mut registry = registry();

        // Two dialogs computed their order from the same empty snapshot
        let device = registry.device("strip1").unwrap().clone();
        let first = Segment::for_device(&device, 0);
        let second = Segment::for_device(&device, 0);

        assert_eq!(registry.submit_segment("wall", first).unwrap().order_number, 0);
        assert_eq!(
            registry.submit_segment("wall", second).unwrap().order_number,
            1
        );
    }

    #[test]
    fn submit_rejects_unknown_targets() {
        let mut registry = registry();
        let device = registry.device("strip1").unwrap().clone();

        assert!(matches!(
            registry.submit_segment("ceiling", Segment::for_device(&device, 0)),
            Err(SubmissionError::UnknownVirtual(_))
        ));
        assert!(matches!(
            registry.attach_device("wall", "strip9"),
            Err(SubmissionError::UnknownDevice(_))
        ));
    }

    #[test]
    fn virtual_lifecycle() {
        let mut registry = registry();

        registry.create_virtual("ceiling").unwrap();
        assert!(matches!(
            registry.create_virtual("ceiling"),
            Err(SubmissionError::VirtualExists(_))
        ));

        registry.delete_virtual("ceiling").unwrap();
        assert!(matches!(
            registry.delete_virtual("ceiling"),
            Err(SubmissionError::UnknownVirtual(_))
        ));
    }

    #[test]
    fn effect_type_is_checked() {
        let mut registry = registry();

        assert!(matches!(
            registry.set_effect(
                "wall",
                EffectConfig {
                    ty: "spiral".to_owned(),
                    config: Default::default(),
                },
            ),
            Err(SubmissionError::UnknownEffect(_))
        ));

        registry
            .set_effect(
                "wall",
                EffectConfig {
                    ty: "rainbow".to_owned(),
                    config: Default::default(),
                },
            )
            .unwrap();
        assert!(registry.virtual_display("wall").unwrap().effect.is_some());

        registry.clear_effect("wall").unwrap();
        assert!(registry.virtual_display("wall").unwrap().effect.is_none());
    }

    #[test]
    fn preset_activation_sets_effect() {
        let mut registry = registry();
        let args = serde_json::json!({ "speed": 3.0 })
            .as_object()
            .cloned()
            .unwrap();

        registry.save_preset("rainbow", "fast", args.clone()).unwrap();

        let effect = registry.activate_preset("wall", "rainbow", "fast").unwrap();
        assert_eq!(effect.ty, "rainbow");
        assert_eq!(effect.config, args);
        assert_eq!(
            registry.virtual_display("wall").unwrap().effect,
            Some(effect)
        );

        assert!(matches!(
            registry.activate_preset("wall", "rainbow", "slow"),
            Err(SubmissionError::UnknownPreset { .. })
        ));
    }
}

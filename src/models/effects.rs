use std::collections::BTreeMap;

use serde_derive::{Deserialize, Serialize};
use serde_json::json;

/// Free-form effect arguments, keyed by parameter name
pub type EffectArgs = serde_json::Map<String, serde_json::Value>;

/// The effect currently active on a virtual display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectConfig {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub config: EffectArgs,
}

/// Definition of a known effect type and its default arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectDefinition {
    pub name: String,
    #[serde(default)]
    pub defaults: EffectArgs,
}

impl EffectDefinition {
    fn new(name: &str, defaults: serde_json::Value) -> Self {
        Self {
            name: name.to_owned(),
            defaults: defaults.as_object().cloned().unwrap_or_default(),
        }
    }

    /// An [`EffectConfig`] carrying this definition's defaults
    pub fn default_config(&self) -> EffectConfig {
        EffectConfig {
            ty: self.name.clone(),
            config: self.defaults.clone(),
        }
    }
}

lazy_static::lazy_static! {
    /// Effect types known to the panel, with their default arguments
    pub static ref BUILTIN_EFFECTS: Vec<EffectDefinition> = vec![
        EffectDefinition::new("singleColor", json!({ "color": "#ff0000", "brightness": 1.0 })),
        EffectDefinition::new("gradient", json!({ "colors": ["#ff0000", "#0000ff"], "speed": 1.0 })),
        EffectDefinition::new("rainbow", json!({ "speed": 1.0, "frequency": 1.0 })),
        EffectDefinition::new("scan", json!({ "color": "#00ff00", "speed": 2.0, "width": 4 })),
        EffectDefinition::new("power", json!({ "color": "#ffffff", "decay": 0.7, "multiplier": 1.0 })),
    ];
}

/// Look up a builtin effect definition by type name
pub fn effect_definition(name: &str) -> Option<&'static EffectDefinition> {
    BUILTIN_EFFECTS
        .iter()
        .find(|definition| definition.name == name)
}

/// Named effect argument sets, grouped per effect type
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetStore(pub BTreeMap<String, BTreeMap<String, EffectArgs>>);

impl PresetStore {
    pub fn save(&mut self, effect_ty: &str, name: &str, args: EffectArgs) {
        self.0
            .entry(effect_ty.to_owned())
            .or_default()
            .insert(name.to_owned(), args);
    }

    pub fn get(&self, effect_ty: &str, name: &str) -> Option<&EffectArgs> {
        self.0.get(effect_ty).and_then(|presets| presets.get(name))
    }

    pub fn names(&self, effect_ty: &str) -> Vec<String> {
        self.0
            .get(effect_ty)
            .map(|presets| presets.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_effects_are_known() {
        assert!(effect_definition("rainbow").is_some());
        assert!(effect_definition("spiral").is_none());
    }

    #[test]
    fn default_config_carries_defaults() {
        let config = effect_definition("scan").unwrap().default_config();

        assert_eq!(config.ty, "scan");
        assert_eq!(config.config.get("width"), Some(&json!(4)));
    }

    #[test]
    fn presets_round_trip() {
        let mut store = PresetStore::default();
        let args = json!({ "speed": 3.0 }).as_object().cloned().unwrap();

        store.save("rainbow", "fast", args.clone());

        assert_eq!(store.get("rainbow", "fast"), Some(&args));
        assert_eq!(store.names("rainbow"), vec!["fast".to_owned()]);
        assert!(store.names("scan").is_empty());
    }
}

use serde_derive::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use super::{default_false, Device, DeviceSpec, EffectConfig};
use crate::db::models as db_models;

/// Default rendering density of a freshly attached segment, in pixels per
/// meter
pub const DEFAULT_PIXEL_DENSITY: u32 = 30;

/// Derive a fresh, globally unique segment identifier from a device key.
///
/// The identifier is `<device_key>_<token>` with a time-ordered UUID token,
/// so identifiers created in rapid succession still sort roughly by creation
/// time and remain collision-resistant. The key is not validated; an empty
/// key yields an odd-looking but perfectly valid identifier.
pub fn segment_id(device_key: &str) -> String {
    format!("{}_{}", device_key, uuid::Uuid::now_v7())
}

fn default_led_start() -> u32 {
    1
}

fn default_pixel_density() -> u32 {
    DEFAULT_PIXEL_DENSITY
}

/// A contiguous pixel range of one device mapped into a virtual display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Segment {
    /// Unique identifier, `<device_key>_<token>`
    pub id: String,
    /// Always equal to `id`; redundant alias kept for panel compatibility
    pub key: String,
    /// Key of the source device in the catalog
    pub device_key: String,
    /// Display label, inherited from the source device
    #[serde(default)]
    pub name: String,
    /// First pixel index used on the device, 1-based
    #[serde(default = "default_led_start")]
    pub led_start: u32,
    /// Last pixel index used on the device
    pub led_end: u32,
    /// Number of pixels consumed on the device
    pub used_pixel: u32,
    /// Zero-based position within the owning virtual's segment sequence
    pub order_number: u32,
    #[serde(default = "default_pixel_density")]
    #[validate(range(min = 1))]
    pub pixel_density: u32,
    /// Whether pixel addressing is reversed on the device
    #[serde(default = "default_false")]
    pub invert: bool,
}

impl Segment {
    /// Build the default segment for attaching `device` at position
    /// `order_number` of a virtual display.
    ///
    /// Every field is assigned explicitly: identity comes from
    /// [`segment_id`], `device_key` and `name` are copied from the device,
    /// and the pixel range defaults to the device's entire strip. The
    /// device's pixel count is taken as-is; a zero-pixel device produces the
    /// inverted empty range `led_start = 1, led_end = 0` rather than an
    /// error.
    pub fn for_device(device: &Device, order_number: u32) -> Self {
        let id = segment_id(&device.key);
        let pixel_count = device.config.pixel_count();

        Self {
            key: id.clone(),
            id,
            device_key: device.key.clone(),
            name: device.name.clone(),
            led_start: 1,
            led_end: pixel_count,
            used_pixel: pixel_count,
            order_number,
            pixel_density: DEFAULT_PIXEL_DENSITY,
            invert: false,
        }
    }
}

/// A named logical strip composed of segments, potentially spanning several
/// physical devices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct VirtualDisplay {
    /// Unique name, also the registry map key
    #[serde(skip)]
    pub name: String,
    /// Ordered segment sequence; the order is the render order along the
    /// virtual strip
    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<Segment>,
    /// Currently active effect, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<EffectConfig>,
}

impl VirtualDisplay {
    pub fn new(name: String) -> Self {
        Self {
            name,
            items: Vec::new(),
            effect: None,
        }
    }

    pub(crate) fn with_name(mut self, name: String) -> Self {
        self.name = name;
        self
    }

    /// Total pixel count over all segments
    pub fn pixel_count(&self) -> u32 {
        self.items.iter().map(|segment| segment.used_pixel).sum()
    }

    pub fn segment_count(&self) -> usize {
        self.items.len()
    }

    /// Order number a segment appended right now would get
    pub fn next_order_number(&self) -> u32 {
        self.items.len() as u32
    }
}

#[derive(Debug, Error)]
pub enum VirtualError {
    #[error("error processing JSON: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

impl std::convert::TryFrom<db_models::DbVirtual> for VirtualDisplay {
    type Error = VirtualError;

    fn try_from(db: db_models::DbVirtual) -> Result<Self, Self::Error> {
        let display: VirtualDisplay = serde_json::from_str(&db.config)?;
        display.validate()?;

        Ok(display.with_name(db.name))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::models::{DeviceConfig, Dummy};

    fn dummy_device(key: &str, pixel_count: u32) -> Device {
        Device {
            id: format!("{}-id", key),
            key: key.to_owned(),
            name: format!("{} strip", key),
            config: DeviceConfig::Dummy(Dummy {
                pixel_count,
                refresh_rate: 60,
            }),
        }
    }

    #[test]
    fn segment_id_keeps_device_key_prefix() {
        assert!(segment_id("strip1").starts_with("strip1_"));
    }

    #[test]
    fn segment_ids_are_pairwise_distinct() {
        let ids: HashSet<_> = (0..1000).map(|_| segment_id("strip1")).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn segment_id_does_not_validate_empty_keys() {
        let id = segment_id("");
        assert!(id.starts_with('_'));
    }

    #[test]
    fn segment_defaults_for_device() {
        let device = dummy_device("d1", 144);
        let segment = Segment::for_device(&device, 2);

        assert_eq!(segment.device_key, "d1");
        assert_eq!(segment.led_start, 1);
        assert_eq!(segment.led_end, 144);
        assert_eq!(segment.used_pixel, 144);
        assert_eq!(segment.order_number, 2);
        assert_eq!(segment.pixel_density, DEFAULT_PIXEL_DENSITY);
        assert!(!segment.invert);
        assert_eq!(segment.id, segment.key);
        assert!(segment.id.starts_with("d1_"));
    }

    #[test]
    fn segment_copies_device_label() {
        let device = dummy_device("d1", 10);
        let segment = Segment::for_device(&device, 0);

        assert_eq!(segment.name, device.name);
    }

    #[test]
    fn order_numbers_follow_insertion_index() {
        let device = dummy_device("d1", 10);
        let mut display = VirtualDisplay::new("wall".to_owned());

        for expected in 0..3 {
            let segment = Segment::for_device(&device, display.next_order_number());
            assert_eq!(segment.order_number, expected);
            display.items.push(segment);
        }
    }

    #[test]
    fn device_is_not_mutated() {
        let device = dummy_device("d1", 144);
        let before = device.clone();

        let _ = Segment::for_device(&device, 4);

        assert_eq!(device, before);
    }

    #[test]
    fn zero_pixel_device_passes_through() {
        // The empty range is propagated untouched, not corrected
        let device = dummy_device("d1", 0);
        let segment = Segment::for_device(&device, 0);

        assert_eq!(segment.led_start, 1);
        assert_eq!(segment.led_end, 0);
        assert_eq!(segment.used_pixel, 0);
    }

    #[test]
    fn display_pixel_count_sums_segments() {
        let mut display = VirtualDisplay::new("wall".to_owned());
        display
            .items
            .push(Segment::for_device(&dummy_device("d1", 144), 0));
        display
            .items
            .push(Segment::for_device(&dummy_device("d2", 60), 1));

        assert_eq!(display.pixel_count(), 204);
        assert_eq!(display.segment_count(), 2);
    }
}

//! Per-frame values: transforms, camera/light state, metadata and the tagged
//! payload union delivered once per tick.

use serde::{Deserialize, Serialize};

use crate::structure::Role;

/// Rigid transform. Rotation is a quaternion `(x, y, z, w)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub rotation: [f32; 4],
    pub translation: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            rotation: [0.0, 0.0, 0.0, 1.0],
            translation: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

impl Transform {
    pub fn from_translation(translation: [f32; 3]) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    pub fn with_rotation(mut self, rotation: [f32; 4]) -> Self {
        self.rotation = rotation;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub transform: Transform,
    /// Degrees.
    pub field_of_view: f32,
    /// Width / height.
    pub aspect_ratio: f32,
    pub focal_length: f32,
    /// f-stop.
    pub aperture: f32,
    /// Centimetres; manual focus only.
    pub focus_distance: f32,
    /// `false` is orthographic.
    pub is_perspective: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            transform: Transform::default(),
            field_of_view: 90.0,
            aspect_ratio: 1.777_778,
            focal_length: 50.0,
            aperture: 2.8,
            focus_distance: 100_000.0,
            is_perspective: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub transform: Transform,
    /// Kelvin.
    pub temperature: f32,
    /// Lux.
    pub intensity: f32,
    pub light_color: [u8; 4],
    /// Degrees, spotlights only.
    pub inner_cone_angle: f32,
    pub outer_cone_angle: f32,
    pub attenuation_radius: f32,
    pub source_radius: f32,
    pub soft_source_radius: f32,
    pub source_length: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            transform: Transform::default(),
            temperature: 6500.0,
            intensity: std::f32::consts::PI,
            light_color: [255, 255, 255, 255],
            inner_cone_angle: 0.0,
            outer_cone_angle: 44.0,
            attenuation_radius: 1000.0,
            source_radius: 0.0,
            soft_source_radius: 0.0,
            source_length: 0.0,
        }
    }
}

/// SMPTE frame rates understood by the host (ST12-1, ST428-11).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimecodeFormat {
    #[default]
    Unknown,
    Fps23_98,
    Fps24,
    Fps25,
    Fps29_97Ndf,
    Fps29_97Df,
    Fps30,
    Fps47_95,
    Fps48,
    Fps50,
    Fps59_94Ndf,
    Fps59_94Df,
    Fps60,
    Fps72,
    Fps96,
    Fps100,
    Fps120,
}

impl TimecodeFormat {
    /// Nominal frames per second, `None` for [`TimecodeFormat::Unknown`].
    pub fn rate(self) -> Option<f64> {
        use TimecodeFormat::*;
        Some(match self {
            Unknown => return None,
            Fps23_98 => 24000.0 / 1001.0,
            Fps24 => 24.0,
            Fps25 => 25.0,
            Fps29_97Ndf | Fps29_97Df => 30000.0 / 1001.0,
            Fps30 => 30.0,
            Fps47_95 => 48000.0 / 1001.0,
            Fps48 => 48.0,
            Fps50 => 50.0,
            Fps59_94Ndf | Fps59_94Df => 60000.0 / 1001.0,
            Fps60 => 60.0,
            Fps72 => 72.0,
            Fps96 => 96.0,
            Fps100 => 100.0,
            Fps120 => 120.0,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timecode {
    pub hours: i32,
    pub minutes: i32,
    pub seconds: i32,
    pub frames: i32,
    pub format: TimecodeFormat,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// String map, in insertion order.
    pub key_values: Vec<(String, String)>,
    pub timecode: Timecode,
}

impl Metadata {
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.key_values.push((key.into(), value.into()));
        self
    }
}

/// Role-specific frame data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Payload {
    /// Property channels only; the values live in [`Frame::properties`].
    Basic,
    Transform(Transform),
    /// One transform per bone, in resolved bone order.
    Animation(Vec<Transform>),
    Camera(Camera),
    Light(Light),
}

impl Payload {
    pub fn role(&self) -> Role {
        match self {
            Payload::Basic => Role::Basic,
            Payload::Transform(_) => Role::Transform,
            Payload::Animation(_) => Role::Animation,
            Payload::Camera(_) => Role::Camera,
            Payload::Light(_) => Role::Light,
        }
    }
}

/// Everything the host receives for one subject on one tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub metadata: Metadata,
    /// Scalar channel values, position-matched to the declared property names.
    pub properties: Vec<f32>,
    pub payload: Payload,
}

impl Frame {
    pub fn new(payload: Payload) -> Self {
        Self {
            metadata: Metadata::default(),
            properties: Vec::new(),
            payload,
        }
    }

    pub fn basic(values: Vec<f32>) -> Self {
        Self::new(Payload::Basic).with_properties(values)
    }

    pub fn transform(transform: Transform) -> Self {
        Self::new(Payload::Transform(transform))
    }

    pub fn animation(transforms: Vec<Transform>) -> Self {
        Self::new(Payload::Animation(transforms))
    }

    pub fn camera(camera: Camera) -> Self {
        Self::new(Payload::Camera(camera))
    }

    pub fn light(light: Light) -> Self {
        Self::new(Payload::Light(light))
    }

    pub fn with_properties(mut self, values: Vec<f32>) -> Self {
        self.properties = values;
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    #[inline]
    pub fn role(&self) -> Role {
        self.payload.role()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.rotation, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(t.translation, [0.0; 3]);
        assert_eq!(t.scale, [1.0; 3]);
    }

    #[test]
    fn payload_json_is_tagged() {
        let json = serde_json::to_value(Payload::Transform(Transform::from_translation([
            1.0, 2.0, 3.0,
        ])))
        .unwrap();
        assert_eq!(json["type"], "transform");
        assert_eq!(json["data"]["translation"], serde_json::json!([1.0, 2.0, 3.0]));
        let basic = serde_json::to_value(Payload::Basic).unwrap();
        assert_eq!(basic, serde_json::json!({ "type": "basic" }));
    }

    #[test]
    fn frame_constructors_pick_roles() {
        assert_eq!(Frame::basic(vec![0.5]).role(), Role::Basic);
        assert_eq!(Frame::animation(vec![]).role(), Role::Animation);
        assert_eq!(Frame::camera(Camera::default()).role(), Role::Camera);
        assert_eq!(Frame::light(Light::default()).role(), Role::Light);
    }

    #[test]
    fn timecode_rates() {
        assert_eq!(TimecodeFormat::Unknown.rate(), None);
        assert_eq!(TimecodeFormat::Fps24.rate(), Some(24.0));
        let ntsc = TimecodeFormat::Fps29_97Df.rate().unwrap();
        assert!((ntsc - 29.97).abs() < 1e-3);
    }
}

//! One-time subject declarations ("structures") sent before the first frame.

use serde::{Deserialize, Serialize};

use crate::hierarchy::BoneSpec;

/// The host-side role a subject is published under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Basic,
    Transform,
    Animation,
    Camera,
    Light,
}

/// Which per-frame camera fields the host should apply.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraStatic {
    pub is_field_of_view_supported: bool,
    pub is_aspect_ratio_supported: bool,
    pub is_focal_length_supported: bool,
    pub is_projection_mode_supported: bool,
    /// Cinematic cameras only; values above zero are applied.
    pub film_back_width: f32,
    pub film_back_height: f32,
    pub is_aperture_supported: bool,
    pub is_focus_distance_supported: bool,
}

impl Default for CameraStatic {
    fn default() -> Self {
        Self {
            is_field_of_view_supported: false,
            is_aspect_ratio_supported: false,
            is_focal_length_supported: false,
            is_projection_mode_supported: false,
            film_back_width: -1.0,
            film_back_height: -1.0,
            is_aperture_supported: false,
            is_focus_distance_supported: false,
        }
    }
}

/// Which per-frame light fields the host should apply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightStatic {
    pub is_temperature_supported: bool,
    pub is_intensity_supported: bool,
    pub is_light_color_supported: bool,
    pub is_inner_cone_angle_supported: bool,
    pub is_outer_cone_angle_supported: bool,
    pub is_attenuation_radius_supported: bool,
    pub is_source_length_supported: bool,
    pub is_source_radius_supported: bool,
    pub is_soft_source_radius_supported: bool,
}

/// Shape declaration of a named subject: its role, its scalar property channel
/// names and any role-specific static data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Structure {
    Basic {
        properties: Vec<String>,
    },
    Transform {
        properties: Vec<String>,
    },
    Animation {
        properties: Vec<String>,
        bones: Vec<BoneSpec>,
    },
    Camera {
        properties: Vec<String>,
        camera: CameraStatic,
    },
    Light {
        properties: Vec<String>,
        light: LightStatic,
    },
}

impl Structure {
    pub fn role(&self) -> Role {
        match self {
            Structure::Basic { .. } => Role::Basic,
            Structure::Transform { .. } => Role::Transform,
            Structure::Animation { .. } => Role::Animation,
            Structure::Camera { .. } => Role::Camera,
            Structure::Light { .. } => Role::Light,
        }
    }

    pub fn properties(&self) -> &[String] {
        match self {
            Structure::Basic { properties }
            | Structure::Transform { properties }
            | Structure::Animation { properties, .. }
            | Structure::Camera { properties, .. }
            | Structure::Light { properties, .. } => properties,
        }
    }

    /// Bones of an animation subject; empty for every other role.
    pub fn bones(&self) -> &[BoneSpec] {
        match self {
            Structure::Animation { bones, .. } => bones,
            _ => &[],
        }
    }
}

/// A structure still waiting for its bone list.
///
/// The driver resolves the skeleton at startup and fills the bones in before
/// registering; every other role passes through untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum StructureTemplate {
    Basic {
        #[serde(default)]
        properties: Vec<String>,
    },
    Transform {
        #[serde(default)]
        properties: Vec<String>,
    },
    Animation {
        #[serde(default)]
        properties: Vec<String>,
    },
    Camera {
        #[serde(default)]
        properties: Vec<String>,
        #[serde(default)]
        camera: CameraStatic,
    },
    Light {
        #[serde(default)]
        properties: Vec<String>,
        #[serde(default)]
        light: LightStatic,
    },
}

impl StructureTemplate {
    pub fn role(&self) -> Role {
        match self {
            StructureTemplate::Basic { .. } => Role::Basic,
            StructureTemplate::Transform { .. } => Role::Transform,
            StructureTemplate::Animation { .. } => Role::Animation,
            StructureTemplate::Camera { .. } => Role::Camera,
            StructureTemplate::Light { .. } => Role::Light,
        }
    }

    pub fn into_structure(self, bones: &[BoneSpec]) -> Structure {
        match self {
            StructureTemplate::Basic { properties } => Structure::Basic { properties },
            StructureTemplate::Transform { properties } => Structure::Transform { properties },
            StructureTemplate::Animation { properties } => Structure::Animation {
                properties,
                bones: bones.to_vec(),
            },
            StructureTemplate::Camera { properties, camera } => {
                Structure::Camera { properties, camera }
            }
            StructureTemplate::Light { properties, light } => Structure::Light { properties, light },
        }
    }
}

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub mod host;

pub use host::{HostCall, RecordingHost};

/// Repository-level `fixtures/` directory.
const FIXTURE_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../../fixtures");

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../../../fixtures/manifest.json"))
        .expect("fixtures/manifest.json is valid")
});

/// Index of every named fixture, relative to [`FIXTURE_DIR`].
#[derive(Debug, Deserialize)]
struct Manifest {
    skeletons: HashMap<String, String>,
    clips: HashMap<String, ClipEntry>,
    streams: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ClipEntry {
    path: String,
    /// Skeleton fixture the clip was baked on.
    #[serde(default)]
    skeleton: Option<String>,
}

impl Manifest {
    fn skeleton(&self, name: &str) -> Result<&str> {
        entry(&self.skeletons, "skeleton", name).map(String::as_str)
    }

    fn clip(&self, name: &str) -> Result<&ClipEntry> {
        entry(&self.clips, "clip", name)
    }

    fn stream(&self, name: &str) -> Result<&str> {
        entry(&self.streams, "stream", name).map(String::as_str)
    }
}

fn entry<'m, T>(table: &'m HashMap<String, T>, kind: &str, name: &str) -> Result<&'m T> {
    table.get(name).ok_or_else(|| {
        let mut known: Vec<&str> = table.keys().map(String::as_str).collect();
        known.sort_unstable();
        anyhow!("no {kind} fixture named '{name}' (known: {})", known.join(", "))
    })
}

fn fixture_text(rel: &str) -> Result<String> {
    let path = Path::new(FIXTURE_DIR).join(rel);
    fs::read_to_string(&path).with_context(|| format!("reading fixture {}", path.display()))
}

fn fixture_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    serde_json::from_str(&fixture_text(rel)?).with_context(|| format!("decoding fixture {rel}"))
}

pub mod skeletons {
    use super::*;
    use livelink_stream::SkeletonTree;

    pub fn keys() -> Vec<String> {
        MANIFEST.skeletons.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        fixture_text(MANIFEST.skeleton(name)?)
    }

    pub fn tree(name: &str) -> Result<SkeletonTree> {
        fixture_json(MANIFEST.skeleton(name)?)
    }
}

pub mod clips {
    use super::*;
    use livelink_stream::{SkeletonTree, Transform};

    /// One sampled key of a bone track: translation and quaternion rotation.
    #[derive(Debug, Clone, Deserialize)]
    pub struct BoneKey {
        pub t: [f32; 3],
        pub r: [f32; 4],
    }

    impl BoneKey {
        pub fn transform(&self) -> Transform {
            Transform::from_translation(self.t).with_rotation(self.r)
        }
    }

    /// A baked clip: the skeleton it was sampled on plus per-bone key lists of
    /// equal length.
    #[derive(Debug, Clone, Deserialize)]
    pub struct Clip {
        pub skeleton: SkeletonTree,
        pub animation: HashMap<String, Vec<BoneKey>>,
    }

    impl Clip {
        /// Number of frames, taken from the root track.
        pub fn frame_count(&self, root: &str) -> usize {
            self.animation.get(root).map_or(0, |keys| keys.len())
        }

        /// Transforms for `frame` in `bone_names` order. Bones without a track
        /// get the identity transform.
        pub fn pose(&self, bone_names: &[&str], frame: usize) -> Vec<Transform> {
            bone_names
                .iter()
                .map(|name| {
                    self.animation
                        .get(*name)
                        .and_then(|keys| keys.get(frame))
                        .map(BoneKey::transform)
                        .unwrap_or_default()
                })
                .collect()
        }
    }

    pub fn keys() -> Vec<String> {
        MANIFEST.clips.keys().cloned().collect()
    }

    pub fn skeleton_name(name: &str) -> Result<Option<String>> {
        Ok(MANIFEST.clip(name)?.skeleton.clone())
    }

    pub fn load(name: &str) -> Result<Clip> {
        fixture_json(&MANIFEST.clip(name)?.path)
    }
}

pub mod streams {
    use super::*;
    use livelink_stream::StreamConfig;

    pub fn keys() -> Vec<String> {
        MANIFEST.streams.keys().cloned().collect()
    }

    /// Parsed and validated stream settings.
    pub fn config(name: &str) -> Result<StreamConfig> {
        let rel = MANIFEST.stream(name)?;
        StreamConfig::from_json(&fixture_text(rel)?)
            .with_context(|| format!("stream fixture {rel} is not a valid config"))
    }
}

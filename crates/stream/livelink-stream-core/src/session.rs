//! Host collaborator contract and the session handle that owns its lifecycle.
//!
//! The visualization host's native module is reached only through
//! [`LiveLinkHost`]. A [`Session`] loads it, publishes the provider identity,
//! keeps track of which subjects have a registered structure, and unloads the
//! module when dropped, on success and error paths alike.

use hashbrown::HashMap;

use crate::error::{SinkError, StreamError};
use crate::frame::{Camera, Frame, Light, Metadata, Payload, Transform};
use crate::hierarchy::BoneSpec;
use crate::sink::FrameSink;
use crate::structure::{CameraStatic, LightStatic, Structure};
use crate::MAX_NAME_LENGTH;

/// Status codes returned by [`LiveLinkHost::load`] and
/// [`LiveLinkHost::start_live_link`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum LoadStatus {
    Ok = 0,
    WrongVersion = 1,
    MissingLib = 2,
    Incomplete = 3,
}

impl LoadStatus {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(LoadStatus::Ok),
            1 => Some(LoadStatus::WrongVersion),
            2 => Some(LoadStatus::MissingLib),
            3 => Some(LoadStatus::Incomplete),
            _ => None,
        }
    }

    #[inline]
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn describe(self) -> &'static str {
        match self {
            LoadStatus::Ok => "ok",
            LoadStatus::WrongVersion => "interface version mismatch",
            LoadStatus::MissingLib => "shared library not found",
            LoadStatus::Incomplete => "shared library is missing entry points",
        }
    }
}

/// The external visualization host.
pub trait LiveLinkHost {
    /// Connect to the host runtime. Non-zero is fatal.
    fn load(&mut self) -> i32;
    /// Tear the connection down. Must be safe to call after a failed `load`.
    fn unload(&mut self);
    fn set_provider_name(&mut self, name: &str);
    /// Non-zero is fatal.
    fn start_live_link(&mut self) -> i32;
    /// Whether a host-side consumer is currently attached.
    fn has_connection(&self) -> bool {
        true
    }
    fn set_structure(&mut self, subject: &str, structure: &Structure) -> Result<(), SinkError>;
    fn update_frame(&mut self, subject: &str, world_time: f64, frame: &Frame)
        -> Result<(), SinkError>;
}

impl<H: LiveLinkHost + ?Sized> LiveLinkHost for &mut H {
    fn load(&mut self) -> i32 {
        (**self).load()
    }
    fn unload(&mut self) {
        (**self).unload()
    }
    fn set_provider_name(&mut self, name: &str) {
        (**self).set_provider_name(name)
    }
    fn start_live_link(&mut self) -> i32 {
        (**self).start_live_link()
    }
    fn has_connection(&self) -> bool {
        (**self).has_connection()
    }
    fn set_structure(&mut self, subject: &str, structure: &Structure) -> Result<(), SinkError> {
        (**self).set_structure(subject, structure)
    }
    fn update_frame(
        &mut self,
        subject: &str,
        world_time: f64,
        frame: &Frame,
    ) -> Result<(), SinkError> {
        (**self).update_frame(subject, world_time, frame)
    }
}

/// An open provider session on a host.
pub struct Session<H: LiveLinkHost> {
    host: H,
    provider: String,
    subjects: HashMap<String, Structure>,
    open: bool,
}

impl<H: LiveLinkHost> Session<H> {
    /// Load the host module, publish `provider` and start live link.
    ///
    /// Any failure unloads the host before returning.
    pub fn open(mut host: H, provider: &str) -> Result<Self, StreamError> {
        let status = host.load();
        if status != LoadStatus::Ok.code() {
            log::error!("live link module failed to load (status {status})");
            host.unload();
            return Err(StreamError::ModuleLoad { status });
        }
        let mut session = Session {
            host,
            provider: provider.to_string(),
            subjects: HashMap::new(),
            open: true,
        };
        session.host.set_provider_name(provider);
        let status = session.host.start_live_link();
        if status != LoadStatus::Ok.code() {
            log::error!("live link failed to start (status {status})");
            // dropping the session unloads the host
            return Err(StreamError::LinkStart { status });
        }
        if !session.host.has_connection() {
            log::warn!("provider '{provider}' started without a host connection");
        }
        log::info!("live link session '{provider}' started");
        Ok(session)
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn has_connection(&self) -> bool {
        self.host.has_connection()
    }

    /// Registered structure for `subject`, if any.
    pub fn structure(&self, subject: &str) -> Option<&Structure> {
        self.subjects.get(subject)
    }

    /// Declare `subject`'s shape. Must precede its first frame.
    pub fn register(&mut self, subject: &str, structure: Structure) -> Result<(), SinkError> {
        check_name(subject)?;
        for name in structure.properties() {
            check_name(name)?;
        }
        for bone in structure.bones() {
            check_name(&bone.name)?;
        }
        self.host.set_structure(subject, &structure)?;
        log::debug!(
            "registered {:?} subject '{}' ({} properties, {} bones)",
            structure.role(),
            subject,
            structure.properties().len(),
            structure.bones().len()
        );
        self.subjects.insert(subject.to_string(), structure);
        Ok(())
    }

    /// Send one frame for an already registered subject.
    pub fn send(&mut self, subject: &str, world_time: f64, frame: &Frame) -> Result<(), SinkError> {
        let structure = self
            .subjects
            .get(subject)
            .ok_or_else(|| SinkError::UnregisteredSubject(subject.to_string()))?;
        validate_frame(subject, structure, frame)?;
        self.host.update_frame(subject, world_time, frame)
    }

    pub fn set_transform_structure(
        &mut self,
        subject: &str,
        properties: Vec<String>,
    ) -> Result<(), SinkError> {
        self.register(subject, Structure::Transform { properties })
    }

    pub fn set_animation_structure(
        &mut self,
        subject: &str,
        properties: Vec<String>,
        bones: Vec<BoneSpec>,
    ) -> Result<(), SinkError> {
        self.register(subject, Structure::Animation { properties, bones })
    }

    pub fn set_basic_structure(
        &mut self,
        subject: &str,
        properties: Vec<String>,
    ) -> Result<(), SinkError> {
        self.register(subject, Structure::Basic { properties })
    }

    pub fn set_camera_structure(
        &mut self,
        subject: &str,
        properties: Vec<String>,
        camera: CameraStatic,
    ) -> Result<(), SinkError> {
        self.register(subject, Structure::Camera { properties, camera })
    }

    pub fn set_light_structure(
        &mut self,
        subject: &str,
        properties: Vec<String>,
        light: LightStatic,
    ) -> Result<(), SinkError> {
        self.register(subject, Structure::Light { properties, light })
    }

    pub fn update_transform_frame(
        &mut self,
        subject: &str,
        world_time: f64,
        metadata: Metadata,
        properties: Vec<f32>,
        transform: Transform,
    ) -> Result<(), SinkError> {
        let frame = Frame {
            metadata,
            properties,
            payload: Payload::Transform(transform),
        };
        self.send(subject, world_time, &frame)
    }

    pub fn update_animation_frame(
        &mut self,
        subject: &str,
        world_time: f64,
        metadata: Metadata,
        properties: Vec<f32>,
        transforms: Vec<Transform>,
    ) -> Result<(), SinkError> {
        let frame = Frame {
            metadata,
            properties,
            payload: Payload::Animation(transforms),
        };
        self.send(subject, world_time, &frame)
    }

    pub fn update_basic_frame(
        &mut self,
        subject: &str,
        world_time: f64,
        metadata: Metadata,
        properties: Vec<f32>,
    ) -> Result<(), SinkError> {
        let frame = Frame {
            metadata,
            properties,
            payload: Payload::Basic,
        };
        self.send(subject, world_time, &frame)
    }

    pub fn update_camera_frame(
        &mut self,
        subject: &str,
        world_time: f64,
        metadata: Metadata,
        properties: Vec<f32>,
        camera: Camera,
    ) -> Result<(), SinkError> {
        let frame = Frame {
            metadata,
            properties,
            payload: Payload::Camera(camera),
        };
        self.send(subject, world_time, &frame)
    }

    pub fn update_light_frame(
        &mut self,
        subject: &str,
        world_time: f64,
        metadata: Metadata,
        properties: Vec<f32>,
        light: Light,
    ) -> Result<(), SinkError> {
        let frame = Frame {
            metadata,
            properties,
            payload: Payload::Light(light),
        };
        self.send(subject, world_time, &frame)
    }

    /// Unload the host now instead of at drop.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.open {
            self.open = false;
            self.host.unload();
            log::info!("live link session '{}' closed", self.provider);
        }
    }
}

impl<H: LiveLinkHost> Drop for Session<H> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<H: LiveLinkHost> FrameSink<Frame> for Session<H> {
    fn deliver(&mut self, subject: &str, world_time: f64, frame: &Frame) -> Result<(), SinkError> {
        self.send(subject, world_time, frame)
    }
}

impl<H: LiveLinkHost> std::fmt::Debug for Session<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("provider", &self.provider)
            .field("subjects", &self.subjects.len())
            .field("open", &self.open)
            .finish()
    }
}

fn check_name(name: &str) -> Result<(), SinkError> {
    if name.len() >= MAX_NAME_LENGTH {
        return Err(SinkError::NameTooLong {
            name: name.to_string(),
            len: name.len(),
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(())
}

fn validate_frame(subject: &str, structure: &Structure, frame: &Frame) -> Result<(), SinkError> {
    let expected = structure.role();
    let actual = frame.role();
    if expected != actual {
        return Err(SinkError::RoleMismatch {
            subject: subject.to_string(),
            expected,
            actual,
        });
    }
    if let Payload::Animation(transforms) = &frame.payload {
        let bones = structure.bones().len();
        if transforms.len() != bones {
            return Err(SinkError::BoneCountMismatch {
                expected: bones,
                actual: transforms.len(),
            });
        }
    }
    // keys and values both land in fixed-size host name buffers
    for (key, value) in &frame.metadata.key_values {
        check_name(key)?;
        check_name(value)?;
    }
    let declared = structure.properties().len();
    if frame.properties.len() != declared {
        return Err(SinkError::PropertyCountMismatch {
            expected: declared,
            actual: frame.properties.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct NullHost {
        loaded: bool,
        unloads: usize,
        frames: usize,
    }

    impl LiveLinkHost for NullHost {
        fn load(&mut self) -> i32 {
            self.loaded = true;
            0
        }
        fn unload(&mut self) {
            self.loaded = false;
            self.unloads += 1;
        }
        fn set_provider_name(&mut self, _name: &str) {}
        fn start_live_link(&mut self) -> i32 {
            0
        }
        fn set_structure(&mut self, _s: &str, _st: &Structure) -> Result<(), SinkError> {
            Ok(())
        }
        fn update_frame(&mut self, _s: &str, _t: f64, _f: &Frame) -> Result<(), SinkError> {
            self.frames += 1;
            Ok(())
        }
    }

    #[test]
    fn load_status_codes() {
        assert_eq!(LoadStatus::from_code(2), Some(LoadStatus::MissingLib));
        assert_eq!(LoadStatus::from_code(42), None);
        assert_eq!(LoadStatus::Incomplete.code(), 3);
    }

    #[test]
    fn drop_unloads_once() {
        let mut host = NullHost::default();
        {
            let session = Session::open(&mut host, "test").unwrap();
            session.close();
        }
        assert_eq!(host.unloads, 1);
        assert!(!host.loaded);
    }

    #[test]
    fn frames_need_a_structure() {
        let mut host = NullHost::default();
        let mut session = Session::open(&mut host, "test").unwrap();
        let err = session
            .send("ghost", 0.0, &Frame::transform(Transform::default()))
            .unwrap_err();
        assert_eq!(err, SinkError::UnregisteredSubject("ghost".into()));
        drop(session);
        assert_eq!(host.frames, 0);
    }

    #[test]
    fn frame_shape_is_checked() {
        let mut host = NullHost::default();
        let mut session = Session::open(&mut host, "test").unwrap();
        session
            .set_animation_structure(
                "manny",
                vec![],
                vec![BoneSpec::new("root", -1), BoneSpec::new("hip", 0)],
            )
            .unwrap();
        let short = session.update_animation_frame(
            "manny",
            0.0,
            Metadata::default(),
            vec![],
            vec![Transform::default()],
        );
        assert_eq!(
            short,
            Err(SinkError::BoneCountMismatch {
                expected: 2,
                actual: 1
            })
        );
        let wrong_role = session.update_basic_frame("manny", 0.0, Metadata::default(), vec![]);
        assert!(matches!(wrong_role, Err(SinkError::RoleMismatch { .. })));
        let extra_props = session.update_animation_frame(
            "manny",
            0.0,
            Metadata::default(),
            vec![1.0],
            vec![Transform::default(); 2],
        );
        assert!(matches!(
            extra_props,
            Err(SinkError::PropertyCountMismatch {
                expected: 0,
                actual: 1
            })
        ));
    }

    #[test]
    fn oversized_metadata_never_reaches_host() {
        let mut host = NullHost::default();
        let mut session = Session::open(&mut host, "test").unwrap();
        session.set_transform_structure("s", vec![]).unwrap();
        let long_key = session.update_transform_frame(
            "s",
            0.0,
            Metadata::default().with_entry("k".repeat(300), "v"),
            vec![],
            Transform::default(),
        );
        assert!(matches!(
            long_key,
            Err(SinkError::NameTooLong { len: 300, .. })
        ));
        let long_value = session.update_transform_frame(
            "s",
            0.0,
            Metadata::default().with_entry("take", "v".repeat(MAX_NAME_LENGTH)),
            vec![],
            Transform::default(),
        );
        assert!(matches!(long_value, Err(SinkError::NameTooLong { .. })));
        session
            .update_transform_frame(
                "s",
                0.0,
                Metadata::default().with_entry("take", "v".repeat(MAX_NAME_LENGTH - 1)),
                vec![],
                Transform::default(),
            )
            .unwrap();
        drop(session);
        assert_eq!(host.frames, 1);
    }
}

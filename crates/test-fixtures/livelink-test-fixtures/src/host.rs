//! In-memory host that records every call, with scripted failures.

use livelink_stream::{Frame, LiveLinkHost, SinkError, Structure};

#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    Load,
    Unload,
    SetProviderName(String),
    StartLiveLink,
    SetStructure {
        subject: String,
        structure: Structure,
    },
    UpdateFrame {
        subject: String,
        world_time: f64,
        frame: Frame,
    },
}

#[derive(Debug, Default)]
pub struct RecordingHost {
    pub calls: Vec<HostCall>,
    /// Status returned from `load`.
    pub load_status: i32,
    /// Status returned from `start_live_link`.
    pub start_status: i32,
    pub reject_structures: bool,
    /// Zero-based index of the frame delivery that fails.
    pub fail_frame_at: Option<usize>,
    pub connected: bool,
    loaded: bool,
    frames_seen: usize,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self {
            connected: true,
            ..Self::default()
        }
    }

    pub fn failing_load(status: i32) -> Self {
        Self {
            load_status: status,
            ..Self::new()
        }
    }

    pub fn failing_start(status: i32) -> Self {
        Self {
            start_status: status,
            ..Self::new()
        }
    }

    pub fn failing_frame(index: usize) -> Self {
        Self {
            fail_frame_at: Some(index),
            ..Self::new()
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn frames(&self) -> Vec<(&str, f64, &Frame)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HostCall::UpdateFrame {
                    subject,
                    world_time,
                    frame,
                } => Some((subject.as_str(), *world_time, frame)),
                _ => None,
            })
            .collect()
    }

    pub fn structures(&self) -> Vec<(&str, &Structure)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HostCall::SetStructure { subject, structure } => {
                    Some((subject.as_str(), structure))
                }
                _ => None,
            })
            .collect()
    }

    pub fn unload_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, HostCall::Unload))
            .count()
    }
}

impl LiveLinkHost for RecordingHost {
    fn load(&mut self) -> i32 {
        self.calls.push(HostCall::Load);
        self.loaded = self.load_status == 0;
        self.load_status
    }

    fn unload(&mut self) {
        self.calls.push(HostCall::Unload);
        self.loaded = false;
    }

    fn set_provider_name(&mut self, name: &str) {
        self.calls.push(HostCall::SetProviderName(name.to_string()));
    }

    fn start_live_link(&mut self) -> i32 {
        self.calls.push(HostCall::StartLiveLink);
        self.start_status
    }

    fn has_connection(&self) -> bool {
        self.connected
    }

    fn set_structure(&mut self, subject: &str, structure: &Structure) -> Result<(), SinkError> {
        if self.reject_structures {
            return Err(SinkError::Rejected(format!("structure for '{subject}'")));
        }
        self.calls.push(HostCall::SetStructure {
            subject: subject.to_string(),
            structure: structure.clone(),
        });
        Ok(())
    }

    fn update_frame(
        &mut self,
        subject: &str,
        world_time: f64,
        frame: &Frame,
    ) -> Result<(), SinkError> {
        let index = self.frames_seen;
        self.frames_seen += 1;
        if self.fail_frame_at == Some(index) {
            return Err(SinkError::Rejected(format!("frame {index} for '{subject}'")));
        }
        self.calls.push(HostCall::UpdateFrame {
            subject: subject.to_string(),
            world_time,
            frame: frame.clone(),
        });
        Ok(())
    }
}

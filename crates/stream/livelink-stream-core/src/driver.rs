//! Stream setup and hand-off to the scheduler.
//!
//! Startup order is fixed: resolve the skeleton (if any), register the
//! structure exactly once, build the producer, then start ticking. No frame
//! can reach the sink before the registration call has returned `Ok`.

use crate::cancel::CancelToken;
use crate::clock::FrameClock;
use crate::config::{PacingMode, StreamConfig};
use crate::error::{SinkError, StreamError};
use crate::frame::Frame;
use crate::hierarchy::{resolve_with_root, BoneSpec, SkeletonTree};
use crate::scheduler::{FrameScheduler, Pacer, RunReport, ThreadPacer, Unpaced};
use crate::session::{LiveLinkHost, Session};
use crate::sink::FrameSink;
use crate::structure::StructureTemplate;

/// Composes hierarchy resolution, structure registration and the tick loop
/// for one named subject.
#[derive(Debug, Clone)]
pub struct StreamDriver {
    subject: String,
    config: StreamConfig,
    cancel: CancelToken,
}

impl StreamDriver {
    pub fn new(subject: impl Into<String>, config: StreamConfig) -> Self {
        Self {
            subject: subject.into(),
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Share an externally owned cancellation token.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Resolve `description` with the configured root bone. `None` yields an
    /// empty bone list.
    pub fn resolve(&self, description: Option<&SkeletonTree>) -> Result<Vec<BoneSpec>, StreamError> {
        let Some(tree) = description else {
            return Ok(Vec::new());
        };
        let bones = resolve_with_root(tree, &self.config.root_bone)?;
        log::debug!(
            "resolved {} bones for '{}': {:?}",
            bones.len(),
            self.subject,
            bones.iter().map(|b| b.name.as_str()).collect::<Vec<_>>()
        );
        Ok(bones)
    }

    /// Run with a caller-supplied registrar and sink.
    ///
    /// `registrar` is called exactly once with the resolved bones (empty when
    /// no description is given) before `producer_factory` builds the per-tick
    /// producer.
    pub fn run<T, R, F, P, S>(
        &self,
        description: Option<&SkeletonTree>,
        registrar: R,
        producer_factory: F,
        sink: &mut S,
    ) -> Result<RunReport, StreamError>
    where
        R: FnOnce(&[BoneSpec]) -> Result<(), SinkError>,
        F: FnOnce(&[BoneSpec]) -> P,
        P: FnMut(u64, f64) -> T,
        S: FrameSink<T> + ?Sized,
    {
        self.config.validate()?;
        let bones = self.resolve(description)?;
        registrar(&bones).map_err(|e| StreamError::structure(&self.subject, e))?;
        let producer = producer_factory(&bones);
        self.schedule(producer, sink)
    }

    /// Register `template` on `session` and stream the producer's frames to it.
    pub fn run_subject<H, F, P>(
        &self,
        session: &mut Session<H>,
        template: StructureTemplate,
        description: Option<&SkeletonTree>,
        producer_factory: F,
    ) -> Result<RunReport, StreamError>
    where
        H: LiveLinkHost,
        F: FnOnce(&[BoneSpec]) -> P,
        P: FnMut(u64, f64) -> Frame,
    {
        self.config.validate()?;
        let bones = self.resolve(description)?;
        session
            .register(&self.subject, template.into_structure(&bones))
            .map_err(|e| StreamError::structure(&self.subject, e))?;
        let producer = producer_factory(&bones);
        self.schedule(producer, session)
    }

    fn schedule<T, P, S>(&self, producer: P, sink: &mut S) -> Result<RunReport, StreamError>
    where
        P: FnMut(u64, f64) -> T,
        S: FrameSink<T> + ?Sized,
    {
        let clock = FrameClock::from_fps(self.config.target_fps)?;
        match self.config.pacing {
            PacingMode::RealTime => self.schedule_with(ThreadPacer, clock, producer, sink),
            PacingMode::Unpaced => self.schedule_with(Unpaced, clock, producer, sink),
        }
    }

    fn schedule_with<T, Pc, P, S>(
        &self,
        pacer: Pc,
        clock: FrameClock,
        producer: P,
        sink: &mut S,
    ) -> Result<RunReport, StreamError>
    where
        Pc: Pacer,
        P: FnMut(u64, f64) -> T,
        S: FrameSink<T> + ?Sized,
    {
        log::info!(
            "streaming '{}' at {} fps ({:?})",
            self.subject,
            self.config.target_fps,
            self.config.step_budget()
        );
        let mut scheduler = FrameScheduler::with_pacer(clock, pacer)
            .with_progress_interval(self.config.progress_interval)
            .with_tick_deadline(self.config.tick_deadline());
        let report = scheduler.run(
            &self.subject,
            producer,
            sink,
            self.config.step_budget(),
            &self.cancel,
        )?;
        log::info!(
            "stream '{}' {:?} after {} ticks ({:.3}s wall)",
            self.subject,
            report.state,
            report.ticks,
            report.elapsed.as_secs_f64()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::SchedulerState;

    fn unpaced(steps: u64) -> StreamConfig {
        StreamConfig::default()
            .with_step_count(Some(steps))
            .with_pacing(PacingMode::Unpaced)
    }

    #[test]
    fn registrar_runs_once_before_first_frame() {
        let driver = StreamDriver::new("s", unpaced(2));
        let mut events: Vec<String> = Vec::new();
        let tree = SkeletonTree::from_json_str(r#"{"root": {"hip": {}}}"#).unwrap();
        let registered = std::cell::Cell::new(0usize);
        let mut sink = |_: &str, t: f64, _: &u64| -> Result<(), SinkError> {
            assert_eq!(registered.get(), 1);
            events.push(format!("frame {t}"));
            Ok(())
        };
        let report = driver
            .run(
                Some(&tree),
                |bones| {
                    assert_eq!(bones.len(), 2);
                    registered.set(registered.get() + 1);
                    Ok(())
                },
                |_| |i: u64, _: f64| i,
                &mut sink,
            )
            .unwrap();
        assert_eq!(report.state, SchedulerState::Completed);
        assert_eq!(registered.get(), 1);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn bad_hierarchy_never_registers() {
        let driver = StreamDriver::new("s", unpaced(2));
        let tree = SkeletonTree::new().with_leaf("pelvis");
        let mut sink = |_: &str, _: f64, _: &()| -> Result<(), SinkError> {
            panic!("no frame expected")
        };
        let err = driver
            .run(
                Some(&tree),
                |_| panic!("registrar must not run"),
                |_| |_: u64, _: f64| (),
                &mut sink,
            )
            .unwrap_err();
        assert!(matches!(err, StreamError::MalformedHierarchy(_)));
    }

    #[test]
    fn invalid_fps_is_a_config_error() {
        let driver = StreamDriver::new("s", unpaced(1).with_target_fps(-1.0));
        let mut sink = |_: &str, _: f64, _: &()| -> Result<(), SinkError> { Ok(()) };
        let err = driver
            .run(None, |_| Ok(()), |_| |_: u64, _: f64| (), &mut sink)
            .unwrap_err();
        assert!(matches!(err, StreamError::InvalidConfig(_)));
    }
}

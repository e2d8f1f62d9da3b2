//! The session controller: serializes inputs into the challenge machine and
//! carries out the effects it returns.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use veriface_liveness::{
    CaptureToken, ChallengeEvent, ChallengeMachine, ChallengeSession, ChallengeState, Effect,
    Input, Notice,
};
use veriface_store::ProfileStore;
use veriface_verification::{VerificationOutcome, VerificationPipeline};

use crate::collaborators::{Collaborators, Presenter};
use crate::config::SessionConfig;
use crate::guard::DeviceGuard;
use crate::stats::OutcomeStats;
use crate::SessionError;

/// Commands buffered between the detector/host and the controller.
const COMMAND_QUEUE_DEPTH: usize = 64;

/// Requests a host or detector can send to a running session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionCommand {
    Event(ChallengeEvent),
    Pause,
    Resume,
    Reset,
    Stop,
}

/// A command stamped with the restart epoch it was sent in.
#[derive(Debug)]
struct Queued {
    command: SessionCommand,
    epoch: u64,
}

/// Cloneable sender side of a session's command queue.
///
/// Pause and reset open a new epoch when they are sent, so detector events
/// sent after them belong to the attempt they start.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    tx: mpsc::Sender<Queued>,
    epoch: Arc<AtomicU64>,
}

impl SessionHandle {
    fn stamp(&self, command: SessionCommand) -> Queued {
        let epoch = match command {
            SessionCommand::Pause | SessionCommand::Reset => {
                self.epoch.fetch_add(1, Ordering::SeqCst) + 1
            }
            _ => self.epoch.load(Ordering::SeqCst),
        };
        Queued { command, epoch }
    }

    pub async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.tx
            .send(self.stamp(command))
            .await
            .map_err(|_| SessionError::Closed)
    }

    /// Non-blocking send, for detector callbacks running outside the runtime.
    pub fn try_send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.tx.try_send(self.stamp(command)).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SessionError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => SessionError::Closed,
        })
    }

    pub async fn challenge_completed(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Event(ChallengeEvent::ChallengeCompleted))
            .await
    }

    pub async fn idle_tick(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Event(ChallengeEvent::IdleTick)).await
    }

    pub async fn pause(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Pause).await
    }

    pub async fn resume(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Resume).await
    }

    pub async fn reset(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Reset).await
    }

    pub async fn stop(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Stop).await
    }
}

/// Summary of a finished session.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionReport {
    pub final_state: ChallengeState,
    /// Challenge attempts started.
    pub attempts: u64,
    pub retry_count: u32,
    pub last_outcome: Option<VerificationOutcome>,
    pub stats: OutcomeStats,
}

/// At most one pending delayed capture.
#[derive(Debug, Default)]
struct CaptureTimer {
    pending: Option<(Instant, CaptureToken)>,
}

impl CaptureTimer {
    fn schedule(&mut self, token: CaptureToken, delay: Duration) {
        self.pending = Some((Instant::now() + delay, token));
    }

    fn cancel(&mut self) {
        self.pending = None;
    }

    fn take(&mut self) -> Option<CaptureToken> {
        self.pending.take().map(|(_, token)| token)
    }

    async fn elapsed(pending: Option<(Instant, CaptureToken)>) -> CaptureToken {
        match pending {
            Some((deadline, token)) => {
                tokio::time::sleep_until(deadline).await;
                token
            }
            None => std::future::pending().await,
        }
    }
}

enum Wake {
    Command(Option<Queued>),
    CaptureDue(CaptureToken),
}

/// Runs one verification session on one device.
///
/// Inputs reach the machine strictly one at a time, whether they come from
/// the synchronous methods or from [`SessionController::run`]. The camera and
/// detector are released exactly once on every exit path, including drop.
pub struct SessionController {
    machine: ChallengeMachine,
    devices: DeviceGuard,
    presenter: Box<dyn Presenter>,
    commands_tx: Option<mpsc::Sender<Queued>>,
    commands_rx: mpsc::Receiver<Queued>,
    /// Latest epoch, shared with every handle.
    epoch: Arc<AtomicU64>,
    /// Queued detector events stamped before this epoch are stale.
    accept_from: u64,
    /// Epoch opened by the pause or reset currently being dispatched.
    opened: Option<u64>,
    timer: CaptureTimer,
    stats: OutcomeStats,
    finished: bool,
    terminated: bool,
}

impl SessionController {
    /// Load the subject's profile and assemble the session.
    ///
    /// The camera and detector are released if setup fails.
    pub fn new<S: ProfileStore + ?Sized>(
        config: &SessionConfig,
        store: &S,
        collaborators: Collaborators,
    ) -> Result<Self, SessionError> {
        let Collaborators {
            camera,
            detector,
            presenter,
            cropper,
            anti_spoof,
            embedder,
            picker,
        } = collaborators;
        let devices = DeviceGuard::new(camera, detector);

        config.validate()?;
        let subject = config.subject()?;
        let profile = store.load(&subject, config.mode)?;
        let thresholds = config.thresholds();
        tracing::info!(
            %subject,
            mode = %config.mode,
            enrolled = profile.len(),
            distance_threshold = thresholds.embedding_distance_threshold,
            "session ready"
        );

        let pipeline = VerificationPipeline::new(cropper, anti_spoof, embedder, config.params());
        let machine = ChallengeMachine::new(
            config.mode,
            profile,
            thresholds,
            pipeline,
            picker,
            config.policy(),
        )?;

        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        Ok(Self {
            machine,
            devices,
            presenter,
            commands_tx: Some(tx),
            commands_rx: rx,
            epoch: Arc::new(AtomicU64::new(0)),
            accept_from: 0,
            opened: None,
            timer: CaptureTimer::default(),
            stats: OutcomeStats::new(),
            finished: false,
            terminated: false,
        })
    }

    /// A sender for detector events and host requests.
    ///
    /// Must be taken before [`run`](Self::run); the session stops once every
    /// handle is dropped.
    pub fn handle(&self) -> Option<SessionHandle> {
        self.commands_tx.as_ref().map(|tx| SessionHandle {
            tx: tx.clone(),
            epoch: Arc::clone(&self.epoch),
        })
    }

    pub fn state(&self) -> ChallengeState {
        self.machine.state()
    }

    pub fn session(&self) -> &ChallengeSession {
        self.machine.session()
    }

    pub fn stats(&self) -> &OutcomeStats {
        &self.stats
    }

    pub fn is_finished(&self) -> bool {
        self.finished || self.terminated
    }

    pub fn devices_released(&self) -> bool {
        self.devices.is_released()
    }

    /// Token of the scheduled capture, if one is pending.
    pub fn pending_capture(&self) -> Option<CaptureToken> {
        self.timer.pending.map(|(_, token)| token)
    }

    pub fn report(&self) -> SessionReport {
        let session = self.machine.session();
        SessionReport {
            final_state: session.state,
            attempts: session.attempt,
            retry_count: session.retries.get(),
            last_outcome: session.last_outcome,
            stats: self.stats.clone(),
        }
    }

    pub fn start(&mut self) -> Result<(), SessionError> {
        self.ensure_live()?;
        self.apply(Input::Start)
    }

    pub fn handle_event(&mut self, event: ChallengeEvent) -> Result<(), SessionError> {
        self.ensure_live()?;
        self.apply(Input::Challenge(event))
    }

    pub fn pause(&mut self) -> Result<(), SessionError> {
        self.ensure_live()?;
        self.apply(Input::Pause)
    }

    pub fn resume(&mut self) -> Result<(), SessionError> {
        self.ensure_live()?;
        self.apply(Input::Resume)
    }

    /// Start a fresh challenge and clear the distance-failure counter.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.ensure_live()?;
        self.apply(Input::Reset)
    }

    /// End the session. Idempotent.
    pub fn stop(&mut self) -> Result<(), SessionError> {
        if self.is_finished() {
            return Ok(());
        }
        self.apply(Input::Stop)
    }

    /// Fire the pending capture timer now instead of waiting for its delay.
    ///
    /// Returns whether a capture was pending.
    pub fn fire_pending_capture(&mut self) -> Result<bool, SessionError> {
        self.ensure_live()?;
        match self.timer.take() {
            Some(token) => {
                self.apply(Input::CaptureDue(token))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Drive the session from its command queue until it stops, fails, or
    /// every [`SessionHandle`] is dropped. Starts the session if needed.
    pub async fn run(mut self) -> Result<SessionReport, SessionError> {
        self.commands_tx = None;
        if self.state() == ChallengeState::Idle && !self.is_finished() {
            self.start()?;
        }

        while !self.is_finished() {
            let pending = self.timer.pending;
            let wake = tokio::select! {
                biased;
                command = self.commands_rx.recv() => Wake::Command(command),
                token = CaptureTimer::elapsed(pending) => Wake::CaptureDue(token),
            };

            match wake {
                Wake::Command(Some(command)) => self.dispatch(command)?,
                Wake::Command(None) => {
                    tracing::info!("all session handles dropped, stopping");
                    self.stop()?;
                }
                Wake::CaptureDue(token) => {
                    self.timer.cancel();
                    self.apply(Input::CaptureDue(token))?;
                }
            }
        }

        let report = self.report();
        tracing::info!(
            final_state = ?report.final_state,
            attempts = report.attempts,
            retry_count = report.retry_count,
            verifications = report.stats.total(),
            "session ended"
        );
        Ok(report)
    }

    fn dispatch(&mut self, queued: Queued) -> Result<(), SessionError> {
        let Queued { command, epoch } = queued;
        tracing::trace!(?command, epoch, "session command");
        match command {
            SessionCommand::Event(event) if epoch < self.accept_from => {
                tracing::debug!(?event, epoch, "stale detector event discarded");
                Ok(())
            }
            SessionCommand::Event(event) => self.handle_event(event),
            SessionCommand::Pause => self.in_epoch(epoch, Self::pause),
            SessionCommand::Resume => self.resume(),
            SessionCommand::Reset => self.in_epoch(epoch, Self::reset),
            SessionCommand::Stop => self.stop(),
        }
    }

    fn in_epoch(
        &mut self,
        epoch: u64,
        apply: fn(&mut Self) -> Result<(), SessionError>,
    ) -> Result<(), SessionError> {
        self.opened = Some(epoch);
        let result = apply(self);
        self.opened = None;
        result
    }

    fn ensure_live(&self) -> Result<(), SessionError> {
        if self.is_finished() {
            Err(SessionError::Terminated)
        } else {
            Ok(())
        }
    }

    /// Feed `input` to the machine, then any follow-up inputs its effects produce.
    fn apply(&mut self, input: Input) -> Result<(), SessionError> {
        let mut queue = VecDeque::from([input]);
        while let Some(input) = queue.pop_front() {
            let effects = match self.machine.handle(input) {
                Ok(effects) => effects,
                Err(e) => {
                    self.terminate(&e.to_string());
                    return Err(e.into());
                }
            };
            for effect in effects {
                self.execute(effect, &mut queue)?;
            }
        }
        Ok(())
    }

    fn execute(&mut self, effect: Effect, queue: &mut VecDeque<Input>) -> Result<(), SessionError> {
        match effect {
            Effect::Present(notice) => {
                if let Notice::Outcome(report) = &notice {
                    self.stats.record(report.outcome);
                }
                self.presenter.present(&notice);
            }
            Effect::ArmDetector(motion) => self.devices.detector().arm(motion),
            Effect::MarkChallengeDone => self.devices.detector().mark_challenge_done(),
            Effect::ScheduleCapture { token, delay } => self.timer.schedule(token, delay),
            Effect::CancelCapture => self.timer.cancel(),
            Effect::RequestCapture(token) => {
                let result = self.devices.capture();
                queue.push_back(Input::Captured { token, result });
            }
            Effect::StartPreview => {
                if let Err(failure) = self.devices.start_preview() {
                    self.machine.fail();
                    self.terminate(&failure.to_string());
                    return Err(SessionError::Capture(failure));
                }
            }
            Effect::StopPreview => self.devices.stop_preview(),
            Effect::ClearPendingEvents => self.clear_pending_events(),
            Effect::Finish => {
                self.finished = true;
                self.timer.cancel();
                self.devices.release();
            }
        }
        Ok(())
    }

    /// Mark every detector event sent before this point as stale.
    ///
    /// A queued pause or reset already opened its epoch when it was sent;
    /// restarts the controller decides on open a new one here.
    fn clear_pending_events(&mut self) {
        let boundary = self
            .opened
            .take()
            .unwrap_or_else(|| self.epoch.fetch_add(1, Ordering::SeqCst) + 1);
        self.accept_from = self.accept_from.max(boundary);
        tracing::trace!(accept_from = self.accept_from, "pending detector events invalidated");
    }

    fn terminate(&mut self, reason: &str) {
        tracing::error!(reason, state = ?self.machine.state(), "session terminated");
        self.presenter.present(&Notice::Fatal(reason.to_string()));
        self.timer.cancel();
        self.devices.release();
        self.terminated = true;
    }
}

//! The challenge machine: one input in, a list of effects out.

use std::time::Duration;

use crate::effect::{Effect, Notice, INITIAL_INSTRUCTION, SUCCESS_INSTRUCTION};
use crate::event::{CaptureFailure, CaptureToken, ChallengeEvent, Input};
use crate::random::MotionPicker;
use crate::state::{ChallengeSession, ChallengeState};
use crate::LivenessError;
use veriface_types::{
    IdentityProfile, Motion, OperatingMode, ThresholdConfig, DEFAULT_CAPTURE_DELAY_MS,
};
use veriface_verification::{
    CapturedImage, VerificationContext, VerificationPipeline, VerificationReport,
};

/// Host-configurable behavior around the fixed challenge flow.
#[derive(Clone, Debug, PartialEq)]
pub struct ChallengePolicy {
    /// Delay between the post-challenge idle tick and the photo.
    pub capture_delay: Duration,
    /// Restart the challenge after acceptance instead of finishing the session.
    pub restart_on_accept: bool,
    /// Clear the distance-failure counter when a capture is accepted.
    pub reset_retries_on_accept: bool,
    /// Prompts to choose from; must not be empty.
    pub motions: Vec<Motion>,
}

impl Default for ChallengePolicy {
    fn default() -> Self {
        Self {
            capture_delay: Duration::from_millis(DEFAULT_CAPTURE_DELAY_MS),
            restart_on_accept: true,
            reset_retries_on_accept: false,
            motions: Motion::ALL.to_vec(),
        }
    }
}

/// Sequences liveness challenges and verifies the photo taken after each one.
///
/// Inputs are handled strictly one at a time; verification runs synchronously
/// inside the `Captured` input, so at most one verification is ever in flight.
pub struct ChallengeMachine {
    session: ChallengeSession,
    policy: ChallengePolicy,
    picker: Box<dyn MotionPicker>,
    pipeline: VerificationPipeline,
    profile: IdentityProfile,
    thresholds: ThresholdConfig,
}

impl ChallengeMachine {
    pub fn new(
        mode: OperatingMode,
        profile: IdentityProfile,
        thresholds: ThresholdConfig,
        pipeline: VerificationPipeline,
        picker: Box<dyn MotionPicker>,
        policy: ChallengePolicy,
    ) -> Result<Self, LivenessError> {
        if policy.motions.is_empty() {
            return Err(LivenessError::NoMotions);
        }
        if profile.mode() != mode {
            return Err(LivenessError::ProfileModeMismatch {
                profile: profile.mode(),
                session: mode,
            });
        }
        Ok(Self {
            session: ChallengeSession::new(mode),
            policy,
            picker,
            pipeline,
            profile,
            thresholds,
        })
    }

    pub fn session(&self) -> &ChallengeSession {
        &self.session
    }

    pub fn state(&self) -> ChallengeState {
        self.session.state
    }

    pub fn profile(&self) -> &IdentityProfile {
        &self.profile
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    pub fn policy(&self) -> &ChallengePolicy {
        &self.policy
    }

    /// Mark the session failed after a collaborator failure seen by the host.
    pub fn fail(&mut self) {
        self.session.state = ChallengeState::Failed;
    }

    /// Handle one input.
    ///
    /// On `Err` the session is in [`ChallengeState::Failed`]; the host must
    /// release its collaborators. It is never left in `Verifying`.
    pub fn handle(&mut self, input: Input) -> Result<Vec<Effect>, LivenessError> {
        if self.session.state.is_terminal() {
            tracing::debug!(state = ?self.session.state, ?input, "session over, input ignored");
            return Ok(Vec::new());
        }

        let result = match input {
            Input::Start => self.on_start(),
            Input::Challenge(event) => Ok(self.on_challenge_event(event)),
            Input::CaptureDue(token) => Ok(self.on_capture_due(token)),
            Input::Captured { token, result } => self.on_captured(token, result),
            Input::Pause => Ok(self.on_pause()),
            Input::Resume => Ok(self.on_resume()),
            Input::Reset => {
                self.session.retries.reset();
                if self.session.state == ChallengeState::Idle {
                    self.on_start()
                } else {
                    self.restart(Vec::new())
                }
            }
            Input::Stop => {
                self.session.state = ChallengeState::Finished;
                Ok(vec![
                    Effect::CancelCapture,
                    Effect::StopPreview,
                    Effect::ClearPendingEvents,
                    Effect::Finish,
                ])
            }
        };
        if result.is_err() {
            self.session.state = ChallengeState::Failed;
        }
        result
    }

    fn on_start(&mut self) -> Result<Vec<Effect>, LivenessError> {
        if self.session.state != ChallengeState::Idle {
            tracing::debug!(state = ?self.session.state, "already started");
            return Ok(Vec::new());
        }
        let mut effects = vec![Effect::Present(Notice::Instruction(INITIAL_INSTRUCTION))];
        effects.extend(self.arm_new_attempt()?);
        Ok(effects)
    }

    /// Pick a prompt, reset per-attempt state and arm the detector.
    fn arm_new_attempt(&mut self) -> Result<Vec<Effect>, LivenessError> {
        let motion = self
            .picker
            .pick(&self.policy.motions)
            .ok_or(LivenessError::NoMotions)?;
        self.session.begin_attempt(motion);
        tracing::info!(
            attempt = self.session.attempt,
            ?motion,
            retry_count = self.session.retries.get(),
            "challenge armed"
        );

        let mut effects = vec![
            Effect::Present(Notice::Prompt(motion)),
            Effect::ArmDetector(motion),
        ];
        if !self.session.paused {
            effects.push(Effect::StartPreview);
        }
        Ok(effects)
    }

    /// Quiesce the current attempt and arm a fresh one. `effects` come first.
    fn restart(&mut self, mut effects: Vec<Effect>) -> Result<Vec<Effect>, LivenessError> {
        effects.extend([
            Effect::CancelCapture,
            Effect::StopPreview,
            Effect::ClearPendingEvents,
        ]);
        effects.extend(self.arm_new_attempt()?);
        Ok(effects)
    }

    fn on_challenge_event(&mut self, event: ChallengeEvent) -> Vec<Effect> {
        if self.session.paused {
            tracing::trace!(?event, "paused, event dropped");
            return Vec::new();
        }

        match event {
            ChallengeEvent::ChallengeCompleted => {
                if self.session.state != ChallengeState::AwaitingMotion
                    || self.session.verified_this_attempt
                {
                    tracing::trace!(state = ?self.session.state, "duplicate or early completion ignored");
                    return Vec::new();
                }
                self.session.verified_this_attempt = true;
                self.session.challenge_completed = true;
                self.session.state = ChallengeState::MotionSatisfied;
                tracing::debug!(attempt = self.session.attempt, "challenge satisfied");
                vec![
                    Effect::MarkChallengeDone,
                    Effect::Present(Notice::Instruction(SUCCESS_INSTRUCTION)),
                ]
            }
            ChallengeEvent::IdleTick => {
                if !self.session.challenge_completed
                    || self.session.state != ChallengeState::MotionSatisfied
                {
                    return Vec::new();
                }
                self.session.capture_token += 1;
                self.session.state = ChallengeState::AwaitingCapture;
                tracing::debug!(
                    token = self.session.capture_token,
                    delay_ms = self.policy.capture_delay.as_millis() as u64,
                    "capture scheduled"
                );
                vec![Effect::ScheduleCapture {
                    token: self.session.capture_token,
                    delay: self.policy.capture_delay,
                }]
            }
        }
    }

    fn is_current_capture(&self, token: CaptureToken) -> bool {
        token == self.session.capture_token
            && self.session.state == ChallengeState::AwaitingCapture
            && !self.session.paused
    }

    fn on_capture_due(&mut self, token: CaptureToken) -> Vec<Effect> {
        if !self.is_current_capture(token) {
            tracing::debug!(token, current = self.session.capture_token, "stale capture timer");
            return Vec::new();
        }
        vec![Effect::RequestCapture(token)]
    }

    fn on_captured(
        &mut self,
        token: CaptureToken,
        result: Result<CapturedImage, CaptureFailure>,
    ) -> Result<Vec<Effect>, LivenessError> {
        if !self.is_current_capture(token) {
            tracing::debug!(token, current = self.session.capture_token, "stale capture discarded");
            return Ok(Vec::new());
        }

        let image = match result {
            Ok(image) => image,
            Err(failure) => {
                tracing::error!(%failure, "capture failed");
                return Err(LivenessError::Capture(failure));
            }
        };

        self.session.state = ChallengeState::Verifying;
        let ctx = VerificationContext {
            mode: self.session.mode,
            profile: &self.profile,
            thresholds: &self.thresholds,
        };
        let report = match self.pipeline.run(&image, &ctx, &mut self.session.retries) {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "verification collaborator failed");
                return Err(e.into());
            }
        };
        self.conclude(report)
    }

    fn conclude(&mut self, report: VerificationReport) -> Result<Vec<Effect>, LivenessError> {
        let outcome = report.outcome;
        self.session.last_outcome = Some(outcome);
        let mut effects = vec![Effect::Present(Notice::Outcome(report))];

        if outcome.is_accepted() {
            self.session.state = ChallengeState::Accepted;
            if self.policy.reset_retries_on_accept {
                self.session.retries.reset();
            }
            if !self.policy.restart_on_accept {
                self.session.state = ChallengeState::Finished;
                tracing::info!(attempt = self.session.attempt, "accepted, session finished");
                effects.extend([
                    Effect::StopPreview,
                    Effect::ClearPendingEvents,
                    Effect::Finish,
                ]);
                return Ok(effects);
            }
        } else {
            self.session.state = ChallengeState::Rejected;
        }

        self.restart(effects)
    }

    fn on_pause(&mut self) -> Vec<Effect> {
        if self.session.paused {
            return Vec::new();
        }
        self.session.paused = true;
        if self.session.state == ChallengeState::AwaitingCapture {
            // The pending photo is abandoned; the next idle tick after resume re-arms it.
            self.session.capture_token += 1;
            self.session.state = ChallengeState::MotionSatisfied;
        }
        tracing::debug!(state = ?self.session.state, "paused");
        vec![
            Effect::CancelCapture,
            Effect::StopPreview,
            Effect::ClearPendingEvents,
        ]
    }

    fn on_resume(&mut self) -> Vec<Effect> {
        if !self.session.paused {
            return Vec::new();
        }
        self.session.paused = false;
        tracing::debug!(state = ?self.session.state, "resumed");
        if self.session.state == ChallengeState::Idle {
            Vec::new()
        } else {
            vec![Effect::StartPreview]
        }
    }
}

//! Challenge states and the mutable per-session record.

use crate::event::CaptureToken;
use serde::{Deserialize, Serialize};
use veriface_types::{Motion, OperatingMode};
use veriface_verification::{RetryCounter, VerificationOutcome};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChallengeState {
    Idle,
    AwaitingMotion,
    MotionSatisfied,
    AwaitingCapture,
    Verifying,
    Accepted,
    Rejected,
    /// Session ended normally (stop, or acceptance with restart disabled).
    Finished,
    /// Session ended by a collaborator failure.
    Failed,
}

impl ChallengeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }
}

/// State owned by one session. Never shared across sessions.
#[derive(Clone, Debug)]
pub struct ChallengeSession {
    pub mode: OperatingMode,
    pub state: ChallengeState,
    /// Prompt for the current attempt.
    pub selected_motion: Option<Motion>,
    pub challenge_completed: bool,
    /// Guards against handling the completion event twice in one attempt.
    pub verified_this_attempt: bool,
    /// Consecutive distance failures; survives challenge restarts.
    pub retries: RetryCounter,
    /// Number of challenge attempts started.
    pub attempt: u64,
    /// Token of the capture currently allowed to complete.
    pub capture_token: CaptureToken,
    pub paused: bool,
    pub last_outcome: Option<VerificationOutcome>,
}

impl ChallengeSession {
    pub fn new(mode: OperatingMode) -> Self {
        Self {
            mode,
            state: ChallengeState::Idle,
            selected_motion: None,
            challenge_completed: false,
            verified_this_attempt: false,
            retries: RetryCounter::new(),
            attempt: 0,
            capture_token: 0,
            paused: false,
            last_outcome: None,
        }
    }

    /// Clear per-attempt fields and invalidate any outstanding capture.
    pub(crate) fn begin_attempt(&mut self, motion: Motion) {
        self.selected_motion = Some(motion);
        self.challenge_completed = false;
        self.verified_this_attempt = false;
        self.attempt += 1;
        self.capture_token += 1;
        self.state = ChallengeState::AwaitingMotion;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_attempt_keeps_retries() {
        let mut session = ChallengeSession::new(OperatingMode::Remote);
        session.retries.increment();
        session.challenge_completed = true;
        session.verified_this_attempt = true;
        let token = session.capture_token;

        session.begin_attempt(Motion::Right);

        assert_eq!(session.state, ChallengeState::AwaitingMotion);
        assert_eq!(session.selected_motion, Some(Motion::Right));
        assert!(!session.challenge_completed);
        assert!(!session.verified_this_attempt);
        assert_eq!(session.retries.get(), 1);
        assert_eq!(session.attempt, 1);
        assert!(session.capture_token > token);
    }
}

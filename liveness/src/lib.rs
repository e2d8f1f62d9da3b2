//! Liveness challenge state machine.
//!
//! `Idle -> AwaitingMotion -> MotionSatisfied -> AwaitingCapture -> Verifying
//! -> {Accepted | Rejected} -> AwaitingMotion`.
//!
//! The machine performs no I/O and owns no threads. The host feeds it
//! [`Input`]s one at a time and carries out the returned [`Effect`]s
//! (preview control, timers, detector callbacks, presentation).

pub mod effect;
pub mod error;
pub mod event;
pub mod machine;
pub mod random;
pub mod state;

pub use effect::{Effect, Notice, INITIAL_INSTRUCTION, SUCCESS_INSTRUCTION};
pub use error::LivenessError;
pub use event::{CaptureFailure, CaptureToken, ChallengeEvent, Input};
pub use machine::{ChallengeMachine, ChallengePolicy};
pub use random::{MotionPicker, RandomMotionPicker};
pub use state::{ChallengeSession, ChallengeState};

//! Verification session controller.
//!
//! Wires the liveness challenge machine to its collaborators for one user
//! session on one device:
//! - loads the subject's profile and selects the mode's thresholds
//! - feeds detector events, pause/resume/reset requests and capture timers
//!   to the machine one at a time
//! - carries out the machine's effects (preview, detector callbacks,
//!   presentation, delayed capture)
//! - releases the camera and detector on every exit path

pub mod collaborators;
pub mod config;
pub mod controller;
pub mod error;
pub mod guard;
pub mod logging;
pub mod stats;

pub use collaborators::{CaptureDevice, ChallengeDetector, Collaborators, Presenter};
pub use config::{SessionConfig, ThresholdOverrides};
pub use controller::{SessionCommand, SessionController, SessionHandle, SessionReport};
pub use error::SessionError;
pub use guard::DeviceGuard;
pub use logging::{init_logging, LogFormat};
pub use stats::OutcomeStats;

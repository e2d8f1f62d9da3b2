//! Directional head-motion prompts used by the liveness challenge.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Motion {
    Left,
    Right,
}

impl Motion {
    /// Every prompt the challenge may select from.
    pub const ALL: [Motion; 2] = [Motion::Left, Motion::Right];

    /// Instruction text shown to the subject for this prompt.
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::Left => "Look to the left",
            Self::Right => "Look to the right",
        }
    }
}

//! Nullable prompt selection.

use std::sync::{Arc, Mutex};

use veriface_liveness::MotionPicker;
use veriface_types::Motion;

/// Picks prompts from a fixed script, cycling when it runs out.
///
/// Scripted motions not offered by the caller are skipped.
#[derive(Clone)]
pub struct NullMotionPicker {
    script: Arc<Vec<Motion>>,
    index: Arc<Mutex<usize>>,
}

impl NullMotionPicker {
    pub fn new(script: Vec<Motion>) -> Self {
        Self {
            script: Arc::new(script),
            index: Arc::new(Mutex::new(0)),
        }
    }

    /// Always the same prompt.
    pub fn constant(motion: Motion) -> Self {
        Self::new(vec![motion])
    }

    /// Number of prompts handed out.
    pub fn picks(&self) -> usize {
        *self.index.lock().unwrap()
    }
}

impl MotionPicker for NullMotionPicker {
    fn pick(&mut self, motions: &[Motion]) -> Option<Motion> {
        if self.script.is_empty() {
            return motions.first().copied();
        }
        let mut index = self.index.lock().unwrap();
        for _ in 0..self.script.len() {
            let motion = self.script[*index % self.script.len()];
            *index += 1;
            if motions.contains(&motion) {
                return Some(motion);
            }
        }
        None
    }
}

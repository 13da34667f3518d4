//! Host configuration
use chip8::prelude::*;
use serde::Deserialize;

use crate::error::CliError;

/// Headless runner settings, loaded from an optional YAML file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CliConf {
    /// Number of 60 Hz frames to run before printing the display.
    pub frames: usize,
    /// Instructions executed per frame.
    pub steps_per_frame: usize,
    /// Pace frames against the wall clock.
    pub throttle: bool,
    pub rng_seed: Option<u64>,
    /// Scripted keypad input.
    pub keys: Vec<KeyEvent>,
}

impl Default for CliConf {
    fn default() -> Self {
        Self {
            frames: 600,
            steps_per_frame: 10,
            throttle: true,
            rng_seed: None,
            keys: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeyEvent {
    pub frame: usize,
    pub key: KeyCode,
    pub pressed: bool,
}

impl CliConf {
    pub fn from_yaml(source: &str) -> Result<Self, CliError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn vm_conf(&self) -> Chip8Conf {
        Chip8Conf {
            rng_seed: self.rng_seed,
        }
    }

    /// Key events scheduled for the given frame, in file order.
    pub fn keys_at(&self, frame: usize) -> impl Iterator<Item = &KeyEvent> {
        self.keys.iter().filter(move |event| event.frame == frame)
    }
}

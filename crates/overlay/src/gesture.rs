//! Double-press recognition for the trigger key.
//!
//! Two non-repeat presses of the trigger within the gesture window fire
//! [`KeyDown::DoublePress`]. Releasing any other key in between, or letting
//! the window lapse, starts the count over.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::timers::{TimerId, Timers};

/// Keyboard key as reported by the host (`KeyboardEvent.key` naming).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Key {
    Control,
    Shift,
    Alt,
    Meta,
    Escape,
    Enter,
    Other(String),
}

impl Key {
    pub fn from_name(name: &str) -> Self {
        match name {
            "Control" => Key::Control,
            "Shift" => Key::Shift,
            "Alt" => Key::Alt,
            "Meta" => Key::Meta,
            "Escape" => Key::Escape,
            "Enter" => Key::Enter,
            other => Key::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Key::Control => "Control",
            Key::Shift => "Shift",
            Key::Alt => "Alt",
            Key::Meta => "Meta",
            Key::Escape => "Escape",
            Key::Enter => "Enter",
            Key::Other(name) => name.as_str(),
        }
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::from_name(&name)
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.name().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub trigger: Key,
    pub window_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            trigger: Key::Control,
            window_ms: 800,
        }
    }
}

impl GestureConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// What a key-down did to the gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDown {
    /// Not the trigger, or an auto-repeat.
    Ignored,
    /// First press of a possible double-press.
    Counted,
    /// Second press inside the window. The host should suppress the key's
    /// default action.
    DoublePress,
}

#[derive(Debug)]
pub struct GestureDetector {
    config: GestureConfig,
    press_count: u32,
    last_press: Option<Instant>,
    pending_reset: Option<TimerId>,
    timers: Timers<()>,
}

impl GestureDetector {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            press_count: 0,
            last_press: None,
            pending_reset: None,
            timers: Timers::new(),
        }
    }

    pub fn press_count(&self) -> u32 {
        self.press_count
    }

    pub fn on_key_down(&mut self, key: &Key, is_repeat: bool, now: Instant) -> KeyDown {
        if *key != self.config.trigger || is_repeat {
            return KeyDown::Ignored;
        }

        if let Some(last) = self.last_press {
            if now.saturating_duration_since(last) > self.config.window() {
                self.press_count = 0;
            }
        }
        self.press_count += 1;
        self.last_press = Some(now);
        self.cancel_reset();

        if self.press_count == 2 {
            self.press_count = 0;
            info!(trigger = key.name(), "double press recognized");
            return KeyDown::DoublePress;
        }

        self.pending_reset = Some(self.timers.schedule(now + self.config.window(), ()));
        KeyDown::Counted
    }

    pub fn on_key_up(&mut self, key: &Key) {
        if *key == self.config.trigger {
            return;
        }
        if self.press_count > 0 {
            debug!(key = key.name(), "gesture interrupted");
        }
        self.press_count = 0;
        self.cancel_reset();
    }

    /// Fire the reset timer once `now` is past its deadline. At exactly the
    /// deadline the count survives, matching the inclusive window in
    /// [`GestureDetector::on_key_down`].
    pub fn advance(&mut self, now: Instant) {
        while let Some((id, ())) = self.timers.pop_expired(now) {
            if self.pending_reset == Some(id) {
                self.pending_reset = None;
                self.press_count = 0;
            }
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    fn cancel_reset(&mut self) {
        if let Some(id) = self.pending_reset.take() {
            self.timers.cancel(id);
        }
    }
}

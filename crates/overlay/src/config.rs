//! Tunables for the overlay. Defaults match the shipped extension.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::geometry::Size;
use crate::gesture::GestureConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub gesture: GestureConfig,
    /// Trimmed selections shorter than this never open a popup.
    pub min_selection_chars: usize,
    pub popup: PopupConfig,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            gesture: GestureConfig::default(),
            min_selection_chars: 2,
            popup: PopupConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupConfig {
    /// Gap between the selection's bottom edge and the popup.
    pub anchor_margin: f64,
    /// Minimum distance kept from every viewport edge.
    pub viewport_inset: f64,
    /// Used for clamping until the host reports a measured size.
    pub fallback_size: Size,
    pub entrance_delay_ms: u64,
    pub fade_ms: u64,
    pub close_ms: u64,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            anchor_margin: 10.0,
            viewport_inset: 10.0,
            fallback_size: Size::new(360.0, 240.0),
            entrance_delay_ms: 10,
            fade_ms: 200,
            close_ms: 300,
        }
    }
}

impl PopupConfig {
    pub fn entrance_delay(&self) -> Duration {
        Duration::from_millis(self.entrance_delay_ms)
    }

    pub fn fade(&self) -> Duration {
        Duration::from_millis(self.fade_ms)
    }

    pub fn close_animation(&self) -> Duration {
        Duration::from_millis(self.close_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: OverlayConfig =
            serde_json::from_str(r#"{"min_selection_chars": 3, "popup": {"fade_ms": 100}}"#)
                .unwrap();
        assert_eq!(config.min_selection_chars, 3);
        assert_eq!(config.popup.fade(), Duration::from_millis(100));
        assert_eq!(config.popup.close_animation(), Duration::from_millis(300));
        assert_eq!(config.gesture.window_ms, 800);
    }
}

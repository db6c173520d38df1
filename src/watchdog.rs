use crate::config_loader::Settings;
use std::time::Duration;

/// How long to wait for the engine before treating an utterance as stalled.
/// Some engines silently stop delivering completion events after the audio
/// device was paused and resumed externally; this estimate is the fallback
/// that keeps playback moving. Heuristic, not a guarantee.
pub fn stall_timeout(text: &str, effective_rate: f32, settings: &Settings) -> Duration {
    let rate = if effective_rate > 0.0 {
        effective_rate
    } else {
        1.0
    };
    let speech_ms = (text.chars().count() as f32 * settings.per_char_millis as f32) / rate;
    Duration::from_millis(speech_ms as u64 + settings.stall_slack_millis)
}

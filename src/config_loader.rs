use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Target language tag for voice selection and synthesis.
    pub language: String,
    /// Whitespace-tokenized name hints, tried in order when picking a voice.
    pub voice_hint_primary: String,
    pub voice_hint_secondary: String,
    /// Stall watchdog heuristics: estimated speech time is per_char_millis
    /// per character scaled by the effective rate, plus the fixed slack.
    pub per_char_millis: u64,
    pub stall_slack_millis: u64,
    pub playback_volume: f32, // audible lines (0.0 - 1.0)
    pub enable_audio: bool,
    pub espeak_binary: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: "ko-KR".to_string(),
            voice_hint_primary: "Google".to_string(),
            voice_hint_secondary: "Microsoft Online".to_string(),
            per_char_millis: 200,
            stall_slack_millis: 1500,
            playback_volume: 1.0,
            enable_audio: true,
            espeak_binary: "espeak-ng".to_string(),
        }
    }
}

impl Settings {
    /// Loads settings from defaults, an optional `Cueline` config file
    /// (working directory, then the user config dir), and `CUELINE_*`
    /// environment variables.
    pub fn new() -> Result<Self, config::ConfigError> {
        let mut builder =
            Self::builder_with_defaults()?.add_source(File::with_name("Cueline").required(false));

        if let Some(dir) = dirs::config_dir() {
            builder = builder.add_source(File::from(dir.join("cueline/Cueline")).required(false));
        }

        builder = builder.add_source(Environment::with_prefix("CUELINE"));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from a specific file over the defaults. No environment
    /// merge, so results are reproducible.
    pub fn from_file(path: &Path) -> Result<Self, config::ConfigError> {
        let builder = Self::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true));
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn builder_with_defaults(
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        Config::builder()
            .set_default("language", "ko-KR")?
            .set_default("voice_hint_primary", "Google")?
            .set_default("voice_hint_secondary", "Microsoft Online")?
            .set_default("per_char_millis", 200)?
            .set_default("stall_slack_millis", 1500)?
            .set_default("playback_volume", 1.0)?
            .set_default("enable_audio", true)?
            .set_default("espeak_binary", "espeak-ng")
    }

    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.playback_volume < 0.0 || self.playback_volume > 1.0 {
            return Err(config::ConfigError::Message(format!(
                "Invalid playback_volume: {}. Must be between 0.0 and 1.0",
                self.playback_volume
            )));
        }
        if self.per_char_millis == 0 {
            return Err(config::ConfigError::Message(
                "per_char_millis must be greater than 0".to_string(),
            ));
        }
        if self.language.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "language must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.per_char_millis, 200);
        assert_eq!(settings.stall_slack_millis, 1500);
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Cueline.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "language = \"en-US\"\nper_char_millis = 120\nvoice_hint_primary = \"Samantha\""
        )
        .unwrap();

        let settings = Settings::from_file(&path).expect("file settings should load");
        assert_eq!(settings.language, "en-US");
        assert_eq!(settings.per_char_millis, 120);
        assert_eq!(settings.voice_hint_primary, "Samantha");
        // untouched fields keep their defaults
        assert_eq!(settings.stall_slack_millis, 1500);
    }

    #[test]
    fn out_of_range_volume_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Cueline.toml");
        std::fs::write(&path, "playback_volume = 2.5\n").unwrap();
        assert!(Settings::from_file(&path).is_err());
    }
}

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What a script line is: a spoken line, a stage direction, or a chapter
/// header. Headers demarcate chapter boundaries; directions are read aloud
/// but never belong to a rehearsable role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Dialogue,
    Action,
    Header,
}

/// One line of the script, identified by its position in the overall order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptLine {
    pub character: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: LineKind,
}

/// Per-character delivery tuning. Characters without an entry speak at the
/// neutral 1.0/1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceProfile {
    #[serde(default = "neutral")]
    pub pitch: f32,
    #[serde(default = "neutral")]
    pub rate: f32,
}

fn neutral() -> f32 {
    1.0
}

impl Default for VoiceProfile {
    fn default() -> Self {
        Self {
            pitch: 1.0,
            rate: 1.0,
        }
    }
}

/// The read-only script store: the ordered line sequence plus the
/// character-to-profile map, both supplied as a static asset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Script {
    #[serde(default)]
    lines: Vec<ScriptLine>,
    #[serde(default, rename = "voices")]
    profiles: HashMap<String, VoiceProfile>,
}

impl Script {
    pub fn new(lines: Vec<ScriptLine>, profiles: HashMap<String, VoiceProfile>) -> Self {
        Self { lines, profiles }
    }

    /// Loads the externally supplied asset:
    /// `{"lines": [{"character": ..., "text": ..., "type": ...}, ...],
    ///   "voices": {"<character>": {"pitch": ..., "rate": ...}, ...}}`
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[ScriptLine] {
        &self.lines
    }

    pub fn get(&self, index: usize) -> Option<&ScriptLine> {
        self.lines.get(index)
    }

    pub fn profile(&self, character: &str) -> VoiceProfile {
        self.profiles.get(character).copied().unwrap_or_default()
    }

    /// Distinct dialogue speakers in order of first appearance. This is the
    /// set a role selector offers; directions and headers are not roles.
    pub fn characters(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for line in &self.lines {
            if line.kind == LineKind::Dialogue && !seen.iter().any(|c| c == &line.character) {
                seen.push(line.character.clone());
            }
        }
        seen
    }
}

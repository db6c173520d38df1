use serde::{Deserialize, Serialize};

/// Represents a text-to-speech voice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub id: String,
    pub name: String,
    pub language: String,
}

/// First subtag of a BCP-47-ish language tag: "ko-KR" -> "ko".
pub fn primary_subtag(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or(tag)
}

fn matches_language(voice: &Voice, subtags: &[String]) -> bool {
    let lang = voice.language.to_lowercase();
    subtags.iter().any(|t| lang.contains(t.as_str()))
}

fn matches_hint(voice: &Voice, hint: &str) -> bool {
    let mut tokens = hint.split_whitespace().peekable();
    tokens.peek().is_some() && tokens.all(|t| voice.name.contains(t))
}

/// Picks the voice to speak with: filter to the target language (any subtag
/// of the tag counts as a match), then prefer a name matching every token of
/// `primary_hint`, then of `secondary_hint`, then the first remaining match.
/// `None` means the engine's default voice carries the line instead.
pub fn select_voice<'a>(
    voices: &'a [Voice],
    language_tag: &str,
    primary_hint: &str,
    secondary_hint: &str,
) -> Option<&'a Voice> {
    let subtags: Vec<String> = language_tag
        .split(['-', '_'])
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect();
    if subtags.is_empty() {
        return None;
    }

    let candidates: Vec<&Voice> = voices
        .iter()
        .filter(|v| matches_language(v, &subtags))
        .collect();

    candidates
        .iter()
        .copied()
        .find(|v| matches_hint(v, primary_hint))
        .or_else(|| {
            candidates
                .iter()
                .copied()
                .find(|v| matches_hint(v, secondary_hint))
        })
        .or_else(|| candidates.first().copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(id: &str, name: &str, language: &str) -> Voice {
        Voice {
            id: id.to_string(),
            name: name.to_string(),
            language: language.to_string(),
        }
    }

    fn roster() -> Vec<Voice> {
        vec![
            voice("en-1", "Google US English", "en-US"),
            voice("ko-plain", "Yuna", "ko-KR"),
            voice("ko-ms", "Microsoft Heami Online (Natural)", "ko-KR"),
            voice("ko-google", "Google 한국의", "ko-KR"),
        ]
    }

    #[test]
    fn prefers_primary_hint_over_everything() {
        let voices = roster();
        let picked = select_voice(&voices, "ko-KR", "Google", "Microsoft Online").unwrap();
        assert_eq!(picked.id, "ko-google");
    }

    #[test]
    fn falls_back_to_secondary_hint_requiring_all_tokens() {
        let voices = vec![
            voice("ko-offline", "Microsoft Heami", "ko-KR"),
            voice("ko-online", "Microsoft Heami Online", "ko-KR"),
        ];
        let picked = select_voice(&voices, "ko-KR", "Google", "Microsoft Online").unwrap();
        assert_eq!(picked.id, "ko-online");
    }

    #[test]
    fn falls_back_to_first_language_match() {
        let voices = vec![
            voice("en-1", "Google US English", "en-US"),
            voice("ko-plain", "Yuna", "ko-KR"),
        ];
        let picked = select_voice(&voices, "ko-KR", "Google", "Microsoft Online").unwrap();
        assert_eq!(picked.id, "ko-plain");
    }

    #[test]
    fn region_subtag_alone_matches() {
        let voices = vec![voice("kr-only", "Heami", "KR")];
        let picked = select_voice(&voices, "ko-KR", "Google", "Microsoft Online").unwrap();
        assert_eq!(picked.id, "kr-only");
    }

    #[test]
    fn no_language_match_yields_none() {
        let voices = vec![voice("en-1", "Google US English", "en-US")];
        assert!(select_voice(&voices, "ko-KR", "Google", "Microsoft Online").is_none());
    }

    #[test]
    fn primary_subtag_splits_tags() {
        assert_eq!(primary_subtag("ko-KR"), "ko");
        assert_eq!(primary_subtag("en_US"), "en");
        assert_eq!(primary_subtag("ko"), "ko");
    }
}

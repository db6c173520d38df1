use crate::script::{LineKind, Script};

/// A chapter marker derived from a header line. Recomputed from the script,
/// never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterEntry {
    pub text: String,
    pub index: usize,
}

/// Every header line, in original order, paired with its line index.
pub fn chapters(script: &Script) -> Vec<ChapterEntry> {
    script
        .lines()
        .iter()
        .enumerate()
        .filter(|(_, line)| line.kind == LineKind::Header)
        .map(|(index, line)| ChapterEntry {
            text: line.text.clone(),
            index,
        })
        .collect()
}

/// Chapters that contain at least one line spoken by `role`, counting lines
/// strictly between the header and the next header (or the end of script).
/// The empty role keeps every chapter.
pub fn filtered_chapters(
    chapters: &[ChapterEntry],
    role: &str,
    script: &Script,
) -> Vec<ChapterEntry> {
    if role.is_empty() {
        return chapters.to_vec();
    }
    chapters
        .iter()
        .enumerate()
        .filter(|(pos, entry)| {
            let end = chapters
                .get(pos + 1)
                .map_or(script.len(), |next| next.index)
                .min(script.len());
            let start = (entry.index + 1).min(end);
            script.lines()[start..end]
                .iter()
                .any(|line| line.character == role)
        })
        .map(|(_, entry)| entry.clone())
        .collect()
}

/// Line index of the chapter the given position falls in: the greatest
/// chapter index at or before it. `None` when not started or when no chapter
/// precedes the position.
pub fn current_chapter_for(index: Option<usize>, chapters: &[ChapterEntry]) -> Option<usize> {
    let index = index?;
    // chapters are sorted by construction
    let pos = chapters.partition_point(|entry| entry.index <= index);
    pos.checked_sub(1).map(|p| chapters[p].index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::ScriptLine;

    fn line(character: &str, text: &str, kind: LineKind) -> ScriptLine {
        ScriptLine {
            character: character.to_string(),
            text: text.to_string(),
            kind,
        }
    }

    fn two_chapter_script() -> Script {
        Script::new(
            vec![
                line("시스템", "A", LineKind::Header),
                line("X", "hi", LineKind::Dialogue),
                line("시스템", "B", LineKind::Header),
                line("Y", "yo", LineKind::Dialogue),
            ],
            Default::default(),
        )
    }

    #[test]
    fn chapters_pair_header_text_with_index() {
        let script = two_chapter_script();
        let found = chapters(&script);
        assert_eq!(
            found,
            vec![
                ChapterEntry {
                    text: "A".to_string(),
                    index: 0
                },
                ChapterEntry {
                    text: "B".to_string(),
                    index: 2
                },
            ]
        );
    }

    #[test]
    fn role_filter_keeps_only_chapters_with_that_role() {
        let script = two_chapter_script();
        let all = chapters(&script);

        let mine = filtered_chapters(&all, "Y", &script);
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].text, "B");

        let everyone = filtered_chapters(&all, "", &script);
        assert_eq!(everyone.len(), 2);
    }

    #[test]
    fn trailing_header_never_matches_a_role() {
        let script = Script::new(
            vec![
                line("시스템", "A", LineKind::Header),
                line("X", "hi", LineKind::Dialogue),
                line("시스템", "B", LineKind::Header),
            ],
            Default::default(),
        );
        let all = chapters(&script);
        assert!(filtered_chapters(&all, "Y", &script).is_empty());
        assert_eq!(filtered_chapters(&all, "X", &script).len(), 1);
    }

    #[test]
    fn current_chapter_is_greatest_at_or_before_index() {
        let entries: Vec<ChapterEntry> = [0usize, 4, 8]
            .iter()
            .map(|&index| ChapterEntry {
                text: format!("ch{index}"),
                index,
            })
            .collect();

        assert_eq!(current_chapter_for(Some(5), &entries), Some(4));
        assert_eq!(current_chapter_for(Some(3), &entries), Some(0));
        assert_eq!(current_chapter_for(Some(8), &entries), Some(8));
        assert_eq!(current_chapter_for(None, &entries), None);
    }

    #[test]
    fn no_preceding_chapter_yields_none() {
        let entries = vec![ChapterEntry {
            text: "late".to_string(),
            index: 4,
        }];
        assert_eq!(current_chapter_for(Some(2), &entries), None);
    }
}

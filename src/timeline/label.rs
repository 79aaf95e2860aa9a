use lazy_static::lazy_static;
use regex::Regex;

use super::vocab::Vocabulary;

lazy_static! {
    static ref EMPTY_PARENS: Regex = Regex::new(r"\(\s*\)").expect("Failed to compile EMPTY_PARENS regex");
}

/// Separators left dangling once the schedule text is cut out of a segment.
const EDGE_PUNCTUATION: &[char] = &[':', '：', ',', '，', '-', '~', '/', '|', '·', '.'];

/// Recovers the human label from a segment by removing whatever the grammar consumed.
#[derive(Debug, Clone)]
pub struct LabelCleaner {
    event_prefix: Regex,
    day_noise: Regex,
}

impl LabelCleaner {
    pub fn new(vocab: &Vocabulary) -> Result<Self, regex::Error> {
        let day = vocab.day_pattern();
        let suffix = vocab.suffix_pattern();
        Ok(Self {
            event_prefix: Regex::new(&format!(r"^\W*{}\s*[:：]?", vocab.event_prefix_pattern()))?,
            day_noise: Regex::new(&format!(
                r"^{day}{suffix}(?:\s*[,，·]?\s*{day}{suffix})*\s*(?:\(\s*\d{{1,2}}:\d{{2}}\s*\))?$"
            ))?,
        })
    }

    /// Label left in `segment` after removing each of `matched` once.
    ///
    /// Leading event markers ("요새전:") are dropped, and a residue that is only weekday
    /// tokens counts as no label.
    pub fn reconstruct(&self, segment: &str, matched: &[&str]) -> Option<String> {
        let mut residual = segment.to_string();
        for text in matched.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            residual = residual.replacen(text, " ", 1);
        }
        let residual = EMPTY_PARENS.replace_all(&residual, " ");
        let residual = self.event_prefix.replace(&residual, "");
        let collapsed = residual.split_whitespace().collect::<Vec<_>>().join(" ");
        let label = collapsed.trim_matches(|c: char| c.is_whitespace() || EDGE_PUNCTUATION.contains(&c));

        if label.is_empty() || self.day_noise.is_match(label) {
            None
        } else {
            Some(label.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleaner() -> LabelCleaner {
        LabelCleaner::new(&Vocabulary::default()).unwrap()
    }

    #[test]
    fn keeps_text_around_the_schedule() {
        let cleaner = cleaner();
        assert_eq!(cleaner.reconstruct("요새1 토(22:00)", &["토(22:00)"]), Some("요새1".to_string()));
        assert_eq!(
            cleaner.reconstruct("2026.02.13 21:30 본선", &["2026.02.13 21:30"]),
            Some("본선".to_string())
        );
    }

    #[test]
    fn strips_event_prefix() {
        let cleaner = cleaner();
        assert_eq!(
            cleaner.reconstruct("요새전: 요새1 토(22:00)", &["토(22:00)"]),
            Some("요새1".to_string())
        );
        assert_eq!(
            cleaner.reconstruct("Citadel - Keep 3 sat 21:00", &["sat 21:00"]),
            Some("Keep 3".to_string())
        );
    }

    #[test]
    fn schedule_only_segments_have_no_label() {
        let cleaner = cleaner();
        assert_eq!(cleaner.reconstruct("월,화,수 22:00", &["월,화,수 22:00"]), None);
        assert_eq!(cleaner.reconstruct("화 22:00 / ", &["화 22:00"]), None);
        assert_eq!(cleaner.reconstruct("화요일 (22:00)", &["22:00"]), None);
    }

    #[test]
    fn removes_each_match_once() {
        let cleaner = cleaner();
        assert_eq!(
            cleaner.reconstruct("화 22:00 팀A 화 22:00", &["화 22:00", "화 22:00"]),
            Some("팀A".to_string())
        );
    }
}

use crate::model::ContentSection;
use crate::rich_text;

pub const WORDS_PER_MINUTE: usize = 200;

/// Whole minutes needed to read `content`, rounded up. Empty content reads in
/// zero minutes.
pub fn estimate(content: &[ContentSection]) -> u32 {
    let total = word_count(content);
    total.div_ceil(WORDS_PER_MINUTE) as u32
}

pub fn word_count(content: &[ContentSection]) -> usize {
    content
        .iter()
        .map(|section| {
            let heading = section.heading.split_whitespace().count();
            let body = rich_text::as_text(&section.body).split_whitespace().count();
            heading + body
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RichTextBlock;

    fn section(heading: &str, words: usize) -> ContentSection {
        let text = vec!["palavra"; words].join(" ");
        ContentSection {
            heading: heading.into(),
            body: vec![RichTextBlock::paragraph(text)],
        }
    }

    #[test]
    fn two_hundred_words_is_one_minute() {
        assert_eq!(estimate(&[section("Intro", 199)]), 1);
        assert_eq!(estimate(&[section("Intro", 200)]), 2);
    }

    #[test]
    fn empty_content_is_zero_minutes() {
        assert_eq!(estimate(&[]), 0);
        assert_eq!(estimate(&[section("", 0)]), 0);
    }

    #[test]
    fn stray_whitespace_adds_no_words() {
        let content = vec![ContentSection {
            heading: "  Two   words ".into(),
            body: vec![
                RichTextBlock::paragraph("\tthree\n four  five "),
                RichTextBlock::paragraph(""),
            ],
        }];
        assert_eq!(word_count(&content), 5);
    }

    #[test]
    fn appending_a_section_never_lowers_the_estimate() {
        let mut content = vec![section("A", 150)];
        let before = estimate(&content);
        content.push(section("B", 120));
        assert!(estimate(&content) >= before);
    }
}

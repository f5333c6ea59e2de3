//! Structured-text conversion: plain text for word counting, HTML for the
//! detail page.

use crate::model::{RichTextBlock, Span};

/// Block texts joined by a single space.
pub fn as_text(blocks: &[RichTextBlock]) -> String {
    blocks
        .iter()
        .map(|block| block.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn as_html(blocks: &[RichTextBlock]) -> String {
    let mut out = String::new();
    let mut open_list: Option<&'static str> = None;

    for block in blocks {
        let list = match block.kind.as_str() {
            "list-item" => Some("ul"),
            "o-list-item" => Some("ol"),
            _ => None,
        };
        if open_list != list {
            if let Some(tag) = open_list {
                out.push_str(&format!("</{tag}>"));
            }
            if let Some(tag) = list {
                out.push_str(&format!("<{tag}>"));
            }
            open_list = list;
        }

        match block.kind.as_str() {
            "heading1" | "heading2" | "heading3" | "heading4" | "heading5" | "heading6" => {
                let level = &block.kind["heading".len()..];
                out.push_str(&format!(
                    "<h{level}>{}</h{level}>",
                    render_spans(&block.text, &block.spans)
                ));
            }
            "preformatted" => {
                out.push_str(&format!("<pre>{}</pre>", escape(&block.text)));
            }
            "list-item" | "o-list-item" => {
                out.push_str(&format!(
                    "<li>{}</li>",
                    render_spans(&block.text, &block.spans)
                ));
            }
            "image" => {
                let url = block.url.as_deref().unwrap_or_default();
                let alt = block.alt.as_deref().unwrap_or_default();
                out.push_str(&format!(
                    "<p class=\"block-img\"><img src=\"{}\" alt=\"{}\"></p>",
                    escape(url),
                    escape(alt)
                ));
            }
            "embed" => {
                let url = block.url.as_deref().unwrap_or_default();
                out.push_str(&format!(
                    "<div class=\"embed\"><a href=\"{0}\">{0}</a></div>",
                    escape(url)
                ));
            }
            _ => {
                out.push_str(&format!(
                    "<p>{}</p>",
                    render_spans(&block.text, &block.spans)
                ));
            }
        }
    }

    if let Some(tag) = open_list {
        out.push_str(&format!("</{tag}>"));
    }
    out
}

/// Applies spans over `text`. Offsets count chars. Overlapping spans are
/// closed and reopened at every boundary so the output stays well nested.
fn render_spans(text: &str, spans: &[Span]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let valid: Vec<&Span> = spans
        .iter()
        .filter(|span| span.start < span.end && span.start < len)
        .collect();
    if valid.is_empty() {
        return escape(text);
    }

    let mut boundaries: Vec<usize> = valid
        .iter()
        .flat_map(|span| [span.start, span.end.min(len)])
        .chain([0, len])
        .collect();
    boundaries.sort_unstable();
    boundaries.dedup();

    let mut out = String::new();
    for window in boundaries.windows(2) {
        let (from, to) = (window[0], window[1]);
        let segment: String = chars[from..to].iter().collect();
        let active: Vec<&&Span> = valid
            .iter()
            .filter(|span| span.start <= from && span.end >= to)
            .collect();
        for span in &active {
            out.push_str(&open_tag(span));
        }
        out.push_str(&escape(&segment));
        for span in active.iter().rev() {
            out.push_str(close_tag(span));
        }
    }
    out
}

fn open_tag(span: &Span) -> String {
    match span.kind.as_str() {
        "strong" => "<strong>".to_string(),
        "em" => "<em>".to_string(),
        "hyperlink" => {
            let url = span
                .data
                .as_ref()
                .and_then(|data| data.url.as_deref())
                .unwrap_or("#");
            format!("<a href=\"{}\">", escape(url))
        }
        _ => {
            let label = span
                .data
                .as_ref()
                .and_then(|data| data.label.as_deref())
                .unwrap_or_default();
            format!("<span class=\"{}\">", escape(label))
        }
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind.as_str() {
        "strong" => "</strong>",
        "em" => "</em>",
        "hyperlink" => "</a>",
        _ => "</span>",
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SpanData;

    fn block(kind: &str, text: &str) -> RichTextBlock {
        RichTextBlock {
            kind: kind.into(),
            ..RichTextBlock::paragraph(text)
        }
    }

    #[test]
    fn text_joins_blocks_with_spaces() {
        let blocks = vec![block("paragraph", "one two"), block("heading2", "three")];
        assert_eq!(as_text(&blocks), "one two three");
        assert_eq!(as_text(&[]), "");
    }

    #[test]
    fn html_escapes_and_groups_lists() {
        let blocks = vec![
            block("paragraph", "a < b"),
            block("list-item", "x"),
            block("list-item", "y"),
            block("o-list-item", "z"),
        ];
        assert_eq!(
            as_html(&blocks),
            "<p>a &lt; b</p><ul><li>x</li><li>y</li></ul><ol><li>z</li></ol>"
        );
    }

    #[test]
    fn overlapping_spans_stay_nested() {
        let mut b = block("paragraph", "bold link");
        b.spans = vec![
            Span { start: 0, end: 9, kind: "strong".into(), data: None },
            Span {
                start: 5,
                end: 9,
                kind: "hyperlink".into(),
                data: Some(SpanData { url: Some("https://x.dev".into()), label: None }),
            },
        ];
        assert_eq!(
            as_html(&[b]),
            "<p><strong>bold </strong><strong><a href=\"https://x.dev\">link</a></strong></p>"
        );
    }

    #[test]
    fn heading_levels_map_to_tags() {
        assert_eq!(as_html(&[block("heading3", "T")]), "<h3>T</h3>");
    }
}

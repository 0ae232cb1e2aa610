//! Line-oriented formatter for streamed agent output.
//!
//! Not a markdown implementation: a fixed list of line detectors checked
//! top to bottom (first match wins), plus a flat inline pass for
//! `**bold**`, `*italic*` and `` `code` ``. Malformed input never errors;
//! at worst it renders as literal punctuation.

use std::sync::LazyLock;
use regex::Regex;

static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.*)$").unwrap());
static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\s*)([*+-])\s+(.*)$").unwrap());
static NUMBERED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\s*)(\d+)\.\s+(.*)$").unwrap());
static RESULT_VERB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(Found|Read|Updated|Created|Searched|Listed|Edited|Wrote)\b").unwrap()
});

static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
// Emphasis content may not start with '*' or whitespace, which keeps the
// scan from pairing bold delimiters across plain text.
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*\s][^*]*)\*").unwrap());
static CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());

/// Glyphs the backend prefixes to in-progress tool lines.
const PROGRESS_GLYPHS: [&str; 5] = ["⏺", "✻", "✽", "⚙", "↻"];
const CHECKMARKS: [&str; 2] = ["✓", "✔"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Bold(String),
    Italic(String),
    Code(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Heading { level: u8, spans: Vec<Inline> },
    CodeBlock { lang: String, body: String },
    Progress { spans: Vec<Inline> },
    ToolResult { spans: Vec<Inline> },
    Bullet { indent: usize, spans: Vec<Inline> },
    Numbered { indent: usize, number: String, spans: Vec<Inline> },
    Quote { spans: Vec<Inline> },
    Blank,
    Paragraph { spans: Vec<Inline> },
}

/// Re-derive the full render tree for one message. Pure and not
/// incremental: callers re-run it on every content change.
pub fn format(content: &str) -> Vec<Element> {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut elements = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if let Some(rest) = line.strip_prefix("```") {
            let lang = rest.trim().to_string();
            let mut body = Vec::new();
            i += 1;
            while i < lines.len() && !lines[i].starts_with("```") {
                body.push(lines[i]);
                i += 1;
            }
            if i < lines.len() {
                i += 1; // closing fence
            }
            // An unterminated fence consumes to end of text.
            elements.push(Element::CodeBlock {
                lang,
                body: body.join("\n"),
            });
            continue;
        }

        elements.push(classify(line));
        i += 1;
    }

    elements
}

// Single-line detectors, in priority order. A line starting with '#'
// is always a heading (when well-formed), never a paragraph.
fn classify(line: &str) -> Element {
    if let Some(caps) = HEADING.captures(line) {
        return Element::Heading {
            level: caps[1].len() as u8,
            spans: parse_inline(&caps[2]),
        };
    }

    if is_progress(line) {
        return Element::Progress {
            spans: parse_inline(line),
        };
    }

    if is_result(line) {
        return Element::ToolResult {
            spans: parse_inline(line),
        };
    }

    if let Some(caps) = BULLET.captures(line) {
        return Element::Bullet {
            indent: caps[1].len() / 2,
            spans: parse_inline(&caps[3]),
        };
    }

    if let Some(caps) = NUMBERED.captures(line) {
        return Element::Numbered {
            indent: caps[1].len() / 2,
            number: caps[2].to_string(),
            spans: parse_inline(&caps[3]),
        };
    }

    if let Some(rest) = line.strip_prefix("> ") {
        return Element::Quote {
            spans: parse_inline(rest),
        };
    }

    if line.trim().is_empty() {
        return Element::Blank;
    }

    Element::Paragraph {
        spans: parse_inline(line),
    }
}

fn is_progress(line: &str) -> bool {
    PROGRESS_GLYPHS.iter().any(|glyph| {
        line.strip_prefix(glyph)
            .is_some_and(|rest| rest.starts_with(char::is_whitespace))
    })
}

fn is_result(line: &str) -> bool {
    RESULT_VERB.is_match(line)
        || CHECKMARKS.iter().any(|glyph| line.starts_with(glyph))
        || line.contains(" matches for ")
        || line.contains(" lines from ")
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    Bold,
    Italic,
    Code,
}

/// Flat inline pass: collect non-overlapping matches of each pattern,
/// merge by start offset, and drop any later match that overlaps an
/// earlier-starting one (leftmost wins, not longest). Ties at the same
/// offset keep the bold reading because of the merge order below.
pub fn parse_inline(text: &str) -> Vec<Inline> {
    let mut matches: Vec<(usize, usize, Kind, &str)> = Vec::new();
    for (re, kind) in [(&*BOLD, Kind::Bold), (&*ITALIC, Kind::Italic), (&*CODE, Kind::Code)] {
        for caps in re.captures_iter(text) {
            if let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) {
                matches.push((whole.start(), whole.end(), kind, inner.as_str()));
            }
        }
    }
    matches.sort_by_key(|&(start, ..)| start);

    let mut spans = Vec::new();
    let mut pos = 0;
    for (start, end, kind, inner) in matches {
        if start < pos {
            continue;
        }
        if start > pos {
            spans.push(Inline::Text(text[pos..start].to_string()));
        }
        spans.push(match kind {
            Kind::Bold => Inline::Bold(inner.to_string()),
            Kind::Italic => Inline::Italic(inner.to_string()),
            Kind::Code => Inline::Code(inner.to_string()),
        });
        pos = end;
    }
    if pos < text.len() {
        spans.push(Inline::Text(text[pos..].to_string()));
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    #[test]
    fn inline_round_trip() {
        let spans = parse_inline("a **b** c *d* e `f` g");
        assert_eq!(
            spans,
            vec![
                text("a "),
                Inline::Bold("b".to_string()),
                text(" c "),
                Inline::Italic("d".to_string()),
                text(" e "),
                Inline::Code("f".to_string()),
                text(" g"),
            ]
        );
    }

    #[test]
    fn overlapping_matches_resolve_leftmost() {
        // No bold reading exists here (only one closing '*' after the
        // doubled pair), so both emphasis runs survive.
        let spans = parse_inline("*a**b*");
        assert_eq!(
            spans,
            vec![
                Inline::Italic("a".to_string()),
                Inline::Italic("b".to_string()),
            ]
        );
    }

    #[test]
    fn bold_beats_the_inner_italic_reading() {
        assert_eq!(parse_inline("**b**"), vec![Inline::Bold("b".to_string())]);
    }

    #[test]
    fn unmatched_punctuation_stays_literal() {
        assert_eq!(parse_inline("2 * 3 = 6"), vec![text("2 * 3 = 6")]);
        assert_eq!(parse_inline("a ** b"), vec![text("a ** b")]);
    }

    #[test]
    fn fenced_block_with_language_tag() {
        let elements = format("```js\ncode line\n```");
        assert_eq!(
            elements,
            vec![Element::CodeBlock {
                lang: "js".to_string(),
                body: "code line".to_string(),
            }]
        );
    }

    #[test]
    fn unterminated_fence_consumes_to_end() {
        let elements = format("```py\nx");
        assert_eq!(
            elements,
            vec![Element::CodeBlock {
                lang: "py".to_string(),
                body: "x".to_string(),
            }]
        );
    }

    #[test]
    fn inline_markup_inside_a_fence_stays_verbatim() {
        let elements = format("```\nkeep **this** raw\n```");
        assert_eq!(
            elements,
            vec![Element::CodeBlock {
                lang: String::new(),
                body: "keep **this** raw".to_string(),
            }]
        );
    }

    #[test]
    fn heading_levels() {
        let elements = format("### Title");
        assert_eq!(
            elements,
            vec![Element::Heading {
                level: 3,
                spans: vec![text("Title")],
            }]
        );
    }

    #[test]
    fn hash_without_space_is_a_paragraph() {
        let elements = format("#Title");
        assert_eq!(
            elements,
            vec![Element::Paragraph {
                spans: vec![text("#Title")],
            }]
        );
    }

    #[test]
    fn list_indent_levels() {
        assert_eq!(
            format("- item"),
            vec![Element::Bullet {
                indent: 0,
                spans: vec![text("item")],
            }]
        );
        assert_eq!(
            format("  - item"),
            vec![Element::Bullet {
                indent: 1,
                spans: vec![text("item")],
            }]
        );
    }

    #[test]
    fn numbered_item_keeps_the_literal_digits() {
        assert_eq!(
            format("12. step"),
            vec![Element::Numbered {
                indent: 0,
                number: "12".to_string(),
                spans: vec![text("step")],
            }]
        );
    }

    #[test]
    fn blockquote_strips_the_marker() {
        assert_eq!(
            format("> quoted **words**"),
            vec![Element::Quote {
                spans: vec![text("quoted "), Inline::Bold("words".to_string())],
            }]
        );
    }

    #[test]
    fn progress_and_result_lines() {
        assert!(matches!(
            format("⏺ Running the build")[0],
            Element::Progress { .. }
        ));
        assert!(matches!(
            format("Found 3 files")[0],
            Element::ToolResult { .. }
        ));
        assert!(matches!(
            format("✓ Tests passed")[0],
            Element::ToolResult { .. }
        ));
        assert!(matches!(
            format("12 matches for `foo`")[0],
            Element::ToolResult { .. }
        ));
        assert!(matches!(
            format("showing 40 lines from main.rs")[0],
            Element::ToolResult { .. }
        ));
        // Glyph without trailing whitespace is just a paragraph.
        assert!(matches!(format("⏺done")[0], Element::Paragraph { .. }));
    }

    #[test]
    fn blank_and_paragraph_fallthrough() {
        let elements = format("hello\n   \nworld");
        assert_eq!(elements.len(), 3);
        assert!(matches!(elements[0], Element::Paragraph { .. }));
        assert_eq!(elements[1], Element::Blank);
        assert!(matches!(elements[2], Element::Paragraph { .. }));
    }

    #[test]
    fn mixed_document() {
        let doc = "# Plan\n\n⏺ Searching the tree\nFound 2 matches for pattern\n\n1. first\n  - nested\n> note\n```sh\nls\n```";
        let elements = format(doc);
        assert_eq!(
            elements[0],
            Element::Heading {
                level: 1,
                spans: vec![text("Plan")],
            }
        );
        assert_eq!(elements[1], Element::Blank);
        assert!(matches!(elements[2], Element::Progress { .. }));
        assert!(matches!(elements[3], Element::ToolResult { .. }));
        assert_eq!(elements[4], Element::Blank);
        assert!(matches!(elements[5], Element::Numbered { .. }));
        assert_eq!(
            elements[6],
            Element::Bullet {
                indent: 1,
                spans: vec![text("nested")],
            }
        );
        assert!(matches!(elements[7], Element::Quote { .. }));
        assert_eq!(
            elements[8],
            Element::CodeBlock {
                lang: "sh".to_string(),
                body: "ls".to_string(),
            }
        );
    }
}

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::app::{App, InputMode, Role};
use crate::markdown::{self, Element, Inline};

const DIM: Color = Color::DarkGray;
const CODE_FG: Color = Color::Rgb(180, 180, 180);
const CODE_BG: Color = Color::Rgb(45, 45, 45);

/// Exactly one entry per heading level, indexed level - 1.
const HEADING_STYLES: [(Color, Modifier); 6] = [
    (Color::Rgb(255, 215, 100), Modifier::BOLD),
    (Color::Rgb(240, 190, 90), Modifier::BOLD),
    (Color::Rgb(220, 170, 80), Modifier::BOLD),
    (Color::Rgb(200, 155, 75), Modifier::BOLD),
    (Color::Rgb(185, 145, 70), Modifier::empty()),
    (Color::Rgb(170, 135, 65), Modifier::empty()),
];

/// Columns of horizontal offset per list indent unit.
const INDENT_COLS: usize = 2;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let label = if app.label.is_empty() {
        String::new()
    } else {
        format!(" {} ", app.label)
    };

    let title = Line::from(vec![
        Span::styled(" agentpane ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(label, Style::default().fg(Color::White)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(DIM),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let border_color = if app.input_mode == InputMode::Normal {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Conversation ");

    if app.messages.is_empty() && !app.loading {
        let placeholder = Paragraph::new("Ask the agent anything...")
            .style(Style::default().fg(DIM))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let mut lines: Vec<Line<'static>> = Vec::new();
    for msg in &app.messages {
        match msg.role {
            Role::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                for line in msg.content.lines() {
                    lines.push(Line::from(line.to_string()));
                }
                lines.push(Line::default());
            }
            Role::Assistant => {
                lines.push(Line::from(Span::styled(
                    "Agent:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                for element in markdown::format(&msg.content) {
                    lines.extend(element_lines(&element));
                }
                lines.push(Line::default());
            }
        }
    }

    if app.loading {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(DIM).add_modifier(Modifier::ITALIC),
        )));
    }

    let total_lines = estimated_rows(&lines, app.chat_width);
    app.resolve_scroll(total_lines);

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

/// Map one formatter element to styled terminal lines.
fn element_lines(element: &Element) -> Vec<Line<'static>> {
    match element {
        Element::Heading { level, spans } => {
            let (color, modifier) = HEADING_STYLES[usize::from((*level).clamp(1, 6)) - 1];
            let base = Style::default().fg(color).add_modifier(modifier);
            vec![Line::from(styled_spans(spans, base))]
        }
        Element::CodeBlock { lang, body } => {
            let mut lines = vec![Line::from(Span::styled(
                format!("┌─ {} ", lang),
                Style::default().fg(DIM),
            ))];
            for body_line in body.lines() {
                lines.push(Line::from(vec![
                    Span::styled("│ ", Style::default().fg(DIM)),
                    Span::styled(
                        body_line.to_string(),
                        Style::default().fg(CODE_FG).bg(CODE_BG),
                    ),
                ]));
            }
            lines.push(Line::from(Span::styled("└─", Style::default().fg(DIM))));
            lines
        }
        Element::Progress { spans } => {
            let base = Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC);
            vec![Line::from(styled_spans(spans, base))]
        }
        Element::ToolResult { spans } => {
            let base = Style::default().fg(Color::Green);
            vec![Line::from(styled_spans(spans, base))]
        }
        Element::Bullet { indent, spans } => {
            let mut out = vec![
                Span::raw(" ".repeat(indent * INDENT_COLS)),
                Span::styled("• ", Style::default().fg(DIM)),
            ];
            out.extend(inline_spans(spans));
            vec![Line::from(out)]
        }
        Element::Numbered { indent, number, spans } => {
            let mut out = vec![
                Span::raw(" ".repeat(indent * INDENT_COLS)),
                Span::styled(format!("{}. ", number), Style::default().fg(DIM)),
            ];
            out.extend(inline_spans(spans));
            vec![Line::from(out)]
        }
        Element::Quote { spans } => {
            let mut out = vec![Span::styled("▌ ", Style::default().fg(DIM))];
            out.extend(styled_spans(spans, Style::default().fg(Color::Gray)));
            vec![Line::from(out)]
        }
        Element::Blank => vec![Line::default()],
        Element::Paragraph { spans } => vec![Line::from(inline_spans(spans))],
    }
}

fn inline_spans(spans: &[Inline]) -> Vec<Span<'static>> {
    spans
        .iter()
        .map(|span| match span {
            Inline::Text(t) => Span::raw(t.clone()),
            Inline::Bold(t) => {
                Span::styled(t.clone(), Style::default().add_modifier(Modifier::BOLD))
            }
            Inline::Italic(t) => {
                Span::styled(t.clone(), Style::default().add_modifier(Modifier::ITALIC))
            }
            Inline::Code(t) => {
                Span::styled(t.clone(), Style::default().fg(CODE_FG).bg(CODE_BG))
            }
        })
        .collect()
}

fn styled_spans(spans: &[Inline], base: Style) -> Vec<Span<'static>> {
    inline_spans(spans)
        .into_iter()
        .map(|span| {
            let style = base.patch(span.style);
            Span::styled(span.content, style)
        })
        .collect()
}

/// Wrapped-row estimate for the scroll-to-bottom calculation. Uses
/// character counts, not byte lengths, for proper UTF-8 handling.
fn estimated_rows(lines: &[Line], width: u16) -> u16 {
    let wrap_width = if width > 0 { width as usize } else { 50 };

    let mut total: u16 = 0;
    for line in lines {
        let char_count: usize = line.spans.iter().map(|s| s.content.chars().count()).sum();
        // An exactly-full line occupies one row, and an empty line still
        // occupies one.
        total = total.saturating_add((char_count.saturating_sub(1) / wrap_width + 1) as u16);
    }
    total
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let border_color = if app.input_mode == InputMode::Editing {
        Color::Yellow
    } else {
        Color::DarkGray
    };

    let title = if app.loading {
        " Message (Esc to stop) "
    } else {
        " Message (i to edit) "
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    // Show cursor when editing
    if app.input_mode == InputMode::Editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " CHAT ",
        InputMode::Editing => " EDIT ",
    };

    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = match app.input_mode {
        InputMode::Normal => vec![
            Span::styled(" i ", key_style),
            Span::styled(" edit ", label_style),
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" G ", key_style),
            Span::styled(" bottom ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" done ", label_style),
        ],
    };
    if app.loading {
        hints.push(Span::styled(" Esc ", key_style));
        hints.push(Span::styled(" stop ", label_style));
    }

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    spans.extend(hints);

    let footer = Paragraph::new(Line::from(spans));
    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_to_string(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn code_block_is_framed() {
        let element = Element::CodeBlock {
            lang: "rs".to_string(),
            body: "fn main() {}".to_string(),
        };
        let lines = element_lines(&element);
        let rendered: Vec<String> = lines.iter().map(line_to_string).collect();
        assert_eq!(rendered.len(), 3);
        assert!(rendered[0].contains("rs"));
        assert!(rendered[1].contains("fn main() {}"));
    }

    #[test]
    fn bullet_indent_maps_to_columns() {
        let element = Element::Bullet {
            indent: 2,
            spans: vec![Inline::Text("item".to_string())],
        };
        let lines = element_lines(&element);
        assert_eq!(line_to_string(&lines[0]), "    • item");
    }

    #[test]
    fn heading_style_table_covers_all_levels() {
        for level in 1..=6u8 {
            let element = Element::Heading {
                level,
                spans: vec![Inline::Text("t".to_string())],
            };
            assert_eq!(element_lines(&element).len(), 1);
        }
    }

    #[test]
    fn estimated_rows_counts_wraps() {
        let lines = vec![Line::from("x".repeat(25)), Line::from("")];
        // 25 chars at width 10 -> 3 rows, plus 1 for the empty line.
        assert_eq!(estimated_rows(&lines, 10), 4);
    }

    #[test]
    fn exactly_full_line_is_one_row() {
        let lines = vec![Line::from("x".repeat(10))];
        assert_eq!(estimated_rows(&lines, 10), 1);

        let lines = vec![Line::from("x".repeat(20))];
        assert_eq!(estimated_rows(&lines, 10), 2);
    }
}

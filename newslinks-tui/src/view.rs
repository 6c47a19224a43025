use crate::state::TuiState;
use crate::styles;
use crate::transcript::TranscriptLine;
use anyhow::Result;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use std::io::Stdout;
use textwrap::wrap;

pub struct ViewSnap {
    pub input: String,
    pub input_cursor: usize,
    pub limit: u32,
    pub limit_range: (u32, u32),
    pub status: String,
    pub status_style: Style,
    pub spinner: &'static str,
    pub lines: Vec<TranscriptLine>,
    pub scroll: usize,
    /// `None` while the debug panel is collapsed.
    pub debug: Option<Vec<String>>,
}

impl ViewSnap {
    pub fn from_state(state: &TuiState) -> Self {
        Self {
            input: state.input().to_string(),
            input_cursor: state.input_cursor(),
            limit: state.limit(),
            limit_range: state.limit_range(),
            status: state.status().label(),
            status_style: state.status().style(),
            spinner: state.spinner(),
            lines: state.lines().to_vec(),
            scroll: state.scroll(),
            debug: state.show_debug().then(|| state.debug_lines().to_vec()),
        }
    }
}

pub fn draw(term: &mut Terminal<CrosstermBackend<Stdout>>, snap: &ViewSnap) -> Result<()> {
    term.draw(|frame| {
        let area = frame.area();

        let mut constraints = vec![
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
        ];
        if snap.debug.is_some() {
            constraints.push(Constraint::Percentage(35));
        }
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let header = Paragraph::new(Line::from(vec![
            Span::styled(" Google News Link Extractor ", styles::header()),
            Span::styled(
                " Enter: search • Ctrl+↑/↓: limit • Tab: debug • Ctrl+C: quit",
                styles::dim(),
            ),
        ]))
        .wrap(Wrap { trim: true });
        frame.render_widget(header, layout[0]);

        // Input box, limit shown in the title
        let title = format!(
            " Keyword • limit {} ({}-{}) ",
            snap.limit, snap.limit_range.0, snap.limit_range.1
        );
        let input_box = Paragraph::new(snap.input.clone())
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(Clear, layout[1]);
        frame.render_widget(input_box, layout[1]);

        let caret_x = layout[1].x + 1 + visual_caret_col(&snap.input, snap.input_cursor);
        frame.set_cursor_position(Position {
            x: caret_x,
            y: layout[1].y + 1,
        });

        let status_line = Line::from(vec![
            Span::raw(" "),
            Span::styled(snap.spinner, styles::running()),
            Span::raw(" "),
            Span::styled(snap.status.clone(), snap.status_style),
        ]);
        let status = Paragraph::new(status_line)
            .block(Block::default().borders(Borders::ALL).title(" Status "));
        frame.render_widget(status, layout[2]);

        render_lines(frame, layout[3], " Results ", &snap.lines, snap.scroll);

        if let Some(debug) = &snap.debug {
            let lines: Vec<TranscriptLine> = debug
                .iter()
                .map(|l| TranscriptLine::new(l.clone(), styles::dim()))
                .collect();
            render_lines(frame, layout[4], " Debug log ", &lines, 0);
        }
    })?;

    Ok(())
}

fn render_lines(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    title: &str,
    lines: &[TranscriptLine],
    scroll: usize,
) {
    let visible_h = area.height.saturating_sub(2) as usize;
    let content_width = area.width.saturating_sub(2) as usize;
    let wrapped = wrap_lines(lines, content_width);
    let total = wrapped.len();
    let scroll = scroll.min(total.saturating_sub(visible_h));
    let start = total.saturating_sub(visible_h + scroll);
    let end = total.saturating_sub(scroll);

    let items: Vec<ListItem> = wrapped[start..end]
        .iter()
        .map(|(text, style)| ListItem::new(Line::from(Span::styled(text.clone(), *style))))
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title.to_string()));
    frame.render_widget(list, area);
}

fn visual_caret_col(input: &str, cursor: usize) -> u16 {
    use unicode_width::UnicodeWidthStr;
    UnicodeWidthStr::width(&input[..cursor]) as u16
}

fn wrap_lines(lines: &[TranscriptLine], width: usize) -> Vec<(String, Style)> {
    let effective_width = width.max(1);
    let mut out = Vec::new();

    for entry in lines {
        let style = entry.style;
        for raw_line in entry.text.split('\n') {
            if raw_line.is_empty() {
                out.push((String::new(), style));
                continue;
            }
            // URLs have no spaces; textwrap breaks long words at the width.
            out.extend(
                wrap(raw_line, effective_width)
                    .into_iter()
                    .map(|seg| (seg.into_owned(), style)),
            );
        }
    }

    out
}

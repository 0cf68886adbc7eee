use super::{TuiState, View};
use crate::history::{HistoryEntry, EMPTY_HISTORY_MESSAGE};
use crate::language::Language;
use crate::session::Session;
use crate::shared::{format_local_millis, truncate_chars};
use crate::store::KeyValueStore;
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::{Frame, Terminal};

const INPUT_PLACEHOLDER: &str = "e.g., a logo for a coffee shop";
const OUTPUT_PLACEHOLDER: &str = "AI will generate the perfect prompt here...";

pub(super) fn draw<B: Backend, S: KeyValueStore>(
    terminal: &mut Terminal<B>,
    session: &Session<S>,
    state: &TuiState,
) -> Result<(), String> {
    terminal
        .draw(|frame| {
            draw_main(frame, session, state);
            if state.view == View::History {
                draw_history_panel(frame, session, state);
            }
        })
        .map_err(|e| format!("failed to render prompt UI: {e}"))?;
    Ok(())
}

fn draw_main<S: KeyValueStore>(frame: &mut Frame, session: &Session<S>, state: &TuiState) {
    let error_height = if session.error().is_some() { 3 } else { 0 };
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(error_height),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(vec![
        Line::styled(
            "AI Prompt Perfecter",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ),
        Line::raw("Transform your simple ideas into powerful, detailed prompts for any AI model."),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    frame.render_widget(header, sections[0]);

    frame.render_widget(language_selector(session.language()), sections[1]);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(sections[2]);

    let input = if session.input().is_empty() {
        Paragraph::new(vec![
            Line::styled(INPUT_PLACEHOLDER, Style::default().fg(Color::DarkGray)),
            Line::raw(state.cursor_suffix()),
        ])
    } else {
        Paragraph::new(format!("{}{}", session.input(), state.cursor_suffix()))
    };
    frame.render_widget(
        input
            .wrap(Wrap { trim: false })
            .block(Block::default().title("Your Prompt Idea").borders(Borders::ALL)),
        panes[0],
    );

    let output_title = if state.copy_feedback.is_active() {
        "Perfect Prompt (copied!)"
    } else {
        "Perfect Prompt"
    };
    state.output_scroll_max.set(0);
    let output = if session.is_loading() {
        Paragraph::new(Line::styled(
            format!("{} Generating perfect prompt...", state.spinner_frame()),
            Style::default().fg(Color::Magenta),
        ))
    } else if session.output().is_empty() {
        Paragraph::new(Line::styled(
            OUTPUT_PLACEHOLDER,
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let inner_width = panes[1].width.saturating_sub(2);
        let inner_height = panes[1].height.saturating_sub(2);
        let max_scroll =
            wrapped_line_count(session.output(), inner_width).saturating_sub(inner_height);
        state.output_scroll_max.set(max_scroll);
        Paragraph::new(session.output().to_string())
            .style(Style::default().fg(Color::Green))
            .scroll((state.output_scroll.min(max_scroll), 0))
    };
    frame.render_widget(
        output
            .wrap(Wrap { trim: false })
            .block(Block::default().title(output_title).borders(Borders::ALL)),
        panes[1],
    );

    if let Some(error) = session.error() {
        let banner = Paragraph::new(error.to_string())
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Red)),
            );
        frame.render_widget(banner, sections[3]);
    }

    let status = Paragraph::new(status_line(session, state)).block(
        Block::default()
            .title("Status")
            .borders(Borders::ALL)
            .border_style(if session.is_loading() {
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            }),
    );
    frame.render_widget(status, sections[4]);
}

/// Rows `text` takes once wrapped at `width` columns.
fn wrapped_line_count(text: &str, width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let rows: usize = text
        .lines()
        .map(|line| line.chars().count().div_ceil(width).max(1))
        .sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}

fn language_selector(selected: Language) -> Paragraph<'static> {
    let mut spans = vec![Span::raw("Language: ")];
    for language in Language::ALL {
        let style = if language == selected {
            Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {language} "), style));
        spans.push(Span::raw(" "));
    }
    Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL))
}

fn status_line<S: KeyValueStore>(session: &Session<S>, state: &TuiState) -> String {
    if let Some(notice) = &state.notice {
        return notice.clone();
    }
    if session.is_loading() {
        return format!("generating {}", state.spinner_frame());
    }
    format!(
        "Enter generate | Tab language | PgUp/PgDn scroll | Ctrl+Y copy | Ctrl+L clear | Ctrl+H history ({}) | Esc quit",
        session.history().len()
    )
}

fn draw_history_panel<S: KeyValueStore>(frame: &mut Frame, session: &Session<S>, state: &TuiState) {
    let area = centered_rect(80, 80, frame.area());
    frame.render_widget(Clear, area);
    let block = Block::default()
        .title("Prompt History (Enter use | Space expand | c copy | d delete | Esc close)")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let entries = session.history().entries();
    if entries.is_empty() {
        let empty = Paragraph::new(Line::styled(
            EMPTY_HISTORY_MESSAGE,
            Style::default().fg(Color::Gray),
        ))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let width = area.width.saturating_sub(4) as usize;
    let items = entries
        .iter()
        .map(|entry| {
            let expanded = state.expanded_id.as_deref() == Some(entry.id());
            ListItem::new(history_item_lines(entry, expanded, width))
        })
        .collect::<Vec<_>>();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");
    let mut list_state = ListState::default();
    list_state.select(Some(state.history_selected));
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn history_item_lines(entry: &HistoryEntry, expanded: bool, width: usize) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::styled(
            truncate_chars(entry.input_prompt(), width.max(8)),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Line::styled(
            format!(
                "{} · {}",
                format_local_millis(entry.timestamp()),
                entry.language()
            ),
            Style::default().fg(Color::Gray),
        ),
    ];
    if expanded {
        lines.push(Line::styled(
            "Your Idea:",
            Style::default().fg(Color::Cyan),
        ));
        lines.extend(
            entry
                .input_prompt()
                .lines()
                .map(|line| Line::raw(format!("  {line}"))),
        );
        lines.push(Line::styled(
            "Perfect Prompt:",
            Style::default().fg(Color::Cyan),
        ));
        lines.extend(
            entry
                .output_prompt()
                .lines()
                .map(|line| Line::raw(format!("  {line}"))),
        );
    }
    lines.push(Line::raw(""));
    lines
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

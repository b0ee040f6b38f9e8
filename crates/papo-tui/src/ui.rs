use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use papo_core::{Item, Role};
use crate::app::App;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let options_height = app
        .latest_options()
        .map(|set| (set.choices.len().min(9) + 2) as u16) // +2 for borders
        .unwrap_or(0);

    // Main layout: header, chat, options (if any), input, footer
    let [header_area, chat_area, options_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(options_height),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    if options_height > 0 {
        render_options(app, frame, options_area);
    }
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let waiting = app.client.transcript().pending_count();
    let waiting_indicator = if waiting > 0 {
        format!(" [{} aguardando]", waiting)
    } else {
        String::new()
    };

    let title = Line::from(vec![
        Span::styled(" papo ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.endpoint.clone(), Style::default().fg(Color::White)),
        Span::styled(waiting_indicator, Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);
    if app.follow_bottom {
        app.scroll_to_bottom();
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Conversa ");

    let chat = chat_paragraph(app)
        .block(block)
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

/// Transcript as a wrapped paragraph, without borders.
///
/// Rendering and scroll height both come from this, so they always agree
/// on how many rows the transcript takes.
pub fn chat_paragraph(app: &App) -> Paragraph<'_> {
    Paragraph::new(chat_text(app)).wrap(Wrap { trim: false })
}

fn chat_text(app: &App) -> Text<'_> {
    let transcript = app.client.transcript();
    if transcript.items().is_empty() {
        return Text::from(Span::styled(
            "Digite uma mensagem e pressione Enter...",
            Style::default().fg(Color::DarkGray),
        ));
    }

    let latest = transcript.latest_options().map(|set| set.id);
    let mut lines: Vec<Line> = Vec::new();

    for item in transcript.items() {
        match item {
            Item::Message(entry) => {
                let (label, color) = match entry.role {
                    Role::User => ("Você:", Color::Cyan),
                    Role::Assistant => ("Bot:", Color::Yellow),
                };
                lines.push(Line::from(Span::styled(
                    label,
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                )));

                if entry.pending {
                    // Animated ellipsis: cycles through ".", "..", "..."
                    let dots = ".".repeat((app.animation_frame as usize) + 1);
                    lines.push(Line::from(Span::styled(
                        dots,
                        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                    )));
                } else {
                    lines.extend(entry.text.lines().map(Line::from));
                }
                lines.push(Line::default());
            }
            Item::Options(set) => {
                // The newest set is interactive in its own pane
                let style = if Some(set.id) == latest {
                    Style::default().fg(Color::Magenta)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                for (i, choice) in set.choices.iter().enumerate() {
                    let label = format!("  [{}] {}", i + 1, choice);
                    lines.push(Line::from(Span::styled(label, style)));
                }
                lines.push(Line::default());
            }
        }
    }

    Text::from(lines)
}

fn render_options(app: &App, frame: &mut Frame, area: Rect) {
    let Some(set) = app.latest_options() else {
        return;
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" Opções (↑/↓, Tab para escolher) ");

    let items: Vec<ListItem> = set
        .choices
        .iter()
        .enumerate()
        .map(|(i, choice)| ListItem::new(format!(" {}. {} ", i + 1, choice)))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Magenta)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(app.option_highlight));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Mensagem ");

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app.input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);

    frame.render_widget(input, area);

    let cursor_x = (cursor_pos - scroll_offset) as u16;
    frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = vec![
        Span::styled(" Enter ", key_style),
        Span::styled(" enviar ", label_style),
    ];
    if app.latest_options().is_some() {
        hints.extend(vec![
            Span::styled(" ↑/↓ ", key_style),
            Span::styled(" opção ", label_style),
            Span::styled(" Tab ", key_style),
            Span::styled(" escolher ", label_style),
            Span::styled(" Alt+1-9 ", key_style),
            Span::styled(" direto ", label_style),
        ]);
    }
    hints.extend(vec![
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" rolar ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" sair ", label_style),
    ]);

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

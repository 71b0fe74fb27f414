use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn key_line(key: &str, pad: usize, what: &str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key.to_string(), Style::default().fg(Color::Magenta)),
        Span::raw(format!("{}{what}", " ".repeat(pad))),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        key_line("Ctrl-C", 6, "Quit"),
        key_line("q", 11, "Quit (outside the Simulate tab)"),
        key_line("tab", 9, "Switch tabs"),
        key_line("Ctrl-R", 6, "Refresh history"),
        key_line("?", 11, "Show this help"),
        Line::from(""),
        Line::from("Simulate tab:"),
        key_line("↑/↓", 9, "Select field"),
        key_line("Enter", 7, "Run simulation"),
        key_line("Esc", 9, "New simulation (reset progress)"),
        Line::from(""),
        Line::from("Results tab:"),
        key_line("e", 11, "Export result as JSON"),
        Line::from(""),
        Line::from("History tab:"),
        key_line("↑/↓", 9, "Scroll"),
        key_line("r", 11, "Refresh history"),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}

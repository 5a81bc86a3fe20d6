use fastmath::{
    presentation::DisplayContent,
    scoring::format_time,
    sequence::format_sequence,
    session::GameResult,
};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

const HORIZONTAL_MARGIN: u16 = 5;

const INPUT_HINT: &str = "0-9 type · Backspace clear · Enter submit · q quit";
const RESULT_HINT: &str = "(enter) play again / (esc) quit";

/// What the terminal currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Session(DisplayContent),
    Result(GameResult),
}

impl Default for View {
    fn default() -> Self {
        View::Session(DisplayContent::Blank)
    }
}

impl Widget for &View {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines = match self {
            View::Session(content) => session_lines(content),
            View::Result(result) => result_lines(result),
        };

        let height = lines.len() as u16;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints(
                [
                    Constraint::Length(area.height.saturating_sub(height) / 2),
                    Constraint::Length(height),
                    Constraint::Min(0),
                ]
                .as_ref(),
            )
            .split(area);

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[1], buf);
    }
}

fn session_lines(content: &DisplayContent) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);
    let italic = Style::default().add_modifier(Modifier::ITALIC);

    match content {
        DisplayContent::Message(message) => vec![Line::from(Span::styled(
            message.clone(),
            bold.fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        ))],
        DisplayContent::Term {
            value,
            position,
            total,
        } => vec![
            Line::from(Span::styled(value.to_string(), bold.fg(Color::Cyan))),
            Line::default(),
            Line::from(Span::styled(format!("{position}/{total}"), dim)),
        ],
        DisplayContent::HiddenTerm { position, total } => vec![
            Line::from(Span::styled("♪", bold.fg(Color::Magenta))),
            Line::default(),
            Line::from(Span::styled(format!("{position}/{total}"), dim)),
        ],
        DisplayContent::Blank => vec![Line::default()],
        DisplayContent::Answer { answer } => vec![
            Line::from(Span::styled("Enter the sum:", italic)),
            Line::default(),
            Line::from(vec![
                Span::styled(answer.clone(), bold),
                Span::styled("_", dim.add_modifier(Modifier::SLOW_BLINK)),
            ]),
            Line::default(),
            Line::from(Span::styled(INPUT_HINT, dim)),
        ],
        DisplayContent::Listening {
            attempt,
            max_attempts,
        } => vec![
            Line::from(Span::styled("Listening...", bold.fg(Color::Magenta))),
            Line::from(Span::styled(
                format!("attempt {attempt} of {max_attempts}, or type your answer"),
                dim,
            )),
        ],
        DisplayContent::Recognized(value) => vec![
            Line::from(Span::styled("Heard", italic)),
            Line::from(Span::styled(value.to_string(), bold.fg(Color::Cyan))),
        ],
    }
}

fn result_lines(result: &GameResult) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let headline = if result.is_correct {
        Span::styled("Correct!", bold.fg(Color::Green))
    } else {
        Span::styled("Not quite", bold.fg(Color::Red))
    };

    let mut lines = vec![
        Line::from(headline),
        Line::default(),
        Line::from(format_sequence(&result.sequence)),
    ];
    if !result.is_correct {
        lines.push(Line::from(format!("you answered {}", result.user_answer)));
    }
    lines.extend([
        Line::default(),
        Line::from(vec![
            Span::styled(format!("{} pts", result.score), bold.fg(Color::Yellow)),
            Span::raw(format!(
                "  accuracy {}%  speed +{}  {} x{}",
                result.accuracy_percentage,
                result.speed_bonus,
                result.difficulty,
                result.difficulty_multiplier
            )),
        ]),
        Line::from(format!("answered in {}", format_time(result.response_time))),
        Line::default(),
        Line::from(Span::styled(RESULT_HINT, dim.add_modifier(Modifier::ITALIC))),
    ]);
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use fastmath::scoring::DifficultyLevel;
    use ratatui::{backend::TestBackend, Terminal};

    fn rendered(view: &View) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|f| f.render_widget(view, f.area())).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    fn result(is_correct: bool, user_answer: i64) -> GameResult {
        GameResult {
            is_correct,
            user_answer,
            correct_answer: 60,
            response_time: 1234,
            score: if is_correct { 145 } else { 72 },
            sequence: vec![10, 20, 30],
            accuracy_percentage: if is_correct { 100 } else { 72 },
            difficulty_multiplier: 1.0,
            speed_bonus: if is_correct { 45 } else { 0 },
            difficulty: DifficultyLevel::Easy,
            completed_at: Local::now(),
        }
    }

    #[test]
    fn term_shows_value_and_position() {
        let content = rendered(&View::Session(DisplayContent::Term {
            value: 42,
            position: 2,
            total: 5,
        }));
        assert!(content.contains("42"));
        assert!(content.contains("2/5"));
    }

    #[test]
    fn hidden_term_does_not_leak_value() {
        let content = rendered(&View::Session(DisplayContent::HiddenTerm {
            position: 1,
            total: 3,
        }));
        assert!(content.contains("1/3"));
        assert!(content.contains('♪'));
    }

    #[test]
    fn answer_screen_shows_buffer_and_hint() {
        let content = rendered(&View::Session(DisplayContent::Answer {
            answer: "123".into(),
        }));
        assert!(content.contains("123"));
        assert!(content.contains("Enter the sum:"));
    }

    #[test]
    fn correct_result_summary() {
        let content = rendered(&View::Result(result(true, 60)));
        assert!(content.contains("Correct!"));
        assert!(content.contains("10 + 20 + 30 = 60"));
        assert!(content.contains("145 pts"));
        assert!(content.contains("1.234s"));
        assert!(!content.contains("you answered"));
    }

    #[test]
    fn incorrect_result_shows_user_answer() {
        let content = rendered(&View::Result(result(false, 50)));
        assert!(content.contains("Not quite"));
        assert!(content.contains("you answered 50"));
    }

    #[test]
    fn tiny_terminal_does_not_panic() {
        let mut terminal = Terminal::new(TestBackend::new(12, 3)).unwrap();
        let view = View::Result(result(true, 60));
        terminal.draw(|f| f.render_widget(&view, f.area())).unwrap();
    }
}

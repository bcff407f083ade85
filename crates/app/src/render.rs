//! Plain-text presenter for the terminal.

use std::fmt::Write as _;

use quiz_core::model::SessionId;
use services::sessions::{OptionMark, PhaseTag, Verdict};
use services::{PlayerCommand, SessionPhase, SessionSnapshot};

/// Redraw trigger: anything here changing reprints the whole question.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ViewKey {
    session: SessionId,
    phase: SessionPhase,
    selection: Option<String>,
    load_error: Option<String>,
}

impl ViewKey {
    fn of(snapshot: &SessionSnapshot) -> Self {
        Self {
            session: snapshot.session,
            phase: snapshot.phase.clone(),
            selection: snapshot.selection.clone(),
            load_error: snapshot.load_error.clone(),
        }
    }
}

/// Turns published snapshots into text, printing only what changed.
#[derive(Debug, Default)]
pub struct Presenter {
    last: Option<ViewKey>,
    last_remaining: Option<u32>,
}

impl Presenter {
    pub fn frame(&mut self, snapshot: Option<&SessionSnapshot>) -> Option<String> {
        let Some(snapshot) = snapshot else {
            self.last = None;
            return None;
        };

        let key = ViewKey::of(snapshot);
        if self.last.as_ref() != Some(&key) {
            self.last = Some(key);
            self.last_remaining = Some(snapshot.time_remaining);
            return Some(draw(snapshot));
        }

        let remaining = snapshot.time_remaining;
        if snapshot.tag() == PhaseTag::Presenting
            && self.last_remaining != Some(remaining)
            && worth_announcing(remaining)
        {
            self.last_remaining = Some(remaining);
            return Some(format!(
                "  {} {remaining}s left\n",
                time_bar(snapshot.time_ratio)
            ));
        }
        None
    }
}

fn worth_announcing(remaining: u32) -> bool {
    remaining <= 3 || remaining % 5 == 0
}

fn draw(snapshot: &SessionSnapshot) -> String {
    let mut out = String::new();
    match &snapshot.phase {
        SessionPhase::Loading => match &snapshot.load_error {
            Some(err) => {
                let _ = writeln!(out, "Could not load questions: {err}");
            }
            None => out.push_str("Loading questions...\n"),
        },
        SessionPhase::Presenting { index } => {
            draw_question(&mut out, snapshot, *index);
            let _ = writeln!(
                out,
                "Pick 1-{}, 'n' for next, 'q' to quit.",
                snapshot.options.len()
            );
        }
        SessionPhase::AwaitingFeedback { index, verdict } => {
            draw_question(&mut out, snapshot, *index);
            match verdict {
                Verdict::Pending => out.push_str("Checking answer...\n"),
                Verdict::Confirmed(feedback) if feedback.correct => {
                    let _ = writeln!(
                        out,
                        "Correct! +{} points in {}s.",
                        feedback.score_earned, feedback.time_taken_secs
                    );
                }
                Verdict::Confirmed(feedback) => {
                    let _ = writeln!(out, "Wrong. The answer was {}.", feedback.correct_option);
                }
                Verdict::Unavailable => out.push_str("No feedback for this question.\n"),
            }
        }
        SessionPhase::Submitting => out.push_str("Submitting answers...\n"),
        SessionPhase::Completed { score } => {
            let _ = writeln!(out, "\nQuiz Completed! Your Score: {score}");
        }
        SessionPhase::Faulted { message } => {
            let _ = writeln!(out, "\nQuiz could not be submitted: {message}");
        }
    }
    out
}

const BAR_WIDTH: usize = 10;

/// Time bar such as `[######----]`, filled in proportion to the time left.
fn time_bar(ratio: f32) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let filled = ((ratio.clamp(0.0, 1.0) * BAR_WIDTH as f32).round() as usize).min(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

fn draw_question(out: &mut String, snapshot: &SessionSnapshot, index: usize) {
    let _ = writeln!(
        out,
        "\nQuestion {} / {}   [{}] {} {}s",
        index + 1,
        snapshot.total,
        snapshot.difficulty,
        time_bar(snapshot.time_ratio),
        snapshot.time_remaining
    );
    if let Some(question) = &snapshot.question {
        let _ = writeln!(out, "{}", question.text());
    }
    for (n, option) in snapshot.options.iter().enumerate() {
        let mark = match option.mark {
            OptionMark::Plain => "   ",
            OptionMark::Selected => "[x]",
            OptionMark::Correct => "[+]",
            OptionMark::WrongSelected => "[-]",
        };
        let _ = write!(out, "  {mark} {}) {}", n + 1, option.label);
        if let Some(url) = &option.image_url {
            let _ = write!(out, " <{url}>");
        }
        out.push('\n');
    }
}

//
// ─── INPUT ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// 1-based option number.
    Choose(usize),
    Next,
    Quit,
}

#[must_use]
pub fn parse_input(line: &str) -> Option<Input> {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "" | "n" | "next" => Some(Input::Next),
        "q" | "quit" => Some(Input::Quit),
        other => other
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .map(Input::Choose),
    }
}

/// Map typed input onto a player command against what is on screen.
#[must_use]
pub fn command_for(input: Input, snapshot: Option<&SessionSnapshot>) -> Option<PlayerCommand> {
    match input {
        Input::Choose(n) => snapshot
            .and_then(|s| s.options.get(n - 1))
            .map(|option| PlayerCommand::Select(option.label.clone())),
        Input::Next => Some(PlayerCommand::Advance),
        Input::Quit => Some(PlayerCommand::Leave),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Difficulty, Question, QuestionId, QuizId, QuizOption};
    use services::sessions::{Feedback, OptionView};

    fn presenting(remaining: u32, selection: Option<&str>) -> SessionSnapshot {
        let question = Question::new(
            QuestionId::new(4),
            "Largest planet?",
            vec![QuizOption::text("Mars"), QuizOption::text("Jupiter")],
        );
        SessionSnapshot {
            session: SessionId::new(1),
            quiz_id: QuizId::new(2),
            difficulty: Difficulty::Medium,
            phase: SessionPhase::Presenting { index: 0 },
            index: Some(0),
            total: 3,
            question: Some(question),
            options: ["Mars", "Jupiter"]
                .into_iter()
                .map(|label| OptionView {
                    label: label.to_string(),
                    image_url: None,
                    mark: if selection == Some(label) {
                        OptionMark::Selected
                    } else {
                        OptionMark::Plain
                    },
                })
                .collect(),
            selection: selection.map(str::to_string),
            time_remaining: remaining,
            time_budget: 15,
            #[allow(clippy::cast_precision_loss)]
            time_ratio: remaining as f32 / 15.0,
            answered: 0,
            load_error: None,
        }
    }

    #[test]
    fn draws_question_header_and_options() {
        let mut presenter = Presenter::default();
        let text = presenter.frame(Some(&presenting(15, None))).unwrap();
        assert!(text.contains("Question 1 / 3"));
        assert!(text.contains("Largest planet?"));
        assert!(text.contains("1) Mars"));
        assert!(text.contains("2) Jupiter"));
    }

    #[test]
    fn only_announces_some_seconds() {
        let mut presenter = Presenter::default();
        presenter.frame(Some(&presenting(15, None)));
        assert_eq!(presenter.frame(Some(&presenting(14, None))), None);
        assert_eq!(
            presenter.frame(Some(&presenting(10, None))).as_deref(),
            Some("  [#######---] 10s left\n")
        );
        assert_eq!(presenter.frame(Some(&presenting(10, None))), None);
        assert!(presenter.frame(Some(&presenting(2, None))).is_some());
    }

    #[test]
    fn selection_redraws_with_mark() {
        let mut presenter = Presenter::default();
        presenter.frame(Some(&presenting(15, None)));
        let text = presenter.frame(Some(&presenting(15, Some("Jupiter")))).unwrap();
        assert!(text.contains("[x] 2) Jupiter"));
    }

    #[test]
    fn wrong_answer_names_the_correct_option() {
        let mut snapshot = presenting(12, Some("Mars"));
        snapshot.phase = SessionPhase::AwaitingFeedback {
            index: 0,
            verdict: Verdict::Confirmed(Feedback {
                correct_option: "Jupiter".into(),
                correct: false,
                score_earned: 0,
                time_taken_secs: 3,
            }),
        };
        let text = Presenter::default().frame(Some(&snapshot)).unwrap();
        assert!(text.contains("Wrong. The answer was Jupiter."));
    }

    #[test]
    fn completion_shows_score() {
        let mut snapshot = presenting(0, None);
        snapshot.phase = SessionPhase::Completed { score: 1200 };
        let text = Presenter::default().frame(Some(&snapshot)).unwrap();
        assert!(text.contains("Quiz Completed! Your Score: 1200"));
    }

    #[test]
    fn time_bar_tracks_remaining_ratio() {
        assert_eq!(time_bar(1.0), "[##########]");
        assert_eq!(time_bar(0.5), "[#####-----]");
        assert_eq!(time_bar(0.0), "[----------]");
        let text = Presenter::default().frame(Some(&presenting(15, None))).unwrap();
        assert!(text.contains("[##########] 15s"));
    }

    #[test]
    fn parses_terminal_input() {
        assert_eq!(parse_input(" 2 "), Some(Input::Choose(2)));
        assert_eq!(parse_input("N"), Some(Input::Next));
        assert_eq!(parse_input(""), Some(Input::Next));
        assert_eq!(parse_input("quit"), Some(Input::Quit));
        assert_eq!(parse_input("0"), None);
        assert_eq!(parse_input("maybe"), None);
    }

    #[test]
    fn option_numbers_map_to_labels() {
        let snapshot = presenting(15, None);
        assert_eq!(
            command_for(Input::Choose(2), Some(&snapshot)),
            Some(PlayerCommand::Select("Jupiter".into()))
        );
        assert_eq!(command_for(Input::Choose(3), Some(&snapshot)), None);
        assert_eq!(command_for(Input::Next, None), Some(PlayerCommand::Advance));
    }
}

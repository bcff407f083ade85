mod audio;
mod logging;
mod render;

use std::fmt;
use std::io::Write as _;
use std::sync::Arc;

use quiz_core::model::{Difficulty, OptionKind, QuizId, QuizOption};
use services::{
    ApiConfig, AudioPlayer, CatalogService, HttpQuizClient, NewQuestion, QuizPlayer, SilentPlayer,
};
use tokio::sync::mpsc;
use tracing::warn;

use crate::audio::RodioPlayer;
use crate::render::{Presenter, command_for, parse_input};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidQuizId { raw: String },
    InvalidDifficulty { raw: String },
    InvalidImageOption { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidQuizId { raw } => write!(f, "invalid --quiz-id value: {raw}"),
            ArgsError::InvalidDifficulty { raw } => {
                write!(f, "invalid --difficulty value: {raw} ({})", difficulty_choices())
            }
            ArgsError::InvalidImageOption { raw } => {
                write!(f, "invalid --image-option value: {raw} (expected LABEL=URL)")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn difficulty_choices() -> String {
    Difficulty::ALL.map(Difficulty::as_str).join("|")
}

fn parse_quiz_id(raw: String) -> Result<QuizId, ArgsError> {
    raw.parse::<QuizId>()
        .map_err(|_| ArgsError::InvalidQuizId { raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- list         [connection]");
    eprintln!("  cargo run -p app -- play         --quiz-id <id> [--difficulty <level>] [--no-audio] [connection]");
    eprintln!("  cargo run -p app -- create-quiz  --title <title> [connection]");
    eprintln!("  cargo run -p app -- add-question --quiz-id <id> --text <text> --correct <label>");
    eprintln!("                                   (--option <label> | --image-option <label>=<url>)...");
    eprintln!("                                   [--audio <url>] [connection]");
    eprintln!();
    eprintln!("Connection:");
    eprintln!("  --api <url>     backend base url (default http://localhost:8080)");
    eprintln!("  --token <token> bearer token");
    eprintln!();
    eprintln!("Difficulty:");
    eprintln!("  {} (default easy)", difficulty_choices());
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_API_BASE_URL, QUIZ_API_TOKEN, QUIZ_LOG, DEBUG_LOGGING");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    List,
    Play,
    CreateQuiz,
    AddQuestion,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "list" => Some(Self::List),
            "play" => Some(Self::Play),
            "create-quiz" => Some(Self::CreateQuiz),
            "add-question" => Some(Self::AddQuestion),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    api: ApiConfig,
    quiz_id: Option<QuizId>,
    difficulty: Difficulty,
    no_audio: bool,
    title: Option<String>,
    question: NewQuestion,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, ArgsError> {
        let mut args = args.into_iter();
        let mut parsed = Self {
            api: ApiConfig::from_env(),
            ..Self::default()
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api" => {
                    let value = require_value(&mut args, "--api")?;
                    parsed.api = parsed.api.with_base_url(value);
                }
                "--token" => {
                    let value = require_value(&mut args, "--token")?;
                    parsed.api = parsed.api.with_token(Some(value));
                }
                "--quiz-id" => {
                    parsed.quiz_id = Some(parse_quiz_id(require_value(&mut args, "--quiz-id")?)?);
                }
                "--difficulty" => {
                    let value = require_value(&mut args, "--difficulty")?;
                    parsed.difficulty = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidDifficulty { raw: value.clone() })?;
                }
                "--no-audio" => parsed.no_audio = true,
                "--title" => parsed.title = Some(require_value(&mut args, "--title")?),
                "--text" => parsed.question.text = require_value(&mut args, "--text")?,
                "--option" => {
                    let label = require_value(&mut args, "--option")?;
                    parsed.question.options.push(QuizOption::text(label));
                }
                "--image-option" => {
                    let value = require_value(&mut args, "--image-option")?;
                    let Some((label, url)) = value.split_once('=') else {
                        return Err(ArgsError::InvalidImageOption { raw: value });
                    };
                    parsed.question.options.push(QuizOption::image(label, url));
                    parsed.question.option_kind = OptionKind::Image;
                }
                "--correct" => {
                    parsed.question.correct_answer = require_value(&mut args, "--correct")?;
                }
                "--audio" => parsed.question.audio_url = Some(require_value(&mut args, "--audio")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn require_quiz_id(&self) -> Result<QuizId, ArgsError> {
        self.quiz_id
            .ok_or(ArgsError::MissingFlag { flag: "--quiz-id" })
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let parsed = Args::parse(argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let client = Arc::new(HttpQuizClient::new(parsed.api.clone())?);

    match cmd {
        Command::List => {
            let catalog = CatalogService::new(client);
            let quizzes = catalog.list_quizzes().await?;
            if quizzes.is_empty() {
                println!("No quizzes yet.");
            }
            for quiz in quizzes {
                println!("{}\t{}", quiz.id(), quiz.title());
            }
            Ok(())
        }
        Command::CreateQuiz => {
            let title = parsed
                .title
                .ok_or(ArgsError::MissingFlag { flag: "--title" })?;
            let quiz = CatalogService::new(client).create_quiz(&title).await?;
            println!("Created quiz {}: {}", quiz.id(), quiz.title());
            Ok(())
        }
        Command::AddQuestion => {
            let quiz_id = parsed.require_quiz_id()?;
            let id = CatalogService::new(client)
                .add_question(quiz_id, parsed.question)
                .await?;
            println!("Added question {id} to quiz {quiz_id}");
            Ok(())
        }
        Command::Play => {
            let quiz_id = parsed.require_quiz_id()?;
            play(client, quiz_id, parsed.difficulty, parsed.no_audio).await
        }
    }
}

fn open_audio(no_audio: bool) -> Arc<dyn AudioPlayer> {
    if no_audio {
        return Arc::new(SilentPlayer);
    }
    match RodioPlayer::spawn() {
        Ok(player) => Arc::new(player),
        Err(err) => {
            warn!(error = %err, "audio disabled");
            Arc::new(SilentPlayer)
        }
    }
}

/// Read stdin on a plain thread so a pending read never holds up shutdown.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn play(
    client: Arc<HttpQuizClient>,
    quiz_id: QuizId,
    difficulty: Difficulty,
    no_audio: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let handle = QuizPlayer::new(client, open_audio(no_audio)).spawn();
    let mut snapshots = handle.subscribe();
    let mut lines = spawn_stdin_reader();
    let mut presenter = Presenter::default();
    let mut stdout = std::io::stdout();

    handle.start(quiz_id, difficulty)?;

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if let Some(text) = presenter.frame(snapshot.as_ref()) {
                    print!("{text}");
                    stdout.flush()?;
                }
                if snapshot.is_some_and(|s| s.phase.is_terminal()) {
                    break;
                }
            }
            line = lines.recv() => {
                let Some(line) = line else {
                    handle.leave()?;
                    break;
                };
                let Some(input) = parse_input(&line) else {
                    continue;
                };
                match command_for(input, handle.snapshot().as_ref()) {
                    Some(services::PlayerCommand::Leave) => {
                        handle.leave()?;
                        break;
                    }
                    Some(command) => handle.send(command)?,
                    None => {}
                }
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}

#[tokio::main]
async fn main() {
    logging::init();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use quiz_core::model::{AnswerRecord, Difficulty, Question, QuestionId, QuizId, QuizOption, SessionId};
use services::api::{CheckAnswerRequest, CheckAnswerResponse, QuizResult};
use services::sessions::PhaseTag;
use services::{ApiError, AudioError, AudioPlayer, QuizApi, QuizPlayer, SilentPlayer};

#[derive(Default)]
struct FakeApi {
    quizzes: HashMap<QuizId, Vec<Question>>,
    correct: HashMap<QuestionId, String>,
    fetch_delay: HashMap<QuizId, Duration>,
    failing_checks: HashSet<QuestionId>,
    check_delay: Option<Duration>,
    checks: Mutex<Vec<(QuestionId, CheckAnswerRequest, Difficulty)>>,
    submissions: Mutex<Vec<(QuizId, Vec<AnswerRecord>, Difficulty)>>,
}

impl FakeApi {
    fn with_quiz(mut self, quiz_id: QuizId, questions: Vec<(Question, &str)>) -> Self {
        let mut list = Vec::new();
        for (question, answer) in questions {
            self.correct.insert(question.id(), answer.to_string());
            list.push(question);
        }
        self.quizzes.insert(quiz_id, list);
        self
    }

    fn checks(&self) -> Vec<(QuestionId, CheckAnswerRequest, Difficulty)> {
        self.checks.lock().unwrap().clone()
    }

    fn submissions(&self) -> Vec<(QuizId, Vec<AnswerRecord>, Difficulty)> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuizApi for FakeApi {
    async fn fetch_questions(&self, quiz_id: QuizId) -> Result<Vec<Question>, ApiError> {
        if let Some(delay) = self.fetch_delay.get(&quiz_id) {
            tokio::time::sleep(*delay).await;
        }
        self.quizzes
            .get(&quiz_id)
            .cloned()
            .ok_or(ApiError::Status { status: 404 })
    }

    async fn check_answer(
        &self,
        _quiz_id: QuizId,
        question_id: QuestionId,
        request: &CheckAnswerRequest,
        difficulty: Difficulty,
    ) -> Result<CheckAnswerResponse, ApiError> {
        self.checks
            .lock()
            .unwrap()
            .push((question_id, request.clone(), difficulty));
        if let Some(delay) = self.check_delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_checks.contains(&question_id) {
            return Err(ApiError::Status { status: 500 });
        }
        let answer = self.correct.get(&question_id).cloned().unwrap_or_default();
        let correct = request.selected_option == answer;
        Ok(CheckAnswerResponse {
            correct,
            correct_answer: answer,
            time_taken_seconds: 1,
            score_earned: if correct { 100 } else { 0 },
        })
    }

    async fn submit_quiz(
        &self,
        quiz_id: QuizId,
        answers: &[AnswerRecord],
        difficulty: Difficulty,
    ) -> Result<QuizResult, ApiError> {
        self.submissions
            .lock()
            .unwrap()
            .push((quiz_id, answers.to_vec(), difficulty));
        let correct = answers
            .iter()
            .filter(|a| self.correct.get(&a.question_id()).map(String::as_str) == Some(a.selected_option()))
            .count();
        Ok(QuizResult {
            total_score: i64::try_from(correct).unwrap() * 100,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Sound {
    Play(String),
    Stop,
}

#[derive(Default)]
struct RecordingAudio {
    calls: Mutex<Vec<Sound>>,
}

impl RecordingAudio {
    fn calls(&self) -> Vec<Sound> {
        self.calls.lock().unwrap().clone()
    }
}

impl AudioPlayer for RecordingAudio {
    fn play(&self, url: &str) -> Result<(), AudioError> {
        self.calls.lock().unwrap().push(Sound::Play(url.to_string()));
        Ok(())
    }

    fn stop(&self) {
        self.calls.lock().unwrap().push(Sound::Stop);
    }
}

fn question(id: u64, text: &str) -> Question {
    Question::new(
        QuestionId::new(id),
        text,
        vec![QuizOption::text("A"), QuizOption::text("B"), QuizOption::text("C")],
    )
}

#[tokio::test(start_paused = true)]
async fn manual_advance_then_timeout_completes_quiz() {
    let quiz = QuizId::new(7);
    let api = Arc::new(FakeApi::default().with_quiz(
        quiz,
        vec![(question(1, "First?"), "B"), (question(2, "Second?"), "C")],
    ));
    let handle = QuizPlayer::new(api.clone(), Arc::new(SilentPlayer)).spawn();

    handle.start(quiz, Difficulty::Hard).unwrap();
    let first = handle
        .wait_for(|s| s.tag() == PhaseTag::Presenting && s.index == Some(0))
        .await
        .unwrap();
    assert_eq!(first.total, 2);
    assert_eq!(first.time_budget, 10);
    assert!(!first.can_advance());

    handle.select("B").unwrap();
    handle
        .wait_for(|s| s.selection.as_deref() == Some("B"))
        .await
        .unwrap();
    handle.advance().unwrap();

    let feedback = handle.wait_for(|s| s.feedback().is_some()).await.unwrap();
    let verdict = feedback.feedback().unwrap();
    assert!(verdict.correct);
    assert_eq!(verdict.correct_option, "B");

    let second = handle
        .wait_for(|s| s.tag() == PhaseTag::Presenting && s.index == Some(1))
        .await
        .unwrap();
    assert_eq!(second.selection, None);
    assert_eq!(second.time_remaining, 10);

    let started = Instant::now();
    let done = handle.wait_for(|s| s.score().is_some()).await.unwrap();
    assert!(started.elapsed() >= Duration::from_secs(10));
    assert_eq!(done.score(), Some(100));

    let submissions = api.submissions();
    assert_eq!(submissions.len(), 1);
    let (submitted_quiz, answers, difficulty) = &submissions[0];
    assert_eq!(*submitted_quiz, quiz);
    assert_eq!(*difficulty, Difficulty::Hard);
    let picked: Vec<&str> = answers.iter().map(AnswerRecord::selected_option).collect();
    assert_eq!(picked, vec!["B", ""]);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn unanswered_question_times_out_once() {
    let quiz = QuizId::new(3);
    let api = Arc::new(FakeApi::default().with_quiz(quiz, vec![(question(9, "Only?"), "A")]));
    let handle = QuizPlayer::new(api.clone(), Arc::new(SilentPlayer)).spawn();

    handle.start(quiz, Difficulty::Easy).unwrap();
    handle
        .wait_for(|s| s.tag() == PhaseTag::Presenting)
        .await
        .unwrap();

    let started = Instant::now();
    let done = handle.wait_for(|s| s.score().is_some()).await.unwrap();
    assert!(started.elapsed() >= Duration::from_secs(20));
    assert_eq!(done.score(), Some(0));

    tokio::time::sleep(Duration::from_secs(30)).await;

    let checks = api.checks();
    assert_eq!(checks.len(), 1);
    assert_eq!(checks[0].1.selected_option, "");
    assert_eq!(checks[0].2, Difficulty::Easy);

    let submissions = api.submissions();
    assert_eq!(submissions.len(), 1);
    assert!(submissions[0].1[0].is_skipped());

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn failed_check_still_moves_on_with_the_real_selection() {
    let quiz = QuizId::new(5);
    let mut api = FakeApi::default().with_quiz(
        quiz,
        vec![(question(1, "First?"), "B"), (question(2, "Second?"), "B")],
    );
    api.failing_checks.insert(QuestionId::new(1));
    let api = Arc::new(api);
    let handle = QuizPlayer::new(api.clone(), Arc::new(SilentPlayer)).spawn();

    handle.start(quiz, Difficulty::Medium).unwrap();
    handle
        .wait_for(|s| s.tag() == PhaseTag::Presenting)
        .await
        .unwrap();
    handle.select("A").unwrap();
    handle.wait_for(|s| s.can_advance()).await.unwrap();
    handle.advance().unwrap();

    let waiting = handle.wait_for(|s| s.feedback_showing()).await.unwrap();
    assert!(waiting.feedback().is_none());

    handle
        .wait_for(|s| s.tag() == PhaseTag::Presenting && s.index == Some(1))
        .await
        .unwrap();
    handle.select("B").unwrap();
    handle.wait_for(|s| s.can_advance()).await.unwrap();
    handle.advance().unwrap();

    let done = handle.wait_for(|s| s.score().is_some()).await.unwrap();
    assert_eq!(done.score(), Some(100));

    let checks = api.checks();
    assert_eq!(checks.len(), 2);
    assert_eq!(checks[0].1.selected_option, "A");

    let answers = &api.submissions()[0].1;
    assert_eq!(answers[0].selected_option(), "A");
    assert_eq!(answers[1].selected_option(), "B");

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn switching_quizzes_drops_the_old_session() {
    let slow = QuizId::new(7);
    let fast = QuizId::new(8);
    let mut api = FakeApi::default()
        .with_quiz(slow, vec![(question(1, "Slow?"), "A")])
        .with_quiz(
            fast,
            vec![(
                question(2, "Fast?").with_audio_url("https://cdn.example/q2.mp3"),
                "A",
            )],
        );
    api.fetch_delay.insert(slow, Duration::from_secs(5));
    let api = Arc::new(api);
    let audio = Arc::new(RecordingAudio::default());
    let handle = QuizPlayer::new(api.clone(), audio.clone()).spawn();

    handle.start(slow, Difficulty::Easy).unwrap();
    handle.start(fast, Difficulty::Easy).unwrap();

    let live = handle
        .wait_for(|s| s.tag() == PhaseTag::Presenting)
        .await
        .unwrap();
    assert_eq!(live.quiz_id, fast);
    assert_eq!(live.session, SessionId::new(2));

    tokio::time::sleep(Duration::from_secs(6)).await;
    let still = handle.snapshot().unwrap();
    assert_eq!(still.quiz_id, fast);
    assert_eq!(still.question.unwrap().id(), QuestionId::new(2));

    handle.leave().unwrap();
    let mut rx = handle.subscribe();
    rx.wait_for(Option::is_none).await.unwrap();

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(api.checks().is_empty());
    assert!(api.submissions().is_empty());
    assert_eq!(
        audio.calls(),
        vec![Sound::Play("https://cdn.example/q2.mp3".into()), Sound::Stop]
    );

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn switching_while_an_answer_is_checked_stops_the_old_cue() {
    let first = QuizId::new(1);
    let second = QuizId::new(2);
    let mut api = FakeApi::default()
        .with_quiz(
            first,
            vec![(
                question(10, "Listen?").with_audio_url("https://cdn.example/a.mp3"),
                "A",
            )],
        )
        .with_quiz(
            second,
            vec![(
                question(20, "Again?").with_audio_url("https://cdn.example/b.mp3"),
                "B",
            )],
        );
    api.check_delay = Some(Duration::from_secs(3));
    let api = Arc::new(api);
    let audio = Arc::new(RecordingAudio::default());
    let handle = QuizPlayer::new(api.clone(), audio.clone()).spawn();

    handle.start(first, Difficulty::Easy).unwrap();
    handle
        .wait_for(|s| s.tag() == PhaseTag::Presenting)
        .await
        .unwrap();
    handle.select("A").unwrap();
    handle.wait_for(|s| s.can_advance()).await.unwrap();
    handle.advance().unwrap();
    let waiting = handle.wait_for(|s| s.feedback_showing()).await.unwrap();
    assert!(waiting.feedback().is_none());
    assert_eq!(audio.calls(), vec![Sound::Play("https://cdn.example/a.mp3".into())]);

    handle.start(second, Difficulty::Easy).unwrap();
    let live = handle
        .wait_for(|s| s.session == SessionId::new(2) && s.tag() == PhaseTag::Presenting)
        .await
        .unwrap();
    assert_eq!(live.quiz_id, second);

    // Past the point where the first quiz's check would have returned.
    tokio::time::sleep(Duration::from_secs(5)).await;
    let still = handle.snapshot().unwrap();
    assert_eq!(still.session, SessionId::new(2));
    assert_eq!(still.tag(), PhaseTag::Presenting);
    assert_eq!(still.index, Some(0));
    assert_eq!(still.selection, None);
    assert!(!still.feedback_showing());
    assert_eq!(still.question.unwrap().id(), QuestionId::new(20));

    assert_eq!(
        audio.calls(),
        vec![
            Sound::Play("https://cdn.example/a.mp3".into()),
            Sound::Stop,
            Sound::Play("https://cdn.example/b.mp3".into()),
        ]
    );
    assert_eq!(api.checks().len(), 1);
    assert!(api.submissions().is_empty());

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn missing_quiz_reports_load_error() {
    let api = Arc::new(FakeApi::default());
    let handle = QuizPlayer::new(api, Arc::new(SilentPlayer)).spawn();

    handle.start(QuizId::new(404), Difficulty::Easy).unwrap();
    let loading = handle
        .wait_for(|s| s.load_error.is_some())
        .await
        .unwrap();
    assert_eq!(loading.tag(), PhaseTag::Loading);
    assert_eq!(loading.question, None);

    handle.shutdown().await;
}

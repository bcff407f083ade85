mod answer;
mod difficulty;
mod ids;
mod question;
mod quiz;

pub use answer::AnswerRecord;
pub use difficulty::{Difficulty, DifficultyError};
pub use ids::{ParseIdError, QuestionId, QuizId, SessionId};
pub use question::{OptionKind, Question, QuestionError, QuizOption};
pub use quiz::{QuestionDraft, Quiz, QuizDraft, QuizDraftError};

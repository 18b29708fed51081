mod ids;
mod progress;
mod quiz;
mod unlock;

pub use ids::{CourseId, QuestionId, VideoId};
pub use progress::{COMPLETION_THRESHOLD, ProgressRecord};
pub use quiz::{
    Answer, PASS_THRESHOLD, Question, QuestionKind, QuestionOutcome, QuizDefinition, QuizResult,
};
pub use unlock::UnlockState;

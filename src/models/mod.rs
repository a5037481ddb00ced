pub mod deck;
pub mod deck_set;
pub mod flashcard;
pub mod learning_card;
pub mod learning_session;
pub mod review_record;
pub mod review_stage;
pub mod review_statistics;
pub mod reviewable_card;
pub mod scheduler;

pub use deck::Deck;
pub use deck_set::DeckSet;
pub use flashcard::Flashcard;
pub use learning_card::LearningCard;
pub use learning_session::LearningSession;
pub use review_record::ReviewRecord;
pub use review_stage::ReviewStage;
pub use review_statistics::{ReviewStatistics, compute_statistics};
pub use reviewable_card::{CardId, ReviewableCard};
pub use scheduler::{ReviewScheduler, record_outcome};

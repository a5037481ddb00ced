pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod models;

pub use clock::{Clock, FixedClock, OffsetClock};
pub use config::{AppConfig, FailurePolicy, SchedulerConfig, StatisticsConfig};
pub use error::{ConfigError, ExportError, StoreError};
pub use models::{
    Deck, DeckSet, Flashcard, LearningCard, LearningSession, ReviewRecord, ReviewScheduler, ReviewStage,
    ReviewStatistics, ReviewableCard, compute_statistics, record_outcome,
};

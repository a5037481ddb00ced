mod app;

use app::StudyApp;
use chrono::Utc;
use study_assistant::config::AppConfig;
use study_assistant::database::db::{add_flashcard, get_all_decks, init_database, load_all_decks, new_deck};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load()?;
    let conn = init_database(&config.database_path)?;

    if get_all_decks(&conn)?.is_empty() {
        let now = Utc::now();
        new_deck("Polish Vocabulary", &conn)?;
        add_flashcard("Polish Vocabulary", "cześć", "hello", now, &conn)?;
        add_flashcard("Polish Vocabulary", "dziękuję", "thank you", now, &conn)?;
        add_flashcard("Polish Vocabulary", "proszę", "please", now, &conn)?;

        tracing::info!("Sample data created");
    }

    let deck_set = load_all_decks(&conn)?;

    tracing::info!(decks = deck_set.decks.len(), "Loaded decks from database");
    for deck in &deck_set.decks {
        tracing::debug!(deck = %deck.name, cards = deck.flashcards.len(), "Deck loaded");
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([520.0, 720.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Study Assistant",
        options,
        Box::new(|_cc| Ok(Box::new(StudyApp::new_with_deckset(deck_set, conn, config)))),
    )
    .map_err(|e| e.to_string())?;

    Ok(())
}

//! Main application UI and state management.
//! Handles the study assistant interface, deck management, learning sessions
//! and per-deck statistics.

use study_assistant::config::AppConfig;
use study_assistant::database::db;
use study_assistant::export::{export_json_to_path, import_json};
use study_assistant::{
    Clock, Deck, DeckSet, Flashcard, LearningSession, ReviewStatistics, compute_statistics,
};
use chrono::{DateTime, Local, Utc};
use eframe::egui;
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Application screen states
#[derive(Default)]
enum AppScreen {
    #[default]
    Main,
    LearningSession,
}

/// Main application state
pub struct StudyApp {
    show_confirmation_dialog: bool,
    allowed_to_close: bool,
    all_decks: DeckSet,
    selected_deck_index: Option<usize>,
    current_term: String,
    current_definition: String,
    new_deck_name: String,
    conn: Arc<Mutex<Connection>>,
    config: AppConfig,

    current_screen: AppScreen,
    learning_session: Option<LearningSession>,

    current_date_display: String,

    show_export_dialog: bool,
    pending_delete: Option<usize>,
    statistics: Option<(String, ReviewStatistics)>,
    show_message_dialog: bool,
    message: String,
}

fn lock(conn: &Arc<Mutex<Connection>>) -> MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Current time according to the simulated clock
fn simulated_now(conn: &Connection) -> Option<DateTime<Utc>> {
    match db::current_clock(conn) {
        Ok(clock) => Some(clock.now()),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read simulated clock");
            None
        }
    }
}

fn format_time(time: DateTime<Utc>) -> String {
    let local: DateTime<Local> = time.into();
    local.format("%Y-%m-%d %H:%M").to_string()
}

impl eframe::App for StudyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        match self.current_screen {
            AppScreen::Main => self.render_main_screen(ctx),
            AppScreen::LearningSession => self.render_learning_screen(ctx),
        }

        // Handle window close requests with confirmation dialog
        if ctx.input(|i| i.viewport().close_requested()) && !self.allowed_to_close {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.show_confirmation_dialog = true;
        }

        if self.show_confirmation_dialog {
            egui::Window::new("Do you want to quit?")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        if ui.button("No").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = false;
                        }

                        if ui.button("Yes").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = true;
                            ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                        }
                    });
                });
        }

        if self.show_export_dialog {
            self.render_export_dialog(ctx);
        }

        if self.pending_delete.is_some() {
            self.render_delete_dialog(ctx);
        }

        if self.statistics.is_some() {
            self.render_statistics_window(ctx);
        }

        if self.show_message_dialog {
            egui::Window::new("Study Assistant")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(&self.message);
                    ui.add_space(10.0);
                    if ui.button("OK").clicked() {
                        self.show_message_dialog = false;
                    }
                });
        }
    }
}

impl StudyApp {
    /// Creates a new application instance with decks loaded from database
    pub fn new_with_deckset(deckset: DeckSet, conn: Connection, config: AppConfig) -> Self {
        let current_date_display = simulated_now(&conn)
            .map(format_time)
            .unwrap_or_else(|| "Unknown".to_string());
        let has_decks = !deckset.decks.is_empty();
        Self {
            show_confirmation_dialog: false,
            allowed_to_close: false,
            all_decks: deckset,
            selected_deck_index: if has_decks { Some(0) } else { None },
            current_term: String::new(),
            current_definition: String::new(),
            new_deck_name: String::new(),
            conn: Arc::new(Mutex::new(conn)),
            config,
            current_screen: AppScreen::Main,
            learning_session: None,
            current_date_display,
            show_export_dialog: false,
            pending_delete: None,
            statistics: None,
            show_message_dialog: false,
            message: String::new(),
        }
    }

    fn show_message(&mut self, message: String) {
        self.message = message;
        self.show_message_dialog = true;
    }

    /// Renders the main screen with deck management interface
    fn render_main_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                let now = simulated_now(&lock(&self.conn));
                if let Some(now) = now {
                    self.current_date_display = format_time(now);
                }
                ui.label(&self.current_date_display);

                if ui.button("Next Day").clicked() {
                    let conn = lock(&self.conn);
                    if let Err(e) = db::advance_day(&conn) {
                        tracing::error!(error = %e, "Failed to advance simulated clock");
                    }
                }
            });
            ui.separator();

            ui.horizontal(|ui| {
                if ui.button("Export Deck").clicked() {
                    self.show_export_dialog = true;
                }
                if ui.button("Import Deck").clicked() {
                    self.handle_import();
                }
            });

            ui.separator();

            ui.heading("Create New Deck");
            ui.horizontal(|ui| {
                ui.label("Deck name:");
                ui.text_edit_singleline(&mut self.new_deck_name);
                if ui.button("Create Deck").clicked() {
                    self.create_deck();
                }
            });

            ui.separator();

            ui.heading(format!("Decks ({})", self.all_decks.decks.len()));

            // Actions run after rendering to avoid borrowing conflicts
            let mut action_select: Option<usize> = None;
            let mut action_learn: Option<usize> = None;
            let mut action_stats: Option<usize> = None;
            let mut action_delete: Option<usize> = None;

            egui::ScrollArea::vertical()
                .id_source("decks_list")
                .max_height(150.0)
                .show(ui, |ui| {
                    for (i, deck) in self.all_decks.decks.iter().enumerate() {
                        let is_selected = self.selected_deck_index == Some(i);

                        ui.horizontal(|ui| {
                            if ui
                                .selectable_label(
                                    is_selected,
                                    format!("{}. {} ({} cards)", i + 1, deck.name, deck.flashcards.len()),
                                )
                                .clicked()
                            {
                                action_select = Some(i);
                            }

                            if ui.button("Learn").clicked() {
                                action_learn = Some(i);
                            }
                            if ui.button("Stats").clicked() {
                                action_stats = Some(i);
                            }
                            if ui.button("Delete").clicked() {
                                action_delete = Some(i);
                            }
                        });
                    }
                });

            if let Some(i) = action_select {
                self.selected_deck_index = Some(i);
            }
            if let Some(i) = action_learn {
                self.start_learning_session(i);
            }
            if let Some(i) = action_stats {
                self.load_statistics(i);
            }
            if action_delete.is_some() {
                self.pending_delete = action_delete;
            }

            ui.separator();

            self.render_selected_deck(ui);
        });
    }

    /// Flashcard entry and listing for the selected deck
    fn render_selected_deck(&mut self, ui: &mut egui::Ui) {
        let Some(deck_index) = self.selected_deck_index else {
            ui.label("Select a deck to add flashcards");
            return;
        };
        let Some(deck_name) = self.all_decks.decks.get(deck_index).map(|d| d.name.clone()) else {
            ui.label("Select a deck to add flashcards");
            return;
        };

        ui.heading(format!("Selected Deck: {}", deck_name));

        ui.horizontal(|ui| {
            ui.label("Term:");
            ui.text_edit_singleline(&mut self.current_term);
        });

        ui.horizontal(|ui| {
            ui.label("Definition:");
            ui.text_edit_singleline(&mut self.current_definition);
        });

        if ui.button("Add Flashcard").clicked() {
            self.add_flashcard(deck_index);
        }

        ui.separator();

        if let Some(deck) = self.all_decks.decks.get(deck_index) {
            ui.heading(format!("Flashcards ({})", deck.flashcards.len()));

            egui::ScrollArea::vertical()
                .id_source("flashcards_list")
                .max_height(200.0)
                .show(ui, |ui| {
                    for (i, flashcard) in deck.flashcards.iter().enumerate() {
                        ui.group(|ui| {
                            ui.label(format!("{}. Term: {}", i + 1, flashcard.term));
                            ui.label(format!("   Definition: {}", flashcard.definition));
                        });
                    }
                });
        }
    }

    fn create_deck(&mut self) {
        let name = self.new_deck_name.trim().to_string();
        if name.is_empty() {
            return;
        }

        let result = db::new_deck(&name, &lock(&self.conn));
        match result {
            Ok(()) => {
                self.all_decks.decks.push(Deck::new(name));
                self.new_deck_name.clear();
            }
            Err(e) => self.show_message(format!("Could not create deck: {}", e)),
        }
    }

    fn add_flashcard(&mut self, deck_index: usize) {
        let flashcard = Flashcard::new(self.current_term.trim(), self.current_definition.trim());
        if !flashcard.is_valid() {
            return;
        }
        let Some(deck) = self.all_decks.decks.get_mut(deck_index) else {
            return;
        };

        let result = {
            let conn = lock(&self.conn);
            let now = simulated_now(&conn).unwrap_or_else(Utc::now);
            db::add_flashcard(&deck.name, &flashcard.term, &flashcard.definition, now, &conn)
        };

        match result {
            Ok(_) => {
                deck.flashcards.push(flashcard);
                self.current_term.clear();
                self.current_definition.clear();
            }
            Err(e) => self.show_message(format!("Could not add flashcard: {}", e)),
        }
    }

    /// Renders the learning session screen with flashcard review interface
    fn render_learning_screen(&mut self, ctx: &egui::Context) {
        let mut action_back = false;
        let mut grading_error: Option<String> = None;

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(session) = &mut self.learning_session else {
                action_back = true;
                return;
            };

            ui.heading(format!("Learning: {}", session.deck_name));
            ui.label(session.phase_message());
            ui.label(format!(
                "Progress: {} / {} learned ({} remaining)",
                session.learned_count(),
                session.total_count(),
                session.remaining_count()
            ));

            ui.add_space(20.0);

            if session.is_completed() {
                ui.heading("Congratulations!");
                ui.label("You've answered every due card correctly!");
                ui.add_space(20.0);
                if ui.button("Back to Main Screen").clicked() {
                    action_back = true;
                }
                return;
            }

            let Some(card) = session.current_card() else {
                return;
            };
            let show_def = session.show_definition;
            let is_learned = card.is_learned;
            let term = card.flashcard.term.clone();
            let definition = card.flashcard.definition.clone();
            let stage_label = session
                .current_state()
                .map(|state| {
                    format!(
                        "Stage: {} (confidence {:.0}%)",
                        state.stage.label(),
                        state.confidence_level * 100.0
                    )
                })
                .unwrap_or_default();

            ui.group(|ui| {
                ui.set_min_height(200.0);
                ui.vertical_centered(|ui| {
                    ui.add_space(20.0);
                    ui.label(stage_label);
                    ui.add_space(10.0);

                    ui.heading("Term:");
                    ui.label(&term);

                    ui.add_space(20.0);

                    if show_def {
                        ui.heading("Definition:");
                        ui.label(&definition);
                    } else {
                        ui.label("(Click 'Show Definition' to reveal)");
                    }

                    ui.add_space(20.0);
                });
            });

            ui.add_space(20.0);

            let mut action_toggle_def = false;
            let mut action_grade: Option<bool> = None;

            if !show_def && ui.button("Show Definition").clicked() {
                action_toggle_def = true;
            }

            // Answer buttons only after revealing the definition
            if show_def && !is_learned {
                ui.label("Did you know it?");
                ui.horizontal(|ui| {
                    if ui.button("Incorrect").clicked() {
                        action_grade = Some(false);
                    }
                    if ui.button("Correct").clicked() {
                        action_grade = Some(true);
                    }
                });
            }

            ui.add_space(20.0);

            if ui.button("Back to Main Screen").clicked() {
                action_back = true;
            }

            if action_toggle_def {
                session.toggle_definition();
            }
            if let Some(is_correct) = action_grade {
                match session.grade_current_card(is_correct) {
                    Ok(()) => session.next_card(),
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to record review outcome");
                        grading_error = Some(format!("Could not save your answer: {}", e));
                    }
                }
            }
        });

        if let Some(message) = grading_error {
            self.show_message(message);
            action_back = true;
        }
        if action_back {
            self.current_screen = AppScreen::Main;
            self.learning_session = None;
        }
    }

    /// Starts a learning session with cards due for review
    fn start_learning_session(&mut self, deck_index: usize) {
        let Some(deck_name) = self.all_decks.decks.get(deck_index).map(|d| d.name.clone()) else {
            return;
        };

        let due_cards = {
            let conn = lock(&self.conn);
            let now = simulated_now(&conn).unwrap_or_else(Utc::now);
            db::get_flashcards_due_for_review(&deck_name, now, &conn)
        };

        match due_cards {
            Ok(cards) if cards.is_empty() => {
                self.show_message(format!("No cards in '{}' are due for review.", deck_name));
            }
            Ok(cards) => {
                tracing::info!(deck = %deck_name, due = cards.len(), "Starting learning session");
                self.learning_session = Some(LearningSession::new_from_due_cards(
                    deck_name,
                    cards,
                    Arc::clone(&self.conn),
                    self.config.scheduler.clone(),
                ));
                self.current_screen = AppScreen::LearningSession;
            }
            Err(e) => self.show_message(format!("Could not load due cards: {}", e)),
        }
    }

    fn load_statistics(&mut self, deck_index: usize) {
        let Some(deck_name) = self.all_decks.decks.get(deck_index).map(|d| d.name.clone()) else {
            return;
        };

        let result = {
            let conn = lock(&self.conn);
            let now = simulated_now(&conn).unwrap_or_else(Utc::now);
            db::get_review_states_for_deck(&deck_name, &conn).and_then(|cards| {
                let history = db::get_review_log_for_deck(&deck_name, &conn)?;
                Ok(compute_statistics(&cards, &history, now, &self.config.statistics))
            })
        };

        match result {
            Ok(stats) => self.statistics = Some((deck_name, stats)),
            Err(e) => self.show_message(format!("Could not compute statistics: {}", e)),
        }
    }

    fn render_statistics_window(&mut self, ctx: &egui::Context) {
        let mut should_close = false;

        if let Some((deck_name, stats)) = &self.statistics {
            egui::Window::new(format!("Statistics: {}", deck_name))
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(format!("Flashcards: {}", stats.total_flashcards));
                    ui.label(format!("Due now: {}", stats.due_count));
                    ui.label(format!("Reviews completed: {}", stats.completed_reviews));
                    ui.label(format!("Average score: {:.1}%", stats.average_score));
                    ui.label(format!("Streak: {} days", stats.streak_days));
                    ui.label(format!("Mastered: {}", stats.mastered_count));
                    ui.label(format!("Struggling: {}", stats.struggling_count));

                    if !stats.reviews_per_day.is_empty() {
                        ui.separator();
                        ui.label("Recent review days:");
                        for (day, count) in stats.reviews_per_day.iter().rev().take(7) {
                            ui.label(format!("  {}: {} cards", day, count));
                        }
                    }

                    ui.add_space(10.0);
                    if ui.button("Close").clicked() {
                        should_close = true;
                    }
                });
        }

        if should_close {
            self.statistics = None;
        }
    }

    fn render_delete_dialog(&mut self, ctx: &egui::Context) {
        let Some(deck_index) = self.pending_delete else {
            return;
        };
        let Some(deck_name) = self.all_decks.decks.get(deck_index).map(|d| d.name.clone()) else {
            self.pending_delete = None;
            return;
        };

        let mut confirmed = false;
        let mut cancelled = false;

        egui::Window::new("Delete Deck")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(format!(
                    "Delete '{}' together with all its cards and progress?",
                    deck_name
                ));
                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        cancelled = true;
                    }
                    if ui.button("Delete").clicked() {
                        confirmed = true;
                    }
                });
            });

        if confirmed {
            let result = db::delete_deck(&deck_name, &lock(&self.conn));
            match result {
                Ok(()) => {
                    self.all_decks.remove(&deck_name);
                    self.selected_deck_index = if self.all_decks.decks.is_empty() {
                        None
                    } else {
                        Some(0)
                    };
                }
                Err(e) => self.show_message(format!("Could not delete deck: {}", e)),
            }
        }
        if confirmed || cancelled {
            self.pending_delete = None;
        }
    }

    fn render_export_dialog(&mut self, ctx: &egui::Context) {
        let mut export_deck_index: Option<usize> = None;
        let mut should_cancel = false;

        egui::Window::new("Export Deck")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label("Select a deck to export:");
                ui.separator();

                for (i, deck) in self.all_decks.decks.iter().enumerate() {
                    if ui
                        .button(format!("{} ({} cards)", deck.name, deck.flashcards.len()))
                        .clicked()
                    {
                        export_deck_index = Some(i);
                    }
                }

                ui.separator();

                if ui.button("Cancel").clicked() {
                    should_cancel = true;
                }
            });

        if let Some(i) = export_deck_index {
            self.handle_export(i);
        }
        if should_cancel {
            self.show_export_dialog = false;
        }
    }

    /// Handles deck export to JSON file
    fn handle_export(&mut self, deck_index: usize) {
        self.show_export_dialog = false;

        let Some(deck) = self.all_decks.decks.get(deck_index).cloned() else {
            return;
        };
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(format!("{}.json", deck.name))
            .add_filter("JSON files", &["json"])
            .save_file()
        else {
            return;
        };

        match export_json_to_path(&deck, &path) {
            Ok(()) => self.show_message(format!("Deck '{}' exported successfully!", deck.name)),
            Err(e) => self.show_message(format!("Export failed: {}", e)),
        }
    }

    /// Handles deck import from JSON file
    fn handle_import(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON files", &["json"])
            .pick_file()
        else {
            return;
        };

        let deck = match import_json(&path) {
            Ok(deck) => deck,
            Err(e) => {
                self.show_message(format!(
                    "Import failed: {}\n\nPlease check if the file has correct structure:\n{{\n  \"name\": \"Deck Name\",\n  \"flashcards\": [...]\n}}",
                    e
                ));
                return;
            }
        };

        if self.all_decks.contains(&deck.name) {
            self.show_message(format!(
                "Deck '{}' already exists! Please rename it in the JSON file.",
                deck.name
            ));
            return;
        }

        let result = {
            let mut conn = lock(&self.conn);
            let now = simulated_now(&conn).unwrap_or_else(Utc::now);
            db::import_deck(&deck, now, &mut conn)
        };

        match result {
            Ok(()) => {
                self.show_message(format!(
                    "Deck '{}' imported successfully with {} cards!",
                    deck.name,
                    deck.flashcards.len()
                ));
                self.all_decks.decks.push(deck);
            }
            Err(e) => self.show_message(format!("Import failed: {}", e)),
        }
    }
}

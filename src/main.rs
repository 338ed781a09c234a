mod config;
mod diary_entry;
mod diary_state;
mod editor;
mod error;
mod export;
mod lock;
mod markup;
mod media;
mod search;
mod stats;
mod store;
mod theme;
mod ui;

use color_eyre::eyre::{eyre, Result};
use config::Config;
use diary_state::DiaryState;
use error::JournalError;
use export::{Exporter, HtmlFileExporter};
use lock::{FileCredentialStore, LockGate, NoBiometrics};
use media::{CommandRecorder, FileImagePicker};
use search::{filter_entries, Query};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use store::{Store, THEME_KEY};
use theme::Theme;
use tracing_subscriber::EnvFilter;
use ui::{Action, LockOutcome, UI};

fn init_logging(log_dir: &Path) -> Result<()> {
    fs::create_dir_all(log_dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("moodbook.log"))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("MOODBOOK_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn load_theme(store: &Store) -> Theme {
    match store.get::<Theme>(THEME_KEY) {
        Ok(Some(theme)) if theme.is_valid() => theme,
        Ok(Some(theme)) => {
            tracing::warn!("Ignoring saved theme '{}' with invalid colours", theme.name);
            Theme::default()
        }
        Ok(None) => Theme::default(),
        Err(e) => {
            tracing::error!("Error loading saved theme: {}", e);
            Theme::default()
        }
    }
}

/// Logs a collaborator failure and shows it without leaving the current screen.
fn report<T>(
    ui: &mut UI,
    theme: &Theme,
    title: &str,
    result: Result<T, JournalError>,
) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::error!("{}: {}", title, e);
            ui.alert(title, &e.to_string(), theme)?;
            Ok(None)
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let config = Config::load().map_err(|e| eyre!("Failed to load configuration: {}", e))?;
    init_logging(&config.log_dir)?;
    tracing::info!("Starting moodbook with data in {}", config.data_dir.display());

    let store = Store::open(&config.data_dir)?;
    let mut startup_error = None;
    let mut diary_state = match DiaryState::load(store.clone()) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Error loading data: {}", e);
            startup_error = Some(e);
            DiaryState::new(store.clone())
        }
    };
    let mut theme = load_theme(&store);
    let mut gate = LockGate::load(
        &store,
        Box::new(FileCredentialStore::new(config.data_dir.join("credentials.json"))),
        Box::new(NoBiometrics),
        config.min_password_len,
    )?;
    let mut picker = FileImagePicker;
    let mut recorder = CommandRecorder::new(config.audio.clone(), config.data_dir.join("voice"));
    let mut exporter = HtmlFileExporter::new(&config.export_dir);

    let mut ui = UI::new()?;
    if let Some(e) = startup_error {
        ui.alert(
            "Error",
            &format!("Failed to load your diary data: {e}"),
            &theme,
        )?;
    }

    let mut query = Query::default();
    loop {
        if gate.is_locked() {
            match ui.lock_screen(&mut gate, &theme)? {
                LockOutcome::Unlocked => {}
                LockOutcome::Quit => break,
            }
            continue;
        }

        let visible = filter_entries(diary_state.get_entries(), &query);
        ui.display(&diary_state, &visible, &query, &theme)?;
        let selected = ui.selected_entry(&visible).cloned();
        let visible_count = visible.len();

        let Some(action) = ui.handle_input(visible_count)? else {
            continue;
        };
        match action {
            Action::Write => {
                if let Some(entry) =
                    ui.compose_entry(None, &diary_state, &theme, &mut picker, &mut recorder)?
                {
                    let result = diary_state.add_entry(entry);
                    report(&mut ui, &theme, "Failed to save your entry", result)?;
                }
            }
            Action::View => {
                if let Some(entry) = selected {
                    ui.view_full_entry(&entry, &diary_state, &theme, &mut recorder)?;
                }
            }
            Action::Edit => {
                if let Some(entry) = selected {
                    if let Some(updated_entry) = ui.compose_entry(
                        Some(&entry),
                        &diary_state,
                        &theme,
                        &mut picker,
                        &mut recorder,
                    )? {
                        let result = diary_state.update_entry(updated_entry);
                        report(&mut ui, &theme, "Failed to save your entry", result)?;
                    }
                }
            }
            Action::Delete => {
                if let Some(entry) = selected {
                    if ui.confirm(
                        "Delete Entry",
                        "Are you sure you want to delete this entry?",
                        &theme,
                    )? {
                        let result = diary_state.delete_entry(&entry.id);
                        report(&mut ui, &theme, "Failed to delete the entry", result)?;
                    }
                }
            }
            Action::Search => {
                let current = match &query {
                    Query::Simple { text, .. } => text.clone(),
                    Query::Advanced(_) => String::new(),
                };
                if let Some(text) =
                    ui.prompt("Search Entries", "Search Query", &current, false, &theme)?
                {
                    let category = match &query {
                        Query::Simple { category, .. } => category.clone(),
                        Query::Advanced(_) => None,
                    };
                    query = Query::Simple { text, category };
                }
            }
            Action::AdvancedSearch => {
                let initial = match &query {
                    Query::Advanced(criteria) => criteria.clone(),
                    Query::Simple { .. } => Default::default(),
                };
                if let Some(criteria) = ui.advanced_search(initial, &theme)? {
                    query = Query::Advanced(criteria);
                }
            }
            Action::ClearSearch => query = Query::default(),
            Action::FilterCategory => {
                let current = match &query {
                    Query::Simple { category, .. } => category.clone(),
                    Query::Advanced(_) => None,
                };
                if let Some(category) = ui.pick_category(&diary_state, current, &theme)? {
                    let text = match &query {
                        Query::Simple { text, .. } => text.clone(),
                        Query::Advanced(_) => String::new(),
                    };
                    query = Query::Simple { text, category };
                }
            }
            Action::AddCategory => {
                if let Some(name) = ui.prompt("New Category", "Name", "", false, &theme)? {
                    if !name.trim().is_empty() {
                        let result = diary_state.add_category(&name);
                        report(&mut ui, &theme, "Failed to save your categories", result)?;
                    }
                }
            }
            Action::Statistics => {
                ui.statistics(diary_state.get_entries(), config.top_tags, &theme)?;
            }
            Action::MoodTracker => {
                ui.mood_tracker(diary_state.get_entries(), &theme)?;
            }
            Action::Theme => {
                if let Some(chosen) = ui.pick_theme(&theme)? {
                    let result = store.set(THEME_KEY, &chosen);
                    if report(&mut ui, &theme, "Error saving theme", result)?.is_some() {
                        tracing::info!("Theme changed to {}", chosen.name);
                        theme = chosen;
                    }
                }
            }
            Action::SetPassword => {
                let heading = if gate.is_password_set() {
                    "Change Password"
                } else {
                    "Set Password"
                };
                if let Some(password) = ui.prompt(heading, "New password", "", true, &theme)? {
                    let result = gate.set_password(&store, &password);
                    report(&mut ui, &theme, "Failed to set password", result)?;
                }
            }
            Action::Lock => {
                if gate.is_password_set() {
                    tracing::info!("Journal locked");
                    gate.lock();
                } else {
                    ui.alert("Lock", "Set a password first (P).", &theme)?;
                }
            }
            Action::Export => {
                let document = export::render_document(diary_state.get_entries(), &theme);
                let result = exporter.export(&document);
                if let Some(path) = report(&mut ui, &theme, "Export Failed", result)? {
                    ui.alert("Export", &format!("Saved to {}", path.display()), &theme)?;
                }
            }
            Action::Quit => break,
        }
    }

    tracing::info!("Exiting");
    Ok(())
}

//! `komorebi`: a terminal front-end for timed morning and evening
//! reflection sessions.

mod command;
mod helper;
mod render;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use tracing_subscriber::EnvFilter;

use command::{ArchiveAction, Command, GalleryAction, UserChoice};
use helper::CliHelper;
use komorebi_core::clock::SystemClock;
use komorebi_core::config::KomorebiConfig;
use komorebi_core::remote::NoFrameCapture;
use komorebi_core::session::{SceneType, SendOutcome, SessionController, SessionServices};
use komorebi_core::storage::{MemoryStore, StorageAdapter};
use komorebi_core::UserContext;
use komorebi_infrastructure::{
    ConfigService, DebouncedStore, FileStore, KomorebiPaths, VersionedLimitsStore,
};
use komorebi_interaction::{ChatApiClient, InsightApiClient};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("komorebi=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

struct App {
    controller: SessionController,
    persistent: Arc<DebouncedStore>,
}

impl App {
    fn build(config: &KomorebiConfig) -> Result<Self> {
        let store_dir = KomorebiPaths::store_dir(&config.storage)?;
        let files = Arc::new(FileStore::open(&store_dir)?);
        let persistent = Arc::new(DebouncedStore::new(
            files,
            Duration::from_millis(config.storage.debounce_ms),
        ));
        let storage = StorageAdapter::new(persistent.clone(), Arc::new(MemoryStore::new()));

        let services = SessionServices {
            chat: Arc::new(ChatApiClient::from_config(&config.endpoints)?),
            insight: Arc::new(InsightApiClient::from_config(&config.endpoints)?),
            frame_capture: Arc::new(NoFrameCapture),
            limits_store: Arc::new(VersionedLimitsStore::new(storage.clone())),
            clock: Arc::new(SystemClock),
        };
        let user = UserContext::authenticated(None, false);
        let controller = SessionController::new(storage, config.limits, user, services);

        tracing::info!(store = %store_dir.display(), chat = %config.endpoints.chat_url, "Komorebi ready");
        Ok(Self {
            controller,
            persistent,
        })
    }

    async fn greet(&self) {
        let snapshot = self.controller.snapshot().await;
        render::conversation(&snapshot);
        if self.controller.has_completed_both_today().await || !self.controller.window().await.auto_start {
            self.status().await;
        }
    }

    async fn status(&self) {
        let snapshot = self.controller.snapshot().await;
        let window = self.controller.window().await;
        let completed_both = self.controller.has_completed_both_today().await;
        let next_start = self.controller.next_session_start().await;
        render::status(&snapshot, &window, completed_both, next_start);
    }

    async fn say(&self, text: &str) {
        match self.controller.send_message(text).await {
            SendOutcome::Delivered { reply, .. } => {
                render::message(&reply);
                if self.controller.should_offer_insight().await {
                    render::info("Type /insight to capture this moment as a card.");
                }
            }
            SendOutcome::Rejected(reason) => render::rejection(reason),
            SendOutcome::Discarded => {}
        }
    }

    async fn end(&self) {
        let snapshot = self.controller.snapshot().await;
        if !snapshot.messages.iter().any(|m| m.is_user()) {
            render::info("Nothing to save yet.");
            return;
        }

        if snapshot.user.is_authenticated() {
            if let Some(archived) = self.controller.end_session().await {
                render::info(format!(
                    "Session saved ({} messages, {} min).",
                    archived.message_count, archived.duration
                ));
                let generated = self.controller.generate_insight_for_archived(&archived).await;
                render::insight(&generated);
            }
        } else {
            let generated = self.controller.generate_insight(None).await;
            render::insight(&generated);
            self.controller.end_session().await;
        }
        render::conversation(&self.controller.snapshot().await);
    }

    async fn archive(&self, action: ArchiveAction) -> Result<()> {
        let user = self.controller.user().await;
        let archiver = self.controller.archiver();
        let sessions = archiver.list(&user);
        let pick = |n: usize| {
            sessions
                .get(n)
                .ok_or_else(|| anyhow::anyhow!("No archived session #{}", n + 1))
        };

        match action {
            ArchiveAction::List => render::archive_list(&sessions),
            ArchiveAction::Show(n) => {
                let session = pick(n)?;
                render::archived(session);
                if let Some(card) = session
                    .insight_card_id
                    .as_deref()
                    .and_then(|id| self.controller.gallery().find(&user, id))
                {
                    render::card(&card);
                }
            }
            ArchiveAction::Delete(n) => {
                archiver.delete(&user, &pick(n)?.id)?;
                render::info("Session deleted.");
            }
            ArchiveAction::Insight(n) => {
                let generated = self.controller.generate_insight_for_archived(pick(n)?).await;
                render::insight(&generated);
            }
        }
        Ok(())
    }

    async fn gallery(&self, action: GalleryAction) -> Result<()> {
        let user = self.controller.user().await;
        let gallery = self.controller.gallery();
        let cards = gallery.list(&user);
        let pick = |n: usize| {
            cards
                .get(n)
                .ok_or_else(|| anyhow::anyhow!("No card #{}", n + 1))
        };

        match action {
            GalleryAction::List => render::gallery(&cards),
            GalleryAction::Pin(n) => {
                let pinned = gallery.toggle_pin(&user, &pick(n)?.id)?;
                render::info(if pinned { "Pinned." } else { "Unpinned." });
            }
            GalleryAction::Delete(n) => {
                gallery.delete(&user, &pick(n)?.id)?;
                render::info("Card deleted.");
            }
        }
        Ok(())
    }

    async fn switch_user(&self, choice: UserChoice) {
        let current = self.controller.user().await;
        let user = match choice {
            UserChoice::Guest => UserContext::Guest,
            UserChoice::Anonymous => UserContext::Anonymous,
            UserChoice::SignIn(name) => UserContext::authenticated(name, current.is_pro()),
        };
        self.controller.set_user(user).await;
        render::conversation(&self.controller.snapshot().await);
    }

    /// Runs one command. Returns false when the REPL should exit.
    async fn handle(&self, command: Command) -> Result<bool> {
        let user = self.controller.user().await;
        match command {
            Command::Say(text) => self.say(&text).await,
            Command::Reset => {
                self.controller.reset_session().await;
                render::conversation(&self.controller.snapshot().await);
            }
            Command::End => self.end().await,
            Command::Insight => {
                let generated = self.controller.generate_insight(None).await;
                render::insight(&generated);
            }
            Command::Archive(action) => self.archive(action).await?,
            Command::Gallery(action) => self.gallery(action).await?,
            Command::Status => self.status().await,
            Command::Scene(None) => {
                render::info(format!("Scene: {}", self.controller.background().scene(&user).as_str()));
            }
            Command::Scene(Some(name)) => {
                self.controller.background().set_scene(&user, &SceneType::new(name));
            }
            Command::Video(enabled) => {
                self.controller.background().set_video_enabled(&user, enabled);
            }
            Command::Pro(is_pro) => {
                if !user.is_authenticated() {
                    render::info("Sign in first (/user signin).");
                } else {
                    self.controller.set_user(user.with_pro(is_pro)).await;
                    render::info(if is_pro { "Pro enabled." } else { "Pro disabled." });
                }
            }
            Command::User(choice) => self.switch_user(choice).await,
            Command::Help => render::help(),
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = ConfigService::from_default_path()?.get_config()?;
    let app = App::build(&config)?;

    let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(CliHelper));

    println!("{}", "=== Komorebi ===".bright_magenta().bold());
    println!("{}", "Type to reflect, '/help' for commands, or 'quit' to exit.".bright_black());
    println!();
    app.greet().await;

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                match Command::parse(trimmed) {
                    Ok(command) => match app.handle(command).await {
                        Ok(true) => {}
                        Ok(false) => {
                            println!("{}", "Goodbye!".bright_green());
                            break;
                        }
                        Err(e) => render::error(e),
                    },
                    Err(usage) => println!("{}", usage.yellow()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                render::error(format!("{err:?}"));
                break;
            }
        }
    }

    app.persistent.flush()?;
    Ok(())
}

use std::path::PathBuf;
use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::*;

use crate::ai_provider::{AIProviderClient, ImageClient};
use crate::config::Config;
use crate::core::{Action, BeingColor, Notification};
use crate::session::Session;
use crate::store::StateStore;

pub use commands::{Commands, TaskCommands};

mod commands;

/// Loaded config, store and session for one invocation
pub struct App {
    pub config: Config,
    pub store: StateStore,
    pub session: Session,
}

impl App {
    /// Load the being and land any droppings that came due while away.
    pub async fn open(data_dir: Option<PathBuf>) -> Result<Self> {
        let config = Config::new(data_dir)?;
        let store = StateStore::from_config(&config);
        let (mut session, notice) = store.open_session(&config.being_id, config.dropping_delay()).await;
        if let Some(notice) = notice {
            print_notification(&notice);
        }

        print_notifications(&session.settle(Utc::now(), &mut rand::thread_rng()));
        Ok(App { config, store, session })
    }

    /// Save if autosave is on; only failures are reported.
    pub async fn autosave(&self) {
        if !self.config.autosave {
            return;
        }
        let notice = self.store.save_with_notice(&self.config.being_id, self.session.snapshot()).await;
        if notice.is_failure() {
            print_notification(&notice);
        }
    }
}

pub fn print_notification(notification: &Notification) {
    if notification.is_failure() {
        println!("{} {}", notification.title.red().bold(), notification.description);
    } else {
        println!("{} {}", notification.title.green().bold(), notification.description);
    }
}

pub fn print_notifications(notifications: &[Notification]) {
    for notification in notifications {
        print_notification(notification);
    }
}

pub async fn handle_action(action: Action, data_dir: Option<PathBuf>) -> Result<()> {
    let mut app = App::open(data_dir).await?;
    let notifications = app.session.perform(action, Utc::now(), &mut rand::thread_rng());
    print_notifications(&notifications);
    crate::status::print_stats(app.session.snapshot());
    app.autosave().await;
    Ok(())
}

pub async fn handle_tick(periods: u32, data_dir: Option<PathBuf>) -> Result<()> {
    let mut app = App::open(data_dir).await?;
    let interval = chrono::Duration::from_std(app.config.decay_interval())?;
    let start = Utc::now();
    let mut rng = rand::thread_rng();

    for period in 1..=periods {
        let now = simulated_time(start, interval, period)?;
        print_notifications(&app.session.tick(now, &mut rng));
    }

    println!("{}", format!("{} decay period(s) applied", periods).dimmed());
    crate::status::print_stats(app.session.snapshot());
    app.autosave().await;
    Ok(())
}

/// Wall-clock time after `period` decay intervals.
fn simulated_time(start: DateTime<Utc>, interval: chrono::Duration, period: u32) -> Result<DateTime<Utc>> {
    i32::try_from(period)
        .ok()
        .and_then(|period| interval.checked_mul(period))
        .and_then(|elapsed| start.checked_add_signed(elapsed))
        .ok_or_else(|| anyhow::anyhow!("Simulated time out of range after {} periods", period))
}

pub async fn handle_chat(
    message: String,
    data_dir: Option<PathBuf>,
    provider: Option<String>,
    model: Option<String>,
) -> Result<()> {
    let mut app = App::open(data_dir).await?;
    let client = AIProviderClient::new(app.config.get_ai_config(provider, model)?);

    app.session.record_user_message(message.clone(), Utc::now());
    let personality = app.session.snapshot().being.personality.clone();
    let (reply, notice) = client.generate_reply(&personality, &message).await;
    app.session.record_reply(reply.clone());

    println!("{}: {}", "You".cyan(), message);
    println!("{}: {}", app.session.snapshot().being.name.green(), reply);
    if let Some(notice) = notice {
        print_notification(&notice);
    }

    app.autosave().await;
    Ok(())
}

pub async fn handle_task(command: TaskCommands, data_dir: Option<PathBuf>) -> Result<()> {
    let mut app = App::open(data_dir).await?;

    match command {
        TaskCommands::List => crate::status::print_tasks(app.session.snapshot()),
        TaskCommands::Toggle { id } => {
            if let Some(notice) = app.session.toggle_task(id, Utc::now())? {
                print_notification(&notice);
            }
            crate::status::print_tasks(app.session.snapshot());
            app.autosave().await;
        }
    }
    Ok(())
}

pub async fn handle_customize(
    name: Option<String>,
    personality: Option<String>,
    color: Option<BeingColor>,
    data_dir: Option<PathBuf>,
) -> Result<()> {
    if name.is_none() && personality.is_none() && color.is_none() {
        println!("{}", "Nothing to change. Use --name, --personality or --color.".yellow());
        return Ok(());
    }

    let mut app = App::open(data_dir).await?;
    print_notification(&app.session.customize(name, personality, color));
    app.autosave().await;
    Ok(())
}

pub async fn handle_image(prompt: Option<String>, data_dir: Option<PathBuf>) -> Result<()> {
    let mut app = App::open(data_dir).await?;
    let prompt = prompt.unwrap_or_else(|| app.session.snapshot().evolution.form().image_prompt().to_string());

    println!("{}", "Generating image...".cyan());
    let client = ImageClient::new(app.config.get_image_config());
    let image_url = match client.generate_image(&prompt).await {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::warn!(error = %e, "image generation failed");
            None
        }
    };

    print_notification(&app.session.set_image(image_url));
    let snapshot = app.session.snapshot();
    println!("{}: {}", "Image".cyan(), snapshot.being.display_image(&snapshot.evolution.form()));
    app.autosave().await;
    Ok(())
}

pub async fn handle_history(limit: usize, data_dir: Option<PathBuf>) -> Result<()> {
    let app = App::open(data_dir).await?;
    crate::status::print_history(app.session.history_tail(limit));
    Ok(())
}

pub async fn handle_debug_run(data_dir: Option<PathBuf>) -> Result<()> {
    let mut app = App::open(data_dir).await?;
    print_notifications(&app.session.debug_run(Utc::now(), &mut rand::thread_rng()));
    crate::status::print_stats(app.session.snapshot());
    app.autosave().await;
    Ok(())
}

pub async fn handle_save(data_dir: Option<PathBuf>) -> Result<()> {
    let app = App::open(data_dir).await?;
    let notice = app.store.save_with_notice(&app.config.being_id, app.session.snapshot()).await;
    print_notification(&notice);
    Ok(())
}

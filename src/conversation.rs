use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use anyhow::Result;
use chrono::Utc;
use colored::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Mutex};

use crate::ai_provider::AIProviderClient;
use crate::cli::{print_notification, print_notifications, App};
use crate::core::{Action, Sender};
use crate::scheduler::{arm_pending_droppings, schedule_dropping, DecayScheduler, NotificationSender, SharedSession};
use crate::store::StateStore;

pub async fn handle_talk(
    data_dir: Option<PathBuf>,
    provider: Option<String>,
    model: Option<String>,
) -> Result<()> {
    let App { config, store, session } = App::open(data_dir).await?;
    let client = AIProviderClient::new(config.get_ai_config(provider, model)?);
    let being_id = config.being_id.clone();

    let session: SharedSession = Arc::new(Mutex::new(session));
    let (tx, mut rx) = mpsc::unbounded_channel();
    arm_pending_droppings(&session, &tx).await;
    let mut decay = DecayScheduler::start(Arc::clone(&session), config.decay_interval(), tx.clone());

    {
        let guard = session.lock().await;
        let snapshot = guard.snapshot();
        println!("{} {}", snapshot.evolution.form().emoji(), snapshot.being.name.cyan().bold());
        for message in snapshot.conversation.tail(5) {
            match message.sender {
                Sender::User => println!("{} {}", "You:".cyan(), message.text.dimmed()),
                Sender::Being => println!("{} {}", format!("{}:", snapshot.being.name).green(), message.text),
            }
        }
    }
    println!("{}", format!("Replies via {} ({})", client.get_provider(), client.get_model()).dimmed());
    println!("{}", "Type a message to talk. /help lists commands, 'exit' leaves.".yellow());
    println!("{}", "---".dimmed());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{} ", "You:".cyan().bold());
        io::stdout().flush()?;

        tokio::select! {
            Some(notification) = rx.recv() => {
                println!();
                print_notification(&notification);
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let input = line.trim();

                if matches!(input.to_lowercase().as_str(), "exit" | "quit" | "bye") {
                    break;
                }
                if input.is_empty() {
                    continue;
                }

                if let Some(command) = input.strip_prefix('/') {
                    handle_slash_command(command, &session, &store, &being_id, &tx).await?;
                    continue;
                }

                // Lock only around the session updates, never across the request.
                let personality = {
                    let mut guard = session.lock().await;
                    guard.record_user_message(input, Utc::now());
                    guard.snapshot().being.personality.clone()
                };
                let (reply, notice) = client.generate_reply(&personality, input).await;
                let name = {
                    let mut guard = session.lock().await;
                    guard.record_reply(reply.clone());
                    guard.snapshot().being.name.clone()
                };

                println!("{} {}", format!("{}:", name).green().bold(), reply);
                if let Some(notice) = notice {
                    print_notification(&notice);
                }
            }
        }
    }

    decay.stop().await;
    if config.autosave {
        let snapshot = session.lock().await.snapshot().clone();
        print_notification(&store.save_with_notice(&being_id, &snapshot).await);
    }
    println!("{}", "Goodbye! 👋".green());
    Ok(())
}

async fn handle_slash_command(
    command: &str,
    session: &SharedSession,
    store: &StateStore,
    being_id: &str,
    notices: &NotificationSender,
) -> Result<()> {
    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or("");

    match name {
        "feed" | "play" | "sleep" | "clean" => {
            let action: Action = name.parse()?;
            perform(action, session, notices).await;
        }
        "status" => crate::status::print_stats(session.lock().await.snapshot()),
        "tasks" => crate::status::print_tasks(session.lock().await.snapshot()),
        "done" => match parts.next().map(str::parse::<u32>) {
            Some(Ok(id)) => {
                let result = session.lock().await.toggle_task(id, Utc::now());
                match result {
                    Ok(Some(notice)) => print_notification(&notice),
                    Ok(None) => println!("{}", format!("Task {} reopened", id).dimmed()),
                    Err(e) => println!("{}: {}", "Error".red().bold(), e),
                }
            }
            _ => println!("{}", "Usage: /done <task id>".yellow()),
        },
        "save" => {
            let snapshot = session.lock().await.snapshot().clone();
            print_notification(&store.save_with_notice(being_id, &snapshot).await);
        }
        "help" => show_help(),
        _ => println!("{}: /{}", "Unknown command".red().bold(), name),
    }
    Ok(())
}

/// Run an action on the shared session and arm a timer for any dropping it scheduled.
async fn perform(action: Action, session: &SharedSession, notices: &NotificationSender) {
    let now = Utc::now();
    let (notifications, scheduled) = {
        let mut guard = session.lock().await;
        let notifications = guard.perform(action, now, &mut rand::thread_rng());
        let due_at = now + guard.dropping_delay();
        let scheduled = guard
            .snapshot()
            .pending_droppings
            .iter()
            .any(|pending| pending.due_at == due_at);
        (notifications, scheduled.then_some(due_at))
    };

    print_notifications(&notifications);
    if let Some(due_at) = scheduled {
        schedule_dropping(Arc::clone(session), due_at, notices.clone());
    }
}

fn show_help() {
    println!("{}", "Commands".cyan().bold());
    println!("  /feed /play /sleep /clean  take care of the being");
    println!("  /status                    show stats");
    println!("  /tasks                     show the checklist");
    println!("  /done <id>                 toggle a task");
    println!("  /save                      save now");
    println!("  exit                       leave (saves when autosave is on)");
}

use std::path::PathBuf;
use anyhow::Result;
use colored::*;

use crate::cli::App;
use crate::core::stats::STAT_MAX;
use crate::core::{Snapshot, Stat, StatsSnapshot};

pub async fn handle_status(data_dir: Option<PathBuf>) -> Result<()> {
    let app = App::open(data_dir).await?;
    let snapshot = app.session.snapshot();
    let form = snapshot.evolution.form();

    println!("{} {}", form.emoji(), snapshot.being.name.cyan().bold());
    println!("{}", snapshot.being.personality.dimmed());
    println!("Color: {}", snapshot.being.color.display_name());
    println!("Stage: {} ({} sleeps)", snapshot.evolution.stage, snapshot.evolution.sleep_count);
    if let Some(kind) = snapshot.evolution.kind {
        println!("Evolution: {}", kind);
    }
    if snapshot.evolution.is_terminal() {
        println!("Actions since final evolution: {}", snapshot.being.actions_since_final_evolution);
    }
    println!("Image: {}", snapshot.being.display_image(&form));

    print_stats(snapshot);

    if !snapshot.droppings.is_empty() {
        println!("{}", format!("💩 x{}", snapshot.droppings.len()).yellow());
    }
    if let Some(due) = app.session.next_dropping_due() {
        println!("{}", format!("Something is on its way ({})", due.format("%H:%M:%S")).dimmed());
    }

    Ok(())
}

pub fn print_stats(snapshot: &Snapshot) {
    println!("\n{}", "Stats".cyan().bold());
    for stat in Stat::ALL {
        let value = snapshot.being.stat(stat);
        let line = format!("{:<10} {:>4} {}", stat.label(), value, bar(stat, value));
        if value <= 20 {
            println!("{}", line.red());
        } else {
            println!("{}", line);
        }
    }
}

fn bar(stat: Stat, value: i32) -> String {
    // Unbounded stats can exceed the scale; cap the bar, not the number.
    let filled = (value.clamp(0, STAT_MAX) / 10) as usize;
    let suffix = if stat.is_unbounded() && value > STAT_MAX { "+" } else { "" };
    format!("[{}{}]{}", "#".repeat(filled), ".".repeat(10 - filled), suffix)
}

pub fn print_tasks(snapshot: &Snapshot) {
    println!("{}", "Tasks".cyan().bold());
    for task in snapshot.tasks.iter() {
        if task.completed {
            println!("  {} {} {}", "✓".green(), task.id, task.text.dimmed());
        } else {
            println!("  {} {} {}", "·".yellow(), task.id, task.text);
        }
    }
    println!("{}", format!("{}/{} done", snapshot.tasks.completed_count(), snapshot.tasks.len()).dimmed());
}

pub fn print_history(entries: &[StatsSnapshot]) {
    if entries.is_empty() {
        println!("{}", "No history yet".yellow());
        return;
    }

    println!("{}", "Stat History".cyan().bold());
    println!(
        "{:<20} {}",
        "time",
        Stat::ALL.iter().map(|s| format!("{:>9}", s.to_string())).collect::<String>()
    );
    for entry in entries {
        println!(
            "{:<20} {}",
            entry.time.format("%Y-%m-%d %H:%M:%S"),
            Stat::ALL.iter().map(|s| format!("{:>9}", entry.stats.get(*s))).collect::<String>()
        );
    }
}

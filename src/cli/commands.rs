use clap::Subcommand;

use crate::core::BeingColor;

#[derive(Subcommand)]
pub enum Commands {
    /// Show the being's stats, stage and droppings
    Status,
    /// Give the being a meal
    Feed,
    /// Play with the being
    Play,
    /// Put the being to bed
    Sleep,
    /// Clean up droppings
    Clean,
    /// Apply passive decay as if time had passed
    Tick {
        /// Number of decay periods
        #[arg(default_value = "1")]
        periods: u32,
    },
    /// Say something and get a reply
    Chat {
        message: String,
        /// AI provider (ollama, openai)
        #[arg(long)]
        provider: Option<String>,
        /// Model name
        #[arg(long)]
        model: Option<String>,
    },
    /// Manage the task checklist
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Change name, personality or colour
    Customize {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        personality: Option<String>,
        /// primary, accent, blue, green
        #[arg(long)]
        color: Option<BeingColor>,
    },
    /// Generate a new portrait
    Image {
        /// Prompt, defaults to one matching the current form
        #[arg(long)]
        prompt: Option<String>,
    },
    /// Show recent stat history
    History {
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Perform a batch of random actions
    DebugRun,
    /// Save the being now
    Save,
    /// Interactive mode with a live decay timer
    Talk {
        #[arg(long)]
        provider: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// List tasks
    List,
    /// Mark a task done or undone
    Toggle { id: u32 },
}

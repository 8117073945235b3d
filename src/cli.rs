//! Command-line surface. Every command runs against the configured provider.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::models::task::{Difficulty, Recurrence, Task, TaskCreateInput, WeekdayTag};
use crate::models::user::UserProfileUpdate;
use crate::state::AppState;
use crate::storage::{RemoteKvStore, StorageProvider};
use crate::utils::logger::init_logging;

#[derive(Debug, Parser)]
#[command(name = "discipline-baby")]
#[command(about = "Habit tracker with XP, levels and an evolving pet", long_about = None)]
#[command(version)]
pub struct Cli {
    /// YAML config file (overrides $DISCIPLINE_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage provider: local, kv or db (overrides config and env)
    #[arg(long, global = true)]
    pub provider: Option<StorageProvider>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the edge KV API server
    Serve,

    /// List tasks due today (or on --date)
    Today {
        /// Calendar date, YYYY-MM-DD
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// List every task
    Tasks,

    /// Mark a task completed and award its XP
    Complete { id: String },

    /// Clear a task's completion and take its XP back
    Uncomplete { id: String },

    /// Add a custom task
    Add {
        #[arg(long)]
        title: String,

        /// Easy, Medium or Hard
        #[arg(long, default_value = "Medium")]
        difficulty: String,

        #[arg(long)]
        category: Option<String>,

        /// Comma-separated weekdays, e.g. mon,wed,fri
        #[arg(long, value_delimiter = ',')]
        weekly_days: Vec<WeekdayTag>,

        /// Repeat every N weeks from today
        #[arg(long)]
        every_weeks: Option<u32>,
    },

    /// Pause a task so it is never due
    Pause { id: String },

    /// Resume a paused task
    Resume { id: String },

    /// Delete a task
    Delete { id: String },

    /// Show the profile and progression, applying any edits first
    Profile {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        avatar: Option<String>,

        #[arg(long)]
        pet_name: Option<String>,
    },
}

pub async fn run(cli: Cli) -> AppResult<()> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_with(Some(path))?,
        None => AppConfig::load()?,
    };
    if let Some(provider) = cli.provider {
        config.storage.provider = provider;
    }
    init_logging(config.log_dir.as_deref())?;

    if let Command::Serve = cli.command {
        return crate::api::serve(&config).await;
    }

    // Completions against the KV API go through its endpoint so the server
    // owns the read-modify-write.
    if config.storage.provider == StorageProvider::RemoteKv {
        if let Command::Complete { id } | Command::Uncomplete { id } = &cli.command {
            let completed = matches!(cli.command, Command::Complete { .. });
            let store =
                RemoteKvStore::new(&config.storage.kv_base_url, config.storage.request_timeout())?;
            let xp_gained = store.complete_task(id, completed).await?;
            println!("{id}: completed={completed} xp {xp_gained:+}");
            return Ok(());
        }
    }

    let state = AppState::from_config(&config)?;
    execute(&state, cli.command).await
}

async fn execute(state: &AppState, command: Command) -> AppResult<()> {
    match command {
        Command::Serve => Err(AppError::other("serve is handled before state setup")),
        Command::Today { date } => {
            let tasks = state.tasks();
            let date = date.unwrap_or_else(|| tasks.schedule().today());
            let due = tasks.tasks_due_on(date).await?;
            println!("{date}");
            print_tasks(&due);
            Ok(())
        }
        Command::Tasks => {
            print_tasks(&state.tasks().list_tasks().await?);
            Ok(())
        }
        Command::Complete { id } => toggle(state, &id, true).await,
        Command::Uncomplete { id } => toggle(state, &id, false).await,
        Command::Add {
            title,
            difficulty,
            category,
            weekly_days,
            every_weeks,
        } => {
            let input = TaskCreateInput {
                title,
                category,
                difficulty: Some(Difficulty::from(difficulty)),
                due_date: None,
                recurrence: build_recurrence(weekly_days, every_weeks),
                time: None,
            };
            let task = state.tasks().create_task(input).await?;
            print_json(&task)
        }
        Command::Pause { id } => print_json(&state.tasks().pause_task(&id).await?),
        Command::Resume { id } => print_json(&state.tasks().resume_task(&id).await?),
        Command::Delete { id } => {
            state.tasks().delete_task(&id).await?;
            println!("deleted {id}");
            Ok(())
        }
        Command::Profile {
            name,
            avatar,
            pet_name,
        } => {
            let users = state.users();
            let user = if name.is_none() && avatar.is_none() && pet_name.is_none() {
                users.get_user().await?
            } else {
                users
                    .update_profile(UserProfileUpdate {
                        name,
                        avatar,
                        pet_name,
                        ..UserProfileUpdate::default()
                    })
                    .await?
            };
            print_json(&user)
        }
    }
}

async fn toggle(state: &AppState, id: &str, completed: bool) -> AppResult<()> {
    let outcome = state.completion().complete_task(id, completed).await?;
    println!(
        "{id}: completed={completed} xp {:+} -> level {} ({}/{})",
        outcome.xp_applied, outcome.user.level, outcome.user.xp, outcome.user.xp_to_next_level
    );
    if outcome.leveled_up {
        println!("level up! +{} level(s)", outcome.levels_gained);
    }
    if outcome.pet_evolved {
        println!(
            "pet evolved: {} -> {}",
            outcome.previous_pet_style, outcome.user.pet_style
        );
    }
    Ok(())
}

fn build_recurrence(weekly_days: Vec<WeekdayTag>, every_weeks: Option<u32>) -> Option<Recurrence> {
    match (weekly_days.is_empty(), every_weeks) {
        (true, None) => None,
        (true, Some(weeks)) => Some(Recurrence::weekly(weeks)),
        (false, weeks) => Some(Recurrence {
            interval: weeks.unwrap_or(1),
            ..Recurrence::on_days(weekly_days)
        }),
    }
}

fn print_tasks(tasks: &[Task]) {
    for task in tasks {
        let mark = if task.completed { "x" } else { " " };
        let time = task.time.as_deref().unwrap_or("--:--");
        println!(
            "[{mark}] {time} {:<10} {:<6} {} ({})",
            task.id.chars().take(10).collect::<String>(),
            task.difficulty,
            task.title,
            task.status.as_str()
        );
    }
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

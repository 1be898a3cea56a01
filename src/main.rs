use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use eyre::{Context, Result};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tasklist::{
    Backend, Config, EditOutcome, ListRegistry, Persisted, PersistedRegistry, PersistedStore, Priority, Query,
    RecoveryPolicy, StatusFilter, Storage, TaskError, TaskStore, project,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tasklist")]
#[command(about = "TaskList CLI - ordered task lists with priorities, filtering and search")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Directory holding saved state (default: platform data dir)
    #[arg(short, long, env = "TASKLIST_DIR")]
    data_dir: Option<PathBuf>,

    /// Storage backend
    #[arg(long, value_enum, env = "TASKLIST_BACKEND", default_value_t = BackendArg::File)]
    backend: BackendArg,

    /// What to do when saved state cannot be parsed
    #[arg(long, value_enum, env = "TASKLIST_ON_CORRUPT", default_value_t = OnCorrupt::Fail)]
    on_corrupt: OnCorrupt,

    /// Work on list N of the multi-list registry instead of the single task list
    #[arg(short, long, global = true)]
    list: Option<usize>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    File,
    Sqlite,
}

#[derive(Clone, Copy, ValueEnum)]
enum OnCorrupt {
    Fail,
    Reset,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a task
    Add {
        text: Vec<String>,

        #[arg(short, long, default_value = "low")]
        priority: Priority,

        /// Add it already completed
        #[arg(long)]
        done: bool,
    },

    /// Flip a task between completed and incomplete
    Toggle { index: usize },

    /// Delete a task
    Delete {
        index: usize,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Replace a task's text; empty text deletes it
    Edit { index: usize, text: Vec<String> },

    /// Set a task's priority (low, medium, high)
    Priority { index: usize, level: String },

    /// Remove all completed tasks
    ClearCompleted,

    /// Move the task at FROM to just before the task at TO
    Move { from: usize, to: usize },

    /// Show tasks
    Show {
        #[arg(short, long, default_value = "all")]
        filter: StatusFilter,

        /// Case-insensitive text to search for
        #[arg(short, long, default_value = "")]
        search: String,
    },

    /// Manage named lists
    Lists {
        #[command(subcommand)]
        command: ListsCommand,
    },
}

#[derive(Subcommand)]
enum ListsCommand {
    /// Create an empty list
    Add { name: Vec<String> },

    /// Delete a list and all its tasks
    Rm {
        index: usize,

        #[arg(short, long)]
        yes: bool,
    },

    /// Rename a list
    Rename { index: usize, name: Vec<String> },

    /// Show all lists
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config {
        data_dir: cli.data_dir.clone().unwrap_or_else(tasklist::config::default_data_dir),
        backend: match cli.backend {
            BackendArg::File => Backend::File,
            BackendArg::Sqlite => Backend::Sqlite,
        },
        recovery: match cli.on_corrupt {
            OnCorrupt::Fail => RecoveryPolicy::Fail,
            OnCorrupt::Reset => RecoveryPolicy::Reset,
        },
    };

    match &cli.command {
        Commands::Add { text, priority, done } => {
            let text = text.join(" ");
            with_store(&cli, &config, |store| store.add_with(&text, *done, *priority))?;
            println!("Added: {}", text.trim());
        }
        Commands::Toggle { index } => {
            let completed = with_store(&cli, &config, |store| store.toggle_at(*index))?;
            println!("Task {} is now {}", index, if completed { "completed" } else { "incomplete" });
        }
        Commands::Delete { index, yes } => {
            if !yes && !confirm(&format!("Delete task {}?", index))? {
                println!("Cancelled");
                return Ok(());
            }
            let task = with_store(&cli, &config, |store| store.delete_at(*index))?;
            println!("Deleted: {}", task.text);
        }
        Commands::Edit { index, text } => {
            match with_store(&cli, &config, |store| store.edit_at(*index, &text.join(" ")))? {
                EditOutcome::Updated => println!("Task {} updated", index),
                EditOutcome::Deleted(task) => println!("Empty text, deleted: {}", task.text),
            }
        }
        Commands::Priority { index, level } => {
            let priority: Priority = level.parse()?;
            with_store(&cli, &config, |store| store.set_priority_at(*index, priority))?;
            println!("Task {} priority set to {}", index, priority);
        }
        Commands::ClearCompleted => {
            let removed = with_store(&cli, &config, |store| Ok(store.clear_completed()))?;
            println!("Cleared {} completed task(s)", removed);
        }
        Commands::Move { from, to } => {
            with_store(&cli, &config, |store| store.reorder_at(*from, *to))?;
            println!("Moved task {} before task {}", from, to);
        }
        Commands::Show { filter, search } => {
            let store = load_store(&cli, &config)?;
            print_tasks(&store, &Query::new(*filter, search.as_str()));
        }
        Commands::Lists { command } => run_lists(command, &config)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Run a task store operation against the selected list and save the result
fn with_store<R>(
    cli: &Cli,
    config: &Config,
    f: impl FnOnce(&mut TaskStore) -> tasklist::error::Result<R>,
) -> Result<R> {
    let storage = config.open_storage().context("Failed to open storage")?;

    let out = match cli.list {
        None => {
            let mut persisted: PersistedStore<Box<dyn Storage>> = Persisted::open(storage, config.recovery)?;
            persisted.mutate(f)?
        }
        Some(index) => {
            let mut persisted: PersistedRegistry<Box<dyn Storage>> = Persisted::open(storage, config.recovery)?;
            persisted.mutate(|registry| {
                registry.switch_to(index)?;
                f(registry.current_store_mut()?)
            })?
        }
    };
    Ok(out)
}

fn load_store(cli: &Cli, config: &Config) -> Result<TaskStore> {
    let storage = config.open_storage().context("Failed to open storage")?;

    match cli.list {
        None => {
            let persisted: PersistedStore<Box<dyn Storage>> = Persisted::open(storage, config.recovery)?;
            Ok(persisted.into_parts().0)
        }
        Some(index) => {
            let persisted: PersistedRegistry<Box<dyn Storage>> = Persisted::open(storage, config.recovery)?;
            let registry = persisted.state();
            let list = registry.get(index).ok_or(TaskError::IndexOutOfBounds {
                index,
                len: registry.len(),
            })?;
            println!("{}", list.name.bold());
            Ok(list.tasks.clone())
        }
    }
}

fn run_lists(command: &ListsCommand, config: &Config) -> Result<()> {
    let storage = config.open_storage().context("Failed to open storage")?;
    let mut persisted: PersistedRegistry<Box<dyn Storage>> = Persisted::open(storage, config.recovery)?;

    match command {
        ListsCommand::Add { name } => {
            let name = name.join(" ");
            let index = persisted.add_list(&name)?;
            println!("Created list {}: {}", index, name);
        }
        ListsCommand::Rm { index, yes } => {
            if !yes && !confirm(&format!("Delete list {} and all its tasks?", index))? {
                println!("Cancelled");
                return Ok(());
            }
            let list = persisted.delete_list(*index)?;
            println!("Deleted list: {}", list.name);
        }
        ListsCommand::Rename { index, name } => {
            persisted.rename_list(*index, &name.join(" "))?;
            println!("Renamed list {}", index);
        }
        ListsCommand::Show => print_lists(persisted.state()),
    }

    Ok(())
}

fn print_tasks(store: &TaskStore, query: &Query) {
    let view = project(store, query);

    if view.is_empty() {
        println!("{}", "No tasks".dimmed());
    }

    for item in &view {
        let marker = if item.task.completed { "[x]" } else { "[ ]" };
        let text = if item.task.completed {
            item.task.text.dimmed().strikethrough()
        } else {
            item.task.text.normal()
        };
        let priority = match item.task.priority {
            Priority::High => "high".red(),
            Priority::Medium => "medium".yellow(),
            Priority::Low => "low".green(),
        };
        println!("{:>3}. {} {} ({})", item.index, marker, text, priority);
    }

    println!("{} item(s) left", store.remaining());
}

fn print_lists(registry: &ListRegistry) {
    if registry.is_empty() {
        println!("{}", "No lists".dimmed());
        return;
    }

    for (index, list) in registry.lists().iter().enumerate() {
        println!(
            "{:>3}. {} ({} task(s), {} left)",
            index,
            list.name.bold(),
            list.tasks.len(),
            list.tasks.remaining()
        );
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

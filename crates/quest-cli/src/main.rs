// ============================================================================
// quest - command-line front end for the TaskQuest client
// ============================================================================
// Usage:
//   quest login --email E --password P      Start a session
//   quest whoami                            Show the current user
//   quest tasks list [--status STATUS]      List tasks
//   quest tasks toggle ID                   Mark done / reopen
//   quest shop list | shop buy LISTING      Browse and buy
//   quest inventory list | inventory sell ITEM
//   quest achievements [--mine]
// ============================================================================

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use quest_core::{
    AchievementScope, ClientConfig, ProfileUpdate, QuestApp, Task, TaskDraft, TaskEditBuffer,
    TaskPriority, TaskStatus, User,
};
use serde::Serialize;
use tracing::{debug, error};

/// TaskQuest command-line client
#[derive(Parser)]
#[command(name = "quest", version, about = "Manage your TaskQuest tasks, shop and inventory")]
struct Cli {
    /// Backend base URL (default: TASKQUEST_API_URL or http://localhost:8080)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Session database path (default: ~/.taskquest/session.redb)
    #[arg(long, global = true)]
    db_path: Option<String>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TASKQUEST_PASSWORD")]
        password: String,
    },

    /// Create an account and log in
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "TASKQUEST_PASSWORD")]
        password: String,
    },

    /// Forget the current session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Update profile fields
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        avatar: Option<String>,
    },

    /// Task commands
    #[command(subcommand)]
    Tasks(TaskCommands),

    /// Shop commands
    #[command(subcommand)]
    Shop(ShopCommands),

    /// Inventory commands
    #[command(subcommand)]
    Inventory(InventoryCommands),

    /// List achievements
    Achievements {
        /// Only your achievements, with unlock state
        #[arg(long)]
        mine: bool,
    },
}

#[derive(Subcommand)]
enum TaskCommands {
    /// List tasks, newest first
    List {
        /// Filter by status: new, pending, in_progress, waiting_review, done
        #[arg(long)]
        status: Option<String>,
    },
    /// Create a task
    Add {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// optional, low, normal, high, critical
        #[arg(long)]
        priority: Option<String>,
        /// RFC 3339 deadline, e.g. 2026-11-01T09:00:00Z
        #[arg(long)]
        deadline: Option<String>,
        /// Assign to another user id
        #[arg(long)]
        executor: Option<i64>,
    },
    /// Toggle a task between done and new
    Toggle { id: i64 },
    /// Edit a task's fields
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        deadline: Option<String>,
    },
    /// Delete a task
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum ShopCommands {
    /// List offers
    List,
    /// Buy one unit of a listing
    Buy { listing_id: i64 },
}

#[derive(Subcommand)]
enum InventoryCommands {
    /// List owned items
    List,
    /// Sell one unit of an item
    Sell { item_id: i64 },
}

fn parse_status(s: &str) -> Result<TaskStatus> {
    TaskStatus::parse(s).with_context(|| {
        format!(
            "Unknown status '{}'. Valid values: new, pending, in_progress, waiting_review, done",
            s
        )
    })
}

fn parse_priority(s: &str) -> Result<TaskPriority> {
    TaskPriority::parse(s).with_context(|| {
        format!(
            "Unknown priority '{}'. Valid values: optional, low, normal, high, critical",
            s
        )
    })
}

fn format_timestamp(ts: Option<&str>) -> String {
    match ts {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|_| raw.to_string()),
        None => "-".to_string(),
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quest_core=warn".parse()?)
                .add_directive("quest=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    let mut config = ClientConfig::from_env();
    if let Some(url) = &cli.api_url {
        config = config.with_api_url(url);
    }
    if let Some(path) = &cli.db_path {
        config = config.with_db_path(path);
    }
    debug!("Config: {:?}", config);

    let app = QuestApp::open(&config).context("Failed to open session database")?;

    let result = match cli.command {
        Commands::Login { email, password } => cmd_login(&app, &email, &password, cli.json).await,
        Commands::Register {
            name,
            email,
            password,
        } => cmd_register(&app, &name, &email, &password, cli.json).await,
        Commands::Logout => {
            app.logout();
            println!("Logged out.");
            Ok(())
        }
        Commands::Whoami => cmd_whoami(&app, cli.json).await,
        Commands::Profile {
            name,
            email,
            avatar,
        } => {
            let changes = ProfileUpdate {
                name,
                email,
                avatar,
                password: None,
            };
            cmd_profile(&app, &changes, cli.json).await
        }
        Commands::Tasks(command) => cmd_tasks(&app, command, cli.json).await,
        Commands::Shop(command) => cmd_shop(&app, command, cli.json).await,
        Commands::Inventory(command) => cmd_inventory(&app, command, cli.json).await,
        Commands::Achievements { mine } => cmd_achievements(&app, mine, cli.json).await,
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

/// Restore the persisted session or explain how to get one
async fn require_session(app: &QuestApp) -> Result<User> {
    match app.session.restore().await {
        Some(user) => Ok(user),
        None => match app.session.last_error() {
            Some(e) => bail!("Session expired ({}). Run `quest login` again.", e),
            None => bail!("Not logged in. Run `quest login` first."),
        },
    }
}

fn print_user(user: &User) {
    println!("{} <{}>  (id {})", user.name, user.email, user.id);
    println!("  Level {}   XP {}   Coins {}", user.level, user.xp, user.currency);
}

// ============================================================================
// Session commands
// ============================================================================

async fn cmd_login(app: &QuestApp, email: &str, password: &str, json: bool) -> Result<()> {
    let user = app.session.login(email, password).await?;
    if json {
        return print_json(&user);
    }
    println!("Welcome back, {}!", user.name);
    print_user(&user);
    Ok(())
}

async fn cmd_register(app: &QuestApp, name: &str, email: &str, password: &str, json: bool) -> Result<()> {
    let user = app.session.register(name, email, password).await?;
    if json {
        return print_json(&user);
    }
    println!("Account created. Welcome, {}!", user.name);
    print_user(&user);
    Ok(())
}

async fn cmd_whoami(app: &QuestApp, json: bool) -> Result<()> {
    let user = require_session(app).await?;
    if json {
        return print_json(&user);
    }
    print_user(&user);
    Ok(())
}

async fn cmd_profile(app: &QuestApp, changes: &ProfileUpdate, json: bool) -> Result<()> {
    require_session(app).await?;
    let user = app.session.update_profile(changes).await?;
    if json {
        return print_json(&user);
    }
    println!("Profile updated.");
    print_user(&user);
    Ok(())
}

// ============================================================================
// Task commands
// ============================================================================

fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }

    println!(
        "{:<6}  {:<18}  {:<9}  {:<16}  {:>5}  {}",
        "ID", "STATUS", "PRIORITY", "DEADLINE", "XP", "TITLE"
    );
    println!("{}", "-".repeat(90));

    for task in tasks {
        println!(
            "{:<6}  {:<18}  {:<9}  {:<16}  {:>5}  {}",
            task.id,
            task.status.label(),
            task.priority.label(),
            format_timestamp(task.deadline.as_deref()),
            task.reward_xp,
            truncate(&task.title, 40)
        );
    }

    println!("\nTotal: {} tasks", tasks.len());
}

async fn cmd_tasks(app: &QuestApp, command: TaskCommands, json: bool) -> Result<()> {
    require_session(app).await?;
    app.tasks.load().await?;

    match command {
        TaskCommands::List { status } => {
            let tasks = match status.as_deref().map(parse_status).transpose()? {
                Some(status) => app.tasks.by_status(status),
                None => app.tasks.tasks(),
            };
            if json {
                return print_json(&tasks);
            }
            print_tasks(&tasks);
        }
        TaskCommands::Add {
            title,
            description,
            priority,
            deadline,
            executor,
        } => {
            let mut draft = TaskDraft::new(title);
            draft.description = description;
            draft.deadline = deadline;
            draft.executor_id = executor;
            if let Some(p) = priority.as_deref() {
                draft.priority = parse_priority(p)?;
            }
            let task = app.tasks.add(draft).await?;
            if json {
                return print_json(&task);
            }
            println!(
                "Created task {} '{}' (+{} XP, +{} coins)",
                task.id, task.title, task.reward_xp, task.reward_currency
            );
        }
        TaskCommands::Toggle { id } => {
            let task = app.tasks.toggle_status(id).await?;
            if json {
                return print_json(&task);
            }
            println!("Task {} is now {}", task.id, task.status.label());
            if task.status.is_done() {
                if let Ok(user) = app.session.reload_user().await {
                    println!("  Level {}   XP {}   Coins {}", user.level, user.xp, user.currency);
                }
            }
        }
        TaskCommands::Edit {
            id,
            title,
            description,
            priority,
            deadline,
        } => {
            let task = app
                .tasks
                .get(id)
                .with_context(|| format!("Task {} not found", id))?;

            let mut buffer = TaskEditBuffer::new();
            buffer.begin(&task);
            if let Some(title) = title.as_deref() {
                buffer.set_title(title);
            }
            if let Some(description) = description.as_deref() {
                buffer.set_description(description);
            }
            if let Some(p) = priority.as_deref() {
                buffer.set_priority(parse_priority(p)?);
            }
            if deadline.is_some() {
                buffer.set_deadline(deadline);
            }
            if !buffer.is_dirty() {
                bail!("Nothing to change. Pass --title, --description, --priority or --deadline.");
            }

            let edited = buffer.finish().context("Edit buffer was empty")?;
            let saved = app.tasks.update(edited).await?;
            if json {
                return print_json(&saved);
            }
            println!("Updated task {} '{}'", saved.id, saved.title);
        }
        TaskCommands::Delete { id } => {
            app.tasks.delete(id).await?;
            println!("Deleted task {}", id);
        }
    }
    Ok(())
}

// ============================================================================
// Shop / inventory / achievements
// ============================================================================

async fn cmd_shop(app: &QuestApp, command: ShopCommands, json: bool) -> Result<()> {
    match command {
        ShopCommands::List => {
            app.shop.load().await?;
            let offers = app.shop.offers();
            if json {
                return print_json(&offers);
            }
            if offers.is_empty() {
                println!("The shop is empty.");
                return Ok(());
            }
            println!(
                "{:<8}  {:<24}  {:<10}  {:>6}  {:>6}  {}",
                "LISTING", "ITEM", "RARITY", "COST", "STOCK", "EFFECT"
            );
            println!("{}", "-".repeat(80));
            for offer in &offers {
                println!(
                    "{:<8}  {:<24}  {:<10}  {:>6}  {:>6}  x{:.2} XP, x{:.2} coins",
                    offer.listing.id,
                    truncate(&offer.item.name, 24),
                    offer.item.rarity.label(),
                    offer.listing.cost,
                    offer.listing.availability,
                    offer.item.xp_multiplier,
                    offer.item.currency_multiplier
                );
            }
        }
        ShopCommands::Buy { listing_id } => {
            require_session(app).await?;
            app.shop.load().await?;
            app.shop.buy(listing_id).await?;
            let balance = app.session.current_user().map(|u| u.currency);
            match balance {
                Some(coins) => println!("Purchased listing {}. Coins left: {}", listing_id, coins),
                None => println!("Purchased listing {}.", listing_id),
            }
        }
    }
    Ok(())
}

async fn cmd_inventory(app: &QuestApp, command: InventoryCommands, json: bool) -> Result<()> {
    require_session(app).await?;
    app.inventory.load().await?;

    match command {
        InventoryCommands::List => {
            let owned = app.inventory.items();
            if json {
                return print_json(&owned);
            }
            if owned.is_empty() {
                println!("Your inventory is empty.");
                return Ok(());
            }
            println!("{:<6}  {:<24}  {:<10}  {:>6}  {}", "ITEM", "NAME", "RARITY", "AMOUNT", "ACQUIRED");
            println!("{}", "-".repeat(72));
            for o in &owned {
                println!(
                    "{:<6}  {:<24}  {:<10}  {:>6}  {}",
                    o.item.id,
                    truncate(&o.item.name, 24),
                    o.item.rarity.label(),
                    o.entry.amount,
                    format_timestamp(o.entry.acquire_date.as_deref())
                );
            }
            println!("\nTotal: {} units", app.inventory.total_units());
        }
        InventoryCommands::Sell { item_id } => {
            let left = app.inventory.sell(item_id).await?;
            println!("Sold one of item {} ({} left)", item_id, left);
        }
    }
    Ok(())
}

async fn cmd_achievements(app: &QuestApp, mine: bool, json: bool) -> Result<()> {
    let scope = if mine {
        require_session(app).await?;
        AchievementScope::ForCurrentUser
    } else {
        AchievementScope::All
    };
    app.achievements.load(scope).await?;
    let achievements = app.achievements.achievements();

    if json {
        return print_json(&achievements);
    }
    if achievements.is_empty() {
        println!("No achievements yet.");
        return Ok(());
    }
    for a in &achievements {
        let mark = match a.is_achieved {
            Some(true) => "[x]",
            Some(false) => "[ ]",
            None => " - ",
        };
        println!("{} {}  {}", mark, a.name, truncate(&a.description, 50));
    }

    if let Some(user) = app.session.current_user() {
        for p in app.achievements.progress_towards(user.xp).iter().take(3) {
            println!("  next: {} in {} XP", p.achievement.name, p.remaining_xp);
        }
    }
    Ok(())
}

//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{self, Overrides, RuntimeConfig};
use crate::error::Result;
use crate::planner::{Clock, FixedClock, Planner, SystemClock};

/// Output format.
#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text (default)
    #[default]
    Text,
    /// JSON (same as --json)
    Json,
}

pub mod commands;

/// The Operator - daily planner for the 80/20 operator
#[derive(Parser, Debug)]
#[command(name = "op", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Home directory (default: ~/.operator)
    #[arg(long, global = true, env = "OPERATOR_HOME")]
    pub home: Option<PathBuf>,

    /// Backend URL for sign-in (https://... or sqlite:<path>)
    #[arg(long, global = true)]
    pub backend_url: Option<String>,

    /// Anon key for the hosted backend
    #[arg(long, global = true)]
    pub anon_key: Option<String>,

    /// Pin the clock (YYYY-MM-DDTHH:MM, YYYY-MM-DD or HH:MM)
    #[arg(long, global = true, env = "OPERATOR_NOW")]
    pub at: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Output format (text, json)
    #[arg(long, value_enum, global = true, default_value_t)]
    pub format: OutputFormat,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no log output or error messages)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show or set today's commitments
    Today(TodayArgs),

    /// Manage today's tasks
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Manage today's time blocks
    Block {
        #[command(subcommand)]
        command: BlockCommands,
    },

    /// Manage annual and quarterly goals
    Goal {
        #[command(subcommand)]
        command: GoalCommands,
    },

    /// Show or edit the operating code
    Code {
        #[command(subcommand)]
        command: CodeCommands,
    },

    /// Show today's completion by priority tier
    Progress,

    /// Summarize the last seven days
    Week {
        /// Last day of the week (default: today)
        #[arg(long)]
        until: Option<String>,
    },

    /// Watch time blocks and send reminders
    Watch(WatchArgs),

    /// Sign in, sign up or sign out
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },

    /// Subscription and billing
    Subscription {
        #[command(subcommand)]
        command: SubscriptionCommands,
    },

    /// Show planner source and sync status
    Status,

    /// Print version information
    Version,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// Today
// ============================================================================

#[derive(Args, Debug, Default)]
pub struct TodayArgs {
    /// Today's intention
    #[arg(long)]
    pub intention: Option<String>,

    /// What you give up today
    #[arg(long)]
    pub sacrifice: Option<String>,

    /// The comfort you refuse today
    #[arg(long)]
    pub comfort: Option<String>,

    /// End-of-day review
    #[arg(long)]
    pub review: Option<String>,

    /// Mark the day complete
    #[arg(long, conflicts_with = "reopen")]
    pub complete: bool,

    /// Mark the day not complete
    #[arg(long)]
    pub reopen: bool,
}

// ============================================================================
// Task Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Add a task to today
    Add {
        /// Task title
        title: String,

        /// Priority tier (80, 60, 20; also high, medium, low)
        #[arg(short, long, default_value = "80")]
        priority: String,

        /// Time estimate in minutes
        #[arg(short, long)]
        estimate: Option<u32>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,

        /// Notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Toggle a task's completion
    Toggle {
        /// Task ID
        id: String,
    },

    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },

    /// List today's tasks
    List,
}

// ============================================================================
// Block Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum BlockCommands {
    /// List today's blocks with their progress
    List,

    /// Add a block
    Add {
        /// Start time (HH:MM)
        start: String,

        /// End time (HH:MM)
        end: String,

        /// Label
        label: String,

        /// Priority tier (80, 60, 20)
        #[arg(short, long, default_value = "80")]
        priority: String,
    },

    /// Remove a block
    Remove {
        /// Block ID
        id: String,
    },

    /// Show the current block
    Now,

    /// Restore the default schedule for today
    Reset,
}

// ============================================================================
// Goal Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum GoalCommands {
    /// Add a goal
    Add(GoalAddArgs),

    /// List goals
    List {
        /// Filter by type (annual, quarterly)
        #[arg(short = 't', long = "type")]
        goal_type: Option<String>,

        /// Filter by quarter (1-4 or Q1-Q4)
        #[arg(long)]
        quarter: Option<String>,
    },

    /// Update a goal
    Update(GoalUpdateArgs),

    /// Delete a goal
    Delete {
        /// Goal ID
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct GoalAddArgs {
    /// Goal name
    pub name: String,

    /// Goal type (annual, quarterly)
    #[arg(short = 't', long = "type", default_value = "annual")]
    pub goal_type: String,

    /// Quarter for quarterly goals (1-4 or Q1-Q4)
    #[arg(long)]
    pub quarter: Option<String>,

    /// Why it matters
    #[arg(long)]
    pub why: Option<String>,

    /// How success is measured
    #[arg(long)]
    pub metric: Option<String>,

    /// Deadline
    #[arg(long)]
    pub deadline: Option<String>,

    /// Initial progress (0-100)
    #[arg(long)]
    pub progress: Option<u8>,
}

#[derive(Args, Debug)]
pub struct GoalUpdateArgs {
    /// Goal ID
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub why: Option<String>,

    #[arg(long)]
    pub metric: Option<String>,

    #[arg(long)]
    pub deadline: Option<String>,

    /// Progress (0-100)
    #[arg(long)]
    pub progress: Option<u8>,

    /// Goal type (annual, quarterly)
    #[arg(short = 't', long = "type")]
    pub goal_type: Option<String>,

    /// Quarter (1-4 or Q1-Q4)
    #[arg(long, conflicts_with = "clear_quarter")]
    pub quarter: Option<String>,

    /// Remove the quarter
    #[arg(long)]
    pub clear_quarter: bool,
}

// ============================================================================
// Operating Code Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum CodeCommands {
    /// Show the operating code
    Show,

    /// Set the standing daily commitments
    Set {
        #[arg(long)]
        sacrifice: Option<String>,

        #[arg(long)]
        commitment: Option<String>,

        #[arg(long)]
        comfort: Option<String>,
    },

    /// Append a principle
    AddPrinciple {
        /// Principle text
        text: String,
    },

    /// Remove a principle by its 1-based position
    RemovePrinciple {
        /// Position as shown by `op code show`
        index: usize,
    },
}

// ============================================================================
// Watch
// ============================================================================

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Seconds between checks (default from config, 60)
    #[arg(long)]
    pub interval: Option<u64>,

    /// Run one check and exit
    #[arg(long)]
    pub once: bool,

    /// Do not ring the terminal bell
    #[arg(long)]
    pub no_bell: bool,
}

// ============================================================================
// Auth Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Sign in with email and password
    SignIn {
        /// Account email
        email: String,

        /// Password
        #[arg(long, env = "OPERATOR_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account
    SignUp {
        /// Account email
        email: String,

        /// Password (at least 6 characters)
        #[arg(long, env = "OPERATOR_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign out (the planner becomes local again)
    SignOut,

    /// Show the signed-in account
    Whoami,
}

// ============================================================================
// Subscription Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum SubscriptionCommands {
    /// Show the current subscription
    Status,

    /// Cancel at the end of the billing period
    Cancel,

    /// Start a paid plan (returns the payment client secret)
    Setup {
        /// Plan (pro, business)
        #[arg(long, default_value = "pro")]
        plan: String,
    },

    /// Activate a plan after payment details were collected
    Activate {
        /// Customer ID returned by `setup`
        customer_id: String,

        /// Plan (pro, business)
        #[arg(long, default_value = "pro")]
        plan: String,
    },
}

// ============================================================================
// Shared context
// ============================================================================

/// Resolved configuration and clock shared by command handlers.
pub struct Context {
    pub config: RuntimeConfig,
    pub clock: Arc<dyn Clock>,
}

impl Context {
    /// Resolve home, settings and clock from the parsed flags.
    ///
    /// # Errors
    ///
    /// Returns an error for an unusable home, settings file or `--at`.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let home = config::resolve_home(cli.home.as_deref())?;
        let overrides = Overrides {
            backend_url: cli.backend_url.clone(),
            anon_key: cli.anon_key.clone(),
        };
        let clock: Arc<dyn Clock> = match cli.at.as_deref() {
            Some(at) => Arc::new(FixedClock::parse(at)?),
            None => Arc::new(SystemClock),
        };
        Ok(Self {
            config: RuntimeConfig::load(&home, &overrides)?,
            clock,
        })
    }

    /// Open the planner for the current authentication state.
    ///
    /// # Errors
    ///
    /// Returns an error if the signed-in backend cannot be opened.
    pub fn planner(&self) -> Result<Planner> {
        Planner::open(&self.config, Arc::clone(&self.clock))
    }
}

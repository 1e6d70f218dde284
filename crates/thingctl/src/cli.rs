//! Clap derive structures for the `thingctl` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use thingctl_core::NameMode;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// thingctl -- select, group and batch-control smart-home devices
#[derive(Debug, Parser)]
#[command(
    name = "thingctl",
    version,
    about = "Select, group and batch-control smart-home devices",
    long_about = "Query a device inventory with composable filters, keep named\n\
        collections of devices, and apply one action to many devices at once\n\
        with a per-device report.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// JSON inventory file (device source and action target)
    #[arg(long, short = 'i', env = "THINGCTL_INVENTORY", global = true)]
    pub inventory: Option<PathBuf>,

    /// Directory holding saved collections
    #[arg(long, env = "THINGCTL_COLLECTIONS_DIR", global = true)]
    pub collections_dir: Option<PathBuf>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "THINGCTL_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect and query the device inventory
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Manage named device collections
    #[command(alias = "col", alias = "c")]
    Collections(CollectionsArgs),

    /// Apply one action to many devices
    #[command(alias = "b")]
    Batch(BatchArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Filter Arguments ──────────────────────────────────────────

/// Device selection flags. Flags combine with AND unless `--any` is set.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Default, Args)]
pub struct FilterArgs {
    /// Match on device label
    #[arg(long)]
    pub name: Option<String>,

    /// How --name matches: exact, contains, starts_with, regex
    #[arg(long, default_value = "contains")]
    pub name_mode: NameMode,

    /// Make --name, --room and --type case-sensitive
    #[arg(long)]
    pub case_sensitive: bool,

    /// Room name (exact match)
    #[arg(long)]
    pub room: Option<String>,

    /// Only online devices
    #[arg(long, conflicts_with = "offline")]
    pub online: bool,

    /// Only offline devices
    #[arg(long)]
    pub offline: bool,

    /// Battery level strictly below this percentage
    #[arg(long, value_name = "PERCENT")]
    pub battery_below: Option<f64>,

    /// Battery level strictly above this percentage
    #[arg(long, value_name = "PERCENT")]
    pub battery_above: Option<f64>,

    /// Device must report this capability (repeatable)
    #[arg(long = "capability", value_name = "NAME")]
    pub capabilities: Vec<String>,

    /// Declared device type
    #[arg(long = "type", value_name = "TYPE")]
    pub device_type: Option<String>,

    /// Combine the flags with OR instead of AND
    #[arg(long)]
    pub any: bool,

    /// Filter expression as JSON, e.g. '{"not": [{"online": true}]}'
    #[arg(long = "where", value_name = "JSON")]
    pub where_expr: Option<String>,

    /// Read a JSON filter expression from a file
    #[arg(long, value_name = "PATH", conflicts_with = "where_expr")]
    pub filter_file: Option<PathBuf>,
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List every device in the inventory
    #[command(alias = "ls")]
    List,

    /// List devices matching the filter flags
    #[command(alias = "q")]
    Query {
        #[command(flatten)]
        filter: FilterArgs,

        /// Show every device with the deciding match / mismatch reason
        #[arg(long)]
        explain: bool,
    },

    /// Online/offline, per-type, per-room and battery overview
    Summary {
        #[command(flatten)]
        filter: FilterArgs,
    },
}

// ── Collections ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CollectionsArgs {
    #[command(subcommand)]
    pub command: CollectionsCommand,
}

#[derive(Debug, Subcommand)]
pub enum CollectionsCommand {
    /// List saved collections
    #[command(alias = "ls")]
    List,

    /// Show one collection
    Show {
        name: String,

        /// Resolve ids against the inventory and show live devices
        #[arg(long)]
        resolve: bool,
    },

    /// Create a collection from explicit device ids
    Create {
        name: String,

        /// Initial device ids
        ids: Vec<String>,
    },

    /// Capture the current query result under a name (create or replace)
    Save {
        /// Collection name
        #[arg(value_name = "NAME")]
        collection: String,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Add device ids to a collection
    Add {
        name: String,

        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Remove device ids from a collection
    #[command(alias = "rm")]
    Remove {
        name: String,

        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Append the members of SOURCE to TARGET
    Merge { target: String, source: String },

    /// Delete a collection
    Delete { name: String },
}

// ── Batch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct BatchArgs {
    #[command(subcommand)]
    pub command: BatchCommand,
}

#[derive(Debug, Subcommand)]
pub enum BatchCommand {
    /// Switch devices on
    On(TargetArgs),

    /// Switch devices off
    Off(TargetArgs),

    /// Set dimmer level (0-100)
    Level {
        /// Level in percent
        #[arg(allow_negative_numbers = true)]
        percent: i32,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Ask devices to refresh their state
    Refresh(TargetArgs),

    /// Remove devices from the platform
    Delete(TargetArgs),
}

/// Batch target selection: a saved collection or filter flags.
#[derive(Debug, Args)]
pub struct TargetArgs {
    /// Run against a saved collection
    #[arg(long, short = 'c')]
    pub collection: Option<String>,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Log commands instead of applying them
    #[arg(long)]
    pub dry_run: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create the config file (prompts when flags are omitted)
    Init {
        /// Inventory file to record
        #[arg(long, value_name = "PATH")]
        set_inventory: Option<PathBuf>,

        /// Collections directory to record
        #[arg(long, value_name = "PATH")]
        set_collections_dir: Option<PathBuf>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

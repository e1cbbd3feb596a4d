use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "td", about = concat!("taskdeck v", env!("CARGO_PKG_VERSION"), " - tasks, categories, progress"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Root directory of the document store
    #[arg(long = "store-dir", global = true, value_name = "DIR")]
    pub store_dir: Option<PathBuf>,

    /// Signed-in user (overrides the config file)
    #[arg(long, global = true, value_name = "ID")]
    pub user: Option<String>,

    /// More log output on stderr (repeatable)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the visible task list (current filter and sort)
    List,
    /// Add a task
    Add(AddArgs),
    /// Change fields of a task
    Edit(EditArgs),
    /// Delete a task
    Delete(DeleteArgs),
    /// Set which categories and progress tags are shown
    Filter(FilterArgs),
    /// Order the visible task list
    Sort(SortArgs),
    /// List the available sort kinds
    Sorts,
    /// Manage categories
    Category(TaxonomyCmd),
    /// Manage progress tags
    Progress(TaxonomyCmd),
}

// ---------------------------------------------------------------------------
// Task args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Task name
    pub name: String,
    /// Category key
    #[arg(short, long)]
    pub category: String,
    /// Progress tag key
    #[arg(short, long)]
    pub progress: String,
    /// Due date (YYYY-MM-DD, default: today)
    #[arg(long)]
    pub due: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID
    pub id: u64,
    /// New name
    #[arg(long)]
    pub name: Option<String>,
    /// New category key
    #[arg(short, long)]
    pub category: Option<String>,
    /// New progress tag key
    #[arg(short, long)]
    pub progress: Option<String>,
    /// New due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Task ID
    pub id: u64,
}

// ---------------------------------------------------------------------------
// View args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct FilterArgs {
    /// Category to show (repeatable)
    #[arg(short, long = "category")]
    pub categories: Vec<String>,
    /// Progress tag to show (repeatable)
    #[arg(short, long = "progress")]
    pub progress: Vec<String>,
    /// Select every category and progress tag
    #[arg(long, conflicts_with_all = ["categories", "progress"])]
    pub all: bool,
}

#[derive(Args)]
pub struct SortArgs {
    /// Sort kind: none, date, filter (category), progress
    pub kind: String,
    /// Reverse the order
    #[arg(long)]
    pub descending: bool,
}

// ---------------------------------------------------------------------------
// Taxonomy args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct TaxonomyCmd {
    #[command(subcommand)]
    pub action: Option<TaxonomyAction>,
}

#[derive(Subcommand)]
pub enum TaxonomyAction {
    /// List entries in display order
    List,
    /// Add an entry at the end
    Add(EntryAddArgs),
    /// Delete an entry
    Delete(EntryNameArg),
    /// Rename (or recolor) an entry
    Rename(EntryRenameArgs),
    /// Move an entry one step up
    Up(EntryNameArg),
    /// Move an entry one step down
    Down(EntryNameArg),
}

#[derive(Args)]
pub struct EntryNameArg {
    /// Entry name
    pub name: String,
}

#[derive(Args)]
pub struct EntryAddArgs {
    /// Entry name
    pub name: String,
    /// Color as #rrggbb (progress tags only)
    #[arg(long)]
    pub color: Option<String>,
}

#[derive(Args)]
pub struct EntryRenameArgs {
    /// Current name
    pub from: String,
    /// New name (repeat the current name to only recolor)
    pub to: String,
    /// New color as #rrggbb (progress tags only)
    #[arg(long)]
    pub color: Option<String>,
}

use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::documents::UserId;
use crate::io::fs_store::FsStore;
use crate::io::sync::RemoteSync;
use crate::model::config::AppConfig;
use crate::model::task::{Task, parse_due_date};
use crate::model::taxonomy::EntryKind;
use crate::model::view::SortKind;
use crate::ops::board::Board;
use crate::telemetry;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Load config, bootstrap the board, run one command, then wait for the
/// writes it scheduled.
pub async fn dispatch(cli: Cli) -> CmdResult {
    let config_path = cli.config.clone().unwrap_or_else(config_io::config_path);
    let config = config_io::read_config(&config_path)?;
    telemetry::init(cli.verbose, &config.log.level);

    let sync = open_sync(&cli, &config)?;
    let mut board = Board::bootstrap(sync).await;
    let json = cli.json;

    // No subcommand → list
    let result = match cli.command.unwrap_or(Commands::List) {
        Commands::List => print_view(&board, &board.view(), json),
        Commands::Add(args) => cmd_add(&mut board, args, json),
        Commands::Edit(args) => cmd_edit(&mut board, args, json),
        Commands::Delete(args) => {
            let view = board.delete_task(args.id);
            print_view(&board, &view, json)
        }
        Commands::Filter(args) => cmd_filter(&mut board, args, json),
        Commands::Sort(args) => cmd_sort(&mut board, args, json),
        Commands::Sorts => cmd_sorts(&board, json),
        Commands::Category(args) => cmd_taxonomy(&mut board, EntryKind::Category, args, json),
        Commands::Progress(args) => cmd_taxonomy(&mut board, EntryKind::Progress, args, json),
    };

    board.sync().flush().await;
    result
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Resolve the store root and user; flags win over config.toml.
fn open_sync(cli: &Cli, config: &AppConfig) -> Result<RemoteSync, Box<dyn std::error::Error>> {
    let root: PathBuf = cli
        .store_dir
        .clone()
        .or_else(|| config.store.dir.clone())
        .unwrap_or_else(config_io::data_dir);
    let user = match cli.user.as_deref().or(config.session.user.as_deref()) {
        Some(id) => Some(UserId::new(id)?),
        None => {
            tracing::warn!("no user signed in; changes will not be saved");
            None
        }
    };
    tracing::debug!(store = %root.display(), user = ?user.as_ref().map(UserId::as_str), "opening store");
    Ok(RemoteSync::new(Arc::new(FsStore::new(root)), user))
}

fn parse_due(input: Option<&str>) -> Result<Option<chrono::NaiveDate>, String> {
    input
        .map(|s| {
            parse_due_date(s).ok_or_else(|| format!("invalid due date '{}' (expected YYYY-MM-DD)", s))
        })
        .transpose()
}

fn print_view(board: &Board, tasks: &[Task], json: bool) -> CmdResult {
    if json {
        let output = view_to_json(tasks, board.sort());
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for line in format_view(tasks) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn print_entries(board: &Board, kind: EntryKind, json: bool) -> CmdResult {
    let entries = match kind {
        EntryKind::Category => board.categories().list(),
        EntryKind::Progress => board.progress().list(),
    };
    if json {
        let output = EntryListJson { kind, entries };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for line in format_entries(kind, &entries) {
            println!("{}", line);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Task commands
// ---------------------------------------------------------------------------

fn cmd_add(board: &mut Board, args: AddArgs, json: bool) -> CmdResult {
    let due = parse_due(args.due.as_deref())?;
    let view = board.add_task(&args.name, &args.category, &args.progress, due)?;
    print_view(board, &view, json)
}

fn cmd_edit(board: &mut Board, args: EditArgs, json: bool) -> CmdResult {
    let due = parse_due(args.due.as_deref())?;
    let current = board
        .task(args.id)
        .cloned()
        .ok_or_else(|| format!("task not found: {}", args.id))?;
    let name = args.name.unwrap_or(current.name);
    let category = args.category.unwrap_or(current.category);
    let progress = args.progress.unwrap_or(current.progress);
    let due = due.or(Some(current.due));
    let view = board.edit_task(&name, &category, args.id, &progress, due)?;
    print_view(board, &view, json)
}

// ---------------------------------------------------------------------------
// View commands
// ---------------------------------------------------------------------------

fn cmd_filter(board: &mut Board, args: FilterArgs, json: bool) -> CmdResult {
    let (categories, progress) = if args.all {
        (
            board.categories().keys().map(str::to_string).collect(),
            board.progress().keys().map(str::to_string).collect(),
        )
    } else {
        (args.categories, args.progress)
    };
    let view = board.filter_tasks(categories, progress);
    print_view(board, &view, json)
}

fn cmd_sort(board: &mut Board, args: SortArgs, json: bool) -> CmdResult {
    let kind = SortKind::parse(&args.kind);
    if let SortKind::Unrecognized(raw) = &kind {
        return Err(format!(
            "unknown sort kind '{}' (expected: none, date, filter, progress)",
            raw
        )
        .into());
    }
    let view = board.sort_tasks_by(kind, !args.descending);
    print_view(board, &view, json)
}

fn cmd_sorts(board: &Board, json: bool) -> CmdResult {
    if json {
        let output = sort_options_to_json(board.sort());
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for line in format_sort_options(board.sort()) {
            println!("{}", line);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Taxonomy commands
// ---------------------------------------------------------------------------

fn cmd_taxonomy(board: &mut Board, kind: EntryKind, args: TaxonomyCmd, json: bool) -> CmdResult {
    match args.action {
        None | Some(TaxonomyAction::List) => {}
        Some(TaxonomyAction::Add(a)) => {
            board.add_taxonomy_entry(&a.name, kind, a.color.as_deref())?;
        }
        Some(TaxonomyAction::Delete(a)) => {
            board.delete_taxonomy_entry(&a.name, kind)?;
        }
        Some(TaxonomyAction::Rename(a)) => {
            board.edit_taxonomy_entry(&a.from, &a.to, kind, a.color.as_deref())?;
        }
        Some(TaxonomyAction::Up(a)) => {
            board.reorder_taxonomy_entry(&a.name, kind, true)?;
        }
        Some(TaxonomyAction::Down(a)) => {
            board.reorder_taxonomy_entry(&a.name, kind, false)?;
        }
    }
    print_entries(board, kind, json)
}

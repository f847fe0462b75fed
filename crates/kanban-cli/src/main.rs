#![forbid(unsafe_code)]

mod backend;
mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use kanban_core::config::resolve_config;
use output::{CliError, OutputMode, render_error};
use std::env;
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "kb: a six-column kanban ticket board",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format: pretty, text or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Talk to a running `kb serve` instead of the local tickets file.
    /// `--server=URL` names it; bare `--server` uses `server` from the user
    /// config, then the project's listen address.
    #[arg(long, global = true, value_name = "URL", num_args = 0..=1, require_equals = true)]
    server: Option<Option<String>>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Initialize a kanban project",
        long_about = "Create .kanban/ with a default config and an empty tickets file.",
        after_help = "EXAMPLES:\n    # Initialize a project in the current directory\n    kb init\n\n    # Rewrite the config, keeping tickets\n    kb init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Serve the tickets over HTTP",
        long_about = "Expose the local tickets file as a JSON HTTP service for `kb --server`.",
        after_help = "EXAMPLES:\n    # Serve on the configured address\n    kb serve\n\n    # Pick the address\n    kb serve --listen 0.0.0.0:8080"
    )]
    Serve(cmd::serve::ServeArgs),

    #[command(
        next_help_heading = "Tickets",
        about = "Create a ticket",
        long_about = "Create a ticket at the top of the ToDo column.",
        after_help = "EXAMPLES:\n    kb create -t \"Fix login timeout\" -d \"Session expires after 30s\"\n\n    # With priority and assignee\n    kb create -t \"Release notes\" -d \"v2\" -p high -a Alice"
    )]
    Create(cmd::create::CreateArgs),

    #[command(
        next_help_heading = "Read",
        about = "List tickets page by page",
        long_about = "List tickets in stored order, one page at a time.",
        after_help = "EXAMPLES:\n    kb list\n\n    kb list --page 2 --limit 20 --json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show one ticket",
        long_about = "Show a ticket with its comments and history.",
        after_help = "EXAMPLES:\n    kb show 3\n\n    kb show 3 --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show the board",
        long_about = "Show all six columns, with optional filters, search and per-column sort.",
        after_help = "EXAMPLES:\n    kb board\n\n    # High-priority tickets nobody owns\n    kb board --priority high --assignee unassigned\n\n    # Newest first in Done only\n    kb board --sort done=created-desc"
    )]
    Board(cmd::board::BoardArgs),

    #[command(
        next_help_heading = "Tickets",
        about = "Move a ticket",
        long_about = "Move a ticket to another column or to another position in its column.",
        after_help = "EXAMPLES:\n    kb move 3 in-progress\n\n    # Put it at the top of ToDo\n    kb move 3 todo --index 0"
    )]
    Move(cmd::move_cmd::MoveArgs),

    #[command(
        next_help_heading = "Tickets",
        about = "Assign a ticket",
        after_help = "EXAMPLES:\n    kb assign 3 Alice\n\n    kb assign 3 --clear"
    )]
    Assign(cmd::assign::AssignArgs),

    #[command(
        next_help_heading = "Tickets",
        about = "Edit ticket fields",
        after_help = "EXAMPLES:\n    kb edit 3 --title \"Fix login timeout\"\n\n    kb edit 3 --status qa --priority low"
    )]
    Edit(cmd::edit::EditArgs),

    #[command(
        next_help_heading = "Tickets",
        about = "Comment on a ticket",
        after_help = "EXAMPLES:\n    kb comment 3 \"Root cause found\""
    )]
    Comment(cmd::comment::CommentArgs),

    #[command(
        next_help_heading = "Tickets",
        about = "Delete a ticket",
        after_help = "EXAMPLES:\n    kb delete 3"
    )]
    Delete(cmd::delete::DeleteArgs),

    #[command(
        next_help_heading = "Tickets",
        about = "Apply one change to several tickets"
    )]
    Bulk(cmd::bulk::BulkArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Renumber column order",
        long_about = "Renumber every column so positions run 0..n without gaps or duplicates.",
        after_help = "EXAMPLES:\n    kb repair"
    )]
    Repair,

    #[command(
        next_help_heading = "Maintenance",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    kb completions bash > ~/.local/share/bash-completion/completions/kb"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("KANBAN_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "kanban=debug,kb=debug,info"
        } else {
            "warn"
        })
    });

    let format = env::var("KANBAN_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli, cwd: &Path) -> anyhow::Result<()> {
    let project_root = match cli.command {
        Commands::Init(_) => cwd.to_path_buf(),
        _ => backend::find_project_root(cwd).unwrap_or_else(|| cwd.to_path_buf()),
    };
    let effective = resolve_config(&project_root, cli.format.map(OutputMode::as_str), cli.json)?;
    let output = OutputMode::from_resolved(&effective.resolved_output);
    let server = backend::server_url(cli.server.as_ref(), &effective.user, &effective.project);
    debug!(root = %project_root.display(), ?server, output = output.as_str(), "resolved context");

    let ctx = cmd::Context {
        project_root,
        project: effective.project,
        server,
        output,
    };

    match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, output, &ctx.project_root),
        Commands::Serve(args) => cmd::serve::run_serve(args, &ctx),
        Commands::Create(args) => cmd::create::run_create(args, &ctx),
        Commands::List(args) => cmd::list::run_list(args, &ctx),
        Commands::Show(args) => cmd::show::run_show(args, &ctx),
        Commands::Board(args) => cmd::board::run_board(args, &ctx),
        Commands::Move(args) => cmd::move_cmd::run_move(args, &ctx),
        Commands::Assign(args) => cmd::assign::run_assign(args, &ctx),
        Commands::Edit(args) => cmd::edit::run_edit(args, &ctx),
        Commands::Comment(args) => cmd::comment::run_comment(args, &ctx),
        Commands::Delete(args) => cmd::delete::run_delete(args, &ctx),
        Commands::Bulk(args) => cmd::bulk::run_bulk(args, &ctx),
        Commands::Repair => cmd::repair::run_repair(&ctx),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args, &mut command)
        }
    }
}

/// Output mode for errors raised before the config was resolved.
fn fallback_mode(cli: &Cli) -> OutputMode {
    cli.format
        .unwrap_or(if cli.json { OutputMode::Json } else { OutputMode::Text })
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let mode = fallback_mode(&cli);
    let result = env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| run(&cli, &cwd));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if render_error(mode, &CliError::from(&err)).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

use crate::output::{OutputMode, render};
use anyhow::{Context as _, Result};
use clap::Args;
use kanban_core::config::{KANBAN_DIR, ProjectConfig};
use kanban_core::{FileStore, TicketStore};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Rewrite `.kanban/config.toml` even if `.kanban/` already exists.
    /// Existing tickets are kept.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct InitOutput {
    ok: bool,
    config: PathBuf,
    store: PathBuf,
    created_store: bool,
}

/// Execute `kb init`. Creates:
///
/// ```text
/// .kanban/
///   config.toml   (defaults, ready to edit)
///   tickets.tsv   (empty collection with header)
/// ```
///
/// # Errors
///
/// Returns an error if `.kanban/` already exists and `--force` is not set,
/// or if any filesystem operation fails.
pub fn run_init(args: &InitArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let kanban_dir = project_root.join(KANBAN_DIR);
    if kanban_dir.exists() && !args.force {
        anyhow::bail!("{KANBAN_DIR}/ already exists. Use `kb init --force` to rewrite the config.");
    }

    std::fs::create_dir_all(&kanban_dir)
        .with_context(|| format!("Failed to create {}", kanban_dir.display()))?;

    let config = ProjectConfig::default();
    let config_path = kanban_dir.join("config.toml");
    let text = toml::to_string_pretty(&config).context("Failed to encode default config")?;
    std::fs::write(&config_path, text)
        .with_context(|| format!("Failed to write config: {}", config_path.display()))?;

    let store_path = config.store.resolve(project_root);
    let created_store = !store_path.exists();
    if created_store {
        FileStore::new(&store_path).save(&[])?;
    }

    let out = InitOutput {
        ok: true,
        config: config_path,
        store: store_path,
        created_store,
    };
    render(output, &out, |out, w| {
        writeln!(w, "Initialized {KANBAN_DIR}/")?;
        writeln!(w, "  Config:  {}", out.config.display())?;
        writeln!(w, "  Tickets: {}", out.store.display())?;
        writeln!(w)?;
        writeln!(w, "Create your first ticket:")?;
        writeln!(w, "  kb create --title \"My first ticket\" --description \"...\"")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanban_core::config::load_project_config;

    #[test]
    fn fresh_init_creates_config_and_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        run_init(&InitArgs { force: false }, OutputMode::Json, dir.path()).expect("init");

        assert!(dir.path().join(".kanban/config.toml").is_file());
        assert!(dir.path().join(".kanban/tickets.tsv").is_file());
        let config = load_project_config(dir.path()).expect("config parses");
        assert_eq!(config, ProjectConfig::default());
    }

    #[test]
    fn reinit_needs_force_and_keeps_tickets() {
        let dir = tempfile::tempdir().expect("tempdir");
        run_init(&InitArgs { force: false }, OutputMode::Json, dir.path()).expect("init");
        assert!(run_init(&InitArgs { force: false }, OutputMode::Json, dir.path()).is_err());

        let tickets = dir.path().join(".kanban/tickets.tsv");
        std::fs::write(&tickets, "# kanban tickets v1\n").expect("write");
        run_init(&InitArgs { force: true }, OutputMode::Json, dir.path()).expect("force");
        assert_eq!(
            std::fs::read_to_string(&tickets).expect("read"),
            "# kanban tickets v1\n"
        );
    }
}

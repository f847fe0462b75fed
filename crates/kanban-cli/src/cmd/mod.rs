pub mod assign;
pub mod board;
pub mod bulk;
pub mod comment;
pub mod completions;
pub mod create;
pub mod delete;
pub mod edit;
pub mod init;
pub mod list;
pub mod move_cmd;
pub mod repair;
pub mod serve;
pub mod show;

use crate::backend::{self, Client};
use crate::output::OutputMode;
use anyhow::{Result, bail};
use kanban_core::config::ProjectConfig;
use kanban_core::sync::TicketApi;
use std::path::PathBuf;

/// Everything a command needs besides its own arguments.
#[derive(Debug)]
pub struct Context {
    pub project_root: PathBuf,
    pub project: ProjectConfig,
    /// Service URL when `--server` was given.
    pub server: Option<String>,
    pub output: OutputMode,
}

impl Context {
    /// A loaded sync client for mutating commands.
    pub fn client(&self) -> Result<Client> {
        backend::open_client(&self.project_root, &self.project, self.server.as_deref())
    }

    /// The bare service boundary for read-only commands.
    pub fn api(&self) -> Box<dyn TicketApi> {
        backend::open_api(&self.project_root, &self.project, self.server.as_deref())
    }

    /// Fail for commands that only make sense against the local store.
    pub fn require_local(&self, command: &str) -> Result<()> {
        if let Some(url) = &self.server {
            bail!("`kb {command}` works on the local store only; drop --server ({url})");
        }
        Ok(())
    }
}

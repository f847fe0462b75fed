//! Which ticket service a command talks to.
//!
//! Without `--server` the CLI drives a [`LocalApi`] over the project's
//! tickets file. With `--server` it goes through [`HttpApi`] to a running
//! `kb serve`. Either way mutations run through a [`SyncClient`], so the
//! local view is computed with the same rules the service applies.

use anyhow::{Context as _, Result, anyhow};
use kanban_core::config::{KANBAN_DIR, ProjectConfig, UserConfig};
use kanban_core::sync::{LocalApi, Outcome, SyncClient, TicketApi};
use kanban_core::{FileStore, TicketService};
use kanban_http::HttpApi;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Walk up from `start` to the nearest directory holding `.kanban/`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(KANBAN_DIR).is_dir() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Where `--server` points, when given.
///
/// An explicit URL wins, then `server` from the user config, then the
/// project's own listen address.
pub fn server_url(
    flag: Option<&Option<String>>,
    user: &UserConfig,
    project: &ProjectConfig,
) -> Option<String> {
    let explicit = flag?;
    let url = explicit
        .clone()
        .filter(|u| !u.trim().is_empty())
        .or_else(|| user.server.clone())
        .unwrap_or_else(|| format!("http://{}", project.server.listen));
    Some(url)
}

/// The local file-backed service for `project_root`.
pub fn local_service(project_root: &Path, config: &ProjectConfig) -> TicketService<FileStore> {
    let store = FileStore::new(config.store.resolve(project_root));
    TicketService::new(store, config.board.rules()).with_page_limit(config.server.page_limit)
}

pub type Client = SyncClient<Box<dyn TicketApi>>;

/// Build the API for this invocation.
pub fn open_api(
    project_root: &Path,
    project: &ProjectConfig,
    server: Option<&str>,
) -> Box<dyn TicketApi> {
    match server {
        Some(url) => {
            debug!(url, "using remote ticket service");
            Box::new(HttpApi::new(url, project.sync.timeout()))
        }
        None => {
            debug!(root = %project_root.display(), "using local ticket store");
            Box::new(LocalApi::new(local_service(project_root, project)))
        }
    }
}

/// A sync client with the collection already loaded.
///
/// # Errors
///
/// Returns an error when the initial fetch fails.
pub fn open_client(
    project_root: &Path,
    project: &ProjectConfig,
    server: Option<&str>,
) -> Result<Client> {
    let client = SyncClient::new(open_api(project_root, project, server), project.board.rules())
        .with_config(&project.sync);
    client.load().context("failed to load tickets")?;
    Ok(client)
}

/// Unwrap an applied intent or turn the reconciliation error into a failure.
///
/// # Errors
///
/// Returns the service error for a reconciled intent, or a busy error for a
/// rejected one.
pub fn applied<T>(outcome: Outcome<T>) -> Result<T> {
    match outcome {
        Outcome::Applied(value) => Ok(value),
        Outcome::Rejected => Err(anyhow!("another change is still in flight")),
        Outcome::Reconciled { error, .. } => Err(error.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanban_core::KanbanError;

    #[test]
    fn finds_root_from_nested_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join(KANBAN_DIR)).expect("mkdir");
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).expect("mkdir");
        assert_eq!(find_project_root(&nested).as_deref(), Some(dir.path()));
    }

    #[test]
    fn server_flag_resolution() {
        let project = ProjectConfig::default();
        let mut user = UserConfig::default();

        assert_eq!(server_url(None, &user, &project), None);
        assert_eq!(
            server_url(Some(&None), &user, &project).as_deref(),
            Some("http://127.0.0.1:5000")
        );

        user.server = Some("http://board.local:8080".into());
        assert_eq!(
            server_url(Some(&None), &user, &project).as_deref(),
            Some("http://board.local:8080")
        );
        assert_eq!(
            server_url(Some(&Some("http://x:1".into())), &user, &project).as_deref(),
            Some("http://x:1")
        );
    }

    #[test]
    fn reconciled_outcome_keeps_typed_error() {
        let err = applied::<()>(Outcome::Reconciled {
            error: KanbanError::not_found("3"),
            committed: Vec::new(),
        })
        .expect_err("reconciled");
        assert!(matches!(
            err.downcast_ref::<KanbanError>(),
            Some(KanbanError::NotFound { .. })
        ));
        assert!(applied::<()>(Outcome::Rejected).is_err());
        assert_eq!(applied(Outcome::Applied(5)).expect("applied"), 5);
    }
}

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::TicketStore;
use super::codec::{decode_file, encode_file};
use crate::error::{IoOp, KanbanError, Result};
use crate::model::Ticket;

/// Tickets persisted as one tab-separated flat file.
///
/// `save` writes a sibling `.tmp` file and renames it over the target, so a
/// concurrent `load` sees either the old or the new collection in full.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, op: IoOp, source: io::Error) -> KanbanError {
        KanbanError::Io {
            op,
            path: self.path.clone(),
            source,
        }
    }
}

impl TicketStore for FileStore {
    fn load(&self) -> Result<Vec<Ticket>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "tickets file not created yet");
                return Ok(Vec::new());
            }
            Err(err) => return Err(self.io_error(IoOp::Read, err)),
        };

        let tickets = decode_file(&content).map_err(|(line, err)| KanbanError::CorruptStore {
            path: self.path.clone(),
            line,
            reason: err.to_string(),
        })?;
        debug!(path = %self.path.display(), count = tickets.len(), "loaded tickets");
        Ok(tickets)
    }

    fn save(&self, tickets: &[Ticket]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(IoOp::Write, e))?;
        }

        let body = encode_file(tickets).map_err(|e| {
            self.io_error(IoOp::Write, io::Error::new(io::ErrorKind::InvalidData, e))
        })?;

        let tmp_path = self.path.with_extension("tsv.tmp");
        fs::write(&tmp_path, body).map_err(|e| self.io_error(IoOp::Write, e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| self.io_error(IoOp::Write, e))?;
        debug!(path = %self.path.display(), count = tickets.len(), "saved tickets");
        Ok(())
    }
}

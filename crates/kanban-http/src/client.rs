use std::time::Duration;

use kanban_core::model::{MoveRequest, NewTicket, Ticket, TicketPatch};
use kanban_core::page::Page;
use kanban_core::sync::TicketApi;
use kanban_core::{KanbanError, Result};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::wire::{CommentBody, ErrorBody, validation_from};

/// [`TicketApi`] over HTTP.
///
/// `404` becomes `NotFound`, `400` becomes a validation error, and every
/// other failure (transport, timeout, unexpected status) is a network error.
#[derive(Debug, Clone)]
pub struct HttpApi {
    agent: ureq::Agent,
    base: String,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("kanban/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            base: base_url.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn tickets_url(&self) -> String {
        format!("{}/tickets", self.base)
    }

    fn ticket_url(&self, id: &str) -> String {
        format!("{}/tickets/{}", self.base, urlencoding::encode(id))
    }

    fn decode<T: DeserializeOwned>(response: ureq::Response) -> Result<T> {
        response
            .into_json::<T>()
            .map_err(|err| KanbanError::Network(format!("failed to decode response: {err}")))
    }
}

fn map_error(err: ureq::Error, id: Option<&str>) -> KanbanError {
    match err {
        ureq::Error::Status(status, response) => {
            let body: Option<ErrorBody> = response.into_json().ok();
            match (status, body) {
                (404, _) => KanbanError::not_found(id.unwrap_or_default()),
                (400, Some(body)) => validation_from(&body),
                (400, None) => KanbanError::validation("request", "rejected by server"),
                (status, Some(body)) => KanbanError::Network(format!("HTTP {status}: {}", body.error)),
                (status, None) => KanbanError::Network(format!("HTTP {status}")),
            }
        }
        ureq::Error::Transport(transport) => KanbanError::Network(transport.to_string()),
    }
}

impl TicketApi for HttpApi {
    fn list_page(&self, page: usize, limit: usize) -> Result<Page> {
        debug!(page, limit, "GET /tickets");
        let response = self
            .agent
            .get(&self.tickets_url())
            .query("page", &page.to_string())
            .query("limit", &limit.to_string())
            .call()
            .map_err(|err| map_error(err, None))?;
        Self::decode(response)
    }

    fn get(&self, id: &str) -> Result<Ticket> {
        let response = self
            .agent
            .get(&self.ticket_url(id))
            .call()
            .map_err(|err| map_error(err, Some(id)))?;
        Self::decode(response)
    }

    fn create(&self, input: &NewTicket) -> Result<Ticket> {
        let response = self
            .agent
            .post(&self.tickets_url())
            .send_json(input)
            .map_err(|err| map_error(err, None))?;
        Self::decode(response)
    }

    fn update(&self, id: &str, patch: &TicketPatch) -> Result<Ticket> {
        let response = self
            .agent
            .put(&self.ticket_url(id))
            .send_json(patch)
            .map_err(|err| map_error(err, Some(id)))?;
        Self::decode(response)
    }

    fn move_ticket(&self, id: &str, req: &MoveRequest) -> Result<Ticket> {
        let response = self
            .agent
            .post(&format!("{}/move", self.ticket_url(id)))
            .send_json(req)
            .map_err(|err| map_error(err, Some(id)))?;
        Self::decode(response)
    }

    fn add_comment(&self, id: &str, text: &str) -> Result<Ticket> {
        let body = CommentBody {
            text: text.to_string(),
        };
        let response = self
            .agent
            .post(&format!("{}/comments", self.ticket_url(id)))
            .send_json(&body)
            .map_err(|err| map_error(err, Some(id)))?;
        Self::decode(response)
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.agent
            .delete(&self.ticket_url(id))
            .call()
            .map_err(|err| map_error(err, Some(id)))?;
        Ok(())
    }
}

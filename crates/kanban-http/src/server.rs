//! Single-threaded HTTP front end for [`TicketService`].
//!
//! Requests are handled one at a time on the serving thread, which is what
//! serializes the store's read-modify-write cycles.

use std::borrow::Cow;
use std::io::{self, Cursor, Read};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use kanban_core::model::{MoveRequest, NewTicket, TicketPatch};
use kanban_core::{KanbanError, TicketService, TicketStore};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tiny_http::{Header, Method, Request, Response};
use tracing::{debug, info, warn};

use crate::wire::{CommentBody, ErrorBody};

/// How long one `recv` waits before re-checking the shutdown flag.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error("failed to receive request: {0}")]
    Recv(#[from] io::Error),
}

/// A status code plus an optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: Option<serde_json::Value>,
}

impl Reply {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(body) => Self {
                status,
                body: Some(body),
            },
            Err(err) => Self::error_message(500, format!("failed to encode response: {err}")),
        }
    }

    const fn empty(status: u16) -> Self {
        Self { status, body: None }
    }

    fn error(err: &KanbanError) -> Self {
        let status = err.code().http_status();
        if status >= 500 {
            warn!(error = %err, code = %err.code(), "request failed");
        }
        Self::json(status, &ErrorBody::from(err))
    }

    fn error_message(status: u16, message: String) -> Self {
        Self {
            status,
            body: serde_json::to_value(ErrorBody::message(message)).ok(),
        }
    }

    fn into_response(self) -> Response<Cursor<Vec<u8>>> {
        let text = self.body.map(|b| b.to_string()).unwrap_or_default();
        let response = Response::from_string(text).with_status_code(self.status);
        match Header::from_bytes("Content-Type", "application/json") {
            Ok(header) if self.status != 204 => response.with_header(header),
            _ => response,
        }
    }
}

fn ok_or_reply<T: Serialize>(status: u16, result: kanban_core::Result<T>) -> Reply {
    match result {
        Ok(value) => Reply::json(status, &value),
        Err(err) => Reply::error(&err),
    }
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, Reply> {
    serde_json::from_slice(body).map_err(|err| {
        Reply::error(&KanbanError::validation("body", format!("malformed JSON: {err}")))
    })
}

fn decode(raw: &str) -> Result<Cow<'_, str>, Reply> {
    urlencoding::decode(raw)
        .map_err(|err| Reply::error(&KanbanError::validation("id", format!("bad encoding: {err}"))))
}

/// `(page, limit)` from a query string. Absent values are `None`.
fn page_params(query: Option<&str>) -> Result<(Option<usize>, Option<usize>), Reply> {
    let mut page = None;
    let mut limit = None;
    for pair in query.unwrap_or_default().split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let slot = match key {
            "page" => &mut page,
            "limit" => &mut limit,
            _ => continue,
        };
        let field = if key == "page" { "page" } else { "limit" };
        let parsed = value
            .parse::<usize>()
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| {
                Reply::error(&KanbanError::validation(
                    field,
                    format!("'{value}' is not a positive integer"),
                ))
            })?;
        *slot = Some(parsed);
    }
    Ok((page, limit))
}

pub struct Server<S> {
    http: tiny_http::Server,
    service: TicketService<S>,
}

impl<S: TicketStore> Server<S> {
    /// Bind `addr` (`host:port`; port 0 picks a free one).
    ///
    /// # Errors
    ///
    /// [`ServerError::Bind`] when the address cannot be bound.
    pub fn bind(addr: &str, service: TicketService<S>) -> Result<Self, ServerError> {
        let http = tiny_http::Server::http(addr).map_err(|err| ServerError::Bind {
            addr: addr.to_string(),
            reason: err.to_string(),
        })?;
        Ok(Self { http, service })
    }

    /// The bound socket address.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.http.server_addr().to_ip()
    }

    pub const fn service(&self) -> &TicketService<S> {
        &self.service
    }

    /// Serve until `shutdown` is set.
    ///
    /// # Errors
    ///
    /// [`ServerError::Recv`] when the listener fails.
    pub fn serve(&self, shutdown: &AtomicBool) -> Result<(), ServerError> {
        if let Some(addr) = self.local_addr() {
            info!(%addr, "serving tickets");
        }
        while !shutdown.load(Ordering::Acquire) {
            if let Some(request) = self.http.recv_timeout(POLL_INTERVAL)? {
                self.handle(request);
            }
        }
        info!("server stopped");
        Ok(())
    }

    fn handle(&self, mut request: Request) {
        let method = request.method().clone();
        let url = request.url().to_string();
        let mut body = Vec::new();
        let reply = match request.as_reader().read_to_end(&mut body) {
            Ok(_) => self.route(&method, &url, &body),
            Err(err) => Reply::error_message(400, format!("failed to read body: {err}")),
        };
        debug!(%method, %url, status = reply.status, "handled request");
        if let Err(err) = request.respond(reply.into_response()) {
            warn!(%url, error = %err, "failed to send response");
        }
    }

    /// Dispatch one request to the service.
    pub fn route(&self, method: &Method, url: &str, body: &[u8]) -> Reply {
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (url, None),
        };
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let result = match (method, segments.as_slice()) {
            (Method::Get, ["tickets"]) => page_params(query).map(|(page, limit)| {
                ok_or_reply(200, self.service.list(page.unwrap_or(1), limit))
            }),
            (Method::Post, ["tickets"]) => parse_body::<NewTicket>(body)
                .map(|input| ok_or_reply(201, self.service.create(&input))),
            (Method::Get, ["tickets", id]) => {
                decode(id).map(|id| ok_or_reply(200, self.service.get(&id)))
            }
            (Method::Put, ["tickets", id]) => decode(id).and_then(|id| {
                let patch = parse_body::<TicketPatch>(body)?;
                Ok(ok_or_reply(200, self.service.edit(&id, &patch)))
            }),
            (Method::Delete, ["tickets", id]) => decode(id).map(|id| {
                match self.service.delete(&id) {
                    Ok(_) => Reply::empty(204),
                    Err(err) => Reply::error(&err),
                }
            }),
            (Method::Post, ["tickets", id, "move"]) => decode(id).and_then(|id| {
                let req = parse_body::<MoveRequest>(body)?;
                Ok(ok_or_reply(200, self.service.move_ticket(&id, &req)))
            }),
            (Method::Post, ["tickets", id, "comments"]) => decode(id).and_then(|id| {
                let comment = parse_body::<CommentBody>(body)?;
                Ok(ok_or_reply(201, self.service.add_comment(&id, &comment.text)))
            }),
            _ => Err(Reply::error_message(404, format!("no route for {method} {path}"))),
        };
        result.unwrap_or_else(|reply| reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanban_core::MemoryStore;
    use kanban_core::ops::BoardRules;
    use serde_json::json;

    fn server() -> Server<MemoryStore> {
        let service = TicketService::new(MemoryStore::new(), BoardRules::default());
        Server::bind("127.0.0.1:0", service).expect("bind")
    }

    fn post(server: &Server<MemoryStore>, url: &str, body: &serde_json::Value) -> Reply {
        server.route(&Method::Post, url, body.to_string().as_bytes())
    }

    #[test]
    fn create_returns_201_and_get_finds_it() {
        let server = server();
        let reply = post(&server, "/tickets", &json!({"title": "Fix bug", "description": "d"}));
        assert_eq!(reply.status, 201);
        let body = reply.body.expect("body");
        assert_eq!(body["id"], "1");
        assert_eq!(body["status"], "ToDo");

        let got = server.route(&Method::Get, "/tickets/1", b"");
        assert_eq!(got.status, 200);
        assert_eq!(got.body.expect("body")["title"], "Fix bug");
    }

    #[test]
    fn missing_title_is_400_with_code() {
        let server = server();
        let reply = post(&server, "/tickets", &json!({"description": "d"}));
        assert_eq!(reply.status, 400);
        let body = reply.body.expect("body");
        assert_eq!(body["code"], "E2005");
        assert_eq!(body["field"], "title");
    }

    #[test]
    fn malformed_json_is_400() {
        let server = server();
        let reply = server.route(&Method::Post, "/tickets", b"{not json");
        assert_eq!(reply.status, 400);
    }

    #[test]
    fn unknown_ticket_and_route_are_404() {
        let server = server();
        assert_eq!(server.route(&Method::Get, "/tickets/7", b"").status, 404);
        assert_eq!(server.route(&Method::Delete, "/tickets/7", b"").status, 404);
        assert_eq!(server.route(&Method::Get, "/nope", b"").status, 404);
        assert_eq!(server.route(&Method::Patch, "/tickets/1", b"").status, 404);
    }

    #[test]
    fn list_paginates_and_validates_query() {
        let server = server();
        for i in 0..3 {
            post(&server, "/tickets", &json!({"title": format!("t{i}"), "description": "d"}));
        }
        let reply = server.route(&Method::Get, "/tickets?page=2&limit=2", b"");
        assert_eq!(reply.status, 200);
        let body = reply.body.expect("body");
        assert_eq!(body["total"], 3);
        assert_eq!(body["totalPages"], 2);
        assert_eq!(body["page"], 2);
        assert_eq!(body["tickets"].as_array().map(Vec::len), Some(1));

        assert_eq!(server.route(&Method::Get, "/tickets?page=0", b"").status, 400);
        assert_eq!(server.route(&Method::Get, "/tickets?limit=abc", b"").status, 400);
    }

    #[test]
    fn move_comment_update_delete() {
        let server = server();
        post(&server, "/tickets", &json!({"title": "a", "description": "d"}));

        let moved = post(
            &server,
            "/tickets/1/move",
            &json!({"from": "ToDo", "to": "Ready for Review", "fromIndex": 0}),
        );
        assert_eq!(moved.status, 200);
        assert_eq!(moved.body.expect("body")["status"], "Ready for Review");

        let commented = post(&server, "/tickets/1/comments", &json!({"text": "lgtm"}));
        assert_eq!(commented.status, 201);
        assert_eq!(commented.body.expect("body")["comments"][0]["text"], "lgtm");
        assert_eq!(post(&server, "/tickets/1/comments", &json!({})).status, 400);

        let updated = server.route(
            &Method::Put,
            "/tickets/1",
            json!({"priority": "High", "order": 42}).to_string().as_bytes(),
        );
        assert_eq!(updated.status, 200);
        let body = updated.body.expect("body");
        assert_eq!(body["priority"], "High");
        assert_eq!(body["order"], 0);

        let deleted = server.route(&Method::Delete, "/tickets/1", b"");
        assert_eq!(deleted, Reply::empty(204));
    }

    #[test]
    fn percent_encoded_ids_are_decoded() {
        let server = server();
        post(&server, "/tickets", &json!({"title": "a", "description": "d"}));
        assert_eq!(server.route(&Method::Get, "/tickets/%31", b"").status, 200);
    }
}

use crate::error::Result;
use crate::model::{MoveRequest, NewTicket, Ticket, TicketPatch};
use crate::page::Page;
use crate::service::TicketService;
use crate::store::TicketStore;

/// The service boundary as seen by a client.
///
/// Implemented in-process by [`LocalApi`] and over HTTP by the
/// `kanban-http` crate. Calls block until the service answers.
pub trait TicketApi {
    /// # Errors
    ///
    /// Store or transport failures.
    fn list_page(&self, page: usize, limit: usize) -> Result<Page>;

    /// # Errors
    ///
    /// `NotFound`, store or transport failures.
    fn get(&self, id: &str) -> Result<Ticket>;

    /// # Errors
    ///
    /// Validation, store or transport failures.
    fn create(&self, input: &NewTicket) -> Result<Ticket>;

    /// # Errors
    ///
    /// `NotFound`, validation, store or transport failures.
    fn update(&self, id: &str, patch: &TicketPatch) -> Result<Ticket>;

    /// # Errors
    ///
    /// `NotFound`, validation, store or transport failures.
    fn move_ticket(&self, id: &str, req: &MoveRequest) -> Result<Ticket>;

    /// # Errors
    ///
    /// `NotFound`, validation, store or transport failures.
    fn add_comment(&self, id: &str, text: &str) -> Result<Ticket>;

    /// # Errors
    ///
    /// `NotFound`, store or transport failures.
    fn delete(&self, id: &str) -> Result<()>;

    /// Walk every page and return the whole collection.
    ///
    /// # Errors
    ///
    /// The first page fetch that fails.
    fn fetch_all(&self, page_size: usize) -> Result<Vec<Ticket>> {
        let limit = page_size.max(1);
        let mut page = 1;
        let mut out = Vec::new();
        loop {
            let batch = self.list_page(page, limit)?;
            let done = batch.tickets.is_empty() || page >= batch.total_pages;
            out.extend(batch.tickets);
            if done {
                return Ok(out);
            }
            page += 1;
        }
    }
}

impl<A: TicketApi + ?Sized> TicketApi for &A {
    fn list_page(&self, page: usize, limit: usize) -> Result<Page> {
        (**self).list_page(page, limit)
    }

    fn get(&self, id: &str) -> Result<Ticket> {
        (**self).get(id)
    }

    fn create(&self, input: &NewTicket) -> Result<Ticket> {
        (**self).create(input)
    }

    fn update(&self, id: &str, patch: &TicketPatch) -> Result<Ticket> {
        (**self).update(id, patch)
    }

    fn move_ticket(&self, id: &str, req: &MoveRequest) -> Result<Ticket> {
        (**self).move_ticket(id, req)
    }

    fn add_comment(&self, id: &str, text: &str) -> Result<Ticket> {
        (**self).add_comment(id, text)
    }

    fn delete(&self, id: &str) -> Result<()> {
        (**self).delete(id)
    }
}

impl<A: TicketApi + ?Sized> TicketApi for Box<A> {
    fn list_page(&self, page: usize, limit: usize) -> Result<Page> {
        (**self).list_page(page, limit)
    }

    fn get(&self, id: &str) -> Result<Ticket> {
        (**self).get(id)
    }

    fn create(&self, input: &NewTicket) -> Result<Ticket> {
        (**self).create(input)
    }

    fn update(&self, id: &str, patch: &TicketPatch) -> Result<Ticket> {
        (**self).update(id, patch)
    }

    fn move_ticket(&self, id: &str, req: &MoveRequest) -> Result<Ticket> {
        (**self).move_ticket(id, req)
    }

    fn add_comment(&self, id: &str, text: &str) -> Result<Ticket> {
        (**self).add_comment(id, text)
    }

    fn delete(&self, id: &str) -> Result<()> {
        (**self).delete(id)
    }
}

/// In-process boundary: calls a [`TicketService`] directly.
pub struct LocalApi<S> {
    service: TicketService<S>,
}

impl<S: TicketStore> LocalApi<S> {
    pub const fn new(service: TicketService<S>) -> Self {
        Self { service }
    }

    pub const fn service(&self) -> &TicketService<S> {
        &self.service
    }
}

impl<S: TicketStore> TicketApi for LocalApi<S> {
    fn list_page(&self, page: usize, limit: usize) -> Result<Page> {
        self.service.list(page, Some(limit))
    }

    fn get(&self, id: &str) -> Result<Ticket> {
        self.service.get(id)
    }

    fn create(&self, input: &NewTicket) -> Result<Ticket> {
        self.service.create(input)
    }

    fn update(&self, id: &str, patch: &TicketPatch) -> Result<Ticket> {
        self.service.edit(id, patch)
    }

    fn move_ticket(&self, id: &str, req: &MoveRequest) -> Result<Ticket> {
        self.service.move_ticket(id, req)
    }

    fn add_comment(&self, id: &str, text: &str) -> Result<Ticket> {
        self.service.add_comment(id, text)
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.service.delete(id).map(drop)
    }
}

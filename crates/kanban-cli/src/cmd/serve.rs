use crate::backend::local_service;
use crate::cmd::Context;
use anyhow::Result;
use clap::Args;
use kanban_http::Server;
use std::sync::atomic::AtomicBool;
use tracing::info;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on. Defaults to `[server] listen` in the config.
    #[arg(long, short)]
    pub listen: Option<String>,

    /// Default page size for `GET /tickets`.
    #[arg(long)]
    pub page_limit: Option<usize>,
}

/// Execute `kb serve`: expose the local store over HTTP until killed.
///
/// # Errors
///
/// `--server` was given, the address cannot be bound, or the listener fails.
pub fn run_serve(args: &ServeArgs, ctx: &Context) -> Result<()> {
    ctx.require_local("serve")?;
    let listen = args
        .listen
        .clone()
        .unwrap_or_else(|| ctx.project.server.listen.clone());
    let limit = args.page_limit.unwrap_or(ctx.project.server.page_limit);
    let service = local_service(&ctx.project_root, &ctx.project).with_page_limit(limit);

    let server = Server::bind(&listen, service)?;
    if let Some(addr) = server.local_addr() {
        eprintln!("Serving tickets on http://{addr}");
    }
    info!(listen = %listen, limit, "starting server");
    let shutdown = AtomicBool::new(false);
    server.serve(&shutdown)?;
    Ok(())
}

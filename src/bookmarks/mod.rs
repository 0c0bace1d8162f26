//! Bookmark resource
//!
//! Model, body decoding, validation, rendering and the CRUD handlers, plus
//! the wiring that turns configuration into a ready dispatcher.

mod form;
mod handlers;
mod model;
mod render;
mod validate;

pub use form::{is_truthy, split_tags, BookmarkInput, SCREENSHOT_FIELD};
pub use handlers::{BookmarkApp, Services};
pub use model::{Bookmark, BookmarkDraft};
pub use validate::{validate, validate_url};

use crate::config::Config;
use crate::error::{RouteError, SetupError};
use crate::logger;
use crate::routing::{
    handler, with_id, with_name, Dispatcher, LoginResponse, RouteTable, SessionGate, Verb,
};
use crate::store::{FsUploadStore, MemoryBookmarkStore, MemorySessionStore};
use std::sync::Arc;

/// Register the bookmark routes. Order matters: the first match wins, so the
/// literal `/bookmarks/new` has to precede `/bookmarks/{id:int}`.
pub fn register_routes(
    table: &mut RouteTable,
    app: &Arc<BookmarkApp>,
    with_login: bool,
) -> Result<(), RouteError> {
    let a = Arc::clone(app);
    table.get("/", handler(move |req| a.home(req)))?;

    let a = Arc::clone(app);
    table.get("/bookmarks", handler(move |req| a.list(req)))?;

    let a = Arc::clone(app);
    table.register_gated(Verb::Get, "/bookmarks/new", handler(move |req| a.new_form(req)))?;

    let a = Arc::clone(app);
    table.register_gated(Verb::Post, "/bookmarks", handler(move |req| a.create(req)))?;

    let a = Arc::clone(app);
    table.get("/bookmarks/{id:int}", with_id(move |req, id| a.show(req, id)))?;

    let a = Arc::clone(app);
    table.register_gated(
        Verb::Get,
        "/bookmarks/{id:int}/edit",
        with_id(move |req, id| a.edit_form(req, id)),
    )?;

    let a = Arc::clone(app);
    table.register_gated(
        Verb::Put,
        "/bookmarks/{id:int}",
        with_id(move |req, id| a.update(req, id)),
    )?;

    let a = Arc::clone(app);
    table.register_gated(
        Verb::Delete,
        "/bookmarks/{id:int}",
        with_id(move |req, id| a.delete(req, id)),
    )?;

    let a = Arc::clone(app);
    table.get("/uploads/{name:str}", with_name(move |req, name| a.upload(req, name)))?;

    if with_login {
        let a = Arc::clone(app);
        table.get("/login", handler(move |req| a.login_form(req)))?;
        let a = Arc::clone(app);
        table.post("/login", handler(move |req| a.login(req)))?;
        let a = Arc::clone(app);
        table.post("/logout", handler(move |req| a.logout(req)))?;
    }

    Ok(())
}

/// Build the stores named in the configuration and the dispatcher on top
pub fn build_dispatcher(config: &Config) -> Result<Dispatcher, SetupError> {
    let bookmarks = match config.bookmarks.data_file.as_deref().filter(|p| !p.is_empty()) {
        Some(path) => MemoryBookmarkStore::open(path)?,
        None => {
            logger::log_warning(
                "No bookmarks.data_file configured, records are kept in memory only",
            );
            MemoryBookmarkStore::new()
        }
    };
    let services = Services {
        bookmarks: Arc::new(bookmarks),
        sessions: Arc::new(MemorySessionStore::new()),
        uploads: Arc::new(FsUploadStore::new(&config.bookmarks.upload_dir)),
    };
    Ok(dispatcher_with(config, services)?)
}

/// Dispatcher over caller-supplied stores
pub fn dispatcher_with(config: &Config, services: Services) -> Result<Dispatcher, RouteError> {
    let auth = &config.auth;
    let format = config.bookmarks.response_format;
    let method_field = Some(config.method_override.field.trim().to_string());

    let app = Arc::new(
        BookmarkApp::new(services.clone(), format)
            .with_method_field(method_field)
            .with_password(auth.password.clone())
            .with_session_cookie(auth.session_cookie.clone()),
    );

    let mut table = RouteTable::new();
    register_routes(&mut table, &app, auth.enabled)?;
    logger::log_routes(&table);

    let dispatcher = Dispatcher::new(table).with_format(format);
    if !auth.enabled {
        logger::log_warning("Authentication disabled, gated routes are open to everyone");
        return Ok(dispatcher);
    }
    if auth.password.is_empty() {
        logger::log_warning("auth.password is empty, nobody will be able to log in");
    }

    let login = if auth.login_redirect {
        LoginResponse::Redirect("/login".to_string())
    } else {
        LoginResponse::Prompt {
            action: "/login".to_string(),
        }
    };
    Ok(dispatcher.with_gate(SessionGate::new(services.sessions, login)))
}

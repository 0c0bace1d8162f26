//! Bookmark request handlers
//!
//! Handlers are synchronous and talk to the stores directly. Each one returns
//! a complete response or an `AppError` the dispatcher renders.

use super::form::BookmarkInput;
use super::model::Bookmark;
use super::render;
use super::validate::validate;
use crate::config::{AuthConfig, ResponseFormat};
use crate::error::AppError;
use crate::http::{self, form, mime, Request};
use crate::logger;
use crate::routing::HandlerResult;
use crate::store::{BookmarkStore, SessionStore, UploadStore};
use hyper::StatusCode;
use std::sync::Arc;

/// Collaborators the handlers call into
#[derive(Clone)]
pub struct Services {
    pub bookmarks: Arc<dyn BookmarkStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub uploads: Arc<dyn UploadStore>,
}

/// Handler state shared by every route
pub struct BookmarkApp {
    services: Services,
    format: ResponseFormat,
    /// Form field HTML forms use to tunnel PUT and DELETE
    method_field: Option<String>,
    password: String,
    session_cookie: String,
}

impl BookmarkApp {
    pub fn new(services: Services, format: ResponseFormat) -> Self {
        Self {
            services,
            format,
            method_field: None,
            password: String::new(),
            session_cookie: AuthConfig::default().session_cookie,
        }
    }

    #[must_use]
    pub fn with_method_field(mut self, field: Option<String>) -> Self {
        self.method_field = field.filter(|f| !f.is_empty());
        self
    }

    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Cookie the rotated session id is issued under after login
    #[must_use]
    pub fn with_session_cookie(mut self, name: impl Into<String>) -> Self {
        self.session_cookie = name.into();
        self
    }

    pub const fn format(&self) -> ResponseFormat {
        self.format
    }

    pub const fn services(&self) -> &Services {
        &self.services
    }

    fn method_field(&self) -> Option<&str> {
        self.method_field.as_deref()
    }

    pub fn home(&self, _req: &Request) -> HandlerResult {
        Ok(match self.format {
            ResponseFormat::Html => http::build_html_response(StatusCode::OK, render::home_page()),
            ResponseFormat::Json => {
                http::build_text_response(StatusCode::OK, "Welcome to the Bookmark Manager!")
            }
        })
    }

    pub fn list(&self, _req: &Request) -> HandlerResult {
        let bookmarks = self.services.bookmarks.find_all()?;
        Ok(match self.format {
            ResponseFormat::Json => http::build_json_response(StatusCode::OK, &bookmarks),
            ResponseFormat::Html => http::build_html_response(
                StatusCode::OK,
                render::list_page(&bookmarks, self.method_field()),
            ),
        })
    }

    pub fn show(&self, _req: &Request, id: u64) -> HandlerResult {
        let bookmark = self.find(id)?;
        Ok(match self.format {
            ResponseFormat::Json => http::build_json_response(StatusCode::OK, &bookmark),
            ResponseFormat::Html => {
                http::build_html_response(StatusCode::OK, render::show_page(&bookmark))
            }
        })
    }

    pub fn new_form(&self, _req: &Request) -> HandlerResult {
        Ok(http::build_html_response(
            StatusCode::OK,
            render::form_page(None, self.method_field()),
        ))
    }

    pub fn edit_form(&self, _req: &Request, id: u64) -> HandlerResult {
        let bookmark = self.find(id)?;
        Ok(http::build_html_response(
            StatusCode::OK,
            render::form_page(Some(&bookmark), self.method_field()),
        ))
    }

    pub fn create(&self, req: &Request) -> HandlerResult {
        let input = BookmarkInput::from_request(req)?;
        let mut draft = validate(&input)?;

        let uploaded = self.save_screenshot(&input)?;
        draft.screenshot_path.clone_from(&uploaded);

        let id = match self.services.bookmarks.insert(draft.clone()) {
            Ok(id) => id,
            Err(e) => {
                self.discard(uploaded.as_deref());
                return Err(e.into());
            }
        };
        let bookmark = draft.with_id(id);
        logger::log_info(&format!("[Bookmarks] Created #{id} '{}'", bookmark.title));

        let location = format!("/bookmarks/{id}");
        Ok(match self.format {
            ResponseFormat::Json => http::build_201_response(
                &location,
                "application/json",
                serde_json::to_string(&bookmark).unwrap_or_default(),
            ),
            ResponseFormat::Html => http::build_201_response(
                &location,
                "text/html; charset=utf-8",
                render::message_page("Bookmark added successfully", Some(&bookmark)),
            ),
        })
    }

    pub fn update(&self, req: &Request, id: u64) -> HandlerResult {
        let existing = self.find(id)?;
        let input = BookmarkInput::from_request(req)?;
        let mut draft = validate(&input)?;

        let uploaded = self.save_screenshot(&input)?;
        draft.screenshot_path = match &uploaded {
            Some(name) => Some(name.clone()),
            None if input.remove_screenshot => None,
            None => existing.screenshot_path.clone(),
        };

        match self.services.bookmarks.update(id, draft.clone()) {
            Ok(true) => {}
            Ok(false) => {
                // Deleted between the lookup and the write
                self.discard(uploaded.as_deref());
                return Err(AppError::NotFound);
            }
            Err(e) => {
                self.discard(uploaded.as_deref());
                return Err(e.into());
            }
        }

        if existing.screenshot_path != draft.screenshot_path {
            self.discard(existing.screenshot_path.as_deref());
        }
        let bookmark = draft.with_id(id);
        logger::log_info(&format!("[Bookmarks] Updated #{id}"));

        Ok(match self.format {
            ResponseFormat::Json => http::build_json_response(StatusCode::OK, &bookmark),
            ResponseFormat::Html => http::build_html_response(
                StatusCode::OK,
                render::message_page("Bookmark updated successfully", Some(&bookmark)),
            ),
        })
    }

    pub fn delete(&self, _req: &Request, id: u64) -> HandlerResult {
        let existing = self.find(id)?;
        if !self.services.bookmarks.delete(id)? {
            return Err(AppError::NotFound);
        }
        self.discard(existing.screenshot_path.as_deref());
        logger::log_info(&format!("[Bookmarks] Deleted #{id}"));

        Ok(match self.format {
            ResponseFormat::Json => {
                http::build_json_response(StatusCode::OK, &serde_json::json!({ "deleted": id }))
            }
            ResponseFormat::Html => http::build_html_response(
                StatusCode::OK,
                render::message_page("Bookmark deleted successfully", None),
            ),
        })
    }

    pub fn upload(&self, _req: &Request, name: &str) -> HandlerResult {
        let data = self.services.uploads.open(name)?;
        Ok(http::build_file_response(data.into(), mime::content_type_for(name)))
    }

    pub fn login_form(&self, _req: &Request) -> HandlerResult {
        Ok(http::build_login_prompt("/login", None))
    }

    /// Check the password, then authenticate a freshly minted session id.
    /// The id the caller arrived with is cleared, never promoted.
    pub fn login(&self, req: &Request) -> HandlerResult {
        let password = form::parse_body(req.content_type(), &req.body)
            .map_err(|e| AppError::validation(e.to_string()))?
            .and_then(|data| data.get("password").map(ToString::to_string))
            .unwrap_or_default();

        if self.password.is_empty() || password != self.password {
            logger::log_warning(&format!("[Auth] Failed login for session '{}'", req.session_id));
            return Ok(http::build_html_response(
                StatusCode::BAD_REQUEST,
                http::login_form_html("/login", Some("Invalid password")),
            ));
        }

        let fresh = uuid::Uuid::new_v4().to_string();
        self.services.sessions.mark_authenticated(&fresh);
        if !req.session_id.is_empty() {
            self.services.sessions.clear(&req.session_id);
        }
        logger::log_info("[Auth] Session authenticated");
        Ok(http::with_header(
            http::build_redirect_response("/bookmarks"),
            "Set-Cookie",
            &http::session_cookie(&self.session_cookie, &fresh),
        ))
    }

    pub fn logout(&self, req: &Request) -> HandlerResult {
        if !req.session_id.is_empty() {
            self.services.sessions.clear(&req.session_id);
        }
        Ok(http::build_redirect_response("/"))
    }

    fn find(&self, id: u64) -> Result<Bookmark, AppError> {
        self.services
            .bookmarks
            .find_by_id(id)?
            .ok_or(AppError::NotFound)
    }

    fn save_screenshot(&self, input: &BookmarkInput) -> Result<Option<String>, AppError> {
        input
            .screenshot
            .as_ref()
            .map(|file| self.services.uploads.save(&file.filename, &file.data))
            .transpose()
            .map_err(AppError::from)
    }

    /// Best-effort removal; the record change already happened
    fn discard(&self, name: Option<&str>) {
        if let Some(name) = name {
            if let Err(e) = self.services.uploads.remove(name) {
                logger::log_warning(&format!("Failed to remove upload '{name}': {e}"));
            }
        }
    }
}

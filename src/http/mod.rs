//! HTTP protocol layer module
//!
//! Request representation, body decoding and response builders shared by the
//! dispatcher and the bookmark handlers. Nothing here knows about routes.

pub mod form;
pub mod mime;
pub mod request;
pub mod response;

// Re-export commonly used types
pub use form::{FormData, FormError, UploadedFile};
pub use request::{session_cookie, session_from_cookies, Request};
pub use response::{
    build_201_response, build_404_response, build_405_response, build_413_response,
    build_file_response, build_html_response, build_json_response, build_login_prompt,
    build_redirect_response, build_text_response, escape_html, login_form_html, with_header,
};

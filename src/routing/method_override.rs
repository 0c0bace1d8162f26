//! Method override normalization
//!
//! HTML forms can only send GET and POST. A POST may name the verb it stands
//! for in a header or in a form field; the request is rewritten before
//! dispatch so the route table only ever sees the intended verb.

use crate::config::MethodOverrideConfig;
use crate::http::{form, Request};
use crate::logger;
use hyper::Method;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodOverride {
    header: Option<String>,
    field: Option<String>,
}

impl MethodOverride {
    /// Empty names disable the corresponding source
    pub fn from_config(config: &MethodOverrideConfig) -> Self {
        let non_empty = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());
        Self {
            header: non_empty(&config.header),
            field: non_empty(&config.field),
        }
    }

    pub const fn disabled() -> Self {
        Self {
            header: None,
            field: None,
        }
    }

    /// Rewrite `req.method` if it is a POST that asks for another verb
    pub fn apply(&self, req: &mut Request) {
        if req.method != Method::POST {
            return;
        }
        let Some(requested) = self.requested_method(req) else {
            return;
        };
        match Method::from_bytes(requested.to_ascii_uppercase().as_bytes()) {
            Ok(method) => {
                if method != req.method {
                    logger::log_debug(&format!(
                        "[Override] {} {} -> {method}",
                        req.method, req.path
                    ));
                    req.method = method;
                }
            }
            Err(_) => logger::log_warning(&format!(
                "Ignoring invalid method override '{requested}' for {}",
                req.path
            )),
        }
    }

    fn requested_method(&self, req: &Request) -> Option<String> {
        if let Some(header) = &self.header {
            if let Some(value) = req.header(header).map(str::trim).filter(|v| !v.is_empty()) {
                return Some(value.to_string());
            }
        }

        let field = self.field.as_ref()?;
        // A body that fails to decode simply carries no override
        let data = form::parse_body(req.content_type(), &req.body).ok()??;
        data.get(field)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(ToString::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> MethodOverride {
        MethodOverride::from_config(&MethodOverrideConfig::default())
    }

    #[test]
    fn test_form_field_override() {
        let mut req = Request::new(Method::POST, "/bookmarks/3").with_body(
            "application/x-www-form-urlencoded",
            "_method=delete&title=x",
        );
        defaults().apply(&mut req);
        assert_eq!(req.method, Method::DELETE);
    }

    #[test]
    fn test_header_override_wins() {
        let mut req = Request::new(Method::POST, "/bookmarks/3")
            .with_header("x-http-method-override", "PUT")
            .with_body("application/x-www-form-urlencoded", "_method=DELETE");
        defaults().apply(&mut req);
        assert_eq!(req.method, Method::PUT);
    }

    #[test]
    fn test_only_post_is_rewritten() {
        let mut req = Request::new(Method::GET, "/bookmarks")
            .with_header("x-http-method-override", "DELETE");
        defaults().apply(&mut req);
        assert_eq!(req.method, Method::GET);
    }

    #[test]
    fn test_json_body_not_inspected() {
        let mut req = Request::new(Method::POST, "/bookmarks")
            .with_body("application/json", r#"{"_method":"PUT"}"#);
        defaults().apply(&mut req);
        assert_eq!(req.method, Method::POST);
    }

    #[test]
    fn test_disabled_sources() {
        let config = MethodOverrideConfig {
            header: String::new(),
            field: "verb".to_string(),
        };
        let mo = MethodOverride::from_config(&config);

        let mut req = Request::new(Method::POST, "/bookmarks/1")
            .with_header("x-http-method-override", "PUT")
            .with_body("application/x-www-form-urlencoded", "_method=PUT");
        mo.apply(&mut req);
        assert_eq!(req.method, Method::POST);

        let mut req = Request::new(Method::POST, "/bookmarks/1")
            .with_body("application/x-www-form-urlencoded", "verb=put");
        mo.apply(&mut req);
        assert_eq!(req.method, Method::PUT);

        let mut req = Request::new(Method::POST, "/bookmarks/1")
            .with_body("application/x-www-form-urlencoded", "verb=put");
        MethodOverride::disabled().apply(&mut req);
        assert_eq!(req.method, Method::POST);
    }

    #[test]
    fn test_invalid_override_ignored() {
        let mut req = Request::new(Method::POST, "/bookmarks/1")
            .with_body("application/x-www-form-urlencoded", "_method=PU%20T");
        defaults().apply(&mut req);
        assert_eq!(req.method, Method::POST);
    }
}

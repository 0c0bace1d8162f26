//! Bookmark request bodies
//!
//! Create and update accept a JSON object, an urlencoded form or a
//! multipart form. Only multipart can carry a screenshot.

use crate::error::AppError;
use crate::http::{form, Request, UploadedFile};
use serde_json::{Map, Value};

/// Field name of the screenshot file part
pub const SCREENSHOT_FIELD: &str = "screenshot";

/// Raw, unvalidated bookmark fields
#[derive(Debug, Clone, Default)]
pub struct BookmarkInput {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub category_id: Option<String>,
    pub favorite: bool,
    pub is_active: bool,
    pub remove_screenshot: bool,
    pub screenshot: Option<UploadedFile>,
}

impl BookmarkInput {
    pub fn from_request(req: &Request) -> Result<Self, AppError> {
        match form::parse_body(req.content_type(), &req.body) {
            Ok(Some(data)) => Ok(Self::from_form(&data)),
            Ok(None) if req.is_json() || req.content_type().is_none() => Self::from_json(&req.body),
            Ok(None) => Err(AppError::validation(format!(
                "unsupported content type '{}'",
                req.content_type().unwrap_or_default()
            ))),
            Err(e) => Err(AppError::validation(e.to_string())),
        }
    }

    /// Unchecked checkboxes are simply absent from a form
    pub fn from_form(data: &form::FormData) -> Self {
        Self {
            title: data.get("title").map(ToString::to_string),
            url: data.get("url").map(ToString::to_string),
            description: data.get("description").map(ToString::to_string),
            tags: data.get("tags").map(split_tags).unwrap_or_default(),
            category_id: data.get("category_id").map(ToString::to_string),
            favorite: data.get("favorite").is_some_and(is_truthy),
            is_active: data.get("is_active").is_some_and(is_truthy),
            remove_screenshot: data.get("remove_screenshot").is_some_and(is_truthy),
            screenshot: data.file(SCREENSHOT_FIELD).cloned(),
        }
    }

    pub fn from_json(body: &[u8]) -> Result<Self, AppError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| AppError::validation(format!("invalid JSON body: {e}")))?;
        let Value::Object(obj) = value else {
            return Err(AppError::validation("request body must be a JSON object"));
        };

        Ok(Self {
            title: text_field(&obj, "title")?,
            url: text_field(&obj, "url")?,
            description: text_field(&obj, "description")?,
            tags: match obj.get("tags") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::String(s)) => split_tags(s),
                Some(Value::Array(items)) => items
                    .iter()
                    .map(|item| {
                        item.as_str()
                            .map(|s| s.trim().to_string())
                            .ok_or_else(|| AppError::validation("tags must be strings"))
                    })
                    .filter(|tag| tag.as_ref().map_or(true, |t| !t.is_empty()))
                    .collect::<Result<_, _>>()?,
                Some(_) => return Err(AppError::validation("tags must be a string or an array")),
            },
            category_id: match obj.get("category_id") {
                None | Some(Value::Null) => None,
                Some(Value::Number(n)) => Some(n.to_string()),
                Some(Value::String(s)) => Some(s.clone()),
                Some(_) => return Err(AppError::validation("category_id must be numeric")),
            },
            favorite: flag_field(&obj, "favorite", false)?,
            is_active: flag_field(&obj, "is_active", true)?,
            remove_screenshot: flag_field(&obj, "remove_screenshot", false)?,
            screenshot: None,
        })
    }
}

/// `on`, `true`, `1` and `yes` in any case
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "on" | "true" | "1" | "yes"
    )
}

/// Comma separated list with blanks dropped
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn text_field(obj: &Map<String, Value>, name: &str) -> Result<Option<String>, AppError> {
    match obj.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(AppError::validation(format!("{name} must be a string"))),
    }
}

fn flag_field(obj: &Map<String, Value>, name: &str, absent: bool) -> Result<bool, AppError> {
    match obj.get(name) {
        None | Some(Value::Null) => Ok(absent),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::Number(n)) => Ok(n.as_u64() == Some(1)),
        Some(Value::String(s)) => Ok(is_truthy(s)),
        Some(_) => Err(AppError::validation(format!("{name} must be a boolean"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::Method;

    #[test]
    fn test_json_body() {
        let body = r#"{
            "title": "Rust",
            "url": "https://rust-lang.org",
            "tags": ["lang", " systems ", ""],
            "category_id": 3,
            "favorite": "yes"
        }"#;
        let req = Request::new(Method::POST, "/bookmarks").with_body("application/json", body);
        let input = BookmarkInput::from_request(&req).unwrap();
        assert_eq!(input.title.as_deref(), Some("Rust"));
        assert_eq!(input.tags, vec!["lang", "systems"]);
        assert_eq!(input.category_id.as_deref(), Some("3"));
        assert!(input.favorite);
        assert!(input.is_active);
    }

    #[test]
    fn test_json_is_active_explicit_false() {
        let input = BookmarkInput::from_json(br#"{"title":"a","is_active":false}"#).unwrap();
        assert!(!input.is_active);
    }

    #[test]
    fn test_json_rejects_wrong_shapes() {
        assert!(BookmarkInput::from_json(b"[1,2]").is_err());
        assert!(BookmarkInput::from_json(b"not json").is_err());
        assert!(BookmarkInput::from_json(br#"{"title":5}"#).is_err());
        assert!(BookmarkInput::from_json(br#"{"category_id":true}"#).is_err());
        assert!(BookmarkInput::from_json(br#"{"tags":[1]}"#).is_err());
    }

    #[test]
    fn test_urlencoded_body() {
        let req = Request::new(Method::POST, "/bookmarks").with_body(
            "application/x-www-form-urlencoded",
            "title=Docs&url=https%3A%2F%2Fdocs.rs&tags=a%2C+b%2C&favorite=on",
        );
        let input = BookmarkInput::from_request(&req).unwrap();
        assert_eq!(input.url.as_deref(), Some("https://docs.rs"));
        assert_eq!(input.tags, vec!["a", "b"]);
        assert!(input.favorite);
        // Checkbox absent from the form
        assert!(!input.is_active);
        assert!(input.screenshot.is_none());
    }

    #[test]
    fn test_multipart_carries_screenshot() {
        let body = "--XyZ\r\n\
             Content-Disposition: form-data; name=\"title\"\r\n\r\n\
             Shot\r\n\
             --XyZ\r\n\
             Content-Disposition: form-data; name=\"screenshot\"; filename=\"s.png\"\r\n\
             Content-Type: image/png\r\n\r\n\
             PNGDATA\r\n\
             --XyZ--\r\n";
        let req = Request::new(Method::POST, "/bookmarks")
            .with_body("multipart/form-data; boundary=XyZ", body);
        let input = BookmarkInput::from_request(&req).unwrap();
        assert_eq!(input.title.as_deref(), Some("Shot"));
        let file = input.screenshot.unwrap();
        assert_eq!(file.filename, "s.png");
        assert_eq!(&file.data[..], b"PNGDATA");
    }

    #[test]
    fn test_unsupported_content_type() {
        let req = Request::new(Method::POST, "/bookmarks").with_body("text/plain", "title=x");
        assert!(matches!(
            BookmarkInput::from_request(&req),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_truthy_values() {
        for v in ["on", "TRUE", "1", "Yes", " true "] {
            assert!(is_truthy(v), "{v}");
        }
        for v in ["", "off", "0", "no", "false", "y"] {
            assert!(!is_truthy(v), "{v}");
        }
    }
}

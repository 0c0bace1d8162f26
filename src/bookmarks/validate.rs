//! Input validation for create and update

use super::form::BookmarkInput;
use super::model::BookmarkDraft;
use crate::error::AppError;
use url::Url;

/// Check `input` and build a draft. The screenshot is handled by the caller.
pub fn validate(input: &BookmarkInput) -> Result<BookmarkDraft, AppError> {
    let title = required(input.title.as_deref(), "title")?;
    let url = validate_url(&required(input.url.as_deref(), "url")?)?;

    let category_id = match input.category_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<u64>().map_err(|_| {
            AppError::validation(format!("category_id must be numeric, got '{raw}'"))
        })?),
    };

    Ok(BookmarkDraft {
        title,
        url,
        description: input.description.as_deref().unwrap_or_default().trim().to_string(),
        tags: input.tags.clone(),
        category_id,
        favorite: input.favorite,
        is_active: input.is_active,
        screenshot_path: None,
    })
}

fn required(value: Option<&str>, name: &str) -> Result<String, AppError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| AppError::validation(format!("{name} is required")))
}

/// Absolute http(s) URL, returned as given
pub fn validate_url(raw: &str) -> Result<String, AppError> {
    let parsed =
        Url::parse(raw).map_err(|e| AppError::validation(format!("invalid url '{raw}': {e}")))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(raw.to_string()),
        "http" | "https" => Err(AppError::validation(format!("url '{raw}' has no host"))),
        other => Err(AppError::validation(format!(
            "url scheme '{other}' is not allowed, use http or https"
        ))),
    }
}

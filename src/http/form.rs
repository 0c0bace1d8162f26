//! Form body decoding
//!
//! Supports `application/x-www-form-urlencoded` and `multipart/form-data`.
//! Multipart parts are buffered whole; bodies are already size-limited by the
//! connection layer.

use super::request::media_type;
use hyper::body::Bytes;
use thiserror::Error;

/// File part of a multipart body
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Decoded form fields and files, in body order
#[derive(Debug, Clone, Default)]
pub struct FormData {
    fields: Vec<(String, String)>,
    files: Vec<UploadedFile>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("multipart body has no boundary parameter")]
    MissingBoundary,
    #[error("malformed multipart body: {0}")]
    Malformed(&'static str),
}

impl FormData {
    /// First value for `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// File uploaded under `name`; parts without a filename are not files
    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.field == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == name)
    }

    pub fn push_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }
}

/// Decode a body according to its Content-Type.
///
/// Returns `Ok(None)` when the content type is not a form encoding.
pub fn parse_body(content_type: Option<&str>, body: &[u8]) -> Result<Option<FormData>, FormError> {
    let Some(content_type) = content_type else {
        return Ok(None);
    };
    let media = media_type(content_type).to_ascii_lowercase();
    match media.as_str() {
        "application/x-www-form-urlencoded" => Ok(Some(parse_urlencoded(body))),
        "multipart/form-data" => {
            let boundary = boundary(content_type).ok_or(FormError::MissingBoundary)?;
            parse_multipart(body, &boundary).map(Some)
        }
        _ => Ok(None),
    }
}

/// Decode `a=1&b=two+words` style bodies
pub fn parse_urlencoded(body: &[u8]) -> FormData {
    let text = String::from_utf8_lossy(body);
    let mut form = FormData::default();
    for pair in text.split('&').filter(|p| !p.is_empty()) {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        form.push_field(decode_component(name), decode_component(value));
    }
    form
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).map_or(spaced.clone(), std::borrow::Cow::into_owned)
}

/// Extract the boundary parameter from a multipart Content-Type
pub fn boundary(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.trim().split_once('='))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("boundary"))
        .map(|(_, v)| v.trim().trim_matches('"').to_string())
        .filter(|b| !b.is_empty())
}

/// Decode a `multipart/form-data` body
pub fn parse_multipart(body: &[u8], boundary: &str) -> Result<FormData, FormError> {
    let delimiter = format!("--{boundary}").into_bytes();
    let next_delimiter = format!("\r\n--{boundary}").into_bytes();

    let mut pos =
        find(body, &delimiter, 0).ok_or(FormError::Malformed("missing opening boundary"))?;
    let mut form = FormData::default();

    loop {
        pos += delimiter.len();
        let rest = body.get(pos..).ok_or(FormError::Malformed("truncated body"))?;
        if rest.starts_with(b"--") {
            break;
        }
        if !rest.starts_with(b"\r\n") {
            return Err(FormError::Malformed("boundary not followed by CRLF"));
        }
        pos += 2;

        let end = find(body, &next_delimiter, pos)
            .ok_or(FormError::Malformed("missing closing boundary"))?;
        parse_part(&body[pos..end], &mut form)?;
        // Skip the CRLF that belongs to the delimiter
        pos = end + 2;
    }

    Ok(form)
}

fn parse_part(part: &[u8], form: &mut FormData) -> Result<(), FormError> {
    let header_end =
        find(part, b"\r\n\r\n", 0).ok_or(FormError::Malformed("part without header block"))?;
    let headers = String::from_utf8_lossy(&part[..header_end]);
    let data = &part[header_end + 4..];

    let mut name = None;
    let mut filename = None;
    let mut content_type = None;

    for line in headers.split("\r\n") {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if key.trim().eq_ignore_ascii_case("content-disposition") {
            for param in value.split(';').skip(1) {
                if let Some((k, v)) = param.trim().split_once('=') {
                    let v = v.trim().trim_matches('"').to_string();
                    match k.trim() {
                        "name" => name = Some(v),
                        "filename" => filename = Some(v),
                        _ => {}
                    }
                }
            }
        } else if key.trim().eq_ignore_ascii_case("content-type") {
            content_type = Some(value.trim().to_string());
        }
    }

    let name = name.ok_or(FormError::Malformed("part without a name"))?;
    match filename {
        // An empty file input still sends a part with filename=""
        Some(filename) if !filename.is_empty() => form.files.push(UploadedFile {
            field: name,
            filename,
            content_type,
            data: Bytes::copy_from_slice(data),
        }),
        Some(_) => {}
        None => form.push_field(name, String::from_utf8_lossy(data).into_owned()),
    }
    Ok(())
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

// Connection handling module
// Serves one TCP connection and turns each hyper request into a dispatch

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{CONTENT_LENGTH, REFERER, SET_COOKIE, USER_AGENT};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Response, StatusCode};
use hyper_util::rt::TokioIo;

use crate::config::AppState;
use crate::http::{self, session_from_cookies, Request};
use crate::logger::{self, AccessLogEntry};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Accept a connection if a slot is free and serve it in its own task
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
) {
    if !state.try_acquire_connection() {
        logger::log_connection_rejected(
            &peer_addr,
            state.config.performance.max_connections.unwrap_or_default(),
        );
        drop(stream);
        return;
    }

    if state.access_log_enabled() {
        logger::log_connection_accepted(&peer_addr);
    }

    handle_connection(stream, peer_addr, Arc::clone(state));
}

/// Serve HTTP/1.1 on `stream` until the client closes it or the
/// keep-alive timeout bounds the whole connection
fn handle_connection(stream: tokio::net::TcpStream, peer_addr: SocketAddr, state: Arc<AppState>) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let keep_alive_timeout = state.config.performance.keep_alive_timeout;

        let mut builder = http1::Builder::new();
        builder.keep_alive(keep_alive_timeout > 0);

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| handle_request(req, Arc::clone(&service_state), peer_addr)),
        );

        let result = if keep_alive_timeout > 0 {
            tokio::time::timeout(Duration::from_secs(keep_alive_timeout), conn)
                .await
                .map_err(|_| keep_alive_timeout)
        } else {
            Ok(conn.await)
        };
        match result {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(secs) => logger::log_debug(&format!(
                "[Connection] {peer_addr} closed after {secs}s keep-alive limit"
            )),
        }

        state.release_connection();
    });
}

/// One request: size check, body collection, session, method override,
/// dispatch on the blocking pool, then response headers and access log
pub async fn handle_request<B>(
    req: hyper::Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes> + Send,
    B::Error: Into<BoxError>,
{
    let started = Instant::now();
    let (parts, body) = req.into_parts();
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        parts.method.to_string(),
        parts.uri.path().to_string(),
    );
    entry.query = parts.uri.query().map(ToString::to_string);
    entry.http_version = version_label(parts.version).to_string();
    entry.referer = header_string(&parts.headers, REFERER);
    entry.user_agent = header_string(&parts.headers, USER_AGENT);

    let max_body_size = state.config.http.max_body_size;
    let response = if let Some(resp) = check_body_size(&parts.headers, max_body_size) {
        resp
    } else {
        match read_body(body, &state).await {
            Ok(bytes) => {
                let (mut request, fresh_session) =
                    build_request(parts, bytes, &state.config.auth.session_cookie);
                let original = request.method.clone();
                state.method_override.apply(&mut request);
                if request.method != original {
                    entry.original_method = Some(original.to_string());
                    entry.method = request.method.to_string();
                }

                let session_id = request.session_id.clone();
                let resp = dispatch_blocking(&state, request).await;
                finish_response(resp, &state, fresh_session.then_some(session_id.as_str()))
            }
            Err(resp) => resp,
        }
    };

    if state.access_log_enabled() {
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact().map_or(0, |n| {
            usize::try_from(n).unwrap_or(usize::MAX)
        });
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Reject early when Content-Length already exceeds the limit
fn check_body_size(
    headers: &hyper::HeaderMap,
    max_body_size: u64,
) -> Option<Response<Full<Bytes>>> {
    let content_length = headers.get(CONTENT_LENGTH)?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_warning(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

/// Collect the whole body, enforcing the size limit and the read timeout
async fn read_body<B>(body: B, state: &AppState) -> Result<Bytes, Response<Full<Bytes>>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let limit = usize::try_from(state.config.http.max_body_size).unwrap_or(usize::MAX);
    let read_timeout = Duration::from_secs(state.config.performance.read_timeout.max(1));

    match tokio::time::timeout(read_timeout, Limited::new(body, limit).collect()).await {
        Ok(Ok(collected)) => Ok(collected.to_bytes()),
        Ok(Err(e)) if e.is::<http_body_util::LengthLimitError>() => {
            logger::log_warning(&format!("Request body exceeded {limit} bytes"));
            Err(http::build_413_response())
        }
        Ok(Err(e)) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            Err(http::build_text_response(
                StatusCode::BAD_REQUEST,
                "Failed to read request body",
            ))
        }
        Err(_) => {
            logger::log_warning(&format!(
                "Request body not received within {}s",
                read_timeout.as_secs()
            ));
            Err(http::build_text_response(
                StatusCode::REQUEST_TIMEOUT,
                "408 Request Timeout",
            ))
        }
    }
}

/// Owned request for the dispatcher. The flag is true when no session
/// cookie came in and a new id was minted.
fn build_request(
    parts: hyper::http::request::Parts,
    body: Bytes,
    session_cookie: &str,
) -> (Request, bool) {
    let (session_id, fresh) = match session_from_cookies(&parts.headers, session_cookie) {
        Some(id) => (id, false),
        None => (uuid::Uuid::new_v4().to_string(), true),
    };
    let request = Request {
        method: parts.method,
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(ToString::to_string),
        headers: parts.headers,
        body,
        session_id,
    };
    (request, fresh)
}

/// Handlers do synchronous store and file I/O, so they run off the reactor
async fn dispatch_blocking(state: &Arc<AppState>, request: Request) -> Response<Full<Bytes>> {
    let dispatcher = Arc::clone(&state.dispatcher);
    match tokio::task::spawn_blocking(move || dispatcher.dispatch(&request)).await {
        Ok(resp) => resp,
        Err(e) => {
            logger::log_error(&format!("Dispatch task failed: {e}"));
            http::build_text_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "500 Internal Server Error",
            )
        }
    }
}

/// Server header, plus the session cookie for callers that had none.
/// A handler that already issued the session cookie (login) keeps its own.
fn finish_response(
    resp: Response<Full<Bytes>>,
    state: &AppState,
    new_session: Option<&str>,
) -> Response<Full<Bytes>> {
    let resp = http::with_header(resp, "Server", &state.config.http.server_name);
    let cookie_name = &state.config.auth.session_cookie;
    match new_session {
        Some(id) if !sets_cookie(&resp, cookie_name) => http::with_header(
            resp,
            "Set-Cookie",
            &http::session_cookie(cookie_name, id),
        ),
        _ => resp,
    }
}

fn sets_cookie(resp: &Response<Full<Bytes>>, cookie_name: &str) -> bool {
    resp.headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| {
            v.split_once('=')
                .is_some_and(|(name, _)| name.trim() == cookie_name)
        })
}

fn header_string(headers: &hyper::HeaderMap, name: hyper::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

const fn version_label(version: hyper::Version) -> &'static str {
    match version {
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        _ => "1.1",
    }
}

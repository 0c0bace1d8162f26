//! Request dispatch
//!
//! One pass per request, no retries:
//!
//! ```text
//! Start -> MethodChecked --(no routes for method)--> MethodNotAllowed (405)
//!       -> PatternScanning --(nothing matched)-----> NotFound (404)
//!       -> Matched -> ParameterExtraction --(bad)--> BadParameter (400)
//!       -> GateCheck --(gated and denied)----------> Unauthenticated (login prompt or redirect)
//!       -> HandlerInvoked
//! ```

use super::gate::{Gate, GateDecision};
use super::params::Params;
use super::table::{Route, RouteTable};
use crate::config::ResponseFormat;
use crate::error::AppError;
use crate::http::Request;
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Response};

/// Route selected for a request, with coerced parameters
#[derive(Debug)]
pub struct Resolved<'a> {
    pub route: &'a Route,
    pub params: Params,
}

pub struct Dispatcher {
    table: RouteTable,
    gate: Option<Box<dyn Gate>>,
    format: ResponseFormat,
}

impl Dispatcher {
    pub fn new(table: RouteTable) -> Self {
        Self {
            table,
            gate: None,
            format: ResponseFormat::default(),
        }
    }

    #[must_use]
    pub fn with_gate(mut self, gate: impl Gate + 'static) -> Self {
        self.gate = Some(Box::new(gate));
        self
    }

    /// Format used for dispatcher-generated error bodies
    #[must_use]
    pub const fn with_format(mut self, format: ResponseFormat) -> Self {
        self.format = format;
        self
    }

    pub const fn table(&self) -> &RouteTable {
        &self.table
    }

    pub const fn format(&self) -> ResponseFormat {
        self.format
    }

    /// Method check, pattern scan and parameter extraction
    pub fn resolve(&self, method: &Method, path: &str) -> Result<Resolved<'_>, AppError> {
        let routes = self.table.routes_for(method);
        if routes.is_empty() {
            return Err(AppError::MethodNotAllowed {
                method: method.to_string(),
                allow: self.table.allowed_methods(),
            });
        }

        let (route, captures) = routes
            .iter()
            .find_map(|route| route.pattern.matches(path).map(|c| (route, c)))
            .ok_or(AppError::NotFound)?;

        let params = Params::extract(&captures)?;
        Ok(Resolved { route, params })
    }

    /// Run the full state machine and produce the response
    pub fn dispatch(&self, req: &Request) -> Response<Full<Bytes>> {
        let resolved = match self.resolve(&req.method, &req.path) {
            Ok(resolved) => resolved,
            Err(err) => return self.fail(req, err),
        };

        if resolved.route.gated {
            if let Some(gate) = &self.gate {
                if let GateDecision::Deny(login) = gate.check(req) {
                    return self.fail(req, AppError::Unauthenticated(login));
                }
            }
        }

        match resolved.route.handler.call(req, &resolved.params) {
            Ok(response) => response,
            Err(err) => self.fail(req, err),
        }
    }

    fn fail(&self, req: &Request, err: AppError) -> Response<Full<Bytes>> {
        logger::log_dispatch_failure(req.method.as_str(), &req.path, err.status().as_u16(), &err);
        err.into_response(self.format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::build_text_response;
    use crate::routing::gate::{LoginResponse, SessionGate};
    use crate::routing::handler::{handler, with_id, FnHandler};
    use crate::routing::params::Param;
    use crate::routing::{ParamKind, Verb};
    use crate::store::{MemorySessionStore, SessionStore};
    use hyper::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn text(body: &str) -> impl Fn(&Request) -> crate::routing::HandlerResult {
        let body = body.to_string();
        move |_| Ok(build_text_response(StatusCode::OK, &body))
    }

    fn body_of(resp: Response<Full<Bytes>>) -> String {
        use http_body_util::BodyExt;
        let bytes = collect_body(resp.into_body().collect());
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    // Full<Bytes> resolves on first poll, so a throwaway runtime is enough
    fn collect_body<F>(fut: F) -> Bytes
    where
        F: std::future::Future<
            Output = Result<http_body_util::Collected<Bytes>, std::convert::Infallible>,
        >,
    {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(fut)
            .unwrap()
            .to_bytes()
    }

    #[test]
    fn test_unmatched_path_is_404() {
        let mut table = RouteTable::new();
        table.get("/", handler(text("home"))).unwrap();
        table.post("/bookmarks", handler(text("created"))).unwrap();
        let dispatcher = Dispatcher::new(table);

        for (method, path) in [
            (Method::GET, "/nope"),
            (Method::GET, "/bookmarks"),
            (Method::POST, "/"),
            (Method::POST, "/bookmarks/"),
        ] {
            let resp = dispatcher.dispatch(&Request::new(method, path));
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{path}");
            assert_eq!(body_of(resp), "404 Not Found");
        }
    }

    #[test]
    fn test_method_without_routes_is_405() {
        let mut table = RouteTable::new();
        table
            .get(
                "/items/{id:int}",
                with_id(|_, _| Ok(build_text_response(StatusCode::OK, "x"))),
            )
            .unwrap();
        let dispatcher = Dispatcher::new(table);

        for path in ["/items/1", "/", "/anything/else"] {
            let resp = dispatcher.dispatch(&Request::new(Method::PUT, path));
            assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(resp.headers().get("Allow").unwrap(), "GET");
            assert!(body_of(resp).contains("PUT"));
        }

        let resp = dispatcher.dispatch(&Request::new(Method::PATCH, "/items/1"));
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_empty_table_is_405_for_everything() {
        let dispatcher = Dispatcher::new(RouteTable::new());
        let resp = dispatcher.dispatch(&Request::new(Method::GET, "/"));
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_item_scenario() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let mut table = RouteTable::new();
        table
            .get(
                "/items/{id:int}",
                with_id(move |_, id| {
                    recorder.lock().unwrap().push(id);
                    Ok(build_text_response(StatusCode::OK, "item"))
                }),
            )
            .unwrap();
        let dispatcher = Dispatcher::new(table);

        let resp = dispatcher.dispatch(&Request::new(Method::GET, "/items/42"));
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(*seen.lock().unwrap(), vec![42]);

        let resp = dispatcher.dispatch(&Request::new(Method::GET, "/items/abc"));
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(*seen.lock().unwrap(), vec![42]);
    }

    #[test]
    fn test_multiple_captures_in_order() {
        let seen = Arc::new(Mutex::new(Params::default()));
        let recorder = Arc::clone(&seen);
        let mut table = RouteTable::new();
        table
            .get(
                "/users/{user:int}/posts/{post:int}",
                FnHandler::with_params(&[ParamKind::Int, ParamKind::Int], move |_, params| {
                    *recorder.lock().unwrap() = params.clone();
                    Ok(build_text_response(StatusCode::OK, "post"))
                }),
            )
            .unwrap();
        let dispatcher = Dispatcher::new(table);

        let resolved = dispatcher.resolve(&Method::GET, "/users/3/posts/9").unwrap();
        assert_eq!(resolved.params, Params::from(vec![Param::Int(3), Param::Int(9)]));

        dispatcher.dispatch(&Request::new(Method::GET, "/users/3/posts/9"));
        assert_eq!(seen.lock().unwrap().len(), 2);

        let err = dispatcher.resolve(&Method::GET, "/users/3/posts/x").unwrap_err();
        assert!(matches!(err, AppError::BadParameter { ref segment, .. } if segment == "post"));
    }

    #[test]
    fn test_first_registered_match_wins() {
        let mut table = RouteTable::new();
        table.get("/bookmarks/{name:str}", FnHandler::with_params(&[ParamKind::Str], |_, _| {
            Ok(build_text_response(StatusCode::OK, "first"))
        })).unwrap();
        table.get("/bookmarks/new", handler(text("second"))).unwrap();
        table.get("/bookmarks/new", handler(text("third"))).unwrap();
        let dispatcher = Dispatcher::new(table);

        let resp = dispatcher.dispatch(&Request::new(Method::GET, "/bookmarks/new"));
        assert_eq!(body_of(resp), "first");

        let resolved = dispatcher.resolve(&Method::GET, "/bookmarks/new").unwrap();
        assert_eq!(resolved.route.pattern.template(), "/bookmarks/{name:str}");
    }

    #[test]
    fn test_literal_before_capture_when_registered_first() {
        let mut table = RouteTable::new();
        table.get("/bookmarks/new", handler(text("form"))).unwrap();
        table
            .get(
                "/bookmarks/{id:int}",
                with_id(|_, _| Ok(build_text_response(StatusCode::OK, "show"))),
            )
            .unwrap();
        let dispatcher = Dispatcher::new(table);

        let resp = dispatcher.dispatch(&Request::new(Method::GET, "/bookmarks/new"));
        assert_eq!(body_of(resp), "form");
        let resp = dispatcher.dispatch(&Request::new(Method::GET, "/bookmarks/5"));
        assert_eq!(body_of(resp), "show");
    }

    #[test]
    fn test_handler_output_passed_through() {
        let mut table = RouteTable::new();
        table
            .post(
                "/teapot",
                handler(|_| {
                    Ok(build_text_response(
                        StatusCode::IM_A_TEAPOT,
                        "short and stout",
                    ))
                }),
            )
            .unwrap();
        let dispatcher = Dispatcher::new(table);
        let resp = dispatcher.dispatch(&Request::new(Method::POST, "/teapot"));
        assert_eq!(resp.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(body_of(resp), "short and stout");
    }

    #[test]
    fn test_handler_error_becomes_status() {
        let mut table = RouteTable::new();
        table
            .get("/missing", handler(|_| Err(AppError::NotFound)))
            .unwrap()
            .get("/invalid", handler(|_| Err(AppError::validation("title is required"))))
            .unwrap();
        let dispatcher = Dispatcher::new(table).with_format(ResponseFormat::Json);

        let resp = dispatcher.dispatch(&Request::new(Method::GET, "/missing"));
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = dispatcher.dispatch(&Request::new(Method::GET, "/invalid"));
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(body_of(resp).contains("title is required"));
    }

    fn gated_dispatcher() -> (Dispatcher, Arc<MemorySessionStore>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let sessions = Arc::new(MemorySessionStore::new());

        let mut table = RouteTable::new();
        table
            .register_gated(
                Verb::Post,
                "/bookmarks",
                handler(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(build_text_response(StatusCode::CREATED, "created"))
                }),
            )
            .unwrap();
        table.get("/bookmarks", handler(text("list"))).unwrap();

        let gate = SessionGate::new(
            sessions.clone(),
            LoginResponse::Prompt {
                action: "/login".into(),
            },
        );
        (Dispatcher::new(table).with_gate(gate), sessions, calls)
    }

    #[test]
    fn test_gate_blocks_unauthenticated() {
        let (dispatcher, _, calls) = gated_dispatcher();
        let resp =
            dispatcher.dispatch(&Request::new(Method::POST, "/bookmarks").with_session("anon"));
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_of(resp).contains("<form"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_gate_skipped_for_open_routes() {
        let (dispatcher, _, _) = gated_dispatcher();
        let resp =
            dispatcher.dispatch(&Request::new(Method::GET, "/bookmarks").with_session("anon"));
        assert_eq!(body_of(resp), "list");
    }

    #[test]
    fn test_gate_idempotent_once_authenticated() {
        let (dispatcher, sessions, calls) = gated_dispatcher();
        sessions.mark_authenticated("s1");

        for _ in 0..3 {
            let resp =
                dispatcher.dispatch(&Request::new(Method::POST, "/bookmarks").with_session("s1"));
            assert_eq!(resp.status(), StatusCode::CREATED);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        // A different session is still turned away
        let resp =
            dispatcher.dispatch(&Request::new(Method::POST, "/bookmarks").with_session("s2"));
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        sessions.clear("s1");
        dispatcher.dispatch(&Request::new(Method::POST, "/bookmarks").with_session("s1"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_bad_parameter_precedes_gate() {
        let sessions = Arc::new(MemorySessionStore::new());
        let mut table = RouteTable::new();
        table
            .register_gated(
                Verb::Delete,
                "/bookmarks/{id:int}",
                with_id(|_, _| Ok(build_text_response(StatusCode::OK, "deleted"))),
            )
            .unwrap();
        let dispatcher = Dispatcher::new(table)
            .with_gate(SessionGate::new(sessions, LoginResponse::Redirect("/login".into())));

        let resp = dispatcher.dispatch(&Request::new(Method::DELETE, "/bookmarks/x1"));
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        // Well-formed id, no session: the configured redirect, not the prompt
        let resp = dispatcher.dispatch(&Request::new(Method::DELETE, "/bookmarks/1"));
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers().get("Location").unwrap(), "/login");
    }
}

//! Handler abstraction
//!
//! A handler declares the parameter kinds it accepts and is invoked through
//! one uniform call. The route table compares that declaration with the
//! pattern's captures when the route is registered.

use super::params::Params;
use super::pattern::ParamKind;
use crate::error::AppError;
use crate::http::Request;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

pub type HandlerResult = Result<Response<Full<Bytes>>, AppError>;

pub trait Handler: Send + Sync {
    /// Parameter kinds this handler expects, left to right
    fn signature(&self) -> &[ParamKind];

    fn call(&self, req: &Request, params: &Params) -> HandlerResult;
}

type BoxedFn = Box<dyn Fn(&Request, &Params) -> HandlerResult + Send + Sync>;

/// Closure-backed handler
pub struct FnHandler {
    signature: Vec<ParamKind>,
    f: BoxedFn,
}

impl FnHandler {
    /// Handler receiving the raw parameter list with an explicit signature
    pub fn with_params<F>(signature: &[ParamKind], f: F) -> Self
    where
        F: Fn(&Request, &Params) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            signature: signature.to_vec(),
            f: Box::new(f),
        }
    }
}

impl Handler for FnHandler {
    fn signature(&self) -> &[ParamKind] {
        &self.signature
    }

    fn call(&self, req: &Request, params: &Params) -> HandlerResult {
        (self.f)(req, params)
    }
}

impl std::fmt::Debug for FnHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Handler for patterns without captures
pub fn handler<F>(f: F) -> FnHandler
where
    F: Fn(&Request) -> HandlerResult + Send + Sync + 'static,
{
    FnHandler::with_params(&[], move |req, _| f(req))
}

/// Handler for patterns with one integer capture
pub fn with_id<F>(f: F) -> FnHandler
where
    F: Fn(&Request, u64) -> HandlerResult + Send + Sync + 'static,
{
    FnHandler::with_params(&[ParamKind::Int], move |req, params| f(req, params.int(0)?))
}

/// Handler for patterns with one string capture
pub fn with_name<F>(f: F) -> FnHandler
where
    F: Fn(&Request, &str) -> HandlerResult + Send + Sync + 'static,
{
    FnHandler::with_params(&[ParamKind::Str], move |req, params| f(req, params.str(0)?))
}

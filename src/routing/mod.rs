//! Routing module
//!
//! Turns an incoming (method, path) pair into a handler invocation:
//! - Pattern templates with typed captures (`/bookmarks/{id:int}`)
//! - Per-verb route tables matched in registration order
//! - Optional authentication gate on selected routes
//! - Method override for clients limited to GET and POST

mod dispatch;
mod gate;
mod handler;
mod method_override;
mod params;
mod pattern;
mod table;

pub use dispatch::{Dispatcher, Resolved};
pub use gate::{Gate, GateDecision, LoginResponse, SessionGate};
pub use handler::{handler, with_id, with_name, FnHandler, Handler, HandlerResult};
pub use method_override::MethodOverride;
pub use params::{Param, Params};
pub use pattern::{ParamKind, Pattern, RawCapture, Segment};
pub use table::{Route, RouteTable, Verb};

/*!
Backend module

This module talks to the optimization backend over its JSON contract.

Structure:
- `source`: the async `PathBackend` trait and the request error taxonomy.
- `wire`: request bodies and the schema/parse step that turns response JSON into validated entities.
- `http`: `reqwest` implementation of `PathBackend`.
*/

pub mod http;
pub mod source;
pub mod wire;

pub use http::HttpBackend;
pub use source::{BackendResult, PathBackend, RequestError};

//! Server module: host, REST exposure and builder
//!
//! `ServerBuilder` wires the tables and collaborators into a `ProcessHost`,
//! then exposes it over REST:
//! - `POST /processes/{name}` runs a table process
//! - `GET /processes` lists process names and table ids
//! - `GET /health` for liveness checks

pub mod builder;
pub mod exposure;
pub mod host;
pub mod router;

pub use builder::ServerBuilder;
pub use exposure::RestExposure;
pub use host::ProcessHost;
pub use router::{ProcessCall, REQUEST_ID_HEADER};

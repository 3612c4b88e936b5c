//! HTTP content negotiation (RFC 7231 §5.3) and response rendering.
//!
//! A handler describes what it can send as a list of [`Offer`]s. The [`Negotiator`]
//! compares them with the request's `Accept`, `Accept-Language` and `Accept-Charset`
//! headers, picks the best one and renders it:
//!
//! - response headers: `Content-Type`, `Content-Language`, `Vary`
//! - conditional requests: `ETag` / `Last-Modified`, answering `304 Not Modified`
//! - the body, through a format [`Processor`](render::Processor) (JSON, XML, CSV,
//!   text, binary or your own), transcoded to the negotiated charset
//!
//! When nothing is acceptable the configured handler answers `406 Not Acceptable`.
//!
//! # Example
//! ```
//! use http::{Request, StatusCode};
//! use micro_conneg::{BufferedResponse, Negotiator, Offer};
//! use serde_json::json;
//!
//! let negotiator = Negotiator::default();
//! let req = Request::builder()
//!     .header("accept", "application/json, application/xml;q=0")
//!     .body(())
//!     .unwrap();
//!
//! let offers = vec![
//!     Offer::new("application/xml").with(json!({"id": 1}), &[]),
//!     Offer::new("application/json").with(json!({"id": 1}), &[]),
//! ];
//!
//! let mut response = BufferedResponse::new();
//! negotiator.render(&mut response, &req, StatusCode::OK, offers).unwrap();
//!
//! assert_eq!(response.headers()["content-type"], "application/json;charset=utf-8");
//! assert_eq!(response.body_bytes(), b"{\"id\":1}\n");
//! ```

mod conditional;
pub mod data;
mod error;
pub mod header;
pub mod negotiator;
pub mod offer;
pub mod render;
pub mod request;

pub use data::Data;
pub use data::Metadata;
pub use data::Value;
pub use error::BoxError;
pub use error::RenderError;
pub use header::ContentType;
pub use header::MediaRanges;
pub use header::PrecedenceValues;
pub use negotiator::Negotiator;
pub use negotiator::best_match;
pub use offer::Match;
pub use offer::Offer;
pub use request::BufferedResponse;
pub use request::RequestHeaders;
pub use request::ResponseSink;

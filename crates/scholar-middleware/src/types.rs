//! Common types used throughout the middleware pipeline.

use bytes::Bytes;
use http_body_util::Full;

/// The HTTP request type used in the middleware pipeline.
///
/// This is a standard `http::Request` with a `Full<Bytes>` body.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type produced by [`BufferedResponse`](crate::BufferedResponse).
pub type Response = http::Response<Full<Bytes>>;

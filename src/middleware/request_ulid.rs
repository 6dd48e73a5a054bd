//! ULID request ids.

use http::{HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use ulid::Ulid;

/// Produces a fresh [Ulid] for every incoming request, used by
/// [tower_http::request_id::SetRequestIdLayer].
#[derive(Clone, Copy, Debug, Default)]
pub struct MakeRequestUlid;

impl MakeRequestId for MakeRequestUlid {
    fn make_request_id<B>(&mut self, _: &Request<B>) -> Option<RequestId> {
        let ulid = Ulid::new().to_string();
        HeaderValue::from_str(&ulid).ok().map(RequestId::new)
    }
}

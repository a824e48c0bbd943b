//! JSON request client with fixed-delay retry and verbosity-gated logging.

mod client;
mod request;
mod response;
mod retry;
mod transport;

pub use client::{ErrorHook, Failure, RequestClient, RequestOutcome};
pub use request::{HttpRequest, Method, RequestAttempt, build_url};
pub use response::{HttpResponse, ResponseBody};
pub use retry::{DEFAULT_MAX_ATTEMPTS, RETRY_DELAY, TransportFailure, with_retry};
pub use transport::{ReqwestTransport, Transport};

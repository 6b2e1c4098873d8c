//! Classify HTTP status and curl errors into retry kinds.

use crate::retry::policy::RetryKind;
use crate::transport::FetchError;

pub fn classify_http_status(code: u32) -> RetryKind {
    match code {
        429 | 503 => RetryKind::Throttled,
        500..=599 => RetryKind::Http5xx(code as u16),
        _ => RetryKind::Other,
    }
}

pub fn classify_curl_error(e: &curl::Error) -> RetryKind {
    if e.is_operation_timedout() {
        return RetryKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return RetryKind::Connection;
    }
    RetryKind::Other
}

pub fn classify(e: &FetchError) -> RetryKind {
    match e {
        FetchError::Curl(ce) => classify_curl_error(ce),
        FetchError::Http(code) => classify_http_status(*code),
        FetchError::InvalidLocator(_) => RetryKind::Other,
    }
}

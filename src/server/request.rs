use crate::dispatcher::{HandlerRequest, HeaderVec, MountPrefix, ParamVec};
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use may_minihttp::Request;
use std::io::Read;
use std::sync::Arc;
use tracing::{debug, warn};

/// Request bodies larger than this are truncated.
pub const MAX_BODY_BYTES: u64 = 2 * 1024 * 1024;

/// Split a `Cookie` header into `(name, value)` pairs; empty names are skipped.
pub fn parse_cookies(cookie_header: &str) -> HeaderVec {
    cookie_header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            let name = name.trim();
            (!name.is_empty()).then(|| (Arc::from(name), value.trim().to_string()))
        })
        .collect()
}

/// Decoded query parameters of a raw request target, in order of appearance.
pub fn parse_query_params(target: &str) -> ParamVec {
    let Some((_, query)) = target.split_once('?') else {
        return ParamVec::new();
    };
    let query = query.split('#').next().unwrap_or_default();
    parse_urlencoded(query)
}

/// Decoded `application/x-www-form-urlencoded` body.
pub fn parse_urlencoded(body: &str) -> ParamVec {
    url::form_urlencoded::parse(body.as_bytes())
        .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
        .collect()
}

fn is_form(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|ct| ct.trim().eq_ignore_ascii_case("application/x-www-form-urlencoded"))
}

/// Translate a wire request into a [`HandlerRequest`] mounted under `base_path`.
///
/// The request target is kept raw; path normalisation is the dispatcher's job.
pub fn parse_request(req: Request, base_path: &MountPrefix) -> HandlerRequest {
    let method = req.method().to_string();
    let target = req.path().to_string();

    let headers: HeaderVec = req
        .headers()
        .iter()
        .map(|h| {
            (
                Arc::from(h.name.to_ascii_lowercase()),
                String::from_utf8_lossy(h.value).to_string(),
            )
        })
        .collect();

    let mut out = HandlerRequest {
        request_id: RequestId::default(),
        method,
        target,
        base_path: base_path.clone(),
        headers,
        ..HandlerRequest::default()
    };
    out.request_id = RequestId::from_header_or_new(out.get_header(REQUEST_ID_HEADER));
    out.cookies = out.get_header("cookie").map(parse_cookies).unwrap_or_default();
    out.query_params = parse_query_params(&out.target);

    debug!(
        request_id = %out.request_id,
        header_count = out.headers.len(),
        cookie_count = out.cookies.len(),
        param_count = out.query_params.len(),
        "Request parsed"
    );

    // The body reader consumes the request, so it is read last.
    let mut body = String::new();
    match req.body().take(MAX_BODY_BYTES).read_to_string(&mut body) {
        Ok(0) => {}
        Ok(size) => {
            debug!(request_id = %out.request_id, body_size_bytes = size, "Request body read");
            if is_form(out.get_header("content-type")) {
                out.form = parse_urlencoded(&body);
            }
            out.body = Some(body);
        }
        Err(e) => warn!(request_id = %out.request_id, error = %e, "Failed to read request body"),
    }

    out
}

use crate::dispatcher::HandlerResponse;
use may_minihttp::Response;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use smallvec::SmallVec;
use std::sync::{Mutex, MutexGuard};
use tracing::warn;

pub fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "OK",
    }
}

/// Most header lines one response can carry; `may_minihttp` has no room for more.
pub const MAX_RESPONSE_HEADERS: usize = 16;

/// Upper bound on header lines interned for the life of the process.
pub const MAX_INTERNED_LINES: usize = 64;

// may_minihttp only takes `&'static str` header lines. `content-type` lines come from
// a small fixed vocabulary, so they are leaked once and reused, up to
// MAX_INTERNED_LINES. Everything else goes through `HeaderLines`.
static INTERNED_LINES: Lazy<Mutex<HashSet<&'static str>>> = Lazy::new(|| Mutex::new(HashSet::new()));

fn interned_lines() -> MutexGuard<'static, HashSet<&'static str>> {
    match INTERNED_LINES.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Interned line for `name: value`, or `None` once the set is full.
fn intern_header_line(name: &str, value: &str) -> Option<&'static str> {
    intern_into(&mut interned_lines(), format!("{name}: {value}"), MAX_INTERNED_LINES)
}

fn intern_into(lines: &mut HashSet<&'static str>, line: String, cap: usize) -> Option<&'static str> {
    if let Some(existing) = lines.get(line.as_str()) {
        return Some(existing);
    }
    if lines.len() >= cap {
        return None;
    }
    let leaked: &'static str = Box::leak(line.into_boxed_str());
    lines.insert(leaked);
    Some(leaked)
}

/// Number of header lines interned so far.
#[must_use]
pub fn interned_line_count() -> usize {
    interned_lines().len()
}

/// Header values must not break the response framing.
fn is_safe_header_value(value: &str) -> bool {
    !value.contains(['\r', '\n'])
}

/// Header lines of the response being written on one connection.
///
/// Redirect targets and cookies carry request-derived text, so they are owned here
/// rather than interned, and released when the connection writes its next response.
/// Each connection gets its own instance; cloning yields an empty one.
#[derive(Debug, Default)]
pub struct HeaderLines {
    held: Vec<Box<str>>,
}

impl Clone for HeaderLines {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl HeaderLines {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines currently owned for the response in flight.
    #[must_use]
    pub fn held(&self) -> usize {
        self.held.len()
    }

    /// Release the previous response's lines and build the wire lines for `response`.
    ///
    /// Values containing CR or LF are dropped, and so is anything past
    /// [`MAX_RESPONSE_HEADERS`].
    fn prepare(&mut self, response: &HandlerResponse) -> SmallVec<[&'static str; MAX_RESPONSE_HEADERS]> {
        self.held.clear();
        let mut out = SmallVec::new();
        for (name, value) in &response.headers {
            if !is_safe_header_value(value) {
                warn!(header = %name, "Dropped header with line break in value");
                continue;
            }
            if out.len() == MAX_RESPONSE_HEADERS {
                warn!(header = %name, limit = MAX_RESPONSE_HEADERS, "Dropped header past the response limit");
                continue;
            }
            let interned = if name.eq_ignore_ascii_case("content-type") {
                intern_header_line(name, value)
            } else {
                None
            };
            out.push(match interned {
                Some(line) => line,
                None => self.hold(format!("{name}: {value}")),
            });
        }
        out
    }

    #[allow(unsafe_code)]
    fn hold(&mut self, line: String) -> &'static str {
        let line = line.into_boxed_str();
        // SAFETY: the boxed text does not move when the box is pushed, and it is only
        // freed by the next `prepare` or by dropping `self`. `AppService` owns this value
        // and may_minihttp encodes each response before it calls the service again or
        // drops it, so the returned line is never read after it is freed.
        let text: &'static str = unsafe { &*(line.as_ref() as *const str) };
        self.held.push(line);
        text
    }
}

/// Write `response` onto the wire, with header lines owned by `lines`.
pub fn write_handler_response(res: &mut Response, response: HandlerResponse, lines: &mut HeaderLines) {
    res.status_code(response.status as usize, status_reason(response.status));
    for line in lines.prepare(&response) {
        res.header(line);
    }
    res.body_vec(response.body.into_bytes());
}

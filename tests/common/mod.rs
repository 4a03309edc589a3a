#![allow(dead_code)]

use blogrouter::dispatcher::{Dispatcher, MountPrefix};
use blogrouter::observe::MemoryLogger;
use blogrouter::routes::build_app;
use std::sync::Arc;

/// The blog application mounted under `prefix`.
pub fn blog_dispatcher(prefix: &str) -> Dispatcher {
    let (router, controllers) = build_app().unwrap();
    Dispatcher::new(router, controllers, MountPrefix::new(prefix))
}

/// Same as [`blog_dispatcher`] with a recording logger attached.
pub fn logged_blog_dispatcher(prefix: &str) -> (Dispatcher, Arc<MemoryLogger>) {
    let logger = Arc::new(MemoryLogger::new());
    let dispatcher = blog_dispatcher(prefix).with_logger(logger.clone());
    (dispatcher, logger)
}

pub mod test_server {
    use std::sync::Once;

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }
}

pub mod http {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    /// Parsed raw HTTP/1.1 response.
    #[derive(Debug)]
    pub struct RawResponse {
        pub status: u16,
        pub headers: Vec<(String, String)>,
        pub body: String,
    }

    impl RawResponse {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }
    }

    /// Send `request` verbatim and read one response (headers plus
    /// `Content-Length` bytes of body).
    pub fn send_request(addr: &SocketAddr, request: &str) -> RawResponse {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        stream.write_all(request.as_bytes()).unwrap();

        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).unwrap_or(0);
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(head_end) = find_head_end(&buf) {
                let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
                let wanted = content_length(&head).unwrap_or(0);
                if buf.len() >= head_end + 4 + wanted {
                    break;
                }
            }
        }
        parse(&String::from_utf8_lossy(&buf))
    }

    fn find_head_end(buf: &[u8]) -> Option<usize> {
        buf.windows(4).position(|w| w == b"\r\n\r\n")
    }

    fn content_length(head: &str) -> Option<usize> {
        head.lines().find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse().ok())
                .flatten()
        })
    }

    fn parse(raw: &str) -> RawResponse {
        let (head, body) = raw.split_once("\r\n\r\n").unwrap_or((raw, ""));
        let mut lines = head.lines();
        let status = lines
            .next()
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let headers = lines
            .filter_map(|l| l.split_once(':'))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();
        RawResponse {
            status,
            headers,
            body: body.to_string(),
        }
    }
}

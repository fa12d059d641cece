/*
 * Copyright (c) 2021. Aberic - All Rights Reserved.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 * http://www.apache.org/licenses/LICENSE-2.0
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Response 表示由服务器发送给客户端的HTTP响应构建器。
//!
//! 响应报文格式如下所示：
//! ```response
//! ┌───────────────────────────────────────────────────┐
//! │ Http-Version | Status-Code | Reason-Phrase | CRLF │
//! ├───────────────────────────────────────────────────┤
//! │                      Header                       │
//! ├───────────────────────────────────────────────────┤
//! │                       CRLF                        │
//! ├───────────────────────────────────────────────────┤
//! │                       Body                        │
//! └───────────────────────────────────────────────────┘
//! ```
//!
//! `Content-Length`, `Content-MD5` (if requested) and `Date` are computed at
//! serialization time rather than eagerly by the setters, so a handler may
//! keep mutating the body right up until the response is written out.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::device::Connection;
use crate::http::date;
use crate::http::status::Status;
use crate::http::version::Version;
use crate::utils::cryptos::{md5_digest, Base64, Base64Encoder};
use crate::utils::errors::{Errs, StarryResult};

/// A header emitted verbatim in insertion order, alongside a value.
struct Field {
    name: String,
    value: String,
}

pub struct Response {
    version: Version,
    status: Status,
    fields: Vec<Field>,
    body: Vec<u8>,
    want_content_md5: bool,
    want_server_header: bool,
}

impl Response {
    pub fn new(version: Version) -> Response {
        Response {
            version,
            status: Status::OK,
            fields: Vec::new(),
            body: Vec::new(),
            want_content_md5: false,
            want_server_header: false,
        }
    }

    pub fn status(&mut self, status: Status) -> &mut Response {
        self.status = status;
        self
    }

    /// Sets an arbitrary header. Silently ignores `Date`, `Content-Length`,
    /// `Content-MD5` and `Server`, which are computed by [`Response::write_to`]
    /// itself and must not be set twice on the wire.
    pub fn header(&mut self, name: &str, value: &str) -> &mut Response {
        if is_reserved_header(name) {
            return self;
        }
        self.fields.push(Field { name: name.to_string(), value: value.to_string() });
        self
    }

    /// Sets `Content-Location`.
    pub fn content_location(&mut self, value: &str) -> &mut Response {
        self.set_unique_header("Content-Location", value)
    }

    /// Sets `Location`.
    pub fn location(&mut self, value: &str) -> &mut Response {
        self.set_unique_header("Location", value)
    }

    /// Sets `Retry-After` to an absolute HTTP date derived from
    /// `epoch_seconds`. Passing `0` clears any previously set value.
    pub fn retry_after(&mut self, epoch_seconds: i64) -> &mut Response {
        self.fields.retain(|f| !f.name.eq_ignore_ascii_case("Retry-After"));
        if epoch_seconds != 0 {
            self.fields.push(Field {
                name: "Retry-After".to_string(),
                value: date::format_http_date(epoch_seconds),
            });
        }
        self
    }

    /// Replaces any previous value for `name` (case-insensitively) then
    /// sets it to `value`.
    fn set_unique_header(&mut self, name: &str, value: &str) -> &mut Response {
        self.fields.retain(|f| !f.name.eq_ignore_ascii_case(name));
        self.fields.push(Field { name: name.to_string(), value: value.to_string() });
        self
    }

    pub fn body(&mut self, body: Vec<u8>) -> &mut Response {
        self.body = body;
        self
    }

    /// Requests that `Content-MD5` be computed over the final body at
    /// serialization time.
    pub fn with_content_md5(&mut self) -> &mut Response {
        self.want_content_md5 = true;
        self
    }

    /// Emits a `Server` header identifying this library. Off by default.
    pub fn with_server_header(&mut self) -> &mut Response {
        self.want_server_header = true;
        self
    }

    pub fn success() -> Response {
        fill(Status::OK)
    }

    pub fn bad_request() -> Response {
        fill(Status::BAD_REQUEST)
    }

    pub fn not_found() -> Response {
        fill(Status::NOT_FOUND)
    }

    /// `405 Method Not Allowed`, with an `Allow` header listing the methods
    /// registered for the same path.
    pub fn method_not_allowed(allowed: &[&str]) -> Response {
        let mut resp = fill(Status::METHOD_NOT_ALLOWED);
        if !allowed.is_empty() {
            resp.header("Allow", &allowed.join(", "));
        }
        resp
    }

    pub fn not_acceptable() -> Response {
        fill(Status::NOT_ACCEPTABLE)
    }

    pub fn unsupported_media_type() -> Response {
        fill(Status::UNSUPPORTED_MEDIA_TYPE)
    }

    pub fn expectation_failed() -> Response {
        fill(Status::EXPECTATION_FAILED)
    }

    pub fn http_version_not_supported() -> Response {
        fill(Status::HTTP_VERSION_NOT_SUPPORTED)
    }

    /// Serializes the status line, headers (`Date`, `Content-Length`, and
    /// optionally `Content-MD5`/`Server` computed here, then every
    /// explicitly set header, then the body) and writes it to `device`.
    pub fn write_to(&self, device: &mut dyn Connection) -> StarryResult<()> {
        let mut out = Vec::new();
        out.extend_from_slice(self.version.as_slice());
        out.push(b' ');
        out.extend_from_slice(self.status.code().to_string().as_bytes());
        out.push(b' ');
        out.extend_from_slice(self.status.phrase().as_bytes());
        out.extend_from_slice(b"\r\n");

        let now = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0);
        write_field(&mut out, "Date", &date::format_http_date(now));
        write_field(&mut out, "Content-Length", &self.body.len().to_string());
        if self.want_content_md5 {
            let digest = md5_digest(&self.body);
            write_field(&mut out, "Content-MD5", &Base64::encode(digest.as_slice()));
        }
        if self.want_server_header {
            write_field(&mut out, "Server", "starry");
        }
        for field in &self.fields {
            write_field(&mut out, &field.name, &field.value);
        }
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&self.body);

        if !device.send(&out) {
            return Err(Errs::str("failed to write response to device"));
        }
        Ok(())
    }
}

/// Headers computed by [`Response::write_to`] itself; rejected from `header()`
/// to avoid writing them twice on the wire.
fn is_reserved_header(name: &str) -> bool {
    name.eq_ignore_ascii_case("Date")
        || name.eq_ignore_ascii_case("Content-Length")
        || name.eq_ignore_ascii_case("Content-MD5")
        || name.eq_ignore_ascii_case("Server")
}

fn write_field(out: &mut Vec<u8>, name: &str, value: &str) {
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(b": ");
    out.extend_from_slice(value.as_bytes());
    out.extend_from_slice(b"\r\n");
}

fn fill(status: Status) -> Response {
    Response {
        version: Version::default(),
        status,
        fields: Vec::new(),
        body: Vec::new(),
        want_content_md5: false,
        want_server_header: false,
    }
}

#[cfg(test)]
mod response_test {
    use super::*;
    use crate::device::MockDevice;

    #[test]
    fn writes_status_line_and_body() {
        let mut resp = Response::success();
        resp.body(b"hi".to_vec());
        let mut dev = MockDevice::new(b"");
        resp.write_to(&mut dev).unwrap();
        let text = String::from_utf8(dev.output).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Length: 2\r\n"));
        assert!(text.ends_with("\r\n\r\nhi"));
    }

    #[test]
    fn not_found_has_no_body() {
        let resp = Response::not_found();
        let mut dev = MockDevice::new(b"");
        resp.write_to(&mut dev).unwrap();
        let text = String::from_utf8(dev.output).unwrap();
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.contains("Content-Length: 0\r\n"));
    }

    #[test]
    fn method_not_allowed_carries_allow_header() {
        let resp = Response::method_not_allowed(&["GET", "POST"]);
        let mut dev = MockDevice::new(b"");
        resp.write_to(&mut dev).unwrap();
        let text = String::from_utf8(dev.output).unwrap();
        assert!(text.contains("Allow: GET, POST\r\n"));
    }

    #[test]
    fn header_ignores_reserved_names() {
        let mut resp = Response::success();
        resp.header("Content-Length", "999");
        resp.header("Date", "bogus");
        let mut dev = MockDevice::new(b"");
        resp.write_to(&mut dev).unwrap();
        let text = String::from_utf8(dev.output).unwrap();
        assert_eq!(text.matches("Content-Length:").count(), 1);
        assert_eq!(text.matches("Date:").count(), 1);
        assert!(text.contains("Content-Length: 0\r\n"));
    }

    #[test]
    fn location_and_content_location_are_set() {
        let mut resp = Response::success();
        resp.location("/elsewhere");
        resp.content_location("/canonical");
        let mut dev = MockDevice::new(b"");
        resp.write_to(&mut dev).unwrap();
        let text = String::from_utf8(dev.output).unwrap();
        assert!(text.contains("Location: /elsewhere\r\n"));
        assert!(text.contains("Content-Location: /canonical\r\n"));
    }

    #[test]
    fn retry_after_zero_clears_it() {
        let mut resp = Response::success();
        resp.retry_after(1_000_000_000);
        resp.retry_after(0);
        let mut dev = MockDevice::new(b"");
        resp.write_to(&mut dev).unwrap();
        let text = String::from_utf8(dev.output).unwrap();
        assert!(!text.contains("Retry-After"));
    }

    #[test]
    fn content_md5_is_computed_at_serialization() {
        let mut resp = Response::success();
        resp.body(b"".to_vec());
        resp.with_content_md5();
        let mut dev = MockDevice::new(b"");
        resp.write_to(&mut dev).unwrap();
        let text = String::from_utf8(dev.output).unwrap();
        assert!(text.contains("Content-MD5: 1B2M2Y8AsgTpgAmY7PhCfg==\r\n"));
    }
}

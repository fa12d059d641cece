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

//! Request 表示由服务器接收的一次HTTP请求的已解析视图。
//!
//! 请求报文格式如下所示：
//! ```request
//! ┌────────────────────────────────────────────┐
//! │ Method | Request-URI | Http-Version | CRLF │
//! ├────────────────────────────────────────────┤
//! │                    Header                  │
//! ├────────────────────────────────────────────┤
//! │                     CRLF                   │
//! ├────────────────────────────────────────────┤
//! │                     Body                   │
//! └────────────────────────────────────────────┘
//! ```

use crate::device::Connection;
use crate::http::date;
use crate::http::header::Header;
use crate::http::lexer::Lexer;
use crate::http::method::Method;
use crate::http::uri::Uri;
use crate::http::version::Version;
use crate::utils::cryptos::{md5_digest, Base64, Base64Decoder};
use crate::utils::errors::{Errs, StarryResult};

/// Largest accepted `Content-Length`, matching the wire-protocol limit.
const MAX_CONTENT_LENGTH: u64 = (1u64 << 31) - 1;

/// An immutable parsed view of an inbound request. Everything but the
/// body is known once [`Request::parse`] returns; the body is fetched on
/// demand via [`Request::fetch_content`].
pub struct Request {
    method: Method,
    version: Version,
    uri: Uri,
    header: Header,
    lexer: Lexer,
}

impl Request {
    /// Reads a request line and header block off `device`, normalizing
    /// line endings and folding via the lexer, then parses the request
    /// line and every recognized header field. Does not read the body.
    pub fn parse(device: &mut dyn Connection) -> StarryResult<Request> {
        let mut lexer = Lexer::new();
        if !lexer.fetch_header(device) {
            return Err(Errs::str("failed to read request header from device"));
        }

        let text = String::from_utf8_lossy(lexer.header_bytes()).into_owned();
        let mut lines = text.split('\n');

        let request_line = lines.next().ok_or_else(|| Errs::str("empty request"))?;
        let mut parts = request_line.splitn(3, ' ');
        let method_str = parts.next().filter(|s| !s.is_empty()).ok_or_else(|| Errs::str("missing method"))?;
        let target = parts.next().filter(|s| !s.is_empty()).ok_or_else(|| Errs::str("missing request-target"))?;
        let version_str = parts.next().filter(|s| !s.is_empty()).ok_or_else(|| Errs::str("missing http-version"))?;

        let method = Method::from_str(method_str)?;
        let uri = Uri::parse_origin_form(target)?;
        let version = Version::from_str(version_str)?;

        let mut header = Header::new();
        for line in lines {
            if line.is_empty() {
                break;
            }
            let (name, value) = line.split_once(':').ok_or_else(|| Errs::str("malformed header field"))?;
            let name = name.trim();
            let value = value.trim();
            set_header_field(&mut header, name, value)?;
        }

        Ok(Request { method, version, uri, header, lexer })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn path(&self) -> &str {
        &self.uri.path
    }

    pub fn query(&self, key: &str) -> Option<&str> {
        self.uri.query.get(key).map(String::as_str)
    }

    pub fn fragment(&self) -> Option<&str> {
        self.uri.fragment.as_deref()
    }

    pub fn host(&self) -> Option<&str> {
        self.header.host.as_deref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header.content_type.as_deref()
    }

    pub fn content_length(&self) -> Option<u64> {
        self.header.content_length
    }

    /// Seconds since the Unix epoch, or `0` if no `Date` header was
    /// understood.
    pub fn date(&self) -> i64 {
        self.header.date.unwrap_or(0)
    }

    pub fn from(&self) -> Option<&str> {
        self.header.from.as_deref()
    }

    pub fn referer(&self) -> Option<&str> {
        self.header.referer.as_deref()
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.header.user_agent.as_deref()
    }

    pub fn accept(&self) -> Option<&str> {
        self.header.accept.as_deref()
    }

    pub fn custom_header(&self, name: &str) -> Option<&str> {
        self.header.get_custom(name)
    }

    pub fn expects_continue(&self) -> bool {
        self.header.expects_continue()
    }

    pub fn expects_unsupported(&self) -> bool {
        self.header.expects_unsupported()
    }

    pub fn keeps_connection(&self) -> bool {
        self.header.keeps_connection(&self.version)
    }

    /// Reads the declared body off `device` (0 bytes if no `Content-Length`
    /// was sent), verifying `Content-MD5` if present. On a digest mismatch
    /// the content is left populated but an error is returned — the caller
    /// must not invoke a handler with it.
    pub fn fetch_content(&mut self, device: &mut dyn Connection) -> StarryResult<()> {
        let length = self.header.content_length.unwrap_or(0) as usize;
        if !self.lexer.fetch_content(device, length) {
            return Err(Errs::str("failed to read request body from device"));
        }
        if let Some(expected_b64) = &self.header.content_md5 {
            let expected = Base64::decode(expected_b64.as_str()).map_err(|e| Errs::strs("invalid content-md5 header", e))?;
            let actual = md5_digest(self.lexer.content_bytes());
            if actual.as_slice() != expected.as_slice() {
                return Err(Errs::str("content-md5 mismatch"));
            }
        }
        Ok(())
    }

    pub fn content(&self) -> &[u8] {
        self.lexer.content_bytes()
    }

    /// A request bound to no real request line, used to hand an error
    /// handler something to read when the failure happened before
    /// parsing got far enough to produce a real [`Request`].
    pub(crate) fn placeholder(version: Version) -> Request {
        Request {
            method: Method::GET,
            version,
            uri: Uri::parse_origin_form("/").expect("'/' is always a valid origin-form target"),
            header: Header::new(),
            lexer: Lexer::new(),
        }
    }
}

fn set_header_field(header: &mut Header, name: &str, value: &str) -> StarryResult<()> {
    match name.to_ascii_lowercase().as_str() {
        "connection" => header.set_connection(value),
        "content-length" => {
            let len: u64 = value.parse().map_err(|_| Errs::str("invalid content-length"))?;
            if len > MAX_CONTENT_LENGTH {
                return Err(Errs::str("content-length exceeds the admitted range"));
            }
            header.content_length = Some(len);
        }
        "content-md5" => header.content_md5 = Some(value.to_string()),
        "content-type" => header.content_type = Some(value.to_string()),
        "date" => header.date = date::parse_http_date(value),
        "expect" => header.expect = Some(value.to_string()),
        "from" => header.from = Some(value.to_string()),
        "referer" => header.referer = Some(value.to_string()),
        "user-agent" => header.user_agent = Some(value.to_string()),
        "accept" => header.accept = Some(value.to_string()),
        "host" => header.host = Some(value.to_string()),
        _ => header.set_custom(name, value),
    }
    Ok(())
}

#[cfg(test)]
mod request_test {
    use super::*;
    use crate::device::MockDevice;

    #[test]
    fn parses_request_line_and_headers() {
        let mut dev = MockDevice::new(
            b"GET /path/data?key=value&key2=value2 HTTP/1.1\r\n\
              Host: localhost:7878\r\n\
              User-Agent: test-agent\r\n\
              X-Custom: hi\r\n\
              \r\n",
        );
        let req = Request::parse(&mut dev).unwrap();
        assert_eq!(req.method(), &Method::GET);
        assert_eq!(req.path(), "/path/data");
        assert_eq!(req.query("key"), Some("value"));
        assert_eq!(req.query("key2"), Some("value2"));
        assert_eq!(req.host(), Some("localhost:7878"));
        assert_eq!(req.user_agent(), Some("test-agent"));
        assert_eq!(req.custom_header("x-custom"), Some("hi"));
    }

    #[test]
    fn fetches_and_verifies_body() {
        let mut dev = MockDevice::new(
            b"PUT / HTTP/1.1\r\nContent-Length: 12\r\nContent-Type: text/plain\r\n\r\nHello World!",
        );
        let mut req = Request::parse(&mut dev).unwrap();
        assert_eq!(req.content_length(), Some(12));
        req.fetch_content(&mut dev).unwrap();
        assert_eq!(req.content(), b"Hello World!");
    }

    #[test]
    fn rejects_content_md5_mismatch() {
        let mut dev = MockDevice::new(
            b"PUT / HTTP/1.1\r\nContent-Length: 12\r\nContent-MD5: ZGVhZGJlZWY=\r\nContent-Type: text/plain\r\n\r\nHello World!",
        );
        let mut req = Request::parse(&mut dev).unwrap();
        assert!(req.fetch_content(&mut dev).is_err());
    }

    #[test]
    fn keep_alive_follows_version_and_connection_header() {
        let mut dev = MockDevice::new(b"GET / HTTP/1.0\r\nConnection: keep-alive\r\n\r\n");
        let req = Request::parse(&mut dev).unwrap();
        assert!(req.keeps_connection());

        let mut dev2 = MockDevice::new(b"GET / HTTP/1.1\r\nConnection: close\r\n\r\n");
        let req2 = Request::parse(&mut dev2).unwrap();
        assert!(!req2.keeps_connection());
    }

    #[test]
    fn rejects_invalid_method() {
        let mut dev = MockDevice::new(b"PATCH / HTTP/1.1\r\n\r\n");
        assert!(Request::parse(&mut dev).is_err());
    }
}

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

//! Drives a single request end to end: parse, route, invoke, serialize,
//! falling back to a per-status-code error handler table when routing
//! fails before a handler is ever reached.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::demux::demultiplexer::Callback;
use crate::demux::{Demultiplexer, RouteOutcome};
use crate::device::Connection;
use crate::http::method::Method;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::version::Version;
use crate::utils::errors::{Errs, StarryResult};

/// Why no registered handler was invoked, resolved to the status code an
/// error handler (or the built-in fallback) should answer with.
enum Outcome {
    BadRequest,
    UnsupportedMediaType,
    NotFound,
    MethodNotAllowed(Vec<Method>),
    NotAcceptable,
    ExpectationFailed,
    VersionNotSupported,
}

impl Outcome {
    fn status_code(&self) -> u16 {
        match self {
            Outcome::BadRequest => 400,
            Outcome::UnsupportedMediaType => 415,
            Outcome::NotFound => 404,
            Outcome::MethodNotAllowed(_) => 405,
            Outcome::NotAcceptable => 406,
            Outcome::ExpectationFailed => 417,
            Outcome::VersionNotSupported => 505,
        }
    }

    fn default_response(&self) -> Response {
        match self {
            Outcome::BadRequest => Response::bad_request(),
            Outcome::UnsupportedMediaType => Response::unsupported_media_type(),
            Outcome::NotFound => Response::not_found(),
            Outcome::MethodNotAllowed(methods) => {
                let names: Vec<&str> = methods.iter().map(Method::as_str).collect();
                Response::method_not_allowed(&names)
            }
            Outcome::NotAcceptable => Response::not_acceptable(),
            Outcome::ExpectationFailed => Response::expectation_failed(),
            Outcome::VersionNotSupported => Response::http_version_not_supported(),
        }
    }
}

impl From<RouteOutcome> for Outcome {
    fn from(route: RouteOutcome) -> Outcome {
        match route {
            RouteOutcome::Matched(_) => unreachable!("a matched route is handled before conversion"),
            RouteOutcome::InvalidContentType => Outcome::UnsupportedMediaType,
            RouteOutcome::NotFound => Outcome::NotFound,
            RouteOutcome::MethodNotAllowed(methods) => Outcome::MethodNotAllowed(methods),
            RouteOutcome::NotAcceptable => Outcome::NotAcceptable,
        }
    }
}

/// Returned by [`Processor::set_error_handler`]. Dropping it removes the
/// handler for that status code.
pub struct ErrorHandle {
    table: Arc<Mutex<BTreeMap<u16, Callback>>>,
    code: u16,
}

impl Drop for ErrorHandle {
    fn drop(&mut self) {
        self.table.lock().expect("error handler table poisoned").remove(&self.code);
    }
}

/// End-to-end driver over a [`Demultiplexer`]: parses one request off a
/// device, routes it, invokes the matching handler or an error handler,
/// and serializes the response back to the device.
#[derive(Clone)]
pub struct Processor {
    demux: Demultiplexer,
    error_handlers: Arc<Mutex<BTreeMap<u16, Callback>>>,
    connection_timeout: u64,
}

impl Processor {
    pub fn new(demux: Demultiplexer) -> Processor {
        Processor { demux, error_handlers: Arc::new(Mutex::new(BTreeMap::new())), connection_timeout: 60 }
    }

    pub fn demultiplexer(&self) -> &Demultiplexer {
        &self.demux
    }

    /// Seconds a socket lingers after a response on a connection that is
    /// not being kept alive.
    pub fn set_connection_timeout(&mut self, seconds: u64) -> &mut Processor {
        self.connection_timeout = seconds;
        self
    }

    /// Registers a callback invoked instead of the built-in response for
    /// `code`. At most one handler per code; returns an error if one is
    /// already registered.
    pub fn set_error_handler(&self, code: u16, callback: Callback) -> StarryResult<ErrorHandle> {
        let mut table = self.error_handlers.lock().expect("error handler table poisoned");
        if table.contains_key(&code) {
            return Err(Errs::str("an error handler is already registered for this status code"));
        }
        table.insert(code, callback);
        Ok(ErrorHandle { table: self.error_handlers.clone(), code })
    }

    /// Drives one request to completion. Returns `true` if a response
    /// (or a clean EOF with nothing to respond to) was handled, `false`
    /// only when the device itself failed during I/O.
    pub fn handle_one_request(&self, device: &mut dyn Connection) -> bool {
        let mut request = match Request::parse(device) {
            Ok(request) => request,
            Err(e) => {
                log::warn!("failed to parse request: {}", e);
                return self.respond(device, &None, Outcome::BadRequest);
            }
        };

        let outcome = self.route(&request);
        let keep_alive = request.keeps_connection();
        let sent = match outcome {
            Ok(RouteOutcome::Matched(holder)) => {
                if let Err(e) = request.fetch_content(device) {
                    log::warn!("failed to fetch request content: {}", e);
                    self.respond(device, &Some(request), Outcome::BadRequest)
                } else {
                    let mut response = Response::new(request.version().clone());
                    crate::demux::demultiplexer::with_invocation_guard(|| {
                        holder.call(&request, &mut response);
                    });
                    write_response(device, &response)
                }
            }
            Ok(_unreachable) => unreachable!("route() never returns a non-Matched Ok"),
            Err(reason) => self.respond(device, &Some(request), reason),
        };

        if sent && !keep_alive {
            device.set_lingering_timeout(self.connection_timeout);
            device.close();
        }
        sent
    }

    /// Resolves version/Expect preconditions, then falls through to the
    /// demultiplexer. `Ok` only ever carries `RouteOutcome::Matched`.
    fn route(&self, request: &Request) -> Result<RouteOutcome, Outcome> {
        if !request.version().is_supported() {
            return Err(Outcome::VersionNotSupported);
        }
        if request.expects_unsupported() {
            return Err(Outcome::ExpectationFailed);
        }
        match self.demux.determine_request_handler(request) {
            RouteOutcome::Matched(holder) => Ok(RouteOutcome::Matched(holder)),
            other => Err(other.into()),
        }
    }

    fn respond(&self, device: &mut dyn Connection, request: &Option<Request>, reason: Outcome) -> bool {
        let mut response = reason.default_response();
        let table = self.error_handlers.lock().expect("error handler table poisoned");
        if let Some(callback) = table.get(&reason.status_code()) {
            let callback = callback.clone();
            drop(table);
            let placeholder;
            let req_ref = match request {
                Some(r) => r,
                None => {
                    placeholder = Request::placeholder(Version::default());
                    &placeholder
                }
            };
            callback(req_ref, &mut response);
        }
        write_response(device, &response)
    }
}

fn write_response(device: &mut dyn Connection, response: &Response) -> bool {
    match response.write_to(device) {
        Ok(()) => true,
        Err(e) => {
            log::error!("failed to write response: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod processor_test {
    use std::sync::Arc;

    use super::*;
    use crate::device::MockDevice;
    use crate::http::method::Method;

    fn processor() -> Processor {
        Processor::new(Demultiplexer::new())
    }

    #[test]
    fn serves_a_matched_handler() {
        let p = processor();
        let ct = p.demultiplexer().registry().parse("*/*");
        let at = p.demultiplexer().registry().parse("text/plain");
        let _h = p
            .demultiplexer()
            .connect("/", Method::GET, ct, at, Arc::new(|_req, resp| {
                resp.body(b"hi".to_vec());
            }))
            .unwrap();

        let mut dev = MockDevice::new(b"GET / HTTP/1.1\r\nAccept: text/plain\r\n\r\n");
        assert!(p.handle_one_request(&mut dev));
        let text = String::from_utf8(dev.output).unwrap();
        assert!(text.starts_with("HTTP/1.1 200"));
        assert!(text.ends_with("hi"));
    }

    #[test]
    fn unknown_path_yields_404() {
        let p = processor();
        let mut dev = MockDevice::new(b"GET /nope HTTP/1.1\r\n\r\n");
        assert!(p.handle_one_request(&mut dev));
        let text = String::from_utf8(dev.output).unwrap();
        assert!(text.starts_with("HTTP/1.1 404"));
    }

    #[test]
    fn malformed_request_yields_400() {
        let p = processor();
        let mut dev = MockDevice::new(b"PATCH / HTTP/1.1\r\n\r\n");
        assert!(p.handle_one_request(&mut dev));
        let text = String::from_utf8(dev.output).unwrap();
        assert!(text.starts_with("HTTP/1.1 400"));
    }

    #[test]
    fn unsupported_version_yields_505() {
        let p = processor();
        let mut dev = MockDevice::new(b"GET / HTTP/2.0\r\n\r\n");
        assert!(p.handle_one_request(&mut dev));
        let text = String::from_utf8(dev.output).unwrap();
        assert!(text.starts_with("HTTP/1.1 505"));
    }

    #[test]
    fn unsupported_expect_yields_417() {
        let p = processor();
        let ct = p.demultiplexer().registry().parse("*/*");
        let at = p.demultiplexer().registry().parse("text/plain");
        let _h = p.demultiplexer().connect("/", Method::GET, ct, at, Arc::new(|_, _| {})).unwrap();

        let mut dev = MockDevice::new(b"GET / HTTP/1.1\r\nExpect: gzip-first\r\n\r\n");
        assert!(p.handle_one_request(&mut dev));
        let text = String::from_utf8(dev.output).unwrap();
        assert!(text.starts_with("HTTP/1.1 417"));
    }

    #[test]
    fn custom_error_handler_overrides_built_in_body() {
        let p = processor();
        let _h = p
            .set_error_handler(404, Arc::new(|_req, resp| {
                resp.body(b"nothing here".to_vec());
            }))
            .unwrap();

        let mut dev = MockDevice::new(b"GET / HTTP/1.1\r\n\r\n");
        assert!(p.handle_one_request(&mut dev));
        let text = String::from_utf8(dev.output).unwrap();
        assert!(text.starts_with("HTTP/1.1 404"));
        assert!(text.ends_with("nothing here"));
    }

    #[test]
    fn method_not_allowed_carries_allow_header() {
        let p = processor();
        let ct = p.demultiplexer().registry().parse("*/*");
        let at = p.demultiplexer().registry().parse("text/plain");
        let _h = p.demultiplexer().connect("/", Method::GET, ct, at, Arc::new(|_, _| {})).unwrap();

        let mut dev = MockDevice::new(b"PUT / HTTP/1.1\r\nContent-Length: 0\r\n\r\n");
        assert!(p.handle_one_request(&mut dev));
        let text = String::from_utf8(dev.output).unwrap();
        assert!(text.starts_with("HTTP/1.1 405"));
        assert!(text.contains("Allow: GET\r\n"));
    }
}

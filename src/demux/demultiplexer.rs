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

//! Content-negotiating handler registry.
//!
//! Registrations are keyed by `(path, method, content_type)`; every key
//! fans out into an insertion-ordered list of `accept_type` entries, one
//! per registered representation. A single mutex plus condition variable
//! guards the whole table, matching the granularity the handle and
//! holder types rely on: `determine_request_handler` increments an
//! entry's `in_flight` under the same lock a concurrent `disconnect`
//! waits on.

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Condvar, Mutex};

use crate::demux::handle::Handle;
use crate::demux::holder::Holder;
use crate::http::method::Method;
use crate::http::mime::{Mime, MimeRegistry};
use crate::http::request::Request;
use crate::utils::errors::{Errs, StarryResult};

thread_local! {
    /// Set for the duration of a handler invocation so a re-entrant
    /// `disconnect` (the handler dropping its own handle) can be
    /// detected instead of deadlocking on the condition variable.
    static INVOKING: Cell<bool> = Cell::new(false);
}

/// Marks the calling thread as inside a handler invocation for the
/// duration of `f`, so any handle dropped by `f` can detect
/// self-unregistration.
pub(crate) fn with_invocation_guard<T>(f: impl FnOnce() -> T) -> T {
    INVOKING.with(|g| g.set(true));
    let result = f();
    INVOKING.with(|g| g.set(false));
    result
}

fn is_invoking() -> bool {
    INVOKING.with(|g| g.get())
}

/// The outer routing key: a registered resource's path, method and the
/// content type it consumes. Ordered lexicographically over its three
/// fields via derived `Ord`, unlike the OR-composed comparator this is
/// grounded on.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct ResourceKey {
    pub path: String,
    pub method: Method,
    pub content_type: Mime,
}

/// Full identity of one registered representation: the outer key plus
/// the MIME it produces.
#[derive(Clone, Debug)]
pub struct HandlerId {
    pub path: String,
    pub method: Method,
    pub content_type: Mime,
    pub accept_type: Mime,
}

impl HandlerId {
    fn resource_key(&self) -> ResourceKey {
        ResourceKey { path: self.path.clone(), method: self.method.clone(), content_type: self.content_type }
    }
}

pub type Callback = Arc<dyn Fn(&Request, &mut crate::http::response::Response) + Send + Sync>;

struct AcceptEntry {
    accept_type: Mime,
    callback: Callback,
    enabled: bool,
    in_flight: u32,
}

type ResourceTable = BTreeMap<ResourceKey, Vec<AcceptEntry>>;

/// Why `determine_request_handler` failed to find a handler to invoke.
/// Carries enough information for a request processor to pick the
/// matching HTTP status without re-deriving it.
pub enum RouteOutcome {
    Matched(Holder),
    InvalidContentType,
    NotFound,
    MethodNotAllowed(Vec<Method>),
    NotAcceptable,
}

pub(crate) struct DemuxState {
    pub(crate) table: Mutex<ResourceTable>,
    pub(crate) condvar: Condvar,
    pub(crate) registry: Arc<MimeRegistry>,
}

/// The routing table. Cheap to clone (an `Arc` around the shared state);
/// every clone sees the same registrations.
#[derive(Clone)]
pub struct Demultiplexer {
    pub(crate) state: Arc<DemuxState>,
}

impl Demultiplexer {
    pub fn new() -> Demultiplexer {
        Demultiplexer {
            state: Arc::new(DemuxState {
                table: Mutex::new(BTreeMap::new()),
                condvar: Condvar::new(),
                registry: Arc::new(MimeRegistry::new()),
            }),
        }
    }

    pub fn registry(&self) -> &MimeRegistry {
        &self.state.registry
    }

    /// Registers a handler for `(path, method, content_type) -> accept_type`.
    /// Neither `content_type` nor `accept_type` may be [`crate::http::mime::INVALID`];
    /// either may be wildcard — a wildcard `content_type` accepts requests
    /// of any (or no) content type, a wildcard `accept_type` produces
    /// whatever representation was asked for. `path` must start with `/`
    /// and must not contain consecutive `/`.
    pub fn connect(
        &self,
        path: &str,
        method: Method,
        content_type: Mime,
        accept_type: Mime,
        callback: Callback,
    ) -> StarryResult<Handle> {
        validate_path(path)?;
        if !self.state.registry.are_two_types_valid(&content_type, &accept_type) {
            return Err(Errs::str("content_type and accept_type must not be invalid"));
        }

        let id = HandlerId { path: path.to_string(), method, content_type, accept_type };
        let key = id.resource_key();

        let mut table = self.state.table.lock().expect("demultiplexer table poisoned");
        let entries = table.entry(key).or_insert_with(Vec::new);
        if entries.iter().any(|e| e.accept_type == accept_type) {
            return Err(Errs::str("a handler is already registered for this exact id"));
        }
        entries.push(AcceptEntry { accept_type, callback, enabled: true, in_flight: 0 });
        log::debug!("connected handler for {} {}", id.method, id.path);
        Ok(Handle::new(self.clone(), id))
    }

    /// Removes the registration for `id`, blocking until every in-flight
    /// invocation of it has completed. Returns an error instead of
    /// blocking if called from inside the very handler being removed.
    pub(crate) fn disconnect(&self, id: &HandlerId) -> StarryResult<()> {
        let key = id.resource_key();
        let mut table = self.state.table.lock().expect("demultiplexer table poisoned");
        loop {
            let remove_outer = match table.get_mut(&key) {
                None => return Ok(()),
                Some(entries) => {
                    let pos = match entries.iter().position(|e| e.accept_type == id.accept_type) {
                        None => return Ok(()),
                        Some(p) => p,
                    };
                    if entries[pos].in_flight > 0 {
                        if is_invoking() {
                            return Err(Errs::str(
                                "attempted to disconnect a handler from inside its own invocation",
                            ));
                        }
                        table = self.state.condvar.wait(table).expect("demultiplexer condvar poisoned");
                        continue;
                    }
                    entries.remove(pos);
                    entries.is_empty()
                }
            };
            if remove_outer {
                table.remove(&key);
            }
            log::debug!("disconnected handler for {} {}", id.method, id.path);
            return Ok(());
        }
    }

    pub(crate) fn set_enabled(&self, id: &HandlerId, enabled: bool) {
        let key = id.resource_key();
        let mut table = self.state.table.lock().expect("demultiplexer table poisoned");
        if let Some(entries) = table.get_mut(&key) {
            if let Some(entry) = entries.iter_mut().find(|e| e.accept_type == id.accept_type) {
                entry.enabled = enabled;
            }
        }
    }

    pub(crate) fn is_enabled(&self, id: &HandlerId) -> bool {
        let key = id.resource_key();
        let table = self.state.table.lock().expect("demultiplexer table poisoned");
        table
            .get(&key)
            .and_then(|entries| entries.iter().find(|e| e.accept_type == id.accept_type))
            .map(|e| e.enabled)
            .unwrap_or(false)
    }

    /// Finds the handler to invoke for `request`, or the reason none
    /// applies. On a match, the returned [`Holder`] owns one unit of
    /// `in_flight` until it is dropped.
    ///
    /// A resource registered with a wildcard `content_type` accepts a
    /// request with no `Content-Type` at all, or any concrete one; an
    /// explicit `Content-Type` header that is itself wildcard or
    /// unparsable is rejected outright.
    pub fn determine_request_handler(&self, request: &Request) -> RouteOutcome {
        let requested_ct = match request.content_type() {
            Some(ct) => {
                let parsed = self.state.registry.parse(ct);
                if parsed.is_invalid() || parsed.is_wildcard() {
                    return RouteOutcome::InvalidContentType;
                }
                Some(parsed)
            }
            None => None,
        };

        let mut accept = crate::http::accept::AcceptIter::parse(request.accept().unwrap_or(""), &self.state.registry);

        let path = request.path();
        let method = request.method().clone();
        let mut table = self.state.table.lock().expect("demultiplexer table poisoned");

        if !table.keys().any(|k| k.path == path) {
            return RouteOutcome::NotFound;
        }
        let allowed_methods: BTreeSet<Method> =
            table.keys().filter(|k| k.path == path).map(|k| k.method.clone()).collect();
        if !allowed_methods.contains(&method) {
            return RouteOutcome::MethodNotAllowed(allowed_methods.into_iter().collect());
        }

        let matching_keys: Vec<ResourceKey> = table
            .keys()
            .filter(|k| {
                k.path == path
                    && k.method == method
                    && (k.content_type.is_wildcard() || Some(k.content_type) == requested_ct)
            })
            .cloned()
            .collect();
        if matching_keys.is_empty() {
            return RouteOutcome::InvalidContentType;
        }

        accept.rewind();
        while let Some(wanted) = accept.next() {
            for key in &matching_keys {
                let entries = table.get_mut(key).expect("resource key vanished under lock");
                if let Some(pos) = entries.iter().position(|e| e.enabled && e.accept_type.matches(&wanted)) {
                    entries[pos].in_flight += 1;
                    let id = HandlerId {
                        path: key.path.clone(),
                        method: key.method.clone(),
                        content_type: key.content_type,
                        accept_type: entries[pos].accept_type,
                    };
                    let callback = entries[pos].callback.clone();
                    log::trace!("matched handler for {} {} -> {}", id.method, id.path, id.accept_type);
                    return RouteOutcome::Matched(Holder::new(self.clone(), id, callback));
                }
            }
        }
        RouteOutcome::NotAcceptable
    }

    pub(crate) fn decrease_usage_counter(&self, id: &HandlerId) {
        let key = id.resource_key();
        let mut table = self.state.table.lock().expect("demultiplexer table poisoned");
        if let Some(entries) = table.get_mut(&key) {
            if let Some(entry) = entries.iter_mut().find(|e| e.accept_type == id.accept_type) {
                if entry.in_flight > 0 {
                    entry.in_flight -= 1;
                }
            }
        }
        drop(table);
        self.state.condvar.notify_all();
    }

    pub fn register_mime_type(&self, name: &str) -> u32 {
        self.state.registry.register_type(name)
    }

    pub fn register_mime_subtype(&self, name: &str) -> u32 {
        self.state.registry.register_subtype(name)
    }

    pub fn unregister_mime_type(&self, id: u32) -> bool {
        self.state.registry.unregister_type(id)
    }

    pub fn unregister_mime_subtype(&self, id: u32) -> bool {
        self.state.registry.unregister_subtype(id)
    }
}

fn validate_path(path: &str) -> StarryResult<()> {
    if !path.starts_with('/') {
        return Err(Errs::str("path must start with '/'"));
    }
    if path.contains("//") {
        return Err(Errs::str("path must not contain consecutive '/'"));
    }
    Ok(())
}

#[cfg(test)]
mod demultiplexer_test {
    use super::*;
    use crate::device::MockDevice;
    use crate::http::response::Response;

    fn mimes(demux: &Demultiplexer, content_type: &str, accept_type: &str) -> (Mime, Mime) {
        (demux.state.registry.parse(content_type), demux.state.registry.parse(accept_type))
    }

    #[test]
    fn connect_and_match_round_trip() {
        let demux = Demultiplexer::new();
        let (ct, at) = mimes(&demux, "*/*", "text/plain");
        let handle = demux
            .connect("/", Method::GET, ct, at, Arc::new(|_req, resp: &mut Response| {
                resp.body(b"hi".to_vec());
            }))
            .unwrap();

        let mut dev = MockDevice::new(b"GET / HTTP/1.1\r\nAccept: text/plain\r\n\r\n");
        let req = Request::parse(&mut dev).unwrap();
        match demux.determine_request_handler(&req) {
            RouteOutcome::Matched(_holder) => {}
            _ => panic!("expected a match"),
        }
        drop(handle);

        match demux.determine_request_handler(&req) {
            RouteOutcome::NotFound => {}
            _ => panic!("expected no match after handle dropped"),
        }
    }

    #[test]
    fn unknown_path_is_not_found() {
        let demux = Demultiplexer::new();
        let mut dev = MockDevice::new(b"GET / HTTP/1.1\r\n\r\n");
        let req = Request::parse(&mut dev).unwrap();
        assert!(matches!(demux.determine_request_handler(&req), RouteOutcome::NotFound));
    }

    #[test]
    fn wrong_method_is_method_not_allowed() {
        let demux = Demultiplexer::new();
        let (ct, at) = mimes(&demux, "*/*", "text/plain");
        let _handle = demux.connect("/", Method::GET, ct, at, Arc::new(|_, _| {})).unwrap();

        let mut dev = MockDevice::new(b"PUT / HTTP/1.1\r\nContent-Length: 0\r\n\r\n");
        let req = Request::parse(&mut dev).unwrap();
        match demux.determine_request_handler(&req) {
            RouteOutcome::MethodNotAllowed(methods) => assert_eq!(methods, vec![Method::GET]),
            _ => panic!("expected method-not-allowed"),
        }
    }

    #[test]
    fn method_not_allowed_lists_each_method_once() {
        let demux = Demultiplexer::new();
        let (ct, plain) = mimes(&demux, "*/*", "text/plain");
        let json = demux.state.registry.parse("application/json");
        let _h1 = demux.connect("/", Method::GET, ct, plain, Arc::new(|_, _| {})).unwrap();
        let _h2 = demux.connect("/", Method::GET, ct, json, Arc::new(|_, _| {})).unwrap();

        let mut dev = MockDevice::new(b"PUT / HTTP/1.1\r\nContent-Length: 0\r\n\r\n");
        let req = Request::parse(&mut dev).unwrap();
        match demux.determine_request_handler(&req) {
            RouteOutcome::MethodNotAllowed(methods) => assert_eq!(methods, vec![Method::GET]),
            _ => panic!("expected method-not-allowed"),
        }
    }

    #[test]
    fn unacceptable_representation_is_not_acceptable() {
        let demux = Demultiplexer::new();
        let (ct, at) = mimes(&demux, "*/*", "application/json");
        let _handle = demux.connect("/", Method::GET, ct, at, Arc::new(|_, _| {})).unwrap();

        let mut dev = MockDevice::new(b"GET / HTTP/1.1\r\nAccept: text/plain\r\n\r\n");
        let req = Request::parse(&mut dev).unwrap();
        assert!(matches!(demux.determine_request_handler(&req), RouteOutcome::NotAcceptable));
    }

    #[test]
    fn content_negotiation_prefers_higher_quality() {
        let demux = Demultiplexer::new();
        let (ct, plain) = mimes(&demux, "*/*", "text/plain");
        let json = demux.state.registry.parse("application/json");
        let _h1 = demux.connect("/", Method::GET, ct, plain, Arc::new(|_, _| {})).unwrap();
        let _h2 = demux.connect("/", Method::GET, ct, json, Arc::new(|_, _| {})).unwrap();

        let mut dev = MockDevice::new(
            b"GET / HTTP/1.1\r\nAccept: application/json;q=0.9, text/plain;q=0.8\r\n\r\n",
        );
        let req = Request::parse(&mut dev).unwrap();
        match demux.determine_request_handler(&req) {
            RouteOutcome::Matched(holder) => assert_eq!(holder.accept_type(), json),
            _ => panic!("expected a match"),
        }
    }

    #[test]
    fn disabled_handler_is_skipped() {
        let demux = Demultiplexer::new();
        let (ct, at) = mimes(&demux, "*/*", "text/plain");
        let handle = demux.connect("/", Method::GET, ct, at, Arc::new(|_, _| {})).unwrap();
        handle.disable();
        assert!(!handle.is_enabled());

        let mut dev = MockDevice::new(b"GET / HTTP/1.1\r\nAccept: text/plain\r\n\r\n");
        let req = Request::parse(&mut dev).unwrap();
        assert!(matches!(demux.determine_request_handler(&req), RouteOutcome::NotAcceptable));
    }

    #[test]
    fn duplicate_exact_registration_is_rejected() {
        let demux = Demultiplexer::new();
        let (ct, at) = mimes(&demux, "*/*", "text/plain");
        let _handle = demux.connect("/", Method::GET, ct, at, Arc::new(|_, _| {})).unwrap();
        assert!(demux.connect("/", Method::GET, ct, at, Arc::new(|_, _| {})).is_err());
    }

    #[test]
    fn wildcard_content_type_is_accepted_at_registration() {
        let demux = Demultiplexer::new();
        let wildcard = Mime::wildcard();
        let at = demux.state.registry.parse("text/plain");
        assert!(demux.connect("/", Method::GET, wildcard, at, Arc::new(|_, _| {})).is_ok());
    }

    #[test]
    fn rejects_invalid_content_type() {
        let demux = Demultiplexer::new();
        let invalid = Mime { type_id: crate::http::mime::INVALID, subtype_id: crate::http::mime::INVALID, quality: 10 };
        let at = demux.state.registry.parse("text/plain");
        assert!(demux.connect("/", Method::GET, invalid, at, Arc::new(|_, _| {})).is_err());
    }
}

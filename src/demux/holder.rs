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

//! Owns one unit of a handler's usage counter for the duration of a
//! single invocation. `in_flight` is incremented by
//! [`Demultiplexer::determine_request_handler`][crate::demux::Demultiplexer::determine_request_handler]
//! while it already holds the table lock; this type's destructor is
//! the only place the counter is decremented.

use crate::demux::demultiplexer::{Callback, Demultiplexer, HandlerId};
use crate::http::request::Request;
use crate::http::response::Response;

pub struct Holder {
    demux: Demultiplexer,
    id: HandlerId,
    callback: Callback,
}

impl Holder {
    pub(crate) fn new(demux: Demultiplexer, id: HandlerId, callback: Callback) -> Holder {
        Holder { demux, id, callback }
    }

    pub fn accept_type(&self) -> crate::http::mime::Mime {
        self.id.accept_type
    }

    /// Invokes the held handler. Must be called with the thread's
    /// re-entrancy guard set, so that the handler dropping its own
    /// [`Handle`][crate::demux::Handle] is detected rather than
    /// deadlocking.
    pub fn call(&self, request: &Request, response: &mut Response) {
        (self.callback)(request, response);
    }
}

impl Drop for Holder {
    fn drop(&mut self) {
        self.demux.decrease_usage_counter(&self.id);
    }
}

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

//! Owned token for a registered handler. Dropping it unregisters the
//! handler, blocking until any invocation in flight has finished.

use crate::demux::demultiplexer::{Demultiplexer, HandlerId};

/// Returned by [`Demultiplexer::connect`][crate::demux::Demultiplexer::connect].
/// Not `Clone`: the registration has exactly one owner, and dropping it
/// is what disconnects the handler.
pub struct Handle {
    demux: Demultiplexer,
    id: HandlerId,
}

impl Handle {
    pub(crate) fn new(demux: Demultiplexer, id: HandlerId) -> Handle {
        Handle { demux, id }
    }

    /// Disables the handler: it is skipped by content negotiation until
    /// [`enable`][Handle::enable] is called.
    pub fn disable(&self) {
        self.demux.set_enabled(&self.id, false);
    }

    pub fn enable(&self) {
        self.demux.set_enabled(&self.id, true);
    }

    pub fn is_enabled(&self) -> bool {
        self.demux.is_enabled(&self.id)
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if let Err(e) = self.demux.disconnect(&self.id) {
            log::error!("failed to disconnect handler for {} {}: {}", self.id.method, self.id.path, e);
        }
    }
}

#[cfg(test)]
mod handle_test {
    use std::sync::Arc;

    use crate::demux::demultiplexer::Demultiplexer;
    use crate::http::method::Method;

    #[test]
    fn disable_then_enable_round_trips() {
        let demux = Demultiplexer::new();
        let ct = demux.registry().parse("*/*");
        let at = demux.registry().parse("text/plain");
        let handle = demux.connect("/", Method::GET, ct, at, Arc::new(|_, _| {})).unwrap();
        assert!(handle.is_enabled());
        handle.disable();
        assert!(!handle.is_enabled());
        handle.enable();
        assert!(handle.is_enabled());
    }
}

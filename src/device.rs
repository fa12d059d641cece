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

//! The block-device contract the lexer and response encoder are built
//! against. This is the only interface the socket layer has to satisfy;
//! the accept loop, connection pooling, and graceful shutdown are left to
//! the embedder.

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

/// A bidirectional byte stream. Implementations must not perform partial
/// writes: `send` either writes all of `bytes` or fails.
pub trait Connection {
    /// Appends up to `max` bytes to `buffer`. Returns `true` iff at least
    /// one byte was appended; `false` on EOF or error.
    fn receive(&mut self, buffer: &mut Vec<u8>, max: usize) -> bool;

    /// Writes all of `bytes`, or fails.
    fn send(&mut self, bytes: &[u8]) -> bool;

    /// Sets how long a `close` should linger waiting for unsent data to
    /// flush, in seconds.
    fn set_lingering_timeout(&mut self, seconds: u64) -> bool;

    fn close(&mut self);
}

/// A `TcpStream`-backed [`Connection`]. Grounded on the library's generic
/// `Read + Write` stream parameter: this is a concrete instantiation for
/// embedders who just want a socket, not a production accept loop.
pub struct TcpDevice {
    stream: TcpStream,
}

impl TcpDevice {
    pub fn new(stream: TcpStream) -> TcpDevice {
        TcpDevice { stream }
    }
}

impl Connection for TcpDevice {
    fn receive(&mut self, buffer: &mut Vec<u8>, max: usize) -> bool {
        let mut chunk = vec![0u8; max];
        match self.stream.read(&mut chunk) {
            Ok(0) => false,
            Ok(n) => {
                buffer.extend_from_slice(&chunk[..n]);
                true
            }
            Err(_) => false,
        }
    }

    fn send(&mut self, bytes: &[u8]) -> bool {
        self.stream.write_all(bytes).is_ok() && self.stream.flush().is_ok()
    }

    fn set_lingering_timeout(&mut self, seconds: u64) -> bool {
        self.stream.set_read_timeout(Some(Duration::from_secs(seconds))).is_ok()
    }

    fn close(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

/// An in-memory device over a fixed input buffer, used by tests to drive
/// the request parser without a real socket.
pub struct MockDevice {
    pub input: Vec<u8>,
    pub cursor: usize,
    pub output: Vec<u8>,
}

impl MockDevice {
    pub fn new(input: &[u8]) -> MockDevice {
        MockDevice { input: input.to_vec(), cursor: 0, output: Vec::new() }
    }
}

impl Connection for MockDevice {
    fn receive(&mut self, buffer: &mut Vec<u8>, max: usize) -> bool {
        if self.cursor >= self.input.len() {
            return false;
        }
        let end = (self.cursor + max).min(self.input.len());
        buffer.extend_from_slice(&self.input[self.cursor..end]);
        self.cursor = end;
        true
    }

    fn send(&mut self, bytes: &[u8]) -> bool {
        self.output.extend_from_slice(bytes);
        true
    }

    fn set_lingering_timeout(&mut self, _seconds: u64) -> bool {
        true
    }

    fn close(&mut self) {}
}

#[cfg(test)]
mod device_test {
    use super::*;

    #[test]
    fn mock_device_receive_respects_max() {
        let mut dev = MockDevice::new(b"hello world");
        let mut buf = Vec::new();
        assert!(dev.receive(&mut buf, 5));
        assert_eq!(&buf, b"hello");
        assert!(dev.receive(&mut buf, 100));
        assert_eq!(&buf, b"hello world");
        assert!(!dev.receive(&mut buf, 10));
    }
}

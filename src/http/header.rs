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

//! Typed accessors for the small set of header fields the request parser
//! and response encoder understand, plus a string-ordered map (so output
//! is deterministic, unlike a hash map) for every other header.

use std::collections::BTreeMap;

use crate::http::version::Version;

/// Parsed/normalized header state for a request. Every field the parser
/// recognizes gets a typed slot; anything else lands in `custom`, keyed
/// case-insensitively (lower-cased) and ordered lexicographically.
#[derive(Clone, Debug, Default)]
pub struct Header {
    pub connection_close: Option<bool>,
    pub content_length: Option<u64>,
    pub content_md5: Option<String>,
    pub content_type: Option<String>,
    pub date: Option<i64>,
    pub expect: Option<String>,
    pub from: Option<String>,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    pub accept: Option<String>,
    pub host: Option<String>,
    custom: BTreeMap<String, String>,
}

impl Header {
    pub fn new() -> Header {
        Header::default()
    }

    /// Whether the connection should be kept alive, resolving the
    /// `Connection` header against the version default: HTTP/1.1 defaults
    /// to keep-alive, HTTP/1.0 defaults to close.
    pub fn keeps_connection(&self, version: &Version) -> bool {
        match self.connection_close {
            Some(close) => !close,
            None => version.minor() >= 1 && version.major() == 1,
        }
    }

    pub fn set_connection(&mut self, value: &str) {
        self.connection_close = Some(!value.trim().eq_ignore_ascii_case("keep-alive"));
    }

    /// Whether an `Expect` header asking for `100-continue` was sent.
    pub fn expects_continue(&self) -> bool {
        matches!(&self.expect, Some(v) if v.trim().eq_ignore_ascii_case("100-continue"))
    }

    /// An `Expect` header was sent with a value other than `100-continue`,
    /// which this library does not understand.
    pub fn expects_unsupported(&self) -> bool {
        self.expect.is_some() && !self.expects_continue()
    }

    pub fn set_custom(&mut self, name: &str, value: &str) {
        self.custom.insert(name.to_ascii_lowercase(), value.to_string());
    }

    pub fn get_custom(&self, name: &str) -> Option<&str> {
        self.custom.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Iterates custom headers in ascending name order (the order they are
    /// emitted in on output).
    pub fn custom_iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.custom.iter()
    }
}

#[cfg(test)]
mod header_test {
    use super::*;
    use crate::http::version::Version;

    #[test]
    fn keep_alive_default_by_version() {
        let h = Header::new();
        assert!(h.keeps_connection(&Version::HTTP_11));
        assert!(!h.keeps_connection(&Version::HTTP_10));
    }

    #[test]
    fn explicit_connection_header_overrides_default() {
        let mut h = Header::new();
        h.set_connection("close");
        assert!(!h.keeps_connection(&Version::HTTP_11));

        let mut h2 = Header::new();
        h2.set_connection("keep-alive");
        assert!(h2.keeps_connection(&Version::HTTP_10));
    }

    #[test]
    fn custom_headers_are_ordered() {
        let mut h = Header::new();
        h.set_custom("X-Zeta", "1");
        h.set_custom("X-Alpha", "2");
        let names: Vec<&String> = h.custom_iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["x-alpha", "x-zeta"]);
    }
}

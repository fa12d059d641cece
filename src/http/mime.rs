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

//! Bidirectional registry between MIME type/subtype strings and compact
//! integer identifiers, plus the `Mime` pair used throughout content
//! negotiation.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

/// Reserved identifier meaning "not a concrete type" (e.g. unparsable input).
pub const INVALID: u32 = 0;
/// Reserved identifier meaning "matches anything" (the `*` of `*/*`).
pub const WILDCARD: u32 = 1;

/// A registered, case-insensitive string <-> compact-id mapping for either
/// MIME types or MIME subtypes. One instance covers types; a second,
/// independent instance covers subtypes.
struct Registry {
    by_name: HashMap<String, u32>,
    by_id: Vec<String>,
    refs: Vec<u32>,
}

impl Registry {
    fn new() -> Registry {
        Registry { by_name: HashMap::new(), by_id: vec![String::new(), String::from("*")], refs: vec![0, 0] }
    }

    /// Idempotent interning: repeated calls with the same name return the
    /// same id. Used internally by [`MimeRegistry::parse`], which must not
    /// fail just because the string was already seen.
    fn intern(&mut self, name: &str) -> u32 {
        let lower = name.to_ascii_lowercase();
        if let Some(&id) = self.by_name.get(&lower) {
            return id;
        }
        let id = self.by_id.len() as u32;
        self.by_id.push(lower.clone());
        self.refs.push(0);
        self.by_name.insert(lower, id);
        id
    }

    /// Registers a new name, returning [`INVALID`] if it is already
    /// present. Used by the public `register_type`/`register_subtype` API.
    fn register(&mut self, name: &str) -> u32 {
        let lower = name.to_ascii_lowercase();
        if self.by_name.contains_key(&lower) {
            return INVALID;
        }
        self.intern(&lower)
    }

    fn lookup(&self, name: &str) -> u32 {
        let lower = name.to_ascii_lowercase();
        if lower == "*" {
            return WILDCARD;
        }
        *self.by_name.get(&lower).unwrap_or(&INVALID)
    }

    fn name(&self, id: u32) -> Option<&str> {
        self.by_id.get(id as usize).map(|s| s.as_str())
    }

    fn increase(&mut self, id: u32) {
        if let Some(r) = self.refs.get_mut(id as usize) {
            *r += 1;
        }
    }

    fn decrease(&mut self, id: u32) {
        if let Some(r) = self.refs.get_mut(id as usize) {
            if *r > 0 {
                *r -= 1;
            }
        }
    }

    fn unregister(&mut self, id: u32) -> bool {
        match self.refs.get(id as usize) {
            Some(0) => true,
            Some(_) => false,
            None => false,
        }
    }
}

/// The process-wide (or per-demultiplexer) MIME string registry. Holds
/// types and subtypes in two independent tables, each mutex-guarded.
pub struct MimeRegistry {
    types: Mutex<Registry>,
    subtypes: Mutex<Registry>,
}

impl MimeRegistry {
    pub fn new() -> MimeRegistry {
        MimeRegistry { types: Mutex::new(Registry::new()), subtypes: Mutex::new(Registry::new()) }
    }

    pub fn register_type(&self, name: &str) -> u32 {
        self.types.lock().expect("mime registry poisoned").register(name)
    }

    pub fn register_subtype(&self, name: &str) -> u32 {
        self.subtypes.lock().expect("mime registry poisoned").register(name)
    }

    fn intern_type(&self, name: &str) -> u32 {
        self.types.lock().expect("mime registry poisoned").intern(name)
    }

    fn intern_subtype(&self, name: &str) -> u32 {
        self.subtypes.lock().expect("mime registry poisoned").intern(name)
    }

    pub fn unregister_type(&self, id: u32) -> bool {
        self.types.lock().expect("mime registry poisoned").unregister(id)
    }

    pub fn unregister_subtype(&self, id: u32) -> bool {
        self.subtypes.lock().expect("mime registry poisoned").unregister(id)
    }

    pub fn type_name(&self, id: u32) -> Option<String> {
        self.types.lock().expect("mime registry poisoned").name(id).map(str::to_string)
    }

    pub fn subtype_name(&self, id: u32) -> Option<String> {
        self.subtypes.lock().expect("mime registry poisoned").name(id).map(str::to_string)
    }

    pub(crate) fn increase_type(&self, id: u32) {
        self.types.lock().expect("mime registry poisoned").increase(id)
    }

    pub(crate) fn increase_subtype(&self, id: u32) {
        self.subtypes.lock().expect("mime registry poisoned").increase(id)
    }

    pub(crate) fn decrease_type(&self, id: u32) {
        self.types.lock().expect("mime registry poisoned").decrease(id)
    }

    pub(crate) fn decrease_subtype(&self, id: u32) {
        self.subtypes.lock().expect("mime registry poisoned").decrease(id)
    }

    /// Parses `type/subtype`, registering both halves. `*` maps to
    /// [`WILDCARD`]; anything unparsable maps both fields to [`INVALID`].
    pub fn parse(&self, src: &str) -> Mime {
        let trimmed = src.trim();
        match trimmed.find('/') {
            Some(idx) => {
                let type_str = &trimmed[..idx];
                let subtype_str = &trimmed[idx + 1..];
                let type_id = if type_str == "*" { WILDCARD } else { self.intern_type(type_str) };
                let subtype_id = if subtype_str == "*" { WILDCARD } else { self.intern_subtype(subtype_str) };
                Mime { type_id, subtype_id, quality: 10 }
            }
            None => Mime { type_id: INVALID, subtype_id: INVALID, quality: 10 },
        }
    }

    /// Whether `content_type` and `accept_type` are fit for registration:
    /// neither may be [`INVALID`], but either may be [`WILDCARD`] (a
    /// resource may accept any content type, and a handler may produce
    /// any matching representation).
    pub fn are_two_types_valid(&self, content_type: &Mime, accept_type: &Mime) -> bool {
        !content_type.is_invalid() && !accept_type.is_invalid()
    }
}

/// A concrete or partially-wildcarded MIME type/subtype pair, with an
/// associated quality value in tenths (0..=10, i.e. `q=0.0` .. `q=1.0`).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Mime {
    pub type_id: u32,
    pub subtype_id: u32,
    pub quality: u8,
}

impl Mime {
    pub fn wildcard() -> Mime {
        Mime { type_id: WILDCARD, subtype_id: WILDCARD, quality: 10 }
    }

    pub fn is_invalid(&self) -> bool {
        self.type_id == INVALID || self.subtype_id == INVALID
    }

    pub fn is_wildcard(&self) -> bool {
        self.type_id == WILDCARD || self.subtype_id == WILDCARD
    }

    pub fn is_concrete(&self) -> bool {
        !self.is_invalid() && !self.is_wildcard()
    }

    /// True if `self` (as registered by a handler, possibly wildcarded)
    /// matches `other` (typically a concrete request content-type).
    pub fn matches(&self, other: &Mime) -> bool {
        let type_ok = self.type_id == WILDCARD || other.type_id == WILDCARD || self.type_id == other.type_id;
        let subtype_ok =
            self.subtype_id == WILDCARD || other.subtype_id == WILDCARD || self.subtype_id == other.subtype_id;
        type_ok && subtype_ok
    }
}

impl fmt::Display for Mime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{};q={}", self.type_id, self.subtype_id, self.quality)
    }
}

#[cfg(test)]
mod mime_test {
    use super::*;

    #[test]
    fn parse_and_match() {
        let reg = MimeRegistry::new();
        let json = reg.parse("application/json");
        let any = reg.parse("*/*");
        assert!(json.is_concrete());
        assert!(any.is_wildcard());
        assert!(any.matches(&json));
        assert!(json.matches(&any));
    }

    #[test]
    fn same_string_reuses_id() {
        let reg = MimeRegistry::new();
        let a = reg.parse("text/plain");
        let b = reg.parse("TEXT/PLAIN");
        assert_eq!(a, b);
    }

    #[test]
    fn register_type_rejects_duplicate_name() {
        let reg = MimeRegistry::new();
        let first = reg.register_type("application");
        assert_ne!(first, INVALID);
        assert_eq!(reg.register_type("APPLICATION"), INVALID);
    }

    #[test]
    fn unregister_refuses_while_referenced() {
        let reg = MimeRegistry::new();
        let m = reg.parse("text/html");
        reg.increase_type(m.type_id);
        assert!(!reg.unregister_type(m.type_id));
        reg.decrease_type(m.type_id);
        assert!(reg.unregister_type(m.type_id));
    }
}

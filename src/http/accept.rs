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

//! Parses an `Accept` header value into a quality-ranked, re-entrant
//! iterator the demultiplexer walks during content negotiation.

use crate::http::mime::{Mime, MimeRegistry};

/// One accept-entry: a (possibly wildcarded) MIME pair plus its quality
/// and original listing position (used to break quality ties).
#[derive(Clone, Copy)]
struct Entry {
    mime: Mime,
    order: usize,
}

/// A quality-sorted, cloneable cursor over a parsed `Accept` header.
/// Ties in quality are broken by original listing order.
#[derive(Clone)]
pub struct AcceptIter {
    entries: Vec<Entry>,
    pos: usize,
}

impl AcceptIter {
    /// Parses `header_value` (e.g. `application/json;q=0.9, text/plain;q=0.8`)
    /// against `registry`. An empty or absent header is treated as `*/*`.
    pub fn parse(header_value: &str, registry: &MimeRegistry) -> AcceptIter {
        let mut entries = Vec::new();
        let trimmed = header_value.trim();
        if trimmed.is_empty() {
            entries.push(Entry { mime: Mime::wildcard(), order: 0 });
        } else {
            for (order, part) in trimmed.split(',').enumerate() {
                let part = part.trim();
                if part.is_empty() {
                    continue;
                }
                let mut segments = part.split(';');
                let type_subtype = segments.next().unwrap_or("").trim();
                let mut quality: u8 = 10;
                for param in segments {
                    let param = param.trim();
                    if let Some(q) = param.strip_prefix("q=") {
                        quality = parse_quality(q);
                    }
                }
                let mut mime = registry.parse(type_subtype);
                mime.quality = quality;
                entries.push(Entry { mime, order });
            }
        }
        entries.sort_by(|a, b| b.mime.quality.cmp(&a.mime.quality).then(a.order.cmp(&b.order)));
        AcceptIter { entries, pos: 0 }
    }

    /// Resets the cursor to the start without reparsing.
    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    /// Yields the next entry in quality-descending order, or `None` after
    /// the last one.
    pub fn next(&mut self) -> Option<Mime> {
        let entry = self.entries.get(self.pos)?;
        self.pos += 1;
        Some(entry.mime)
    }
}

fn parse_quality(s: &str) -> u8 {
    match s.parse::<f32>() {
        Ok(q) if (0.0..=1.0).contains(&q) => (q * 10.0).round() as u8,
        _ => 10,
    }
}

#[cfg(test)]
mod accept_test {
    use super::*;

    #[test]
    fn sorts_by_quality_descending() {
        let reg = MimeRegistry::new();
        let mut it = AcceptIter::parse("application/json;q=0.9, text/plain;q=1.0", &reg);
        let first = it.next().unwrap();
        assert_eq!(first, reg.parse("text/plain"));
        let second = it.next().unwrap();
        assert_eq!(second, reg.parse("application/json"));
        assert!(it.next().is_none());
    }

    #[test]
    fn empty_header_means_wildcard() {
        let reg = MimeRegistry::new();
        let mut it = AcceptIter::parse("", &reg);
        assert!(it.next().unwrap().is_wildcard());
    }

    #[test]
    fn ties_keep_listing_order() {
        let reg = MimeRegistry::new();
        let mut it = AcceptIter::parse("text/plain, application/json", &reg);
        assert_eq!(it.next().unwrap(), reg.parse("text/plain"));
        assert_eq!(it.next().unwrap(), reg.parse("application/json"));
    }

    #[test]
    fn rewind_replays_from_start() {
        let reg = MimeRegistry::new();
        let mut it = AcceptIter::parse("text/plain", &reg);
        assert!(it.next().is_some());
        assert!(it.next().is_none());
        it.rewind();
        assert!(it.next().is_some());
    }
}

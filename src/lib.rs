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

//! A library core for building HTTP/1.1 services: a request parser, a
//! content-negotiating demultiplexer, and a processor that drives a
//! single request through both. The accept loop, connection pooling and
//! TLS termination are left to the embedder; [`device::TcpDevice`] is a
//! minimal [`device::Connection`] to build one on top of.

pub use demux::{Demultiplexer, Handle, HandlerId, Holder, RouteOutcome};
pub use device::{Connection, TcpDevice};
pub use http::accept::AcceptIter;
pub use http::method::Method;
pub use http::mime::{Mime, MimeRegistry};
pub use http::request::Request;
pub use http::response::Response;
pub use http::status::Status;
pub use http::trie::Trie;
pub use http::uri::Uri;
pub use http::version::Version;
pub use processor::{ErrorHandle, Processor};

mod demux;
mod device;
mod http;
mod processor;
pub mod utils;

// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Reads the protocol header a status-line child process writes before its status stream.
//!
//! A child announces the protocol it speaks with a single JSON object at the very start of its
//! output, for example `{"version":1}`. Everything after the closing brace belongs to the status
//! stream and is left alone. [`parse_header`] extracts the version and reports how many bytes the
//! header occupied, so the caller can advance its read cursor past it:
//!
//! ```
//! use status_header::{ChildHeader, parse_header};
//!
//! let buffer = b"{\"version\":1}\n[\n{\"full_text\":\"12:00\"},\n";
//! let mut header = ChildHeader::default();
//!
//! let consumed = parse_header(&mut header, buffer);
//! assert_eq!(header.version, 1);
//! assert_eq!(&buffer[consumed..], b"\n[\n{\"full_text\":\"12:00\"},\n");
//! ```
//!
//! A return value of `0` means the buffer does not (yet) start with a complete header. Callers
//! that need to know whether waiting for more bytes can help use [`probe_header`]:
//!
//! ```
//! use status_header::{HeaderControlFlow, probe_header};
//!
//! # fn main() -> status_header::HeaderResult<()> {
//! assert_eq!(probe_header(b"{\"vers")?, HeaderControlFlow::NeedMore);
//! assert!(probe_header(b"{\"version\" 1}").is_err());
//!
//! let HeaderControlFlow::Done(decoded) = probe_header(b"{\"version\":2}")? else {
//!     unreachable!()
//! };
//! assert_eq!(decoded.header.version, 2);
//! assert_eq!(decoded.consumed, 13);
//! # Ok(())
//! # }
//! ```
//!
//! # Header fields
//!
//! Only `version` is understood. Its value must be an integer; any other value (strings, numbers
//! with a fraction or exponent, booleans, null) is ignored and leaves `version` at `0`. Unknown
//! keys are accepted so that children may announce fields this crate does not know about.
//!
//! Integers must fit an `i64` wherever they appear in the header; a larger one fails the parse.
//! Numbers with a fraction or exponent are never converted, so `1e400` is as acceptable as `1.5`.
//! Nesting is limited to 127 levels, counting the header object itself.
//! A header without a `version` key cannot be told apart from one with `"version": 0`.
//!
//! # Logging
//!
//! Rejected headers are logged at `debug` level and ignored non-integer `version` values at
//! `warn` level, through the [`log`](https://docs.rs/log) facade.

pub mod error;
pub mod header;
mod parse;
mod scan;
pub mod util;

pub use error::Error;
pub use header::{ChildHeader, CurrentKey, HeaderKey};
pub use parse::{DecodedHeader, HeaderControlFlow, parse_header, probe_header, try_parse_header};
pub use util::max_header_bytes;

/// A convenience type alias for `Result`s with `Error`s.
pub type HeaderResult<T> = Result<T, Error>;

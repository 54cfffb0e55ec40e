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

//! The protocol header of a child process and the keys it may carry.

use strum_macros::{AsRefStr, EnumString};

/// The protocol metadata a child announces at the start of its output.
///
/// A record is owned by whoever manages the child, typically one per child connection.
/// [`parse_header`](crate::parse_header) resets it before every attempt, so a failed attempt
/// never leaves a value from an earlier header behind.
///
/// An absent `version` key and an explicit `"version": 0` both result in `version == 0`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct ChildHeader {
    /// Protocol version spoken by the child. Covers the full `i64` range.
    pub version: i64,
}

impl ChildHeader {
    pub fn new(version: i64) -> Self {
        Self { version }
    }

    /// Reset the record to its defaults.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Header keys this crate understands.
///
/// Keys are matched on their complete, unescaped text: `"versions"` or `"ver"` are unknown keys.
#[derive(Clone, Copy, Debug, Eq, PartialEq, AsRefStr, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum HeaderKey {
    Version,
}

/// The object key whose value is currently being read.
///
/// `None` means the last key seen is not one of the [`HeaderKey`]s.
pub type CurrentKey = Option<HeaderKey>;

impl HeaderKey {
    /// Look up the key for the text of an object key.
    pub fn lookup(key: &str) -> CurrentKey {
        key.parse().ok()
    }
}

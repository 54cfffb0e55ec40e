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

//! Event handling for the header scan.
//!
//! The JSON scanner walks the document and reports keys and values to [`HeaderEvents`]. Keys
//! update the [`CurrentKey`], integers are written to the header when the current key is
//! [`HeaderKey::Version`], and every other value is accepted and dropped.
//!
//! Numbers are never converted to floating point. Integers that do not fit an `i64` fail the
//! scan, wherever they appear; fractions and exponents of any magnitude are dropped.

use std::fmt;

use log::warn;
use serde::de::{self, DeserializeSeed, Deserializer, MapAccess, SeqAccess, Visitor};

use crate::header::{ChildHeader, CurrentKey, HeaderKey};

/// Numbers outside the `u64`/`i64` range reach a visitor as a single-entry map under this key,
/// with the literal number text as its value.
const NUMBER_TOKEN: &str = "$serde_json::private::Number";

/// A complete top-level JSON value, reduced to the header fields it carries.
///
/// The key state lives inside a single call to [`Deserialize::deserialize`](serde::Deserialize),
/// so two scans never share it.
pub(crate) struct ScannedHeader(pub(crate) ChildHeader);

impl<'de> serde::Deserialize<'de> for ScannedHeader {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut header = ChildHeader::default();
        let mut current_key: CurrentKey = None;
        HeaderEvents {
            current_key: &mut current_key,
            header: &mut header,
            number_text: false,
        }
        .deserialize(deserializer)?;
        Ok(ScannedHeader(header))
    }
}

/// Receives the value events of the document, at any nesting depth.
struct HeaderEvents<'a> {
    current_key: &'a mut CurrentKey,
    header: &'a mut ChildHeader,
    /// The next string is the text of a number literal, not a JSON string.
    number_text: bool,
}

impl HeaderEvents<'_> {
    fn reborrow(&mut self) -> HeaderEvents<'_> {
        HeaderEvents {
            current_key: &mut *self.current_key,
            header: &mut *self.header,
            number_text: false,
        }
    }

    fn number(&mut self) -> HeaderEvents<'_> {
        HeaderEvents {
            number_text: true,
            ..self.reborrow()
        }
    }

    fn integer(self, value: i64) {
        if *self.current_key == Some(HeaderKey::Version) {
            self.header.version = value;
        }
    }

    fn ignore(self, kind: fmt::Arguments) {
        if let Some(key) = *self.current_key {
            let key: &str = key.as_ref();
            warn!("Ignoring non-integer value for header key {key:?}: {kind}");
        }
    }

    fn number_literal<E: de::Error>(self, text: &str) -> Result<(), E> {
        let digits = text.strip_prefix('-').unwrap_or(text);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            self.ignore(format_args!("number {text}"));
            return Ok(());
        }
        match text.parse::<i64>() {
            Ok(v) => {
                self.integer(v);
                Ok(())
            }
            Err(_) => Err(integer_overflow(text)),
        }
    }
}

fn integer_overflow<E: de::Error, T: fmt::Display>(literal: T) -> E {
    E::custom(format_args!("integer overflow: {literal}"))
}

impl<'de> DeserializeSeed<'de> for HeaderEvents<'_> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for HeaderEvents<'_> {
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("any JSON value")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        self.integer(v);
        Ok(())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        let Ok(v) = i64::try_from(v) else {
            return Err(integer_overflow(v));
        };
        self.integer(v);
        Ok(())
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        self.ignore(format_args!("boolean {v}"));
        Ok(())
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        if self.number_text {
            return self.number_literal(v);
        }
        self.ignore(format_args!("string {v:?}"));
        Ok(())
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        self.ignore(format_args!("null"));
        Ok(())
    }

    fn visit_seq<A>(mut self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        while seq.next_element_seed(self.reborrow())?.is_some() {}
        Ok(())
    }

    fn visit_map<A>(mut self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        while let Some(kind) = map.next_key_seed(KeyEvent {
            current_key: &mut *self.current_key,
        })? {
            match kind {
                KeyKind::Field => map.next_value_seed(self.reborrow())?,
                KeyKind::Number => map.next_value_seed(self.number())?,
            }
        }
        Ok(())
    }
}

/// What an object key announced.
enum KeyKind {
    /// A regular object key.
    Field,
    /// The map is a number literal; the key state is untouched.
    Number,
}

/// Receives an object key and records which header field, if any, it opens.
struct KeyEvent<'a> {
    current_key: &'a mut CurrentKey,
}

impl<'de> DeserializeSeed<'de> for KeyEvent<'_> {
    type Value = KeyKind;

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(self)
    }
}

impl<'de> Visitor<'de> for KeyEvent<'_> {
    type Value = KeyKind;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an object key")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        if v == NUMBER_TOKEN {
            return Ok(KeyKind::Number);
        }
        *self.current_key = HeaderKey::lookup(v);
        Ok(KeyKind::Field)
    }
}

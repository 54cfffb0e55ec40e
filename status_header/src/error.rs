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

use std::{error::Error as _, fmt};

/// Errors encountered while reading a protocol header.
///
/// To inspect the details of the error use [`details`](Self::details) or [`into_details`](Self::into_details)
/// to get a [`Details`] which contains more precise error information.
///
/// See [`Details`] for all possible errors.
#[derive(thiserror::Error, Debug)]
#[repr(transparent)]
#[error(transparent)]
pub struct Error {
    details: Box<Details>,
}

impl Error {
    pub fn new(details: Details) -> Self {
        Self {
            details: Box::new(details),
        }
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn into_details(self) -> Details {
        *self.details
    }

    /// Whether appending more bytes to the buffer could still turn it into a valid header.
    ///
    /// This is `true` for empty buffers and for JSON that ended in the middle of a value.
    pub fn is_incomplete(&self) -> bool {
        match self.details() {
            Details::EmptyHeader => true,
            Details::ParseHeaderJson(e) => e.is_eof(),
            Details::HeaderTooLarge { .. } => false,
        }
    }
}

impl From<Details> for Error {
    fn from(details: Details) -> Self {
        Self::new(details)
    }
}

#[derive(thiserror::Error)]
pub enum Details {
    #[error("No header found: the buffer is empty or only contains whitespace")]
    EmptyHeader,

    #[error("Failed to parse the header as JSON: {0}")]
    ParseHeaderJson(#[source] serde_json::Error),

    #[error("Header is still incomplete after {size} bytes (maximum allowed: {maximum})")]
    HeaderTooLarge { size: usize, maximum: usize },
}

impl fmt::Debug for Details {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut msg = self.to_string();
        if let Some(e) = self.source() {
            msg.extend([": ", &e.to_string()]);
        }
        write!(f, "{msg}")
    }
}

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

use crate::HeaderResult;
use crate::error::Details;
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Maximum number of bytes [`probe_header`](crate::probe_header) waits for before it
/// gives up on an incomplete header. A child that keeps writing without ever closing its
/// header object would otherwise be waited on forever.
/// See [`max_header_bytes`] to change this limit.
pub const DEFAULT_MAX_HEADER_BYTES: usize = 64 * 1024;
static MAX_HEADER_BYTES: AtomicUsize = AtomicUsize::new(DEFAULT_MAX_HEADER_BYTES);
static MAX_HEADER_BYTES_ONCE: Once = Once::new();

/// Set a new maximum number of bytes an incomplete header may occupy.
/// Once called, the limit cannot be changed.
///
/// **NOTE** This function must be called before probing **any** header. The
/// library leverages [`std::sync::Once`](https://doc.rust-lang.org/std/sync/struct.Once.html)
/// to set the limit either when calling this method, or when probing for
/// the first time.
pub fn max_header_bytes(num_bytes: usize) -> usize {
    MAX_HEADER_BYTES_ONCE.call_once(|| {
        MAX_HEADER_BYTES.store(num_bytes, Ordering::Release);
    });
    MAX_HEADER_BYTES.load(Ordering::Acquire)
}

/// Check that an incomplete header of `len` bytes may still grow.
pub(crate) fn safe_header_len(len: usize) -> HeaderResult<usize> {
    let max_bytes = max_header_bytes(DEFAULT_MAX_HEADER_BYTES);

    if len < max_bytes {
        Ok(len)
    } else {
        Err(Details::HeaderTooLarge {
            size: len,
            maximum: max_bytes,
        }
        .into())
    }
}

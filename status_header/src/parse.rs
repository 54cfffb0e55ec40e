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

use log::debug;

use crate::{
    HeaderResult, error::Details, header::ChildHeader, scan::ScannedHeader, util::safe_header_len,
};

/// A header read from the start of a buffer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DecodedHeader {
    pub header: ChildHeader,
    /// Number of bytes, counted from the start of the buffer, that belong to the header.
    ///
    /// Includes whitespace before the header object, excludes everything after its closing brace.
    pub consumed: usize,
}

/// Indicates whether a buffer holds a complete header or needs more bytes first.
#[must_use]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HeaderControlFlow {
    /// The buffer is a prefix of a header that has not been closed yet.
    NeedMore,
    /// The header is complete.
    Done(DecodedHeader),
}

/// Parse the protocol header at the start of `buffer` into `output`.
///
/// `output` is reset before anything else happens. On success it holds the parsed header and
/// the number of bytes the header occupies is returned. Bytes after the first complete JSON value
/// are not looked at, so the buffer may already contain the start of the status stream.
///
/// Returns `0` if the buffer does not start with a complete JSON value, in which case `output`
/// stays at its defaults. This covers empty input, truncated input and malformed input alike;
/// use [`probe_header`] or [`try_parse_header`] to tell them apart.
///
/// To parse only the first `length` bytes of a larger buffer, pass `&buffer[..length]`.
///
/// ```
/// use status_header::{ChildHeader, parse_header};
///
/// let mut header = ChildHeader::default();
/// let consumed = parse_header(&mut header, b"{\"version\":1}\n[\n");
/// assert_eq!(consumed, 13);
/// assert_eq!(header.version, 1);
/// ```
pub fn parse_header(output: &mut ChildHeader, buffer: &[u8]) -> usize {
    output.reset();

    match try_parse_header(buffer) {
        Ok(DecodedHeader { header, consumed }) => {
            debug!(
                "Parsed header with protocol version {} from {consumed} bytes",
                header.version
            );
            *output = header;
            consumed
        }
        Err(e) => {
            debug!("Rejecting header candidate of {} bytes: {e}", buffer.len());
            0
        }
    }
}

/// Parse the protocol header at the start of `buffer`, reporting why it was rejected.
///
/// Fails with [`Details::EmptyHeader`] if the buffer is empty or only holds whitespace and
/// with [`Details::ParseHeaderJson`] if it does not start with a well-formed JSON value.
pub fn try_parse_header(buffer: &[u8]) -> HeaderResult<DecodedHeader> {
    let mut stream = serde_json::Deserializer::from_slice(buffer).into_iter::<ScannedHeader>();

    match stream.next() {
        Some(Ok(ScannedHeader(header))) => Ok(DecodedHeader {
            header,
            consumed: stream.byte_offset(),
        }),
        Some(Err(e)) => Err(Details::ParseHeaderJson(e).into()),
        None => Err(Details::EmptyHeader.into()),
    }
}

/// Check whether `buffer` holds a complete header.
///
/// Returns [`HeaderControlFlow::NeedMore`] while the buffer is empty or ends in the middle of
/// the header, so the caller can read more bytes and call again. Fails once an incomplete
/// header reaches the limit set through [`max_header_bytes`](crate::util::max_header_bytes),
/// or as soon as the bytes can no longer become valid JSON.
pub fn probe_header(buffer: &[u8]) -> HeaderResult<HeaderControlFlow> {
    match try_parse_header(buffer) {
        Ok(decoded) => Ok(HeaderControlFlow::Done(decoded)),
        Err(e) if e.is_incomplete() => {
            safe_header_len(buffer.len())?;
            Ok(HeaderControlFlow::NeedMore)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    type TestResult = anyhow::Result<()>;

    const HEADER: &[u8] = br#"{"version":1}"#;

    #[test]
    fn parses_minimal_header() {
        let mut header = ChildHeader::default();
        assert_eq!(parse_header(&mut header, HEADER), 13);
        assert_eq!(header, ChildHeader::new(1));
    }

    #[test]
    fn trailing_bytes_are_not_consumed() {
        let mut header = ChildHeader::default();
        let buffer = b"{\"version\":1}\n[extra,bytes]";
        assert_eq!(parse_header(&mut header, buffer), 13);
        assert_eq!(header.version, 1);
    }

    #[rstest]
    #[case(b"{\"version\":1}\n[\n{\"full_text\":\"x\"}]".as_slice(), 13)]
    #[case(b"{\"version\":1}garbage".as_slice(), 13)]
    #[case(b"{\"version\":1}\xff\xfe".as_slice(), 13)]
    #[case(b"{\"version\":1}{\"version\":2}".as_slice(), 13)]
    #[case(b"  \n{\"version\":1}\n".as_slice(), 16)]
    #[case(b"{ \"version\" : 1 }".as_slice(), 17)]
    fn consumed_ends_at_closing_brace(#[case] buffer: &[u8], #[case] expected: usize) {
        let mut header = ChildHeader::default();
        assert_eq!(parse_header(&mut header, buffer), expected);
        assert_eq!(header.version, 1);
    }

    #[test]
    fn missing_version_key_keeps_default() {
        let mut header = ChildHeader::new(5);
        assert_eq!(parse_header(&mut header, br#"{"foo":"bar"}"#), 13);
        assert_eq!(header.version, 0);
    }

    #[test]
    fn non_integer_version_is_ignored() {
        let mut header = ChildHeader::new(5);
        let buffer = br#"{"version":"not-an-int"}"#;
        assert_eq!(parse_header(&mut header, buffer), buffer.len());
        assert_eq!(header.version, 0);
    }

    #[test]
    fn any_top_level_value_is_accepted() {
        let mut header = ChildHeader::new(5);
        assert_eq!(parse_header(&mut header, b"[1]\n"), 3);
        assert_eq!(header.version, 0);
    }

    #[rstest]
    #[case(br#"{"version":2,"scale":1e400}"#.as_slice())]
    #[case(br#"{"version":2,"scale":-1e400}"#.as_slice())]
    #[case(br#"{"scale":1.7976931348623157e309,"version":2}"#.as_slice())]
    fn huge_floats_in_other_fields_are_accepted(#[case] buffer: &[u8]) {
        let mut header = ChildHeader::default();
        assert_eq!(parse_header(&mut header, buffer), buffer.len());
        assert_eq!(header.version, 2);
    }

    #[test]
    fn integer_overflow_fails_the_parse() {
        let long_integer = format!(r#"{{"version":3,"n":1{}}}"#, "0".repeat(400));
        let inputs = [
            br#"{"version":9223372036854775808}"#.as_slice(),
            br#"{"version":-9223372036854775809}"#.as_slice(),
            long_integer.as_bytes(),
        ];
        for buffer in inputs {
            let mut header = ChildHeader::new(42);
            assert_eq!(parse_header(&mut header, buffer), 0);
            assert_eq!(header, ChildHeader::default());
        }
    }

    #[test]
    fn nesting_is_limited_to_127_levels() {
        let nested = |depth: usize| {
            format!(
                r#"{{"version":1,"x":{}{}}}"#,
                "[".repeat(depth),
                "]".repeat(depth)
            )
        };
        let mut header = ChildHeader::default();

        // The header object itself is the first level.
        let accepted = nested(126);
        assert_eq!(parse_header(&mut header, accepted.as_bytes()), accepted.len());
        assert_eq!(header.version, 1);

        let rejected = nested(127);
        assert_eq!(parse_header(&mut header, rejected.as_bytes()), 0);
        assert_eq!(header.version, 0);
    }

    #[rstest]
    #[case(b"".as_slice())]
    #[case(b"   \n\t".as_slice())]
    #[case(b"{".as_slice())]
    #[case(b"{\"version\":1".as_slice())]
    #[case(b"{\"version\":".as_slice())]
    #[case(b"{\"version\" 1}".as_slice())]
    #[case(b"garbage".as_slice())]
    #[case(b"}{".as_slice())]
    #[case(b"{\"version\":01}".as_slice())]
    #[case(b"{\"v\xffersion\":1}".as_slice())]
    #[case(b"{'version':1}".as_slice())]
    fn failure_resets_and_consumes_nothing(#[case] buffer: &[u8]) {
        let mut header = ChildHeader::new(42);
        assert_eq!(parse_header(&mut header, buffer), 0);
        assert_eq!(header, ChildHeader::default());

        // Same input, same outcome.
        assert_eq!(parse_header(&mut header, buffer), 0);
        assert_eq!(header, ChildHeader::default());
    }

    #[test]
    fn success_after_failure_on_same_record() {
        let mut header = ChildHeader::default();
        assert_eq!(parse_header(&mut header, b"{\"version\":"), 0);
        assert_eq!(parse_header(&mut header, br#"{"version":3}"#), 13);
        assert_eq!(header.version, 3);
    }

    #[test]
    fn failure_after_success_resets_record() {
        let mut header = ChildHeader::default();
        assert_eq!(parse_header(&mut header, br#"{"version":3}"#), 13);
        assert_eq!(parse_header(&mut header, b"not json"), 0);
        assert_eq!(header.version, 0);
    }

    #[test]
    fn length_limits_the_scan() {
        let buffer = b"{\"version\":2}";
        let mut header = ChildHeader::default();
        assert_eq!(parse_header(&mut header, &buffer[..0]), 0);
        assert_eq!(parse_header(&mut header, &buffer[..12]), 0);
        assert_eq!(parse_header(&mut header, &buffer[..13]), 13);
        assert_eq!(header.version, 2);
    }

    #[test]
    fn try_parse_reports_empty_header() -> TestResult {
        match try_parse_header(b" \r\n").map_err(|e| e.into_details()) {
            Err(Details::EmptyHeader) => Ok(()),
            other => Err(anyhow!("Unexpected result: {other:?}")),
        }
    }

    #[test]
    fn try_parse_reports_json_error() -> TestResult {
        match try_parse_header(b"{\"version\" 1}").map_err(|e| e.into_details()) {
            Err(Details::ParseHeaderJson(e)) => {
                assert!(e.is_syntax());
                Ok(())
            }
            other => Err(anyhow!("Unexpected result: {other:?}")),
        }
    }

    #[test]
    fn try_parse_returns_header_and_length() -> TestResult {
        let decoded = try_parse_header(b"{\"version\":-1}\n")?;
        assert_eq!(
            decoded,
            DecodedHeader {
                header: ChildHeader::new(-1),
                consumed: 14,
            }
        );
        Ok(())
    }

    #[rstest]
    #[case(b"".as_slice())]
    #[case(b"\n".as_slice())]
    #[case(b"{".as_slice())]
    #[case(b"{\"vers".as_slice())]
    #[case(b"{\"version\":1".as_slice())]
    #[case(b"{\"version\":1,".as_slice())]
    fn waits_for_truncated_header(#[case] buffer: &[u8]) -> TestResult {
        assert_eq!(probe_header(buffer)?, HeaderControlFlow::NeedMore);
        Ok(())
    }

    #[test]
    fn complete_header_is_done() -> TestResult {
        assert_eq!(
            probe_header(b"{\"version\":1}\n[")?,
            HeaderControlFlow::Done(DecodedHeader {
                header: ChildHeader::new(1),
                consumed: 13,
            })
        );
        Ok(())
    }

    #[rstest]
    #[case(b"garbage".as_slice())]
    #[case(b"{\"version\" 1".as_slice())]
    #[case(b"]".as_slice())]
    #[case(b"{\"version\":99999999999999999999".as_slice())]
    fn malformed_header_is_an_error(#[case] buffer: &[u8]) {
        match probe_header(buffer) {
            Err(e) => assert!(!e.is_incomplete()),
            Ok(flow) => panic!("Expected {buffer:?} to be rejected, got {flow:?}"),
        }
    }
}

//! HTTP Range header parsing module
//!
//! Only the single-window form `bytes=<start>-<end>` is understood. The end
//! offset is exclusive: the window holds `end - start` bytes. Bounds are never
//! checked against the file size, reads simply stop at EOF.

/// Requested byte window
///
/// `start == 0 && end == 0` means no range was requested.
/// `end == 0` with `start > 0` means "from `start` until EOF".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeSpec {
    pub start: u64,
    pub end: u64,
}

impl RangeSpec {
    /// Whether the window differs from "whole file"
    #[inline]
    pub const fn is_requested(&self) -> bool {
        self.start > 0 || self.end > 0
    }

    /// Number of bytes to copy, `None` meaning until EOF
    #[inline]
    pub const fn limit(&self) -> Option<u64> {
        if self.end > 0 {
            Some(self.end.saturating_sub(self.start))
        } else {
            None
        }
    }
}

/// Parse a `Range` header value
///
/// Anything not starting with `bytes=<digits>` yields the default (no range).
/// A start without a usable end (`bytes=5`, `bytes=5-`, `bytes=5-x`) reads
/// from the start to EOF. Text after the second number is ignored.
///
/// # Examples
/// ```
/// use devserve::http::range::{parse_range_header, RangeSpec};
///
/// assert_eq!(parse_range_header(Some("bytes=2-5")), RangeSpec { start: 2, end: 5 });
/// assert_eq!(parse_range_header(Some("bytes=-5")), RangeSpec::default());
/// assert_eq!(parse_range_header(None), RangeSpec::default());
/// ```
pub fn parse_range_header(range_header: Option<&str>) -> RangeSpec {
    range_header
        .and_then(|header| scan_range(header.trim()))
        .unwrap_or_default()
}

fn scan_range(header: &str) -> Option<RangeSpec> {
    let rest = header.strip_prefix("bytes=")?;
    let (start, rest) = take_number(rest)?;
    // A start alone keeps reading to EOF
    let end = rest
        .strip_prefix('-')
        .and_then(take_number)
        .map_or(0, |(end, _)| end);
    Some(RangeSpec { start, end })
}

/// Split a leading run of ASCII digits off `input` and parse it
fn take_number(input: &str) -> Option<(u64, &str)> {
    let digits = input.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let value = input[..digits].parse().ok()?;
    Some((value, &input[digits..]))
}

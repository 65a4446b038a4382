//! Recovery scan for truncated or garbage-suffixed JSON.
//!
//! The scanner is a three-state machine over raw bytes:
//!
//! ```text
//! Normal --'"'--> InString --'\'--> Escape
//!   ^                |                 |
//!   +------'"'-------+<----any byte----+
//! ```
//!
//! Starting at the first `{` or `[`, it counts bracket depth in `Normal` and
//! ignores brackets inside strings. The first byte that brings depth back to
//! zero ends the candidate. Multi-byte UTF-8 sequences never contain ASCII
//! bytes, so scanning bytes instead of chars is safe.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    InString,
    Escape,
}

/// Returns the shortest balanced top-level JSON object or array in `bytes`.
///
/// Returns `None` if there is no opening bracket or the value never closes.
/// The returned slice is only bracket-balanced; callers still have to parse
/// it.
#[must_use]
pub fn salvage_prefix(bytes: &[u8]) -> Option<&[u8]> {
    let start = bytes.iter().position(|b| matches!(b, b'{' | b'['))?;

    let mut state = ScanState::Normal;
    let mut depth: usize = 0;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        state = match (state, byte) {
            (ScanState::Escape, _) => ScanState::InString,
            (ScanState::InString, b'\\') => ScanState::Escape,
            (ScanState::InString, b'"') => ScanState::Normal,
            (ScanState::InString, _) => ScanState::InString,
            (ScanState::Normal, b'"') => ScanState::InString,
            (ScanState::Normal, b'{' | b'[') => {
                depth += 1;
                ScanState::Normal
            }
            (ScanState::Normal, b'}' | b']') => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&bytes[start..=start + offset]);
                }
                ScanState::Normal
            }
            (ScanState::Normal, _) => ScanState::Normal,
        };
    }

    None
}

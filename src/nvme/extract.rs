// Fixed-width field extraction for Identify Controller data
//
// Controller strings are right-padded with spaces (and, for vendor-specific
// regions, NULs). Bytes are never re-encoded: firmware is free to put
// non-ASCII data in these fields and we hand it back unchanged.

use std::fmt;

/// An owned, trimmed copy of a fixed-width controller field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldString(Vec<u8>);

impl FieldString {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix.as_bytes())
    }

    /// Returns the bytes following `prefix`, or `None` if the field does not start with it.
    pub fn strip_prefix(&self, prefix: &str) -> Option<&[u8]> {
        self.0.strip_prefix(prefix.as_bytes())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<&[u8]> for FieldString {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<Vec<u8>> for FieldString {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&str> for FieldString {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl PartialEq<str> for FieldString {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for FieldString {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl fmt::Display for FieldString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// Trim a fixed-width field.
///
/// Leading spaces are skipped; a trailing run of spaces and NULs is dropped.
/// Spaces in the middle of the field are preserved.
pub fn extract(field: &[u8]) -> FieldString {
    let start = field
        .iter()
        .position(|&b| b != b' ')
        .unwrap_or(field.len());
    let visible = &field[start..];

    let end = visible
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map_or(0, |last| last + 1);

    FieldString::from(&visible[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn padded(content: &str, width: usize) -> Vec<u8> {
        let mut buf = content.as_bytes().to_vec();
        buf.resize(width, b' ');
        buf
    }

    #[test]
    fn test_extract_trims_trailing_spaces() {
        assert_eq!(
            extract(&padded("Amazon Elastic Block Store", 40)),
            "Amazon Elastic Block Store"
        );
    }

    #[test]
    fn test_extract_cases() {
        let test_cases: Vec<(&[u8], &str)> = vec![
            (&b"vol0abc123 "[..], "vol0abc123"),
            (&b"   leading"[..], "leading"),
            (&b"/dev/xvda\0\0\0\0"[..], "/dev/xvda"),
            (&b"mixed \0 \0\0  "[..], "mixed"),
            (&b"  inner  space  "[..], "inner  space"),
            (&b""[..], ""),
            (&b"      "[..], ""),
            (&b"\0\0\0\0"[..], ""),
            (&b"  \0\0"[..], ""),
        ];

        for (input, expected) in test_cases {
            assert_eq!(extract(input), expected, "input {:?}", input);
        }
    }

    #[test]
    fn test_leading_nul_is_content() {
        // Only spaces are skipped at the front; a leading NUL stays.
        assert_eq!(extract(b"\0abc  ").as_bytes(), b"\0abc");
    }

    #[test]
    fn test_interior_nul_is_preserved() {
        assert_eq!(extract(b"ab\0cd\0 ").as_bytes(), b"ab\0cd");
    }

    #[test]
    fn test_non_ascii_bytes_pass_through() {
        let input = [b' ', 0xC3, 0x28, 0xFF, b' ', 0];
        assert_eq!(extract(&input).as_bytes(), &[0xC3u8, 0x28, 0xFF]);
    }

    #[test]
    fn test_field_string_prefix_helpers() {
        let field = FieldString::from("/dev/xvdf");
        assert!(field.starts_with("/dev/"));
        assert_eq!(field.strip_prefix("/dev/"), Some(&b"xvdf"[..]));
        assert_eq!(field.strip_prefix("vol"), None);
        assert_eq!(field.to_string(), "/dev/xvdf");
        assert_eq!(field.len(), 9);
    }

    proptest! {
        #[test]
        fn prop_padding_is_removed(
            leading in 0usize..16,
            trailing in proptest::collection::vec(prop_oneof![Just(b' '), Just(0u8)], 0..16),
            content in "[!-~]([ -~]{0,30}[!-~])?",
        ) {
            let mut buf = vec![b' '; leading];
            buf.extend_from_slice(content.as_bytes());
            buf.extend_from_slice(&trailing);

            let trimmed = extract(&buf);
            prop_assert_eq!(trimmed.as_bytes(), content.as_bytes());
        }

        #[test]
        fn prop_extract_is_idempotent(field in proptest::collection::vec(any::<u8>(), 0..64)) {
            let once = extract(&field);
            let mut repadded = once.as_bytes().to_vec();
            repadded.resize(field.len(), b' ');

            prop_assert_eq!(extract(&repadded), once);
        }
    }
}

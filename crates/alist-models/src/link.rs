//! The `alist://` link scheme.
//!
//! A link is the literal prefix [`SCHEME`] immediately followed by a
//! percent-encoded absolute path:
//!
//! ```text
//! alist://%2Ftest%2Ffile.txt   →   /test/file.txt
//! ```

use crate::error::ModelError;

/// Exact, case-sensitive prefix identifying an AList file reference.
pub const SCHEME: &str = "alist://";

/// Root path separator every decoded path must start with.
pub const PATH_SEPARATOR: char = '/';

/// A link whose href carries the [`SCHEME`] prefix.
///
/// Parsed per click and never stored. Parsing only checks the prefix;
/// [`decode_path`](Self::decode_path) performs the validation.
///
/// # Examples
///
/// ```
/// use alist_models::LinkTarget;
///
/// let target = LinkTarget::parse("alist://%2Ftest%2Ffile.txt").unwrap();
/// assert_eq!(target.decode_path().unwrap(), "/test/file.txt");
///
/// assert!(LinkTarget::parse("https://example.com").is_none());
/// assert!(LinkTarget::parse("ALIST://%2Fx").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget {
    /// Always [`SCHEME`].
    pub scheme: &'static str,
    /// Everything after the scheme prefix, still percent-encoded.
    pub raw_encoded_path: String,
}

impl LinkTarget {
    /// Parse an href, returning `None` unless it starts with [`SCHEME`].
    pub fn parse(href: &str) -> Option<Self> {
        href.strip_prefix(SCHEME).map(|rest| Self {
            scheme: SCHEME,
            raw_encoded_path: rest.to_string(),
        })
    }

    /// `true` if `href` carries the exact scheme prefix.
    pub fn matches(href: &str) -> bool {
        href.starts_with(SCHEME)
    }

    /// Build the link for an absolute remote path.
    pub fn for_path(path: &str) -> Self {
        Self {
            scheme: SCHEME,
            raw_encoded_path: encode_path(path),
        }
    }

    /// Percent-decode and validate the path.
    ///
    /// The decoded value must be valid UTF-8, non-empty, and start with
    /// [`PATH_SEPARATOR`].
    pub fn decode_path(&self) -> Result<String, ModelError> {
        let decoded = decode_path(&self.raw_encoded_path)?;
        if decoded.is_empty() {
            return Err(ModelError::InvalidLinkPath {
                value: self.raw_encoded_path.clone(),
                reason: "path is empty".into(),
            });
        }
        if !decoded.starts_with(PATH_SEPARATOR) {
            return Err(ModelError::InvalidLinkPath {
                value: self.raw_encoded_path.clone(),
                reason: format!("path must start with '{PATH_SEPARATOR}'"),
            });
        }
        Ok(decoded)
    }

    /// Render back to an href string.
    pub fn to_href(&self) -> String {
        format!("{}{}", self.scheme, self.raw_encoded_path)
    }
}

/// Percent-encode a path so that it survives inside an href, `/` included.
pub fn encode_path(path: &str) -> String {
    urlencoding::encode(path).into_owned()
}

/// Percent-decode a path previously produced by [`encode_path`].
pub fn decode_path(encoded: &str) -> Result<String, ModelError> {
    urlencoding::decode(encoded)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| ModelError::InvalidLinkPath {
            value: encoded.to_string(),
            reason: format!("not valid UTF-8 after decoding: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_is_eight_characters() {
        assert_eq!(SCHEME.len(), 8);
    }

    #[test]
    fn parse_keeps_encoded_remainder() {
        let target = LinkTarget::parse("alist://%2Fa%20b").unwrap();
        assert_eq!(target.raw_encoded_path, "%2Fa%20b");
        assert_eq!(target.decode_path().unwrap(), "/a b");
    }

    #[test]
    fn parse_is_case_sensitive() {
        assert!(LinkTarget::parse("Alist://%2Fx").is_none());
        assert!(LinkTarget::parse("alist:/%2Fx").is_none());
        assert!(LinkTarget::parse(" alist://%2Fx").is_none());
    }

    #[test]
    fn unencoded_absolute_path_is_accepted() {
        let target = LinkTarget::parse("alist:///docs/readme.md").unwrap();
        assert_eq!(target.decode_path().unwrap(), "/docs/readme.md");
    }

    #[test]
    fn empty_path_is_rejected() {
        let target = LinkTarget::parse("alist://").unwrap();
        let err = target.decode_path().unwrap_err();
        assert!(err.to_string().contains("path is empty"));
    }

    #[test]
    fn relative_path_is_rejected() {
        let target = LinkTarget::parse("alist://test%2Ffile.txt").unwrap();
        assert!(target.decode_path().is_err());
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let target = LinkTarget::parse("alist://%2F%FF%FE").unwrap();
        assert!(target.decode_path().is_err());
    }

    #[test]
    fn encode_decode_preserves_unicode_and_reserved_characters() {
        let paths = [
            "/test/file.txt",
            "/文档/报告 2024.md",
            "/a?b=c&d#frag/[x]/100%/plus+sign",
            "/emoji/📁/😀.png",
            "/spaces and\ttabs/semi;colon,comma",
        ];
        for path in paths {
            let encoded = encode_path(path);
            assert!(!encoded.contains('/'), "slash left unencoded in {encoded}");
            assert_eq!(decode_path(&encoded).unwrap(), path);
        }
    }

    #[test]
    fn for_path_round_trips_through_href() {
        let href = LinkTarget::for_path("/test/file.txt").to_href();
        assert_eq!(href, "alist://%2Ftest%2Ffile.txt");
        let parsed = LinkTarget::parse(&href).unwrap();
        assert_eq!(parsed.decode_path().unwrap(), "/test/file.txt");
    }
}

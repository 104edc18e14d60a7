use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DigestError {
    #[error("digest '{0}' has no algorithm prefix")]
    MissingAlgorithm(String),
    #[error("digest '{0}' has a malformed hash portion (expected 64 hex characters)")]
    MalformedHash(String),
}

/// Check that a content hash string is well-formed: 64 hex characters
/// (case-insensitive), optionally followed by `:<variant>`.
///
/// This gates every digest before it is used to build a filesystem path or
/// sent to the registry, so a corrupt manifest can never smuggle path
/// separators into a link destination.
pub fn is_valid_hash(s: &str) -> bool {
    let (hex, variant) = match s.split_once(':') {
        Some((hex, rest)) => (hex, Some(rest)),
        None => (s, None),
    };
    if hex.len() != 64 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return false;
    }
    match variant {
        Some(rest) => !rest.is_empty(),
        None => true,
    }
}

/// A parsed content digest of the form `<algorithm>:<hex>`.
///
/// The hash portion must satisfy [`is_valid_hash`]; parsing rejects anything
/// else, so a constructed `Digest` is always safe to embed in a file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest {
    algorithm: String,
    hash: String,
}

impl Digest {
    pub fn parse(s: &str) -> Result<Self, DigestError> {
        let Some((algorithm, hash)) = s.split_once(':') else {
            return Err(DigestError::MissingAlgorithm(s.to_owned()));
        };
        if algorithm.is_empty() || !algorithm.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(DigestError::MissingAlgorithm(s.to_owned()));
        }
        if !is_valid_hash(hash) {
            return Err(DigestError::MalformedHash(s.to_owned()));
        }
        Ok(Self {
            algorithm: algorithm.to_owned(),
            hash: hash.to_owned(),
        })
    }

    #[inline]
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// The 64-character hex portion, without any trailing `:variant`.
    #[inline]
    pub fn hex(&self) -> &str {
        &self.hash[..64]
    }

    /// File name of the blob for this digest, using the given separator
    /// between algorithm and hash. Linux stores use `:` verbatim; platforms
    /// whose filesystems cannot address colons substitute `-`.
    pub fn blob_file_name(&self, separator: char) -> String {
        format!("{}{}{}", self.algorithm, separator, self.hash)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hash)
    }
}

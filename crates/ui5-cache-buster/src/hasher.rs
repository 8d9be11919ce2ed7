//! Content hashing for application directories
//!
//! A hash token is a digest of the application's content bundle, encoded in a
//! compact alphabet and truncated to a short fixed length. The base-N
//! encodings use the same alphabets and digit order as webpack's
//! `loader-utils`, so a given bundle produces the same directory name as the
//! JavaScript build tooling.

use crate::error::{BustError, ConfigError, Result};
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Conventional content-bundle file of a UI5 component
pub const CONTENT_BUNDLE_FILE: &str = "Component-preload.js";

/// Longest hash token that may be requested
pub const MAX_HASH_LENGTH: usize = 128;

/// Digest algorithm applied to the bundle bytes
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// MD5 (128 bit)
    Md5,
    /// SHA-256
    Sha256,
    /// SHA-512
    #[default]
    Sha512,
}

impl HashAlgorithm {
    /// Compute the raw digest of `data`
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Md5 => Md5::digest(data).to_vec(),
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
        }
    }
}

/// Text encoding of the digest
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DigestEncoding {
    /// Lowercase hexadecimal
    Hex,
    /// Lowercase letters
    Base26,
    /// Digits and lowercase letters without `0`, `l`, `i` and `o`
    Base32,
    /// Digits and lowercase letters
    Base36,
    /// Letters without `l`, `I` and `O`
    Base49,
    /// Lowercase and uppercase letters
    Base52,
    /// Digits and letters without `0`, `l`, `I` and `O`
    Base58,
    /// Digits, lowercase and uppercase letters
    #[default]
    Base62,
    /// Base62 plus `-` and `_`
    Base64,
}

impl DigestEncoding {
    /// Characters a token in this encoding may contain
    pub const fn alphabet(self) -> &'static str {
        match self {
            Self::Hex => "0123456789abcdef",
            Self::Base26 => "abcdefghijklmnopqrstuvwxyz",
            Self::Base32 => "123456789abcdefghjkmnpqrstuvwxyz",
            Self::Base36 => "0123456789abcdefghijklmnopqrstuvwxyz",
            Self::Base49 => "abcdefghijkmnopqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ",
            Self::Base52 => "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ",
            Self::Base58 => "123456789abcdefghijkmnopqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ",
            Self::Base62 => "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ",
            Self::Base64 => "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ-_",
        }
    }

    /// Encode a raw digest
    pub fn encode(self, digest: &[u8]) -> String {
        match self {
            Self::Hex => hex::encode(digest),
            _ => encode_to_base(digest, self.alphabet().as_bytes()),
        }
    }
}

/// Interpret `digest` as a little-endian integer and write it in the base
/// given by `alphabet`, most significant digit first.
fn encode_to_base(digest: &[u8], alphabet: &[u8]) -> String {
    let base = alphabet.len() as u32;
    // Big-endian magnitude without leading zeros
    let mut number: Vec<u8> = digest
        .iter()
        .rev()
        .copied()
        .skip_while(|&byte| byte == 0)
        .collect();
    let mut digits = Vec::new();

    while !number.is_empty() {
        let mut remainder = 0u32;
        let mut quotient = Vec::with_capacity(number.len());
        for &byte in &number {
            let acc = (remainder << 8) | u32::from(byte);
            let q = acc / base;
            remainder = acc % base;
            if !quotient.is_empty() || q != 0 {
                quotient.push(q as u8);
            }
        }
        digits.push(alphabet[remainder as usize]);
        number = quotient;
    }

    digits.iter().rev().map(|&b| char::from(b)).collect()
}

/// How a hash token is derived from bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashOptions {
    /// Digest algorithm
    pub algorithm: HashAlgorithm,
    /// Digest encoding
    pub encoding: DigestEncoding,
    /// Number of leading characters kept
    pub length: usize,
}

impl Default for HashOptions {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::Sha512,
            encoding: DigestEncoding::Base62,
            length: 8,
        }
    }
}

impl HashOptions {
    /// Check that the options can produce a usable token
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.length == 0 || self.length > MAX_HASH_LENGTH {
            return Err(ConfigError::InvalidHashLength {
                length: self.length,
                max: MAX_HASH_LENGTH,
            });
        }
        Ok(())
    }

    /// Derive the hash token of `data`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ui5_cache_buster::HashOptions;
    ///
    /// let token = HashOptions::default().digest(b"Hello, World!");
    /// assert_eq!(token, "vlyxXm9P");
    /// ```
    pub fn digest(&self, data: &[u8]) -> String {
        let mut token = self.encoding.encode(&self.algorithm.digest(data));
        token.truncate(self.length);
        token
    }
}

/// Hashes the content bundle of application directories
#[derive(Debug, Clone)]
pub struct ContentHasher {
    options: HashOptions,
    bundle_files: Vec<PathBuf>,
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new(HashOptions::default(), vec![PathBuf::from(CONTENT_BUNDLE_FILE)])
    }
}

impl ContentHasher {
    /// Create a hasher reading `bundle_files` (relative to each application
    /// directory) in the given order
    pub fn new(options: HashOptions, bundle_files: Vec<PathBuf>) -> Self {
        Self {
            options,
            bundle_files,
        }
    }

    /// Read and concatenate the bundle files of `app_dir`
    pub fn read_bundle(&self, app_dir: &Path) -> Result<Vec<u8>> {
        let mut content = Vec::new();
        for file in &self.bundle_files {
            let path = app_dir.join(file);
            let bytes = fs::read(&path).map_err(|source| BustError::BundleRead {
                path: path.clone(),
                source,
            })?;
            debug!("Read {} bytes from {}", bytes.len(), path.display());
            content.extend_from_slice(&bytes);
        }
        Ok(content)
    }

    /// Compute the hash token of the application in `app_dir`
    pub fn hash_app(&self, app_dir: &Path) -> Result<String> {
        let content = self.read_bundle(app_dir)?;
        Ok(self.options.digest(&content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BUNDLE: &[u8] = b"sap.ui.predefine('my/app/Component', [], function() {});\n";

    #[test]
    fn test_default_matches_loader_utils() {
        let options = HashOptions::default();
        assert_eq!(options.digest(b""), "eALtQHyS");
        assert_eq!(options.digest(b"Hello, World!"), "vlyxXm9P");
        assert_eq!(options.digest(BUNDLE), "WAuJsJ24");
    }

    #[test]
    fn test_other_algorithms_and_encodings() {
        let md5_hex = HashOptions {
            algorithm: HashAlgorithm::Md5,
            encoding: DigestEncoding::Hex,
            length: 8,
        };
        assert_eq!(md5_hex.digest(b"Hello, World!"), "65a8e27d");

        let sha256_base36 = HashOptions {
            algorithm: HashAlgorithm::Sha256,
            encoding: DigestEncoding::Base36,
            length: 10,
        };
        assert_eq!(sha256_base36.digest(b"Hello, World!"), "2s4p5pj1i1");
        assert_eq!(sha256_base36.digest(BUNDLE), "5j71bug8u5");
    }

    #[test]
    fn test_encode_to_base_small_numbers() {
        let alphabet = DigestEncoding::Base62.alphabet().as_bytes();
        assert_eq!(encode_to_base(&[0, 0], alphabet), "");
        assert_eq!(encode_to_base(&[61], alphabet), "Z");
        assert_eq!(encode_to_base(&[62], alphabet), "10");
        // Little-endian: 0x0100 = 256 = 4 * 62 + 8
        assert_eq!(encode_to_base(&[0, 1], alphabet), "48");
    }

    #[test]
    fn test_validate_length() {
        assert!(HashOptions::default().validate().is_ok());

        let zero = HashOptions {
            length: 0,
            ..HashOptions::default()
        };
        assert!(matches!(
            zero.validate(),
            Err(ConfigError::InvalidHashLength { length: 0, .. })
        ));

        let too_long = HashOptions {
            length: MAX_HASH_LENGTH + 1,
            ..HashOptions::default()
        };
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn test_hash_app_concatenates_bundle_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONTENT_BUNDLE_FILE), b"Hello, ").unwrap();
        fs::create_dir(dir.path().join("style")).unwrap();
        fs::write(dir.path().join("style/style.css"), b"World!").unwrap();

        let hasher = ContentHasher::new(
            HashOptions::default(),
            vec![
                PathBuf::from(CONTENT_BUNDLE_FILE),
                PathBuf::from("style/style.css"),
            ],
        );
        assert_eq!(hasher.hash_app(dir.path()).unwrap(), "vlyxXm9P");
    }

    #[test]
    fn test_hash_app_missing_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let err = ContentHasher::default().hash_app(dir.path()).unwrap_err();

        match err {
            BustError::BundleRead { path, source } => {
                assert_eq!(path, dir.path().join(CONTENT_BUNDLE_FILE));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn encoding() -> impl Strategy<Value = DigestEncoding> {
            prop_oneof![
                Just(DigestEncoding::Hex),
                Just(DigestEncoding::Base26),
                Just(DigestEncoding::Base32),
                Just(DigestEncoding::Base36),
                Just(DigestEncoding::Base49),
                Just(DigestEncoding::Base52),
                Just(DigestEncoding::Base58),
                Just(DigestEncoding::Base62),
                Just(DigestEncoding::Base64),
            ]
        }

        fn algorithm() -> impl Strategy<Value = HashAlgorithm> {
            prop_oneof![
                Just(HashAlgorithm::Md5),
                Just(HashAlgorithm::Sha256),
                Just(HashAlgorithm::Sha512),
            ]
        }

        proptest! {
            /// Tokens only use the encoding's alphabet and never exceed the length
            #[test]
            fn token_uses_alphabet(
                data in prop::collection::vec(any::<u8>(), 0..4096),
                algorithm in algorithm(),
                encoding in encoding(),
                length in 1usize..=16,
            ) {
                let options = HashOptions { algorithm, encoding, length };
                let token = options.digest(&data);

                prop_assert!(token.len() <= length);
                prop_assert!(token.chars().all(|c| encoding.alphabet().contains(c)));
            }

            /// The default configuration always yields eight base62 characters
            #[test]
            fn default_token_shape(data in prop::collection::vec(any::<u8>(), 0..4096)) {
                let token = HashOptions::default().digest(&data);

                prop_assert_eq!(token.len(), 8);
                prop_assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
            }

            /// Hashing is a pure function of the bytes
            #[test]
            fn digest_is_deterministic(data in prop::collection::vec(any::<u8>(), 0..4096)) {
                let options = HashOptions::default();
                prop_assert_eq!(options.digest(&data), options.digest(&data.clone()));
            }
        }
    }
}

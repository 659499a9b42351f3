//! Compression detection and gzip decoding

use crate::error::{Error, Result};
use bytes::Bytes;
use flate2::read::MultiGzDecoder;
use serde::{Deserialize, Serialize};
use std::io::Read;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Compression applied to a downloaded file
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    /// Gzip when the URL ends in `.gz` or the body starts with the gzip magic
    #[default]
    Auto,
    /// Plain body
    None,
    /// Gzip-compressed body
    Gzip,
}

impl Compression {
    /// Resolve `Auto` against a URL and the first bytes of its body
    pub fn resolve(self, url: &str, body: &[u8]) -> Compression {
        match self {
            Compression::Auto => {
                let path = url.split(['?', '#']).next().unwrap_or(url);
                if path.ends_with(".gz") || body.starts_with(&GZIP_MAGIC) {
                    Compression::Gzip
                } else {
                    Compression::None
                }
            }
            other => other,
        }
    }
}

/// Decompress a body according to `compression`
pub fn decompress(compression: Compression, url: &str, body: Bytes) -> Result<Bytes> {
    match compression.resolve(url, &body) {
        Compression::Gzip => {
            let mut decoded = Vec::with_capacity(body.len() * 4);
            MultiGzDecoder::new(body.as_ref())
                .read_to_end(&mut decoded)
                .map_err(|e| Error::decode(url, format!("invalid gzip stream: {e}")))?;
            Ok(Bytes::from(decoded))
        }
        Compression::Auto | Compression::None => Ok(body),
    }
}

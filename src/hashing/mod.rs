//! Content digests: image hashes for exact-duplicate detection and text keys
//! for embedding memoisation. Both are BLAKE3.

use std::path::Path;

use blake3::Hasher;
use tokio::io::AsyncReadExt;

/// Length of a hex-rendered image hash.
pub const IMAGE_HASH_HEX_LEN: usize = 64;

const READ_CHUNK: usize = 64 * 1024;

/// Hashes raw image bytes into the 64-char lowercase hex key stored on cache entries.
#[inline]
pub fn hash_image_bytes(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Streams a file through BLAKE3 and returns its hex digest.
pub async fn hash_image_file(path: impl AsRef<Path>) -> std::io::Result<String> {
    let mut file = tokio::fs::File::open(path.as_ref()).await?;
    let mut hasher = Hasher::new();
    let mut buf = vec![0u8; READ_CHUNK];

    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

/// Returns `true` if `value` has the shape of a hash produced by [`hash_image_bytes`].
pub fn is_image_hash(value: &str) -> bool {
    value.len() == IMAGE_HASH_HEX_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// 32-byte key for a piece of text (used by the embedding cache).
#[inline]
pub fn hash_text(text: &str) -> [u8; 32] {
    *blake3::hash(text.as_bytes()).as_bytes()
}

//! Content fingerprints for ingested files

use blake3::Hasher;

/// A hash value represented as a hex string
pub type HashValue = String;

/// BLAKE3 digest of raw file bytes.
///
/// Line endings and a leading byte-order mark are normalised first, so the same
/// export saved on different platforms yields the same fingerprint.
pub fn fingerprint(bytes: &[u8]) -> HashValue {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut hasher = Hasher::new();
    for line in bytes.split(|b| *b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        hasher.update(line);
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().to_string()
}

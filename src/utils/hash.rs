use crate::models::ContentFingerprint;
use sha2::{Digest, Sha256};

/// Length of a hex-encoded fingerprint
pub const FINGERPRINT_LEN: usize = 64;

/// Fingerprints a fully buffered document. The caller keeps ownership of the
/// bytes so the same buffer can be uploaded afterwards.
pub fn compute_fingerprint(data: &[u8]) -> ContentFingerprint {
    let mut hasher = Sha256::new();
    hasher.update(data);
    ContentFingerprint::from_hex(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_fingerprint() {
        let fingerprint = compute_fingerprint(b"hello world");
        // SHA-256 for "hello world"
        assert_eq!(
            fingerprint.as_str(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        assert_eq!(fingerprint.as_str().len(), FINGERPRINT_LEN);
    }

    #[test]
    fn test_compute_fingerprint_empty() {
        // SHA-256 for empty input
        assert_eq!(
            compute_fingerprint(b"").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let doc = b"%PDF-1.7 some document body";
        assert_eq!(compute_fingerprint(doc), compute_fingerprint(&doc.to_vec()));
        assert_ne!(
            compute_fingerprint(doc),
            compute_fingerprint(b"%PDF-1.7 some document bodY")
        );
    }
}

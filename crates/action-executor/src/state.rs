//! Lightweight page fingerprinting for side-effect detection.
//!
//! A click that silently does nothing (hydration gap, dead handler) leaves
//! the URL and the body text prefix unchanged; comparing fingerprints
//! before and after is cheap and does not require a full snapshot.

use page_bridge::PageBridge;

use crate::errors::ExecError;

/// Identity of the document at one instant: URL plus a rolling hash of the
/// body text prefix the bridge reports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageFingerprint {
    pub url: String,
    pub body_hash: u64,
}

impl PageFingerprint {
    pub async fn capture(bridge: &dyn PageBridge) -> Result<Self, ExecError> {
        let probe = bridge.document_probe().await?;
        Ok(Self {
            url: probe.url,
            body_hash: fnv1a(&probe.body_prefix),
        })
    }
}

/// FNV-1a over the UTF-8 bytes. Stable, cheap, collision quality is plenty
/// for change detection.
pub fn fnv1a(s: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET;
    for byte in s.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(fnv1a("hello"), fnv1a("hello"));
        assert_ne!(fnv1a("hello"), fnv1a("hello!"));
        assert_ne!(fnv1a(""), fnv1a(" "));
    }

    #[test]
    fn fingerprints_compare_by_value() {
        let a = PageFingerprint {
            url: "https://example.test/".to_string(),
            body_hash: fnv1a("body"),
        };
        let b = a.clone();
        assert_eq!(a, b);

        let c = PageFingerprint {
            url: a.url.clone(),
            body_hash: fnv1a("different"),
        };
        assert_ne!(a, c);
    }
}

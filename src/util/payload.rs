//! Object payload
//!
//! Every put sends the same body. It is built once per run and shared as
//! [`Bytes`], so handing it to a request is a reference-count bump.

use crate::config::workload::PayloadPattern;
use bytes::Bytes;
use rand::RngCore;

/// Build the body uploaded by every put
pub fn build_payload(size: u64, pattern: PayloadPattern) -> Bytes {
    let mut data = vec![0u8; size as usize];
    if pattern == PayloadPattern::Random {
        rand::thread_rng().fill_bytes(&mut data);
    }
    Bytes::from(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_payload() {
        let payload = build_payload(4096, PayloadPattern::Zeros);
        assert_eq!(payload.len(), 4096);
        assert!(payload.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_random_payload() {
        let payload = build_payload(4096, PayloadPattern::Random);
        assert_eq!(payload.len(), 4096);
        assert!(payload.iter().any(|&b| b != 0));
    }

    #[test]
    fn test_empty_payload() {
        assert!(build_payload(0, PayloadPattern::Random).is_empty());
    }

    #[test]
    fn test_clone_shares_buffer() {
        let payload = build_payload(16, PayloadPattern::Random);
        let copy = payload.clone();
        assert_eq!(payload.as_ptr(), copy.as_ptr());
    }
}

use sha2::{Digest, Sha256};

const STEP_SECS: u64 = 30;
const TOLERANCE_STEPS: i64 = 2;
const DIGITS: u32 = 6;

/// Time-based one-time codes over HMAC-SHA256 (RFC 6238 truncation), shared
/// secret from config. Both the admin panel and this service derive codes
/// from the same secret, so the hash choice only has to agree between them.
#[derive(Clone)]
pub struct TotpVerifier {
    secret: Vec<u8>,
}

impl TotpVerifier {
    pub fn new(secret: &str) -> Self {
        TotpVerifier {
            secret: secret.as_bytes().to_vec(),
        }
    }

    /// Accepts the code for the current 30s step and +-2 neighbouring steps.
    pub fn verify(&self, code: &str, now_unix: u64) -> bool {
        if code.len() != DIGITS as usize || !code.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }

        let current = (now_unix / STEP_SECS) as i64;
        for offset in -TOLERANCE_STEPS..=TOLERANCE_STEPS {
            let counter = current + offset;
            if counter < 0 {
                continue;
            }
            if self.code_at(counter as u64) == code {
                return true;
            }
        }

        false
    }

    pub fn code_at(&self, counter: u64) -> String {
        let digest = hmac_sha256(&self.secret, &counter.to_be_bytes());

        // Dynamic truncation per RFC 4226.
        let offset = (digest[digest.len() - 1] & 0x0f) as usize;
        let binary = ((digest[offset] as u32 & 0x7f) << 24)
            | ((digest[offset + 1] as u32) << 16)
            | ((digest[offset + 2] as u32) << 8)
            | (digest[offset + 3] as u32);

        format!("{:06}", binary % 10u32.pow(DIGITS))
    }
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; 32] {
    const BLOCK_SIZE: usize = 64;

    let mut block_key = [0u8; BLOCK_SIZE];
    if key.len() > BLOCK_SIZE {
        block_key[..32].copy_from_slice(&Sha256::digest(key));
    } else {
        block_key[..key.len()].copy_from_slice(key);
    }

    let mut inner = Sha256::new();
    let ipad: Vec<u8> = block_key.iter().map(|b| b ^ 0x36).collect();
    inner.update(&ipad);
    inner.update(message);
    let inner_digest = inner.finalize();

    let mut outer = Sha256::new();
    let opad: Vec<u8> = block_key.iter().map(|b| b ^ 0x5c).collect();
    outer.update(&opad);
    outer.update(inner_digest);
    outer.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_step_code_verifies() {
        let verifier = TotpVerifier::new("shared-admin-secret");
        let now = 1_700_000_000u64;
        let code = verifier.code_at(now / STEP_SECS);
        assert!(verifier.verify(&code, now));
    }

    #[test]
    fn codes_within_tolerance_verify() {
        let verifier = TotpVerifier::new("shared-admin-secret");
        let now = 1_700_000_000u64;
        let current_step = now / STEP_SECS;

        for step in [current_step - 2, current_step + 2] {
            assert!(verifier.verify(&verifier.code_at(step), now));
        }
        assert!(!verifier.verify(&verifier.code_at(current_step - 3), now));
        assert!(!verifier.verify(&verifier.code_at(current_step + 3), now));
    }

    #[test]
    fn malformed_codes_are_rejected() {
        let verifier = TotpVerifier::new("shared-admin-secret");
        assert!(!verifier.verify("12345", 1_700_000_000));
        assert!(!verifier.verify("1234567", 1_700_000_000));
        assert!(!verifier.verify("12a456", 1_700_000_000));
        assert!(!verifier.verify("", 1_700_000_000));
    }

    #[test]
    fn different_secrets_produce_different_codes() {
        let a = TotpVerifier::new("secret-a");
        let b = TotpVerifier::new("secret-b");
        // A 1-in-a-million collision on a fixed counter would be suspicious.
        assert_ne!(a.code_at(56_666_666), b.code_at(56_666_666));
    }

    #[test]
    fn codes_are_always_six_digits() {
        let verifier = TotpVerifier::new("shared-admin-secret");
        for counter in 0..200u64 {
            let code = verifier.code_at(counter);
            assert_eq!(code.len(), 6);
            assert!(code.bytes().all(|b| b.is_ascii_digit()));
        }
    }
}

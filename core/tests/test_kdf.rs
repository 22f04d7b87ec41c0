#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use aead_engine::{
        constants::prf_ids,
        crypto::{derive_epoch_key, AeadEngine, Algorithm},
    };

    const MASTER: &[u8] = b"masterkey";

    #[test]
    fn test_sha256_derivation_changes_with_salt() {
        let k1 = derive_epoch_key(MASTER, &[1; 16], Algorithm::Aes256Gcm, 0, prf_ids::SHA256).unwrap();
        let k2 = derive_epoch_key(MASTER, &[2; 16], Algorithm::Aes256Gcm, 0, prf_ids::SHA256).unwrap();
        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    // Deterministic reproducibility: same inputs → same key
    #[test]
    fn test_reproducibility_sha512() {
        let k1 = derive_epoch_key(MASTER, &[9; 16], Algorithm::Chacha20Poly1305, 7, prf_ids::SHA512).unwrap();
        let k2 = derive_epoch_key(MASTER, &[9; 16], Algorithm::Chacha20Poly1305, 7, prf_ids::SHA512).unwrap();
        assert_eq!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_prf_and_algorithm_are_bound() {
        let a = derive_epoch_key(MASTER, &[3; 16], Algorithm::Aes256Gcm, 0, prf_ids::SHA256).unwrap();
        let b = derive_epoch_key(MASTER, &[3; 16], Algorithm::Aes256Gcm, 0, prf_ids::SHA512).unwrap();
        let c = derive_epoch_key(MASTER, &[3; 16], Algorithm::Chacha20Poly1305, 0, prf_ids::SHA256).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
        assert_ne!(a.as_bytes(), c.as_bytes());
    }

    #[test]
    fn test_key_length_follows_algorithm() {
        for (alg, len) in [
            (Algorithm::Aes128Gcm, 16),
            (Algorithm::Aes192Gcm, 24),
            (Algorithm::Aes256Gcm, 32),
            (Algorithm::Chacha20Poly1305, 32),
        ] {
            let key = derive_epoch_key(MASTER, &[5; 16], alg, 1, prf_ids::SHA256).unwrap();
            assert_eq!(key.len(), len);
        }
    }

    #[test]
    fn test_zero_salt_rejected() {
        assert!(derive_epoch_key(MASTER, &[0; 16], Algorithm::Aes256Gcm, 0, prf_ids::SHA256).is_err());
    }

    #[test]
    fn test_unknown_prf_rejected() {
        let err = derive_epoch_key(MASTER, &[1; 16], Algorithm::Aes256Gcm, 0, 0xBEEF).unwrap_err();
        assert!(err.to_string().contains("0xbeef"));
    }

    #[test]
    fn test_rotated_key_resets_nonce_reuse_guard() {
        let nonce = [4u8; 12];
        let k0 = derive_epoch_key(MASTER, &[6; 16], Algorithm::Aes128Gcm, 0, prf_ids::SHA256).unwrap();
        let k1 = derive_epoch_key(MASTER, &[6; 16], Algorithm::Aes128Gcm, 1, prf_ids::SHA256).unwrap();

        let mut engine = AeadEngine::for_algorithm(Algorithm::Aes128Gcm);
        engine.seal(&k0, &nonce, b"", b"epoch zero").unwrap();
        // same nonce, new epoch key
        engine.seal(&k1, &nonce, b"", b"epoch one").unwrap();
    }

    proptest! {
        #[test]
        fn prop_epochs_yield_distinct_keys(e1 in any::<u64>(), e2 in any::<u64>()) {
            prop_assume!(e1 != e2);
            let k1 = derive_epoch_key(MASTER, &[8; 16], Algorithm::Aes256Gcm, e1, prf_ids::SHA256).unwrap();
            let k2 = derive_epoch_key(MASTER, &[8; 16], Algorithm::Aes256Gcm, e2, prf_ids::SHA256).unwrap();
            prop_assert_ne!(k1.as_bytes(), k2.as_bytes());
        }
    }
}

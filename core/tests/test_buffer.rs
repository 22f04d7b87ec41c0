#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use proptest::prelude::*;
    use aead_engine::buffer::{split_windows, BufferedChannelAdapter, ByteView};
    use aead_engine::constants::TAG_LEN;
    use aead_engine::crypto::{AeadEngine, Algorithm, CryptoError, EngineState, Key, Mode};

    fn adapter(alg: Algorithm) -> (BufferedChannelAdapter, Key) {
        let key = Key::generate_for(alg);
        (BufferedChannelAdapter::new(AeadEngine::for_algorithm(alg), key.clone()), key)
    }

    #[test]
    fn seal_into_then_open_into_heap_views() {
        let (mut adapter, _) = adapter(Algorithm::Aes256Gcm);
        let mut src = ByteView::wrap(b"position and limit".to_vec());
        let mut dst = ByteView::allocate(64);

        let written = adapter.seal_into(&[1u8; 12], b"aad", &mut src, &mut dst).unwrap();
        assert_eq!(written, 18 + TAG_LEN);
        assert_eq!(src.remaining(), 0);
        assert_eq!(dst.position(), written);

        dst.flip();
        let mut plain = ByteView::allocate(64);
        let n = adapter.open_into(&[1u8; 12], b"aad", &mut dst, &mut plain).unwrap();
        assert_eq!(n, 18);
        assert_eq!(plain.written(), b"position and limit");
    }

    #[test]
    fn short_destination_fails_before_any_write() {
        let (mut adapter, _) = adapter(Algorithm::Chacha20Poly1305);
        let mut src = ByteView::wrap(vec![7u8; 32]);
        let mut region = [0xEEu8; 47];
        let mut dst = ByteView::new(&mut region[..]);

        let err = adapter.seal_into(&[2u8; 12], b"", &mut src, &mut dst).unwrap_err();
        assert_eq!(err, CryptoError::BufferTooSmall { required: 32 + TAG_LEN, available: 47 });
        assert_eq!(dst.position(), 0);
        assert_eq!(src.position(), 0);
        assert_eq!(adapter.engine().state(), EngineState::Uninitialized);
        drop(dst);
        assert!(region.iter().all(|&b| b == 0xEE));
    }

    #[test]
    fn destination_capacity_counts_from_position() {
        let (mut adapter, _) = adapter(Algorithm::Aes128Gcm);
        let mut src = ByteView::wrap(vec![1u8; 10]);
        let mut dst = ByteView::allocate(40);
        dst.set_position(20).unwrap();

        assert!(matches!(
            adapter.seal_into(&[3u8; 12], b"", &mut src, &mut dst),
            Err(CryptoError::BufferTooSmall { required: 26, available: 20 })
        ));
    }

    #[test]
    fn growable_destinations_grow_instead_of_failing() {
        let (mut adapter, _) = adapter(Algorithm::Aes256Gcm);
        let mut src = ByteView::wrap(vec![9u8; 1000]);

        let mut heap = ByteView::growable(Vec::<u8>::new());
        assert_eq!(adapter.seal_into(&[4u8; 12], b"", &mut src, &mut heap).unwrap(), 1000 + TAG_LEN);
        assert_eq!(heap.written().len(), 1000 + TAG_LEN);

        src.clear();
        let mut bm = ByteView::allocate_growable(8);
        adapter.seal_into(&[5u8; 12], b"", &mut src, &mut bm).unwrap();
        assert_eq!(bm.written().len(), 1000 + TAG_LEN);
        assert!(bm.capacity() >= 1000 + TAG_LEN);
    }

    #[test]
    fn rejected_init_leaves_growable_destination_alone() {
        let (mut adapter, _) = adapter(Algorithm::Aes256Gcm);
        let mut src = ByteView::wrap(vec![1u8; 100]);
        let mut first = ByteView::allocate(256);
        adapter.seal_into(&[7u8; 12], b"", &mut src, &mut first).unwrap();

        src.clear();
        let mut dst = ByteView::growable(Vec::<u8>::new());
        let err = adapter.seal_into(&[7u8; 12], b"", &mut src, &mut dst).unwrap_err();
        assert_eq!(err, CryptoError::NonceReuse);
        assert_eq!(dst.capacity(), 0);
        assert_eq!(dst.limit(), 0);
        assert_eq!(src.position(), 0);

        let err = adapter.open_into(&[7u8; 8], b"", &mut src, &mut dst).unwrap_err();
        assert_eq!(err, CryptoError::InvalidNonce { expected: 12, actual: 8 });
        assert_eq!(dst.capacity(), 0);
        assert_eq!(dst.limit(), 0);
    }

    #[test]
    fn rekeyed_adapter_needs_the_new_key_to_open() {
        let (mut adapter, old_key) = adapter(Algorithm::Aes128Gcm);
        let new_key = Key::generate(16);
        adapter.rekey(new_key.clone());

        let mut src = ByteView::wrap(b"rotated".to_vec());
        let mut sealed = ByteView::allocate(64);
        adapter.seal_into(&[8u8; 12], b"", &mut src, &mut sealed).unwrap();

        let mut engine = adapter.into_engine();
        let ct = sealed.written().to_vec();
        assert!(engine.open(&old_key, &[8u8; 12], b"", &ct).unwrap_err().is_authentication());
        assert_eq!(engine.open(&new_key, &[8u8; 12], b"", &ct).unwrap(), b"rotated");
    }

    #[test]
    fn failed_open_writes_nothing() {
        let (mut adapter, _) = adapter(Algorithm::Aes192Gcm);
        let mut src = ByteView::wrap(b"attack at dawn".to_vec());
        let mut sealed = ByteView::allocate(64);
        adapter.seal_into(&[6u8; 12], b"", &mut src, &mut sealed).unwrap();
        sealed.flip();

        let mut out = ByteView::new(vec![0xAAu8; 64]);
        let err = adapter.open_into(&[6u8; 12], b"wrong", &mut sealed, &mut out).unwrap_err();
        assert!(err.is_authentication());
        assert_eq!(out.position(), 0);
        assert!(out.get_ref().iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn message_can_span_several_source_views() {
        let (mut adapter, key) = adapter(Algorithm::Chacha20Poly1305);
        let mut parts = [ByteView::wrap(b"alpha ".to_vec()), ByteView::wrap(b"beta ".to_vec()), ByteView::wrap(b"gamma".to_vec())];
        let mut dst = ByteView::allocate(64);

        adapter.begin(Mode::Seal, &[7u8; 12], b"").unwrap();
        for part in parts.iter_mut() {
            adapter.update_from(part).unwrap();
            assert!(!part.has_remaining());
        }
        let n = adapter.finish_into(&mut dst).unwrap();

        let mut reference = AeadEngine::for_algorithm(Algorithm::Chacha20Poly1305);
        let expected = reference.seal(&key, &[7u8; 12], b"", b"alpha beta gamma").unwrap();
        assert_eq!(n, expected.len());
        assert_eq!(dst.written(), expected.as_slice());
    }

    #[test]
    fn too_small_finish_keeps_the_message_open() {
        let (mut adapter, _) = adapter(Algorithm::Aes256Gcm);
        let mut src = ByteView::wrap(vec![3u8; 100]);

        adapter.begin(Mode::Seal, &[8u8; 12], b"").unwrap();
        adapter.update_from(&mut src).unwrap();

        let mut small = ByteView::allocate(50);
        assert!(matches!(adapter.finish_into(&mut small), Err(CryptoError::BufferTooSmall { .. })));
        assert_eq!(adapter.engine().state(), EngineState::Updating(Mode::Seal));

        let mut big = ByteView::allocate(116);
        assert_eq!(adapter.finish_into(&mut big).unwrap(), 116);
    }

    #[test]
    fn adapters_share_a_region_through_disjoint_windows() {
        let (mut left, _) = adapter(Algorithm::Aes128Gcm);
        let (mut right, _) = adapter(Algorithm::Aes128Gcm);
        let mut region = vec![0u8; 2 * (32 + TAG_LEN)];

        {
            let mut windows = split_windows(&mut region, &[32 + TAG_LEN, 32 + TAG_LEN]).unwrap();
            let (a, b) = windows.split_at_mut(1);
            left.seal_into(&[1u8; 12], b"", &mut ByteView::wrap(vec![0x11u8; 32]), &mut a[0]).unwrap();
            right.seal_into(&[1u8; 12], b"", &mut ByteView::wrap(vec![0x22u8; 32]), &mut b[0]).unwrap();
            assert_eq!(a[0].remaining(), 0);
            assert_eq!(b[0].remaining(), 0);
        }

        let (first, second) = region.split_at(32 + TAG_LEN);
        assert_ne!(first, second);
    }

    #[test]
    fn bytes_mut_views_round_trip() {
        let (mut adapter, _) = adapter(Algorithm::Aes256Gcm);
        let mut src = ByteView::new(BytesMut::from(&b"bytes backed"[..]));
        let mut sealed = ByteView::allocate_growable(0);
        adapter.seal_into(&[9u8; 12], b"", &mut src, &mut sealed).unwrap();
        sealed.flip();

        let mut out = ByteView::allocate_growable(0);
        adapter.open_into(&[9u8; 12], b"", &mut sealed, &mut out).unwrap();
        assert_eq!(out.written(), b"bytes backed");
    }

    proptest! {
        #[test]
        fn prop_capacity_below_worst_case_is_rejected(len in 0usize..512, short in 1usize..=16) {
            let (mut adapter, _) = adapter(Algorithm::Aes256Gcm);
            let mut src = ByteView::wrap(vec![0x5Cu8; len]);
            let mut dst = ByteView::allocate(len + TAG_LEN - short);

            let res = adapter.seal_into(&[1u8; 12], b"", &mut src, &mut dst);
            prop_assert!(
                matches!(res, Err(CryptoError::BufferTooSmall { .. })),
                "expected BufferTooSmall, got {:?}",
                res
            );
            prop_assert_eq!(dst.position(), 0);
            prop_assert!(dst.get_ref().iter().all(|&b| b == 0));
        }
    }
}

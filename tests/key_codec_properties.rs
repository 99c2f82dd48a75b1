//! Property tests for PIN-protected key blobs.
//!
//! scrypt runs with a reduced cost here; the blob format does not depend on
//! the cost parameters.

use docseal::{EncryptedKeyBlob, KdfParams, KeyCodec, SignError};
use proptest::prelude::*;

fn codec() -> KeyCodec {
    KeyCodec::with_params(KdfParams {
        log_n: 6,
        r: 8,
        p: 1,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn roundtrip(key in proptest::collection::vec(any::<u8>(), 0..512), pin in ".{0,16}") {
        let codec = codec();
        let blob = codec.encrypt(&key, &pin).unwrap();
        let plain = codec.decrypt(&blob, &pin).unwrap();
        prop_assert_eq!(plain.as_slice(), key.as_slice());
    }

    #[test]
    fn single_bit_flip_rejected(
        key in proptest::collection::vec(any::<u8>(), 1..256),
        pin in "[0-9]{4,8}",
        position in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let codec = codec();
        let mut bytes = codec.encrypt(&key, &pin).unwrap().into_bytes();
        let index = position.index(bytes.len());
        bytes[index] ^= 1 << bit;

        let result = codec.decrypt(&EncryptedKeyBlob::from_bytes(bytes), &pin);
        prop_assert!(matches!(result, Err(SignError::Authentication)));
    }

    #[test]
    fn wrong_pin_rejected(
        key in proptest::collection::vec(any::<u8>(), 1..256),
        pin in "[0-9]{4,8}",
        other in "[0-9]{4,8}",
    ) {
        prop_assume!(pin != other);
        let codec = codec();
        let blob = codec.encrypt(&key, &pin).unwrap();

        let result = codec.decrypt(&blob, &other);
        prop_assert!(matches!(result, Err(SignError::Authentication)));
    }
}

use ctxmix::{
    bucket::{Bucket, ChecksumSearch, ScalarSearch, SwarSearch},
    encoder::Encoder,
    logistic::{squash, stretch},
    Config,
};
use proptest::prelude::*;

proptest! {
    #[test]
    fn coder_round_trips(coded in prop::collection::vec((0u8..2, 0i32..4096), 0..400)) {
        let mut enc = Encoder::compressor(Vec::<u8>::new());
        for &(bit, p) in &coded {
            enc.compress_bit(bit, p).unwrap();
        }
        enc.flush().unwrap();
        let data = enc.into_inner();

        let mut dec = Encoder::decompressor(&data[..]).unwrap();
        for &(bit, p) in &coded {
            prop_assert_eq!(dec.decompress_bit(p).unwrap(), bit);
        }
    }

    #[test]
    fn swar_search_matches_scalar(
        checksums in prop::collection::vec(any::<u16>(), 0..16),
        checksum in any::<u16>(),
    ) {
        prop_assert_eq!(
            SwarSearch.find(&checksums, checksum),
            ScalarSearch.find(&checksums, checksum)
        );
    }

    #[test]
    fn recently_used_slots_are_never_evicted(
        history in prop::collection::vec(1u16..40, 1..60),
        fresh in 40u16..,
    ) {
        let mut b = Bucket::new();
        for &c in &history {
            b.find(c, &SwarSearch);
        }
        let (first, second) = b.mru();
        let kept: Vec<(usize, u16)> = [first, second].iter()
            .filter(|&&i| i < 7)
            .map(|&i| (i, b.checksum(i)))
            .collect();

        let i = b.find(fresh, &SwarSearch);
        prop_assert_eq!(b.checksum(i), fresh);
        for (j, c) in kept {
            prop_assert_ne!(i, j);
            prop_assert_eq!(b.checksum(j), c);
        }
    }

    #[test]
    fn stretch_inverts_squash(d in -800i32..=800) {
        prop_assert!((stretch(squash(d)) - d).abs() <= 1);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn sessions_round_trip(data in prop::collection::vec(any::<u8>(), 0..300), seed in any::<u64>()) {
        let cfg = Config::new().level(0).unwrap().seed(seed);
        let packed = ctxmix::compress(&data, &cfg).unwrap();
        prop_assert_eq!(ctxmix::decompress(&packed, data.len(), &cfg).unwrap(), data);
    }
}

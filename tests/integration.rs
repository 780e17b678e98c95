#[cfg(test)]
mod tests {
    use ctxmix::{Config, ConfigError, Mode, Session};
    use std::io::{BufReader, BufWriter, Cursor};

    const TEXT: &[u8] = b"It was the best of times, it was the worst of times, it was the \
        age of wisdom, it was the age of foolishness, it was the epoch of belief, it was \
        the epoch of incredulity, it was the season of Light, it was the season of \
        Darkness, it was the spring of hope, it was the winter of despair.";

    fn round_trip(data: &[u8], cfg: &Config) -> Vec<u8> {
        let packed = ctxmix::compress(data, cfg).unwrap();
        let unpacked = ctxmix::decompress(&packed, data.len(), cfg).unwrap();
        assert_eq!(unpacked, data);
        packed
    }

    #[test]
    fn text_round_trip() {
        let cfg = Config::new().level(0).unwrap();
        let packed = round_trip(TEXT, &cfg);
        assert!(packed.len() < TEXT.len());
    }

    #[test]
    fn empty_input() {
        let cfg = Config::new().level(0).unwrap();
        let packed = round_trip(&[], &cfg);
        assert_eq!(packed.len(), 1);
    }

    #[test]
    fn binary_round_trip() {
        let cfg = Config::new().level(1).unwrap().seed(99);
        let mut rng = fastrand::Rng::with_seed(1);
        let data: Vec<u8> = (0..3000).map(|_| rng.u8(..)).collect();
        let packed = round_trip(&data, &cfg);
        // Random bytes cannot be compressed much, but must not blow up.
        assert!(packed.len() < data.len() + data.len() / 10);
    }

    #[test]
    fn repetitive_input_compresses() {
        let cfg = Config::default();
        let data = TEXT.repeat(10);
        let packed = round_trip(&data, &cfg);
        assert!(packed.len() * 2 < data.len(), "{} -> {}", data.len(), packed.len());
    }

    #[test]
    fn all_byte_values() {
        let cfg = Config::new().level(0).unwrap();
        let data: Vec<u8> = (0..=255u8).chain((0..=255u8).rev()).collect();
        round_trip(&data, &cfg);
    }

    #[test]
    fn levels_are_validated() {
        assert_eq!(Config::new().level(10), Err(ConfigError::InvalidLevel(10)));
        assert!(Config::new().level(9).is_ok());
    }

    #[test]
    fn compression_is_deterministic() {
        let cfg = Config::new().level(0).unwrap();
        assert_eq!(
            ctxmix::compress(TEXT, &cfg).unwrap(),
            ctxmix::compress(TEXT, &cfg).unwrap()
        );
    }

    #[test]
    fn streamed_sessions() {
        let cfg = Config::new().level(0).unwrap();
        let mut enc = Session::compressor(&cfg, Vec::<u8>::new()).unwrap();
        for chunk in TEXT.chunks(17) {
            enc.compress(chunk).unwrap();
        }
        let packed = enc.finish().unwrap();

        let mut dec = Session::decompressor(&cfg, &packed[..]).unwrap();
        assert_eq!(dec.mode(), Mode::Decompress);
        let mut out = dec.decompress(100).unwrap();
        out.extend(dec.decompress(TEXT.len() - 100).unwrap());
        assert_eq!(out, TEXT);
    }

    #[test]
    fn buffered_file_like_streams() {
        let cfg = Config::new().level(0).unwrap();
        // Existing header bytes stay in front of the coded data.
        let mut file = Cursor::new(b"HDR".to_vec());
        file.set_position(3);

        let mut enc = Session::compressor(&cfg, BufWriter::new(&mut file)).unwrap();
        enc.compress(TEXT).unwrap();
        let coded = enc.position();
        enc.finish().unwrap().into_inner().unwrap();
        let bytes = file.into_inner();
        assert_eq!(&bytes[..3], b"HDR");
        assert_eq!(bytes.len() as u64, 3 + coded + 1);

        let mut reader = BufReader::new(&bytes[3..]);
        let mut dec = Session::decompressor(&cfg, &mut reader).unwrap();
        assert_eq!(dec.decompress(TEXT.len()).unwrap(), TEXT);
    }
}

use tracing::debug;

use crate::{
    config::Config,
    encoder::{Encoder, Mode},
    error::Result,
    predictor::Predictor,
    shared::Shared,
    stream::{ByteRead, ByteWrite},
};

// Session ------------------------------------------------------------------------------------------------------------------------ Session
//
// Drives one predictor and one arithmetic coder over a stream. Every bit
// is predicted, coded, pushed to the cursor, and only then learned, in
// that order, on both sides. Encoder and decoder sessions must be built
// from equal configs.
pub struct Session<S> {
    shared:     Shared,
    predictor:  Predictor,
    encoder:    Encoder<S>,
}
impl<S> Session<S> {
    fn start(cfg: &Config, encoder: Encoder<S>) -> Result<Session<S>> {
        debug!(
            mode = ?encoder.mode(),
            config = %cfg,
            "starting session"
        );
        Ok(Session {
            shared:     Shared::new(cfg),
            predictor:  Predictor::new(cfg)?,
            encoder,
        })
    }

    pub fn mode(&self) -> Mode {
        self.encoder.mode()
    }

    /// Bytes written, or read when decompressing.
    pub fn position(&self) -> u64 {
        self.encoder.position()
    }

    /// Return the stream without flushing.
    pub fn into_inner(self) -> S {
        self.encoder.into_inner()
    }
}
impl<S: ByteWrite> Session<S> {
    /// Compress into `stream` from its current position.
    pub fn compressor(cfg: &Config, stream: S) -> Result<Session<S>> {
        Session::start(cfg, Encoder::compressor(stream))
    }

    pub fn compress_bit(&mut self, bit: u8) -> Result<()> {
        let prediction = self.predictor.predict(&self.shared);
        self.encoder.compress_bit(bit, prediction.p)?;
        self.shared.cursor.push(bit);
        prediction.commit(&mut self.shared);
        Ok(())
    }

    /// Compress bytes, most significant bit first.
    pub fn compress(&mut self, data: &[u8]) -> Result<()> {
        for &byte in data {
            for i in (0..8).rev() {
                self.compress_bit((byte >> i) & 1)?;
            }
        }
        Ok(())
    }

    /// End the session, flushing the coder, and return the stream.
    pub fn finish(mut self) -> Result<S> {
        self.encoder.flush()?;
        Ok(self.encoder.into_inner())
    }
}
impl<S: ByteRead> Session<S> {
    /// Decompress from `stream` at its current position.
    pub fn decompressor(cfg: &Config, stream: S) -> Result<Session<S>> {
        let encoder = Encoder::decompressor(stream)?;
        Session::start(cfg, encoder)
    }

    pub fn decompress_bit(&mut self) -> Result<u8> {
        let prediction = self.predictor.predict(&self.shared);
        let bit = self.encoder.decompress_bit(prediction.p)?;
        self.shared.cursor.push(bit);
        prediction.commit(&mut self.shared);
        Ok(bit)
    }

    /// Decompress `len` bytes.
    pub fn decompress(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            let mut byte = 0u8;
            for _ in 0..8 {
                byte = (byte << 1) | self.decompress_bit()?;
            }
            out.push(byte);
        }
        Ok(out)
    }
}
// ----------------------------------------------------------------------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, BufWriter};

    #[test]
    fn bits_round_trip() {
        let cfg = Config::new().level(0).unwrap();
        let bits = [1, 1, 0, 1, 0, 0, 0, 1, 1, 1, 1];

        let mut enc = Session::compressor(&cfg, Vec::<u8>::new()).unwrap();
        for &bit in &bits {
            enc.compress_bit(bit).unwrap();
        }
        let data = enc.finish().unwrap();

        let mut dec = Session::decompressor(&cfg, &data[..]).unwrap();
        assert_eq!(dec.mode(), Mode::Decompress);
        let out: Vec<u8> = (0..bits.len()).map(|_| dec.decompress_bit().unwrap()).collect();
        assert_eq!(out, bits);
    }

    #[test]
    fn buffered_bytes_round_trip() {
        let cfg = Config::new().level(0).unwrap();
        let data = b"abababababababababababababababababababab".repeat(8);

        let mut enc = Session::compressor(&cfg, BufWriter::new(Vec::<u8>::new())).unwrap();
        enc.compress(&data).unwrap();
        let packed = enc.finish().unwrap().into_inner().unwrap();
        assert!(packed.len() < data.len() / 4);

        let mut dec = Session::decompressor(&cfg, BufReader::new(&packed[..])).unwrap();
        assert_eq!(dec.decompress(data.len()).unwrap(), data);
        assert_eq!(dec.position(), packed.len() as u64);
    }
}

use std::io;

use tracing::{debug, trace};

use crate::stream::{ByteRead, ByteSeek, ByteWrite};

/// Mode (Compress | Decompress)
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum Mode {
    Compress,
    Decompress,
}

// Encoder ------------------------------------------------------------------------------------------------------------------------ Encoder
//
// Binary arithmetic coder. The range [x1, x2] is split in proportion to
// the probability of a 1; a 1 keeps the lower part, a 0 the upper part.
// Whenever x1 and x2 agree on their top byte, that byte is final: it is
// written (or, decoding, shifted out of the read-ahead window x) and the
// range is shifted left by 8 bits.
pub struct Encoder<S> {
    mode:     Mode,
    x1:       u32,   // Left endpoint of range
    x2:       u32,   // Right endpoint of range
    x:        u32,   // Read-ahead window, decompression only
    stream:   S,
    bytes:    u64,   // Bytes written, or read from the stream
    padding:  u64,   // Bytes read past end of input
    flushed:  bool,
}
impl<S> Encoder<S> {
    fn with_mode(mode: Mode, stream: S) -> Encoder<S> {
        Encoder {
            mode,
            x1:       0,
            x2:       0xFFFFFFFF,
            x:        0,
            stream,
            bytes:    0,
            padding:  0,
            flushed:  false,
        }
    }

    /// Split point of the range for probability p (0..4096) of a 1.
    fn split(&self, p: i32) -> u32 {
        debug_assert!((0..4096).contains(&p), "probability {} out of range", p);
        let mut p = p.clamp(0, 4095) as u32;
        if p < 2048 { p += 1; }

        let range = self.x2 - self.x1;
        let mid = self.x1 + (range >> 12) * p + ((range & 0x0FFF) * p >> 12);
        debug_assert!(self.x1 <= mid && mid < self.x2);
        mid
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Bytes written so far, or read from the stream when decompressing.
    pub fn position(&self) -> u64 {
        self.bytes
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}
impl<S: ByteWrite> Encoder<S> {
    /// Compressing coder, writing from the stream's current position.
    pub fn compressor(stream: S) -> Encoder<S> {
        Encoder::with_mode(Mode::Compress, stream)
    }

    fn put(&mut self, byte: u8) -> io::Result<()> {
        self.stream.put_byte(byte)?;
        self.bytes += 1;
        Ok(())
    }

    pub fn compress_bit(&mut self, bit: u8, p: i32) -> io::Result<()> {
        debug_assert!(self.mode == Mode::Compress);
        let mid = self.split(p);
        if bit == 1 {
            self.x2 = mid;
        }
        else {
            self.x1 = mid + 1;
        }

        while ((self.x1 ^ self.x2) & 0xFF000000) == 0 {
            self.put((self.x2 >> 24) as u8)?;
            self.x1 <<= 8;
            self.x2 = (self.x2 << 8) | 255;
        }
        Ok(())
    }

    /// Write the last byte. Compression only, once, after the last bit.
    pub fn flush(&mut self) -> io::Result<()> {
        if self.mode == Mode::Compress && !self.flushed {
            self.put((self.x1 >> 24) as u8)?;
            self.flushed = true;
            debug!(bytes = self.bytes, "encoder flushed");
        }
        Ok(())
    }
}
impl<S: ByteWrite + ByteSeek> Encoder<S> {
    /// Compressing coder appending to the end of a seekable stream.
    pub fn appender(mut stream: S) -> io::Result<Encoder<S>> {
        let size = stream.seek_end()?;
        debug!(offset = size, "appending to stream");
        Ok(Encoder::compressor(stream))
    }
}
impl<S: ByteRead> Encoder<S> {
    /// Decompressing coder, reading from the stream's current position.
    pub fn decompressor(stream: S) -> io::Result<Encoder<S>> {
        let mut dec = Encoder::with_mode(Mode::Decompress, stream);
        for _ in 0..4 {
            dec.x = (dec.x << 8) | dec.next_byte()? as u32;
        }
        Ok(dec)
    }

    fn next_byte(&mut self) -> io::Result<u8> {
        match self.stream.get_byte()? {
            Some(byte) => {
                self.bytes += 1;
                Ok(byte)
            }
            None => {
                if self.padding == 0 {
                    trace!(bytes = self.bytes, "end of input, padding with 0xFF");
                }
                self.padding += 1;
                Ok(0xFF)
            }
        }
    }

    pub fn decompress_bit(&mut self, p: i32) -> io::Result<u8> {
        debug_assert!(self.mode == Mode::Decompress);
        let mid = self.split(p);
        let bit = (self.x <= mid) as u8;
        if bit == 1 {
            self.x2 = mid;
        }
        else {
            self.x1 = mid + 1;
        }

        while ((self.x1 ^ self.x2) & 0xFF000000) == 0 {
            self.x1 <<= 8;
            self.x2 = (self.x2 << 8) | 255;
            self.x = (self.x << 8) | self.next_byte()? as u32;
        }
        Ok(bit)
    }
}
// ----------------------------------------------------------------------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, BufWriter, Cursor, Write};

    fn encode(bits: &[u8], probs: &[i32]) -> Vec<u8> {
        let mut enc = Encoder::compressor(Vec::<u8>::new());
        for (&bit, &p) in bits.iter().zip(probs.iter()) {
            enc.compress_bit(bit, p).unwrap();
        }
        enc.flush().unwrap();
        enc.into_inner()
    }

    fn decode(data: &[u8], probs: &[i32]) -> Vec<u8> {
        let mut dec = Encoder::decompressor(data).unwrap();
        probs.iter().map(|&p| dec.decompress_bit(p).unwrap()).collect()
    }

    #[test]
    fn even_odds_round_trip() {
        let bits = [1, 0, 1, 1];
        let probs = [2048; 4];
        let data = encode(&bits, &probs);
        assert_eq!(decode(&data, &probs), bits);
    }

    #[test]
    fn extreme_probabilities_round_trip() {
        let bits: Vec<u8> = (0..500).map(|i| ((i * 7) % 5 == 0) as u8).collect();
        let probs: Vec<i32> = (0..500).map(|i| [0, 1, 4095, 4094, 2047, 100][i % 6]).collect();
        let data = encode(&bits, &probs);
        assert_eq!(decode(&data, &probs), bits);
    }

    #[test]
    fn confident_predictions_compress() {
        let bits = vec![1u8; 8000];
        let probs = vec![4000; 8000];
        let data = encode(&bits, &probs);
        // -log2(4000/4096) = 0.034 bits per bit
        assert!(data.len() < 60, "{} bytes", data.len());
        assert_eq!(decode(&data, &probs), bits);
    }

    #[test]
    fn buffered_streams_round_trip() {
        let bits: Vec<u8> = (0..300).map(|i| (i % 3 == 0) as u8).collect();
        let mut enc = Encoder::compressor(BufWriter::new(Vec::<u8>::new()));
        for &bit in &bits {
            enc.compress_bit(bit, 1365).unwrap();
        }
        enc.flush().unwrap();
        assert_eq!(enc.mode(), Mode::Compress);
        let written = enc.position();
        let data = enc.into_inner().into_inner().unwrap();
        assert_eq!(data.len() as u64, written);

        let mut dec = Encoder::decompressor(BufReader::new(&data[..])).unwrap();
        for &bit in &bits {
            assert_eq!(dec.decompress_bit(1365).unwrap(), bit);
        }
    }

    #[test]
    fn appender_writes_after_existing_bytes() {
        let mut stream = Cursor::new(vec![9u8, 9]);
        stream.set_position(0);
        let mut enc = Encoder::appender(stream).unwrap();
        enc.compress_bit(1, 2048).unwrap();
        enc.flush().unwrap();
        enc.flush().unwrap();
        assert_eq!(enc.position(), 1);
        let out = enc.into_inner().into_inner();
        assert_eq!(&out[..2], &[9, 9]);
        assert_eq!(out.len(), 3);
    }

    struct FullDisk;
    impl Write for FullDisk {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }
        fn flush(&mut self) -> io::Result<()> { Ok(()) }
    }

    #[test]
    fn write_errors_propagate() {
        let mut enc = Encoder::compressor(FullDisk);
        // An unlikely 0 narrows the range enough to emit a byte.
        let err = enc.compress_bit(0, 4095).unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn truncated_input_pads() {
        let mut dec = Encoder::decompressor(&[0u8; 0][..]).unwrap();
        for _ in 0..64 {
            dec.decompress_bit(2048).unwrap();
        }
        assert_eq!(dec.position(), 0);
    }
}

use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};

// Byte streams used by the arithmetic coder. Any reader or writer will do,
// wrap files in BufReader / BufWriter to avoid one system call per byte.

/// Source of compressed bytes.
pub trait ByteRead {
    /// Read one byte, None at end of stream.
    fn get_byte(&mut self) -> io::Result<Option<u8>>;
}
impl<R: Read> ByteRead for R {
    fn get_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

/// Sink of compressed bytes.
pub trait ByteWrite {
    fn put_byte(&mut self, byte: u8) -> io::Result<()>;
}
impl<W: Write> ByteWrite for W {
    fn put_byte(&mut self, byte: u8) -> io::Result<()> {
        self.write_all(&[byte])
    }
}

/// Streams that can be extended in place.
pub trait ByteSeek {
    /// Move to the end of the stream, returning its total size.
    fn seek_end(&mut self) -> io::Result<u64>;
}
impl<S: Seek> ByteSeek for S {
    fn seek_end(&mut self) -> io::Result<u64> {
        self.seek(SeekFrom::End(0))
    }
}

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const MAX_DEPTH: usize = 4;

/// Opens a file and transparently peels off GZIP/BGZF layers so the header
/// text can be scanned as plain lines.
pub fn open_input(path: &Path) -> io::Result<Box<dyn BufRead + Send>> {
    let file = File::open(path)?;
    peel_gzip(Box::new(BufReader::new(file)))
}

/// Unwrap nested gzip members until the stream no longer starts with the gzip magic.
pub fn peel_gzip(mut reader: Box<dyn BufRead + Send>) -> io::Result<Box<dyn BufRead + Send>> {
    for _ in 0..MAX_DEPTH {
        if !starts_with(&mut reader, &GZIP_MAGIC)? {
            break;
        }
        tracing::debug!("detected GZIP/BGZF layer");
        // MultiGzDecoder handles BGZF blocks and concatenated members.
        reader = Box::new(BufReader::new(MultiGzDecoder::new(reader)));
    }
    Ok(reader)
}

/// Check the buffered prefix of `reader` without consuming it.
pub fn starts_with<R: BufRead + ?Sized>(reader: &mut R, magic: &[u8]) -> io::Result<bool> {
    let buf = reader.fill_buf()?;
    Ok(buf.len() >= magic.len() && &buf[..magic.len()] == magic)
}

/// Read the first bytes of the decompressed stream.
pub fn sniff(path: &Path, len: usize) -> io::Result<Vec<u8>> {
    let reader = open_input(path)?;
    let mut prefix = Vec::with_capacity(len);
    reader.take(len as u64).read_to_end(&mut prefix)?;
    Ok(prefix)
}

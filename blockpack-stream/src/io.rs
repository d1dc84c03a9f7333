//! `std::io` adapters.
//!
//! [`BlockWriter`] frames everything written to it and forwards the blocks
//! to an inner writer; [`BlockReader`] reads a framed stream from an inner
//! reader and serves the decoded bytes.

use std::io::{self, Read, Write};

use crate::compress::BlockEncoder;
use crate::config::StreamConfig;
use crate::cursor::{InBuffer, OutBuffer};
use crate::header::HEADER_SIZE;
use crate::partial::PartialDecoder;
use blockpack_core::error::Result;
use blockpack_core::traits::FlushMode;
use blockpack_lz4::compress_bound;

/// Size of the read-ahead buffer of [`BlockReader`].
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Writer that compresses into a framed block stream.
///
/// Call [`BlockWriter::finish`] to emit the last block; dropping the writer
/// loses buffered data.
#[derive(Debug)]
pub struct BlockWriter<W: Write> {
    inner: W,
    encoder: BlockEncoder,
    /// Framed output of one `compress` call.
    scratch: Vec<u8>,
}

impl<W: Write> BlockWriter<W> {
    /// Wrap `inner` with the given configuration.
    pub fn new(inner: W, config: StreamConfig) -> Result<Self> {
        let encoder = BlockEncoder::new(config)?;
        // At most one short block plus one full block per call
        let scratch = vec![0u8; 2 * (compress_bound(config.block_size) + HEADER_SIZE)];
        Ok(Self {
            inner,
            encoder,
            scratch,
        })
    }

    /// The inner writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Total uncompressed bytes accepted.
    pub fn total_in(&self) -> u64 {
        self.encoder.total_in()
    }

    /// Total framed bytes produced.
    pub fn total_out(&self) -> u64 {
        self.encoder.total_out()
    }

    /// Emit the buffered data as a final block and reset the history. The
    /// writer stays usable and the next block starts a new stream.
    pub fn try_finish(&mut self) -> Result<()> {
        self.run(&[], FlushMode::Finish)?;
        self.inner.flush()?;
        Ok(())
    }

    /// Finish the stream and return the inner writer.
    pub fn finish(mut self) -> Result<W> {
        self.try_finish()?;
        Ok(self.inner)
    }

    fn run(&mut self, data: &[u8], flush: FlushMode) -> Result<usize> {
        let mut input = InBuffer::new(data);
        let mut output = OutBuffer::new(&mut self.scratch);
        self.encoder.compress(&mut input, &mut output, flush)?;
        self.inner.write_all(output.written())?;
        Ok(input.pos())
    }
}

impl<W: Write> Write for BlockWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // At most one block per call
        let take = buf.len().min(self.encoder.config().block_size);
        Ok(self.run(&buf[..take], FlushMode::NoFlush)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.run(&[], FlushMode::Sync)?;
        self.inner.flush()
    }
}

/// Reader that decodes a framed block stream.
#[derive(Debug)]
pub struct BlockReader<R: Read> {
    inner: R,
    decoder: PartialDecoder,
    buf: Vec<u8>,
    pos: usize,
    filled: usize,
    eof: bool,
    check_crc: bool,
}

impl<R: Read> BlockReader<R> {
    /// Wrap `inner`, verifying block checksums if `check_crc` is set.
    pub fn new(inner: R, check_crc: bool) -> Self {
        Self {
            inner,
            decoder: PartialDecoder::new(),
            buf: vec![0u8; READ_BUFFER_SIZE],
            pos: 0,
            filled: 0,
            eof: false,
            check_crc,
        }
    }

    /// Total framed bytes consumed.
    pub fn total_in(&self) -> u64 {
        self.decoder.total_in()
    }

    /// Total decoded bytes served.
    pub fn total_out(&self) -> u64 {
        self.decoder.total_out()
    }

    /// Return the inner reader. Read-ahead bytes are lost.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for BlockReader<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }

        loop {
            if self.pos == self.filled && !self.eof {
                self.filled = self.inner.read(&mut self.buf)?;
                self.pos = 0;
                self.eof = self.filled == 0;
            }

            let mut input = InBuffer::new(&self.buf[self.pos..self.filled]);
            let mut output = OutBuffer::new(out);
            self.decoder
                .decompress_partial(&mut input, &mut output, false, self.check_crc)?;
            self.pos += input.pos();

            let produced = output.pos();
            if produced > 0 {
                return Ok(produced);
            }
            if self.eof {
                if self.decoder.has_partial_block() {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "stream ends inside a block",
                    ));
                }
                return Ok(0);
            }
        }
    }
}

//! Resource owner for a compression stream and a decompression stream.
//!
//! [`BlockStream`] bundles one [`BlockEncoder`] and one [`PartialDecoder`]
//! behind the classic cursor API (`init`, `compress`, `decompress`,
//! `decompress_partial`, `close`). It owns every staging buffer and both
//! codec handles, and [`BlockStream::close`] releases them all.

use crate::compress::BlockEncoder;
use crate::config::StreamConfig;
use crate::cursor::{InBuffer, OutBuffer};
use crate::partial::PartialDecoder;
use blockpack_core::error::{BlockpackError, Result};
use blockpack_core::traits::FlushMode;
use blockpack_lz4::{Lz4Decompressor, Lz4HcCompressor};
use tracing::debug;

/// Encoder and decoder state for one logical stream in each direction.
///
/// A default-constructed stream is closed; call [`BlockStream::init`] before
/// use. Operations on a closed stream fail with a buffer error.
#[derive(Debug, Default)]
pub struct BlockStream {
    config: StreamConfig,
    encoder: Option<BlockEncoder<Lz4HcCompressor>>,
    decoder: Option<PartialDecoder<Lz4Decompressor>>,
}

impl BlockStream {
    /// Create and initialize a stream.
    pub fn new(config: StreamConfig) -> Result<Self> {
        let mut stream = Self::default();
        stream.init(config)?;
        Ok(stream)
    }

    /// Allocate the encoder buffers and both codec handles.
    ///
    /// Any previous state is released first. Decoder buffers grow with the
    /// first blocks they see.
    pub fn init(&mut self, config: StreamConfig) -> Result<()> {
        self.close();
        config.validate()?;

        self.encoder = Some(BlockEncoder::new(config)?);
        self.decoder = Some(PartialDecoder::new());
        self.config = config;
        debug!(?config, "block stream initialized");
        Ok(())
    }

    /// Active configuration.
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Whether the stream holds no resources.
    pub fn is_closed(&self) -> bool {
        self.encoder.is_none() && self.decoder.is_none()
    }

    /// Compress from `input` into `output`. See [`BlockEncoder::compress`].
    pub fn compress(
        &mut self,
        input: &mut InBuffer<'_>,
        output: &mut OutBuffer<'_>,
        flush: FlushMode,
    ) -> Result<()> {
        self.encoder_mut()?.compress(input, output, flush)
    }

    /// Decompress whole blocks from `input` into `output`.
    /// See [`BlockDecoder::decompress`](crate::BlockDecoder::decompress).
    pub fn decompress(
        &mut self,
        input: &mut InBuffer<'_>,
        output: &mut OutBuffer<'_>,
        check_crc: bool,
    ) -> Result<()> {
        self.decoder_mut()?
            .decoder_mut()
            .decompress(input, output, check_crc)
    }

    /// Serve one block at a time in slices.
    /// See [`PartialDecoder::decompress_partial`].
    pub fn decompress_partial(
        &mut self,
        input: &mut InBuffer<'_>,
        output: &mut OutBuffer<'_>,
        reset: bool,
        check_crc: bool,
    ) -> Result<()> {
        self.decoder_mut()?
            .decompress_partial(input, output, reset, check_crc)
    }

    /// Compression counters `(total_in, total_out)`.
    pub fn compress_totals(&self) -> (u64, u64) {
        self.encoder
            .as_ref()
            .map_or((0, 0), |enc| (enc.total_in(), enc.total_out()))
    }

    /// Decompression counters `(total_in, total_out)`.
    pub fn decompress_totals(&self) -> (u64, u64) {
        self.decoder.as_ref().map_or((0, 0), |dec| {
            let inner = dec.decoder();
            (inner.total_in(), inner.total_out() + dec.total_out())
        })
    }

    /// Release every buffer and codec handle. Closing a closed stream does
    /// nothing.
    pub fn close(&mut self) {
        if let Some(mut decoder) = self.decoder.take() {
            decoder.release();
        }
        if self.encoder.take().is_some() {
            debug!("block stream closed");
        }
    }

    fn encoder_mut(&mut self) -> Result<&mut BlockEncoder<Lz4HcCompressor>> {
        self.encoder.as_mut().ok_or_else(BlockpackError::stream_closed)
    }

    fn decoder_mut(&mut self) -> Result<&mut PartialDecoder<Lz4Decompressor>> {
        self.decoder.as_mut().ok_or_else(BlockpackError::stream_closed)
    }
}

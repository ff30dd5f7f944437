//! Binary encode/decode of chunked stores.
//!
//! Every store is written as a three-word header followed by raw block bytes:
//!
//! ```text
//! [u32 nb_chunks][u32 nb_lines][u32 chunk_bytes]
//! <chunk_bytes bytes> × (nb_chunks - 1)
//! <last chunk, truncated to cover exactly nb_lines elements>
//! ```
//!
//! Header words and block payloads use the host byte order. No swapping is
//! performed: a stream is only portable between hosts of the same endianness.

use std::io::{Read, Write};

use crate::error::StoreError;

/// Size of the encoded header in bytes.
pub const HEADER_BYTES: usize = 3 * std::mem::size_of::<u32>();

/// The fixed three-word header preceding every serialized store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Number of blocks in the stream.
    pub nb_chunks: u32,
    /// Number of logical elements covered by the payload.
    pub nb_lines: u32,
    /// Byte size of one full block.
    pub chunk_bytes: u32,
}

impl ChunkHeader {
    /// Build a header, rejecting counts that do not fit in 32 bits.
    pub fn new(nb_chunks: usize, nb_lines: usize, chunk_bytes: usize) -> Result<Self, StoreError> {
        Ok(Self {
            nb_chunks: to_header_word("nb_chunks", nb_chunks)?,
            nb_lines: to_header_word("nb_lines", nb_lines)?,
            chunk_bytes: to_header_word("chunk_bytes", chunk_bytes)?,
        })
    }

    /// Encode the header.
    pub fn write_to(&self, w: &mut dyn Write) -> Result<(), StoreError> {
        write_u32_ne(w, self.nb_chunks)?;
        write_u32_ne(w, self.nb_lines)?;
        write_u32_ne(w, self.chunk_bytes)?;
        Ok(())
    }

    /// Decode a header without validating it.
    pub fn read_from(r: &mut dyn Read) -> Result<Self, StoreError> {
        Ok(Self {
            nb_chunks: read_u32_ne(r)?,
            nb_lines: read_u32_ne(r)?,
            chunk_bytes: read_u32_ne(r)?,
        })
    }

    /// Number of payload bytes stored for the last block.
    ///
    /// `chunk_len` is the number of logical elements per block. Zero when the
    /// stream has no blocks, or when `nb_lines` ends before the last block.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_len` is zero.
    pub(crate) fn last_chunk_bytes(&self, chunk_len: usize) -> usize {
        if self.nb_chunks == 0 {
            return 0;
        }
        let before_last = (self.nb_chunks as usize - 1) * chunk_len;
        let lines_in_last = (self.nb_lines as usize).saturating_sub(before_last);
        lines_in_last * self.chunk_bytes as usize / chunk_len
    }

    /// Total encoded size of header plus payload.
    pub(crate) fn encoded_len(&self, chunk_len: usize) -> usize {
        if self.nb_chunks == 0 {
            return HEADER_BYTES;
        }
        HEADER_BYTES
            + (self.nb_chunks as usize - 1) * self.chunk_bytes as usize
            + self.last_chunk_bytes(chunk_len)
    }
}

/// Write a host-order u32.
pub fn write_u32_ne(w: &mut dyn Write, v: u32) -> Result<(), StoreError> {
    w.write_all(&v.to_ne_bytes())?;
    Ok(())
}

/// Read a host-order u32.
pub fn read_u32_ne(r: &mut dyn Read) -> Result<u32, StoreError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_ne_bytes(buf))
}

/// Write a length-prefixed UTF-8 string (u32 length + bytes).
pub fn write_length_prefixed_str(w: &mut dyn Write, s: &str) -> Result<(), StoreError> {
    write_u32_ne(w, to_header_word("name length", s.len())?)?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

/// Read a length-prefixed UTF-8 string.
pub fn read_length_prefixed_str(r: &mut dyn Read) -> Result<String, StoreError> {
    let len = read_u32_ne(r)? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| StoreError::MalformedHeader {
        detail: format!("invalid UTF-8 store name: {e}"),
    })
}

fn to_header_word(field: &'static str, value: usize) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::HeaderOverflow { field, value })
}

// ── Block payloads ──────────────────────────────────────────────

/// Encode a whole store: header, all blocks but the last in full, then the
/// prefix of the last block covering `header.nb_lines`.
///
/// `chunks` yields the byte view of every block, in table order.
pub(crate) fn encode_chunks<'a, I>(
    w: &mut dyn Write,
    header: &ChunkHeader,
    chunk_len: usize,
    chunks: I,
) -> Result<(), StoreError>
where
    I: ExactSizeIterator<Item = &'a [u8]>,
{
    debug_assert_eq!(chunks.len(), header.nb_chunks as usize);
    let full_chunks = (header.nb_chunks as usize).saturating_sub(1);
    if (header.nb_lines as usize) < full_chunks * chunk_len {
        tracing::warn!(
            nb_chunks = header.nb_chunks,
            nb_lines = header.nb_lines,
            "line count ends before the last chunk; leading chunks written in full"
        );
    }
    header.write_to(w)?;

    let last = chunks.len().saturating_sub(1);
    let last_bytes = header.last_chunk_bytes(chunk_len);
    for (k, bytes) in chunks.enumerate() {
        if k < last {
            w.write_all(bytes)?;
        } else {
            w.write_all(&bytes[..last_bytes])?;
        }
    }
    Ok(())
}

/// Decode and validate a header against the receiving store's layout.
///
/// Fails with [`StoreError::ChunkSizeMismatch`] when the stream was written
/// by a store with a different block size or element size, and with
/// [`StoreError::MalformedHeader`] when the header claims more elements than
/// its blocks can hold.
pub(crate) fn decode_header(
    r: &mut dyn Read,
    chunk_len: usize,
    chunk_bytes: usize,
    type_name: &'static str,
) -> Result<ChunkHeader, StoreError> {
    let header = ChunkHeader::read_from(r)?;

    if header.chunk_bytes as usize != chunk_bytes {
        tracing::error!(
            element = type_name,
            expected = chunk_bytes,
            found = header.chunk_bytes,
            "refusing to load chunk array: wrong chunk size"
        );
        return Err(StoreError::ChunkSizeMismatch {
            expected: chunk_bytes as u32,
            found: header.chunk_bytes,
        });
    }

    let capacity = header.nb_chunks as usize * chunk_len;
    if header.nb_lines as usize > capacity {
        return Err(StoreError::MalformedHeader {
            detail: format!(
                "{} lines do not fit in {} chunks of {chunk_len}",
                header.nb_lines, header.nb_chunks
            ),
        });
    }

    Ok(header)
}

/// Fill block payloads from a stream, mirroring [`encode_chunks`].
///
/// Bytes of the last block beyond the recorded payload are left untouched.
pub(crate) fn decode_chunks<'a, I>(
    r: &mut dyn Read,
    header: &ChunkHeader,
    chunk_len: usize,
    chunks: I,
) -> Result<(), StoreError>
where
    I: ExactSizeIterator<Item = &'a mut [u8]>,
{
    debug_assert_eq!(chunks.len(), header.nb_chunks as usize);

    let last = chunks.len().saturating_sub(1);
    let last_bytes = header.last_chunk_bytes(chunk_len);
    for (k, bytes) in chunks.enumerate() {
        if k < last {
            r.read_exact(bytes)?;
        } else {
            r.read_exact(&mut bytes[..last_bytes])?;
        }
    }
    Ok(())
}

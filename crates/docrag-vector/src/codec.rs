//! Binary layout of the two blobs persisted per document.
//!
//! All integers and floats are little-endian.
//!
//! Text blob: `DRCT` | version u16 | count u32 | count x (len u32 | utf-8 bytes)
//!
//! Vector blob: `DRVI` | version u16 | dim u32 | count u32 | model-id len u16 |
//! model-id bytes | blake3 digest of the text blob (32 bytes) | count x dim f32
//!
//! Chunk texts are length-prefixed, so no chunk content can shift the
//! chunk/vector alignment.

use docrag_core::error::{Error, Result};

use crate::index::VectorIndex;

pub const TEXT_MAGIC: &[u8; 4] = b"DRCT";
pub const VECTOR_MAGIC: &[u8; 4] = b"DRVI";
pub const FORMAT_VERSION: u16 = 1;

pub fn encode_chunks(chunk_texts: &[String]) -> Result<Vec<u8>> {
    let payload: usize = chunk_texts.iter().map(|t| 4 + t.len()).sum();
    let mut out = Vec::with_capacity(10 + payload);
    out.extend_from_slice(TEXT_MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&to_u32(chunk_texts.len(), "chunk count")?.to_le_bytes());
    for text in chunk_texts {
        out.extend_from_slice(&to_u32(text.len(), "chunk length")?.to_le_bytes());
        out.extend_from_slice(text.as_bytes());
    }
    Ok(out)
}

pub fn decode_chunks(key: &str, bytes: &[u8]) -> Result<Vec<String>> {
    let mut r = Reader::new(key, bytes);
    r.expect_magic(TEXT_MAGIC)?;
    r.expect_version()?;
    let count = r.u32()? as usize;
    let mut texts = Vec::with_capacity(count.min(bytes.len() / 4));
    for i in 0..count {
        let len = r.u32()? as usize;
        let raw = r.take(len)?;
        let text = std::str::from_utf8(raw)
            .map_err(|e| Error::corrupt(key, format!("chunk {i} is not valid UTF-8: {e}")))?;
        texts.push(text.to_string());
    }
    r.finish()?;
    Ok(texts)
}

pub fn text_digest(text_blob: &[u8]) -> [u8; 32] {
    *blake3::hash(text_blob).as_bytes()
}

pub fn encode_vectors(index: &VectorIndex, text_digest: &[u8; 32]) -> Result<Vec<u8>> {
    let model_id = index.model_id().as_bytes();
    let model_len = u16::try_from(model_id.len())
        .map_err(|_| Error::Configuration(format!("model id longer than {} bytes", u16::MAX)))?;
    let mut out = Vec::with_capacity(48 + model_id.len() + index.len() * index.dim() * 4);
    out.extend_from_slice(VECTOR_MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&to_u32(index.dim(), "dimension")?.to_le_bytes());
    out.extend_from_slice(&to_u32(index.len(), "vector count")?.to_le_bytes());
    out.extend_from_slice(&model_len.to_le_bytes());
    out.extend_from_slice(model_id);
    out.extend_from_slice(text_digest);
    for vector in index.vectors() {
        for value in vector {
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
    Ok(out)
}

/// Header and payload of a decoded vector blob.
#[derive(Debug)]
pub struct VectorBlob {
    pub model_id: String,
    pub dim: usize,
    pub text_digest: [u8; 32],
    pub vectors: Vec<Vec<f32>>,
}

pub fn decode_vectors(key: &str, bytes: &[u8]) -> Result<VectorBlob> {
    let mut r = Reader::new(key, bytes);
    r.expect_magic(VECTOR_MAGIC)?;
    r.expect_version()?;
    let dim = r.u32()? as usize;
    let count = r.u32()? as usize;
    if dim == 0 && count > 0 {
        return Err(Error::corrupt(key, format!("{count} vectors of dimension 0")));
    }
    let model_len = r.u16()? as usize;
    let model_id = std::str::from_utf8(r.take(model_len)?)
        .map_err(|e| Error::corrupt(key, format!("model id is not valid UTF-8: {e}")))?
        .to_string();
    let mut text_digest = [0u8; 32];
    text_digest.copy_from_slice(r.take(32)?);
    let payload_len = count
        .checked_mul(dim)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| Error::corrupt(key, "vector payload size overflows"))?;
    let payload = r.take(payload_len)?;
    r.finish()?;
    // `payload` has been length-checked, so rows are bounded by the blob size.
    let vectors = if dim == 0 {
        Vec::new()
    } else {
        payload
            .chunks_exact(dim * 4)
            .map(|row| {
                row.chunks_exact(4)
                    .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                    .collect()
            })
            .collect()
    };
    Ok(VectorBlob { model_id, dim, text_digest, vectors })
}

fn to_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::Configuration(format!("{what} {value} exceeds u32")))
}

struct Reader<'a> {
    key: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(key: &'a str, bytes: &'a [u8]) -> Self {
        Self { key, bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                Error::corrupt(self.key, format!("truncated at byte {} (wanted {n} more)", self.pos))
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn expect_magic(&mut self, magic: &[u8; 4]) -> Result<()> {
        if self.take(4)? != magic {
            return Err(Error::corrupt(self.key, "bad magic"));
        }
        Ok(())
    }

    fn expect_version(&mut self) -> Result<()> {
        let version = self.u16()?;
        if version != FORMAT_VERSION {
            return Err(Error::corrupt(self.key, format!("unsupported format version {version}")));
        }
        Ok(())
    }

    fn finish(&self) -> Result<()> {
        if self.pos != self.bytes.len() {
            return Err(Error::corrupt(
                self.key,
                format!("{} trailing bytes", self.bytes.len() - self.pos),
            ));
        }
        Ok(())
    }
}

//! UnityFS archive reading
//!
//! A UnityFS file is a big-endian header, a (possibly compressed) block info
//! table, then a run of compressed storage blocks. Once the blocks are
//! decompressed and concatenated, the directory nodes address sub-files
//! (serialized files, `.resS` resources) inside that buffer.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::reader::{Endian, EndianReader};

/// Archive signature this reader accepts
pub const SIGNATURE: &str = "UnityFS";

/// Mask selecting the compression method from header or block flags
pub const COMPRESSION_MASK: u32 = 0x3F;
/// Block info is stored at the end of the file
pub const FLAG_BLOCKS_INFO_AT_END: u32 = 0x80;
/// Block data starts on a 16-byte boundary
pub const FLAG_BLOCK_INFO_NEEDS_PADDING: u32 = 0x200;
/// Directory node holds a serialized file
pub const NODE_FLAG_SERIALIZED: u32 = 0x4;

const HASH_SIZE: usize = 16;
/// Upper bound on the LZ4 block expansion ratio
const LZ4_MAX_RATIO: usize = 255;

/// Storage compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Lzma,
    Lz4,
    Lz4Hc,
}

impl Compression {
    pub fn from_flags(flags: u32) -> Result<Self> {
        match flags & COMPRESSION_MASK {
            0 => Ok(Self::None),
            1 => Ok(Self::Lzma),
            2 => Ok(Self::Lz4),
            3 => Ok(Self::Lz4Hc),
            method => Err(Error::UnsupportedCompression { method }),
        }
    }
}

/// Parsed UnityFS header
#[derive(Debug, Clone)]
pub struct BundleHeader {
    pub format_version: u32,
    pub unity_version: String,
    pub unity_revision: String,
    pub size: i64,
    pub compressed_info_size: u32,
    pub uncompressed_info_size: u32,
    pub flags: u32,
}

#[derive(Debug, Clone, Copy)]
struct StorageBlock {
    uncompressed_size: u32,
    compressed_size: u32,
    flags: u16,
}

/// A sub-file entry in the archive directory
#[derive(Debug, Clone)]
pub struct BundleNode {
    pub offset: u64,
    pub size: u64,
    pub flags: u32,
    pub path: String,
}

impl BundleNode {
    #[must_use]
    pub fn is_serialized_file(&self) -> bool {
        self.flags & NODE_FLAG_SERIALIZED != 0
    }

    /// Last path component (nodes are addressed as `archive:/CAB-x/CAB-x.resS`)
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// A fully decompressed UnityFS archive
#[derive(Debug)]
pub struct BundleArchive {
    header: BundleHeader,
    nodes: Vec<BundleNode>,
    data: Vec<u8>,
}

impl BundleArchive {
    /// Read and decompress a bundle from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        tracing::debug!("Read bundle {} ({} bytes)", path.as_ref().display(), bytes.len());
        Self::from_bytes(&bytes)
    }

    /// Parse and decompress a bundle held in memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = EndianReader::new(bytes, Endian::Big);
        let header = read_header(&mut reader)?;

        let compressed_len = header.compressed_info_size as usize;
        let info_bytes = if header.flags & FLAG_BLOCKS_INFO_AT_END != 0 {
            let start = bytes.len().checked_sub(compressed_len).ok_or(Error::UnexpectedEof {
                offset: 0,
                wanted: compressed_len,
                available: bytes.len(),
            })?;
            &bytes[start..]
        } else {
            reader.read_bytes(compressed_len)?
        };

        let info = decompress(
            Compression::from_flags(header.flags)?,
            info_bytes,
            header.uncompressed_info_size as usize,
        )?;
        let (blocks, nodes) = read_block_info(&info)?;

        if header.flags & FLAG_BLOCK_INFO_NEEDS_PADDING != 0 {
            reader.align(16)?;
        }

        let stored: usize = blocks
            .iter()
            .fold(0usize, |sum, b| sum.saturating_add(b.compressed_size as usize));
        if stored > reader.remaining() {
            return Err(Error::UnexpectedEof {
                offset: reader.position(),
                wanted: stored,
                available: reader.remaining(),
            });
        }

        // Grows per block, claimed sizes are checked in `decompress`
        let mut data = Vec::new();
        for block in &blocks {
            let raw = reader.read_bytes(block.compressed_size as usize)?;
            let method = Compression::from_flags(u32::from(block.flags))?;
            data.extend_from_slice(&decompress(method, raw, block.uncompressed_size as usize)?);
        }

        for node in &nodes {
            let end = node.offset.checked_add(node.size);
            if end.is_none_or(|end| end > data.len() as u64) {
                return Err(Error::NodeOutOfBounds {
                    path: node.path.clone(),
                    offset: node.offset,
                    size: node.size,
                    available: data.len(),
                });
            }
        }

        tracing::debug!(
            "UnityFS v{} ({}): {} blocks, {} nodes, {} bytes",
            header.format_version,
            header.unity_version,
            blocks.len(),
            nodes.len(),
            data.len()
        );

        Ok(Self { header, nodes, data })
    }

    #[must_use]
    pub fn header(&self) -> &BundleHeader {
        &self.header
    }

    #[must_use]
    pub fn nodes(&self) -> &[BundleNode] {
        &self.nodes
    }

    /// Bytes of a directory node (bounds were checked on load)
    #[must_use]
    pub fn node_data(&self, node: &BundleNode) -> &[u8] {
        &self.data[node.offset as usize..(node.offset + node.size) as usize]
    }

    /// Find a node by its path or by its last path component
    #[must_use]
    pub fn find_node(&self, name: &str) -> Option<&BundleNode> {
        let file_name = name.rsplit('/').next().unwrap_or(name);
        self.nodes
            .iter()
            .find(|n| n.path == name || n.file_name() == file_name)
    }
}

fn read_header(reader: &mut EndianReader<'_>) -> Result<BundleHeader> {
    let signature = reader.read_cstring()?;
    if signature != SIGNATURE {
        return Err(Error::InvalidSignature(signature));
    }

    let format_version = reader.read_u32()?;
    if !(6..=8).contains(&format_version) {
        return Err(Error::UnsupportedFormatVersion { version: format_version });
    }

    let header = BundleHeader {
        format_version,
        unity_version: reader.read_cstring()?,
        unity_revision: reader.read_cstring()?,
        size: reader.read_i64()?,
        compressed_info_size: reader.read_u32()?,
        uncompressed_info_size: reader.read_u32()?,
        flags: reader.read_u32()?,
    };

    if format_version >= 7 {
        reader.align(16)?;
    }

    Ok(header)
}

fn read_block_info(info: &[u8]) -> Result<(Vec<StorageBlock>, Vec<BundleNode>)> {
    let mut reader = EndianReader::new(info, Endian::Big);
    reader.skip(HASH_SIZE)?;

    let block_count = reader.read_length()?;
    let mut blocks = Vec::with_capacity(block_count.min(reader.remaining() / 10));
    for _ in 0..block_count {
        blocks.push(StorageBlock {
            uncompressed_size: reader.read_u32()?,
            compressed_size: reader.read_u32()?,
            flags: reader.read_u16()?,
        });
    }

    let node_count = reader.read_length()?;
    let mut nodes = Vec::with_capacity(node_count.min(reader.remaining() / 21));
    for _ in 0..node_count {
        let offset_pos = reader.position();
        let offset = reader.read_i64()?;
        let size = reader.read_i64()?;
        let (Ok(offset), Ok(size)) = (u64::try_from(offset), u64::try_from(size)) else {
            return Err(Error::InvalidLength {
                length: offset.min(size),
                offset: offset_pos,
            });
        };
        nodes.push(BundleNode {
            offset,
            size,
            flags: reader.read_u32()?,
            path: reader.read_cstring()?,
        });
    }

    Ok((blocks, nodes))
}

/// Decompress one block; the claimed size is checked against `raw` before anything is allocated
fn decompress(method: Compression, raw: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
    let invalid = || Error::InvalidBlockSize {
        compressed: raw.len(),
        uncompressed: uncompressed_size,
    };
    match method {
        Compression::None if uncompressed_size != raw.len() => Err(invalid()),
        Compression::None => Ok(raw.to_vec()),
        Compression::Lz4 | Compression::Lz4Hc
            if uncompressed_size > raw.len().saturating_mul(LZ4_MAX_RATIO) =>
        {
            Err(invalid())
        }
        Compression::Lz4 | Compression::Lz4Hc => lz4_flex::block::decompress(raw, uncompressed_size)
            .map_err(|e| Error::Lz4DecompressionFailed {
                message: e.to_string(),
            }),
        Compression::Lzma => Err(Error::UnsupportedCompression { method: 1 }),
    }
}

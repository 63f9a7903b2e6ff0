//! Error types for `unitybundle`

use thiserror::Error;

/// The error type for bundle reading operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Archive Errors ====================
    /// The file is not a UnityFS archive.
    #[error("invalid bundle signature: expected UnityFS, found {0:?}")]
    InvalidSignature(String),

    /// The archive format version is not supported.
    #[error("unsupported UnityFS format version: {version}")]
    UnsupportedFormatVersion {
        /// The format version found in the header.
        version: u32,
    },

    /// A block or the block info uses a compression scheme this reader does not implement.
    #[error("unsupported compression method: {method}")]
    UnsupportedCompression {
        /// The compression method bits (`flags & 0x3F`).
        method: u32,
    },

    /// LZ4 decompression failed.
    #[error("LZ4 decompression failed: {message}")]
    Lz4DecompressionFailed {
        /// The error message.
        message: String,
    },

    /// A storage block claims a decompressed size its stored bytes cannot produce.
    #[error("block of {compressed} bytes cannot decompress to {uncompressed} bytes")]
    InvalidBlockSize {
        /// Stored (compressed) size.
        compressed: usize,
        /// Claimed decompressed size.
        uncompressed: usize,
    },

    /// A directory node points outside the decompressed data.
    #[error("node '{path}' is out of bounds ({offset}+{size} > {available})")]
    NodeOutOfBounds {
        /// The node path.
        path: String,
        /// Node offset.
        offset: u64,
        /// Node size.
        size: u64,
        /// Bytes of block data available.
        available: usize,
    },

    // ==================== Serialized File Errors ====================
    /// The serialized file version is not supported.
    #[error("unsupported serialized file version: {version}")]
    UnsupportedSerializedVersion {
        /// The version found in the serialized file header.
        version: u32,
    },

    /// An object references a type index that is not in the type table.
    #[error("invalid type index {index} (type table has {count} entries)")]
    InvalidTypeIndex {
        /// The index read from the object table.
        index: i32,
        /// Number of types in the table.
        count: usize,
    },

    /// An object's byte range lies outside the serialized file.
    #[error("object {path_id} is out of bounds")]
    ObjectOutOfBounds {
        /// The object's path id.
        path_id: i64,
    },

    /// The Unity version string could not be understood.
    #[error("unsupported Unity version: {0}")]
    UnsupportedUnityVersion(String),

    // ==================== Object Errors ====================
    /// An `AudioClip` references a resource node that is not in the bundle.
    #[error("resource '{source_path}' for clip '{clip}' not found in bundle")]
    ResourceNotFound {
        /// The clip name.
        clip: String,
        /// The `m_Source` value of the clip.
        source_path: String,
    },

    /// An `AudioClip` resource range lies outside its resource node.
    #[error("resource range {offset}+{size} for clip '{clip}' exceeds node size {available}")]
    ResourceOutOfBounds {
        /// The clip name.
        clip: String,
        /// Offset into the resource node.
        offset: i64,
        /// Size of the payload.
        size: i64,
        /// Size of the resource node.
        available: usize,
    },

    /// A read ran past the end of the buffer.
    #[error("unexpected end of data at offset {offset} (wanted {wanted} bytes, {available} available)")]
    UnexpectedEof {
        /// Read position.
        offset: usize,
        /// Bytes requested.
        wanted: usize,
        /// Bytes left.
        available: usize,
    },

    /// A length field is negative or otherwise unusable.
    #[error("invalid length {length} at offset {offset}")]
    InvalidLength {
        /// The raw length value.
        length: i64,
        /// Position of the length field.
        offset: usize,
    },
}

/// A specialized Result type for `unitybundle` operations.
pub type Result<T> = std::result::Result<T, Error>;

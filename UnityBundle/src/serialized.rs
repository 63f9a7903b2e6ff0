//! Serialized file (asset file) object table
//!
//! Only what is needed to locate objects is parsed: the header, the type
//! table (type trees are skipped as opaque blobs) and the object table.

use crate::error::{Error, Result};
use crate::reader::{Endian, EndianReader};

/// Oldest serialized file version with the endianness byte in the header
pub const MIN_VERSION: u32 = 9;

/// `MonoBehaviour` class id (carries an extra script hash in the type table)
const CLASS_MONO_BEHAVIOUR: i32 = 114;
const HASH_SIZE: usize = 16;

/// One entry of the type table
#[derive(Debug, Clone, Copy)]
pub struct SerializedType {
    pub class_id: i32,
}

/// One entry of the object table
#[derive(Debug, Clone, Copy)]
pub struct ObjectInfo {
    pub path_id: i64,
    /// Absolute offset of the object data within the serialized file
    pub byte_start: u64,
    pub byte_size: u32,
    pub class_id: i32,
}

/// A parsed serialized file borrowing its bytes from the archive
#[derive(Debug)]
pub struct SerializedFile<'a> {
    pub version: u32,
    pub endian: Endian,
    pub unity_version: String,
    pub types: Vec<SerializedType>,
    pub objects: Vec<ObjectInfo>,
    data: &'a [u8],
}

impl<'a> SerializedFile<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let mut reader = EndianReader::new(data, Endian::Big);

        let _metadata_size = reader.read_u32()?;
        let _file_size = reader.read_u32()?;
        let version = reader.read_u32()?;
        let mut data_offset = u64::from(reader.read_u32()?);

        if version < MIN_VERSION {
            return Err(Error::UnsupportedSerializedVersion { version });
        }

        let endian = if reader.read_u8()? == 0 {
            Endian::Little
        } else {
            Endian::Big
        };
        reader.skip(3)?;

        if version >= 22 {
            let _metadata_size = reader.read_u32()?;
            let _file_size = reader.read_i64()?;
            data_offset = reader.read_u64()?;
            let _unknown = reader.read_i64()?;
        }

        reader.set_endian(endian);

        let unity_version = if version >= 7 {
            reader.read_cstring()?
        } else {
            String::new()
        };
        if version >= 8 {
            let _target_platform = reader.read_i32()?;
        }
        let enable_type_tree = if version >= 13 { reader.read_bool()? } else { true };

        let type_count = reader.read_length()?;
        let mut types = Vec::with_capacity(type_count.min(reader.remaining()));
        for _ in 0..type_count {
            types.push(read_type(&mut reader, version, enable_type_tree)?);
        }

        let big_id_enabled = if (7..14).contains(&version) {
            reader.read_i32()? != 0
        } else {
            false
        };

        let object_count = reader.read_length()?;
        let mut objects = Vec::with_capacity(object_count.min(reader.remaining()));
        for _ in 0..object_count {
            let path_id = if big_id_enabled {
                reader.read_i64()?
            } else if version < 14 {
                i64::from(reader.read_i32()?)
            } else {
                reader.align(4)?;
                reader.read_i64()?
            };

            let byte_start = if version >= 22 {
                reader.read_u64()?
            } else {
                u64::from(reader.read_u32()?)
            };
            let byte_size = reader.read_u32()?;
            let type_id = reader.read_i32()?;

            let class_id = if version < 16 {
                i32::from(reader.read_u16()?)
            } else {
                usize::try_from(type_id)
                    .ok()
                    .and_then(|i| types.get(i))
                    .map(|t| t.class_id)
                    .ok_or(Error::InvalidTypeIndex {
                        index: type_id,
                        count: types.len(),
                    })?
            };

            if version < 11 {
                let _is_destroyed = reader.read_u16()?;
            }
            if (11..17).contains(&version) {
                let _script_type_index = reader.read_i16()?;
            }
            if version == 15 || version == 16 {
                let _stripped = reader.read_u8()?;
            }

            let byte_start = data_offset
                .checked_add(byte_start)
                .ok_or(Error::ObjectOutOfBounds { path_id })?;
            objects.push(ObjectInfo {
                path_id,
                byte_start,
                byte_size,
                class_id,
            });
        }

        Ok(Self {
            version,
            endian,
            unity_version,
            types,
            objects,
            data,
        })
    }

    /// Raw bytes of one object
    pub fn object_data(&self, object: &ObjectInfo) -> Result<&'a [u8]> {
        let start = usize::try_from(object.byte_start).ok();
        let end = start.and_then(|s| s.checked_add(object.byte_size as usize));
        match (start, end) {
            (Some(start), Some(end)) if end <= self.data.len() => Ok(&self.data[start..end]),
            _ => Err(Error::ObjectOutOfBounds {
                path_id: object.path_id,
            }),
        }
    }

    /// A reader over one object's data in the file's byte order
    pub fn object_reader(&self, object: &ObjectInfo) -> Result<EndianReader<'a>> {
        Ok(EndianReader::new(self.object_data(object)?, self.endian))
    }

    /// Objects of a given class, in table order
    pub fn objects_of_class(&self, class_id: i32) -> impl Iterator<Item = &ObjectInfo> {
        self.objects.iter().filter(move |o| o.class_id == class_id)
    }
}

fn read_type(
    reader: &mut EndianReader<'_>,
    version: u32,
    enable_type_tree: bool,
) -> Result<SerializedType> {
    let class_id = reader.read_i32()?;

    if version >= 16 {
        let _is_stripped = reader.read_bool()?;
    }
    if version >= 17 {
        let _script_type_index = reader.read_i16()?;
    }
    if version >= 13 {
        let has_script_id = (version < 16 && class_id < 0)
            || (version >= 16 && class_id == CLASS_MONO_BEHAVIOUR);
        if has_script_id {
            reader.skip(HASH_SIZE)?;
        }
        reader.skip(HASH_SIZE)?;
    }

    if enable_type_tree {
        if version >= 12 || version == 10 {
            skip_type_tree_blob(reader, version)?;
        } else {
            return Err(Error::UnsupportedSerializedVersion { version });
        }
        if version >= 21 {
            let dependency_count = reader.read_length()?;
            reader.skip(dependency_count.saturating_mul(4))?;
        }
    }

    Ok(SerializedType { class_id })
}

fn skip_type_tree_blob(reader: &mut EndianReader<'_>, version: u32) -> Result<()> {
    let node_count = reader.read_length()?;
    let string_buffer_size = reader.read_length()?;
    let node_size = if version >= 19 { 32 } else { 24 };
    reader.skip(node_count.saturating_mul(node_size))?;
    reader.skip(string_buffer_size)
}

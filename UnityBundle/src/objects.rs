//! Typed views of the two object classes the exporter consumes

use std::borrow::Cow;

use crate::bundle::BundleArchive;
use crate::error::{Error, Result};
use crate::serialized::{ObjectInfo, SerializedFile};

/// `TextAsset` class id
pub const CLASS_TEXT_ASSET: i32 = 49;
/// `AudioClip` class id
pub const CLASS_AUDIO_CLIP: i32 = 83;

/// A named text payload
#[derive(Debug, Clone)]
pub struct TextAsset<'a> {
    pub name: String,
    pub script: &'a [u8],
}

impl<'a> TextAsset<'a> {
    /// Payload decoded as UTF-8, invalid sequences replaced with U+FFFD
    #[must_use]
    pub fn text(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.script)
    }
}

/// One exportable audio file of a clip
#[derive(Debug, Clone)]
pub struct AudioSample<'a> {
    pub file_name: String,
    pub data: &'a [u8],
}

/// A named audio clip with zero or more samples
#[derive(Debug, Clone)]
pub struct AudioClip<'a> {
    pub name: String,
    pub samples: Vec<AudioSample<'a>>,
}

/// Objects yielded while walking a bundle
#[derive(Debug, Clone)]
pub enum AssetObject<'a> {
    TextAsset(TextAsset<'a>),
    AudioClip(AudioClip<'a>),
}

impl AssetObject<'_> {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::TextAsset(t) => &t.name,
            Self::AudioClip(c) => &c.name,
        }
    }
}

/// Read a `TextAsset` object
pub fn read_text_asset<'a>(file: &SerializedFile<'a>, object: &ObjectInfo) -> Result<TextAsset<'a>> {
    let mut reader = file.object_reader(object)?;
    let name = reader.read_aligned_string()?;
    let script = reader.read_aligned_bytes()?;
    Ok(TextAsset { name, script })
}

/// Read an `AudioClip` object (Unity 5+ layout) and resolve its streamed payload
pub fn read_audio_clip<'a>(
    archive: &'a BundleArchive,
    file: &SerializedFile<'a>,
    object: &ObjectInfo,
) -> Result<AudioClip<'a>> {
    let (major, minor) = parse_unity_version(&file.unity_version)?;
    if major < 5 {
        return Err(Error::UnsupportedUnityVersion(file.unity_version.clone()));
    }

    let mut reader = file.object_reader(object)?;
    let name = reader.read_aligned_string()?;

    let _load_type = reader.read_i32()?;
    let _channels = reader.read_i32()?;
    let _frequency = reader.read_i32()?;
    let _bits_per_sample = reader.read_i32()?;
    let _length = reader.read_f32()?;
    let _is_tracker_format = reader.read_bool()?;
    if major > 2017 || (major == 2017 && minor >= 3) {
        let _ambisonic = reader.read_bool()?;
    }
    reader.align(4)?;
    let _subsound_index = reader.read_i32()?;
    let _preload_audio_data = reader.read_bool()?;
    let _load_in_background = reader.read_bool()?;
    let _legacy_3d = reader.read_bool()?;
    reader.align(4)?;

    let source = reader.read_aligned_string()?;
    let offset = reader.read_i64()?;
    let size = reader.read_i64()?;

    if source.is_empty() || size <= 0 {
        return Ok(AudioClip {
            name,
            samples: Vec::new(),
        });
    }

    let node = archive
        .find_node(&source)
        .ok_or_else(|| Error::ResourceNotFound {
            clip: name.clone(),
            source_path: source.clone(),
        })?;
    let resource = archive.node_data(node);

    let range = usize::try_from(offset)
        .ok()
        .zip(usize::try_from(size).ok())
        .and_then(|(start, len)| Some(start..start.checked_add(len)?))
        .filter(|r| r.end <= resource.len());
    let Some(range) = range else {
        return Err(Error::ResourceOutOfBounds {
            clip: name,
            offset,
            size,
            available: resource.len(),
        });
    };

    let data = &resource[range];
    let file_name = format!("{name}.{}", sniff_audio_extension(data));
    Ok(AudioClip {
        name,
        samples: vec![AudioSample { file_name, data }],
    })
}

/// Pick a file extension from the payload's leading magic bytes
#[must_use]
pub fn sniff_audio_extension(data: &[u8]) -> &'static str {
    match data {
        [b'F', b'S', b'B', b'5', ..] => "fsb",
        [b'O', b'g', b'g', b'S', ..] => "ogg",
        [b'R', b'I', b'F', b'F', ..] => "wav",
        [b'I', b'D', b'3', ..] => "mp3",
        [0xFF, second, ..] if second & 0xE0 == 0xE0 => "mp3",
        _ => "bin",
    }
}

/// Split `"2022.3.21f1"` into `(2022, 3)`
pub fn parse_unity_version(version: &str) -> Result<(u32, u32)> {
    let mut parts = version
        .split(|c: char| !c.is_ascii_digit())
        .filter(|p| !p.is_empty())
        .map(str::parse::<u32>);
    match (parts.next(), parts.next()) {
        (Some(Ok(major)), Some(Ok(minor))) => Ok((major, minor)),
        _ => Err(Error::UnsupportedUnityVersion(version.to_string())),
    }
}

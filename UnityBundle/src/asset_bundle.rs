//! Bundle-level object walking

use std::path::Path;

use crate::bundle::{BundleArchive, BundleNode};
use crate::error::Result;
use crate::objects::{
    AssetObject, CLASS_AUDIO_CLIP, CLASS_TEXT_ASSET, read_audio_clip, read_text_asset,
};
use crate::serialized::SerializedFile;

/// A loaded bundle whose `TextAsset`/`AudioClip` objects can be listed
///
/// The decompressed archive is owned here; every yielded object borrows from it,
/// so dropping the bundle releases all payload memory at once.
#[derive(Debug)]
pub struct AssetBundle {
    archive: BundleArchive,
}

impl AssetBundle {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            archive: BundleArchive::open(path)?,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            archive: BundleArchive::from_bytes(bytes)?,
        })
    }

    #[must_use]
    pub fn archive(&self) -> &BundleArchive {
        &self.archive
    }

    /// Text assets and audio clips, in serialized-file then object-table order
    ///
    /// Objects are decoded one at a time as the iterator advances. A decode
    /// error is yielded in place of that object and ends the walk.
    pub fn assets(&self) -> Assets<'_> {
        Assets {
            archive: &self.archive,
            nodes: self.archive.nodes().iter(),
            current: None,
            next_object: 0,
            failed: false,
        }
    }
}

/// Lazy iterator returned by [`AssetBundle::assets`]
#[derive(Debug)]
pub struct Assets<'a> {
    archive: &'a BundleArchive,
    nodes: std::slice::Iter<'a, BundleNode>,
    current: Option<SerializedFile<'a>>,
    next_object: usize,
    failed: bool,
}

impl<'a> Assets<'a> {
    /// Parse the next serialized node, `None` once all nodes are done
    fn advance_node(&mut self) -> Option<Result<()>> {
        let node = self.nodes.find(|n| n.is_serialized_file())?;
        let file = match SerializedFile::parse(self.archive.node_data(node)) {
            Ok(file) => file,
            Err(e) => return Some(Err(e)),
        };
        tracing::debug!(
            "Serialized file {} (v{}, Unity {}): {} objects",
            node.path,
            file.version,
            file.unity_version,
            file.objects.len()
        );
        self.current = Some(file);
        self.next_object = 0;
        Some(Ok(()))
    }

    fn decode_next(&mut self) -> Option<Result<AssetObject<'a>>> {
        loop {
            let Some(file) = &self.current else {
                if let Err(e) = self.advance_node()? {
                    return Some(Err(e));
                }
                continue;
            };

            let Some(object) = file.objects.get(self.next_object) else {
                self.current = None;
                continue;
            };
            self.next_object += 1;

            let asset = match object.class_id {
                CLASS_TEXT_ASSET => read_text_asset(file, object).map(AssetObject::TextAsset),
                CLASS_AUDIO_CLIP => {
                    read_audio_clip(self.archive, file, object).map(AssetObject::AudioClip)
                }
                _ => continue,
            };
            return Some(asset);
        }
    }
}

impl<'a> Iterator for Assets<'a> {
    type Item = Result<AssetObject<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.decode_next();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}

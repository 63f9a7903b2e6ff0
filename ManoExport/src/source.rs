//! Asset sources
//!
//! The pipeline never touches the bundle format directly. It asks an
//! [`AssetSource`] to walk one bundle and hand every text asset / audio clip
//! to a visitor. The visitor can stop the walk early by returning
//! [`ControlFlow::Break`].

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::path::Path;

use unitybundle::{AssetBundle, AssetObject, AudioClip, AudioSample, TextAsset};

use crate::error::{Error, Result};

/// Visitor callback type
pub type AssetVisitor<'v> = dyn FnMut(AssetObject<'_>) -> Result<ControlFlow<()>> + 'v;

/// Something that can open a bundle and yield its typed objects
pub trait AssetSource {
    /// Walk the objects of one bundle in container order.
    ///
    /// Everything the source allocates for the bundle is released before this returns.
    fn visit_bundle(&self, bundle: &Path, visitor: &mut AssetVisitor<'_>) -> Result<()>;
}

/// Reads real UnityFS bundles from disk
#[derive(Debug, Default, Clone, Copy)]
pub struct UnityFsSource;

impl AssetSource for UnityFsSource {
    fn visit_bundle(&self, bundle: &Path, visitor: &mut AssetVisitor<'_>) -> Result<()> {
        let loaded = AssetBundle::open(bundle)?;
        for asset in loaded.assets() {
            if visitor(asset?)?.is_break() {
                break;
            }
        }
        Ok(())
    }
}

/// An owned object for [`MemorySource`]
#[derive(Debug, Clone)]
pub enum MemoryAsset {
    Text {
        name: String,
        script: Vec<u8>,
    },
    Audio {
        name: String,
        /// (sample file name, payload) in sample order
        samples: Vec<(String, Vec<u8>)>,
    },
}

impl MemoryAsset {
    pub fn text(name: impl Into<String>, script: impl Into<Vec<u8>>) -> Self {
        Self::Text {
            name: name.into(),
            script: script.into(),
        }
    }

    pub fn audio<N, F, D>(name: N, samples: impl IntoIterator<Item = (F, D)>) -> Self
    where
        N: Into<String>,
        F: Into<String>,
        D: Into<Vec<u8>>,
    {
        Self::Audio {
            name: name.into(),
            samples: samples
                .into_iter()
                .map(|(f, d)| (f.into(), d.into()))
                .collect(),
        }
    }

    fn view(&self) -> AssetObject<'_> {
        match self {
            Self::Text { name, script } => AssetObject::TextAsset(TextAsset {
                name: name.clone(),
                script,
            }),
            Self::Audio { name, samples } => AssetObject::AudioClip(AudioClip {
                name: name.clone(),
                samples: samples
                    .iter()
                    .map(|(file_name, data)| AudioSample {
                        file_name: file_name.clone(),
                        data,
                    })
                    .collect(),
            }),
        }
    }
}

/// In-memory bundles keyed by bundle file name
///
/// Useful for driving the pipeline without real game data. A bundle that was
/// never inserted fails to open, like a corrupt file would.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    bundles: HashMap<String, Vec<MemoryAsset>>,
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a bundle
    pub fn insert(&mut self, bundle_name: impl Into<String>, assets: Vec<MemoryAsset>) {
        self.bundles.insert(bundle_name.into(), assets);
    }

    #[must_use]
    pub fn with_bundle(mut self, bundle_name: impl Into<String>, assets: Vec<MemoryAsset>) -> Self {
        self.insert(bundle_name, assets);
        self
    }
}

impl AssetSource for MemorySource {
    fn visit_bundle(&self, bundle: &Path, visitor: &mut AssetVisitor<'_>) -> Result<()> {
        let name = bundle
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let assets = self
            .bundles
            .get(&name)
            .ok_or_else(|| Error::Asset(format!("no such bundle: {name}")))?;

        for asset in assets {
            if visitor(asset.view())?.is_break() {
                break;
            }
        }
        Ok(())
    }
}

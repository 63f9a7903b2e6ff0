//! # unitybundle
//!
//! A small, pure-Rust reader for Unity `UnityFS` asset bundles, scoped to
//! pulling `TextAsset` and `AudioClip` payloads out of them.
//!
//! ## Supported
//!
//! - **UnityFS archives** - format versions 6-8, uncompressed and LZ4/LZ4HC blocks
//! - **Serialized files** - versions 9 and up (type trees are skipped, not interpreted)
//! - **`TextAsset`** - name + raw script bytes
//! - **`AudioClip`** - name + streamed resource payload (Unity 5+)
//!
//! LZMA-compressed bundles are rejected with [`Error::UnsupportedCompression`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use unitybundle::{AssetBundle, AssetObject};
//!
//! let bundle = AssetBundle::open("general-voice-0.bundle")?;
//! for asset in bundle.assets() {
//!     if let AssetObject::AudioClip(clip) = asset? {
//!         println!("{}: {} samples", clip.name, clip.samples.len());
//!     }
//! }
//! # Ok::<(), unitybundle::Error>(())
//! ```

pub mod asset_bundle;
pub mod bundle;
pub mod error;
pub mod objects;
pub mod reader;
pub mod serialized;

// Re-exports for convenience
pub use asset_bundle::{AssetBundle, Assets};
pub use error::{Error, Result};
pub use objects::{AssetObject, AudioClip, AudioSample, TextAsset};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

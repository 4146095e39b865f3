//! PluginDepot Pack
//!
//! Installer packaging for PluginDepot audio plugins (VST3, CLAP, AAX, LV2
//! and the standalone application) on Windows.
//!
//! # Architecture
//!
//! A single pass turns the build environment into WiX v4 installer sources:
//! 1. `config` reads product metadata and per-format artifact paths
//! 2. `harvest` mirrors each artifact into directories and components
//! 3. `manifest` groups components into one feature per format
//! 4. `wix` serializes the manifest; `operations` writes the files
//!
//! The WiX toolset consumes the output; this crate never invokes it.
//!
//! ## Identifiers (`ids` module)
//! - Element ids are `ID_` plus the MD5 of kind, format and source path
//! - Component GUIDs and the upgrade code are name-based UUIDs
//!
//! ## Dependency inspection (`inspect` module)
//! - `inspect_artifact()` - Run ldd/otool/dumpbin over a built artifact

pub mod config;
pub mod error;
pub mod harvest;
pub mod ids;
pub mod inspect;
pub mod manifest;
pub mod operations;
pub mod plugin;
pub mod wix;

pub use config::{OutputLayout, PackagerConfig, SlotSource, SourceKind};
pub use error::PackagerError;
pub use plugin::{DirectoryContents, DirectoryNode, Feature, FormatPayload, InstallableUnit, PluginFormat, ProductInfo};

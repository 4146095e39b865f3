//! Directory harvesting for plugin artifacts.
//!
//! Walks a built artifact and mirrors it as a tree of [`DirectoryNode`]s
//! holding one [`InstallableUnit`] per file.
//!
//! # Traversal rules
//!
//! - Entries are visited in file-name order, files before subdirectories,
//!   so the same tree always yields the same document.
//! - Linker and debugger leftovers (see [`DEBUG_ARTIFACT_EXTENSIONS`]) are
//!   never installed.
//! - Symbolic links below the artifact root are skipped, never followed.
//! - Entries whose names are not valid UTF-8 are skipped: the installer
//!   source cannot reference them.
//! - A subtree that cannot be read contributes nothing; its siblings are
//!   still harvested.

use std::ffi::OsString;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::config::{SlotSource, SourceKind};
use crate::ids::{element_id, stable_guid, IdKind};
use crate::{DirectoryContents, DirectoryNode, FormatPayload, InstallableUnit, PluginFormat};

/// Build leftovers that must not end up in the installer.
pub const DEBUG_ARTIFACT_EXTENSIONS: &[&str] = &["ilk", "pdb"];

/// Harvests everything one format slot installs.
pub fn harvest_slot(source: &SlotSource, product_name: &str) -> FormatPayload {
    let format = source.format;
    let installed_name = format.installed_name(product_name);

    let contents = match source.kind {
        SourceKind::File => DirectoryContents {
            units: vec![unit_for_file(&source.path, format, Some(installed_name))],
            children: Vec::new(),
        },
        SourceKind::Directory if format.is_bundle() => DirectoryContents {
            units: Vec::new(),
            children: vec![DirectoryNode {
                id: element_id(IdKind::Directory, format, &source.path),
                name: installed_name,
                contents: harvest_directory(&source.path, format),
            }],
        },
        SourceKind::Directory => harvest_directory(&source.path, format),
    };

    FormatPayload {
        format,
        directory_ref: format.install_dir_id(),
        contents,
    }
}

/// Recursively harvests `dir`, returning its files and subdirectories.
pub fn harvest_directory(dir: &Path, format: PluginFormat) -> DirectoryContents {
    let mut contents = DirectoryContents::default();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Failed to read directory {:?}: {}", dir, e);
            return contents;
        }
    };

    let mut files: Vec<OsString> = Vec::new();
    let mut dirs: Vec<OsString> = Vec::new();

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Failed to read an entry of {:?}: {}", dir, e);
                continue;
            }
        };

        // file_type() does not follow links
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) => {
                warn!("Failed to stat {:?}: {}", entry.path(), e);
                continue;
            }
        };

        if entry.file_name().to_str().is_none() {
            warn!("Skipping {:?}: name is not valid UTF-8", entry.path());
        } else if file_type.is_symlink() {
            debug!("Skipping symbolic link {:?}", entry.path());
        } else if file_type.is_dir() {
            dirs.push(entry.file_name());
        } else if file_type.is_file() {
            if is_debug_artifact(Path::new(&entry.file_name())) {
                debug!("Skipping debug artifact {:?}", entry.path());
            } else {
                files.push(entry.file_name());
            }
        }
    }

    files.sort();
    dirs.sort();

    for name in files {
        contents.units.push(unit_for_file(&dir.join(name), format, None));
    }

    for name in dirs {
        let path = dir.join(&name);
        contents.children.push(DirectoryNode {
            id: element_id(IdKind::Directory, format, &path),
            name: name.to_string_lossy().into_owned(),
            contents: harvest_directory(&path, format),
        });
    }

    contents
}

fn unit_for_file(path: &Path, format: PluginFormat, install_name: Option<String>) -> InstallableUnit {
    let component_id = element_id(IdKind::Component, format, path);
    InstallableUnit {
        guid: stable_guid(&component_id),
        file_id: element_id(IdKind::File, format, path),
        component_id,
        source: path.to_path_buf(),
        install_name,
    }
}

fn is_debug_artifact(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| DEBUG_ARTIFACT_EXTENSIONS.contains(&ext.as_str()))
}

//! Stable identifiers for the installer document.
//!
//! WiX element ids must start with a letter or underscore, contain only
//! `[A-Za-z0-9_.]` and stay under 72 characters. Every id here is derived
//! from its input string alone so unchanged inputs produce byte-identical
//! documents.

use std::path::Path;
use uuid::Uuid;

use crate::PluginFormat;

/// Namespace for name-based component GUIDs and upgrade codes.
const GUID_NAMESPACE: Uuid = Uuid::from_u128(0x1234_5678_1234_5678_1234_5678_1234_5678);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Directory,
    Component,
    File,
}

impl IdKind {
    fn prefix(&self) -> &'static str {
        match self {
            IdKind::Directory => "DIR",
            IdKind::Component => "COMP",
            IdKind::File => "FILE",
        }
    }
}

/// `ID_` followed by the uppercase MD5 of the input: 35 characters.
pub fn wix_id(input: &str) -> String {
    id_from_bytes(input.as_bytes())
}

/// Id for an element backed by `path` within a format slot.
///
/// Hashes the raw path bytes so names that differ only in non-UTF-8
/// bytes still get distinct ids.
pub fn element_id(kind: IdKind, format: PluginFormat, path: &Path) -> String {
    let mut seed = format!("{}_{}_", kind.prefix(), format.name()).into_bytes();
    seed.extend_from_slice(path.as_os_str().as_encoded_bytes());
    id_from_bytes(&seed)
}

fn id_from_bytes(bytes: &[u8]) -> String {
    let id = format!("ID_{:X}", md5::compute(bytes));
    debug_assert!(is_valid_wix_id(&id));
    id
}

/// Uppercase name-based (v5) GUID.
pub fn stable_guid(input: &str) -> String {
    Uuid::new_v5(&GUID_NAMESPACE, input.as_bytes())
        .hyphenated()
        .to_string()
        .to_uppercase()
}

/// Upgrade code shared by every version of a project.
pub fn upgrade_code(project_name: &str) -> String {
    stable_guid(&format!("{}_UpgradeCode", project_name))
}

/// Returns true if `id` fits the WiX identifier grammar.
pub fn is_valid_wix_id(id: &str) -> bool {
    let mut chars = id.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    id.len() <= 72
        && (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

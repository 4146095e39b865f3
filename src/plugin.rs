use serde::Serialize;
use std::path::PathBuf;

/// Plugin formats the installer knows how to place.
///
/// The order of [`PluginFormat::ALL`] is the order slots are resolved,
/// harvested and emitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PluginFormat {
    VST3,
    CLAP,
    AAX,
    LV2,
    Standalone,
}

impl PluginFormat {
    pub const ALL: [PluginFormat; 5] = [
        PluginFormat::VST3,
        PluginFormat::CLAP,
        PluginFormat::AAX,
        PluginFormat::LV2,
        PluginFormat::Standalone,
    ];

    /// Display name, also used for feature titles and identifier seeds.
    pub fn name(&self) -> &'static str {
        match self {
            PluginFormat::VST3 => "VST3",
            PluginFormat::CLAP => "CLAP",
            PluginFormat::AAX => "AAX",
            PluginFormat::LV2 => "LV2",
            PluginFormat::Standalone => "Standalone",
        }
    }

    /// Extension of the installed artifact on Windows.
    pub fn extension(&self) -> &'static str {
        match self {
            PluginFormat::VST3 => "vst3",
            PluginFormat::CLAP => "clap",
            PluginFormat::AAX => "aaxplugin",
            PluginFormat::LV2 => "lv2",
            PluginFormat::Standalone => "exe",
        }
    }

    /// Id of the skeleton directory this format installs into.
    pub fn install_dir_id(&self) -> &'static str {
        match self {
            PluginFormat::VST3 => "VST3DIR",
            PluginFormat::CLAP => "CLAPDIR",
            PluginFormat::AAX => "AAXDIR",
            PluginFormat::LV2 => "LV2DIR",
            PluginFormat::Standalone => COMPANY_DIR_ID,
        }
    }

    /// Returns true if a directory source of this format is installed as a
    /// named bundle directory rather than spread into the target directory.
    pub fn is_bundle(&self) -> bool {
        !matches!(self, PluginFormat::Standalone)
    }

    /// Environment variable naming the built artifact for this slot.
    pub fn env_var(&self) -> String {
        format!("{}_PATH", self.name())
    }

    /// Name the artifact gets on the target system.
    pub fn installed_name(&self, product_name: &str) -> String {
        format!("{}.{}", product_name, self.extension())
    }
}

/// Directory the standalone application (and the configurable install
/// location) lives under.
pub const COMPANY_DIR_ID: &str = "COMPANYDIR";

/// Product metadata written into the package header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductInfo {
    pub project_name: String,
    pub product_name: String,
    pub version: String,
    pub publisher: String,
    pub website: Option<String>,
    pub description: Option<String>,
}

/// One file placed on the target system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallableUnit {
    pub component_id: String,
    pub file_id: String,
    pub guid: String,
    pub source: PathBuf,
    /// Set when the file is renamed on install (single-file artifacts).
    pub install_name: Option<String>,
}

/// Files and subdirectories found under one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectoryContents {
    pub units: Vec<InstallableUnit>,
    pub children: Vec<DirectoryNode>,
}

impl DirectoryContents {
    pub fn is_empty(&self) -> bool {
        self.unit_count() == 0
    }

    /// Number of units in this directory and all of its descendants.
    pub fn unit_count(&self) -> usize {
        self.units.len()
            + self
                .children
                .iter()
                .map(|child| child.contents.unit_count())
                .sum::<usize>()
    }

    /// Component ids in document order (files before subdirectories).
    pub fn component_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.units.iter().map(|u| u.component_id.clone()).collect();
        for child in &self.children {
            ids.extend(child.contents.component_ids());
        }
        ids
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryNode {
    pub id: String,
    pub name: String,
    pub contents: DirectoryContents,
}

/// Everything one format slot contributes, rooted at its skeleton directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatPayload {
    pub format: PluginFormat,
    pub directory_ref: &'static str,
    pub contents: DirectoryContents,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feature {
    pub id: String,
    pub title: String,
    pub component_ids: Vec<String>,
}

impl Feature {
    pub fn for_payload(payload: &FormatPayload) -> Self {
        Feature {
            id: format!("Feature_{}", payload.format.name()),
            title: payload.format.name().to_string(),
            component_ids: payload.contents.component_ids(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_standalone_is_not_a_bundle() {
        let bundles: Vec<_> = PluginFormat::ALL.iter().filter(|f| f.is_bundle()).collect();
        assert_eq!(bundles.len(), 4);
        assert!(!PluginFormat::Standalone.is_bundle());
    }

    #[test]
    fn env_var_follows_format_name() {
        assert_eq!(PluginFormat::VST3.env_var(), "VST3_PATH");
        assert_eq!(PluginFormat::Standalone.env_var(), "Standalone_PATH");
    }

    #[test]
    fn installed_name_uses_product_and_extension() {
        assert_eq!(PluginFormat::CLAP.installed_name("Demo"), "Demo.clap");
        assert_eq!(PluginFormat::AAX.installed_name("Demo"), "Demo.aaxplugin");
    }
}

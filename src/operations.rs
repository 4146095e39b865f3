//! Installer generation operations.
//!
//! Ties configuration, harvesting and serialization together and writes
//! the resulting files:
//! - the `.wxs` installer source
//! - the `.wxl` localization overrides
//! - a placeholder license when the project ships none
//! - an optional JSON summary for CI logs

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::PackagerConfig;
use crate::manifest::{build_manifest, AssetSet, LicenseSource, Manifest, PLACEHOLDER_LICENSE_RTF};
use crate::wix::{render_wxl, render_wxs};

/// Paths of everything a generation run wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFiles {
    pub wxs: PathBuf,
    pub wxl: PathBuf,
    pub license: Option<PathBuf>,
    pub summary: Option<PathBuf>,
}

/// Builds the installer sources for `config` and writes them to disk.
///
/// Nothing is written if the manifest cannot be built.
pub fn generate_installer(config: &PackagerConfig) -> Result<(Manifest, GeneratedFiles)> {
    let layout = &config.layout;
    let assets = AssetSet::discover(&layout.assets_dir, &layout.temp_dir);
    let manifest = build_manifest(config, assets)?;

    let wxs = render_wxs(&manifest)?;
    let wxl = render_wxl(&manifest.product)?;

    write_text(&layout.wxs_path, &wxs)?;
    write_text(&layout.wxl_path, &wxl)?;

    let license = match &manifest.assets.license {
        LicenseSource::Placeholder(path) => {
            write_text(path, PLACEHOLDER_LICENSE_RTF)?;
            Some(path.clone())
        }
        LicenseSource::Provided(_) => None,
    };

    let summary = match &layout.summary_path {
        Some(path) => {
            write_summary(&manifest, path)?;
            Some(path.clone())
        }
        None => None,
    };

    info!(
        "Generated {:?} with {} feature(s), {} file(s)",
        layout.wxs_path,
        manifest.features.len(),
        manifest.unit_count()
    );

    let files = GeneratedFiles {
        wxs: layout.wxs_path.clone(),
        wxl: layout.wxl_path.clone(),
        license,
        summary,
    };
    Ok((manifest, files))
}

/// Writes `content` to `path`, creating parent directories as needed.
fn write_text(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context(format!("Failed to create output directory: {:?}", parent))?;
    }
    fs::write(path, content).context(format!("Failed to write {:?}", path))?;
    Ok(())
}

/// Writes a summary of the generated installer for build logs.
fn write_summary(manifest: &Manifest, path: &Path) -> Result<()> {
    let features: Vec<_> = manifest
        .features
        .iter()
        .map(|feature| {
            serde_json::json!({
                "id": feature.id,
                "title": feature.title,
                "components": feature.component_ids.len(),
            })
        })
        .collect();

    let summary = serde_json::json!({
        "product_name": manifest.product.product_name,
        "version": manifest.product.version,
        "publisher": manifest.product.publisher,
        "upgrade_code": manifest.upgrade_code,
        "files": manifest.unit_count(),
        "features": features,
        "license": manifest.assets.license,
        "generated_at": chrono::Local::now().to_rfc3339(),
    });

    let content = serde_json::to_string_pretty(&summary)?;
    write_text(path, &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputLayout, SlotSource, SourceKind};
    use crate::error::PackagerError;
    use crate::{PluginFormat, ProductInfo};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn config(root: &Path, sources: Vec<SlotSource>) -> PackagerConfig {
        PackagerConfig {
            product: ProductInfo {
                project_name: "Demo".to_string(),
                product_name: "Demo".to_string(),
                version: "1.2.3".to_string(),
                publisher: "Demo Audio".to_string(),
                website: None,
                description: None,
            },
            sources,
            layout: OutputLayout {
                wxs_path: root.join("out/installer.wxs"),
                wxl_path: root.join("out/overrides.wxl"),
                assets_dir: root.join("assets"),
                temp_dir: root.join("tmp"),
                summary_path: Some(root.join("out/summary.json")),
            },
        }
    }

    #[test]
    fn writes_all_outputs() {
        let dir = TempDir::new().unwrap();
        let clap = dir.path().join("b.clap");
        fs::write(&clap, b"x").unwrap();
        let sources = vec![SlotSource { format: PluginFormat::CLAP, path: clap, kind: SourceKind::File }];

        let (manifest, files) = generate_installer(&config(dir.path(), sources)).unwrap();

        assert_eq!(manifest.features.len(), 1);
        assert!(fs::read_to_string(&files.wxs).unwrap().contains("Demo.clap"));
        assert!(fs::read_to_string(&files.wxl).unwrap().contains("WelcomeDlgTitle"));
        let license = files.license.unwrap();
        assert_eq!(fs::read_to_string(license).unwrap(), PLACEHOLDER_LICENSE_RTF);

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(files.summary.unwrap()).unwrap()).unwrap();
        assert_eq!(summary["files"], 1);
        assert_eq!(summary["features"][0]["title"], "CLAP");
    }

    #[test]
    fn nothing_is_written_without_files() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), Vec::new());

        let err = generate_installer(&config).unwrap_err();

        assert!(matches!(err.downcast_ref::<PackagerError>(), Some(PackagerError::NothingToPackage)));
        assert!(!config.layout.wxs_path.exists());
        assert!(!dir.path().join("out").exists());
    }
}

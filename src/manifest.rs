//! In-memory model of one installer document.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::PackagerConfig;
use crate::error::{PackagerError, Result};
use crate::harvest::harvest_slot;
use crate::ids::upgrade_code;
use crate::{Feature, FormatPayload, ProductInfo};

/// Contents of the placeholder license written when none is supplied.
pub const PLACEHOLDER_LICENSE_RTF: &str = r"{\rtf1\ansi No EULA provided.\par}";

/// License shown by the installer UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LicenseSource {
    /// An RTF file supplied with the project assets.
    Provided(PathBuf),
    /// A generated stand-in that still has to be written to this path.
    Placeholder(PathBuf),
}

impl LicenseSource {
    pub fn path(&self) -> &Path {
        match self {
            LicenseSource::Provided(path) | LicenseSource::Placeholder(path) => path,
        }
    }
}

/// Optional installer assets, each included only if it exists on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetSet {
    pub icon: Option<PathBuf>,
    pub license: LicenseSource,
    pub banner: Option<PathBuf>,
    pub dialog: Option<PathBuf>,
}

impl AssetSet {
    /// Looks for `icon.ico`, `EULA.rtf` (or `Readme.rtf`), `banner.bmp` and
    /// `dialog.bmp` in `assets_dir`.
    pub fn discover(assets_dir: &Path, temp_dir: &Path) -> Self {
        let existing = |name: &str| {
            let path = assets_dir.join(name);
            if path.is_file() {
                Some(path)
            } else {
                debug!("No {:?} found, leaving it out", path);
                None
            }
        };

        let license = existing("EULA.rtf")
            .or_else(|| existing("Readme.rtf"))
            .map(LicenseSource::Provided)
            .unwrap_or_else(|| LicenseSource::Placeholder(temp_dir.join("GenericLicense.rtf")));

        AssetSet {
            icon: existing("icon.ico"),
            license,
            banner: existing("banner.bmp"),
            dialog: existing("dialog.bmp"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub product: ProductInfo,
    pub upgrade_code: String,
    pub payloads: Vec<FormatPayload>,
    pub features: Vec<Feature>,
    pub assets: AssetSet,
}

impl Manifest {
    pub fn unit_count(&self) -> usize {
        self.payloads.iter().map(|p| p.contents.unit_count()).sum()
    }
}

/// Harvests every configured slot and assembles the document model.
///
/// Slots that yield no files are dropped along with their feature. Fails
/// with [`PackagerError::NothingToPackage`] if nothing at all was found.
pub fn build_manifest(config: &PackagerConfig, assets: AssetSet) -> Result<Manifest> {
    let mut payloads = Vec::new();
    let mut features = Vec::new();

    for source in &config.sources {
        let payload = harvest_slot(source, &config.product.product_name);
        if payload.contents.is_empty() {
            warn!("No files found for {} in {:?}, skipping", source.format.name(), source.path);
            continue;
        }

        debug!(
            "{}: {} file(s) from {:?}",
            source.format.name(),
            payload.contents.unit_count(),
            source.path
        );
        features.push(Feature::for_payload(&payload));
        payloads.push(payload);
    }

    if payloads.is_empty() {
        return Err(PackagerError::NothingToPackage);
    }

    Ok(Manifest {
        upgrade_code: upgrade_code(&config.product.project_name),
        product: config.product.clone(),
        payloads,
        features,
        assets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputLayout, SlotSource, SourceKind};
    use crate::PluginFormat;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn product() -> ProductInfo {
        ProductInfo {
            project_name: "Demo".to_string(),
            product_name: "Demo".to_string(),
            version: "1.2.3".to_string(),
            publisher: "Demo Audio".to_string(),
            website: None,
            description: None,
        }
    }

    fn config(sources: Vec<SlotSource>) -> PackagerConfig {
        PackagerConfig {
            product: product(),
            sources,
            layout: OutputLayout::default(),
        }
    }

    fn no_assets(dir: &Path) -> AssetSet {
        AssetSet::discover(&dir.join("assets"), &dir.join("tmp"))
    }

    #[test]
    fn no_sources_means_nothing_to_package() {
        let dir = TempDir::new().unwrap();
        let err = build_manifest(&config(Vec::new()), no_assets(dir.path())).unwrap_err();
        assert!(matches!(err, PackagerError::NothingToPackage));
    }

    #[test]
    fn empty_bundle_is_dropped_and_alone_is_fatal() {
        let dir = TempDir::new().unwrap();
        let bundle = dir.path().join("Demo.lv2");
        fs::create_dir_all(bundle.join("empty")).unwrap();

        let sources = vec![SlotSource {
            format: PluginFormat::LV2,
            path: bundle,
            kind: SourceKind::Directory,
        }];
        let err = build_manifest(&config(sources), no_assets(dir.path())).unwrap_err();
        assert!(matches!(err, PackagerError::NothingToPackage));
    }

    #[test]
    fn one_feature_per_non_empty_slot() {
        let dir = TempDir::new().unwrap();
        let vst3 = dir.path().join("a.vst3");
        fs::create_dir_all(vst3.join("Contents")).unwrap();
        fs::write(vst3.join("Contents/a.dylib"), b"x").unwrap();
        let lv2 = dir.path().join("empty.lv2");
        fs::create_dir_all(&lv2).unwrap();
        let clap = dir.path().join("b.clap");
        fs::write(&clap, b"x").unwrap();

        let sources = vec![
            SlotSource { format: PluginFormat::VST3, path: vst3, kind: SourceKind::Directory },
            SlotSource { format: PluginFormat::CLAP, path: clap, kind: SourceKind::File },
            SlotSource { format: PluginFormat::LV2, path: lv2, kind: SourceKind::Directory },
        ];
        let manifest = build_manifest(&config(sources), no_assets(dir.path())).unwrap();

        let titles: Vec<_> = manifest.features.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["VST3", "CLAP"]);
        assert_eq!(manifest.features[0].id, "Feature_VST3");
        assert!(manifest.features.iter().all(|f| f.component_ids.len() == 1));
        assert_eq!(manifest.unit_count(), 2);
    }

    #[test]
    fn assets_fall_back_to_placeholder_license() {
        let dir = TempDir::new().unwrap();
        let assets = no_assets(dir.path());
        assert_eq!(assets.license, LicenseSource::Placeholder(dir.path().join("tmp/GenericLicense.rtf")));
        assert_eq!(assets.icon, None);
    }

    #[test]
    fn readme_is_used_when_eula_is_missing() {
        let dir = TempDir::new().unwrap();
        let assets_dir = dir.path().join("assets");
        fs::create_dir_all(&assets_dir).unwrap();
        fs::write(assets_dir.join("Readme.rtf"), b"{\\rtf1}").unwrap();
        fs::write(assets_dir.join("icon.ico"), b"ico").unwrap();

        let assets = AssetSet::discover(&assets_dir, &dir.path().join("tmp"));

        assert_eq!(assets.license, LicenseSource::Provided(assets_dir.join("Readme.rtf")));
        assert_eq!(assets.icon, Some(assets_dir.join("icon.ico")));
        assert_eq!(assets.banner, None);
    }
}

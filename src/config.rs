//! Resolves product metadata and artifact paths into a [`PackagerConfig`].
//!
//! Everything is read once, through a lookup function, at process entry.
//! The binary passes `std::env::var`; tests pass a map.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{PackagerError, Result};
use crate::{PluginFormat, ProductInfo};

/// Whether a slot's artifact is a single file or a directory tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    File,
    Directory,
}

/// An artifact path that exists on disk for one format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSource {
    pub format: PluginFormat,
    pub path: PathBuf,
    pub kind: SourceKind,
}

/// Where generated files go and where optional installer assets are found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub wxs_path: PathBuf,
    pub wxl_path: PathBuf,
    pub assets_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub summary_path: Option<PathBuf>,
}

impl Default for OutputLayout {
    fn default() -> Self {
        OutputLayout {
            wxs_path: PathBuf::from("packaging/installer.wxs"),
            wxl_path: PathBuf::from("packaging/overrides.wxl"),
            assets_dir: PathBuf::from("packaging"),
            temp_dir: PathBuf::from("windowstmp"),
            summary_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagerConfig {
    pub product: ProductInfo,
    pub sources: Vec<SlotSource>,
    pub layout: OutputLayout,
}

impl PackagerConfig {
    /// Reads configuration from the process environment.
    pub fn from_env(layout: OutputLayout) -> Result<Self> {
        let cwd = std::env::current_dir().map_err(PackagerError::WorkingDirectory)?;
        Self::from_lookup(|key| std::env::var(key).ok(), &cwd, layout)
    }

    /// Reads configuration through `lookup`, resolving relative artifact
    /// paths against `base_dir`.
    pub fn from_lookup<F>(lookup: F, base_dir: &Path, layout: OutputLayout) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let product_name = read("PRODUCT_NAME").ok_or(PackagerError::MissingMetadata("PRODUCT_NAME"))?;
        let version = read("VERSION").ok_or(PackagerError::MissingMetadata("VERSION"))?;

        let product = ProductInfo {
            project_name: read("PROJECT_NAME").unwrap_or_else(|| product_name.clone()),
            publisher: read("COMPANY_NAME").unwrap_or_else(|| product_name.clone()),
            website: read("COMPANY_WEBSITE"),
            description: read("DESCRIPTION"),
            product_name,
            version,
        };

        let mut sources = Vec::new();
        for format in PluginFormat::ALL {
            let env_var = format.env_var();
            let raw = read(&env_var).or_else(|| read(&env_var.to_uppercase()));
            let Some(raw) = raw else {
                warn!("{} not set, skipping {} slot", env_var, format.name());
                continue;
            };

            let path = absolutize(base_dir, Path::new(&raw));
            let kind = match fs::metadata(&path) {
                Ok(meta) if meta.is_dir() => SourceKind::Directory,
                Ok(_) => SourceKind::File,
                Err(e) => {
                    warn!("{} source not found at {:?} ({}), skipping", format.name(), path, e);
                    continue;
                }
            };

            sources.push(SlotSource { format, path, kind });
        }

        reject_overlaps(&sources)?;

        Ok(PackagerConfig { product, sources, layout })
    }
}

fn absolutize(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Two slots pointing at the same tree would yield duplicate ids.
fn reject_overlaps(sources: &[SlotSource]) -> Result<()> {
    for (i, first) in sources.iter().enumerate() {
        for second in &sources[i + 1..] {
            if first.path.starts_with(&second.path) || second.path.starts_with(&first.path) {
                return Err(PackagerError::OverlappingSources {
                    first: first.format,
                    first_path: first.path.clone(),
                    second: second.format,
                    second_path: second.path.clone(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn resolve(vars: &[(&str, String)], base: &Path) -> Result<PackagerConfig> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        PackagerConfig::from_lookup(|k| map.get(k).cloned(), base, OutputLayout::default())
    }

    fn metadata() -> Vec<(&'static str, String)> {
        vec![("PRODUCT_NAME", "Demo".to_string()), ("VERSION", "1.2.3".to_string())]
    }

    #[test]
    fn missing_product_name_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = resolve(&[("VERSION", "1.0.0".to_string())], dir.path()).unwrap_err();
        assert!(matches!(err, PackagerError::MissingMetadata("PRODUCT_NAME")));
    }

    #[test]
    fn blank_version_is_fatal() {
        let dir = TempDir::new().unwrap();
        let vars = [("PRODUCT_NAME", "Demo".to_string()), ("VERSION", "  ".to_string())];
        let err = resolve(&vars, dir.path()).unwrap_err();
        assert!(matches!(err, PackagerError::MissingMetadata("VERSION")));
    }

    #[test]
    fn optional_metadata_falls_back_to_product_name() {
        let dir = TempDir::new().unwrap();
        let config = resolve(&metadata(), dir.path()).unwrap();
        assert_eq!(config.product.project_name, "Demo");
        assert_eq!(config.product.publisher, "Demo");
        assert_eq!(config.product.website, None);
        assert!(config.sources.is_empty());
    }

    #[test]
    fn absent_and_missing_paths_skip_their_slot() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Demo.clap"), b"clap").unwrap();

        let mut vars = metadata();
        vars.push(("CLAP_PATH", "Demo.clap".to_string()));
        vars.push(("VST3_PATH", dir.path().join("missing.vst3").display().to_string()));
        let config = resolve(&vars, dir.path()).unwrap();

        assert_eq!(
            config.sources,
            vec![SlotSource {
                format: PluginFormat::CLAP,
                path: dir.path().join("Demo.clap"),
                kind: SourceKind::File,
            }]
        );
    }

    #[test]
    fn uppercase_standalone_variable_is_accepted() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("app")).unwrap();

        let mut vars = metadata();
        vars.push(("STANDALONE_PATH", dir.path().join("app").display().to_string()));
        let config = resolve(&vars, dir.path()).unwrap();

        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].format, PluginFormat::Standalone);
        assert_eq!(config.sources[0].kind, SourceKind::Directory);
    }

    #[test]
    fn nested_sources_are_rejected() {
        let dir = TempDir::new().unwrap();
        let bundle = dir.path().join("Demo.vst3");
        fs::create_dir_all(bundle.join("Contents")).unwrap();

        let mut vars = metadata();
        vars.push(("VST3_PATH", bundle.display().to_string()));
        vars.push(("LV2_PATH", bundle.join("Contents").display().to_string()));
        let err = resolve(&vars, dir.path()).unwrap_err();

        match err {
            PackagerError::OverlappingSources { first, second, .. } => {
                assert_eq!(first, PluginFormat::VST3);
                assert_eq!(second, PluginFormat::LV2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

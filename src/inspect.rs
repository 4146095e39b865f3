//! Dependency inspection of built artifacts.
//!
//! Runs the host's binary inspector over an artifact so CI logs show what
//! it links against:
//! - Linux: `ldd` on every shared object under the path
//! - macOS: `otool -L` on the bundle executable
//! - Windows: `dumpbin /headers` on the file itself

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{PackagerError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Inspector {
    Ldd,
    Otool,
    Dumpbin,
}

impl Inspector {
    /// Inspector native to the platform this binary was built for.
    pub fn for_host() -> Self {
        if cfg!(target_os = "macos") {
            Inspector::Otool
        } else if cfg!(target_os = "windows") {
            Inspector::Dumpbin
        } else {
            Inspector::Ldd
        }
    }

    pub fn tool(&self) -> &'static str {
        match self {
            Inspector::Ldd => "ldd",
            Inspector::Otool => "otool",
            Inspector::Dumpbin => "dumpbin",
        }
    }

    fn args(&self) -> &'static [&'static str] {
        match self {
            Inspector::Ldd => &[],
            Inspector::Otool => &["-L"],
            Inspector::Dumpbin => &["/headers"],
        }
    }

    /// Binaries under `artifact` this inspector should look at, sorted.
    pub fn targets(&self, artifact: &Path, product_name: &str) -> Vec<PathBuf> {
        match self {
            Inspector::Ldd if artifact.is_dir() => WalkDir::new(artifact)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "so"))
                .collect(),
            Inspector::Otool => {
                vec![artifact.join("Contents").join("MacOS").join(product_name)]
            }
            Inspector::Ldd | Inspector::Dumpbin => vec![artifact.to_path_buf()],
        }
    }
}

/// Output of one inspector run.
#[derive(Debug, Clone, Serialize)]
pub struct InspectionReport {
    pub binary: PathBuf,
    pub tool: &'static str,
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Inspects every target of `artifact` with `inspector`.
///
/// A non-zero tool exit is reported, not treated as an error.
pub fn inspect_artifact(inspector: Inspector, artifact: &Path, product_name: &str) -> Result<Vec<InspectionReport>> {
    let tool_path = which::which(inspector.tool()).map_err(|_| PackagerError::ToolNotFound(inspector.tool()))?;

    let targets = inspector.targets(artifact, product_name);
    if targets.is_empty() {
        return Err(PackagerError::NothingToInspect(artifact.to_path_buf()));
    }

    let mut reports = Vec::with_capacity(targets.len());
    for binary in targets {
        debug!("Running {} on {:?}", inspector.tool(), binary);
        let output = Command::new(&tool_path)
            .args(inspector.args())
            .arg(&binary)
            .output()
            .map_err(|source| PackagerError::Inspection {
                tool: inspector.tool(),
                binary: binary.clone(),
                source,
            })?;

        reports.push(InspectionReport {
            binary,
            tool: inspector.tool(),
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn ldd_targets_shared_objects_only() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("lib/nested")).unwrap();
        fs::write(dir.path().join("lib/nested/b.so"), b"x").unwrap();
        fs::write(dir.path().join("lib/a.so"), b"x").unwrap();
        fs::write(dir.path().join("lib/readme.txt"), b"x").unwrap();

        let targets = Inspector::Ldd.targets(dir.path(), "Demo");

        assert_eq!(
            targets,
            vec![dir.path().join("lib/a.so"), dir.path().join("lib/nested/b.so")]
        );
    }

    #[test]
    fn otool_targets_bundle_executable() {
        let targets = Inspector::Otool.targets(Path::new("/build/Demo.app"), "Demo");
        assert_eq!(targets, vec![PathBuf::from("/build/Demo.app/Contents/MacOS/Demo")]);
    }

    #[test]
    fn dumpbin_targets_the_file() {
        let targets = Inspector::Dumpbin.targets(Path::new("Demo.exe"), "Demo");
        assert_eq!(targets, vec![PathBuf::from("Demo.exe")]);
    }

    #[test]
    fn empty_directory_has_nothing_to_inspect() {
        let dir = TempDir::new().unwrap();
        assert!(Inspector::Ldd.targets(dir.path(), "Demo").is_empty());
    }
}

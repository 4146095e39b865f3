use std::path::PathBuf;
use thiserror::Error;

use crate::PluginFormat;

/// Fatal conditions that stop installer generation.
///
/// Unreadable subtrees during harvesting are not represented here: they are
/// logged and the traversal carries on.
#[derive(Debug, Error)]
pub enum PackagerError {
    #[error("required environment variable {0} is not set")]
    MissingMetadata(&'static str),

    #[error(
        "{first:?} and {second:?} sources overlap ({first_path:?} vs {second_path:?}); \
         each format needs its own artifact path"
    )]
    OverlappingSources {
        first: PluginFormat,
        first_path: PathBuf,
        second: PluginFormat,
        second_path: PathBuf,
    },

    #[error("no installable files found for any plugin format; nothing to package")]
    NothingToPackage,

    #[error("failed to determine the working directory")]
    WorkingDirectory(#[source] std::io::Error),

    #[error("failed to serialize installer document")]
    Xml(#[from] quick_xml::Error),

    #[error("{0} not found on PATH")]
    ToolNotFound(&'static str),

    #[error("no binaries to inspect under {0:?}")]
    NothingToInspect(PathBuf),

    #[error("failed to run {tool} on {binary:?}")]
    Inspection {
        tool: &'static str,
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, PackagerError>;

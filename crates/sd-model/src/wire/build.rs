use serde::{Deserialize, Serialize};

use crate::url::join_url;

/// Build record, either the `--json-out` file of a build submission or the
/// `metadata.json` stored next to the build outputs.
///
/// The submission record nests the tuxmake metadata under
/// `tuxmake_metadata`; `metadata.json` carries the same keys at top level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildResult {
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub tuxmake_metadata: Option<TuxmakeMetadata>,
    #[serde(flatten)]
    pub inline_metadata: TuxmakeMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TuxmakeMetadata {
    #[serde(default)]
    pub results: Option<BuildResults>,
    #[serde(default)]
    pub runtime: Option<Runtime>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildResults {
    #[serde(default)]
    pub artifacts: Artifacts,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifacts {
    #[serde(default)]
    pub kernel: Vec<String>,
    #[serde(default)]
    pub modules: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Runtime {
    #[serde(default)]
    pub image_digest: Option<String>,
}

const REGISTRY_SUFFIX: &str = ".amazonaws.com/";

impl BuildResult {
    pub fn metadata(&self) -> &TuxmakeMetadata {
        self.tuxmake_metadata.as_ref().unwrap_or(&self.inline_metadata)
    }

    fn artifacts(&self) -> Option<&Artifacts> {
        self.metadata().results.as_ref().map(|r| &r.artifacts)
    }

    /// Download URL of the built kernel image.
    pub fn kernel_artifact_url(&self) -> Option<String> {
        let dir = self.download_url.as_deref()?;
        let file = self.artifacts()?.kernel.first()?;
        Some(join_url(dir, file))
    }

    /// Download URL of the built modules tarball.
    pub fn modules_artifact_url(&self) -> Option<String> {
        let dir = self.download_url.as_deref()?;
        let file = self.artifacts()?.modules.first()?;
        Some(join_url(dir, file))
    }

    /// Toolchain image the build ran in, with the registry host stripped.
    pub fn container_image_id(&self) -> Option<&str> {
        let digest = self
            .metadata()
            .runtime
            .as_ref()?
            .image_digest
            .as_deref()
            .filter(|d| !d.is_empty())?;
        Some(match digest.rsplit_once(REGISTRY_SUFFIX) {
            Some((_, image)) => image,
            None => digest,
        })
    }
}

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Everything the decoder needs that comes out of the build.
///
/// Filled in step by step while the pipeline runs; a rebuild replaces the
/// container image and marks the set as carrying debug info.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildArtifactSet {
    pub config_text: String,
    /// Whether the kernel that will be staged was built with `CONFIG_DEBUG_INFO=y`.
    pub debug_info: bool,
    pub kernel_binary_path: Option<PathBuf>,
    pub symbol_map_path: Option<PathBuf>,
    pub container_image_id: Option<String>,
}

impl BuildArtifactSet {
    pub fn from_config(config_text: impl Into<String>) -> Self {
        Self {
            config_text: config_text.into(),
            ..Default::default()
        }
    }

    /// Assemble the decoder input.
    ///
    /// Fails with the name of the first missing piece. A set whose kernel
    /// lacks debug info never yields a request.
    pub fn decode_request(&self, log_path: PathBuf) -> Result<DecodeRequest, &'static str> {
        if !self.debug_info {
            return Err("debug_info");
        }
        let kernel_binary_path = self
            .kernel_binary_path
            .clone()
            .ok_or("kernel_binary_path")?;
        let container_image_id = self
            .container_image_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or("container_image_id")?;

        Ok(DecodeRequest {
            log_path,
            kernel_binary_path,
            container_image_id,
        })
    }
}

/// Final input bundle handed to the decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeRequest {
    pub log_path: PathBuf,
    pub kernel_binary_path: PathBuf,
    pub container_image_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> BuildArtifactSet {
        BuildArtifactSet {
            config_text: "CONFIG_DEBUG_INFO=y\n".into(),
            debug_info: true,
            kernel_binary_path: Some("/stage/vmlinux".into()),
            symbol_map_path: Some("/stage/System.map".into()),
            container_image_id: Some("tuxmake/x86_64_gcc-13@sha256:abc".into()),
        }
    }

    #[test]
    fn complete_set_yields_request() {
        let req = complete().decode_request("/stage/log".into()).unwrap();
        assert_eq!(req.kernel_binary_path, PathBuf::from("/stage/vmlinux"));
        assert_eq!(req.container_image_id, "tuxmake/x86_64_gcc-13@sha256:abc");
        assert_eq!(req.log_path, PathBuf::from("/stage/log"));
    }

    #[test]
    fn kernel_without_debug_info_is_refused() {
        let mut set = complete();
        set.debug_info = false;
        assert_eq!(set.decode_request("/l".into()), Err("debug_info"));
    }

    #[test]
    fn missing_pieces_are_named() {
        let mut set = complete();
        set.container_image_id = Some(String::new());
        assert_eq!(set.decode_request("/l".into()), Err("container_image_id"));

        set.kernel_binary_path = None;
        assert_eq!(set.decode_request("/l".into()), Err("kernel_binary_path"));
    }
}

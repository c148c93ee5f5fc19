use tracing::{info, warn};

/// Active assignment the build configuration must contain.
pub const DEBUG_INFO_MARKER: &str = "CONFIG_DEBUG_INFO=y";

/// `true` unless the configuration text contains [`DEBUG_INFO_MARKER`].
///
/// Plain substring test over the whole text: a commented-out marker still
/// counts as present.
pub fn needs_rebuild(config_text: &str) -> bool {
    !config_text.contains(DEBUG_INFO_MARKER)
}

/// `true` when the marker appears, but only on `#` comment lines.
pub fn marker_only_commented(config_text: &str) -> bool {
    let mut hits = config_text
        .lines()
        .filter(|line| line.contains(DEBUG_INFO_MARKER))
        .peekable();
    hits.peek().is_some() && hits.all(|line| line.trim_start().starts_with('#'))
}

/// Gate decision with operator-facing logging.
pub fn inspect(config_text: &str) -> bool {
    let rebuild = needs_rebuild(config_text);
    if rebuild {
        info!(target: "sd.gate", "NOTE: Kernel does not have DEBUG_INFO.");
    } else if marker_only_commented(config_text) {
        warn!(
            target: "sd.gate",
            marker = DEBUG_INFO_MARKER,
            "marker only found on a commented line; treating kernel as built with debug info"
        );
    }
    rebuild
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_marker_means_no_rebuild() {
        let config = "CONFIG_64BIT=y\nCONFIG_DEBUG_INFO=y\nCONFIG_DEBUG_INFO_DWARF5=y\n";
        assert!(!needs_rebuild(config));
        assert!(!marker_only_commented(config));
    }

    #[test]
    fn absent_marker_means_rebuild() {
        assert!(needs_rebuild("CONFIG_64BIT=y\n# CONFIG_DEBUG_INFO is not set\n"));
        assert!(needs_rebuild(""));
    }

    #[test]
    fn disabled_marker_means_rebuild() {
        assert!(needs_rebuild("CONFIG_DEBUG_INFO=n\nCONFIG_DEBUG_KERNEL=y\n"));
    }

    #[test]
    fn commented_marker_still_matches_substring() {
        let config = "CONFIG_64BIT=y\n# CONFIG_DEBUG_INFO=y\n";
        assert!(!needs_rebuild(config));
        assert!(marker_only_commented(config));
        assert!(!inspect(config));
    }

    #[test]
    fn marker_match_is_case_sensitive() {
        assert!(needs_rebuild("config_debug_info=y\n"));
        assert!(needs_rebuild("CONFIG_DEBUG_INFO=Y\n"));
    }
}

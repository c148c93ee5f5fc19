//! Small helpers for the URL shapes produced by the report and build services.

/// Join a directory URL and a file name with exactly one `/` between them.
///
/// Directory URLs coming from the build service usually end with `/`,
/// the ones derived locally do not; both forms are accepted.
pub fn join_url(base: &str, name: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        name.trim_start_matches('/')
    )
}

/// Strip the trailing file name segment from `url`.
///
/// Returns `None` when there is no `/` or the last segment is empty,
/// i.e. when `url` does not name a file.
pub fn dirname(url: &str) -> Option<&str> {
    let (dir, file) = url.rsplit_once('/')?;
    if dir.is_empty() || file.is_empty() || dir.ends_with('/') || dir.ends_with(':') {
        return None;
    }
    Some(dir)
}

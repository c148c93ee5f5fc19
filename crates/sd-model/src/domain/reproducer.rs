/// Shell script captured by the build/test service to replay a run.
///
/// Kept as text together with the URL it was fetched from; it is read
/// once to derive a single command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reproducer {
    pub source_url: String,
    pub text: String,
}

impl Reproducer {
    pub fn new(source_url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            text: text.into(),
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }
}

//! In-memory documents: text content, language id, and version stamps.
//!
//! A [`Document`] keeps its state inside a `tokio::sync::watch` channel, so
//! the polled version and the version seen by subscribers come from the same
//! place and can never disagree. Every text mutation bumps the version;
//! dirtiness elsewhere is always "version differs from a recorded version",
//! never a content diff.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

use super::uri::DocUri;

// ---------------------------------------------------------------------------
// Version stamps
// ---------------------------------------------------------------------------

/// Opaque, monotonically increasing stamp identifying a document's edit
/// position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VersionId(u64);

impl VersionId {
    pub fn value(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        VersionId(self.0 + 1)
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Language ids
// ---------------------------------------------------------------------------

/// A document's language/content-type identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguageId(String);

impl LanguageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn plain() -> Self {
        Self("plaintext".to_string())
    }

    /// Derives a language id from the uri's file extension.
    pub fn from_uri(uri: &DocUri) -> Self {
        let Some(ext) = uri.extension() else {
            return Self::plain();
        };
        let ext = ext.to_ascii_lowercase();
        let id = match ext.as_str() {
            "rs" => "rust",
            "md" => "markdown",
            "js" => "javascript",
            "ts" => "typescript",
            "py" => "python",
            "go" => "go",
            "java" => "java",
            "c" | "h" => "c",
            "cc" | "cpp" | "hpp" => "cpp",
            "toml" => "toml",
            "json" => "json",
            "yaml" | "yml" => "yaml",
            "html" => "html",
            "css" => "css",
            "sh" => "shell",
            "txt" => "plaintext",
            other => other,
        };
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// A point-in-time view of a document's state.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub version: VersionId,
    pub text: Arc<str>,
    pub language: LanguageId,
}

/// A live text document.
#[derive(Debug)]
pub struct Document {
    uri: DocUri,
    state: watch::Sender<Snapshot>,
}

impl Document {
    pub fn new(uri: DocUri, text: impl Into<String>, language: LanguageId) -> Arc<Self> {
        let (state, _) = watch::channel(Snapshot {
            version: VersionId::default(),
            text: Arc::from(text.into().as_str()),
            language,
        });
        Arc::new(Self { uri, state })
    }

    /// Creates a document whose language is derived from the uri extension.
    pub fn with_detected_language(uri: DocUri, text: impl Into<String>) -> Arc<Self> {
        let language = LanguageId::from_uri(&uri);
        Self::new(uri, text, language)
    }

    pub fn uri(&self) -> &DocUri {
        &self.uri
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.borrow().clone()
    }

    pub fn text(&self) -> Arc<str> {
        self.state.borrow().text.clone()
    }

    pub fn version(&self) -> VersionId {
        self.state.borrow().version
    }

    pub fn language(&self) -> LanguageId {
        self.state.borrow().language.clone()
    }

    /// Replaces the document text, bumping the version and notifying
    /// subscribers. Returns the new version.
    pub fn set_text(&self, text: impl Into<String>) -> VersionId {
        let text: Arc<str> = Arc::from(text.into().as_str());
        let mut version = VersionId::default();
        self.state.send_modify(|s| {
            s.version = s.version.next();
            s.text = text;
            version = s.version;
        });
        version
    }

    /// Changes the language id without bumping the version.
    pub fn set_language(&self, language: LanguageId) {
        self.state.send_modify(|s| s.language = language);
    }

    /// Subscribes to state changes. The receiver has already seen the
    /// current value, so only subsequent mutations wake it.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.state.subscribe()
    }
}

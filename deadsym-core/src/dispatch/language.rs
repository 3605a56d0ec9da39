//! Extension-based language detection.

use std::fmt;
use std::path::Path;

/// Label for everything the native engine parses.
pub const NATIVE_LABEL: &str = "javascript/typescript";

/// Label when nothing recognizes a file.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Source languages with a known route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    JavaScript,
    TypeScript,
    Vue,
    Svelte,
    Python,
    Go,
    Ruby,
    Php,
}

/// Which analyzer a file goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The in-process JS/TS engine.
    Native,
    /// The external analysis service.
    Service(Language),
    /// Not analyzed at all; produces no result entry.
    Excluded,
}

impl Language {
    /// Detect from the filename's extension, case-insensitively.
    pub fn detect(filename: &str) -> Option<Self> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())?
            .to_ascii_lowercase();
        let lang = match ext.as_str() {
            "js" | "jsx" | "mjs" | "cjs" => Self::JavaScript,
            "ts" | "tsx" | "mts" | "cts" => Self::TypeScript,
            "vue" => Self::Vue,
            "svelte" => Self::Svelte,
            "py" => Self::Python,
            "go" => Self::Go,
            "rb" => Self::Ruby,
            "php" => Self::Php,
            _ => return None,
        };
        Some(lang)
    }

    pub fn is_native(&self) -> bool {
        matches!(
            self,
            Self::JavaScript | Self::TypeScript | Self::Vue | Self::Svelte
        )
    }

    /// Name sent to the external service.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Vue => "vue",
            Self::Svelte => "svelte",
            Self::Python => "python",
            Self::Go => "go",
            Self::Ruby => "ruby",
            Self::Php => "php",
        }
    }

    pub fn route(&self) -> Route {
        if self.is_native() {
            Route::Native
        } else {
            Route::Service(*self)
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Route for a filename.
pub fn route_for(filename: &str) -> Route {
    Language::detect(filename).map_or(Route::Excluded, |l| l.route())
}

//! Routing of files to the native engine or the external service.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────┐
//!   files ──────► │ language.rs  │ extension → route
//!                 └──────┬───────┘
//!            ┌───────────┼──────────────┐
//!            ▼           ▼              ▼
//!        Native       Service        Excluded
//!     (engine.rs)   (service.rs)    (no entry)
//!            │           │
//!            │     normalize.rs
//!            │           │
//!            └─────┬─────┘
//!                  ▼
//!             ResultMap
//! ```
//!
//! The two result maps are disjoint by filename and are merged as is. A
//! service that is missing, failed or times out yields empty results for
//! its files, never an error.

pub mod language;
pub mod normalize;
pub mod service;

use tracing::{debug, warn};

use crate::cache::fingerprint;
use crate::engine::Engine;
use crate::error::DeadsymError;
use crate::result::{AnalysisResult, ResultMap};
use crate::symbols::AnalysisMode;
use crate::workspace::SourceFile;

pub use language::{route_for, Language, Route, NATIVE_LABEL, UNKNOWN_LABEL};
pub use normalize::{decode_batch, decode_language, decode_result};
pub use service::{
    AnalysisService, CodeRequest, ProcessService, ServiceHandle, ServiceState,
    WorkspaceFileRequest, WorkspaceRequest,
};

/// Files of one batch, split by route.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub native: Vec<SourceFile>,
    pub service: Vec<(Language, SourceFile)>,
    pub excluded: Vec<String>,
}

impl Partition {
    pub fn of(files: &[SourceFile]) -> Self {
        let mut out = Partition::default();
        for file in files {
            match route_for(&file.filename) {
                Route::Native => out.native.push(file.clone()),
                Route::Service(lang) => out.service.push((lang, file.clone())),
                Route::Excluded => out.excluded.push(file.filename.clone()),
            }
        }
        out
    }
}

/// Sends each file to the analyzer for its language.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'e> {
    engine: &'e Engine,
    service: Option<&'e ServiceHandle>,
}

impl<'e> Dispatcher<'e> {
    pub fn new(engine: &'e Engine, service: Option<&'e ServiceHandle>) -> Self {
        Self { engine, service }
    }

    /// Analyze a batch. Excluded files get no entry.
    pub fn analyze_batch(&self, files: &[SourceFile], mode: AnalysisMode) -> ResultMap {
        let partition = Partition::of(files);
        debug!(
            native = partition.native.len(),
            service = partition.service.len(),
            excluded = partition.excluded.len(),
            "dispatching batch"
        );

        let mut results = match mode {
            AnalysisMode::SingleFile => self.engine.analyze_files(&partition.native),
            AnalysisMode::Workspace => self.engine.analyze_workspace(&partition.native),
        };

        if !partition.service.is_empty() {
            let delegated = match mode {
                AnalysisMode::SingleFile => self.service_files(&partition.service),
                AnalysisMode::Workspace => self.service_workspace(&partition.service),
            };
            results.extend(delegated);
        }
        results
    }

    /// Analyze one file. `None` when its type is not recognized.
    pub fn analyze_file(&self, filename: &str, content: &str) -> Option<AnalysisResult> {
        match route_for(filename) {
            Route::Native => Some(self.engine.analyze_file(filename, content)),
            Route::Service(lang) => Some(self.service_file(lang, filename, content)),
            Route::Excluded => None,
        }
    }

    /// Language label for a filename.
    pub fn detect_language(&self, filename: &str) -> String {
        if route_for(filename) == Route::Native {
            return NATIVE_LABEL.to_string();
        }
        let Some(service) = self.service else {
            return UNKNOWN_LABEL.to_string();
        };
        match service.detect_language(filename) {
            Ok(raw) => decode_language(&raw).unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
            Err(e) => {
                warn!(file = %filename, error = %e, "language detection failed");
                UNKNOWN_LABEL.to_string()
            }
        }
    }

    fn service_file(&self, lang: Language, filename: &str, content: &str) -> AnalysisResult {
        let Some(service) = self.service else {
            debug!(file = %filename, "no analysis service configured");
            return AnalysisResult::empty();
        };

        let request = CodeRequest {
            content,
            filename,
            language: Some(lang.as_str()),
        };
        let outcome = serde_json::to_string(&request)
            .map_err(|e| DeadsymError::service(e.to_string()))
            .and_then(|req| service.analyze_code(req))
            .and_then(|raw| decode_result(&raw, filename));

        match outcome {
            Ok(result) => result,
            Err(e) => {
                warn!(file = %filename, error = %e, "service analysis failed, reporting nothing");
                AnalysisResult::empty()
            }
        }
    }

    fn service_files(&self, files: &[(Language, SourceFile)]) -> ResultMap {
        files
            .iter()
            .map(|(lang, f)| {
                (
                    f.filename.clone(),
                    self.service_file(*lang, &f.filename, &f.content),
                )
            })
            .collect()
    }

    fn service_workspace(&self, files: &[(Language, SourceFile)]) -> ResultMap {
        let mut results: ResultMap = files
            .iter()
            .map(|(_, f)| (f.filename.clone(), AnalysisResult::empty()))
            .collect();

        let Some(service) = self.service else {
            debug!(files = files.len(), "no analysis service configured");
            return results;
        };

        let request = WorkspaceRequest {
            files: files
                .iter()
                .map(|(_, f)| WorkspaceFileRequest {
                    content: &f.content,
                    filename: &f.filename,
                    hash: Some(fingerprint(&f.content)),
                })
                .collect(),
        };
        let outcome = serde_json::to_string(&request)
            .map_err(|e| DeadsymError::service(e.to_string()))
            .and_then(|req| service.analyze_workspace(req))
            .and_then(|raw| decode_batch(&raw));

        match outcome {
            Ok(decoded) => {
                for (filename, result) in decoded {
                    if let Some(slot) = results.get_mut(&filename) {
                        *slot = result;
                    } else {
                        debug!(file = %filename, "service returned unrequested file, dropped");
                    }
                }
            }
            Err(e) => {
                warn!(files = files.len(), error = %e, "service workspace analysis failed, reporting nothing");
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::service::testing::FakeService;
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn handle_with(fake: FakeService) -> (Arc<FakeService>, ServiceHandle) {
        let fake = Arc::new(fake);
        let svc: Arc<dyn AnalysisService> = fake.clone();
        (fake, ServiceHandle::new(svc, Duration::from_secs(5)))
    }

    fn batch() -> Vec<SourceFile> {
        vec![
            SourceFile::new("a.ts", "import x from 'x';"),
            SourceFile::new("b.PY", "import os"),
            SourceFile::new("notes.md", "# hi"),
        ]
    }

    #[test]
    fn test_partition() {
        let p = Partition::of(&batch());
        assert_eq!(p.native.len(), 1);
        assert_eq!(p.service.len(), 1);
        assert_eq!(p.service[0].0, Language::Python);
        assert_eq!(p.excluded, vec!["notes.md".to_string()]);
    }

    #[test]
    fn test_merge_native_and_service() {
        let (fake, handle) = handle_with(FakeService {
            code_response: r#"{"Imports":[{"Line":1,"Text":"import os"}]}"#.to_string(),
            ..FakeService::default()
        });
        let engine = Engine::new();
        let dispatcher = Dispatcher::new(&engine, Some(&handle));

        let results = dispatcher.analyze_batch(&batch(), AnalysisMode::SingleFile);
        assert_eq!(results.len(), 2);
        assert_eq!(results["a.ts"].imports[0].text, "import x");
        assert_eq!(results["b.PY"].imports[0].text, "import os");
        assert_eq!(results["b.PY"].imports[0].file, "b.PY");
        assert!(!results.contains_key("notes.md"));
        assert!(fake.recorded()[0].contains("\"language\":\"python\""));
    }

    #[test]
    fn test_missing_service_degrades_to_empty() {
        let engine = Engine::new();
        let dispatcher = Dispatcher::new(&engine, None);
        let results = dispatcher.analyze_batch(&batch(), AnalysisMode::Workspace);
        assert!(results["b.PY"].is_empty());
        assert_eq!(results["a.ts"].imports.len(), 1);
    }

    #[test]
    fn test_failed_service_degrades_to_empty() {
        let (_fake, handle) = handle_with(FakeService {
            init_fails: true,
            ..FakeService::default()
        });
        let engine = Engine::new();
        let dispatcher = Dispatcher::new(&engine, Some(&handle));
        let result = dispatcher.analyze_file("main.go", "package main").unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_workspace_request_carries_hashes() {
        let (fake, handle) = handle_with(FakeService {
            workspace_response:
                r#"{"results":{"b.PY":{"variables":[{"line":2,"text":"var y"}]},"other.py":{}}}"#
                    .to_string(),
            ..FakeService::default()
        });
        let engine = Engine::new();
        let dispatcher = Dispatcher::new(&engine, Some(&handle));
        let results = dispatcher.analyze_batch(&batch(), AnalysisMode::Workspace);

        assert_eq!(results["b.PY"].variables[0].text, "var y");
        assert!(!results.contains_key("other.py"));

        let sent: serde_json::Value = serde_json::from_str(&fake.recorded()[0]).unwrap();
        assert_eq!(sent["files"][0]["hash"], fingerprint("import os"));
    }

    #[test]
    fn test_excluded_file_has_no_result() {
        let engine = Engine::new();
        let dispatcher = Dispatcher::new(&engine, None);
        assert!(dispatcher.analyze_file("image.png", "").is_none());
    }

    #[test]
    fn test_detect_language_labels() {
        let (_fake, handle) = handle_with(FakeService {
            language: "\"ruby\"".to_string(),
            ..FakeService::default()
        });
        let engine = Engine::new();
        let with = Dispatcher::new(&engine, Some(&handle));
        let without = Dispatcher::new(&engine, None);

        assert_eq!(with.detect_language("x.svelte"), NATIVE_LABEL);
        assert_eq!(with.detect_language("x.rb"), "ruby");
        assert_eq!(without.detect_language("x.rb"), UNKNOWN_LABEL);
    }
}

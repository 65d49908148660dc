// Runtime pins for the execution engine
// Each language maps to the engine runtime, version and source file it runs under

use prepcode_common::types::Language;
use serde::Serialize;

pub const COMPILE_TIMEOUT_MS: u64 = 10_000;
pub const RUN_TIMEOUT_MS: u64 = 3_000;
/// -1 leaves memory limits to the engine defaults
pub const MEMORY_LIMIT_UNBOUNDED: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LanguageRuntime {
    pub language: Language,
    pub runtime: &'static str,
    pub version: &'static str,
    #[serde(skip)]
    pub file_name: &'static str,
}

/// Engine runtime for a language.
///
/// These versions must match the runtimes installed on the engine; bumping one
/// here without installing it there makes every execution fail.
pub fn runtime_for(language: Language) -> LanguageRuntime {
    let (runtime, version, file_name) = match language {
        Language::Javascript => ("javascript", "18.15.0", "main.js"),
        Language::Python => ("python", "3.10.0", "main.py"),
        Language::Java => ("java", "15.0.2", "Main.java"),
        Language::Cpp => ("c++", "10.2.0", "main.cpp"),
        Language::C => ("c", "10.2.0", "main.c"),
    };

    LanguageRuntime {
        language,
        runtime,
        version,
        file_name,
    }
}

/// All supported runtimes, in declaration order
pub fn supported_runtimes() -> Vec<LanguageRuntime> {
    Language::ALL.into_iter().map(runtime_for).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_language_has_runtime() {
        let runtimes = supported_runtimes();
        assert_eq!(runtimes.len(), 5);
        for rt in &runtimes {
            assert!(!rt.version.is_empty());
            assert!(rt.file_name.starts_with("main") || rt.file_name == "Main.java");
        }
    }

    #[test]
    fn test_cpp_uses_engine_name() {
        let rt = runtime_for(Language::Cpp);
        assert_eq!(rt.runtime, "c++");
        assert_eq!(rt.version, "10.2.0");
        assert_eq!(rt.file_name, "main.cpp");
    }

    #[test]
    fn test_java_public_class_file() {
        assert_eq!(runtime_for(Language::Java).file_name, "Main.java");
    }

    #[test]
    fn test_listing_serializes_without_file_name() {
        let value = serde_json::to_value(runtime_for(Language::Python)).unwrap();
        assert_eq!(value["language"], "python");
        assert_eq!(value["runtime"], "python");
        assert_eq!(value["version"], "3.10.0");
        assert!(value.get("file_name").is_none());
    }
}

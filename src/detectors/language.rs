//! detectors/language.rs
//!
//! Extension based language classification for a single changed file.

use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Java,
    Cpp,
    CSharp,
    Go,
    Unknown,
}

impl Language {
    pub const ALL: [Language; 8] = [
        Language::Python,
        Language::JavaScript,
        Language::TypeScript,
        Language::Java,
        Language::Cpp,
        Language::CSharp,
        Language::Go,
        Language::Unknown,
    ];

    /// Human readable name. Also used (lower-cased) as the suffix of the
    /// generated test file, so `C++` really does end up as `_test.c++`.
    pub fn name(self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
            Language::Java => "Java",
            Language::Cpp => "C++",
            Language::CSharp => "C#",
            Language::Go => "Go",
            Language::Unknown => "Unknown",
        }
    }

    /// Languages whose import lines are scanned for related sources.
    pub fn scans_imports(self) -> bool {
        matches!(
            self,
            Language::Python | Language::JavaScript | Language::TypeScript
        )
    }
}

/* ============================================================
   Public API
   ============================================================ */

pub fn detect_language(file: &Path) -> Language {
    let Some(ext) = file.extension().and_then(|e| e.to_str()) else {
        return Language::Unknown;
    };

    match ext.to_ascii_lowercase().as_str() {
        "py" => Language::Python,
        "js" => Language::JavaScript,
        "ts" => Language::TypeScript,
        "java" => Language::Java,
        "cpp" => Language::Cpp,
        "cs" => Language::CSharp,
        "go" => Language::Go,
        _ => Language::Unknown,
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

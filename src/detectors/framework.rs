//! detectors/framework.rs
//!
//! Test framework naming per language.

use std::fmt;

use super::language::Language;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TestFramework {
    Pytest,
    Jest,
    JUnit,
    GoogleTest,
    NUnit,
    GoTesting,
    Unknown,
}

impl TestFramework {
    pub fn label(self) -> &'static str {
        match self {
            TestFramework::Pytest => "pytest",
            TestFramework::Jest => "jest",
            TestFramework::JUnit => "JUnit",
            TestFramework::GoogleTest => "Google Test",
            TestFramework::NUnit => "NUnit",
            TestFramework::GoTesting => "testing",
            TestFramework::Unknown => "unknown",
        }
    }
}

/* ============================================================
   Public API
   ============================================================ */

pub fn framework_for(language: Language) -> TestFramework {
    match language {
        Language::Python => TestFramework::Pytest,
        Language::JavaScript | Language::TypeScript => TestFramework::Jest,
        Language::Java => TestFramework::JUnit,
        Language::Cpp => TestFramework::GoogleTest,
        Language::CSharp => TestFramework::NUnit,
        Language::Go => TestFramework::GoTesting,
        Language::Unknown => TestFramework::Unknown,
    }
}

impl fmt::Display for TestFramework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

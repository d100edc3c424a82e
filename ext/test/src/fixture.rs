//! Conformance test fixture runner
//!
//! Loads YAML fixtures and runs them against the mailsift engine.
//!
//! ```yaml
//! name: cascade
//! description: later rules see earlier mutations
//! rules:
//!   label:x: label:y
//!   label:y: label:z
//! cases:
//!   - name: x cascades to z
//!     message: { labels: [x] }
//!     expect: [x, y, z]
//! ```

use crate::TestMessage;
use mailsift::prelude::*;
use serde::Deserialize;

/// A complete test fixture
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub rules: RawRules,
    /// Expected number of compile diagnostics, when checked.
    #[serde(default)]
    pub diagnostics: Option<usize>,
    pub cases: Vec<TestCase>,
}

/// Message fields; anything omitted is empty
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MessageConfig {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub list: String,
    pub body: String,
    pub labels: Vec<String>,
}

/// Test case
#[derive(Debug, Deserialize)]
pub struct TestCase {
    pub name: String,
    #[serde(default)]
    pub message: MessageConfig,
    /// Labels after one pass, in any order.
    pub expect: Vec<String>,
}

impl TestCase {
    /// Build a TestMessage from this case's message fields
    pub fn build_message(&self) -> TestMessage {
        let m = &self.message;
        TestMessage::new()
            .with_from(&m.from)
            .with_to(&m.to)
            .with_subject(&m.subject)
            .with_list(&m.list)
            .with_body(&m.body)
            .with_labels(m.labels.iter().cloned())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Runner
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of running a single test case
#[derive(Debug)]
pub struct CaseResult {
    pub case_name: String,
    pub passed: bool,
    pub expected: Vec<String>,
    pub actual: Vec<String>,
}

impl Fixture {
    /// Parse a fixture from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse multiple fixtures from a YAML file with `---` separators
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    /// Run all test cases and return results
    pub fn run(&self) -> Vec<CaseResult> {
        let rule_set = RuleCompiler::compile(&self.rules).rule_set;
        self.cases
            .iter()
            .map(|case| {
                let mut message = case.build_message();
                rule_set.apply(&mut message);

                let actual: Vec<String> = message.labels().into_iter().map(String::from).collect();
                let mut expected = case.expect.clone();
                expected.sort();
                expected.dedup();
                CaseResult {
                    case_name: case.name.clone(),
                    passed: actual == expected,
                    expected,
                    actual,
                }
            })
            .collect()
    }

    /// Run all test cases and panic on first failure
    pub fn run_and_assert(&self) {
        if let Some(expected) = self.diagnostics {
            let diagnostics = RuleCompiler::check(&self.rules);
            assert_eq!(
                diagnostics.len(),
                expected,
                "Fixture '{}' expected {expected} diagnostics, got {diagnostics:#?}",
                self.name
            );
        }
        for result in self.run() {
            assert!(
                result.passed,
                "Fixture '{}' case '{}' failed: expected {:?}, got {:?}",
                self.name, result.case_name, result.expected, result.actual
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
name: spam
description: read runs before spam is known, so unread survives
rules:
  spam: read
  "from:@spam\\.test$": spam
cases:
  - name: spammer
    message:
      from: bot@SPAM.test
      labels: [inbox, unread]
    expect: [spam, unread]
  - name: friend
    message:
      from: alice@example.com
      labels: [inbox]
    expect: [inbox]
"#;

    #[test]
    fn parses_and_runs() {
        let fixture = Fixture::from_yaml(YAML).unwrap();
        assert_eq!(fixture.rules.len(), 2);
        let results = fixture.run();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.passed), "{results:#?}");
    }

    #[test]
    fn multi_document() {
        let yaml = format!("{YAML}---\n{YAML}");
        assert_eq!(Fixture::from_yaml_multi(&yaml).unwrap().len(), 2);
    }

    #[test]
    fn failing_case_reported() {
        let yaml = "name: f\nrules: {inbox: star}\ncases:\n  - name: c\n    message: {labels: [inbox]}\n    expect: [inbox, starred]\n";
        let results = Fixture::from_yaml(yaml).unwrap().run();
        assert!(!results[0].passed);
        assert_eq!(results[0].actual, ["inbox"]);
    }
}

//! @ai:module:intent File-based registry of test cases grouped by complexity
//! @ai:module:layer infrastructure
//! @ai:module:public_api DatasetRegistry, DatasetRegistryTrait, DatasetSummary
//! @ai:module:stateless true

use crate::config::FilterConfig;
use crate::dataset::session::RecordedSession;
use crate::dataset::test_case::{validate_name, Complexity, TestCase};
use crate::error::{EvalError, Result};
use crate::runner::prompt::build_generation_prompt;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// @ai:intent Trait for test case bookkeeping
pub trait DatasetRegistryTrait: Send + Sync {
    /// @ai:intent Load all registered test cases
    fn load_all(&self) -> Vec<TestCase>;

    /// @ai:intent Load test cases matching filter criteria
    fn load_filtered(&self, filter: &FilterConfig) -> Vec<TestCase>;

    /// @ai:intent Register a recorded session as a new test case
    fn add_test_case(&self, session_file: &Path, category: Complexity, name: &str) -> Result<TestCase>;
}

/// @ai:intent Count of registered test cases per category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub total_cases: usize,
    pub by_category: BTreeMap<Complexity, usize>,
    pub created_at: String,
}

/// @ai:intent One line of the JSONL evaluation dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetEntry {
    pub prompt: String,
    pub category: Complexity,
    pub name: String,
}

/// @ai:intent Tracks test case files under `<root>/<category>/<name>.json`
pub struct DatasetRegistry {
    root: PathBuf,
}

impl DatasetRegistry {
    /// @ai:intent Create a registry rooted at the test cases directory
    /// @ai:effects pure
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// @ai:intent Root directory of the registry
    /// @ai:effects pure
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// @ai:intent Find all session files in one category directory
    /// @ai:effects fs:read
    fn find_case_files(category_dir: &Path) -> Vec<PathBuf> {
        WalkDir::new(category_dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "json")
                    .unwrap_or(false)
            })
            .map(|e| e.path().to_path_buf())
            .collect()
    }

    /// @ai:intent Summarize the registered dataset
    /// @ai:effects fs:read
    pub fn summary(&self) -> DatasetSummary {
        let cases = self.load_all();
        let mut by_category: BTreeMap<Complexity, usize> =
            Complexity::ALL.iter().map(|c| (*c, 0)).collect();

        for case in &cases {
            *by_category.entry(case.category).or_insert(0) += 1;
        }

        DatasetSummary {
            total_cases: cases.len(),
            by_category,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// @ai:intent Write the dataset summary next to the results
    /// @ai:effects fs:write
    pub fn write_summary(&self, output_dir: &Path) -> anyhow::Result<DatasetSummary> {
        std::fs::create_dir_all(output_dir)?;
        let summary = self.summary();
        let path = output_dir.join("dataset_summary.json");
        std::fs::write(&path, serde_json::to_string_pretty(&summary)?)?;
        tracing::info!("Dataset summary saved to {}", path.display());
        Ok(summary)
    }

    /// @ai:intent Write one prompt per test case as JSONL; unreadable sessions are skipped
    /// @ai:effects fs:read, fs:write
    pub fn write_evaluation_jsonl(&self, output_path: &Path) -> anyhow::Result<usize> {
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = std::fs::File::create(output_path)
            .with_context(|| format!("Failed to create {}", output_path.display()))?;
        let mut written = 0;

        for case in self.load_all() {
            let session = match RecordedSession::load(&case.session_path) {
                Ok(session) => session,
                Err(e) => {
                    tracing::warn!("Skipping test case {}: {}", case.id(), e);
                    continue;
                }
            };

            let entry = DatasetEntry {
                prompt: build_generation_prompt(&session.to_timeline())?,
                category: case.category,
                name: case.name.clone(),
            };

            writeln!(file, "{}", serde_json::to_string(&entry)?)?;
            written += 1;
        }

        tracing::info!("Wrote {} entries to {}", written, output_path.display());
        Ok(written)
    }
}

impl DatasetRegistryTrait for DatasetRegistry {
    /// @ai:intent Load all test cases, sorted by category then name
    /// @ai:effects fs:read
    fn load_all(&self) -> Vec<TestCase> {
        let mut cases = Vec::new();

        for category in Complexity::ALL {
            let category_dir = self.root.join(category.as_str());

            if !category_dir.is_dir() {
                continue;
            }

            for path in Self::find_case_files(&category_dir) {
                let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                    tracing::warn!("Skipping test case with non UTF-8 name: {}", path.display());
                    continue;
                };

                cases.push(TestCase {
                    category,
                    name: name.to_string(),
                    session_path: path.clone(),
                });
            }
        }

        cases.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.name.cmp(&b.name)));
        cases
    }

    /// @ai:intent Load test cases matching filter criteria
    /// @ai:effects fs:read
    fn load_filtered(&self, filter: &FilterConfig) -> Vec<TestCase> {
        self.load_all()
            .into_iter()
            .filter(|case| filter.matches(case.category.as_str(), &case.name))
            .collect()
    }

    /// @ai:intent Copy a session file into the registry after validating it parses
    /// @ai:pre name is a valid file stem and not yet registered in the category
    /// @ai:effects fs:read, fs:write
    fn add_test_case(&self, session_file: &Path, category: Complexity, name: &str) -> Result<TestCase> {
        validate_name(name)?;

        let session = RecordedSession::load(session_file)?;
        if session.actions.is_empty() {
            tracing::warn!("Session {} has no recorded actions", session_file.display());
        }

        let category_dir = self.root.join(category.as_str());
        std::fs::create_dir_all(&category_dir)?;

        let target = category_dir.join(format!("{}.json", name));
        if target.exists() {
            return Err(EvalError::DuplicateTestCase(format!("{}/{}", category, name)));
        }

        std::fs::write(&target, serde_json::to_string_pretty(&session)?)?;
        tracing::info!("Saved test case: {}/{}.json", category, name);

        Ok(TestCase {
            category,
            name: name.to_string(),
            session_path: target,
        })
    }
}

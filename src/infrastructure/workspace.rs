//! Filesystem layout and persistence for the `docs/` workspace.
//!
//! All paths are derived from a single root so tests can run against a temp
//! directory. JSON documents are written pretty-printed with a trailing
//! newline; the candidate logs are append-only JSONL.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::domain::errors::{OrchestratorError, OrchestratorResult};
use crate::domain::models::{RoundManifest, TaskItems, WorkerPayload};
use crate::services::merge::WorkerOutput;

/// Handle to the orchestration workspace rooted at a project directory.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn docs_dir(&self) -> PathBuf {
        self.root.join("docs")
    }

    pub fn config_path(&self) -> PathBuf {
        self.docs_dir().join("orchestration.config.json")
    }

    pub fn state_path(&self) -> PathBuf {
        self.docs_dir().join("orchestration-state.json")
    }

    pub fn journey_map_path(&self) -> PathBuf {
        self.docs_dir().join("journey-map.json")
    }

    pub fn journey_map_md_path(&self) -> PathBuf {
        self.docs_dir().join("journey-map.md")
    }

    pub fn feature_map_path(&self) -> PathBuf {
        self.docs_dir().join("feature-map.json")
    }

    pub fn feature_map_md_path(&self) -> PathBuf {
        self.docs_dir().join("feature-map.md")
    }

    pub fn journey_frontier_path(&self) -> PathBuf {
        self.docs_dir().join("journey-frontier.json")
    }

    pub fn feature_frontier_path(&self) -> PathBuf {
        self.docs_dir().join("feature-frontier.json")
    }

    pub fn journey_coverage_path(&self) -> PathBuf {
        self.docs_dir().join("journey-coverage.json")
    }

    pub fn feature_coverage_path(&self) -> PathBuf {
        self.docs_dir().join("feature-coverage.json")
    }

    pub fn journey_candidates_path(&self) -> PathBuf {
        self.docs_dir().join("journey-candidates.jsonl")
    }

    pub fn feature_candidates_path(&self) -> PathBuf {
        self.docs_dir().join("feature-candidates.jsonl")
    }

    pub fn prompts_dir(&self) -> PathBuf {
        self.docs_dir().join("subagent-prompts")
    }

    pub fn runs_dir(&self) -> PathBuf {
        self.docs_dir().join("agent-runs")
    }

    pub fn round_dir(&self, round_slug: &str) -> PathBuf {
        self.runs_dir().join(round_slug)
    }

    pub fn tasks_dir(&self, round_slug: &str) -> PathBuf {
        self.round_dir(round_slug).join("tasks")
    }

    pub fn outputs_dir(&self, round_slug: &str) -> PathBuf {
        self.round_dir(round_slug).join("outputs")
    }

    pub fn screenshots_dir(&self, round_slug: &str) -> PathBuf {
        self.round_dir(round_slug).join("screenshots")
    }

    pub fn manifest_path(&self, round_slug: &str) -> PathBuf {
        self.round_dir(round_slug).join("manifest.json")
    }

    pub fn merge_summary_path(&self, round_slug: &str) -> PathBuf {
        self.round_dir(round_slug).join("merge-summary.json")
    }

    pub fn round_instructions_path(&self, round_slug: &str) -> PathBuf {
        self.round_dir(round_slug).join("ROUND-INSTRUCTIONS.md")
    }

    pub fn ensure_dir(&self, path: &Path) -> OrchestratorResult<()> {
        fs::create_dir_all(path).map_err(|source| OrchestratorError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read a JSON document, falling back to `T::default()` when the file
    /// does not exist. Malformed JSON is a fatal error, never silently
    /// replaced.
    pub fn read_json<T>(&self, path: &Path) -> OrchestratorResult<T>
    where
        T: DeserializeOwned + Default,
    {
        match fs::read_to_string(path) {
            Ok(raw) => {
                serde_json::from_str(&raw).map_err(|source| OrchestratorError::InvalidJson {
                    path: path.to_path_buf(),
                    source,
                })
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
            Err(source) => Err(OrchestratorError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Read the manifest for a round; its absence is an error because the
    /// pending marker promised it exists.
    pub fn read_manifest(&self, round: u32, round_slug: &str) -> OrchestratorResult<RoundManifest> {
        let path = self.manifest_path(round_slug);
        let raw = fs::read_to_string(&path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                OrchestratorError::MissingManifest { round, path: path.clone() }
            } else {
                OrchestratorError::Io {
                    path: path.clone(),
                    source: err,
                }
            }
        })?;
        serde_json::from_str(&raw)
            .map_err(|source| OrchestratorError::InvalidJson { path, source })
    }

    /// Write a JSON document pretty-printed with a trailing newline,
    /// creating parent directories as needed.
    pub fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> OrchestratorResult<()> {
        if let Some(parent) = path.parent() {
            self.ensure_dir(parent)?;
        }
        let mut body =
            serde_json::to_string_pretty(value).map_err(|source| OrchestratorError::InvalidJson {
                path: path.to_path_buf(),
                source,
            })?;
        body.push('\n');
        fs::write(path, body).map_err(|source| OrchestratorError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn write_text(&self, path: &Path, content: &str) -> OrchestratorResult<()> {
        if let Some(parent) = path.parent() {
            self.ensure_dir(parent)?;
        }
        fs::write(path, content).map_err(|source| OrchestratorError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Create a file with the given content only if it does not exist yet.
    /// Returns whether the file was created.
    pub fn ensure_file(&self, path: &Path, content: &str) -> OrchestratorResult<bool> {
        if path.exists() {
            return Ok(false);
        }
        self.write_text(path, content)?;
        Ok(true)
    }

    /// Create a JSON document only if it does not exist yet. Returns whether
    /// the file was created.
    pub fn ensure_json<T: Serialize>(&self, path: &Path, value: &T) -> OrchestratorResult<bool> {
        if path.exists() {
            return Ok(false);
        }
        self.write_json(path, value)?;
        Ok(true)
    }

    /// Append records to a JSONL log, one compact line per record.
    pub fn append_jsonl<T: Serialize>(&self, path: &Path, records: &[T]) -> OrchestratorResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            self.ensure_dir(parent)?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| OrchestratorError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        for record in records {
            let line =
                serde_json::to_string(record).map_err(|source| OrchestratorError::InvalidJson {
                    path: path.to_path_buf(),
                    source,
                })?;
            writeln!(file, "{line}").map_err(|source| OrchestratorError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }

    /// Read every `.json` worker output of a round in lexicographic file
    /// name order. A missing outputs directory means no worker reported.
    pub fn read_round_outputs(&self, round_slug: &str) -> OrchestratorResult<Vec<WorkerOutput>> {
        let dir = self.outputs_dir(round_slug);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(source) => {
                return Err(OrchestratorError::Io { path: dir, source });
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.ends_with(".json"))
            .collect();
        names.sort();

        let mut outputs = Vec::with_capacity(names.len());
        for name in names {
            let path = dir.join(&name);
            let raw = fs::read_to_string(&path).map_err(|source| OrchestratorError::Io {
                path: path.clone(),
                source,
            })?;
            let payload: WorkerPayload = serde_json::from_str(&raw).map_err(|err| {
                OrchestratorError::InvalidWorkerOutput {
                    path: path.clone(),
                    reason: err.to_string(),
                }
            })?;
            outputs.push(WorkerOutput {
                file_name: name,
                payload,
            });
        }
        debug!(round_slug, count = outputs.len(), "read worker outputs");
        Ok(outputs)
    }

    /// Read the dispatched task shards of a round, keyed by task id. Used by
    /// the merge to requeue shards whose worker never reported.
    pub fn read_task_shards(
        &self,
        round_slug: &str,
    ) -> OrchestratorResult<BTreeMap<String, TaskItems>> {
        let dir = self.tasks_dir(round_slug);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(OrchestratorError::Io { path: dir, source });
            }
        };

        let mut shards = BTreeMap::new();
        for entry in entries.filter_map(Result::ok) {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            let Some(task_id) = name.strip_suffix(".json") else {
                continue;
            };
            let path = dir.join(&name);
            let raw = fs::read_to_string(&path).map_err(|source| OrchestratorError::Io {
                path: path.clone(),
                source,
            })?;
            let task: crate::domain::models::WorkerTask = serde_json::from_str(&raw)
                .map_err(|source| OrchestratorError::InvalidJson { path, source })?;
            shards.insert(task_id.to_string(), task.items);
        }
        Ok(shards)
    }
}

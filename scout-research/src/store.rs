//! Report storage
//!
//! Completed reports are persisted as JSON files under a data directory.
//! The in-flight session state is never persisted; only terminal reports
//! are.

use crate::types::ResearchReport;
use crate::{ResearchError, ResearchResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One stored report with its identifier
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredReport {
    id: String,
    report: ResearchReport,
}

/// Summary of a stored report for listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub id: String,
    pub query: String,
    pub confidence: f64,
    pub iterations: usize,
    pub completed_at: DateTime<Utc>,
}

/// File-based report storage
#[derive(Debug, Clone)]
pub struct FileReportStore {
    storage_dir: PathBuf,
}

impl FileReportStore {
    /// Create a store rooted at `storage_dir`, creating it if needed
    pub fn new<P: AsRef<Path>>(storage_dir: P) -> ResearchResult<Self> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;
        Ok(Self { storage_dir })
    }

    /// Create a store under the platform data directory
    pub fn default_location() -> ResearchResult<Self> {
        let base = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scout")
            .join("reports");
        Self::new(base)
    }

    /// Persist a report, returning its new identifier
    pub fn save(&self, report: &ResearchReport) -> ResearchResult<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let record = StoredReport {
            id: id.clone(),
            report: report.clone(),
        };

        let path = self.report_path(&id);
        let content = serde_json::to_string_pretty(&record)?;
        std::fs::write(&path, content)?;

        info!(report_id = %id, path = %path.display(), "Report saved");
        Ok(id)
    }

    /// Load a report by identifier
    pub fn load(&self, id: &str) -> ResearchResult<ResearchReport> {
        let path = self.report_path(id);
        if !path.exists() {
            return Err(ResearchError::not_found(format!("report not found: {}", id)));
        }

        let content = std::fs::read_to_string(path)?;
        let record: StoredReport = serde_json::from_str(&content)?;
        Ok(record.report)
    }

    /// List stored reports, most recent first
    pub fn list(&self) -> ResearchResult<Vec<ReportSummary>> {
        let mut summaries = Vec::new();

        for entry in std::fs::read_dir(&self.storage_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let content = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<StoredReport>(&content) {
                Ok(record) => summaries.push(ReportSummary {
                    id: record.id,
                    query: record.report.query,
                    confidence: record.report.confidence,
                    iterations: record.report.iterations,
                    completed_at: record.report.completed_at,
                }),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Skipping unreadable report file");
                }
            }
        }

        summaries.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(summaries)
    }

    /// Delete a stored report
    pub fn delete(&self, id: &str) -> ResearchResult<()> {
        let path = self.report_path(id);
        if !path.exists() {
            return Err(ResearchError::not_found(format!("report not found: {}", id)));
        }
        std::fs::remove_file(path)?;
        info!(report_id = %id, "Report deleted");
        Ok(())
    }

    fn report_path(&self, id: &str) -> PathBuf {
        self.storage_dir.join(format!("{}.json", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Finding, SourceKind};
    use std::collections::BTreeMap;

    fn sample_report() -> ResearchReport {
        let mut sources = BTreeMap::new();
        sources.insert(SourceKind::Web, vec!["test query".to_string()]);

        ResearchReport {
            query: "test query".into(),
            objective: "test objective".into(),
            findings: vec![Finding::new(
                "some content".into(),
                SourceKind::Web,
                None,
                Some("web search: test query".into()),
                0.8,
            )],
            synthesis: "a synthesis".into(),
            confidence: 0.85,
            sources_consulted: sources,
            iterations: 2,
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileReportStore::new(dir.path()).unwrap();

        let report = sample_report();
        let id = store.save(&report).unwrap();

        let loaded = store.load(&id).unwrap();
        assert_eq!(loaded.query, report.query);
        assert_eq!(loaded.synthesis, report.synthesis);
        assert_eq!(loaded.findings.len(), 1);
        assert_eq!(loaded.findings[0].source, SourceKind::Web);
    }

    #[test]
    fn list_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileReportStore::new(dir.path()).unwrap();

        let id = store.save(&sample_report()).unwrap();
        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
        assert_eq!(listed[0].iterations, 2);

        store.delete(&id).unwrap();
        assert!(store.list().unwrap().is_empty());
        assert!(store.load(&id).is_err());
    }

    #[test]
    fn missing_report_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileReportStore::new(dir.path()).unwrap();
        assert!(matches!(
            store.load("nope"),
            Err(ResearchError::NotFound { .. })
        ));
    }
}

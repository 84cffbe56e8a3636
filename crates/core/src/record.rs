//! Result records returned by the submit and lookup endpoints.

use serde::Serialize;

use crate::content_hash::ContentHash;

/// Lifecycle of the most recent restoration for a hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// An original exists but no restoration is known to this process.
    Idle,
    /// A restoration task has been scheduled and has not finished.
    Pending,
    /// The restored image and faces are on disk.
    Done,
    /// The last restoration task failed; its output was never written.
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Whether the status is final for its task.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Snapshot of what the store holds for one hash.
///
/// Rebuilt from the filesystem on every request; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRecord {
    pub hash: ContentHash,
    /// Path of the original, relative to the hash directory.
    pub original: String,
    /// Path of the restored image, `None` until a restoration completes.
    pub restored: Option<String>,
    /// Face crop paths ordered by face index.
    pub faces: Vec<String>,
    pub status: JobStatus,
}

impl ResultRecord {
    /// Status implied by the files alone: a restored image on disk means a
    /// past run completed (possibly before a restart).
    pub fn status_from_disk(has_restored: bool) -> JobStatus {
        if has_restored {
            JobStatus::Done
        } else {
            JobStatus::Idle
        }
    }

    /// Overlay the status of a job tracked by this process, if any.
    pub fn with_tracked_status(mut self, tracked: Option<JobStatus>) -> Self {
        if let Some(status) = tracked {
            self.status = status;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_value(JobStatus::Pending).unwrap();
        assert_eq!(json, "pending");
        assert_eq!(JobStatus::Failed.as_str(), "failed");
    }

    fn sample(restored: Option<&str>) -> ResultRecord {
        ResultRecord {
            hash: ContentHash::of_bytes(b"x"),
            original: "/original.png".into(),
            restored: restored.map(String::from),
            faces: vec![],
            status: ResultRecord::status_from_disk(restored.is_some()),
        }
    }

    #[test]
    fn untracked_status_follows_disk() {
        assert_eq!(sample(Some("/restored.png")).status, JobStatus::Done);
        assert_eq!(sample(None).status, JobStatus::Idle);
    }

    #[test]
    fn tracked_status_wins() {
        let record = sample(None).with_tracked_status(Some(JobStatus::Failed));
        assert_eq!(record.status, JobStatus::Failed);

        let record = sample(Some("/restored.png")).with_tracked_status(None);
        assert_eq!(record.status, JobStatus::Done);
    }

    #[test]
    fn record_serializes_missing_restored_as_null() {
        let record = sample(None).with_tracked_status(Some(JobStatus::Pending));
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["restored"].is_null());
        assert_eq!(json["faces"], serde_json::json!([]));
        assert_eq!(json["original"], "/original.png");
        assert_eq!(json["status"], "pending");
    }
}

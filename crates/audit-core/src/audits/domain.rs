//! Audit-side view of a template: the same area/scope/question hierarchy, but
//! carrying per-question responses captured while conducting the audit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Draft,
    Scheduled,
    InProgress,
    Completed,
    Closed,
}

impl AuditStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Scheduled => "Scheduled",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Closed => "Closed",
        }
    }
}

/// Red/Amber/Green banding of a 0-100 percentage. Lower bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RagStatus {
    Red,
    Amber,
    Green,
}

impl RagStatus {
    pub fn from_percentage(percentage: u32) -> Self {
        if percentage >= 70 {
            Self::Green
        } else if percentage >= 40 {
            Self::Amber
        } else {
            Self::Red
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Red => "Red",
            Self::Amber => "Amber",
            Self::Green => "Green",
        }
    }
}

/// Reference to an uploaded evidence file attached to a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub id: String,
    pub file_name: String,
    pub file_url: String,
}

/// Captured answer for one question. `score` must be one of the question's
/// option values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResponse {
    pub score: Option<u32>,
    pub comment: Option<String>,
    pub recommendation: Option<String>,
    #[serde(default)]
    pub evidences: Vec<Evidence>,
    pub is_answered: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreOption {
    pub value: u32,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditQuestion {
    pub id: String,
    pub text: String,
    pub is_mandatory: bool,
    #[serde(default)]
    pub options: Vec<ScoreOption>,
    pub response: Option<QuestionResponse>,
}

impl AuditQuestion {
    pub fn is_answered(&self) -> bool {
        self.response
            .as_ref()
            .map(|response| response.is_answered)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditScope {
    pub id: String,
    pub name: String,
    pub questions: Vec<AuditQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditArea {
    pub id: String,
    pub name: String,
    pub scopes: Vec<AuditScope>,
}

impl AuditArea {
    pub fn questions(&self) -> impl Iterator<Item = &AuditQuestion> {
        self.scopes.iter().flat_map(|scope| scope.questions.iter())
    }
}

/// A scheduled audit instantiated from a template, as read from the remote
/// audit store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Audit {
    pub id: String,
    pub project_name: String,
    pub template_name: String,
    pub audit_date: NaiveDate,
    pub status: AuditStatus,
    pub areas: Vec<AuditArea>,
}

impl Audit {
    pub fn questions(&self) -> impl Iterator<Item = &AuditQuestion> {
        self.areas.iter().flat_map(AuditArea::questions)
    }
}

/// Per-field response diff accumulated by the edit session. `None` means the
/// field was not touched in this batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseUpdate {
    pub question_id: String,
    pub score: Option<u32>,
    pub comment: Option<String>,
    pub recommendation: Option<String>,
}

impl ResponseUpdate {
    pub fn new(question_id: &str) -> Self {
        Self {
            question_id: question_id.to_string(),
            score: None,
            comment: None,
            recommendation: None,
        }
    }

    pub fn with_score(mut self, score: u32) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }

    pub fn with_recommendation(mut self, recommendation: &str) -> Self {
        self.recommendation = Some(recommendation.to_string());
        self
    }

    /// Fold a newer edit into this one; fields the newer edit carries win.
    pub fn merge(&mut self, newer: &ResponseUpdate) {
        if newer.score.is_some() {
            self.score = newer.score;
        }
        if newer.comment.is_some() {
            self.comment = newer.comment.clone();
        }
        if newer.recommendation.is_some() {
            self.recommendation = newer.recommendation.clone();
        }
    }

    /// Fill fields this update does not carry from an older one. Used to
    /// restore a failed batch without overwriting fresher edits.
    pub fn backfill(&mut self, older: &ResponseUpdate) {
        if self.score.is_none() {
            self.score = older.score;
        }
        if self.comment.is_none() {
            self.comment = older.comment.clone();
        }
        if self.recommendation.is_none() {
            self.recommendation = older.recommendation.clone();
        }
    }
}

//! Aggregation of per-question responses into area and overall percentages,
//! RAG banding, and findings extraction.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Audit, AuditQuestion, RagStatus};

/// Knobs for the aggregation. The defaults match the conventional 0-5 scale
/// with findings raised below score 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Ceiling assumed for questions that define no options.
    pub scale_max: u32,
    /// Scores strictly below this raise a finding.
    pub finding_threshold: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            scale_max: 5,
            finding_threshold: 4,
        }
    }
}

/// Stateless aggregator turning a responded audit tree into a report.
#[derive(Debug, Default, Clone)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaScore {
    pub area_id: String,
    pub area_name: String,
    pub score: u32,
    pub max_score: u32,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingItem {
    pub question: String,
    pub score: u32,
    pub comment: Option<String>,
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaFindings {
    pub area_id: String,
    pub area_name: String,
    pub items: Vec<FindingItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub id: String,
    pub project_name: String,
    pub audit_date: NaiveDate,
    pub overall_score: u32,
    pub rag_status: RagStatus,
    pub is_finalized: bool,
    pub finalized_at: Option<DateTime<Utc>>,
    pub finalized_by: Option<String>,
    pub area_scores: Vec<AreaScore>,
    pub findings: Vec<AreaFindings>,
    pub evidences: Vec<super::domain::Evidence>,
}

impl AuditReport {
    /// One-way transition. Repeated calls keep the first finalization stamp.
    pub fn finalize(&mut self, by: &str, at: DateTime<Utc>) {
        if self.is_finalized {
            return;
        }
        self.is_finalized = true;
        self.finalized_at = Some(at);
        self.finalized_by = Some(by.to_string());
    }
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Compute the full report projection for an audit.
    ///
    /// The overall percentage is computed over the combined question set, not
    /// by averaging area percentages, so areas with few questions do not
    /// distort the total.
    pub fn report(&self, audit: &Audit) -> AuditReport {
        let mut area_scores = Vec::with_capacity(audit.areas.len());
        let mut findings = Vec::new();
        let mut evidences = Vec::new();
        let mut total_score: u32 = 0;
        let mut total_max: u32 = 0;

        for area in &audit.areas {
            let mut score: u32 = 0;
            let mut max_score: u32 = 0;
            let mut items = Vec::new();

            for question in area.questions() {
                max_score += self.question_max(question);

                let answered_score = question
                    .response
                    .as_ref()
                    .filter(|response| response.is_answered)
                    .and_then(|response| response.score);
                if let Some(value) = answered_score {
                    score += value;
                }

                if let Some(response) = &question.response {
                    evidences.extend(response.evidences.iter().cloned());
                }

                if let Some(item) = self.finding_for(question, answered_score) {
                    items.push(item);
                }
            }

            total_score += score;
            total_max += max_score;
            area_scores.push(AreaScore {
                area_id: area.id.clone(),
                area_name: area.name.clone(),
                score,
                max_score,
                percentage: percentage(score, max_score),
            });

            // Areas with nothing to flag are omitted entirely.
            if !items.is_empty() {
                findings.push(AreaFindings {
                    area_id: area.id.clone(),
                    area_name: area.name.clone(),
                    items,
                });
            }
        }

        let overall_score = percentage(total_score, total_max);
        AuditReport {
            id: audit.id.clone(),
            project_name: audit.project_name.clone(),
            audit_date: audit.audit_date,
            overall_score,
            rag_status: RagStatus::from_percentage(overall_score),
            is_finalized: false,
            finalized_at: None,
            finalized_by: None,
            area_scores,
            findings,
            evidences,
        }
    }

    fn question_max(&self, question: &AuditQuestion) -> u32 {
        question
            .options
            .iter()
            .map(|option| option.value)
            .max()
            .unwrap_or(self.config.scale_max)
    }

    /// A finding is raised for a low score or an unanswered mandatory
    /// question (reported with score 0).
    fn finding_for(
        &self,
        question: &AuditQuestion,
        answered_score: Option<u32>,
    ) -> Option<FindingItem> {
        let qualifies = match answered_score {
            Some(score) => score < self.config.finding_threshold,
            None => question.is_mandatory,
        };
        if !qualifies {
            return None;
        }

        let response = question.response.as_ref();
        Some(FindingItem {
            question: question.text.clone(),
            score: answered_score.unwrap_or(0),
            comment: response.and_then(|r| r.comment.clone()),
            recommendation: response.and_then(|r| r.recommendation.clone()),
        })
    }
}

fn percentage(score: u32, max_score: u32) -> u32 {
    if max_score == 0 {
        return 0;
    }
    ((100.0 * f64::from(score)) / f64::from(max_score)).round() as u32
}

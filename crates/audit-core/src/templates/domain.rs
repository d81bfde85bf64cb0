use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::weights;

/// Length of a server-assigned identifier (UUID-style). Anything else is a draft token.
pub const PERSISTED_ID_LEN: usize = 36;

static DRAFT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Identity for every node in the template tree.
///
/// Draft tokens exist only client-side; the remote store never sees them. A
/// persisted identifier is opaque and fixed-format, assigned on first save.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeId {
    Draft(String),
    Persisted(String),
}

impl NodeId {
    /// Mint a fresh client-side draft token.
    pub fn draft() -> Self {
        let seq = DRAFT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        NodeId::Draft(format!("draft-{seq:06}"))
    }

    /// Classify a raw identifier arriving from the wire by its shape.
    pub fn from_wire(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if raw.len() == PERSISTED_ID_LEN {
            NodeId::Persisted(raw)
        } else {
            NodeId::Draft(raw)
        }
    }

    pub fn is_draft(&self) -> bool {
        matches!(self, NodeId::Draft(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            NodeId::Draft(token) => token,
            NodeId::Persisted(id) => id,
        }
    }

    /// The identifier to send on create/update payloads. Draft nodes are
    /// omitted so the server assigns a real row.
    pub fn wire_id(&self) -> Option<&str> {
        match self {
            NodeId::Draft(_) => None,
            NodeId::Persisted(id) => Some(id),
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root aggregate owning the full audit-area hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: NodeId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub areas: Vec<AuditArea>,
}

/// Audit area. `weightage` is derived: the sum of question percentages across
/// all of its scopes, recomputed after every question-affecting mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditArea {
    pub id: NodeId,
    pub template_id: NodeId,
    pub name: String,
    pub weightage: f64,
    pub scopes: Vec<Scope>,
}

/// Pure grouping level; carries no weight of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    pub id: NodeId,
    pub area_id: NodeId,
    pub name: String,
    pub questions: Vec<Question>,
}

/// Leaf of the template hierarchy. `percentage` is the author-entered share
/// of the template's total 100%.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: NodeId,
    pub scope_id: NodeId,
    pub text: String,
    pub percentage: f64,
    pub options: Vec<QuestionOption>,
}

/// Scored answer choice. Values need not be sequential or unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: NodeId,
    pub label: String,
    pub value: u32,
}

impl Template {
    /// A fresh client-only draft with no areas.
    pub fn draft(name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: NodeId::draft(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
            areas: Vec::new(),
        }
    }

    pub fn area(&self, area_id: &NodeId) -> Option<&AuditArea> {
        self.areas.iter().find(|area| &area.id == area_id)
    }

    /// Deep copy with entirely fresh draft identity at every level. All
    /// percentages, weightages, and option values are preserved verbatim;
    /// no identifier is shared with the source.
    pub fn clone_as_draft(&self, new_id: NodeId, name: &str) -> Template {
        let now = Utc::now();
        let areas = self
            .areas
            .iter()
            .map(|area| {
                let area_id = NodeId::draft();
                let scopes = area
                    .scopes
                    .iter()
                    .map(|scope| {
                        let scope_id = NodeId::draft();
                        let questions = scope
                            .questions
                            .iter()
                            .map(|question| Question {
                                id: NodeId::draft(),
                                scope_id: scope_id.clone(),
                                text: question.text.clone(),
                                percentage: question.percentage,
                                options: question
                                    .options
                                    .iter()
                                    .map(|option| QuestionOption {
                                        id: NodeId::draft(),
                                        label: option.label.clone(),
                                        value: option.value,
                                    })
                                    .collect(),
                            })
                            .collect();
                        Scope {
                            id: scope_id,
                            area_id: area_id.clone(),
                            name: scope.name.clone(),
                            questions,
                        }
                    })
                    .collect();
                AuditArea {
                    id: area_id,
                    template_id: new_id.clone(),
                    name: area.name.clone(),
                    weightage: area.weightage,
                    scopes,
                }
            })
            .collect();

        Template {
            id: new_id,
            name: name.to_string(),
            created_at: now,
            updated_at: now,
            areas,
        }
    }
}

impl AuditArea {
    pub fn new(template_id: NodeId, name: &str) -> Self {
        Self {
            id: NodeId::draft(),
            template_id,
            name: name.to_string(),
            weightage: 0.0,
            scopes: Vec::new(),
        }
    }

    pub(crate) fn rederive_weightage(&mut self) {
        self.weightage = weights::area_weightage(&self.scopes);
    }
}

impl Scope {
    pub fn new(area_id: NodeId, name: &str) -> Self {
        Self {
            id: NodeId::draft(),
            area_id,
            name: name.to_string(),
            questions: Vec::new(),
        }
    }
}

impl Question {
    /// New questions come pre-populated with the six-level default option set
    /// so they are immediately scoreable.
    pub fn new(scope_id: NodeId, text: &str, percentage: f64) -> Self {
        Self {
            id: NodeId::draft(),
            scope_id,
            text: text.to_string(),
            percentage,
            options: QuestionOption::default_levels(),
        }
    }
}

impl QuestionOption {
    pub fn new(label: &str, value: u32) -> Self {
        Self {
            id: NodeId::draft(),
            label: label.to_string(),
            value,
        }
    }

    /// "Level 0" through "Level 5", valued 0-5.
    pub fn default_levels() -> Vec<QuestionOption> {
        (0..=5)
            .map(|value| QuestionOption::new(&format!("Level {value}"), value))
            .collect()
    }
}

/// Per-field update for a question; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionUpdate {
    pub text: Option<String>,
    pub percentage: Option<f64>,
}

/// Per-field update for a question option.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionUpdate {
    pub label: Option<String>,
    pub value: Option<u32>,
}

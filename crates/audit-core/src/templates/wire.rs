//! Wire-shape translation for the remote template store.
//!
//! The remote speaks snake_case with bare string identifiers. Incoming trees
//! are classified into tagged `NodeId`s; outgoing create/update payloads omit
//! the ID field for every draft node so the server assigns real rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{AuditArea, NodeId, Question, QuestionOption, Scope, Template};
use super::weights;

/// Template as the remote store returns it. Summary responses simply leave
/// `scopes` empty below each area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateWire {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub areas: Vec<AreaWire>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaWire {
    pub id: String,
    pub template_id: String,
    pub name: String,
    pub weightage: f64,
    #[serde(default)]
    pub scopes: Vec<ScopeWire>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeWire {
    pub id: String,
    pub area_id: String,
    pub name: String,
    #[serde(default)]
    pub questions: Vec<QuestionWire>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionWire {
    pub id: String,
    pub scope_id: String,
    pub text: String,
    pub percentage: f64,
    #[serde(default = "default_mandatory")]
    pub is_mandatory: bool,
    #[serde(default)]
    pub options: Vec<OptionWire>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionWire {
    pub id: String,
    pub label: String,
    pub value: u32,
}

fn default_mandatory() -> bool {
    true
}

impl TemplateWire {
    pub fn into_domain(self) -> Template {
        let template_id = NodeId::from_wire(self.id);
        let areas = self
            .areas
            .into_iter()
            .map(|area| {
                let area_id = NodeId::from_wire(area.id);
                let scopes: Vec<Scope> = area
                    .scopes
                    .into_iter()
                    .map(|scope| {
                        let scope_id = NodeId::from_wire(scope.id);
                        let questions = scope
                            .questions
                            .into_iter()
                            .map(|question| Question {
                                id: NodeId::from_wire(question.id),
                                scope_id: scope_id.clone(),
                                text: question.text,
                                percentage: question.percentage,
                                options: question
                                    .options
                                    .into_iter()
                                    .map(|option| QuestionOption {
                                        id: NodeId::from_wire(option.id),
                                        label: option.label,
                                        value: option.value,
                                    })
                                    .collect(),
                            })
                            .collect();
                        Scope {
                            id: scope_id,
                            area_id: area_id.clone(),
                            name: scope.name,
                            questions,
                        }
                    })
                    .collect();
                // Full trees carry the question percentages, so the area
                // weight is re-derived from them rather than trusted from the
                // wire. Summary responses (empty scopes) keep the stored
                // value.
                let weightage = if scopes.is_empty() {
                    area.weightage
                } else {
                    weights::area_weightage(&scopes)
                };
                AuditArea {
                    id: area_id,
                    template_id: template_id.clone(),
                    name: area.name,
                    weightage,
                    scopes,
                }
            })
            .collect();

        Template {
            id: template_id,
            name: self.name,
            created_at: self.created_at,
            updated_at: self.updated_at,
            areas,
        }
    }
}

/// Outgoing full-tree payload for create/update/clone requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplatePayload {
    pub name: String,
    pub areas: Vec<AreaPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub weightage: f64,
    pub scopes: Vec<ScopePayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub questions: Vec<QuestionPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text: String,
    pub percentage: f64,
    pub is_mandatory: bool,
    pub options: Vec<OptionPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub label: String,
    pub value: u32,
}

impl TemplatePayload {
    /// Payload for a remote create (or server-side clone seed): the server
    /// assigns every identifier, so none are sent.
    pub fn for_create(template: &Template) -> Self {
        Self::build(template, |_| None)
    }

    /// Payload for a remote update: persisted nodes keep their IDs, nodes
    /// added since the last save go up without one and come back persisted.
    pub fn for_update(template: &Template) -> Self {
        Self::build(template, |id| id.wire_id().map(str::to_string))
    }

    fn build(template: &Template, id_of: impl Fn(&NodeId) -> Option<String>) -> Self {
        TemplatePayload {
            name: template.name.clone(),
            areas: template
                .areas
                .iter()
                .map(|area| AreaPayload {
                    id: id_of(&area.id),
                    name: area.name.clone(),
                    weightage: area.weightage,
                    scopes: area
                        .scopes
                        .iter()
                        .map(|scope| ScopePayload {
                            id: id_of(&scope.id),
                            name: scope.name.clone(),
                            questions: scope
                                .questions
                                .iter()
                                .map(|question| QuestionPayload {
                                    id: id_of(&question.id),
                                    text: question.text.clone(),
                                    percentage: question.percentage,
                                    is_mandatory: true,
                                    options: question
                                        .options
                                        .iter()
                                        .map(|option| OptionPayload {
                                            id: id_of(&option.id),
                                            label: option.label.clone(),
                                            value: option.value,
                                        })
                                        .collect(),
                                })
                                .collect(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

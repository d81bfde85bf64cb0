use crate::infra::{InMemoryAuditBackend, InMemoryTemplateBackend};
use audit_core::audits::{
    Audit, AuditArea, AuditQuestion, AuditScope, AuditStatus, EvidenceStore, RemoteAuditStore,
    ResponseEditSession, ResponseUpdate, ScoreOption, ScoringEngine,
};
use audit_core::config::AutosaveConfig;
use audit_core::error::AppError;
use audit_core::templates::wire::TemplateWire;
use audit_core::templates::{
    count_template_questions, save_blockers, template_total, validate_for_save, Template,
    TemplateService, TemplateStore,
};
use chrono::{Local, NaiveDate, Utc};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Project name stamped on the demo audit
    #[arg(long, default_value = "Apollo")]
    pub(crate) project_name: String,
    /// Audit date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) audit_date: Option<NaiveDate>,
    /// Stop after the template authoring portion of the demo
    #[arg(long)]
    pub(crate) skip_audit: bool,
}

#[derive(Args, Debug)]
pub(crate) struct TemplateCheckArgs {
    /// Path to a template JSON export
    #[arg(long)]
    pub(crate) file: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct AuditReportArgs {
    /// Path to a responded audit JSON export
    #[arg(long)]
    pub(crate) file: PathBuf,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn run_template_check(args: TemplateCheckArgs) -> Result<(), AppError> {
    let raw = std::fs::read_to_string(&args.file)?;
    let wire: TemplateWire = serde_json::from_str(&raw)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
    let template = wire.into_domain();

    let total = template_total(&template.areas);
    println!("Template: {}", template.name);
    println!("Questions: {}", count_template_questions(&template));
    println!(
        "Total weightage: {}% ({})",
        total.total,
        if total.is_valid { "balanced" } else { "unbalanced" }
    );

    let blockers = save_blockers(&template);
    if blockers.is_empty() {
        println!("Save blockers: none");
    } else {
        println!("Save blockers:");
        for blocker in blockers {
            println!("  - {blocker}");
        }
    }

    Ok(())
}

pub(crate) fn run_audit_report(args: AuditReportArgs) -> Result<(), AppError> {
    let raw = std::fs::read_to_string(&args.file)?;
    let audit: Audit = serde_json::from_str(&raw)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;

    let report = ScoringEngine::default().report(&audit);
    render_report(&report);
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        project_name,
        audit_date,
        skip_audit,
    } = args;
    let audit_date = audit_date.unwrap_or_else(|| Local::now().date_naive());

    println!("=== Template authoring ===");
    let backend = Arc::new(InMemoryTemplateBackend::default());
    let service = TemplateService::new(Arc::clone(&backend));
    let mut store = TemplateStore::new();

    let draft_id = build_demo_template(&mut store);
    {
        let template = store
            .template(&draft_id)
            .ok_or(audit_core::RemoteError::NotFound)?;
        let total = template_total(&template.areas);
        println!("Draft '{}' authored locally as {}", template.name, draft_id);
        for area in &template.areas {
            println!("  {} weighs {}%", area.name, area.weightage);
        }
        println!(
            "Total weightage {}% ({})",
            total.total,
            if total.is_valid { "balanced" } else { "unbalanced" }
        );
        validate_for_save(template)?;
    }

    let snapshot = store
        .template(&draft_id)
        .ok_or(audit_core::RemoteError::NotFound)?
        .clone();
    service.save(&mut store, snapshot, draft_id).await;
    if let Some(message) = &store.error {
        println!("Save failed: {message}");
        return Ok(());
    }
    let saved = store.templates()[0].clone();
    println!("Saved to the remote store as {}", saved.id);

    if let Some(clone_id) = service
        .clone_on_server(&mut store, &saved.id, &format!("{} (Clone)", saved.name))
        .await
    {
        println!("Server-side clone created as {clone_id}");
    }

    if skip_audit {
        return Ok(());
    }

    println!();
    println!("=== Conducting the audit ===");
    let audit = audit_from_template(&saved, &project_name, audit_date);
    let audit_id = audit.id.clone();
    let audits = Arc::new(InMemoryAuditBackend::default());
    audits.seed(audit);

    let session = ResponseEditSession::new(
        &audit_id,
        Arc::clone(&audits),
        AutosaveConfig {
            debounce_ms: 50,
            saved_display_ms: 100,
        },
    );

    let fresh = audits.get_audit(&audit_id).await?;
    let scores = [5, 4, 2, 3];
    for (question, score) in fresh.questions().zip(scores) {
        let mut update = ResponseUpdate::new(&question.id).with_score(score);
        if score < 4 {
            update = update.with_recommendation("schedule a remediation workshop");
        }
        session.edit(update);
    }
    session.flush().await;
    println!(
        "Autosave status: {} ({} responses pending)",
        session.status().label(),
        if session.has_pending() { "some" } else { "no" }
    );
    let answered = audits.get_audit(&audit_id).await?;
    if let Some(first) = answered.questions().next() {
        let evidence = audits
            .upload("pipeline-dashboard.png", b"screenshot bytes".to_vec())
            .await?;
        println!("Evidence uploaded to {}", evidence.file_url);
        audits.attach_evidence(&audit_id, &first.id, evidence);
    }
    let progress = session.progress(&answered);
    println!(
        "Progress: {}/{} answered ({}%)",
        progress.answered,
        progress.total,
        progress.percentage()
    );

    println!();
    println!("=== Scoring ===");
    let mut report = audits.get_report(&audit_id).await?;
    render_report(&report);

    audits.finalize(&audit_id).await?;
    report.finalize("practice.lead@example.com", Utc::now());
    println!(
        "Finalized by {} (further response edits are rejected)",
        report.finalized_by.as_deref().unwrap_or("unknown")
    );

    Ok(())
}

fn render_report(report: &audit_core::audits::AuditReport) {
    println!(
        "{} scored {}% overall ({})",
        report.project_name,
        report.overall_score,
        report.rag_status.label()
    );
    for area in &report.area_scores {
        println!(
            "  {}: {}/{} ({}%)",
            area.area_name, area.score, area.max_score, area.percentage
        );
    }
    if report.findings.is_empty() {
        println!("Findings: none");
    } else {
        println!("Findings:");
        for group in &report.findings {
            println!("  {}:", group.area_name);
            for item in &group.items {
                println!("    [{}] {}", item.score, item.question);
                if let Some(recommendation) = &item.recommendation {
                    println!("        -> {recommendation}");
                }
            }
        }
    }
    for evidence in &report.evidences {
        println!("Evidence: {} ({})", evidence.file_name, evidence.file_url);
    }
}

/// Two-area draft: Engineering 60%, Operations 40%.
fn build_demo_template(store: &mut TemplateStore) -> audit_core::templates::NodeId {
    let template_id = store.init_draft("Delivery Excellence");

    let engineering = store
        .add_area(&template_id, "Engineering")
        .expect("fresh draft accepts areas");
    let practices = store
        .add_scope(&template_id, &engineering, "Practices")
        .expect("area accepts scopes");
    store.add_question(&template_id, &engineering, &practices, "CI pipeline in place?", 30.0);
    store.add_question(&template_id, &engineering, &practices, "Code reviews enforced?", 30.0);

    let operations = store
        .add_area(&template_id, "Operations")
        .expect("fresh draft accepts areas");
    let runbooks = store
        .add_scope(&template_id, &operations, "Runbooks")
        .expect("area accepts scopes");
    store.add_question(&template_id, &operations, &runbooks, "On-call documented?", 20.0);
    store.add_question(&template_id, &operations, &runbooks, "Incident reviews held?", 20.0);

    template_id
}

fn audit_from_template(template: &Template, project_name: &str, audit_date: NaiveDate) -> Audit {
    let areas = template
        .areas
        .iter()
        .map(|area| AuditArea {
            id: area.id.to_string(),
            name: area.name.clone(),
            scopes: area
                .scopes
                .iter()
                .map(|scope| AuditScope {
                    id: scope.id.to_string(),
                    name: scope.name.clone(),
                    questions: scope
                        .questions
                        .iter()
                        .map(|question| AuditQuestion {
                            id: question.id.to_string(),
                            text: question.text.clone(),
                            is_mandatory: true,
                            options: question
                                .options
                                .iter()
                                .map(|option| ScoreOption {
                                    value: option.value,
                                    label: option.label.clone(),
                                })
                                .collect(),
                            response: None,
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();

    Audit {
        id: format!("audit-{}", template.id),
        project_name: project_name.to_string(),
        template_name: template.name.clone(),
        audit_date,
        status: AuditStatus::InProgress,
        areas,
    }
}

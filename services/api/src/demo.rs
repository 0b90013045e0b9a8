use crate::infra::{seed_demo, InMemoryPracticumStore, LoggingNotifier, DEMO_OPENING};
use crate::routes::{evaluate_ledger, evaluator_from_env};
use chrono::{Local, NaiveDate};
use clap::Args;
use pps_engine::config::{resolve_thresholds, EnvThresholds};
use pps_engine::error::AppError;
use pps_engine::workflows::practicum::{
    CloseReport, EligibilityReport, LedgerOutcome, NotificationOutcome, OpeningId,
    PracticeRecord, RankingView, SelectionService, SpecialtyArea, StudentId,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Evaluation date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Rank and select without closing the opening.
    #[arg(long)]
    pub(crate) skip_close: bool,
}

#[derive(Args, Debug)]
pub(crate) struct EligibilityArgs {
    /// JSON file holding an array of practice records
    #[arg(long)]
    pub(crate) ledger: PathBuf,
    /// Chosen specialty area, e.g. "Clínica"
    #[arg(long)]
    pub(crate) specialty: Option<String>,
    /// Evaluation date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Print the full criteria as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_ledger_evaluation(args: EligibilityArgs) -> Result<(), AppError> {
    let EligibilityArgs {
        ledger,
        specialty,
        today,
        json,
    } = args;

    let raw = std::fs::read_to_string(&ledger)?;
    let mut practices: Vec<PracticeRecord> = serde_json::from_str(&raw)?;
    let specialty = specialty.as_deref().and_then(SpecialtyArea::parse);
    let today = today.unwrap_or_else(|| Local::now().date_naive());

    let evaluator = evaluator_from_env()?;
    let result = evaluate_ledger(&evaluator, &mut practices, specialty.as_ref(), today);

    println!("Ledger {} evaluated on {}", ledger.display(), today);
    if !result.finished_overdue.is_empty() {
        println!(
            "- {} overdue practice(s) counted as finished",
            result.finished_overdue.len()
        );
    }
    println!("- {}", result.summary);

    if json {
        println!("{}", serde_json::to_string_pretty(&result.criteria)?);
    }
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { today, skip_close } = args;
    let today = today.unwrap_or_else(|| Local::now().date_naive());

    let store = InMemoryPracticumStore::default();
    seed_demo(&store);
    let notifier = Arc::new(LoggingNotifier::default());
    let academic = resolve_thresholds(&EnvThresholds);
    let service = SelectionService::new(Arc::new(store), notifier.clone(), academic);

    println!("Practicum selection demo (evaluated {today})");

    println!("\nAccreditation status");
    for student in ["st-ana", "st-bruno", "st-carla"] {
        let report = service.eligibility(&StudentId(student.to_string()), today)?;
        render_eligibility(&report);
    }

    let opening_id = OpeningId(DEMO_OPENING.to_string());
    let ranking = service.rank_opening(&opening_id)?;
    render_ranking(&ranking);

    println!("\nSelecting candidates within capacity");
    for candidate in ranking.candidates.iter().filter(|c| c.within_capacity) {
        let change = service.set_selection(&candidate.enrollment_id, true)?;
        println!(
            "- {} -> {} ({:?})",
            candidate.student_name,
            change.status.label(),
            change.ledger
        );
    }

    if skip_close {
        return Ok(());
    }

    let report = service.close_opening(&opening_id).await?;
    render_close_report(&report);

    let notices = notifier.sent();
    if notices.is_empty() {
        println!("  Notices: none dispatched");
    } else {
        println!("  Notices:");
        for notice in notices {
            println!(
                "    - {} <{}>: {} | schedule {}",
                notice.student_name, notice.student_email, notice.opening_name, notice.schedule
            );
        }
    }

    let after = service.rank_opening(&opening_id)?;
    println!("\nFinal statuses");
    for candidate in &after.candidates {
        println!("- {}: {}", candidate.student_name, candidate.status.label());
    }

    Ok(())
}

fn render_eligibility(report: &EligibilityReport) {
    let criteria = &report.criteria;
    println!(
        "- {}: {} h total ({} remaining), {} h in specialty, {} area(s)",
        report.student_name,
        criteria.total_hours,
        criteria.remaining_total_hours,
        criteria.specialty_hours,
        criteria.unique_areas_count
    );
    println!("  {}", criteria.summary());
}

fn render_ranking(view: &RankingView) {
    println!(
        "\nRanking for {} ({}, capacity {})",
        view.opening_name,
        view.opening_status.label(),
        view.capacity
    );
    for candidate in &view.candidates {
        let marker = if candidate.within_capacity { "*" } else { " " };
        println!(
            "{marker} #{} {} | score {} | {} h | {} penalty points",
            candidate.rank,
            candidate.student_name,
            candidate.score,
            candidate.total_hours,
            candidate.penalty_points
        );
        for component in &candidate.breakdown.components {
            println!(
                "      {:?}: {:+.1} ({})",
                component.factor, component.points, component.notes
            );
        }
    }
    if !view.excluded_enrollments.is_empty() {
        println!("  Excluded enrollments: {:?}", view.excluded_enrollments);
    }
}

fn render_close_report(report: &CloseReport) {
    println!("\nClosing opening {}", report.opening_id);
    if report.already_closed {
        println!("- already closed, nothing to do");
        return;
    }
    for outcome in &report.outcomes {
        let ledger = match &outcome.ledger {
            LedgerOutcome::Synced { sync } => format!("ledger {sync:?}"),
            LedgerOutcome::Failed { error } => format!("ledger FAILED: {error}"),
        };
        let notification = match &outcome.notification {
            NotificationOutcome::Sent => "notified".to_string(),
            NotificationOutcome::Skipped { reason } => format!("not notified: {reason}"),
            NotificationOutcome::Failed { error } => format!("notification FAILED: {error}"),
        };
        println!("- {}: {ledger}; {notification}", outcome.enrollment_id);
    }
    println!(
        "  {} selected, {} notified, {} need follow-up",
        report.outcomes.len(),
        report.notified_count(),
        report.failures().len()
    );
}

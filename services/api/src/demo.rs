use crate::infra::LoggingNotificationQueue;
use chrono::Local;
use clap::Args;
use nomination_desk::config::NominationConfig;
use nomination_desk::error::AppError;
use nomination_desk::workflows::memory::InMemoryStore;
use nomination_desk::workflows::moderation::{
    AcceptanceIntent, AppointmentStatus, Decision, DecisionOutcome, ModerationError,
    ModerationService, ModeratorId, SecondaryApproval, WaiverIntent, WaiverIntentKind,
};
use nomination_desk::workflows::nomination::{
    NominationOrder, NominationService, OrderEngine, ReservationPattern,
};
use nomination_desk::workflows::roster::{Candidate, Pool, RosterImporter};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct OrderReportArgs {
    /// Roster CSV with id, name, pool and rank columns
    #[arg(long)]
    pub(crate) roster: PathBuf,
    /// Reservation pattern JSON (defaults to the federal quota pattern)
    #[arg(long)]
    pub(crate) pattern: Option<PathBuf>,
    /// Only print the first N positions
    #[arg(long)]
    pub(crate) limit: Option<usize>,
    /// Emit the order as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Optional roster CSV; a built-in sample roster is used otherwise.
    #[arg(long)]
    pub(crate) roster: Option<PathBuf>,
    /// Skip the moderation portion of the demo.
    #[arg(long)]
    pub(crate) skip_moderation: bool,
}

pub(crate) fn run_order_report(args: OrderReportArgs) -> Result<(), AppError> {
    let OrderReportArgs {
        roster,
        pattern,
        limit,
        json,
    } = args;

    let pattern = load_pattern(pattern)?;
    let snapshot = RosterImporter::snapshot_from_reader(std::fs::File::open(&roster)?)?;
    let order = OrderEngine::new(pattern).compute_order(&snapshot);

    if json {
        match serde_json::to_string_pretty(&order) {
            Ok(payload) => println!("{payload}"),
            Err(err) => println!("Order payload unavailable: {err}"),
        }
        return Ok(());
    }

    println!("Nomination order for {}", roster.display());
    render_order(&order, limit.unwrap_or(order.len()));
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        roster,
        skip_moderation,
    } = args;

    let candidates = match roster {
        Some(path) => RosterImporter::from_path(path)?,
        None => sample_roster(),
    };
    let store = Arc::new(InMemoryStore::with_candidates(candidates)?);

    println!("Nomination desk demo ({})", Local::now().date_naive());
    let nomination = NominationService::new(store.clone(), OrderEngine::default());
    let order = nomination.recompute()?;
    render_order(&order, 12);

    let batch = nomination.nominate_next(3)?;
    println!("\nFirst nomination batch");
    for entry in &batch {
        println!("  #{:<3} {} ({})", entry.position, entry.name, entry.pool);
    }

    if skip_moderation {
        return Ok(());
    }

    let Some(first) = order.get(1).map(|entry| entry.candidate_id.clone()) else {
        println!("\nModeration demo skipped: roster is empty");
        return Ok(());
    };
    let second = order
        .get(2)
        .map(|entry| entry.candidate_id.clone())
        .unwrap_or_else(|| first.clone());

    let notifications = Arc::new(LoggingNotificationQueue::default());
    let moderation = ModerationService::new(store, notifications.clone());
    let moderator = ModeratorId("demo-moderator".to_string());

    println!("\nModeration demo");
    run_moderation_step("Secondary approval, already appointed", || {
        let record = moderation.submit_secondary_approval(
            &first,
            SecondaryApproval {
                agency: "Tribunal Regional do Trabalho".to_string(),
                role: "Técnico Judiciário".to_string(),
                pool: Some("AMPLA".to_string()),
                rank: Some(4),
                intends_to_accept: AcceptanceIntent::Yes,
                already_appointed: AppointmentStatus::Yes,
                note: None,
            },
        )?;
        moderation.decide(&record.id, Decision::Approve, &moderator, true)
    });
    run_moderation_step("Waiver intent, rejected by the committee", || {
        let record = moderation.submit_waiver_intent(
            &second,
            WaiverIntent {
                kind: WaiverIntentKind::Interested,
                note: Some("Still deciding between offers".to_string()),
            },
        )?;
        moderation.decide(&record.id, Decision::Reject, &moderator, true)
    });

    let events = notifications.events();
    if events.is_empty() {
        println!("  Notifications: none enqueued");
    } else {
        println!("  Notifications:");
        for event in events {
            println!("    - {}: {}", event.title, event.body);
        }
    }

    Ok(())
}

fn run_moderation_step<F>(label: &str, step: F)
where
    F: FnOnce() -> Result<DecisionOutcome, ModerationError>,
{
    match step() {
        Ok(outcome) => println!(
            "  {label}: {} -> candidate {} waiver {} ({:?})",
            outcome.record.status,
            outcome.candidate.id,
            outcome.candidate.waiver_status,
            outcome.waiver_change
        ),
        Err(err) => println!("  {label}: failed ({err})"),
    }
}

fn load_pattern(path: Option<PathBuf>) -> Result<ReservationPattern, AppError> {
    let config = NominationConfig {
        pattern_path: path,
        roster_path: None,
    };
    Ok(config.reservation_pattern()?)
}

fn render_order(order: &NominationOrder, limit: usize) {
    if order.is_empty() {
        println!("  (no candidates)");
        return;
    }

    println!("  {:<4} {:<14} {:<28} {:<14} {}", "pos", "reserved", "candidate", "pool", "rank");
    for entry in order.entries().iter().take(limit) {
        let marker = if entry.is_fallback() { " *" } else { "" };
        println!(
            "  {:<4} {:<14} {:<28} {:<14} {}{}",
            entry.position,
            entry.reserved_for.label(),
            entry.name,
            entry.pool.label(),
            entry.pool_rank,
            marker
        );
    }
    if order.len() > limit {
        println!("  ... {} more", order.len() - limit);
    }
    println!("  (* position filled through fallback)");
}

fn sample_roster() -> Vec<Candidate> {
    let open = [
        "Ana Beatriz Lopes",
        "Bruno Carvalho",
        "Camila Freitas",
        "Diego Moura",
        "Elisa Fontes",
        "Fábio Rezende",
        "Gabriela Sá",
        "Henrique Prates",
    ];
    let race_reserved = ["Igor Santana", "Jéssica Amaral"];
    let disability = ["Kátia Brandão"];
    let indigenous = ["Luan Potiguara"];

    let mut roster = Vec::new();
    for (pool, names, prefix) in [
        (Pool::Open, &open[..], "ac"),
        (Pool::RaceReserved, &race_reserved[..], "ppp"),
        (Pool::Disability, &disability[..], "pcd"),
        (Pool::Indigenous, &indigenous[..], "ind"),
    ] {
        for (rank, name) in (1u32..).zip(names) {
            roster.push(Candidate::new(format!("{prefix}-{rank:03}"), *name, pool, rank));
        }
    }
    roster
}

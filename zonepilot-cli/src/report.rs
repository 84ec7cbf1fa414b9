use colored::*;
use zonepilot::replay::ReplayReport;
use zonepilot::{EventOutcome, TimeZoneOption};

fn outcome_label(outcome: &EventOutcome) -> ColoredString {
    match outcome {
        EventOutcome::Completed => "completed".green().bold(),
        EventOutcome::Advanced { from, to } => format!("{from} -> {to}").green(),
        EventOutcome::Waiting { stage } => format!("waiting in {stage}").normal(),
        EventOutcome::Scheduled { stage, delay_ms } => {
            format!("re-check in {delay_ms}ms ({stage})").cyan()
        }
        EventOutcome::Abandoned => "abandoned".yellow(),
        EventOutcome::Expired => "expired".red().bold(),
        EventOutcome::NoTree => "no tree".dimmed(),
        EventOutcome::Idle => "idle".dimmed(),
        EventOutcome::Stale => "stale".dimmed(),
    }
}

/// Display a replay in a user-friendly format
pub fn display_replay(report: &ReplayReport) {
    println!();
    println!("{}", "═".repeat(60));
    if report.completed() {
        println!("{} {}", "COMPLETED:".green().bold(), report.zone_id);
    } else if let Some(stage) = report.pending_stage {
        println!("{} {} (stuck in {stage})", "PENDING:".yellow().bold(), report.zone_id);
    } else {
        println!("{} {}", "FAILED:".red().bold(), report.zone_id);
    }
    println!("{}", "─".repeat(60));

    match &report.entry_point {
        Some(entry) => println!("Opened: {entry}"),
        None => println!("Opened: {}", "nothing launched".red()),
    }

    if !report.steps.is_empty() {
        println!("{}", "─".repeat(60));
        println!("Events:");
        for step in &report.steps {
            println!(
                "   {:>6}ms  {:<32} {}",
                step.at_ms,
                step.package,
                outcome_label(&step.outcome)
            );
        }
    }

    if !report.actions.is_empty() {
        println!("{}", "─".repeat(60));
        println!("Actions:");
        for action in &report.actions {
            println!("   • {:?} on '{}'", action.action, action.target);
        }
    }

    if !report.notifications.is_empty() {
        println!("{}", "─".repeat(60));
        println!("Notifications:");
        for notification in &report.notifications {
            println!("   • [{}] {}", notification.key().dimmed(), notification);
        }
    }
    println!("{}", "═".repeat(60));
}

pub fn display_zones(options: &[TimeZoneOption]) {
    for option in options {
        println!(
            "{}  {:<24} {:<20} {}",
            format!("UTC{}", option.offset_label()).bold(),
            option.zone_id,
            option.city_name,
            option.search_query.dimmed()
        );
    }
}

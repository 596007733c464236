use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, Weekday};
use tracing::info;

use dayplan_domain::PlanService;
use dayplan_store::FileVault;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub root: PathBuf,
    /// Override for "today", mainly for scripting and tests.
    pub today: Option<NaiveDate>,
    pub first_weekday: Weekday,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(root) = std::env::var("DAYPLAN_ROOT") {
            let trimmed = root.trim();
            if !trimmed.is_empty() {
                config.root = PathBuf::from(trimmed);
            }
        }
        if let Ok(today) = std::env::var("DAYPLAN_TODAY") {
            config.today = Some(
                NaiveDate::parse_from_str(today.trim(), "%Y-%m-%d")
                    .context("DAYPLAN_TODAY must be YYYY-MM-DD")?,
            );
        }
        if let Ok(weekday) = std::env::var("DAYPLAN_FIRST_WEEKDAY") {
            config.first_weekday = weekday
                .trim()
                .parse::<Weekday>()
                .ok()
                .context("DAYPLAN_FIRST_WEEKDAY must name a weekday")?;
        }
        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            today: None,
            first_weekday: Weekday::Mon,
        }
    }
}

fn default_root() -> PathBuf {
    if let Ok(base) = std::env::var("XDG_DATA_HOME") {
        let trimmed = base.trim();
        if !trimmed.is_empty() {
            return Path::new(trimmed).join("dayplan");
        }
    }
    if let Ok(home) = std::env::var("HOME") {
        return Path::new(&home).join(".local").join("share").join("dayplan");
    }
    PathBuf::from("dayplan-data")
}

/// Single-shot run: make sure today's plan windows exist, roll open
/// occurrences forward, print where the day stands.
pub fn run(config: AppConfig) -> Result<()> {
    let today = config.today.unwrap_or_else(|| Local::now().date_naive());
    info!(root = %config.root.display(), %today, "starting dayplan");

    // The catalog vault also watches the root so external edits made
    // while we run show up in the logs.
    let catalog = FileVault::open(&config.root)?;
    catalog.watch()?;

    let service = PlanService::builder()
        .with_catalog(Box::new(catalog))
        .with_day_store(Box::new(FileVault::open(&config.root)?))
        .with_plan_store(Box::new(FileVault::open(&config.root)?))
        .with_first_weekday(config.first_weekday)
        .build()?;

    let created = service.compose_plans(today)?;
    for plan in &created {
        println!(
            "created {} plan: {} .. {}",
            plan.kind.as_str(),
            plan.range.start,
            plan.range.end
        );
    }

    let moves = service.advance_overdue(today)?;
    if !moves.is_empty() {
        println!("moved {} open occurrence(s) to {}", moves.len(), today);
    }

    let summary = service.day_summary(today)?;
    println!(
        "{}: {} min planned, {} min remaining, {:.0}% done",
        today,
        summary.total_min,
        summary.remaining_min,
        summary.completion * 100.0
    );
    for (tag, minutes) in &summary.tag_minutes {
        println!("  {tag}: {minutes} min");
    }
    Ok(())
}

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use tracing::debug;
use walkdir::WalkDir;

use dayplan_domain::activity::Activity;
use dayplan_domain::day::Day;
use dayplan_domain::error::DomainError;
use dayplan_domain::period::DateRange;
use dayplan_domain::plan::{PeriodKind, Plan};
use dayplan_domain::store::{ActivityCatalog, DayFilter, DayStore, PlanStore};

const CATALOG_FILE: &str = "activities.json";
const DAYS_DIR: &str = "days";
const PLANS_DIR: &str = "plans";

/// JSON vault rooted at a directory: `activities.json` for the catalog,
/// one file per day under `days/`, one per plan under `plans/`. Writes go
/// through a temp file and a rename so readers never observe a torn file.
pub struct FileVault {
    root: PathBuf,
    watcher: Mutex<Option<RecommendedWatcher>>,
}

impl FileVault {
    pub fn open(root: impl AsRef<Path>) -> Result<Self, DomainError> {
        let root = root.as_ref().to_path_buf();
        for dir in [root.clone(), root.join(DAYS_DIR), root.join(PLANS_DIR)] {
            fs::create_dir_all(&dir).map_err(store_error)?;
        }
        Ok(Self {
            root,
            watcher: Mutex::new(None),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Log external changes to the vault directory. The vault itself is
    /// stateless between calls, so watching is purely diagnostic.
    pub fn watch(&self) -> Result<(), DomainError> {
        let mut slot = self.watcher.lock();
        if slot.is_some() {
            return Ok(());
        }
        let mut watcher = notify::recommended_watcher(|res: notify::Result<notify::Event>| {
            if let Ok(event) = res {
                debug!(?event, "vault change detected");
            }
        })
        .map_err(store_error)?;
        watcher
            .watch(&self.root, RecursiveMode::Recursive)
            .map_err(store_error)?;
        *slot = Some(watcher);
        Ok(())
    }

    fn day_path(&self, date: NaiveDate) -> PathBuf {
        self.root
            .join(DAYS_DIR)
            .join(format!("{}.json", date.format("%Y-%m-%d")))
    }

    fn plan_path(&self, plan: &Plan) -> PathBuf {
        self.root.join(PLANS_DIR).join(format!("{}.json", plan.id))
    }

    fn write_json<T: serde::Serialize>(&self, path: &Path, value: &T) -> Result<(), DomainError> {
        let parent = path
            .parent()
            .ok_or_else(|| DomainError::StoreUnavailable("path has no parent".to_string()))?;
        let tmp = parent.join(format!(
            ".{}.tmp.{}",
            path.file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("vault"),
            std::process::id()
        ));
        let payload = serde_json::to_string_pretty(value).map_err(store_error)?;
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp)
                .map_err(store_error)?;
            file.write_all(payload.as_bytes()).map_err(store_error)?;
            file.write_all(b"\n").map_err(store_error)?;
            file.flush().map_err(store_error)?;
        }
        fs::rename(&tmp, path).map_err(|err| {
            let _ = fs::remove_file(&tmp);
            store_error(err)
        })
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, path: &Path) -> Result<T, DomainError> {
        let raw = fs::read_to_string(path).map_err(store_error)?;
        serde_json::from_str(&raw).map_err(store_error)
    }

    /// Replace the activity catalog. Used by hosts that manage the
    /// catalog through this vault rather than an external editor.
    pub fn save_activities(&self, activities: &[Activity]) -> Result<(), DomainError> {
        self.write_json(&self.root.join(CATALOG_FILE), &activities)
    }

    fn scan_json_files(&self, dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case("json"))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();
        files
    }
}

fn store_error(err: impl std::fmt::Display) -> DomainError {
    DomainError::StoreUnavailable(err.to_string())
}

impl ActivityCatalog for FileVault {
    fn load_activities(&self) -> Result<Vec<Activity>, DomainError> {
        let path = self.root.join(CATALOG_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&path)
            .map_err(|err| DomainError::CatalogUnavailable(err.to_string()))?;
        serde_json::from_str(&raw).map_err(|err| DomainError::CatalogUnavailable(err.to_string()))
    }
}

impl DayStore for FileVault {
    fn load_days(&self, range: &DateRange, filter: &DayFilter) -> Result<Vec<Day>, DomainError> {
        let mut days = Vec::new();
        for path in self.scan_json_files(&self.root.join(DAYS_DIR)) {
            let Some(date) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok())
            else {
                continue;
            };
            if !range.contains(date) {
                continue;
            }
            let day: Day = self.read_json(&path)?;
            if filter.matches(&day) {
                days.push(day);
            }
        }
        days.sort_by_key(|day| day.date);
        Ok(days)
    }

    fn save_days(&self, days: &[Day]) -> Result<(), DomainError> {
        for day in days {
            self.write_json(&self.day_path(day.date), day)?;
        }
        debug!(count = days.len(), "saved days");
        Ok(())
    }

    fn move_occurrence(
        &self,
        occurrence_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<(), DomainError> {
        let mut source: Day = self.read_json(&self.day_path(from))?;
        let mut occurrence = source.take_occurrence(occurrence_id).ok_or_else(|| {
            DomainError::StoreUnavailable(format!(
                "occurrence {occurrence_id} not found on {from}"
            ))
        })?;
        occurrence.due_date = Some(to);

        let target_path = self.day_path(to);
        let mut target: Day = if target_path.exists() {
            self.read_json(&target_path)?
        } else {
            Day::new(to)
        };
        target.activities.push(occurrence);

        // Write the target first so a crash between writes duplicates the
        // occurrence instead of losing it.
        self.write_json(&target_path, &target)?;
        self.write_json(&self.day_path(from), &source)?;
        Ok(())
    }
}

impl PlanStore for FileVault {
    fn load_plans(
        &self,
        covering: NaiveDate,
        kind: Option<PeriodKind>,
    ) -> Result<Vec<Plan>, DomainError> {
        let mut plans = Vec::new();
        for path in self.scan_json_files(&self.root.join(PLANS_DIR)) {
            let plan: Plan = self.read_json(&path)?;
            if !plan.range.contains(covering) {
                continue;
            }
            if kind.is_some_and(|wanted| plan.kind != wanted) {
                continue;
            }
            plans.push(plan);
        }
        plans.sort_by_key(|plan| plan.range.start);
        Ok(plans)
    }

    fn save_plan(&self, plan: &Plan) -> Result<(), DomainError> {
        self.write_json(&self.plan_path(plan), plan)
    }
}

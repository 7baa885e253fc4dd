use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use tracing::instrument;

use crate::{
    calendar::{classify_selected_date, CalendarCursor, CalendarGrid, SelectedDay},
    engine::ProgressEngine,
    profile::{QuitProfile, RawProfile, ResolutionNotes},
    snapshot::DerivedSnapshot,
    time_basis::{local_date, Clock, SystemClock},
};

/// Supplies the user's habit profile. The settings layer that stores it lives
/// outside this crate.
pub trait ProfileSource: Send + Sync {
    fn load(&self) -> Result<RawProfile>;

    /// File backing this source, if any, so the service can watch it.
    fn watch_path(&self) -> Option<&Path> {
        None
    }
}

/// Reads a camelCase JSON profile from disk.
#[derive(Debug, Clone)]
pub struct JsonFileProfileSource {
    path: PathBuf,
}

impl JsonFileProfileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ProfileSource for JsonFileProfileSource {
    fn load(&self) -> Result<RawProfile> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read profile {}", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse profile {}", self.path.display()))
    }

    fn watch_path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticProfileSource(pub RawProfile);

impl ProfileSource for StaticProfileSource {
    fn load(&self) -> Result<RawProfile> {
        Ok(self.0.clone())
    }
}

pub struct ProgressService {
    engine: ProgressEngine,
    clock: Box<dyn Clock>,
    source: Box<dyn ProfileSource>,
    profile: RwLock<RawProfile>,
    stale: Arc<AtomicBool>,
    watcher: Option<RecommendedWatcher>,
}

pub struct ProgressServiceBuilder {
    engine: Option<ProgressEngine>,
    clock: Option<Box<dyn Clock>>,
    source: Option<Box<dyn ProfileSource>>,
}

impl ProgressServiceBuilder {
    pub fn new() -> Self {
        Self {
            engine: None,
            clock: None,
            source: None,
        }
    }

    pub fn with_engine(mut self, engine: ProgressEngine) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    pub fn with_profile_source(mut self, source: impl ProfileSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn build(self) -> Result<ProgressService> {
        let engine = match self.engine {
            Some(engine) => engine,
            None => ProgressEngine::standard().context("failed to configure progress engine")?,
        };
        let source = self
            .source
            .ok_or_else(|| anyhow!("no profile source configured"))?;
        let service = ProgressService {
            engine,
            clock: self.clock.unwrap_or_else(|| Box::new(SystemClock)),
            source,
            profile: RwLock::new(RawProfile::default()),
            stale: Arc::new(AtomicBool::new(false)),
            watcher: None,
        };
        service.reload()?;
        Ok(service)
    }
}

impl Default for ProgressServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressService {
    pub fn builder() -> ProgressServiceBuilder {
        ProgressServiceBuilder::new()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::SeqCst)
    }

    /// Reloads from the source. The stale flag is cleared before reading so a change
    /// that lands mid-load still triggers another reload.
    pub fn reload(&self) -> Result<()> {
        let was_stale = self.stale.swap(false, Ordering::SeqCst);
        match self.source.load() {
            Ok(raw) => {
                *self.profile.write() = raw;
                tracing::debug!("quit profile loaded");
                Ok(())
            }
            Err(err) => {
                if was_stale {
                    self.stale.store(true, Ordering::SeqCst);
                }
                Err(err.context("failed to load quit profile"))
            }
        }
    }

    /// Resolves the cached profile against the current clock. The quit instant
    /// falls back to now when it is missing or unparseable.
    pub fn resolved_profile(&self) -> (QuitProfile, ResolutionNotes) {
        self.refresh_if_stale();
        let now = self.now();
        self.profile.read().resolve(now)
    }

    #[instrument(skip(self))]
    pub fn snapshot(&self) -> Result<DerivedSnapshot> {
        let (profile, notes) = self.resolved_profile();
        if !notes.is_clean() {
            tracing::info!(?notes, "snapshot derived from incomplete profile");
        }
        self.engine
            .snapshot(&profile, self.now())
            .context("failed to derive progress snapshot")
    }

    /// Streak calendar for `cursor`, or for the current month when `None`.
    #[instrument(skip(self))]
    pub fn calendar(
        &self,
        cursor: Option<CalendarCursor>,
        offset: FixedOffset,
    ) -> Result<CalendarGrid> {
        let (profile, _) = self.resolved_profile();
        let today = local_date(self.now(), &offset);
        let quit_date = local_date(profile.quit_instant, &offset);
        let cursor = cursor.unwrap_or_else(|| CalendarCursor::of(today));
        cursor
            .grid(quit_date, today)
            .context("failed to build streak calendar")
    }

    pub fn selected_day(&self, selected: NaiveDate, offset: FixedOffset) -> SelectedDay {
        let (profile, _) = self.resolved_profile();
        classify_selected_date(local_date(profile.quit_instant, &offset), selected)
    }

    /// Watches the profile file; a change marks the cached profile stale and the next
    /// computation reloads it.
    pub fn watch(&mut self) -> Result<()> {
        if self.watcher.is_some() {
            return Ok(());
        }
        let Some(path) = self.source.watch_path().map(Path::to_path_buf) else {
            tracing::debug!("profile source has no backing file, not watching");
            return Ok(());
        };
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = path.file_name().map(|name| name.to_os_string());
        let stale = Arc::clone(&self.stale);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            if let Ok(event) = res {
                let touches_profile = event
                    .paths
                    .iter()
                    .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                if touches_profile && !event.kind.is_access() {
                    tracing::debug!(?event, "profile change detected");
                    stale.store(true, Ordering::SeqCst);
                }
            }
        })?;
        watcher.watch(&directory, RecursiveMode::NonRecursive)?;
        tracing::info!(path = %path.display(), "watching quit profile");
        self.watcher = Some(watcher);
        Ok(())
    }

    fn refresh_if_stale(&self) {
        if !self.stale.load(Ordering::SeqCst) {
            return;
        }
        if let Err(err) = self.reload() {
            // Keep serving the last good profile; the next read retries.
            tracing::warn!(error = %format!("{err:#}"), "profile reload failed");
        }
    }
}

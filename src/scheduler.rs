use std::sync::Arc;

use chrono::{DateTime, FixedOffset, LocalResult, NaiveTime, TimeZone, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::pipeline::Pipeline;
use crate::types::{DigestError, Result};

/// Fires the pipeline once a day at the configured local wall-clock
/// time. Explicit lifecycle: `start` spawns the loop, `stop` aborts
/// it. At most one run is in flight at a time; a fire that lands while
/// the previous run is still going is skipped, not queued.
pub struct Scheduler {
    pipeline: Arc<Pipeline>,
    hour: u32,
    minute: u32,
    offset: FixedOffset,
    run_guard: Arc<Mutex<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(pipeline: Arc<Pipeline>, settings: &Settings) -> Result<Self> {
        let offset = FixedOffset::east_opt(settings.utc_offset_hours * 3600).ok_or_else(|| {
            DigestError::Config(format!(
                "invalid UTC offset: {} hours",
                settings.utc_offset_hours
            ))
        })?;
        Ok(Self {
            pipeline,
            hour: settings.digest_hour,
            minute: settings.digest_minute,
            offset,
            run_guard: Arc::new(Mutex::new(())),
            handle: None,
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Spawns the daily loop and returns. Calling `start` on a running
    /// scheduler is a no-op.
    pub fn start(&mut self) {
        if self.handle.is_some() {
            warn!("Scheduler already running");
            return;
        }
        let pipeline = self.pipeline.clone();
        let run_guard = self.run_guard.clone();
        let (hour, minute, offset) = (self.hour, self.minute, self.offset);

        self.handle = Some(tokio::spawn(async move {
            loop {
                let now = Utc::now();
                let fire_at = next_fire_after(now, hour, minute, offset);
                info!(
                    "Next digest run at {}",
                    fire_at.with_timezone(&offset).format("%Y-%m-%d %H:%M %:z")
                );
                let wait = (fire_at - now).to_std().unwrap_or_default();
                tokio::time::sleep(wait).await;

                let pipeline = pipeline.clone();
                let run_guard = run_guard.clone();
                tokio::spawn(async move {
                    match run_guard.try_lock() {
                        Ok(_held) => {
                            info!("Scheduled digest run starting");
                            if let Err(e) = pipeline.run(true).await {
                                error!("Scheduled digest run failed: {}", e);
                            }
                        }
                        Err(_) => {
                            warn!("Previous digest run still in flight, skipping this fire");
                        }
                    }
                });
            }
        }));
        info!(
            "Scheduler started (daily at {:02}:{:02} {})",
            self.hour, self.minute, self.offset
        );
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("Scheduler stopped");
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// First instant strictly after `now` whose wall clock at `offset`
/// reads `hour:minute`. A fire time equal to `now` counts as past, so
/// waking exactly on the boundary schedules the next day.
fn next_fire_after(now: DateTime<Utc>, hour: u32, minute: u32, offset: FixedOffset) -> DateTime<Utc> {
    let local = now.with_timezone(&offset);
    let fire_time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default();
    let mut fire_date = local.date_naive();
    if local.time() >= fire_time {
        fire_date = fire_date.succ_opt().unwrap_or(fire_date);
    }
    match offset.from_local_datetime(&fire_date.and_time(fire_time)) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        // unreachable for a fixed offset
        LocalResult::None => now + chrono::Duration::days(1),
    }
}

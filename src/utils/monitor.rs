use std::time::{Duration, Instant};

#[cfg(feature = "cli")]
use sysinfo::{Pid, RefreshKind, System};

#[derive(Debug, Clone)]
pub struct StageTiming {
    pub stage: &'static str,
    pub elapsed: Duration,
    pub memory_mb: Option<u64>,
}

/// Times the load/match/write stages of a run. With the `cli` feature and
/// monitoring enabled, also samples resident memory of this process.
pub struct RunMonitor {
    enabled: bool,
    started: Instant,
    stage_started: Instant,
    timings: Vec<StageTiming>,
    #[cfg(feature = "cli")]
    system: Option<(System, Pid)>,
}

impl RunMonitor {
    pub fn new(enabled: bool) -> Self {
        #[cfg(feature = "cli")]
        let system = if enabled {
            match sysinfo::get_current_pid() {
                Ok(pid) => {
                    let mut system = System::new_with_specifics(RefreshKind::everything());
                    system.refresh_all();
                    Some((system, pid))
                }
                Err(e) => {
                    tracing::warn!("Memory sampling unavailable: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let now = Instant::now();
        Self {
            enabled,
            started: now,
            stage_started: now,
            timings: Vec::new(),
            #[cfg(feature = "cli")]
            system,
        }
    }

    pub fn begin_stage(&mut self) {
        self.stage_started = Instant::now();
    }

    pub fn end_stage(&mut self, stage: &'static str) {
        let timing = StageTiming {
            stage,
            elapsed: self.stage_started.elapsed(),
            memory_mb: self.sample_memory_mb(),
        };

        if self.enabled {
            match timing.memory_mb {
                Some(mb) => tracing::info!(
                    stage,
                    elapsed_ms = timing.elapsed.as_millis() as u64,
                    memory_mb = mb,
                    "📊 stage finished"
                ),
                None => tracing::info!(
                    stage,
                    elapsed_ms = timing.elapsed.as_millis() as u64,
                    "📊 stage finished"
                ),
            }
        }

        self.timings.push(timing);
    }

    pub fn timings(&self) -> &[StageTiming] {
        &self.timings
    }

    pub fn peak_memory_mb(&self) -> Option<u64> {
        self.timings.iter().filter_map(|t| t.memory_mb).max()
    }

    pub fn log_final_stats(&self) {
        if !self.enabled {
            return;
        }
        tracing::info!(
            total_ms = self.started.elapsed().as_millis() as u64,
            peak_memory_mb = self.peak_memory_mb().unwrap_or(0),
            "📊 run finished"
        );
    }

    #[cfg(feature = "cli")]
    fn sample_memory_mb(&mut self) -> Option<u64> {
        let (system, pid) = self.system.as_mut()?;
        system.refresh_all();
        let process = system.process(*pid)?;
        Some(process.memory() / 1024 / 1024)
    }

    #[cfg(not(feature = "cli"))]
    fn sample_memory_mb(&mut self) -> Option<u64> {
        None
    }
}

impl Default for RunMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

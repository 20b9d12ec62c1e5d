//! Live host readings via the `sysinfo` crate.

use super::{percent_of, round_percent};
use crate::core::{CollectError, HostMetrics, HostReadings};
use std::path::{Path, PathBuf};
use std::time::Duration;
use sysinfo::{Disks, Networks, System};
use tracing::debug;

/// Reads CPU, memory, disk, network and load figures from the running host.
///
/// The `System`, `Disks` and `Networks` handles are kept between ticks, so
/// CPU usage is measured over the time elapsed since the previous read.
pub struct SysinfoHost {
    system: System,
    disks: Disks,
    networks: Networks,
    mount_point: PathBuf,
}

impl SysinfoHost {
    /// Creates a new `SysinfoHost` reporting disk usage for `mount_point`.
    ///
    /// Fails when `sysinfo` has no support for the current platform.
    pub fn new<P: Into<PathBuf>>(mount_point: P) -> Result<Self, CollectError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(CollectError::Unavailable(
                "sysinfo does not support this platform".to_string(),
            ));
        }

        let mut system = System::new();
        // Establishes the baseline the first CPU reading is measured against.
        system.refresh_cpu();
        system.refresh_memory();

        let mount_point = mount_point.into();
        debug!(mount_point = %mount_point.display(), "Initialized sysinfo host");
        Ok(Self {
            system,
            disks: Disks::new_with_refreshed_list(),
            networks: Networks::new_with_refreshed_list(),
            mount_point,
        })
    }

    fn cpu_percent(&mut self) -> Result<f64, CollectError> {
        self.system.refresh_cpu();
        let usage = self.system.global_cpu_info().cpu_usage() as f64;
        if !usage.is_finite() {
            return Err(CollectError::Reading {
                metric: "cpu_percent",
                reason: format!("non-finite usage {usage}"),
            });
        }
        Ok(round_percent(usage))
    }

    fn memory_percent(&mut self) -> Result<f64, CollectError> {
        self.system.refresh_memory();
        let total = self.system.total_memory();
        let used = total.saturating_sub(self.system.available_memory());
        percent_of(used, total).ok_or_else(|| CollectError::Reading {
            metric: "memory_percent",
            reason: "total memory reported as zero".to_string(),
        })
    }

    fn disk_percent(&mut self) -> Result<f64, CollectError> {
        self.disks.refresh_list();
        let disk = find_disk(&self.disks, &self.mount_point).ok_or_else(|| {
            CollectError::Reading {
                metric: "disk_percent",
                reason: format!("no disk mounted at {}", self.mount_point.display()),
            }
        })?;
        let total = disk.total_space();
        let used = total.saturating_sub(disk.available_space());
        percent_of(used, total).ok_or_else(|| CollectError::Reading {
            metric: "disk_percent",
            reason: format!("{} reports zero capacity", self.mount_point.display()),
        })
    }

    fn network_totals(&mut self) -> (u64, u64) {
        self.networks.refresh_list();
        (&self.networks)
            .into_iter()
            .fold((0u64, 0u64), |(sent, recv), (_, data)| {
                (
                    sent.saturating_add(data.total_transmitted()),
                    recv.saturating_add(data.total_received()),
                )
            })
    }
}

fn find_disk<'a>(disks: &'a Disks, mount_point: &Path) -> Option<&'a sysinfo::Disk> {
    disks.list().iter().find(|d| d.mount_point() == mount_point)
}

impl HostMetrics for SysinfoHost {
    fn read(&mut self) -> Result<HostReadings, CollectError> {
        let cpu_percent = self.cpu_percent()?;
        let memory_percent = self.memory_percent()?;
        let disk_percent = self.disk_percent()?;
        let (net_sent, net_recv) = self.network_totals();
        // Zero on platforms without load averages.
        let load = System::load_average();

        Ok(HostReadings {
            cpu_percent,
            memory_percent,
            disk_percent,
            net_sent,
            net_recv,
            load_avg: (load.one, load.five, load.fifteen),
        })
    }

    fn warmup(&self) -> Duration {
        sysinfo::MINIMUM_CPU_UPDATE_INTERVAL
    }
}

//! Stale-process cleanup on the bridge port.
//!
//! A previous bridge instance that was not shut down cleanly keeps the
//! plugin port bound. Before listening, the binary finds the processes
//! holding the port and terminates them.
//!
//! # Platform Behavior
//! - **Linux/macOS**: `lsof -ti tcp:{port} -sTCP:LISTEN`, then SIGTERM and SIGKILL via `nix`
//! - **Windows**: `netstat -ano` (LISTENING rows), then `taskkill /PID {pid} /F`
//!
//! Only listeners are selected. Clients connected to the port, such as the
//! Figma app attached to an old bridge, are left alone.

use crate::config::PortCleanupConfig;
use crate::{BridgeError, Result};
use std::process::Command;
use tracing::{debug, info, warn};

/// PIDs of processes listening on `port`, excluding this process.
pub fn find_port_owners(port: u16) -> Vec<u32> {
    let own_pid = std::process::id();

    #[cfg(unix)]
    let pids = match Command::new("lsof")
        .args(["-ti", &format!("tcp:{}", port), "-sTCP:LISTEN"])
        .output() {
        // lsof exits 1 when nothing matches
        Ok(output) => parse_lsof_pids(&String::from_utf8_lossy(&output.stdout)),
        Err(e) => {
            debug!("lsof unavailable: {}", e);
            Vec::new()
        }
    };

    #[cfg(windows)]
    let pids = match Command::new("netstat").args(["-ano"]).output() {
        Ok(output) => parse_netstat_pids(&String::from_utf8_lossy(&output.stdout), port),
        Err(e) => {
            debug!("netstat unavailable: {}", e);
            Vec::new()
        }
    };

    #[cfg(not(any(unix, windows)))]
    let pids: Vec<u32> = {
        warn!("Port owner lookup not implemented for this platform");
        Vec::new()
    };

    pids.into_iter().filter(|pid| *pid != own_pid).collect()
}

/// Parse `lsof -t` output: one PID per line.
pub fn parse_lsof_pids(output: &str) -> Vec<u32> {
    let mut pids = Vec::new();
    for line in output.lines() {
        if let Ok(pid) = line.trim().parse::<u32>() {
            if !pids.contains(&pid) {
                pids.push(pid);
            }
        }
    }
    pids
}

/// Parse `netstat -ano` output, keeping listeners whose local address is on `port`.
///
/// ```text
///   Proto  Local Address          Foreign Address        State           PID
///   TCP    0.0.0.0:3055           0.0.0.0:0              LISTENING       4242
/// ```
pub fn parse_netstat_pids(output: &str, port: u16) -> Vec<u32> {
    let suffix = format!(":{}", port);
    let mut pids = Vec::new();

    for line in output.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 4 || !parts[0].eq_ignore_ascii_case("tcp") {
            continue;
        }
        if !parts[1].ends_with(&suffix) || !parts[3].eq_ignore_ascii_case("LISTENING") {
            continue;
        }
        let Some(pid) = parts.last().and_then(|p| p.parse::<u32>().ok()) else {
            continue;
        };
        if pid != 0 && !pids.contains(&pid) {
            pids.push(pid);
        }
    }
    pids
}

/// Check if a process with the given PID is alive.
pub fn is_process_alive(pid: u32) -> bool {
    #[cfg(unix)]
    {
        use nix::errno::Errno;
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        match kill(Pid::from_raw(pid as i32), None) {
            Ok(()) => true,
            // Exists but owned by another user
            Err(Errno::EPERM) => true,
            Err(_) => false,
        }
    }

    #[cfg(windows)]
    {
        Command::new("tasklist")
            .args(["/FI", &format!("PID eq {}", pid), "/NH"])
            .output()
            .map(|out| String::from_utf8_lossy(&out.stdout).contains(&pid.to_string()))
            .unwrap_or(false)
    }

    #[cfg(not(any(unix, windows)))]
    {
        warn!("Process alive check not implemented for this platform");
        true
    }
}

/// Terminate a process gracefully, then forcefully if needed.
///
/// Returns `true` if the process is gone (or was never running).
pub fn terminate_process(pid: u32, timeout_ms: u64) -> Result<bool> {
    if !is_process_alive(pid) {
        debug!("Process {} is not running", pid);
        return Ok(true);
    }

    #[cfg(unix)]
    {
        terminate_process_unix(pid, timeout_ms)
    }

    #[cfg(windows)]
    {
        let _ = timeout_ms;
        terminate_process_windows(pid)
    }

    #[cfg(not(any(unix, windows)))]
    {
        let _ = timeout_ms;
        Err(BridgeError::Other(
            "Process termination not implemented for this platform".into(),
        ))
    }
}

#[cfg(unix)]
fn terminate_process_unix(pid: u32, timeout_ms: u64) -> Result<bool> {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;
    use std::thread::sleep;
    use std::time::Duration;

    let nix_pid = Pid::from_raw(pid as i32);

    debug!("Sending SIGTERM to process {}", pid);
    if let Err(e) = kill(nix_pid, Signal::SIGTERM) {
        if e == Errno::ESRCH {
            return Ok(true);
        }
        warn!("Failed to send SIGTERM to {}: {}", pid, e);
    }

    let wait_interval = Duration::from_millis(100);
    for _ in 0..(timeout_ms / 100).max(1) {
        sleep(wait_interval);
        if !is_process_alive(pid) {
            debug!("Process {} terminated gracefully", pid);
            return Ok(true);
        }
    }

    debug!("Process {} still running, sending SIGKILL", pid);
    if let Err(e) = kill(nix_pid, Signal::SIGKILL) {
        if e == Errno::ESRCH {
            return Ok(true);
        }
        return Err(BridgeError::Other(format!(
            "Failed to kill process {}: {}",
            pid, e
        )));
    }

    sleep(wait_interval);
    Ok(!is_process_alive(pid))
}

#[cfg(windows)]
fn terminate_process_windows(pid: u32) -> Result<bool> {
    debug!("Terminating process {} with taskkill", pid);

    let output = Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/F"])
        .output()
        .map_err(|e| BridgeError::Other(format!("Failed to run taskkill: {}", e)))?;

    if output.status.success() {
        return Ok(true);
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    if stderr.contains("not found") || stderr.contains("not running") {
        Ok(true)
    } else {
        warn!("taskkill failed for {}: {}", pid, stderr);
        Ok(false)
    }
}

/// Terminate every other process holding `port` and give the OS a moment to
/// release it. Returns how many processes were terminated.
pub async fn release_port(port: u16) -> usize {
    let killed = tokio::task::spawn_blocking(move || {
        let mut killed = 0;
        for pid in find_port_owners(port) {
            match terminate_process(pid, PortCleanupConfig::TERMINATE_TIMEOUT_MS) {
                Ok(true) => {
                    info!("Killed stale process {} on port {}", pid, port);
                    killed += 1;
                }
                Ok(false) => warn!("Stale process {} on port {} survived termination", pid, port),
                Err(e) => warn!("Could not terminate process {}: {}", pid, e),
            }
        }
        killed
    })
    .await
    .unwrap_or_else(|e| {
        warn!("Port cleanup task failed: {}", e);
        0
    });

    if killed > 0 {
        tokio::time::sleep(PortCleanupConfig::RELEASE_DELAY).await;
    }
    killed
}

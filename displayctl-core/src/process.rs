//! Ownership of spawned external processes.
use std::collections::HashMap;
use std::process::{Child, Command, Stdio};

/// Spawn-and-kill seam between the supervisor and the operating system.
///
/// `spawn` returns `None` when the executable is missing or unlaunchable;
/// callers treat that as "intent recorded, nothing enacted". `kill` must
/// tolerate pids that already exited or were never spawned. `release` drops
/// bookkeeping for a process known to have exited; it must never signal,
/// since the pid may already have been recycled for an unrelated process.
pub trait ProcessRunner {
    fn spawn(&mut self, program: &str, args: &[String]) -> Option<u32>;
    fn kill(&mut self, pid: u32);
    fn release(&mut self, pid: u32);
}

/// Runner backed by `std::process`. Each `Child` is retained keyed by pid so
/// a later kill can reap it instead of leaving a zombie.
#[derive(Debug, Default)]
pub struct SystemRunner {
    children: HashMap<u32, Child>,
}

impl SystemRunner {
    pub fn new() -> Self {
        SystemRunner::default()
    }
}

impl ProcessRunner for SystemRunner {
    fn spawn(&mut self, program: &str, args: &[String]) -> Option<u32> {
        match Command::new(program)
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => {
                let pid = child.id();
                log::debug!("spawned {program} {} (pid {pid})", args.join(" "));
                self.children.insert(pid, child);
                Some(pid)
            }
            Err(err) => {
                log::warn!("failed to launch {program}: {err}");
                None
            }
        }
    }

    fn kill(&mut self, pid: u32) {
        if let Some(mut child) = self.children.remove(&pid) {
            // Both calls may fail if the process already exited or was
            // reaped by a child watch; that is not an error here.
            let _ = child.kill();
            let _ = child.wait();
        }
    }

    fn release(&mut self, pid: u32) {
        if let Some(mut child) = self.children.remove(&pid) {
            // The process has exited. A child watch may have reaped it
            // already; try_wait reaps it otherwise, and never signals.
            let _ = child.try_wait();
        }
    }
}

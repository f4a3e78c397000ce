//! Night light process supervision.
//!
//! At most one steady color temperature process is authoritative at any
//! time. Commits toward a cooler target hand display control to a transient
//! fade process; once that exits, a fresh steady process is respawned so a
//! long-lived process again holds the final temperature. Commits toward a
//! warmer target skip the fade entirely: current hyprsunset builds flicker
//! visibly when fading in that direction.
use crate::process::ProcessRunner;
use crate::{COLOR_TEMP_TOOL, FADE_DURATION_SECS, clamp_temp};

/// Lifecycle of the managed color temperature process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NightLightState {
    /// Night light disabled; nothing managed.
    Off,
    /// One long-lived process holds the display at `kelvin`. `pid` is `None`
    /// when the tool could not be launched; the intent is still recorded.
    Steady { kelvin: u32, pid: Option<u32> },
    /// A fade process is animating from `from` to `to`. The superseded
    /// steady process is kept only for bookkeeping until reconciliation.
    Fading {
        from: u32,
        to: u32,
        steady_pid: Option<u32>,
        fade_pid: u32,
    },
}

/// What a target commit did, so the caller can register an exit watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOutcome {
    /// Night light is off; the intent was recorded but nothing was spawned.
    Off,
    /// Warmer target: the steady process was killed and respawned instantly.
    Instant,
    /// Cooler or equal target: a fade process was spawned; watch `pid`.
    FadeStarted { pid: u32 },
    /// The fade tool could not be launched; state is unchanged.
    NotLaunched,
}

/// Owns the steady and fade process handles exclusively.
#[derive(Debug)]
pub struct NightLightSupervisor<R> {
    runner: R,
    state: NightLightState,
}

impl<R: ProcessRunner> NightLightSupervisor<R> {
    pub fn new(runner: R) -> Self {
        NightLightSupervisor {
            runner,
            state: NightLightState::Off,
        }
    }

    pub fn state(&self) -> &NightLightState {
        &self.state
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn is_on(&self) -> bool {
        !matches!(self.state, NightLightState::Off)
    }

    /// Temperature the display is actually held at. Lags the target while a
    /// fade is in flight; `None` when night light is off.
    pub fn applied_kelvin(&self) -> Option<u32> {
        match &self.state {
            NightLightState::Off => None,
            NightLightState::Steady { kelvin, .. } => Some(*kelvin),
            NightLightState::Fading { from, .. } => Some(*from),
        }
    }

    /// Kill anything managed and spawn a fresh steady process at `kelvin`.
    pub fn enable(&mut self, kelvin: u32) {
        let kelvin = clamp_temp(kelvin);
        self.kill_managed();
        let pid = self.spawn_steady(kelvin);
        log::info!("night light on at {kelvin}K");
        self.state = NightLightState::Steady { kelvin, pid };
    }

    /// Kill whichever of steady/fade is present. Safe in every state.
    pub fn disable(&mut self) {
        self.kill_managed();
        if self.is_on() {
            log::info!("night light off");
        }
        self.state = NightLightState::Off;
    }

    /// Commit a new target temperature.
    ///
    /// While `Fading`, a newer commit supersedes the old fade: its process
    /// is killed first and the policy is applied against the pre-fade
    /// temperature, so at most one fade is ever in flight.
    pub fn set_target(&mut self, kelvin: u32) -> TargetOutcome {
        let kelvin = clamp_temp(kelvin);
        match self.state.clone() {
            NightLightState::Off => TargetOutcome::Off,
            NightLightState::Steady { kelvin: current, pid } => {
                self.transition(current, pid, kelvin)
            }
            NightLightState::Fading {
                from,
                steady_pid,
                fade_pid,
                ..
            } => {
                self.runner.kill(fade_pid);
                self.transition(from, steady_pid, kelvin)
            }
        }
    }

    /// Reconcile after the fade process exits, for any exit reason: kill the
    /// superseded steady process and respawn a single steady process at the
    /// fade's target. Stale notifications (wrong pid, or delivered after a
    /// disable already killed the fade) are ignored.
    pub fn complete_fade(&mut self, pid: u32) -> bool {
        match self.state.clone() {
            NightLightState::Fading {
                to,
                steady_pid,
                fade_pid,
                ..
            } if fade_pid == pid => {
                // The fade already exited and its pid may have been recycled;
                // release the bookkeeping without sending any signal.
                self.runner.release(fade_pid);
                if let Some(old) = steady_pid {
                    self.runner.kill(old);
                }
                let new_pid = self.spawn_steady(to);
                log::debug!("fade complete, steady process respawned at {to}K");
                self.state = NightLightState::Steady {
                    kelvin: to,
                    pid: new_pid,
                };
                true
            }
            _ => {
                log::debug!("ignoring stale fade notification for pid {pid}");
                false
            }
        }
    }

    /// Force-kill any surviving managed process; called on program exit.
    pub fn shutdown(&mut self) {
        self.kill_managed();
        self.state = NightLightState::Off;
    }

    fn transition(
        &mut self,
        current: u32,
        steady_pid: Option<u32>,
        target: u32,
    ) -> TargetOutcome {
        if target < current {
            // Warmer: instant kill-and-respawn, skipping the fade path.
            if let Some(pid) = steady_pid {
                self.runner.kill(pid);
            }
            let pid = self.spawn_steady(target);
            self.state = NightLightState::Steady {
                kelvin: target,
                pid,
            };
            TargetOutcome::Instant
        } else {
            match self.spawn_fade(target) {
                Some(fade_pid) => {
                    // The fade takes over display control by itself; the old
                    // steady process is only killed at reconciliation.
                    self.state = NightLightState::Fading {
                        from: current,
                        to: target,
                        steady_pid,
                        fade_pid,
                    };
                    TargetOutcome::FadeStarted { pid: fade_pid }
                }
                None => {
                    self.state = NightLightState::Steady {
                        kelvin: current,
                        pid: steady_pid,
                    };
                    TargetOutcome::NotLaunched
                }
            }
        }
    }

    fn kill_managed(&mut self) {
        match self.state.clone() {
            NightLightState::Off => {}
            NightLightState::Steady { pid, .. } => {
                if let Some(pid) = pid {
                    self.runner.kill(pid);
                }
            }
            NightLightState::Fading {
                steady_pid,
                fade_pid,
                ..
            } => {
                self.runner.kill(fade_pid);
                if let Some(pid) = steady_pid {
                    self.runner.kill(pid);
                }
            }
        }
    }

    fn spawn_steady(&mut self, kelvin: u32) -> Option<u32> {
        self.runner
            .spawn(COLOR_TEMP_TOOL, &["-t".into(), kelvin.to_string()])
    }

    fn spawn_fade(&mut self, kelvin: u32) -> Option<u32> {
        self.runner.spawn(
            COLOR_TEMP_TOOL,
            &[
                "-f".into(),
                FADE_DURATION_SECS.into(),
                "-t".into(),
                kelvin.to_string(),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{NightLightState, NightLightSupervisor, TargetOutcome};
    use crate::process::ProcessRunner;
    use std::collections::BTreeSet;

    #[derive(Debug, Default)]
    struct MockRunner {
        next_pid: u32,
        live: BTreeSet<u32>,
        spawns: Vec<(u32, String, Vec<String>)>,
        killed: Vec<u32>,
        fail_spawn: bool,
    }

    impl ProcessRunner for MockRunner {
        fn spawn(&mut self, program: &str, args: &[String]) -> Option<u32> {
            if self.fail_spawn {
                return None;
            }
            self.next_pid += 1;
            let pid = 100 + self.next_pid;
            self.live.insert(pid);
            self.spawns
                .push((pid, program.to_string(), args.to_vec()));
            Some(pid)
        }

        fn kill(&mut self, pid: u32) {
            self.killed.push(pid);
            self.live.remove(&pid);
        }

        fn release(&mut self, pid: u32) {
            self.live.remove(&pid);
        }
    }

    fn supervisor() -> NightLightSupervisor<MockRunner> {
        NightLightSupervisor::new(MockRunner::default())
    }

    fn fade_spawns(sup: &NightLightSupervisor<MockRunner>) -> Vec<&Vec<String>> {
        sup.runner()
            .spawns
            .iter()
            .filter(|(_, _, args)| args.first().map(String::as_str) == Some("-f"))
            .map(|(_, _, args)| args)
            .collect()
    }

    #[test]
    fn enable_then_disable_leaves_nothing_running() {
        let mut sup = supervisor();
        sup.enable(4500);
        assert!(sup.is_on());
        sup.disable();
        assert!(sup.runner().live.is_empty());
        assert_eq!(*sup.state(), NightLightState::Off);
    }

    #[test]
    fn warmer_target_skips_the_fade_path() {
        let mut sup = supervisor();
        sup.enable(5500);
        let outcome = sup.set_target(3500);
        assert_eq!(outcome, TargetOutcome::Instant);
        assert!(fade_spawns(&sup).is_empty());
        assert_eq!(sup.applied_kelvin(), Some(3500));
        assert_eq!(sup.runner().live.len(), 1);
    }

    #[test]
    fn cooler_target_fades_then_reconciles_to_one_steady_process() {
        let mut sup = supervisor();
        sup.enable(4500);

        let outcome = sup.set_target(5500);
        let TargetOutcome::FadeStarted { pid } = outcome else {
            panic!("expected a fade, got {outcome:?}");
        };
        assert_eq!(
            fade_spawns(&sup),
            vec![&vec![
                "-f".to_string(),
                "0.5".to_string(),
                "-t".to_string(),
                "5500".to_string()
            ]]
        );
        // The old steady process is not killed synchronously.
        assert_eq!(sup.runner().live.len(), 2);
        assert_eq!(sup.applied_kelvin(), Some(4500));

        assert!(sup.complete_fade(pid));
        assert_eq!(sup.applied_kelvin(), Some(5500));
        assert_eq!(sup.runner().live.len(), 1);
        assert!(matches!(
            sup.state(),
            NightLightState::Steady { kelvin: 5500, pid: Some(_) }
        ));
    }

    #[test]
    fn equal_target_takes_the_fade_path() {
        let mut sup = supervisor();
        sup.enable(4500);
        assert!(matches!(
            sup.set_target(4500),
            TargetOutcome::FadeStarted { .. }
        ));
    }

    #[test]
    fn disable_mid_fade_kills_both_processes() {
        let mut sup = supervisor();
        sup.enable(4500);
        sup.set_target(6000);
        sup.disable();
        assert!(sup.runner().live.is_empty());
        assert_eq!(*sup.state(), NightLightState::Off);
    }

    #[test]
    fn stale_fade_notification_is_ignored_after_disable() {
        let mut sup = supervisor();
        sup.enable(4500);
        let TargetOutcome::FadeStarted { pid } = sup.set_target(6000) else {
            panic!("expected a fade");
        };
        sup.disable();

        assert!(!sup.complete_fade(pid));
        assert_eq!(*sup.state(), NightLightState::Off);
        assert!(sup.runner().live.is_empty());
    }

    #[test]
    fn superseding_commit_kills_the_previous_fade() {
        let mut sup = supervisor();
        sup.enable(4500);
        let TargetOutcome::FadeStarted { pid: first } = sup.set_target(5000) else {
            panic!("expected a fade");
        };
        let TargetOutcome::FadeStarted { pid: second } = sup.set_target(6000) else {
            panic!("expected a second fade");
        };

        assert_ne!(first, second);
        assert!(!sup.runner().live.contains(&first));
        assert_eq!(fade_spawns(&sup).len(), 2);
        // Still one steady plus exactly one fade.
        assert_eq!(sup.runner().live.len(), 2);

        // The first fade's exit notification arrives late and is ignored.
        assert!(!sup.complete_fade(first));
        assert!(sup.complete_fade(second));
        assert_eq!(sup.applied_kelvin(), Some(6000));
    }

    #[test]
    fn natural_fade_completion_never_signals_the_fade_pid() {
        let mut sup = supervisor();
        sup.enable(4500);
        let TargetOutcome::FadeStarted { pid: fade } = sup.set_target(5500) else {
            panic!("expected a fade");
        };

        assert!(sup.complete_fade(fade));
        // The fade exited on its own, so its pid may already belong to an
        // unrelated process; only the superseded steady process is signaled.
        assert!(!sup.runner().killed.contains(&fade));
        assert_eq!(sup.runner().killed.len(), 1);
        assert!(!sup.runner().live.contains(&fade));
        assert_eq!(sup.applied_kelvin(), Some(5500));
    }

    #[test]
    fn commit_while_off_records_nothing() {
        let mut sup = supervisor();
        assert_eq!(sup.set_target(3000), TargetOutcome::Off);
        assert!(sup.runner().spawns.is_empty());
    }

    #[test]
    fn failed_spawns_still_record_intent() {
        let mut sup = supervisor();
        sup.runner.fail_spawn = true;

        sup.enable(4000);
        assert!(sup.is_on());
        assert_eq!(
            *sup.state(),
            NightLightState::Steady { kelvin: 4000, pid: None }
        );

        // A cooler commit that cannot launch a fade leaves state unchanged.
        assert_eq!(sup.set_target(5000), TargetOutcome::NotLaunched);
        assert_eq!(sup.applied_kelvin(), Some(4000));
    }

    #[test]
    fn targets_are_clamped_to_the_supported_range() {
        let mut sup = supervisor();
        sup.enable(10_000);
        assert_eq!(sup.applied_kelvin(), Some(crate::MAX_TEMP));
        sup.set_target(100);
        assert_eq!(sup.applied_kelvin(), Some(crate::MIN_TEMP));
    }

    #[test]
    fn drag_scenario_cooler_then_warmer() {
        let mut sup = supervisor();
        sup.enable(4500);

        // Release at 5500K (cooler): one fade with -f 0.5 -t 5500.
        let TargetOutcome::FadeStarted { pid } = sup.set_target(5500) else {
            panic!("expected a fade");
        };
        assert_eq!(fade_spawns(&sup).len(), 1);
        assert!(sup.complete_fade(pid));
        assert_eq!(sup.applied_kelvin(), Some(5500));

        // Release at 3500K (warmer): immediate kill+respawn, no new fade.
        assert_eq!(sup.set_target(3500), TargetOutcome::Instant);
        assert_eq!(fade_spawns(&sup).len(), 1);
        assert_eq!(sup.applied_kelvin(), Some(3500));
        assert_eq!(sup.runner().live.len(), 1);
    }
}

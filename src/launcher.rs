//! Ties probing, planning and launching together for one invocation.

use crate::config::SessionConfig;
use crate::geometry::TerminalProbe;
use crate::layout::{decide_layout, render_session};
use crate::screen::{LaunchRequest, Multiplexer};
use crate::temp;
use anyhow::Result;
use std::io::Read;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Pause after a detached launch so the session can come up.
pub const DAEMON_SETTLE_DELAY: Duration = Duration::from_secs(1);

pub struct Launcher<P, M> {
    probe: P,
    multiplexer: M,
    settle_delay: Duration,
}

impl<P: TerminalProbe, M: Multiplexer> Launcher<P, M> {
    pub fn new(probe: P, multiplexer: M) -> Self {
        Self {
            probe,
            multiplexer,
            settle_delay: DAEMON_SETTLE_DELAY,
        }
    }

    #[cfg(test)]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Run one session and return the multiplexer's exit status.
    ///
    /// `input` is the non-interactive stdin to share with every command, if
    /// any. Both temp files are removed before this returns, on every path.
    pub fn run(&self, config: &SessionConfig, input: Option<&mut dyn Read>) -> Result<i32> {
        let lines = self.probe.lines()?;
        let layout = decide_layout(lines, config.commands().len(), config.min_height());
        info!(
            lines,
            commands = config.commands().len(),
            min_height = config.min_height(),
            split = layout.is_split(),
            "planned layout"
        );

        let shared_input = input
            .map(|reader| temp::from_reader("parun-stdin", reader))
            .transpose()?;

        let script = render_session(
            config.commands(),
            shared_input.as_deref().map(|p| p.as_path()),
            layout,
        );
        let script_file = temp::create("parun-screenrc", script.as_bytes())?;
        debug!(%script, "rendered session script");

        let status = self.multiplexer.launch(&LaunchRequest {
            script: &script_file,
            daemon: config.daemon(),
            session_name: config.name(),
        })?;

        if config.daemon() {
            thread::sleep(self.settle_delay);
        }

        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParunError;
    use std::cell::RefCell;
    use std::fs;
    use std::path::PathBuf;
    use std::time::Instant;

    struct FixedProbe(Option<u16>);

    impl TerminalProbe for FixedProbe {
        fn lines(&self) -> Result<u16, ParunError> {
            self.0
                .ok_or_else(|| ParunError::GeometryUnavailable("no terminal".to_string()))
        }
    }

    /// What the multiplexer saw, captured while the temp files still existed.
    #[derive(Debug, Default)]
    struct Launch {
        script_path: PathBuf,
        script: String,
        daemon: bool,
        session_name: Option<String>,
    }

    #[derive(Default)]
    struct RecordingMultiplexer {
        launches: RefCell<Vec<Launch>>,
        status: i32,
    }

    impl Multiplexer for RecordingMultiplexer {
        fn launch(&self, request: &LaunchRequest<'_>) -> Result<i32> {
            self.launches.borrow_mut().push(Launch {
                script_path: request.script.to_path_buf(),
                script: fs::read_to_string(request.script)?,
                daemon: request.daemon,
                session_name: request.session_name.map(str::to_string),
            });
            Ok(self.status)
        }
    }

    fn config(commands: &[&str], min_height: u16) -> SessionConfig {
        SessionConfig::new(commands.iter().map(|c| c.to_string()).collect(), min_height).unwrap()
    }

    fn launcher(lines: u16) -> Launcher<FixedProbe, RecordingMultiplexer> {
        Launcher::new(FixedProbe(Some(lines)), RecordingMultiplexer::default())
            .with_settle_delay(Duration::ZERO)
    }

    #[test]
    fn test_two_commands_split() {
        let launcher = launcher(20);
        let status = launcher.run(&config(&["echo A", "echo B"], 8), None).unwrap();

        assert_eq!(status, 0);
        let launches = launcher.multiplexer.launches.borrow();
        let script = &launches[0].script;
        assert_eq!(script.matches("screen -t ").count(), 2);
        assert_eq!(script.matches("split\nfocus\n").count(), 1);
        assert!(!script.contains("windowlist"));
    }

    #[test]
    fn test_five_commands_window_list() {
        let launcher = launcher(20);
        launcher
            .run(&config(&["a", "b", "c", "d", "e"], 8), None)
            .unwrap();

        let launches = launcher.multiplexer.launches.borrow();
        let script = &launches[0].script;
        assert_eq!(script.matches("screen -t ").count(), 5);
        assert!(script.ends_with("windowlist -b\n"));
        assert!(!script.contains("split"));
    }

    #[test]
    fn test_lower_min_height_flips_to_split() {
        let launcher = launcher(20);
        launcher
            .run(&config(&["a", "b", "c", "d", "e"], 3), None)
            .unwrap();

        let launches = launcher.multiplexer.launches.borrow();
        assert_eq!(launches[0].script.matches("split\nfocus\n").count(), 4);
    }

    #[test]
    fn test_shared_input_captured() {
        let launcher = launcher(40);
        let mut input: &[u8] = b"xyz";
        launcher
            .run(&config(&["cat", "wc -c", "rev"], 8), Some(&mut input))
            .unwrap();

        let launches = launcher.multiplexer.launches.borrow();
        let script = &launches[0].script;
        let words: Vec<Vec<String>> = script
            .lines()
            .filter(|l| l.starts_with("screen "))
            .map(|l| shell_words::split(l).unwrap())
            .collect();
        assert_eq!(words.len(), 3);

        // Every command reads the same file
        let paths: Vec<&str> = words
            .iter()
            .map(|w| {
                w[5].strip_prefix("cat ")
                    .and_then(|rest| rest.split(" | (").next())
                    .unwrap()
            })
            .collect();
        assert!(paths.iter().all(|p| *p == paths[0]));

        // Removed once the run is over
        assert!(!PathBuf::from(paths[0]).exists());
    }

    #[test]
    fn test_shared_input_contents() {
        struct InputChecker(RefCell<Option<Vec<u8>>>);

        impl Multiplexer for InputChecker {
            fn launch(&self, request: &LaunchRequest<'_>) -> Result<i32> {
                let script = fs::read_to_string(request.script)?;
                let line = script.lines().next().unwrap();
                let body = &shell_words::split(line).unwrap()[5];
                let path = body
                    .strip_prefix("cat ")
                    .and_then(|rest| rest.split(" | (").next())
                    .unwrap();
                *self.0.borrow_mut() = Some(fs::read(path)?);
                Ok(0)
            }
        }

        let launcher = Launcher::new(FixedProbe(Some(40)), InputChecker(RefCell::new(None)));
        let mut input: &[u8] = b"xyz";
        launcher.run(&config(&["cat"], 8), Some(&mut input)).unwrap();

        assert_eq!(launcher.multiplexer.0.borrow().as_deref(), Some(&b"xyz"[..]));
    }

    #[test]
    fn test_no_input_runs_commands_directly() {
        let launcher = launcher(40);
        launcher.run(&config(&["echo A"], 8), None).unwrap();

        let launches = launcher.multiplexer.launches.borrow();
        assert_eq!(
            launches[0].script,
            "screen -t 'echo A' /bin/bash -c 'echo A'\n"
        );
    }

    #[test]
    fn test_options_passed_through() {
        let launcher = launcher(40);
        let config = config(&["a", "b"], 8)
            .with_name(Some("jobs".to_string()))
            .with_daemon(true);
        launcher.run(&config, None).unwrap();

        let launches = launcher.multiplexer.launches.borrow();
        assert!(launches[0].daemon);
        assert_eq!(launches[0].session_name.as_deref(), Some("jobs"));
    }

    /// Remembers when `launch` returned.
    #[derive(Default)]
    struct TimedMultiplexer {
        returned_at: RefCell<Option<Instant>>,
    }

    impl Multiplexer for TimedMultiplexer {
        fn launch(&self, _request: &LaunchRequest<'_>) -> Result<i32> {
            *self.returned_at.borrow_mut() = Some(Instant::now());
            Ok(0)
        }
    }

    fn time_after_launch(daemon: bool, delay: Duration) -> Duration {
        let launcher = Launcher::new(FixedProbe(Some(40)), TimedMultiplexer::default())
            .with_settle_delay(delay);
        launcher
            .run(&config(&["a", "b"], 8).with_daemon(daemon), None)
            .unwrap();

        let returned_at = launcher.multiplexer.returned_at.borrow().unwrap();
        returned_at.elapsed()
    }

    #[test]
    fn test_daemon_waits_after_launch() {
        let delay = Duration::from_millis(200);
        assert!(time_after_launch(true, delay) >= delay);
    }

    #[test]
    fn test_foreground_returns_without_waiting() {
        let delay = Duration::from_millis(200);
        assert!(time_after_launch(false, delay) < delay);
    }

    #[test]
    fn test_default_settle_delay() {
        let launcher = Launcher::new(FixedProbe(Some(40)), TimedMultiplexer::default());
        assert_eq!(launcher.settle_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_script_removed_after_run() {
        let launcher = launcher(40);
        launcher.run(&config(&["a"], 8), None).unwrap();

        let launches = launcher.multiplexer.launches.borrow();
        assert!(!launches[0].script_path.exists());
    }

    #[test]
    fn test_status_propagated() {
        let launcher = Launcher::new(
            FixedProbe(Some(40)),
            RecordingMultiplexer {
                status: 3,
                ..Default::default()
            },
        );
        assert_eq!(launcher.run(&config(&["a"], 8), None).unwrap(), 3);
    }

    #[test]
    fn test_geometry_failure_launches_nothing() {
        let launcher = Launcher::new(FixedProbe(None), RecordingMultiplexer::default());
        let mut input: &[u8] = b"untouched";
        let err = launcher
            .run(&config(&["a"], 8), Some(&mut input))
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ParunError>(),
            Some(ParunError::GeometryUnavailable(_))
        ));
        assert!(launcher.multiplexer.launches.borrow().is_empty());
        // stdin is left alone when probing fails
        assert_eq!(input, b"untouched");
    }
}

// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! Session construction options, with defaults derived from TTY and CI
//! detection.

use std::env;

use super::console_capture::LogLaneOptions;
use crate::{
    InputDevice, OutputDevice, RenderMode, Size, TerminalProfile, stdout_is_tty,
};

/// Environment variables that mark a CI environment. Any of these being set
/// (to anything) disables interactive behavior by default.
pub const CI_ENV_VARS: &[&str] = &[
    "CI",
    "CONTINUOUS_INTEGRATION",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "CIRCLECI",
    "TRAVIS",
    "JENKINS_URL",
    "BUILDKITE",
    "AZURE_PIPELINES",
    "TEAMCITY_VERSION",
];

/// Is the process running under a recognized CI system?
#[must_use]
pub fn detect_ci() -> bool {
    CI_ENV_VARS.iter().any(|name| env::var_os(name).is_some())
}

/// Options consumed by [`crate::RenderSession::mount`].
#[allow(missing_debug_implementations)]
pub struct SessionOptions {
    pub stdin: InputDevice,
    pub stdout: OutputDevice,
    pub stderr: OutputDevice,
    pub exit_on_ctrl_c: bool,
    pub patch_console: bool,
    pub use_alt_screen: bool,
    pub enable_raw_mode: bool,
    pub enable_bracketed_paste: bool,
    /// Frames per second cap. Default 60.
    pub fps_cap: u32,
    pub render_mode: RenderMode,
    pub terminal_profile_override: Option<TerminalProfile>,
    /// Fixed viewport instead of querying the terminal; what tests use.
    pub viewport_override: Option<Size>,
    pub log_lane: LogLaneOptions,
}

impl Default for SessionOptions {
    /// Interactive defaults when stdout is a TTY outside CI; inert defaults
    /// (no raw mode, no console patching, no bracketed paste) otherwise.
    fn default() -> Self {
        let interactive = stdout_is_tty() && !detect_ci();
        Self {
            stdin: InputDevice::new_stdin(),
            stdout: OutputDevice::new_stdout(),
            stderr: OutputDevice::new_stderr(),
            exit_on_ctrl_c: true,
            patch_console: interactive,
            use_alt_screen: false,
            enable_raw_mode: interactive,
            enable_bracketed_paste: interactive,
            fps_cap: 60,
            render_mode: RenderMode::Automatic,
            terminal_profile_override: None,
            viewport_override: None,
            log_lane: LogLaneOptions::default(),
        }
    }
}

impl SessionOptions {
    /// Inert options wired to in-memory devices: fixed viewport, no raw
    /// mode, no signals, no console patching. The starting point for tests.
    #[must_use]
    pub fn headless(viewport: Size) -> (Self, std::sync::Arc<std::sync::Mutex<Vec<u8>>>) {
        let (stdout, observed) = OutputDevice::new_mock();
        let (stderr, _unused) = OutputDevice::new_mock();
        let options = Self {
            stdin: InputDevice::new_mock(Vec::new()),
            stdout,
            stderr,
            exit_on_ctrl_c: true,
            patch_console: false,
            use_alt_screen: false,
            enable_raw_mode: false,
            enable_bracketed_paste: false,
            fps_cap: 60,
            render_mode: RenderMode::Automatic,
            terminal_profile_override: Some(TerminalProfile::TrueColor),
            viewport_override: Some(viewport),
            log_lane: LogLaneOptions::default(),
        };
        (options, observed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_detect_ci() {
        // SAFETY: serialized test; no concurrent env readers in this crate.
        unsafe { env::remove_var("CI") };
        unsafe { env::remove_var("BUILDKITE") };
        let baseline = detect_ci();
        unsafe { env::set_var("BUILDKITE", "1") };
        assert!(detect_ci());
        unsafe { env::remove_var("BUILDKITE") };
        assert_eq!(detect_ci(), baseline);
    }
}

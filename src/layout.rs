//! Layout planning and screenrc generation.

use std::path::Path;

/// Shell every pane runs its command under.
pub const SHELL: &str = "/bin/bash";

/// How the commands are laid out on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// One region per command, tiled top to bottom
    Split,
    /// Background windows plus screen's interactive window list
    WindowList,
}

impl Layout {
    pub fn is_split(self) -> bool {
        self == Layout::Split
    }
}

/// Decide whether equal-height panes would be tall enough.
///
/// Each pane gives up one line to its title bar, so the usable height is
/// `(lines - count) / count`, truncated toward zero.
pub fn decide_layout(terminal_lines: u16, command_count: usize, min_height: u16) -> Layout {
    debug_assert!(command_count > 0);
    let count = command_count.max(1) as i64;
    let pane_height = (i64::from(terminal_lines) - count) / count;

    if pane_height >= i64::from(min_height) {
        Layout::Split
    } else {
        Layout::WindowList
    }
}

/// The shell text one pane runs: the command itself, or the command fed
/// from its own read of the shared input file.
pub fn wrap_command(command: &str, shared_input: Option<&Path>) -> String {
    match shared_input {
        Some(path) => format!(
            "cat {} | ({})",
            shell_words::quote(&path.to_string_lossy()),
            command
        ),
        None => command.to_string(),
    }
}

/// The screenrc directive launching one command, titled with its literal text.
pub fn render_command_line(command: &str, shared_input: Option<&Path>) -> String {
    format!(
        "screen -t {} {} -c {}",
        shell_words::quote(command),
        SHELL,
        shell_words::quote(&wrap_command(command, shared_input))
    )
}

/// Render the complete screenrc for `commands` under `layout`.
pub fn render_session(commands: &[String], shared_input: Option<&Path>, layout: Layout) -> String {
    let launches: Vec<String> = commands
        .iter()
        .map(|command| render_command_line(command, shared_input) + "\n")
        .collect();

    match layout {
        Layout::Split => launches.join("split\nfocus\n"),
        Layout::WindowList => launches.concat() + "windowlist -b\n",
    }
}

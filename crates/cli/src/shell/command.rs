use clap::Parser;
use clap::error::ErrorKind;

/// Helper struct for Clap parsing within the shell
#[derive(Parser, Clone, Debug, PartialEq, Eq)]
#[command(no_binary_name = true)]
pub enum ShellCommand {
    /// Open a deep link, e.g. `go movie/local/101` or `go plex://search/heat`
    Go {
        /// Path to navigate to, with or without the plex:// prefix
        path: String,
    },
    /// Forget the history and go to the home page
    Home,
    /// Return to the previous page
    Back,
    /// Reload the current page
    Refresh,
    /// Print the current page
    Pwd,
    /// Show the back history, most recent first
    History,
    /// List the registered route patterns
    Routes,
    /// Show or change the maximum number of back entries
    Limit {
        /// New maximum; applies from the next navigation
        size: Option<usize>,
    },
    /// Clear the screen
    Clear,
}

impl ShellCommand {
    /// Automatically generates the list of available command names from the enum.
    pub fn command_names() -> Vec<String> {
        use clap::CommandFactory;
        let cmd = Self::command();
        let mut names = vec!["help".to_string(), "exit".to_string(), "quit".to_string()];
        names.extend(cmd.get_subcommands().map(|s| s.get_name().to_string()));
        names
    }

    /// Whether the command starts a navigation the shell has to wait for.
    pub fn navigates(&self) -> bool {
        matches!(
            self,
            ShellCommand::Go { .. } | ShellCommand::Home | ShellCommand::Back | ShellCommand::Refresh
        )
    }
}

pub fn parse_shell_command(
    input: &str,
) -> Result<Option<ShellCommand>, Box<dyn std::error::Error>> {
    let args = shlex::split(input).ok_or("Invalid quoting")?;

    match ShellCommand::try_parse_from(args) {
        Ok(c) => Ok(Some(c)),
        Err(e) => {
            if e.kind() == ErrorKind::DisplayHelp || e.kind() == ErrorKind::DisplayVersion {
                println!("{}", e);
                return Ok(None);
            }
            Err(Box::new(e))
        }
    }
}

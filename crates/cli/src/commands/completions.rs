//! completions command - Print a shell completion script

use clap::CommandFactory;
use clap_complete::Shell;

use super::Cli;
use crate::exit_code::ExitCode;

/// Arguments for the completions command
#[derive(clap::Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Generate shell completions and print to stdout
pub fn execute(args: CompletionsArgs) -> ExitCode {
    render(args.shell, &mut std::io::stdout());
    ExitCode::Success
}

fn render(shell: Shell, out: &mut dyn std::io::Write) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(shell: Shell) -> String {
        let mut buf = Vec::new();
        render(shell, &mut buf);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_completions_cover_subcommands() {
        let bash = script(Shell::Bash);
        assert!(bash.contains("fs3"));
        for sub in ["upload", "dir", "download", "delete", "list", "config"] {
            assert!(bash.contains(sub), "missing {sub}");
        }
    }

    #[test]
    fn test_completions_shell_specific_markers() {
        assert!(script(Shell::Zsh).contains("compdef"));
        assert!(script(Shell::Fish).contains("complete"));
        assert!(script(Shell::PowerShell).contains("Register-ArgumentCompleter"));
    }
}

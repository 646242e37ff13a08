use clap::{ArgAction, CommandFactory, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "termdeck")]
#[command(author, version, about)]
#[command(long_about = "Present markdown slides in the terminal.\n\n\
    Slides are separated by a line containing only `----`. Each slide may\n\
    start with a `---` front matter block setting its style and transition.\n\n\
    Examples:\n  \
    termdeck talk.md                 Present talk.md\n  \
    termdeck talk.md -w              Reload whenever talk.md changes\n  \
    termdeck talk.md -c deck.yaml    Use a specific config file")]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Markdown file to present
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Reload the presentation when the file or config changes
    #[arg(short, long)]
    pub watch: bool,

    /// Path to the config file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write log records to this file
    #[arg(long, value_name = "FILE", global = true)]
    pub log: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate shell completions
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show version information
    Version,
}

#[derive(Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

impl From<Shell> for clap_complete::Shell {
    fn from(shell: Shell) -> Self {
        match shell {
            Shell::Bash => Self::Bash,
            Shell::Zsh => Self::Zsh,
            Shell::Fish => Self::Fish,
            Shell::Powershell => Self::PowerShell,
        }
    }
}

/// Only markdown files can be presented.
pub fn check_extension(file: &Path) -> anyhow::Result<()> {
    if file.extension().and_then(|e| e.to_str()) != Some("md") {
        anyhow::bail!("expected markdown file got: {}", file.display());
    }
    Ok(())
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        match self.command {
            Some(Commands::Completion { shell }) => {
                let mut cmd = Self::command();
                clap_complete::generate(
                    clap_complete::Shell::from(shell),
                    &mut cmd,
                    "termdeck",
                    &mut std::io::stdout(),
                );
                Ok(())
            }
            Some(Commands::Version) => {
                println!("termdeck {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
            None => {
                let Some(file) = self.file else {
                    let mut cmd = Self::command();
                    cmd.print_help()?;
                    println!();
                    return Ok(());
                };
                check_extension(&file)?;
                if !file.exists() {
                    anyhow::bail!("File not found: {}", file.display());
                }
                let options = crate::app::Options {
                    watch: self.watch,
                    config: self.config,
                };
                crate::app::run(&file, &options)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from(["termdeck", "talk.md", "-w", "-c", "deck.yaml", "-vv"]).unwrap();
        assert_eq!(cli.file.as_deref(), Some(Path::new("talk.md")));
        assert!(cli.watch);
        assert_eq!(cli.config.as_deref(), Some(Path::new("deck.yaml")));
        assert_eq!(cli.verbose, 2);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["termdeck", "version"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Version)));

        let cli = Cli::try_parse_from(["termdeck", "completion", "zsh"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Completion { shell: Shell::Zsh })
        ));
    }

    #[test]
    fn test_requires_markdown_extension() {
        assert!(check_extension(Path::new("slides.md")).is_ok());
        let err = check_extension(Path::new("slides.txt")).unwrap_err();
        assert_eq!(err.to_string(), "expected markdown file got: slides.txt");
        assert!(check_extension(Path::new("slides")).is_err());
    }
}

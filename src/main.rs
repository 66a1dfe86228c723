use std::process;
use std::str::FromStr;

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};

use gbm_release::config::Config;
use gbm_release::console::Console;
use gbm_release::gh::GhClient;
use gbm_release::release::{self, aztec, integrate::Platform, Build};
use gbm_release::render;
use gbm_release::version::Version;
use gbm_release::workspace::Workspace;

#[derive(Parser)]
#[command(
    name = "gbm-release",
    version,
    about = "Release automation for the mobile editor and its host apps"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Stream subprocess output instead of capturing it
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress progress output
    #[arg(long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Drive a gutenberg-mobile release
    Release {
        #[command(subcommand)]
        command: ReleaseCommand,
    },
    /// Render release collateral
    Render {
        #[command(subcommand)]
        command: RenderCommand,
    },
}

#[derive(Subcommand)]
enum ReleaseCommand {
    /// Cut the release branches and open the release PRs
    Prepare {
        #[arg(value_enum)]
        target: PrepareTarget,
        version: String,
        /// Keep the temp workspace around for inspection
        #[arg(long)]
        keep: bool,
        /// Do not push the rnmobile tag when preparing the editor
        #[arg(long)]
        no_tag: bool,
        /// PRs to cherry-pick onto a patch release branch
        #[arg(long, value_delimiter = ',')]
        prs: Vec<u64>,
    },
    /// Open the app integration PRs for a published release
    Integrate {
        version: String,
        #[arg(long)]
        android: bool,
        #[arg(long)]
        ios: bool,
        #[arg(long)]
        keep: bool,
    },
    /// Show where each part of the release stands
    Status { version: String },
    /// Create the GitHub release and tag the editor
    Publish {
        version: String,
        /// Ignore CI check results
        #[arg(long)]
        skip_checks: bool,
        /// Ignore one named check (repeatable)
        #[arg(long = "skip-check")]
        skip_check: Vec<String>,
    },
}

#[derive(Subcommand)]
enum RenderCommand {
    /// Render the release checklist
    Checklist {
        #[arg(long)]
        version: String,
        /// The host app version shipping this editor release
        #[arg(long)]
        host_version: Option<String>,
        /// Release cut date, defaults to the next Thursday
        #[arg(long)]
        date: Option<String>,
        /// Extra note appended to the checklist
        #[arg(long)]
        message: Option<String>,
        /// Copy to the clipboard instead of printing
        #[arg(long)]
        clipboard: bool,
    },
    /// Render the steps for upgrading Aztec
    Aztec {
        /// Copy to the clipboard instead of printing
        #[arg(long)]
        clipboard: bool,
    },
}

fn main() {
    if let Err(err) = run(Cli::parse()) {
        Console::new(false).error(&format!("{:#}", err));
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env()?;
    config.verbose = cli.verbose;
    let mut console = Console::new(config.assume_yes);
    console.quiet = cli.quiet;

    match cli.command {
        Command::Release { command } => run_release(command, config, console),
        Command::Render { command } => run_render(command, config, console),
    }
}

fn run_release(command: ReleaseCommand, config: Config, console: Console) -> Result<()> {
    match command {
        ReleaseCommand::Prepare {
            target,
            version,
            keep,
            no_tag,
            prs,
        } => {
            let build = Build {
                version: Version::from_str(&version)?,
                use_tag: !no_tag,
                prs,
            };
            let mut remote = GhClient::new(config.clone())?;
            let mut workspace = Workspace::new(config.no_workspace)?;

            check_aztec(&config, &console)?;

            match target {
                PrepareTarget::Editor => {
                    release::editor::create_editor_pr(
                        &mut remote,
                        &config,
                        &console,
                        &workspace,
                        &build,
                    )?;
                }
                PrepareTarget::Wrapper => {
                    let editor_pr =
                        release::find_editor_release_pr(&remote, &config, &build.version)?
                            .ok_or_else(|| {
                                anyhow::anyhow!(
                                    "no editor release PR for {}, prepare the editor first",
                                    build.version
                                )
                            })?;
                    release::wrapper::create_wrapper_pr(
                        &mut remote,
                        &config,
                        &console,
                        &workspace,
                        &build,
                        &editor_pr,
                    )?;
                }
                PrepareTarget::All => {
                    let editor_pr = release::editor::create_editor_pr(
                        &mut remote,
                        &config,
                        &console,
                        &workspace,
                        &build,
                    )?;
                    let wrapper_pr = release::wrapper::create_wrapper_pr(
                        &mut remote,
                        &config,
                        &console,
                        &workspace,
                        &build,
                        &editor_pr,
                    )?;
                    release::editor::link_wrapper_pr(
                        &mut remote,
                        &build,
                        &editor_pr,
                        &wrapper_pr.html_url,
                    )?;
                }
            }
            finish_workspace(&console, &mut workspace, keep);
            Ok(())
        }
        ReleaseCommand::Integrate {
            version,
            android,
            ios,
            keep,
        } => {
            let version = Version::from_str(&version)?;
            let mut remote = GhClient::new(config.clone())?;
            let mut workspace = Workspace::new(config.no_workspace)?;

            // no flag means both platforms
            let both = android == ios;
            if android || both {
                release::integrate::create_integration_pr(
                    &mut remote,
                    &config,
                    &console,
                    &workspace,
                    &version,
                    Platform::Android,
                )?;
            }
            if ios || both {
                release::integrate::create_integration_pr(
                    &mut remote,
                    &config,
                    &console,
                    &workspace,
                    &version,
                    Platform::Ios,
                )?;
            }
            finish_workspace(&console, &mut workspace, keep);
            Ok(())
        }
        ReleaseCommand::Status { version } => {
            let version = Version::from_str(&version)?;
            let remote = GhClient::new(config.clone())?;
            release::status::release_status(&remote, &config, &console, &version)?;
            Ok(())
        }
        ReleaseCommand::Publish {
            version,
            skip_checks,
            skip_check,
        } => {
            let version = Version::from_str(&version)?;
            let mut remote = GhClient::new(config.clone())?;
            let workspace = Workspace::new(config.no_workspace)?;
            release::publish::publish_release(
                &mut remote,
                &config,
                &console,
                &workspace,
                &version,
                skip_checks,
                &skip_check,
            )?;
            Ok(())
        }
    }
}

fn run_render(command: RenderCommand, _config: Config, console: Console) -> Result<()> {
    match command {
        RenderCommand::Checklist {
            version,
            host_version,
            date,
            message,
            clipboard,
        } => {
            let version = Version::from_str(&version)?;
            let date = match date {
                Some(date) => date,
                None => render::next_release_date(Local::now().date_naive()).to_string(),
            };
            let text = render::checklist(
                &version,
                host_version.as_deref(),
                &date,
                message.as_deref(),
            );
            if clipboard {
                console.clipboard_or_print(&text);
            } else {
                console.out(&text);
            }
            Ok(())
        }
        RenderCommand::Aztec { clipboard } => {
            let text = render::aztec_steps();
            if clipboard {
                console.clipboard_or_print(&text);
            } else {
                console.out(&text);
            }
            Ok(())
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PrepareTarget {
    Editor,
    Wrapper,
    All,
}

/// Release branches must not ship an unstable Aztec pin.
fn check_aztec(config: &Config, console: &Console) -> Result<()> {
    console.info("Validating the Aztec versions");
    match aztec::validate_aztec_versions(config, None, "trunk") {
        Ok((android, ios)) => {
            for result in [&android, &ios] {
                if !result.valid {
                    console.warn(&format!(
                        "{} Aztec pin {} is not a stable release",
                        result.platform, result.version
                    ));
                }
            }
            if (!android.valid || !ios.valid)
                && !console.confirm("Aztec is not stable, continue anyway?")?
            {
                anyhow::bail!("release cancelled, stabilize Aztec first");
            }
        }
        Err(e) => console.warn(&format!("could not validate Aztec versions: {}", e)),
    }
    Ok(())
}

fn finish_workspace(console: &Console, workspace: &mut Workspace, keep: bool) {
    if keep {
        let path = workspace.keep();
        console.info(&format!("Workspace kept at {}", path.display()));
    }
}

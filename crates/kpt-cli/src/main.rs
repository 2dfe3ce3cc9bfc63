use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use kpt_core::{PatchStatus, Session};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(name = "kpt", version, about = "Toggle options in KoboPatch files")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the options in one or more patch files
    List {
        #[arg(required = true, help = "Patch files to inspect")]
        files: Vec<PathBuf>,

        #[arg(short, long, help = "Include per-option help text")]
        verbose: bool,
    },

    /// Enable one option by name, then write the files back
    Enable {
        #[arg(help = "Option name as shown by `kpt list`")]
        name: String,

        #[arg(short, long, required = true, num_args = 1.., help = "Patch files to edit")]
        files: Vec<PathBuf>,

        #[arg(long, help = "Show what would change without writing")]
        dry_run: bool,

        #[arg(short = 'y', long, help = "Write without asking for confirmation")]
        yes: bool,
    },

    /// Disable one option by name, then write the files back
    Disable {
        #[arg(help = "Option name as shown by `kpt list`")]
        name: String,

        #[arg(short, long, required = true, num_args = 1.., help = "Patch files to edit")]
        files: Vec<PathBuf>,

        #[arg(long, help = "Show what would change without writing")]
        dry_run: bool,

        #[arg(short = 'y', long, help = "Write without asking for confirmation")]
        yes: bool,
    },

    /// Disable every option in the given files, then write them back
    DisableAll {
        #[arg(required = true, help = "Patch files to edit")]
        files: Vec<PathBuf>,

        #[arg(long, help = "Show what would change without writing")]
        dry_run: bool,

        #[arg(short = 'y', long, help = "Write without asking for confirmation")]
        yes: bool,
    },
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Command::List { files, verbose } => {
            let session = Session::load(&files)?;
            print_options(&session, verbose);
            Ok(())
        }
        Command::Enable {
            name,
            files,
            dry_run,
            yes,
        } => set_by_name(&files, &name, PatchStatus::Enabled, dry_run, yes),
        Command::Disable {
            name,
            files,
            dry_run,
            yes,
        } => set_by_name(&files, &name, PatchStatus::Disabled, dry_run, yes),
        Command::DisableAll {
            files,
            dry_run,
            yes,
        } => {
            let mut session = Session::load(&files)?;
            session.disable_all();
            confirm_and_apply(&session, dry_run, yes)
        }
    }
}

fn set_by_name(
    files: &[PathBuf],
    name: &str,
    status: PatchStatus,
    dry_run: bool,
    yes: bool,
) -> Result<()> {
    let mut session = Session::load(files)?;

    let mut matched = false;
    for path in files {
        matched |= session.set_status_by_name(path, name, status);
    }
    if !matched {
        bail!("No option named '{}' in the given files", name);
    }

    confirm_and_apply(&session, dry_run, yes)
}

fn confirm_and_apply(session: &Session, dry_run: bool, yes: bool) -> Result<()> {
    let modified = session.modified_files();
    if modified.is_empty() {
        println!("Nothing to change.");
        return Ok(());
    }

    for file in &modified {
        println!("{}:", file.path.display());
        for option in file
            .options
            .iter()
            .filter(|opt| opt.differs_from_source(&file.text))
        {
            let state = if option.status.is_enabled() {
                "enabled"
            } else {
                "disabled"
            };
            println!("  {} -> {}", option.name, state);
        }
    }

    if dry_run {
        println!("Dry run, nothing written.");
        return Ok(());
    }

    if !yes && !confirm()? {
        println!("Aborted, nothing written.");
        return Ok(());
    }

    let written = session.apply()?;
    println!("Wrote {} file(s).", written.len());
    Ok(())
}

fn confirm() -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        bail!("Refusing to write without confirmation; re-run with --yes or from a terminal");
    }

    print!("Write the changes to the patch files? [y/N] ");
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut answer = String::new();
    io::stdin()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn print_options(session: &Session, verbose: bool) {
    for file in session.files() {
        println!("{}:", file.path.display());
        for option in &file.options {
            let mark = if option.status.is_enabled() { "x" } else { " " };
            match &option.group {
                Some(group) => println!("  [{}] {} ({})", mark, option.name, group),
                None => println!("  [{}] {}", mark, option.name),
            }
            if verbose && !option.help_text.is_empty() {
                for line in option.help_text.lines() {
                    println!("      {}", line);
                }
            }
        }
    }
}

//! Code related to the example models and the CLI commands for interacting with them.
use super::{RunOpts, handle_run_command};
use crate::settings::Settings;
use anyhow::{Context, Result, bail, ensure};
use clap::Subcommand;
use include_dir::{Dir, DirEntry, include_dir};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// The directory containing the example models.
const MODELS_DIR: Dir = include_dir!("models");

/// The available subcommands for managing example models.
#[derive(Subcommand)]
pub enum ExampleSubcommands {
    /// List available examples.
    List,
    /// Provide information about the specified example.
    Info {
        /// The name of the example.
        name: String,
    },
    /// Extract an example model configuration to a new directory.
    Extract {
        /// The name of the example to extract.
        name: String,
        /// The destination folder for the example.
        new_path: Option<PathBuf>,
    },
    /// Run an example.
    Run {
        /// The name of the example to run.
        name: String,
        /// Directory for output files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

impl ExampleSubcommands {
    /// Execute the supplied example subcommand
    pub fn execute(self) -> Result<()> {
        match self {
            Self::List => handle_example_list_command(),
            Self::Info { name } => handle_example_info_command(&name)?,
            Self::Extract {
                name,
                new_path: dest,
            } => handle_example_extract_command(&name, dest.as_deref())?,
            Self::Run { name, output_dir } => {
                handle_example_run_command(&name, output_dir.as_deref())?;
            }
        }

        Ok(())
    }
}

/// Handle the `example list` command.
fn handle_example_list_command() {
    for entry in MODELS_DIR.dirs() {
        println!("{}", entry.path().display());
    }
}

/// Handle the `example info` command.
fn handle_example_info_command(name: &str) -> Result<()> {
    let path: PathBuf = [name, "README.txt"].iter().collect();
    let readme = MODELS_DIR
        .get_file(path)
        .context("Example not found.")?
        .contents_utf8()
        .expect("README.txt is not UTF-8 encoded");
    println!("{readme}");

    Ok(())
}

/// Handle the `example extract` command.
fn handle_example_extract_command(name: &str, new_path: Option<&Path>) -> Result<()> {
    let new_path = new_path.unwrap_or(Path::new(name));
    ensure!(
        !new_path.exists(),
        "Destination {} already exists",
        new_path.display()
    );
    fs::create_dir_all(new_path)?;
    extract_example(name, new_path)
}

/// Handle the `example run` command.
pub fn handle_example_run_command(name: &str, output_dir: Option<&Path>) -> Result<()> {
    let temp_dir = TempDir::new().context("Failed to create temporary directory.")?;
    extract_example(name, temp_dir.path())?;

    let settings = Settings::from_path(temp_dir.path())?;
    let opts = RunOpts {
        output_dir: output_dir.map(Path::to_path_buf),
        overwrite: false,
    };
    handle_run_command(temp_dir.path(), &opts, Some(settings))
}

/// Copy the files of the named example into `dest`.
fn extract_example(name: &str, dest: &Path) -> Result<()> {
    let sub_dir = MODELS_DIR.get_dir(name).context("Example not found.")?;
    for entry in sub_dir.entries() {
        match entry {
            DirEntry::File(f) => {
                let file_name = f.path().file_name().unwrap();
                fs::write(dest.join(file_name), f.contents())?;
            }
            DirEntry::Dir(_) => {
                bail!("Nested directories are not supported.");
            }
        }
    }

    Ok(())
}

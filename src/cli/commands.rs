//! Command dispatch

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::ImportRequest;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, OutputFormat, Settings};
use crate::domain::{TreeDisplay, TreeView};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Import {
            context,
            name,
            file,
            format,
        }) => cmd_import(cli, context, name, file, *format),
        Some(Commands::Check { file }) => cmd_check(cli, file),
        Some(Commands::Config { command }) => cmd_config(cli, command),
        Some(Commands::Completion { shell }) => cmd_completion(*shell),
        None => Err(CliError::Usage(
            "no command given, see 'optset --help'".into(),
        )),
    }
}

fn load_container(cli: &Cli) -> CliResult<ServiceContainer> {
    let settings = Settings::load(cli.config.as_deref())?;
    debug!("settings: {:?}", settings);
    Ok(ServiceContainer::new(settings))
}

fn write_stdout(text: &str) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", text).map_err(|e| InfraError::io("write output", e))?;
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_import(
    cli: &Cli,
    context: &Option<String>,
    name: &Option<String>,
    file: &Option<PathBuf>,
    format: Option<OutputFormat>,
) -> CliResult<()> {
    let container = load_container(cli)?;
    let request = ImportRequest {
        context: context.clone(),
        name: name.clone(),
        source: file.clone(),
    };

    let outcome = container.import_service().import(&request)?;

    let rendered = match format.unwrap_or(container.settings.output.format) {
        OutputFormat::Tree => outcome.tree.to_tree_string().to_string(),
        OutputFormat::Json => TreeView::from_tree(&outcome.tree)
            .to_json()
            .map_err(InfraError::from)?,
    };
    write_stdout(rendered.trim_end())?;

    if outcome.duplicates > 0 {
        output::warning(&format!("{} duplicate rows ignored", outcome.duplicates));
    }
    output::success(&format!(
        "imported {} nodes from {} rows (tree {})",
        outcome.tree.node_count(),
        outcome.rows,
        outcome.handle.id
    ));
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_check(cli: &Cli, file: &Path) -> CliResult<()> {
    let container = load_container(cli)?;
    let prepared = container.import_service().check(file)?;
    let loaded = &prepared.loaded;

    output::header(&file.display());
    output::field("levels", &loaded.levels.iter().join(" > "));
    let reserved = if loaded.reserved.is_empty() {
        "-".to_string()
    } else {
        loaded.reserved.iter().join(", ")
    };
    output::field("reserved", &reserved);
    output::field("geographic", &loaded.is_geographic());
    output::field("rows", &loaded.rows.len());
    output::field("duplicates", &prepared.duplicates);
    Ok(())
}

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(cli.config.as_deref())?;
            write_stdout(settings.to_toml()?.trim_end())
        }
        ConfigCommands::Path => {
            let global = global_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".into());
            output::field("global", &global);
            if let Some(local) = &cli.config {
                output::field("local", &local.display());
            }
            Ok(())
        }
    }
}

fn cmd_completion(shell: Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}

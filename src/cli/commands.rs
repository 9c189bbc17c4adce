//! Command dispatch: wires parsed arguments to the application services

use std::io;
use std::path::Path;
use std::sync::Arc;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use termtree::Tree;
use tracing::debug;

use crate::application::import::{GenericExporter, ImportReport, VocabularyImporter};
use crate::application::services::TreeService;
use crate::cli::args::{Cli, Commands, ConfigCommands, FormatArg};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::Outcome;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::OutcomeStore;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Import { format, file }) => import(*format, file),
        Some(Commands::Convert {
            format,
            file,
            output,
        }) => convert(*format, file, output.as_deref()),
        Some(Commands::Tree { format, file }) => tree(*format, file),
        Some(Commands::Validate { format, file }) => validate(*format, file),
        Some(Commands::Config { command }) => config(command),
        Some(Commands::Info) => info(),
        Some(Commands::Completion { shell }) => completion(*shell),
        None => Ok(()),
    }
}

fn build_container() -> CliResult<ServiceContainer> {
    let settings = Settings::load()?;
    Ok(ServiceContainer::new(settings))
}

fn load_file(
    container: &ServiceContainer,
    format: FormatArg,
    file: &Path,
) -> CliResult<ImportReport> {
    let importer = VocabularyImporter::new(format.into(), Arc::clone(&container.tree));
    Ok(importer.process_file(file)?)
}

fn import(format: FormatArg, file: &Path) -> CliResult<()> {
    let container = build_container()?;
    let report = load_file(&container, format, file)?;
    output::success(&format!(
        "imported set '{}' ({} outcomes) from {}",
        report.set.name,
        report.outcomes_created,
        file.display()
    ));
    Ok(())
}

fn convert(format: FormatArg, file: &Path, target: Option<&Path>) -> CliResult<()> {
    let container = build_container()?;
    let report = load_file(&container, format, file)?;
    let exporter = GenericExporter::new(
        Arc::clone(&container.tree),
        container.settings.component.clone(),
    );
    let document = exporter.export_set(report.set.id)?;
    match target {
        Some(path) => {
            std::fs::write(path, &document)
                .map_err(|e| InfraError::io(format!("writing {}", path.display()), e))?;
            output::success(&format!("wrote {}", path.display()));
        }
        None => output::info(&document),
    }
    Ok(())
}

fn tree(format: FormatArg, file: &Path) -> CliResult<()> {
    let container = build_container()?;
    let report = load_file(&container, format, file)?;
    let mut root = Tree::new(format!("{} ({})", report.set.name, report.set.idnumber));
    for child in container.tree.children(report.set.id, None) {
        root.push(render_node(&container.tree, &child));
    }
    output::info(&root);
    Ok(())
}

fn render_node(tree: &TreeService, outcome: &Outcome) -> Tree<String> {
    let label = match &outcome.docnum {
        Some(docnum) => format!("{} {}", docnum, outcome.description),
        None => outcome.description.clone(),
    };
    let mut node = Tree::new(label);
    for child in tree.children(outcome.outcomeset_id, Some(outcome.id)) {
        node.push(render_node(tree, &child));
    }
    node
}

fn validate(format: FormatArg, file: &Path) -> CliResult<()> {
    let container = build_container()?;
    let report = load_file(&container, format, file)?;
    debug!("validate: imported {} outcomes", report.outcomes_created);

    // Walking every parent chain catches cycles and dangling parents.
    let mut max_depth = 0usize;
    for outcome in container.store.outcomes_in_set(report.set.id, false) {
        max_depth = max_depth.max(container.tree.depth(outcome.id)?);
    }
    let renumbered = container.tree.repair_sortorder(report.set.id)?;

    output::header(&format!("{}", file.display()));
    output::detail(&format!("set:      {}", report.set.idnumber));
    output::detail(&format!("outcomes: {}", report.outcomes_created));
    output::detail(&format!("depth:    {}", max_depth));
    if renumbered == 0 {
        output::success("sort order dense, hierarchy sound");
    } else {
        output::failure(&format!("{} outcomes needed renumbering", renumbered));
    }
    Ok(())
}

fn config(command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load()?;
            output::info(&settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Init => {
            let path = global_config_path()
                .ok_or_else(|| CliError::Usage("cannot determine config directory".into()))?;
            if path.exists() {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    path.display()
                )));
            }
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)
                    .map_err(|e| InfraError::io(format!("creating {}", dir.display()), e))?;
            }
            std::fs::write(&path, Settings::template())
                .map_err(|e| InfraError::io(format!("writing {}", path.display()), e))?;
            output::success(&format!("created {}", path.display()));
            Ok(())
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::info(&path.display()),
                None => output::warning("cannot determine config directory"),
            }
            Ok(())
        }
    }
}

fn info() -> CliResult<()> {
    let cmd = Cli::command();
    output::header("rsoutcome");
    if let Some(version) = cmd.get_version() {
        output::detail(&format!("version: {}", version));
    }
    match global_config_path() {
        Some(path) if path.exists() => output::detail(&format!("config:  {}", path.display())),
        Some(path) => output::detail(&format!("config:  {} (not created)", path.display())),
        None => output::detail("config:  unavailable"),
    }
    output::detail("formats: generic, ab, asn");
    Ok(())
}

fn completion(shell: Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}

//! Command dispatch

use std::io;
use std::path::Path;

use clap::CommandFactory;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, EditorSession, IoResultExt};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::{output, render};
use crate::config::{global_config_path, Settings};
use crate::domain::{MapId, NodeId, NodePatch, Position};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Ok(());
    };

    match command {
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "mindtree", &mut io::stdout());
            return Ok(());
        }
        Commands::Config { command } => return config_command(cli, command),
        _ => {}
    }

    let container = build_container(cli)?;
    match command {
        Commands::New { name } => new_map(&container, name),
        Commands::List => list_maps(&container),
        Commands::Show { map, ids } => show_map(&container, map, *ids),
        Commands::Add { map, parent, text } => add_child(&container, map, parent, text),
        Commands::Sibling { map, node, text } => add_sibling(&container, map, node, text),
        Commands::Rm { map, node } => remove_node(&container, map, node),
        Commands::Mv { map, node, parent } => move_node(&container, map, node, parent),
        Commands::Edit {
            map,
            node,
            text,
            x,
            y,
            collapse,
            expand,
        } => {
            let mut patch = NodePatch::default();
            if let Some(text) = text {
                patch = patch.text(text.clone());
            }
            if let (Some(x), Some(y)) = (x, y) {
                patch = patch.position(Position::new(*x, *y));
            }
            if *collapse || *expand {
                patch = patch.collapsed(*collapse);
            }
            edit_node(&container, map, node, patch)
        }
        Commands::Rename { map, name } => rename_map(&container, map, name),
        Commands::Duplicate { map } => {
            let found = container.maps.find(map)?;
            let copy = container.maps.duplicate(&found.id)?;
            output::action("Duplicated", &format!("{} ({})", copy.name, copy.id));
            Ok(())
        }
        Commands::Delete { map } => delete_map(&container, map),
        Commands::Export { map, output } => export_map(&container, map, output.as_deref()),
        Commands::Import { file, name } => import_map(&container, file, name.as_deref()),
        Commands::Config { .. } | Commands::Completion { .. } => Ok(()),
    }
}

fn build_container(cli: &Cli) -> CliResult<ServiceContainer> {
    let settings = load_settings(cli)?;
    debug!("data_dir: {}", settings.data_dir.display());
    Ok(ServiceContainer::new(settings)?)
}

fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = Settings::load()?;
    if let Some(dir) = &cli.data_dir {
        settings.override_data_dir(dir);
    }
    Ok(settings)
}

/// Run `edit` inside a session on the referenced map and save the result.
fn with_session<T>(
    container: &ServiceContainer,
    reference: &str,
    edit: impl FnOnce(&mut EditorSession) -> CliResult<T>,
) -> CliResult<T> {
    let map = container.maps.find(reference)?;
    let mut session = container.maps.open_session(&map.id).ok_or_else(|| {
        CliError::Usage(format!("map {} cannot be opened (see -d output)", map.id))
    })?;

    let result = edit(&mut session)?;
    session
        .try_flush()
        .map_err(|e| InfraError::io(format!("save map {}", map.id), e))?;
    Ok(result)
}

/// `root` addresses the root node; anything else is taken as a node id.
fn node_ref(session: &EditorSession, reference: &str) -> NodeId {
    if reference == "root" {
        session.tree().root_id().clone()
    } else {
        NodeId::new(reference)
    }
}

#[instrument(skip(container))]
fn new_map(container: &ServiceContainer, name: &str) -> CliResult<()> {
    let map = container.maps.create(name)?;
    output::action("Created", &format!("{} ({})", map.name, map.id));
    if let Some(root) = map.root() {
        output::detail(&format!("root: {}", root.id));
    }
    Ok(())
}

fn list_maps(container: &ServiceContainer) -> CliResult<()> {
    let maps = container.maps.list()?;
    if maps.is_empty() {
        output::info("No maps.");
        return Ok(());
    }
    output::header(&format!("{} maps", maps.len()));
    for map in maps {
        output::detail(&format!(
            "{}  {}  ({} nodes, updated {})",
            map.id,
            map.name,
            map.nodes.len(),
            map.updated_at.format("%Y-%m-%d %H:%M")
        ));
    }
    Ok(())
}

#[instrument(skip(container))]
fn rename_map(container: &ServiceContainer, map: &str, name: &str) -> CliResult<()> {
    with_session(container, map, |session| {
        let old = session.name().to_string();
        session.rename(name);
        output::action("Renamed", &format!("{} -> {}", old, name));
        Ok(())
    })
}

/// Unreadable maps are not listed, so an exact id still reaches them.
fn is_plain_id(map: &str) -> bool {
    !map.is_empty() && !map.contains(['/', '\\']) && map != "." && map != ".."
}

#[instrument(skip(container))]
fn delete_map(container: &ServiceContainer, map: &str) -> CliResult<()> {
    let (id, label) = match container.maps.find(map) {
        Ok(found) => {
            let label = format!("{} ({})", found.name, found.id);
            (found.id, label)
        }
        Err(ApplicationError::MapNotFound(_)) if is_plain_id(map) => {
            (MapId::new(map), map.to_string())
        }
        Err(e) => return Err(e.into()),
    };
    if !container.maps.delete(&id)? {
        return Err(ApplicationError::MapNotFound(map.to_string()).into());
    }
    output::action("Deleted", &label);
    Ok(())
}

#[instrument(skip(container))]
fn show_map(container: &ServiceContainer, reference: &str, ids: bool) -> CliResult<()> {
    with_session(container, reference, |session| {
        output::header(&format!("{} ({})", session.name(), session.id()));
        let tree = render::to_tree_string(session.tree(), session.palette(), ids);
        output::info(&tree);
        Ok(())
    })
}

#[instrument(skip(container))]
fn add_child(container: &ServiceContainer, map: &str, parent: &str, text: &str) -> CliResult<()> {
    with_session(container, map, |session| {
        let parent = node_ref(session, parent);
        let id = session
            .create_child(&parent, text)
            .ok_or_else(|| CliError::Usage(format!("unknown parent node: {}", parent)))?;
        output::info(&id);
        Ok(())
    })
}

#[instrument(skip(container))]
fn add_sibling(container: &ServiceContainer, map: &str, node: &str, text: &str) -> CliResult<()> {
    with_session(container, map, |session| {
        let node = node_ref(session, node);
        let id = session
            .create_sibling(&node, text)
            .ok_or_else(|| CliError::Usage(format!("unknown node: {}", node)))?;
        output::info(&id);
        Ok(())
    })
}

#[instrument(skip(container))]
fn remove_node(container: &ServiceContainer, map: &str, node: &str) -> CliResult<()> {
    with_session(container, map, |session| {
        let node = node_ref(session, node);
        if node == *session.tree().root_id() {
            return Err(CliError::Usage("the root node cannot be deleted".to_string()));
        }
        let removed = session.delete_subtree(&node);
        if removed.is_empty() {
            return Err(CliError::Usage(format!("unknown node: {}", node)));
        }
        output::success(&format!("removed {} node(s)", removed.len()));
        Ok(())
    })
}

#[instrument(skip(container))]
fn move_node(container: &ServiceContainer, map: &str, node: &str, parent: &str) -> CliResult<()> {
    with_session(container, map, |session| {
        let node = node_ref(session, node);
        let parent = node_ref(session, parent);
        if !session.reparent(&node, &parent) {
            return Err(CliError::Usage(format!(
                "cannot move {} under {}: unknown node or target inside its subtree",
                node, parent
            )));
        }
        output::success(&format!("moved {} under {}", node, parent));
        Ok(())
    })
}

#[instrument(skip(container))]
fn edit_node(container: &ServiceContainer, map: &str, node: &str, patch: NodePatch) -> CliResult<()> {
    if patch.is_empty() {
        return Err(CliError::InvalidArgs(
            "nothing to change: use --text, --x/--y, --collapse or --expand".to_string(),
        ));
    }
    with_session(container, map, |session| {
        let node = node_ref(session, node);
        if !session.update_node(&node, patch) {
            return Err(CliError::Usage(format!("unknown node: {}", node)));
        }
        output::success(&format!("updated {}", node));
        Ok(())
    })
}

#[instrument(skip(container))]
fn export_map(container: &ServiceContainer, map: &str, target: Option<&Path>) -> CliResult<()> {
    let found = container.maps.find(map)?;
    let json = container.maps.export_json(&found.id)?;
    match target {
        Some(path) => {
            container
                .fs
                .write(path, &json)
                .with_path_context("write export", path)?;
            output::action("Exported", &path.display());
        }
        None => output::info(&json),
    }
    Ok(())
}

#[instrument(skip(container))]
fn import_map(container: &ServiceContainer, file: &Path, name: Option<&str>) -> CliResult<()> {
    let json = container
        .fs
        .read_to_string(file)
        .with_path_context("read import", file)?;
    let map = container.maps.import_json(&json, name)?;
    output::action(
        "Imported",
        &format!("{} ({}, {} nodes)", map.name, map.id, map.nodes.len()),
    );
    Ok(())
}

fn config_command(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(&settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("Global config", &path.display()),
                None => output::warning("no config directory on this platform"),
            }
            let settings = load_settings(cli)?;
            output::action("Data dir", &settings.data_dir.display());
            Ok(())
        }
        ConfigCommands::Init { force } => {
            let path = global_config_path().ok_or_else(|| {
                CliError::Usage("no config directory on this platform".to_string())
            })?;
            let fs = RealFileSystem;
            if fs.exists(&path) && !force {
                return Err(CliError::Usage(format!(
                    "{} exists, use --force to overwrite",
                    path.display()
                )));
            }
            fs.ensure_parent(&path)
                .and_then(|_| fs.write(&path, &Settings::template()))
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::action("Created", &path.display());
            Ok(())
        }
    }
}

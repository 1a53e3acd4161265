//! Command implementations for cfgdiff CLI

use crate::cli::{Commands, OutputFormat};
use crate::compare::TableScope;
use crate::config::WorkspaceConfig;
use crate::duckdb_store::DuckDbStore;
use crate::error::{CfgdiffError, Result};
use crate::output::{JsonFormatter, PrettyPrinter};
use crate::resolver::UploadSelector;
use crate::service::SnapshotService;
use crate::workspace::CfgdiffWorkspace;
use std::fs;
use std::path::Path;

/// Execute a command
pub fn execute_command(command: Commands, workspace_path: Option<&Path>) -> Result<()> {
    match command {
        Commands::Init { force } => init_command(workspace_path, force),
        Commands::Ingest {
            file,
            owner,
            batch_size,
            keep_raw_lines,
            quiet,
        } => ingest_command(
            workspace_path,
            &file,
            owner.as_deref(),
            batch_size,
            keep_raw_lines,
            quiet,
        ),
        Commands::Compare {
            left,
            right,
            table,
            format,
            output,
            save,
        } => compare_command(
            workspace_path,
            &left,
            &right,
            &table,
            &format,
            output.as_deref(),
            save,
        ),
        Commands::Delete { upload, format } => delete_command(workspace_path, &upload, &format),
        Commands::List { format } => list_command(workspace_path, &format),
        Commands::Show { upload, format } => show_command(workspace_path, &upload, &format),
        Commands::Tables { format } => tables_command(workspace_path, &format),
        Commands::Stats { format } => stats_command(workspace_path, &format),
    }
}

fn parse_format(format: &str) -> Result<OutputFormat> {
    OutputFormat::parse(format).map_err(CfgdiffError::invalid_input)
}

/// Open the workspace found from `workspace_path` with its store and config
fn open_service(workspace_path: Option<&Path>) -> Result<(CfgdiffWorkspace, SnapshotService<DuckDbStore>)> {
    let workspace = CfgdiffWorkspace::find_or_create(workspace_path)?;
    let config = workspace.load_config()?;
    let store = workspace.open_store()?;
    let service = SnapshotService::new(store, config)?;
    Ok((workspace, service))
}

/// Initialize cfgdiff workspace
fn init_command(workspace_path: Option<&Path>, force: bool) -> Result<()> {
    let current_dir = std::env::current_dir()?;
    let root = workspace_path.unwrap_or(&current_dir);

    // Always initialize in the given directory, never in a parent
    let workspace = CfgdiffWorkspace::create_new(root.to_path_buf())?;
    if force {
        workspace.create_config(true)?;
    }
    // Create the store file up front
    workspace.open_store()?;

    println!("✅ Initialized cfgdiff workspace at: {}", workspace.root.display());
    println!("📁 Workspace directory: {}", workspace.cfgdiff_dir.display());

    Ok(())
}

/// Ingest an export file
fn ingest_command(
    workspace_path: Option<&Path>,
    file: &Path,
    owner: Option<&str>,
    batch_size: Option<usize>,
    keep_raw_lines: bool,
    quiet: bool,
) -> Result<()> {
    if !file.exists() {
        return Err(CfgdiffError::invalid_input(format!(
            "Input file does not exist: {}",
            file.display()
        )));
    }

    let (_, mut service) = open_service(workspace_path)?;
    let mut options = service.ingest_options();
    if let Some(batch_size) = batch_size {
        options.batch_size = batch_size;
    }
    options.keep_raw_lines |= keep_raw_lines;
    options.show_progress = !quiet;

    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.display().to_string());
    let content = fs::read(file)?;

    let summary = service.ingest_with(&content, &file_name, owner, options)?;
    PrettyPrinter::print_ingest_summary(&summary, &file_name);

    Ok(())
}

/// Compare two uploads
fn compare_command(
    workspace_path: Option<&Path>,
    left: &str,
    right: &str,
    table: &str,
    format: &str,
    output_path: Option<&Path>,
    save: bool,
) -> Result<()> {
    let output_format = parse_format(format)?;
    let left: UploadSelector = left.parse()?;
    let right: UploadSelector = right.parse()?;
    let scope: TableScope = table.parse()?;

    let (workspace, service) = open_service(workspace_path)?;
    let report = service.compare(&left, &right, scope)?;

    match output_format {
        OutputFormat::Pretty => PrettyPrinter::print_comparison_report(&report),
        OutputFormat::Json => println!("{}", JsonFormatter::format(&report)?),
    }

    if save || output_path.is_some() {
        let path = match output_path {
            Some(path) => path.to_path_buf(),
            None => {
                fs::create_dir_all(&workspace.reports_dir)?;
                workspace.report_path(&left.to_string(), &right.to_string())
            }
        };
        fs::write(&path, JsonFormatter::format(&report)?)?;
        println!("💾 Report saved to: {}", path.display());
    }

    Ok(())
}

/// Delete an upload
fn delete_command(workspace_path: Option<&Path>, upload: &str, format: &str) -> Result<()> {
    let output_format = parse_format(format)?;
    let selector: UploadSelector = upload.parse()?;

    let (_, mut service) = open_service(workspace_path)?;
    let summary = service.delete(&selector)?;

    match output_format {
        OutputFormat::Pretty => PrettyPrinter::print_delete_summary(&summary),
        OutputFormat::Json => println!("{}", JsonFormatter::format(&summary)?),
    }
    Ok(())
}

/// List upload history
fn list_command(workspace_path: Option<&Path>, format: &str) -> Result<()> {
    let output_format = parse_format(format)?;
    let (_, service) = open_service(workspace_path)?;
    let uploads = service.list()?;

    match output_format {
        OutputFormat::Pretty => PrettyPrinter::print_upload_list(&uploads),
        OutputFormat::Json => println!("{}", JsonFormatter::format(&uploads)?),
    }
    Ok(())
}

/// Show one upload
fn show_command(workspace_path: Option<&Path>, upload: &str, format: &str) -> Result<()> {
    let output_format = parse_format(format)?;
    let selector: UploadSelector = upload.parse()?;
    let (_, service) = open_service(workspace_path)?;
    let upload = service.show(&selector)?;

    match output_format {
        OutputFormat::Pretty => PrettyPrinter::print_upload(&upload),
        OutputFormat::Json => println!("{}", JsonFormatter::format(&upload)?),
    }
    Ok(())
}

/// List supported tables; works without a store
fn tables_command(workspace_path: Option<&Path>, format: &str) -> Result<()> {
    let output_format = parse_format(format)?;
    let current_dir = std::env::current_dir()?;
    let start = workspace_path.unwrap_or(&current_dir);

    let config = match CfgdiffWorkspace::find_existing(start)? {
        Some(workspace) => workspace.load_config()?,
        None => WorkspaceConfig::default(),
    };
    let registry = config.registry()?;

    match output_format {
        OutputFormat::Pretty => PrettyPrinter::print_tables(&registry),
        OutputFormat::Json => println!("{}", JsonFormatter::format_tables(&registry)?),
    }
    Ok(())
}

/// Show workspace statistics
fn stats_command(workspace_path: Option<&Path>, format: &str) -> Result<()> {
    let output_format = parse_format(format)?;
    let workspace = CfgdiffWorkspace::find_or_create(workspace_path)?;
    let stats = workspace.stats()?;

    match output_format {
        OutputFormat::Pretty => PrettyPrinter::print_workspace_stats(&stats),
        OutputFormat::Json => println!("{}", JsonFormatter::format_workspace_stats(&stats)?),
    }
    Ok(())
}

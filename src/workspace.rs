//! Workspace management for cfgdiff operations

use crate::config::WorkspaceConfig;
use crate::duckdb_store::DuckDbStore;
use crate::error::{CfgdiffError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const WORKSPACE_DIR: &str = ".cfgdiff";
const STORE_FILE: &str = "store.duckdb";
const CONFIG_FILE: &str = "config.json";

/// Manages the .cfgdiff workspace directory
#[derive(Debug, Clone)]
pub struct CfgdiffWorkspace {
    /// Project root directory (where .cfgdiff/ lives)
    pub root: PathBuf,
    /// .cfgdiff/ directory path
    pub cfgdiff_dir: PathBuf,
    /// .cfgdiff/reports/ directory path
    pub reports_dir: PathBuf,
}

impl CfgdiffWorkspace {
    /// Find existing workspace or create a new one
    pub fn find_or_create(start_dir: Option<&Path>) -> Result<Self> {
        let current_dir = std::env::current_dir()?;
        let start = start_dir.unwrap_or(&current_dir);

        if let Some(workspace) = Self::find_existing(start)? {
            return Ok(workspace);
        }

        Self::create_new(start.to_path_buf())
    }

    /// Find existing .cfgdiff workspace by walking up directory tree
    pub fn find_existing(start_dir: &Path) -> Result<Option<Self>> {
        let mut current = start_dir;

        loop {
            let cfgdiff_dir = current.join(WORKSPACE_DIR);
            if cfgdiff_dir.is_dir() {
                return Ok(Some(Self::from_root(current.to_path_buf())));
            }

            // A git checkout marks the project root
            if current.join(".git").exists() {
                break;
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Ok(None)
    }

    /// Create a new workspace in the specified root directory
    pub fn create_new(root: PathBuf) -> Result<Self> {
        let workspace = Self::from_root(root);

        fs::create_dir_all(&workspace.cfgdiff_dir)?;
        fs::create_dir_all(&workspace.reports_dir)?;
        workspace.create_config(false)?;
        workspace.ensure_gitignore()?;

        log::info!("Created cfgdiff workspace at: {}", workspace.root.display());
        Ok(workspace)
    }

    /// Create workspace from root directory path
    pub fn from_root(root: PathBuf) -> Self {
        let cfgdiff_dir = root.join(WORKSPACE_DIR);
        let reports_dir = cfgdiff_dir.join("reports");

        Self {
            root,
            cfgdiff_dir,
            reports_dir,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.cfgdiff_dir.join(CONFIG_FILE)
    }

    pub fn store_path(&self) -> PathBuf {
        self.cfgdiff_dir.join(STORE_FILE)
    }

    /// Path for a saved comparison report
    pub fn report_path(&self, left: &str, right: &str) -> PathBuf {
        self.reports_dir
            .join(format!("{}-{}.json", sanitize(left), sanitize(right)))
    }

    pub fn load_config(&self) -> Result<WorkspaceConfig> {
        WorkspaceConfig::load(&self.config_path())
    }

    pub fn open_store(&self) -> Result<DuckDbStore> {
        if !self.cfgdiff_dir.is_dir() {
            return Err(CfgdiffError::workspace(format!(
                "No workspace at {}; run `cfgdiff init` first",
                self.root.display()
            )));
        }
        DuckDbStore::open(&self.store_path())
    }

    /// Write the default configuration file, keeping an existing one unless forced
    pub fn create_config(&self, force: bool) -> Result<()> {
        let config_path = self.config_path();

        if config_path.exists() && !force {
            return Ok(());
        }

        let config = WorkspaceConfig {
            created: Some(chrono::Utc::now()),
            ..Default::default()
        };
        config.save(&config_path)
    }

    /// Ensure .gitignore keeps the store out of version control
    pub fn ensure_gitignore(&self) -> Result<()> {
        let gitignore_path = self.root.join(".gitignore");
        let entry = format!("{}/{}", WORKSPACE_DIR, STORE_FILE);
        let block = format!("# Ignore the cfgdiff snapshot store\n{}*\n", entry);

        if gitignore_path.exists() {
            let content = fs::read_to_string(&gitignore_path)?;
            if !content.contains(&entry) {
                let new_content = if content.ends_with('\n') {
                    format!("{}\n{}", content, block)
                } else {
                    format!("{}\n\n{}", content, block)
                };
                fs::write(gitignore_path, new_content)?;
                log::info!("Updated .gitignore with cfgdiff entries");
            }
        } else {
            fs::write(gitignore_path, block)?;
            log::info!("Created .gitignore with cfgdiff entries");
        }

        Ok(())
    }

    /// Get workspace statistics
    pub fn stats(&self) -> Result<WorkspaceStats> {
        let store_size = fs::metadata(self.store_path()).map(|m| m.len()).unwrap_or(0);

        let mut report_count = 0;
        let mut total_report_size = 0u64;
        if self.reports_dir.exists() {
            for entry in WalkDir::new(&self.reports_dir) {
                let entry = entry?;
                if entry.file_type().is_file() {
                    report_count += 1;
                    total_report_size += entry.metadata()?.len();
                }
            }
        }

        Ok(WorkspaceStats {
            store_size,
            report_count,
            total_report_size,
        })
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Statistics about the workspace
#[derive(Debug, Default)]
pub struct WorkspaceStats {
    pub store_size: u64,
    pub report_count: usize,
    pub total_report_size: u64,
}

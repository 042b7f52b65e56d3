use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid engine name '{0}': must be non-empty and contain no path separators")]
    InvalidName(String),
}

pub const DEFAULT_ENGINE_NAME: &str = "gmx";
pub const DEFAULT_GMX_EXECUTABLE: &str = "gmx";
pub const DEFAULT_TPR_FILE: &str = "topol.tpr";

/// Static inputs of an external GROMACS engine.
///
/// Relative paths are interpreted against `base_dir`, which is also the
/// working directory of every spawned `gmx` process.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Namespaces the `<name>_trr`, `<name>_edr` and `<name>_log` directories.
    pub name: String,
    /// Starting structure (`grompp -c`).
    pub gro: PathBuf,
    /// Run parameters (`grompp -f`).
    pub mdp: PathBuf,
    /// Topology (`grompp -p`).
    pub top: PathBuf,
    pub base_dir: PathBuf,
    pub gmx_executable: String,
    /// Run input produced by `grompp` and consumed by `mdrun -s`.
    pub tpr_file: PathBuf,
    /// Extra arguments appended verbatim to the `mdrun` command line.
    pub mdrun_args: String,
}

#[derive(Default)]
pub struct EngineConfigBuilder {
    name: Option<String>,
    gro: Option<PathBuf>,
    mdp: Option<PathBuf>,
    top: Option<PathBuf>,
    base_dir: Option<PathBuf>,
    gmx_executable: Option<String>,
    tpr_file: Option<PathBuf>,
    mdrun_args: Option<String>,
}

impl EngineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
    pub fn gro(mut self, path: impl Into<PathBuf>) -> Self {
        self.gro = Some(path.into());
        self
    }
    pub fn mdp(mut self, path: impl Into<PathBuf>) -> Self {
        self.mdp = Some(path.into());
        self
    }
    pub fn top(mut self, path: impl Into<PathBuf>) -> Self {
        self.top = Some(path.into());
        self
    }
    pub fn base_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(path.into());
        self
    }
    pub fn gmx_executable(mut self, executable: impl Into<String>) -> Self {
        self.gmx_executable = Some(executable.into());
        self
    }
    pub fn tpr_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.tpr_file = Some(path.into());
        self
    }
    pub fn mdrun_args(mut self, args: impl Into<String>) -> Self {
        self.mdrun_args = Some(args.into());
        self
    }

    pub fn build(self) -> Result<EngineConfig, ConfigError> {
        let name = self
            .name
            .unwrap_or_else(|| DEFAULT_ENGINE_NAME.to_string());
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(ConfigError::InvalidName(name));
        }
        Ok(EngineConfig {
            name,
            gro: self.gro.ok_or(ConfigError::MissingParameter("gro"))?,
            mdp: self.mdp.ok_or(ConfigError::MissingParameter("mdp"))?,
            top: self.top.ok_or(ConfigError::MissingParameter("top"))?,
            base_dir: self.base_dir.unwrap_or_default(),
            gmx_executable: self
                .gmx_executable
                .unwrap_or_else(|| DEFAULT_GMX_EXECUTABLE.to_string()),
            tpr_file: self
                .tpr_file
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TPR_FILE)),
            mdrun_args: self.mdrun_args.unwrap_or_default(),
        })
    }
}

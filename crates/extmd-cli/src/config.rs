use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use extmd::engine::config::{EngineConfig, EngineConfigBuilder};
use extmd::workflows::segment::PollConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialEngineConfig {
    name: Option<String>,
    gro: Option<PathBuf>,
    mdp: Option<PathBuf>,
    top: Option<PathBuf>,
    base_dir: Option<PathBuf>,
    gmx_executable: Option<String>,
    tpr_file: Option<PathBuf>,
    mdrun_args: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialPollingConfig {
    poll_interval_ms: Option<u64>,
    max_frames: Option<usize>,
    max_transient_polls: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialRunConfig {
    engine: Option<PartialEngineConfig>,
    polling: Option<PartialPollingConfig>,
    #[serde(skip)]
    source_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub engine: EngineConfig,
    pub polling: PollConfig,
}

impl PartialRunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        config.source_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Resolves the final configuration.
    ///
    /// Precedence is CLI flag, then `-S key=value`, then the file. The base
    /// directory falls back to the directory holding the config file.
    pub fn merge_with_cli(mut self, args: &RunArgs) -> Result<RunConfig> {
        self.apply_set_values(&args.set_values)?;

        let engine_file = self.engine.take().unwrap_or_default();
        let polling_file = self.polling.take().unwrap_or_default();

        let mut builder = EngineConfigBuilder::new();
        if let Some(name) = args.name.clone().or(engine_file.name) {
            builder = builder.name(name);
        }
        if let Some(gro) = engine_file.gro {
            builder = builder.gro(gro);
        }
        if let Some(mdp) = engine_file.mdp {
            builder = builder.mdp(mdp);
        }
        if let Some(top) = engine_file.top {
            builder = builder.top(top);
        }
        if let Some(base_dir) = args
            .base_dir
            .clone()
            .or(engine_file.base_dir)
            .or(self.source_dir)
        {
            builder = builder.base_dir(base_dir);
        }
        if let Some(gmx) = args.gmx_executable.clone().or(engine_file.gmx_executable) {
            builder = builder.gmx_executable(gmx);
        }
        if let Some(tpr) = engine_file.tpr_file {
            builder = builder.tpr_file(tpr);
        }
        if let Some(mdrun_args) = args.mdrun_args.clone().or(engine_file.mdrun_args) {
            builder = builder.mdrun_args(mdrun_args);
        }
        let engine = builder
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        let defaults = PollConfig::default();
        let polling = PollConfig {
            poll_interval: args
                .poll_interval_ms
                .or(polling_file.poll_interval_ms)
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            max_frames: args.max_frames.or(polling_file.max_frames),
            max_transient_polls: args
                .max_transient_polls
                .or(polling_file.max_transient_polls),
        };

        Ok(RunConfig { engine, polling })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value) = kv_pair.split_once('=').ok_or_else(|| {
                CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                ))
            })?;

            match key {
                "engine.name" => {
                    self.engine.get_or_insert_with(Default::default).name =
                        Some(value.to_string())
                }
                "engine.gro" => {
                    self.engine.get_or_insert_with(Default::default).gro =
                        Some(value.into())
                }
                "engine.mdp" => {
                    self.engine.get_or_insert_with(Default::default).mdp =
                        Some(value.into())
                }
                "engine.top" => {
                    self.engine.get_or_insert_with(Default::default).top =
                        Some(value.into())
                }
                "engine.base-dir" => {
                    self.engine.get_or_insert_with(Default::default).base_dir =
                        Some(value.into())
                }
                "engine.gmx-executable" => {
                    self.engine.get_or_insert_with(Default::default).gmx_executable =
                        Some(value.to_string())
                }
                "engine.tpr-file" => {
                    self.engine.get_or_insert_with(Default::default).tpr_file =
                        Some(value.into())
                }
                "engine.mdrun-args" => {
                    self.engine.get_or_insert_with(Default::default).mdrun_args =
                        Some(value.to_string())
                }
                "polling.poll-interval-ms" => {
                    self.polling.get_or_insert_with(Default::default).poll_interval_ms =
                        Some(parse_value(key, value)?)
                }
                "polling.max-frames" => {
                    self.polling.get_or_insert_with(Default::default).max_frames =
                        Some(parse_value(key, value)?)
                }
                "polling.max-transient-polls" => {
                    self.polling.get_or_insert_with(Default::default).max_transient_polls =
                        Some(parse_value(key, value)?)
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unknown configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid integer value for {}: {}", key, value)))
}

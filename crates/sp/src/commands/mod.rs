//! CLI command implementations.

pub(crate) mod check;
pub(crate) mod negotiate;

use std::path::{Path, PathBuf};

use clap::Args;
use sp_config::{CliSettings, Config};
use sp_resource::{RendererRegistry, Resource, ResourceConfig, ResourceKind, SourceFile};

use crate::error::CliError;

pub(crate) use check::CheckArgs;
pub(crate) use negotiate::NegotiateArgs;

/// Arguments shared by all commands.
#[derive(Args)]
pub(crate) struct GlobalArgs {
    /// Path to configuration file (default: auto-discover sp.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output (show compile and negotiation logs).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Renderer for speclines without `#!renderer` (overrides config).
    #[arg(long, global = true, env = "SP_DEFAULT_RENDERER")]
    default_renderer: Option<String>,

    /// Charset appended to text/* content types (overrides config).
    #[arg(long, global = true)]
    charset: Option<String>,
}

impl GlobalArgs {
    /// Load `sp.toml` with CLI overrides applied.
    fn load_config(&self) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            default_renderer: self.default_renderer.clone(),
            charset: self.charset.clone(),
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }
}

/// Compiler settings derived from the loaded configuration.
fn resource_config(config: &Config) -> ResourceConfig {
    ResourceConfig {
        media_type_json: config.media_types.json.clone(),
        media_type_jsonp: config.media_types.jsonp.clone(),
        default_renderer: config.renderers.default.clone(),
        charset: Some(config.response.charset.clone()),
    }
}

/// Resource kind served for `path`, or an error for non-dynamic files.
fn resource_kind(path: &Path) -> Result<ResourceKind, CliError> {
    ResourceKind::for_path(path).ok_or_else(|| {
        CliError::Validation(format!(
            "{} is not a dynamic resource (expected a .json file or no extension)",
            path.display()
        ))
    })
}

/// Shared state for compiling files within one command.
pub(crate) struct Compiler {
    registry: RendererRegistry,
    config: ResourceConfig,
}

impl Compiler {
    /// Build a compiler from global arguments.
    pub(crate) fn from_args(args: &GlobalArgs) -> Result<Self, CliError> {
        let config = args.load_config()?;
        if let Some(path) = &config.config_path {
            tracing::info!(path = %path.display(), "Loaded configuration");
        }
        Ok(Self {
            registry: RendererRegistry::with_builtins(),
            config: resource_config(&config),
        })
    }

    /// Read and compile one simplate file.
    pub(crate) fn compile(&self, path: &Path) -> Result<Resource, CliError> {
        let kind = resource_kind(path)?;
        let source = SourceFile::read(path)?;
        Ok(Resource::compile(kind, &source, &self.registry, &self.config)?)
    }
}

//! dsdlgen CLI entrypoint
//! Parses command-line arguments and dispatches to the template generator.
#![deny(unsafe_code)]

// Internal imports (std, crate)
use std::path::PathBuf;

use dsdlgen::{
    Config, FailurePolicy, GenerationError, TemplateEnvironment, TemplateGenerator, TypeManifest,
    TypeVariant,
    config::{EnvTemplateConfigReader, TEMPLATE_DIR_ENV},
    generator::STATUS_SUCCESS,
};

// External imports (alphabetized)
use anyhow::Context;
use clap::Parser;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dsdlgen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Render one source file per type listed in a type manifest
    Generate {
        /// Type manifest (JSON or YAML) produced by the DSDL front end
        #[arg(long)]
        manifest: PathBuf,
        /// Directory holding StructureType/UnionType/ServiceType templates
        #[arg(long)]
        templates_dir: Option<PathBuf>,
        /// Directory the manifest's relative output paths are placed under
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Template file suffix
        #[arg(long)]
        template_suffix: Option<String>,
        /// Render every template but write nothing
        #[arg(long)]
        dry_run: bool,
        /// Keep going after a type fails and report every failure at the end
        #[arg(long)]
        best_effort: bool,
    },
    /// Report which variant templates exist in a template directory
    CheckTemplates {
        /// Directory holding the templates
        #[arg(long)]
        templates_dir: Option<PathBuf>,
        /// Template file suffix
        #[arg(long)]
        template_suffix: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let status = match cli.command {
        Commands::Generate {
            manifest,
            templates_dir,
            output_dir,
            config,
            template_suffix,
            dry_run,
            best_effort,
        } => run_generate(GenerateParams {
            manifest,
            templates_dir,
            output_dir,
            config,
            template_suffix,
            dry_run,
            best_effort,
        })?,
        Commands::CheckTemplates {
            templates_dir,
            template_suffix,
        } => run_check_templates(templates_dir, template_suffix)?,
    };

    if status != STATUS_SUCCESS {
        std::process::exit(status);
    }
    Ok(())
}

/// Parameters for the generate command
struct GenerateParams {
    manifest: PathBuf,
    templates_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    config: Option<PathBuf>,
    template_suffix: Option<String>,
    dry_run: bool,
    best_effort: bool,
}

/// Merge the config file with command-line overrides
fn build_config(
    config_path: Option<&PathBuf>,
    templates_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    template_suffix: Option<String>,
    best_effort: bool,
) -> anyhow::Result<Config> {
    let mut config = match config_path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    if templates_dir.is_some() {
        config.template_dir = templates_dir;
    }
    if output_dir.is_some() {
        config.output_dir = output_dir;
    }
    if let Some(suffix) = template_suffix {
        config.template_suffix = suffix;
    }
    if best_effort {
        config.failure_policy = FailurePolicy::BestEffort;
    }
    config.validate()?;
    Ok(config)
}

fn run_generate(params: GenerateParams) -> anyhow::Result<i32> {
    let config = build_config(
        params.config.as_ref(),
        params.templates_dir,
        params.output_dir,
        params.template_suffix,
        params.best_effort,
    )?;

    let templates_dir = config
        .resolve_template_dir(&EnvTemplateConfigReader)
        .with_context(|| format!("No template directory given (use --templates-dir or {TEMPLATE_DIR_ENV})"))?;
    let output_dir = config
        .resolve_output_dir()
        .context("Failed to resolve output directory")?;

    let types = TypeManifest::load(&params.manifest)
        .with_context(|| format!("Failed to load manifest {}", params.manifest.display()))?
        .into_output_map_under(&output_dir)?;

    info!(
        manifest = %params.manifest.display(),
        types = types.len(),
        output = %output_dir.display(),
        "Generating sources"
    );

    let generator = TemplateGenerator::new(output_dir, types, templates_dir)
        .context("Failed to initialize template generator")?
        .with_template_suffix(config.template_suffix.clone())
        .with_failure_policy(config.failure_policy);

    let report = match generator.generate(params.dry_run) {
        Ok(report) => report,
        Err(GenerationError::Incomplete {
            attempted,
            failures,
        }) => {
            for failure in &failures {
                error!("{failure}");
            }
            anyhow::bail!("{} of {} types failed to generate", failures.len(), attempted);
        }
        Err(e) => {
            error!("Failed to generate sources: {}", e);
            return Err(e.into());
        }
    };

    if report.dry_run {
        println!("Dry run: rendered {} file(s), nothing written", report.rendered.len());
    } else {
        println!("✅ Generated {} file(s)", report.written.len());
        for path in &report.written {
            println!("  • {}", path.display());
        }
    }
    Ok(report.status())
}

fn run_check_templates(
    templates_dir: Option<PathBuf>,
    template_suffix: Option<String>,
) -> anyhow::Result<i32> {
    let config = build_config(None, templates_dir, None, template_suffix, false)?;
    let templates_dir = config
        .resolve_template_dir(&EnvTemplateConfigReader)
        .with_context(|| format!("No template directory given (use --templates-dir or {TEMPLATE_DIR_ENV})"))?;

    let env = TemplateEnvironment::new(templates_dir)?.with_suffix(config.template_suffix);

    println!("Templates in {}:", env.root().display());
    let mut missing = Vec::new();
    for variant in TypeVariant::ALL {
        let name = env.template_name(variant);
        if env.has_template(variant) {
            println!("  ✓ {name}");
        } else {
            println!("  ✗ {name} (missing)");
            missing.push(name);
        }
    }

    if !missing.is_empty() {
        anyhow::bail!("Missing templates: {}", missing.join(", "));
    }
    Ok(STATUS_SUCCESS)
}

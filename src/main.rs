use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use schemalens::config::{Config, Overrides};
use schemalens::{analyze, compute_metrics, dot, provider, render_diagram, report, svg};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schemalens")]
#[command(about = "Analyze a relational schema, generate an EF Core data layer, draw its dependencies", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (default: ./schemalens.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum DiagramFormat {
    Svg,
    Dot,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print design recommendations
    Analyze {
        /// Schema document (.json) or DDL script (.sql, .ddl)
        schema: PathBuf,

        #[arg(long, value_enum, default_value = "text")]
        format: ReportFormat,
    },

    /// Print object counts and relationship-graph metrics
    Metrics {
        schema: PathBuf,

        #[arg(long, value_enum, default_value = "text")]
        format: ReportFormat,
    },

    /// Write the generated data-access layer into a directory
    Generate {
        schema: PathBuf,

        /// Output directory
        #[arg(short, long)]
        out: PathBuf,

        /// Root namespace of the generated code
        #[arg(long)]
        namespace: Option<String>,

        /// Name of the generated DbContext class
        #[arg(long)]
        context: Option<String>,
    },

    /// Render the dependency diagram
    Diagram {
        schema: PathBuf,

        #[arg(long, value_enum, default_value = "svg")]
        format: DiagramFormat,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        no_tables: bool,

        #[arg(long)]
        no_views: bool,

        #[arg(long)]
        procedures: bool,

        #[arg(long)]
        functions: bool,
    },
}

impl Commands {
    fn overrides(&self) -> Overrides {
        match self {
            Commands::Generate {
                namespace, context, ..
            } => Overrides {
                namespace: namespace.clone(),
                context_name: context.clone(),
                ..Overrides::default()
            },
            Commands::Diagram {
                no_tables,
                no_views,
                procedures,
                functions,
                ..
            } => Overrides {
                tables: no_tables.then_some(false),
                views: no_views.then_some(false),
                procedures: procedures.then_some(true),
                functions: functions.then_some(true),
                ..Overrides::default()
            },
            _ => Overrides::default(),
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("schemalens=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("schemalens=warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_schema(path: &Path) -> Result<schemalens::Schema> {
    provider::load(path).with_context(|| format!("failed to load schema from {}", path.display()))
}

fn emit(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => fs::write(path, text).with_context(|| format!("failed to write {}", path.display())),
        None => {
            print!("{}", text);
            Ok(())
        }
    }
}

fn write_bundle(out: &Path, bundle: &schemalens::FileBundle) -> Result<()> {
    for file in bundle.values() {
        let target = out.join(&file.path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&target, &file.content).with_context(|| format!("failed to write {}", target.display()))?;
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("failed to read the working directory")?;
    let config = Config::load(cli.config.as_deref(), &cwd, &cli.command.overrides())
        .context("failed to load configuration")?;

    match cli.command {
        Commands::Analyze { schema, format } => {
            let schema = load_schema(&schema)?;
            let findings = analyze(&schema);
            info!(findings = findings.len(), "analysis complete");
            let text = match format {
                ReportFormat::Text => report::render_findings(&findings),
                ReportFormat::Json => serde_json::to_string_pretty(&findings)? + "\n",
            };
            emit(None, &text)
        }
        Commands::Metrics { schema, format } => {
            let schema = load_schema(&schema)?;
            let metrics = compute_metrics(&schema);
            let text = match format {
                ReportFormat::Text => report::render_metrics(&metrics),
                ReportFormat::Json => serde_json::to_string_pretty(&metrics)? + "\n",
            };
            emit(None, &text)
        }
        Commands::Generate { schema, out, .. } => {
            let schema = load_schema(&schema)?;
            let bundle = schemalens::generate(&schema, &config.codegen);
            write_bundle(&out, &bundle)?;
            info!(files = bundle.len(), out = %out.display(), "code generated");
            println!("Wrote {} files to {}", bundle.len(), out.display());
            Ok(())
        }
        Commands::Diagram {
            schema,
            format,
            output,
            ..
        } => {
            let schema = load_schema(&schema)?;
            let diagram = render_diagram(&schema, config.diagram);
            info!(nodes = diagram.nodes.len(), edges = diagram.edges.len(), "diagram rendered");
            let text = match format {
                DiagramFormat::Svg => svg::render_svg(&diagram),
                DiagramFormat::Dot => dot::to_dot(&diagram),
                DiagramFormat::Json => serde_json::to_string_pretty(&diagram)? + "\n",
            };
            emit(output.as_deref(), &text)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("Error: {:#}", err);
        process::exit(1);
    }
}

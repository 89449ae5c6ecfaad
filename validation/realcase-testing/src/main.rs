//! Real-case regression testing CLI for tobac reference outputs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use notebook_diff::{diff_notebooks, pair_notebooks, DEFAULT_CONTEXT};
use realcase_testing::pipeline::{DEFAULT_NOTEBOOK_TIMEOUT, TOBAC_REPOSITORY};
use realcase_testing::{
    GitSnapshot, MambaProvisioner, RegressionRun, RunOptions, SaveDir, ScriptReferenceGenerator,
    SnapshotProvider, SummaryReport,
};
use refcheck::{
    CompareConfig, Comparator, ConsoleSink, LogFileSink, RunSummary, TeeSink,
};

#[derive(Parser)]
#[command(name = "realcase-testing")]
#[command(about = "Regression testing of tobac notebook outputs across versions", long_about = None)]
struct Cli {
    /// Log level (or a full tracing filter)
    #[arg(long, global = true, default_value = "info", env = "REFCHECK_LOG")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate references with two tobac versions and compare them
    Run {
        /// Notebook to execute
        #[arg(long = "nb")]
        notebook: String,

        /// Baseline tobac version (e.g. v1.5.1)
        #[arg(long)]
        c1: String,

        /// Candidate tobac version
        #[arg(long)]
        c2: String,

        /// Save directory, or `tmp` for a temporary one
        #[arg(long = "sv", default_value = "tmp")]
        save_dir: String,

        /// Create a fresh environment instead of installing into an existing one
        #[arg(long)]
        create_env: bool,

        /// Per-notebook execution timeout in seconds
        #[arg(long, default_value_t = DEFAULT_NOTEBOOK_TIMEOUT.as_secs())]
        timeout_secs: u64,

        /// Reference generator script
        #[arg(long, default_value = "create_references.py")]
        script: PathBuf,

        /// Discrepancy log (appended to)
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Comparison configuration file
        #[arg(short, long, env = "REFCHECK_CONFIG")]
        config: Option<PathBuf>,

        /// Report references present in only one version
        #[arg(long)]
        strict: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,

        /// Exit with status 1 when any difference is found
        #[arg(long)]
        fail_on_difference: bool,
    },

    /// Compare two existing reference trees
    Compare {
        source_root: PathBuf,
        target_root: PathBuf,

        /// Comparison configuration file
        #[arg(short, long, env = "REFCHECK_CONFIG")]
        config: Option<PathBuf>,

        /// Discrepancy log (appended to)
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Report references present in only one tree
        #[arg(long)]
        strict: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,

        /// Exit with status 1 when any difference is found
        #[arg(long)]
        fail_on_difference: bool,
    },

    /// Compare a single pair of dataset files
    Diff {
        source: PathBuf,
        target: PathBuf,

        /// Discrepancy log (appended to)
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Exit with status 1 when the datasets differ
        #[arg(long)]
        fail_on_difference: bool,
    },

    /// Diff the code-cell outputs of notebooks
    Notebooks {
        /// Notebook file, notebook directory, or `rev:<revision>`
        source: String,
        /// Notebook file, notebook directory, or `rev:<revision>`
        target: String,

        /// Repository to check `rev:` arguments out of; `rev:wd` needs a local path
        #[arg(long, default_value = TOBAC_REPOSITORY)]
        repo: String,

        /// Notebook directory inside a checkout
        #[arg(long, default_value = "examples")]
        subdir: PathBuf,

        /// Context lines around each hunk
        #[arg(long, default_value_t = DEFAULT_CONTEXT)]
        context: usize,
    },

    /// Print the header of a dataset file
    Describe { file: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the report
    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    netcdf_parser::silence_hdf5_errors();

    let differences = match cli.command {
        Commands::Run {
            notebook,
            c1,
            c2,
            save_dir,
            create_env,
            timeout_secs,
            script,
            log_file,
            config,
            strict,
            output,
            fail_on_difference,
        } => {
            let config = load_config(config.as_deref(), strict)?;
            let log_file = log_file.unwrap_or_else(|| config.log_file.clone());

            let provisioner = MambaProvisioner::default();
            let generator = ScriptReferenceGenerator::default()
                .with_script(script)
                .with_timeout(Duration::from_secs(timeout_secs));
            let run = RegressionRun::new(&provisioner, &generator, Comparator::new(config));

            let options = RunOptions {
                notebook,
                source_version: c1,
                target_version: c2,
                save_dir: SaveDir::parse(&save_dir),
                create_env,
            };

            let mut sink = TeeSink::new()
                .with(ConsoleSink)
                .with(LogFileSink::new(&log_file));
            let summary = run
                .execute(&options, &mut sink)
                .with_context(|| format!("Regression run for notebook {} failed", options.notebook))?;

            print_summary(&summary, output)?;
            fail_on_difference && summary.has_differences()
        }

        Commands::Compare {
            source_root,
            target_root,
            config,
            log_file,
            strict,
            output,
            fail_on_difference,
        } => {
            let config = load_config(config.as_deref(), strict)?;
            let log_file = log_file.unwrap_or_else(|| config.log_file.clone());
            let comparator = Comparator::new(config);

            let mut sink = TeeSink::new()
                .with(ConsoleSink)
                .with(LogFileSink::new(&log_file));
            let summary = comparator
                .run(&source_root, &target_root, &mut sink)
                .context("Reference comparison failed")?;

            print_summary(&summary, output)?;
            fail_on_difference && summary.has_differences()
        }

        Commands::Diff {
            source,
            target,
            log_file,
            fail_on_difference,
        } => {
            let config = CompareConfig::default();
            let log_file = log_file.unwrap_or_else(|| config.log_file.clone());
            let comparator = Comparator::new(config);

            let mut sink = TeeSink::new()
                .with(ConsoleSink)
                .with(LogFileSink::new(&log_file));
            let result = comparator
                .compare_pair(&source, &target, &mut sink)
                .with_context(|| {
                    format!("Failed to compare {} and {}", source.display(), target.display())
                })?;

            fail_on_difference && !result.is_same()
        }

        Commands::Notebooks {
            source,
            target,
            repo,
            subdir,
            context,
        } => {
            let scratch = tempfile::Builder::new()
                .prefix("realcase-notebooks-")
                .tempdir()
                .context("Failed to create scratch directory")?;
            let snapshots = GitSnapshot::new(repo);

            let source = resolve_notebooks(&source, &snapshots, &subdir, &scratch.path().join("source"))?;
            let target = resolve_notebooks(&target, &snapshots, &subdir, &scratch.path().join("target"))?;
            diff_notebook_paths(&source, &target, context)?;
            false
        }

        Commands::Describe { file } => {
            let dataset = netcdf_parser::open_dataset(&file)
                .with_context(|| format!("Failed to open {}", file.display()))?;
            print!("{}", netcdf_parser::describe(&dataset));
            false
        }
    };

    if differences {
        std::process::exit(1);
    }
    Ok(())
}

fn load_config(path: Option<&Path>, strict: bool) -> Result<CompareConfig> {
    let mut config = match path {
        Some(path) => CompareConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => CompareConfig::default(),
    };
    if strict {
        config.strict_pairing = true;
    }
    config.validate()?;
    debug!(?config, "Comparison configuration");
    Ok(config)
}

fn print_summary(summary: &RunSummary, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => println!("{}", SummaryReport::format_json(summary)?),
        OutputFormat::Table => println!("{}", SummaryReport::format_table(summary)),
    }
    Ok(())
}

/// A `rev:` argument is checked out; anything else is taken as a path.
fn resolve_notebooks(
    arg: &str,
    snapshots: &dyn SnapshotProvider,
    subdir: &Path,
    dest: &Path,
) -> Result<PathBuf> {
    match arg.strip_prefix("rev:") {
        Some(revision) => {
            let checkout = snapshots
                .checkout(revision, dest)
                .with_context(|| format!("Failed to check out {}", revision))?;
            Ok(checkout.join(subdir))
        }
        None => Ok(PathBuf::from(arg)),
    }
}

fn diff_notebook_paths(source: &Path, target: &Path, context: usize) -> Result<()> {
    if source.is_file() && target.is_file() {
        print!("{}", diff_notebooks(source, target, context)?.diff);
        return Ok(());
    }
    if !(source.is_dir() && target.is_dir()) {
        bail!(
            "{} and {} must both be notebook files or both be directories",
            source.display(),
            target.display()
        );
    }

    let pairing = pair_notebooks(source, target)?;
    for name in pairing.source_only.iter().chain(&pairing.target_only) {
        info!(notebook = %name, "Notebook present on one side only");
    }
    for (a, b) in &pairing.pairs {
        print!("{}", diff_notebooks(a, b, context)?.diff);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_flags_parse() {
        let cli = Cli::try_parse_from([
            "realcase-testing", "run", "--nb", "v1.5.2", "--c1", "v1.5.2", "--c2", "v1.5.1",
            "--sv", "./testing", "--create-env",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                notebook,
                save_dir,
                create_env,
                timeout_secs,
                output,
                ..
            } => {
                assert_eq!(notebook, "v1.5.2");
                assert_eq!(save_dir, "./testing");
                assert!(create_env);
                assert_eq!(timeout_secs, 600);
                assert_eq!(output, OutputFormat::Table);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_plain_notebook_argument_is_a_path() {
        let repo = tempfile::tempdir().unwrap();
        let snapshots = GitSnapshot::new(repo.path().to_string_lossy());
        let path = resolve_notebooks("a/b.ipynb", &snapshots, Path::new("examples"), Path::new("/x")).unwrap();
        assert_eq!(path, PathBuf::from("a/b.ipynb"));
        let wd = resolve_notebooks("rev:wd", &snapshots, Path::new("examples"), Path::new("/x")).unwrap();
        assert_eq!(wd, repo.path().join("examples"));
    }

    #[test]
    fn test_working_directory_needs_local_repository() {
        let snapshots = GitSnapshot::new(TOBAC_REPOSITORY);
        let err = resolve_notebooks("rev:wd", &snapshots, Path::new("examples"), Path::new("/x"))
            .unwrap_err();
        assert!(format!("{:#}", err).contains("is not a local directory"));
    }
}

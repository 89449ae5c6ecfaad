//! Environment provisioning, notebook execution and source snapshots.
//!
//! The heavy lifting happens in external programs (mamba, the reference
//! generator script, git); this module only builds their command lines,
//! runs them to completion and turns failures into [`PipelineError`]s.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

use refcheck::{CompareError, Comparator, ReportSink, RunSummary};
use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Upstream tobac repository.
pub const TOBAC_REPOSITORY: &str = "https://github.com/tobac-project/tobac.git";

/// Name of the conda environment created inside the save directory.
pub const ENVIRONMENT_NAME: &str = "realcase_testing";

pub const SOURCE_SUBFOLDER: &str = "source_reference_data";
pub const TARGET_SUBFOLDER: &str = "target_reference_data";

/// Per-notebook wall-clock limit for reference generation.
pub const DEFAULT_NOTEBOOK_TIMEOUT: Duration = Duration::from_secs(600);

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Packages installed next to tobac in a fresh environment.
const ENVIRONMENT_PACKAGES: &[&str] = &[
    "jupyter",
    "arm_pyart",
    "pytables",
    "ffmpeg",
    "gitpython",
    "nbformat",
    "nbconvert",
];

/// Errors from provisioning, notebook execution and snapshots.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to launch {command}: {source}")]
    Launch {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("{command} failed with {status}")]
    CommandFailed { command: String, status: ExitStatus },

    #[error("Notebook {notebook} did not finish within {}s", timeout.as_secs())]
    Timeout { notebook: String, timeout: Duration },

    #[error("Reference generation failed for notebook {notebook}: {source}")]
    Execution {
        notebook: String,
        #[source]
        source: Box<PipelineError>,
    },

    #[error("Working copy {0} is not a local directory")]
    NotAWorkingCopy(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Compare(#[from] CompareError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Strip the leading `v` of a release tag: `v1.5.2` -> `1.5.2`.
pub fn normalize_version(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

fn describe(command: &Command) -> String {
    let mut text = command.get_program().to_string_lossy().into_owned();
    for arg in command.get_args() {
        text.push(' ');
        text.push_str(&arg.to_string_lossy());
    }
    text
}

fn spawn(command: &mut Command) -> Result<Child> {
    command.spawn().map_err(|source| PipelineError::Launch {
        command: describe(command),
        source,
    })
}

/// Run a command to completion; a non-zero exit is an error.
pub fn run_command(command: &mut Command) -> Result<()> {
    debug!(command = %describe(command), "Running command");
    let status = spawn(command)?.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(PipelineError::CommandFailed {
            command: describe(command),
            status,
        })
    }
}

/// Run a command with a wall-clock limit.
///
/// The child is polled until it exits. On unix it leads its own process
/// group, and past the deadline the whole group is killed, so programs it
/// started (python under `mamba run`) go down with it. The timeout is
/// reported against `notebook`.
pub fn run_with_timeout(command: &mut Command, timeout: Duration, notebook: &str) -> Result<()> {
    debug!(command = %describe(command), timeout_secs = timeout.as_secs(), "Running command");
    own_process_group(command);
    let mut child = spawn(command)?;
    let deadline = Instant::now() + timeout;

    loop {
        match child.try_wait() {
            Ok(Some(status)) if status.success() => return Ok(()),
            Ok(Some(status)) => {
                return Err(PipelineError::CommandFailed {
                    command: describe(command),
                    status,
                })
            }
            Ok(None) => {}
            Err(e) => {
                terminate_and_reap(&mut child);
                return Err(e.into());
            }
        }

        let now = Instant::now();
        if now >= deadline {
            warn!(notebook, timeout_secs = timeout.as_secs(), "Killing notebook run");
            terminate_and_reap(&mut child);
            return Err(PipelineError::Timeout {
                notebook: notebook.to_string(),
                timeout,
            });
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

#[cfg(unix)]
fn own_process_group(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(not(unix))]
fn own_process_group(_command: &mut Command) {}

fn terminate_and_reap(child: &mut Child) {
    #[cfg(unix)]
    {
        // Process group id equals the child's pid
        let _ = Command::new("sh")
            .arg("-c")
            .arg(format!("kill -s KILL -- -{}", child.id()))
            .status();
    }
    // The child may already have exited on its own
    let _ = child.kill();
    let _ = child.wait();
}

/// Creates and updates the Python environment a notebook runs in.
pub trait EnvironmentProvisioner {
    /// Create a fresh environment at `env` with the given tobac version.
    fn create(&self, env: &Path, version: &str) -> Result<()>;

    /// Install the given tobac version into an existing environment.
    fn install(&self, env: &Path, version: &str) -> Result<()>;
}

/// Provisions environments with mamba from conda-forge.
#[derive(Debug, Clone)]
pub struct MambaProvisioner {
    program: String,
}

impl Default for MambaProvisioner {
    fn default() -> Self {
        Self::new("mamba")
    }
}

impl MambaProvisioner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn create_command(&self, env: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command.args(["create", "-y", "-p"]).arg(env).arg("python");
        command
    }

    pub fn install_command(&self, env: &Path, version: &str, extra: &[&str]) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(["install", "-y", "-c", "conda-forge", "-p"])
            .arg(env)
            .arg(format!("tobac={}", normalize_version(version)))
            .args(extra);
        command
    }
}

impl EnvironmentProvisioner for MambaProvisioner {
    fn create(&self, env: &Path, version: &str) -> Result<()> {
        info!(env = %env.display(), version, "Creating environment");
        run_command(&mut self.create_command(env))?;
        run_command(&mut self.install_command(env, version, ENVIRONMENT_PACKAGES))
    }

    fn install(&self, env: &Path, version: &str) -> Result<()> {
        info!(env = %env.display(), version, "Installing tobac");
        run_command(&mut self.install_command(env, version, &[]))
    }
}

/// Executes a notebook and saves its outputs under
/// `<save_dir>/<subfolder>/<notebook>/Save/`.
pub trait ReferenceGenerator {
    fn generate(&self, env: &Path, notebook: &str, save_dir: &Path, subfolder: &str) -> Result<()>;
}

/// Runs `create_references.py` inside the environment.
#[derive(Debug, Clone)]
pub struct ScriptReferenceGenerator {
    program: String,
    script: PathBuf,
    timeout: Duration,
}

impl Default for ScriptReferenceGenerator {
    fn default() -> Self {
        Self {
            program: "mamba".to_string(),
            script: PathBuf::from("create_references.py"),
            timeout: DEFAULT_NOTEBOOK_TIMEOUT,
        }
    }
}

impl ScriptReferenceGenerator {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_script(mut self, script: impl Into<PathBuf>) -> Self {
        self.script = script.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn command(&self, env: &Path, notebook: &str, save_dir: &Path, subfolder: &str) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(["run", "-p"])
            .arg(env)
            .arg("python")
            .arg(&self.script)
            .args(["--nb", notebook])
            .arg(save_dir)
            .arg(subfolder);
        command
    }
}

impl ReferenceGenerator for ScriptReferenceGenerator {
    fn generate(&self, env: &Path, notebook: &str, save_dir: &Path, subfolder: &str) -> Result<()> {
        info!(notebook, subfolder, "Generating reference data");
        let mut command = self.command(env, notebook, save_dir, subfolder);
        run_with_timeout(&mut command, self.timeout, notebook).map_err(|e| match e {
            timeout @ PipelineError::Timeout { .. } => timeout,
            other => PipelineError::Execution {
                notebook: notebook.to_string(),
                source: Box::new(other),
            },
        })
    }
}

/// Produces a working copy of a repository at a revision.
pub trait SnapshotProvider {
    /// Returns the directory holding the working copy.
    fn checkout(&self, revision: &str, dest: &Path) -> Result<PathBuf>;
}

/// Revision name meaning "the working directory as is".
pub const WORKING_DIRECTORY: &str = "wd";

/// Clones a git repository and checks out a revision.
#[derive(Debug, Clone)]
pub struct GitSnapshot {
    repository: String,
}

impl GitSnapshot {
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
        }
    }
}

impl SnapshotProvider for GitSnapshot {
    fn checkout(&self, revision: &str, dest: &Path) -> Result<PathBuf> {
        if revision == WORKING_DIRECTORY {
            let path = PathBuf::from(&self.repository);
            if !path.is_dir() {
                return Err(PipelineError::NotAWorkingCopy(self.repository.clone()));
            }
            return Ok(path);
        }

        info!(repository = %self.repository, revision, dest = %dest.display(), "Checking out snapshot");
        run_command(Command::new("git").arg("clone").arg(&self.repository).arg(dest))?;
        run_command(Command::new("git").arg("-C").arg(dest).args(["checkout", revision]))?;
        Ok(dest.to_path_buf())
    }
}

/// Where generated references and the environment live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveDir {
    /// A fresh temporary directory, removed when the run ends
    Temporary,
    Path(PathBuf),
}

impl SaveDir {
    /// `tmp` selects a temporary directory; anything else is a path.
    pub fn parse(value: &str) -> Self {
        if value == "tmp" {
            SaveDir::Temporary
        } else {
            SaveDir::Path(PathBuf::from(value))
        }
    }

    /// The directory to use, plus the guard keeping a temporary one alive.
    pub fn resolve(&self) -> Result<(PathBuf, Option<TempDir>)> {
        match self {
            SaveDir::Temporary => {
                let dir = tempfile::Builder::new().prefix("realcase-").tempdir()?;
                Ok((dir.path().to_path_buf(), Some(dir)))
            }
            SaveDir::Path(path) => {
                std::fs::create_dir_all(path)?;
                Ok((path.clone(), None))
            }
        }
    }
}

/// Parameters of one version-to-version regression run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub notebook: String,
    /// Baseline tobac version, producing the source references
    pub source_version: String,
    /// Candidate tobac version, producing the target references
    pub target_version: String,
    pub save_dir: SaveDir,
    /// Create the environment instead of installing into an existing one
    pub create_env: bool,
}

/// Generates references with two tobac versions and compares them.
pub struct RegressionRun<'a> {
    provisioner: &'a dyn EnvironmentProvisioner,
    generator: &'a dyn ReferenceGenerator,
    comparator: Comparator,
}

impl<'a> RegressionRun<'a> {
    pub fn new(
        provisioner: &'a dyn EnvironmentProvisioner,
        generator: &'a dyn ReferenceGenerator,
        comparator: Comparator,
    ) -> Self {
        Self {
            provisioner,
            generator,
            comparator,
        }
    }

    /// Provision, generate both reference trees, then compare them.
    ///
    /// Any provisioning or execution failure aborts the run before the
    /// comparison.
    pub fn execute(&self, options: &RunOptions, sink: &mut dyn ReportSink) -> Result<RunSummary> {
        let (save_dir, _guard) = options.save_dir.resolve()?;
        let env = save_dir.join(ENVIRONMENT_NAME);
        info!(
            notebook = %options.notebook,
            source_version = %options.source_version,
            target_version = %options.target_version,
            save_dir = %save_dir.display(),
            "Starting regression run"
        );

        if options.create_env {
            self.provisioner.create(&env, &options.source_version)?;
        } else {
            self.provisioner.install(&env, &options.source_version)?;
        }
        self.generator
            .generate(&env, &options.notebook, &save_dir, SOURCE_SUBFOLDER)?;

        self.provisioner.install(&env, &options.target_version)?;
        self.generator
            .generate(&env, &options.notebook, &save_dir, TARGET_SUBFOLDER)?;

        let summary = self.comparator.run(
            &save_dir.join(SOURCE_SUBFOLDER),
            &save_dir.join(TARGET_SUBFOLDER),
            sink,
        )?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(command: &Command) -> Vec<String> {
        command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_normalize_version() {
        assert_eq!(normalize_version("v1.5.2"), "1.5.2");
        assert_eq!(normalize_version("1.5.2"), "1.5.2");
        assert_eq!(normalize_version("vv1"), "v1");
    }

    #[test]
    fn test_install_command_strips_version_prefix() {
        let command = MambaProvisioner::default().install_command(Path::new("/env"), "v1.5.1", &[]);
        assert_eq!(
            args(&command),
            ["install", "-y", "-c", "conda-forge", "-p", "/env", "tobac=1.5.1"]
        );
    }

    #[test]
    fn test_generator_command_line() {
        let generator = ScriptReferenceGenerator::default();
        let command = generator.command(
            Path::new("/save/realcase_testing"),
            "v1.5.2",
            Path::new("/save"),
            SOURCE_SUBFOLDER,
        );
        assert_eq!(command.get_program(), "mamba");
        assert_eq!(
            args(&command),
            [
                "run",
                "-p",
                "/save/realcase_testing",
                "python",
                "create_references.py",
                "--nb",
                "v1.5.2",
                "/save",
                "source_reference_data",
            ]
        );
        assert_eq!(generator.timeout(), DEFAULT_NOTEBOOK_TIMEOUT);
    }

    #[cfg(unix)]
    #[test]
    fn test_long_running_child_times_out() {
        let started = Instant::now();
        let err = run_with_timeout(
            Command::new("sleep").arg("30"),
            Duration::from_millis(200),
            "Example_OLR_Tracking_model",
        )
        .unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(10));
        match err {
            PipelineError::Timeout { notebook, .. } => {
                assert_eq!(notebook, "Example_OLR_Tracking_model")
            }
            other => panic!("expected timeout, got {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_grandchildren() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("written_after_timeout");
        let err = run_with_timeout(
            Command::new("sh")
                .arg("-c")
                .arg(format!("sleep 1; touch '{}'", marker.display())),
            Duration::from_millis(200),
            "Example_Precip_Tracking",
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Timeout { .. }));

        thread::sleep(Duration::from_secs(2));
        assert!(!marker.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command_is_reported() {
        let err = run_command(&mut Command::new("false")).unwrap_err();
        assert!(matches!(err, PipelineError::CommandFailed { .. }));
        assert!(run_with_timeout(&mut Command::new("true"), Duration::from_secs(5), "nb").is_ok());
    }

    #[test]
    fn test_missing_program_is_launch_error() {
        let err = run_command(&mut Command::new("definitely-not-a-real-program-xyz")).unwrap_err();
        assert!(matches!(err, PipelineError::Launch { .. }));
    }

    #[test]
    fn test_working_directory_snapshot_is_used_as_is() {
        let repo = tempfile::tempdir().unwrap();
        let snapshot = GitSnapshot::new(repo.path().to_string_lossy());
        let path = snapshot
            .checkout(WORKING_DIRECTORY, Path::new("/unused"))
            .unwrap();
        assert_eq!(path, repo.path());
    }

    #[test]
    fn test_working_directory_of_remote_repository_is_rejected() {
        let snapshot = GitSnapshot::new(TOBAC_REPOSITORY);
        let err = snapshot
            .checkout(WORKING_DIRECTORY, Path::new("/unused"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::NotAWorkingCopy(ref repo) if repo == TOBAC_REPOSITORY));
    }

    #[test]
    fn test_save_dir_sentinel() {
        assert_eq!(SaveDir::parse("tmp"), SaveDir::Temporary);
        assert_eq!(SaveDir::parse("./testing"), SaveDir::Path(PathBuf::from("./testing")));

        let (path, guard) = SaveDir::Temporary.resolve().unwrap();
        assert!(path.is_dir());
        drop(guard);
        assert!(!path.exists());
    }
}

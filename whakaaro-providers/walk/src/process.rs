use std::{
    collections::BTreeSet,
    ffi::OsString,
    io::Read,
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
    sync::mpsc,
    thread,
    time::Duration,
};

use tracing::{debug, instrument, warn};
use whakaaro_core::{OpinionOracle, OracleError, OracleEstimate, WalkConfig};

use crate::output::parse_oracle_output;

/// Time a single oracle invocation may take before it is killed.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

const ESTIMATE_ALL_FLAG: &str = "--estAllOpinions";

/// Runs an external random-walk oracle for every query.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use whakaaro_core::OpinionOracle;
/// use whakaaro_providers_walk::ProcessOracle;
///
/// let oracle = ProcessOracle::new("./oracle", "net_G.txt", "net_uniform_s.txt")
///     .with_timeout(Duration::from_secs(30));
/// assert_eq!(oracle.name(), "./oracle");
/// assert_eq!(oracle.timeout(), Duration::from_secs(30));
/// ```
#[derive(Clone, Debug)]
pub struct ProcessOracle {
    name: String,
    program: PathBuf,
    leading_args: Vec<OsString>,
    graph: PathBuf,
    innate: PathBuf,
    timeout: Duration,
}

impl ProcessOracle {
    /// Configures an oracle for the given graph and innate-opinion files.
    #[must_use]
    pub fn new(
        program: impl Into<PathBuf>,
        graph: impl Into<PathBuf>,
        innate: impl Into<PathBuf>,
    ) -> Self {
        let program = program.into();
        Self {
            name: program.display().to_string(),
            program,
            leading_args: Vec::new(),
            graph: graph.into(),
            innate: innate.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Inserts `arg` before the oracle arguments, for oracles launched
    /// through an interpreter such as `sh oracle.sh`.
    #[must_use]
    pub fn with_leading_arg(mut self, arg: impl Into<OsString>) -> Self {
        self.leading_args.push(arg.into());
        self
    }

    /// Replaces the per-invocation time limit.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Per-invocation time limit.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Program the oracle runs.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Asks the oracle for the expressed opinion of every vertex.
    ///
    /// # Errors
    /// As [`OpinionOracle::estimate_opinions`].
    #[instrument(
        name = "walk.estimate_all_opinions",
        err,
        skip(self, config),
        fields(oracle = %self.name, num_steps = config.num_steps().get()),
    )]
    pub fn estimate_all_opinions(&self, config: &WalkConfig) -> Result<OracleEstimate, OracleError> {
        self.run(config, [OsString::from(ESTIMATE_ALL_FLAG)])
    }

    fn command(&self, config: &WalkConfig) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.leading_args)
            .arg(&self.graph)
            .arg(config.num_steps().to_string())
            .arg(config.num_walks().to_string())
            .arg(&self.innate)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        command
    }

    fn run<I>(&self, config: &WalkConfig, extra: I) -> Result<OracleEstimate, OracleError>
    where
        I: IntoIterator<Item = OsString>,
    {
        let mut child = self
            .command(config)
            .args(extra)
            .spawn()
            .map_err(|err| self.unavailable(err.to_string()))?;
        let stdout = self.collect_stdout(&mut child)?;
        let status = child
            .wait()
            .map_err(|err| self.unavailable(err.to_string()))?;
        if !status.success() {
            return Err(OracleError::Exited {
                oracle: self.name.clone(),
                status: status.to_string(),
            });
        }
        let estimate = parse_oracle_output(&stdout)?;
        debug!(
            labelled = estimate.opinions.len(),
            reported_secs = estimate.elapsed.as_secs_f64(),
            "oracle answered"
        );
        Ok(estimate)
    }

    /// Reads standard output on a helper thread so the time limit also
    /// covers an oracle that stops writing without exiting.
    fn collect_stdout(&self, child: &mut Child) -> Result<String, OracleError> {
        let Some(mut pipe) = child.stdout.take() else {
            return Err(self.unavailable("standard output was not captured"));
        };
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            let mut buffer = String::new();
            let result = pipe.read_to_string(&mut buffer).map(|_| buffer);
            // The receiver is gone only after a timeout.
            let _ignored = sender.send(result);
        });

        match receiver.recv_timeout(self.timeout) {
            Ok(Ok(stdout)) => Ok(stdout),
            Ok(Err(err)) => {
                self.terminate(child);
                Err(self.unavailable(format!("reading output failed: {err}")))
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                self.terminate(child);
                Err(OracleError::TimedOut {
                    oracle: self.name.clone(),
                    timeout: self.timeout,
                })
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                self.terminate(child);
                Err(self.unavailable("output reader stopped unexpectedly"))
            }
        }
    }

    fn terminate(&self, child: &mut Child) {
        if let Err(err) = child.kill() {
            warn!(oracle = %self.name, error = %err, "failed to kill oracle");
        }
        if let Err(err) = child.wait() {
            warn!(oracle = %self.name, error = %err, "failed to reap oracle");
        }
    }

    fn unavailable(&self, reason: impl Into<String>) -> OracleError {
        OracleError::Unavailable {
            oracle: self.name.clone(),
            reason: reason.into(),
        }
    }
}

impl OpinionOracle for ProcessOracle {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "walk.estimate_opinions",
        err,
        skip(self, vertices, config),
        fields(oracle = %self.name, queried = tracing::field::Empty),
    )]
    fn estimate_opinions(
        &self,
        vertices: &[usize],
        config: &WalkConfig,
    ) -> Result<OracleEstimate, OracleError> {
        let distinct: BTreeSet<usize> = vertices.iter().copied().collect();
        tracing::Span::current().record("queried", distinct.len());
        if distinct.is_empty() {
            return Ok(OracleEstimate::default());
        }
        self.run(
            config,
            distinct.into_iter().map(|vertex| OsString::from(vertex.to_string())),
        )
    }
}

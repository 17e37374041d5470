//! Network path tracing through the platform trace tool
//!
//! The trace command is spawned with both output streams piped into one line
//! stream. Reading and waiting share a single deadline; when it expires the
//! child is killed and reaped. If the tool cannot be launched, or fails
//! without printing a hop, a manual TTL walk approximates the path.

use crate::{
    connectivity::ReachabilityProbe,
    defaults,
    dns::Resolve,
    error::{AppError, Result},
    models::{FallbackAttempt, TraceResult},
};
use regex::Regex;
use std::process::Stdio;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;

/// Leading whitespace, a hop number, then whitespace
fn hop_pattern() -> Option<&'static Regex> {
    static HOP: OnceLock<Option<Regex>> = OnceLock::new();
    HOP.get_or_init(|| Regex::new(r"^\s*\d+\s").ok()).as_ref()
}

/// Whether a line of trace output describes a hop
pub fn is_hop_line(line: &str) -> bool {
    hop_pattern().is_some_and(|re| re.is_match(line))
}

/// Executable and arguments for one trace run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl TraceCommand {
    pub fn new<S: Into<String>>(program: S, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// `tracert -h N host` on Windows, `traceroute -m N host` elsewhere.
    /// A `max_hops` of 0 leaves the tool's own limit in place.
    pub fn for_current_platform(host: &str, max_hops: u32) -> Self {
        let (program, flag) = if cfg!(target_os = "windows") {
            ("tracert", "-h")
        } else {
            ("traceroute", "-m")
        };

        let mut args = Vec::new();
        if max_hops > 0 {
            args.push(flag.to_string());
            args.push(max_hops.to_string());
        }
        args.push(host.to_string());
        Self::new(program, args)
    }

    /// Command line as a single string
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// What the external command produced before it stopped
#[derive(Debug, Default)]
struct CommandRun {
    hops: Vec<String>,
    exit_code: Option<i32>,
    hop_cap_reached: bool,
    exited_ok: bool,
    timed_out: bool,
}

enum Collected {
    HopCap,
    Exited(std::io::Result<std::process::ExitStatus>),
}

/// Path tracer with a manual fallback
pub struct PathTracer {
    resolver: Arc<dyn Resolve>,
    reachability: Arc<dyn ReachabilityProbe>,
    command: Option<TraceCommand>,
    fallback_timeout: Duration,
}

impl PathTracer {
    pub fn new(resolver: Arc<dyn Resolve>, reachability: Arc<dyn ReachabilityProbe>) -> Self {
        Self {
            resolver,
            reachability,
            command: None,
            fallback_timeout: defaults::FALLBACK_PROBE_TIMEOUT,
        }
    }

    /// Run `command` instead of the platform trace tool
    pub fn with_command(mut self, command: TraceCommand) -> Self {
        self.command = Some(command);
        self
    }

    /// Per-TTL timeout of the manual fallback
    pub fn with_fallback_timeout(mut self, timeout: Duration) -> Self {
        self.fallback_timeout = timeout;
        self
    }

    /// Trace the path to `host`. Never fails; problems are reported in the result.
    /// `max_hops` of 0 means no hop cap.
    pub async fn trace(&self, host: &str, max_hops: u32, overall_timeout: Duration) -> TraceResult {
        let deadline = Instant::now() + overall_timeout;
        let command = self
            .command
            .clone()
            .unwrap_or_else(|| TraceCommand::for_current_platform(host, max_hops));

        let mut result = TraceResult {
            command: command.display(),
            ..TraceResult::default()
        };

        match run_command(&command, max_hops as usize, overall_timeout).await {
            Err(e) => {
                result.error = Some(e.to_string());
                self.manual_fallback(host, deadline, &mut result).await;
            }
            Ok(run) => {
                result.hops = run.hops;
                result.exit_code = run.exit_code;
                result.timed_out = run.timed_out;
                result.completed = run.exited_ok || run.hop_cap_reached;

                if run.timed_out {
                    result.error = Some(format!(
                        "{} did not finish within {}s",
                        command.program,
                        overall_timeout.as_secs_f64()
                    ));
                } else if !result.completed {
                    result.error = Some(match run.exit_code {
                        Some(code) => format!("{} exited with status {}", command.program, code),
                        None => format!("{} was terminated by a signal", command.program),
                    });
                    if result.hops.is_empty() {
                        self.manual_fallback(host, deadline, &mut result).await;
                    }
                }
            }
        }

        result
    }

    /// Walk TTL 1..=10, re-resolving and probing each step; stop at the first reply
    async fn manual_fallback(&self, host: &str, deadline: Instant, result: &mut TraceResult) {
        result.used_fallback = true;
        result.completed = false;

        for ttl in 1..=defaults::FALLBACK_MAX_TTL {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let budget = self.fallback_timeout.min(deadline - now);

            let start = Instant::now();
            let address = self.resolver.resolve_first(host).await.ok();
            let reached = match address {
                Some(address) => self.reachability.is_reachable(address, Some(ttl), budget).await,
                None => false,
            };
            let elapsed_ms = start.elapsed().as_millis() as u64;

            result.attempts.push(FallbackAttempt {
                ttl,
                address,
                reached,
                elapsed_ms,
            });

            if reached {
                if let Some(address) = address {
                    result
                        .hops
                        .push(format!("{:>2}  {}  {} ms (approximate)", ttl, address, elapsed_ms));
                }
                break;
            }
        }
    }
}

async fn run_command(command: &TraceCommand, max_hops: usize, overall: Duration) -> Result<CommandRun> {
    let mut child = Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| AppError::process(format!("Failed to launch {}: {}", command.program, e)))?;

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let mut readers: Vec<JoinHandle<()>> = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        readers.push(spawn_line_reader(stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(spawn_line_reader(stderr, tx.clone()));
    }
    drop(tx);

    let mut run = CommandRun::default();
    let hops = &mut run.hops;
    let child_ref = &mut child;

    let collected = time::timeout(overall, async move {
        while let Some(line) = rx.recv().await {
            if is_hop_line(&line) {
                hops.push(line);
                if max_hops > 0 && hops.len() >= max_hops {
                    return Collected::HopCap;
                }
            }
        }
        Collected::Exited(child_ref.wait().await)
    })
    .await;

    match collected {
        Ok(Collected::HopCap) => run.hop_cap_reached = true,
        Ok(Collected::Exited(Ok(status))) => {
            run.exit_code = status.code();
            run.exited_ok = status.success();
        }
        Ok(Collected::Exited(Err(_))) => {}
        Err(_) => run.timed_out = true,
    }

    terminate(&mut child).await;
    for reader in readers {
        reader.abort();
    }

    Ok(run)
}

/// Kill the child if it is still running and reap it
async fn terminate(child: &mut Child) {
    if let Ok(None) = child.try_wait() {
        let _ = child.kill().await;
    }
}

fn spawn_line_reader<R>(stream: R, tx: mpsc::UnboundedSender<String>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).is_err() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::FixedReachability;
    use crate::dns::StaticResolver;

    fn tracer(reachable: bool) -> PathTracer {
        PathTracer::new(Arc::new(StaticResolver::new()), Arc::new(FixedReachability(reachable)))
            .with_fallback_timeout(Duration::from_millis(50))
    }

    #[cfg(unix)]
    fn shell(script: &str) -> TraceCommand {
        TraceCommand::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    #[test]
    fn test_hop_line_detection() {
        assert!(is_hop_line(" 1  192.168.1.1 (192.168.1.1)  0.512 ms"));
        assert!(is_hop_line("10  core.example.net (203.0.113.9)  9.1 ms"));
        assert!(is_hop_line("  3    <1 ms    <1 ms    <1 ms  10.0.0.1"));
        assert!(!is_hop_line("traceroute to example.com (93.184.216.34), 15 hops max"));
        assert!(!is_hop_line("Tracing route to example.com"));
        assert!(!is_hop_line(""));
    }

    #[test]
    fn test_platform_command() {
        let command = TraceCommand::for_current_platform("example.com", 15);
        assert!(command.args.contains(&"15".to_string()));
        assert_eq!(command.args.last().map(String::as_str), Some("example.com"));
        if cfg!(target_os = "windows") {
            assert_eq!(command.display(), "tracert -h 15 example.com");
        } else {
            assert_eq!(command.display(), "traceroute -m 15 example.com");
        }
    }

    #[test]
    fn test_platform_command_without_hop_limit() {
        let command = TraceCommand::for_current_platform("example.com", 0);
        assert_eq!(command.args, vec!["example.com".to_string()]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_zero_max_hops_collects_every_hop() {
        let result = tracer(true)
            .with_command(shell("printf ' 1  a\\n 2  b\\n 3  c\\n'"))
            .trace("127.0.0.1", 0, Duration::from_secs(10))
            .await;

        assert_eq!(result.hops.len(), 3);
        assert!(result.completed);
        assert_eq!(result.exit_code, Some(0));
        assert!(!result.used_fallback);
    }

    #[tokio::test]
    async fn test_missing_binary_uses_fallback() {
        let result = tracer(true)
            .with_command(TraceCommand::new("definitely-missing-trace-tool", vec![]))
            .trace("127.0.0.1", 15, Duration::from_secs(5))
            .await;

        assert!(result.used_fallback);
        assert!(!result.completed);
        assert!(result.error.is_some());
        assert_eq!(result.attempts.len(), 1);
        assert!(result.attempts[0].reached);
        assert_eq!(result.hops.len(), 1);
        assert!(result.hops[0].contains("127.0.0.1"));
    }

    #[tokio::test]
    async fn test_fallback_walks_every_ttl_when_nothing_answers() {
        let result = tracer(false)
            .with_command(TraceCommand::new("definitely-missing-trace-tool", vec![]))
            .trace("127.0.0.1", 15, Duration::from_secs(5))
            .await;

        assert!(result.used_fallback);
        assert!(result.hops.is_empty());
        let ttls: Vec<u8> = result.attempts.iter().map(|a| a.ttl).collect();
        assert_eq!(ttls, (1..=10).collect::<Vec<u8>>());
    }

    #[tokio::test]
    async fn test_fallback_records_unresolvable_attempts() {
        let result = tracer(true)
            .with_command(TraceCommand::new("definitely-missing-trace-tool", vec![]))
            .trace("unknown.test", 15, Duration::from_secs(5))
            .await;

        assert!(result.used_fallback);
        assert!(!result.attempts.is_empty());
        assert!(result.attempts.iter().all(|a| a.address.is_none() && !a.reached));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_streams_hop_lines_and_skips_header() {
        let result = tracer(true)
            .with_command(shell("printf 'traceroute to x, 15 hops max\\n 1  a  1 ms\\n 2  b  2 ms\\n'"))
            .trace("127.0.0.1", 15, Duration::from_secs(10))
            .await;

        assert_eq!(result.hops, vec![" 1  a  1 ms".to_string(), " 2  b  2 ms".to_string()]);
        assert!(result.completed);
        assert!(!result.timed_out);
        assert!(!result.used_fallback);
        assert_eq!(result.exit_code, Some(0));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hop_cap_stops_early() {
        let start = Instant::now();
        let result = tracer(true)
            .with_command(shell("printf ' 1  a\\n 2  b\\n 3  c\\n'; sleep 5"))
            .trace("127.0.0.1", 2, Duration::from_secs(10))
            .await;

        assert_eq!(result.hops.len(), 2);
        assert!(result.completed);
        assert!(!result.timed_out);
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_deadline_kills_hanging_process() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("finished");
        let script = format!("printf ' 1  a\\n'; sleep 3; touch '{}'", marker.display());

        let overall = Duration::from_secs(1);
        let start = Instant::now();
        let result = tracer(true)
            .with_command(shell(&script))
            .trace("127.0.0.1", 15, overall)
            .await;

        assert!(start.elapsed() < overall + Duration::from_secs(1));
        assert!(result.timed_out);
        assert!(!result.completed);
        assert!(!result.used_fallback);
        assert_eq!(result.hops.len(), 1);

        // The killed shell never reaches the touch
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(!marker.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_without_hops_falls_back() {
        let result = tracer(true)
            .with_command(shell("echo 'traceroute: unknown host' >&2; exit 2"))
            .trace("127.0.0.1", 15, Duration::from_secs(5))
            .await;

        assert!(result.used_fallback);
        assert_eq!(result.exit_code, Some(2));
        assert!(result.error.as_deref().unwrap_or_default().contains("status 2"));
        assert_eq!(result.attempts.len(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_with_hops_keeps_partial_data() {
        let result = tracer(true)
            .with_command(shell("printf ' 1  a\\n'; exit 1"))
            .trace("127.0.0.1", 15, Duration::from_secs(5))
            .await;

        assert!(!result.used_fallback);
        assert!(!result.completed);
        assert_eq!(result.hops.len(), 1);
    }
}

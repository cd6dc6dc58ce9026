//! shellvisor: headless host driving the lifecycle core with a simulated engine.
//!
//! Each line read from stdin is a re-entry invocation:
//! - `<url>` loads the URL into the active view
//! - `debug <action>` offers a debug action to the UI
//! - `quit` closes the UI unit

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use shellvisor::{
    Collaborators, Config, LaunchRequest, LocalServiceHost, LogWriter, MainHandle, MainMessage,
    ProcessLifecycleOrchestrator, SavedState, ShellContext, ShellUi, Subscribe, Subsystem, SubsystemError,
    TracerPidGate, DEFAULT_WORKER_THREADS,
};

#[derive(Parser, Debug)]
#[command(name = "shellvisor", version, about = "Headless browser-shell host")]
struct Args {
    /// Address to show at startup.
    #[arg(long)]
    url: Option<String>,

    /// JSON file the UI state is restored from and saved to.
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// File holding extra command-line switches, read at first creation.
    #[arg(long)]
    command_line_file: Option<PathBuf>,

    /// Run the worker behind an isolation boundary (binds without capability).
    #[arg(long)]
    isolated: bool,

    /// Worker service pool size.
    #[arg(long, default_value_t = DEFAULT_WORKER_THREADS)]
    workers: usize,

    /// Simulate a library attach failure.
    #[arg(long)]
    fail_attach: bool,

    /// Simulate an asynchronous startup failure.
    #[arg(long)]
    fail_start: bool,

    /// Simulated engine startup time in milliseconds.
    #[arg(long, default_value_t = 200)]
    startup_ms: u64,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Switches and arguments handed to the process command line.
    #[arg(last = true)]
    switches: Vec<String>,
}

#[derive(Default)]
struct HeadlessUi {
    active: Option<String>,
    window: BTreeMap<String, String>,
}

impl ShellUi for HeadlessUi {
    fn launch_view(&mut self, url: &str) {
        tracing::info!(url, "view launched");
        self.active = Some(url.to_string());
    }

    fn active_view_url(&self) -> Option<String> {
        self.active.clone()
    }

    fn load_url(&mut self, url: &str) {
        tracing::info!(url, "loading");
        self.active = Some(url.to_string());
    }

    fn handle_debug_action(&mut self, action: &str) -> bool {
        tracing::info!(action, "debug action");
        true
    }

    fn restore_window_state(&mut self, state: &BTreeMap<String, String>) {
        self.window = state.clone();
    }

    fn save_window_state(&self) -> BTreeMap<String, String> {
        self.window.clone()
    }

    fn notify(&mut self, message: &str) {
        tracing::warn!(message, "notification");
    }

    fn finish(&mut self) {
        tracing::info!("ui closed");
    }
}

struct SimulatedEngine {
    fail_attach: bool,
    fail_start: bool,
    startup: Duration,
}

#[async_trait]
impl Subsystem for SimulatedEngine {
    fn name(&self) -> &'static str {
        "simulated-engine"
    }

    fn attach_library(&self) -> Result<(), SubsystemError> {
        if self.fail_attach {
            return Err(SubsystemError::new("simulated library attach failure"));
        }
        Ok(())
    }

    async fn start(&self) -> Result<bool, SubsystemError> {
        tokio::time::sleep(self.startup).await;
        if self.fail_start {
            return Err(SubsystemError::new("simulated startup failure"));
        }
        Ok(false)
    }

    fn start_sync(&self) -> Result<(), SubsystemError> {
        std::thread::sleep(self.startup);
        if self.fail_start {
            return Err(SubsystemError::new("simulated startup failure"));
        }
        Ok(())
    }
}

fn load_state(path: Option<&PathBuf>) -> anyhow::Result<Option<SavedState>> {
    let Some(path) = path else { return Ok(None) };
    match std::fs::read_to_string(path) {
        Ok(json) => Ok(Some(
            SavedState::from_json(&json).with_context(|| format!("parsing {}", path.display()))?,
        )),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
}

fn parse_line(line: &str) -> Option<MainMessage> {
    let line = line.trim();
    match line.split_once(' ') {
        _ if line.is_empty() => None,
        _ if line == "quit" => Some(MainMessage::Destroy),
        Some(("debug", action)) => Some(MainMessage::Relaunch(LaunchRequest {
            debug_action: Some(action.trim().to_string()),
            ..LaunchRequest::default()
        })),
        _ => Some(MainMessage::Relaunch(LaunchRequest::with_url(line))),
    }
}

/// Forwards stdin lines to the main context until stdin closes.
fn spawn_stdin_reader(main: MainHandle) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if let Some(msg) = parse_line(&line) {
                        if main.post(msg).is_err() {
                            break;
                        }
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "stdin read failed");
                    break;
                }
            }
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = match &args.log_level {
        Some(level) => EnvFilter::new(format!("shellvisor={level}")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| "shellvisor=info".into()),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cfg = Config {
        worker_threads: args.workers,
        command_line_file: args.command_line_file.clone(),
        ..Config::default()
    };
    let subscribers: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let (ctx, mut main_loop) = ShellContext::new(cfg.clone(), subscribers);

    let saved = load_state(args.state_file.as_ref())?;
    let mut orchestrator = ProcessLifecycleOrchestrator::new(
        ctx.clone(),
        Collaborators {
            ui: Box::new(HeadlessUi::default()),
            subsystem: Arc::new(SimulatedEngine {
                fail_attach: args.fail_attach,
                fail_start: args.fail_start,
                startup: Duration::from_millis(args.startup_ms),
            }),
            host: Arc::new(LocalServiceHost::from_config(&cfg).isolated(args.isolated)),
            debugger: Arc::new(TracerPidGate::from_config(&cfg)),
        },
    );

    let launch = LaunchRequest {
        url: args.url.clone(),
        command_line: (!args.switches.is_empty()).then(|| args.switches.clone()),
        debug_action: None,
    };
    if let Err(e) = orchestrator.on_create(launch, saved).await {
        tracing::error!(error = %e, label = e.as_label(), "initialization failed; exiting");
        ctx.shutdown().await;
        std::process::exit(e.exit_code());
    }

    spawn_stdin_reader(ctx.main().clone());
    shellvisor::run(&mut orchestrator, &mut main_loop).await;

    if let Some(path) = &args.state_file {
        let json = orchestrator.save_state().to_json()?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    }
    ctx.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        assert!(parse_line("   ").is_none());
        assert!(matches!(parse_line("quit"), Some(MainMessage::Destroy)));
        match parse_line("debug trim-memory") {
            Some(MainMessage::Relaunch(req)) => assert_eq!(req.debug_action.as_deref(), Some("trim-memory")),
            other => panic!("unexpected {other:?}"),
        }
        match parse_line("http://example.test/") {
            Some(MainMessage::Relaunch(req)) => assert_eq!(req.url.as_deref(), Some("http://example.test/")),
            other => panic!("unexpected {other:?}"),
        }
    }
}

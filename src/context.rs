//! # Shared host context.
//!
//! [`ShellContext`] is created once per process and handed to every
//! orchestrator instance. It owns:
//! - the [`Config`]
//! - the event [`Bus`] and the listener fanning events out to subscribers
//! - the process-wide [`CommandLine`], initialized at most once
//! - the [`MainHandle`] of the main context
//!
//! ```text
//! ShellContext::new(cfg, subs) ──► (ctx, MainLoop)
//!     bus.subscribe() ──► listener task ──► SubscriberSet::emit
//! ```

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::command_line::CommandLine;
use crate::config::Config;
use crate::events::{Bus, Event, EventKind};
use crate::main_loop::{MainHandle, MainLoop};
use crate::subscribers::{Subscribe, SubscriberSet};

struct Inner {
    config: Config,
    bus: Bus,
    command_line: OnceLock<CommandLine>,
    main: MainHandle,
    listener_token: CancellationToken,
    listener: Mutex<Option<JoinHandle<()>>>,
}

/// Process-wide state shared by every orchestrator instance.
///
/// Cheap to clone.
#[derive(Clone)]
pub struct ShellContext {
    inner: Arc<Inner>,
}

impl ShellContext {
    /// Creates the context and its main loop, and starts the subscriber listener.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> (Self, MainLoop) {
        let bus = Bus::new(config.bus_capacity_clamped());
        let main_loop = MainLoop::new();
        let listener_token = CancellationToken::new();
        let listener = spawn_listener(&bus, subscribers, listener_token.clone());

        let ctx = Self {
            inner: Arc::new(Inner {
                config,
                bus,
                command_line: OnceLock::new(),
                main: main_loop.handle(),
                listener_token,
                listener: Mutex::new(Some(listener)),
            }),
        };
        (ctx, main_loop)
    }

    /// Initializes the process-wide command line; returns whether this call did it.
    ///
    /// The command-line file (if configured and present) is read first, then
    /// `params` are appended. Once initialized, later parameters are logged and
    /// ignored.
    pub fn init_command_line(&self, params: Option<&[String]>) -> bool {
        let mut applied = false;
        let cl = self.inner.command_line.get_or_init(|| {
            applied = true;
            self.build_command_line(params)
        });

        if applied {
            self.inner.bus.publish(
                Event::new(EventKind::CommandLineInitialized)
                    .with_reason(format!("{} params", cl.argv().len())),
            );
        } else if params.is_some() {
            self.inner.bus.publish(Event::new(EventKind::CommandLineIgnored));
        }
        applied
    }

    fn build_command_line(&self, params: Option<&[String]>) -> CommandLine {
        let from_file = match &self.inner.config.command_line_file {
            Some(path) => match CommandLine::from_file(path) {
                Ok(cl) => cl,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "command line file unreadable");
                    None
                }
            },
            None => None,
        };
        let mut cl = from_file.unwrap_or_else(CommandLine::new);
        if let Some(params) = params {
            cl.append_switches_and_arguments(params.iter().cloned());
        }
        cl
    }

    /// The process-wide command line, once initialized.
    pub fn command_line(&self) -> Option<&CommandLine> {
        self.inner.command_line.get()
    }

    /// True if the command line was initialized and carries `name`.
    pub fn has_switch(&self, name: &str) -> bool {
        self.command_line().is_some_and(|cl| cl.has_switch(name))
    }

    /// Host configuration.
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Event bus.
    pub fn bus(&self) -> &Bus {
        &self.inner.bus
    }

    /// Handle to the main context.
    pub fn main(&self) -> &MainHandle {
        &self.inner.main
    }

    /// Stops the subscriber listener after delivering events already published.
    pub async fn shutdown(&self) {
        self.inner.listener_token.cancel();
        let listener = self
            .inner
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(listener) = listener {
            if let Err(e) = listener.await {
                tracing::warn!(error = %e, "event listener task failed");
            }
        }
    }
}

/// Subscribes to the bus and forwards events to the subscriber set.
fn spawn_listener(
    bus: &Bus,
    subscribers: Vec<Arc<dyn Subscribe>>,
    token: CancellationToken,
) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    let set = SubscriberSet::new(subscribers, bus.clone());
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                ev = rx.recv() => match ev {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "event listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
        while let Ok(ev) = rx.try_recv() {
            set.emit(&ev);
        }
        set.shutdown().await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_line::switches;
    use async_trait::async_trait;
    use std::io::Write;

    struct Collect(Arc<Mutex<Vec<EventKind>>>);

    #[async_trait]
    impl Subscribe for Collect {
        async fn on_event(&self, event: &Event) {
            self.0.lock().unwrap().push(event.kind);
        }

        fn name(&self) -> &'static str {
            "collect"
        }
    }

    fn params(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_command_line_initialized_at_most_once() {
        let (ctx, _main) = ShellContext::new(Config::default(), Vec::new());

        assert!(ctx.init_command_line(Some(&params(&["--first"])[..])));
        assert!(!ctx.init_command_line(Some(&params(&["--second"])[..])));

        assert!(ctx.has_switch("first"));
        assert!(!ctx.has_switch("second"));
    }

    #[tokio::test]
    async fn test_command_line_file_read_before_params() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "shell --{} --from-file", switches::RUN_LAYOUT_TEST).unwrap();
        let cfg = Config {
            command_line_file: Some(file.path().to_path_buf()),
            ..Config::default()
        };
        let (ctx, _main) = ShellContext::new(cfg, Vec::new());

        ctx.init_command_line(Some(&params(&["--from-launch"])[..]));

        let cl = ctx.command_line().unwrap();
        assert_eq!(cl.program(), Some("shell"));
        assert!(cl.has_switch(switches::RUN_LAYOUT_TEST));
        assert!(cl.has_switch("from-launch"));
    }

    #[tokio::test]
    async fn test_missing_command_line_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            command_line_file: Some(dir.path().join("absent")),
            ..Config::default()
        };
        let (ctx, _main) = ShellContext::new(cfg, Vec::new());

        assert!(ctx.init_command_line(None));
        assert!(ctx.command_line().unwrap().argv().is_empty());
    }

    #[tokio::test]
    async fn test_events_reach_subscribers_before_shutdown_returns() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (ctx, _main) =
            ShellContext::new(Config::default(), vec![Arc::new(Collect(Arc::clone(&seen)))]);

        ctx.init_command_line(None);
        ctx.init_command_line(Some(&params(&["--late"])[..]));
        ctx.shutdown().await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec![EventKind::CommandLineInitialized, EventKind::CommandLineIgnored]
        );
    }

    struct Explode;

    #[async_trait]
    impl Subscribe for Explode {
        async fn on_event(&self, _event: &Event) {
            panic!("subscriber blew up");
        }

        fn name(&self) -> &'static str {
            "explode"
        }
    }

    #[tokio::test]
    async fn test_shutdown_returns_with_panicking_subscriber_and_is_repeatable() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (ctx, _main) = ShellContext::new(
            Config::default(),
            vec![Arc::new(Explode), Arc::new(Collect(Arc::clone(&seen)))],
        );

        ctx.init_command_line(None);
        ctx.shutdown().await;
        ctx.shutdown().await;

        assert!(seen.lock().unwrap().contains(&EventKind::CommandLineInitialized));
    }
}

//! Fakes for orchestrator tests.

use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::Config;
use crate::context::ShellContext;
use crate::error::{ServiceError, SubsystemError};
use crate::main_loop::MainLoop;
use crate::service::{BindingSink, LocalServiceHost, ServiceHost, ServiceTarget};
use crate::startup::Subsystem;

use super::collab::{DebuggerGate, ShellUi};
use super::orchestrator::{Collaborators, ProcessLifecycleOrchestrator};

/// Ordered record of side effects across collaborators.
pub(crate) type Journal = Arc<Mutex<Vec<String>>>;

fn note(journal: &Journal, entry: impl Into<String>) {
    journal.lock().unwrap().push(entry.into());
}

#[derive(Default)]
pub(crate) struct UiLog {
    pub launched: Vec<String>,
    pub loaded: Vec<String>,
    pub notified: Vec<String>,
    pub restored: Option<BTreeMap<String, String>>,
    pub finished: usize,
    pub released: usize,
    pub active: Option<String>,
    pub consume_debug: bool,
}

pub(crate) struct FakeUi {
    log: Arc<Mutex<UiLog>>,
    journal: Journal,
}

impl ShellUi for FakeUi {
    fn launch_view(&mut self, url: &str) {
        let mut log = self.log.lock().unwrap();
        log.launched.push(url.to_string());
        log.active = Some(url.to_string());
    }

    fn active_view_url(&self) -> Option<String> {
        self.log.lock().unwrap().active.clone()
    }

    fn load_url(&mut self, url: &str) {
        let mut log = self.log.lock().unwrap();
        log.loaded.push(url.to_string());
        log.active = Some(url.to_string());
    }

    fn handle_debug_action(&mut self, _action: &str) -> bool {
        self.log.lock().unwrap().consume_debug
    }

    fn restore_window_state(&mut self, state: &BTreeMap<String, String>) {
        self.log.lock().unwrap().restored = Some(state.clone());
    }

    fn save_window_state(&self) -> BTreeMap<String, String> {
        BTreeMap::from([("zoom".to_string(), "2".to_string())])
    }

    fn notify(&mut self, message: &str) {
        self.log.lock().unwrap().notified.push(message.to_string());
    }

    fn finish(&mut self) {
        self.log.lock().unwrap().finished += 1;
        note(&self.journal, "finish");
    }

    fn release(&mut self) {
        self.log.lock().unwrap().released += 1;
        note(&self.journal, "release");
    }
}

pub(crate) struct FakeEngine {
    pub attach: Result<(), SubsystemError>,
    pub start: Result<bool, SubsystemError>,
    pub sync: Result<(), SubsystemError>,
    pub starts: AtomicUsize,
}

impl FakeEngine {
    pub fn ok() -> Self {
        Self {
            attach: Ok(()),
            start: Ok(false),
            sync: Ok(()),
            starts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Subsystem for FakeEngine {
    fn attach_library(&self) -> Result<(), SubsystemError> {
        self.attach.clone()
    }

    async fn start(&self) -> Result<bool, SubsystemError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.start.clone()
    }

    fn start_sync(&self) -> Result<(), SubsystemError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.sync.clone()
    }
}

pub(crate) struct FakeGate {
    attached: AtomicBool,
    pub waits: AtomicUsize,
    journal: Journal,
}

#[async_trait]
impl DebuggerGate for FakeGate {
    fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    async fn wait_for_attach(&self) {
        self.waits.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.attached.store(true, Ordering::SeqCst);
        note(&self.journal, "debugger-attached");
    }
}

/// Host that journals every call and can hold bind replies back.
pub(crate) struct RecordingHost {
    inner: LocalServiceHost,
    journal: Journal,
    hold_replies: bool,
    held: Mutex<Vec<BindingSink>>,
}

impl RecordingHost {
    pub fn held(&self) -> Vec<BindingSink> {
        std::mem::take(&mut *self.held.lock().unwrap())
    }

    pub fn inner(&self) -> &LocalServiceHost {
        &self.inner
    }
}

impl ServiceHost for RecordingHost {
    fn is_isolated(&self) -> bool {
        self.inner.is_isolated()
    }

    fn start_service(&self, target: &ServiceTarget) -> Result<(), ServiceError> {
        note(&self.journal, "start");
        self.inner.start_service(target)
    }

    fn stop_service(&self, target: &ServiceTarget) -> Result<bool, ServiceError> {
        note(&self.journal, "stop");
        self.inner.stop_service(target)
    }

    fn bind_service(&self, target: &ServiceTarget, sink: BindingSink) -> Result<(), ServiceError> {
        note(&self.journal, "bind");
        if self.hold_replies {
            self.held.lock().unwrap().push(sink);
            return Ok(());
        }
        self.inner.bind_service(target, sink)
    }

    fn unbind_service(&self, target: &ServiceTarget) -> Result<(), ServiceError> {
        note(&self.journal, "unbind");
        self.inner.unbind_service(target)
    }
}

/// Knobs for [`Harness::new`].
pub(crate) struct Setup {
    pub config: Config,
    pub engine: FakeEngine,
    pub isolated: bool,
    pub hold_replies: bool,
    pub debugger_attached: bool,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            config: Config {
                worker_threads: 2,
                ..Config::default()
            },
            engine: FakeEngine::ok(),
            isolated: false,
            hold_replies: false,
            debugger_attached: false,
        }
    }
}

pub(crate) struct Harness {
    pub ctx: ShellContext,
    pub main: MainLoop,
    pub ui: Arc<Mutex<UiLog>>,
    pub journal: Journal,
    pub host: Arc<RecordingHost>,
    pub engine: Arc<FakeEngine>,
    pub gate: Arc<FakeGate>,
}

impl Harness {
    pub fn new(setup: Setup) -> Self {
        let journal: Journal = Arc::default();
        let (ctx, main) = ShellContext::new(setup.config, Vec::new());
        let host = Arc::new(RecordingHost {
            inner: LocalServiceHost::from_config(ctx.config()).isolated(setup.isolated),
            journal: Arc::clone(&journal),
            hold_replies: setup.hold_replies,
            held: Mutex::new(Vec::new()),
        });
        let gate = Arc::new(FakeGate {
            attached: AtomicBool::new(setup.debugger_attached),
            waits: AtomicUsize::new(0),
            journal: Arc::clone(&journal),
        });
        Self {
            ctx,
            main,
            ui: Arc::default(),
            journal,
            host,
            engine: Arc::new(setup.engine),
            gate,
        }
    }

    /// Orchestrator for a fresh UI unit sharing this process context.
    pub fn orchestrator(&self) -> ProcessLifecycleOrchestrator {
        let ui = FakeUi {
            log: Arc::clone(&self.ui),
            journal: Arc::clone(&self.journal),
        };
        ProcessLifecycleOrchestrator::new(
            self.ctx.clone(),
            Collaborators {
                ui: Box::new(ui),
                subsystem: self.engine.clone(),
                host: self.host.clone(),
                debugger: self.gate.clone(),
            },
        )
    }

    /// Dispatches messages until the main context stays idle; true if the UI unit ended.
    pub async fn pump(&mut self, orch: &mut ProcessLifecycleOrchestrator) -> bool {
        while let Ok(Some(msg)) = tokio::time::timeout(Duration::from_millis(100), self.main.next()).await {
            if let ControlFlow::Break(()) = orch.dispatch(msg) {
                return true;
            }
        }
        false
    }

    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.journal().iter().filter(|e| *e == entry).count()
    }
}

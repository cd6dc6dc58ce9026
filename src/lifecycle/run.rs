use crate::main_loop::MainLoop;

use super::orchestrator::ProcessLifecycleOrchestrator;
use super::shutdown::wait_for_shutdown_signal;

/// Pumps the main context until the UI unit is destroyed.
///
/// A termination signal tears the orchestrator down the same way a
/// [`MainMessage::Destroy`](crate::MainMessage::Destroy) does.
pub async fn run(orchestrator: &mut ProcessLifecycleOrchestrator, main: &mut MainLoop) {
    if orchestrator.is_destroyed() {
        return;
    }
    let signal = wait_for_shutdown_signal();
    tokio::pin!(signal);
    let mut signals_enabled = true;

    loop {
        tokio::select! {
            res = &mut signal, if signals_enabled => {
                match res {
                    Ok(()) => {
                        orchestrator.shutdown();
                        return;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "signal listeners unavailable; relying on Destroy only");
                        signals_enabled = false;
                    }
                }
            }
            msg = main.next() => {
                let Some(msg) = msg else {
                    orchestrator.on_destroy();
                    return;
                };
                if orchestrator.dispatch(msg).is_break() {
                    return;
                }
            }
        }
    }
}

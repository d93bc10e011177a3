//! Process control - 同一ホスト上のバッチプロセスへのシグナルと生存確認
//!
//! pid は別ホストでは意味を持たないので、`hostname` が自ホストと一致する
//! バッチにしか触りません。kill 系は拒否を通常の結果（`KillOutcome`）で
//! 返し、生存確認は別ホストならエラーにします。

use tracing::{info, warn};

use crate::app::builder::Batchy;
use crate::domain::{Batch, BatchyError};
use crate::ports::Signal;

/// What happened to a kill request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillOutcome {
    /// The signal was handed to the process.
    Signalled,

    /// Same host, but the signal could not be delivered (process gone).
    NotDelivered,

    /// The batch ran on another host; nothing was sent.
    ForeignHost,

    /// The batch never recorded a pid.
    NoProcess,
}

impl KillOutcome {
    pub fn is_signalled(self) -> bool {
        self == KillOutcome::Signalled
    }
}

impl Batchy {
    /// SIGTERM the batch's process. The body is expected to observe it and
    /// end up `errored`.
    pub fn kill(&self, batch: &Batch) -> KillOutcome {
        self.signal(batch, Signal::Terminate)
    }

    /// SIGKILL the batch's process.
    pub fn kill_force(&self, batch: &Batch) -> KillOutcome {
        self.signal(batch, Signal::Kill)
    }

    /// Is the batch's process still alive? Only answerable on its own host.
    pub fn process_running(&self, batch: &Batch) -> Result<bool, BatchyError> {
        let current_host = self.identity.hostname();
        if batch.hostname.as_deref() != Some(current_host.as_str()) {
            return Err(BatchyError::ForeignHost {
                id: batch.id,
                batch_host: batch.hostname.clone(),
                current_host,
            });
        }
        Ok(batch.pid.is_some_and(|pid| self.probe.is_alive(pid)))
    }

    fn signal(&self, batch: &Batch, signal: Signal) -> KillOutcome {
        let Some(pid) = batch.pid else {
            return KillOutcome::NoProcess;
        };

        let current_host = self.identity.hostname();
        if batch.hostname.as_deref() != Some(current_host.as_str()) {
            warn!(
                batch = %batch.id,
                batch_host = batch.hostname.as_deref().unwrap_or_default(),
                current_host = %current_host,
                %signal,
                "refusing to signal a process on another host"
            );
            return KillOutcome::ForeignHost;
        }

        if self.signals.send_signal(pid, signal) {
            info!(batch = %batch.id, pid, %signal, "signal sent");
            KillOutcome::Signalled
        } else {
            warn!(batch = %batch.id, pid, %signal, "signal not delivered");
            KillOutcome::NotDelivered
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::domain::BatchOptions;
    use crate::impls::{InMemoryBatchStore, ScriptedProcess};
    use crate::ports::BatchStore;

    fn setup() -> (Batchy, Arc<ScriptedProcess>) {
        let process = Arc::new(ScriptedProcess::new(1000, "example.com"));
        let batchy = Batchy::builder()
            .store(Arc::new(InMemoryBatchStore::new()))
            .process(process.clone())
            .build()
            .unwrap();
        (batchy, process)
    }

    async fn started_as(batchy: &Batchy, process: &ScriptedProcess, pid: u32) -> Batch {
        process.become_process(pid);
        let mut batch = batchy.store().create(BatchOptions::new("job")).await.unwrap();
        batchy.start(&mut batch).await.unwrap();
        process.become_process(1000);
        batch
    }

    #[tokio::test]
    async fn kill_sends_term_on_same_host() {
        let (batchy, process) = setup();
        let batch = started_as(&batchy, &process, 2000).await;

        assert_eq!(batchy.kill(&batch), KillOutcome::Signalled);
        assert_eq!(process.sent_signals(), vec![(2000, Signal::Terminate)]);
        assert!(batchy.process_running(&batch).unwrap());
    }

    #[tokio::test]
    async fn kill_force_sends_kill() {
        let (batchy, process) = setup();
        let batch = started_as(&batchy, &process, 2000).await;

        assert!(batchy.kill_force(&batch).is_signalled());
        assert_eq!(process.sent_signals(), vec![(2000, Signal::Kill)]);
        assert!(!batchy.process_running(&batch).unwrap());
    }

    #[tokio::test]
    async fn cross_host_kill_is_refused_without_sending() {
        let (batchy, process) = setup();
        let batch = started_as(&batchy, &process, 2000).await;
        process.move_to_host("other.com");

        assert_eq!(batchy.kill(&batch), KillOutcome::ForeignHost);
        assert_eq!(batchy.kill_force(&batch), KillOutcome::ForeignHost);
        assert!(process.sent_signals().is_empty());
    }

    #[tokio::test]
    async fn dead_process_is_not_delivered() {
        let (batchy, process) = setup();
        let batch = started_as(&batchy, &process, 2000).await;
        process.terminate(2000);

        assert_eq!(batchy.kill(&batch), KillOutcome::NotDelivered);
        assert!(!batchy.process_running(&batch).unwrap());
    }

    #[tokio::test]
    async fn unstarted_batch_has_no_process() {
        let (batchy, _) = setup();
        let batch = batchy.store().create(BatchOptions::new("job")).await.unwrap();
        assert_eq!(batchy.kill(&batch), KillOutcome::NoProcess);
    }

    #[tokio::test]
    async fn process_running_on_another_host_is_an_error() {
        let (batchy, process) = setup();
        let batch = started_as(&batchy, &process, 2000).await;
        process.move_to_host("other.com");

        let err = batchy.process_running(&batch).unwrap_err();
        match err {
            BatchyError::ForeignHost {
                batch_host,
                current_host,
                ..
            } => {
                assert_eq!(batch_host.as_deref(), Some("example.com"));
                assert_eq!(current_host, "other.com");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

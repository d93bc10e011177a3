//! BatchyBuilder - 依存のワイヤリング
//!
//! ストアは必須（Fail-fast）。プロセス系と時刻は省略すると実ホスト
//! （`HostProcess` / `SystemClock`）になります。

use std::sync::Arc;

use crate::app::config::Config;
use crate::impls::HostProcess;
use crate::ports::{BatchStore, Clock, ProcessIdentity, ProcessProbe, SignalSender, SystemClock};

/// Entry point. Holds the store, the process collaborators and the config.
///
/// Cloning is cheap; clones share everything.
#[derive(Clone)]
pub struct Batchy {
    pub(crate) store: Arc<dyn BatchStore>,
    pub(crate) identity: Arc<dyn ProcessIdentity>,
    pub(crate) probe: Arc<dyn ProcessProbe>,
    pub(crate) signals: Arc<dyn SignalSender>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config: Arc<Config>,
}

impl Batchy {
    pub fn builder() -> BatchyBuilder {
        BatchyBuilder::new()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn BatchStore> {
        &self.store
    }

    pub fn identity(&self) -> &Arc<dyn ProcessIdentity> {
        &self.identity
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no batch store configured")]
    MissingStore,
}

#[derive(Default)]
pub struct BatchyBuilder {
    store: Option<Arc<dyn BatchStore>>,
    identity: Option<Arc<dyn ProcessIdentity>>,
    probe: Option<Arc<dyn ProcessProbe>>,
    signals: Option<Arc<dyn SignalSender>>,
    clock: Option<Arc<dyn Clock>>,
    config: Config,
}

impl BatchyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(mut self, store: Arc<dyn BatchStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use one object for identity, liveness and signals.
    pub fn process<P>(mut self, process: Arc<P>) -> Self
    where
        P: ProcessIdentity + ProcessProbe + SignalSender + 'static,
    {
        self.identity = Some(process.clone());
        self.probe = Some(process.clone());
        self.signals = Some(process);
        self
    }

    pub fn identity(mut self, identity: Arc<dyn ProcessIdentity>) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn probe(mut self, probe: Arc<dyn ProcessProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn signals(mut self, signals: Arc<dyn SignalSender>) -> Self {
        self.signals = Some(signals);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Batchy, BuildError> {
        let store = self.store.ok_or(BuildError::MissingStore)?;

        // 足りない役割は一つの HostProcess で埋める
        let mut host: Option<Arc<HostProcess>> = None;
        let mut host_process = || {
            host.get_or_insert_with(|| Arc::new(HostProcess::new()))
                .clone()
        };

        let identity = match self.identity {
            Some(identity) => identity,
            None => host_process() as Arc<dyn ProcessIdentity>,
        };
        let probe = match self.probe {
            Some(probe) => probe,
            None => host_process() as Arc<dyn ProcessProbe>,
        };
        let signals = match self.signals {
            Some(signals) => signals,
            None => host_process() as Arc<dyn SignalSender>,
        };

        Ok(Batchy {
            store,
            identity,
            probe,
            signals,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            config: Arc::new(self.config),
        })
    }
}

//! ScriptedProcess - テスト・デモ用のプロセス
//!
//! pid / hostname を固定し、どの pid が生きているかを台本として持ちます。
//! 送ったシグナルは記録され、`Kill` を受けた pid は死んだ扱いになります。

use std::collections::HashSet;
use std::sync::Mutex;

use crate::ports::{ProcessIdentity, ProcessProbe, Signal, SignalSender};

#[derive(Debug)]
struct Script {
    pid: u32,
    hostname: String,
    title: String,
    alive: HashSet<u32>,
    sent: Vec<(u32, Signal)>,
}

#[derive(Debug)]
pub struct ScriptedProcess {
    script: Mutex<Script>,
}

impl ScriptedProcess {
    /// The process itself (`pid`) starts out alive.
    pub fn new(pid: u32, hostname: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(Script {
                pid,
                hostname: hostname.into(),
                title: "scripted".to_string(),
                alive: HashSet::from([pid]),
                sent: Vec::new(),
            }),
        }
    }

    /// Pretend to be another process (e.g. a second worker on the same host).
    pub fn become_process(&self, pid: u32) {
        let mut script = self.lock();
        script.pid = pid;
        script.alive.insert(pid);
    }

    /// Pretend to be on another host.
    pub fn move_to_host(&self, hostname: impl Into<String>) {
        self.lock().hostname = hostname.into();
    }

    pub fn spawn(&self, pid: u32) {
        self.lock().alive.insert(pid);
    }

    pub fn terminate(&self, pid: u32) {
        self.lock().alive.remove(&pid);
    }

    pub fn sent_signals(&self) -> Vec<(u32, Signal)> {
        self.lock().sent.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ProcessIdentity for ScriptedProcess {
    fn pid(&self) -> u32 {
        self.lock().pid
    }

    fn hostname(&self) -> String {
        self.lock().hostname.clone()
    }

    fn title(&self) -> String {
        self.lock().title.clone()
    }

    fn set_title(&self, title: &str) {
        self.lock().title = title.to_string();
    }
}

impl ProcessProbe for ScriptedProcess {
    fn is_alive(&self, pid: u32) -> bool {
        self.lock().alive.contains(&pid)
    }
}

impl SignalSender for ScriptedProcess {
    fn send_signal(&self, pid: u32, signal: Signal) -> bool {
        let mut script = self.lock();
        script.sent.push((pid, signal));
        let delivered = script.alive.contains(&pid);
        if delivered && signal == Signal::Kill {
            script.alive.remove(&pid);
        }
        delivered
    }
}

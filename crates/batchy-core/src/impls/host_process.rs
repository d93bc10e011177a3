//! HostProcess - 実際の OS プロセスを相手にする実装
//!
//! pid / hostname / 生存確認 / シグナル送信は `sysinfo` 経由。
//! プロセスのタイトルは `$0` を書き換える手段が移植的に存在しないため、
//! プロセス内のラベルとして保持します。

use std::sync::RwLock;

use sysinfo::{Pid, ProcessRefreshKind, RefreshKind, System};

use crate::ports::{ProcessIdentity, ProcessProbe, Signal, SignalSender};

pub struct HostProcess {
    pid: u32,
    hostname: String,
    title: RwLock<String>,
}

impl HostProcess {
    pub fn new() -> Self {
        let pid = sysinfo::get_current_pid()
            .map(|pid| pid.as_u32())
            .unwrap_or_else(|_| std::process::id());
        let hostname = System::host_name().unwrap_or_else(|| "localhost".to_string());
        let title = std::env::args().next().unwrap_or_default();
        Self {
            pid,
            hostname,
            title: RwLock::new(title),
        }
    }

    fn processes() -> System {
        System::new_with_specifics(RefreshKind::new().with_processes(ProcessRefreshKind::new()))
    }
}

impl Default for HostProcess {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessIdentity for HostProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn hostname(&self) -> String {
        self.hostname.clone()
    }

    fn title(&self) -> String {
        self.title
            .read()
            .map(|t| t.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    fn set_title(&self, title: &str) {
        let mut guard = self.title.write().unwrap_or_else(|e| e.into_inner());
        *guard = title.to_string();
    }
}

impl ProcessProbe for HostProcess {
    fn is_alive(&self, pid: u32) -> bool {
        Self::processes().process(Pid::from_u32(pid)).is_some()
    }
}

impl SignalSender for HostProcess {
    fn send_signal(&self, pid: u32, signal: Signal) -> bool {
        let system = Self::processes();
        let Some(process) = system.process(Pid::from_u32(pid)) else {
            return false;
        };
        match signal {
            Signal::Terminate => process.kill_with(sysinfo::Signal::Term).unwrap_or(false),
            Signal::Kill => process.kill(),
        }
    }
}

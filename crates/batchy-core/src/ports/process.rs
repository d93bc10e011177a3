//! Process ports - 自プロセスの識別、生存確認、シグナル送信
//!
//! pid はホストをまたぐと意味を持たないので、生存確認とシグナル送信は
//! 常に「このホスト上の pid」として扱われます。ホスト一致の判定は
//! `app::process_control` が行います。

use std::fmt;

/// Who "this process" is.
pub trait ProcessIdentity: Send + Sync {
    fn pid(&self) -> u32;

    fn hostname(&self) -> String;

    /// Label shown for this process (the `$0` analogue).
    fn title(&self) -> String;

    fn set_title(&self, title: &str);
}

/// Answers "is pid P alive on this host".
pub trait ProcessProbe: Send + Sync {
    fn is_alive(&self, pid: u32) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// SIGTERM: ask the process to stop.
    Terminate,

    /// SIGKILL: no way for the process to observe it.
    Kill,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Terminate => f.write_str("TERM"),
            Signal::Kill => f.write_str("KILL"),
        }
    }
}

/// Delivers a signal to a local pid. Returns whether it was delivered.
pub trait SignalSender: Send + Sync {
    fn send_signal(&self, pid: u32, signal: Signal) -> bool;
}

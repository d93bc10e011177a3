//! Ports - 抽象化レイヤー
//!
//! 外部コラボレーター（永続ストア、OS プロセス、時刻、ID 生成）への
//! インターフェースです。実装は `impls` にあります。

pub mod batch_store;
pub mod clock;
pub mod id_generator;
pub mod process;

pub use self::batch_store::{BatchStore, StoreError};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::process::{ProcessIdentity, ProcessProbe, Signal, SignalSender};

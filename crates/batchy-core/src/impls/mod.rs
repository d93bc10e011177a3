//! Impls - ports の実装
//!
//! - **InMemoryBatchStore**: 開発・テスト用のストア（行の形は本番テーブルと同じ）
//! - **HostProcess**: 実プロセス（sysinfo）
//! - **ScriptedProcess**: 台本どおりに振る舞うプロセス（テスト・デモ用）

#[cfg(test)]
pub(crate) mod faulty_store;
pub mod host_process;
pub mod inmem_store;
pub mod scripted_process;

pub use self::host_process::HostProcess;
pub use self::inmem_store::{BatchRow, InMemoryBatchStore};
pub use self::scripted_process::ScriptedProcess;

//! batchy-core
//!
//! Lifecycle tracking for batch jobs: persisted run state, duplicate and
//! zombie detection, same-host process control and lifecycle callbacks.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, state, failure, batch, callbacks, errors）
//! - **ports**: 抽象化レイヤー（BatchStore, Clock, IdGenerator, プロセス系）
//! - **app**: アプリケーションロジック（builder, config, context, runner, など）
//! - **impls**: 実装（InMemoryBatchStore, HostProcess, ScriptedProcess）
//!
//! # 使用例
//! ```no_run
//! use std::sync::Arc;
//! use batchy_core::app::Batchy;
//! use batchy_core::domain::{Batch, BatchFailure, BatchOptions};
//! use batchy_core::impls::InMemoryBatchStore;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let batchy = Batchy::builder()
//!     .store(Arc::new(InMemoryBatchStore::new()))
//!     .build()?;
//!
//! let batch = batchy
//!     .run(
//!         BatchOptions::new("nightly report").guid("report"),
//!         async |_: &mut Batch| -> Result<(), BatchFailure> { Ok(()) },
//!     )
//!     .await?;
//! println!("{} ended {}", batch.id, batch.state);
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;

//! App - アプリケーション層
//!
//! ports を組み合わせてバッチのライフサイクルを実装します。操作はすべて
//! `Batchy` のメソッドで、責務ごとにファイルを分けています。
//!
//! # 主要コンポーネント
//! - **BatchyBuilder**: ストア・プロセス・時計・設定のワイヤリング
//! - **Config**: 動作フラグとグローバルコールバック
//! - **context**: 実行中バッチ（ネスト対応）
//! - **lifecycle**: start / finish
//! - **detector**: 重複・ゾンビ・期限切れ
//! - **process_control**: kill / kill_force / process_running
//! - **sweep**: clean_expired / clean_expired_force
//! - **runner**: run

pub mod builder;
pub mod config;
pub mod context;
pub mod detector;
pub mod lifecycle;
pub mod process_control;
pub mod runner;
pub mod sweep;

// 主要な型を再エクスポート
pub use self::builder::{Batchy, BatchyBuilder, BuildError};
pub use self::config::{Config, DEFAULT_PROCESS_NAME_PREFIX, Settings};
pub use self::context::{CurrentBatch, current, current_id};
pub use self::process_control::KillOutcome;

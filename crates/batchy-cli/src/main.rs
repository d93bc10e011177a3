use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::info;
use tracing_subscriber::EnvFilter;

use batchy_core::app::{Batchy, Config, Settings, current};
use batchy_core::domain::{Batch, BatchFailure, BatchOptions, CallbackError};
use batchy_core::impls::{InMemoryBatchStore, ScriptedProcess};
use batchy_core::ports::{BatchStore, ProcessIdentity};

const HOST: &str = "demo.local";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=batchy_core=debug で遷移ログまで見える
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // (A) 設定: BATCHY_* 環境変数 + 重複禁止 + グローバルコールバック
    let config = Config::new(Settings::from_env())
        .allow_duplicates(false)
        .add_global_failure_callback(|batch: &Batch| -> Result<(), CallbackError> {
            let reason = batch.error().map(BatchFailure::text).unwrap_or_default();
            println!("  [global failure] {} -> {}", batch.name, reason);
            Ok(())
        })
        .add_global_ensure_callback(|batch: &Batch| -> Result<(), CallbackError> {
            println!("  [global ensure] {} ended {}", batch.name, batch.state);
            Ok(())
        });

    let store = Arc::new(InMemoryBatchStore::new());
    let process = Arc::new(ScriptedProcess::new(4242, HOST));
    let batchy = Batchy::builder()
        .store(store.clone())
        .process(process.clone())
        .config(config)
        .build()?;

    // (B) ネストした実行: 内側のバッチの親は外側
    let report = batchy
        .run(
            BatchOptions::new("nightly report").guid("nightly-report"),
            async |outer: &mut Batch| -> Result<(), BatchFailure> {
                info!(title = %process.title(), "outer body");
                let inner = batchy
                    .run(
                        BatchOptions::new("export csv"),
                        async |_: &mut Batch| -> Result<(), BatchFailure> {
                            let depth = current().map_or(0, |frame| frame.depth);
                            println!("  export running at depth {depth}");
                            Ok(())
                        },
                    )
                    .await?;
                println!("  {} is a child of {}", inner.name, outer.name);
                Ok(())
            },
        )
        .await?;
    println!("report: {}", report.state);

    // (C) 失敗は記録されて吸収される（raise_errors = false）
    let failed = batchy
        .run(
            BatchOptions::new("import feed"),
            async |_: &mut Batch| -> Result<(), BatchFailure> {
                Err(std::io::Error::other("feed returned 503").into())
            },
        )
        .await?;
    if let Some(row) = store.row(failed.id).await {
        println!("persisted row: {}", serde_json::to_string_pretty(&row)?);
    }

    // (D) 別プロセスが同じ guid で実行中 → ignored。その後、死んだら回収
    process.become_process(5151);
    let mut stuck = batchy
        .store()
        .create(
            BatchOptions::new("reindex")
                .guid("reindex")
                .expire_at(Utc::now() - Duration::minutes(1)),
        )
        .await?;
    batchy.start(&mut stuck).await?;
    process.become_process(4242);

    let ignored = batchy
        .run(
            BatchOptions::new("reindex")
                .guid("reindex")
                .on_ignore(|_: &Batch| -> Result<(), CallbackError> {
                    println!("  reindex already running elsewhere, skipped");
                    Ok(())
                }),
            async |_: &mut Batch| -> Result<(), BatchFailure> { Ok(()) },
        )
        .await?;
    println!("second reindex: {}", ignored.state);

    // (E) 期限切れの掃除。SIGKILL は設定で禁止されているので何もしない
    let termed = batchy.clean_expired().await?;
    println!("clean_expired: {termed:?}");
    let killed = batchy.clean_expired_force().await?;
    println!("clean_expired_force: {killed:?}");

    process.terminate(5151);
    let reclaimed = batchy.clear_zombies(&ignored).await?;
    println!("reclaimed zombies: {reclaimed:?}");

    Ok(())
}

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;

use pire_core::prelude::*;

/// 失敗を起こすタスクを supervise して、結果を JSON で表示する
#[derive(Debug, Parser)]
#[command(name = "pire", version)]
struct Cli {
    /// タスクに発生させる失敗の種類（例: ValueError）。省略すると成功する
    #[arg(long)]
    raise: Option<String>,

    /// ハンドラ・除外を宣言した JSON ファイル
    #[arg(long)]
    policy: Option<PathBuf>,

    /// "release" cleanup を設定する（policy より後に適用）
    #[arg(long)]
    cleanup: bool,

    /// タスクに渡す引数
    #[arg(default_value = "pire")]
    name: String,
}

#[derive(Serialize)]
struct Summary<'a> {
    report: &'a CallReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<String>,
}

/// policy から名前で参照できるハンドラ
fn catalog() -> Result<HandlerCatalog<String, String>, Box<dyn std::error::Error>> {
    let mut catalog = HandlerCatalog::new();
    catalog.add_handler("log", |failure, name| {
        tracing::info!(%failure, %name, "recovered");
        Ok(())
    })?;
    catalog.add_handler("escalate", |failure, _| {
        Err(Failure::new(&kinds::RUNTIME_ERROR, format!("escalated: {failure}")))
    })?;
    catalog.add_cleanup("release", |name| Ok(format!("released {name}")))?;
    Ok(catalog)
}

fn build_task(cli: &Cli, registry: &KindRegistry) -> Result<Task<String, String>, Box<dyn std::error::Error>> {
    let kind = match &cli.raise {
        Some(name) => Some(
            registry
                .resolve(name)
                .ok_or_else(|| format!("unknown failure kind '{name}'"))?,
        ),
        None => None,
    };

    let task = Task::new("greet", move |name: &String| match kind {
        Some(kind) => Err(Failure::new(kind, format!("could not greet {name}"))),
        None => Ok(format!("Hello, {name}!")),
    });

    let catalog = catalog()?;
    let mut task = match &cli.policy {
        Some(path) => SupervisionConfig::from_path(path)?.apply(task, &catalog, registry)?,
        None => task.excepting([&kinds::VALUE_ERROR, &kinds::LOOKUP_ERROR], |failure, name| {
            tracing::info!(%failure, %name, "recovered");
            Ok(())
        }),
    };

    if cli.cleanup
        && let Some(release) = catalog.cleanup("release")
    {
        task = set_cleanup(task, release);
    }
    Ok(task)
}

fn main() -> ExitCode {
    // RUST_LOG=debug で supervise の状態遷移が見える
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let registry = KindRegistry::new();

    let task = match build_task(&cli, &registry) {
        Ok(task) => task,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    let (report, result) = supervise_with_report(&task, &cli.name);
    let summary = Summary {
        report: &report,
        value: result.as_ref().ok().and_then(|v| v.as_deref()),
        failure: result.as_ref().err().map(ToString::to_string),
    };

    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    }

    if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

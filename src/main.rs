use clap::Parser;
use foldersync_lib::cli::{Cli, Command, SyncArgs};
use foldersync_lib::commands;
use foldersync_lib::logging::{get_log_dir, LogConfig, SizeRotatingWriter};
use foldersync_lib::{default_config_dir, AppState, RunStatus, SyncEngine, SyncSettings};
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::prelude::*;

/// 初始化日志系统
fn init_logging(config_dir: &Path, verbose: bool) {
    let config = LogConfig::load(config_dir);

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        config.tracing_level()
    };
    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    // 控制台日志写到 stderr，stdout 留给同步结果
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let file_layer = if config.enabled {
        let log_dir = get_log_dir(config_dir);
        match SizeRotatingWriter::new(&log_dir, config.max_size_mb) {
            Ok(file_writer) => Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(file_writer)
                    .with_ansi(false)
                    .with_target(false),
            ),
            Err(e) => {
                eprintln!("无法创建日志文件 {}: {}", log_dir.display(), e);
                None
            }
        }
    } else {
        None
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer);

    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config_dir = default_config_dir();

    match cli.command {
        Some(Command::LogConfig {
            enabled,
            level,
            max_size_mb,
        }) => run_log_config(&config_dir, enabled, level, max_size_mb),
        None => {
            init_logging(&config_dir, cli.sync.verbose);
            run_sync(&config_dir, &cli.sync).await
        }
    }
}

fn run_log_config(
    config_dir: &Path,
    enabled: Option<bool>,
    level: Option<String>,
    max_size_mb: Option<u32>,
) -> ExitCode {
    let state = AppState::with_engine(config_dir.to_path_buf(), SyncEngine::new());

    let result = if enabled.is_none() && level.is_none() && max_size_mb.is_none() {
        commands::log::get_log_config(&state)
    } else {
        commands::log::set_log_config(enabled, max_size_mb, level, &state)
    };

    match result.and_then(|c| serde_json::to_string_pretty(&c).map_err(|e| e.to_string())) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_sync(config_dir: &Path, args: &SyncArgs) -> ExitCode {
    let (folder_a, folder_b) = match args.folders() {
        Ok(folders) => folders,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut settings = SyncSettings::load(config_dir);
    args.apply_to(&mut settings);
    tracing::debug!("同步配置: {:?}", settings);

    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel();
    let engine = SyncEngine::with_config(settings.to_sync_config()).with_observer(event_tx);
    let state = AppState::with_engine(config_dir.to_path_buf(), engine);

    let handle = match commands::sync::start_sync(folder_a, folder_b, &state) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Ctrl+C 取消，当前文件处理完后停止
    let cancel_state = state.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_state.cleanup();
        }
    });

    // 实时输出每个文件的结果
    let live = !args.json;
    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if live {
                println!("{:<8} {}", event.classification.label(), event.name);
            }
        }
    });

    let result = handle.wait().await;
    ctrl_c.abort();
    let _ = ctrl_c.await;
    // 引擎持有的发送端随 state 一起释放后，打印任务才会结束
    drop(state);
    let _ = printer.await;

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("同步失败: {}", e);
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("---");
        if report.status == RunStatus::Cancelled {
            println!("Cancelled");
        }
        println!("{}", report.log.summary_line());
        for (row, (name, classification)) in report.log.items.iter().enumerate() {
            let marker = if classification.is_error() { "!" } else { " " };
            println!("{}{:>4}  {:<8} {}", marker, row, classification.label(), name);
        }
    }

    if report.has_errors() {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    }
}

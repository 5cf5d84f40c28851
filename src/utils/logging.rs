// 日志工具模块
//
// 封装 flexi_logger 的初始化和关闭操作，确保异步日志正确 flush

use crate::config::Config;
use flexi_logger::{Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use std::sync::Mutex;

/// 全局日志句柄，用于程序退出时 flush
static LOGGER_HANDLE: Mutex<Option<LoggerHandle>> = Mutex::new(None);

/// 初始化日志系统
///
/// 日志写入 `[log]` 配置的目录，按大小轮转；`stdout = true` 时同时输出到标准输出
///
/// # Examples
/// ```no_run
/// use socialgraph::config::Config;
/// use socialgraph::utils::logging;
///
/// let config = Config::default();
/// logging::init(&config).expect("日志初始化失败");
/// ```
pub fn init(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let duplicate = if config.log.stdout {
        Duplicate::All
    } else {
        Duplicate::None
    };

    let handle = Logger::try_with_str(&config.log.level)?
        .log_to_file(
            FileSpec::default()
                .basename(&config.log.file)
                .directory(&config.log.dir),
        )
        .duplicate_to_stdout(duplicate)
        .rotate(
            Criterion::Size(config.log.max_file_size),
            Naming::Numbers,
            Cleanup::KeepLogFiles(config.log.max_files),
        )
        .write_mode(WriteMode::Async)
        .append()
        .start()?;

    // 保存句柄供后续 flush 使用
    if let Ok(mut guard) = LOGGER_HANDLE.lock() {
        *guard = Some(handle);
    }

    log::info!("日志系统初始化完成: {}/{}", config.log.dir, config.log.file);
    Ok(())
}

/// 刷新并关闭日志系统
///
/// 在程序退出前调用，确保所有异步日志都已写入文件
pub fn shutdown() {
    if let Ok(mut guard) = LOGGER_HANDLE.lock() {
        if let Some(handle) = guard.take() {
            handle.flush();
        }
    }
}

pub fn is_initialized() -> bool {
    LOGGER_HANDLE
        .lock()
        .map(|guard| guard.is_some())
        .unwrap_or(false)
}

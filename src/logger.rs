use tracing_subscriber::{EnvFilter, fmt};

/// 初始化日志系统
///
/// 通过 RUST_LOG 控制级别，默认 info。日志写到 stderr，
/// 不会和打印到 stdout 的响应内容混在一起。
///
/// 示例:
/// - RUST_LOG=debug httpu run ./projects/demo users.list
/// - RUST_LOG=httpu::runner=trace httpu shell ./projects/demo
pub fn init_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    tracing::debug!("Logger initialized");
}

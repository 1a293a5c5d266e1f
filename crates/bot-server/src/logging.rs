/// Filter directives for the logger. An explicit level (flag or `RUST_LOG`)
/// wins over the debug flag.
pub fn log_filter(log_level: Option<&str>, debug: bool) -> &str {
    match log_level {
        Some(level) if !level.trim().is_empty() => level,
        _ if debug => "debug",
        _ => "info",
    }
}

/// Initialize the `log` backend.
pub fn init_logging(log_level: Option<&str>, debug: bool) {
    env_logger::Builder::new()
        .parse_filters(log_filter(log_level, debug))
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{}] {} [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

use std::io::Write;
use std::sync::OnceLock;

use log::LevelFilter;

static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// Install the process-wide logger. Defaults to `info`; `RUST_LOG` overrides.
pub fn init() {
    LOGGER_INIT.get_or_init(|| {
        env_logger::Builder::new()
            .format(|buf, record| {
                writeln!(
                    buf,
                    "{} - {} - {} - {}",
                    chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                    record.level(),
                    record.target(),
                    record.args()
                )
            })
            .filter(None, LevelFilter::Info)
            .parse_default_env()
            .init();
    });
}

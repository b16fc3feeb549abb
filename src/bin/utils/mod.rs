use std::io;

pub fn setup_logging(verbosity_level: u32) {
    use fern::colors::{Color, ColoredLevelConfig};

    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::White)
        .debug(Color::BrightWhite)
        .trace(Color::Cyan);

    // stdout carries file contents for `cat`, diagnostics go to stderr
    fern::Dispatch::new()
        .format(move |out, message, record| {
            let prefix = format!(
                "[{}][{}]\x1b[{}m ",
                record.target(),
                record.level(),
                colors.get_color(&record.level()).to_fg_str()
            );

            let mut buf = String::new();
            for (i, line) in message.to_string().split('\n').enumerate() {
                if i != 0 {
                    buf.push('\n');
                }
                buf += &prefix;
                buf += line;
                buf += "\x1b[0m";
            }

            out.finish(format_args!("{}", buf))
        })
        .level(match verbosity_level {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Warn,
            2 => log::LevelFilter::Info,
            3 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        })
        .chain(io::stderr())
        .apply()
        .unwrap_or_else(|e| eprintln!("logging disabled: {}", e));
}

#[allow(non_upper_case_globals)]
pub fn size_to_string(s: u64) -> String {
    const KiB: u64 = 1 << 10;
    const MiB: u64 = 1 << 20;
    const GiB: u64 = 1 << 30;
    const TiB: u64 = 1 << 40;

    match s {
        0..=1023 => format!("{} B", s),
        x if x < MiB => format!("{} KiB", x / KiB),
        x if x < GiB => format!("{} MiB", x / MiB),
        x if x < TiB => format!("{} GiB", x / GiB),
        x => format!("{} TiB", x / TiB),
    }
}

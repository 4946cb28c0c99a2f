use colored::{Colorize, CustomColor};

pub const SCORER_TEAL: CustomColor = CustomColor {
    r: 0,
    g: 150,
    b: 136,
};

pub fn print_err(err_message: &str) {
    eprintln!(
        "[{}] {}: {}",
        "scorer".custom_color(SCORER_TEAL),
        "error".red().bold(),
        err_message
    );
}

#[macro_export]
macro_rules! print_err {
    ($($arg:tt)*) => {
        $crate::logging::print_err(&format!($($arg)*));
    };
}

/// Route `log` records to stderr, `info` and above unless `RUST_LOG` says otherwise.
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .try_init();
}

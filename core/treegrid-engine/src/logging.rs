//! FILENAME: core/treegrid-engine/src/logging.rs
// PURPOSE: Category-tagged logging for the tree grid pipeline.
// CONTEXT: Records go through the `log` facade. The host application owns the
//          logger (file sink, devtools bridge); this crate never installs one.

pub use log::Level;

/// Target used for every record emitted by this crate.
pub const LOG_TARGET: &str = "treegrid";

/// Whether a record at `level` would be emitted at all.
#[doc(hidden)]
pub fn enabled(level: Level) -> bool {
    log::log_enabled!(target: LOG_TARGET, level)
}

#[doc(hidden)]
pub fn write_log(level: Level, cat: &str, msg: &str) {
    log::log!(target: LOG_TARGET, level, "[{}] {}", cat, msg);
}

#[doc(hidden)]
pub fn write_log_enter(cat: &str, func: &str, msg: &str) {
    if msg.is_empty() {
        write_log(Level::Debug, cat, &format!("ENTER {}", func));
    } else {
        write_log(Level::Debug, cat, &format!("ENTER {} {}", func, msg));
    }
}

#[doc(hidden)]
pub fn write_log_exit(cat: &str, func: &str, msg: &str) {
    if msg.is_empty() {
        write_log(Level::Debug, cat, &format!("EXIT {}", func));
    } else {
        write_log(Level::Debug, cat, &format!("EXIT {} {}", func, msg));
    }
}

// ============================================================================
// MACROS
// ============================================================================

#[macro_export]
macro_rules! log_debug {
    ($cat:expr, $($arg:tt)*) => {
        if $crate::logging::enabled($crate::logging::Level::Debug) {
            $crate::logging::write_log($crate::logging::Level::Debug, $cat, &format!($($arg)*))
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($cat:expr, $($arg:tt)*) => {
        if $crate::logging::enabled($crate::logging::Level::Info) {
            $crate::logging::write_log($crate::logging::Level::Info, $cat, &format!($($arg)*))
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($cat:expr, $($arg:tt)*) => {
        if $crate::logging::enabled($crate::logging::Level::Warn) {
            $crate::logging::write_log($crate::logging::Level::Warn, $cat, &format!($($arg)*))
        }
    };
}

// ENTER/EXIT macros for stage tracing

#[macro_export]
macro_rules! log_enter {
    ($cat:expr, $func:expr) => {
        if $crate::logging::enabled($crate::logging::Level::Debug) {
            $crate::logging::write_log_enter($cat, $func, "")
        }
    };
    ($cat:expr, $func:expr, $($arg:tt)*) => {
        if $crate::logging::enabled($crate::logging::Level::Debug) {
            $crate::logging::write_log_enter($cat, $func, &format!($($arg)*))
        }
    };
}

#[macro_export]
macro_rules! log_exit {
    ($cat:expr, $func:expr) => {
        if $crate::logging::enabled($crate::logging::Level::Debug) {
            $crate::logging::write_log_exit($cat, $func, "")
        }
    };
    ($cat:expr, $func:expr, $($arg:tt)*) => {
        if $crate::logging::enabled($crate::logging::Level::Debug) {
            $crate::logging::write_log_exit($cat, $func, &format!($($arg)*))
        }
    };
}

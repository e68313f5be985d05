/// Lets a macro define other macros that take repetitions.
/// The inner rules receive a literal `$` through their first token.
#[macro_export]
macro_rules! with_dollar_sign {
    ($($body:tt)*) => {
        macro_rules! __with_dollar_sign { $($body)* }
        __with_dollar_sign!($);
    }
}

#[macro_export]
macro_rules! lxcfs_log {
    ($level:expr, $target:expr, $($arg:tt)+) => {
        ::log::log!(target: $target, $level, "[{}] {}", $target, format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! lxcfs_debug {
    ($target:expr, $($arg:tt)+) => {
        lxcfs_log!(::log::Level::Debug, $target, $($arg)+)
    };
}

#[macro_export]
macro_rules! lxcfs_info {
    ($target:expr, $($arg:tt)+) => {
        lxcfs_log!(::log::Level::Info, $target, $($arg)+)
    };
}

#[macro_export]
macro_rules! lxcfs_warn {
    ($target:expr, $($arg:tt)+) => {
        lxcfs_log!(::log::Level::Warn, $target, $($arg)+)
    };
}

#[macro_export]
macro_rules! lxcfs_error {
    ($target:expr, $($arg:tt)+) => {
        lxcfs_log!(::log::Level::Error, $target, $($arg)+)
    };
}

/// Defines `debug!`, `info!`, `warn!` and `error!` for the calling module.
/// Every line is sent with the given component name as log target and prefix.
///
/// ```ignore
/// use lxcfs_macros::{logger, lxcfs_info, lxcfs_log, with_dollar_sign};
/// logger!("Injector");
/// info!("Mutating pod {}", name);
/// ```
#[macro_export]
macro_rules! logger {
    ($target:literal) => {
        with_dollar_sign! {
            ($d:tt) => {
                #[allow(unused_macros)]
                macro_rules! debug {
                    ($d($d arg:tt)+) => {
                        lxcfs_debug!($target, $d($d arg)+)
                    };
                }
                #[allow(unused_macros)]
                macro_rules! info {
                    ($d($d arg:tt)+) => {
                        lxcfs_info!($target, $d($d arg)+)
                    };
                }
                #[allow(unused_macros)]
                macro_rules! warn {
                    ($d($d arg:tt)+) => {
                        lxcfs_warn!($target, $d($d arg)+)
                    };
                }
                #[allow(unused_macros)]
                macro_rules! error {
                    ($d($d arg:tt)+) => {
                        lxcfs_error!($target, $d($d arg)+)
                    };
                }
            }
        }
    };
}

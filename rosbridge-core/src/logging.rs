//! Logging macros that forward to `defmt` or `log`, whichever is enabled.
//!
//! With neither feature the macros compile to nothing but still evaluate
//! their arguments by reference, so call sites never warn about unused
//! variables. `defmt` wins when both features are on.

#![allow(unused_macros)]

macro_rules! forward_log {
    ($level:ident, $s:literal $(, $x:expr)* $(,)?) => {{
        #[cfg(feature = "defmt")]
        ::defmt::$level!($s $(, $x)*);
        #[cfg(all(feature = "log", not(feature = "defmt")))]
        ::log::$level!($s $(, $x)*);
        #[cfg(not(any(feature = "log", feature = "defmt")))]
        let _ = ($(&$x,)*);
    }};
}

macro_rules! trace {
    ($($arg:tt)*) => { forward_log!(trace, $($arg)*) };
}

macro_rules! debug {
    ($($arg:tt)*) => { forward_log!(debug, $($arg)*) };
}

macro_rules! info {
    ($($arg:tt)*) => { forward_log!(info, $($arg)*) };
}

macro_rules! warn {
    ($($arg:tt)*) => { forward_log!(warn, $($arg)*) };
}

macro_rules! error {
    ($($arg:tt)*) => { forward_log!(error, $($arg)*) };
}

#[cfg(not(test))]
#[cfg(feature = "log")]
macro_rules! pdur_log {
    (trace, $($arg:expr),*) => { log::trace!($($arg),*) };
    (debug, $($arg:expr),*) => { log::debug!($($arg),*) };
}

#[cfg(any(test, not(feature = "log")))]
macro_rules! pdur_log {
    ($level:ident, $($arg:expr),*) => {{ $( let _ = $arg; )* }}
}

macro_rules! pdur_trace {
    ($($arg:expr),*) => (pdur_log!(trace, $($arg),*));
}

macro_rules! pdur_debug {
    ($($arg:expr),*) => (pdur_log!(debug, $($arg),*));
}

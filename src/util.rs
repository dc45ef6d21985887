//! Utility functions for use in other parts of tessera
use std::{io, process};

/// Format a fatal diagnostic.
///
/// Messages ending in a ':' have the description of `err` appended.
/// ```
/// # use tessera::util::fatal_message;
/// let err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
///
/// assert_eq!(fatal_message("oops", &err), "oops");
/// assert_eq!(fatal_message("open:", &err), "open: boom");
/// ```
pub fn fatal_message(msg: &str, err: &io::Error) -> String {
    if msg.ends_with(':') {
        format!("{msg} {err}")
    } else {
        msg.to_owned()
    }
}

/// Print a one line diagnostic to stderr and exit with a non-zero status.
///
/// This is also how the version string is reported.
pub fn die(msg: &str) -> ! {
    let err = io::Error::last_os_error();
    eprintln!("{}", fatal_message(msg, &err));
    process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    #[test_case("tessera-0.1.0", "tessera-0.1.0"; "version string")]
    #[test_case("usage: tessera [-v]", "usage: tessera [-v]"; "usage")]
    #[test_case("open fifo:", "open fifo: no such file"; "trailing colon")]
    #[test]
    fn fatal_message_works(msg: &str, expected: &str) {
        let err = io::Error::new(io::ErrorKind::NotFound, "no such file");

        assert_eq!(fatal_message(msg, &err), expected);
    }
}

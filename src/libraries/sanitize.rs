use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{bytes, Regex};

/// SGR color/formatting sequences: ESC `[` digits or semicolons, then `m`.
const ANSI_ESCAPE_PATTERN: &str = r"\x1b\[[0-9;]*m";

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ANSI_ESCAPE_PATTERN).expect("ANSI escape pattern is valid"));

static ANSI_ESCAPE_BYTES: LazyLock<bytes::Regex> = LazyLock::new(|| {
    bytes::Regex::new(ANSI_ESCAPE_PATTERN).expect("ANSI escape pattern is valid")
});

/// Strip terminal color codes from validator output.
///
/// Everything that is not part of an escape sequence is kept byte for byte and
/// in order. Text without escape sequences is returned borrowed.
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    let mut stripped = ANSI_ESCAPE.replace_all(text, "");

    // Removing one sequence can close the gap around another, e.g. "\x1b[\x1b[0mm".
    loop {
        let next = match &stripped {
            Cow::Owned(current) => match ANSI_ESCAPE.replace_all(current, "") {
                Cow::Owned(next) => next,
                Cow::Borrowed(_) => break,
            },
            Cow::Borrowed(_) => break,
        };
        stripped = Cow::Owned(next);
    }

    stripped
}

/// [`strip_ansi`] over raw output that may not be valid UTF-8.
pub fn strip_ansi_bytes(output: &[u8]) -> Cow<'_, [u8]> {
    let mut stripped = ANSI_ESCAPE_BYTES.replace_all(output, &b""[..]);

    loop {
        let next = match &stripped {
            Cow::Owned(current) => match ANSI_ESCAPE_BYTES.replace_all(current, &b""[..]) {
                Cow::Owned(next) => next,
                Cow::Borrowed(_) => break,
            },
            Cow::Borrowed(_) => break,
        };
        stripped = Cow::Owned(next);
    }

    stripped
}

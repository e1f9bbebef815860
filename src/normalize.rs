use std::borrow::Cow;

/// Number of leading bytes probed for a NUL when classifying content as
/// binary, matching git's heuristic.
const BINARY_PROBE_LEN: usize = 8000;

/// Line-ending normalization forced on content before it enters a
/// comparison.
///
/// Mirrors the two `core.autocrlf` modes that matter when diffing: `Crlf`
/// for hosts whose native separator is CRLF, `Input` everywhere else. Both
/// modes fold CRLF to LF on the way in; they exist as distinct values so
/// the selected policy is explicit and loggable rather than inherited from
/// ambient git configuration. Without this, identical source lines checked
/// out with different terminators across platforms would appear changed and
/// corrupt every downstream changed-line calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineEndingPolicy {
    /// CRLF-normalizing mode (`core.autocrlf=true` equivalent).
    Crlf,
    /// Input-normalizing mode (`core.autocrlf=input` equivalent).
    Input,
}

impl LineEndingPolicy {
    /// The policy matching the host platform's native line separator.
    pub fn native() -> Self {
        if cfg!(windows) {
            Self::Crlf
        } else {
            Self::Input
        }
    }

    /// The `core.autocrlf` value this policy corresponds to.
    pub fn config_value(self) -> &'static str {
        match self {
            Self::Crlf => "true",
            Self::Input => "input",
        }
    }

    /// Normalize `content` for comparison: fold every `\r\n` to `\n`.
    ///
    /// Binary content is returned untouched; lone `\r` bytes are preserved.
    /// Returns a borrow when nothing needed rewriting.
    pub fn normalize<'a>(self, content: &'a [u8]) -> Cow<'a, [u8]> {
        if is_binary(content) || !content.windows(2).any(|w| w == b"\r\n") {
            return Cow::Borrowed(content);
        }

        let mut out = Vec::with_capacity(content.len());
        let mut i = 0;
        while i < content.len() {
            let b = content[i];
            if b == b'\r' && content.get(i + 1) == Some(&b'\n') {
                i += 1;
                continue;
            }
            out.push(b);
            i += 1;
        }
        Cow::Owned(out)
    }
}

impl std::fmt::Display for LineEndingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.config_value())
    }
}

/// Whether `content` should be treated as binary: a NUL byte within the
/// first 8000 bytes, git's own probe.
pub fn is_binary(content: &[u8]) -> bool {
    content
        .iter()
        .take(BINARY_PROBE_LEN)
        .any(|&b| b == 0)
}

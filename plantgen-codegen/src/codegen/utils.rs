//! Small helpers shared by the emission modules.

/// Indent-aware text buffer for one output channel.
///
/// The emitted artifact uses four-space indentation throughout; levels are
/// passed explicitly so nested constructs (parent dispatch, choice chains)
/// can hand their depth down.
pub(crate) struct CodeBuffer {
    text: String,
}

impl CodeBuffer {
    pub(crate) fn new() -> Self {
        Self {
            text: String::new(),
        }
    }

    pub(crate) fn line(&mut self, level: usize, text: impl AsRef<str>) {
        for _ in 0..level {
            self.text.push_str("    ");
        }
        self.text.push_str(text.as_ref());
        self.text.push('\n');
    }

    pub(crate) fn blank(&mut self) {
        self.text.push('\n');
    }

    pub(crate) fn into_text(self) -> String {
        self.text
    }
}

/// `if` for the first branch of a chain, `else if` afterwards.
pub(crate) fn if_else_if(index: usize) -> &'static str {
    if index == 0 { "if" } else { "else if" }
}

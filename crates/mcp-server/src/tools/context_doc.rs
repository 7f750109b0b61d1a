/// Minimal `.context` document helpers.
///
/// Tool text output is a dense, line-oriented summary: `A:` answers, `R:` ports along a trace,
/// `N:` notes. The full result always travels in `structured_content`.
pub(crate) struct ContextDocBuilder {
    out: String,
}

impl ContextDocBuilder {
    const QUOTE_PREFIX: &'static str = " ";

    #[must_use]
    pub(crate) fn new() -> Self {
        let mut out = String::new();
        out.push_str("[CONTENT]\n");
        Self { out }
    }

    #[must_use]
    pub(crate) fn finish(self) -> String {
        self.out
    }

    pub(crate) fn push_line(&mut self, line: &str) {
        self.out.push_str(line);
        self.out.push('\n');
    }

    pub(crate) fn push_blank(&mut self) {
        if !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        self.out.push('\n');
    }

    pub(crate) fn push_answer(&mut self, text: &str) {
        self.push_line(&format!("A: {text}"));
    }

    pub(crate) fn push_note(&mut self, text: &str) {
        self.push_line(&format!("N: {text}"));
    }

    /// A port on a trace, optionally with how it was reached.
    pub(crate) fn push_ref_header(&mut self, port: &str, label: Option<&str>) {
        match label {
            Some(label) if !label.trim().is_empty() => {
                self.push_line(&format!("R: {port} {label}"));
            }
            _ => {
                self.push_line(&format!("R: {port}"));
            }
        }
    }

    fn block_needs_quoting(block: &str) -> bool {
        block.lines().any(|line| {
            let trimmed = line.trim_start();
            trimmed.starts_with("[CONTENT]")
                || trimmed.starts_with("A:")
                || trimmed.starts_with("N:")
                || trimmed.starts_with("R:")
        })
    }

    /// Push a multi-line block, quoting only the lines that would clash with envelope markers.
    pub(crate) fn push_block_smart(&mut self, block: &str) {
        for line in block.lines() {
            if Self::block_needs_quoting(line) {
                self.out.push_str(Self::QUOTE_PREFIX);
            }
            self.out.push_str(line);
            self.out.push('\n');
        }
    }
}

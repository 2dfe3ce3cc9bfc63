use std::path::PathBuf;

pub const TOKEN_ENABLED: &str = "`yes`";
pub const TOKEN_DISABLED: &str = "`no`";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchStatus {
    Enabled,
    Disabled,
}

impl PatchStatus {
    pub fn from_token(token: &str) -> Option<PatchStatus> {
        match token {
            TOKEN_ENABLED => Some(PatchStatus::Enabled),
            TOKEN_DISABLED => Some(PatchStatus::Disabled),
            _ => None,
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            PatchStatus::Enabled => TOKEN_ENABLED,
            PatchStatus::Disabled => TOKEN_DISABLED,
        }
    }

    pub fn is_enabled(self) -> bool {
        self == PatchStatus::Enabled
    }
}

/// Byte range of a status token in the file text it was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSpan {
    pub start: usize,
    pub len: usize,
}

impl StatusSpan {
    pub fn end(self) -> usize {
        self.start + self.len
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatchOption {
    pub id: usize,
    pub name: String,
    pub group: Option<String>,
    pub status: PatchStatus,
    pub help_text: String,
    pub status_span: StatusSpan,
    pub line: usize,
}

impl PatchOption {
    /// Whether the in-memory status no longer matches the token recorded in
    /// `text` (the file text this option was parsed from). A span that no
    /// longer resolves counts as differing so the serializer gets a chance to
    /// reject it.
    pub fn differs_from_source(&self, text: &str) -> bool {
        text.get(self.status_span.start..self.status_span.end())
            .map(|token| token != self.status.as_token())
            .unwrap_or(true)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatchFile {
    pub path: PathBuf,
    pub text: String,
    pub options: Vec<PatchOption>,
}

impl PatchFile {
    pub fn option_by_name(&self, name: &str) -> Option<&PatchOption> {
        self.options.iter().find(|opt| opt.name == name)
    }

    pub fn is_modified(&self) -> bool {
        self.options
            .iter()
            .any(|opt| opt.differs_from_source(&self.text))
    }
}

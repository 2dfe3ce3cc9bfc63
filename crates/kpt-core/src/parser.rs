use crate::error::{Error, Result};
use crate::types::{PatchOption, PatchStatus, StatusSpan};
use log::{debug, warn};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;

pub const BLOCK_OPEN: &str = "<Patch>";
pub const BLOCK_CLOSE: &str = "</Patch>";

struct OpenBlock {
    open_line: usize,
    name: Option<String>,
    group: Option<String>,
    status: Option<(PatchStatus, StatusSpan)>,
    status_line: usize,
    help_lines: Vec<String>,
}

impl OpenBlock {
    fn new(open_line: usize) -> Self {
        OpenBlock {
            open_line,
            name: None,
            group: None,
            status: None,
            status_line: 0,
            help_lines: Vec::new(),
        }
    }

    fn finish(self, path: &Path, id: usize) -> Result<PatchOption> {
        let name = self.name.ok_or_else(|| {
            parse_error(path, self.open_line, "block has no patch_name declaration")
        })?;
        let (status, status_span) = self.status.ok_or_else(|| {
            parse_error(path, self.open_line, "block has no patch_enable declaration")
        })?;

        Ok(PatchOption {
            id,
            name,
            group: self.group,
            status,
            help_text: self.help_lines.join("\n"),
            status_span,
            line: self.status_line,
        })
    }
}

/// Parse the text of one patch file into its ordered option records. Pure:
/// reads nothing from disk, keeps byte offsets into `text` so the serializer
/// can splice status tokens back in place.
pub fn parse(path: &Path, text: &str) -> Result<Vec<PatchOption>> {
    let key_value = Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.*?)\s*$").unwrap();
    let quoted = Regex::new(r"^`([^`]*)`$").unwrap();

    let mut options: Vec<PatchOption> = Vec::new();
    let mut block: Option<OpenBlock> = None;
    let mut offset = 0usize;

    for (idx, line) in text.split_inclusive('\n').enumerate() {
        let line_no = idx + 1;
        let stripped = line.trim();

        if stripped == BLOCK_OPEN {
            if let Some(open) = &block {
                return Err(parse_error(
                    path,
                    line_no,
                    format!(
                        "{} inside the block opened on line {}",
                        BLOCK_OPEN, open.open_line
                    ),
                ));
            }
            block = Some(OpenBlock::new(line_no));
        } else if stripped == BLOCK_CLOSE {
            let Some(open) = block.take() else {
                return Err(parse_error(
                    path,
                    line_no,
                    format!("{} without a matching {}", BLOCK_CLOSE, BLOCK_OPEN),
                ));
            };
            let option = open.finish(path, options.len())?;
            debug!(
                "Parsed option '{}' (enabled: {}) from {:?}",
                option.name,
                option.status.is_enabled(),
                path
            );
            options.push(option);
        } else if let Some(open) = block.as_mut() {
            if stripped.starts_with('#') {
                open.help_lines
                    .push(stripped.trim_start_matches('#').trim().to_string());
            } else if let Some(caps) = key_value.captures(line) {
                let key = caps.get(1).map_or("", |m| m.as_str());
                let value = caps.get(2).map_or("", |m| m.as_str());

                match key {
                    "patch_name" => {
                        if open.name.is_some() {
                            return Err(parse_error(path, line_no, "duplicate patch_name"));
                        }
                        let Some(name) = quoted.captures(value).map(|c| c[1].to_string()) else {
                            return Err(parse_error(
                                path,
                                line_no,
                                "patch_name value must be backtick-quoted",
                            ));
                        };
                        if name.is_empty() {
                            return Err(parse_error(path, line_no, "patch_name is empty"));
                        }
                        open.name = Some(name);
                    }
                    "patch_group" => {
                        if open.group.is_some() {
                            return Err(parse_error(path, line_no, "duplicate patch_group"));
                        }
                        let Some(group) = quoted.captures(value).map(|c| c[1].to_string()) else {
                            return Err(parse_error(
                                path,
                                line_no,
                                "patch_group value must be backtick-quoted",
                            ));
                        };
                        // An empty group tag carries no grouping information;
                        // the record keeps group absent in that case.
                        if !group.is_empty() {
                            open.group = Some(group);
                        }
                    }
                    "patch_enable" => {
                        if open.status.is_some() {
                            return Err(parse_error(path, line_no, "duplicate patch_enable"));
                        }
                        let Some(status) = PatchStatus::from_token(value) else {
                            return Err(parse_error(
                                path,
                                line_no,
                                format!(
                                    "patch_enable must be `yes` or `no`, found {:?}",
                                    value
                                ),
                            ));
                        };
                        let value_match = caps.get(2).expect("capture 2 matched above");
                        open.status = Some((
                            status,
                            StatusSpan {
                                start: offset + value_match.start(),
                                len: value.len(),
                            },
                        ));
                        open.status_line = line_no;
                    }
                    _ => {}
                }
            }
        }

        offset += line.len();
    }

    if let Some(open) = block {
        return Err(parse_error(
            path,
            open.open_line,
            format!("{} block is never closed", BLOCK_OPEN),
        ));
    }

    let mut seen = HashSet::new();
    for option in &options {
        if !seen.insert(option.name.as_str()) {
            warn!("Duplicate option name '{}' in {:?}", option.name, path);
        }
    }

    Ok(options)
}

fn parse_error<M: Into<String>>(path: &Path, line: usize, message: M) -> Error {
    Error::Parse {
        path: path.to_path_buf(),
        line,
        message: message.into(),
    }
}

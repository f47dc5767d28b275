//! Dependency manifest (requirements file) parsing
//!
//! The installer always receives the file itself; this view exists for status
//! output and for skipping manifests that list nothing.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9][A-Za-z0-9._-]*)").expect("requirement name pattern is valid")
});

/// A single requirement line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Distribution name, or the whole spec for URLs and local paths
    pub name: String,
    /// Line with comments stripped
    pub spec: String,
}

/// Parsed requirements file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub requirements: Vec<Requirement>,
    /// Installer option lines such as `-r other.txt` or `--index-url ...`
    pub options: Vec<String>,
}

impl Manifest {
    /// Parse manifest content.
    ///
    /// Blank lines and `#` comments are ignored; a `#` preceded by whitespace
    /// starts an inline comment. Lines beginning with `-` are installer options.
    pub fn parse(content: &str) -> Self {
        let mut manifest = Manifest::default();
        for line in content.lines() {
            let line = strip_comment(line);
            if line.is_empty() {
                continue;
            }

            if line.starts_with('-') {
                manifest.options.push(line.to_string());
                continue;
            }

            let name = if line.contains("://") || line.starts_with('.') || line.starts_with('/') {
                line.to_string()
            } else {
                NAME_RE
                    .captures(line)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_else(|| line.to_string())
            };
            manifest.requirements.push(Requirement {
                name,
                spec: line.to_string(),
            });
        }
        manifest
    }

    /// Parse raw file bytes. See [`decode`].
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::parse(&decode(bytes))
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty() && self.options.is_empty()
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }
}

/// Decode manifest bytes the way the installer reads them.
///
/// A UTF-8 or UTF-16 byte order mark selects the encoding; anything else is
/// read as UTF-8 with invalid sequences replaced.
pub fn decode(bytes: &[u8]) -> Cow<'_, str> {
    match bytes {
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8_lossy(rest),
        [0xFF, 0xFE, rest @ ..] => Cow::Owned(decode_utf16(rest, u16::from_le_bytes)),
        [0xFE, 0xFF, rest @ ..] => Cow::Owned(decode_utf16(rest, u16::from_be_bytes)),
        _ => String::from_utf8_lossy(bytes),
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

fn strip_comment(line: &str) -> &str {
    let trimmed = line.trim();
    if trimmed.starts_with('#') {
        return "";
    }
    let bytes = trimmed.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'#' && i > 0 && bytes[i - 1].is_ascii_whitespace() {
            return trimmed[..i].trim_end();
        }
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_requirements_with_comments_when_parsing_then_ignores_them() {
        let content = r#"# GUI toolkit
customtkinter>=5.2  # pinned for themes

requests==2.31.0
"#;
        let manifest = Manifest::parse(content);

        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.requirements[0].name, "customtkinter");
        assert_eq!(manifest.requirements[0].spec, "customtkinter>=5.2");
        assert_eq!(manifest.requirements[1].name, "requests");
    }

    #[test]
    fn given_option_lines_when_parsing_then_kept_separately() {
        let content = "--index-url https://pypi.org/simple\n-r base.txt\nnumpy\n";
        let manifest = Manifest::parse(content);

        assert_eq!(manifest.options, vec!["--index-url https://pypi.org/simple", "-r base.txt"]);
        assert_eq!(manifest.len(), 1);
    }

    #[test]
    fn given_url_requirement_when_parsing_then_name_is_whole_spec() {
        let content = "git+https://github.com/org/pkg.git#egg=pkg\n";
        let manifest = Manifest::parse(content);

        assert_eq!(
            manifest.requirements[0].name,
            "git+https://github.com/org/pkg.git#egg=pkg"
        );
    }

    #[test]
    fn given_empty_content_when_parsing_then_manifest_is_empty() {
        let manifest = Manifest::parse("\n   \n# nothing\n");
        assert!(manifest.is_empty());
    }

    #[test]
    fn given_utf16_bytes_with_bom_when_parsing_then_reads_requirements() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "requests==2.31.0\r\nrich\r\n".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }

        let manifest = Manifest::from_bytes(&bytes);

        let names: Vec<_> = manifest.requirements.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["requests", "rich"]);
    }

    #[test]
    fn given_latin1_comment_when_parsing_then_requirement_survives() {
        let manifest = Manifest::from_bytes(b"# caf\xe9\nnumpy\n");

        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.requirements[0].name, "numpy");
    }

    #[test]
    fn given_utf8_bom_when_decoding_then_bom_is_dropped() {
        assert_eq!(decode(b"\xEF\xBB\xBFrich\n"), "rich\n");
    }
}

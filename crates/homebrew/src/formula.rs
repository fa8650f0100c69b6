//! Homebrew formula generation.
//!
//! Generates the Ruby formula for a source release from the run
//! configuration, the release metadata and the archive checksum.

use releaser_core::ReleaseConfig;
use releaser_github::ReleaseMetadata;

/// Data for generating a Homebrew formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaData {
    /// Formula class name (e.g., "HomebrewReleaser")
    pub class_name: String,
    /// Description
    pub desc: String,
    /// Homepage URL
    pub homepage: String,
    /// Source archive URL
    pub url: String,
    /// Version, without a leading `v`
    pub version: String,
    /// SHA256 checksum of the archive at `url`
    pub sha256: String,
    /// License identifier
    pub license: String,
    /// Dependencies, one `depends_on` line each
    pub depends_on: Vec<String>,
    /// Body of `def install`
    pub install: String,
    /// Body of `test do`
    pub test: String,
}

impl FormulaData {
    /// Collects template fields for a release.
    #[must_use]
    pub fn new(config: &ReleaseConfig, metadata: &ReleaseMetadata, checksum: &str) -> Self {
        let fields = &config.formula;
        Self {
            class_name: class_name(config.formula_name()),
            desc: fields.description.clone(),
            homepage: fields.homepage.clone(),
            url: metadata.archive_url.clone(),
            version: display_version(&metadata.version).to_string(),
            sha256: checksum.to_string(),
            license: fields.license.clone(),
            depends_on: fields.depends_on.clone(),
            install: fields.install.clone(),
            test: fields.test.clone(),
        }
    }
}

/// Homebrew formula generator.
pub struct FormulaGenerator;

impl FormulaGenerator {
    /// Generates a Ruby formula from the data.
    #[must_use]
    #[allow(clippy::format_push_string)]
    pub fn generate(data: &FormulaData) -> String {
        let mut formula = format!(
            r#"# typed: false
# frozen_string_literal: true

# This file was generated by homebrew-releaser. DO NOT EDIT.
class {} < Formula
  desc "{}"
  homepage "{}"
  url "{}"
  version "{}"
  sha256 "{}"
  license "{}"
"#,
            data.class_name,
            ruby_string(&data.desc),
            ruby_string(&data.homepage),
            ruby_string(&data.url),
            ruby_string(&data.version),
            ruby_string(&data.sha256),
            ruby_string(&data.license),
        );

        if !data.depends_on.is_empty() {
            formula.push('\n');
            for dependency in &data.depends_on {
                formula.push_str(&format!("  depends_on \"{}\"\n", ruby_string(dependency)));
            }
        }

        formula.push_str("\n  def install\n");
        formula.push_str(&indent_block(&data.install, 4));
        formula.push_str("  end\n\n");
        formula.push_str("  test do\n");
        formula.push_str(&indent_block(&data.test, 4));
        formula.push_str("  end\nend\n");

        formula
    }
}

/// Converts a formula name to its Ruby class name.
///
/// Mirrors Homebrew's rule: capitalize, camel-case across `-`, `_`, `.` and
/// spaces, `+` becomes `x`, and `@` before a digit becomes `AT`.
#[must_use]
pub fn class_name(name: &str) -> String {
    let chars: Vec<char> = name
        .chars()
        .enumerate()
        .map(|(i, c)| {
            if i == 0 {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            }
        })
        .collect();

    let mut class_name = String::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        let next = chars.get(i + 1).copied();
        match chars[i] {
            '-' | '_' | '.' | ' ' if next.is_some_and(|n| n.is_ascii_alphanumeric()) => {
                class_name.extend(next.map(|n| n.to_ascii_uppercase()));
                i += 2;
                continue;
            }
            '+' => class_name.push('x'),
            '@' if i > 0 && next.is_some_and(|n| n.is_ascii_digit()) => class_name.push_str("AT"),
            c => class_name.push(c),
        }
        i += 1;
    }
    class_name
}

/// Strips a leading `v` from tags like `v1.2.3`.
#[must_use]
pub fn display_version(tag: &str) -> &str {
    match tag.strip_prefix(['v', 'V']) {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => tag,
    }
}

/// Escapes a value for a Ruby double-quoted string literal.
///
/// Covers backslashes, quotes and the `#{}`, `#@` and `#$` interpolation
/// forms.
fn ruby_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '#' if matches!(chars.peek(), Some('{' | '@' | '$')) => escaped.push_str("\\#"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Re-indents `block` to `spaces`, keeping relative indentation.
///
/// Leading and trailing blank lines are dropped and the indentation common to
/// all non-blank lines is removed first.
fn indent_block(block: &str, spaces: usize) -> String {
    let lines: Vec<&str> = block
        .lines()
        .map(str::trim_end)
        .skip_while(|line| line.is_empty())
        .collect();
    let end = lines
        .iter()
        .rposition(|line| !line.is_empty())
        .map_or(0, |i| i + 1);
    let lines = &lines[..end];

    let common = lines
        .iter()
        .filter(|line| !line.is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let pad = " ".repeat(spaces);
    let mut out = String::new();
    for line in lines {
        if !line.is_empty() {
            out.push_str(&pad);
            out.push_str(&line[common..]);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FormulaData {
        FormulaData {
            class_name: "Tool".to_string(),
            desc: "Test description".to_string(),
            homepage: "https://github.com/Justintime50/tool".to_string(),
            url: "https://api.github.com/repos/Justintime50/tool/tarball/v0.1.0".to_string(),
            version: "0.1.0".to_string(),
            sha256: "abc123".to_string(),
            license: "MIT".to_string(),
            depends_on: Vec::new(),
            install: "bin.install \"src/tool.sh\" => \"tool\"".to_string(),
            test: "system bin/\"tool\", \"--help\"".to_string(),
        }
    }

    #[test]
    fn test_generate_formula() {
        let formula = FormulaGenerator::generate(&sample());

        assert!(formula.contains("class Tool < Formula"));
        assert!(formula.contains("  desc \"Test description\"\n"));
        assert!(formula.contains("  homepage \"https://github.com/Justintime50/tool\"\n"));
        assert!(
            formula.contains("  url \"https://api.github.com/repos/Justintime50/tool/tarball/v0.1.0\"\n")
        );
        assert!(formula.contains("  version \"0.1.0\"\n"));
        assert!(formula.contains("  sha256 \"abc123\"\n"));
        assert!(formula.contains("  license \"MIT\"\n"));
        assert!(!formula.contains("depends_on"));
        assert!(formula.ends_with("end\n"));
    }

    #[test]
    fn test_generate_formula_exact_layout() {
        let mut data = sample();
        data.depends_on = vec!["openssl@3".to_string()];
        let expected = r#"# typed: false
# frozen_string_literal: true

# This file was generated by homebrew-releaser. DO NOT EDIT.
class Tool < Formula
  desc "Test description"
  homepage "https://github.com/Justintime50/tool"
  url "https://api.github.com/repos/Justintime50/tool/tarball/v0.1.0"
  version "0.1.0"
  sha256 "abc123"
  license "MIT"

  depends_on "openssl@3"

  def install
    bin.install "src/tool.sh" => "tool"
  end

  test do
    system bin/"tool", "--help"
  end
end
"#;
        assert_eq!(FormulaGenerator::generate(&data), expected);
    }

    #[test]
    fn test_generate_formula_multiline_blocks() {
        let mut data = sample();
        data.install = "bin.install \"tool\"\n\nman1.install \"tool.1\"\n".to_string();
        let formula = FormulaGenerator::generate(&data);
        assert!(formula.contains(
            "  def install\n    bin.install \"tool\"\n\n    man1.install \"tool.1\"\n  end\n"
        ));
    }

    #[test]
    fn test_generate_formula_dependencies_in_order() {
        let mut data = sample();
        data.depends_on = vec!["go".to_string(), "python@3.12".to_string()];
        let formula = FormulaGenerator::generate(&data);
        let go = formula.find("depends_on \"go\"").unwrap();
        let python = formula.find("depends_on \"python@3.12\"").unwrap();
        assert!(go < python);
    }

    #[test]
    fn test_formula_special_characters_in_desc() {
        let mut data = sample();
        data.desc = r#"Say "hi" \ #{evil}"#.to_string();
        let formula = FormulaGenerator::generate(&data);
        assert!(formula.contains(r#"desc "Say \"hi\" \\ \#{evil}""#));
    }

    #[test]
    fn test_ruby_string_escapes_every_interpolation_form() {
        assert_eq!(ruby_string("#@ivar #$gvar #{x}"), r"\#@ivar \#$gvar \#{x}");
        assert_eq!(ruby_string("issue #42 # note"), "issue #42 # note");
        assert_eq!(ruby_string("trailing #"), "trailing #");
    }

    #[test]
    fn test_generate_formula_nested_install_block() {
        let mut data = sample();
        data.install = "  if OS.mac?\n    bin.install \"tool\"\n  end\n".to_string();
        let formula = FormulaGenerator::generate(&data);
        assert!(formula.contains(
            "  def install\n    if OS.mac?\n      bin.install \"tool\"\n    end\n  end\n"
        ));
    }

    #[test]
    fn test_class_name() {
        assert_eq!(class_name("tool"), "Tool");
        assert_eq!(class_name("homebrew-releaser"), "HomebrewReleaser");
        assert_eq!(class_name("foo.bar_baz"), "FooBarBaz");
        assert_eq!(class_name("MyTool"), "Mytool");
        assert_eq!(class_name("openssl@3"), "OpensslAT3");
        assert_eq!(class_name("c++"), "Cxx");
        assert_eq!(class_name("trailing-"), "Trailing-");
    }

    #[test]
    fn test_display_version() {
        assert_eq!(display_version("v1.2.3"), "1.2.3");
        assert_eq!(display_version("V2.0"), "2.0");
        assert_eq!(display_version("1.0.0"), "1.0.0");
        assert_eq!(display_version("version-1"), "version-1");
        assert_eq!(display_version("v"), "v");
    }

    #[test]
    fn test_indent_block_trims_surrounding_newlines() {
        assert_eq!(indent_block("\nline one  \nline two\n\n", 4), "    line one\n    line two\n");
    }
}

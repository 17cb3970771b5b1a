//! Masking of IPython-only syntax before analysis.
//!
//! Magic commands (`%timeit`, `%%capture`) and introspection (`np?`, `??np`)
//! are commented out in place, which keeps line numbers stable. A line of
//! placeholder assignments for `_`, `__` and `___` is prepended; that line is
//! the only one that shifts positions and is reported as `hidden_lines`.

use std::sync::LazyLock;

use regex::Regex;

/// Placeholder definitions for IPython's output-history variables.
pub const MAGIC_PRELUDE: &str = "_ = 0 ; __ = 0 ; ___ = 0\n";

static MAGIC_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^%").expect("magic pattern is valid"));

static INTROSPECTION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(\s*)(\?\??[\w.]+|\S+\?\??)(\s*)$").expect("introspection pattern is valid")
});

/// Text handed to the analyzer plus the number of whole lines prepended to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preprocessed {
    pub text: String,
    pub hidden_lines: u32,
}

#[must_use]
pub fn preprocess(text: &str, allow_magic: bool) -> Preprocessed {
    if !allow_magic {
        return Preprocessed {
            text: text.to_string(),
            hidden_lines: 0,
        };
    }

    let masked = MAGIC_LINE.replace_all(text, "# %");
    let masked = INTROSPECTION_LINE.replace_all(&masked, "${1}# ${2}${3}");

    let mut out = String::with_capacity(MAGIC_PRELUDE.len() + masked.len());
    out.push_str(MAGIC_PRELUDE);
    out.push_str(&masked);
    Preprocessed {
        text: out,
        hidden_lines: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_is_identity() {
        let text = "%timeit f()\nnp?\n";
        let out = preprocess(text, false);
        assert_eq!(out.text, text);
        assert_eq!(out.hidden_lines, 0);
    }

    #[test]
    fn test_magics_are_commented_in_place() {
        let out = preprocess("import os\n%timeit os.getcwd()\n%%capture\n", true);
        assert_eq!(
            out.text,
            "_ = 0 ; __ = 0 ; ___ = 0\nimport os\n# %timeit os.getcwd()\n# %%capture\n"
        );
        assert_eq!(out.hidden_lines, 1);
    }

    #[test]
    fn test_introspection_forms() {
        let out = preprocess("np?\nnp.array??\n?np\n??np.zeros\n  os.path? \n", true);
        let body = out.text.strip_prefix(MAGIC_PRELUDE).unwrap();
        assert_eq!(
            body,
            "# np?\n# np.array??\n# ?np\n# ??np.zeros\n  # os.path? \n"
        );
    }

    #[test]
    fn test_ordinary_code_untouched() {
        let source = "x = a if b else c\nprint('what?')\ny = 1 % 2\n";
        let out = preprocess(source, true);
        assert_eq!(out.text.strip_prefix(MAGIC_PRELUDE), Some(source));
    }

    #[test]
    fn test_line_count_only_grows_by_prelude() {
        let source = "%load_ext autoreload\nimport numpy as np\nnp?\nprint(np)\n";
        let out = preprocess(source, true);
        assert_eq!(out.text.lines().count(), source.lines().count() + 1);
    }
}

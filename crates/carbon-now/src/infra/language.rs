//! Language detection mapping source files onto carbon editor modes.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use syntect::parsing::{SyntaxReference, SyntaxSet};

/// Carbon's own client-side detection.
pub const AUTO: &str = "auto";

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

/// Extensions syntect does not know or names differently than carbon.
static EXTENSION_MODES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("ts", "application/typescript"),
        ("tsx", "text/typescript-jsx"),
        ("jsx", "jsx"),
        ("mjs", "javascript"),
        ("cjs", "javascript"),
        ("vue", "vue"),
        ("svelte", "svelte"),
        ("kt", "text/x-kotlin"),
        ("kts", "text/x-kotlin"),
        ("swift", "swift"),
        ("dart", "dart"),
        ("toml", "toml"),
        ("dockerfile", "dockerfile"),
        ("graphql", "graphql"),
        ("gql", "graphql"),
        ("elm", "elm"),
        ("ex", "elixir"),
        ("exs", "elixir"),
        ("nim", "nim"),
        ("sol", "solidity"),
        ("zig", "text/x-zig"),
        ("vb", "vb"),
        ("ps1", "powershell"),
        ("sass", "sass"),
        ("scss", "text/x-scss"),
        ("less", "text/x-less"),
        ("styl", "stylus"),
        ("fs", "mllike"),
        ("fsx", "mllike"),
        ("ml", "mllike"),
        ("v", "verilog"),
        ("vhd", "vhdl"),
        ("vhdl", "vhdl"),
        ("wasm", "wast"),
        ("wat", "wast"),
    ])
});

/// syntect syntax names and the carbon modes they correspond to.
static SYNTAX_MODES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("Rust", "rust"),
        ("Python", "python"),
        ("JavaScript", "javascript"),
        ("JSON", "application/json"),
        ("Go", "go"),
        ("C", "text/x-csrc"),
        ("C++", "text/x-c++src"),
        ("C#", "text/x-csharp"),
        ("Objective-C", "text/x-objectivec"),
        ("Objective-C++", "text/x-objectivec"),
        ("Java", "text/x-java"),
        ("Scala", "text/x-scala"),
        ("Clojure", "clojure"),
        ("Haskell", "haskell"),
        ("Erlang", "erlang"),
        ("OCaml", "mllike"),
        ("Lisp", "commonlisp"),
        ("Lua", "lua"),
        ("Perl", "perl"),
        ("PHP", "text/x-php"),
        ("R", "r"),
        ("Ruby", "ruby"),
        ("Bourne Again Shell (bash)", "application/x-sh"),
        ("Shell-Unix-Generic", "application/x-sh"),
        ("Batch File", "powershell"),
        ("HTML", "htmlmixed"),
        ("XML", "xml"),
        ("CSS", "css"),
        ("Markdown", "markdown"),
        ("YAML", "yaml"),
        ("SQL", "text/x-sql"),
        ("Makefile", "cmake"),
        ("Diff", "diff"),
        ("LaTeX", "stex"),
        ("TeX", "stex"),
        ("D", "d"),
        ("Groovy", "groovy"),
        ("Pascal", "pascal"),
        ("Tcl", "tcl"),
        ("Matlab", "octave"),
        ("Graphviz (DOT)", "text/plain"),
        ("Plain Text", "text/plain"),
    ])
});

/// Detect the carbon mode for `code`, optionally read from `path`.
///
/// Falls back to [`AUTO`] so carbon can guess on its own.
pub fn detect(path: Option<&Path>, code: &str) -> String {
    if let Some(mode) = path.and_then(mode_for_path) {
        return mode.to_owned();
    }
    first_line_syntax(code)
        .and_then(|syntax| SYNTAX_MODES.get(syntax.name.as_str()).copied())
        .unwrap_or(AUTO)
        .to_owned()
}

fn mode_for_path(path: &Path) -> Option<&'static str> {
    let file_name = path.file_name().and_then(|name| name.to_str())?;
    if file_name.eq_ignore_ascii_case("dockerfile") {
        return Some("dockerfile");
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    if let Some(mode) = extension
        .as_deref()
        .and_then(|ext| EXTENSION_MODES.get(ext).copied())
    {
        return Some(mode);
    }

    let syntax = extension
        .as_deref()
        .and_then(|ext| SYNTAX_SET.find_syntax_by_extension(ext))
        .or_else(|| SYNTAX_SET.find_syntax_by_extension(file_name));
    match syntax {
        Some(syntax) => {
            let mode = SYNTAX_MODES.get(syntax.name.as_str()).copied();
            if mode.is_none() {
                tracing::debug!(syntax = %syntax.name, "no carbon mode for syntax");
            }
            mode
        }
        None => None,
    }
}

fn first_line_syntax(code: &str) -> Option<&'static SyntaxReference> {
    let first = code.lines().next()?;
    SYNTAX_SET.find_syntax_by_first_line(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_common_extensions() {
        assert_eq!(detect(Some(Path::new("src/main.rs")), ""), "rust");
        assert_eq!(detect(Some(Path::new("tool.py")), ""), "python");
        assert_eq!(detect(Some(Path::new("index.ts")), ""), "application/typescript");
        assert_eq!(detect(Some(Path::new("lib.CPP")), ""), "text/x-c++src");
    }

    #[test]
    fn detects_dockerfile_by_name() {
        assert_eq!(detect(Some(Path::new("Dockerfile")), ""), "dockerfile");
    }

    #[test]
    fn shebang_is_used_without_a_path() {
        assert_eq!(detect(None, "#!/usr/bin/env python\nprint(1)\n"), "python");
    }

    #[test]
    fn unknown_input_stays_auto() {
        assert_eq!(detect(Some(Path::new("notes.unknownext")), "hello"), AUTO);
        assert_eq!(detect(None, ""), AUTO);
    }
}

//! C/C++ token coloring.
//!
//! A line is split into tokens by repeatedly taking the longest match among
//! a fixed table of anchored patterns. Ties go to the earlier table entry,
//! which is why keywords come before identifiers. A byte that starts no
//! token is emitted on its own, uncolored.
//!
//! Works on a single line with no state carried between lines, so block
//! comments and raw strings that span lines are not recognized.

use std::sync::LazyLock;

use regex::bytes::Regex;

/// What a token is, for coloring purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A valid preprocessor directive (`#include`, `#define`, ...).
    Directive,
    /// `#` followed by something that isn't a directive.
    BadDirective,
    Keyword,
    String,
    Char,
    /// `//` to end of line.
    Comment,
    /// One of `< > { } ( )`.
    Delimiter,
    Number,
    Identifier,
    /// A byte that matched nothing.
    Other,
}

impl TokenKind {
    /// SGR prefix for this kind, or `""` to leave it uncolored.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Directive => "\x1b[38;5;134m",
            Self::BadDirective => "\x1b[38;5;160m",
            Self::Keyword => "\x1b[38;5;86m",
            Self::String => "\x1b[38;5;28m",
            Self::Char => "\x1b[38;5;40m",
            Self::Comment => "\x1b[38;5;95m",
            Self::Delimiter => "\x1b[38;5;184m",
            Self::Number => "\x1b[38;5;33m",
            Self::Identifier | Self::Other => "",
        }
    }
}

/// A token: its kind and its length in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub len: usize,
}

/// SGR reset emitted after each colored token.
const RESET: &[u8] = b"\x1b[0m";

static KEYWORDS: &str = "alignas|alignof|and|and_eq|asm|atomic_cancel|atomic_commit|\
atomic_noexcept|auto|bitand|bitor|bool|break|case|catch|char|char8_t|char16_t|\
char32_t|class|co_await|co_return|co_yield|compl|concept|const|consteval|\
constexpr|constinit|const_cast|continue|decltype|default|delete|do|double|\
dynamic_cast|else|enum|explicit|export|extern|false|final|float|for|friend|\
goto|if|import|inline|int|long|module|mutable|namespace|new|noexcept|not|\
not_eq|nullptr|operator|or|or_eq|override|private|protected|public|register|\
reinterpret_cast|requires|return|short|signed|sizeof|static|static_assert|\
static_cast|struct|switch|synchronized|template|this|thread_local|throw|\
transaction_safe|transaction_safe_dynamic|true|try|typedef|typeid|typename|\
union|unsigned|using|virtual|void|volatile|wchar_t|while|xor|xor_eq";

/// The token table, in tie-break order.
static PATTERNS: LazyLock<Vec<(TokenKind, Regex)>> = LazyLock::new(|| {
    let table = [
        (
            TokenKind::Directive,
            r"^#(define|undef|if|elif|else|ifdef|ifndef|endif|line|error|include|pragma|_Pragma)\b"
                .to_owned(),
        ),
        (TokenKind::BadDirective, r"^#[^[:space:]]*".to_owned()),
        (TokenKind::Keyword, format!(r"^({KEYWORDS})\b")),
        (TokenKind::String, r#"^"([^"\\]|\\.)*""#.to_owned()),
        (TokenKind::Char, r"^'([^'\\]|\\.)*'".to_owned()),
        (TokenKind::Comment, r"^//.*".to_owned()),
        (TokenKind::Delimiter, r"^[<>{}()]".to_owned()),
        (
            TokenKind::Number,
            r"^-?([0-9]+\.?[0-9]*|\.[0-9]+)(e[0-9]+)?".to_owned(),
        ),
        (TokenKind::Identifier, r"^[_a-zA-Z][_a-zA-Z0-9]*".to_owned()),
    ];

    table
        .into_iter()
        .map(|(kind, pattern)| {
            let re = Regex::new(&format!("(?-u){pattern}"))
                .unwrap_or_else(|e| panic!("bad {kind:?} pattern: {e}"));
            (kind, re)
        })
        .collect()
});

/// The token at the start of `rest` (which must be non-empty).
fn longest_match(rest: &[u8]) -> Token {
    let mut best = Token {
        kind: TokenKind::Other,
        len: 1,
    };
    let mut matched = false;

    for (kind, re) in PATTERNS.iter() {
        if let Some(m) = re.find(rest) {
            if m.end() > 0 && (!matched || m.end() > best.len) {
                best = Token {
                    kind: *kind,
                    len: m.end(),
                };
                matched = true;
            }
        }
    }

    best
}

/// Split a line into tokens. The lengths always sum to `line.len()`.
#[must_use]
pub fn tokenize(line: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < line.len() {
        let token = longest_match(&line[pos..]);
        pos += token.len;
        tokens.push(token);
    }
    tokens
}

/// Return `line` with each colored token wrapped in its SGR prefix and a reset.
#[must_use]
pub fn render_colors(line: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(line.len() * 2);
    let mut pos = 0;
    for token in tokenize(line) {
        let text = &line[pos..pos + token.len];
        let color = token.kind.color();
        if color.is_empty() {
            out.extend_from_slice(text);
        } else {
            out.extend_from_slice(color.as_bytes());
            out.extend_from_slice(text);
            out.extend_from_slice(RESET);
        }
        pos += token.len;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Helper: the (kind, text) pairs of a line.
    fn kinds(line: &str) -> Vec<(TokenKind, &str)> {
        let mut pos = 0;
        tokenize(line.as_bytes())
            .into_iter()
            .map(|t| {
                let text = &line[pos..pos + t.len];
                pos += t.len;
                (t.kind, text)
            })
            .collect()
    }

    /// Helper: strip every CSI ... m sequence.
    fn strip_sgr(styled: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < styled.len() {
            if styled[i] == 0x1b {
                while i < styled.len() && styled[i] != b'm' {
                    i += 1;
                }
                i += 1;
            } else {
                out.push(styled[i]);
                i += 1;
            }
        }
        out
    }

    // ── Tokens ──────────────────────────────────────────────────────────

    #[test]
    fn empty_line_has_no_tokens() {
        assert!(tokenize(b"").is_empty());
    }

    #[test]
    fn include_line() {
        assert_eq!(kinds("#include <map>"), vec![
            (TokenKind::Directive, "#include"),
            (TokenKind::Other, " "),
            (TokenKind::Delimiter, "<"),
            (TokenKind::Identifier, "map"),
            (TokenKind::Delimiter, ">"),
        ]);
    }

    #[test]
    fn unknown_directive_is_bad() {
        assert_eq!(kinds("#includex"), vec![(TokenKind::BadDirective, "#includex")]);
    }

    #[test]
    fn keyword_beats_identifier_on_tie() {
        assert_eq!(kinds("int"), vec![(TokenKind::Keyword, "int")]);
    }

    #[test]
    fn longer_identifier_beats_keyword_prefix() {
        assert_eq!(kinds("integer"), vec![(TokenKind::Identifier, "integer")]);
    }

    #[test]
    fn single_letter_identifier() {
        assert_eq!(kinds("x"), vec![(TokenKind::Identifier, "x")]);
    }

    #[test]
    fn string_with_escaped_quote() {
        assert_eq!(kinds(r#""a\"b" x"#)[0], (TokenKind::String, r#""a\"b""#));
    }

    #[test]
    fn unterminated_string_falls_back_to_bytes() {
        assert_eq!(kinds("\"ab")[0], (TokenKind::Other, "\""));
    }

    #[test]
    fn char_literal() {
        assert_eq!(kinds("'\\n'"), vec![(TokenKind::Char, "'\\n'")]);
    }

    #[test]
    fn comment_runs_to_end() {
        assert_eq!(kinds("x // y z"), vec![
            (TokenKind::Identifier, "x"),
            (TokenKind::Other, " "),
            (TokenKind::Comment, "// y z"),
        ]);
    }

    #[test]
    fn numbers() {
        assert_eq!(kinds("42"), vec![(TokenKind::Number, "42")]);
        assert_eq!(kinds("-3.5e10"), vec![(TokenKind::Number, "-3.5e10")]);
        assert_eq!(kinds(".5"), vec![(TokenKind::Number, ".5")]);
    }

    #[test]
    fn invalid_utf8_is_tokenized_bytewise() {
        let tokens = tokenize(&[0xff, b'a']);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, TokenKind::Other);
    }

    #[test]
    fn token_lengths_cover_line() {
        let line = b"for (int i = 0; i < n; ++i) { s += \"x\"; } // done";
        let total: usize = tokenize(line).iter().map(|t| t.len).sum();
        assert_eq!(total, line.len());
    }

    // ── Rendering ───────────────────────────────────────────────────────

    #[test]
    fn uncolored_tokens_have_no_escapes() {
        assert_eq!(render_colors(b"abc = d"), b"abc = d".to_vec());
    }

    #[test]
    fn colored_token_is_reset() {
        assert_eq!(render_colors(b"(x)"), b"\x1b[38;5;184m(\x1b[0mx\x1b[38;5;184m)\x1b[0m".to_vec());
    }

    #[test]
    fn styling_preserves_text() {
        let line = b"#define MAX(a, b) ((a) > (b) ? (a) : (b)) // max";
        assert_eq!(strip_sgr(&render_colors(line)), line.to_vec());
    }
}

//! Single-pass comment scanner.

use std::collections::VecDeque;

use super::{
    CommentForm, CommentId, CommentSyntax, LocatedComments, MalformedComment, RawComment,
    DIRECTIVE_PREFIX,
};
use crate::extract::LineIndex;

const TRIPLE_DOUBLE: &str = "\"\"\"";
const TRIPLE_SINGLE: &str = "'''";

/// Bytes that make a following triple-quoted string part of an expression.
const EXPRESSION_CONTINUERS: &[u8] = b"=([{,+-*/%\\|&<>.@~^!";

/// Bytes after which a `/` opens a regex literal rather than dividing.
const REGEX_PRECEDERS: &[u8] = b"(,=:[!&|?{};+-*%<>~^";

/// Keywords after which a `/` opens a regex literal.
const REGEX_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case",
    "do", "else", "yield", "await",
];

/// Locate every comment in `source`, tracking string and char literals so
/// that comment markers inside them are ignored.
///
/// An unterminated block comment is recorded in
/// [`LocatedComments::malformed`] and ends the scan; comments found before
/// it are still returned.
pub fn locate(source: &str, syntax: &CommentSyntax) -> LocatedComments {
    let mut lexer = Lexer::new(source, syntax);
    lexer.run();
    lexer.finish()
}

struct Piece {
    start: usize,
    end: usize,
    form: CommentForm,
    marker: &'static str,
    inner: bool,
    own_line: bool,
    /// Text between the markers, not yet normalized.
    body: String,
    kind: PieceKind,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum PieceKind {
    Line,
    Block,
    Docstring,
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    syntax: &'a CommentSyntax,
    index: LineIndex,
    pos: usize,
    depth: i32,
    /// Most recent significant (non-whitespace, non-comment) bytes.
    recent: VecDeque<(usize, u8)>,
    pieces: Vec<Piece>,
    malformed: Vec<MalformedComment>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str, syntax: &'a CommentSyntax) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            syntax,
            index: LineIndex::new(src),
            pos: 0,
            depth: 0,
            recent: VecDeque::with_capacity(8),
            pieces: Vec::new(),
            malformed: Vec::new(),
        }
    }

    fn run(&mut self) {
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            if b.is_ascii_whitespace() {
                self.pos += 1;
                continue;
            }
            if self.try_regex_literal()
                || self.try_block_comment()
                || self.try_line_comment()
                || self.try_string()
            {
                continue;
            }
            match b {
                b'(' | b'[' | b'{' => self.depth += 1,
                b')' | b']' | b'}' => self.depth -= 1,
                _ => {}
            }
            self.mark(self.pos, b);
            self.pos += utf8_width(b);
        }
    }

    fn at(&self, i: usize, pat: &str) -> bool {
        self.bytes
            .get(i..)
            .is_some_and(|rest| rest.starts_with(pat.as_bytes()))
    }

    fn mark(&mut self, pos: usize, b: u8) {
        if self.recent.len() == 8 {
            self.recent.pop_front();
        }
        self.recent.push_back((pos, b));
    }

    /// Skip a regex literal so that `/*` or quotes inside it are not
    /// taken for comments or strings.
    fn try_regex_literal(&mut self) -> bool {
        let start = self.pos;
        if !self.syntax.regex_literals
            || self.bytes[start] != b'/'
            || matches!(self.bytes.get(start + 1), Some(b'/' | b'*'))
            || !self.regex_allowed()
        {
            return false;
        }

        let mut i = start + 1;
        let mut in_class = false;
        while i < self.bytes.len() {
            match self.bytes[i] {
                b'\\' => i += 1,
                b'\n' => return false,
                b'[' => in_class = true,
                b']' => in_class = false,
                b'/' if !in_class => {
                    let end = i + 1;
                    let flags = self.bytes[end..]
                        .iter()
                        .take_while(|b| b.is_ascii_alphabetic())
                        .count();
                    self.finish_string(end + flags);
                    return true;
                }
                _ => {}
            }
            i += 1;
        }
        false
    }

    /// Whether the previous significant token lets `/` start an operand.
    fn regex_allowed(&self) -> bool {
        let Some(&(pos, b)) = self.recent.back() else {
            return true;
        };
        if REGEX_PRECEDERS.contains(&b) {
            return true;
        }
        if !is_ident_byte(b) {
            return false;
        }
        let word_start = self.bytes[..=pos]
            .iter()
            .rposition(|&c| !is_ident_byte(c))
            .map_or(0, |p| p + 1);
        let word = &self.src[word_start..=pos];
        let member = word_start > 0 && self.bytes[word_start - 1] == b'.';
        !member && REGEX_KEYWORDS.contains(&word)
    }

    fn try_block_comment(&mut self) -> bool {
        let Some((open, close)) = self.syntax.block else {
            return false;
        };
        let start = self.pos;
        if !self.at(start, open) {
            return false;
        }

        let mut i = start + open.len();
        let mut nesting = 1;
        loop {
            if i >= self.bytes.len() {
                self.malformed.push(MalformedComment {
                    span: self.index.span(start, self.bytes.len()),
                });
                self.pos = self.bytes.len();
                return true;
            }
            if self.syntax.nested_blocks && self.at(i, open) {
                nesting += 1;
                i += open.len();
            } else if self.at(i, close) {
                nesting -= 1;
                i += close.len();
                if nesting == 0 {
                    break;
                }
            } else {
                i += 1;
            }
        }
        let end = i;

        let empty = self.at(start, "/**/");
        let doc_marker = self
            .syntax
            .doc_block_openers
            .iter()
            .find(|m| !empty && self.at(start, m))
            .copied();
        let marker = doc_marker.unwrap_or(open);
        let body_start = (start + marker.len()).min(end - close.len());
        self.pieces.push(Piece {
            start,
            end,
            form: if doc_marker.is_some() {
                CommentForm::DocComment
            } else {
                CommentForm::BlockComment
            },
            marker,
            inner: self.syntax.inner_doc_markers.contains(&marker),
            own_line: self.only_whitespace_before(start) && self.clean_after(end),
            body: self.src[body_start..end - close.len()].to_string(),
            kind: PieceKind::Block,
        });
        self.pos = end;
        true
    }

    fn try_line_comment(&mut self) -> bool {
        let start = self.pos;
        let plain = self
            .syntax
            .plain_overrides
            .iter()
            .any(|m| self.at(start, m));
        let doc = if plain {
            None
        } else {
            self.syntax
                .doc_line_markers
                .iter()
                .find(|m| self.at(start, m))
                .copied()
        };
        let marker = match doc.or_else(|| {
            self.syntax
                .line_markers
                .iter()
                .find(|m| self.at(start, m))
                .copied()
        }) {
            Some(m) => m,
            None => return false,
        };

        let end = self.bytes[start..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|p| start + p)
            .unwrap_or(self.bytes.len());
        let body = self.src[start + marker.len()..end].trim_end_matches('\r');
        self.pieces.push(Piece {
            start,
            end: start + marker.len() + body.len(),
            form: if doc.is_some() {
                CommentForm::DocComment
            } else {
                CommentForm::LineComment
            },
            marker,
            inner: self.syntax.inner_doc_markers.contains(&marker),
            own_line: self.only_whitespace_before(start),
            body: body.to_string(),
            kind: PieceKind::Line,
        });
        self.pos = end;
        true
    }

    fn try_string(&mut self) -> bool {
        let start = self.pos;
        let b = self.bytes[start];

        if self.syntax.raw_strings && (b == b'r' || b == b'b') {
            if let Some(end) = self.raw_string_end(start) {
                self.finish_string(end);
                return true;
            }
            return false;
        }

        if self.syntax.triple_quotes {
            let triple = if self.at(start, TRIPLE_DOUBLE) {
                Some(TRIPLE_DOUBLE)
            } else if self.syntax.string_quotes.contains(&b'\'') && self.at(start, TRIPLE_SINGLE) {
                Some(TRIPLE_SINGLE)
            } else {
                None
            };
            if let Some(quote) = triple {
                self.scan_triple(start, quote);
                return true;
            }
        }

        if b == b'`' && self.syntax.backtick_strings {
            let end = self.quoted_end(start, b'`', self.syntax.backtick_escapes, true);
            self.finish_string(end);
            return true;
        }

        if !self.syntax.string_quotes.contains(&b) {
            return false;
        }

        if b == b'\'' && self.syntax.lifetimes {
            let next = self.bytes.get(start + 1).copied();
            let is_char = match next {
                Some(b'\\') => true,
                Some(n) => self.bytes.get(start + 1 + utf8_width(n)) == Some(&b'\''),
                None => false,
            };
            if !is_char {
                // Lifetime or label.
                return false;
            }
        }

        let end = self.quoted_end(start, b, true, self.syntax.multiline_strings);
        self.finish_string(end);
        true
    }

    fn finish_string(&mut self, end: usize) {
        if end > 0 {
            self.mark(end - 1, self.bytes[end - 1]);
        }
        self.pos = end;
    }

    /// End of a string opened at `start`, or the end of the line when an
    /// unterminated single-line string runs into a newline.
    fn quoted_end(&self, start: usize, quote: u8, escapes: bool, multiline: bool) -> usize {
        let mut i = start + 1;
        while i < self.bytes.len() {
            let c = self.bytes[i];
            if escapes && c == b'\\' {
                i += 2;
                continue;
            }
            if c == quote {
                return i + 1;
            }
            if c == b'\n' && !multiline {
                return i;
            }
            i += 1;
        }
        self.bytes.len()
    }

    /// End of a Rust raw string (`r"…"`, `r#"…"#`, `br"…"`) starting at
    /// `start`, if one starts there.
    fn raw_string_end(&self, start: usize) -> Option<usize> {
        if start > 0 && is_ident_byte(self.bytes[start - 1]) {
            return None;
        }
        let mut i = start;
        if self.bytes[i] == b'b' {
            i += 1;
        }
        if self.bytes.get(i) != Some(&b'r') {
            return None;
        }
        i += 1;
        let hashes = self.bytes[i..].iter().take_while(|&&b| b == b'#').count();
        i += hashes;
        if self.bytes.get(i) != Some(&b'"') {
            return None;
        }
        i += 1;
        while i < self.bytes.len() {
            if self.bytes[i] == b'"'
                && self.bytes[i + 1..]
                    .iter()
                    .take(hashes)
                    .filter(|&&b| b == b'#')
                    .count()
                    == hashes
            {
                return Some(i + 1 + hashes);
            }
            i += 1;
        }
        Some(self.bytes.len())
    }

    fn scan_triple(&mut self, start: usize, quote: &'static str) {
        let mut i = start + 3;
        let mut end = self.bytes.len();
        let mut body_end = self.bytes.len();
        while i < self.bytes.len() {
            if self.bytes[i] == b'\\' {
                i += 2;
                continue;
            }
            if self.at(i, quote) {
                body_end = i;
                end = i + 3;
                break;
            }
            i += 1;
        }

        if self.syntax.docstrings && self.is_docstring(start, end) {
            let prefix_start = self.prefix_start(start);
            self.pieces.push(Piece {
                start: prefix_start,
                end,
                form: CommentForm::DocComment,
                marker: quote,
                inner: false,
                own_line: self.only_whitespace_before(prefix_start) && self.clean_after(end),
                body: self.src[start + 3..body_end.max(start + 3)].to_string(),
                kind: PieceKind::Docstring,
            });
            self.pos = end;
            return;
        }
        self.finish_string(end);
    }

    /// Start of the string prefix (`r`, `u`) directly before a quote.
    fn prefix_start(&self, quote_start: usize) -> usize {
        let mut s = quote_start;
        while s > 0 && quote_start - s < 2 && self.bytes[s - 1].is_ascii_alphabetic() {
            s -= 1;
        }
        if s > 0 && is_ident_byte(self.bytes[s - 1]) {
            quote_start
        } else {
            s
        }
    }

    fn is_docstring(&self, start: usize, end: usize) -> bool {
        if self.depth != 0 || !self.clean_after(end) {
            return false;
        }
        let prefix_start = self.prefix_start(start);
        let prefix = &self.bytes[prefix_start..start];
        if !prefix.iter().all(|b| matches!(b, b'r' | b'R' | b'u' | b'U')) {
            return false;
        }
        let prev = self
            .recent
            .iter()
            .rev()
            .find(|(pos, _)| *pos < prefix_start)
            .map(|(_, b)| *b);
        match prev {
            None => true,
            Some(b':') => {
                self.only_whitespace_before(prefix_start) || self.opens_definition(prefix_start)
            }
            Some(p) => {
                self.only_whitespace_before(prefix_start) && !EXPRESSION_CONTINUERS.contains(&p)
            }
        }
    }

    /// The line holding `pos` starts a `def` or `class` header, as in
    /// `def f(): """Doc."""`.
    fn opens_definition(&self, pos: usize) -> bool {
        let (line, _) = self.index.position(pos);
        let line_start = self.index.line_start(line).unwrap_or(0);
        let head = self.src[line_start..pos].trim_start();
        let head = head.strip_prefix("async ").map_or(head, str::trim_start);
        head.starts_with("def ") || head.starts_with("class ")
    }

    fn only_whitespace_before(&self, pos: usize) -> bool {
        let (line, _) = self.index.position(pos);
        let line_start = self.index.line_start(line).unwrap_or(0);
        self.bytes[line_start..pos]
            .iter()
            .all(|b| b.is_ascii_whitespace())
    }

    /// Nothing but whitespace, or a line comment, follows `pos` on its line.
    fn clean_after(&self, pos: usize) -> bool {
        let mut i = pos;
        while i < self.bytes.len() && self.bytes[i] != b'\n' {
            let b = self.bytes[i];
            if !b.is_ascii_whitespace() {
                return self.syntax.line_markers.iter().any(|m| self.at(i, m));
            }
            i += 1;
        }
        true
    }

    fn finish(self) -> LocatedComments {
        let mut groups: Vec<(Piece, Vec<String>)> = Vec::new();
        for piece in self.pieces {
            if piece.kind == PieceKind::Line && piece.own_line {
                if let Some((last, lines)) = groups.last_mut() {
                    let adjacent = last.kind == PieceKind::Line
                        && last.own_line
                        && last.marker == piece.marker
                        && self.index.position(last.end).0 + 1 == self.index.position(piece.start).0;
                    let directive = is_directive(&lines[0]) || is_directive(&piece.body);
                    if adjacent && !directive {
                        last.end = piece.end;
                        lines.push(piece.body);
                        continue;
                    }
                }
            }
            let lines = vec![piece.body.clone()];
            groups.push((piece, lines));
        }

        let comments = groups
            .into_iter()
            .enumerate()
            .map(|(i, (piece, lines))| RawComment {
                id: CommentId(i),
                text: match piece.kind {
                    PieceKind::Line => normalize_line_comment(&lines),
                    PieceKind::Block => normalize_block_comment(&piece.body),
                    PieceKind::Docstring => clean_docstring(&piece.body),
                },
                span: self.index.span(piece.start, piece.end),
                form: piece.form,
                own_line: piece.own_line,
                inner: piece.inner,
                marker: piece.marker,
            })
            .collect();

        LocatedComments {
            comments,
            malformed: self.malformed,
        }
    }
}

fn is_directive(body: &str) -> bool {
    body.trim_start().starts_with(DIRECTIVE_PREFIX)
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn utf8_width(b: u8) -> usize {
    match b {
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf7 => 4,
        _ => 1,
    }
}

fn normalize_line_comment(lines: &[String]) -> String {
    lines
        .iter()
        .map(|l| l.strip_prefix(' ').unwrap_or(l).trim_end())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn normalize_block_comment(body: &str) -> String {
    body.lines()
        .map(|l| {
            let l = l.trim_start();
            match l.strip_prefix('*') {
                Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
                None => l,
            }
            .trim_end()
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Dedent a docstring body the way documentation tools do: the first line
/// is stripped, the rest lose their common indentation.
fn clean_docstring(body: &str) -> String {
    let mut lines = body.lines();
    let first = lines.next().unwrap_or("").trim();
    let rest: Vec<&str> = lines.collect();
    let indent = rest
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    let mut out = vec![first.to_string()];
    out.extend(
        rest.iter()
            .map(|l| l.get(indent..).unwrap_or("").trim_end().to_string()),
    );
    out.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::languages::{go, javascript, python, rust_lang};

    fn texts(source: &str, syntax: &CommentSyntax) -> Vec<String> {
        locate(source, syntax)
            .comments
            .into_iter()
            .map(|c| c.text)
            .collect()
    }

    #[test]
    fn test_markers_inside_strings_are_ignored() {
        let src = "let url = \"http://example.com\"; // real\nlet s = \"/* not */\";\n";
        assert_eq!(texts(src, &rust_lang::COMMENT_SYNTAX), vec!["real"]);

        let py = "x = '# not a comment'  # real\n";
        assert_eq!(texts(py, &python::COMMENT_SYNTAX), vec!["real"]);
    }

    #[test]
    fn test_adjacent_line_comments_merge() {
        let src = "// first line\n// second line\n\n// separate\nfn f() {}\n";
        let located = locate(src, &rust_lang::COMMENT_SYNTAX);
        assert_eq!(located.comments.len(), 2);
        assert_eq!(located.comments[0].text, "first line\nsecond line");
        assert_eq!(located.comments[0].span.start_line, 1);
        assert_eq!(located.comments[0].span.end_line, 2);
        assert_eq!(located.comments[1].text, "separate");
    }

    #[test]
    fn test_doc_markers_do_not_merge_with_plain() {
        let src = "// plain\n/// Docs for f.\nfn f() {}\n";
        let located = locate(src, &rust_lang::COMMENT_SYNTAX);
        assert_eq!(located.comments.len(), 2);
        assert_eq!(located.comments[0].form, CommentForm::LineComment);
        assert_eq!(located.comments[1].form, CommentForm::DocComment);
        assert_eq!(located.comments[1].text, "Docs for f.");
    }

    #[test]
    fn test_directives_stay_separate() {
        let src = "# commentgate:ignore missing_comment - generated\n# ordinary\n";
        let located = locate(src, &python::COMMENT_SYNTAX);
        assert_eq!(located.comments.len(), 2);
        assert!(located.comments[0].directive().is_some());
    }

    #[test]
    fn test_trailing_comment_is_not_own_line() {
        let src = "x := 1 // trailing\n// own\n";
        let located = locate(src, &go::COMMENT_SYNTAX);
        assert!(!located.comments[0].own_line);
        assert!(located.comments[1].own_line);
    }

    #[test]
    fn test_block_and_doc_block_forms() {
        let src = "/**\n * Adds two numbers.\n * @param a first\n */\nfunction add(a, b) { return a + b; /* inline */ }\n";
        let located = locate(src, &javascript::COMMENT_SYNTAX);
        assert_eq!(located.comments.len(), 2);
        assert_eq!(located.comments[0].form, CommentForm::DocComment);
        assert_eq!(located.comments[0].text, "Adds two numbers.\n@param a first");
        assert!(located.comments[0].own_line);
        assert_eq!(located.comments[1].form, CommentForm::BlockComment);
        assert!(!located.comments[1].own_line);
    }

    #[test]
    fn test_nested_rust_block_comment() {
        let src = "/* outer /* inner */ still outer */ fn f() {}\n// after\n";
        let located = locate(src, &rust_lang::COMMENT_SYNTAX);
        assert_eq!(located.comments.len(), 2);
        assert_eq!(located.comments[0].text, "outer /* inner */ still outer");
        assert!(located.malformed.is_empty());
    }

    #[test]
    fn test_unterminated_block_comment_is_malformed() {
        let src = "// kept\nfn f() {}\n/* never closed\nfn g() {}\n";
        let located = locate(src, &rust_lang::COMMENT_SYNTAX);
        assert_eq!(located.comments.len(), 1);
        assert_eq!(located.malformed.len(), 1);
        assert_eq!(located.malformed[0].span.start_line, 3);
    }

    #[test]
    fn test_lifetimes_and_char_literals() {
        let src = "fn f<'a>(x: &'a str) -> char { '\"' } // tail\nfn g() -> char { '\\'' }\n";
        let located = locate(src, &rust_lang::COMMENT_SYNTAX);
        assert_eq!(located.comments.len(), 1);
        assert_eq!(located.comments[0].text, "tail");
    }

    #[test]
    fn test_rust_raw_strings() {
        let src = "let s = r#\"has \"// quotes\"#; // real\n";
        assert_eq!(texts(src, &rust_lang::COMMENT_SYNTAX), vec!["real"]);
    }

    #[test]
    fn test_python_docstrings() {
        let src = "def f(x):\n    \"\"\"Return x.\n\n    More detail.\n    \"\"\"\n    y = \"\"\"not a doc\"\"\"\n    return x\n";
        let located = locate(src, &python::COMMENT_SYNTAX);
        assert_eq!(located.comments.len(), 1);
        let doc = &located.comments[0];
        assert_eq!(doc.form, CommentForm::DocComment);
        assert_eq!(doc.text, "Return x.\n\nMore detail.");
        assert_eq!(doc.span.start_line, 2);
        assert_eq!(doc.span.end_line, 5);
    }

    #[test]
    fn test_python_call_argument_is_not_docstring() {
        let src = "print(\n    \"\"\"text\"\"\"\n)\n";
        assert!(locate(src, &python::COMMENT_SYNTAX).comments.is_empty());
    }

    #[test]
    fn test_lambda_string_is_not_docstring() {
        let src = "def f(self):\n    g = lambda: \"\"\"x\"\"\"\n    return g\n";
        assert!(locate(src, &python::COMMENT_SYNTAX).comments.is_empty());

        let inline = "def f(): \"\"\"Do nothing.\"\"\"\n";
        assert_eq!(texts(inline, &python::COMMENT_SYNTAX), vec!["Do nothing."]);
    }

    #[test]
    fn test_javascript_regex_literals() {
        let src = "function strip(p) { return p.replace(/\\/*$/, ''); }\n\n/** Join parts. */\nfunction join(a, b) {}\n";
        let located = locate(src, &javascript::COMMENT_SYNTAX);
        assert!(located.malformed.is_empty());
        assert_eq!(located.comments.len(), 1);
        assert_eq!(located.comments[0].text, "Join parts.");
        assert_eq!(located.comments[0].form, CommentForm::DocComment);
        assert_eq!(located.comments[0].start_line(), 3);

        let quote = "const q = s.split(/\"/); // split on quotes\nconst r = x.match(/[/*]/g) // class\n";
        assert_eq!(texts(quote, &javascript::COMMENT_SYNTAX), vec!["split on quotes", "class"]);

        let keyword = "if (ok) return /\\/*/.test(s); // after return\n";
        assert_eq!(texts(keyword, &javascript::COMMENT_SYNTAX), vec!["after return"]);
    }

    #[test]
    fn test_javascript_division_is_not_regex() {
        let src = "const half = total / 2; // halve\nconst ratio = (a) / b / c; /* ratio */\n";
        assert_eq!(texts(src, &javascript::COMMENT_SYNTAX), vec!["halve", "ratio"]);
    }

    #[test]
    fn test_go_backtick_strings() {
        let src = "var s = `// not a comment\n/* nor this */`\n// real\n";
        assert_eq!(texts(src, &go::COMMENT_SYNTAX), vec!["real"]);
    }
}

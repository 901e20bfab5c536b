//! PHP lexer - tokenizes source text, keeping trivia addressable
//!
//! Whitespace, comments and attributes are never emitted as tokens. Each
//! token instead records where the trivia before it started, so the tree
//! builder can give every node both its own range and its leading trivia.

use crate::error::SyntaxError;
use crate::text::TextRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Text outside of `<?php ... ?>`
    InlineHtml,
    /// `<?php` or `<?`
    OpenTag,
    /// `<?=`
    OpenTagEcho,
    /// `?>`, including one directly following newline
    CloseTag,
    /// `$name`
    Variable,
    /// Identifier, keyword or (qualified) name such as `\Foo\Bar`
    Name,
    Integer,
    Float,
    /// Single quoted, double quoted or backtick string
    String,
    /// Heredoc or nowdoc, from `<<<` to the closing label
    Heredoc,
    /// `(int)`, `(string)` ...
    Cast,
    /// Operator or punctuation
    Punct,
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: TextRange,
    /// Start of the whitespace/comments preceding this token
    pub trivia_start: u32,
}

impl Token {
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        self.range.slice(source)
    }
}

const PUNCT_3: &[&str] = &["<=>", "===", "!==", "**=", "...", "<<=", ">>=", "??=", "?->"];
const PUNCT_2: &[&str] = &[
    "**", "++", "--", "->", "=>", "::", "==", "!=", "<>", "<=", ">=", "&&", "||", "??", "+=",
    "-=", "*=", "/=", ".=", "%=", "&=", "|=", "^=", "<<", ">>",
];
const PUNCT_1: &[u8] = b"+-*/%.=<>!?:;,()[]{}&|^~@";

const CAST_TYPES: &[&str] = &[
    "int", "integer", "bool", "boolean", "float", "double", "real", "string", "array", "object",
    "unset", "binary",
];

/// Tokenize a whole file
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    position: usize,
    tokens: Vec<Token>,
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

fn is_ident_char(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            position: 0,
            tokens: Vec::new(),
        }
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.position + offset).copied()
    }

    fn starts_with(&self, text: &str) -> bool {
        self.bytes[self.position..].starts_with(text.as_bytes())
    }

    fn error(&self, position: usize, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(self.source, position, message)
    }

    fn push(&mut self, kind: TokenKind, start: usize, trivia_start: usize) {
        self.tokens.push(Token {
            kind,
            range: TextRange::new(start as u32, self.position as u32),
            trivia_start: trivia_start as u32,
        });
    }

    fn run(mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut in_php = false;

        loop {
            if !in_php {
                if self.position >= self.bytes.len() {
                    break;
                }
                in_php = self.lex_inline_html();
                continue;
            }

            let trivia_start = self.position;
            self.skip_trivia()?;
            if self.position >= self.bytes.len() {
                self.push_eof(trivia_start);
                return Ok(self.tokens);
            }

            if self.starts_with("?>") {
                let start = self.position;
                self.position += 2;
                if self.starts_with("\r\n") {
                    self.position += 2;
                } else if self.peek_at(0) == Some(b'\n') {
                    self.position += 1;
                }
                self.push(TokenKind::CloseTag, start, trivia_start);
                in_php = false;
                continue;
            }

            self.lex_token(trivia_start)?;
        }

        let end = self.position;
        self.push_eof(end);
        Ok(self.tokens)
    }

    fn push_eof(&mut self, trivia_start: usize) {
        let end = self.bytes.len() as u32;
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            range: TextRange::new(end, end),
            trivia_start: trivia_start as u32,
        });
    }

    /// Consume HTML up to and including the next open tag.
    /// Returns true when an open tag was found.
    fn lex_inline_html(&mut self) -> bool {
        let rest = &self.source[self.position..];
        let Some(found) = rest.find("<?") else {
            let start = self.position;
            self.position = self.bytes.len();
            self.push(TokenKind::InlineHtml, start, start);
            return false;
        };

        if found > 0 {
            let start = self.position;
            self.position += found;
            self.push(TokenKind::InlineHtml, start, start);
        }

        let start = self.position;
        if self.starts_with("<?=") {
            self.position += 3;
            self.push(TokenKind::OpenTagEcho, start, start);
        } else if self.source[self.position..]
            .get(..5)
            .is_some_and(|tag| tag.eq_ignore_ascii_case("<?php"))
        {
            self.position += 5;
            self.push(TokenKind::OpenTag, start, start);
        } else {
            self.position += 2;
            self.push(TokenKind::OpenTag, start, start);
        }
        true
    }

    fn skip_trivia(&mut self) -> Result<(), SyntaxError> {
        while let Some(b) = self.peek_at(0) {
            match b {
                b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c => self.position += 1,
                b'#' if self.peek_at(1) == Some(b'[') => self.skip_attribute()?,
                b'#' => self.skip_line_comment(),
                b'/' if self.peek_at(1) == Some(b'/') => self.skip_line_comment(),
                b'/' if self.peek_at(1) == Some(b'*') => {
                    let start = self.position;
                    match self.source[self.position + 2..].find("*/") {
                        Some(end) => self.position += 2 + end + 2,
                        None => return Err(self.error(start, "unterminated comment")),
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn skip_line_comment(&mut self) {
        while let Some(b) = self.peek_at(0) {
            if b == b'\n' || self.starts_with("?>") {
                break;
            }
            self.position += 1;
        }
    }

    /// Attributes carry no meaning for rewriting, so `#[...]` is trivia
    fn skip_attribute(&mut self) -> Result<(), SyntaxError> {
        let start = self.position;
        self.position += 2;
        let mut depth = 1usize;
        while let Some(b) = self.peek_at(0) {
            match b {
                b'[' => {
                    depth += 1;
                    self.position += 1;
                }
                b']' => {
                    depth -= 1;
                    self.position += 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                b'\'' | b'"' => self.scan_quoted(b)?,
                _ => self.position += 1,
            }
        }
        Err(self.error(start, "unterminated attribute"))
    }

    fn lex_token(&mut self, trivia_start: usize) -> Result<(), SyntaxError> {
        let start = self.position;
        let b = self.bytes[self.position];

        match b {
            b'$' => {
                if self.peek_at(1).is_some_and(is_ident_start) {
                    self.position += 1;
                    self.eat_ident();
                    self.push(TokenKind::Variable, start, trivia_start);
                    Ok(())
                } else if matches!(self.peek_at(1), Some(b'$' | b'{')) {
                    // `$$name` and `${expr}`
                    self.position += 1;
                    self.push(TokenKind::Punct, start, trivia_start);
                    Ok(())
                } else {
                    Err(self.error(start, "expected variable name after '$'"))
                }
            }
            b'\\' if self.peek_at(1).is_some_and(is_ident_start) => {
                self.lex_name();
                self.push(TokenKind::Name, start, trivia_start);
                Ok(())
            }
            _ if is_ident_start(b) => {
                self.lex_name();
                self.push(TokenKind::Name, start, trivia_start);
                Ok(())
            }
            b'0'..=b'9' => {
                let kind = self.lex_number();
                self.push(kind, start, trivia_start);
                Ok(())
            }
            b'.' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                let kind = self.lex_number();
                self.push(kind, start, trivia_start);
                Ok(())
            }
            b'\'' | b'"' | b'`' => {
                self.scan_quoted(b)?;
                self.push(TokenKind::String, start, trivia_start);
                Ok(())
            }
            b'<' if self.starts_with("<<<") => {
                self.lex_heredoc()?;
                self.push(TokenKind::Heredoc, start, trivia_start);
                Ok(())
            }
            b'(' if self.try_cast() => {
                self.push(TokenKind::Cast, start, trivia_start);
                Ok(())
            }
            _ => {
                if let Some(p) = PUNCT_3.iter().find(|p| self.starts_with(p)) {
                    self.position += p.len();
                } else if let Some(p) = PUNCT_2.iter().find(|p| self.starts_with(p)) {
                    self.position += p.len();
                } else if PUNCT_1.contains(&b) {
                    self.position += 1;
                } else {
                    let ch = self.source[start..].chars().next().unwrap_or('?');
                    return Err(self.error(start, format!("unexpected character '{}'", ch)));
                }
                self.push(TokenKind::Punct, start, trivia_start);
                Ok(())
            }
        }
    }

    fn eat_ident(&mut self) {
        while self.peek_at(0).is_some_and(is_ident_char) {
            self.position += 1;
        }
    }

    fn lex_name(&mut self) {
        if self.peek_at(0) == Some(b'\\') {
            self.position += 1;
        }
        self.eat_ident();
        while self.peek_at(0) == Some(b'\\') && self.peek_at(1).is_some_and(is_ident_start) {
            self.position += 1;
            self.eat_ident();
        }
        // group use prefix, `use App\Entity\{User, Post};`
        if self.peek_at(0) == Some(b'\\') && self.peek_at(1) == Some(b'{') {
            self.position += 1;
        }
    }

    fn lex_number(&mut self) -> TokenKind {
        let radix_prefix = self.peek_at(0) == Some(b'0')
            && matches!(
                self.peek_at(1),
                Some(b'x' | b'X' | b'b' | b'B' | b'o' | b'O')
            );
        if radix_prefix {
            self.position += 2;
            while self
                .peek_at(0)
                .is_some_and(|c| c.is_ascii_hexdigit() || c == b'_')
            {
                self.position += 1;
            }
            return TokenKind::Integer;
        }

        let mut kind = TokenKind::Integer;
        self.eat_digits();
        if self.peek_at(0) == Some(b'.') && self.peek_at(1).map_or(true, |c| c != b'.') {
            kind = TokenKind::Float;
            self.position += 1;
            self.eat_digits();
        }
        if matches!(self.peek_at(0), Some(b'e' | b'E')) {
            let digit_at = if matches!(self.peek_at(1), Some(b'+' | b'-')) { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                kind = TokenKind::Float;
                self.position += digit_at;
                self.eat_digits();
            }
        }
        kind
    }

    fn eat_digits(&mut self) {
        while self
            .peek_at(0)
            .is_some_and(|c| c.is_ascii_digit() || c == b'_')
        {
            self.position += 1;
        }
    }

    /// Scan a quoted string starting at the opening quote
    fn scan_quoted(&mut self, quote: u8) -> Result<(), SyntaxError> {
        let start = self.position;
        self.position += 1;
        while let Some(b) = self.peek_at(0) {
            if b == b'\\' {
                self.position += 2;
            } else if b == quote {
                self.position += 1;
                return Ok(());
            } else if quote != b'\'' && b == b'{' && self.peek_at(1) == Some(b'$') {
                self.scan_interpolation()?;
            } else {
                self.position += 1;
            }
        }
        Err(self.error(start, "unterminated string"))
    }

    /// Skip a `{$...}` interpolation inside a double quoted string
    fn scan_interpolation(&mut self) -> Result<(), SyntaxError> {
        let start = self.position;
        let mut depth = 0usize;
        while let Some(b) = self.peek_at(0) {
            match b {
                b'{' => {
                    depth += 1;
                    self.position += 1;
                }
                b'}' => {
                    depth -= 1;
                    self.position += 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                b'\'' | b'"' => self.scan_quoted(b)?,
                _ => self.position += 1,
            }
        }
        Err(self.error(start, "unterminated string interpolation"))
    }

    fn lex_heredoc(&mut self) -> Result<(), SyntaxError> {
        let start = self.position;
        self.position += 3;
        while matches!(self.peek_at(0), Some(b' ' | b'\t')) {
            self.position += 1;
        }

        let quote = match self.peek_at(0) {
            Some(q @ (b'\'' | b'"')) => {
                self.position += 1;
                Some(q)
            }
            _ => None,
        };

        let label_start = self.position;
        self.eat_ident();
        let label = &self.source[label_start..self.position];
        if label.is_empty() {
            return Err(self.error(start, "missing heredoc label"));
        }
        if let Some(q) = quote {
            if self.peek_at(0) != Some(q) {
                return Err(self.error(start, "unterminated heredoc label"));
            }
            self.position += 1;
        }
        match self.source[self.position..].find('\n') {
            Some(newline) => self.position += newline + 1,
            None => return Err(self.error(start, "unterminated heredoc")),
        }

        // Find the closing label at the start of a line, optionally indented
        loop {
            let line_start = self.position;
            let line_end = self.source[line_start..]
                .find('\n')
                .map(|i| line_start + i)
                .unwrap_or(self.bytes.len());
            let line = &self.source[line_start..line_end];
            let trimmed = line.trim_start_matches([' ', '\t']);
            if let Some(rest) = trimmed.strip_prefix(label) {
                if rest.as_bytes().first().map_or(true, |c| !is_ident_char(*c)) {
                    self.position = line_start + (line.len() - trimmed.len()) + label.len();
                    return Ok(());
                }
            }
            if line_end >= self.bytes.len() {
                return Err(self.error(start, format!("unterminated heredoc '{}'", label)));
            }
            self.position = line_end + 1;
        }
    }

    /// Consume a cast such as `( int )` if one starts here
    fn try_cast(&mut self) -> bool {
        let rest = &self.source[self.position + 1..];
        let inner = rest.trim_start_matches([' ', '\t']);
        let word_len = inner
            .bytes()
            .take_while(|b| b.is_ascii_alphabetic())
            .count();
        if word_len == 0 {
            return false;
        }
        let word = &inner[..word_len];
        if !CAST_TYPES.iter().any(|t| t.eq_ignore_ascii_case(word)) {
            return false;
        }
        let after = inner[word_len..].trim_start_matches([' ', '\t']);
        if !after.starts_with(')') {
            return false;
        }
        let consumed = rest.len() - after.len() + 1;
        self.position += 1 + consumed;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<(TokenKind, String)> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.text(source).to_string()))
            .collect()
    }

    #[test]
    fn test_basic_statement() {
        let tokens = kinds("<?php $response->setStatusCode(200);");
        assert_eq!(
            tokens,
            vec![
                (TokenKind::OpenTag, "<?php".to_string()),
                (TokenKind::Variable, "$response".to_string()),
                (TokenKind::Punct, "->".to_string()),
                (TokenKind::Name, "setStatusCode".to_string()),
                (TokenKind::Punct, "(".to_string()),
                (TokenKind::Integer, "200".to_string()),
                (TokenKind::Punct, ")".to_string()),
                (TokenKind::Punct, ";".to_string()),
                (TokenKind::Eof, String::new()),
            ]
        );
    }

    #[test]
    fn test_trivia_is_attached_to_next_token() {
        let source = "<?php\n// hello\n$a;";
        let tokens = tokenize(source).unwrap();
        let var = tokens[1];
        assert_eq!(var.kind, TokenKind::Variable);
        assert_eq!(
            &source[var.trivia_start as usize..var.range.start as usize],
            "\n// hello\n"
        );
    }

    #[test]
    fn test_strings_hide_comment_markers() {
        let tokens = kinds("<?php $a = '// not a comment' . \"/* nor {$b['x']} */\";");
        assert_eq!(tokens[3], (TokenKind::String, "'// not a comment'".to_string()));
        assert_eq!(
            tokens[5],
            (TokenKind::String, "\"/* nor {$b['x']} */\"".to_string())
        );
    }

    #[test]
    fn test_qualified_names_and_casts() {
        let tokens = kinds("<?php \\Foo\\Bar::class; (int) $x; ( string )$y;");
        assert_eq!(tokens[1], (TokenKind::Name, "\\Foo\\Bar".to_string()));
        assert_eq!(tokens[5], (TokenKind::Cast, "(int)".to_string()));
        assert_eq!(tokens[8], (TokenKind::Cast, "( string )".to_string()));
    }

    #[test]
    fn test_group_use_prefix_and_indirect_variables() {
        let tokens = kinds("<?php use App\\{A, B}; $$name; ${'x'};");
        assert_eq!(tokens[2], (TokenKind::Name, "App\\".to_string()));
        assert_eq!(tokens[3], (TokenKind::Punct, "{".to_string()));
        assert_eq!(tokens[9], (TokenKind::Punct, "$".to_string()));
        assert_eq!(tokens[10], (TokenKind::Variable, "$name".to_string()));
        assert_eq!(tokens[12], (TokenKind::Punct, "$".to_string()));
        assert_eq!(tokens[13], (TokenKind::Punct, "{".to_string()));
        assert!(tokenize("<?php $ x;").is_err());
    }

    #[test]
    fn test_numbers() {
        let tokens = kinds("<?php 0x1F; 1_000; 1.5; 2e10; .5;");
        assert_eq!(tokens[1].0, TokenKind::Integer);
        assert_eq!(tokens[3], (TokenKind::Integer, "1_000".to_string()));
        assert_eq!(tokens[5].0, TokenKind::Float);
        assert_eq!(tokens[7].0, TokenKind::Float);
        assert_eq!(tokens[9], (TokenKind::Float, ".5".to_string()));
    }

    #[test]
    fn test_heredoc() {
        let source = "<?php $a = <<<EOT\n  text $x\n  EOT;\n";
        let tokens = kinds(source);
        assert_eq!(tokens[3], (TokenKind::Heredoc, "<<<EOT\n  text $x\n  EOT".to_string()));
        assert_eq!(tokens[4], (TokenKind::Punct, ";".to_string()));
    }

    #[test]
    fn test_inline_html_and_close_tag() {
        let tokens = kinds("<html><?php echo 1; ?>\n</html>");
        assert_eq!(tokens[0], (TokenKind::InlineHtml, "<html>".to_string()));
        assert_eq!(tokens[1].0, TokenKind::OpenTag);
        assert_eq!(tokens[5], (TokenKind::CloseTag, "?>\n".to_string()));
        assert_eq!(tokens[6], (TokenKind::InlineHtml, "</html>".to_string()));
    }

    #[test]
    fn test_attributes_are_trivia() {
        let tokens = kinds("<?php #[Route('/x', methods: ['GET'])]\nfunction f() {}");
        assert_eq!(tokens[1], (TokenKind::Name, "function".to_string()));
    }

    #[test]
    fn test_unterminated_comment() {
        let err = tokenize("<?php /* never closed").unwrap_err();
        assert_eq!(err.position, 6);
        assert!(err.message.contains("unterminated comment"));
    }

    #[test]
    fn test_unterminated_string() {
        assert!(tokenize("<?php $a = 'oops;").is_err());
    }
}

//! Recursive descent parser for the supported PHP subset
//!
//! Statements are parsed by keyword dispatch, expressions by precedence
//! climbing. Every node records the byte range of its first to last token
//! and where the trivia in front of its first token started.
//!
//! Constructs outside the subset (alternative control syntax, trait
//! adaptations, property hooks, DNF types ...) are reported as syntax errors
//! instead of being guessed at, and so is nesting deeper than
//! [`MAX_NESTING`] levels.

use crate::error::SyntaxError;
use crate::lexer::{tokenize, Token, TokenKind};
use crate::node::{
    precedence, AssignOperator, BinaryOperator, LiteralKind, Modifier, Node, NodeId,
    TypeSeparator, UnaryOperator, UseKind,
};
use crate::text::TextRange;
use crate::tree::{NodeData, SyntaxTree};

type ParseResult<T> = Result<T, SyntaxError>;

/// Statements and expressions nested deeper than this are rejected
pub const MAX_NESTING: usize = 64;

/// Parse a whole file into a tree rooted at a `File` node
pub fn parse(source: &str) -> Result<SyntaxTree, SyntaxError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
        depth: 0,
        tree: SyntaxTree::new(),
    };
    parser.parse_file()?;
    Ok(parser.tree)
}

#[derive(Debug, Clone, Copy)]
struct Mark {
    start: u32,
    trivia: u32,
}

struct Parser<'s> {
    source: &'s str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    tree: SyntaxTree,
}

impl<'s> Parser<'s> {
    // ---- token helpers -------------------------------------------------

    fn peek(&self) -> Token {
        self.nth(0)
    }

    fn nth(&self, n: usize) -> Token {
        let index = (self.pos + n).min(self.tokens.len() - 1);
        self.tokens[index]
    }

    fn text_of(&self, token: Token) -> &'s str {
        token.text(self.source)
    }

    fn nth_at(&self, n: usize, punct: &str) -> bool {
        let token = self.nth(n);
        token.kind == TokenKind::Punct && self.text_of(token) == punct
    }

    fn at(&self, punct: &str) -> bool {
        self.nth_at(0, punct)
    }

    fn nth_keyword(&self, n: usize, keyword: &str) -> bool {
        let token = self.nth(n);
        token.kind == TokenKind::Name && self.text_of(token).eq_ignore_ascii_case(keyword)
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        self.nth_keyword(0, keyword)
    }

    fn at_kind(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn bump(&mut self) -> Token {
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, punct: &str) -> bool {
        if self.at(punct) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.at_keyword(keyword) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: &str) -> ParseResult<Token> {
        if self.at(punct) {
            Ok(self.bump())
        } else {
            Err(self.expected(&format!("'{}'", punct)))
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> ParseResult<Token> {
        if self.at_keyword(keyword) {
            Ok(self.bump())
        } else {
            Err(self.expected(&format!("'{}'", keyword)))
        }
    }

    /// `;`, or nothing in front of a closing tag
    fn expect_terminator(&mut self) -> ParseResult<()> {
        if self.eat(";") || self.at_kind(TokenKind::CloseTag) {
            Ok(())
        } else {
            Err(self.expected("';'"))
        }
    }

    fn error_here(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(self.source, self.peek().range.start_offset(), message)
    }

    fn unexpected(&self) -> SyntaxError {
        let token = self.peek();
        if token.kind == TokenKind::Eof {
            self.error_here("unexpected end of file")
        } else {
            self.error_here(format!("unexpected '{}'", self.text_of(token)))
        }
    }

    fn expected(&self, what: &str) -> SyntaxError {
        let token = self.peek();
        if token.kind == TokenKind::Eof {
            self.error_here(format!("expected {}, found end of file", what))
        } else {
            self.error_here(format!("expected {}, found '{}'", what, self.text_of(token)))
        }
    }

    fn unsupported(&self, what: &str) -> SyntaxError {
        self.error_here(format!("{} not supported", what))
    }

    /// Run `parse` one nesting level deeper
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_NESTING {
            return Err(self.error_here(format!(
                "nesting deeper than {} levels is not supported",
                MAX_NESTING
            )));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn mark(&self) -> Mark {
        let token = self.peek();
        Mark {
            start: token.range.start,
            trivia: token.trivia_start,
        }
    }

    fn mark_of(&self, id: NodeId) -> Mark {
        let data = self.tree.data(id);
        let start = data.range.map(|r| r.start).unwrap_or(0);
        Mark {
            start,
            trivia: data.trivia_start.unwrap_or(start),
        }
    }

    fn finish(&mut self, mark: Mark, node: Node) -> NodeId {
        let end = match self.pos {
            0 => mark.start,
            pos => self.tokens[pos - 1].range.end.max(mark.start),
        };
        self.tree.push(NodeData::source(
            node,
            TextRange::new(mark.start, end),
            mark.trivia,
        ))
    }

    fn modifier_at(&self, n: usize) -> Option<Modifier> {
        let token = self.nth(n);
        if token.kind != TokenKind::Name {
            return None;
        }
        Modifier::from_keyword(self.text_of(token))
    }

    fn eat_modifiers(&mut self) -> Vec<Modifier> {
        let mut modifiers = Vec::new();
        while let Some(modifier) = self.modifier_at(0) {
            self.bump();
            modifiers.push(modifier);
        }
        modifiers
    }

    // ---- leaf nodes ----------------------------------------------------

    fn identifier(&mut self) -> ParseResult<NodeId> {
        if !self.at_kind(TokenKind::Name) {
            return Err(self.expected("identifier"));
        }
        let mark = self.mark();
        let token = self.bump();
        let name = self.text_of(token).to_string();
        Ok(self.finish(mark, Node::Identifier { name }))
    }

    fn name(&mut self) -> ParseResult<NodeId> {
        if !self.at_kind(TokenKind::Name) {
            return Err(self.expected("name"));
        }
        let mark = self.mark();
        let token = self.bump();
        let name = self.text_of(token).to_string();
        Ok(self.finish(mark, Node::Name { name }))
    }

    fn variable(&mut self) -> ParseResult<NodeId> {
        if !self.at_kind(TokenKind::Variable) {
            return Err(self.expected("variable"));
        }
        let mark = self.mark();
        let token = self.bump();
        let name = self.text_of(token)[1..].to_string();
        Ok(self.finish(mark, Node::Variable { name }))
    }

    fn literal(&mut self, kind: LiteralKind) -> NodeId {
        let mark = self.mark();
        let token = self.bump();
        let raw = self.text_of(token).to_string();
        self.finish(mark, Node::Literal { kind, raw })
    }

    // ---- statements ----------------------------------------------------

    fn parse_file(&mut self) -> ParseResult<()> {
        let mut items = Vec::new();
        while !self.at_kind(TokenKind::Eof) {
            items.push(self.parse_statement()?);
        }
        let len = self.source.len() as u32;
        let root = self
            .tree
            .push(NodeData::source(Node::File { items }, TextRange::new(0, len), 0));
        self.tree.set_root(root);
        Ok(())
    }

    fn parse_statement(&mut self) -> ParseResult<NodeId> {
        self.nested(Self::parse_statement_inner)
    }

    fn parse_statement_inner(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        let token = self.peek();
        let text = self.text_of(token).to_string();

        match token.kind {
            TokenKind::InlineHtml => {
                self.bump();
                return Ok(self.finish(mark, Node::InlineHtml { text }));
            }
            TokenKind::OpenTag | TokenKind::OpenTagEcho => {
                self.bump();
                return Ok(self.finish(mark, Node::OpenTag { text }));
            }
            TokenKind::CloseTag => {
                self.bump();
                return Ok(self.finish(mark, Node::CloseTag { text }));
            }
            TokenKind::Eof => return Err(self.unexpected()),
            TokenKind::Punct if text == "{" => return self.parse_block(),
            TokenKind::Punct if text == ";" => {
                self.bump();
                return Ok(self.finish(mark, Node::Nop));
            }
            _ => {}
        }

        if token.kind == TokenKind::Name {
            let lower = text.to_ascii_lowercase();
            if self.nth_at(1, ":")
                && !text.contains('\\')
                && !matches!(lower.as_str(), "default" | "case" | "else")
            {
                return self.parse_label();
            }
            match lower.as_str() {
                "if" => return self.parse_if(),
                "while" => return self.parse_while(),
                "do" => return self.parse_do_while(),
                "for" => return self.parse_for(),
                "foreach" => return self.parse_foreach(),
                "switch" => return self.parse_switch(),
                "break" => return self.parse_break(true),
                "continue" => return self.parse_break(false),
                "return" => return self.parse_return(),
                "echo" => return self.parse_echo(),
                "try" => return self.parse_try(),
                "declare" => return self.parse_declare(),
                "namespace" => return self.parse_namespace(),
                "use" => return self.parse_use(),
                "const" => return self.parse_const_statement(),
                "class" => return self.parse_class(),
                "abstract" | "final" | "readonly" if self.class_follows() => {
                    return self.parse_class();
                }
                "interface" => return self.parse_interface(),
                "trait" => return self.parse_trait(),
                "function"
                    if self.nth(1).kind == TokenKind::Name
                        || (self.nth_at(1, "&") && self.nth(2).kind == TokenKind::Name) =>
                {
                    return self.parse_function();
                }
                "enum" if self.nth(1).kind == TokenKind::Name => return self.parse_enum(),
                "global" if self.nth(1).kind == TokenKind::Variable => {
                    return self.parse_global();
                }
                "static" if self.nth(1).kind == TokenKind::Variable => {
                    return self.parse_static_var();
                }
                "goto" if self.nth(1).kind == TokenKind::Name => return self.parse_goto(),
                _ => {}
            }
        }

        let expr = self.parse_expr()?;
        self.expect_terminator()?;
        Ok(self.finish(mark, Node::ExpressionStatement { expr }))
    }

    fn class_follows(&self) -> bool {
        let mut n = 0;
        while self.modifier_at(n).is_some() {
            n += 1;
        }
        self.nth_keyword(n, "class")
    }

    fn parse_block(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        self.expect("{")?;
        let mut statements = Vec::new();
        while !self.at("}") {
            if self.at_kind(TokenKind::Eof) {
                return Err(self.expected("'}'"));
            }
            statements.push(self.parse_statement()?);
        }
        self.bump();
        Ok(self.finish(mark, Node::Block { statements }))
    }

    /// Body of a control structure
    fn parse_body(&mut self) -> ParseResult<NodeId> {
        if self.at(":") {
            return Err(self.unsupported("alternative control structure syntax is"));
        }
        self.parse_statement()
    }

    /// `( expr )` of a control structure
    fn parse_condition(&mut self) -> ParseResult<NodeId> {
        self.expect("(")?;
        let condition = self.parse_expr()?;
        self.expect(")")?;
        Ok(condition)
    }

    fn parse_if(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        self.bump();
        let condition = self.parse_condition()?;
        let then = self.parse_body()?;

        let mut else_ifs = Vec::new();
        let mut otherwise = None;
        loop {
            let branch = self.mark();
            if self.eat_keyword("elseif") {
                let condition = self.parse_condition()?;
                let body = self.parse_body()?;
                else_ifs.push(self.finish(branch, Node::ElseIf { condition, body }));
            } else if self.eat_keyword("else") {
                let body = self.parse_body()?;
                otherwise = Some(self.finish(branch, Node::Else { body }));
                break;
            } else {
                break;
            }
        }

        Ok(self.finish(
            mark,
            Node::If {
                condition,
                then,
                else_ifs,
                otherwise,
            },
        ))
    }

    fn parse_while(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        self.bump();
        let condition = self.parse_condition()?;
        let body = self.parse_body()?;
        Ok(self.finish(mark, Node::While { condition, body }))
    }

    fn parse_do_while(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        self.bump();
        let body = self.parse_statement()?;
        self.expect_keyword("while")?;
        let condition = self.parse_condition()?;
        self.expect_terminator()?;
        Ok(self.finish(mark, Node::DoWhile { body, condition }))
    }

    fn parse_expr_list(&mut self, end: &str) -> ParseResult<Vec<NodeId>> {
        let mut exprs = Vec::new();
        if self.at(end) {
            return Ok(exprs);
        }
        loop {
            exprs.push(self.parse_expr()?);
            if !self.eat(",") {
                break;
            }
        }
        Ok(exprs)
    }

    fn parse_for(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        self.bump();
        self.expect("(")?;
        let init = self.parse_expr_list(";")?;
        self.expect(";")?;
        let condition = self.parse_expr_list(";")?;
        self.expect(";")?;
        let step = self.parse_expr_list(")")?;
        self.expect(")")?;
        let body = self.parse_body()?;
        Ok(self.finish(
            mark,
            Node::For {
                init,
                condition,
                step,
                body,
            },
        ))
    }

    fn parse_foreach(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        self.bump();
        self.expect("(")?;
        let subject = self.parse_expr()?;
        self.expect_keyword("as")?;

        let mut by_ref = self.eat("&");
        let mut value = self.parse_expr()?;
        let mut key = None;
        if self.at("=>") {
            if by_ref {
                return Err(self.unexpected());
            }
            self.bump();
            key = Some(value);
            by_ref = self.eat("&");
            value = self.parse_expr()?;
        }
        self.expect(")")?;
        let body = self.parse_body()?;

        Ok(self.finish(
            mark,
            Node::Foreach {
                subject,
                key,
                by_ref,
                value,
                body,
            },
        ))
    }

    fn parse_switch(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        self.bump();
        let subject = self.parse_condition()?;
        if self.at(":") {
            return Err(self.unsupported("alternative control structure syntax is"));
        }
        self.expect("{")?;

        let mut cases = Vec::new();
        while !self.at("}") {
            let case_mark = self.mark();
            let test = if self.eat_keyword("case") {
                Some(self.parse_expr()?)
            } else if self.eat_keyword("default") {
                None
            } else {
                return Err(self.expected("'case' or 'default'"));
            };
            if !self.eat(":") && !self.eat(";") {
                return Err(self.expected("':'"));
            }

            let mut body = Vec::new();
            while !self.at("}") && !self.at_keyword("case") && !self.at_keyword("default") {
                if self.at_kind(TokenKind::Eof) {
                    return Err(self.expected("'}'"));
                }
                body.push(self.parse_statement()?);
            }
            cases.push(self.finish(case_mark, Node::Case { test, body }));
        }
        self.bump();

        Ok(self.finish(mark, Node::Switch { subject, cases }))
    }

    fn parse_break(&mut self, is_break: bool) -> ParseResult<NodeId> {
        let mark = self.mark();
        self.bump();
        let level = if self.at(";") || self.at_kind(TokenKind::CloseTag) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect_terminator()?;
        let node = if is_break {
            Node::Break { level }
        } else {
            Node::Continue { level }
        };
        Ok(self.finish(mark, node))
    }

    fn parse_return(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        self.bump();
        let value = if self.at(";") || self.at_kind(TokenKind::CloseTag) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect_terminator()?;
        Ok(self.finish(mark, Node::Return { value }))
    }

    fn parse_echo(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        self.bump();
        let mut values = vec![self.parse_expr()?];
        while self.eat(",") {
            values.push(self.parse_expr()?);
        }
        self.expect_terminator()?;
        Ok(self.finish(mark, Node::Echo { values }))
    }

    fn parse_static_var(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        self.bump();
        let mut items = Vec::new();
        loop {
            let item = self.mark();
            let var = self.variable()?;
            let default = if self.eat("=") {
                Some(self.parse_expr()?)
            } else {
                None
            };
            items.push(self.finish(item, Node::StaticVarItem { var, default }));
            if !self.eat(",") {
                break;
            }
        }
        self.expect_terminator()?;
        Ok(self.finish(mark, Node::StaticVar { items }))
    }

    fn parse_global(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        self.bump();
        let mut vars = vec![self.variable()?];
        while self.eat(",") {
            vars.push(self.variable()?);
        }
        self.expect_terminator()?;
        Ok(self.finish(mark, Node::Global { vars }))
    }

    fn parse_goto(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        self.bump();
        let label = self.identifier()?;
        self.expect_terminator()?;
        Ok(self.finish(mark, Node::Goto { label }))
    }

    fn parse_label(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        let name = self.identifier()?;
        self.expect(":")?;
        Ok(self.finish(mark, Node::Label { name }))
    }

    fn parse_try(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        self.bump();
        let body = self.parse_block()?;

        let mut catches = Vec::new();
        while self.at_keyword("catch") {
            let catch_mark = self.mark();
            self.bump();
            self.expect("(")?;
            let mut types = vec![self.name()?];
            while self.eat("|") {
                types.push(self.name()?);
            }
            let var = if self.at_kind(TokenKind::Variable) {
                Some(self.variable()?)
            } else {
                None
            };
            self.expect(")")?;
            let body = self.parse_block()?;
            catches.push(self.finish(catch_mark, Node::Catch { types, var, body }));
        }

        let finally = if self.at_keyword("finally") {
            let finally_mark = self.mark();
            self.bump();
            let body = self.parse_block()?;
            Some(self.finish(finally_mark, Node::Finally { body }))
        } else {
            None
        };

        if catches.is_empty() && finally.is_none() {
            return Err(self.expected("'catch' or 'finally'"));
        }

        Ok(self.finish(
            mark,
            Node::Try {
                body,
                catches,
                finally,
            },
        ))
    }

    fn parse_declare(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        self.bump();
        self.expect("(")?;
        let mut directives = Vec::new();
        loop {
            let item = self.mark();
            let name = self.identifier()?;
            self.expect("=")?;
            let value = self.parse_expr()?;
            directives.push(self.finish(item, Node::ConstItem { name, value }));
            if !self.eat(",") {
                break;
            }
        }
        self.expect(")")?;
        if self.at("{") || self.at(":") {
            return Err(self.unsupported("declare blocks are"));
        }
        self.expect_terminator()?;
        Ok(self.finish(mark, Node::Declare { directives }))
    }

    fn parse_namespace(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        self.bump();
        let name = if self.at_kind(TokenKind::Name) {
            Some(self.name()?)
        } else {
            None
        };
        let body = if self.at("{") {
            Some(self.parse_block()?)
        } else {
            self.expect_terminator()?;
            None
        };
        Ok(self.finish(mark, Node::Namespace { name, body }))
    }

    fn parse_use(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        self.bump();
        let kind = if self.at_keyword("function") && self.nth(1).kind == TokenKind::Name {
            self.bump();
            UseKind::Function
        } else if self.at_keyword("const") && self.nth(1).kind == TokenKind::Name {
            self.bump();
            UseKind::Const
        } else {
            UseKind::Class
        };

        let group_prefix = self.at_kind(TokenKind::Name)
            && self.text_of(self.peek()).ends_with('\\')
            && self.nth_at(1, "{");
        if group_prefix {
            let prefix_mark = self.mark();
            let token = self.bump();
            let name = self.text_of(token).trim_end_matches('\\').to_string();
            let prefix = self.finish(prefix_mark, Node::Name { name });
            self.bump();

            let mut items = Vec::new();
            while !self.at("}") {
                let kind_follows = self.nth(1).kind == TokenKind::Name;
                if (self.at_keyword("function") || self.at_keyword("const")) && kind_follows {
                    return Err(self.unsupported("mixed group use declarations are"));
                }
                items.push(self.parse_use_item()?);
                if !self.eat(",") {
                    break;
                }
            }
            self.expect("}")?;
            self.expect_terminator()?;
            return Ok(self.finish(
                mark,
                Node::Use {
                    kind,
                    prefix: Some(prefix),
                    items,
                },
            ));
        }

        let mut items = vec![self.parse_use_item()?];
        while self.eat(",") {
            items.push(self.parse_use_item()?);
        }
        self.expect_terminator()?;
        Ok(self.finish(
            mark,
            Node::Use {
                kind,
                prefix: None,
                items,
            },
        ))
    }

    fn parse_use_item(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        let name = self.name()?;
        let alias = if self.eat_keyword("as") {
            Some(self.identifier()?)
        } else {
            None
        };
        Ok(self.finish(mark, Node::UseItem { name, alias }))
    }

    fn parse_const_items(&mut self) -> ParseResult<Vec<NodeId>> {
        let mut items = Vec::new();
        loop {
            let item = self.mark();
            let name = self.identifier()?;
            self.expect("=")?;
            let value = self.parse_expr()?;
            items.push(self.finish(item, Node::ConstItem { name, value }));
            if !self.eat(",") {
                break;
            }
        }
        Ok(items)
    }

    fn parse_const_statement(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        self.bump();
        let items = self.parse_const_items()?;
        self.expect_terminator()?;
        Ok(self.finish(
            mark,
            Node::ClassConstDecl {
                modifiers: Vec::new(),
                items,
            },
        ))
    }

    fn parse_name_list(&mut self) -> ParseResult<Vec<NodeId>> {
        let mut names = vec![self.name()?];
        while self.eat(",") {
            names.push(self.name()?);
        }
        Ok(names)
    }

    fn parse_class(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        let modifiers = self.eat_modifiers();
        self.expect_keyword("class")?;
        let name = self.identifier()?;
        let extends = if self.eat_keyword("extends") {
            Some(self.name()?)
        } else {
            None
        };
        let implements = if self.eat_keyword("implements") {
            self.parse_name_list()?
        } else {
            Vec::new()
        };
        let members = self.parse_members()?;
        Ok(self.finish(
            mark,
            Node::ClassDecl {
                modifiers,
                name,
                extends,
                implements,
                members,
            },
        ))
    }

    fn parse_interface(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        self.bump();
        let name = self.identifier()?;
        let extends = if self.eat_keyword("extends") {
            self.parse_name_list()?
        } else {
            Vec::new()
        };
        let members = self.parse_members()?;
        Ok(self.finish(
            mark,
            Node::InterfaceDecl {
                name,
                extends,
                members,
            },
        ))
    }

    fn parse_trait(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        self.bump();
        let name = self.identifier()?;
        let members = self.parse_members()?;
        Ok(self.finish(mark, Node::TraitDecl { name, members }))
    }

    fn parse_enum(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        self.bump();
        let name = self.identifier()?;
        let backing_type = if self.eat(":") {
            Some(self.parse_type()?)
        } else {
            None
        };
        let implements = if self.eat_keyword("implements") {
            self.parse_name_list()?
        } else {
            Vec::new()
        };
        let members = self.parse_members()?;
        Ok(self.finish(
            mark,
            Node::EnumDecl {
                name,
                backing_type,
                implements,
                members,
            },
        ))
    }

    fn parse_members(&mut self) -> ParseResult<Vec<NodeId>> {
        self.expect("{")?;
        let mut members = Vec::new();
        while !self.at("}") {
            if self.at_kind(TokenKind::Eof) {
                return Err(self.expected("'}'"));
            }
            members.push(self.parse_member()?);
        }
        self.bump();
        Ok(members)
    }

    fn parse_member(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();

        if self.eat_keyword("case") {
            let name = self.identifier()?;
            let value = if self.eat("=") {
                Some(self.parse_expr()?)
            } else {
                None
            };
            self.expect_terminator()?;
            return Ok(self.finish(mark, Node::EnumCase { name, value }));
        }

        if self.eat_keyword("use") {
            let traits = self.parse_name_list()?;
            if self.at("{") {
                return Err(self.unsupported("trait adaptations are"));
            }
            self.expect_terminator()?;
            return Ok(self.finish(mark, Node::TraitUse { traits }));
        }

        let modifiers = self.eat_modifiers();

        if self.eat_keyword("const") {
            let items = self.parse_const_items()?;
            self.expect_terminator()?;
            return Ok(self.finish(mark, Node::ClassConstDecl { modifiers, items }));
        }

        if self.eat_keyword("function") {
            let by_ref = self.eat("&");
            let name = self.identifier()?;
            let params = self.parse_params()?;
            let return_type = self.parse_return_type()?;
            let body = if self.at("{") {
                Some(self.parse_block()?)
            } else {
                self.expect_terminator()?;
                None
            };
            return Ok(self.finish(
                mark,
                Node::MethodDecl {
                    modifiers,
                    by_ref,
                    name,
                    params,
                    return_type,
                    body,
                },
            ));
        }

        if modifiers.is_empty() {
            return Err(self.expected("class member"));
        }

        let type_hint = if self.at_kind(TokenKind::Variable) {
            None
        } else {
            Some(self.parse_type()?)
        };
        let mut items = Vec::new();
        loop {
            let item = self.mark();
            let var = self.variable()?;
            let default = if self.eat("=") {
                Some(self.parse_expr()?)
            } else {
                None
            };
            items.push(self.finish(item, Node::PropertyItem { var, default }));
            if !self.eat(",") {
                break;
            }
        }
        if self.at("{") {
            return Err(self.unsupported("property hooks are"));
        }
        self.expect_terminator()?;
        Ok(self.finish(
            mark,
            Node::PropertyDecl {
                modifiers,
                type_hint,
                items,
            },
        ))
    }

    fn parse_function(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        self.bump();
        let by_ref = self.eat("&");
        let name = self.identifier()?;
        let params = self.parse_params()?;
        let return_type = self.parse_return_type()?;
        let body = self.parse_block()?;
        Ok(self.finish(
            mark,
            Node::FunctionDecl {
                by_ref,
                name,
                params,
                return_type,
                body,
            },
        ))
    }

    fn parse_params(&mut self) -> ParseResult<Vec<NodeId>> {
        self.expect("(")?;
        let mut params = Vec::new();
        while !self.at(")") {
            params.push(self.parse_param()?);
            if !self.eat(",") {
                break;
            }
        }
        self.expect(")")?;
        Ok(params)
    }

    fn parse_param(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        let modifiers = self.eat_modifiers();
        let type_hint =
            if self.at_kind(TokenKind::Variable) || self.at("&") || self.at("...") {
                None
            } else {
                Some(self.parse_type()?)
            };
        let by_ref = self.eat("&");
        let variadic = self.eat("...");
        let var = self.variable()?;
        let default = if self.eat("=") {
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(self.finish(
            mark,
            Node::Parameter {
                modifiers,
                type_hint,
                by_ref,
                variadic,
                var,
                default,
            },
        ))
    }

    fn parse_return_type(&mut self) -> ParseResult<Option<NodeId>> {
        if self.eat(":") {
            Ok(Some(self.parse_type()?))
        } else {
            Ok(None)
        }
    }

    fn parse_type(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        if self.at("(") {
            return Err(self.unsupported("DNF types are"));
        }
        let nullable = self.eat("?");
        let mut parts = vec![self.name()?];
        let mut separator = TypeSeparator::Union;
        if self.at("|") {
            while self.eat("|") {
                parts.push(self.name()?);
            }
        } else {
            // `A&B $x` is an intersection, `A &$x` a by-reference parameter
            while self.at("&") && self.nth(1).kind == TokenKind::Name {
                separator = TypeSeparator::Intersection;
                self.bump();
                parts.push(self.name()?);
            }
        }
        Ok(self.finish(
            mark,
            Node::Type {
                nullable,
                parts,
                separator,
            },
        ))
    }

    // ---- expressions ---------------------------------------------------

    fn parse_expr(&mut self) -> ParseResult<NodeId> {
        self.parse_expr_bp(0)
    }

    fn binary_operator(&self, token: Token) -> Option<BinaryOperator> {
        let text = self.text_of(token);
        let op = match token.kind {
            TokenKind::Punct => match text {
                "||" => BinaryOperator::BooleanOr,
                "&&" => BinaryOperator::BooleanAnd,
                "??" => BinaryOperator::Coalesce,
                "|" => BinaryOperator::BitOr,
                "^" => BinaryOperator::BitXor,
                "&" => BinaryOperator::BitAnd,
                "==" => BinaryOperator::Equal,
                "!=" | "<>" => BinaryOperator::NotEqual,
                "===" => BinaryOperator::Identical,
                "!==" => BinaryOperator::NotIdentical,
                "<=>" => BinaryOperator::Spaceship,
                "<" => BinaryOperator::Less,
                "<=" => BinaryOperator::LessOrEqual,
                ">" => BinaryOperator::Greater,
                ">=" => BinaryOperator::GreaterOrEqual,
                "." => BinaryOperator::Concat,
                "<<" => BinaryOperator::ShiftLeft,
                ">>" => BinaryOperator::ShiftRight,
                "+" => BinaryOperator::Add,
                "-" => BinaryOperator::Sub,
                "*" => BinaryOperator::Mul,
                "/" => BinaryOperator::Div,
                "%" => BinaryOperator::Mod,
                "**" => BinaryOperator::Pow,
                _ => return None,
            },
            TokenKind::Name => match text.to_ascii_lowercase().as_str() {
                "or" => BinaryOperator::LogicalOr,
                "xor" => BinaryOperator::LogicalXor,
                "and" => BinaryOperator::LogicalAnd,
                "instanceof" => BinaryOperator::Instanceof,
                _ => return None,
            },
            _ => return None,
        };
        Some(op)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> ParseResult<NodeId> {
        self.nested(|parser| parser.parse_binary(min_bp))
    }

    fn parse_binary(&mut self, min_bp: u8) -> ParseResult<NodeId> {
        let mut left = self.parse_unary()?;

        loop {
            if self.at("?") {
                if precedence::TERNARY < min_bp {
                    break;
                }
                self.bump();
                let then = if self.at(":") {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect(":")?;
                let otherwise = self.parse_expr_bp(precedence::TERNARY + 1)?;
                let mark = self.mark_of(left);
                left = self.finish(
                    mark,
                    Node::Ternary {
                        condition: left,
                        then,
                        otherwise,
                    },
                );
                continue;
            }

            let Some(op) = self.binary_operator(self.peek()) else {
                break;
            };
            let bp = op.precedence();
            if bp < min_bp {
                break;
            }
            self.bump();

            let right = if op == BinaryOperator::Instanceof && self.at_kind(TokenKind::Name) {
                self.name()?
            } else if op.is_right_associative() {
                self.parse_expr_bp(bp)?
            } else {
                self.parse_expr_bp(bp + 1)?
            };
            let mark = self.mark_of(left);
            left = self.finish(mark, Node::BinaryOp { op, left, right });
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        let token = self.peek();
        let text = self.text_of(token);

        let prefix = match token.kind {
            TokenKind::Punct => match text {
                "!" => Some(UnaryOperator::Not),
                "-" => Some(UnaryOperator::Negate),
                "+" => Some(UnaryOperator::Plus),
                "~" => Some(UnaryOperator::BitNot),
                "@" => Some(UnaryOperator::Silence),
                "++" => Some(UnaryOperator::PreIncrement),
                "--" => Some(UnaryOperator::PreDecrement),
                _ => None,
            },
            TokenKind::Name => match text.to_ascii_lowercase().as_str() {
                "clone" => Some(UnaryOperator::Clone),
                "print" => Some(UnaryOperator::Print),
                "throw" => Some(UnaryOperator::Throw),
                "include" => Some(UnaryOperator::Include),
                "include_once" => Some(UnaryOperator::IncludeOnce),
                "require" => Some(UnaryOperator::Require),
                "require_once" => Some(UnaryOperator::RequireOnce),
                "yield" => return self.parse_yield(),
                _ => None,
            },
            TokenKind::Cast => {
                self.bump();
                let cast = normalize_cast(text);
                let expr = self.parse_expr_bp(precedence::UNARY)?;
                return Ok(self.finish(mark, Node::Cast { cast, expr }));
            }
            _ => None,
        };

        if let Some(op) = prefix {
            self.bump();
            let operand = self.parse_expr_bp(op.operand_precedence())?;
            return Ok(self.finish(mark, Node::UnaryOp { op, operand }));
        }

        self.parse_postfix()
    }

    /// `yield`, `yield $v`, `yield $k => $v` or `yield from $e`
    fn parse_yield(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        self.bump();
        if self.eat_keyword("from") {
            let expr = self.parse_expr_bp(precedence::ASSIGN)?;
            return Ok(self.finish(mark, Node::YieldFrom { expr }));
        }

        let bare = [";", ")", ",", "]", "}"].iter().any(|punct| self.at(punct))
            || self.at_kind(TokenKind::CloseTag)
            || self.at_kind(TokenKind::Eof);
        if bare {
            return Ok(self.finish(mark, Node::Yield { key: None, value: None }));
        }

        let first = self.parse_expr_bp(precedence::ASSIGN)?;
        let (key, value) = if self.eat("=>") {
            (Some(first), self.parse_expr_bp(precedence::ASSIGN)?)
        } else {
            (None, first)
        };
        Ok(self.finish(
            mark,
            Node::Yield {
                key,
                value: Some(value),
            },
        ))
    }

    fn parse_postfix(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        let mut expr = self.parse_primary()?;

        if matches!(self.tree.node(expr), Node::Name { .. }) && !self.at("(") && !self.at("::")
        {
            expr = self.finish(mark, Node::ConstFetch { name: expr });
        }

        loop {
            if self.at("->") || self.at("?->") {
                let arrow = self.bump();
                let nullsafe = self.text_of(arrow) == "?->";
                let name = match self.peek().kind {
                    TokenKind::Name => self.identifier()?,
                    TokenKind::Variable => self.variable()?,
                    _ => return Err(self.expected("property or method name")),
                };
                expr = if self.at("(") {
                    let args = self.parse_args()?;
                    self.finish(
                        mark,
                        Node::MethodCall {
                            object: expr,
                            name,
                            args,
                            nullsafe,
                        },
                    )
                } else {
                    self.finish(
                        mark,
                        Node::PropertyFetch {
                            object: expr,
                            name,
                            nullsafe,
                        },
                    )
                };
            } else if self.eat("::") {
                expr = match self.peek().kind {
                    TokenKind::Variable => {
                        let name = self.variable()?;
                        self.finish(mark, Node::StaticPropertyFetch { class: expr, name })
                    }
                    TokenKind::Name => {
                        let name = self.identifier()?;
                        if self.at("(") {
                            let args = self.parse_args()?;
                            self.finish(
                                mark,
                                Node::StaticCall {
                                    class: expr,
                                    name,
                                    args,
                                },
                            )
                        } else {
                            self.finish(mark, Node::ClassConstFetch { class: expr, name })
                        }
                    }
                    _ => return Err(self.expected("member name")),
                };
            } else if self.eat("[") {
                let index = if self.at("]") {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect("]")?;
                expr = self.finish(mark, Node::Index { array: expr, index });
            } else if self.at("(") {
                let args = self.parse_args()?;
                expr = self.finish(mark, Node::Call { callee: expr, args });
            } else if self.at("++") || self.at("--") {
                let op = if self.at("++") {
                    UnaryOperator::PostIncrement
                } else {
                    UnaryOperator::PostDecrement
                };
                self.bump();
                expr = self.finish(mark, Node::UnaryOp { op, operand: expr });
                break;
            } else {
                break;
            }
        }

        if let Some(op) = self.assign_operator() {
            if is_assignable(self.tree.node(expr)) {
                self.bump();
                let by_ref = op == AssignOperator::Assign && self.eat("&");
                let value = self.parse_expr_bp(precedence::ASSIGN)?;
                expr = self.finish(
                    mark,
                    Node::Assign {
                        op,
                        by_ref,
                        target: expr,
                        value,
                    },
                );
            }
        }

        Ok(expr)
    }

    fn assign_operator(&self) -> Option<AssignOperator> {
        let token = self.peek();
        if token.kind != TokenKind::Punct {
            return None;
        }
        let op = match self.text_of(token) {
            "=" => AssignOperator::Assign,
            "+=" => AssignOperator::Add,
            "-=" => AssignOperator::Sub,
            "*=" => AssignOperator::Mul,
            "/=" => AssignOperator::Div,
            "%=" => AssignOperator::Mod,
            "**=" => AssignOperator::Pow,
            ".=" => AssignOperator::Concat,
            "&=" => AssignOperator::BitAnd,
            "|=" => AssignOperator::BitOr,
            "^=" => AssignOperator::BitXor,
            "<<=" => AssignOperator::ShiftLeft,
            ">>=" => AssignOperator::ShiftRight,
            "??=" => AssignOperator::Coalesce,
            _ => return None,
        };
        Some(op)
    }

    fn parse_primary(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        let token = self.peek();
        let text = self.text_of(token);

        match token.kind {
            TokenKind::Variable => self.variable(),
            TokenKind::Integer => Ok(self.literal(LiteralKind::Integer)),
            TokenKind::Float => Ok(self.literal(LiteralKind::Float)),
            TokenKind::String => Ok(self.literal(LiteralKind::String)),
            TokenKind::Heredoc => Ok(self.literal(LiteralKind::Heredoc)),
            TokenKind::Punct if text == "(" => {
                self.bump();
                let expr = self.parse_expr()?;
                self.expect(")")?;
                Ok(self.finish(mark, Node::Parenthesized { expr }))
            }
            TokenKind::Punct if text == "[" => self.parse_array(true),
            TokenKind::Punct if text == "$" => {
                self.bump();
                if self.eat("{") {
                    let expr = self.parse_expr()?;
                    self.expect("}")?;
                    return Ok(self.finish(mark, Node::IndirectVariable { expr, braced: true }));
                }
                let expr = if self.at("$") {
                    self.nested(Self::parse_primary)?
                } else {
                    self.variable()?
                };
                Ok(self.finish(mark, Node::IndirectVariable { expr, braced: false }))
            }
            TokenKind::Name => {
                let call_like = self.nth_at(1, "(");
                match text.to_ascii_lowercase().as_str() {
                    "true" | "false" | "null" if !call_like && !self.nth_at(1, "::") => {
                        let kind = match text.to_ascii_lowercase().as_str() {
                            "true" => LiteralKind::True,
                            "false" => LiteralKind::False,
                            _ => LiteralKind::Null,
                        };
                        Ok(self.literal(kind))
                    }
                    "array" if call_like => self.parse_array(false),
                    "isset" if call_like => {
                        self.bump();
                        self.expect("(")?;
                        let mut vars = Vec::new();
                        while !self.at(")") {
                            vars.push(self.parse_expr()?);
                            if !self.eat(",") {
                                break;
                            }
                        }
                        self.expect(")")?;
                        Ok(self.finish(mark, Node::Isset { vars }))
                    }
                    "empty" if call_like => {
                        self.bump();
                        let expr = self.parse_condition()?;
                        Ok(self.finish(mark, Node::Empty { expr }))
                    }
                    "new" => self.parse_new(),
                    "function" | "fn" => self.parse_closure(mark, false),
                    "static" if self.nth_keyword(1, "function") || self.nth_keyword(1, "fn") => {
                        self.bump();
                        self.parse_closure(mark, true)
                    }
                    "match" if call_like => self.parse_match(),
                    _ => self.name(),
                }
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_array(&mut self, short: bool) -> ParseResult<NodeId> {
        let mark = self.mark();
        let close = if short {
            self.expect("[")?;
            "]"
        } else {
            self.bump();
            self.expect("(")?;
            ")"
        };

        let mut items = Vec::new();
        while !self.at(close) {
            if self.at(",") {
                return Err(self.unsupported("empty array elements are"));
            }
            items.push(self.parse_array_item()?);
            if !self.eat(",") {
                break;
            }
        }
        self.expect(close)?;
        Ok(self.finish(mark, Node::Array { items, short }))
    }

    fn parse_array_item(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        if self.eat("...") {
            let value = self.parse_expr()?;
            return Ok(self.finish(
                mark,
                Node::ArrayItem {
                    key: None,
                    value,
                    by_ref: false,
                    spread: true,
                },
            ));
        }

        let mut by_ref = self.eat("&");
        let mut key = None;
        let mut value = self.parse_expr()?;
        if !by_ref && self.eat("=>") {
            key = Some(value);
            by_ref = self.eat("&");
            value = self.parse_expr()?;
        }
        Ok(self.finish(
            mark,
            Node::ArrayItem {
                key,
                value,
                by_ref,
                spread: false,
            },
        ))
    }

    fn parse_args(&mut self) -> ParseResult<Vec<NodeId>> {
        self.expect("(")?;
        let mut args = Vec::new();
        while !self.at(")") {
            let mark = self.mark();
            if self.at("...") && self.nth_at(1, ")") {
                self.bump();
                args.push(self.finish(mark, Node::CallablePlaceholder));
                break;
            }
            let spread = self.eat("...");
            let name = if !spread && self.at_kind(TokenKind::Name) && self.nth_at(1, ":") {
                let name = self.identifier()?;
                self.bump();
                Some(name)
            } else {
                None
            };
            let value = self.parse_expr()?;
            args.push(self.finish(
                mark,
                Node::Argument {
                    name,
                    value,
                    spread,
                },
            ));
            if !self.eat(",") {
                break;
            }
        }
        self.expect(")")?;
        Ok(args)
    }

    fn parse_new(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        self.bump();
        if self.at_keyword("class") || (self.at_keyword("readonly") && self.nth_keyword(1, "class")) {
            return self.parse_anonymous_class(mark);
        }
        let class = match self.peek().kind {
            TokenKind::Name => self.name()?,
            TokenKind::Variable => self.variable()?,
            TokenKind::Punct if self.at("(") => {
                let inner = self.mark();
                self.bump();
                let expr = self.parse_expr()?;
                self.expect(")")?;
                self.finish(inner, Node::Parenthesized { expr })
            }
            _ => return Err(self.expected("class name")),
        };
        let args = if self.at("(") {
            self.parse_args()?
        } else {
            Vec::new()
        };
        Ok(self.finish(mark, Node::New { class, args }))
    }

    /// The rest of `new class(...) extends A implements B { ... }`
    fn parse_anonymous_class(&mut self, mark: Mark) -> ParseResult<NodeId> {
        let modifiers = self.eat_modifiers();
        self.expect_keyword("class")?;
        let args = if self.at("(") {
            self.parse_args()?
        } else {
            Vec::new()
        };
        let extends = if self.eat_keyword("extends") {
            Some(self.name()?)
        } else {
            None
        };
        let implements = if self.eat_keyword("implements") {
            self.parse_name_list()?
        } else {
            Vec::new()
        };
        let members = self.parse_members()?;
        Ok(self.finish(
            mark,
            Node::AnonymousClass {
                modifiers,
                args,
                extends,
                implements,
                members,
            },
        ))
    }

    fn parse_closure(&mut self, mark: Mark, is_static: bool) -> ParseResult<NodeId> {
        if self.eat_keyword("fn") {
            let by_ref = self.eat("&");
            let params = self.parse_params()?;
            let return_type = self.parse_return_type()?;
            self.expect("=>")?;
            let body = self.parse_expr()?;
            return Ok(self.finish(
                mark,
                Node::ArrowFunction {
                    is_static,
                    by_ref,
                    params,
                    return_type,
                    body,
                },
            ));
        }

        self.expect_keyword("function")?;
        let by_ref = self.eat("&");
        let params = self.parse_params()?;
        let mut uses = Vec::new();
        if self.eat_keyword("use") {
            self.expect("(")?;
            while !self.at(")") {
                let use_mark = self.mark();
                let by_ref = self.eat("&");
                let var = self.variable()?;
                uses.push(self.finish(use_mark, Node::ClosureUse { by_ref, var }));
                if !self.eat(",") {
                    break;
                }
            }
            self.expect(")")?;
        }
        let return_type = self.parse_return_type()?;
        let body = self.parse_block()?;
        Ok(self.finish(
            mark,
            Node::Closure {
                is_static,
                by_ref,
                params,
                uses,
                return_type,
                body,
            },
        ))
    }

    fn parse_match(&mut self) -> ParseResult<NodeId> {
        let mark = self.mark();
        self.bump();
        let subject = self.parse_condition()?;
        self.expect("{")?;

        let mut arms = Vec::new();
        while !self.at("}") {
            let arm = self.mark();
            let mut conditions = Vec::new();
            if self.at_keyword("default") && (self.nth_at(1, "=>") || self.nth_at(1, ",")) {
                self.bump();
                self.eat(",");
            } else {
                loop {
                    conditions.push(self.parse_expr()?);
                    if !self.eat(",") || self.at("=>") {
                        break;
                    }
                }
            }
            self.expect("=>")?;
            let body = self.parse_expr()?;
            arms.push(self.finish(arm, Node::MatchArm { conditions, body }));
            if !self.eat(",") {
                break;
            }
        }
        self.expect("}")?;
        Ok(self.finish(mark, Node::Match { subject, arms }))
    }
}

fn is_assignable(node: &Node) -> bool {
    matches!(
        node,
        Node::Variable { .. }
            | Node::IndirectVariable { .. }
            | Node::PropertyFetch { .. }
            | Node::StaticPropertyFetch { .. }
            | Node::Index { .. }
            | Node::Array { .. }
            | Node::Call { .. }
    )
}

/// `( INTEGER )` -> `int`
fn normalize_cast(text: &str) -> String {
    let inner = text
        .trim_start_matches('(')
        .trim_end_matches(')')
        .trim()
        .to_ascii_lowercase();
    match inner.as_str() {
        "integer" => "int".to_string(),
        "boolean" => "bool".to_string(),
        "double" | "real" => "float".to_string(),
        "binary" => "string".to_string(),
        _ => inner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;

    fn kinds(source: &str) -> Vec<NodeKind> {
        let tree = parse(source).unwrap();
        tree.descendants(tree.root())
            .into_iter()
            .map(|id| tree.kind(id))
            .collect()
    }

    fn first(tree: &SyntaxTree, kind: NodeKind) -> NodeId {
        tree.descendants(tree.root())
            .into_iter()
            .find(|id| tree.kind(*id) == kind)
            .unwrap()
    }

    #[test]
    fn test_method_call_statement() {
        let source = "<?php\n$response->setStatusCode(200);\n";
        let tree = parse(source).unwrap();
        let call = first(&tree, NodeKind::MethodCall);
        assert_eq!(tree.text(call, source), Some("$response->setStatusCode(200)"));

        let statement = tree.parent(call).unwrap();
        assert_eq!(tree.text(statement, source), Some("$response->setStatusCode(200);"));
        assert_eq!(tree.data(statement).trivia_start, Some(5));
    }

    #[test]
    fn test_precedence() {
        let source = "<?php $a = 1 + 2 * 3 === $b || !$c instanceof Foo;";
        let tree = parse(source).unwrap();
        let assign = first(&tree, NodeKind::Assign);
        let Node::Assign { value, .. } = tree.node(assign) else {
            panic!("expected assignment");
        };
        let Node::BinaryOp { op, left, right } = tree.node(*value) else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOperator::BooleanOr);
        assert_eq!(tree.text(*left, source), Some("1 + 2 * 3 === $b"));
        assert!(matches!(
            tree.node(*right),
            Node::UnaryOp { op: UnaryOperator::Not, .. }
        ));
    }

    #[test]
    fn test_class_declaration() {
        let source = r#"<?php
namespace App\Controller;

use Symfony\Component\HttpFoundation\Response;

final class HomeController extends AbstractController implements Foo, Bar
{
    private const LIMIT = 10;
    private ?Response $last = null;

    public function __construct(private readonly Logger $logger) {}

    abstract protected function build(): void;

    public function index(int $page = 1): Response
    {
        return new Response('hi', 200);
    }
}
"#;
        let tree = parse(source).unwrap();
        let class = first(&tree, NodeKind::ClassDecl);
        let Node::ClassDecl {
            modifiers,
            implements,
            members,
            ..
        } = tree.node(class)
        else {
            panic!("expected class");
        };
        assert_eq!(modifiers, &vec![Modifier::Final]);
        assert_eq!(implements.len(), 2);
        let member_kinds: Vec<NodeKind> = members.iter().map(|m| tree.kind(*m)).collect();
        assert_eq!(
            member_kinds,
            vec![
                NodeKind::ClassConstDecl,
                NodeKind::PropertyDecl,
                NodeKind::MethodDecl,
                NodeKind::MethodDecl,
                NodeKind::MethodDecl,
            ]
        );
    }

    #[test]
    fn test_control_flow() {
        let kinds = kinds(
            "<?php
if ($a) { echo 1; } elseif ($b) { echo 2; } else { echo 3; }
foreach ($items as $key => &$item) { continue; }
for ($i = 0; $i < 10; $i++) { break; }
while (true) {}
do { $x--; } while ($x > 0);
switch ($x) { case 1: echo 1; break; default: echo 2; }
try { f(); } catch (A | B $e) { } finally { }
",
        );
        for kind in [
            NodeKind::If,
            NodeKind::ElseIf,
            NodeKind::Else,
            NodeKind::Foreach,
            NodeKind::For,
            NodeKind::While,
            NodeKind::DoWhile,
            NodeKind::Switch,
            NodeKind::Case,
            NodeKind::Try,
            NodeKind::Catch,
            NodeKind::Finally,
        ] {
            assert!(kinds.contains(&kind), "missing {:?}", kind);
        }
    }

    #[test]
    fn test_expressions() {
        let kinds = kinds(
            "<?php
$f = static fn(int $x): int => $x * 2;
$g = function ($a) use (&$b) { return $a; };
$r = match ($code) { 200, 201 => 'ok', default => 'ko' };
$v = $a?->b ?? Foo::BAR ?: Foo::$baz;
$list = [1, 'a' => 2, ...$rest];
$old = array(1, 2);
$n = new Response(status: 404);
$c = (int) $value;
throw new \\RuntimeException('x');
",
        );
        for kind in [
            NodeKind::ArrowFunction,
            NodeKind::Closure,
            NodeKind::ClosureUse,
            NodeKind::Match,
            NodeKind::MatchArm,
            NodeKind::PropertyFetch,
            NodeKind::ClassConstFetch,
            NodeKind::StaticPropertyFetch,
            NodeKind::Ternary,
            NodeKind::Array,
            NodeKind::ArrayItem,
            NodeKind::New,
            NodeKind::Argument,
            NodeKind::Cast,
            NodeKind::UnaryOp,
        ] {
            assert!(kinds.contains(&kind), "missing {:?}", kind);
        }
    }

    #[test]
    fn test_named_argument() {
        let source = "<?php new JsonResponse($data, status: 201);";
        let tree = parse(source).unwrap();
        let new = first(&tree, NodeKind::New);
        let Node::New { args, .. } = tree.node(new) else {
            panic!("expected new");
        };
        let Node::Argument { name: Some(name), .. } = tree.node(args[1]) else {
            panic!("expected named argument");
        };
        assert_eq!(tree.node(*name), &Node::Identifier { name: "status".to_string() });
    }

    #[test]
    fn test_literals() {
        let source = "<?php f(TRUE, null, 1.5, <<<EOT\nx\nEOT);";
        let tree = parse(source).unwrap();
        let literal_kinds: Vec<LiteralKind> = tree
            .descendants(tree.root())
            .into_iter()
            .filter_map(|id| match tree.node(id) {
                Node::Literal { kind, .. } => Some(*kind),
                _ => None,
            })
            .collect();
        assert_eq!(
            literal_kinds,
            vec![
                LiteralKind::True,
                LiteralKind::Null,
                LiteralKind::Float,
                LiteralKind::Heredoc
            ]
        );
    }

    #[test]
    fn test_file_range_covers_everything() {
        let source = "<?php\n\nfoo();\n// trailing\n";
        let tree = parse(source).unwrap();
        assert_eq!(
            tree.range(tree.root()),
            Some(TextRange::new(0, source.len() as u32))
        );
    }

    #[test]
    fn test_inline_html() {
        let kinds = kinds("<p><?php echo $x ?></p>");
        assert_eq!(
            kinds,
            vec![
                NodeKind::InlineHtml,
                NodeKind::OpenTag,
                NodeKind::Echo,
                NodeKind::Variable,
                NodeKind::CloseTag,
                NodeKind::InlineHtml,
            ]
        );
    }

    #[test]
    fn test_unsupported_syntax() {
        for source in [
            "<?php if ($a): endif;",
            "<?php class A { use T { foo as bar; } }",
            "<?php use A\\{B, function c};",
        ] {
            assert!(parse(source).is_err(), "should reject {:?}", source);
        }
    }

    #[test]
    fn test_yield_forms() {
        let source = "<?php\nfunction g() {\n    $sent = yield;\n    yield 1;\n    yield ['/'];\n    yield $k => $v;\n    yield from inner();\n}\n";
        let tree = parse(source).unwrap();
        let yields: Vec<NodeId> = tree
            .descendants(tree.root())
            .into_iter()
            .filter(|id| tree.kind(*id) == NodeKind::Yield)
            .collect();
        let texts: Vec<&str> = yields.iter().map(|id| tree.text(*id, source).unwrap()).collect();
        assert_eq!(texts, vec!["yield", "yield 1", "yield ['/']", "yield $k => $v"]);

        let Node::Yield { key: None, value: Some(array) } = tree.node(yields[2]) else {
            panic!("expected a keyless yield");
        };
        assert_eq!(tree.kind(*array), NodeKind::Array);
        let Node::Yield { key: Some(key), .. } = tree.node(yields[3]) else {
            panic!("expected a keyed yield");
        };
        assert_eq!(tree.text(*key, source), Some("$k"));

        let from = first(&tree, NodeKind::YieldFrom);
        assert_eq!(tree.text(from, source), Some("yield from inner()"));
    }

    #[test]
    fn test_group_use() {
        let source = "<?php use App\\Entity\\{User, Post as Article,};";
        let tree = parse(source).unwrap();
        let statement = first(&tree, NodeKind::Use);
        let Node::Use {
            kind: UseKind::Class,
            prefix: Some(prefix),
            items,
        } = tree.node(statement)
        else {
            panic!("expected a group use");
        };
        assert_eq!(tree.node(*prefix), &Node::Name { name: "App\\Entity".to_string() });
        assert_eq!(items.len(), 2);
        assert_eq!(tree.text(items[1], source), Some("Post as Article"));
        assert_eq!(tree.text(statement, source), Some(&source[6..]));
    }

    #[test]
    fn test_enum_declaration() {
        let source = "<?php\nenum Suit: string implements HasLabel\n{\n    case Hearts = 'H';\n    case Spades = 'S';\n\n    public function label(): string\n    {\n        return $this->name;\n    }\n}\nenum Flag { case On; }\n";
        let tree = parse(source).unwrap();
        let decl = first(&tree, NodeKind::EnumDecl);
        let Node::EnumDecl {
            backing_type: Some(backing_type),
            implements,
            members,
            ..
        } = tree.node(decl)
        else {
            panic!("expected a backed enum");
        };
        assert_eq!(tree.text(*backing_type, source), Some("string"));
        assert_eq!(implements.len(), 1);
        let member_kinds: Vec<NodeKind> = members.iter().map(|m| tree.kind(*m)).collect();
        assert_eq!(
            member_kinds,
            vec![NodeKind::EnumCase, NodeKind::EnumCase, NodeKind::MethodDecl]
        );
        let cases: Vec<&str> = tree
            .descendants(tree.root())
            .into_iter()
            .filter(|id| tree.kind(*id) == NodeKind::EnumCase)
            .map(|id| tree.text(id, source).unwrap())
            .collect();
        assert_eq!(cases, vec!["case Hearts = 'H';", "case Spades = 'S';", "case On;"]);
    }

    #[test]
    fn test_anonymous_class() {
        let source = "<?php $o = new class($a, 2) extends Base implements Countable {\n    public function count(): int { return 0; }\n};\n$p = new readonly class {};";
        let tree = parse(source).unwrap();
        let class = first(&tree, NodeKind::AnonymousClass);
        let Node::AnonymousClass {
            args,
            extends: Some(_),
            implements,
            members,
            ..
        } = tree.node(class)
        else {
            panic!("expected an anonymous class");
        };
        assert_eq!((args.len(), implements.len(), members.len()), (2, 1, 1));
        assert!(tree
            .text(class, source)
            .is_some_and(|text| text.starts_with("new class(") && text.ends_with('}')));

        let classes: Vec<NodeId> = tree
            .descendants(tree.root())
            .into_iter()
            .filter(|id| tree.kind(*id) == NodeKind::AnonymousClass)
            .collect();
        assert!(matches!(
            tree.node(classes[1]),
            Node::AnonymousClass { modifiers, args, .. } if modifiers == &vec![Modifier::Readonly] && args.is_empty()
        ));
    }

    #[test]
    fn test_scope_statements_and_labels() {
        let kinds = kinds(
            "<?php
function f() {
    static $calls = 0, $last;
    global $config, $db;
    goto done;
    done:
    return strlen(...);
}
$$name = 1;
${'dyn' . $suffix} = 2;
",
        );
        for kind in [
            NodeKind::StaticVar,
            NodeKind::StaticVarItem,
            NodeKind::Global,
            NodeKind::Goto,
            NodeKind::Label,
            NodeKind::CallablePlaceholder,
            NodeKind::IndirectVariable,
        ] {
            assert!(kinds.contains(&kind), "missing {:?}", kind);
        }
    }

    #[test]
    fn test_indirect_variables() {
        let source = "<?php $$$name = ${'a' . $b};";
        let tree = parse(source).unwrap();
        let assign = first(&tree, NodeKind::Assign);
        let Node::Assign { target, value, .. } = tree.node(assign) else {
            panic!("expected assignment");
        };
        let Node::IndirectVariable { expr, braced: false } = tree.node(*target) else {
            panic!("expected an indirect target");
        };
        assert_eq!(tree.text(*expr, source), Some("$$name"));
        assert!(matches!(
            tree.node(*value),
            Node::IndirectVariable { braced: true, .. }
        ));
    }

    #[test]
    fn test_deep_nesting_is_an_error() {
        let depth = 5000;
        let source = format!("<?php $x = {}1{};", "(".repeat(depth), ")".repeat(depth));
        let err = parse(&source).unwrap_err();
        assert!(err.message.contains("nesting"), "{}", err.message);

        let blocks = format!("<?php {}{}", "{".repeat(depth), "}".repeat(depth));
        assert!(parse(&blocks).is_err());

        let fine = format!("<?php $x = {}1{};", "(".repeat(40), ")".repeat(40));
        assert!(parse(&fine).is_ok());
    }

    #[test]
    fn test_syntax_error_position() {
        let err = parse("<?php\n$a = ;").unwrap_err();
        assert_eq!((err.line, err.column), (2, 6));
    }
}

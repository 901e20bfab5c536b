//! Format-preserving printer
//!
//! Untouched source nodes print as their original bytes. A source node with
//! a replaced descendant prints as its original text patched with edits, one
//! per replaced slot. Only nodes a rule constructed are pretty-printed, and
//! copies of source nodes are reused verbatim (reindented) where possible.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::edit::{apply_edits, Edit, EditError};
use crate::node::{
    ListKind, Modifier, Node, NodeId, NodeKind, TypeSeparator, UnaryOperator, UseKind,
};
use crate::source::SourceFile;
use crate::text::{line_indent, TextRange};
use crate::tree::{Origin, SyntaxTree};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterConfig {
    /// Print copies of source nodes from their original text
    pub reuse_source_text: bool,
    /// One indentation level for constructed code
    pub indent: String,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            reuse_source_text: true,
            indent: "    ".to_string(),
        }
    }
}

/// Render the file's current tree back to text
pub fn print(file: &SourceFile, config: &PrinterConfig) -> Result<String, EditError> {
    Printer {
        tree: &file.tree,
        source: &file.text,
        config,
    }
    .node(file.tree.root(), "")
}

struct Printer<'a> {
    tree: &'a SyntaxTree,
    source: &'a str,
    config: &'a PrinterConfig,
}

type Printed = Result<String, EditError>;

/// Consecutive list elements standing in the same source span
struct Entry {
    span: TextRange,
    trivia_start: u32,
    roots: Vec<NodeId>,
    /// Grafted by a replacement, as opposed to an original element
    grafted: bool,
    removed: bool,
}

impl<'a> Printer<'a> {
    fn node(&self, id: NodeId, indent: &str) -> Printed {
        let text = self.unwrapped(id, indent)?;
        if self.needs_parens(id) {
            Ok(format!("({})", text))
        } else {
            Ok(text)
        }
    }

    /// A rule placed `id` where it binds looser than its position requires.
    /// Source nodes are trusted, the parser put them there.
    fn needs_parens(&self, id: NodeId) -> bool {
        let data = self.tree.data(id);
        if data.origin == Origin::Source {
            return false;
        }
        let Some(parent) = data.parent else {
            return false;
        };
        let parent = self.tree.node(parent);
        data.node.precedence() < parent.operand_precedence(id) || sign_clash(parent, &data.node)
    }

    fn unwrapped(&self, id: NodeId, indent: &str) -> Printed {
        let data = self.tree.data(id);
        match (data.origin, data.range) {
            (Origin::Source, Some(range)) if data.dirty => self.patched(id, range),
            (Origin::Source, Some(range)) => Ok(range.slice(self.source).to_string()),
            (Origin::Copied, Some(range)) if self.config.reuse_source_text => {
                let text = if data.dirty {
                    self.patched(id, range)?
                } else {
                    range.slice(self.source).to_string()
                };
                let from = line_indent(self.source, range.start_offset());
                Ok(reindent(&text, from, indent))
            }
            _ => self.pretty(id, indent),
        }
    }

    // ---- patching ------------------------------------------------------

    fn patched(&self, id: NodeId, range: TextRange) -> Printed {
        let node = self.tree.node(id);
        let lists = node.lists();
        let listed: HashSet<NodeId> = lists
            .iter()
            .flat_map(|(_, list)| list.iter().copied())
            .collect();

        let mut edits = Vec::new();
        for child in node.children() {
            if !listed.contains(&child) {
                self.child_edit(child, &mut edits)?;
            }
        }
        for (kind, list) in lists {
            self.list_edits(kind, list, &mut edits)?;
        }

        let mut relative = Vec::with_capacity(edits.len());
        for edit in edits {
            if !range.contains_range(edit.range) {
                return Err(EditError::RangeOutOfBounds {
                    start: edit.range.start_offset(),
                    end: edit.range.end_offset(),
                    len: range.end_offset(),
                });
            }
            relative.push(Edit::new(edit.range.relative_to(range.start), edit.replacement));
        }
        apply_edits(range.slice(self.source), &relative)
    }

    fn child_edit(&self, child: NodeId, edits: &mut Vec<Edit>) -> Result<(), EditError> {
        let data = self.tree.data(child);
        if let Some(slot) = data.slot {
            let indent = line_indent(self.source, slot.start_offset());
            edits.push(Edit::new(slot, self.node(child, indent)?));
        } else if data.dirty {
            if let Some(range) = data.range {
                let indent = line_indent(self.source, range.start_offset());
                edits.push(Edit::new(range, self.node(child, indent)?));
            }
        }
        Ok(())
    }

    fn entries(&self, list: &[NodeId]) -> Vec<Entry> {
        let mut entries: Vec<Entry> = Vec::new();
        for &id in list {
            let data = self.tree.data(id);
            let grafted = data.slot.is_some();
            let Some(span) = data.slot.or(data.range) else {
                continue;
            };
            let removed = data.kind() == NodeKind::Removed;

            if let Some(last) = entries.last_mut() {
                if grafted && last.grafted && last.span == span {
                    last.roots.push(id);
                    last.removed &= removed;
                    continue;
                }
            }
            entries.push(Entry {
                span,
                trivia_start: data.trivia_start.unwrap_or(span.start).min(span.start),
                roots: vec![id],
                grafted,
                removed,
            });
        }
        entries
    }

    fn list_edits(&self, kind: ListKind, list: &[NodeId], edits: &mut Vec<Edit>) -> Result<(), EditError> {
        let entries = self.entries(list);

        for entry in &entries {
            if entry.removed {
                continue;
            }
            if entry.grafted {
                let indent = line_indent(self.source, entry.span.start_offset());
                edits.push(Edit::new(entry.span, self.group(kind, &entry.roots, indent)?));
            } else {
                let id = entry.roots[0];
                if self.tree.data(id).dirty {
                    let indent = line_indent(self.source, entry.span.start_offset());
                    edits.push(Edit::new(entry.span, self.node(id, indent)?));
                }
            }
        }

        match kind {
            ListKind::Statements | ListKind::Members => {
                for entry in entries.iter().filter(|entry| entry.removed) {
                    edits.push(Edit::delete(TextRange::new(entry.trivia_start, entry.span.end)));
                }
            }
            ListKind::Comma => comma_removals(&entries, edits),
        }
        Ok(())
    }

    /// The roots of one replacement, joined the way their list separates
    /// elements
    fn group(&self, kind: ListKind, roots: &[NodeId], indent: &str) -> Printed {
        let separator = match kind {
            ListKind::Statements => "\n",
            ListKind::Members => "\n\n",
            ListKind::Comma => ", ",
        };
        let mut out = String::new();
        let mut first = true;
        for &root in roots {
            if self.tree.kind(root) == NodeKind::Removed {
                continue;
            }
            if !first {
                out.push_str(separator);
                if kind != ListKind::Comma {
                    out.push_str(&self.leading_comments(root, indent));
                    out.push_str(indent);
                }
            }
            out.push_str(&self.node(root, indent)?);
            first = false;
        }
        Ok(out)
    }

    /// Comment lines in front of a copied statement or member, or the ones
    /// a rebuilt node carries over, one per line, each indented and
    /// newline-terminated
    fn leading_comments(&self, id: NodeId, indent: &str) -> String {
        let data = self.tree.data(id);
        let span = match (data.origin, data.trivia_start, data.range) {
            (Origin::Copied, Some(start), Some(range)) if start < range.start => {
                TextRange::new(start, range.start)
            }
            (Origin::Constructed, _, _) => match data.comments {
                Some(comments) => comments,
                None => return String::new(),
            },
            _ => return String::new(),
        };

        let mut out = String::new();
        for line in span.slice(self.source).lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            out.push_str(indent);
            if line.starts_with('*') {
                out.push(' ');
            }
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    // ---- pretty printing ------------------------------------------------

    fn join(&self, ids: &[NodeId], separator: &str, indent: &str) -> Printed {
        let mut parts = Vec::with_capacity(ids.len());
        for &id in ids {
            if self.tree.kind(id) != NodeKind::Removed {
                parts.push(self.node(id, indent)?);
            }
        }
        Ok(parts.join(separator))
    }

    fn opt(&self, id: Option<NodeId>, prefix: &str, indent: &str) -> Printed {
        match id {
            Some(id) => Ok(format!("{}{}", prefix, self.node(id, indent)?)),
            None => Ok(String::new()),
        }
    }

    fn inner(&self, indent: &str) -> String {
        format!("{}{}", indent, self.config.indent)
    }

    fn block(&self, statements: &[NodeId], indent: &str) -> Printed {
        let inner = self.inner(indent);
        let mut out = String::from("{");
        for &statement in statements {
            if self.tree.kind(statement) == NodeKind::Removed {
                continue;
            }
            out.push('\n');
            out.push_str(&self.leading_comments(statement, &inner));
            out.push_str(&inner);
            out.push_str(&self.node(statement, &inner)?);
        }
        out.push('\n');
        out.push_str(indent);
        out.push('}');
        Ok(out)
    }

    /// Class-like body with the brace on its own line
    fn members(&self, members: &[NodeId], indent: &str) -> Printed {
        self.member_body(format!("\n{}{{", indent), members, indent)
    }

    fn member_body(&self, open: String, members: &[NodeId], indent: &str) -> Printed {
        let inner = self.inner(indent);
        let mut out = open;
        let mut previous: Option<NodeKind> = None;
        for &member in members {
            let kind = self.tree.kind(member);
            if kind == NodeKind::Removed {
                continue;
            }
            let tight = previous == Some(kind)
                && matches!(
                    kind,
                    NodeKind::PropertyDecl
                        | NodeKind::ClassConstDecl
                        | NodeKind::TraitUse
                        | NodeKind::EnumCase
                );
            out.push_str(if previous.is_none() || tight { "\n" } else { "\n\n" });
            out.push_str(&self.leading_comments(member, &inner));
            out.push_str(&inner);
            out.push_str(&self.node(member, &inner)?);
            previous = Some(kind);
        }
        out.push('\n');
        out.push_str(indent);
        out.push('}');
        Ok(out)
    }

    fn pretty(&self, id: NodeId, indent: &str) -> Printed {
        let text = match self.tree.node(id) {
            Node::File { items } => {
                let mut out = String::new();
                for &item in items {
                    if !out.is_empty() && !out.ends_with('\n') {
                        out.push('\n');
                    }
                    out.push_str(&self.node(item, "")?);
                }
                out
            }
            Node::InlineHtml { text } | Node::OpenTag { text } | Node::CloseTag { text } => {
                text.clone()
            }

            Node::ExpressionStatement { expr } => format!("{};", self.node(*expr, indent)?),
            Node::Echo { values } => format!("echo {};", self.join(values, ", ", indent)?),
            Node::Return { value } => format!("return{};", self.opt(*value, " ", indent)?),
            Node::If {
                condition,
                then,
                else_ifs,
                otherwise,
            } => {
                let mut out = format!(
                    "if ({}) {}",
                    self.node(*condition, indent)?,
                    self.node(*then, indent)?
                );
                for &else_if in else_ifs {
                    if self.tree.kind(else_if) != NodeKind::Removed {
                        out.push(' ');
                        out.push_str(&self.node(else_if, indent)?);
                    }
                }
                out.push_str(&self.opt(*otherwise, " ", indent)?);
                out
            }
            Node::ElseIf { condition, body } => format!(
                "elseif ({}) {}",
                self.node(*condition, indent)?,
                self.node(*body, indent)?
            ),
            Node::Else { body } => format!("else {}", self.node(*body, indent)?),
            Node::While { condition, body } => format!(
                "while ({}) {}",
                self.node(*condition, indent)?,
                self.node(*body, indent)?
            ),
            Node::DoWhile { body, condition } => format!(
                "do {} while ({});",
                self.node(*body, indent)?,
                self.node(*condition, indent)?
            ),
            Node::For {
                init,
                condition,
                step,
                body,
            } => {
                let mut header = self.join(init, ", ", indent)?;
                for part in [condition, step] {
                    header.push(';');
                    let part = self.join(part, ", ", indent)?;
                    if !part.is_empty() {
                        header.push(' ');
                        header.push_str(&part);
                    }
                }
                format!("for ({}) {}", header, self.node(*body, indent)?)
            }
            Node::Foreach {
                subject,
                key,
                by_ref,
                value,
                body,
            } => format!(
                "foreach ({} as {}{}{}) {}",
                self.node(*subject, indent)?,
                match key {
                    Some(key) => format!("{} => ", self.node(*key, indent)?),
                    None => String::new(),
                },
                if *by_ref { "&" } else { "" },
                self.node(*value, indent)?,
                self.node(*body, indent)?
            ),
            Node::Switch { subject, cases } => {
                let inner = self.inner(indent);
                let mut out = format!("switch ({}) {{", self.node(*subject, indent)?);
                for &case in cases {
                    if self.tree.kind(case) != NodeKind::Removed {
                        out.push('\n');
                        out.push_str(&inner);
                        out.push_str(&self.node(case, &inner)?);
                    }
                }
                out.push('\n');
                out.push_str(indent);
                out.push('}');
                out
            }
            Node::Case { test, body } => {
                let mut out = match test {
                    Some(test) => format!("case {}:", self.node(*test, indent)?),
                    None => "default:".to_string(),
                };
                let inner = self.inner(indent);
                for &statement in body {
                    if self.tree.kind(statement) != NodeKind::Removed {
                        out.push('\n');
                        out.push_str(&inner);
                        out.push_str(&self.node(statement, &inner)?);
                    }
                }
                out
            }
            Node::Block { statements } => self.block(statements, indent)?,
            Node::Try {
                body,
                catches,
                finally,
            } => {
                let mut out = format!("try {}", self.node(*body, indent)?);
                for &catch in catches {
                    if self.tree.kind(catch) != NodeKind::Removed {
                        out.push(' ');
                        out.push_str(&self.node(catch, indent)?);
                    }
                }
                out.push_str(&self.opt(*finally, " ", indent)?);
                out
            }
            Node::Catch { types, var, body } => format!(
                "catch ({}{}) {}",
                self.join(types, " | ", indent)?,
                self.opt(*var, " ", indent)?,
                self.node(*body, indent)?
            ),
            Node::Finally { body } => format!("finally {}", self.node(*body, indent)?),
            Node::Break { level } => format!("break{};", self.opt(*level, " ", indent)?),
            Node::Continue { level } => format!("continue{};", self.opt(*level, " ", indent)?),
            Node::Declare { directives } => {
                let mut parts = Vec::new();
                for &directive in directives {
                    match self.tree.node(directive) {
                        Node::ConstItem { name, value } => parts.push(format!(
                            "{}={}",
                            self.node(*name, indent)?,
                            self.node(*value, indent)?
                        )),
                        Node::Removed => {}
                        _ => parts.push(self.node(directive, indent)?),
                    }
                }
                format!("declare({});", parts.join(", "))
            }
            Node::Namespace { name, body } => {
                let name = self.opt(*name, " ", indent)?;
                match body {
                    Some(body) => format!("namespace{} {}", name, self.node(*body, indent)?),
                    None => format!("namespace{};", name),
                }
            }
            Node::Use {
                kind,
                prefix,
                items,
            } => {
                let kind = match kind {
                    UseKind::Class => "",
                    UseKind::Function => "function ",
                    UseKind::Const => "const ",
                };
                let items = self.join(items, ", ", indent)?;
                match prefix {
                    Some(prefix) => {
                        format!("use {}{}\\{{{}}};", kind, self.node(*prefix, indent)?, items)
                    }
                    None => format!("use {}{};", kind, items),
                }
            }
            Node::UseItem { name, alias } => format!(
                "{}{}",
                self.node(*name, indent)?,
                self.opt(*alias, " as ", indent)?
            ),
            Node::StaticVar { items } => format!("static {};", self.join(items, ", ", indent)?),
            Node::StaticVarItem { var, default } => format!(
                "{}{}",
                self.node(*var, indent)?,
                self.opt(*default, " = ", indent)?
            ),
            Node::Global { vars } => format!("global {};", self.join(vars, ", ", indent)?),
            Node::Goto { label } => format!("goto {};", self.node(*label, indent)?),
            Node::Label { name } => format!("{}:", self.node(*name, indent)?),
            Node::Nop => ";".to_string(),

            Node::ClassDecl {
                modifiers,
                name,
                extends,
                implements,
                members,
            } => {
                let mut out = modifiers_prefix(modifiers);
                out.push_str("class ");
                out.push_str(&self.node(*name, indent)?);
                out.push_str(&self.opt(*extends, " extends ", indent)?);
                let implements = self.join(implements, ", ", indent)?;
                if !implements.is_empty() {
                    out.push_str(" implements ");
                    out.push_str(&implements);
                }
                out.push_str(&self.members(members, indent)?);
                out
            }
            Node::InterfaceDecl {
                name,
                extends,
                members,
            } => {
                let mut out = format!("interface {}", self.node(*name, indent)?);
                let extends = self.join(extends, ", ", indent)?;
                if !extends.is_empty() {
                    out.push_str(" extends ");
                    out.push_str(&extends);
                }
                out.push_str(&self.members(members, indent)?);
                out
            }
            Node::TraitDecl { name, members } => format!(
                "trait {}{}",
                self.node(*name, indent)?,
                self.members(members, indent)?
            ),
            Node::EnumDecl {
                name,
                backing_type,
                implements,
                members,
            } => {
                let mut out = format!(
                    "enum {}{}",
                    self.node(*name, indent)?,
                    self.opt(*backing_type, ": ", indent)?
                );
                let implements = self.join(implements, ", ", indent)?;
                if !implements.is_empty() {
                    out.push_str(" implements ");
                    out.push_str(&implements);
                }
                out.push_str(&self.members(members, indent)?);
                out
            }
            Node::EnumCase { name, value } => format!(
                "case {}{};",
                self.node(*name, indent)?,
                self.opt(*value, " = ", indent)?
            ),
            Node::FunctionDecl {
                by_ref,
                name,
                params,
                return_type,
                body,
            } => format!(
                "function {}{}({}){}\n{}{}",
                if *by_ref { "&" } else { "" },
                self.node(*name, indent)?,
                self.join(params, ", ", indent)?,
                self.opt(*return_type, ": ", indent)?,
                indent,
                self.node(*body, indent)?
            ),
            Node::MethodDecl {
                modifiers,
                by_ref,
                name,
                params,
                return_type,
                body,
            } => {
                let mut out = modifiers_prefix(modifiers);
                out.push_str(&format!(
                    "function {}{}({}){}",
                    if *by_ref { "&" } else { "" },
                    self.node(*name, indent)?,
                    self.join(params, ", ", indent)?,
                    self.opt(*return_type, ": ", indent)?
                ));
                match body {
                    Some(body) => {
                        out.push('\n');
                        out.push_str(indent);
                        out.push_str(&self.node(*body, indent)?);
                    }
                    None => out.push(';'),
                }
                out
            }
            Node::Parameter {
                modifiers,
                type_hint,
                by_ref,
                variadic,
                var,
                default,
            } => format!(
                "{}{}{}{}{}{}",
                modifiers_prefix(modifiers),
                match type_hint {
                    Some(type_hint) => format!("{} ", self.node(*type_hint, indent)?),
                    None => String::new(),
                },
                if *by_ref { "&" } else { "" },
                if *variadic { "..." } else { "" },
                self.node(*var, indent)?,
                self.opt(*default, " = ", indent)?
            ),
            Node::PropertyDecl {
                modifiers,
                type_hint,
                items,
            } => format!(
                "{}{}{};",
                modifiers_prefix(modifiers),
                match type_hint {
                    Some(type_hint) => format!("{} ", self.node(*type_hint, indent)?),
                    None => String::new(),
                },
                self.join(items, ", ", indent)?
            ),
            Node::PropertyItem { var, default } => format!(
                "{}{}",
                self.node(*var, indent)?,
                self.opt(*default, " = ", indent)?
            ),
            Node::ClassConstDecl { modifiers, items } => format!(
                "{}const {};",
                modifiers_prefix(modifiers),
                self.join(items, ", ", indent)?
            ),
            Node::ConstItem { name, value } => format!(
                "{} = {}",
                self.node(*name, indent)?,
                self.node(*value, indent)?
            ),
            Node::TraitUse { traits } => format!("use {};", self.join(traits, ", ", indent)?),
            Node::Type {
                nullable,
                parts,
                separator,
            } => {
                let separator = match separator {
                    TypeSeparator::Union => "|",
                    TypeSeparator::Intersection => "&",
                };
                format!(
                    "{}{}",
                    if *nullable { "?" } else { "" },
                    self.join(parts, separator, indent)?
                )
            }

            Node::Literal { raw, .. } => raw.clone(),
            Node::Identifier { name } | Node::Name { name } => name.clone(),
            Node::Variable { name } => format!("${}", name),
            Node::IndirectVariable { expr, braced } => {
                let expr = self.node(*expr, indent)?;
                if *braced {
                    format!("${{{}}}", expr)
                } else {
                    format!("${}", expr)
                }
            }
            Node::BinaryOp { op, left, right } => format!(
                "{} {} {}",
                self.node(*left, indent)?,
                op.as_str(),
                self.node(*right, indent)?
            ),
            Node::UnaryOp { op, operand } => {
                let operand = self.node(*operand, indent)?;
                if op.is_postfix() {
                    format!("{}{}", operand, op.as_str())
                } else if op.is_keyword() {
                    format!("{} {}", op.as_str(), operand)
                } else {
                    format!("{}{}", op.as_str(), operand)
                }
            }
            Node::Assign {
                op,
                by_ref,
                target,
                value,
            } => format!(
                "{} {} {}{}",
                self.node(*target, indent)?,
                op.as_str(),
                if *by_ref { "&" } else { "" },
                self.node(*value, indent)?
            ),
            Node::Ternary {
                condition,
                then,
                otherwise,
            } => match then {
                Some(then) => format!(
                    "{} ? {} : {}",
                    self.node(*condition, indent)?,
                    self.node(*then, indent)?,
                    self.node(*otherwise, indent)?
                ),
                None => format!(
                    "{} ?: {}",
                    self.node(*condition, indent)?,
                    self.node(*otherwise, indent)?
                ),
            },
            Node::Call { callee, args } => format!(
                "{}({})",
                self.node(*callee, indent)?,
                self.join(args, ", ", indent)?
            ),
            Node::MethodCall {
                object,
                name,
                args,
                nullsafe,
            } => format!(
                "{}{}{}({})",
                self.node(*object, indent)?,
                if *nullsafe { "?->" } else { "->" },
                self.node(*name, indent)?,
                self.join(args, ", ", indent)?
            ),
            Node::StaticCall { class, name, args } => format!(
                "{}::{}({})",
                self.node(*class, indent)?,
                self.node(*name, indent)?,
                self.join(args, ", ", indent)?
            ),
            Node::New { class, args } => format!(
                "new {}({})",
                self.node(*class, indent)?,
                self.join(args, ", ", indent)?
            ),
            Node::PropertyFetch {
                object,
                name,
                nullsafe,
            } => format!(
                "{}{}{}",
                self.node(*object, indent)?,
                if *nullsafe { "?->" } else { "->" },
                self.node(*name, indent)?
            ),
            Node::StaticPropertyFetch { class, name } | Node::ClassConstFetch { class, name } => {
                format!("{}::{}", self.node(*class, indent)?, self.node(*name, indent)?)
            }
            Node::ConstFetch { name } => self.node(*name, indent)?,
            Node::Array { items, short } => {
                let items = self.join(items, ", ", indent)?;
                if *short {
                    format!("[{}]", items)
                } else {
                    format!("array({})", items)
                }
            }
            Node::ArrayItem {
                key,
                value,
                by_ref,
                spread,
            } => format!(
                "{}{}{}{}",
                if *spread { "..." } else { "" },
                match key {
                    Some(key) => format!("{} => ", self.node(*key, indent)?),
                    None => String::new(),
                },
                if *by_ref { "&" } else { "" },
                self.node(*value, indent)?
            ),
            Node::Index { array, index } => format!(
                "{}[{}]",
                self.node(*array, indent)?,
                self.opt(*index, "", indent)?
            ),
            Node::Parenthesized { expr } => format!("({})", self.node(*expr, indent)?),
            Node::Cast { cast, expr } => format!("({}) {}", cast, self.node(*expr, indent)?),
            Node::Isset { vars } => format!("isset({})", self.join(vars, ", ", indent)?),
            Node::Empty { expr } => format!("empty({})", self.node(*expr, indent)?),
            Node::Closure {
                is_static,
                by_ref,
                params,
                uses,
                return_type,
                body,
            } => {
                let uses = self.join(uses, ", ", indent)?;
                format!(
                    "{}function {}({}){}{} {}",
                    if *is_static { "static " } else { "" },
                    if *by_ref { "&" } else { "" },
                    self.join(params, ", ", indent)?,
                    if uses.is_empty() {
                        String::new()
                    } else {
                        format!(" use ({})", uses)
                    },
                    self.opt(*return_type, ": ", indent)?,
                    self.node(*body, indent)?
                )
            }
            Node::ClosureUse { by_ref, var } => format!(
                "{}{}",
                if *by_ref { "&" } else { "" },
                self.node(*var, indent)?
            ),
            Node::ArrowFunction {
                is_static,
                by_ref,
                params,
                return_type,
                body,
            } => format!(
                "{}fn{}({}){} => {}",
                if *is_static { "static " } else { "" },
                if *by_ref { " &" } else { "" },
                self.join(params, ", ", indent)?,
                self.opt(*return_type, ": ", indent)?,
                self.node(*body, indent)?
            ),
            Node::Match { subject, arms } => {
                let inner = self.inner(indent);
                let mut out = format!("match ({}) {{", self.node(*subject, indent)?);
                for &arm in arms {
                    if self.tree.kind(arm) != NodeKind::Removed {
                        out.push('\n');
                        out.push_str(&inner);
                        out.push_str(&self.node(arm, &inner)?);
                        out.push(',');
                    }
                }
                out.push('\n');
                out.push_str(indent);
                out.push('}');
                out
            }
            Node::MatchArm { conditions, body } => {
                let conditions = self.join(conditions, ", ", indent)?;
                format!(
                    "{} => {}",
                    if conditions.is_empty() {
                        "default"
                    } else {
                        conditions.as_str()
                    },
                    self.node(*body, indent)?
                )
            }
            Node::Argument {
                name,
                value,
                spread,
            } => format!(
                "{}{}{}",
                if *spread { "..." } else { "" },
                match name {
                    Some(name) => format!("{}: ", self.node(*name, indent)?),
                    None => String::new(),
                },
                self.node(*value, indent)?
            ),
            Node::CallablePlaceholder => "...".to_string(),
            Node::Yield { key, value } => match (key, value) {
                (Some(key), Some(value)) => format!(
                    "yield {} => {}",
                    self.node(*key, indent)?,
                    self.node(*value, indent)?
                ),
                (_, value) => format!("yield{}", self.opt(*value, " ", indent)?),
            },
            Node::YieldFrom { expr } => format!("yield from {}", self.node(*expr, indent)?),
            Node::AnonymousClass {
                modifiers,
                args,
                extends,
                implements,
                members,
            } => {
                let mut out = format!("new {}class", modifiers_prefix(modifiers));
                if !args.is_empty() {
                    out.push_str(&format!("({})", self.join(args, ", ", indent)?));
                }
                out.push_str(&self.opt(*extends, " extends ", indent)?);
                let implements = self.join(implements, ", ", indent)?;
                if !implements.is_empty() {
                    out.push_str(" implements ");
                    out.push_str(&implements);
                }
                out.push_str(&self.member_body(" {".to_string(), members, indent)?);
                out
            }
            Node::Removed => String::new(),
        };
        Ok(text)
    }
}

/// `-(-1)` and `-(--$a)` would lex as a decrement without parentheses
fn sign_clash(parent: &Node, child: &Node) -> bool {
    let Node::UnaryOp {
        op: outer @ (UnaryOperator::Negate | UnaryOperator::Plus),
        ..
    } = parent
    else {
        return false;
    };
    let sign = outer.as_str();
    match child {
        Node::Literal { raw, .. } => raw.starts_with(sign),
        Node::UnaryOp { op, .. } => !op.is_postfix() && op.as_str().starts_with(sign),
        _ => false,
    }
}

fn modifiers_prefix(modifiers: &[Modifier]) -> String {
    modifiers
        .iter()
        .map(|modifier| format!("{} ", modifier.as_str()))
        .collect()
}

/// Deletions for removed elements of a comma separated list. Each run of
/// removed elements takes the separator after it, or the one before it
/// when it ends the list.
fn comma_removals(entries: &[Entry], edits: &mut Vec<Edit>) {
    let mut index = 0;
    while index < entries.len() {
        if !entries[index].removed {
            index += 1;
            continue;
        }
        let first = index;
        while index < entries.len() && entries[index].removed {
            index += 1;
        }
        let last = index - 1;

        let range = if let Some(next) = entries.get(index) {
            TextRange::new(entries[first].span.start, next.span.start)
        } else if first > 0 {
            TextRange::new(entries[first - 1].span.end, entries[last].span.end)
        } else {
            TextRange::new(entries[first].span.start, entries[last].span.end)
        };
        edits.push(Edit::delete(range));
    }
}

/// Move the lines after the first from one indentation to another
fn reindent(text: &str, from: &str, to: &str) -> String {
    if from == to || !text.contains('\n') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            out.push('\n');
            match line.strip_prefix(from) {
                Some(rest) => {
                    out.push_str(to);
                    out.push_str(rest);
                }
                None => out.push_str(line),
            }
        } else {
            out.push_str(line);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::FragmentBuilder;
    use crate::node::{BinaryOperator, LiteralKind};

    fn find_all(file: &SourceFile, kind: NodeKind) -> Vec<NodeId> {
        file.tree
            .descendants(file.tree.root())
            .into_iter()
            .filter(|id| file.tree.kind(*id) == kind)
            .collect()
    }

    fn find(file: &SourceFile, kind: NodeKind) -> NodeId {
        find_all(file, kind)[0]
    }

    fn render(file: &SourceFile) -> String {
        print(file, &PrinterConfig::default()).unwrap()
    }

    fn variable(file: &SourceFile, name: &str) -> NodeId {
        find_all(file, NodeKind::Variable)
            .into_iter()
            .find(|id| matches!(file.tree.node(*id), Node::Variable { name: n } if n == name))
            .unwrap()
    }

    /// Tree shape with ids erased and parentheses dropped
    fn shape(tree: &SyntaxTree, id: NodeId) -> String {
        if let Node::Parenthesized { expr } = tree.node(id) {
            return shape(tree, *expr);
        }
        let children: Vec<String> = tree
            .children(id)
            .into_iter()
            .map(|child| shape(tree, child))
            .collect();
        format!("{:?}[{}]", tree.node(id).shape(), children.join(", "))
    }

    /// The printed text parses back into the tree that was printed
    fn assert_reparses(file: &SourceFile) {
        let printed = render(file);
        let reparsed = SourceFile::parse(&printed).unwrap();
        assert_eq!(
            shape(&reparsed.tree, reparsed.tree.root()),
            shape(&file.tree, file.tree.root()),
            "{}",
            printed
        );
    }

    #[test]
    fn test_untouched_file_is_byte_exact() {
        let source = "<html>\n<?php  \n  // note\n  $x   =   foo( 1,2 ) ;\n?>\n</html>\n";
        let file = SourceFile::parse(source).unwrap();
        assert_eq!(render(&file), source);
    }

    #[test]
    fn test_replacement_patches_only_its_slot() {
        let mut file = SourceFile::parse("<?php\n$r->setStatusCode(  200  ); // ok\n").unwrap();
        let literal = find(&file, NodeKind::Literal);

        let mut builder = FragmentBuilder::new();
        let fetch = builder.class_const_fetch("Response", "HTTP_OK");
        let fragment = builder.finish(fetch).unwrap();
        file.tree.apply_replacement(literal, Some(fragment)).unwrap();

        assert_eq!(
            render(&file),
            "<?php\n$r->setStatusCode(  Response::HTTP_OK  ); // ok\n"
        );
    }

    #[test]
    fn test_copied_node_reuses_source_text() {
        let mut file = SourceFile::parse("<?php\nfoo($a   +   $b);\n").unwrap();
        let sum = find(&file, NodeKind::BinaryOp);

        let mut builder = FragmentBuilder::new();
        let copy = builder.copy_of(&file.tree, sum);
        let zero = builder.int(0);
        let wrapped = builder.binary(BinaryOperator::Mul, copy, zero);
        let fragment = builder.finish(wrapped).unwrap();
        file.tree.apply_replacement(sum, Some(fragment)).unwrap();

        assert_eq!(render(&file), "<?php\nfoo(($a   +   $b) * 0);\n");
        assert_reparses(&file);

        let pretty = print(
            &file,
            &PrinterConfig {
                reuse_source_text: false,
                ..PrinterConfig::default()
            },
        )
        .unwrap();
        assert_eq!(pretty, "<?php\nfoo(($a + $b) * 0);\n");
    }

    #[test]
    fn test_constructed_operand_keeps_its_grouping() {
        let mut file = SourceFile::parse("<?php $x = $a * 2;").unwrap();
        let two = find(&file, NodeKind::Literal);

        let mut builder = FragmentBuilder::new();
        let three = builder.int(3);
        let one = builder.int(1);
        let difference = builder.binary(BinaryOperator::Sub, three, one);
        let fragment = builder.finish(difference).unwrap();
        file.tree.apply_replacement(two, Some(fragment)).unwrap();

        assert_eq!(render(&file), "<?php $x = $a * (3 - 1);");
        assert_reparses(&file);
    }

    #[test]
    fn test_nested_constructed_operands() {
        let mut file = SourceFile::parse("<?php $x = 0;").unwrap();
        let zero = find(&file, NodeKind::Literal);

        let mut builder = FragmentBuilder::new();
        let (a, b, c) = (builder.int(1), builder.int(2), builder.int(3));
        let sum = builder.binary(BinaryOperator::Add, a, b);
        let product = builder.binary(BinaryOperator::Mul, sum, c);
        let (d, e) = (builder.int(4), builder.int(5));
        let inner = builder.binary(BinaryOperator::Sub, d, e);
        let outer = builder.binary(BinaryOperator::Sub, product, inner);
        let fragment = builder.finish(outer).unwrap();
        file.tree.apply_replacement(zero, Some(fragment)).unwrap();

        assert_eq!(render(&file), "<?php $x = (1 + 2) * 3 - (4 - 5);");
        assert_reparses(&file);
    }

    #[test]
    fn test_unary_receiver_and_new_operands() {
        let mut file =
            SourceFile::parse("<?php
$y = !$ok;
$r->send();
$n = -$m;
$o = new Foo();
")
                .unwrap();
        let class = find(&file, NodeKind::Name);

        let mut builder = FragmentBuilder::new();
        let (a, b) = (builder.variable("a"), builder.variable("b"));
        let both = builder.binary(BinaryOperator::BooleanAnd, a, b);
        let fragment = builder.finish(both).unwrap();
        file.tree.apply_replacement(variable(&file, "ok"), Some(fragment)).unwrap();

        let mut builder = FragmentBuilder::new();
        let client = builder.new_object("Client", Vec::new());
        let fragment = builder.finish(client).unwrap();
        file.tree.apply_replacement(variable(&file, "r"), Some(fragment)).unwrap();

        let mut builder = FragmentBuilder::new();
        let one = builder.int(1);
        let negative = builder.unary(UnaryOperator::Negate, one);
        let fragment = builder.finish(negative).unwrap();
        file.tree.apply_replacement(variable(&file, "m"), Some(fragment)).unwrap();

        let mut builder = FragmentBuilder::new();
        let this = builder.variable("this");
        let name = builder.identifier("class");
        let fetch = builder.push(Node::PropertyFetch {
            object: this,
            name,
            nullsafe: false,
        });
        let fragment = builder.finish(fetch).unwrap();
        file.tree.apply_replacement(class, Some(fragment)).unwrap();

        assert_eq!(
            render(&file),
            "<?php\n$y = !($a && $b);\n(new Client())->send();\n$n = -(-1);\n$o = new ($this->class)();\n"
        );
        assert_reparses(&file);
    }

    #[test]
    fn test_delete_middle_and_last_argument() {
        let mut file = SourceFile::parse("<?php f($a, $b, $c);").unwrap();
        let args = find_all(&file, NodeKind::Argument);
        file.tree.apply_replacement(args[1], None).unwrap();
        assert_eq!(render(&file), "<?php f($a, $c);");
        file.tree.apply_replacement(args[2], None).unwrap();
        assert_eq!(render(&file), "<?php f($a);");
    }

    #[test]
    fn test_delete_every_argument() {
        let mut file = SourceFile::parse("<?php f($a, $b);").unwrap();
        for argument in find_all(&file, NodeKind::Argument) {
            file.tree.apply_replacement(argument, None).unwrap();
        }
        assert_eq!(render(&file), "<?php f();");
    }

    #[test]
    fn test_delete_statement_with_its_trivia() {
        let mut file =
            SourceFile::parse("<?php\nfunction f()\n{\n    // gone\n    a();\n    b();\n}\n").unwrap();
        let statement = find(&file, NodeKind::ExpressionStatement);
        file.tree.apply_replacement(statement, None).unwrap();
        assert_eq!(render(&file), "<?php\nfunction f()\n{\n    b();\n}\n");
    }

    #[test]
    fn test_expansion_into_statements() {
        let mut file = SourceFile::parse("<?php\nif ($x) {\n    a();\n}\n").unwrap();
        let statement = find(&file, NodeKind::ExpressionStatement);

        let mut builder = FragmentBuilder::new();
        let first = builder.copy_of(&file.tree, statement);
        let callee = builder.name("b");
        let call = builder.push(Node::Call {
            callee,
            args: Vec::new(),
        });
        let second = builder.expression_statement(call);
        let fragment = builder.finish_many(vec![first, second]).unwrap();
        file.tree.apply_replacement(statement, Some(fragment)).unwrap();

        assert_eq!(render(&file), "<?php\nif ($x) {\n    a();\n    b();\n}\n");
    }

    #[test]
    fn test_constructed_block_is_indented() {
        let mut file = SourceFile::parse("<?php\nclass A\n{\n    public function f()\n    {\n        return 1;\n    }\n}\n").unwrap();
        let block = find(&file, NodeKind::Block);
        let value = find(&file, NodeKind::Literal);

        let mut builder = FragmentBuilder::new();
        let copy = builder.copy_of(&file.tree, value);
        let returned = builder.return_statement(Some(copy));
        let target = builder.variable("x");
        let two = builder.literal(LiteralKind::Integer, "2");
        let assign = builder.assign(target, two);
        let assign = builder.expression_statement(assign);
        let new_block = builder.block(vec![assign, returned]);
        let fragment = builder.finish(new_block).unwrap();
        file.tree.apply_replacement(block, Some(fragment)).unwrap();

        assert_eq!(
            render(&file),
            "<?php\nclass A\n{\n    public function f()\n    {\n        $x = 2;\n        return 1;\n    }\n}\n"
        );
    }

    #[test]
    fn test_pretty_function_declaration() {
        let source = "<?php\nfunction f()\n{\n    return 1;\n}\n";
        let file = SourceFile::parse(source).unwrap();
        let printer = Printer {
            tree: &file.tree,
            source: &file.text,
            config: &PrinterConfig {
                reuse_source_text: false,
                ..PrinterConfig::default()
            },
        };
        let function = find(&file, NodeKind::FunctionDecl);
        assert_eq!(
            printer.pretty(function, "").unwrap(),
            "function f()\n{\n    return 1;\n}"
        );
    }

    #[test]
    fn test_pretty_enum_and_anonymous_class() {
        let source = "<?php\nenum Suit: string implements HasLabel\n{\n    case Hearts = 'H';\n    case Spades = 'S';\n}\n$o = new class(1) extends Base implements Countable {\n    public $a;\n};\n";
        let file = SourceFile::parse(source).unwrap();
        let printer = Printer {
            tree: &file.tree,
            source: &file.text,
            config: &PrinterConfig::default(),
        };
        assert_eq!(
            printer.pretty(find(&file, NodeKind::EnumDecl), "").unwrap(),
            "enum Suit: string implements HasLabel\n{\n    case Hearts = 'H';\n    case Spades = 'S';\n}"
        );
        assert_eq!(
            printer.pretty(find(&file, NodeKind::AnonymousClass), "").unwrap(),
            "new class(1) extends Base implements Countable {\n    public $a;\n}"
        );
    }

    #[test]
    fn test_pretty_generator_and_scope_statements() {
        let source = "<?php\nfunction g()\n{\n    static $n = 0, $m;\n    global $cfg;\n    yield $k => $v;\n    yield from g();\n    use_it(strlen(...));\n}\n";
        let file = SourceFile::parse(source).unwrap();
        let printer = Printer {
            tree: &file.tree,
            source: &file.text,
            config: &PrinterConfig::default(),
        };
        let pretty = |kind| printer.pretty(find(&file, kind), "").unwrap();
        assert_eq!(pretty(NodeKind::StaticVar), "static $n = 0, $m;");
        assert_eq!(pretty(NodeKind::Global), "global $cfg;");
        assert_eq!(pretty(NodeKind::Yield), "yield $k => $v");
        assert_eq!(pretty(NodeKind::YieldFrom), "yield from g()");
        assert_eq!(pretty(NodeKind::CallablePlaceholder), "...");
    }

    #[test]
    fn test_pretty_round_trip_of_newer_syntax() {
        let source = r#"<?php
namespace App;
use App\Entity\{User, Post as Article};
enum Suit: string implements HasLabel
{
    case Hearts = 'H';
    const WILD = self::Hearts;
    public function label(): string
    {
        return ucfirst($this->name);
    }
}
function gen()
{
    static $calls = 0;
    global $config;
    $calls++;
    $sent = yield;
    yield 1;
    yield ['/'];
    yield $calls => $sent;
    yield from inner();
    $$name = 1;
    ${'dyn' . $name} = 2;
    $len = strlen(...);
    $o = new class($config) extends Base implements Countable {
        public function count(): int
        {
            return 0;
        }
    };
    goto done;
    done:
    return -(-$o) * (1 + 2);
}
"#;
        let mut file = SourceFile::parse(source).unwrap();
        let root = file.tree.root();
        let mut builder = FragmentBuilder::new();
        let copy = builder.copy_of(&file.tree, root);
        let fragment = builder.finish(copy).unwrap();
        file.tree.apply_replacement(root, Some(fragment)).unwrap();

        let pretty = print(
            &file,
            &PrinterConfig {
                reuse_source_text: false,
                ..PrinterConfig::default()
            },
        )
        .unwrap();
        assert!(pretty.contains("use App\\Entity\\{User, Post as Article};"), "{}", pretty);
        assert!(pretty.contains("    yield $calls => $sent;\n"), "{}", pretty);
        assert!(pretty.contains("$o = new class($config) extends Base implements Countable {\n"));
        let reparsed = SourceFile::parse(&pretty).unwrap();
        assert_eq!(
            shape(&reparsed.tree, reparsed.tree.root()),
            shape(&file.tree, file.tree.root()),
            "{}",
            pretty
        );
    }

    #[test]
    fn test_constructed_member_carries_comments() {
        let source = "<?php\nclass A\n{\n    /**\n     * Doc\n     */\n    public function old()\n    {\n    }\n}\n";
        let mut file = SourceFile::parse(source).unwrap();
        let class = find(&file, NodeKind::ClassDecl);
        let method = find(&file, NodeKind::MethodDecl);

        let mut builder = FragmentBuilder::new();
        let class_name = builder.identifier("A");
        let name = builder.identifier("renamed");
        let body = builder.block(Vec::new());
        let rebuilt = builder.push(Node::MethodDecl {
            modifiers: vec![Modifier::Public],
            by_ref: false,
            name,
            params: Vec::new(),
            return_type: None,
            body: Some(body),
        });
        builder.carry_comments(rebuilt, &file.tree, method);
        let new_class = builder.push(Node::ClassDecl {
            modifiers: Vec::new(),
            name: class_name,
            extends: None,
            implements: Vec::new(),
            members: vec![rebuilt],
        });
        let fragment = builder.finish(new_class).unwrap();
        file.tree.apply_replacement(class, Some(fragment)).unwrap();

        assert_eq!(
            render(&file),
            "<?php\nclass A\n{\n    /**\n     * Doc\n     */\n    public function renamed()\n    {\n    }\n}\n"
        );
    }

    #[test]
    fn test_reindent() {
        assert_eq!(reindent("a(\n    b\n)", "", "    "), "a(\n        b\n    )");
        assert_eq!(reindent("one line", "  ", ""), "one line");
    }
}

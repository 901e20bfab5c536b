//! Node model: tagged-variant syntax nodes
//!
//! Nodes reference their children by [`NodeId`] into the arena owned by a
//! [`SyntaxTree`](crate::tree::SyntaxTree) (or, while a rule is building a
//! replacement, by a [`FragmentBuilder`](crate::fragment::FragmentBuilder)).
//! Every child id appears in exactly one parent.

use std::fmt;

/// Index of a node inside its arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Binding strengths shared by the parser and the printer. Higher binds
/// tighter; an operand whose strength is below what its position requires
/// must be parenthesized.
pub mod precedence {
    pub const LOWEST: u8 = 0;
    pub const LOGICAL_OR: u8 = 1;
    pub const LOGICAL_XOR: u8 = 2;
    pub const LOGICAL_AND: u8 = 3;
    /// Assignment, `yield`, `print`, `include`, arrow functions
    pub const ASSIGN: u8 = 4;
    pub const TERNARY: u8 = 5;
    pub const COALESCE: u8 = 6;
    pub const BOOLEAN_OR: u8 = 7;
    pub const BOOLEAN_AND: u8 = 8;
    pub const BIT_OR: u8 = 9;
    pub const BIT_XOR: u8 = 10;
    pub const BIT_AND: u8 = 11;
    pub const EQUALITY: u8 = 12;
    pub const COMPARISON: u8 = 13;
    pub const CONCAT: u8 = 14;
    pub const SHIFT: u8 = 15;
    pub const ADDITIVE: u8 = 16;
    pub const MULTIPLICATIVE: u8 = 17;
    pub const NOT: u8 = 18;
    pub const INSTANCEOF: u8 = 19;
    /// Prefix operators, casts and `**`
    pub const UNARY: u8 = 20;
    /// `clone`, `new` and closures
    pub const CLONE: u8 = 21;
    /// Calls, member access, indexing
    pub const POSTFIX: u8 = 22;
    pub const ATOM: u8 = 23;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Integer,
    Float,
    /// Single or double quoted string, raw text includes the quotes
    String,
    /// Heredoc or nowdoc, raw text from `<<<` to the closing label
    Heredoc,
    True,
    False,
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
    BooleanAnd,
    BooleanOr,
    LogicalAnd,
    LogicalOr,
    LogicalXor,
    Equal,
    NotEqual,
    Identical,
    NotIdentical,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Spaceship,
    Coalesce,
    Instanceof,
}

impl BinaryOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Pow => "**",
            BinaryOperator::Concat => ".",
            BinaryOperator::BitAnd => "&",
            BinaryOperator::BitOr => "|",
            BinaryOperator::BitXor => "^",
            BinaryOperator::ShiftLeft => "<<",
            BinaryOperator::ShiftRight => ">>",
            BinaryOperator::BooleanAnd => "&&",
            BinaryOperator::BooleanOr => "||",
            BinaryOperator::LogicalAnd => "and",
            BinaryOperator::LogicalOr => "or",
            BinaryOperator::LogicalXor => "xor",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Identical => "===",
            BinaryOperator::NotIdentical => "!==",
            BinaryOperator::Less => "<",
            BinaryOperator::LessOrEqual => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterOrEqual => ">=",
            BinaryOperator::Spaceship => "<=>",
            BinaryOperator::Coalesce => "??",
            BinaryOperator::Instanceof => "instanceof",
        }
    }

    pub fn precedence(self) -> u8 {
        match self {
            BinaryOperator::LogicalOr => precedence::LOGICAL_OR,
            BinaryOperator::LogicalXor => precedence::LOGICAL_XOR,
            BinaryOperator::LogicalAnd => precedence::LOGICAL_AND,
            BinaryOperator::Coalesce => precedence::COALESCE,
            BinaryOperator::BooleanOr => precedence::BOOLEAN_OR,
            BinaryOperator::BooleanAnd => precedence::BOOLEAN_AND,
            BinaryOperator::BitOr => precedence::BIT_OR,
            BinaryOperator::BitXor => precedence::BIT_XOR,
            BinaryOperator::BitAnd => precedence::BIT_AND,
            BinaryOperator::Equal
            | BinaryOperator::NotEqual
            | BinaryOperator::Identical
            | BinaryOperator::NotIdentical
            | BinaryOperator::Spaceship => precedence::EQUALITY,
            BinaryOperator::Less
            | BinaryOperator::LessOrEqual
            | BinaryOperator::Greater
            | BinaryOperator::GreaterOrEqual => precedence::COMPARISON,
            BinaryOperator::Concat => precedence::CONCAT,
            BinaryOperator::ShiftLeft | BinaryOperator::ShiftRight => precedence::SHIFT,
            BinaryOperator::Add | BinaryOperator::Sub => precedence::ADDITIVE,
            BinaryOperator::Mul | BinaryOperator::Div | BinaryOperator::Mod => {
                precedence::MULTIPLICATIVE
            }
            BinaryOperator::Instanceof => precedence::INSTANCEOF,
            BinaryOperator::Pow => precedence::UNARY,
        }
    }

    pub fn is_right_associative(self) -> bool {
        matches!(self, BinaryOperator::Pow | BinaryOperator::Coalesce)
    }

    /// Comparisons cannot be chained without parentheses
    pub fn is_non_associative(self) -> bool {
        matches!(
            self.precedence(),
            precedence::EQUALITY | precedence::COMPARISON
        )
    }

    /// Minimum strength of the left and right operands
    pub fn operand_precedence(self) -> (u8, u8) {
        let own = self.precedence();
        if self.is_right_associative() {
            (own + 1, own)
        } else if self.is_non_associative() {
            (own + 1, own + 1)
        } else {
            (own, own + 1)
        }
    }

    /// Equality comparisons, strict or loose, positive or negated
    pub fn is_equality(self) -> bool {
        matches!(
            self,
            BinaryOperator::Equal
                | BinaryOperator::NotEqual
                | BinaryOperator::Identical
                | BinaryOperator::NotIdentical
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Not,
    Negate,
    Plus,
    BitNot,
    Silence,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
    Clone,
    Print,
    Throw,
    Include,
    IncludeOnce,
    Require,
    RequireOnce,
}

impl UnaryOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOperator::Not => "!",
            UnaryOperator::Negate => "-",
            UnaryOperator::Plus => "+",
            UnaryOperator::BitNot => "~",
            UnaryOperator::Silence => "@",
            UnaryOperator::PreIncrement | UnaryOperator::PostIncrement => "++",
            UnaryOperator::PreDecrement | UnaryOperator::PostDecrement => "--",
            UnaryOperator::Clone => "clone",
            UnaryOperator::Print => "print",
            UnaryOperator::Throw => "throw",
            UnaryOperator::Include => "include",
            UnaryOperator::IncludeOnce => "include_once",
            UnaryOperator::Require => "require",
            UnaryOperator::RequireOnce => "require_once",
        }
    }

    pub fn is_postfix(self) -> bool {
        matches!(self, UnaryOperator::PostIncrement | UnaryOperator::PostDecrement)
    }

    /// Keyword operators need a space before their operand
    pub fn is_keyword(self) -> bool {
        self.as_str().chars().all(|c| c.is_ascii_alphabetic() || c == '_')
    }

    /// Minimum strength of the operand. For prefix operators this is also
    /// the strength of the whole expression.
    pub fn operand_precedence(self) -> u8 {
        match self {
            UnaryOperator::Throw => precedence::LOWEST,
            UnaryOperator::Print
            | UnaryOperator::Include
            | UnaryOperator::IncludeOnce
            | UnaryOperator::Require
            | UnaryOperator::RequireOnce => precedence::ASSIGN,
            UnaryOperator::Not => precedence::NOT,
            UnaryOperator::Clone => precedence::CLONE,
            UnaryOperator::PostIncrement | UnaryOperator::PostDecrement => precedence::POSTFIX,
            UnaryOperator::Negate
            | UnaryOperator::Plus
            | UnaryOperator::BitNot
            | UnaryOperator::Silence
            | UnaryOperator::PreIncrement
            | UnaryOperator::PreDecrement => precedence::UNARY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOperator {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
    Coalesce,
}

impl AssignOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignOperator::Assign => "=",
            AssignOperator::Add => "+=",
            AssignOperator::Sub => "-=",
            AssignOperator::Mul => "*=",
            AssignOperator::Div => "/=",
            AssignOperator::Mod => "%=",
            AssignOperator::Pow => "**=",
            AssignOperator::Concat => ".=",
            AssignOperator::BitAnd => "&=",
            AssignOperator::BitOr => "|=",
            AssignOperator::BitXor => "^=",
            AssignOperator::ShiftLeft => "<<=",
            AssignOperator::ShiftRight => ">>=",
            AssignOperator::Coalesce => "??=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Static,
    Abstract,
    Final,
    Readonly,
    Var,
}

impl Modifier {
    pub fn as_str(self) -> &'static str {
        match self {
            Modifier::Public => "public",
            Modifier::Protected => "protected",
            Modifier::Private => "private",
            Modifier::Static => "static",
            Modifier::Abstract => "abstract",
            Modifier::Final => "final",
            Modifier::Readonly => "readonly",
            Modifier::Var => "var",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Modifier> {
        let modifier = match word.to_ascii_lowercase().as_str() {
            "public" => Modifier::Public,
            "protected" => Modifier::Protected,
            "private" => Modifier::Private,
            "static" => Modifier::Static,
            "abstract" => Modifier::Abstract,
            "final" => Modifier::Final,
            "readonly" => Modifier::Readonly,
            "var" => Modifier::Var,
            _ => return None,
        };
        Some(modifier)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UseKind {
    Class,
    Function,
    Const,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeSeparator {
    Union,
    Intersection,
}

/// How the elements of a child list are separated in source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    /// Statements separated by whitespace only
    Statements,
    /// Class-like members
    Members,
    /// Comma separated elements (arguments, array items, parameters ...)
    Comma,
}

/// A syntax node. Child links are ids into the owning arena.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    // file structure
    File { items: Vec<NodeId> },
    InlineHtml { text: String },
    OpenTag { text: String },
    CloseTag { text: String },

    // statements
    ExpressionStatement { expr: NodeId },
    Echo { values: Vec<NodeId> },
    Return { value: Option<NodeId> },
    If { condition: NodeId, then: NodeId, else_ifs: Vec<NodeId>, otherwise: Option<NodeId> },
    ElseIf { condition: NodeId, body: NodeId },
    Else { body: NodeId },
    While { condition: NodeId, body: NodeId },
    DoWhile { body: NodeId, condition: NodeId },
    For { init: Vec<NodeId>, condition: Vec<NodeId>, step: Vec<NodeId>, body: NodeId },
    Foreach { subject: NodeId, key: Option<NodeId>, by_ref: bool, value: NodeId, body: NodeId },
    Switch { subject: NodeId, cases: Vec<NodeId> },
    Case { test: Option<NodeId>, body: Vec<NodeId> },
    Block { statements: Vec<NodeId> },
    Try { body: NodeId, catches: Vec<NodeId>, finally: Option<NodeId> },
    Catch { types: Vec<NodeId>, var: Option<NodeId>, body: NodeId },
    Finally { body: NodeId },
    Break { level: Option<NodeId> },
    Continue { level: Option<NodeId> },
    Declare { directives: Vec<NodeId> },
    Namespace { name: Option<NodeId>, body: Option<NodeId> },
    /// `prefix` is the shared name of a group use, `use A\{B, C}`
    Use { kind: UseKind, prefix: Option<NodeId>, items: Vec<NodeId> },
    UseItem { name: NodeId, alias: Option<NodeId> },
    /// `static $a = 1, $b;` inside a function
    StaticVar { items: Vec<NodeId> },
    StaticVarItem { var: NodeId, default: Option<NodeId> },
    Global { vars: Vec<NodeId> },
    Goto { label: NodeId },
    Label { name: NodeId },
    Nop,

    // declarations
    ClassDecl {
        modifiers: Vec<Modifier>,
        name: NodeId,
        extends: Option<NodeId>,
        implements: Vec<NodeId>,
        members: Vec<NodeId>,
    },
    InterfaceDecl { name: NodeId, extends: Vec<NodeId>, members: Vec<NodeId> },
    TraitDecl { name: NodeId, members: Vec<NodeId> },
    EnumDecl {
        name: NodeId,
        backing_type: Option<NodeId>,
        implements: Vec<NodeId>,
        members: Vec<NodeId>,
    },
    EnumCase { name: NodeId, value: Option<NodeId> },
    FunctionDecl {
        by_ref: bool,
        name: NodeId,
        params: Vec<NodeId>,
        return_type: Option<NodeId>,
        body: NodeId,
    },
    MethodDecl {
        modifiers: Vec<Modifier>,
        by_ref: bool,
        name: NodeId,
        params: Vec<NodeId>,
        return_type: Option<NodeId>,
        /// `None` for abstract and interface methods
        body: Option<NodeId>,
    },
    Parameter {
        modifiers: Vec<Modifier>,
        type_hint: Option<NodeId>,
        by_ref: bool,
        variadic: bool,
        var: NodeId,
        default: Option<NodeId>,
    },
    PropertyDecl { modifiers: Vec<Modifier>, type_hint: Option<NodeId>, items: Vec<NodeId> },
    PropertyItem { var: NodeId, default: Option<NodeId> },
    ClassConstDecl { modifiers: Vec<Modifier>, items: Vec<NodeId> },
    ConstItem { name: NodeId, value: NodeId },
    TraitUse { traits: Vec<NodeId> },
    Type { nullable: bool, parts: Vec<NodeId>, separator: TypeSeparator },

    // expressions
    Literal { kind: LiteralKind, raw: String },
    Identifier { name: String },
    /// Class, function or constant name, possibly qualified (`\Foo\Bar`)
    Name { name: String },
    /// Variable name without the `$`
    Variable { name: String },
    /// `$$name`, or `${expr}` when braced
    IndirectVariable { expr: NodeId, braced: bool },
    BinaryOp { op: BinaryOperator, left: NodeId, right: NodeId },
    UnaryOp { op: UnaryOperator, operand: NodeId },
    Assign { op: AssignOperator, by_ref: bool, target: NodeId, value: NodeId },
    Ternary { condition: NodeId, then: Option<NodeId>, otherwise: NodeId },
    Call { callee: NodeId, args: Vec<NodeId> },
    MethodCall { object: NodeId, name: NodeId, args: Vec<NodeId>, nullsafe: bool },
    StaticCall { class: NodeId, name: NodeId, args: Vec<NodeId> },
    New { class: NodeId, args: Vec<NodeId> },
    PropertyFetch { object: NodeId, name: NodeId, nullsafe: bool },
    StaticPropertyFetch { class: NodeId, name: NodeId },
    ClassConstFetch { class: NodeId, name: NodeId },
    ConstFetch { name: NodeId },
    Array { items: Vec<NodeId>, short: bool },
    ArrayItem { key: Option<NodeId>, value: NodeId, by_ref: bool, spread: bool },
    Index { array: NodeId, index: Option<NodeId> },
    Parenthesized { expr: NodeId },
    /// Normalized cast type, e.g. `int`
    Cast { cast: String, expr: NodeId },
    Isset { vars: Vec<NodeId> },
    Empty { expr: NodeId },
    Closure {
        is_static: bool,
        by_ref: bool,
        params: Vec<NodeId>,
        uses: Vec<NodeId>,
        return_type: Option<NodeId>,
        body: NodeId,
    },
    ClosureUse { by_ref: bool, var: NodeId },
    ArrowFunction {
        is_static: bool,
        by_ref: bool,
        params: Vec<NodeId>,
        return_type: Option<NodeId>,
        body: NodeId,
    },
    Match { subject: NodeId, arms: Vec<NodeId> },
    /// Empty `conditions` is the `default` arm
    MatchArm { conditions: Vec<NodeId>, body: NodeId },
    Argument { name: Option<NodeId>, value: NodeId, spread: bool },
    /// The `...` of a first-class callable, `strlen(...)`
    CallablePlaceholder,
    /// `yield`, `yield $value` or `yield $key => $value`
    Yield { key: Option<NodeId>, value: Option<NodeId> },
    YieldFrom { expr: NodeId },
    /// `new class(...) extends A implements B { ... }`
    AnonymousClass {
        modifiers: Vec<Modifier>,
        args: Vec<NodeId>,
        extends: Option<NodeId>,
        implements: Vec<NodeId>,
        members: Vec<NodeId>,
    },

    /// Tombstone left in the slot of a deleted node
    Removed,
}

/// The kind of a node, without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    File,
    InlineHtml,
    OpenTag,
    CloseTag,
    ExpressionStatement,
    Echo,
    Return,
    If,
    ElseIf,
    Else,
    While,
    DoWhile,
    For,
    Foreach,
    Switch,
    Case,
    Block,
    Try,
    Catch,
    Finally,
    Break,
    Continue,
    Declare,
    Namespace,
    Use,
    UseItem,
    StaticVar,
    StaticVarItem,
    Global,
    Goto,
    Label,
    Nop,
    ClassDecl,
    InterfaceDecl,
    TraitDecl,
    EnumDecl,
    EnumCase,
    FunctionDecl,
    MethodDecl,
    Parameter,
    PropertyDecl,
    PropertyItem,
    ClassConstDecl,
    ConstItem,
    TraitUse,
    Type,
    Literal,
    Identifier,
    Name,
    Variable,
    IndirectVariable,
    BinaryOp,
    UnaryOp,
    Assign,
    Ternary,
    Call,
    MethodCall,
    StaticCall,
    New,
    PropertyFetch,
    StaticPropertyFetch,
    ClassConstFetch,
    ConstFetch,
    Array,
    ArrayItem,
    Index,
    Parenthesized,
    Cast,
    Isset,
    Empty,
    Closure,
    ClosureUse,
    ArrowFunction,
    Match,
    MatchArm,
    Argument,
    CallablePlaceholder,
    Yield,
    YieldFrom,
    AnonymousClass,
    Removed,
}

impl NodeKind {
    /// Statement-level kinds, the ones that may sit in a statement list
    pub fn is_statement(self) -> bool {
        matches!(
            self,
            NodeKind::InlineHtml
                | NodeKind::OpenTag
                | NodeKind::CloseTag
                | NodeKind::ExpressionStatement
                | NodeKind::Echo
                | NodeKind::Return
                | NodeKind::If
                | NodeKind::While
                | NodeKind::DoWhile
                | NodeKind::For
                | NodeKind::Foreach
                | NodeKind::Switch
                | NodeKind::Block
                | NodeKind::Try
                | NodeKind::Break
                | NodeKind::Continue
                | NodeKind::Declare
                | NodeKind::Namespace
                | NodeKind::Use
                | NodeKind::StaticVar
                | NodeKind::Global
                | NodeKind::Goto
                | NodeKind::Label
                | NodeKind::Nop
                | NodeKind::ClassDecl
                | NodeKind::InterfaceDecl
                | NodeKind::TraitDecl
                | NodeKind::EnumDecl
                | NodeKind::FunctionDecl
                | NodeKind::ClassConstDecl
        )
    }
}

fn push_opt(out: &mut Vec<NodeId>, id: &Option<NodeId>) {
    if let Some(id) = id {
        out.push(*id);
    }
}

fn map_opt(id: &mut Option<NodeId>, f: &mut dyn FnMut(&mut NodeId)) {
    if let Some(id) = id {
        f(id);
    }
}

fn map_all(ids: &mut [NodeId], f: &mut dyn FnMut(&mut NodeId)) {
    for id in ids {
        f(id);
    }
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::File { .. } => NodeKind::File,
            Node::InlineHtml { .. } => NodeKind::InlineHtml,
            Node::OpenTag { .. } => NodeKind::OpenTag,
            Node::CloseTag { .. } => NodeKind::CloseTag,
            Node::ExpressionStatement { .. } => NodeKind::ExpressionStatement,
            Node::Echo { .. } => NodeKind::Echo,
            Node::Return { .. } => NodeKind::Return,
            Node::If { .. } => NodeKind::If,
            Node::ElseIf { .. } => NodeKind::ElseIf,
            Node::Else { .. } => NodeKind::Else,
            Node::While { .. } => NodeKind::While,
            Node::DoWhile { .. } => NodeKind::DoWhile,
            Node::For { .. } => NodeKind::For,
            Node::Foreach { .. } => NodeKind::Foreach,
            Node::Switch { .. } => NodeKind::Switch,
            Node::Case { .. } => NodeKind::Case,
            Node::Block { .. } => NodeKind::Block,
            Node::Try { .. } => NodeKind::Try,
            Node::Catch { .. } => NodeKind::Catch,
            Node::Finally { .. } => NodeKind::Finally,
            Node::Break { .. } => NodeKind::Break,
            Node::Continue { .. } => NodeKind::Continue,
            Node::Declare { .. } => NodeKind::Declare,
            Node::Namespace { .. } => NodeKind::Namespace,
            Node::Use { .. } => NodeKind::Use,
            Node::UseItem { .. } => NodeKind::UseItem,
            Node::StaticVar { .. } => NodeKind::StaticVar,
            Node::StaticVarItem { .. } => NodeKind::StaticVarItem,
            Node::Global { .. } => NodeKind::Global,
            Node::Goto { .. } => NodeKind::Goto,
            Node::Label { .. } => NodeKind::Label,
            Node::Nop => NodeKind::Nop,
            Node::ClassDecl { .. } => NodeKind::ClassDecl,
            Node::InterfaceDecl { .. } => NodeKind::InterfaceDecl,
            Node::TraitDecl { .. } => NodeKind::TraitDecl,
            Node::EnumDecl { .. } => NodeKind::EnumDecl,
            Node::EnumCase { .. } => NodeKind::EnumCase,
            Node::FunctionDecl { .. } => NodeKind::FunctionDecl,
            Node::MethodDecl { .. } => NodeKind::MethodDecl,
            Node::Parameter { .. } => NodeKind::Parameter,
            Node::PropertyDecl { .. } => NodeKind::PropertyDecl,
            Node::PropertyItem { .. } => NodeKind::PropertyItem,
            Node::ClassConstDecl { .. } => NodeKind::ClassConstDecl,
            Node::ConstItem { .. } => NodeKind::ConstItem,
            Node::TraitUse { .. } => NodeKind::TraitUse,
            Node::Type { .. } => NodeKind::Type,
            Node::Literal { .. } => NodeKind::Literal,
            Node::Identifier { .. } => NodeKind::Identifier,
            Node::Name { .. } => NodeKind::Name,
            Node::Variable { .. } => NodeKind::Variable,
            Node::IndirectVariable { .. } => NodeKind::IndirectVariable,
            Node::BinaryOp { .. } => NodeKind::BinaryOp,
            Node::UnaryOp { .. } => NodeKind::UnaryOp,
            Node::Assign { .. } => NodeKind::Assign,
            Node::Ternary { .. } => NodeKind::Ternary,
            Node::Call { .. } => NodeKind::Call,
            Node::MethodCall { .. } => NodeKind::MethodCall,
            Node::StaticCall { .. } => NodeKind::StaticCall,
            Node::New { .. } => NodeKind::New,
            Node::PropertyFetch { .. } => NodeKind::PropertyFetch,
            Node::StaticPropertyFetch { .. } => NodeKind::StaticPropertyFetch,
            Node::ClassConstFetch { .. } => NodeKind::ClassConstFetch,
            Node::ConstFetch { .. } => NodeKind::ConstFetch,
            Node::Array { .. } => NodeKind::Array,
            Node::ArrayItem { .. } => NodeKind::ArrayItem,
            Node::Index { .. } => NodeKind::Index,
            Node::Parenthesized { .. } => NodeKind::Parenthesized,
            Node::Cast { .. } => NodeKind::Cast,
            Node::Isset { .. } => NodeKind::Isset,
            Node::Empty { .. } => NodeKind::Empty,
            Node::Closure { .. } => NodeKind::Closure,
            Node::ClosureUse { .. } => NodeKind::ClosureUse,
            Node::ArrowFunction { .. } => NodeKind::ArrowFunction,
            Node::Match { .. } => NodeKind::Match,
            Node::MatchArm { .. } => NodeKind::MatchArm,
            Node::Argument { .. } => NodeKind::Argument,
            Node::CallablePlaceholder => NodeKind::CallablePlaceholder,
            Node::Yield { .. } => NodeKind::Yield,
            Node::YieldFrom { .. } => NodeKind::YieldFrom,
            Node::AnonymousClass { .. } => NodeKind::AnonymousClass,
            Node::Removed => NodeKind::Removed,
        }
    }

    /// Child ids in source order
    pub fn children(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        match self {
            Node::File { items } => out.extend(items),
            Node::ExpressionStatement { expr } => out.push(*expr),
            Node::Echo { values } => out.extend(values),
            Node::Return { value } => push_opt(&mut out, value),
            Node::If { condition, then, else_ifs, otherwise } => {
                out.push(*condition);
                out.push(*then);
                out.extend(else_ifs);
                push_opt(&mut out, otherwise);
            }
            Node::ElseIf { condition, body } => out.extend([*condition, *body]),
            Node::Else { body } => out.push(*body),
            Node::While { condition, body } => out.extend([*condition, *body]),
            Node::DoWhile { body, condition } => out.extend([*body, *condition]),
            Node::For { init, condition, step, body } => {
                out.extend(init);
                out.extend(condition);
                out.extend(step);
                out.push(*body);
            }
            Node::Foreach { subject, key, value, body, .. } => {
                out.push(*subject);
                push_opt(&mut out, key);
                out.extend([*value, *body]);
            }
            Node::Switch { subject, cases } => {
                out.push(*subject);
                out.extend(cases);
            }
            Node::Case { test, body } => {
                push_opt(&mut out, test);
                out.extend(body);
            }
            Node::Block { statements } => out.extend(statements),
            Node::Try { body, catches, finally } => {
                out.push(*body);
                out.extend(catches);
                push_opt(&mut out, finally);
            }
            Node::Catch { types, var, body } => {
                out.extend(types);
                push_opt(&mut out, var);
                out.push(*body);
            }
            Node::Finally { body } => out.push(*body),
            Node::Break { level } | Node::Continue { level } => push_opt(&mut out, level),
            Node::Declare { directives } => out.extend(directives),
            Node::Namespace { name, body } => {
                push_opt(&mut out, name);
                push_opt(&mut out, body);
            }
            Node::Use { prefix, items, .. } => {
                push_opt(&mut out, prefix);
                out.extend(items);
            }
            Node::UseItem { name, alias } => {
                out.push(*name);
                push_opt(&mut out, alias);
            }
            Node::StaticVar { items } => out.extend(items),
            Node::StaticVarItem { var, default } => {
                out.push(*var);
                push_opt(&mut out, default);
            }
            Node::Global { vars } => out.extend(vars),
            Node::Goto { label } => out.push(*label),
            Node::Label { name } => out.push(*name),
            Node::ClassDecl { name, extends, implements, members, .. } => {
                out.push(*name);
                push_opt(&mut out, extends);
                out.extend(implements);
                out.extend(members);
            }
            Node::InterfaceDecl { name, extends, members } => {
                out.push(*name);
                out.extend(extends);
                out.extend(members);
            }
            Node::TraitDecl { name, members } => {
                out.push(*name);
                out.extend(members);
            }
            Node::EnumDecl { name, backing_type, implements, members } => {
                out.push(*name);
                push_opt(&mut out, backing_type);
                out.extend(implements);
                out.extend(members);
            }
            Node::EnumCase { name, value } => {
                out.push(*name);
                push_opt(&mut out, value);
            }
            Node::FunctionDecl { name, params, return_type, body, .. } => {
                out.push(*name);
                out.extend(params);
                push_opt(&mut out, return_type);
                out.push(*body);
            }
            Node::MethodDecl { name, params, return_type, body, .. } => {
                out.push(*name);
                out.extend(params);
                push_opt(&mut out, return_type);
                push_opt(&mut out, body);
            }
            Node::Parameter { type_hint, var, default, .. } => {
                push_opt(&mut out, type_hint);
                out.push(*var);
                push_opt(&mut out, default);
            }
            Node::PropertyDecl { type_hint, items, .. } => {
                push_opt(&mut out, type_hint);
                out.extend(items);
            }
            Node::PropertyItem { var, default } => {
                out.push(*var);
                push_opt(&mut out, default);
            }
            Node::ClassConstDecl { items, .. } => out.extend(items),
            Node::ConstItem { name, value } => out.extend([*name, *value]),
            Node::TraitUse { traits } => out.extend(traits),
            Node::Type { parts, .. } => out.extend(parts),
            Node::BinaryOp { left, right, .. } => out.extend([*left, *right]),
            Node::UnaryOp { operand, .. } => out.push(*operand),
            Node::Assign { target, value, .. } => out.extend([*target, *value]),
            Node::Ternary { condition, then, otherwise } => {
                out.push(*condition);
                push_opt(&mut out, then);
                out.push(*otherwise);
            }
            Node::Call { callee, args } => {
                out.push(*callee);
                out.extend(args);
            }
            Node::MethodCall { object, name, args, .. } => {
                out.extend([*object, *name]);
                out.extend(args);
            }
            Node::StaticCall { class, name, args } => {
                out.extend([*class, *name]);
                out.extend(args);
            }
            Node::New { class, args } => {
                out.push(*class);
                out.extend(args);
            }
            Node::PropertyFetch { object, name, .. } => out.extend([*object, *name]),
            Node::StaticPropertyFetch { class, name } => out.extend([*class, *name]),
            Node::ClassConstFetch { class, name } => out.extend([*class, *name]),
            Node::ConstFetch { name } => out.push(*name),
            Node::Array { items, .. } => out.extend(items),
            Node::ArrayItem { key, value, .. } => {
                push_opt(&mut out, key);
                out.push(*value);
            }
            Node::Index { array, index } => {
                out.push(*array);
                push_opt(&mut out, index);
            }
            Node::Parenthesized { expr } => out.push(*expr),
            Node::Cast { expr, .. } => out.push(*expr),
            Node::Isset { vars } => out.extend(vars),
            Node::Empty { expr } => out.push(*expr),
            Node::Closure { params, uses, return_type, body, .. } => {
                out.extend(params);
                out.extend(uses);
                push_opt(&mut out, return_type);
                out.push(*body);
            }
            Node::ClosureUse { var, .. } => out.push(*var),
            Node::ArrowFunction { params, return_type, body, .. } => {
                out.extend(params);
                push_opt(&mut out, return_type);
                out.push(*body);
            }
            Node::Match { subject, arms } => {
                out.push(*subject);
                out.extend(arms);
            }
            Node::MatchArm { conditions, body } => {
                out.extend(conditions);
                out.push(*body);
            }
            Node::Argument { name, value, .. } => {
                push_opt(&mut out, name);
                out.push(*value);
            }
            Node::IndirectVariable { expr, .. } | Node::YieldFrom { expr } => out.push(*expr),
            Node::Yield { key, value } => {
                push_opt(&mut out, key);
                push_opt(&mut out, value);
            }
            Node::AnonymousClass { args, extends, implements, members, .. } => {
                out.extend(args);
                push_opt(&mut out, extends);
                out.extend(implements);
                out.extend(members);
            }
            Node::InlineHtml { .. }
            | Node::OpenTag { .. }
            | Node::CloseTag { .. }
            | Node::Nop
            | Node::Literal { .. }
            | Node::Identifier { .. }
            | Node::Name { .. }
            | Node::Variable { .. }
            | Node::CallablePlaceholder
            | Node::Removed => {}
        }
        out
    }

    /// Visit every child id mutably, in source order
    pub fn for_each_child_mut(&mut self, f: &mut dyn FnMut(&mut NodeId)) {
        match self {
            Node::File { items } => map_all(items, f),
            Node::ExpressionStatement { expr } => f(expr),
            Node::Echo { values } => map_all(values, f),
            Node::Return { value } => map_opt(value, f),
            Node::If { condition, then, else_ifs, otherwise } => {
                f(condition);
                f(then);
                map_all(else_ifs, f);
                map_opt(otherwise, f);
            }
            Node::ElseIf { condition, body } | Node::While { condition, body } => {
                f(condition);
                f(body);
            }
            Node::Else { body } | Node::Finally { body } => f(body),
            Node::DoWhile { body, condition } => {
                f(body);
                f(condition);
            }
            Node::For { init, condition, step, body } => {
                map_all(init, f);
                map_all(condition, f);
                map_all(step, f);
                f(body);
            }
            Node::Foreach { subject, key, value, body, .. } => {
                f(subject);
                map_opt(key, f);
                f(value);
                f(body);
            }
            Node::Switch { subject, cases } => {
                f(subject);
                map_all(cases, f);
            }
            Node::Case { test, body } => {
                map_opt(test, f);
                map_all(body, f);
            }
            Node::Block { statements } => map_all(statements, f),
            Node::Try { body, catches, finally } => {
                f(body);
                map_all(catches, f);
                map_opt(finally, f);
            }
            Node::Catch { types, var, body } => {
                map_all(types, f);
                map_opt(var, f);
                f(body);
            }
            Node::Break { level } | Node::Continue { level } => map_opt(level, f),
            Node::Declare { directives } => map_all(directives, f),
            Node::Namespace { name, body } => {
                map_opt(name, f);
                map_opt(body, f);
            }
            Node::Use { prefix, items, .. } => {
                map_opt(prefix, f);
                map_all(items, f);
            }
            Node::UseItem { name, alias } => {
                f(name);
                map_opt(alias, f);
            }
            Node::StaticVar { items } => map_all(items, f),
            Node::StaticVarItem { var, default } => {
                f(var);
                map_opt(default, f);
            }
            Node::Global { vars } => map_all(vars, f),
            Node::Goto { label } => f(label),
            Node::Label { name } => f(name),
            Node::ClassDecl { name, extends, implements, members, .. } => {
                f(name);
                map_opt(extends, f);
                map_all(implements, f);
                map_all(members, f);
            }
            Node::InterfaceDecl { name, extends, members } => {
                f(name);
                map_all(extends, f);
                map_all(members, f);
            }
            Node::TraitDecl { name, members } => {
                f(name);
                map_all(members, f);
            }
            Node::EnumDecl { name, backing_type, implements, members } => {
                f(name);
                map_opt(backing_type, f);
                map_all(implements, f);
                map_all(members, f);
            }
            Node::EnumCase { name, value } => {
                f(name);
                map_opt(value, f);
            }
            Node::FunctionDecl { name, params, return_type, body, .. } => {
                f(name);
                map_all(params, f);
                map_opt(return_type, f);
                f(body);
            }
            Node::MethodDecl { name, params, return_type, body, .. } => {
                f(name);
                map_all(params, f);
                map_opt(return_type, f);
                map_opt(body, f);
            }
            Node::Parameter { type_hint, var, default, .. } => {
                map_opt(type_hint, f);
                f(var);
                map_opt(default, f);
            }
            Node::PropertyDecl { type_hint, items, .. } => {
                map_opt(type_hint, f);
                map_all(items, f);
            }
            Node::PropertyItem { var, default } => {
                f(var);
                map_opt(default, f);
            }
            Node::ClassConstDecl { items, .. } => map_all(items, f),
            Node::ConstItem { name, value } => {
                f(name);
                f(value);
            }
            Node::TraitUse { traits } => map_all(traits, f),
            Node::Type { parts, .. } => map_all(parts, f),
            Node::BinaryOp { left, right, .. } => {
                f(left);
                f(right);
            }
            Node::UnaryOp { operand, .. } => f(operand),
            Node::Assign { target, value, .. } => {
                f(target);
                f(value);
            }
            Node::Ternary { condition, then, otherwise } => {
                f(condition);
                map_opt(then, f);
                f(otherwise);
            }
            Node::Call { callee, args } => {
                f(callee);
                map_all(args, f);
            }
            Node::MethodCall { object, name, args, .. } => {
                f(object);
                f(name);
                map_all(args, f);
            }
            Node::StaticCall { class, name, args } => {
                f(class);
                f(name);
                map_all(args, f);
            }
            Node::New { class, args } => {
                f(class);
                map_all(args, f);
            }
            Node::PropertyFetch { object, name, .. } => {
                f(object);
                f(name);
            }
            Node::StaticPropertyFetch { class, name } | Node::ClassConstFetch { class, name } => {
                f(class);
                f(name);
            }
            Node::ConstFetch { name } => f(name),
            Node::Array { items, .. } => map_all(items, f),
            Node::ArrayItem { key, value, .. } => {
                map_opt(key, f);
                f(value);
            }
            Node::Index { array, index } => {
                f(array);
                map_opt(index, f);
            }
            Node::Parenthesized { expr } | Node::Cast { expr, .. } | Node::Empty { expr } => f(expr),
            Node::Isset { vars } => map_all(vars, f),
            Node::Closure { params, uses, return_type, body, .. } => {
                map_all(params, f);
                map_all(uses, f);
                map_opt(return_type, f);
                f(body);
            }
            Node::ClosureUse { var, .. } => f(var),
            Node::ArrowFunction { params, return_type, body, .. } => {
                map_all(params, f);
                map_opt(return_type, f);
                f(body);
            }
            Node::Match { subject, arms } => {
                f(subject);
                map_all(arms, f);
            }
            Node::MatchArm { conditions, body } => {
                map_all(conditions, f);
                f(body);
            }
            Node::Argument { name, value, .. } => {
                map_opt(name, f);
                f(value);
            }
            Node::IndirectVariable { expr, .. } | Node::YieldFrom { expr } => f(expr),
            Node::Yield { key, value } => {
                map_opt(key, f);
                map_opt(value, f);
            }
            Node::AnonymousClass { args, extends, implements, members, .. } => {
                map_all(args, f);
                map_opt(extends, f);
                map_all(implements, f);
                map_all(members, f);
            }
            Node::InlineHtml { .. }
            | Node::OpenTag { .. }
            | Node::CloseTag { .. }
            | Node::Nop
            | Node::Literal { .. }
            | Node::Identifier { .. }
            | Node::Name { .. }
            | Node::Variable { .. }
            | Node::CallablePlaceholder
            | Node::Removed => {}
        }
    }

    /// The child lists of this node whose elements may be deleted or
    /// expanded, with how their elements are separated
    pub fn lists(&self) -> Vec<(ListKind, &[NodeId])> {
        match self {
            Node::File { items } => vec![(ListKind::Statements, items.as_slice())],
            Node::Block { statements } => vec![(ListKind::Statements, statements.as_slice())],
            Node::Case { body, .. } => vec![(ListKind::Statements, body.as_slice())],
            Node::Switch { cases, .. } => vec![(ListKind::Statements, cases.as_slice())],
            Node::If { else_ifs, .. } => vec![(ListKind::Statements, else_ifs.as_slice())],
            Node::Try { catches, .. } => vec![(ListKind::Statements, catches.as_slice())],
            Node::ClassDecl { implements, members, .. } => vec![
                (ListKind::Comma, implements.as_slice()),
                (ListKind::Members, members.as_slice()),
            ],
            Node::InterfaceDecl { extends, members, .. } => vec![
                (ListKind::Comma, extends.as_slice()),
                (ListKind::Members, members.as_slice()),
            ],
            Node::TraitDecl { members, .. } => vec![(ListKind::Members, members.as_slice())],
            Node::EnumDecl { implements, members, .. } => vec![
                (ListKind::Comma, implements.as_slice()),
                (ListKind::Members, members.as_slice()),
            ],
            Node::AnonymousClass { args, implements, members, .. } => vec![
                (ListKind::Comma, args.as_slice()),
                (ListKind::Comma, implements.as_slice()),
                (ListKind::Members, members.as_slice()),
            ],
            Node::StaticVar { items } => vec![(ListKind::Comma, items.as_slice())],
            Node::Global { vars } => vec![(ListKind::Comma, vars.as_slice())],
            Node::Echo { values } => vec![(ListKind::Comma, values.as_slice())],
            Node::For { init, condition, step, .. } => vec![
                (ListKind::Comma, init.as_slice()),
                (ListKind::Comma, condition.as_slice()),
                (ListKind::Comma, step.as_slice()),
            ],
            Node::Declare { directives } => vec![(ListKind::Comma, directives.as_slice())],
            Node::Use { items, .. } => vec![(ListKind::Comma, items.as_slice())],
            Node::FunctionDecl { params, .. }
            | Node::MethodDecl { params, .. }
            | Node::ArrowFunction { params, .. } => vec![(ListKind::Comma, params.as_slice())],
            Node::Closure { params, uses, .. } => vec![
                (ListKind::Comma, params.as_slice()),
                (ListKind::Comma, uses.as_slice()),
            ],
            Node::PropertyDecl { items, .. } | Node::ClassConstDecl { items, .. } => {
                vec![(ListKind::Comma, items.as_slice())]
            }
            Node::TraitUse { traits } => vec![(ListKind::Comma, traits.as_slice())],
            Node::Call { args, .. }
            | Node::MethodCall { args, .. }
            | Node::StaticCall { args, .. }
            | Node::New { args, .. } => vec![(ListKind::Comma, args.as_slice())],
            Node::Array { items, .. } => vec![(ListKind::Comma, items.as_slice())],
            Node::Isset { vars } => vec![(ListKind::Comma, vars.as_slice())],
            Node::Match { arms, .. } => vec![(ListKind::Comma, arms.as_slice())],
            Node::MatchArm { conditions, .. } => vec![(ListKind::Comma, conditions.as_slice())],
            _ => Vec::new(),
        }
    }

    /// The list containing `child`, if any
    pub fn list_kind_of(&self, child: NodeId) -> Option<ListKind> {
        self.lists()
            .into_iter()
            .find(|(_, list)| list.contains(&child))
            .map(|(kind, _)| kind)
    }

    /// Replace `old` with `new`. Several replacements are only allowed in a
    /// statement or member list. Returns false when `old` is not a child or
    /// the shape does not fit.
    pub(crate) fn replace_child(&mut self, old: NodeId, new: &[NodeId]) -> bool {
        match self.list_kind_of(old) {
            Some(ListKind::Statements | ListKind::Members) => {}
            Some(ListKind::Comma) | None if new.len() == 1 => {}
            _ => return false,
        }

        if new.len() == 1 {
            let mut found = false;
            self.for_each_child_mut(&mut |child| {
                if *child == old {
                    *child = new[0];
                    found = true;
                }
            });
            return found;
        }

        for list in self.lists_mut() {
            if let Some(position) = list.iter().position(|c| *c == old) {
                list.splice(position..=position, new.iter().copied());
                return true;
            }
        }
        false
    }

    /// The statement and member lists, the ones that may grow
    pub(crate) fn lists_mut(&mut self) -> Vec<&mut Vec<NodeId>> {
        match self {
            Node::File { items } => vec![items],
            Node::Block { statements } => vec![statements],
            Node::Case { body, .. } => vec![body],
            Node::Switch { cases, .. } => vec![cases],
            Node::If { else_ifs, .. } => vec![else_ifs],
            Node::Try { catches, .. } => vec![catches],
            Node::ClassDecl { members, .. }
            | Node::InterfaceDecl { members, .. }
            | Node::TraitDecl { members, .. }
            | Node::EnumDecl { members, .. }
            | Node::AnonymousClass { members, .. } => vec![members],
            _ => Vec::new(),
        }
    }

    /// Binding strength of this node as an expression operand. Statements and
    /// other non-expressions bind like atoms.
    pub fn precedence(&self) -> u8 {
        match self {
            Node::BinaryOp { op, .. } => op.precedence(),
            Node::UnaryOp { op, .. } => op.operand_precedence(),
            Node::Cast { .. } => precedence::UNARY,
            Node::Assign { .. }
            | Node::Yield { .. }
            | Node::YieldFrom { .. }
            | Node::ArrowFunction { .. } => precedence::ASSIGN,
            Node::Ternary { .. } => precedence::TERNARY,
            Node::New { .. } | Node::AnonymousClass { .. } | Node::Closure { .. } => {
                precedence::CLONE
            }
            Node::Literal { raw, .. } if raw.starts_with('-') || raw.starts_with('+') => {
                precedence::UNARY
            }
            Node::Call { .. }
            | Node::MethodCall { .. }
            | Node::StaticCall { .. }
            | Node::PropertyFetch { .. }
            | Node::StaticPropertyFetch { .. }
            | Node::ClassConstFetch { .. }
            | Node::Index { .. }
            | Node::Array { .. }
            | Node::Isset { .. }
            | Node::Empty { .. }
            | Node::Match { .. } => precedence::POSTFIX,
            _ => precedence::ATOM,
        }
    }

    /// Minimum binding strength `child` needs in its position under this
    /// node to be printed without parentheses
    pub fn operand_precedence(&self, child: NodeId) -> u8 {
        match self {
            Node::BinaryOp { op, left, .. } => {
                let (left_min, right_min) = op.operand_precedence();
                if child == *left {
                    left_min
                } else {
                    right_min
                }
            }
            Node::UnaryOp { op, .. } => op.operand_precedence(),
            Node::Cast { .. } => precedence::UNARY,
            Node::Assign { target, .. } if child == *target => precedence::POSTFIX,
            Node::Assign { .. } => precedence::ASSIGN,
            Node::Ternary { then, .. } if Some(child) == *then => precedence::LOWEST,
            Node::Ternary { .. } => precedence::TERNARY + 1,
            Node::Yield { .. } | Node::YieldFrom { .. } => precedence::ASSIGN,
            Node::Call { callee: object, .. }
            | Node::MethodCall { object, .. }
            | Node::PropertyFetch { object, .. }
            | Node::Index { array: object, .. }
            | Node::StaticCall { class: object, .. }
            | Node::StaticPropertyFetch { class: object, .. }
            | Node::ClassConstFetch { class: object, .. }
                if child == *object =>
            {
                precedence::POSTFIX
            }
            Node::New { class, .. } if child == *class => precedence::ATOM,
            _ => precedence::LOWEST,
        }
    }

    /// Copy of this node with every child id zeroed, for shape comparison
    pub(crate) fn shape(&self) -> Node {
        let mut shape = self.clone();
        shape.for_each_child_mut(&mut |child| *child = NodeId(0));
        shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operand_precedence() {
        let sub = Node::BinaryOp {
            op: BinaryOperator::Sub,
            left: NodeId(1),
            right: NodeId(2),
        };
        let mul = Node::BinaryOp {
            op: BinaryOperator::Mul,
            left: NodeId(3),
            right: NodeId(4),
        };
        // `$a * (3 - 1)` needs its parentheses, `$a * 3 - 1` does not
        assert!(sub.precedence() < mul.operand_precedence(NodeId(4)));
        assert!(mul.precedence() >= sub.operand_precedence(NodeId(1)));
        // left associative: `1 - (2 - 3)` but `(1 - 2) - 3` == `1 - 2 - 3`
        assert!(sub.precedence() < sub.operand_precedence(NodeId(2)));
        assert!(sub.precedence() >= sub.operand_precedence(NodeId(1)));

        let coalesce = BinaryOperator::Coalesce;
        assert!(coalesce.is_right_associative());
        assert_eq!(coalesce.operand_precedence(), (precedence::COALESCE + 1, precedence::COALESCE));
        assert!(BinaryOperator::Identical.is_non_associative());

        let call = Node::MethodCall {
            object: NodeId(5),
            name: NodeId(6),
            args: Vec::new(),
            nullsafe: false,
        };
        let new = Node::New {
            class: NodeId(7),
            args: Vec::new(),
        };
        assert!(new.precedence() < call.operand_precedence(NodeId(5)));
        assert_eq!(call.operand_precedence(NodeId(6)), precedence::LOWEST);
    }

    #[test]
    fn test_children_in_source_order() {
        let node = Node::MethodCall {
            object: NodeId(1),
            name: NodeId(2),
            args: vec![NodeId(3), NodeId(4)],
            nullsafe: false,
        };
        assert_eq!(node.children(), vec![NodeId(1), NodeId(2), NodeId(3), NodeId(4)]);
        assert_eq!(node.kind(), NodeKind::MethodCall);
    }

    #[test]
    fn test_replace_single_child() {
        let mut node = Node::BinaryOp {
            op: BinaryOperator::Identical,
            left: NodeId(1),
            right: NodeId(2),
        };
        assert!(node.replace_child(NodeId(2), &[NodeId(7)]));
        assert_eq!(node.children(), vec![NodeId(1), NodeId(7)]);
        assert!(!node.replace_child(NodeId(1), &[NodeId(8), NodeId(9)]));
    }

    #[test]
    fn test_expand_statement() {
        let mut node = Node::Block {
            statements: vec![NodeId(1), NodeId(2), NodeId(3)],
        };
        assert!(node.replace_child(NodeId(2), &[NodeId(5), NodeId(6)]));
        assert_eq!(
            node.children(),
            vec![NodeId(1), NodeId(5), NodeId(6), NodeId(3)]
        );
    }

    #[test]
    fn test_shape_ignores_ids() {
        let a = Node::Call { callee: NodeId(1), args: vec![NodeId(2)] };
        let b = Node::Call { callee: NodeId(9), args: vec![NodeId(4)] };
        let c = Node::Call { callee: NodeId(9), args: vec![] };
        assert_eq!(a.shape(), b.shape());
        assert_ne!(a.shape(), c.shape());
    }

    #[test]
    fn test_operator_text() {
        assert_eq!(BinaryOperator::Identical.as_str(), "===");
        assert!(UnaryOperator::Clone.is_keyword());
        assert!(!UnaryOperator::Not.is_keyword());
        assert!(UnaryOperator::PostIncrement.is_postfix());
    }
}

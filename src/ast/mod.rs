//! Abstract syntax tree (component 4.D), the parser's output and the
//! binder's input. Mirrors Cypher structure directly; no desugaring happens
//! at this layer.

use crate::value::Scalar;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    RegularQuery(RegularQuery),
    CreateTable(CreateTableStatement),
    CopyFrom(CopyFromStatement),
    Drop(DropStatement),
    CommentOn(CommentOnStatement),
    InstallExtension(String),
    UninstallExtension(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegularQuery {
    pub queries: Vec<SingleQuery>,
    /// `true` between `queries[i]` and `queries[i+1]` means `UNION ALL`,
    /// `false` means `UNION` (distinct).
    pub union_all: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SingleQuery {
    pub parts: Vec<QueryPart>,
    pub final_reading_clauses: Vec<ReadingClause>,
    pub updating_clauses: Vec<UpdatingClause>,
    pub return_clause: Option<ReturnClause>,
}

/// `SET`/`DELETE`/`CREATE` applied after the final MATCH, before RETURN.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdatingClause {
    Set(Vec<SetItem>),
    Delete { detach: bool, expressions: Vec<Expression> },
    Create(Vec<PatternElement>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetItem {
    pub target: Expression,
    pub value: Expression,
}

/// A `WITH`-delimited segment: zero or more reading clauses followed by the
/// `WITH` projection that re-scopes subsequent parts.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPart {
    pub reading_clauses: Vec<ReadingClause>,
    pub with_clause: WithClause,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReadingClause {
    Match(MatchClause),
    Unwind(UnwindClause),
    LoadCsv(LoadCsvClause),
    Call(CallClause),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchClause {
    pub optional: bool,
    pub pattern: Vec<PatternElement>,
    pub where_clause: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnwindClause {
    pub expression: Expression,
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadCsvClause {
    pub file_path: String,
    pub alias: String,
    pub has_header: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallClause {
    pub function_name: String,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithClause {
    pub projections: Vec<ProjectionItem>,
    pub where_clause: Option<Expression>,
    pub order_by: Vec<OrderByItem>,
    pub skip: Option<Expression>,
    pub limit: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnClause {
    pub distinct: bool,
    pub projections: Vec<ProjectionItem>,
    pub order_by: Vec<OrderByItem>,
    pub skip: Option<Expression>,
    pub limit: Option<Expression>,
}

/// `expr AS alias`, or a bare `*` expanding to every in-scope variable.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionItem {
    Star,
    Expr { expression: Expression, alias: Option<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    pub expression: Expression,
    pub ascending: bool,
}

/// A chain of `NodePattern (RelPattern NodePattern)*`.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternElement {
    pub first_node: NodePattern,
    pub chain: Vec<(RelPattern, NodePattern)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodePattern {
    pub variable: Option<String>,
    pub labels: Vec<String>,
    pub properties: Vec<(String, Expression)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowDirection {
    Left,
    Right,
    Undirected,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelPattern {
    pub variable: Option<String>,
    pub labels: Vec<String>,
    pub direction: ArrowDirection,
    pub properties: Vec<(String, Expression)>,
    /// `*lo..hi` variable-length bounds, if present.
    pub variable_length: Option<(u32, Option<u32>)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    pub table_name: String,
    pub kind: CreateTableKind,
    pub if_not_exists: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CreateTableKind {
    Node { properties: Vec<PropertyDef>, primary_key: String },
    Rel { src_table: String, dst_table: String, multiplicity: String, properties: Vec<PropertyDef> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDef {
    pub name: String,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CopyFromStatement {
    pub table_name: String,
    pub file_pattern: String,
    pub options: Vec<(String, Expression)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DropStatement {
    Table(String),
    Sequence(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentOnStatement {
    pub table_name: String,
    pub comment: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Xor,
    StartsWith,
    EndsWith,
    Contains,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Scalar),
    Variable(String),
    Property { base: Box<Expression>, property: String },
    Binary { op: BinaryOp, left: Box<Expression>, right: Box<Expression> },
    Unary { op: UnaryOp, operand: Box<Expression> },
    IsNull { operand: Box<Expression>, negated: bool },
    FunctionCall { name: String, distinct: bool, arguments: Vec<Expression> },
    Case {
        operand: Option<Box<Expression>>,
        branches: Vec<(Expression, Expression)>,
        else_branch: Option<Box<Expression>>,
    },
    ExistentialSubquery(Box<MatchClause>),
    ListLiteral(Vec<Expression>),
    Parameter(String),
}

impl Expression {
    pub fn as_variable(&self) -> Option<&str> {
        match self {
            Expression::Variable(v) => Some(v),
            _ => None,
        }
    }

    /// Whether this expression's root node is an aggregation call
    /// (`COUNT`/`SUM`/`AVG`/`MIN`/`MAX`/`COLLECT`). Used to enforce the
    /// aggregation-at-root-of-projection-tree binding rule.
    pub fn is_aggregation_call(&self) -> bool {
        matches!(
            self,
            Expression::FunctionCall { name, .. }
                if matches!(
                    name.to_ascii_uppercase().as_str(),
                    "COUNT" | "SUM" | "AVG" | "MIN" | "MAX" | "COLLECT"
                )
        )
    }
}

use super::value::Value;

/// Parsed binding expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Constant value
    Literal(Value),

    /// Free variable, resolved against the scope and then the globals
    Ident(String),

    /// `object.property` or `object?.property`
    Member {
        object: Box<Expr>,
        property: String,
        optional: bool,
    },

    /// `object[index]` or `object?.[index]`
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        optional: bool,
    },

    /// Function or method call
    Call { callee: Box<Expr>, args: Vec<Expr> },

    Unary(UnaryOp, Box<Expr>),

    Binary(BinaryOp, Box<Expr>, Box<Expr>),

    /// Short-circuiting operators
    Logical(LogicalOp, Box<Expr>, Box<Expr>),

    /// `test ? consequent : alternate`
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },

    Array(Vec<Expr>),

    /// Object literal, entries in source order
    Object(Vec<(String, Expr)>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    Typeof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    StrictEq,
    StrictNe,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Coalesce,
}

impl Expr {
    /// The identifier path of a plain `a.b.c` chain
    pub fn as_path(&self) -> Option<String> {
        match self {
            Expr::Ident(name) => Some(name.clone()),
            Expr::Member {
                object,
                property,
                optional: false,
            } => object.as_path().map(|base| format!("{}.{}", base, property)),
            _ => None,
        }
    }
}

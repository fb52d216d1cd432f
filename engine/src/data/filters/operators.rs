//! Field operators accepted inside an operator map

/// Comparison operator applied to a single column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    ILike,
    Contains,
    In,
    NotIn,
    IsNull,
    IsNotNull,
    Between,
    NotBetween,
    IsEmpty,
    IsNotEmpty,
}

/// How an operator consumes its operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Operand is ignored
    Nullary,
    /// Operand is bound as one parameter
    Unary,
    /// Operand is bound as one parameter and spread as a list
    List,
    /// First two elements of the operand are bound separately
    Pair,
}

impl Operator {
    /// Look up an operator by its filter name. Unknown names return `None`
    /// and are skipped by the compiler.
    pub fn parse(name: &str) -> Option<Self> {
        let op = match name {
            "eq" => Self::Eq,
            "ne" => Self::Ne,
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "like" => Self::Like,
            "ilike" => Self::ILike,
            "contains" => Self::Contains,
            "in" => Self::In,
            "notIn" => Self::NotIn,
            "isNull" => Self::IsNull,
            "isNotNull" => Self::IsNotNull,
            "between" => Self::Between,
            "notBetween" => Self::NotBetween,
            "isEmpty" => Self::IsEmpty,
            "isNotEmpty" => Self::IsNotEmpty,
            _ => return None,
        };
        Some(op)
    }

    /// SQL operator text. Empty for operators with a custom template.
    pub fn sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Like => "LIKE",
            Self::ILike => "ILIKE",
            Self::Contains => "@>",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
            Self::Between => "BETWEEN",
            Self::NotBetween => "NOT BETWEEN",
            Self::IsEmpty | Self::IsNotEmpty => "",
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Self::IsNull | Self::IsNotNull | Self::IsEmpty | Self::IsNotEmpty => Arity::Nullary,
            Self::In | Self::NotIn => Arity::List,
            Self::Between | Self::NotBetween => Arity::Pair,
            _ => Arity::Unary,
        }
    }
}

use std::fmt::Display;
use std::rc::Rc;

use crate::decimal::Decimal;
use crate::token::Token;

#[derive(Debug, PartialEq, Clone)]
pub struct Program {
    pub statements: Vec<Statement>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Block {
    pub token: Token,
    pub statements: Vec<Statement>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Identifier {
    pub token: Token,
    pub name: Rc<str>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Statement {
    Expression(Expression),
    Return(ReturnStatement),
    Assign(AssignStatement),
    Compound(CompoundStatement),
    Break(Token),
    Continue(Token),
}

#[derive(Debug, PartialEq, Clone)]
pub struct ReturnStatement {
    pub token: Token,
    pub value: Option<Expression>,
}

/// `name := value` declares in the current scope, `target = value` updates.
#[derive(Debug, PartialEq, Clone)]
pub struct AssignStatement {
    pub token: Token,
    pub target: AssignTarget,
    pub declare: bool,
    pub value: Expression,
}

/// `target += value` and friends.
#[derive(Debug, PartialEq, Clone)]
pub struct CompoundStatement {
    pub token: Token,
    pub operator: InfixOperationKind,
    pub target: AssignTarget,
    pub value: Expression,
}

#[derive(Debug, PartialEq, Clone)]
pub enum AssignTarget {
    Identifier(Identifier),
    Index(IndexExpression),
    Property(PropertyExpression),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PrefixOperationKind {
    Bang,
    Minus,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum InfixOperationKind {
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    And,
    Or,
    Range,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PostfixOperationKind {
    Increment,
    Decrement,
}

#[derive(Debug, PartialEq, Clone)]
pub struct IndexExpression {
    pub token: Token,
    pub left: Box<Expression>,
    pub index: Box<Expression>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct PropertyExpression {
    pub token: Token,
    pub receiver: Box<Expression>,
    pub name: Identifier,
}

#[derive(Debug, PartialEq, Clone)]
pub struct FunctionLiteral {
    pub token: Token,
    pub name: Option<Identifier>,
    pub parameters: Vec<Identifier>,
    /// Default value expressions, in parameter order.
    pub defaults: Vec<(Identifier, Expression)>,
    pub body: Block,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ForExpression {
    pub token: Token,
    pub identifier: Identifier,
    pub initial: Expression,
    pub condition: Expression,
    pub increment: Statement,
    pub body: Block,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ForInExpression {
    pub token: Token,
    pub key: Option<Identifier>,
    pub value: Identifier,
    pub iterable: Expression,
    pub body: Block,
}

#[derive(Debug, PartialEq, Clone)]
pub struct SwitchCase {
    pub token: Token,
    pub values: Vec<Expression>,
    pub default: bool,
    pub body: Block,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ClassLiteral {
    pub token: Token,
    pub name: Identifier,
    pub super_class: Option<Identifier>,
    pub body: Block,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    Identifier(Identifier),
    NumberLiteral {
        token: Token,
        value: Decimal,
    },
    StringLiteral {
        token: Token,
        value: Rc<str>,
    },
    BooleanLiteral {
        token: Token,
        value: bool,
    },
    NullLiteral(Token),
    ListLiteral {
        token: Token,
        elements: Vec<Expression>,
    },
    MapLiteral {
        token: Token,
        pairs: Vec<(Expression, Expression)>,
    },
    PrefixOperation {
        token: Token,
        kind: PrefixOperationKind,
        right: Box<Expression>,
    },
    InfixOperation {
        token: Token,
        kind: InfixOperationKind,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    PostfixOperation {
        token: Token,
        kind: PostfixOperationKind,
        target: Identifier,
    },
    If {
        token: Token,
        condition: Box<Expression>,
        consequence: Block,
        alternative: Option<Block>,
    },
    While {
        token: Token,
        condition: Box<Expression>,
        body: Block,
    },
    For(Box<ForExpression>),
    ForIn(Box<ForInExpression>),
    Switch {
        token: Token,
        value: Box<Expression>,
        cases: Vec<SwitchCase>,
    },
    Ternary {
        token: Token,
        condition: Box<Expression>,
        consequence: Box<Expression>,
        alternative: Box<Expression>,
    },
    Function(Rc<FunctionLiteral>),
    Call {
        token: Token,
        function: Box<Expression>,
        arguments: Vec<Expression>,
    },
    Method {
        token: Token,
        receiver: Box<Expression>,
        name: Identifier,
        arguments: Vec<Expression>,
    },
    Property(PropertyExpression),
    Index(IndexExpression),
    Class(Box<ClassLiteral>),
    Trait {
        token: Token,
        name: Identifier,
        body: Block,
    },
    Use {
        token: Token,
        traits: Vec<Identifier>,
    },
    Import {
        token: Token,
        path: Box<Expression>,
    },
    This(Token),
}

impl Expression {
    /// The token the expression was parsed from, used for error positions.
    pub fn token(&self) -> &Token {
        use Expression::*;
        match self {
            Identifier(identifier) => &identifier.token,
            NumberLiteral { token, .. }
            | StringLiteral { token, .. }
            | BooleanLiteral { token, .. }
            | NullLiteral(token)
            | ListLiteral { token, .. }
            | MapLiteral { token, .. }
            | PrefixOperation { token, .. }
            | InfixOperation { token, .. }
            | PostfixOperation { token, .. }
            | If { token, .. }
            | While { token, .. }
            | Switch { token, .. }
            | Ternary { token, .. }
            | Call { token, .. }
            | Method { token, .. }
            | Trait { token, .. }
            | Use { token, .. }
            | Import { token, .. }
            | This(token) => token,
            For(expression) => &expression.token,
            ForIn(expression) => &expression.token,
            Function(function) => &function.token,
            Property(property) => &property.token,
            Index(index) => &index.token,
            Class(class) => &class.token,
        }
    }
}

fn write_separated<T: Display>(
    f: &mut std::fmt::Formatter<'_>,
    items: impl IntoIterator<Item = T>,
    separator: &str,
) -> std::fmt::Result {
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            write!(f, "{}", separator)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl Display for PrefixOperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrefixOperationKind::Bang => write!(f, "!"),
            PrefixOperationKind::Minus => write!(f, "-"),
        }
    }
}

impl Display for InfixOperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use InfixOperationKind::*;
        let symbol = match self {
            Plus => "+",
            Minus => "-",
            Multiply => "*",
            Divide => "/",
            Modulo => "%",
            Equal => "==",
            NotEqual => "!=",
            LessThan => "<",
            LessThanOrEqual => "<=",
            GreaterThan => ">",
            GreaterThanOrEqual => ">=",
            And => "and",
            Or => "or",
            Range => "..",
        };
        write!(f, "{}", symbol)
    }
}

impl Display for PostfixOperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostfixOperationKind::Increment => write!(f, "++"),
            PostfixOperationKind::Decrement => write!(f, "--"),
        }
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        write_separated(
            f,
            self.statements.iter().map(|statement| format!("{};", statement)),
            " ",
        )?;
        write!(f, "}}")
    }
}

impl Display for AssignTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssignTarget::Identifier(identifier) => write!(f, "{}", identifier),
            AssignTarget::Index(index) => write!(f, "{}[{}]", index.left, index.index),
            AssignTarget::Property(property) => {
                write!(f, "{}.{}", property.receiver, property.name)
            }
        }
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Statement::*;
        match self {
            Expression(expression) => write!(f, "{}", expression),
            Return(ReturnStatement { value: Some(value), .. }) => write!(f, "return {}", value),
            Return(ReturnStatement { value: None, .. }) => write!(f, "return"),
            Assign(assign) => {
                let operator = if assign.declare { ":=" } else { "=" };
                write!(f, "{} {} {}", assign.target, operator, assign.value)
            }
            Compound(compound) => write!(
                f,
                "{} {}= {}",
                compound.target, compound.operator, compound.value
            ),
            Break(_) => write!(f, "break"),
            Continue(_) => write!(f, "continue"),
        }
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for statement in &self.statements {
            writeln!(f, "{};", statement)?;
        }
        Ok(())
    }
}

impl Display for FunctionLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "function")?;
        if let Some(name) = &self.name {
            write!(f, " {}", name)?;
        }
        let parameters = self.parameters.iter().map(|parameter| {
            match self
                .defaults
                .iter()
                .find(|(name, _)| name.name == parameter.name)
            {
                Some((_, default)) => format!("{} = {}", parameter, default),
                None => parameter.to_string(),
            }
        });
        write!(f, "(")?;
        write_separated(f, parameters, ", ")?;
        write!(f, ") {}", self.body)
    }
}

impl Display for SwitchCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.default {
            write!(f, "default {}", self.body)
        } else {
            write!(f, "case ")?;
            write_separated(f, &self.values, ", ")?;
            write!(f, " {}", self.body)
        }
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Expression::*;
        match self {
            Identifier(identifier) => write!(f, "{}", identifier),
            NumberLiteral { value, .. } => write!(f, "{}", value),
            StringLiteral { value, .. } => write!(f, "\"{}\"", value),
            BooleanLiteral { value, .. } => write!(f, "{}", value),
            NullLiteral(_) => write!(f, "null"),
            ListLiteral { elements, .. } => {
                write!(f, "[")?;
                write_separated(f, elements, ", ")?;
                write!(f, "]")
            }
            MapLiteral { pairs, .. } => {
                write!(f, "{{")?;
                write_separated(
                    f,
                    pairs.iter().map(|(key, value)| format!("{}: {}", key, value)),
                    ", ",
                )?;
                write!(f, "}}")
            }
            PrefixOperation { kind, right, .. } => write!(f, "({}{})", kind, right),
            InfixOperation {
                kind, left, right, ..
            } => write!(f, "({} {} {})", left, kind, right),
            PostfixOperation { kind, target, .. } => write!(f, "({}{})", target, kind),
            If {
                condition,
                consequence,
                alternative,
                ..
            } => {
                write!(f, "if {} {}", condition, consequence)?;
                if let Some(alternative) = alternative {
                    write!(f, " else {}", alternative)?;
                }
                Ok(())
            }
            While {
                condition, body, ..
            } => write!(f, "while {} {}", condition, body),
            For(expression) => write!(
                f,
                "for ({} = {}; {}; {}) {}",
                expression.identifier,
                expression.initial,
                expression.condition,
                expression.increment,
                expression.body
            ),
            ForIn(expression) => {
                write!(f, "for (")?;
                if let Some(key) = &expression.key {
                    write!(f, "{}, ", key)?;
                }
                write!(
                    f,
                    "{} in {}) {}",
                    expression.value, expression.iterable, expression.body
                )
            }
            Switch { value, cases, .. } => {
                write!(f, "switch {} {{", value)?;
                write_separated(f, cases, " ")?;
                write!(f, "}}")
            }
            Ternary {
                condition,
                consequence,
                alternative,
                ..
            } => write!(f, "({} ? {} : {})", condition, consequence, alternative),
            Function(function) => write!(f, "{}", function),
            Call {
                function,
                arguments,
                ..
            } => {
                write!(f, "{}(", function)?;
                write_separated(f, arguments, ", ")?;
                write!(f, ")")
            }
            Method {
                receiver,
                name,
                arguments,
                ..
            } => {
                write!(f, "{}.{}(", receiver, name)?;
                write_separated(f, arguments, ", ")?;
                write!(f, ")")
            }
            Property(property) => write!(f, "{}.{}", property.receiver, property.name),
            Index(index) => write!(f, "({}[{}])", index.left, index.index),
            Class(class) => {
                write!(f, "class {}", class.name)?;
                if let Some(super_class) = &class.super_class {
                    write!(f, " extends {}", super_class)?;
                }
                write!(f, " {}", class.body)
            }
            Trait { name, body, .. } => write!(f, "trait {} {}", name, body),
            Use { traits, .. } => {
                write!(f, "use ")?;
                write_separated(f, traits, ", ")
            }
            Import { path, .. } => write!(f, "import({})", path),
            This(_) => write!(f, "this"),
        }
    }
}

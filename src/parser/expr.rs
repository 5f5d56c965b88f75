use crate::{
    ast::{
        ast::Expr,
        expressions::{
            ArrayExpr, AssignmentExpr, BinaryExpr, BinaryOperator, BoolExpr, BoxAccessExpr,
            CallExpr, ConstructorExpr, CreateExpr, FieldAccessExpr, FloatExpr, IndexExpr, IntExpr,
            NullExpr, ParenExpr, PrefixExpr, PrefixOperator, StringExpr, SymbolExpr,
        },
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::{lookups::BindingPower, parser::Parser};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<Expr, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let Some(nud) = parser.get_nud_lookup().get(&token_kind).copied() else {
        return Err(Error::new(
            ErrorImpl::UnexpectedToken {
                token: parser.current_token().value.clone(),
            },
            parser.get_position(),
        ));
    };

    let mut left = nud(parser)?;

    // While the current token binds tighter than `bp`, keep extending lhs
    while let Some(next_bp) = parser.get_bp_lookup().get(&parser.current_token_kind()).copied() {
        if next_bp <= bp {
            break;
        }

        let token_kind = parser.current_token_kind();
        let Some(led) = parser.get_led_lookup().get(&token_kind).copied() else {
            break;
        };

        left = led(parser, left, next_bp)?;
    }

    Ok(left)
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let token = parser.advance().clone();
    let id = parser.advance_id();

    match token.kind {
        TokenKind::Number if token.value.contains('.') => match token.value.parse::<f64>() {
            Ok(value) => Ok(Expr::Float(FloatExpr { id, value, span: token.span })),
            Err(_) => Err(Error::new(ErrorImpl::NumberParseError { token: token.value }, token.span.start)),
        },
        TokenKind::Number => match token.value.parse::<i64>() {
            Ok(value) => Ok(Expr::Int(IntExpr { id, value, span: token.span })),
            Err(_) => Err(Error::new(ErrorImpl::NumberParseError { token: token.value }, token.span.start)),
        },
        TokenKind::Identifier => Ok(Expr::Symbol(SymbolExpr { id, value: token.value, span: token.span })),
        TokenKind::String => Ok(Expr::String(StringExpr { id, value: token.value, span: token.span })),
        TokenKind::True => Ok(Expr::Bool(BoolExpr { id, value: true, span: token.span })),
        TokenKind::False => Ok(Expr::Bool(BoolExpr { id, value: false, span: token.span })),
        TokenKind::Null => Ok(Expr::Null(NullExpr { id, span: token.span })),
        _ => Err(Error::new(ErrorImpl::UnexpectedToken { token: token.value }, token.span.start)),
    }
}

fn binary_operator(kind: TokenKind) -> Option<BinaryOperator> {
    let operator = match kind {
        TokenKind::Plus => BinaryOperator::Add,
        TokenKind::Dash => BinaryOperator::Subtract,
        TokenKind::Star => BinaryOperator::Multiply,
        TokenKind::Slash => BinaryOperator::Divide,
        TokenKind::Percent => BinaryOperator::Remainder,
        TokenKind::Equals => BinaryOperator::Equal,
        TokenKind::NotEquals => BinaryOperator::NotEqual,
        TokenKind::Less => BinaryOperator::Less,
        TokenKind::LessEquals => BinaryOperator::LessEqual,
        TokenKind::Greater => BinaryOperator::Greater,
        TokenKind::GreaterEquals => BinaryOperator::GreaterEqual,
        TokenKind::And => BinaryOperator::And,
        TokenKind::Or => BinaryOperator::Or,
        _ => return None,
    };
    Some(operator)
}

pub fn parse_binary_expr(parser: &mut Parser, left: Expr, bp: BindingPower) -> Result<Expr, Error> {
    let operator_token = parser.advance().clone();
    let Some(operator) = binary_operator(operator_token.kind) else {
        return Err(Error::new(ErrorImpl::UnexpectedToken { token: operator_token.value }, operator_token.span.start));
    };

    let right = parse_expr(parser, bp)?;

    Ok(Expr::Binary(BinaryExpr {
        id: parser.advance_id(),
        span: left.get_span().to(right.get_span()),
        left: Box::new(left),
        operator,
        right: Box::new(right),
    }))
}

pub fn parse_prefix_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let operator_token = parser.advance().clone();
    let operator = if operator_token.kind == TokenKind::Not {
        PrefixOperator::Not
    } else {
        PrefixOperator::Negate
    };
    let rhs = parse_expr(parser, BindingPower::Unary)?;

    Ok(Expr::Prefix(PrefixExpr {
        id: parser.advance_id(),
        span: parser.span_from(operator_token.span.start),
        operator,
        right_expr: Box::new(rhs),
    }))
}

/// Right associative: `a = b = c` assigns `c` to both.
pub fn parse_assignment_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    parser.advance();
    let rhs = parse_expr(parser, BindingPower::Default)?;

    Ok(Expr::Assignment(AssignmentExpr {
        id: parser.advance_id(),
        span: left.get_span().to(rhs.get_span()),
        assignee: Box::new(left),
        value: Box::new(rhs),
    }))
}

pub fn parse_grouping_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let start = parser.advance().span.start.clone();
    let expr = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(Expr::Paren(ParenExpr {
        id: parser.advance_id(),
        inner: Box::new(expr),
        span: parser.span_from(start),
    }))
}

/// Comma separated expressions up to (and including) `close`.
fn parse_arguments(parser: &mut Parser, close: TokenKind) -> Result<Vec<Expr>, Error> {
    let mut args = vec![];

    while parser.current_token_kind() != close {
        args.push(parse_expr(parser, BindingPower::Default)?);

        if !parser.accept(TokenKind::Comma) {
            break;
        }
    }

    parser.expect(close)?;
    Ok(args)
}

pub fn parse_array_literal_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let start = parser.advance().span.start.clone();
    let elements = parse_arguments(parser, TokenKind::CloseBracket)?;

    Ok(Expr::Array(ArrayExpr {
        id: parser.advance_id(),
        elements,
        span: parser.span_from(start),
    }))
}

pub fn parse_call_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    parser.advance();
    let arguments = parse_arguments(parser, TokenKind::CloseParen)?;

    Ok(Expr::Call(CallExpr {
        id: parser.advance_id(),
        span: parser.span_from(left.get_span().start.clone()),
        callee: Box::new(left),
        arguments,
    }))
}

pub fn parse_index_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    parser.advance();
    let index = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseBracket)?;

    Ok(Expr::Index(IndexExpr {
        id: parser.advance_id(),
        span: parser.span_from(left.get_span().start.clone()),
        array: Box::new(left),
        index: Box::new(index),
    }))
}

pub fn parse_member_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    parser.advance();
    let error = parser.unexpected("expected field name after `.`");
    let field = parser.expect_error(TokenKind::Identifier, Some(error))?.value;

    Ok(Expr::FieldAccess(FieldAccessExpr {
        id: parser.advance_id(),
        span: parser.span_from(left.get_span().start.clone()),
        receiver: Box::new(left),
        field,
    }))
}

pub fn parse_box_access_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    parser.advance();
    let error = parser.unexpected("expected attribute or method name after `#`");
    let member = parser.expect_error(TokenKind::Identifier, Some(error))?.value;

    Ok(Expr::BoxAccess(BoxAccessExpr {
        id: parser.advance_id(),
        span: parser.span_from(left.get_span().start.clone()),
        receiver: Box::new(left),
        member,
    }))
}

pub fn parse_constructor_expr(parser: &mut Parser) -> Result<Expr, Error> {
    // $Point(1, 2): the call itself is an ordinary call LED
    let start = parser.advance().span.start.clone();
    let error = parser.unexpected("expected struct name after `$`");
    let name = parser.expect_error(TokenKind::Identifier, Some(error))?.value;

    Ok(Expr::Constructor(ConstructorExpr {
        id: parser.advance_id(),
        name,
        span: parser.span_from(start),
    }))
}

pub fn parse_create_expr(parser: &mut Parser) -> Result<Expr, Error> {
    // create Car()
    let start = parser.advance().span.start.clone();
    let error = parser.unexpected("expected box name after `create`");
    let name = parser.expect_error(TokenKind::Identifier, Some(error))?.value;

    parser.expect(TokenKind::OpenParen)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(Expr::Create(CreateExpr {
        id: parser.advance_id(),
        name,
        span: parser.span_from(start),
    }))
}

use crate::{
    ast::{
        ast::Stmt,
        statements::{
            AttributeDecl, BlockStmt, BoxDeclStmt, BoxMember, ExpressionStmt, FieldDecl,
            FnDeclStmt, IfStmt, Parameter, ReturnStmt, StructDeclStmt, VarDeclStmt, WhileStmt,
        },
    },
    errors::errors::Error,
    lexer::tokens::TokenKind,
    parser::{expr::parse_expr, lookups::BindingPower},
};

use super::{parser::Parser, types::parse_type};

/// Parses one statement, consuming an optional trailing `;`.
pub fn parse_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let handler = parser.get_stmt_lookup().get(&parser.current_token_kind()).copied();

    let stmt = match handler {
        Some(handler) => handler(parser)?,
        None => {
            let expression = parse_expr(parser, BindingPower::Default)?;
            Stmt::Expression(ExpressionStmt {
                id: parser.advance_id(),
                span: expression.get_span().clone(),
                expression,
            })
        }
    };

    parser.accept(TokenKind::Semicolon);
    Ok(stmt)
}

pub fn parse_var_decl_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let error = parser.unexpected("expected identifier during variable declaration");
    let identifier = parser.expect_error(TokenKind::Identifier, Some(error))?.value;

    let explicit_type = if parser.accept(TokenKind::Colon) {
        Some(parse_type(parser, BindingPower::Default)?)
    } else {
        None
    };

    let assigned_value = if parser.accept(TokenKind::Assignment) {
        Some(parse_expr(parser, BindingPower::Default)?)
    } else {
        None
    };

    if explicit_type.is_none() && assigned_value.is_none() {
        return Err(parser.unexpected("expected rhs or explicit type"));
    }

    Ok(Stmt::VarDecl(VarDeclStmt {
        id: parser.advance_id(),
        identifier,
        explicit_type,
        assigned_value,
        span: parser.span_from(start),
    }))
}

pub fn parse_if_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let condition = parse_expr(parser, BindingPower::Default)?;
    let then_body = parse_stmt(parser)?;

    let else_body = if parser.accept(TokenKind::Else) {
        Some(Box::new(parse_stmt(parser)?))
    } else {
        None
    };

    Ok(Stmt::If(IfStmt {
        id: parser.advance_id(),
        condition,
        then_body: Box::new(then_body),
        else_body,
        span: parser.span_from(start),
    }))
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let condition = parse_expr(parser, BindingPower::Default)?;
    let body = parse_stmt(parser)?;

    Ok(Stmt::While(WhileStmt {
        id: parser.advance_id(),
        condition,
        body: Box::new(body),
        span: parser.span_from(start),
    }))
}

pub fn parse_block(parser: &mut Parser) -> Result<BlockStmt, Error> {
    let start = parser.expect(TokenKind::OpenCurly)?.span.start;

    let mut statements = Vec::new();
    while parser.current_token_kind() != TokenKind::CloseCurly {
        if !parser.has_tokens() {
            return Err(parser.unexpected("expected `}` to close the block"));
        }
        statements.push(parse_stmt(parser)?);
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(BlockStmt {
        id: parser.advance_id(),
        body: statements,
        span: parser.span_from(start),
    })
}

pub fn parse_block_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    Ok(Stmt::Block(parse_block(parser)?))
}

fn parse_parameters(parser: &mut Parser) -> Result<Vec<Parameter>, Error> {
    parser.expect(TokenKind::OpenParen)?;

    let mut parameters = Vec::new();
    while parser.current_token_kind() != TokenKind::CloseParen {
        let token = parser.expect(TokenKind::Identifier)?;
        parser.expect(TokenKind::Colon)?;
        let ty = parse_type(parser, BindingPower::Default)?;
        parameters.push(Parameter {
            id: parser.advance_id(),
            name: token.value,
            ty,
            span: parser.span_from(token.span.start),
        });

        if !parser.accept(TokenKind::Comma) {
            break;
        }
    }

    parser.expect(TokenKind::CloseParen)?;
    Ok(parameters)
}

/// `fun name(params): Type { ... }`, also used for `meth` inside boxes.
fn parse_function(parser: &mut Parser) -> Result<FnDeclStmt, Error> {
    let start = parser.advance().span.start.clone();

    let error = parser.unexpected("expected function name");
    let identifier = parser.expect_error(TokenKind::Identifier, Some(error))?.value;
    let parameters = parse_parameters(parser)?;

    let return_type = if parser.accept(TokenKind::Colon) {
        Some(parse_type(parser, BindingPower::Default)?)
    } else {
        None
    };

    let body = parse_block(parser)?;

    Ok(FnDeclStmt {
        id: parser.advance_id(),
        identifier,
        parameters,
        return_type,
        body,
        span: parser.span_from(start),
    })
}

pub fn parse_fn_decl_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    Ok(Stmt::FnDecl(parse_function(parser)?))
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let value = if parser.get_nud_lookup().contains_key(&parser.current_token_kind()) {
        Some(parse_expr(parser, BindingPower::Default)?)
    } else {
        None
    };

    Ok(Stmt::Return(ReturnStmt {
        id: parser.advance_id(),
        value,
        span: parser.span_from(start),
    }))
}

pub fn parse_struct_decl_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let error = parser.unexpected("expected struct name");
    let name = parser.expect_error(TokenKind::Identifier, Some(error))?.value;

    parser.expect(TokenKind::OpenCurly)?;

    let mut fields = Vec::new();
    while parser.current_token_kind() != TokenKind::CloseCurly {
        let field_start = parser.expect(TokenKind::Var)?.span.start;
        let field_name = parser.expect(TokenKind::Identifier)?.value;
        parser.expect(TokenKind::Colon)?;
        let ty = parse_type(parser, BindingPower::Default)?;
        fields.push(FieldDecl {
            id: parser.advance_id(),
            name: field_name,
            ty,
            span: parser.span_from(field_start),
        });

        parser.accept(TokenKind::Semicolon);
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(Stmt::StructDecl(StructDeclStmt {
        id: parser.advance_id(),
        name,
        fields,
        span: parser.span_from(start),
    }))
}

pub fn parse_box_decl_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let error = parser.unexpected("expected box name");
    let name = parser.expect_error(TokenKind::Identifier, Some(error))?.value;

    parser.expect(TokenKind::OpenCurly)?;

    let mut members = Vec::new();
    loop {
        match parser.current_token_kind() {
            TokenKind::CloseCurly => break,
            TokenKind::Attr => {
                let attr_start = parser.advance().span.start.clone();
                let attr_name = parser.expect(TokenKind::Identifier)?.value;
                parser.expect(TokenKind::Colon)?;
                let ty = parse_type(parser, BindingPower::Default)?;
                members.push(BoxMember::Attribute(AttributeDecl {
                    id: parser.advance_id(),
                    name: attr_name,
                    ty,
                    span: parser.span_from(attr_start),
                }));
            }
            TokenKind::Meth => members.push(BoxMember::Method(parse_function(parser)?)),
            _ => return Err(parser.unexpected("expected `attr` or `meth` inside box")),
        }

        parser.accept(TokenKind::Semicolon);
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(Stmt::BoxDecl(BoxDeclStmt {
        id: parser.advance_id(),
        name,
        members,
        span: parser.span_from(start),
    }))
}

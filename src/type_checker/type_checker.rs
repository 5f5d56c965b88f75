use std::collections::HashMap;

use tracing::debug;

use crate::{
    ast::{
        ast::{Expr, NodeId, Program, Stmt, TypeNode},
        expressions::{
            ArrayExpr, AssignmentExpr, BinaryExpr, BinaryOperator, BoxAccessExpr, CallExpr,
            ConstructorExpr, CreateExpr, FieldAccessExpr, IndexExpr, PrefixExpr, PrefixOperator,
            SymbolExpr,
        },
        statements::{
            BlockStmt, BoxDeclStmt, BoxMember, FnDeclStmt, IfStmt, ReturnStmt, StructDeclStmt,
            VarDeclStmt, WhileStmt,
        },
    },
    errors::errors::{MemberAccess, SemanticError, SemanticErrorKind},
    Span,
};

use super::{
    reactor::{Fact, FactKey, FactValue, Reactor, Rule, RuleContext, Suspend},
    scope::{DeclId, DeclKind, Declaration, ScopeId, ScopeKind, SymbolTable},
    types::Type,
};

/// Result of a successful analysis: every fact computed about the program,
/// keyed by node, plus the symbol table the facts refer to.
#[derive(Debug, Clone)]
pub struct Annotations {
    facts: HashMap<FactKey, FactValue>,
    symbols: SymbolTable,
}

impl Annotations {
    fn type_fact(&self, node: NodeId, fact: Fact) -> Option<&Type> {
        match self.facts.get(&(node, fact)) {
            Some(FactValue::Type(ty)) => Some(ty),
            _ => None,
        }
    }

    /// Type of an expression or of a type annotation node.
    pub fn type_of(&self, node: NodeId) -> Option<&Type> {
        self.type_fact(node, Fact::Type)
    }

    /// Type of the variable, parameter, field, attribute or function
    /// declared by `node`.
    pub fn decl_type(&self, node: NodeId) -> Option<&Type> {
        self.type_fact(node, Fact::DeclType)
    }

    pub fn decl_of(&self, node: NodeId) -> Option<&Declaration> {
        match self.facts.get(&(node, Fact::Decl)) {
            Some(FactValue::Decl(decl)) => Some(self.symbols.decl(*decl)),
            _ => None,
        }
    }

    pub fn returns(&self, node: NodeId) -> Option<bool> {
        match self.facts.get(&(node, Fact::Returns)) {
            Some(FactValue::Flag(flag)) => Some(*flag),
            _ => None,
        }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }
}

/// Where an empty array literal takes its element type from.
#[derive(Debug, Clone)]
enum Expectation {
    None,
    /// The type of a node: an annotation, or the target of an assignment.
    Type(NodeId),
    /// Parameter `n` of the function a callee evaluates to.
    Param(NodeId, usize),
    /// Component of the enclosing expectation.
    Element(Box<Expectation>),
}

impl Expectation {
    fn resolve(&self, ctx: &RuleContext) -> Result<Option<Type>, Suspend> {
        match self {
            Expectation::None => Ok(None),
            Expectation::Type(node) => ctx.get_type(*node).map(Some),
            Expectation::Param(callee, index) => match ctx.get_type(*callee)? {
                Type::Function(function) => Ok(function.params.get(*index).cloned()),
                _ => Ok(None),
            },
            Expectation::Element(outer) => {
                Ok(outer.resolve(ctx)?.and_then(|ty| ty.component().cloned()))
            }
        }
    }
}

/// Walks the program once, building scopes and registering the rules the
/// reactor evaluates afterwards.
pub struct TypeChecker<'a> {
    symbols: SymbolTable,
    reactor: Reactor<'a>,
    errors: Vec<SemanticError>,
    /// Enclosing function declarations, innermost last.
    functions: Vec<&'a FnDeclStmt>,
}

impl Default for TypeChecker<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> TypeChecker<'a> {
    pub fn new() -> Self {
        TypeChecker {
            symbols: SymbolTable::new(),
            reactor: Reactor::new(),
            errors: Vec::new(),
            functions: Vec::new(),
        }
    }

    fn rule(
        &mut self,
        produces: Vec<FactKey>,
        what: impl Into<String>,
        span: &Span,
        run: impl Fn(&mut RuleContext) -> Result<(), Suspend> + 'a,
    ) {
        self.reactor
            .add_rule(Rule::new(produces, what, span.clone(), Box::new(run)));
    }

    fn seed_type(&mut self, node: NodeId, ty: Type) {
        self.reactor.seed((node, Fact::Type), FactValue::Type(ty));
    }

    fn seed_returns(&mut self, node: NodeId, returns: bool) {
        self.reactor
            .seed((node, Fact::Returns), FactValue::Flag(returns));
    }

    fn declare(
        &mut self,
        scope: ScopeId,
        name: &str,
        kind: DeclKind,
        node: NodeId,
        visible_from: u32,
        span: &Span,
    ) -> Option<DeclId> {
        match self
            .symbols
            .declare(scope, name, kind, Some(node), visible_from, span.clone())
        {
            Ok(decl) => Some(decl),
            Err(kind) => {
                self.errors.push(SemanticError::new(kind, span.clone()));
                None
            }
        }
    }

    /// Walks a statement list, declaring its functions, structs and boxes
    /// first so they can be referenced before their definition.
    fn walk_statements(&mut self, statements: &'a [Stmt], scope: ScopeId) {
        for stmt in statements {
            match stmt {
                Stmt::FnDecl(function) => {
                    self.declare(scope, &function.identifier, DeclKind::Function, function.id, 0, &function.span);
                }
                Stmt::StructDecl(decl) => {
                    self.declare(scope, &decl.name, DeclKind::Struct, decl.id, 0, &decl.span);
                }
                Stmt::BoxDecl(decl) => {
                    self.declare(scope, &decl.name, DeclKind::Box, decl.id, 0, &decl.span);
                }
                _ => {}
            }
        }

        for stmt in statements {
            self.walk_stmt(stmt, scope);
        }
    }

    fn walk_stmt(&mut self, stmt: &'a Stmt, scope: ScopeId) {
        match stmt {
            Stmt::Block(block) => self.walk_block(block, scope),
            Stmt::Expression(stmt) => {
                self.walk_expr(&stmt.expression, scope, Expectation::None);
                self.seed_returns(stmt.id, false);
            }
            Stmt::VarDecl(decl) => self.walk_var_decl(decl, scope),
            Stmt::FnDecl(function) => {
                self.walk_function(function, scope);
                self.seed_returns(function.id, false);
            }
            Stmt::StructDecl(decl) => self.walk_struct(decl, scope),
            Stmt::BoxDecl(decl) => self.walk_box(decl, scope),
            Stmt::If(stmt) => self.walk_if(stmt, scope),
            Stmt::While(stmt) => self.walk_while(stmt, scope),
            Stmt::Return(stmt) => self.walk_return(stmt, scope),
        }
    }

    fn walk_block(&mut self, block: &'a BlockStmt, parent: ScopeId) {
        let scope = self.symbols.push_scope(ScopeKind::Block, Some(parent));
        self.walk_statements(&block.body, scope);

        let id = block.id;
        let last = block.body.last().map(Stmt::id);
        self.rule(vec![(id, Fact::Returns)], "return analysis of block", &block.span, move |ctx| {
            let returns = match last {
                Some(last) => ctx.get_returns(last)?,
                None => false,
            };
            ctx.set_returns(id, returns);
            Ok(())
        });
    }

    fn walk_var_decl(&mut self, decl: &'a VarDeclStmt, scope: ScopeId) {
        if let Some(ty) = &decl.explicit_type {
            self.walk_type(ty, scope);
        }
        if let Some(value) = &decl.assigned_value {
            let expectation = match &decl.explicit_type {
                Some(ty) => Expectation::Type(ty.id()),
                None => Expectation::None,
            };
            self.walk_expr(value, scope, expectation);
        }

        // declared after the initializer is walked: `var x = x` never sees itself
        self.declare(scope, &decl.identifier, DeclKind::Variable, decl.id, decl.span.end.0, &decl.span);
        self.seed_returns(decl.id, false);

        let what = format!("type of variable `{}`", decl.identifier);
        match (&decl.explicit_type, &decl.assigned_value) {
            (Some(ty), value) => {
                self.decl_type_from_annotation(decl.id, ty, what, &decl.span);

                if let Some(value) = value {
                    let span = value.get_span();
                    self.rule(vec![], format!("initializer of `{}`", decl.identifier), span, move |ctx| {
                        let expected = ctx.get_type(ty.id())?;
                        let actual = ctx.get_type(value.id())?;
                        if !actual.is_assignable_to(&expected) {
                            ctx.error(
                                SemanticErrorKind::mismatch(format!(
                                    "incompatible initializer type provided for variable `{}`: expected {} but got {}",
                                    decl.identifier, expected, actual
                                )),
                                span,
                            );
                        }
                        Ok(())
                    });
                }
            }
            (None, Some(value)) => {
                self.rule(vec![(decl.id, Fact::DeclType)], what, &decl.span, move |ctx| {
                    let inferred = ctx.get_type(value.id())?;
                    if matches!(inferred, Type::Null | Type::Void) {
                        ctx.error(
                            SemanticErrorKind::mismatch(format!(
                                "Cannot infer the type of variable `{}` from a {} initializer",
                                decl.identifier, inferred
                            )),
                            &decl.span,
                        );
                    } else {
                        ctx.set_decl_type(decl.id, inferred);
                    }
                    Ok(())
                });
            }
            (None, None) => {}
        }
    }

    fn decl_type_from_annotation(&mut self, node: NodeId, ty: &'a TypeNode, what: String, span: &Span) {
        self.rule(vec![(node, Fact::DeclType)], what, span, move |ctx| {
            let declared = ctx.get_type(ty.id())?;
            ctx.set_decl_type(node, declared);
            Ok(())
        });
    }

    fn walk_function(&mut self, function: &'a FnDeclStmt, scope: ScopeId) {
        // signature types resolve in the enclosing scope
        for parameter in &function.parameters {
            self.walk_type(&parameter.ty, scope);
        }
        if let Some(ret) = &function.return_type {
            self.walk_type(ret, scope);
        }

        let function_scope = self.symbols.push_scope(ScopeKind::Function, Some(scope));
        for parameter in &function.parameters {
            self.declare(function_scope, &parameter.name, DeclKind::Parameter, parameter.id, 0, &parameter.span);
            self.decl_type_from_annotation(
                parameter.id,
                &parameter.ty,
                format!("type of parameter `{}`", parameter.name),
                &parameter.span,
            );
        }

        let what = format!("signature of `{}`", function.identifier);
        self.rule(vec![(function.id, Fact::DeclType)], what, &function.span, move |ctx| {
            let params = function
                .parameters
                .iter()
                .map(|parameter| ctx.get_type(parameter.ty.id()))
                .collect::<Result<Vec<_>, _>>()?;
            let ret = match &function.return_type {
                Some(ret) => ctx.get_type(ret.id())?,
                None => Type::Void,
            };
            ctx.set_decl_type(function.id, Type::function(params, ret));
            Ok(())
        });

        self.functions.push(function);
        self.walk_block(&function.body, function_scope);
        self.functions.pop();

        if let Some(ret) = &function.return_type {
            let what = format!("return analysis of `{}`", function.identifier);
            self.rule(vec![], what, &function.span, move |ctx| {
                if ctx.get_type(ret.id())? == Type::Void {
                    return Ok(());
                }
                if !ctx.get_returns(function.body.id)? {
                    ctx.error(
                        SemanticErrorKind::MissingReturn {
                            function: function.identifier.clone(),
                        },
                        &function.span,
                    );
                }
                Ok(())
            });
        }
    }

    fn walk_struct(&mut self, decl: &'a StructDeclStmt, scope: ScopeId) {
        self.seed_returns(decl.id, false);

        let members = self.symbols.push_scope(ScopeKind::Struct, Some(scope));
        for field in &decl.fields {
            self.walk_type(&field.ty, scope);
            self.declare(members, &field.name, DeclKind::Field, field.id, 0, &field.span);
            self.decl_type_from_annotation(
                field.id,
                &field.ty,
                format!("type of field `{}.{}`", decl.name, field.name),
                &field.span,
            );
        }

        self.symbols.set_members(decl.id, members);
    }

    fn walk_box(&mut self, decl: &'a BoxDeclStmt, scope: ScopeId) {
        self.seed_returns(decl.id, false);

        // attributes and methods are all visible from every method body
        let members = self.symbols.push_scope(ScopeKind::Box, Some(scope));
        for member in &decl.members {
            let kind = match member {
                BoxMember::Attribute(_) => DeclKind::Attribute,
                BoxMember::Method(_) => DeclKind::Method,
            };
            let span = match member {
                BoxMember::Attribute(attribute) => &attribute.span,
                BoxMember::Method(method) => &method.span,
            };
            self.declare(members, member.name(), kind, member.id(), 0, span);
        }
        self.symbols.set_members(decl.id, members);

        for member in &decl.members {
            match member {
                BoxMember::Attribute(attribute) => {
                    self.walk_type(&attribute.ty, scope);
                    self.decl_type_from_annotation(
                        attribute.id,
                        &attribute.ty,
                        format!("type of attribute `{}#{}`", decl.name, attribute.name),
                        &attribute.span,
                    );
                }
                BoxMember::Method(method) => self.walk_function(method, members),
            }
        }
    }

    fn check_condition(&mut self, condition: &'a Expr, statement: &'static str) {
        let span = condition.get_span();
        self.rule(vec![], format!("{} condition", statement), span, move |ctx| {
            let ty = ctx.get_type(condition.id())?;
            if ty != Type::Bool {
                ctx.error(
                    SemanticErrorKind::mismatch(format!(
                        "{} statement with a non-boolean condition of type: {}",
                        statement, ty
                    )),
                    span,
                );
            }
            Ok(())
        });
    }

    fn walk_if(&mut self, stmt: &'a IfStmt, scope: ScopeId) {
        self.walk_expr(&stmt.condition, scope, Expectation::None);
        self.check_condition(&stmt.condition, "If");

        self.walk_body(&stmt.then_body, scope);
        if let Some(else_body) = &stmt.else_body {
            self.walk_body(else_body, scope);
        }

        let id = stmt.id;
        let then_id = stmt.then_body.id();
        let else_id = stmt.else_body.as_ref().map(|body| body.id());
        self.rule(vec![(id, Fact::Returns)], "return analysis of if", &stmt.span, move |ctx| {
            let returns = ctx.get_returns(then_id)?
                && match else_id {
                    Some(else_id) => ctx.get_returns(else_id)?,
                    None => false,
                };
            ctx.set_returns(id, returns);
            Ok(())
        });
    }

    fn walk_while(&mut self, stmt: &'a WhileStmt, scope: ScopeId) {
        self.walk_expr(&stmt.condition, scope, Expectation::None);
        self.check_condition(&stmt.condition, "While");
        self.walk_body(&stmt.body, scope);
        self.seed_returns(stmt.id, false);
    }

    /// Branch or loop body. A body that is not a block still gets a scope of
    /// its own, it only exists while the body runs.
    fn walk_body(&mut self, body: &'a Stmt, parent: ScopeId) {
        match body {
            Stmt::Block(block) => self.walk_block(block, parent),
            stmt => {
                let scope = self.symbols.push_scope(ScopeKind::Block, Some(parent));
                self.walk_statements(std::slice::from_ref(stmt), scope);
            }
        }
    }

    fn walk_return(&mut self, stmt: &'a ReturnStmt, scope: ScopeId) {
        let function = self.functions.last().copied();

        if let Some(value) = &stmt.value {
            let expectation = match function.and_then(|f| f.return_type.as_ref()) {
                Some(ret) => Expectation::Type(ret.id()),
                None => Expectation::None,
            };
            self.walk_expr(value, scope, expectation);
        }
        self.seed_returns(stmt.id, true);

        // a return at the root ends the program with any value
        let Some(function) = function else {
            return;
        };

        self.rule(vec![], "return statement", &stmt.span, move |ctx| {
            let expected = match &function.return_type {
                Some(ret) => ctx.get_type(ret.id())?,
                None => Type::Void,
            };

            match &stmt.value {
                Some(value) => {
                    let actual = ctx.get_type(value.id())?;
                    if !actual.is_assignable_to(&expected) {
                        ctx.error(
                            SemanticErrorKind::mismatch(format!(
                                "Incompatible return type, expected {} but got {}",
                                expected, actual
                            )),
                            value.get_span(),
                        );
                    }
                }
                None if expected != Type::Void => ctx.error(
                    SemanticErrorKind::mismatch(format!(
                        "Return without value in a function returning {}",
                        expected
                    )),
                    &stmt.span,
                ),
                None => {}
            }
            Ok(())
        });
    }

    fn walk_type(&mut self, node: &'a TypeNode, scope: ScopeId) {
        match node {
            TypeNode::Symbol(symbol) => {
                let what = format!("type `{}`", symbol.name);
                self.rule(vec![(symbol.id, Fact::Type)], what, &symbol.span, move |ctx| {
                    let symbols = ctx.symbols();
                    let decl = match symbols.lookup(scope, &symbol.name, symbol.span.start.0) {
                        Ok(decl) => symbols.decl(decl),
                        Err(kind) => {
                            ctx.error(kind, &symbol.span);
                            return Ok(());
                        }
                    };

                    let ty = match &decl.kind {
                        DeclKind::BuiltinType(ty) => Some(ty.clone()),
                        _ => decl.named_type(),
                    };
                    match ty {
                        Some(ty) => ctx.set_type(symbol.id, ty),
                        None => ctx.error(
                            SemanticErrorKind::mismatch(format!("`{}` does not name a type", symbol.name)),
                            &symbol.span,
                        ),
                    }
                    Ok(())
                });
            }
            TypeNode::Array(array) => {
                self.walk_type(&array.underlying, scope);
                let component = array.underlying.id();
                self.rule(vec![(array.id, Fact::Type)], "array type", &array.span, move |ctx| {
                    let component = ctx.get_type(component)?;
                    ctx.set_type(array.id, Type::array_of(component));
                    Ok(())
                });
            }
        }
    }

    fn walk_expr(&mut self, expr: &'a Expr, scope: ScopeId, expectation: Expectation) {
        match expr {
            Expr::Int(e) => self.seed_type(e.id, Type::Int),
            Expr::Float(e) => self.seed_type(e.id, Type::Float),
            Expr::String(e) => self.seed_type(e.id, Type::String),
            Expr::Bool(e) => self.seed_type(e.id, Type::Bool),
            Expr::Null(e) => self.seed_type(e.id, Type::Null),
            Expr::Symbol(e) => self.walk_symbol(e, scope),
            Expr::Array(e) => self.walk_array(e, scope, expectation),
            Expr::Paren(e) => {
                self.walk_expr(&e.inner, scope, expectation);
                let (id, inner) = (e.id, e.inner.id());
                self.rule(vec![(id, Fact::Type)], "parenthesized expression", &e.span, move |ctx| {
                    let ty = ctx.get_type(inner)?;
                    ctx.set_type(id, ty);
                    Ok(())
                });
            }
            Expr::Prefix(e) => self.walk_prefix(e, scope),
            Expr::Binary(e) => self.walk_binary(e, scope),
            Expr::Assignment(e) => self.walk_assignment(e, scope),
            Expr::Call(e) => self.walk_call(e, scope),
            Expr::Index(e) => self.walk_index(e, scope),
            Expr::FieldAccess(e) => self.walk_field_access(e, scope),
            Expr::BoxAccess(e) => self.walk_box_access(e, scope),
            Expr::Constructor(e) => self.walk_constructor(e, scope),
            Expr::Create(e) => self.walk_create(e, scope),
        }
    }

    fn walk_symbol(&mut self, expr: &'a SymbolExpr, scope: ScopeId) {
        let produces = vec![(expr.id, Fact::Decl), (expr.id, Fact::Type)];
        self.rule(produces, format!("reference `{}`", expr.value), &expr.span, move |ctx| {
            let symbols = ctx.symbols();
            let decl = match symbols.lookup(scope, &expr.value, expr.span.start.0) {
                Ok(decl) => decl,
                Err(kind) => {
                    ctx.error(kind, &expr.span);
                    return Ok(());
                }
            };

            let declaration = symbols.decl(decl);
            let ty = match &declaration.kind {
                DeclKind::BuiltinFunction(function) => function.signature(),
                kind if kind.is_type() => Type::Type,
                _ => match declaration.node {
                    Some(node) => ctx.get_decl_type(node)?,
                    None => return Err(Suspend::Poisoned),
                },
            };

            ctx.set_decl(expr.id, decl);
            ctx.set_type(expr.id, ty);
            Ok(())
        });
    }

    fn walk_array(&mut self, expr: &'a ArrayExpr, scope: ScopeId, expectation: Expectation) {
        for element in &expr.elements {
            self.walk_expr(element, scope, Expectation::Element(Box::new(expectation.clone())));
        }

        self.rule(vec![(expr.id, Fact::Type)], "array literal", &expr.span, move |ctx| {
            let Some((first, rest)) = expr.elements.split_first() else {
                match expectation.resolve(ctx)? {
                    Some(ty @ Type::Array(_)) => ctx.set_type(expr.id, ty),
                    Some(other) => ctx.error(
                        SemanticErrorKind::mismatch(format!(
                            "Trying to use an empty array literal where {} is expected",
                            other
                        )),
                        &expr.span,
                    ),
                    None => ctx.error(
                        SemanticErrorKind::mismatch("Cannot infer the type of an empty array literal"),
                        &expr.span,
                    ),
                }
                return Ok(());
            };

            let mut component = ctx.get_type(first.id())?;
            for element in rest {
                let ty = ctx.get_type(element.id())?;
                match component.common_supertype(&ty) {
                    Some(common) => component = common,
                    None => {
                        ctx.error(
                            SemanticErrorKind::mismatch(format!(
                                "Could not find common supertype in array literal: {} and {}",
                                component, ty
                            )),
                            &expr.span,
                        );
                        return Ok(());
                    }
                }
            }

            ctx.set_type(expr.id, Type::array_of(component));
            Ok(())
        });
    }

    fn walk_prefix(&mut self, expr: &'a PrefixExpr, scope: ScopeId) {
        self.walk_expr(&expr.right_expr, scope, Expectation::None);

        self.rule(vec![(expr.id, Fact::Type)], "unary expression", &expr.span, move |ctx| {
            let operand = ctx.get_type(expr.right_expr.id())?;
            match expr.operator {
                PrefixOperator::Not if operand == Type::Bool => ctx.set_type(expr.id, Type::Bool),
                PrefixOperator::Not => ctx.error(
                    SemanticErrorKind::mismatch(format!("Trying to negate type: {}", operand)),
                    &expr.span,
                ),
                PrefixOperator::Negate if operand.is_numeric() => ctx.set_type(expr.id, operand),
                PrefixOperator::Negate => ctx.error(
                    SemanticErrorKind::mismatch(format!(
                        "Trying to negate a non-numeric type: {}",
                        operand
                    )),
                    &expr.span,
                ),
            }
            Ok(())
        });
    }

    fn walk_binary(&mut self, expr: &'a BinaryExpr, scope: ScopeId) {
        self.walk_expr(&expr.left, scope, Expectation::None);
        self.walk_expr(&expr.right, scope, Expectation::None);

        let what = format!("`{}` expression", expr.operator);
        self.rule(vec![(expr.id, Fact::Type)], what, &expr.span, move |ctx| {
            let left = ctx.get_type(expr.left.id())?;
            let right = ctx.get_type(expr.right.id())?;
            let operator = expr.operator;

            if operator.is_arithmetic() {
                let concatenation = operator == BinaryOperator::Add
                    && (left == Type::String || right == Type::String)
                    && left != Type::Void
                    && right != Type::Void;

                if concatenation {
                    ctx.set_type(expr.id, Type::String);
                } else if left.is_numeric() && right.is_numeric() {
                    let ty = if left == Type::Float || right == Type::Float {
                        Type::Float
                    } else {
                        Type::Int
                    };
                    ctx.set_type(expr.id, ty);
                } else {
                    ctx.error(
                        SemanticErrorKind::mismatch(format!(
                            "Trying to {} {} with {}",
                            operator.verb(),
                            left,
                            right
                        )),
                        &expr.span,
                    );
                }
            } else if operator.is_relational() {
                match [&left, &right].into_iter().find(|ty| !ty.is_numeric()) {
                    Some(ty) => ctx.error(
                        SemanticErrorKind::mismatch(format!(
                            "Attempting to perform arithmetic comparison on non-numeric type: {}",
                            ty
                        )),
                        &expr.span,
                    ),
                    None => ctx.set_type(expr.id, Type::Bool),
                }
            } else if operator.is_logical() {
                match [&left, &right].into_iter().find(|ty| **ty != Type::Bool) {
                    Some(ty) => ctx.error(
                        SemanticErrorKind::mismatch(format!(
                            "Attempting to perform binary logic on non-boolean type: {}",
                            ty
                        )),
                        &expr.span,
                    ),
                    None => ctx.set_type(expr.id, Type::Bool),
                }
            } else if left.is_comparable_with(&right) {
                ctx.set_type(expr.id, Type::Bool);
            } else {
                ctx.error(
                    SemanticErrorKind::IncomparableTypes {
                        left: left.to_string(),
                        right: right.to_string(),
                    },
                    &expr.span,
                );
            }
            Ok(())
        });
    }

    fn walk_assignment(&mut self, expr: &'a AssignmentExpr, scope: ScopeId) {
        self.walk_expr(&expr.assignee, scope, Expectation::None);
        self.walk_expr(&expr.value, scope, Expectation::Type(expr.assignee.id()));

        self.rule(vec![(expr.id, Fact::Type)], "assignment", &expr.span, move |ctx| {
            let symbols = ctx.symbols();
            let assignable = match expr.assignee.unparenthesized() {
                Expr::Symbol(symbol) => matches!(
                    symbols.decl(ctx.get_decl(symbol.id)?).kind,
                    DeclKind::Variable | DeclKind::Parameter | DeclKind::Attribute
                ),
                Expr::Index(_) => true,
                // `.length` is read only
                Expr::FieldAccess(field) => {
                    !matches!(ctx.get_type(field.receiver.id())?, Type::Array(_))
                }
                Expr::BoxAccess(access) => {
                    symbols.decl(ctx.get_decl(access.id)?).kind == DeclKind::Attribute
                }
                _ => false,
            };

            if !assignable {
                ctx.error(SemanticErrorKind::InvalidLvalue, expr.assignee.get_span());
                return Ok(());
            }

            let target = ctx.get_type(expr.assignee.id())?;
            let value = ctx.get_type(expr.value.id())?;
            if value.is_assignable_to(&target) {
                ctx.set_type(expr.id, target);
            } else {
                ctx.error(
                    SemanticErrorKind::mismatch(format!(
                        "Trying to assign a value of type {} to a non-compatible lvalue of type {}.",
                        value, target
                    )),
                    &expr.span,
                );
            }
            Ok(())
        });
    }

    fn walk_call(&mut self, expr: &'a CallExpr, scope: ScopeId) {
        self.walk_expr(&expr.callee, scope, Expectation::None);
        for (index, argument) in expr.arguments.iter().enumerate() {
            self.walk_expr(argument, scope, Expectation::Param(expr.callee.id(), index));
        }

        self.rule(vec![(expr.id, Fact::Type)], "call", &expr.span, move |ctx| {
            let callee = ctx.get_type(expr.callee.id())?;
            let Type::Function(function) = &callee else {
                ctx.error(
                    SemanticErrorKind::mismatch(format!(
                        "Trying to call a non-function expression of type {}",
                        callee
                    )),
                    expr.callee.get_span(),
                );
                return Ok(());
            };

            if function.params.len() != expr.arguments.len() {
                ctx.error(
                    SemanticErrorKind::mismatch(format!(
                        "wrong number of arguments, expected {} but got {}",
                        function.params.len(),
                        expr.arguments.len()
                    )),
                    &expr.span,
                );
                return Ok(());
            }

            for (index, (param, argument)) in function.params.iter().zip(&expr.arguments).enumerate() {
                let actual = ctx.get_type(argument.id())?;
                if !actual.is_assignable_to(param) {
                    ctx.error(
                        SemanticErrorKind::mismatch(format!(
                            "argument {}: expected {} but got {}",
                            index, param, actual
                        )),
                        argument.get_span(),
                    );
                }
            }

            ctx.set_type(expr.id, function.ret.clone());
            Ok(())
        });
    }

    fn walk_index(&mut self, expr: &'a IndexExpr, scope: ScopeId) {
        self.walk_expr(&expr.array, scope, Expectation::None);
        self.walk_expr(&expr.index, scope, Expectation::None);

        self.rule(vec![(expr.id, Fact::Type)], "array index", &expr.span, move |ctx| {
            let array = ctx.get_type(expr.array.id())?;
            let index = ctx.get_type(expr.index.id())?;

            let Type::Array(component) = &array else {
                ctx.error(
                    SemanticErrorKind::mismatch(format!(
                        "Trying to index a non-array expression of type {}",
                        array
                    )),
                    expr.array.get_span(),
                );
                return Ok(());
            };

            if index != Type::Int {
                ctx.error(
                    SemanticErrorKind::mismatch("Indexing an array using a non-Int-valued expression"),
                    expr.index.get_span(),
                );
                return Ok(());
            }

            ctx.set_type(expr.id, (**component).clone());
            Ok(())
        });
    }

    fn walk_field_access(&mut self, expr: &'a FieldAccessExpr, scope: ScopeId) {
        self.walk_expr(&expr.receiver, scope, Expectation::None);

        let produces = vec![(expr.id, Fact::Type), (expr.id, Fact::Decl)];
        let what = format!("field `{}`", expr.field);
        self.rule(produces, what, &expr.span, move |ctx| {
            let receiver = ctx.get_type(expr.receiver.id())?;
            match &receiver {
                Type::Array(_) if expr.field == "length" => ctx.set_type(expr.id, Type::Int),
                Type::Struct(named) => {
                    let symbols = ctx.symbols();
                    match symbols.lookup_member(named.decl, &expr.field) {
                        Some(decl) => {
                            let ty = match symbols.decl(decl).node {
                                Some(node) => ctx.get_decl_type(node)?,
                                None => return Err(Suspend::Poisoned),
                            };
                            ctx.set_decl(expr.id, decl);
                            ctx.set_type(expr.id, ty);
                        }
                        None => ctx.error(
                            SemanticErrorKind::mismatch(format!(
                                "Trying to access missing field {} on struct {}",
                                expr.field, named.name
                            )),
                            &expr.span,
                        ),
                    }
                }
                Type::Box(_) => ctx.error(
                    SemanticErrorKind::WrongAccessOperator {
                        member: expr.field.clone(),
                        ty: receiver.to_string(),
                        access: MemberAccess::Field,
                    },
                    &expr.span,
                ),
                _ => ctx.error(
                    SemanticErrorKind::mismatch(format!(
                        "Trying to access field {} on an expression of type {}",
                        expr.field, receiver
                    )),
                    &expr.span,
                ),
            }
            Ok(())
        });
    }

    fn walk_box_access(&mut self, expr: &'a BoxAccessExpr, scope: ScopeId) {
        self.walk_expr(&expr.receiver, scope, Expectation::None);

        let produces = vec![(expr.id, Fact::Type), (expr.id, Fact::Decl)];
        let what = format!("box member `{}`", expr.member);
        self.rule(produces, what, &expr.span, move |ctx| {
            let receiver = ctx.get_type(expr.receiver.id())?;
            let Type::Box(named) = &receiver else {
                ctx.error(
                    SemanticErrorKind::WrongAccessOperator {
                        member: expr.member.clone(),
                        ty: receiver.to_string(),
                        access: MemberAccess::BoxMember,
                    },
                    &expr.span,
                );
                return Ok(());
            };

            let symbols = ctx.symbols();
            let Some(decl) = symbols.lookup_member(named.decl, &expr.member) else {
                ctx.error(
                    SemanticErrorKind::UnresolvedReference {
                        what: format!("{}#{}", named.name, expr.member),
                    },
                    &expr.span,
                );
                return Ok(());
            };

            let ty = match symbols.decl(decl).node {
                Some(node) => ctx.get_decl_type(node)?,
                None => return Err(Suspend::Poisoned),
            };
            ctx.set_decl(expr.id, decl);
            ctx.set_type(expr.id, ty);
            Ok(())
        });
    }

    fn walk_constructor(&mut self, expr: &'a ConstructorExpr, scope: ScopeId) {
        let produces = vec![(expr.id, Fact::Type), (expr.id, Fact::Decl)];
        self.rule(produces, format!("constructor `${}`", expr.name), &expr.span, move |ctx| {
            let symbols = ctx.symbols();
            let decl = match symbols.lookup(scope, &expr.name, expr.span.start.0) {
                Ok(decl) => decl,
                Err(kind) => {
                    ctx.error(kind, &expr.span);
                    return Ok(());
                }
            };

            let Some(Type::Struct(named)) = symbols.decl(decl).named_type() else {
                ctx.error(
                    SemanticErrorKind::mismatch(format!("`{}` does not name a struct", expr.name)),
                    &expr.span,
                );
                return Ok(());
            };

            let fields = symbols
                .members(named.decl)
                .iter()
                .map(|field| match field.node {
                    Some(node) => ctx.get_decl_type(node),
                    None => Err(Suspend::Poisoned),
                })
                .collect::<Result<Vec<_>, _>>()?;

            ctx.set_decl(expr.id, decl);
            ctx.set_type(expr.id, Type::function(fields, Type::Struct(named)));
            Ok(())
        });
    }

    fn walk_create(&mut self, expr: &'a CreateExpr, scope: ScopeId) {
        let produces = vec![(expr.id, Fact::Type), (expr.id, Fact::Decl)];
        self.rule(produces, format!("creation of `{}`", expr.name), &expr.span, move |ctx| {
            let symbols = ctx.symbols();
            let decl = match symbols.lookup(scope, &expr.name, expr.span.start.0) {
                Ok(decl) => decl,
                Err(kind) => {
                    ctx.error(kind, &expr.span);
                    return Ok(());
                }
            };

            match symbols.decl(decl).named_type() {
                Some(ty @ Type::Box(_)) => {
                    ctx.set_decl(expr.id, decl);
                    ctx.set_type(expr.id, ty);
                }
                _ => ctx.error(
                    SemanticErrorKind::mismatch(format!("`{}` does not name a box", expr.name)),
                    &expr.span,
                ),
            }
            Ok(())
        });
    }
}

/// Resolves every name and checks every type of `program`.
///
/// All errors are collected, sorted by source position, and returned
/// together; a failing construct never produces follow-up errors in the
/// constructs depending on it.
#[tracing::instrument(skip_all)]
pub fn resolve(program: &Program) -> Result<Annotations, Vec<SemanticError>> {
    let mut checker = TypeChecker::new();
    let builtin = checker.symbols.builtin_scope();
    let root = checker.symbols.push_scope(ScopeKind::Root, Some(builtin));
    checker.walk_statements(&program.body, root);

    let TypeChecker {
        symbols,
        mut reactor,
        mut errors,
        ..
    } = checker;

    reactor.run(&symbols);
    let (facts, reactor_errors) = reactor.into_parts();
    errors.extend(reactor_errors);

    if errors.is_empty() {
        debug!(facts = facts.len(), "program resolved");
        Ok(Annotations { facts, symbols })
    } else {
        debug!(errors = errors.len(), "program rejected");
        errors.sort_by_key(|error| error.span().start.0);
        Err(errors)
    }
}

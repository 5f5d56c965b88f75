//! Fixpoint evaluation of semantic rules.
//!
//! The tree walk registers [`Rule`]s. Each rule produces a few facts about
//! nodes and may read facts produced by other rules. Reading a fact that is
//! not known yet suspends the rule; it is retried on the next pass. Passes
//! run until one completes no rule, so evaluation does not depend on the
//! order in which rules were registered.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::{
    ast::ast::NodeId,
    errors::errors::{SemanticError, SemanticErrorKind},
    Span,
};

use super::{
    scope::{DeclId, SymbolTable},
    types::Type,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fact {
    /// Type of an expression, or the type a type annotation denotes.
    Type,
    /// Declaration a reference resolves to.
    Decl,
    /// Type of the entity a declaration node declares.
    DeclType,
    /// Whether a statement always returns.
    Returns,
}

pub type FactKey = (NodeId, Fact);

#[derive(Debug, Clone, PartialEq)]
pub enum FactValue {
    Type(Type),
    Decl(DeclId),
    Flag(bool),
}

#[derive(Debug, Clone)]
enum Slot {
    Value(FactValue),
    /// The producing rule failed; readers are dropped without an error.
    Poisoned,
}

/// Why a rule could not complete.
#[derive(Debug, Clone, PartialEq)]
pub enum Suspend {
    Missing(FactKey),
    Poisoned,
}

pub type RuleFn<'a> = Box<dyn Fn(&mut RuleContext) -> Result<(), Suspend> + 'a>;

pub struct Rule<'a> {
    produces: Vec<FactKey>,
    /// Describes the rule in the error emitted if it never completes.
    what: String,
    span: Span,
    run: RuleFn<'a>,
}

impl<'a> Rule<'a> {
    pub fn new(produces: Vec<FactKey>, what: impl Into<String>, span: Span, run: RuleFn<'a>) -> Self {
        Rule {
            produces,
            what: what.into(),
            span,
            run,
        }
    }
}

/// View of the fact store handed to a running rule. Writes and errors are
/// buffered and only committed if the rule completes.
pub struct RuleContext<'r> {
    facts: &'r HashMap<FactKey, Slot>,
    symbols: &'r SymbolTable,
    writes: Vec<(FactKey, FactValue)>,
    errors: Vec<SemanticError>,
}

impl<'r> RuleContext<'r> {
    fn new(facts: &'r HashMap<FactKey, Slot>, symbols: &'r SymbolTable) -> Self {
        RuleContext {
            facts,
            symbols,
            writes: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn symbols(&self) -> &'r SymbolTable {
        self.symbols
    }

    fn get(&self, key: FactKey) -> Result<&FactValue, Suspend> {
        match self.facts.get(&key) {
            Some(Slot::Value(value)) => Ok(value),
            Some(Slot::Poisoned) => Err(Suspend::Poisoned),
            None => Err(Suspend::Missing(key)),
        }
    }

    fn get_type_fact(&self, node: NodeId, fact: Fact) -> Result<Type, Suspend> {
        match self.get((node, fact))? {
            FactValue::Type(ty) => Ok(ty.clone()),
            _ => Err(Suspend::Poisoned),
        }
    }

    pub fn get_type(&self, node: NodeId) -> Result<Type, Suspend> {
        self.get_type_fact(node, Fact::Type)
    }

    pub fn get_decl_type(&self, node: NodeId) -> Result<Type, Suspend> {
        self.get_type_fact(node, Fact::DeclType)
    }

    pub fn get_decl(&self, node: NodeId) -> Result<DeclId, Suspend> {
        match self.get((node, Fact::Decl))? {
            FactValue::Decl(decl) => Ok(*decl),
            _ => Err(Suspend::Poisoned),
        }
    }

    pub fn get_returns(&self, node: NodeId) -> Result<bool, Suspend> {
        match self.get((node, Fact::Returns))? {
            FactValue::Flag(flag) => Ok(*flag),
            _ => Err(Suspend::Poisoned),
        }
    }

    pub fn set_type(&mut self, node: NodeId, ty: Type) {
        self.writes.push(((node, Fact::Type), FactValue::Type(ty)));
    }

    pub fn set_decl_type(&mut self, node: NodeId, ty: Type) {
        self.writes.push(((node, Fact::DeclType), FactValue::Type(ty)));
    }

    pub fn set_decl(&mut self, node: NodeId, decl: DeclId) {
        self.writes.push(((node, Fact::Decl), FactValue::Decl(decl)));
    }

    pub fn set_returns(&mut self, node: NodeId, returns: bool) {
        self.writes.push(((node, Fact::Returns), FactValue::Flag(returns)));
    }

    pub fn error(&mut self, kind: SemanticErrorKind, span: &Span) {
        self.errors.push(SemanticError::new(kind, span.clone()));
    }
}

#[derive(Default)]
pub struct Reactor<'a> {
    facts: HashMap<FactKey, Slot>,
    rules: Vec<Rule<'a>>,
    errors: Vec<SemanticError>,
}

impl<'a> Reactor<'a> {
    pub fn new() -> Self {
        Reactor {
            facts: HashMap::new(),
            rules: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn add_rule(&mut self, rule: Rule<'a>) {
        self.rules.push(rule);
    }

    /// Records a fact known without evaluation (literal types and the like).
    pub fn seed(&mut self, key: FactKey, value: FactValue) {
        self.facts.insert(key, Slot::Value(value));
    }

    fn poison(&mut self, produces: &[FactKey]) {
        for key in produces {
            self.facts.entry(*key).or_insert(Slot::Poisoned);
        }
    }

    /// Evaluates every registered rule to a fixpoint.
    pub fn run(&mut self, symbols: &SymbolTable) {
        let mut pending = std::mem::take(&mut self.rules);
        let mut pass = 0;

        while !pending.is_empty() {
            pass += 1;
            let before = pending.len();
            let mut suspended = Vec::new();

            for rule in pending {
                let mut context = RuleContext::new(&self.facts, symbols);
                let outcome = (rule.run)(&mut context);
                let RuleContext { writes, errors, .. } = context;

                match outcome {
                    Ok(()) if errors.is_empty() => {
                        for (key, value) in writes {
                            self.facts.insert(key, Slot::Value(value));
                        }
                    }
                    Ok(()) => {
                        self.poison(&rule.produces);
                        self.errors.extend(errors);
                    }
                    Err(Suspend::Missing(key)) => {
                        trace!("{} waits for {:?} of {}", rule.what, key.1, key.0);
                        suspended.push(rule);
                    }
                    Err(Suspend::Poisoned) => self.poison(&rule.produces),
                }
            }

            debug!(pass, completed = before - suspended.len(), suspended = suspended.len(), "reactor pass");

            if suspended.len() == before {
                for rule in &suspended {
                    self.errors.push(SemanticError::new(
                        SemanticErrorKind::UnresolvedReference {
                            what: format!("{} (cycle or unresolved dependency)", rule.what),
                        },
                        rule.span.clone(),
                    ));
                }
                let stuck: Vec<FactKey> = suspended.iter().flat_map(|r| r.produces.clone()).collect();
                self.poison(&stuck);
                break;
            }

            pending = suspended;
        }
    }

    pub fn errors(&self) -> &[SemanticError] {
        &self.errors
    }

    /// Known facts (poisoned slots dropped) and collected errors.
    pub fn into_parts(self) -> (HashMap<FactKey, FactValue>, Vec<SemanticError>) {
        let facts = self
            .facts
            .into_iter()
            .filter_map(|(key, slot)| match slot {
                Slot::Value(value) => Some((key, value)),
                Slot::Poisoned => None,
            })
            .collect();

        (facts, self.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule<'a>(
        produces: Vec<FactKey>,
        what: &str,
        run: impl Fn(&mut RuleContext) -> Result<(), Suspend> + 'a,
    ) -> Rule<'a> {
        Rule::new(produces, what, Span::null(), Box::new(run))
    }

    #[test]
    fn test_rules_complete_in_any_order() {
        let symbols = SymbolTable::new();
        let mut reactor = Reactor::new();

        // #2 depends on #1 which is registered later
        reactor.add_rule(rule(vec![(NodeId(2), Fact::Type)], "array", |ctx| {
            let component = ctx.get_type(NodeId(1))?;
            ctx.set_type(NodeId(2), Type::array_of(component));
            Ok(())
        }));
        reactor.add_rule(rule(vec![(NodeId(1), Fact::Type)], "int", |ctx| {
            ctx.set_type(NodeId(1), Type::Int);
            Ok(())
        }));

        reactor.run(&symbols);
        let (facts, errors) = reactor.into_parts();

        assert!(errors.is_empty());
        assert_eq!(
            facts.get(&(NodeId(2), Fact::Type)),
            Some(&FactValue::Type(Type::array_of(Type::Int)))
        );
    }

    #[test]
    fn test_errors_poison_without_cascading() {
        let symbols = SymbolTable::new();
        let mut reactor = Reactor::new();

        reactor.add_rule(rule(vec![(NodeId(1), Fact::Type)], "failing", |ctx| {
            ctx.set_type(NodeId(1), Type::Int);
            ctx.error(SemanticErrorKind::mismatch("boom"), &Span::null());
            Ok(())
        }));
        reactor.add_rule(rule(vec![(NodeId(2), Fact::Type)], "reader", |ctx| {
            let ty = ctx.get_type(NodeId(3))?;
            ctx.set_type(NodeId(2), ty);
            Ok(())
        }));
        reactor.add_rule(rule(vec![(NodeId(3), Fact::Type)], "middle", |ctx| {
            let ty = ctx.get_type(NodeId(1))?;
            ctx.set_type(NodeId(3), ty);
            Ok(())
        }));

        reactor.run(&symbols);
        let (facts, errors) = reactor.into_parts();

        // writes of a failing rule are dropped along with every reader
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "boom");
        assert!(facts.is_empty());
    }

    #[test]
    fn test_suspended_attempt_discards_writes() {
        let symbols = SymbolTable::new();
        let mut reactor = Reactor::new();

        reactor.add_rule(rule(vec![(NodeId(1), Fact::Decl)], "partial", |ctx| {
            ctx.error(SemanticErrorKind::mismatch("only once"), &Span::null());
            let _ = ctx.get_returns(NodeId(2))?;
            Ok(())
        }));
        reactor.add_rule(rule(vec![(NodeId(2), Fact::Returns)], "returns", |ctx| {
            ctx.set_returns(NodeId(2), true);
            Ok(())
        }));

        reactor.run(&symbols);
        assert_eq!(reactor.errors().len(), 1);
    }

    #[test]
    fn test_cycle_is_reported_once_per_rule() {
        let symbols = SymbolTable::new();
        let mut reactor = Reactor::new();

        reactor.add_rule(rule(vec![(NodeId(1), Fact::Type)], "type of a", |ctx| {
            let ty = ctx.get_type(NodeId(2))?;
            ctx.set_type(NodeId(1), ty);
            Ok(())
        }));
        reactor.add_rule(rule(vec![(NodeId(2), Fact::Type)], "type of b", |ctx| {
            let ty = ctx.get_type(NodeId(1))?;
            ctx.set_type(NodeId(2), ty);
            Ok(())
        }));

        reactor.run(&symbols);
        let (facts, errors) = reactor.into_parts();

        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| matches!(e.kind(), SemanticErrorKind::UnresolvedReference { .. })));
        assert!(errors[0].message().contains("type of a"));
        assert!(facts.is_empty());
    }
}

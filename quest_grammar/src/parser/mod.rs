//! Parser for quest grammar text.
//!
//! Wraps the Pest-generated grammar with helpers that build the rule map and
//! check it for undefined references and unproductive recursion.

use pest::Parser;
use pest_derive::Parser as PestParser;

use log::debug;
use std::collections::HashMap;

use crate::TaskToken;

mod heights;

#[derive(PestParser)]
#[grammar = "src/grammar.pest"]
struct QuestGrammarParser;

/// Errors raised while parsing grammar text or selecting a start rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrammarError {
    #[error("parse error: {0}")]
    Pest(String),
    #[error("unexpected grammar shape: {0}")]
    Shape(&'static str),
    #[error("grammar defines no rules")]
    Empty,
    #[error("rule <{0}> is defined more than once")]
    DuplicateRule(String),
    #[error("rule <{rule}> refers to undefined nonterminal <{missing}>")]
    UndefinedReference { rule: String, missing: String },
    #[error("rule <{0}> can never finish expanding")]
    Unproductive(String),
    #[error("bad task token \"{token}\": {reason}")]
    BadToken { token: String, reason: &'static str },
    #[error("unknown rule <{0}>")]
    UnknownRule(String),
}

/// A symbol on the right-hand side of a production.
#[derive(Debug, Clone, PartialEq, Eq, variantly::Variantly)]
pub enum Symbol {
    Terminal(TaskToken),
    NonTerminal(String),
}

/// One alternative of a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub symbols: Vec<Symbol>,
    /// Depth of the shortest complete expansion of this production.
    pub height: usize,
}

impl Production {
    pub fn references(&self, rule: &str) -> bool {
        self.symbols
            .iter()
            .any(|s| matches!(s, Symbol::NonTerminal(name) if name == rule))
    }
}

/// A nonterminal and its ordered alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarRule {
    pub name: String,
    pub productions: Vec<Production>,
    /// Minimum height over all productions.
    pub height: usize,
}

impl GrammarRule {
    /// Alternatives whose height equals the rule's minimum.
    pub fn shortest(&self) -> impl Iterator<Item = &Production> {
        self.productions.iter().filter(|p| p.height == self.height)
    }
}

/// Parsed and checked quest grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    rules: HashMap<String, GrammarRule>,
    order: Vec<String>,
}

impl Grammar {
    pub fn rule(&self, name: &str) -> Option<&GrammarRule> {
        self.rules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Rule names in source order.
    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Parse grammar text into a checked [`Grammar`].
///
/// # Errors
/// Returns an error on syntax errors, malformed task tokens, duplicate rules,
/// references to undefined nonterminals, or rules that cannot terminate.
pub fn parse_grammar(source: &str) -> Result<Grammar, GrammarError> {
    let mut pairs =
        QuestGrammarParser::parse(Rule::grammar, source).map_err(|e| GrammarError::Pest(e.to_string()))?;
    let top = pairs.next().ok_or(GrammarError::Shape("expected grammar"))?;

    let mut raw: Vec<(String, Vec<Vec<Symbol>>)> = Vec::new();
    for rule_pair in top.into_inner() {
        if rule_pair.as_rule() != Rule::rule_def {
            continue;
        }
        let mut it = rule_pair.into_inner();
        let name = nonterminal_name(it.next().ok_or(GrammarError::Shape("rule name"))?)?;
        let alternatives = it.next().ok_or(GrammarError::Shape("rule alternatives"))?;
        let mut productions = Vec::new();
        for prod in alternatives.into_inner() {
            let mut symbols = Vec::new();
            for sym in prod.into_inner() {
                match sym.as_rule() {
                    Rule::nonterminal => symbols.push(Symbol::NonTerminal(nonterminal_name(sym)?)),
                    Rule::terminal => {
                        let body = sym.into_inner().next().ok_or(GrammarError::Shape("terminal body"))?;
                        symbols.push(Symbol::Terminal(TaskToken::parse(body.as_str())?));
                    },
                    _ => return Err(GrammarError::Shape("unexpected symbol")),
                }
            }
            productions.push(symbols);
        }
        raw.push((name, productions));
    }

    build_grammar(raw)
}

fn nonterminal_name(pair: pest::iterators::Pair<Rule>) -> Result<String, GrammarError> {
    pair.into_inner()
        .next()
        .map(|ident| ident.as_str().to_string())
        .ok_or(GrammarError::Shape("nonterminal name"))
}

fn build_grammar(raw: Vec<(String, Vec<Vec<Symbol>>)>) -> Result<Grammar, GrammarError> {
    if raw.is_empty() {
        return Err(GrammarError::Empty);
    }
    let mut order = Vec::new();
    let mut bodies: HashMap<String, Vec<Vec<Symbol>>> = HashMap::new();
    for (name, productions) in raw {
        if bodies.contains_key(&name) {
            return Err(GrammarError::DuplicateRule(name));
        }
        order.push(name.clone());
        bodies.insert(name, productions);
    }

    for name in &order {
        for production in &bodies[name] {
            for symbol in production {
                if let Symbol::NonTerminal(target) = symbol
                    && !bodies.contains_key(target)
                {
                    return Err(GrammarError::UndefinedReference {
                        rule: name.clone(),
                        missing: target.clone(),
                    });
                }
            }
        }
    }

    let rule_heights = heights::rule_heights(&order, &bodies)?;
    let mut rules = HashMap::new();
    for (name, productions) in bodies {
        let productions: Vec<Production> = productions
            .into_iter()
            .map(|symbols| {
                let height = heights::production_height(&symbols, &rule_heights).unwrap_or(usize::MAX);
                Production { symbols, height }
            })
            .collect();
        let height = rule_heights.get(&name).copied().unwrap_or(usize::MAX);
        rules.insert(
            name.clone(),
            GrammarRule {
                name,
                productions,
                height,
            },
        );
    }
    debug!("parsed quest grammar with {} rules", order.len());
    Ok(Grammar { rules, order })
}

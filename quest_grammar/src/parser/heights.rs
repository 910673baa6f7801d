//! Termination heights.
//!
//! The height of a rule is the depth of its shortest complete expansion: a production of
//! terminals only has height 1, and a production's height is one more than the tallest
//! nonterminal it references. Always expanding a minimal-height production therefore
//! strictly decreases height, which is what lets the generator force termination.

use std::collections::HashMap;

use super::{GrammarError, Symbol};

/// Height of a production, or `None` if it references a rule without a known height.
pub(super) fn production_height(symbols: &[Symbol], rule_heights: &HashMap<String, usize>) -> Option<usize> {
    let mut tallest = 0;
    for symbol in symbols {
        if let Symbol::NonTerminal(name) = symbol {
            tallest = tallest.max(*rule_heights.get(name)?);
        }
    }
    Some(tallest + 1)
}

/// Fixpoint over all rules. Fails on the first rule (in source order) that never terminates.
pub(super) fn rule_heights(
    order: &[String],
    bodies: &HashMap<String, Vec<Vec<Symbol>>>,
) -> Result<HashMap<String, usize>, GrammarError> {
    let mut heights: HashMap<String, usize> = HashMap::new();
    loop {
        let mut changed = false;
        for name in order {
            let best = bodies[name]
                .iter()
                .filter_map(|symbols| production_height(symbols, &heights))
                .min();
            if let Some(best) = best
                && heights.get(name).is_none_or(|h| best < *h)
            {
                heights.insert(name.clone(), best);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    match order.iter().find(|name| !heights.contains_key(*name)) {
        Some(name) => Err(GrammarError::Unproductive(name.clone())),
        None => Ok(heights),
    }
}

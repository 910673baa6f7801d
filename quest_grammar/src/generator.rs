//! Quest generator.
//!
//! Recursively expands a start rule into an abstract [`Quest`]. Every reference to the
//! configured quest rule below the root becomes a nested sub-quest. Expansion keeps a
//! running quest count and a depth counter; once the quest budget is used up or the depth
//! limit is reached, only minimal-height alternatives are chosen, so expansion always ends.

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::parser::{Grammar, GrammarRule, Production, Symbol};
use crate::{GrammarError, Motive, Quest, default_grammar};

/// How an alternative is picked when selection is not forced.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoicePolicy {
    /// Every alternative is equally likely.
    #[default]
    Uniform,
    /// Alternatives are weighted by `1 / (1 + height)`.
    PreferShorter,
}

/// Generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenConfig {
    /// Rule expanded at the root.
    pub start_rule: String,
    /// References to this rule below the root become nested sub-quests.
    pub quest_rule: String,
    pub min_quests: usize,
    pub max_quests: usize,
    /// Expansion depth after which only minimal-height alternatives are chosen.
    pub max_depth: usize,
    /// Attempts made to land the quest count inside `min_quests..=max_quests`.
    pub max_tries: usize,
    /// Probability of choosing a minimal-height alternative even when not forced.
    pub termination_bias: f64,
    pub policy: ChoicePolicy,
    pub seed: Option<u64>,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            start_rule: "QUEST".to_string(),
            quest_rule: "QUEST".to_string(),
            min_quests: 1,
            max_quests: 3,
            max_depth: 16,
            max_tries: 32,
            termination_bias: 0.0,
            policy: ChoicePolicy::Uniform,
            seed: None,
        }
    }
}

impl GenConfig {
    /// Start generation from `rule`, keeping the other settings.
    pub fn with_start_rule(mut self, rule: impl Into<String>) -> Self {
        self.start_rule = rule.into();
        self
    }

    fn accepts(&self, quest: &Quest) -> bool {
        (self.min_quests..=self.max_quests).contains(&quest.num_quests())
    }

    /// How far a quest's count lies outside the accepted range.
    fn miss(&self, quest: &Quest) -> usize {
        let n = quest.num_quests();
        self.min_quests.saturating_sub(n) + n.saturating_sub(self.max_quests)
    }
}

/// Expands grammar rules into abstract quests.
pub struct QuestGen {
    grammar: Grammar,
    config: GenConfig,
    rng: StdRng,
}

impl QuestGen {
    pub fn new(grammar: Grammar, config: GenConfig) -> QuestGen {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        QuestGen { grammar, config, rng }
    }

    /// Generator over the bundled default grammar.
    ///
    /// # Errors
    /// Only if the bundled grammar fails to parse.
    pub fn with_default_grammar(config: GenConfig) -> Result<QuestGen, GrammarError> {
        Ok(QuestGen::new(default_grammar()?, config))
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn config(&self) -> &GenConfig {
        &self.config
    }

    /// Generate with the generator's own configuration.
    ///
    /// # Errors
    /// Returns [`GrammarError::UnknownRule`] if the configured start rule does not exist.
    pub fn gen_quest(&mut self) -> Result<Quest, GrammarError> {
        let conf = self.config.clone();
        self.gen_quest_with_conf(&conf)
    }

    /// Generate a quest starting at the rule a motive maps to.
    ///
    /// # Errors
    /// Returns [`GrammarError::UnknownRule`] if the grammar has no rule for the motive.
    pub fn gen_quest_with_motive(&mut self, motive: Motive) -> Result<Quest, GrammarError> {
        let conf = self.config.clone().with_start_rule(motive.start_rule());
        let mut quest = self.gen_quest_with_conf(&conf)?;
        quest.set_motive(Some(motive));
        Ok(quest)
    }

    /// Generate a quest with explicit parameters.
    ///
    /// Attempts whose quest count falls outside `min_quests..=max_quests` are retried; if no
    /// attempt fits, the closest one is returned.
    ///
    /// # Errors
    /// Returns [`GrammarError::UnknownRule`] if `conf.start_rule` does not exist.
    pub fn gen_quest_with_conf(&mut self, conf: &GenConfig) -> Result<Quest, GrammarError> {
        let grammar = &self.grammar;
        let start = grammar
            .rule(&conf.start_rule)
            .ok_or_else(|| GrammarError::UnknownRule(conf.start_rule.clone()))?;
        let conf = normalized(conf);

        let mut best = Expansion::new(grammar, &conf, &mut self.rng).run(start);
        if conf.accepts(&best) {
            debug!("quest generated from <{}> on first attempt", conf.start_rule);
            return Ok(best);
        }
        for attempt in 2..=conf.max_tries {
            let quest = Expansion::new(grammar, &conf, &mut self.rng).run(start);
            if conf.accepts(&quest) {
                debug!("quest generated from <{}> on attempt {attempt}", conf.start_rule);
                return Ok(quest);
            }
            if conf.miss(&quest) < conf.miss(&best) {
                best = quest;
            }
        }
        warn!(
            "no quest from <{}> within {}..={} quests after {} tries; using one with {}",
            conf.start_rule,
            conf.min_quests,
            conf.max_quests,
            conf.max_tries,
            best.num_quests()
        );
        Ok(best)
    }
}

fn normalized(conf: &GenConfig) -> GenConfig {
    let mut conf = conf.clone();
    conf.max_quests = conf.max_quests.max(1);
    conf.min_quests = conf.min_quests.clamp(1, conf.max_quests);
    conf.max_tries = conf.max_tries.max(1);
    conf.termination_bias = if conf.termination_bias.is_nan() {
        0.0
    } else {
        conf.termination_bias.clamp(0.0, 1.0)
    };
    conf
}

/// State of one expansion attempt.
struct Expansion<'a> {
    grammar: &'a Grammar,
    conf: &'a GenConfig,
    rng: &'a mut StdRng,
    quests: usize,
}

impl<'a> Expansion<'a> {
    fn new(grammar: &'a Grammar, conf: &'a GenConfig, rng: &'a mut StdRng) -> Self {
        Self {
            grammar,
            conf,
            rng,
            quests: 1,
        }
    }

    fn run(mut self, start: &'a GrammarRule) -> Quest {
        let mut root = Quest::new();
        self.expand(start, 0, &mut root);
        info!(
            "expanded <{}>: {} quests, {} steps",
            start.name,
            root.num_quests(),
            root.num_steps()
        );
        root
    }

    fn expand(&mut self, rule: &'a GrammarRule, depth: usize, quest: &mut Quest) {
        let forced = self.quests >= self.conf.max_quests || depth >= self.conf.max_depth;
        let production = self.choose(rule, forced);
        for symbol in &production.symbols {
            match symbol {
                Symbol::Terminal(task) => quest.add_task(task.clone()),
                Symbol::NonTerminal(name) => {
                    let Some(next) = self.grammar.rule(name) else {
                        // references are checked at parse time
                        continue;
                    };
                    if *name == self.conf.quest_rule {
                        self.quests += 1;
                        let mut sub = Quest::new();
                        self.expand(next, depth + 1, &mut sub);
                        quest.add_quest(sub);
                    } else {
                        self.expand(next, depth + 1, quest);
                    }
                },
            }
        }
    }

    fn choose(&mut self, rule: &'a GrammarRule, forced: bool) -> &'a Production {
        let productions = &rule.productions;
        let shortest: Vec<&'a Production> = rule.shortest().collect();
        let fallback = shortest[0];
        if productions.len() == 1 {
            return fallback;
        }
        let bias = self.conf.termination_bias;
        if forced || (bias > 0.0 && self.rng.random_bool(bias)) {
            return shortest.choose(&mut *self.rng).copied().unwrap_or(fallback);
        }
        match self.conf.policy {
            ChoicePolicy::Uniform => productions.choose(&mut *self.rng).unwrap_or(fallback),
            ChoicePolicy::PreferShorter => productions
                .choose_weighted(&mut *self.rng, |p| 1.0 / (1.0 + p.height as f64))
                .unwrap_or(fallback),
        }
    }
}

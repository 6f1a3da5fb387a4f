//! Grammar compilation.
//!
//! Three passes over the grammar:
//!
//! 1. Compile every rule and `default` entry where it is written: pattern,
//!    action and transition. All name resolution and validation happens
//!    here, so errors point at the entry as written.
//! 2. Flatten each state: `include` entries are replaced, depth first, by
//!    the included state's flattened rules. A state reached again while it
//!    is still being flattened is an include cycle.
//! 3. Fill combined states, interned by their part list, with the
//!    concatenated rules of their parts.

use crate::action::{Action, Delegate, GroupAction};
use crate::error::BuildError;
use crate::grammar::{Entry, Grammar, Next};
use crate::pattern::Pattern;
use crate::stack::ensure_sufficient_stack;
use crate::table::{
    CompiledDelegate, CompiledGroup, Rule, RuleAction, StackOp, State, StateId, StateTable,
    Transition,
};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::{debug, warn};

/// Where an entry is written, for error reporting.
#[derive(Copy, Clone)]
struct Site<'g> {
    state: &'g str,
    index: usize,
}

/// Flattened rule list of a named state, as keys into `Compiler::rules`.
type Flat = Vec<(StateId, usize)>;

pub(crate) fn compile(grammar: &Grammar, extended: bool) -> Result<StateTable, BuildError> {
    let mut compiler = Compiler::new(grammar, extended)?;
    compiler.compile_entries()?;
    let flat = compiler.flatten_all()?;
    Ok(compiler.finish(&flat))
}

struct Compiler<'g> {
    grammar: &'g Grammar,
    extended: bool,
    names: Vec<&'g str>,
    index: FxHashMap<&'g str, StateId>,
    root: StateId,
    rules: FxHashMap<(StateId, usize), Rule>,
    combined: FxHashMap<Vec<StateId>, StateId>,
    /// Combined states in id order.
    combined_parts: Vec<Vec<StateId>>,
}

impl<'g> Compiler<'g> {
    fn new(grammar: &'g Grammar, extended: bool) -> Result<Self, BuildError> {
        let names: Vec<&'g str> = grammar.state_names().collect();
        let index: FxHashMap<&'g str, StateId> = names
            .iter()
            .enumerate()
            .map(|(i, &name)| (name, StateId::new(i)))
            .collect();
        let root = index
            .get("root")
            .copied()
            .ok_or_else(|| BuildError::MissingRoot {
                grammar: grammar.name().to_owned(),
            })?;
        Ok(Compiler {
            grammar,
            extended,
            names,
            index,
            root,
            rules: FxHashMap::default(),
            combined: FxHashMap::default(),
            combined_parts: Vec::new(),
        })
    }

    fn entries(&self, id: StateId) -> &'g [Entry] {
        let grammar: &'g Grammar = self.grammar;
        self.names
            .get(id.index())
            .and_then(|name| grammar.entries(name))
            .unwrap_or_default()
    }

    // === Pass 1: entries ===

    fn compile_entries(&mut self) -> Result<(), BuildError> {
        for i in 0..self.names.len() {
            let id = StateId::new(i);
            let state = self.names[i];
            for (index, entry) in self.entries(id).iter().enumerate() {
                let site = Site { state, index };
                let rule = match entry {
                    Entry::Rule(spec) => {
                        let pattern = self.pattern(&spec.pattern, site)?;
                        let action = self.action(&spec.action, site)?;
                        let transition = self.transition(&spec.next, site)?;
                        self.check_zero_width(&pattern, &transition, site)?;
                        Rule::new(pattern, action, transition)
                    }
                    Entry::Default(next) => {
                        let pattern = self.pattern("", site)?;
                        let transition = self.transition(next, site)?;
                        self.check_zero_width(&pattern, &transition, site)?;
                        Rule::new(pattern, RuleAction::Silent, transition)
                    }
                    Entry::Include(target) => {
                        self.resolve(target, site)?;
                        continue;
                    }
                    // Markers left after inheritance resolution splice nothing.
                    Entry::Inherit => continue,
                };
                self.rules.insert((id, index), rule);
            }
        }
        Ok(())
    }

    fn pattern(&self, source: &str, site: Site<'_>) -> Result<Pattern, BuildError> {
        Pattern::new(source, self.grammar.regex_flags()).map_err(|message| {
            BuildError::InvalidPattern {
                grammar: self.grammar.name().to_owned(),
                state: site.state.to_owned(),
                index: site.index,
                message,
            }
        })
    }

    /// A rule that consumes nothing and changes nothing would loop; reject
    /// it when the pattern can only match empty, and warn when it merely
    /// can.
    fn check_zero_width(
        &self,
        pattern: &Pattern,
        transition: &Transition,
        site: Site<'_>,
    ) -> Result<(), BuildError> {
        if !transition.is_stay() {
            return Ok(());
        }
        if pattern.only_matches_empty() {
            return Err(BuildError::ZeroWidthRule {
                grammar: self.grammar.name().to_owned(),
                state: site.state.to_owned(),
                index: site.index,
            });
        }
        if pattern.can_match_empty() {
            warn!(
                grammar = self.grammar.name(),
                state = site.state,
                index = site.index,
                pattern = pattern.as_str(),
                "rule can match the empty string without a transition"
            );
        }
        Ok(())
    }

    fn action(&self, action: &Action, site: Site<'_>) -> Result<RuleAction, BuildError> {
        Ok(match action {
            Action::Token(kind) => RuleAction::Token(*kind),
            Action::ByGroups(groups) => RuleAction::ByGroups(
                groups
                    .iter()
                    .map(|group| match group {
                        GroupAction::Token(kind) => Ok(CompiledGroup::Token(*kind)),
                        GroupAction::Using(delegate) => {
                            self.delegate(delegate, site).map(CompiledGroup::Using)
                        }
                    })
                    .collect::<Result<_, _>>()?,
            ),
            Action::Using(delegate) => RuleAction::Using(self.delegate(delegate, site)?),
            Action::Callback(callback) => RuleAction::Callback(callback.clone()),
            Action::Context(callback) => {
                if !self.extended {
                    return Err(BuildError::ContextActionInPlainLexer {
                        grammar: self.grammar.name().to_owned(),
                        state: site.state.to_owned(),
                        index: site.index,
                    });
                }
                RuleAction::Context(callback.clone())
            }
        })
    }

    fn delegate(&self, delegate: &Delegate, site: Site<'_>) -> Result<CompiledDelegate, BuildError> {
        match delegate {
            Delegate::This(stack) if stack.is_empty() => {
                Ok(CompiledDelegate::This(SmallVec::from_elem(self.root, 1)))
            }
            Delegate::This(stack) => stack
                .iter()
                .map(|name| self.resolve(name, site))
                .collect::<Result<_, _>>()
                .map(CompiledDelegate::This),
            Delegate::Lexer(lexer) => Ok(CompiledDelegate::Lexer(lexer.clone())),
        }
    }

    fn resolve(&self, name: &str, site: Site<'_>) -> Result<StateId, BuildError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| BuildError::UnknownState {
                grammar: self.grammar.name().to_owned(),
                state: site.state.to_owned(),
                index: site.index,
                target: name.to_owned(),
            })
    }

    fn transition(&mut self, next: &Next, site: Site<'_>) -> Result<Transition, BuildError> {
        let mut ops = SmallVec::new();
        self.lower(next, &mut ops, site)?;
        Ok(Transition::new(ops))
    }

    fn lower(
        &mut self,
        next: &Next,
        ops: &mut SmallVec<[StackOp; 2]>,
        site: Site<'_>,
    ) -> Result<(), BuildError> {
        match next {
            Next::Stay => {}
            Next::Push(name) => ops.push(StackOp::Push(self.resolve(name, site)?)),
            Next::PushSelf => ops.push(StackOp::PushTop),
            Next::Pop(0) => {
                return Err(BuildError::ZeroPop {
                    grammar: self.grammar.name().to_owned(),
                    state: site.state.to_owned(),
                    index: site.index,
                })
            }
            Next::Pop(count) => ops.push(StackOp::Pop(*count)),
            Next::Seq(steps) => {
                for step in steps {
                    self.lower(step, ops, site)?;
                }
            }
            Next::Combined(names) => {
                if names.is_empty() {
                    return Err(BuildError::EmptyCombined {
                        grammar: self.grammar.name().to_owned(),
                        state: site.state.to_owned(),
                        index: site.index,
                    });
                }
                let parts = names
                    .iter()
                    .map(|name| self.resolve(name, site))
                    .collect::<Result<Vec<_>, _>>()?;
                ops.push(StackOp::Push(self.intern_combined(parts)));
            }
        }
        Ok(())
    }

    fn intern_combined(&mut self, parts: Vec<StateId>) -> StateId {
        if let Some(&id) = self.combined.get(&parts) {
            return id;
        }
        let id = StateId::new(self.names.len() + self.combined_parts.len());
        self.combined.insert(parts.clone(), id);
        self.combined_parts.push(parts);
        id
    }

    // === Pass 2: includes ===

    fn flatten_all(&self) -> Result<Vec<Flat>, BuildError> {
        let mut memo: Vec<Option<Flat>> = vec![None; self.names.len()];
        let mut chain = Vec::new();
        for i in 0..self.names.len() {
            self.flatten(StateId::new(i), &mut memo, &mut chain)?;
        }
        Ok(memo.into_iter().map(Option::unwrap_or_default).collect())
    }

    fn flatten(
        &self,
        id: StateId,
        memo: &mut [Option<Flat>],
        chain: &mut Vec<StateId>,
    ) -> Result<(), BuildError> {
        if memo[id.index()].is_some() {
            return Ok(());
        }
        if let Some(at) = chain.iter().position(|&seen| seen == id) {
            let mut cycle: Vec<String> = chain[at..]
                .iter()
                .map(|seen| self.names[seen.index()].to_owned())
                .collect();
            cycle.push(self.names[id.index()].to_owned());
            return Err(BuildError::IncludeCycle {
                grammar: self.grammar.name().to_owned(),
                chain: cycle,
            });
        }

        chain.push(id);
        let state = self.names[id.index()];
        let mut flat = Flat::new();
        for (index, entry) in self.entries(id).iter().enumerate() {
            match entry {
                Entry::Rule(_) | Entry::Default(_) => flat.push((id, index)),
                Entry::Include(target) => {
                    let target = self.resolve(target, Site { state, index })?;
                    ensure_sufficient_stack(|| self.flatten(target, memo, chain))?;
                    flat.extend_from_slice(memo[target.index()].as_deref().unwrap_or_default());
                }
                Entry::Inherit => {}
            }
        }
        chain.pop();
        memo[id.index()] = Some(flat);
        Ok(())
    }

    // === Pass 3: assembly ===

    fn finish(self, flat: &[Flat]) -> StateTable {
        let mut states: Vec<State> = self
            .names
            .iter()
            .zip(flat)
            .map(|(name, keys)| State::new((*name).to_owned(), self.collect_rules(keys)))
            .collect();

        for parts in &self.combined_parts {
            let name = parts
                .iter()
                .map(|part| self.names[part.index()])
                .collect::<Vec<_>>()
                .join("+");
            let rules = parts
                .iter()
                .flat_map(|part| states[part.index()].rules().iter().cloned())
                .collect();
            states.push(State::new(name, rules));
        }

        debug!(
            grammar = self.grammar.name(),
            named = self.names.len(),
            combined = self.combined_parts.len(),
            rules = states.iter().map(|s| s.rules().len()).sum::<usize>(),
            "compiled state table"
        );

        let index = self
            .index
            .iter()
            .map(|(&name, &id)| (name.to_owned(), id))
            .collect();
        StateTable::from_parts(
            self.grammar.name().to_owned(),
            states,
            index,
            self.combined,
            self.root,
        )
    }

    fn collect_rules(&self, keys: &[(StateId, usize)]) -> Vec<Rule> {
        keys.iter()
            .filter_map(|key| self.rules.get(key).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests;

//! The mutable NFA graph the compiler assembles fragments into.

use std::fmt;

use indexmap::{IndexMap, IndexSet};

/// A state identity, unique for the lifetime of one compilation.
pub type StateId = u32;

/// A transition label: an ordinary character or the epsilon marker.
///
/// Epsilon labels spontaneous moves and is never a member of the alphabet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    Epsilon,
    Char(char),
}

impl Symbol {
    pub fn is_epsilon(self) -> bool {
        matches!(self, Symbol::Epsilon)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Symbol::Epsilon => write!(f, "ε"),
            Symbol::Char(c) => write!(f, "{}", c),
        }
    }
}

/// A nondeterministic finite automaton: a set of owned states, at most one
/// start state, a set of accepting states, a transition relation keyed by
/// `(state, symbol)`, and an alphabet of ordinary symbols.
///
/// This is a passive container. It holds no execution or simulation logic;
/// callers walk the relation through the read accessors.
#[derive(Clone, Debug, Default)]
pub struct Nfa {
    states: IndexSet<StateId>,
    start: Option<StateId>,
    finals: IndexSet<StateId>,
    transitions: IndexMap<(StateId, Symbol), IndexSet<StateId>>,
    alphabet: IndexSet<char>,
}

impl Nfa {
    /// An automaton with no states, no start state, an empty accepting set
    /// and an empty alphabet.
    pub fn new() -> Nfa {
        Nfa::default()
    }

    /// Creates a fresh non-accepting state and installs it as the start
    /// state. Calling this twice reinstalls; the compiler owns that guard,
    /// not the model.
    pub fn add_start_state(&mut self, id: StateId) {
        self.states.insert(id);
        self.start = Some(id);
    }

    /// Creates a fresh accepting state.
    pub fn add_final_state(&mut self, id: StateId) {
        self.states.insert(id);
        self.finals.insert(id);
    }

    /// Adds `to` to the destination set for `(from, symbol)`. Both endpoints
    /// are registered as owned states. The alphabet is untouched: symbol
    /// registration is an explicit, separate operation.
    pub fn add_transition(&mut self, symbol: Symbol, from: StateId, to: StateId) {
        self.states.insert(from);
        self.states.insert(to);
        self.transitions
            .entry((from, symbol))
            .or_insert_with(IndexSet::new)
            .insert(to);
    }

    /// Removes a state from the accepting set without removing the state.
    pub fn set_non_final(&mut self, id: StateId) {
        self.finals.shift_remove(&id);
    }

    /// Transfers ownership of `other`'s states into this automaton, along
    /// with the accepting marks and transitions riding on them. Identities
    /// are never duplicated or renamed. `other`'s start state and alphabet
    /// do not survive the transfer.
    pub fn merge_states(&mut self, other: Nfa) {
        self.states.extend(other.states);
        self.finals.extend(other.finals);
        for ((from, symbol), targets) in other.transitions {
            self.transitions
                .entry((from, symbol))
                .or_insert_with(IndexSet::new)
                .extend(targets);
        }
    }

    /// Registers an ordinary symbol in the alphabet.
    pub fn add_symbol(&mut self, symbol: char) {
        self.alphabet.insert(symbol);
    }

    /// Replaces the alphabet wholesale. Used to stamp the accumulated
    /// alphabet onto the final automaton once compilation finishes.
    pub fn set_alphabet(&mut self, alphabet: IndexSet<char>) {
        self.alphabet = alphabet;
    }

    /// The start state, or `None` when no start state has been installed.
    pub fn start_state(&self) -> Option<StateId> {
        self.start
    }

    pub fn states(&self) -> &IndexSet<StateId> {
        &self.states
    }

    pub fn final_states(&self) -> &IndexSet<StateId> {
        &self.finals
    }

    pub fn alphabet(&self) -> &IndexSet<char> {
        &self.alphabet
    }

    pub fn is_final(&self, id: StateId) -> bool {
        self.finals.contains(&id)
    }

    /// The destination states for `(from, symbol)`; empty when the relation
    /// holds no such entry.
    pub fn targets(&self, from: StateId, symbol: Symbol) -> impl Iterator<Item = StateId> + '_ {
        self.transitions
            .get(&(from, symbol))
            .into_iter()
            .flatten()
            .copied()
    }

    /// Every `(from, symbol, to)` triple in the relation.
    pub fn transitions(&self) -> impl Iterator<Item = (StateId, Symbol, StateId)> + '_ {
        self.transitions
            .iter()
            .flat_map(|(&(from, symbol), targets)| {
                targets.iter().map(move |&to| (from, symbol, to))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::{Nfa, Symbol};
    use pretty_assertions::assert_eq;

    #[test]
    fn starts_empty() {
        let nfa = Nfa::new();
        assert_eq!(nfa.start_state(), None);
        assert!(nfa.states().is_empty());
        assert!(nfa.final_states().is_empty());
        assert!(nfa.alphabet().is_empty());
        assert_eq!(nfa.transitions().count(), 0);
    }

    #[test]
    fn start_and_final_states_are_owned() {
        let mut nfa = Nfa::new();
        nfa.add_start_state(0);
        nfa.add_final_state(1);

        assert_eq!(nfa.start_state(), Some(0));
        assert!(!nfa.is_final(0));
        assert!(nfa.is_final(1));
        assert_eq!(nfa.states().iter().copied().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn add_transition_registers_endpoints_but_not_symbols() {
        let mut nfa = Nfa::new();
        nfa.add_transition(Symbol::Char('a'), 3, 7);

        assert!(nfa.states().contains(&3));
        assert!(nfa.states().contains(&7));
        assert_eq!(nfa.targets(3, Symbol::Char('a')).collect::<Vec<_>>(), vec![7]);
        // alphabet tracking is the compiler's job
        assert!(nfa.alphabet().is_empty());
    }

    #[test]
    fn transitions_support_nondeterminism() {
        let mut nfa = Nfa::new();
        nfa.add_transition(Symbol::Char('a'), 0, 1);
        nfa.add_transition(Symbol::Char('a'), 0, 2);
        nfa.add_transition(Symbol::Char('a'), 0, 1);
        nfa.add_transition(Symbol::Epsilon, 1, 2);

        assert_eq!(nfa.targets(0, Symbol::Char('a')).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(nfa.targets(1, Symbol::Epsilon).collect::<Vec<_>>(), vec![2]);
        assert_eq!(nfa.targets(1, Symbol::Char('a')).count(), 0);
        assert_eq!(nfa.transitions().count(), 3);
    }

    #[test]
    fn set_non_final_keeps_the_state() {
        let mut nfa = Nfa::new();
        nfa.add_final_state(4);
        nfa.set_non_final(4);

        assert!(!nfa.is_final(4));
        assert!(nfa.states().contains(&4));
    }

    #[test]
    fn merge_states_transfers_ownership() {
        let mut a = Nfa::new();
        a.add_start_state(0);
        a.add_final_state(1);
        a.add_transition(Symbol::Char('x'), 0, 1);

        let mut b = Nfa::new();
        b.add_start_state(2);
        b.add_final_state(3);
        b.add_transition(Symbol::Char('y'), 2, 3);

        a.merge_states(b);

        // identities survive unchanged, b's start does not
        assert_eq!(a.start_state(), Some(0));
        assert_eq!(a.states().iter().copied().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert_eq!(
            a.final_states().iter().copied().collect::<Vec<_>>(),
            vec![1, 3]
        );
        assert_eq!(a.targets(2, Symbol::Char('y')).collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn alphabet_registration_is_explicit() {
        let mut nfa = Nfa::new();
        nfa.add_symbol('a');
        nfa.add_symbol('b');
        nfa.add_symbol('a');
        assert_eq!(nfa.alphabet().iter().copied().collect::<Vec<_>>(), vec!['a', 'b']);

        let replacement = ['z'].into_iter().collect();
        nfa.set_alphabet(replacement);
        assert_eq!(nfa.alphabet().iter().copied().collect::<Vec<_>>(), vec!['z']);
    }

    #[test]
    fn symbol_display() {
        assert_eq!(Symbol::Char('a').to_string(), "a");
        assert_eq!(Symbol::Epsilon.to_string(), "ε");
        assert!(Symbol::Epsilon.is_epsilon());
        assert!(!Symbol::Char('e').is_epsilon());
    }
}

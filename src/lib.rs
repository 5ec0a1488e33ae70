//! Convert regular expressions to nondeterministic finite automata.
//!
//! The supported pattern language is alternation `|`, concatenation, Kleene
//! star `*`, grouping with parentheses and `\`-escaping; every other
//! character is an ordinary case-sensitive symbol. Compilation is Thompson's
//! construction: one small automaton fragment per grammar production,
//! combined by union, concatenation and closure until a single automaton
//! covers the whole pattern.
//!
//! The produced [`Nfa`] is a passive graph of states, epsilon and character
//! transitions, a start state, accepting states and the pattern's alphabet,
//! for downstream consumers such as simulators or subset construction to
//! walk through its read accessors.
//!
//! ```
//! use mynfa::{compile, Symbol};
//!
//! let nfa = compile("(a|b)*c").unwrap();
//! let start = nfa.start_state().unwrap();
//! assert_eq!(nfa.alphabet().len(), 3);
//! assert!(nfa.targets(start, Symbol::Epsilon).count() > 0);
//! ```

pub mod automata;
pub mod errors;

pub use crate::automata::compiler::Compiler;
pub use crate::automata::nfa::{Nfa, StateId, Symbol};
pub use crate::errors::{Error, ErrorKind};

/// Compile `pattern` into its equivalent NFA.
pub fn compile(pattern: &str) -> Result<Nfa, Error> {
    Compiler::new(pattern).compile()
}

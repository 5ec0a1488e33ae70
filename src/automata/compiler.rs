use std::result;

use indexmap::IndexSet;

use crate::automata::nfa::{Nfa, StateId, Symbol};
use crate::errors::{Error, ErrorKind, Position, Span};

type Result<T> = result::Result<T, Error>;

/// Compiles a pattern into an equivalent NFA by Thompson's construction.
///
/// The compiler is a recursive descent over the grammar
///
/// ```text
/// regex  ::= term '|' regex | term
/// term   ::= { factor }
/// factor ::= base { '*' }
/// base   ::= ordinary-char | '\' any-char | '(' regex ')'
/// ```
///
/// and builds automaton fragments bottom-up in lockstep with the parse: one
/// two-state fragment per literal, combined by union, concatenation and
/// closure as the productions unwind.
pub struct Compiler {
    pattern: String,
    pos: usize,
    next_state: StateId,
    alphabet: IndexSet<char>,
}

impl Compiler {
    /// The pattern is not validated here; errors surface from [`compile`].
    ///
    /// [`compile`]: Compiler::compile
    pub fn new(pattern: &str) -> Compiler {
        Compiler {
            pattern: pattern.to_string(),
            pos: 0,
            next_state: 0,
            alphabet: IndexSet::new(),
        }
    }

    /// Parses the whole pattern and returns the final automaton with the
    /// accumulated alphabet stamped onto it.
    ///
    /// Consuming the compiler makes this a single-use operation: the cursor
    /// is spent by parsing. The empty pattern yields the empty automaton,
    /// which has no start state.
    pub fn compile(mut self) -> Result<Nfa> {
        let parsed = self.regex()?;
        if self.more() {
            // the grammar only ever stops short on a stray `)`
            let found = self.peek()?;
            return Err(self.error(self.span_char(found), ErrorKind::TrailingInput { found }));
        }

        let mut nfa = parsed.unwrap_or_default();
        nfa.set_alphabet(self.alphabet);
        Ok(nfa)
    }

    /// regex ::= term '|' regex | term
    fn regex(&mut self) -> Result<Option<Nfa>> {
        let term = self.term()?;

        if self.more() && self.peek()? == '|' {
            let operator = self.span_char('|');
            self.eat('|')?;
            let lhs = match term {
                Some(nfa) => nfa,
                None => return Err(self.missing_operand(operator)),
            };
            let rhs = match self.regex()? {
                Some(nfa) => nfa,
                None => return Err(self.missing_operand(operator)),
            };
            return Ok(Some(self.choice(lhs, rhs)));
        }

        Ok(term)
    }

    /// term ::= { factor }
    ///
    /// Zero or more factors, concatenated. Stops at a group boundary or an
    /// alternation operator; an empty term yields no fragment at all.
    fn term(&mut self) -> Result<Option<Nfa>> {
        let mut term: Option<Nfa> = None;

        while self.more() {
            let c = self.peek()?;
            if c == ')' || c == '|' {
                break;
            }
            let factor = self.factor()?;
            term = Some(self.sequence(term, factor));
        }

        Ok(term)
    }

    /// factor ::= base { '*' }
    fn factor(&mut self) -> Result<Nfa> {
        let mut base = self.base()?;

        while self.more() && self.peek()? == '*' {
            self.eat('*')?;
            base = self.repetition(base);
        }

        Ok(base)
    }

    /// base ::= ordinary-char | '\' any-char | '(' regex ')'
    ///
    /// An escape consumes the backslash and builds a primitive from the
    /// literal character that follows it, whatever that character is.
    fn base(&mut self) -> Result<Nfa> {
        match self.peek()? {
            '(' => {
                let open = Position::new(self.pos);
                self.eat('(')?;
                let inner = self.regex()?;
                self.eat(')')?;
                match inner {
                    Some(nfa) => Ok(nfa),
                    None => Err(self.error(
                        Span::new(open, Position::new(self.pos)),
                        ErrorKind::EmptyGroup,
                    )),
                }
            }
            '\\' => {
                self.eat('\\')?;
                let c = self.next()?;
                Ok(self.primitive(c))
            }
            _ => {
                let c = self.next()?;
                Ok(self.primitive(c))
            }
        }
    }

    /// Union of two fragments: one fresh start state with an epsilon edge
    /// into each operand's start state. Accepting states carry over
    /// unchanged, `a`'s before `b`'s.
    fn choice(&mut self, a: Nfa, b: Nfa) -> Nfa {
        let mut nfa = Nfa::new();
        let start = self.fresh_state();
        nfa.add_start_state(start);

        let a_start = start_of(&a);
        let b_start = start_of(&b);
        nfa.merge_states(a);
        nfa.merge_states(b);

        nfa.add_transition(Symbol::Epsilon, start, a_start);
        nfa.add_transition(Symbol::Epsilon, start, b_start);
        nfa
    }

    /// Concatenation. With `a` absent (the first factor of a term) the
    /// result is `b` verbatim. Otherwise every accepting state of `a` is
    /// demoted and wired by epsilon onto `b`'s start state, and `a` absorbs
    /// `b`'s states.
    fn sequence(&mut self, a: Option<Nfa>, b: Nfa) -> Nfa {
        let mut a = match a {
            Some(nfa) => nfa,
            None => return b,
        };

        let b_start = start_of(&b);
        let finals: Vec<StateId> = a.final_states().iter().copied().collect();
        for state in finals {
            a.set_non_final(state);
            a.add_transition(Symbol::Epsilon, state, b_start);
        }
        a.merge_states(b);
        a
    }

    /// Kleene closure: for every accepting state, an epsilon edge from the
    /// start state to it and one from it back to the start state. The start
    /// state is never marked accepting itself; zero traversals ride the
    /// epsilon edge out of the start state instead.
    fn repetition(&mut self, mut nfa: Nfa) -> Nfa {
        let start = start_of(&nfa);
        let finals: Vec<StateId> = nfa.final_states().iter().copied().collect();
        for state in finals {
            nfa.add_transition(Symbol::Epsilon, start, state);
            nfa.add_transition(Symbol::Epsilon, state, start);
        }
        nfa
    }

    /// A two-state fragment accepting exactly the one-symbol string `c`.
    /// The symbol joins the compilation-wide alphabet.
    fn primitive(&mut self, c: char) -> Nfa {
        self.alphabet.insert(c);

        let mut nfa = Nfa::new();
        let start = self.fresh_state();
        let end = self.fresh_state();
        nfa.add_start_state(start);
        nfa.add_final_state(end);
        nfa.add_transition(Symbol::Char(c), start, end);
        nfa
    }

    /// The next state identity. Monotonically increasing for the lifetime of
    /// the compilation, never reset, never reused.
    fn fresh_state(&mut self) -> StateId {
        let id = self.next_state;
        self.next_state += 1;
        id
    }

    /// Reports whether any input remains.
    fn more(&self) -> bool {
        self.pos < self.pattern.len()
    }

    /// The next character, unconsumed. Exhausted input is an error: the
    /// grammar guards its calls with [`more`], so reaching this on empty
    /// input means the pattern ended where it was not allowed to.
    ///
    /// [`more`]: Compiler::more
    fn peek(&self) -> Result<char> {
        self.pattern[self.pos..]
            .chars()
            .next()
            .ok_or_else(|| self.error(self.span(), ErrorKind::UnexpectedEof))
    }

    /// Consumes and returns the next character.
    fn next(&mut self) -> Result<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Ok(c)
    }

    /// Consumes the next character, failing descriptively if it differs
    /// from `expected`.
    fn eat(&mut self, expected: char) -> Result<()> {
        let found = self.peek()?;
        if found != expected {
            return Err(self.error(
                self.span_char(found),
                ErrorKind::UnexpectedChar { expected, found },
            ));
        }
        self.pos += found.len_utf8();
        Ok(())
    }

    /// An absent operand beside `|`: at the end of the input this is the
    /// trailing-`|` case, otherwise the grammar stopped at a boundary such
    /// as `)`.
    fn missing_operand(&self, operator: Span) -> Error {
        if self.more() {
            self.error(operator, ErrorKind::EmptyAlternation)
        } else {
            self.error(self.span(), ErrorKind::UnexpectedEof)
        }
    }

    fn span(&self) -> Span {
        Span::point(Position::new(self.pos))
    }

    fn span_char(&self, c: char) -> Span {
        Span::new(
            Position::new(self.pos),
            Position::new(self.pos + c.len_utf8()),
        )
    }

    fn error(&self, span: Span, kind: ErrorKind) -> Error {
        Error {
            kind,
            pattern: self.pattern.clone(),
            span,
        }
    }
}

/// Every fragment the grammar produces carries a start state.
fn start_of(nfa: &Nfa) -> StateId {
    nfa.start_state().expect("fragment has no start state")
}

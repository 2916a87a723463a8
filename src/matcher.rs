//! The backtracking pattern matcher.
//!
//! The search is a state machine. An [`Engine`] has an object to match and a
//! pattern to match it with; an [`NEngine`] has a result (a value or a
//! failure) to hand to whatever is waiting for it. What is waiting is an
//! explicit [`Continuation`] stack, so alternation and sequencing never use
//! the host call stack, and a caller can run the search one [`State::step`]
//! at a time and look at it in between.
//!
//! Alternation is committed: once an alternative of an [`Pattern::Or`] (or a
//! position of a [`Pattern::Sub`]) has matched, later failures do not come
//! back to try the others.

use std::vec;
use crate::Symbol;
use crate::evmap::{MEvarMap, Obj};
use crate::pattern::Pattern;
use crate::types::{Term, TermKind};

/// The captures of a match, by capture name.
pub type Matches = MEvarMap<Symbol>;

/// What to do with the result of the current match.
#[derive(Debug)]
pub enum Continuation<'p> {
  /// Nothing: the result is the result of the search.
  Top,
  /// Capture the value under `name`.
  Named {
    /// The capture name.
    name: Symbol,
    /// What comes next.
    parent: Box<Continuation<'p>>,
  },
  /// On failure, restore `matches` and try the next alternative.
  Or {
    /// The alternatives not tried yet.
    alts: vec::IntoIter<(Obj, &'p Pattern)>,
    /// The captures when the alternation started.
    matches: Matches,
    /// What comes next.
    parent: Box<Continuation<'p>>,
  },
  /// On success, match the next child of `node`.
  And {
    /// The node whose children are being matched.
    node: Obj,
    /// The children not matched yet.
    todo: vec::IntoIter<(Obj, &'p Pattern)>,
    /// What comes next.
    parent: Box<Continuation<'p>>,
  },
  /// On success, replace the value by `whole`.
  Lift {
    /// The node a [`Pattern::Sub`] was placed at.
    whole: Obj,
    /// What comes next.
    parent: Box<Continuation<'p>>,
  },
}

/// The result passed to a continuation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Ismatch {
  /// Matched, with this value.
  Match(Obj),
  /// Did not match.
  NoMatch,
}

/// A matcher with an object to match.
#[derive(Debug)]
pub struct Engine<'p> {
  /// The object being matched.
  pub obj: Obj,
  /// The pattern it is matched with.
  pub pattern: &'p Pattern,
  /// What to do with the result.
  pub cont: Continuation<'p>,
  /// The captures so far.
  pub matches: Matches,
}

/// A matcher with a result to pass on.
#[derive(Debug)]
pub struct NEngine<'p> {
  /// What to do with the result.
  pub cont: Continuation<'p>,
  /// The captures so far.
  pub matches: Matches,
}

/// A state of the search.
#[derive(Debug)]
pub enum State<'p> {
  /// Match an object.
  Process(Engine<'p>),
  /// Pass a result on.
  Next(NEngine<'p>, Ismatch),
  /// The search is over, with the captures if it succeeded.
  Done(Option<Matches>),
}

impl<'p> State<'p> {
  /// The initial state for matching `obj` with `p`, starting from `matches`.
  #[must_use] pub fn new(obj: Obj, pattern: &'p Pattern, matches: Matches) -> Self {
    State::Process(Engine { obj, pattern, cont: Continuation::Top, matches })
  }

  /// Make one transition.
  #[must_use] pub fn step(self) -> Self {
    match self {
      State::Process(e) => e.process(),
      State::Next(n, r) => n.next(r),
      State::Done(_) => self,
    }
  }

  /// Run to the end.
  #[must_use] pub fn run(mut self) -> Option<Matches> {
    loop {
      match self {
        State::Done(r) => return r,
        st => self = st.step(),
      }
    }
  }
}

/// Capture `v` under `name`, or check it against the existing capture.
fn bind(matches: &Matches, name: Symbol, v: &Obj) -> Option<Matches> {
  match matches.get(&name) {
    Some(old) => (old == *v).then(|| matches.clone()),
    None if matches.kind_of(&name) == Some(v.kind()) => Some(matches.set(name, v.clone())),
    None => None,
  }
}

/// Start trying `alts` in order, the first one now.
fn alternatives<'p>(
  alts: Vec<(Obj, &'p Pattern)>, matches: Matches, cont: Continuation<'p>,
) -> State<'p> {
  let mut alts = alts.into_iter();
  let Some((obj, pattern)) = alts.next() else {
    return State::Next(NEngine { cont, matches }, Ismatch::NoMatch)
  };
  let cont = Continuation::Or { alts, matches: matches.clone(), parent: Box::new(cont) };
  State::Process(Engine { obj, pattern, cont, matches })
}

fn form(t: &Term) -> Obj { Obj::Form(t.clone()) }

fn pairs<'p>(ts: &[Term], ps: &'p [Pattern]) -> Option<Vec<(Obj, &'p Pattern)>> {
  if ts.len() != ps.len() { return None }
  Some(ts.iter().map(form).zip(ps).collect())
}

/// Check the shape of `obj` against a structural pattern and pair up the
/// children. `None` if the shapes differ.
fn decompose<'p>(p: &'p Pattern, obj: &Obj) -> Option<Vec<(Obj, &'p Pattern)>> {
  let Obj::Form(t) = obj else { return None };
  match (p, &**t) {
    (Pattern::If(pc, pt, pe), TermKind::If(c, e1, e2)) =>
      Some(vec![(form(c), &**pc), (form(e1), &**pt), (form(e2), &**pe)]),
    (Pattern::Int(n), TermKind::Int(m)) => (n == m).then(Vec::new),
    (Pattern::Local(x), TermKind::Local(y)) => (x == y).then(Vec::new),
    (Pattern::Op(p1, tys1), TermKind::Op(p2, tys2)) =>
      (p1 == p2 && (tys1.is_empty() || tys1 == tys2)).then(Vec::new),
    (Pattern::App(ph, pargs), TermKind::App(f, args)) => {
      let k = args.len().checked_sub(pargs.len())?;
      let head = Term::app(f.clone(), args[..k].to_vec());
      let mut out = vec![(Obj::Form(head), &**ph)];
      out.extend(pairs(&args[k..], pargs)?);
      Some(out)
    }
    (Pattern::Tuple(ps), TermKind::Tuple(es)) => pairs(es, ps),
    (Pattern::Proj(p, i), TermKind::Proj(e, j)) => (i == j).then(|| vec![(form(e), &**p)]),
    (Pattern::Match(p, pbs), TermKind::Match(e, bs, _)) => {
      let mut out = vec![(form(e), &**p)];
      out.extend(pairs(bs, pbs)?);
      Some(out)
    }
    (Pattern::Pvar(x, pm), &TermKind::Pvar(y, m)) => (*x == y).then(|| vec![(Obj::Mem(m), &**pm)]),
    (Pattern::Glob(pmp, pm), TermKind::Glob(mp, m)) =>
      Some(vec![(Obj::Mod(mp.clone()), &**pmp), (Obj::Mem(*m), &**pm)]),
    _ => None,
  }
}

impl<'p> Engine<'p> {
  fn next(self, r: Ismatch) -> State<'p> {
    State::Next(NEngine { cont: self.cont, matches: self.matches }, r)
  }

  /// Match the object against the pattern, as far as it can be done without
  /// looking at the continuation.
  #[must_use] pub fn process(self) -> State<'p> {
    match self.pattern {
      Pattern::Wildcard => {
        let v = self.obj.clone();
        self.next(Ismatch::Match(v))
      }
      Pattern::Named(p, name) => State::Process(Engine {
        obj: self.obj,
        pattern: p,
        cont: Continuation::Named { name: *name, parent: Box::new(self.cont) },
        matches: self.matches,
      }),
      &Pattern::Memory(name) | &Pattern::Module(name) => {
        let kind_ok = matches!((self.pattern, &self.obj),
          (Pattern::Memory(_), Obj::Mem(_)) | (Pattern::Module(_), Obj::Mod(_)));
        match bind(&self.matches, name, &self.obj).filter(|_| kind_ok) {
          Some(matches) => {
            let v = self.obj.clone();
            State::Next(NEngine { cont: self.cont, matches }, Ismatch::Match(v))
          }
          None => self.next(Ismatch::NoMatch),
        }
      }
      Pattern::Or(ps) => {
        let alts = ps.iter().map(|p| (self.obj.clone(), p)).collect();
        alternatives(alts, self.matches, self.cont)
      }
      Pattern::Sub(p) => {
        let mut alts = vec![(self.obj.clone(), &**p)];
        if let Obj::Form(t) = &self.obj {
          alts.extend(t.children().into_iter().map(|c| (Obj::Form(c), self.pattern)));
        }
        let cont = Continuation::Lift { whole: self.obj, parent: Box::new(self.cont) };
        alternatives(alts, self.matches, cont)
      }
      p => match decompose(p, &self.obj) {
        None => self.next(Ismatch::NoMatch),
        Some(children) => {
          let mut todo = children.into_iter();
          let Some((obj, pattern)) = todo.next() else {
            let v = self.obj.clone();
            return self.next(Ismatch::Match(v))
          };
          let cont = Continuation::And { node: self.obj, todo, parent: Box::new(self.cont) };
          State::Process(Engine { obj, pattern, cont, matches: self.matches })
        }
      }
    }
  }
}

impl<'p> NEngine<'p> {
  /// Hand `r` to the continuation.
  #[must_use] pub fn next(self, r: Ismatch) -> State<'p> {
    let NEngine { cont, matches } = self;
    match (cont, r) {
      (Continuation::Top, Ismatch::Match(_)) => State::Done(Some(matches)),
      (Continuation::Top, Ismatch::NoMatch) => {
        trace!("match failed");
        State::Done(None)
      }
      (Continuation::Named { name, parent }, Ismatch::Match(v)) => match bind(&matches, name, &v) {
        Some(matches) => State::Next(NEngine { cont: *parent, matches }, Ismatch::Match(v)),
        None => {
          trace!("capture {name} is already bound to something other than {v}");
          State::Next(NEngine { cont: *parent, matches }, Ismatch::NoMatch)
        }
      },
      (Continuation::Or { parent, .. }, r @ Ismatch::Match(_)) =>
        State::Next(NEngine { cont: *parent, matches }, r),
      (Continuation::Or { mut alts, matches, parent }, Ismatch::NoMatch) => match alts.next() {
        Some((obj, pattern)) => {
          trace!("backtracking to the next alternative, {pattern} at {obj}");
          let cont = Continuation::Or { alts, matches: matches.clone(), parent };
          State::Process(Engine { obj, pattern, cont, matches })
        }
        None => State::Next(NEngine { cont: *parent, matches }, Ismatch::NoMatch),
      },
      (Continuation::And { node, mut todo, parent }, Ismatch::Match(_)) => match todo.next() {
        Some((obj, pattern)) => {
          let cont = Continuation::And { node, todo, parent };
          State::Process(Engine { obj, pattern, cont, matches })
        }
        None => State::Next(NEngine { cont: *parent, matches }, Ismatch::Match(node)),
      },
      (Continuation::Lift { whole, parent }, Ismatch::Match(_)) =>
        State::Next(NEngine { cont: *parent, matches }, Ismatch::Match(whole)),
      (Continuation::Named { parent, .. } |
       Continuation::And { parent, .. } |
       Continuation::Lift { parent, .. }, Ismatch::NoMatch) =>
        State::Next(NEngine { cont: *parent, matches }, Ismatch::NoMatch),
    }
  }
}

/// Match `obj` with `p`, starting from the captures `matches`. Returns the
/// captures of the first match found.
#[must_use] pub fn search_obj(obj: Obj, p: &Pattern, matches: Matches) -> Option<Matches> {
  State::new(obj, p, matches).run()
}

/// Match the term `t` with `p`. Returns the captures of the first match
/// found, one for every capture name of `p` the match went through.
#[must_use] pub fn search(t: &Term, p: &Pattern) -> Option<Matches> {
  search_obj(Obj::Form(t.clone()), p, p.captures())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::intern;
  use crate::registry::core;
  use crate::types::{Ident, Memory, ModPath, Path, ProgVar};

  fn plus(a: Term, b: Term) -> Term { Term::binop(core().add.clone(), a, b) }
  fn pplus(a: Pattern, b: Pattern) -> Pattern { Pattern::binop(core().add.clone(), a, b) }
  fn form(m: &Matches, x: &str) -> Option<Term> { m.get_form(&intern(x)).cloned() }

  #[test]
  fn wildcard_and_named() {
    let t = plus(Term::int(1), Term::int(2));
    let m = search(&t, &Pattern::Wildcard).unwrap();
    assert_eq!(m.bindings().count(), 0);
    let m = search(&t, &Pattern::var("x")).unwrap();
    assert_eq!(form(&m, "x"), Some(t));
  }

  #[test]
  fn matching_is_syntactic() {
    let x = Term::local(Ident::fresh("x"));
    let p = pplus(Pattern::var("a"), Pattern::int(0));
    let m = search(&plus(x.clone(), Term::int(0)), &p).unwrap();
    assert_eq!(form(&m, "a"), Some(x.clone()));
    assert!(search(&plus(Term::int(0), x), &p).is_none());
  }

  #[test]
  fn or_prefers_the_first_alternative() {
    let t = plus(Term::int(1), Term::int(2));
    let p = Pattern::Or(vec![
      Pattern::named(pplus(Pattern::var("a"), Pattern::int(2)), "l"),
      Pattern::named(Pattern::Wildcard, "r"),
    ]);
    let m = search(&t, &p).unwrap();
    assert_eq!(form(&m, "l"), Some(t.clone()));
    assert_eq!(form(&m, "r"), None);
    assert!(search(&t, &Pattern::Or(vec![])).is_none());
  }

  #[test]
  fn failed_alternatives_leave_no_captures() {
    let t = plus(Term::int(1), Term::int(2));
    // the first alternative captures `a` before failing on `3`
    let p = Pattern::Or(vec![
      pplus(Pattern::var("a"), Pattern::int(3)),
      pplus(Pattern::Wildcard, Pattern::var("b")),
    ]);
    let m = search(&t, &p).unwrap();
    assert_eq!(form(&m, "a"), None);
    assert_eq!(form(&m, "b"), Some(Term::int(2)));
  }

  #[test]
  fn sub_searches_below_and_binds_its_node() {
    let x = Term::local(Ident::fresh("x"));
    let inner = plus(x.clone(), Term::int(0));
    let t = Term::tuple(vec![Term::int(5), Term::if_(Term::bool(true), inner.clone(), x.clone())]);
    let p = Pattern::named(Pattern::sub(pplus(Pattern::var("a"), Pattern::int(0))), "s");
    let m = search(&t, &p).unwrap();
    assert_eq!(form(&m, "a"), Some(x));
    assert_eq!(form(&m, "s"), Some(t));
    assert!(search(&Term::int(0), &Pattern::sub(Pattern::int(1))).is_none());
  }

  #[test]
  fn repeated_names_must_agree() {
    let p = pplus(Pattern::var("a"), Pattern::var("a"));
    assert!(search(&plus(Term::int(1), Term::int(1)), &p).is_some());
    assert!(search(&plus(Term::int(1), Term::int(2)), &p).is_none());
  }

  #[test]
  fn application_heads_absorb_extra_arguments() {
    let f = Term::op(Path::new(&["f"]), vec![]);
    let t = Term::app(f.clone(), vec![Term::int(1), Term::int(2)]);
    let p = Pattern::app(Pattern::var("h"), vec![Pattern::var("y")]);
    let m = search(&t, &p).unwrap();
    assert_eq!(form(&m, "h"), Some(Term::app(f, vec![Term::int(1)])));
    assert_eq!(form(&m, "y"), Some(Term::int(2)));
  }

  #[test]
  fn memories_and_modules() {
    let (m1, m2) = (Memory(Ident::fresh("&1")), Memory(Ident::fresh("&2")));
    let (xv, yv) = (ProgVar(intern("x")), ProgVar(intern("y")));
    let md = ModPath::Top(Path::new(&["M"]));
    let pv = |x| Pattern::Pvar(x, Box::new(Pattern::Memory(intern("m"))));
    let p = Pattern::Tuple(vec![pv(xv), pv(yv),
      Pattern::Glob(Box::new(Pattern::Module(intern("M"))), Box::new(Pattern::Wildcard))]);
    let t = Term::tuple(vec![Term::pvar(xv, m1), Term::pvar(yv, m1), Term::glob(md.clone(), m2)]);
    let m = search(&t, &p).unwrap();
    assert_eq!(m.get_mem(&intern("m")), Some(m1));
    assert_eq!(m.get_mod(&intern("M")), Some(&md));
    let t2 = Term::tuple(vec![Term::pvar(xv, m1), Term::pvar(yv, m2), Term::glob(md, m2)]);
    assert!(search(&t2, &p).is_none());
  }

  #[test]
  fn the_search_can_be_stepped() {
    let t = plus(Term::int(1), Term::int(0));
    let p = pplus(Pattern::var("a"), Pattern::int(0));
    let mut st = State::new(Obj::Form(t), &p, p.captures());
    let mut steps = 0;
    let m = loop {
      match st {
        State::Done(r) => break r,
        s => { st = s.step(); steps += 1 }
      }
    };
    assert!(m.is_some());
    assert!(steps > 3);
  }
}

use ecm_rs::fmatch::{self, FMatchOpts};
use ecm_rs::matcher::search;
use ecm_rs::position::{self, ConvMode, Select};
use ecm_rs::registry::core;
use ecm_rs::zipper::{self, CodePos};
use ecm_rs::{Hyps, Ident, Instr, Kind, LValue, MEvarMap, MatchError, Obj, Occ, Pattern, ProgVar,
  Stmt, Term, TermKind, UnifyEnv, intern};

fn plus(a: Term, b: Term) -> Term { Term::binop(core().add.clone(), a, b) }
fn times(a: Term, b: Term) -> Term { Term::binop(core().mul.clone(), a, b) }
fn x_plus_zero() -> Pattern { Pattern::binop(core().add.clone(), Pattern::var("a"), Pattern::int(0)) }

#[test]
fn matcher_is_structural() {
  let x = Term::local(Ident::fresh("x"));
  let m = search(&plus(x.clone(), Term::int(0)), &x_plus_zero()).expect("x + 0 should match");
  assert_eq!(m.get_form(&intern("a")), Some(&x));
  assert!(search(&plus(Term::int(0), x), &x_plus_zero()).is_none());
}

#[test]
fn patterns_read_from_json() {
  let p: Pattern = serde_json::from_str(r#"{"Or": [{"Tuple": ["Wildcard"]}, {"Named": ["Wildcard", "all"]}]}"#)
    .expect("bad pattern");
  let t = Term::int(7);
  let m = search(&t, &p).expect("the second alternative matches anything");
  assert_eq!(m.get(&intern("all")), Some(Obj::Form(t)));
  let pos: CodePos = serde_json::from_str(r#"{"Into": {"index": 0, "branch": "Else", "pos": {"At": 0}}}"#)
    .expect("bad code position");
  assert_eq!(pos.to_string(), "0.1.0");
}

/// Find every occurrence of a pattern by running the matcher at each node,
/// then rewrite the selected ones.
#[test]
fn occurrences_of_a_pattern_are_rewritten() {
  let y = Term::local(Ident::fresh("y"));
  // (y + 0) * ((y + 0) + 0)
  let goal = times(plus(y.clone(), Term::int(0)), plus(plus(y.clone(), Term::int(0)), Term::int(0)));
  let p = x_plus_zero();
  let set = position::select(|_, t| {
    if search(t, &p).is_some() { Select::Accept(-1) } else { Select::Continue }
  }, &goal);
  assert_eq!(position::occurrences(&set), 2);
  let strip = |t: &Term| search(t, &p)
    .and_then(|m| m.get_form(&intern("a")).cloned())
    .unwrap_or_else(|| t.clone());
  let all = position::map(&set, &mut |t| strip(t), &goal).expect("positions fit the goal");
  assert_eq!(all, times(y.clone(), plus(y.clone(), Term::int(0))));
  let second = position::filter(&Occ::exclusive([1]), &set);
  let only2 = position::map(&second, &mut |t| strip(t), &goal).expect("positions fit the goal");
  assert_eq!(only2, times(plus(y.clone(), Term::int(0)), plus(y, Term::int(0))));
  assert!(!position::is_occurences_valid(&[3].into(), &set));
}

#[test]
fn select_form_reports_bad_occurrences() {
  let y = Term::local(Ident::fresh("y"));
  let goal = plus(y.clone(), y.clone());
  let env = Hyps::new();
  let set = position::select_form(&env, Some(&Occ::inclusive([2])), ConvMode::Syntactic, false, &y, &goal)
    .expect("occurrence 2 exists");
  let (z, body) = position::topattern(&set, &goal).expect("positions fit the goal");
  assert_eq!(body, plus(y.clone(), Term::local(z)));
  let r = position::select_form(&env, Some(&Occ::inclusive([1, 3])), ConvMode::Syntactic, false, &y, &goal);
  assert_eq!(r, Err(MatchError::InvalidOccurence(vec![3])));
}

#[test]
fn rewrite_with_an_equation() {
  let a = Ident::fresh("a");
  let y = Term::local(Ident::fresh("y"));
  let ev = MEvarMap::of_idents([(a, Kind::Form)]);
  let goal = times(plus(y.clone(), Term::int(0)), Term::int(2));
  let t = fmatch::rewrite(FMatchOpts::empty(), &Hyps::new(), None,
    (UnifyEnv::new(), ev), &plus(Term::local(a), Term::int(0)), &Term::local(a), &goal)
    .expect("y + 0 is in the goal");
  assert_eq!(t, times(y, Term::int(2)));
}

// if b then x <- 1 else y <- 2; w <- 3
fn program(b: &Term) -> Stmt {
  vec![
    Instr::If(b.clone(), vec![Instr::assign("x", Term::int(1))].into(),
      vec![Instr::assign("y", Term::int(2))].into()),
    Instr::assign("w", Term::int(3)),
  ].into()
}

#[test]
fn edit_at_a_code_position() {
  let b = Term::local(Ident::fresh("b"));
  let s = program(&b);
  let pos: CodePos = "0.0.0".parse().expect("valid syntax");
  let (old, s2) = zipper::fold(5, &pos, |n, _, i| {
    let Instr::Assign(lv, e) = i else { return Err(MatchError::InvalidCPos(pos.clone())) };
    Ok::<_, MatchError>((Some(e.clone()), vec![Instr::Assign(lv.clone(), Term::int(n))]))
  }, None, &s).expect("the then branch has an assignment");
  assert_eq!(old, Some(Term::int(1)));
  assert_eq!(s2, Stmt::from(vec![
    Instr::If(b.clone(), vec![Instr::assign("x", Term::int(5))].into(),
      vec![Instr::assign("y", Term::int(2))].into()),
    Instr::assign("w", Term::int(3)),
  ]));
  let (Instr::If(_, _, e), Instr::If(_, _, e0)) = (&s2[0], &s[0]) else { panic!("expected an if") };
  assert!(e.ptr_eq(e0));

  let z = zipper::zipper_of_cpos(&pos, &s).expect("valid position");
  assert_eq!(z.cpos(), pos);
  let after = zipper::after(true, &z);
  assert_eq!(after, vec![vec![], vec![Instr::assign("w", Term::int(3))]]);
  assert_eq!(zipper::zip(z), s);

  for bad in ["2", "1.0.0", "0.1.1"] {
    let pos: CodePos = bad.parse().expect("valid syntax");
    assert_eq!(zipper::zipper_of_cpos(&pos, &s).err(), Some(MatchError::InvalidCPos(pos)));
  }
}

#[test]
fn matches_drive_program_edits() {
  // x <- (v + 0): rewrite the right hand side where the matcher finds `_ + 0`
  let hr = ecm_rs::Memory(Ident::fresh("&hr"));
  let v = Term::pvar(ProgVar(intern("v")), hr);
  let s: Stmt = vec![Instr::Assign(LValue::Var(ProgVar(intern("x"))), plus(v.clone(), Term::int(0)))].into();
  let p = Pattern::sub(x_plus_zero());
  let s2 = zipper::map(&CodePos::At(0), |i| match i {
    Instr::Assign(lv, e) => {
      let m = search(e, &p).ok_or(MatchError::MatchFailure)?;
      let a = m.get_form(&intern("a")).cloned().ok_or(MatchError::MatchFailure)?;
      Ok(vec![Instr::Assign(lv.clone(), a)])
    }
    _ => Err(MatchError::MatchFailure),
  }, &s).expect("the assignment matches");
  let Instr::Assign(_, e) = &s2[0] else { panic!("expected an assignment") };
  assert!(matches!(&**e, TermKind::Pvar(..)));
  assert_eq!(*e, v);
}

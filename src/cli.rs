//! The `ecm-rs` subcommands: thin drivers around the library operations,
//! reading their inputs as JSON files.

use std::fs::File;
use std::io::BufReader;
use itertools::Itertools;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use crate::{BoxError, Symbol};
use crate::evmap::{Kind, MEvarMap, Obj};
use crate::fmatch::{self, FMatchOpts};
use crate::matcher;
use crate::pattern::Pattern;
use crate::position::{self, ConvMode, Occ};
use crate::reduce::Hyps;
use crate::types::{Ident, Path, Stmt, Term};
use crate::unify::UnifyEnv;
use crate::zipper::{self, CodePos};

fn read<T: DeserializeOwned>(path: &str) -> Result<T, BoxError> {
  let file = File::open(path).map_err(|e| format!("{path}: {e}"))?;
  Ok(serde_json::from_reader(BufReader::new(file)).map_err(|e| format!("{path}: {e}"))?)
}

/// The definitions available to reduction, as given on the command line.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HypsFile {
  ops: Vec<(Path, Vec<Symbol>, Term)>,
  locals: Vec<(Ident, Term)>,
  datatypes: Vec<Vec<Path>>,
}

impl From<HypsFile> for Hyps {
  fn from(h: HypsFile) -> Self {
    let hyps = h.ops.into_iter().fold(Hyps::new(), |hyps, (p, tps, body)| hyps.with_op(p, tps, body));
    let hyps = h.locals.into_iter().fold(hyps, |hyps, (x, body)| hyps.with_local(x, body));
    h.datatypes.into_iter().fold(hyps, Hyps::with_ctors)
  }
}

fn hyps(path: Option<&str>) -> Result<Hyps, BoxError> {
  Ok(match path { Some(path) => read::<HypsFile>(path)?.into(), None => Hyps::new() })
}

/// Occurrence selection flags shared by the subcommands that select.
#[derive(clap::Args, Debug)]
pub struct OccArgs {
  /// Keep only occurrences N (a comma separated list, counting from 1)
  #[clap(long, value_name = "N", use_value_delimiter = true)]
  pub occ: Vec<usize>,
  /// Keep every occurrence except those given with --occ
  #[clap(long)]
  pub exclude: bool,
}

impl OccArgs {
  fn occ(&self) -> Option<Occ> {
    if self.exclude {
      Some(Occ::exclusive(self.occ.iter().copied()))
    } else if self.occ.is_empty() {
      None
    } else {
      Some(Occ::inclusive(self.occ.iter().copied()))
    }
  }
}

/// Match a term against a pattern and print the captures
#[derive(clap::Args, Debug)]
pub struct SearchArgs {
  /// The pattern (JSON)
  pub pattern: String,
  /// The term (JSON)
  pub term: String,
}

impl SearchArgs {
  /// Main entry point for `ecm-rs search`.
  pub fn main(self) -> Result<(), BoxError> {
    let p: Pattern = read(&self.pattern)?;
    let t: Term = read(&self.term)?;
    println!("pattern: {p}");
    println!("term:    {t}");
    let Some(m) = matcher::search(&t, &p) else {
      return Err("no match".into())
    };
    for (x, v) in m.bindings() { println!("{x} := {v}") }
    for x in m.unset() { println!("{x} (not reached)") }
    Ok(())
  }
}

/// Select the occurrences of a closed term inside another
#[derive(clap::Args, Debug)]
pub struct SelectArgs {
  /// The term to look for (JSON)
  pub form: String,
  /// The term to look into (JSON)
  pub target: String,
  #[clap(flatten)]
  #[allow(missing_docs)]
  pub occ: OccArgs,
  /// Compare up to conversion instead of syntactically
  #[clap(long)]
  pub conv: bool,
  /// Also select applications with extra trailing arguments
  #[clap(long)]
  pub keyed: bool,
  /// Definitions to unfold (JSON)
  #[clap(long, value_name = "FILE")]
  pub hyps: Option<String>,
}

impl SelectArgs {
  /// Main entry point for `ecm-rs select`.
  pub fn main(self) -> Result<(), BoxError> {
    let p: Term = read(&self.form)?;
    let target: Term = read(&self.target)?;
    let env = hyps(self.hyps.as_deref())?;
    let mode = if self.conv { ConvMode::Conv } else { ConvMode::Syntactic };
    let set = position::select_form(&env, self.occ.occ().as_ref(), mode, self.keyed, &p, &target)
      .map_err(|e| e.to_string())?;
    let n = position::occurrences(&set);
    println!("{n} occurrence(s) of {p}");
    if n == 0 { return Ok(()) }
    let mut paths = vec![];
    set.for_each_path(|path, ord, drop| paths.push(if drop < 0 {
      format!("#{}: {}", ord + 1, path.iter().format("."))
    } else {
      format!("#{}: {} (dropping {drop})", ord + 1, path.iter().format("."))
    }));
    for p in paths { println!("  {p}") }
    let (x, body) = position::topattern(&set, &target).map_err(|e| e.to_string())?;
    println!("fun {x} => {body}");
    Ok(())
  }
}

/// Match a formula pattern with placeholders against a formula
#[derive(clap::Args, Debug)]
pub struct FMatchArgs {
  /// The pattern (JSON)
  pub pattern: String,
  /// The formula to match (JSON)
  pub subject: String,
  /// The placeholders of the pattern: a list of `[ident, kind]` (JSON)
  #[clap(long, value_name = "FILE")]
  pub evars: Option<String>,
  /// Rewrite occurrences of the match in GOAL with RHS instead
  #[clap(long, value_name = "RHS", requires = "goal")]
  pub rhs: Option<String>,
  /// The goal to rewrite (JSON); the subject is ignored
  #[clap(long, value_name = "GOAL", requires = "rhs")]
  pub goal: Option<String>,
  #[clap(flatten)]
  #[allow(missing_docs)]
  pub occ: OccArgs,
  /// Unfold definitions when the shapes differ
  #[clap(long)]
  pub delta: bool,
  /// Accept convertible subjects once the pattern is instantiated
  #[clap(long)]
  pub conv: bool,
  /// Solve placeholders applied to bound variables
  #[clap(long)]
  pub horder: bool,
  /// Definitions to unfold (JSON)
  #[clap(long, value_name = "FILE")]
  pub hyps: Option<String>,
}

impl FMatchArgs {
  fn opts(&self) -> FMatchOpts {
    let mut opts = FMatchOpts::empty();
    opts.set(FMatchOpts::DELTA, self.delta);
    opts.set(FMatchOpts::CONV, self.conv);
    opts.set(FMatchOpts::HORDER, self.horder);
    opts
  }

  /// Main entry point for `ecm-rs fmatch`.
  pub fn main(self) -> Result<(), BoxError> {
    let opts = self.opts();
    let p: Term = read(&self.pattern)?;
    let env = hyps(self.hyps.as_deref())?;
    let evars: Vec<(Ident, Kind)> = match &self.evars { Some(f) => read(f)?, None => vec![] };
    let ev = MEvarMap::of_idents(evars);
    if let (Some(rhs), Some(goal)) = (&self.rhs, &self.goal) {
      let rhs: Term = read(rhs)?;
      let goal: Term = read(goal)?;
      let t = fmatch::rewrite(opts, &env, self.occ.occ().as_ref(), (UnifyEnv::new(), ev), &p, &rhs, &goal)
        .map_err(|e| e.to_string())?;
      println!("{t}");
      return Ok(())
    }
    let s: Term = read(&self.subject)?;
    let (_, close, ev) = fmatch::f_match(opts, &env, (UnifyEnv::new(), ev), &p, &s)
      .map_err(|e| e.to_string())?;
    for (x, v) in ev.bindings() {
      match v {
        Obj::Form(t) => println!("{x} := {}", t.map_ty(&mut |ty| ty.map_univars(&mut |u| Some(close(u))))),
        v => println!("{x} := {v}"),
      }
    }
    Ok(())
  }
}

/// Show the instruction at a code position and what follows it
#[derive(clap::Args, Debug)]
pub struct ZipArgs {
  /// The statement (JSON)
  pub stmt: String,
  /// The code position, such as `2.1.0`
  pub cpos: CodePos,
  /// Leave out the instruction under the cursor
  #[clap(long)]
  pub strict: bool,
  /// Delete the instruction under the cursor and print the result
  #[clap(long)]
  pub delete: bool,
}

impl ZipArgs {
  /// Main entry point for `ecm-rs zip`.
  pub fn main(self) -> Result<(), BoxError> {
    let s: Stmt = read(&self.stmt)?;
    if self.delete {
      let s = zipper::map(&self.cpos, |_| Ok(vec![]), &s).map_err(|e| e.to_string())?;
      println!("{s}");
      return Ok(())
    }
    let z = zipper::zipper_of_cpos(&self.cpos, &s).map_err(|e| e.to_string())?;
    if let Some(i) = z.instr() { println!("at {}: {i}", z.cpos()) }
    for (depth, level) in zipper::after(self.strict, &z).iter().enumerate() {
      println!("after, depth {depth}: {}", level.iter().format("; "))
    }
    Ok(())
  }
}

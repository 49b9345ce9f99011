//! Filter algebra: single predicates and the rulesets that combine them.

mod filter;
mod ruleset;

pub use filter::Filter;
pub use ruleset::{Ruleset, RulesetId};

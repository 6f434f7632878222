pub mod account;
pub mod policy;
pub mod role;
pub mod rules;

pub use account::AccountStatus;
pub use policy::{Action, Actor, Denial, Policy, ResourceKind, Target};
pub use role::Role;
pub use rules::{RuleViolation, Rules};

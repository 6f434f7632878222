//! Access-control decisions for every resource in the API.
//!
//! [`Policy::authorize`] is pure: it never touches storage. Callers resolve the
//! owner of an object first and pass it in through [`Target::object`].
//!
//! Evaluation runs in three stages and stops at the first denial:
//!
//! 1. method restriction: full replacement (`PUT`) is never offered;
//! 2. class level: who may use this kind of endpoint at all;
//! 3. object level: ownership, evaluated only when a concrete object is given.

use std::fmt;

use crate::role::Role;
use crate::rules::Rules;

/// The caller of an API operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    Account { id: i32, role: Role },
}

impl Actor {
    pub fn account(id: i32, role: Role) -> Self {
        Self::Account { id, role }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Account { .. })
    }

    pub fn id(&self) -> Option<i32> {
        match self {
            Self::Account { id, .. } => Some(*id),
            Self::Anonymous => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Self::Account { role, .. } => Some(*role),
            Self::Anonymous => None,
        }
    }

    fn has_role(&self, required: Role) -> bool {
        self.role().is_some_and(|r| r.at_least(required))
    }

    fn owns(&self, owner: i32) -> bool {
        self.id() == Some(owner)
    }
}

/// What the caller wants to do, derived from the HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// GET, HEAD, OPTIONS.
    Read,
    /// POST.
    Create,
    /// PATCH.
    Update,
    /// PUT.
    Replace,
    /// DELETE.
    Delete,
}

impl Action {
    pub fn is_safe(self) -> bool {
        matches!(self, Self::Read)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Category,
    Genre,
    Title,
    Review,
    Comment,
    Account,
}

impl ResourceKind {
    /// Catalogue resources are writable by admins only.
    fn is_catalogue(self) -> bool {
        matches!(self, Self::Category | Self::Genre | Self::Title)
    }

    /// Resources whose objects carry an author.
    fn is_authored(self) -> bool {
        matches!(self, Self::Review | Self::Comment)
    }
}

/// The thing being acted on: a collection endpoint or one concrete object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub kind: ResourceKind,
    /// Author of a review/comment, or the account itself for `Account`.
    /// `None` for collection-level checks.
    pub owner: Option<i32>,
}

impl Target {
    pub fn collection(kind: ResourceKind) -> Self {
        Self { kind, owner: None }
    }

    pub fn object(kind: ResourceKind, owner: i32) -> Self {
        Self {
            kind,
            owner: Some(owner),
        }
    }
}

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// The caller must authenticate first.
    Unauthenticated,
    /// Authenticated but lacking privilege or ownership.
    Forbidden,
    /// The method is not offered on this resource.
    MethodNotAllowed,
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => f.write_str("authentication required"),
            Self::Forbidden => f.write_str("insufficient permissions"),
            Self::MethodNotAllowed => f.write_str("method not allowed"),
        }
    }
}

impl std::error::Error for Denial {}

/// The authorization policy engine, carrying the configured input rules.
#[derive(Debug, Clone, Default)]
pub struct Policy {
    rules: Rules,
}

impl Policy {
    pub fn new(rules: Rules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Decide whether `actor` may perform `action` on `target`.
    pub fn authorize(&self, actor: &Actor, action: Action, target: &Target) -> Result<(), Denial> {
        if action == Action::Replace {
            return Err(Denial::MethodNotAllowed);
        }
        self.check_class(actor, action, target)?;
        match target.owner {
            Some(owner) => self.check_object(actor, action, target.kind, owner),
            None => Ok(()),
        }
    }

    /// Only admins may set or change the `role` of any account, their own included.
    pub fn may_assign_role(&self, actor: &Actor) -> bool {
        actor.has_role(Role::Admin)
    }

    fn check_class(&self, actor: &Actor, action: Action, target: &Target) -> Result<(), Denial> {
        let kind = target.kind;
        if action.is_safe() && kind != ResourceKind::Account {
            return Ok(());
        }
        if !actor.is_authenticated() {
            return Err(Denial::Unauthenticated);
        }
        if kind.is_catalogue() {
            return require(actor.has_role(Role::Admin));
        }
        if kind == ResourceKind::Account {
            // Listing and creating accounts happen on the collection.
            return match (action, target.owner) {
                (Action::Create, _) | (_, None) => require(actor.has_role(Role::Admin)),
                _ => Ok(()),
            };
        }
        Ok(())
    }

    fn check_object(
        &self,
        actor: &Actor,
        action: Action,
        kind: ResourceKind,
        owner: i32,
    ) -> Result<(), Denial> {
        if kind.is_authored() {
            if action.is_safe() {
                return Ok(());
            }
            return require(actor.owns(owner) || actor.has_role(Role::Moderator));
        }
        if kind == ResourceKind::Account {
            return match action {
                Action::Read | Action::Update => {
                    require(actor.owns(owner) || actor.has_role(Role::Admin))
                }
                _ => require(actor.has_role(Role::Admin)),
            };
        }
        Ok(())
    }
}

fn require(allowed: bool) -> Result<(), Denial> {
    if allowed {
        Ok(())
    } else {
        Err(Denial::Forbidden)
    }
}

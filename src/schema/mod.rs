//! # Schema Resolution
//!
//! Producers of bioprocess exports disagree on what to call things: the same
//! biomass series shows up as `biomass`, `X`, `VCD` or `vcd` depending on who
//! wrote the file. This module maps those names onto a fixed set of
//! [`CanonicalRole`]s.
//!
//! ## Matching Rules
//!
//! - The primary name of a role is checked first, then its alternates in
//!   listed order. The first name present wins.
//! - Matching is exact and case-sensitive. There is no substring or fuzzy
//!   matching.
//! - Absence is not an error. [`SchemaResolver::resolve`] returns `None` and
//!   the caller decides whether the role was mandatory.
//!
//! ## Usage
//!
//! ```rust
//! use bioseries::schema::{CanonicalRole, SchemaResolver};
//!
//! let resolver = SchemaResolver::default();
//! let header = ["Time", "VCD", "glucose"];
//!
//! assert_eq!(resolver.resolve(&header[..], CanonicalRole::Time), Some("Time"));
//! assert_eq!(resolver.resolve(&header[..], CanonicalRole::Biomass), Some("VCD"));
//! assert_eq!(resolver.resolve(&header[..], CanonicalRole::Product), None);
//! ```

mod aliases;
mod role;


pub use aliases::NameAliasTable;
pub use role::CanonicalRole;

/// Anything that can answer "is a field with this exact name present?".
pub trait FieldLookup {
    /// Whether `name` is present.
    fn has_field(&self, name: &str) -> bool;
}

impl FieldLookup for [&str] {
    fn has_field(&self, name: &str) -> bool {
        self.iter().any(|candidate| *candidate == name)
    }
}

impl FieldLookup for [String] {
    fn has_field(&self, name: &str) -> bool {
        self.iter().any(|candidate| candidate == name)
    }
}

impl FieldLookup for csv::StringRecord {
    fn has_field(&self, name: &str) -> bool {
        self.iter().any(|candidate| candidate == name)
    }
}

/// Maps producer-specific names onto canonical roles using a [`NameAliasTable`].
#[derive(Debug, Clone, Default)]
pub struct SchemaResolver {
    aliases: NameAliasTable,
}

impl SchemaResolver {
    /// Create a resolver over the given alias table.
    pub fn new(aliases: NameAliasTable) -> Self {
        Self { aliases }
    }

    /// The alias table backing this resolver.
    pub fn aliases(&self) -> &NameAliasTable {
        &self.aliases
    }

    /// Find the name under which `role` is stored in `lookup`.
    ///
    /// Returns the primary name if present, otherwise the first alternate
    /// present, otherwise `None`.
    pub fn resolve<'a, L>(&'a self, lookup: &L, role: CanonicalRole) -> Option<&'a str>
    where
        L: FieldLookup + ?Sized,
    {
        self.aliases
            .names(role)
            .iter()
            .map(String::as_str)
            .find(|name| lookup.has_field(name))
    }

    /// Reverse lookup: the first role (in canonical order) listing `name`
    /// among its candidates.
    pub fn role_for_name(&self, name: &str) -> Option<CanonicalRole> {
        CanonicalRole::ALL
            .into_iter()
            .find(|role| self.aliases.names(*role).iter().any(|n| n == name))
    }
}

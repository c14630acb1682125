//! Explicit registration of the points a settings type declares.
//!
//! A schema is an ordered name → declaration mapping. Derived settings start
//! from their base's schema and add or replace declarations; a replaced
//! declaration keeps the position of the one it overrides.

use statema_point::PointDecl;

/// A configuration-bearing type.
///
/// # Example
///
/// ```rust
/// use statema_store::{Schema, Settings};
/// use statema_point::PointDecl;
///
/// struct Base;
/// impl Settings for Base {
///     fn schema() -> Schema {
///         Schema::new()
///             .point("level", PointDecl::new(1i64))
///             .point("name", PointDecl::new("base"))
///     }
/// }
///
/// struct Derived;
/// impl Settings for Derived {
///     fn schema() -> Schema {
///         Schema::inherit::<Base>().point("name", PointDecl::new("derived"))
///     }
/// }
///
/// let schema = Schema::of::<Derived>();
/// assert_eq!(schema.names().collect::<Vec<_>>(), ["level", "name"]);
/// ```
pub trait Settings {
    fn schema() -> Schema;
}

#[derive(Clone, Debug, Default)]
pub struct Schema {
    decls: Vec<(String, PointDecl)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// The schema a settings type declares.
    pub fn of<S: Settings>() -> Self {
        S::schema()
    }

    /// Start a derived schema from a base settings type.
    pub fn inherit<S: Settings>() -> Self {
        S::schema()
    }

    /// Declare a point. Re-declaring a name replaces the earlier declaration.
    pub fn point(mut self, name: impl Into<String>, decl: PointDecl) -> Self {
        self.insert(name, decl);
        self
    }

    /// Layer `other` on top of this schema; its declarations win.
    pub fn extend(mut self, other: &Schema) -> Self {
        for (name, decl) in &other.decls {
            self.insert(name.clone(), decl.clone());
        }
        self
    }

    /// Insert a declaration, returning the one it replaced.
    pub fn insert(&mut self, name: impl Into<String>, decl: PointDecl) -> Option<PointDecl> {
        let name = name.into();
        match self.decls.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, decl)),
            None => {
                self.decls.push((name, decl));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&PointDecl> {
        self.decls
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, decl)| decl)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.decls.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PointDecl)> {
        self.decls.iter().map(|(name, decl)| (name.as_str(), decl))
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

//! A canonical, type-safe representation of a path to a field within a
//! resource value.
//!
//! Paths are built incrementally while a validator descends into a value.
//! Extending a path shares structure with its parent, so deep traversals do
//! not re-copy every ancestor segment on each step.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One step in a field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathSegment {
    /// A named field, rendered as `.name`.
    Name(String),
    /// A list index, rendered as `[i]`.
    Index(usize),
    /// A map key, rendered as `[key]`.
    Key(String),
}

/// An ordered sequence of path segments identifying a field.
///
/// # Examples
///
/// ```rust
/// use niyama::FieldPath;
/// let p = FieldPath::new("spec").child("containers").index(0).child("name");
/// assert_eq!(p.to_string(), "spec.containers[0].name");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldPath(im::Vector<PathSegment>);

impl FieldPath {
    /// Returns an empty path, used as the root of a validation.
    pub fn root() -> Self {
        Self(im::Vector::new())
    }

    /// Returns a path with a single named segment.
    pub fn new(name: impl Into<String>) -> Self {
        Self::root().child(name)
    }

    /// Extends the path with a named field segment.
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segs = self.0.clone();
        segs.push_back(PathSegment::Name(name.into()));
        Self(segs)
    }

    /// Extends the path with a list index segment.
    pub fn index(&self, i: usize) -> Self {
        let mut segs = self.0.clone();
        segs.push_back(PathSegment::Index(i));
        Self(segs)
    }

    /// Extends the path with a map key segment.
    pub fn key(&self, k: impl Into<String>) -> Self {
        let mut segs = self.0.clone();
        segs.push_back(PathSegment::Key(k.into()));
        Self(segs)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &PathSegment> {
        self.0.iter()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            match seg {
                PathSegment::Name(n) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{n}")?;
                }
                PathSegment::Index(idx) => write!(f, "[{idx}]")?,
                PathSegment::Key(k) => write!(f, "[{k}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_mixed_segments() {
        let p = FieldPath::new("a").child("b").index(0).child("c").key("k");
        assert_eq!(p.to_string(), "a.b[0].c[k]");
    }

    #[test]
    fn extension_does_not_disturb_parent() {
        let parent = FieldPath::new("spec");
        let left = parent.child("x");
        let right = parent.index(3);
        assert_eq!(parent.to_string(), "spec");
        assert_eq!(left.to_string(), "spec.x");
        assert_eq!(right.to_string(), "spec[3]");
    }
}

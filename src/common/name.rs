use std::cell::Cell;
use std::fmt;

/// Label of an automaton coordinate.
///
/// `Tmp` names are helper coordinates introduced while synthesizing relations;
/// they never collide with user-supplied names.
#[derive(Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub enum Name {
    Named(String),
    Tmp(usize),
}

thread_local!(
    static ID_COUNTER: Cell<usize> = Cell::new(0);
);

impl Name {
    pub fn new(string: String) -> Self {
        Self::Named(string)
    }

    pub fn new_tmp() -> Self {
        let n = ID_COUNTER.with(|cell| {
            let n = cell.get();
            cell.set(n + 1);
            n
        });
        Name::Tmp(n)
    }

    #[inline]
    pub fn is_tmp(&self) -> bool {
        match self {
            Self::Named(_) => false,
            Self::Tmp(_) => true,
        }
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Name::Named(s.to_string())
    }
}

impl From<String> for Name {
    fn from(s: String) -> Self {
        Name::Named(s)
    }
}

impl From<&Name> for Name {
    fn from(name: &Name) -> Self {
        name.clone()
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(s) => f.write_str(s),
            Self::Tmp(s) => write!(f, "#{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tmp_names_are_fresh_and_ordered() {
        let a = Name::new_tmp();
        let b = Name::new_tmp();
        assert_ne!(a, b);
        assert!(a < b);
        assert!(a.is_tmp());
        assert!(Name::from("zz") < a);
        assert_eq!(Name::from("x").to_string(), "x");
    }
}

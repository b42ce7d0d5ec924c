use rand::Rng;

/// Fixed, ordered list of selectable options for one avatar instance.
///
/// Options are identified by position, not by value: the catalogue is
/// supplied by the surrounding application and assumed identical and stable
/// across all peers sharing a room for the duration of a session. It is
/// never mutated after construction, so instances can share it freely.
#[derive(Debug, Clone)]
pub struct Catalogue<O> {
    options: Vec<O>,
}

impl<O> Catalogue<O> {
    pub fn new(options: Vec<O>) -> Self {
        Self { options }
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&O> {
        self.options.get(index)
    }

    /// Position of `option` in the catalogue, or `None` if it is not a
    /// member.
    pub fn index_of(&self, option: &O) -> Option<usize>
    where
        O: PartialEq,
    {
        self.options.iter().position(|o| o == option)
    }

    /// A uniformly random index, or `None` for an empty catalogue.
    pub fn random_index(&self) -> Option<usize> {
        if self.options.is_empty() {
            return None;
        }
        Some(rand::rng().random_range(0..self.options.len()))
    }

    /// A random index distinct from `current`. Needs at least two options
    /// (or one, when nothing is selected yet) to have anywhere to go.
    pub fn random_other(&self, current: Option<usize>) -> Option<usize> {
        match current {
            None => self.random_index(),
            Some(current) => {
                if self.options.len() < 2 {
                    return None;
                }
                let mut rng = rand::rng();
                loop {
                    let candidate = rng.random_range(0..self.options.len());
                    if candidate != current {
                        return Some(candidate);
                    }
                }
            }
        }
    }
}

impl<O> From<Vec<O>> for Catalogue<O> {
    fn from(options: Vec<O>) -> Self {
        Self::new(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hats() -> Catalogue<&'static str> {
        Catalogue::new(vec!["tophat", "beanie", "crown"])
    }

    #[test]
    fn test_index_of_members_and_strangers() {
        let catalogue = hats();
        assert_eq!(catalogue.index_of(&"beanie"), Some(1));
        assert_eq!(catalogue.index_of(&"fedora"), None);
    }

    #[test]
    fn test_get_respects_bounds() {
        let catalogue = hats();
        assert_eq!(catalogue.get(2), Some(&"crown"));
        assert_eq!(catalogue.get(3), None);
    }

    #[test]
    fn test_random_other_avoids_current() {
        let catalogue = hats();
        for _ in 0..50 {
            let picked = catalogue.random_other(Some(1)).unwrap();
            assert_ne!(picked, 1);
            assert!(picked < catalogue.len());
        }
    }

    #[test]
    fn test_random_other_needs_somewhere_to_go() {
        let single: Catalogue<&str> = Catalogue::new(vec!["only"]);
        assert_eq!(single.random_other(Some(0)), None);
        assert_eq!(single.random_other(None), Some(0));

        let empty: Catalogue<&str> = Catalogue::new(vec![]);
        assert_eq!(empty.random_index(), None);
    }
}

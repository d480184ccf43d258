//! Mixed-radix encoding of coordinate tuples.
//!
//! An automaton reads tuples whose i-th component ranges over its own finite
//! set of integers. Tuples are packed into a single symbol:
//! `encode(x) = sum(encoder[i] * index_of(x[i], coords[i]))` with
//! `encoder[0] = 1` and `encoder[i] = encoder[i - 1] * |coords[i - 1]|`.

use crate::error::{Error, Result};

pub type Symbol = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    coords: Vec<Vec<i32>>,
    encoder: Vec<usize>,
    size: usize,
}

impl Alphabet {
    /// Builds an alphabet from per-coordinate value lists.
    /// Repeated values are dropped, keeping the first occurrence.
    pub fn new(coords: Vec<Vec<i32>>) -> Result<Self> {
        let mut cleaned = Vec::with_capacity(coords.len());
        for (i, values) in coords.into_iter().enumerate() {
            let mut unique: Vec<i32> = Vec::with_capacity(values.len());
            for v in values {
                if !unique.contains(&v) {
                    unique.push(v);
                }
            }
            if unique.is_empty() {
                return Err(Error::Encoding(format!("coordinate {} has an empty alphabet", i)));
            }
            cleaned.push(unique);
        }
        let mut encoder = Vec::with_capacity(cleaned.len());
        let mut size: usize = 1;
        for values in &cleaned {
            encoder.push(size);
            size = size
                .checked_mul(values.len())
                .ok_or_else(|| Error::Encoding("alphabet size overflows".to_string()))?;
        }
        Ok(Alphabet {
            coords: cleaned,
            encoder,
            size,
        })
    }

    /// The alphabet of zero coordinates; it has exactly one (empty) symbol.
    pub fn empty() -> Self {
        Alphabet {
            coords: Vec::new(),
            encoder: Vec::new(),
            size: 1,
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.coords.len()
    }

    #[inline]
    pub fn coords(&self) -> &[Vec<i32>] {
        &self.coords
    }

    #[inline]
    pub fn coord(&self, index: usize) -> &[i32] {
        &self.coords[index]
    }

    #[inline]
    pub fn encoder(&self) -> &[usize] {
        &self.encoder
    }

    pub fn encode(&self, tuple: &[i32]) -> Result<Symbol> {
        if tuple.len() != self.coords.len() {
            return Err(Error::Encoding(format!(
                "expected a {}-tuple, got {} values",
                self.coords.len(),
                tuple.len()
            )));
        }
        let mut symbol = 0;
        for (i, value) in tuple.iter().enumerate() {
            let index = self.coords[i].iter().position(|x| x == value).ok_or_else(|| {
                Error::Encoding(format!("value {} is not in the alphabet of coordinate {}", value, i))
            })?;
            symbol += self.encoder[i] * index;
        }
        Ok(symbol)
    }

    pub fn decode(&self, mut symbol: Symbol) -> Vec<i32> {
        debug_assert!(symbol < self.size);
        let mut tuple = Vec::with_capacity(self.coords.len());
        for values in &self.coords {
            tuple.push(values[symbol % values.len()]);
            symbol /= values.len();
        }
        tuple
    }

    /// Encodes a tuple where `None` stands for every value of that coordinate.
    pub fn expand_wildcards(&self, tuple: &[Option<i32>]) -> Result<Vec<Symbol>> {
        if tuple.len() != self.coords.len() {
            return Err(Error::Encoding(format!(
                "expected a {}-tuple, got {} values",
                self.coords.len(),
                tuple.len()
            )));
        }
        let mut symbols = vec![0];
        for (i, value) in tuple.iter().enumerate() {
            match value {
                Some(v) => {
                    let index = self.coords[i].iter().position(|x| x == v).ok_or_else(|| {
                        Error::Encoding(format!("value {} is not in the alphabet of coordinate {}", v, i))
                    })?;
                    for s in symbols.iter_mut() {
                        *s += self.encoder[i] * index;
                    }
                }
                None => {
                    let mut expanded = Vec::with_capacity(symbols.len() * self.coords[i].len());
                    for index in 0..self.coords[i].len() {
                        expanded.extend(symbols.iter().map(|s| s + self.encoder[i] * index));
                    }
                    symbols = expanded;
                }
            }
        }
        Ok(symbols)
    }

    /// The symbol made of zeros on every coordinate, if each coordinate has 0.
    pub fn zero_symbol(&self) -> Option<Symbol> {
        let mut symbol = 0;
        for (i, values) in self.coords.iter().enumerate() {
            symbol += self.encoder[i] * values.iter().position(|x| *x == 0)?;
        }
        Some(symbol)
    }

    /// Drops the given coordinates. Returns the reduced alphabet and, for every
    /// old symbol, the symbol it projects to.
    pub fn remove_coords(&self, indices: &[usize]) -> (Alphabet, Vec<Symbol>) {
        let kept: Vec<usize> = (0..self.arity()).filter(|i| !indices.contains(i)).collect();
        let reduced = self.select(&kept);
        let projection = (0..self.size)
            .map(|symbol| {
                kept.iter()
                    .enumerate()
                    .map(|(j, i)| reduced.encoder[j] * self.index_at(symbol, *i))
                    .sum::<usize>()
            })
            .collect();
        (reduced, projection)
    }

    /// Reorders coordinates so that old coordinate `i` lands at position
    /// `permutation[i]`. Returns the new alphabet and the old → new symbol map.
    pub fn permute(&self, permutation: &[usize]) -> (Alphabet, Vec<Symbol>) {
        let mut order = vec![0; self.arity()];
        for (i, p) in permutation.iter().enumerate() {
            order[*p] = i;
        }
        let permuted = self.select(&order);
        let map = (0..self.size)
            .map(|symbol| {
                (0..self.arity())
                    .map(|i| permuted.encoder[permutation[i]] * self.index_at(symbol, i))
                    .sum::<usize>()
            })
            .collect();
        (permuted, map)
    }

    /// Merges the coordinates in `group` into the first of them. Symbols whose
    /// merged components disagree map to `None`.
    pub fn merge_coords(&self, group: &[usize]) -> (Alphabet, Vec<Option<Symbol>>) {
        let first = group[0];
        let kept: Vec<usize> = (0..self.arity())
            .filter(|i| *i == first || !group.contains(i))
            .collect();
        let reduced = self.select(&kept);
        let map = (0..self.size)
            .map(|symbol| {
                let tuple = self.decode(symbol);
                if group.iter().any(|i| tuple[*i] != tuple[first]) {
                    return None;
                }
                let values: Vec<i32> = kept.iter().map(|i| tuple[*i]).collect();
                reduced.encode(&values).ok()
            })
            .collect();
        (reduced, map)
    }

    /// The sub-alphabet made of the listed coordinates, in that order.
    pub fn select(&self, indices: &[usize]) -> Alphabet {
        let mut encoder = Vec::with_capacity(indices.len());
        let mut size = 1;
        let coords: Vec<Vec<i32>> = indices
            .iter()
            .map(|i| {
                encoder.push(size);
                size *= self.coords[*i].len();
                self.coords[*i].clone()
            })
            .collect();
        Alphabet { coords, encoder, size }
    }

    #[inline]
    fn index_at(&self, symbol: Symbol, coord: usize) -> usize {
        (symbol / self.encoder[coord]) % self.coords[coord].len()
    }
}

/// Two coordinate alphabets are interchangeable when they hold the same values.
pub fn same_values(a: &[i32], b: &[i32]) -> bool {
    a.len() == b.len() && a.iter().all(|x| b.contains(x))
}

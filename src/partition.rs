//! Refinable partition (Valmari & Lehtinen).
//!
//! Elements `0..n` are stored in `elements` grouped by set; set `s` occupies
//! `elements[first[s]..past[s]]`. Marking moves an element to the front of its
//! set; `split` then separates the marked prefix from the rest.
//!
//! Two partitions (states and transitions) are refined together and share one
//! `Marks` scratch: marks of one partition are always split before the other
//! one is marked.

pub(crate) struct Marks {
    /// marked count per set
    marked: Vec<usize>,
    /// sets with at least one marked element
    touched: Vec<usize>,
}

impl Marks {
    pub fn new(capacity: usize) -> Self {
        Marks {
            marked: vec![0; capacity + 1],
            touched: Vec::new(),
        }
    }

}

pub(crate) struct Partition {
    pub sets: usize,
    pub elements: Vec<usize>,
    pub location: Vec<usize>,
    pub set_of: Vec<usize>,
    pub first: Vec<usize>,
    pub past: Vec<usize>,
}

impl Partition {
    /// One set holding every element (no set at all when `n == 0`).
    pub fn new(n: usize) -> Self {
        let mut partition = Partition {
            sets: if n == 0 { 0 } else { 1 },
            elements: (0..n).collect(),
            location: (0..n).collect(),
            set_of: vec![0; n],
            first: vec![0; n],
            past: vec![0; n],
        };
        if n > 0 {
            partition.past[0] = n;
        }
        partition
    }

    /// Groups elements `0..keys.len()` into one set per distinct key, sets
    /// numbered in increasing key order.
    pub fn from_keys<K: Ord + Copy>(keys: &[K]) -> Self {
        let n = keys.len();
        let mut partition = Partition::new(n);
        partition.elements.sort_by_key(|e| keys[*e]);
        let mut sets = 0;
        for (i, e) in partition.elements.iter().enumerate() {
            partition.location[*e] = i;
            if i == 0 || keys[partition.elements[i - 1]] != keys[*e] {
                if sets > 0 {
                    partition.past[sets - 1] = i;
                }
                partition.first[sets] = i;
                sets += 1;
            }
            partition.set_of[*e] = sets - 1;
        }
        if sets > 0 {
            partition.past[sets - 1] = n;
        }
        partition.sets = sets;
        partition
    }

    #[inline]
    pub fn set_range(&self, set: usize) -> std::ops::Range<usize> {
        self.first[set]..self.past[set]
    }

    #[inline]
    pub fn swap_to(&mut self, e: usize, position: usize) {
        let i = self.location[e];
        let other = self.elements[position];
        self.elements[i] = other;
        self.location[other] = i;
        self.elements[position] = e;
        self.location[e] = position;
    }

    pub fn mark(&mut self, e: usize, marks: &mut Marks) {
        let s = self.set_of[e];
        let j = self.first[s] + marks.marked[s];
        if self.location[e] < j {
            // already marked
            return;
        }
        self.swap_to(e, j);
        if marks.marked[s] == 0 {
            marks.touched.push(s);
        }
        marks.marked[s] += 1;
    }

    pub fn split(&mut self, marks: &mut Marks) {
        while let Some(s) = marks.touched.pop() {
            let j = self.first[s] + marks.marked[s];
            if j == self.past[s] {
                marks.marked[s] = 0;
                continue;
            }
            let z = self.sets;
            if marks.marked[s] <= self.past[s] - j {
                self.first[z] = self.first[s];
                self.past[z] = j;
                self.first[s] = j;
            } else {
                self.past[z] = self.past[s];
                self.first[z] = j;
                self.past[s] = j;
            }
            for i in self.first[z]..self.past[z] {
                self.set_of[self.elements[i]] = z;
            }
            marks.marked[s] = 0;
            marks.marked[z] = 0;
            self.sets += 1;
        }
    }
}

struct DigitIterator {
    value: u64,
    base: u64,
}

impl Iterator for DigitIterator {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.value == 0 {
            return None;
        }
        let digit = self.value % self.base;
        self.value /= self.base;
        Some(digit)
    }
}

/// Digits of `value` in base `base`, least significant first, without padding.
/// Zero has no digits.
pub fn iterate_digits_lsd(value: u64, base: u64) -> impl Iterator<Item = u64> {
    assert!(base > 1);
    DigitIterator { value, base }
}

#[test]
fn test_iterate_digits() {
    let v: Vec<u64> = iterate_digits_lsd(0b1101, 2).collect();
    assert_eq!(v, vec![1, 0, 1, 1]);

    let v: Vec<u64> = iterate_digits_lsd(47, 10).collect();
    assert_eq!(v, vec![7, 4]);

    let v: Vec<u64> = iterate_digits_lsd(0, 3).collect();
    assert_eq!(v, vec![]);

    let v: Vec<u64> = iterate_digits_lsd(9, 3).collect();
    assert_eq!(v, vec![0, 0, 1]);
}

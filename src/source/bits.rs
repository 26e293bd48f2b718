use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random payload unpacked MSB-first into fixed-width bit groups.
pub struct BitGroups {
    rng: StdRng,
    bits_per_group: usize,
    byte: u8,
    bits_left: usize,
}

impl BitGroups {
    pub fn new(bits_per_group: usize, seed: u64) -> Self {
        assert!(
            (1..=8).contains(&bits_per_group),
            "bit groups must be 1..=8 bits wide"
        );
        Self {
            rng: StdRng::seed_from_u64(seed),
            bits_per_group,
            byte: 0,
            bits_left: 0,
        }
    }

    pub fn bits_per_group(&self) -> usize {
        self.bits_per_group
    }

    fn next_bit(&mut self) -> usize {
        if self.bits_left == 0 {
            self.byte = self.rng.random();
            self.bits_left = 8;
        }
        self.bits_left -= 1;
        ((self.byte >> self.bits_left) & 1) as usize
    }

    /// Next group, spanning byte boundaries when the width does not divide 8.
    pub fn next_group(&mut self) -> usize {
        let mut value = 0;
        for _ in 0..self.bits_per_group {
            value = (value << 1) | self.next_bit();
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_stay_in_range() {
        for width in 1..=6 {
            let mut bits = BitGroups::new(width, 7);
            for _ in 0..500 {
                assert!(bits.next_group() < (1 << width));
            }
        }
    }

    #[test]
    fn test_same_seed_same_payload() {
        let mut a = BitGroups::new(3, 99);
        let mut b = BitGroups::new(3, 99);
        let xs: Vec<_> = (0..64).map(|_| a.next_group()).collect();
        let ys: Vec<_> = (0..64).map(|_| b.next_group()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_msb_first_unpacking() {
        let mut eight = BitGroups::new(8, 3);
        let mut ones = BitGroups::new(1, 3);
        let byte = eight.next_group();
        let rebuilt = (0..8).fold(0, |acc, _| (acc << 1) | ones.next_group());
        assert_eq!(byte, rebuilt);
    }
}

//! bitvec.rs
//! Static bit vector with rank/select support. Bits are packed into 32-bit
//! words with a per-block prefix-rank table built once at construction.
//! `select` falls back to a linear scan for small vectors and jumps via
//! sqrt(n)-sampled position tables for large ones.
//!
//! Used for marking adjacency-list boundaries in the succinct edge store.

const BLOCK_SIZE: usize = 32;

/// Vectors up to this many bits answer `select` by plain linear scan.
const LINEAR_SELECT_MAX: usize = 100;

#[derive(Debug, Clone, Default)]
pub struct SuccinctBitVector {
    words: Vec<u32>,
    len: usize,
    /// rank1 of each block start; one trailing entry for the full vector.
    rank_table: Vec<u32>,
    /// Sampled positions of every `sample_rate`-th 0-bit and 1-bit.
    select_samples: [Vec<u32>; 2],
    sample_rate: usize,
}

impl SuccinctBitVector {
    pub fn new(bits: &[bool]) -> Self {
        let len = bits.len();
        let num_blocks = len.div_ceil(BLOCK_SIZE);
        let mut words = vec![0u32; num_blocks];
        for (i, &bit) in bits.iter().enumerate() {
            if bit {
                words[i / BLOCK_SIZE] |= 1 << (i % BLOCK_SIZE);
            }
        }

        let mut rank_table = Vec::with_capacity(num_blocks + 1);
        let mut rank = 0u32;
        for word in &words {
            rank_table.push(rank);
            rank += word.count_ones();
        }
        rank_table.push(rank);

        let sample_rate = (len as f64).sqrt().ceil() as usize;
        let mut select_samples = [Vec::new(), Vec::new()];
        let mut counts = [0usize, 0usize];
        for (i, &bit) in bits.iter().enumerate() {
            let b = bit as usize;
            if counts[b] % sample_rate.max(1) == 0 {
                select_samples[b].push(i as u32);
            }
            counts[b] += 1;
        }

        Self {
            words,
            len,
            rank_table,
            select_samples,
            sample_rate,
        }
    }

    pub fn from_bits(bits: impl IntoIterator<Item = bool>) -> Self {
        let bits: Vec<bool> = bits.into_iter().collect();
        Self::new(&bits)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        self.words[index / BLOCK_SIZE] & (1 << (index % BLOCK_SIZE)) != 0
    }

    /// Number of 1-bits in the prefix `[0, i)`. `i` is clamped to `[0, len]`.
    pub fn rank1(&self, i: usize) -> usize {
        let i = i.min(self.len);
        let block = i / BLOCK_SIZE;
        let remainder = i % BLOCK_SIZE;
        let mut rank = self.rank_table[block] as usize;
        if remainder > 0 {
            let mask = (1u32 << remainder) - 1;
            rank += (self.words[block] & mask).count_ones() as usize;
        }
        rank
    }

    /// Number of 0-bits in the prefix `[0, i)`. `i` is clamped to `[0, len]`.
    pub fn rank0(&self, i: usize) -> usize {
        i.min(self.len) - self.rank1(i)
    }

    /// Position of the k-th (0-indexed) occurrence of `bit`, or `None` when
    /// fewer than `k + 1` occurrences exist.
    pub fn select(&self, bit: bool, k: usize) -> Option<usize> {
        if self.len <= LINEAR_SELECT_MAX {
            return self.select_linear(bit, k, 0, 0);
        }

        let table_index = k / self.sample_rate;
        let samples = &self.select_samples[bit as usize];
        // A missing sample means fewer than `table_index * sample_rate + 1`
        // occurrences exist, so the k-th cannot either.
        let start = *samples.get(table_index)? as usize;
        let skipped = table_index * self.sample_rate;
        self.select_linear(bit, k, start, skipped)
    }

    /// Scan for the k-th occurrence from `start`, with `count` occurrences
    /// already accounted for before `start`.
    fn select_linear(&self, bit: bool, k: usize, start: usize, mut count: usize) -> Option<usize> {
        let target = k + 1;
        for pos in start..self.len {
            if self.get(pos) == bit {
                count += 1;
                if count == target {
                    return Some(pos);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_empty_vector() {
        let sbv = SuccinctBitVector::new(&[]);
        assert_eq!(sbv.len(), 0);
        assert!(sbv.is_empty());
        assert_eq!(sbv.rank1(0), 0);
        assert_eq!(sbv.rank0(0), 0);
        assert_eq!(sbv.select(true, 0), None);
    }

    #[test]
    fn test_single_bit() {
        let one = SuccinctBitVector::new(&[true]);
        assert_eq!(one.rank1(1), 1);
        assert_eq!(one.rank0(1), 0);
        let zero = SuccinctBitVector::new(&[false]);
        assert_eq!(zero.rank1(1), 0);
        assert_eq!(zero.rank0(1), 1);
    }

    #[rstest]
    // Pattern: 10110
    #[case(0, 0, 0)]
    #[case(1, 1, 0)]
    #[case(2, 1, 1)]
    #[case(3, 2, 1)]
    #[case(4, 3, 1)]
    #[case(5, 3, 2)]
    fn test_rank_pattern(#[case] i: usize, #[case] ones: usize, #[case] zeros: usize) {
        let sbv = SuccinctBitVector::new(&[true, false, true, true, false]);
        assert_eq!(sbv.rank1(i), ones);
        assert_eq!(sbv.rank0(i), zeros);
    }

    #[test]
    fn test_rank_clamps_out_of_range() {
        let sbv = SuccinctBitVector::new(&[true, false, true, true, false]);
        assert_eq!(sbv.rank1(1000), 3);
        assert_eq!(sbv.rank0(1000), 2);
    }

    #[test]
    fn test_select_pattern() {
        // Pattern: 10110
        let sbv = SuccinctBitVector::new(&[true, false, true, true, false]);
        assert_eq!(sbv.select(true, 0), Some(0));
        assert_eq!(sbv.select(true, 1), Some(2));
        assert_eq!(sbv.select(true, 2), Some(3));
        assert_eq!(sbv.select(true, 3), None);
        assert_eq!(sbv.select(false, 0), Some(1));
        assert_eq!(sbv.select(false, 1), Some(4));
        assert_eq!(sbv.select(false, 2), None);
    }

    #[test]
    fn test_select_all_ones() {
        let sbv = SuccinctBitVector::new(&[true, true, true]);
        assert_eq!(sbv.select(true, 2), Some(2));
        assert_eq!(sbv.select(false, 0), None);
    }

    #[test]
    fn test_rank_sum_invariant() {
        let bits: Vec<bool> = (0..500).map(|i| i % 3 == 0).collect();
        let sbv = SuccinctBitVector::new(&bits);
        for i in 0..=500 {
            assert_eq!(sbv.rank0(i) + sbv.rank1(i), i);
        }
    }

    #[test]
    fn test_alternating_hundred_bits() {
        // 0,1,0,1,... over 100 bits; exercises multiple blocks.
        let bits: Vec<bool> = (0..100).map(|i| i % 2 == 1).collect();
        let sbv = SuccinctBitVector::new(&bits);
        assert_eq!(sbv.rank1(100), 50);
        assert_eq!(sbv.rank0(100), 50);
        assert_eq!(sbv.select(true, 0), Some(1));
        assert_eq!(sbv.select(true, 24), Some(49));
        assert_eq!(sbv.select(false, 24), Some(48));
    }

    #[test]
    fn test_sampled_select_on_large_vector() {
        // Above the linear-scan threshold, so the sampled tables are in play.
        let bits: Vec<bool> = (0..1000).map(|i| i % 3 == 0).collect();
        let sbv = SuccinctBitVector::new(&bits);
        for k in [0, 1, 12, 100, 333] {
            assert_eq!(sbv.select(true, k), Some(3 * k));
        }
        assert_eq!(sbv.select(true, 334), None);
        // Beyond the sample table entirely.
        assert_eq!(sbv.select(true, 352), None);
        assert_eq!(sbv.select(false, 0), Some(1));
        assert_eq!(sbv.select(false, 1), Some(2));
        assert_eq!(sbv.select(false, 665), Some(998));
        assert_eq!(sbv.select(false, 666), None);
    }

    #[test]
    fn test_boundary_marking_use_case() {
        // 1s mark the start of a node's adjacency run, 0s continuations.
        let bits = [false, false, true, false, false, false, true, false];
        let sbv = SuccinctBitVector::new(&bits);
        assert_eq!(sbv.select(true, 0), Some(2));
        assert_eq!(sbv.select(true, 1), Some(6));
        assert_eq!(sbv.rank0(2), 2);
        assert_eq!(sbv.rank0(6), 5);
    }
}

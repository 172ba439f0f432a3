//! Packed CSR (Compressed Sparse Row) geometry (component 4.H): the gap
//! policy that leaves room for a handful of future inserts next to each
//! node's adjacency list without rebuilding the whole structure.

/// Slots reserved for a node whose current adjacency list has `length`
/// entries: `ceil(length / density)`, so a denser target packs adjacency
/// lists tighter (less slack, more frequent rebuilds) and a sparser one
/// leaves more room to grow in place. Empty lists still get one gap slot so a
/// single later insertion never forces a chunk rewrite.
pub fn slots_for_length(length: u64, density: f64) -> u64 {
    if length == 0 {
        return 1;
    }
    (length as f64 / density).ceil() as u64
}

/// A CSR header for one direction of one rel table: `offsets[i]` is the
/// slot where node group-local offset `i`'s adjacency list starts,
/// `lengths[i]` is how many of the reserved slots are actually occupied.
#[derive(Debug, Clone, Default)]
pub struct CsrHeader {
    pub offsets: Vec<u64>,
    pub lengths: Vec<u64>,
}

impl CsrHeader {
    /// Builds offsets/capacities from per-node adjacency-list lengths,
    /// applying the gap policy and laying lists out contiguously in offset
    /// order (the whole node group's CSR is rebuilt this way during bulk
    /// `RelBatchInsert` rather than trying to grow a single list in place).
    pub fn build(lengths: &[u64], density: f64) -> CsrHeader {
        let mut offsets = Vec::with_capacity(lengths.len());
        let mut cursor = 0u64;
        for &len in lengths {
            offsets.push(cursor);
            cursor += slots_for_length(len, density).max(len);
        }
        CsrHeader { offsets, lengths: lengths.to_vec() }
    }

    pub fn total_slots(&self, density: f64) -> u64 {
        self.offsets
            .iter()
            .zip(&self.lengths)
            .map(|(_, &len)| slots_for_length(len, density).max(len))
            .sum()
    }

    pub fn range(&self, local_offset: usize) -> std::ops::Range<u64> {
        let start = self.offsets[local_offset];
        start..start + self.lengths[local_offset]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_round_up_to_density_ceiling() {
        assert_eq!(slots_for_length(8, 0.8), 10);
        assert_eq!(slots_for_length(1, 0.8), 2);
        assert_eq!(slots_for_length(0, 0.8), 1);
    }

    #[test]
    fn header_offsets_are_monotonic_and_gapped() {
        let header = CsrHeader::build(&[3, 0, 5], 0.8);
        assert_eq!(header.offsets[0], 0);
        assert!(header.offsets[1] >= 3); // gap left after the first list
        assert!(header.offsets[2] >= header.offsets[1]);
        assert_eq!(header.range(0), 0..3);
    }
}

//! IMIX scheduling
//!
//! Expands weighted frame sizes into an interleaved sequence using smooth
//! weighted round-robin: sizes are spread out instead of emitted in runs,
//! and each size appears exactly `weight` times.

use crate::config::ImixConfig;
use pktforge_common::ForgeResult;

/// Frame sizes in transmit order, `total_weight` entries long
pub fn schedule(imix: &ImixConfig) -> ForgeResult<Vec<u16>> {
    imix.validate()?;

    let active: Vec<(u16, i64)> = imix
        .patterns
        .iter()
        .filter(|p| p.weight > 0)
        .map(|p| (p.size, i64::from(p.weight)))
        .collect();
    let total: i64 = active.iter().map(|&(_, w)| w).sum();

    let mut current = vec![0i64; active.len()];
    let mut sequence = Vec::with_capacity(total as usize);
    for _ in 0..total {
        let mut best = 0;
        for (i, &(_, weight)) in active.iter().enumerate() {
            current[i] += weight;
            if current[i] > current[best] {
                best = i;
            }
        }
        current[best] -= total;
        sequence.push(active[best].0);
    }

    tracing::debug!(patterns = active.len(), entries = sequence.len(), "imix schedule built");
    Ok(sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImixPattern;

    fn imix(patterns: &[(u16, u32)]) -> ImixConfig {
        ImixConfig {
            patterns: patterns
                .iter()
                .map(|&(size, weight)| ImixPattern { size, weight })
                .collect(),
        }
    }

    #[test]
    fn test_classic_imix_counts() {
        let seq = schedule(&imix(&[(64, 7), (594, 4), (1518, 1)])).unwrap();
        assert_eq!(seq.len(), 12);
        assert_eq!(seq.iter().filter(|&&s| s == 64).count(), 7);
        assert_eq!(seq.iter().filter(|&&s| s == 594).count(), 4);
        assert_eq!(seq.iter().filter(|&&s| s == 1518).count(), 1);
    }

    #[test]
    fn test_interleaves() {
        let seq = schedule(&imix(&[(100, 2), (200, 2)])).unwrap();
        assert_eq!(seq, vec![100, 200, 100, 200]);

        let seq = schedule(&imix(&[(64, 5), (1500, 1)])).unwrap();
        assert_eq!(seq, vec![64, 64, 64, 1500, 64, 64]);
    }

    #[test]
    fn test_zero_weight_skipped() {
        let seq = schedule(&imix(&[(64, 0), (128, 3)])).unwrap();
        assert_eq!(seq, vec![128, 128, 128]);
    }

    #[test]
    fn test_invalid_rejected() {
        assert!(schedule(&imix(&[])).is_err());
        assert!(schedule(&imix(&[(64, 3000)])).is_err());
    }
}

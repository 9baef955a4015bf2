//! Splitting a total article budget across sites

/// Divide `total` evenly across `parts` sites
///
/// The remainder goes one article each to the first sites, so the shares sum
/// to `total` and differ by at most one. Unused shares are never redistributed.
pub fn distribute_budget(total: u32, parts: usize) -> Vec<u32> {
    if parts == 0 {
        return Vec::new();
    }

    let parts_u32 = u32::try_from(parts).unwrap_or(u32::MAX);
    let base = total / parts_u32;
    let remainder = (total % parts_u32) as usize;

    (0..parts)
        .map(|index| if index < remainder { base + 1 } else { base })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remainder_goes_to_first_sites() {
        assert_eq!(distribute_budget(10, 3), vec![4, 3, 3]);
        assert_eq!(distribute_budget(11, 3), vec![4, 4, 3]);
    }

    #[test]
    fn test_even_split() {
        assert_eq!(distribute_budget(9, 3), vec![3, 3, 3]);
    }

    #[test]
    fn test_budget_smaller_than_site_count() {
        assert_eq!(distribute_budget(2, 5), vec![1, 1, 0, 0, 0]);
    }

    #[test]
    fn test_no_sites() {
        assert!(distribute_budget(10, 0).is_empty());
    }

    #[test]
    fn test_shares_conserve_budget_and_stay_balanced() {
        for total in 0..60u32 {
            for parts in 1..12usize {
                let shares = distribute_budget(total, parts);
                assert_eq!(shares.len(), parts);
                assert_eq!(shares.iter().sum::<u32>(), total);

                let max = shares.iter().max().copied().unwrap_or(0);
                let min = shares.iter().min().copied().unwrap_or(0);
                assert!(max - min <= 1, "total={total} parts={parts} shares={shares:?}");
            }
        }
    }
}

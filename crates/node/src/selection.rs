//! Deterministic challenge-set selection.
//!
//! Prover and challenger must derive the identical blob set from the cycle
//! randomness, a submitter address and the total file count, with no further
//! coordination. [`select_indices`] is that shared derivation. The dedicated
//! challenger role additionally carries [`spread_commits`], the legacy
//! range-with-re-use derivation the deployed on-chain verifier expects when
//! fewer files exist than the challenge set is wide.

use alloy_primitives::{Address, U256};
use kahu_kzg::Commitment;
use kahu_store::FileRecord;

/// 0-based file indices of a submitter's challenge set.
///
/// `idx_i = ((i * A) mod M) / 2 + (rnd mod M) / 2` where `A` is the submitter
/// address as an integer and `M` the total file count. The result indexes the
/// 1-based file table at `idx + 1`. Empty when no files are registered.
pub fn select_indices(
    rnd_raw: &[u8; 32],
    submitter: Address,
    total_files: u64,
    count: u64,
) -> Vec<u64> {
    if total_files == 0 {
        return Vec::new();
    }
    let m = U256::from(total_files);
    let two = U256::from(2u64);
    let rnd = U256::from_be_bytes(*rnd_raw);
    let start = (rnd % m) / two;
    let addr = U256::from_be_slice(submitter.as_slice());

    (0..count)
        .map(|i| {
            let idx = (U256::from(i) * addr % m) / two + start;
            idx.to::<u64>()
        })
        .collect()
}

/// 1-based inclusive id range the legacy challenger derivation reads.
pub fn spread_range(rnd_raw: &[u8; 32], total_files: u64, count: u64) -> (i64, i64) {
    let m = U256::from(total_files.max(1));
    let rnd = U256::from_be_bytes(*rnd_raw);
    let start = ((rnd % m) / U256::from(2u64)).to::<u64>() as i64;
    let end = start + (count.min(total_files.max(1)) as i64 - 1) / 2;
    (start + 1, end + 1)
}

/// Stretches a contiguous file range over a `count`-wide commitment list,
/// substituting the identity for expired files.
///
/// The re-use rule `tmp[(i mod length) / 2]` is part of the deployed
/// verifier's expectations and must not be normalized.
pub fn spread_commits(
    files: &[FileRecord],
    total_files: u64,
    count: u64,
    last: i64,
) -> Vec<Commitment> {
    let tmp: Vec<Commitment> = files
        .iter()
        .map(|f| {
            if f.expiration > last {
                f.commitment
            } else {
                Commitment::zero()
            }
        })
        .collect();
    if tmp.is_empty() {
        return vec![Commitment::zero(); count as usize];
    }

    let length = total_files.max(1);
    (0..count)
        .map(|i| tmp[((i % length) / 2) as usize % tmp.len()])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    fn record(id: i64, commitment: Commitment, expiration: i64) -> FileRecord {
        FileRecord {
            id,
            commitment,
            size: 1,
            expiration,
            choose_number: 0,
            proved_success_number: 0,
        }
    }

    #[test]
    fn prover_and_challenger_agree() {
        let submitter = address!("1111111111111111111111111111111111111111");
        let mut rnd = [0u8; 32];
        rnd[31] = 0x2b;

        let a = select_indices(&rnd, submitter, 1_000, 100);
        let b = select_indices(&rnd, submitter, 1_000, 100);
        assert_eq!(a, b);
        assert_eq!(a.len(), 100);
        assert!(a.iter().all(|&i| i < 1_000));
    }

    #[test]
    fn single_file_collapses_to_index_zero() {
        // M = 1 forces every modulo to zero regardless of rnd or address.
        let submitter = address!("00000000000000000000000000000000deadbeef");
        let mut rnd = [0u8; 32];
        rnd[31] = 0x01;

        let idx = select_indices(&rnd, submitter, 1, 10_000);
        assert_eq!(idx.len(), 10_000);
        assert!(idx.iter().all(|&i| i == 0));
    }

    #[test]
    fn different_submitters_get_different_sets() {
        let a = address!("0000000000000000000000000000000000000007");
        let b = address!("0000000000000000000000000000000000000009");
        let rnd = [3u8; 32];

        let sa = select_indices(&rnd, a, 997, 100);
        let sb = select_indices(&rnd, b, 997, 100);
        assert_ne!(sa, sb);
        // index 0 is submitter-independent: i * A vanishes at i = 0
        assert_eq!(sa[0], sb[0]);
    }

    #[test]
    fn no_files_means_empty_selection() {
        let rnd = [1u8; 32];
        let submitter = address!("0000000000000000000000000000000000000001");
        assert!(select_indices(&rnd, submitter, 0, 100).is_empty());
    }

    #[test]
    fn spread_reuses_commits_with_the_legacy_rule() {
        use kahu_kzg::{commit, split_data, Srs};
        let srs = Srs::deterministic(8);
        let c1 = commit(&split_data(b"spread 1"), &srs.pk()).unwrap();
        let c2 = commit(&split_data(b"spread 2"), &srs.pk()).unwrap();

        // 3 files total, a 10-wide set: tmp[(i % 3) / 2] cycles 0, 0, 1, ...
        let files = vec![record(1, c1, 100), record(2, c2, 100)];
        let out = spread_commits(&files, 3, 10, 50);
        assert_eq!(out.len(), 10);
        for (i, got) in out.iter().enumerate() {
            let expect = if (i as u64 % 3) / 2 == 0 { c1 } else { c2 };
            assert_eq!(*got, expect, "slot {i}");
        }
    }

    #[test]
    fn spread_substitutes_zero_for_expired_files() {
        use kahu_kzg::{commit, split_data, Srs};
        let srs = Srs::deterministic(8);
        let c = commit(&split_data(b"expiring"), &srs.pk()).unwrap();

        let files = vec![record(1, c, 40)];
        let out = spread_commits(&files, 1, 4, 50);
        assert!(out.iter().all(|c| *c == Commitment::zero()));
    }

    #[test]
    fn spread_range_is_anchored_by_rnd() {
        let mut rnd = [0u8; 32];
        rnd[31] = 10;

        // rnd mod 100 = 10, start index 5 -> ids 6..=11 for an 11-wide set
        let (start, end) = spread_range(&rnd, 100, 11);
        assert_eq!((start, end), (6, 11));

        // fewer files than the set is wide clamps the range to the table:
        // rnd mod 7 = 3, start index 1, span (7-1)/2
        let (start, end) = spread_range(&rnd, 7, 10_000);
        assert_eq!((start, end), (2, 5));
    }
}

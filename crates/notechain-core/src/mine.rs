use crate::error::ChainError;
use crate::{payload_json, sealing_digest, Block};
use tracing::info;

/// Mine the block by incrementing the nonce until its hash starts with
/// `difficulty` hex `'0'` characters.
///
/// Blocks the caller for the whole search. With `max_iterations = None` the
/// search has no upper bound, which is fine at low difficulty but can run
/// for a very long time as difficulty grows.
pub fn mine_block(
    mut block: Block,
    difficulty: usize,
    max_iterations: Option<u64>,
) -> Result<Block, ChainError> {
    // Only the nonce varies between attempts.
    let payload = payload_json(&block.payload);
    let mut attempts = 0u64;
    loop {
        let hash = sealing_digest(&block.previous_hash, block.timestamp, &payload, block.nonce);
        attempts += 1;
        if meets_difficulty(&hash, difficulty) {
            info!(
                "Mined block {} with nonce {} and hash {} after {} attempts",
                block.id, block.nonce, hash, attempts
            );
            block.hash = hash;
            return Ok(block);
        }
        if max_iterations.is_some_and(|cap| attempts >= cap) {
            return Err(ChainError::MiningTimeout {
                iterations: attempts,
                difficulty,
            });
        }
        block.nonce = block.nonce.wrapping_add(1);
    }
}

pub fn count_leading_zero_hex(hash: &str) -> usize {
    hash.bytes().take_while(|b| *b == b'0').count()
}

pub fn meets_difficulty(hash: &str, difficulty: usize) -> bool {
    count_leading_zero_hex(hash) >= difficulty
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EncryptedPayload;

    fn candidate() -> Block {
        let payload = EncryptedPayload {
            id: "n1".into(),
            encrypted_data: "deadbeef".into(),
            created_at: 1_600_000_000_000,
            updated_at: 1_600_000_000_000,
        };
        Block::candidate("0", 1_600_000_000_200, payload)
    }

    #[test]
    fn leading_zero_hex_examples() {
        assert_eq!(count_leading_zero_hex("00ab"), 2);
        assert_eq!(count_leading_zero_hex("0000"), 4);
        assert_eq!(count_leading_zero_hex("a000"), 0);
        assert_eq!(count_leading_zero_hex(""), 0);
        assert!(meets_difficulty("000f", 2));
        assert!(!meets_difficulty("0f00", 2));
        assert!(meets_difficulty("f", 0));
    }

    #[test]
    fn mine_block_example() {
        let mined = mine_block(candidate(), 2, None).unwrap();
        assert!(mined.hash.starts_with("00"));
        assert_eq!(mined.hash, mined.compute_hash());
    }

    #[test]
    fn mine_block_finds_first_matching_nonce() {
        let mined = mine_block(candidate(), 2, None).unwrap();
        let mut probe = candidate();
        for nonce in 0..mined.nonce {
            probe.nonce = nonce;
            assert!(!meets_difficulty(&probe.compute_hash(), 2));
        }
    }

    #[test]
    fn mine_block_difficulty_zero_takes_nonce_zero() {
        let mined = mine_block(candidate(), 0, Some(1)).unwrap();
        assert_eq!(mined.nonce, 0);
    }

    #[test]
    fn mine_block_gives_up_at_cap() {
        // 64 leading zeros is unreachable in 10 attempts.
        let err = mine_block(candidate(), 64, Some(10)).unwrap_err();
        match err {
            ChainError::MiningTimeout { iterations, difficulty } => {
                assert_eq!(iterations, 10);
                assert_eq!(difficulty, 64);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

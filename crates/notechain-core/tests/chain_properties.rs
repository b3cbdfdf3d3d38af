use notechain_core::{
    digest, Block, Chain, CipherCodec, CipherKey, FixedClock, Note,
};

fn note(id: &str, title: &str, content: &str, tag: &str) -> Note {
    let clock = FixedClock::new(1_700_000_000_000);
    Note::new(id, title, content, vec![tag.to_string()], &clock)
}

fn flip_hex_char(s: &mut String, idx: usize) {
    let c = s.as_bytes()[idx];
    let replacement = if c == b'0' { "1" } else { "0" };
    s.replace_range(idx..idx + 1, replacement);
}

#[test]
fn test_round_trip_through_chain_export() -> anyhow::Result<()> {
    let codec = CipherCodec::new(&CipherKey::from_hex(&"ab".repeat(32))?);
    let mut chain = Chain::new();
    let notes = vec![
        note("n1", "Groceries", "milk, eggs", "home"),
        note("n2", "Taxes", "file by April", "finance"),
        note("n3", "Ünïcode ✓", "line one\nline \"two\"", "misc"),
    ];
    for n in &notes {
        chain.append(codec.encrypt(n)?)?;
    }

    let exported = chain.export()?;
    let mut restored = Chain::new();
    assert!(restored.import(&exported));
    for n in &notes {
        let block = restored.lookup_by_payload_id(&n.id).expect("block for note");
        assert_eq!(&codec.decrypt(&block.payload)?, n);
    }
    Ok(())
}

#[test]
fn test_import_every_single_hash_flip_is_rejected() -> anyhow::Result<()> {
    let codec = CipherCodec::default();
    let mut chain = Chain::new();
    chain.append(codec.encrypt(&note("n1", "Groceries", "milk, eggs", "home"))?)?;
    chain.append(codec.encrypt(&note("n2", "Taxes", "file by April", "finance"))?)?;
    let before = chain.stats();

    let mut source = Chain::new();
    source.append(codec.encrypt(&note("x", "Other", "chain", "misc"))?)?;
    let candidate: Vec<Block> = serde_json::from_str(&source.export()?)?;

    for block_idx in 0..candidate.len() {
        for char_idx in [0, 1, 17, 63] {
            let mut tampered = candidate.clone();
            flip_hex_char(&mut tampered[block_idx].hash, char_idx);
            let serialized = serde_json::to_string(&tampered)?;
            assert!(!chain.import(&serialized));
            let after = chain.stats();
            assert_eq!(after.count, before.count);
            assert_eq!(
                after.tip.as_ref().map(|b| &b.hash),
                before.tip.as_ref().map(|b| &b.hash)
            );
        }
    }
    // the untampered candidate is still accepted
    assert!(chain.import(&source.export()?));
    assert_eq!(chain.len(), 2);
    Ok(())
}

#[test]
fn test_digest_properties() {
    let codec = CipherCodec::default();
    let inputs = ["", "a", "b", "milk, eggs", "milk, eggs "];
    for x in inputs {
        assert_eq!(codec.digest(x), codec.digest(x));
        assert_eq!(codec.digest(x), digest(x));
        assert!(codec.verify(x, &codec.digest(x)));
        for y in inputs.iter().filter(|y| **y != x) {
            assert!(!codec.verify(x, &codec.digest(y)));
        }
    }
}

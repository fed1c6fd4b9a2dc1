use anyhow::{Context, Result, bail};
use sha2::{Digest, Sha256};

/// Resolve CLI seed tokens into numeric world seeds.
///
/// Accepts decimal integers (negative values use their magnitude), `0x`
/// hexadecimal, and free-form words, which are hashed so that a world named
/// `"dunes"` always maps to the same seed.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds = Vec::new();
    for token in tokens {
        if token.is_empty() {
            continue;
        }
        let seed = parse_seed(token)?;
        if !seeds.contains(&seed) {
            seeds.push(seed);
        }
    }
    if seeds.is_empty() {
        bail!("no seeds provided");
    }
    Ok(seeds)
}

fn parse_seed(token: &str) -> Result<u64> {
    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16).with_context(|| format!("invalid hex seed {token}"));
    }
    if let Ok(value) = token.parse::<i64>() {
        return Ok(value.unsigned_abs());
    }
    if let Ok(value) = token.parse::<u64>() {
        return Ok(value);
    }
    Ok(hash_word(token))
}

fn hash_word(word: &str) -> u64 {
    let digest = Sha256::digest(word.trim().to_lowercase().as_bytes());
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn numbers_hex_and_words_resolve() {
        let seeds = resolve_seed_inputs(&tokens(&["42", "-7", "0xff", "18446744073709551615"]))
            .unwrap();
        assert_eq!(seeds, vec![42, 7, 255, u64::MAX]);

        let words = resolve_seed_inputs(&tokens(&["Dunes", "dunes", "oasis"])).unwrap();
        assert_eq!(words.len(), 2);
        assert_ne!(words[0], words[1]);
    }

    #[test]
    fn invalid_or_empty_inputs_fail() {
        assert!(resolve_seed_inputs(&tokens(&["0xZZ"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["", ""])).is_err());
    }
}

//! Parser for FIMI-style `.dat` transaction files.
//!
//! One transaction per line, whitespace-separated non-negative integer item
//! identifiers; `#`-prefixed lines are comments. Identifiers may be sparse;
//! they are mapped to dense attribute indices in increasing identifier
//! order. Without an explicit header list the identifiers themselves name
//! the attributes.

use anyhow::{bail, Context, Result};
use itertools::Itertools;
use mtv::{Dataset, Itemset};

pub fn parse(content: &str, headers: Option<Vec<String>>) -> Result<Dataset> {
    let mut rows: Vec<Vec<u64>> = Vec::new();
    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let items: Vec<u64> = line
            .split_whitespace()
            .map(|token| {
                token
                    .parse()
                    .with_context(|| format!("line {}: invalid item \"{token}\"", number + 1))
            })
            .collect::<Result<_>>()?;
        rows.push(items);
    }

    let ids: Vec<u64> = rows.iter().flatten().copied().sorted().dedup().collect();
    if ids.len() > 64 {
        bail!("dataset uses {} distinct items, at most 64 are supported", ids.len());
    }

    let names: Vec<String> = match headers {
        Some(lines) => ids
            .iter()
            .map(|&id| {
                lines
                    .get(id as usize)
                    .cloned()
                    .with_context(|| format!("no header for item {id}"))
            })
            .collect::<Result<_>>()?,
        None => ids.iter().map(|id| id.to_string()).collect(),
    };

    let transactions: Vec<Itemset> = rows
        .iter()
        .map(|items| {
            Itemset::union_of(items.iter().map(|id| {
                let attr = ids.binary_search(id).expect("id was collected above");
                Itemset::singleton(attr as u32)
            }))
        })
        .collect();

    Dataset::new(transactions, names).context("invalid dataset")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_transactions() {
        let d = parse("0 1\n1 2\n\n0 1 2\n", None).unwrap();
        assert_eq!(d.len(), 3);
        assert_eq!(d.transactions()[0], Itemset::from_bits(0b011));
        assert_eq!(d.transactions()[1], Itemset::from_bits(0b110));
        assert_eq!(d.transactions()[2], Itemset::from_bits(0b111));
        assert_eq!(d.headers(), &["0".to_string(), "1".to_string(), "2".to_string()]);
    }

    #[test]
    fn skips_comments_and_blanks() {
        let d = parse("# a comment\n\n3 5\n", None).unwrap();
        assert_eq!(d.len(), 1);
        assert_eq!(d.transactions()[0], Itemset::from_bits(0b11));
    }

    #[test]
    fn sparse_identifiers_are_densified() {
        let d = parse("10 50\n50 999\n", None).unwrap();
        assert_eq!(d.headers(), &["10".to_string(), "50".to_string(), "999".to_string()]);
        assert_eq!(d.transactions()[0], Itemset::from_bits(0b011));
        assert_eq!(d.transactions()[1], Itemset::from_bits(0b110));
    }

    #[test]
    fn duplicate_items_in_a_row_collapse() {
        let d = parse("4 4 4\n", None).unwrap();
        assert_eq!(d.transactions()[0], Itemset::singleton(0));
    }

    #[test]
    fn named_headers() {
        let headers = vec!["zero".to_string(), "one".to_string()];
        let d = parse("0 1\n1\n", Some(headers)).unwrap();
        assert_eq!(d.headers(), &["zero".to_string(), "one".to_string()]);
        let missing = parse("0 7\n", Some(vec!["zero".to_string()]));
        assert!(missing.is_err());
    }

    #[test]
    fn rejects_garbage_and_oversized_universes() {
        assert!(parse("1 x 3\n", None).is_err());
        let wide = (0..70).map(|i| i.to_string()).join(" ");
        assert!(parse(&wide, None).is_err());
    }
}

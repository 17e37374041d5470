//! Port list parsing for `--ports`

use crate::error::{AppError, Result};
use std::collections::HashSet;

/// Parse a comma-separated list of ports and inclusive `start-end` ranges.
///
/// Duplicates are dropped; the first occurrence keeps its position.
pub fn parse_port_list(s: &str) -> Result<Vec<u16>> {
    let mut out: Vec<u16> = Vec::new();
    let mut seen = HashSet::new();

    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some((a, b)) = part.split_once('-') {
            let start = parse_port(a.trim())
                .map_err(|e| AppError::parse(format!("invalid start in range '{}': {}", part, e)))?;
            let end = parse_port(b.trim())
                .map_err(|e| AppError::parse(format!("invalid end in range '{}': {}", part, e)))?;
            if start > end {
                return Err(AppError::parse(format!(
                    "invalid range {}-{} (start > end)",
                    start, end
                )));
            }
            for p in start..=end {
                if seen.insert(p) {
                    out.push(p);
                }
            }
            continue;
        }

        let p = parse_port(part)?;
        if seen.insert(p) {
            out.push(p);
        }
    }

    if out.is_empty() {
        return Err(AppError::parse(format!("no ports in '{}'", s)));
    }

    Ok(out)
}

fn parse_port(s: &str) -> Result<u16> {
    let port: u16 = s
        .parse()
        .map_err(|_| AppError::parse(format!("invalid port: {}", s)))?;
    if port == 0 {
        return Err(AppError::parse("port 0 is not allowed"));
    }
    Ok(port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_singles_and_ranges() {
        assert_eq!(parse_port_list("22").unwrap(), vec![22]);
        assert_eq!(parse_port_list("20-22").unwrap(), vec![20, 21, 22]);
        assert_eq!(
            parse_port_list("443, 22,80,1000-1002").unwrap(),
            vec![443, 22, 80, 1000, 1001, 1002]
        );
    }

    #[test]
    fn test_duplicates_keep_first_position() {
        assert_eq!(parse_port_list("80,22,80,21-23").unwrap(), vec![80, 22, 21, 23]);
    }

    #[test]
    fn test_invalid_input() {
        assert!(parse_port_list("0").is_err());
        assert!(parse_port_list("70000").is_err());
        assert!(parse_port_list("10-5").is_err());
        assert!(parse_port_list("bad").is_err());
        assert!(parse_port_list("1-2-3").is_err());
        assert!(parse_port_list("").is_err());
        assert!(parse_port_list(" , ,").is_err());
    }

    proptest! {
        #[test]
        fn parsed_lists_are_unique_and_nonzero(ports in proptest::collection::vec(1u16..=u16::MAX, 1..40)) {
            let csv = ports.iter().map(u16::to_string).collect::<Vec<_>>().join(",");
            let parsed = parse_port_list(&csv).unwrap();

            let unique: HashSet<u16> = ports.iter().copied().collect();
            prop_assert_eq!(parsed.len(), unique.len());
            prop_assert!(parsed.iter().all(|p| *p != 0 && unique.contains(p)));
        }

        #[test]
        fn ranges_expand_inclusively(start in 1u16..=60000, len in 0u16..200) {
            let end = start.saturating_add(len);
            let parsed = parse_port_list(&format!("{}-{}", start, end)).unwrap();
            prop_assert_eq!(parsed.len(), (end - start) as usize + 1);
            prop_assert_eq!(parsed.first().copied(), Some(start));
            prop_assert_eq!(parsed.last().copied(), Some(end));
        }
    }
}

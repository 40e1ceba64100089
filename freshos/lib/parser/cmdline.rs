use std::path::Path;

use crate::FreshosResult;

use super::parse_tokens;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Parses a kernel command line into `(key, value)` pairs.
///
/// The kernel treats `-` and `_` in parameter names as the same character, so keys are
/// normalized to underscores.
pub fn parse_cmdline(data: &str) -> Vec<(String, String)> {
    parse_tokens(data)
        .into_iter()
        .map(|(key, value)| (key.replace('-', "_"), value))
        .collect()
}

/// Reads and parses the kernel command line from `path` (normally `/proc/cmdline`).
pub fn read_cmdline(path: impl AsRef<Path>) -> FreshosResult<Vec<(String, String)>> {
    let data = std::fs::read_to_string(path)?;
    Ok(parse_cmdline(&data))
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cmdline_normalizes_dashes() {
        let params = parse_cmdline("fresh-os.uuid=64C4-1EBD rd.break");
        assert_eq!(
            params,
            vec![
                ("fresh_os.uuid".to_string(), "64C4-1EBD".to_string()),
                ("rd.break".to_string(), String::new()),
            ]
        );
    }
}

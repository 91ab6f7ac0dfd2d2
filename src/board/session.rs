use snafu::{ensure, ResultExt};

use crate::board::*;

use rand::distributions::Alphanumeric;
use rand::Rng;

use std::fs;
use std::path::Path;

const TOKEN_LEN: usize = 32;

/// Resolves the opaque voter token for this invocation.
///
/// The token is only a stable handle tying one person's commands together;
/// it authenticates nothing. An explicitly passed token always wins, which
/// keeps every store and aggregation call free of ambient identity state.
/// Otherwise the token is read from a side file next to the store,
/// generated and cached there on first use.
pub fn resolve_voter(explicit: Option<&str>, store_path: &Path) -> BoardResult<String> {
    if let Some(token) = explicit {
        let token = token.trim();
        ensure!(
            !token.is_empty(),
            InvalidFieldSnafu {
                field: "voter",
                message: "must not be empty".to_string(),
            }
        );
        return Ok(token.to_string());
    }

    let token_path = store_path.with_extension("voter");
    if token_path.exists() {
        let token = fs::read_to_string(&token_path).context(ReadingTokenSnafu {
            path: token_path.display().to_string(),
        })?;
        let token = token.trim().to_string();
        if !token.is_empty() {
            return Ok(token);
        }
        warn!("voter token file {:?} is empty, regenerating", token_path);
    }

    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect();
    fs::write(&token_path, &token).context(WritingTokenSnafu {
        path: token_path.display().to_string(),
    })?;
    info!("generated voter token in {:?}", token_path);
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_store(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "talkrank_session_{}_{}.json",
            std::process::id(),
            name
        ))
    }

    #[test]
    fn explicit_token_wins() {
        let path = temp_store("explicit");
        let token = resolve_voter(Some(" my-token "), &path).unwrap();
        assert_eq!(token, "my-token");
    }

    #[test]
    fn empty_explicit_token_is_rejected() {
        let path = temp_store("empty");
        let res = resolve_voter(Some("   "), &path);
        assert!(matches!(res, Err(BoardError::InvalidField { .. })));
    }

    #[test]
    fn generated_token_is_cached() {
        let path = temp_store("cached");
        let _ = fs::remove_file(path.with_extension("voter"));
        let first = resolve_voter(None, &path).unwrap();
        let second = resolve_voter(None, &path).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), TOKEN_LEN);
        let _ = fs::remove_file(path.with_extension("voter"));
    }
}

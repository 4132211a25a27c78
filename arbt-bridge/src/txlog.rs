use crate::config::EXPLORER_TX_URL;
use crate::error::Result;
use chrono::Local;
use ethers::core::types::H256;
use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

pub fn explorer_url(hash: H256) -> String {
    format!("{}{:#x}", EXPLORER_TX_URL, hash)
}

pub fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

/// Append-only record of sent transactions, one `[HH:MM:SS] <explorer url>`
/// line each.
#[derive(Debug, Clone)]
pub struct TxLogger {
    path: PathBuf,
}

impl TxLogger {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        TxLogger { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the record and returns the line that was written.
    pub fn append(&self, hash: H256) -> Result<String> {
        let line = format!("[{}] {}", timestamp(), explorer_url(hash));

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;

        Ok(line)
    }
}

#[cfg(test)]
pub(crate) fn is_record_line(line: &str) -> bool {
    let bytes = line.as_bytes();
    let stamp_ok = bytes.len() > 11
        && bytes[0] == b'['
        && bytes[3] == b':'
        && bytes[6] == b':'
        && bytes[9] == b']'
        && bytes[10] == b' '
        && [1, 2, 4, 5, 7, 8].iter().all(|&i| bytes[i].is_ascii_digit());
    let hash = match line.get(11..).and_then(|rest| rest.strip_prefix(EXPLORER_TX_URL)) {
        Some(hash) => hash,
        None => return false,
    };
    stamp_ok
        && hash.len() == 66
        && hash.starts_with("0x")
        && hash[2..].chars().all(|c| c.is_ascii_hexdigit())
}

use crate::errors::{context, Error, Result};
use crate::vocab::Vocabulary;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

pub const VOCAB_FILENAME: &str = "vocab.txt";

const VOCAB_TXT_ERR: &str = "vocab txt not found at";
const JSON_ERR: &str = "json artifact not found at";

pub fn load_vocab(path: &Path) -> Result<Vocabulary> {
    ensure_file(path, VOCAB_TXT_ERR)?;
    let text = fs::read_to_string(path)?;
    let vocab = Vocabulary::from_vocab_text(&text);
    log::debug!("loaded {} vocabulary entries from {}", vocab.len(), path.display());
    Ok(vocab)
}

pub fn save_vocab(vocab: &Vocabulary, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(vocab.to_vocab_text().as_bytes())?;
    writer.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    ensure_file(path, JSON_ERR)?;
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let value = serde_json::from_reader(reader)?;
    Ok(value)
}

pub fn sha256_of_files(paths: &[&Path]) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8 * 1024];

    for path in paths {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        loop {
            let read = reader.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }
    }

    Ok(format!("{:x}", hasher.finalize()))
}

pub fn ensure_file(path: &Path, context: &str) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(Error::Artifact(format!("{context} {}", path.display())))
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if parent.as_os_str().is_empty() || parent.is_dir() {
            return Ok(());
        }
        if parent.exists() {
            return Err(context(format!(
                "artifact parent '{}' is not a directory",
                parent.display()
            )));
        }
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use encoding_rs::{Encoding, UTF_8};
use encoding_rs_io::DecodeReaderBytesBuilder;

use crate::errors::MutualError;
use crate::models::{MutualPair, Profile};

pub type CsvRow = HashMap<String, String>;

pub const FRIEND_FIELDNAMES: [&str; 14] = [
    "Id",
    "ScreenName",
    "URL",
    "Name",
    "Description",
    "FriendsCount",
    "FollowersCount",
    "StatusesCount",
    "ListedCount",
    "Protected",
    "Lang",
    "Location",
    "TimeZone",
    "CreatedAt",
];

pub const FOLLOWING_FIELDNAMES: [&str; 2] = ["Following", "Follower"];

pub fn friends_csv_path(dir: &Path, account: &str) -> PathBuf {
    dir.join(format!("{account}.csv"))
}

pub fn following_csv_path(dir: &Path, account: &str) -> PathBuf {
    dir.join(format!("{account}_following_list.csv"))
}

fn resolve_encoding(label: &str) -> Result<&'static Encoding, MutualError> {
    Encoding::for_label(label.as_bytes())
        .ok_or_else(|| MutualError::Encoding(format!("unsupported encoding: {label}")))
}

pub fn read_csv_rows(path: &Path, encoding: &str) -> Result<Vec<CsvRow>, MutualError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let enc = resolve_encoding(encoding)?;
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(
        DecodeReaderBytesBuilder::new()
            .encoding(Some(enc))
            .build(file),
    );
    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = HashMap::new();
        for (header, value) in headers.iter().zip(record.iter()) {
            row.insert(header.to_string(), value.to_string());
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Writes `<account>.csv`, replacing any previous export.
pub fn write_friends(
    path: &Path,
    encoding: &str,
    friends: &[Profile],
) -> Result<usize, MutualError> {
    let enc = resolve_encoding(encoding)?;
    let mut writer = create_truncated(path)?;
    write_record(&mut writer, enc, &FRIEND_FIELDNAMES)?;
    for friend in friends {
        let id = friend.export_id();
        let friends_count = friend.friends_count.to_string();
        let followers_count = friend.followers_count.to_string();
        let statuses_count = friend.statuses_count.to_string();
        let listed_count = friend.listed_count.to_string();
        let protected = friend.protected.to_string();
        write_record(
            &mut writer,
            enc,
            &[
                id.as_str(),
                friend.screen_name.as_str(),
                friend.url.as_deref().unwrap_or_default(),
                friend.name.as_str(),
                friend.description.as_deref().unwrap_or_default(),
                friends_count.as_str(),
                followers_count.as_str(),
                statuses_count.as_str(),
                listed_count.as_str(),
                protected.as_str(),
                friend.lang.as_deref().unwrap_or_default(),
                friend.location.as_deref().unwrap_or_default(),
                friend.time_zone.as_deref().unwrap_or_default(),
                friend.created_at.as_str(),
            ],
        )?;
    }
    writer.flush()?;
    Ok(friends.len())
}

/// Writes `<account>_following_list.csv`, replacing any previous export.
pub fn write_following_list(
    path: &Path,
    encoding: &str,
    pairs: &[MutualPair],
) -> Result<usize, MutualError> {
    let enc = resolve_encoding(encoding)?;
    let mut writer = create_truncated(path)?;
    write_record(&mut writer, enc, &FOLLOWING_FIELDNAMES)?;
    for pair in pairs {
        write_record(
            &mut writer,
            enc,
            &[pair.following.as_str(), pair.follower.as_str()],
        )?;
    }
    writer.flush()?;
    Ok(pairs.len())
}

/// Deletes an export left by an earlier run. A missing file is not an error.
pub fn remove_stale_export(path: &Path) -> Result<bool, MutualError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err.into()),
    }
}

fn create_truncated(path: &Path) -> Result<BufWriter<File>, MutualError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(BufWriter::new(File::create(path)?))
}

fn write_record<W: Write>(
    writer: &mut W,
    encoding: &'static Encoding,
    record: &[&str],
) -> Result<(), MutualError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    csv_writer.write_record(record)?;
    csv_writer.flush()?;
    let buffer = csv_writer
        .into_inner()
        .map_err(|err| MutualError::Io(err.into_error()))?;
    if encoding == UTF_8 {
        writer.write_all(&buffer)?;
    } else {
        let utf8 =
            String::from_utf8(buffer).map_err(|err| MutualError::Encoding(err.to_string()))?;
        let (encoded, _, had_errors) = encoding.encode(&utf8);
        if had_errors {
            return Err(MutualError::Encoding(format!(
                "record cannot be represented in {}",
                encoding.name()
            )));
        }
        writer.write_all(&encoded)?;
    }
    Ok(())
}

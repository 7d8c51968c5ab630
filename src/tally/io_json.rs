// Ballots stored as JSON documents, one per voter.

use crate::tally::{
    io_common::{describe_js, make_default_id},
    *,
};

/// Reads ballot documents.
///
/// Two layouts are accepted: an array of documents, each carrying the id of its
/// voter, or an object keyed by voter id (an export of a document collection).
pub fn read_json_ballots(path: String, cfs: &FileSource) -> BTallyResult<Vec<BallotRecord<Song>>> {
    let contents = fs::read_to_string(&path).context(OpeningJsonSnafu { path: path.clone() })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;

    let default_id = make_default_id(&cfs.file_path);
    let voter_field = cfs.voter_field();
    let entries_field = cfs.entries_field();

    let records: Vec<BallotRecord<Song>> = match &js {
        JSValue::Array(docs) => docs
            .iter()
            .enumerate()
            .map(|(idx, doc)| {
                let voter = match doc.get(voter_field) {
                    Some(JSValue::String(s)) => s.clone(),
                    _ => default_id(idx + 1),
                };
                BallotRecord {
                    voter,
                    entries: read_entries(doc.get(entries_field)),
                }
            })
            .collect(),
        JSValue::Object(docs) => docs
            .iter()
            .map(|(voter, doc)| BallotRecord {
                voter: voter.clone(),
                entries: read_entries(doc.get(entries_field)),
            })
            .collect(),
        other => {
            return Err(Box::new(TallyError::BallotLayout {
                path,
                detail: format!(
                    "expected an array or an object of ballots, found {}",
                    describe_js(other)
                ),
            }));
        }
    };
    debug!("read_json_ballots: {} documents", records.len());
    Ok(records)
}

fn read_entries(v: Option<&JSValue>) -> RecordEntries<Song> {
    match v {
        None | Some(JSValue::Null) => RecordEntries::Missing,
        Some(JSValue::Array(items)) => {
            let mut songs: Vec<Song> = Vec::new();
            for (idx, item) in items.iter().enumerate() {
                match read_song(item) {
                    Some(song) => songs.push(song),
                    None => {
                        return RecordEntries::WrongType(format!(
                            "{} at position {}",
                            describe_js(item),
                            idx + 1
                        ));
                    }
                }
            }
            RecordEntries::Ranked(songs)
        }
        Some(other) => RecordEntries::WrongType(describe_js(other).to_string()),
    }
}

fn read_song(item: &JSValue) -> Option<Song> {
    match item {
        JSValue::String(title) => Some(Song::Title(title.clone())),
        JSValue::Object(obj) => {
            let name = obj.get("name")?.as_str()?.to_string();
            let field = |k: &str| obj.get(k).and_then(|v| v.as_str()).map(|s| s.to_string());
            Some(Song::Track {
                name,
                artist: field("artist"),
                spotify_url: field("spotifyUrl"),
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries() {
        assert_eq!(read_entries(None), RecordEntries::Missing);
        assert_eq!(read_entries(Some(&json!(null))), RecordEntries::Missing);
        assert_eq!(
            read_entries(Some(&json!("Yesterday"))),
            RecordEntries::WrongType("a string".to_string())
        );
        assert_eq!(
            read_entries(Some(&json!(["Yesterday", 3]))),
            RecordEntries::WrongType("a number at position 2".to_string())
        );
        assert_eq!(
            read_entries(Some(&json!(["Yesterday", {"name": "Help!", "rank": 2}]))),
            RecordEntries::Ranked(vec![
                Song::Title("Yesterday".to_string()),
                Song::Track {
                    name: "Help!".to_string(),
                    artist: None,
                    spotify_url: None
                }
            ])
        );
    }

    #[test]
    fn song_records_need_a_name() {
        assert_eq!(read_song(&json!({"artist": "Queen"})), None);
        assert_eq!(read_song(&json!({"name": 12})), None);
        assert_eq!(read_song(&json!(true)), None);
    }
}

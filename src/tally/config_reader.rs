use crate::tally::io_common::simplify_file_name;
use crate::tally::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub date: Option<String>,
    pub ballots: usize,
    pub candidates: usize,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    /// JSON documents: the field holding the voter id.
    #[serde(rename = "voterField")]
    pub voter_field: Option<String>,
    /// JSON documents: the field holding the ranked songs.
    #[serde(rename = "entriesField")]
    pub entries_field: Option<String>,
    #[serde(rename = "idColumnIndex")]
    _id_column_index: Option<JSValue>,
    #[serde(rename = "firstVoteColumnIndex")]
    _first_vote_column_index: Option<JSValue>,
    #[serde(rename = "firstVoteRowIndex")]
    _first_vote_row_index: Option<JSValue>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

impl FileSource {
    pub fn new(provider: &str, file_path: &str) -> FileSource {
        FileSource {
            provider: provider.to_string(),
            file_path: file_path.to_string(),
            ..FileSource::default()
        }
    }

    pub fn voter_field(&self) -> &str {
        self.voter_field.as_deref().unwrap_or("user")
    }

    pub fn entries_field(&self) -> &str {
        self.entries_field.as_deref().unwrap_or("songs")
    }

    /// The 0-based column of the voter ids, if any.
    pub fn id_column_index(&self) -> TallyResult<Option<usize>> {
        Ok(read_js_int(&self._id_column_index)?.map(|x| x - 1))
    }

    /// The 0-based column of the first choice. Defaults to the column after
    /// the ids, or the first column.
    pub fn first_vote_column_index(&self) -> TallyResult<usize> {
        match read_js_int(&self._first_vote_column_index)? {
            Some(x) => Ok(x - 1),
            None => Ok(self.id_column_index()?.map(|x| x + 1).unwrap_or(0)),
        }
    }

    /// The 0-based row of the first ballot. Defaults to the first row.
    pub fn first_vote_row_index(&self) -> TallyResult<usize> {
        Ok(read_js_int(&self._first_vote_row_index)?
            .map(|x| x - 1)
            .unwrap_or(0))
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct TallyRules {
    /// "max" or a positive number of songs per ballot.
    #[serde(rename = "maxRankingsAllowed")]
    pub max_rankings_allowed: Option<String>,
    #[serde(rename = "maxBallots")]
    pub max_ballots: Option<usize>,
    #[serde(rename = "skipMalformedBallots")]
    pub skip_malformed_ballots: Option<bool>,
}

impl TallyRules {
    pub fn max_rankings_allowed(&self) -> TallyResult<Option<usize>> {
        match self.max_rankings_allowed.as_deref() {
            None | Some("max") => Ok(None),
            Some(s) => match s.parse::<usize>() {
                Ok(x) if x > 0 => Ok(Some(x)),
                _ => whatever!("Failed to understand maxRankingsAllowed option: {:?}", s),
            },
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TallyConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "ballotFileSources")]
    pub ballot_file_sources: Vec<FileSource>,
    #[serde(default)]
    pub rules: TallyRules,
}

impl TallyConfig {
    /// The configuration used when only a ballot file is given.
    pub fn for_input(input: &str) -> TallyConfig {
        TallyConfig {
            output_settings: OutputSettings {
                contest_name: simplify_file_name(input),
                output_directory: None,
                contest_date: None,
            },
            ballot_file_sources: Vec::new(),
            rules: TallyRules::default(),
        }
    }
}

pub fn read_config(path: &str) -> TallyResult<TallyConfig> {
    let config_str = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: TallyConfig = serde_json::from_str(&config_str).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: &str) -> TallyResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

// Indexes are 1-based, as in spreadsheets. Column letters are accepted.
fn read_js_int(x: &Option<JSValue>) -> TallyResult<Option<usize>> {
    let res = match x {
        None | Some(JSValue::Null) => return Ok(None),
        Some(JSValue::Number(n)) => n.as_u64().map(|x| x as usize),
        Some(JSValue::String(s)) if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()) => {
            Some(s.to_ascii_uppercase().chars().fold(0, |acc, c| {
                acc * 26 + (c as usize - 'A' as usize + 1)
            }))
        }
        Some(JSValue::String(s)) => s.parse::<usize>().ok(),
        _ => None,
    };
    match res {
        Some(v) if v >= 1 => Ok(Some(v)),
        _ => ParsingJsonNumberSnafu {
            content: format!("{:?}", x),
        }
        .fail(),
    }
}

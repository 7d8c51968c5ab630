use log::{debug, info, warn};

use borda_count::builder::Builder;
use borda_count::*;
use snafu::{prelude::*, Snafu};

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::tally::config_reader::*;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_json;
mod io_xlsx;

#[derive(Debug, Snafu)]
pub enum TallyError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The Excel file has no worksheet with ballots"))]
    EmptyExcel {},
    #[snafu(display("Excel file {path} has {count} worksheets, pick one with excelWorksheetName"))]
    AmbiguousWorksheet { path: String, count: usize },
    #[snafu(display("Unexpected cell at line {lineno}: {content}"))]
    ExcelWrongCellType { lineno: u64, content: String },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading a line of the CSV file"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("Line {lineno} of the CSV file is too short"))]
    CsvLineTooShort { lineno: usize },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a positive number or a column letter, found {content}"))]
    ParsingJsonNumber { content: String },
    #[snafu(display("Unexpected layout of the ballots in {path}: {detail}"))]
    BallotLayout { path: String, detail: String },
    #[snafu(display("Missing parent directory"))]
    MissingParentDir {},
    #[snafu(display("Error writing the output to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("The rankings could not be computed"))]
    Ranking { source: RankingErrors },
    #[snafu(display("The ballot of {voter:?} ranks {count} songs, at most {max} are allowed"))]
    TooManyRankings {
        voter: String,
        count: usize,
        max: usize,
    },
    #[snafu(display("Received {count} ballots, at most {max} are allowed"))]
    TooManyBallots { count: usize, max: usize },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type TallyResult<T> = Result<T, TallyError>;

pub type BTallyResult<T> = Result<T, Box<TallyError>>;

/// A song, as written on a ballot.
///
/// Ballots either carry a bare title or a record picked from the track search.
/// The two forms are never reconciled: a title and a record of the same song
/// are two different candidates.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Hash)]
pub enum Song {
    Title(String),
    Track {
        name: String,
        artist: Option<String>,
        spotify_url: Option<String>,
    },
}

impl CandidateKey for Song {
    fn canonical_name(&self) -> Cow<'_, str> {
        match self {
            Song::Title(title) => Cow::Borrowed(title.as_str()),
            Song::Track { name, .. } => Cow::Borrowed(name.as_str()),
        }
    }
}

impl Song {
    fn to_json(&self) -> JSValue {
        match self {
            Song::Title(title) => json!(title),
            Song::Track {
                name,
                artist,
                spotify_url,
            } => {
                let mut m: JSMap<String, JSValue> = JSMap::new();
                m.insert("name".to_string(), json!(name));
                if let Some(a) = artist {
                    m.insert("artist".to_string(), json!(a));
                }
                if let Some(u) = spotify_url {
                    m.insert("spotifyUrl".to_string(), json!(u));
                }
                JSValue::Object(m)
            }
        }
    }
}

fn rankings_to_json(rankings: &[RankingEntry<Song>]) -> Vec<JSValue> {
    rankings
        .iter()
        .map(|e| {
            json!({
                "song": e.candidate.to_json(),
                "score": e.score,
                "rankCounts": e.histogram.to_dense(),
                "tieBreakerInfo": e.tie_break_message(),
            })
        })
        .collect()
}

fn build_summary_js(config: &TallyConfig, num_ballots: usize, rankings: &[RankingEntry<Song>]) -> JSValue {
    let c = OutputConfig {
        contest: config.output_settings.contest_name.clone(),
        date: config.output_settings.contest_date.clone(),
        ballots: num_ballots,
        candidates: rankings.len(),
    };
    json!({
        "config": c,
        "rankedSongs": rankings_to_json(rankings) })
}

fn log_rankings(rankings: &[RankingEntry<Song>]) {
    for (idx, e) in rankings.iter().enumerate() {
        match e.tie_break_message() {
            Some(note) => info!(
                "{:>4}. {} -> {} points ({})",
                idx + 1,
                e.candidate.canonical_name(),
                e.score,
                note
            ),
            None => info!(
                "{:>4}. {} -> {} points",
                idx + 1,
                e.candidate.canonical_name(),
                e.score
            ),
        }
    }
}

fn read_ballot_records(root_path: &Path, cfs: &FileSource) -> BTallyResult<Vec<BallotRecord<Song>>> {
    let p: PathBuf = root_path.join(&cfs.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read ballot file {:?}", p2);
    match cfs.provider.as_str() {
        "json" => io_json::read_json_ballots(p2, cfs),
        "csv" => io_csv::read_csv_ballots(p2, cfs),
        "xlsx" => io_xlsx::read_xlsx_ballots(p2, cfs),
        x => Err(Box::new(TallyError::Whatever {
            message: format!("Provider not implemented {:?}", x),
            source: None,
        })),
    }
}

// Malformed records are only dropped when the rules ask for it.
fn drop_malformed(records: Vec<BallotRecord<Song>>) -> Vec<BallotRecord<Song>> {
    records
        .into_iter()
        .filter(|r| match &r.entries {
            RecordEntries::Ranked(_) => true,
            other => {
                warn!(
                    "Skipping malformed ballot from voter {:?}: {:?}",
                    r.voter, other
                );
                false
            }
        })
        .collect()
}

fn validate_ballots(records: Vec<BallotRecord<Song>>, rules: &TallyRules) -> TallyResult<Vec<Ballot<Song>>> {
    let records = if rules.skip_malformed_ballots.unwrap_or(false) {
        drop_malformed(records)
    } else {
        records
    };
    let checked = check_ballots(&records).context(RankingSnafu {})?;

    // The latest ballot of a voter is the one that counts.
    let mut builder: Builder<Song> = Builder::new();
    for b in checked.iter() {
        builder.add_ballot(&b.voter, &b.entries);
    }
    debug!(
        "validate_ballots: {} records, {} voters",
        checked.len(),
        builder.len()
    );

    if let Some(max) = rules.max_ballots {
        ensure!(
            builder.len() <= max,
            TooManyBallotsSnafu {
                count: builder.len(),
                max
            }
        );
    }
    if let Some(max) = rules.max_rankings_allowed()? {
        for b in builder.ballots() {
            ensure!(
                b.entries.len() <= max,
                TooManyRankingsSnafu {
                    voter: b.voter.clone(),
                    count: b.entries.len(),
                    max
                }
            );
        }
    }
    Ok(builder.ballots().to_vec())
}

fn load_ballots(config: &TallyConfig, root_path: &Path) -> TallyResult<Vec<Ballot<Song>>> {
    if config.ballot_file_sources.is_empty() {
        whatever!("No ballot file sources in the configuration");
    }
    let mut records: Vec<BallotRecord<Song>> = Vec::new();
    for cfs in config.ballot_file_sources.iter() {
        let mut file_records = read_ballot_records(root_path, cfs).map_err(|e| *e)?;
        debug!("load_ballots: {} records in {:?}", file_records.len(), cfs.file_path);
        records.append(&mut file_records);
    }
    info!("Read {} ballot records", records.len());
    validate_ballots(records, &config.rules)
}

fn resolve_config(args: &Args) -> TallyResult<(TallyConfig, PathBuf)> {
    let (mut config, mut root) = match (&args.config, &args.input) {
        (Some(config_path), _) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path)
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (config, root)
        }
        (None, Some(input)) => (TallyConfig::for_input(input), PathBuf::new()),
        (None, None) => whatever!("No ballots to tally: provide --config or --input"),
    };

    // Command line inputs are relative to the working directory.
    if let Some(input) = &args.input {
        let provider = args.input_type.clone().unwrap_or_else(|| "json".to_string());
        config.ballot_file_sources = vec![FileSource::new(&provider, input)];
        root = PathBuf::new();
    }
    if let Some(worksheet_name) = &args.excel_worksheet_name {
        for cfs in config.ballot_file_sources.iter_mut() {
            cfs.excel_worksheet_name = Some(worksheet_name.clone());
        }
    }
    debug!("resolve_config: config: {:?} root: {:?}", config, root);
    Ok((config, root))
}

fn write_output(
    out: Option<&str>,
    config: &TallyConfig,
    root_path: &Path,
    pretty_js: &str,
) -> TallyResult<()> {
    let out_path: Option<PathBuf> = match out {
        Some("stdout") => None,
        Some(p) => Some(PathBuf::from(p)),
        None => config
            .output_settings
            .output_directory
            .as_ref()
            .map(|d| root_path.join(d).join("summary.json")),
    };
    match out_path {
        Some(p) => {
            let path = p.display().to_string();
            info!("Writing summary to {:?}", path);
            if let Some(dir) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir).context(WritingOutputSnafu { path: path.clone() })?;
            }
            fs::write(&p, pretty_js).context(WritingOutputSnafu { path })
        }
        None => {
            println!("{}", pretty_js);
            Ok(())
        }
    }
}

fn check_reference(reference_path: &str, pretty_js_stats: &str) -> TallyResult<()> {
    let summary_ref = read_summary(reference_path)?;
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference string");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    info!("The summary matches the reference {:?}", reference_path);
    Ok(())
}

/// Reads the ballots, ranks the songs and writes the summary.
pub fn run_tally(args: &Args) -> TallyResult<()> {
    let (config, root_path) = resolve_config(args)?;
    info!("Contest: {:?}", config.output_settings.contest_name);
    let ballots = load_ballots(&config, &root_path)?;

    let result_js = if let Some(song) = &args.voters_for {
        let voters = voters_for(&ballots, song);
        info!("{} voters ranked {:?}", voters.len(), song);
        json!({ "song": song, "voters": voters })
    } else {
        let rankings = compute_rankings(&ballots);
        log_rankings(&rankings);
        build_summary_js(&config, ballots.len(), &rankings)
    };

    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    write_output(args.out.as_deref(), &config, &root_path, &pretty_js_stats)?;

    // The reference summary, if provided for comparison
    if let Some(reference_path) = &args.reference {
        check_reference(reference_path, &pretty_js_stats)?;
    }
    Ok(())
}

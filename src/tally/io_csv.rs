// Primitives for reading CSV files.

use std::fs::File;

use crate::tally::{io_common::make_default_id, *};

/// One ballot per row. Each non-empty cell from the first choice column on is
/// a song, in order of preference.
pub fn read_csv_ballots(path: String, cfs: &FileSource) -> BTallyResult<Vec<BallotRecord<Song>>> {
    let default_id = make_default_id(&cfs.file_path);

    let id_idx_o = cfs.id_column_index()?;
    let choices_start_col = cfs.first_vote_column_index()?;

    let mut res: Vec<BallotRecord<Song>> = Vec::new();
    let (records, row_offset) = get_records(&path, cfs)?;

    for (idx, line_r) in records.enumerate() {
        let lineno = idx + row_offset + 1;
        debug!("{:?} {:?}", lineno, line_r);
        let line = line_r.context(CsvLineParseSnafu {})?;
        let voter = if let Some(id_idx) = id_idx_o {
            line.get(id_idx)
                .context(CsvLineTooShortSnafu { lineno })?
                .trim()
                .to_string()
        } else {
            default_id(lineno)
        };

        let choices: Vec<Song> = line
            .iter()
            .skip(choices_start_col)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| Song::Title(s.to_string()))
            .collect();
        debug!(
            "read_csv_ballots: lineno: {:?} voter: {:?} choices: {:?}",
            lineno, &voter, &choices
        );

        res.push(BallotRecord {
            voter,
            entries: RecordEntries::Ranked(choices),
        });
    }
    Ok(res)
}

fn get_records(
    path: &str,
    cfs: &FileSource,
) -> TallyResult<(csv::StringRecordsIntoIter<File>, usize)> {
    let first_row = cfs.first_vote_row_index()?;
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut records = rdr.into_records();
    for _ in 0..first_row {
        _ = records.next();
    }
    Ok((records, first_row))
}

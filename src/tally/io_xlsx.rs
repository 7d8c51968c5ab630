use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::tally::{io_common::make_default_id, *};

/// Same layout as the CSV files: one ballot per row, songs from the first
/// choice column on.
pub fn read_xlsx_ballots(path: String, cfs: &FileSource) -> BTallyResult<Vec<BallotRecord<Song>>> {
    let default_id = make_default_id(&cfs.file_path);

    let wrange = get_range(&path, cfs)?;
    let id_idx_o = cfs.id_column_index()?;
    let start_col = cfs.first_vote_column_index()?;
    let first_row = cfs.first_vote_row_index()?;

    let mut res: Vec<BallotRecord<Song>> = Vec::new();
    for (idx, row) in wrange.rows().enumerate().skip(first_row) {
        let lineno = idx + 1;
        debug!("read_xlsx_ballots: lineno: {:?} row: {:?}", lineno, row);

        let voter = match id_idx_o.map(|id_idx| row.get(id_idx)) {
            None | Some(None) | Some(Some(DataType::Empty)) => default_id(lineno),
            Some(Some(DataType::String(s))) => s.trim().to_string(),
            Some(Some(DataType::Int(i))) => i.to_string(),
            Some(Some(DataType::Float(f))) => f.to_string(),
            Some(Some(cell)) => {
                return Err(Box::new(TallyError::ExcelWrongCellType {
                    lineno: lineno as u64,
                    content: format!("{:?}", cell),
                }));
            }
        };

        let mut choices: Vec<Song> = Vec::new();
        for cell in row.iter().skip(start_col) {
            match cell {
                DataType::Empty => {}
                DataType::String(s) if s.trim().is_empty() => {}
                DataType::String(s) => choices.push(Song::Title(s.trim().to_string())),
                // Titles such as "1999" may be stored as numbers.
                DataType::Int(i) => choices.push(Song::Title(i.to_string())),
                DataType::Float(f) => choices.push(Song::Title(f.to_string())),
                _ => {
                    return Err(Box::new(TallyError::ExcelWrongCellType {
                        lineno: lineno as u64,
                        content: format!("{:?} IN {:?}", cell, row),
                    }));
                }
            }
        }

        res.push(BallotRecord {
            voter,
            entries: RecordEntries::Ranked(choices),
        });
    }
    Ok(res)
}

fn get_range(path: &str, cfs: &FileSource) -> BTallyResult<calamine::Range<DataType>> {
    let worksheet_name_o = cfs.excel_worksheet_name.clone();
    debug!(
        "get_range: path: {:?} worksheet: {:?}",
        &path, &worksheet_name_o
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(&worksheet_name)
            .context(EmptyExcelSnafu {})?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    } else {
        let mut all_worksheets = workbook.worksheets();
        match all_worksheets.len() {
            0 => Err(Box::new(TallyError::EmptyExcel {})),
            1 => {
                let (worksheet_name, wrange) = all_worksheets.remove(0);
                debug!("get_range: using the only worksheet {:?}", worksheet_name);
                Ok(wrange)
            }
            count => Err(Box::new(TallyError::AmbiguousWorksheet {
                path: path.to_string(),
                count,
            })),
        }
    }
}

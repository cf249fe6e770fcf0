//! Participants table I/O
//!
//! Reads the CAUEEG subject annotation table (exported as TSV or CSV) into
//! [`SubjectRecord`]s and writes the enriched BIDS `participants.tsv`.

use crate::error::ConvertError;
use crate::types::{Indicator, SubjectIndicators, SubjectRecord, DERIVED_COLUMNS};
use log::debug;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Column holding the subject id in the output table
pub const ID_COLUMN: &str = "participant_id";

/// Name of the id column in the source annotation table
pub const SOURCE_ID_COLUMN: &str = "serial";

/// Boolean indicator columns of the CAUEEG annotation table
pub const INDICATOR_COLUMNS: [&str; 29] = [
    "dementia",
    "ad",
    "load",
    "eoad",
    "vd",
    "sivd",
    "ad_vd_mixed",
    "mci",
    "mci_ad",
    "mci_amnestic",
    "mci_amnestic_ef",
    "mci_amnestic_rf",
    "mci_non_amnestic",
    "mci_multi_domain",
    "mci_vascular",
    "normal",
    "cb_normal",
    "smi",
    "hc_normal",
    "ftd",
    "bvftd",
    "language_ftd",
    "semantic_aphasia",
    "non_fluent_aphasia",
    "parkinson_synd",
    "parkinson_disease",
    "parkinson_dementia",
    "nph",
    "tga",
];

/// Subject table with its source columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticipantTable {
    /// Source column names, id column renamed to `participant_id`
    pub columns: Vec<String>,
    /// One record per row, cells aligned with `columns`
    pub records: Vec<SubjectRecord>,
}

impl ParticipantTable {
    /// Load a table, tab-separated unless the file ends in `.csv`
    pub fn from_path(path: &Path) -> Result<Self, ConvertError> {
        let text = fs::read_to_string(path)?;
        let delimiter = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => b',',
            _ => b'\t',
        };
        Self::parse(&text, delimiter)
    }

    /// Parse delimited text with a header row.
    ///
    /// Quoted cells may contain the delimiter. Indicator cells are normalized
    /// to `True` / `False` / `n/a`. Columns that hold previously derived
    /// fields are dropped so a written table can be read back in.
    pub fn parse(text: &str, delimiter: u8) -> Result<Self, ConvertError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.trim_start_matches('\u{feff}').as_bytes());

        let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if header.is_empty() {
            return Err(ConvertError::Table("table is empty".to_string()));
        }

        let id_index = header
            .iter()
            .position(|c| c == ID_COLUMN || c == SOURCE_ID_COLUMN)
            .ok_or_else(|| ConvertError::MissingColumn(SOURCE_ID_COLUMN.to_string()))?;

        let kept: Vec<usize> = (0..header.len())
            .filter(|i| !DERIVED_COLUMNS.contains(&header[*i].as_str()))
            .collect();
        if kept.len() < header.len() {
            debug!(
                "Dropping {} previously derived columns",
                header.len() - kept.len()
            );
        }

        let columns: Vec<String> = kept
            .iter()
            .map(|&i| {
                if i == id_index {
                    ID_COLUMN.to_string()
                } else {
                    header[i].clone()
                }
            })
            .collect();

        let mut seen = HashSet::new();
        let mut records = Vec::new();

        for (row, result) in reader.records().enumerate() {
            let mut cells: Vec<String> = result?.iter().map(str::to_string).collect();
            if cells.len() > header.len() {
                return Err(ConvertError::Table(format!(
                    "row {} has {} cells but the header has {}",
                    row + 1,
                    cells.len(),
                    header.len()
                )));
            }
            cells.resize(header.len(), String::new());

            let participant_id = cells[id_index].clone();
            if participant_id.is_empty() {
                return Err(ConvertError::Table(format!(
                    "row {} has no participant id",
                    row + 1
                )));
            }
            if !seen.insert(participant_id.clone()) {
                return Err(ConvertError::DuplicateParticipant(participant_id));
            }

            let mut indicators = SubjectIndicators::new(participant_id.as_str());
            for (i, column) in header.iter().enumerate() {
                if !INDICATOR_COLUMNS.contains(&column.as_str()) {
                    continue;
                }
                let value = Indicator::parse(&cells[i]).ok_or_else(|| {
                    ConvertError::Table(format!(
                        "participant {}: '{}' is not a boolean in column {}",
                        participant_id, cells[i], column
                    ))
                })?;
                cells[i] = value.as_str().to_string();
                indicators.flags.insert(column.clone(), value);
            }

            let cells = kept.iter().map(|&i| std::mem::take(&mut cells[i])).collect();
            records.push(SubjectRecord::new(indicators, cells));
        }

        Ok(Self { columns, records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Render the enriched table: source columns followed by derived ones.
    ///
    /// Cells containing a tab, quote or line break are quoted.
    pub fn to_tsv(&self) -> Result<String, ConvertError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(Vec::new());

        writer.write_record(self.columns.iter().map(|c| c.as_str()).chain(DERIVED_COLUMNS))?;

        for record in &self.records {
            writer.write_record(
                record
                    .cells
                    .iter()
                    .map(|c| sanitize_cell(c))
                    .chain(record.derived_cells()),
            )?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ConvertError::Io(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| ConvertError::Table(e.to_string()))
    }

    /// Write the enriched table to `path` in one step.
    ///
    /// The content goes to a sibling temp file first and is renamed into
    /// place, so readers never see a partially written table.
    pub fn write_atomic(&self, path: &Path) -> Result<(), ConvertError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = path.with_extension("tsv.tmp");
        fs::write(&tmp, self.to_tsv()?)?;
        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

fn sanitize_cell(cell: &str) -> &str {
    if cell.is_empty() {
        crate::types::MISSING
    } else {
        cell
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DementiaLabel, NormalityLabel};
    use pretty_assertions::assert_eq;

    const TABLE: &str = "serial\tage\tnormal\tmci\tdementia\tad\n\
                         00001\t78\tTrue\t\tFalse\t\n\
                         00002\t66\tFalse\tTrue\tFalse\tFalse\n\
                         00003\t81\t\t\t1\t1\n";

    #[test]
    fn test_parse_table() {
        let table = ParticipantTable::parse(TABLE, b'\t').unwrap();

        assert_eq!(
            table.columns,
            vec!["participant_id", "age", "normal", "mci", "dementia", "ad"]
        );
        assert_eq!(table.len(), 3);

        let first = &table.records[0];
        assert_eq!(first.participant_id(), "00001");
        assert_eq!(first.indicators.normal(), Indicator::True);
        assert_eq!(first.indicators.mci(), Indicator::Missing);
        assert_eq!(first.indicators.dementia(), Indicator::False);
        assert_eq!(first.cells, vec!["00001", "78", "True", "n/a", "False", "n/a"]);

        let third = &table.records[2];
        assert_eq!(third.indicators.dementia(), Indicator::True);
        assert_eq!(third.indicators.get("ad"), Indicator::True);
        // Not a column in this table
        assert_eq!(third.indicators.get("vd"), Indicator::Missing);
    }

    #[test]
    fn test_parse_csv_with_short_rows() {
        let csv = "participant_id,normal,age\r\n00001,true\r\n";
        let table = ParticipantTable::parse(csv, b',').unwrap();

        assert_eq!(table.records[0].cells, vec!["00001", "True", ""]);
    }

    #[test]
    fn test_parse_quoted_cells() {
        let csv = "serial,symptom,normal,mci,dementia\n\
                   00001,\"mci, amnestic\",False,True,False\n\
                   00002,\"said \"\"fine\"\"\",True,False,False\n";
        let table = ParticipantTable::parse(csv, b',').unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(
            table.records[0].cells,
            vec!["00001", "mci, amnestic", "False", "True", "False"]
        );
        assert_eq!(table.records[0].indicators.mci(), Indicator::True);
        assert_eq!(table.records[1].cells[1], "said \"fine\"");
        assert_eq!(table.records[1].indicators.normal(), Indicator::True);

        let tsv = table.to_tsv().unwrap();
        assert!(tsv.contains("\tmci, amnestic\t"));
        assert!(tsv.contains("\t\"said \"\"fine\"\"\"\t"));

        let reread = ParticipantTable::parse(&tsv, b'\t').unwrap();
        assert_eq!(reread.records[1].cells, table.records[1].cells);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            ParticipantTable::parse("age\tnormal\n70\tTrue\n", b'\t'),
            Err(ConvertError::MissingColumn(_))
        ));
        assert!(matches!(
            ParticipantTable::parse("serial\tnormal\n1\tTrue\n1\tFalse\n", b'\t'),
            Err(ConvertError::DuplicateParticipant(id)) if id == "1"
        ));
        assert!(matches!(
            ParticipantTable::parse("serial\tnormal\n1\tperhaps\n", b'\t'),
            Err(ConvertError::Table(_))
        ));
        assert!(matches!(
            ParticipantTable::parse("", b'\t'),
            Err(ConvertError::Table(_))
        ));
    }

    #[test]
    fn test_to_tsv() {
        let mut table = ParticipantTable::parse(TABLE, b'\t').unwrap();
        table.records[0].dementia_label = Some(DementiaLabel::Normal);
        table.records[0].normality_label = NormalityLabel::Normal;

        let tsv = table.to_tsv().unwrap();
        let lines: Vec<&str> = tsv.lines().collect();

        assert_eq!(
            lines[0],
            "participant_id\tage\tnormal\tmci\tdementia\tad\tdementia_type\tdementia_label\t\
             normality_label\tdementia_split\tdementia_split_no_overlap\tnormality_split\t\
             normality_split_no_overlap"
        );
        assert_eq!(
            lines[1],
            "00001\t78\tTrue\tn/a\tFalse\tn/a\tn/a\tnormal\tnormal\tn/a\tn/a\tn/a\tn/a"
        );
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_round_trip_drops_derived_columns() {
        let table = ParticipantTable::parse(TABLE, b'\t').unwrap();
        let reread = ParticipantTable::parse(&table.to_tsv().unwrap(), b'\t').unwrap();

        assert_eq!(reread.columns, table.columns);
        assert_eq!(reread.records[1].cells, table.records[1].cells);
    }

    #[test]
    fn test_write_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("participants.tsv");
        let table = ParticipantTable::parse(TABLE, b'\t').unwrap();

        table.write_atomic(&path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, table.to_tsv().unwrap());
        assert!(!path.with_extension("tsv.tmp").exists());
    }
}

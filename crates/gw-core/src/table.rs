//! CSV parameter tables in, CSV result tables out.
//!
//! Input tables carry one epidemic parameter set per row under the headers in
//! [`INPUT_COLUMNS`]; any other columns are ignored. Every value must be a
//! finite, strictly positive number.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use gw_math::skeleton::EpidemicParameters;
use thiserror::Error;

use crate::exit_codes::ExitCode;

/// Latent period mean.
pub const LATENT_MEAN: &str = "e->i_mean";
/// Latent period dispersion (gamma shape).
pub const LATENT_DISPERSION: &str = "e->i_dispersion";
/// Infectious period mean.
pub const INFECTIOUS_MEAN: &str = "i->r_mean";
/// Infectious period dispersion, also the Negative Binomial shape.
pub const INFECTIOUS_DISPERSION: &str = "i->r_dispersion";
/// Basic reproduction number.
pub const REPRODUCTION_NUMBER: &str = "s->e:i_R_0";

/// Required input headers, in output order.
pub const INPUT_COLUMNS: [&str; 5] = [
    LATENT_MEAN,
    LATENT_DISPERSION,
    INFECTIOUS_MEAN,
    INFECTIOUS_DISPERSION,
    REPRODUCTION_NUMBER,
];

/// Errors reading or writing tables. Rows are numbered from 1, excluding the
/// header.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("Cannot read parameter table {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Parameter table {path} is missing column {column:?}")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("Parameter table {path}, row {row}, column {column:?}: {text:?} is not a number")]
    NotANumber {
        path: PathBuf,
        row: usize,
        column: &'static str,
        text: String,
    },

    #[error("Parameter table {path}, row {row}, column {column:?}: {value} must be finite and > 0")]
    OutOfDomain {
        path: PathBuf,
        row: usize,
        column: &'static str,
        value: f64,
    },

    #[error("Cannot create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write table {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl TableError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            TableError::CreateDir { .. } | TableError::Write { .. } => ExitCode::IoError,
            _ => ExitCode::InputError,
        }
    }
}

/// Load every parameter set from the CSV file at `path`.
pub fn read_parameter_table(path: &Path) -> Result<Vec<EpidemicParameters>, TableError> {
    let reader = csv::Reader::from_path(path).map_err(|source| TableError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    read_parameters(reader, path)
}

/// Load every parameter set from an open CSV reader. `path` only labels
/// errors.
pub fn read_parameters<R: Read>(
    mut reader: csv::Reader<R>,
    path: &Path,
) -> Result<Vec<EpidemicParameters>, TableError> {
    let read_err = |source| TableError::Read {
        path: path.to_path_buf(),
        source,
    };
    let headers = reader.headers().map_err(read_err)?.clone();
    let mut indices = [0usize; 5];
    for (slot, column) in indices.iter_mut().zip(INPUT_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.trim() == column)
            .ok_or_else(|| TableError::MissingColumn {
                path: path.to_path_buf(),
                column,
            })?;
    }

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(read_err)?;
        let row = i + 1;
        let mut values = [0.0; 5];
        for ((value, &index), column) in values.iter_mut().zip(&indices).zip(INPUT_COLUMNS) {
            let text = record.get(index).unwrap_or("").trim();
            let parsed: f64 = text.parse().map_err(|_| TableError::NotANumber {
                path: path.to_path_buf(),
                row,
                column,
                text: text.to_string(),
            })?;
            if !parsed.is_finite() || parsed <= 0.0 {
                return Err(TableError::OutOfDomain {
                    path: path.to_path_buf(),
                    row,
                    column,
                    value: parsed,
                });
            }
            *value = parsed;
        }
        let [latent_mean, latent_dispersion, infectious_mean, infectious_dispersion, r0] = values;
        rows.push(EpidemicParameters {
            latent_mean,
            latent_dispersion,
            infectious_mean,
            infectious_dispersion,
            r0,
        });
    }
    Ok(rows)
}

/// The input columns of `params`, in [`INPUT_COLUMNS`] order.
pub fn parameter_fields(params: &EpidemicParameters) -> [f64; 5] {
    [
        params.latent_mean,
        params.latent_dispersion,
        params.infectious_mean,
        params.infectious_dispersion,
        params.r0,
    ]
}

/// Shortest decimal text that reads back as the same `f64`.
pub fn format_value(value: f64) -> String {
    value.to_string()
}

/// Open a CSV writer at `path`, creating missing parent directories.
pub fn create_writer(path: &Path) -> Result<csv::Writer<File>, TableError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| TableError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    csv::Writer::from_path(path).map_err(|source| TableError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a header row followed by data rows, then flush.
pub fn write_table<I>(path: &Path, header: &[String], rows: I) -> Result<(), TableError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = create_writer(path)?;
    let write_err = |source| TableError::Write {
        path: path.to_path_buf(),
        source,
    };
    writer.write_record(header).map_err(write_err)?;
    for row in rows {
        writer.write_record(&row).map_err(write_err)?;
    }
    writer
        .flush()
        .map_err(|e| write_err(csv::Error::from(e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "e->i_mean,e->i_dispersion,i->r_mean,i->r_dispersion,s->e:i_R_0";

    fn parse(text: &str) -> Result<Vec<EpidemicParameters>, TableError> {
        read_parameters(csv::Reader::from_reader(text.as_bytes()), Path::new("test.csv"))
    }

    #[test]
    fn reads_rows_in_order() {
        let rows = parse(&format!("{HEADER}\n3.5,4,5.5,0.3,2\n1,1,2,0.5,1.5\n")).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].latent_mean, 3.5);
        assert_eq!(rows[0].infectious_dispersion, 0.3);
        assert_eq!(rows[1].r0, 1.5);
    }

    #[test]
    fn extra_columns_and_order_are_ignored() {
        let text = "label,s->e:i_R_0,i->r_dispersion,i->r_mean,e->i_dispersion,e->i_mean\n\
                    a,2,0.3,5.5,4,3.5\n";
        let rows = parse(text).unwrap();
        assert_eq!(
            parameter_fields(&rows[0]),
            [3.5, 4.0, 5.5, 0.3, 2.0]
        );
    }

    #[test]
    fn missing_column_is_named() {
        let err = parse("e->i_mean,e->i_dispersion,i->r_mean,i->r_dispersion\n1,1,1,1\n").unwrap_err();
        assert!(matches!(
            err,
            TableError::MissingColumn {
                column: REPRODUCTION_NUMBER,
                ..
            }
        ));
        assert_eq!(err.exit_code(), ExitCode::InputError);
    }

    #[test]
    fn non_positive_value_names_row_and_column() {
        let err = parse(&format!("{HEADER}\n3.5,4,5.5,0.3,2\n3.5,0,5.5,0.3,2\n")).unwrap_err();
        match err {
            TableError::OutOfDomain {
                row, column, value, ..
            } => {
                assert_eq!(row, 2);
                assert_eq!(column, LATENT_DISPERSION);
                assert_eq!(value, 0.0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn garbage_and_non_finite_values_are_rejected() {
        let err = parse(&format!("{HEADER}\n3.5,4,abc,0.3,2\n")).unwrap_err();
        assert!(matches!(
            err,
            TableError::NotANumber {
                row: 1,
                column: INFECTIOUS_MEAN,
                ..
            }
        ));
        let err = parse(&format!("{HEADER}\n3.5,4,5.5,0.3,inf\n")).unwrap_err();
        assert!(matches!(err, TableError::OutOfDomain { .. }));
    }

    #[test]
    fn header_only_table_is_empty() {
        assert!(parse(&format!("{HEADER}\n")).unwrap().is_empty());
    }

    #[test]
    fn writer_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("out.csv");
        write_table(
            &path,
            &["a".to_string(), "b".to_string()],
            vec![vec![format_value(0.5), format_value(2.0)]],
        )
        .unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "a,b\n0.5,2\n");
    }
}

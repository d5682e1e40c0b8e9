//! Output sink shared by the subcommands: a table for the terminal, JSON
//! lines for machine consumption, or CSV for the ETS import.

use std::path::PathBuf;

use csv_core::WriteResult;

use crate::model::GroupAddressRow;

/// Column set used by every format that renders flat rows.
pub const ROW_HEADERS: [&str; 4] = ["Address", "Name", "DPT", "Comment"];

/// JSONL shape of one generated row.
#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct RowRecord<'a> {
    address: String,
    name: &'a str,
    datapoint_type: &'a str,
    comment: &'a str,
}

#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Format {
    Table,
    Jsonl,
    Csv,
}

#[derive(clap::Parser)]
#[group(id = "output::Args")]
pub struct Args {
    /// Write to this file instead of the terminal.
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
    #[arg(long, short = 'f', value_enum, default_value_t = Format::Table)]
    format: Format,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("could not open the specified output file at {1:?}")]
    OpenOutputFile(#[source] std::io::Error, PathBuf),
    #[error("could not write data to the output file at {1:?}")]
    WriteFile(#[source] std::io::Error, PathBuf),
    #[error("could not write data to the terminal")]
    WriteStdout(#[source] std::io::Error),
    #[error("could not serialize the group addresses to JSON")]
    SerializeJson(#[source] serde_json::Error),
}

impl Args {
    pub fn to_output(self) -> Result<Output, Error> {
        let io = match &self.output {
            None => Box::new(std::io::stdout().lock()) as Box<_>,
            Some(path) => Box::new(
                std::fs::OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(path)
                    .map_err(|e| Error::OpenOutputFile(e, path.clone()))?,
            ) as Box<_>,
        };
        let formatter = match &self.format {
            Format::Table => {
                let mut comfy = comfy_table::Table::new();
                comfy.set_content_arrangement(comfy_table::ContentArrangement::Dynamic);
                Formatter::Table { comfy }
            }
            Format::Jsonl => Formatter::Jsonl,
            Format::Csv => Formatter::Csv { written_records: false },
        };
        Ok(Output { args: self, io, formatter })
    }
}

pub struct Output {
    args: Args,
    io: Box<dyn std::io::Write>,
    formatter: Formatter,
}

enum Formatter {
    Csv { written_records: bool },
    Table { comfy: comfy_table::Table },
    Jsonl,
}

impl Output {
    pub fn table_headers(&mut self, hdrs: Vec<&'static str>) -> Result<(), Error> {
        match &mut self.formatter {
            Formatter::Csv { written_records } => {
                if *written_records {
                    panic!("table headers for csv must be written very first!");
                }
                *written_records = true;
                self.write_csv_row(&hdrs)?;
            }
            Formatter::Table { comfy } => {
                comfy.set_header(hdrs);
            }
            Formatter::Jsonl => {}
        }
        Ok(())
    }

    fn write_csv_row<V: std::ops::Deref<Target = str>>(
        &mut self,
        values: &[V],
    ) -> Result<(), Error> {
        let record = csv_record(values);
        self.io.write_all(&record).map_err(|e| self.write_error(e))
    }

    /// Emit one record. The closures are only invoked for the formats that
    /// need them.
    pub fn result<R: serde::Serialize>(
        &mut self,
        table_row: impl FnOnce() -> Vec<String>,
        serde_record: impl FnOnce() -> R,
    ) -> Result<(), Error> {
        match &mut self.formatter {
            Formatter::Csv { written_records } => {
                *written_records = true;
                let values = table_row();
                self.write_csv_row(&values)?;
            }
            Formatter::Table { comfy } => {
                comfy.add_row(table_row());
            }
            Formatter::Jsonl => {
                serde_json::to_writer(&mut self.io, &serde_record())
                    .map_err(Error::SerializeJson)?;
                writeln!(self.io).map_err(|e| self.write_error(e))?
            }
        }
        Ok(())
    }

    /// Emit one generated group-address row under [`ROW_HEADERS`].
    pub fn row(&mut self, row: &GroupAddressRow) -> Result<(), Error> {
        self.result(
            || {
                vec![
                    row.address.to_string(),
                    row.name.clone(),
                    row.datapoint_type.clone(),
                    row.comment.clone(),
                ]
            },
            || RowRecord {
                address: row.address.to_string(),
                name: &row.name,
                datapoint_type: &row.datapoint_type,
                comment: &row.comment,
            },
        )
    }

    fn write_error(&self, e: std::io::Error) -> Error {
        match &self.args.output {
            None => Error::WriteStdout(e),
            Some(p) => Error::WriteFile(e, p.into()),
        }
    }

    pub fn commit(mut self) -> Result<(), Error> {
        match &self.formatter {
            Formatter::Csv { written_records: _ } => {}
            Formatter::Table { comfy } => {
                self.io.write_fmt(format_args!("{}", comfy)).map_err(|e| self.write_error(e))?;
            }
            Formatter::Jsonl => {}
        }
        self.io.flush().map_err(|e| self.write_error(e))
    }
}

/// One CSV record with all fields quoted as needed and a trailing terminator.
pub(crate) fn csv_record<V: std::ops::Deref<Target = str>>(values: &[V]) -> Vec<u8> {
    let max_len = 2 + 2 * values.iter().map(|v| v.len()).max().unwrap_or(0);
    let mut record = Vec::new();
    let mut output = vec![0; max_len];
    let mut writer = csv_core::Writer::new();
    for value in values {
        let inp = value.as_bytes();
        let (WriteResult::InputEmpty, ib, ob) = writer.field(inp, &mut output) else {
            panic!("something wrong with csv output");
        };
        assert_eq!(value.len(), ib);
        record.extend_from_slice(&output[..ob]);
        let (WriteResult::InputEmpty, ob) = writer.delimiter(&mut output) else {
            panic!("something wrong with csv output");
        };
        record.extend_from_slice(&output[..ob]);
    }
    let (WriteResult::InputEmpty, ob) = writer.terminator(&mut output) else {
        panic!("something wrong with csv output");
    };
    record.extend_from_slice(&output[..ob]);
    record
}

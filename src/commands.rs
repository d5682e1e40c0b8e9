pub mod generate {
    use std::path::PathBuf;

    use crate::generate::generate_group_addresses;
    use crate::i18n::{Identity, Language};
    use crate::model::{Project, ProjectError};
    use crate::output;

    /// Generate the flat group address list for a project.
    #[derive(clap::Parser)]
    pub struct Args {
        /// The project file: a template plus the device list.
        #[arg(long, short = 'p')]
        project: PathBuf,
        /// Output language; overrides the one stored in the project.
        #[arg(long, value_enum)]
        lang: Option<Language>,
        #[clap(flatten)]
        output: output::Args,
    }

    #[derive(thiserror::Error, Debug)]
    pub enum Error {
        #[error("could not load the project")]
        Project(#[from] ProjectError),
        #[error("could not write the group addresses")]
        Output(#[from] output::Error),
    }

    pub fn run(args: Args) -> Result<(), Error> {
        let project = Project::load(&args.project)?;
        let lang = args.lang.or(project.language).unwrap_or_default();
        let options = project.name_options.unwrap_or_default();
        let rows = generate_group_addresses(
            &project.template,
            &project.devices,
            lang,
            &Identity,
            &options,
        );

        let mut out = args.output.to_output()?;
        out.table_headers(output::ROW_HEADERS.to_vec())?;
        for row in &rows {
            out.row(row)?;
        }
        out.commit()?;
        Ok(())
    }
}

pub mod overview {
    use std::path::PathBuf;

    use crate::generate::generate_group_addresses;
    use crate::i18n::{Identity, Language};
    use crate::model::{Project, ProjectError};
    use crate::output;
    use crate::overview::rollup;

    #[derive(clap::ValueEnum, Clone, Debug)]
    pub enum Format {
        Table,
        Jsonl,
        Csv,
    }

    /// Show the main-group / middle-group hierarchy of a project.
    #[derive(clap::Parser)]
    pub struct Args {
        /// The project file: a template plus the device list.
        #[arg(long, short = 'p')]
        project: PathBuf,
        /// Output language; overrides the one stored in the project.
        #[arg(long, value_enum)]
        lang: Option<Language>,
        #[arg(long, short = 'f', value_enum, default_value_t = Format::Table)]
        format: Format,
        #[arg(long, short = 'o')]
        file: Option<PathBuf>,
    }

    #[derive(thiserror::Error, Debug)]
    pub enum Error {
        #[error("could not load the project")]
        Project(#[from] ProjectError),
        #[error("could not open the specified output file at {1:?}")]
        OpenOutputFile(#[source] std::io::Error, PathBuf),
        #[error("could not write data to the output file at {1:?}")]
        WriteFile(#[source] std::io::Error, PathBuf),
        #[error("could not write data to the terminal")]
        WriteStdout(#[source] std::io::Error),
        #[error("could not serialize the overview to JSON")]
        SerializeJson(#[source] serde_json::Error),
    }

    pub fn run(args: Args) -> Result<(), Error> {
        let project = Project::load(&args.project)?;
        let lang = args.lang.or(project.language).unwrap_or_default();
        let options = project.name_options.unwrap_or_default();
        let rows = generate_group_addresses(
            &project.template,
            &project.devices,
            lang,
            &Identity,
            &options,
        );
        let tree = rollup(&rows, &project.template, &project.devices, lang, &Identity);

        let mut output_writer: Box<dyn std::io::Write> = match &args.file {
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

        let data = match args.format {
            Format::Table => {
                let mut table = comfy_table::Table::new();
                table
                    .set_header(vec!["Main", "Middle", "Address", "Name", "DPT"])
                    .set_content_arrangement(comfy_table::ContentArrangement::Dynamic);
                for group in &tree.main_groups {
                    table.add_row(vec![
                        group.main.to_string(),
                        String::new(),
                        String::new(),
                        group.name.clone(),
                        String::new(),
                    ]);
                    for middle in &group.middle_groups {
                        table.add_row(vec![
                            String::new(),
                            middle.middle.to_string(),
                            String::new(),
                            format!("  {}", middle.name),
                            String::new(),
                        ]);
                        for entry in &middle.addresses {
                            table.add_row(vec![
                                String::new(),
                                String::new(),
                                entry.address.to_string(),
                                format!("    {}", entry.name),
                                entry.datapoint_type.clone(),
                            ]);
                        }
                    }
                }
                table.to_string().into_bytes()
            }
            Format::Jsonl => {
                let mut bytes = Vec::new();
                for group in &tree.main_groups {
                    let line = serde_json::to_vec(group).map_err(Error::SerializeJson)?;
                    bytes.extend_from_slice(&line);
                    bytes.push(b'\n');
                }
                bytes
            }
            Format::Csv => {
                let mut bytes = output::csv_record(&[
                    "Main", "Main Name", "Middle", "Middle Name", "Address", "Name", "DPT",
                ]);
                for group in &tree.main_groups {
                    for middle in &group.middle_groups {
                        for entry in &middle.addresses {
                            bytes.extend_from_slice(&output::csv_record(&[
                                group.main.to_string().as_str(),
                                group.name.as_str(),
                                middle.middle.to_string().as_str(),
                                middle.name.as_str(),
                                entry.address.to_string().as_str(),
                                entry.name.as_str(),
                                entry.datapoint_type.as_str(),
                            ]));
                        }
                    }
                }
                bytes
            }
        };

        output_writer.write_all(&data).map_err(|e| match args.file {
            None => Error::WriteStdout(e),
            Some(p) => Error::WriteFile(e, p),
        })?;
        Ok(())
    }
}

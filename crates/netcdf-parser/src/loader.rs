//! Opening a multi-file dataset from the model data folder.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use wx_common::time::parse_run_from_filename;
use wx_common::Region;

use crate::dataset::Dataset;
use crate::discovery::find_variable_files;
use crate::error::{NetCdfError, NetCdfResult};
use crate::field::Field;
use crate::reader::{read_file, FileContents};

/// What to read and how to subset it.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// File-name tokens of the variables to read (e.g. `t_2m`, `fi`).
    pub variables: Vec<String>,
    /// Pressure levels (Pa) to keep, nearest match.
    pub levels: Option<Vec<f64>>,
    /// Region to crop to.
    pub region: Option<Region>,
    /// Resample to hourly steps (nearest, 1 h tolerance).
    pub hourly: bool,
}

impl ReadOptions {
    pub fn new<S: AsRef<str>>(variables: &[S]) -> Self {
        Self {
            variables: variables.iter().map(|v| v.as_ref().to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn with_levels(mut self, levels: Vec<f64>) -> Self {
        self.levels = Some(levels);
        self
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    pub fn hourly(mut self, hourly: bool) -> Self {
        self.hourly = hourly;
        self
    }
}

/// Locate, read, merge and subset the files holding `options.variables`.
///
/// The run timestamp is taken from the first matching file name.
pub fn open_dataset(folder: &Path, options: &ReadOptions) -> NetCdfResult<Dataset> {
    let variables: Vec<&str> = options.variables.iter().map(String::as_str).collect();
    let files = find_variable_files(folder, &variables)?;
    let run = files
        .first()
        .and_then(|f| f.file_name())
        .and_then(|n| n.to_str())
        .map(parse_run_from_filename)
        .transpose()?;

    let contents = files
        .iter()
        .map(|path| read_file(path))
        .collect::<NetCdfResult<Vec<_>>>()?;
    let mut dataset = merge(&files, contents)?;
    dataset.run = run;

    if options.hourly {
        dataset = dataset.resample_hourly()?;
    }
    if let Some(levels) = &options.levels {
        dataset = dataset.select_levels_nearest(levels)?;
    }
    if let Some(region) = options.region {
        dataset = dataset.crop(&region.bbox())?;
    }

    info!(
        run = ?dataset.run,
        steps = dataset.ntimes(),
        levels = dataset.nlevels(),
        ny = dataset.grid.ny(),
        nx = dataset.grid.nx(),
        fields = ?dataset.fields.keys().collect::<Vec<_>>(),
        "Dataset ready"
    );
    Ok(dataset)
}

/// Pieces of one variable collected across files.
struct Pieces {
    template: Field,
    steps: Vec<(DateTime<Utc>, Vec<f32>)>,
}

/// Concatenate variables along time and join them on the union of times.
pub fn merge(paths: &[PathBuf], contents: Vec<FileContents>) -> NetCdfResult<Dataset> {
    let first = contents
        .first()
        .ok_or_else(|| NetCdfError::EmptySelection("no files to merge".into()))?;
    let grid = first.grid.clone();
    let mut levels: Option<Vec<f64>> = None;
    let mut pieces: BTreeMap<String, Pieces> = BTreeMap::new();

    for (path, file) in paths.iter().zip(contents) {
        if file.grid != grid {
            return Err(NetCdfError::InvalidFormat(format!(
                "{} is on a different grid",
                path.display()
            )));
        }
        if let Some(file_levels) = file.levels {
            match &levels {
                Some(known) if *known != file_levels => {
                    return Err(NetCdfError::InvalidFormat(format!(
                        "{} has different pressure levels",
                        path.display()
                    )));
                }
                Some(_) => {}
                None => levels = Some(file_levels),
            }
        }

        for field in file.fields {
            let plane = field.nz * field.ny * field.nx;
            let entry = pieces.entry(field.name.clone()).or_insert_with(|| Pieces {
                template: Field {
                    data: Vec::new(),
                    ..field.clone()
                },
                steps: Vec::new(),
            });
            match (&file.times, field.has_time) {
                (Some(times), true) => {
                    for (t, chunk) in times.iter().zip(field.data.chunks(plane)) {
                        entry.steps.push((*t, chunk.to_vec()));
                    }
                }
                _ => {
                    if entry.template.data.is_empty() {
                        entry.template.data = field.data;
                    } else {
                        warn!(variable = %field.name, "Ignoring repeated time-invariant variable");
                    }
                }
            }
        }
    }

    let mut times: Vec<DateTime<Utc>> = pieces
        .values()
        .flat_map(|p| p.steps.iter().map(|(t, _)| *t))
        .collect();
    times.sort();
    times.dedup();

    let mut dataset = Dataset::new(times.clone(), levels, grid);
    for (_, mut p) in pieces {
        let mut field = p.template;
        if field.has_time {
            p.steps.sort_by_key(|(t, _)| *t);
            p.steps.dedup_by_key(|(t, _)| *t);
            let plane = field.nz * field.ny * field.nx;
            let mut data = Vec::with_capacity(times.len() * plane);
            let mut steps = p.steps.into_iter().peekable();
            for t in &times {
                match steps.peek() {
                    Some((st, _)) if st == t => {
                        if let Some((_, values)) = steps.next() {
                            data.extend(values);
                        }
                    }
                    _ => data.extend(std::iter::repeat(f32::NAN).take(plane)),
                }
            }
            field.data = data;
            field.nt = times.len();
        }
        dataset.insert_field(field)?;
    }
    Ok(dataset)
}

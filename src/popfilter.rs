use indexmap::IndexMap;
use std::io;
use std::io::{BufRead, Write};
use thiserror::Error;

use super::file::{skip_header, FileError, InputFile, OutputFile};

/// Haplotype columns spanned by each line of a sample file.
pub const SAMPLE_STRIDE: usize = 4;

/// Offsets, within a sample's block of columns, of the haplotypes that are kept.
pub const HAPLOTYPE_OFFSETS: [usize; 2] = [0, 2];

#[derive(Error, Debug)]
pub enum PopFilterError {
    #[error("IO error: {0}")]
    IOError(#[from] io::Error),
    #[error("File reading error: {0}")]
    FileError(#[from] FileError),
    #[error("Missing field in sample line '{0}'")]
    MissingField(String),
    #[error("Population or group '{0}' does not exist in the sample file")]
    UnknownSelection(String),
    #[error("Haplotype line {site} has {len} columns, but column {index} was selected")]
    HaplotypeTooShort {
        site: usize,
        index: usize,
        len: usize,
    },
    #[error("Map file has fewer lines than the haplotype file (ran out at site {0})")]
    MapTooShort(usize),
}

/// Haplotype column indices for each population and group label of a sample file.
///
/// Labels are kept in the order they are first seen. A column can belong to
/// both a population and a group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleColumns {
    columns: IndexMap<String, Vec<usize>>,
}

impl SampleColumns {
    /// Read the column assignment from a sample file.
    ///
    /// The sample file format looks like:
    ///
    /// ```text
    /// ID POP GROUP SEX
    /// HG00096 GBR EUR male
    /// HG00097 GBR EUR female
    /// ```
    ///
    /// The *n*th data line (counting from 0) contributes columns `4n` and
    /// `4n + 2` to both its population and its group.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, PopFilterError> {
        let mut lines = reader.lines();
        skip_header(&mut lines, "sample file")?;

        let mut columns: IndexMap<String, Vec<usize>> = IndexMap::new();
        let mut offset = 0;
        for result in lines {
            let line = result?;
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 3 {
                return Err(PopFilterError::MissingField(line.clone()));
            }
            for label in [fields[1], fields[2]] {
                let entry = columns.entry(label.to_string()).or_default();
                entry.extend(HAPLOTYPE_OFFSETS.iter().map(|o| offset + o));
            }
            offset += SAMPLE_STRIDE;
        }
        Ok(SampleColumns { columns })
    }

    /// Read the column assignment from the sample file at `filepath`.
    pub fn from_path(filepath: &str) -> Result<Self, PopFilterError> {
        let reader = InputFile::new(filepath).reader()?;
        Self::from_reader(reader)
    }

    /// Return the number of distinct labels.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Return if no labels were read.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over labels in first-seen order.
    pub fn labels(&self) -> impl Iterator<Item = &String> {
        self.columns.keys()
    }

    /// The column indices for `label`, if it exists.
    pub fn get(&self, label: &str) -> Option<&[usize]> {
        self.columns.get(label).map(|v| v.as_slice())
    }

    /// The column indices for `label`, failing when the label is unknown.
    pub fn select(&self, label: &str) -> Result<&[usize], PopFilterError> {
        match self.get(label) {
            Some(columns) if !columns.is_empty() => Ok(columns),
            _ => Err(PopFilterError::UnknownSelection(label.to_string())),
        }
    }
}

/// Pick the allele characters at `columns` out of one haplotype line.
///
/// `site` is the 0-based line number, used only for error reporting.
pub fn select_site(line: &str, columns: &[usize], site: usize) -> Result<Vec<u8>, PopFilterError> {
    let bytes = line.as_bytes();
    columns
        .iter()
        .map(|&index| {
            bytes
                .get(index)
                .copied()
                .ok_or(PopFilterError::HaplotypeTooShort {
                    site,
                    index,
                    len: bytes.len(),
                })
        })
        .collect()
}

/// Whether every allele is `'0'`, or every allele is `'1'`.
pub fn is_monomorphic(alleles: &[u8]) -> bool {
    alleles.iter().all(|&a| a == b'0') || alleles.iter().all(|&a| a == b'1')
}

/// Render column indices as the diagnostic line printed by [`filter_population`],
/// e.g. `[0, 2]`.
pub fn format_columns(columns: &[usize]) -> String {
    format!("{:?}", columns)
}

/// Counts from one run of [`filter_haplotypes`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterSummary {
    pub sites_read: usize,
    pub sites_kept: usize,
}

/// Stream a haplotype file and its map file in lockstep, keeping only the
/// selected columns and only the sites that are polymorphic among them.
///
/// Kept sites are written to `hap_out` as space-separated alleles; the
/// matching map line is copied to `map_out` unchanged. An empty `columns`
/// slice keeps nothing.
pub fn filter_haplotypes<H, M, HW, MW>(
    columns: &[usize],
    hap: H,
    map: M,
    mut hap_out: HW,
    mut map_out: MW,
) -> Result<FilterSummary, PopFilterError>
where
    H: BufRead,
    M: BufRead,
    HW: Write,
    MW: Write,
{
    let mut map_lines = map.lines();
    let mut summary = FilterSummary::default();
    let mut joined = String::with_capacity(columns.len() * 2);

    for (site, result) in hap.lines().enumerate() {
        let line = result?;
        let map_line = map_lines
            .next()
            .ok_or(PopFilterError::MapTooShort(site))??;
        summary.sites_read += 1;

        let alleles = select_site(&line, columns, site)?;
        if is_monomorphic(&alleles) {
            continue;
        }

        joined.clear();
        for (i, &allele) in alleles.iter().enumerate() {
            if i > 0 {
                joined.push(' ');
            }
            joined.push(allele as char);
        }
        writeln!(hap_out, "{}", joined)?;
        writeln!(map_out, "{}", map_line)?;
        summary.sites_kept += 1;
    }

    let extra = map_lines.count();
    if extra > 0 {
        log::warn!(
            "map file has {} more lines than the haplotype file; ignoring them",
            extra
        );
    }

    hap_out.flush()?;
    map_out.flush()?;
    Ok(summary)
}

/// Paths and selection for one population filter run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPaths {
    pub sample: String,
    pub select: String,
    pub hap: String,
    pub hapout: String,
    pub map: String,
    pub mapout: String,
}

/// Filter the haplotype and map files in `paths` to the selected population
/// or group.
///
/// The resolved column indices are printed to standard output before any
/// site is processed.
pub fn filter_population(paths: &FilterPaths) -> Result<FilterSummary, PopFilterError> {
    let samples = SampleColumns::from_path(&paths.sample)?;
    log::debug!(
        "read {} labels from {}: {:?}",
        samples.len(),
        paths.sample,
        samples.labels().collect::<Vec<_>>()
    );
    let columns = samples.select(&paths.select)?;
    println!("{}", format_columns(columns));

    let hap = InputFile::new(&paths.hap).reader()?;
    let map = InputFile::new(&paths.map).reader()?;
    let hap_out = OutputFile::new(&paths.hapout).writer()?;
    let map_out = OutputFile::new(&paths.mapout).writer()?;

    let summary = filter_haplotypes(columns, hap, map, hap_out, map_out)?;
    log::info!(
        "kept {} of {} sites for '{}' ({} haplotypes)",
        summary.sites_kept,
        summary.sites_read,
        paths.select,
        columns.len()
    );
    Ok(summary)
}

use serde::Serialize;
use std::io;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use super::file::{skip_header, FileError, InputFile, OutputFile};

/// The integer type for physical (basepair) positions.
pub type Position = u64;

#[derive(Error, Debug)]
pub enum GenMapError {
    #[error("IO error: {0}")]
    IOError(#[from] io::Error),
    #[error("File reading error: {0}")]
    FileError(#[from] FileError),
    #[error("Map writing error: {0}")]
    WriteError(#[from] csv::Error),
    #[error("Missing field in line '{0}'")]
    MissingField(String),
    #[error("Failed to parse a column: {0}")]
    ParseError(String),
    #[error("Genetic map has no entries after the header")]
    EmptyGeneticMap,
}

fn parse_position(field: &str) -> Result<Position, GenMapError> {
    field.parse().map_err(|_| {
        GenMapError::ParseError(format!("Failed to parse position from string: {}", field))
    })
}

/// One variant of a legend file.
///
/// Legend lines look like:
///
/// ```text
/// id position a0 a1
/// rs587697622 16050075 A G
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendEntry {
    pub id: String,
    pub position: Position,
}

impl FromStr for LegendEntry {
    type Err = GenMapError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let id = fields
            .first()
            .ok_or_else(|| GenMapError::MissingField(line.to_string()))?;
        let position = fields
            .get(1)
            .ok_or_else(|| GenMapError::MissingField(line.to_string()))?;
        Ok(LegendEntry {
            id: id.to_string(),
            position: parse_position(position)?,
        })
    }
}

/// One marker of a genetic map file.
///
/// Genetic map lines look like:
///
/// ```text
/// position COMBINED_rate(cM/Mb) Genetic_Map(cM)
/// 16050075 10.7286 0.0000
/// ```
///
/// The genetic position is kept as text so that it is written back out
/// exactly as it appears in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneticMapEntry {
    pub position: Position,
    pub genetic_position: String,
}

impl FromStr for GeneticMapEntry {
    type Err = GenMapError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let position = fields
            .first()
            .ok_or_else(|| GenMapError::MissingField(line.to_string()))?;
        let genetic_position = fields
            .get(2)
            .ok_or_else(|| GenMapError::MissingField(line.to_string()))?;
        Ok(GeneticMapEntry {
            position: parse_position(position)?,
            genetic_position: genetic_position.to_string(),
        })
    }
}

/// A row of an output map file: `<chromosome> <ordinal> <genetic_position> <position>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapRow {
    pub chromosome: String,
    /// 1-based index of the legend entry this row was built from.
    pub ordinal: u64,
    pub genetic_position: String,
    pub position: Position,
}

impl FromStr for MapRow {
    type Err = GenMapError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(GenMapError::MissingField(line.to_string()));
        }
        let ordinal = fields[1].parse().map_err(|_| {
            GenMapError::ParseError(format!("Failed to parse ordinal from string: {}", fields[1]))
        })?;
        Ok(MapRow {
            chromosome: fields[0].to_string(),
            ordinal,
            genetic_position: fields[2].to_string(),
            position: parse_position(fields[3])?,
        })
    }
}

/// A forward-only cursor over the entries of a genetic map.
///
/// The cursor always holds a current entry. Each call to
/// [`GeneticMapCursor::advance`] moves it at most one entry forward; once the
/// input is exhausted the last entry is retained indefinitely.
pub struct GeneticMapCursor<R: BufRead> {
    lines: io::Lines<R>,
    current: GeneticMapEntry,
    exhausted: bool,
}

impl<R: BufRead> GeneticMapCursor<R> {
    /// Skip the header of `reader` and position the cursor on the first entry.
    pub fn new(reader: R) -> Result<Self, GenMapError> {
        let mut lines = reader.lines();
        skip_header(&mut lines, "genetic map")?;
        let first = lines.next().ok_or(GenMapError::EmptyGeneticMap)??;
        let current = first.parse()?;
        Ok(Self {
            lines,
            current,
            exhausted: false,
        })
    }

    /// The entry the cursor currently rests on.
    pub fn current(&self) -> &GeneticMapEntry {
        &self.current
    }

    /// Whether the underlying genetic map has been fully consumed.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Read the next line of the genetic map. A blank line, or the end of
    /// input, leaves the current entry in place.
    pub fn advance(&mut self) -> Result<(), GenMapError> {
        if self.exhausted {
            return Ok(());
        }
        match self.lines.next() {
            Some(line) => {
                let line = line?;
                if !line.trim().is_empty() {
                    self.current = line.parse()?;
                }
            }
            None => {
                log::debug!(
                    "genetic map exhausted; carrying forward {} (position {})",
                    self.current.genetic_position,
                    self.current.position
                );
                self.exhausted = true;
            }
        }
        Ok(())
    }
}

/// Merge a legend with a genetic map, writing one [`MapRow`] per legend entry.
///
/// Both inputs must be sorted by position and start with a single header line.
/// For each legend entry at or past the current genetic map marker, the
/// genetic map cursor is advanced by exactly one entry before the row is
/// written, so a legend entry may be assigned a marker one step behind or
/// ahead of the true nearest-preceding one when markers are denser than
/// variants. Blank legend lines are skipped and do not count.
///
/// # Arguments
///  * `chromosome`: the chromosome label written in the first column.
///  * `legend`: a reader over the legend file.
///  * `genetic_map`: a reader over the genetic map file.
///  * `writer`: where map rows are written.
///
/// Returns the number of rows written.
pub fn build_map<L, G, W>(
    chromosome: &str,
    legend: L,
    genetic_map: G,
    writer: W,
) -> Result<u64, GenMapError>
where
    L: BufRead,
    G: BufRead,
    W: Write,
{
    let mut legend_lines = legend.lines();
    skip_header(&mut legend_lines, "legend")?;
    let mut cursor = GeneticMapCursor::new(genetic_map)?;

    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b' ')
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    let mut count = 0;
    for result in legend_lines {
        let line = result?;
        if line.split_whitespace().next().is_none() {
            continue;
        }
        count += 1;
        let entry: LegendEntry = line.parse()?;
        if entry.position >= cursor.current().position {
            cursor.advance()?;
        }
        wtr.serialize(MapRow {
            chromosome: chromosome.to_string(),
            ordinal: count,
            genetic_position: cursor.current().genetic_position.clone(),
            position: entry.position,
        })?;
    }
    wtr.flush()?;
    Ok(count)
}

/// The input and output paths used when building the map for one chromosome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapFiles {
    pub legend: PathBuf,
    pub genetic_map: PathBuf,
    pub output: PathBuf,
}

impl MapFiles {
    /// The 1000 Genomes Phase 3 file names for `chromosome` in the current directory.
    pub fn for_chromosome(chromosome: &str) -> Self {
        Self::in_dir(".", chromosome)
    }

    /// The 1000 Genomes Phase 3 file names for `chromosome` in `dir`.
    pub fn in_dir<P: AsRef<Path>>(dir: P, chromosome: &str) -> Self {
        let dir = dir.as_ref();
        Self {
            legend: dir.join(format!("1000GP_Phase3_chr{}.legend", chromosome)),
            genetic_map: dir.join(format!("genetic_map_chr{}_combined_b37.txt", chromosome)),
            output: dir.join(format!("chr{}.map", chromosome)),
        }
    }
}

/// Build the map file for `chromosome` from the files named in `files`.
///
/// Returns the number of rows written. On failure, whatever was written to
/// the output so far is left in place.
pub fn make_map(chromosome: &str, files: &MapFiles) -> Result<u64, GenMapError> {
    let legend = InputFile::new(&files.legend.to_string_lossy()).reader()?;
    let genetic_map = InputFile::new(&files.genetic_map.to_string_lossy()).reader()?;
    let output = OutputFile::new(&files.output.to_string_lossy()).writer()?;

    log::info!(
        "building map for chromosome {} from {} and {}",
        chromosome,
        files.legend.display(),
        files.genetic_map.display()
    );
    let rows = build_map(chromosome, legend, genetic_map, output)?;
    log::info!("wrote {} rows to {}", rows, files.output.display());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn run(legend: &str, genetic_map: &str) -> String {
        let mut out = Vec::new();
        build_map("1", Cursor::new(legend), Cursor::new(genetic_map), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_two_entry_example() {
        let legend = "id position a0 a1\nrs1 100 A G\nrs2 200 C T\n";
        let genetic_map = "position rate map\n100 0.0 0.5\n300 0.0 1.2\n";
        // an exact position match still advances the cursor before the row is written
        assert_eq!(run(legend, genetic_map), "1 1 1.2 100\n1 2 1.2 200\n");
    }

    #[test]
    fn test_carry_forward_after_exhaustion() {
        let legend = "id position a0 a1\nrs1 10 A G\nrs2 20 A G\nrs3 30 A G\nrs4 40 A G\n";
        let genetic_map = "position rate map\n5 1.0 0.1\n15 1.0 0.2\n";
        let out = run(legend, genetic_map);
        let rows: Vec<MapRow> = out.lines().map(|l| l.parse().unwrap()).collect();
        let genpos: Vec<&str> = rows.iter().map(|r| r.genetic_position.as_str()).collect();
        assert_eq!(genpos, vec!["0.2", "0.2", "0.2", "0.2"]);
    }

    #[test]
    fn test_single_advance_per_entry() {
        // several markers precede the first variant, but only one is consumed
        let legend = "id position a0 a1\nrs1 1000 A G\nrs2 1001 A G\n";
        let genetic_map = "position rate map\n1 0 0.1\n2 0 0.2\n3 0 0.3\n4 0 0.4\n";
        assert_eq!(run(legend, genetic_map), "1 1 0.2 1000\n1 2 0.3 1001\n");
    }

    #[test]
    fn test_ordinals_skip_blank_lines() {
        let legend = "id position a0 a1\nrs1 10 A G\n\nrs2 20 A G\n   \nrs3 30 A G\n\n";
        let genetic_map = "position rate map\n100 0 0.5\n";
        let out = run(legend, genetic_map);
        let rows: Vec<MapRow> = out.lines().map(|l| l.parse().unwrap()).collect();
        assert_eq!(rows.len(), 3);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.ordinal, i as u64 + 1);
            assert_eq!(row.chromosome, "1");
        }
    }

    #[test]
    fn test_bad_position() {
        let legend = "id position a0 a1\nrs1 abc A G\n";
        let genetic_map = "position rate map\n100 0 0.5\n";
        let mut out: Vec<u8> = Vec::new();
        let err = build_map("1", Cursor::new(legend), Cursor::new(genetic_map), &mut out)
            .unwrap_err();
        assert!(matches!(err, GenMapError::ParseError(_)));
    }

    #[test]
    fn test_short_genetic_map_line() {
        let legend = "id position a0 a1\nrs1 100 A G\n";
        let genetic_map = "position rate map\n100 0\n";
        let mut out: Vec<u8> = Vec::new();
        let err = build_map("1", Cursor::new(legend), Cursor::new(genetic_map), &mut out)
            .unwrap_err();
        assert!(matches!(err, GenMapError::MissingField(_)));
    }

    #[test]
    fn test_empty_genetic_map() {
        let legend = "id position a0 a1\nrs1 100 A G\n";
        let mut out: Vec<u8> = Vec::new();
        let genetic_map = "position rate map\n";
        let err = build_map("1", Cursor::new(legend), Cursor::new(genetic_map), &mut out)
            .unwrap_err();
        assert!(matches!(err, GenMapError::EmptyGeneticMap));
    }

    #[test]
    fn test_cursor_blank_line_retains_entry() {
        let mut cursor = GeneticMapCursor::new(Cursor::new("h\n1 0 0.1\n\n3 0 0.3\n")).unwrap();
        cursor.advance().unwrap();
        assert_eq!(cursor.current().genetic_position, "0.1");
        cursor.advance().unwrap();
        assert_eq!(cursor.current().genetic_position, "0.3");
        assert!(!cursor.is_exhausted());
        cursor.advance().unwrap();
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.current().position, 3);
    }

    #[test]
    fn test_file_names() {
        let files = MapFiles::in_dir("data", "22");
        assert_eq!(files.legend, PathBuf::from("data/1000GP_Phase3_chr22.legend"));
        assert_eq!(
            files.genetic_map,
            PathBuf::from("data/genetic_map_chr22_combined_b37.txt")
        );
        assert_eq!(files.output, PathBuf::from("data/chr22.map"));
    }

    #[test]
    fn test_make_map_from_files() {
        let dir = tempdir().unwrap();
        let mut files = MapFiles::in_dir("tests/data", "22");
        files.output = dir.path().join("chr22.map");

        let rows = make_map("22", &files).unwrap();
        assert_eq!(rows, 5);

        let lines: Vec<String> = InputFile::new(files.output.to_str().unwrap())
            .reader()
            .unwrap()
            .lines()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            lines,
            vec![
                "22 1 0.0016 16050075",
                "22 2 0.0016 16050115",
                "22 3 0.0040 16050213",
                "22 4 0.0040 16050319",
                "22 5 0.0040 16050527",
            ]
        );
        dir.close().unwrap();
    }

    #[test]
    fn test_make_map_missing_legend() {
        let dir = tempdir().unwrap();
        let files = MapFiles::in_dir(dir.path(), "7");
        let err = make_map("7", &files).unwrap_err();
        assert!(matches!(err, GenMapError::FileError(FileError::OpenError { .. })));
    }
}

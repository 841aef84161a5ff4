//! Preparation of reference-panel inputs for haplotype-based selection scans.
//!
//! Two independent transformations are provided:
//!
//!  - [`genmap`]: merge a 1000 Genomes legend file with a genetic map to
//!    produce a map file giving each variant a genetic position.
//!  - [`popfilter`]: subset a haplotype matrix and its map file to the
//!    haplotypes of one population or group, dropping sites that are
//!    monomorphic within that subset.
//!
//! Here is an example which builds the map file for chromosome 22 from
//! `1000GP_Phase3_chr22.legend` and `genetic_map_chr22_combined_b37.txt` in
//! the current directory, writing `chr22.map`:
//!
//! ```no_run
//! use panelprep::prelude::*;
//! let files = MapFiles::for_chromosome("22");
//! let rows = make_map("22", &files).expect("could not build map");
//! println!("{} variants", rows);
//! ```
//!
//! And one which keeps only the European haplotypes:
//!
//! ```no_run
//! use panelprep::prelude::*;
//! let samples = SampleColumns::from_path("1000GP_Phase3.sample")
//!                   .expect("cannot read sample file");
//! let columns = samples.select("EUR").expect("no such group");
//! println!("{} haplotypes", columns.len());
//!
//! let paths = FilterPaths {
//!     sample: "1000GP_Phase3.sample".to_string(),
//!     select: "EUR".to_string(),
//!     hap: "chr22.hap".to_string(),
//!     hapout: "chr22.EUR.hap".to_string(),
//!     map: "chr22.map".to_string(),
//!     mapout: "chr22.EUR.map".to_string(),
//! };
//! let summary = filter_population(&paths).expect("filtering failed");
//! assert!(summary.sites_kept <= summary.sites_read);
//! ```

pub mod file;
pub mod genmap;
pub mod popfilter;

pub use genmap::{build_map, make_map, GenMapError, MapFiles};
pub use popfilter::{filter_haplotypes, filter_population, FilterPaths, PopFilterError};

pub mod prelude {
    pub use crate::genmap::{build_map, make_map, GenMapError, MapFiles, MapRow};
    pub use crate::popfilter::{
        filter_haplotypes, filter_population, FilterPaths, FilterSummary, PopFilterError,
        SampleColumns,
    };
}

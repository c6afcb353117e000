//! Output file naming

use std::path::{Path, PathBuf};

use dte_extractor::downloader::{generate_date_ranges, YearMonth};
use dte_extractor::output::OutputNaming;

#[test]
fn test_one_file_per_month() {
    let naming = OutputNaming::dtes(Path::new("/srv/data"), 61);
    let paths: Vec<PathBuf> = generate_date_ranges(YearMonth::new(2024, 11), YearMonth::new(2025, 2))
        .iter()
        .map(|range| naming.path_for(range))
        .collect();

    assert_eq!(
        paths,
        vec![
            PathBuf::from("/srv/data/dtes_type61_2024_11.xlsx"),
            PathBuf::from("/srv/data/dtes_type61_2024_12.xlsx"),
            PathBuf::from("/srv/data/dtes_type61_2025_01.xlsx"),
            PathBuf::from("/srv/data/dtes_type61_2025_02.xlsx"),
        ]
    );
}

#[test]
fn test_estimates_live_in_their_own_directory() {
    let naming = OutputNaming::estimates(Path::new("data"));
    assert_eq!(naming.dir(), Path::new("data/estimates"));
    assert_eq!(naming.file_name(2023, 7), "estimates_2023_07.xlsx");
}

#[test]
fn test_prefix_cannot_escape_directory() {
    let naming = OutputNaming::new("out", "../x/y");
    let name = naming.file_name(2024, 1);
    assert!(!name.contains('/'));
    assert!(!name.contains(".."));
}

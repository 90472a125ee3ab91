//! Folder and file naming convention of the metering data dumps.
//!
//! Meter folders look like `<prefix>_<letter>_<block>_<mm>_<dd>`; the block
//! code is token index 2 after splitting on `_`. Inside a folder, the two
//! fixed file postfixes distinguish instantaneous (RT) from accumulated
//! (RTH) readings.

use regex::Regex;

use crate::models::MeasurementKind;

/// Default folder prefixes used by the district's meter loggers.
pub const DEFAULT_FOLDER_PREFIXES: &[&str] = &["J_B_", "X01_01_"];

/// Default file postfix for instantaneous (RT) readings files.
pub const DEFAULT_RT_POSTFIX: &str = "BTUREADINGS11MIN.txt";

/// Default file postfix for accumulated (RTH) readings files.
pub const DEFAULT_RTH_POSTFIX: &str = "ACCBTUReadingS11MIN.txt";

/// True when `name` has the meter-folder shape: at least three
/// `_`-separated alphanumeric tokens with a numeric block code at index 2.
pub fn is_meter_folder(name: &str) -> bool {
    let re = Regex::new(r"^[A-Za-z0-9]+(_[A-Za-z0-9]+){2,}$").expect("regex is valid");
    re.is_match(name) && block_number(name).is_some()
}

/// Extract the numeric block code (token index 2) from a meter folder name.
pub fn block_number(folder_name: &str) -> Option<u32> {
    folder_name.split('_').nth(2)?.parse().ok()
}

/// Resolve the measurement kind of a readings file from its postfix.
///
/// Matching is a case-sensitive suffix comparison; the two postfixes differ
/// in case as well as spelling, so neither can shadow the other. A name
/// matching neither postfix is not a readings file.
pub fn kind_for_file(
    file_name: &str,
    rt_postfix: &str,
    rth_postfix: &str,
) -> Option<MeasurementKind> {
    if file_name.ends_with(rt_postfix) {
        Some(MeasurementKind::Rt)
    } else if file_name.ends_with(rth_postfix) {
        Some(MeasurementKind::Rth)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_number_extraction() {
        assert_eq!(block_number("J_B_80_01"), Some(80));
        assert_eq!(block_number("X01_01_82_03"), Some(82));
        assert_eq!(block_number("J_B_98_10_31"), Some(98));
    }

    #[test]
    fn test_block_number_rejects_non_numeric() {
        assert_eq!(block_number("J_B_XX_01"), None);
        assert_eq!(block_number("J_B"), None);
        assert_eq!(block_number(""), None);
    }

    #[test]
    fn test_is_meter_folder() {
        assert!(is_meter_folder("J_B_80_01"));
        assert!(is_meter_folder("X01_01_82_03"));
        assert!(!is_meter_folder("J_B"));
        assert!(!is_meter_folder("J_B_XX_01"));
        assert!(!is_meter_folder("readings.txt"));
        assert!(!is_meter_folder(""));
    }

    #[test]
    fn test_kind_for_file() {
        assert_eq!(
            kind_for_file(
                "J_B_80_01_BTUREADINGS11MIN.txt",
                DEFAULT_RT_POSTFIX,
                DEFAULT_RTH_POSTFIX
            ),
            Some(MeasurementKind::Rt)
        );
        assert_eq!(
            kind_for_file(
                "J_B_80_01_ACCBTUReadingS11MIN.txt",
                DEFAULT_RT_POSTFIX,
                DEFAULT_RTH_POSTFIX
            ),
            Some(MeasurementKind::Rth)
        );
        assert_eq!(
            kind_for_file("notes.txt", DEFAULT_RT_POSTFIX, DEFAULT_RTH_POSTFIX),
            None
        );
    }

    #[test]
    fn test_kind_for_file_is_case_sensitive() {
        // Lower-cased RT postfix must not match.
        assert_eq!(
            kind_for_file(
                "J_B_80_01_btureadings11min.txt",
                DEFAULT_RT_POSTFIX,
                DEFAULT_RTH_POSTFIX
            ),
            None
        );
    }
}

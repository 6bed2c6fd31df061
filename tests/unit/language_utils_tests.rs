/*!
 * Tests for ISO language code utilities
 */

use capwai::language_utils::{
    get_language_name, language_codes_match, normalize_to_part1_or_part2t, normalize_to_part2t, validate_language_code,
};

#[test]
fn test_getLanguageName_withCommonTargets_shouldReturnEnglishNames() {
    assert_eq!(get_language_name("ja").unwrap(), "Japanese");
    assert_eq!(get_language_name("zho").unwrap(), "Chinese");
    assert_eq!(get_language_name("chi").unwrap(), "Chinese");
    assert_eq!(get_language_name("es").unwrap(), "Spanish");
}

#[test]
fn test_normalize_shouldBeStableAcrossForms() {
    for code in ["ko", "kor", "KO", " kor "] {
        assert_eq!(normalize_to_part1_or_part2t(code).unwrap(), "ko");
        assert_eq!(normalize_to_part2t(code).unwrap(), "kor");
    }
}

#[test]
fn test_validate_withEmptyOrLongCodes_shouldFail() {
    assert!(validate_language_code("").is_err());
    assert!(validate_language_code("kore").is_err());
    assert!(validate_language_code("en").is_ok());
}

#[test]
fn test_languageCodesMatch_withBibliographicCodes_shouldMatch() {
    assert!(language_codes_match("de", "ger"));
    assert!(language_codes_match("nld", "dut"));
    assert!(!language_codes_match("de", "dut"));
}

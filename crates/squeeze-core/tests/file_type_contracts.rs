//! Contract tests for file-format handling.

use squeeze_core::Error;
use squeeze_core::file_type::FileType;

#[test]
fn parses_supported_formats_by_exact_name() {
    assert_eq!(FileType::parse("TEXT").unwrap(), FileType::Text);
    assert_eq!(FileType::parse("SEQ").unwrap(), FileType::Seq);
    assert_eq!(FileType::parse("ORC").unwrap(), FileType::Orc);
    assert_eq!(FileType::parse("AVRO").unwrap(), FileType::Avro);
    assert_eq!(FileType::parse("PARQUET").unwrap(), FileType::Parquet);
}

#[test]
fn canonical_strings_are_uppercase() {
    assert_eq!(FileType::Avro.as_str(), "AVRO");
    assert_eq!("ORC".parse::<FileType>().unwrap(), FileType::Orc);
}

#[test]
fn parse_is_case_sensitive() {
    assert!(FileType::parse("avro").is_err());
    assert!(FileType::parse("Orc").is_err());
}

#[test]
fn parse_rejects_unknown_values() {
    let err = FileType::parse("AVROO").unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration { .. }));
    assert!(err.to_string().contains("unsupported file format"));
    assert!(FileType::parse("").is_err());
}

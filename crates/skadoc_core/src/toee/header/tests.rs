use crate::toee::bytes::Writer;
use crate::toee::{DecodeOptions, Section, SectionTable, SkaError};

#[test]
fn parses_section_pairs_in_order() {
	let mut bytes = Vec::new();
	for value in [2_i32, 32, 1, 232, 0, 360] {
		bytes.extend_from_slice(&value.to_le_bytes());
	}

	let table = SectionTable::<3>::parse(&bytes).expect("header parses");
	assert_eq!(table.sections[0], Section { count: 2, offset: 32 });
	assert_eq!(table.sections[1], Section { count: 1, offset: 232 });
	assert_eq!(table.sections[2], Section { count: 0, offset: 360 });
}

#[test]
fn short_header_is_truncated() {
	let err = SectionTable::<4>::parse(&[0_u8; 20]).expect_err("needs 32 bytes");
	assert!(matches!(err, SkaError::Truncated { at: 20, need: 4, rem: 0 }));
}

#[test]
fn write_matches_parse() {
	let table = SectionTable {
		sections: [Section { count: 3, offset: 24 }, Section { count: 0, offset: 324 }],
	};
	let mut writer = Writer::new();
	table.write(&mut writer);
	let bytes = writer.into_bytes();
	assert_eq!(bytes.len(), SectionTable::<2>::SIZE);
	assert_eq!(SectionTable::<2>::parse(&bytes).expect("parses"), table);
}

#[test]
fn locate_rejects_negative_count() {
	let section = Section { count: -1, offset: 32 };
	let err = section.locate("bones", 100, 1000, &DecodeOptions::default()).expect_err("negative count");
	assert!(matches!(err, SkaError::NegativeSection { section: "bones", count: -1, .. }));
}

#[test]
fn locate_rejects_records_past_end() {
	let section = Section { count: 3, offset: 32 };
	let err = section.locate("faces", 8, 50, &DecodeOptions::default()).expect_err("needs 24 bytes");
	assert!(matches!(err, SkaError::Truncated { at: 32, need: 24, rem: 18 }));
}

#[test]
fn locate_enforces_record_ceiling() {
	let opt = DecodeOptions {
		max_records: 4,
		..DecodeOptions::default()
	};
	let section = Section { count: 5, offset: 0 };
	let err = section.locate("vertices", 80, 10_000, &opt).expect_err("over ceiling");
	assert!(matches!(err, SkaError::TooManyRecords { count: 5, max: 4, .. }));
}

#[test]
fn locate_allows_empty_section_at_end() {
	let section = Section { count: 0, offset: 64 };
	let located = section.locate("materials", 128, 64, &DecodeOptions::default()).expect("empty fits");
	assert_eq!(located, (0, 64));
}

use std::sync::Arc;

use skadoc_testkit::{ANIM_HEADER_SIZE, EVENT_SIZE, RawDescriptor, RawStream, sectioned_image, ska_anim_header, ska_bone, ska_event, ska_image};

use crate::toee::{
	AnimBone, AnimationEvent, AnimationRecord, DecodeOptions, Diagnostic, Diagnostics, DriveType, KeyframeStream, Quaternion, SkaError, SkaFile,
	StreamDescriptor,
};

const FULL: i16 = 32767;
const BONES_LEN: usize = 2 * 100;
/// Animation section starts after the 24-byte header and two bones.
const SECTION_AT: usize = 24 + BONES_LEN;

fn bones() -> Vec<Vec<u8>> {
	vec![
		ska_bone("Bip01", -1, [1.0; 3], [0.0, 0.0, 0.0, 1.0], [0.0, 0.0, 40.0]),
		ska_bone("Bip01 Spine", 0, [1.0; 3], [0.0, 0.0, 1.0, 0.0], [0.0, 5.0, 0.0]),
	]
}

/// Stream keyed at frame 5; only valid with a window of at least 5.
fn shared_stream() -> Vec<u8> {
	RawStream::new(1.0, 1.0)
		.initial(0, [1, 1, 1], [0, 0, 0, FULL], [0, 0, 0])
		.end_initial()
		.frame(5)
		.bone(1, None, None, Some((6, [2, 0, 0])))
		.end()
		.into_bytes()
}

fn empty_stream() -> Vec<u8> {
	RawStream::new(1.0, 1.0).end_initial().end().into_bytes()
}

/// Two animations laid out as the writer lays them out: headers, events, then streams.
///
/// `walk` (4 frames) and `run` (6 frames) share the first stream; `run` also uses an empty one.
fn canonical_image() -> Vec<u8> {
	let headers_len = 2 * ANIM_HEADER_SIZE;
	let shared_at = (headers_len + EVENT_SIZE) as i32;
	let empty_at = shared_at + shared_stream().len() as i32;

	let headers = vec![
		ska_anim_header("walk", 0, true, 1, headers_len as i32, &[RawDescriptor::at(shared_at, 4)]),
		ska_anim_header("run", 1, false, 0, 0, &[RawDescriptor::at(shared_at, 6), RawDescriptor::at(empty_at, 6)]),
	];

	let mut tail = ska_event(2, "script", "anim_goal_freeze");
	tail.extend(shared_stream());
	tail.extend(empty_stream());
	ska_image(&bones(), &headers, &tail)
}

fn parse(bytes: &[u8]) -> (SkaFile, Diagnostics) {
	let mut diag = Diagnostics::new();
	let file = SkaFile::parse(bytes, &DecodeOptions::default(), &mut diag).expect("ska parses");
	(file, diag)
}

fn parse_err(bytes: &[u8]) -> SkaError {
	let mut diag = Diagnostics::new();
	SkaFile::parse(bytes, &DecodeOptions::default(), &mut diag).expect_err("ska is rejected")
}

#[test]
fn parses_bones_animations_and_events() {
	let (file, diag) = parse(&canonical_image());
	assert!(diag.is_empty(), "unexpected diagnostics: {:?}", diag.items());

	assert_eq!(file.bones.len(), 2);
	assert_eq!(file.bones[1].name.as_str(), "Bip01 Spine");
	assert_eq!(file.bones[1].rotation, Quaternion { w: 0.0, x: 0.0, y: 0.0, z: 1.0 });
	assert_eq!(file.bones[0].translation, [0.0, 0.0, 40.0]);

	let walk = &file.animations[0];
	assert_eq!(walk.name.as_str(), "walk");
	assert_eq!(walk.drive_type, DriveType::Time);
	assert!(walk.loopable);
	assert_eq!(walk.events, [AnimationEvent::new(2, "script", "anim_goal_freeze").expect("event")]);

	let run = file.find_animation("RUN").expect("run present");
	assert_eq!(run.drive_type, DriveType::Distance);
	assert!(!run.loopable && run.events.is_empty());
	assert_eq!(run.streams.len(), 2);
	assert_eq!(run.streams[0].frame_count, 6);
	assert_eq!(run.streams[0].frame_rate, 30.0);
}

#[test]
fn shared_stream_offset_decodes_once() {
	let (file, _) = parse(&canonical_image());
	let walk = &file.animations[0].streams[0];
	let run = &file.animations[1].streams;

	assert!(Arc::ptr_eq(&walk.keyframes, &run[0].keyframes));
	assert!(!Arc::ptr_eq(&walk.keyframes, &run[1].keyframes));
	assert_eq!(walk.data_offset, run[0].data_offset);
	assert_eq!(walk.frame_count, 4, "descriptor metadata stays per animation");
	assert_eq!(file.unique_streams().len(), 2);

	// Frame 5 lies past walk's own 4 frames; the shared window comes from run.
	assert_eq!(walk.keyframes.location[&1][0].frame, 5);
	assert!(run[1].keyframes.is_empty());
}

#[test]
fn reencode_reproduces_canonical_image() {
	let image = canonical_image();
	let (file, _) = parse(&image);

	let encoded = file.write().expect("ska encodes");
	assert_eq!(encoded, image);

	let (again, diag) = parse(&encoded);
	assert_eq!(again, file);
	assert!(diag.is_empty());
}

#[test]
fn writer_computes_event_and_stream_offsets() {
	let mut stream = KeyframeStream::new(1.0, 1.0);
	stream.push_location(0, 1, [1.0, 0.0, 0.0]);
	let stream = Arc::new(stream);

	let mut first = AnimationRecord::new("idle").expect("name");
	first.streams.push(StreamDescriptor::new(Arc::clone(&stream), 2, 15.0));
	let mut second = AnimationRecord::new("talk").expect("name");
	second.events.push(AnimationEvent::new(0, "sound", "talk.wav").expect("event"));
	second.events.push(AnimationEvent::new(1, "script", "done").expect("event"));
	second.streams.push(StreamDescriptor::new(Arc::clone(&stream), 3, 15.0));

	let file = SkaFile {
		bones: vec![AnimBone::new("Bip01", -1).expect("bone")],
		animations: vec![first, second],
	};
	let encoded = file.write().expect("ska encodes");

	let section_at = 24 + 100;
	let read_i32 = |at: usize| i32::from_le_bytes(encoded[at..at + 4].try_into().expect("4 bytes"));
	assert_eq!(read_i32(16), 2, "animation count");
	assert_eq!(read_i32(20), section_at as i32);
	assert_eq!(read_i32(12), section_at as i32, "variation offset equals animation offset");

	// talk's events follow both headers; its offset is relative to its own header.
	let talk_at = section_at + ANIM_HEADER_SIZE;
	assert_eq!(read_i32(talk_at + 68), ANIM_HEADER_SIZE as i32);
	assert_eq!(read_i32(section_at + 68), 0);

	let stream_offset = (2 * ANIM_HEADER_SIZE + 2 * EVENT_SIZE) as i32;
	assert_eq!(read_i32(section_at + 76 + 12), stream_offset);
	assert_eq!(read_i32(talk_at + 76 + 12), stream_offset);

	let (decoded, _) = parse(&encoded);
	assert_eq!(decoded.animations[1].events, file.animations[1].events);
	assert!(Arc::ptr_eq(&decoded.animations[0].streams[0].keyframes, &decoded.animations[1].streams[0].keyframes));
	assert_eq!(*decoded.animations[0].streams[0].keyframes, *stream);
}

#[test]
fn stream_count_above_ten_is_fatal() {
	let mut header = ska_anim_header("bad", 0, false, 0, 0, &[]);
	header[72..74].copy_from_slice(&11_i16.to_le_bytes());
	let err = parse_err(&ska_image(&bones(), &[header], &[]));
	assert!(matches!(err, SkaError::StreamCountOutOfRange { animation: 0, count: 11, max: 10 }), "{err:?}");
}

#[test]
fn negative_stream_count_is_fatal() {
	let mut header = ska_anim_header("bad", 0, false, 0, 0, &[]);
	header[72..74].copy_from_slice(&(-1_i16).to_le_bytes());
	let err = parse_err(&ska_image(&bones(), &[header], &[]));
	assert!(matches!(err, SkaError::StreamCountOutOfRange { count: -1, .. }));
}

#[test]
fn stream_without_end_marker_is_fatal() {
	let mut stream = shared_stream();
	stream.truncate(stream.len() - 2);
	let header = ska_anim_header("cut", 0, false, 0, 0, &[RawDescriptor::at(ANIM_HEADER_SIZE as i32, 6)]);
	let err = parse_err(&ska_image(&bones(), &[header], &stream));
	assert!(matches!(err, SkaError::StreamSentinelMissing { offset, .. } if offset == SECTION_AT + ANIM_HEADER_SIZE), "{err:?}");
}

#[test]
fn negative_data_offset_is_fatal() {
	let header = ska_anim_header("bad", 0, false, 0, 0, &[RawDescriptor::at(-8, 1)]);
	let err = parse_err(&ska_image(&bones(), &[header], &[]));
	assert!(matches!(err, SkaError::MalformedStream { .. }));
}

#[test]
fn event_array_past_end_is_fatal() {
	let header = ska_anim_header("bad", 0, false, 2, ANIM_HEADER_SIZE as i32, &[]);
	let err = parse_err(&ska_image(&bones(), &[header], &ska_event(0, "script", "x")));
	assert!(matches!(err, SkaError::Truncated { .. }), "{err:?}");
}

#[test]
fn reports_variation_and_reserved_bone_data() {
	let mut bone = ska_bone("root", -1, [1.0; 3], [0.0, 0.0, 0.0, 1.0], [0.0; 3]);
	bone[44..48].copy_from_slice(&7_i32.to_le_bytes());
	let image = sectioned_image(&[(1, bone), (3, Vec::new()), (0, Vec::new())]);

	let (file, diag) = parse(&image);
	assert!(file.animations.is_empty());
	assert_eq!(
		diag.items(),
		[Diagnostic::ReservedBoneData { bone: 0, values: [7, 0] }, Diagnostic::VariationDataIgnored { count: 3 }]
	);
}

#[test]
fn write_rejects_eleven_streams() {
	let stream = Arc::new(KeyframeStream::new(1.0, 1.0));
	let mut record = AnimationRecord::new("many").expect("name");
	record.streams = vec![StreamDescriptor::new(stream, 1, 30.0); 11];
	let file = SkaFile {
		bones: Vec::new(),
		animations: vec![record],
	};
	assert!(matches!(file.write(), Err(SkaError::StreamCountOutOfRange { animation: 0, count: 11, .. })));
}

#[test]
fn out_of_order_parent_is_reported() {
	let bones = vec![ska_bone("child", 1, [1.0; 3], [0.0, 0.0, 0.0, 1.0], [0.0; 3]), ska_bone("root", -1, [1.0; 3], [0.0, 0.0, 0.0, 1.0], [0.0; 3])];
	let (_, diag) = parse(&ska_image(&bones, &[], &[]));
	assert_eq!(diag.items(), [Diagnostic::ParentOutOfOrder { bone: 0, parent: 1 }]);
}

#[test]
fn negative_event_count_reads_no_events() {
	let header = ska_anim_header("neg", 0, false, -1, 0, &[]);
	let (file, diag) = parse(&ska_image(&bones(), &[header], &[]));

	assert_eq!(file.animations.len(), 1);
	assert!(file.animations[0].events.is_empty());
	assert_eq!(diag.items(), [Diagnostic::NegativeEventCount { animation: 0, count: -1 }]);
}

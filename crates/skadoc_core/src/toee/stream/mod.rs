//! Delta-compressed keyframe streams referenced by SKA stream descriptors.
//!
//! A stream starts with two `f32` quantization factors, then an initial block of full bone poses
//! at frame 0 terminated by a negative bone index, then a loop of [`StreamWord`]s: frame markers
//! followed by per-bone records carrying any subset of scale, rotation and location samples.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Serialize;

use crate::toee::bytes::{Cursor, Writer};
use crate::toee::{DecodeOptions, Diagnostic, Diagnostics, Quaternion, Result, SkaError, Vec3};

mod word;

pub use word::{ChannelMask, StreamWord};

/// Rotation samples are quantized against this fixed factor.
pub const ROTATION_FACTOR: f32 = 1.0 / 32767.0;

const INITIAL_END: i16 = -1;

/// One sample of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Key<T> {
	/// Frame the sample takes effect at.
	pub frame: u16,
	/// Dequantized value.
	pub value: T,
}

/// Per-bone samples of one channel, keyed by bone index; each list is ordered by frame.
pub type Channel<T> = BTreeMap<u16, Vec<Key<T>>>;

/// Decoded keyframe stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeyframeStream {
	/// Quantization factor for scale samples.
	pub scale_factor: f32,
	/// Quantization factor for location samples.
	pub location_factor: f32,
	/// Scale keys.
	pub scale: Channel<Vec3>,
	/// Rotation keys.
	pub rotation: Channel<Quaternion>,
	/// Location keys.
	pub location: Channel<Vec3>,
}

impl KeyframeStream {
	/// Empty stream with the given factors.
	pub fn new(scale_factor: f32, location_factor: f32) -> Self {
		Self {
			scale_factor,
			location_factor,
			..Self::default()
		}
	}

	/// Return `true` when no channel carries a key.
	pub fn is_empty(&self) -> bool {
		self.key_count() == 0
	}

	/// Total number of keys over all channels and bones.
	pub fn key_count(&self) -> usize {
		fn count<T>(channel: &Channel<T>) -> usize {
			channel.values().map(Vec::len).sum()
		}
		count(&self.scale) + count(&self.rotation) + count(&self.location)
	}

	/// Bone indices that carry at least one key in any channel.
	pub fn bones(&self) -> BTreeSet<u16> {
		self.scale.keys().chain(self.rotation.keys()).chain(self.location.keys()).copied().collect()
	}

	/// Append a scale key for `bone`.
	pub fn push_scale(&mut self, bone: u16, frame: u16, value: Vec3) {
		self.scale.entry(bone).or_default().push(Key { frame, value });
	}

	/// Append a rotation key for `bone`.
	pub fn push_rotation(&mut self, bone: u16, frame: u16, value: Quaternion) {
		self.rotation.entry(bone).or_default().push(Key { frame, value });
	}

	/// Append a location key for `bone`.
	pub fn push_location(&mut self, bone: u16, frame: u16, value: Vec3) {
		self.location.entry(bone).or_default().push(Key { frame, value });
	}

	/// Decode the stream starting at absolute `offset` of `bytes`.
	///
	/// `window` is the largest frame count of any descriptor referencing this stream. Running out
	/// of bytes before the end marker fails with `StreamSentinelMissing`.
	pub fn decode(bytes: &[u8], offset: usize, window: u16, opt: &DecodeOptions, diag: &mut Diagnostics) -> Result<Self> {
		let mut cursor = Cursor::at(bytes, offset);
		let stream = Self::decode_words(&mut cursor, offset, window, opt, diag).map_err(|err| match err {
			SkaError::Truncated { at, .. } => SkaError::StreamSentinelMissing { offset, at },
			other => other,
		})?;

		tracing::trace!(offset, window, keys = stream.key_count(), "decoded keyframe stream");
		Ok(stream)
	}

	fn decode_words(cursor: &mut Cursor<'_>, offset: usize, window: u16, opt: &DecodeOptions, diag: &mut Diagnostics) -> Result<Self> {
		let scale_factor = cursor.read_f32()?;
		let location_factor = cursor.read_f32()?;
		let mut stream = Self::new(scale_factor, location_factor);

		loop {
			let bone = cursor.read_i16()?;
			let Ok(bone) = u16::try_from(bone) else {
				break;
			};
			let scale = cursor.read_i16s::<3>()?;
			let rotation = cursor.read_i16s::<4>()?;
			let location = cursor.read_i16s::<3>()?;
			stream.push_scale(bone, 0, dequantize(scale, scale_factor));
			stream.push_rotation(bone, 0, dequantize_rotation(rotation));
			stream.push_location(bone, 0, dequantize(location, location_factor));
		}

		let mut current: Option<u16> = None;
		loop {
			let at = cursor.pos();
			let raw = cursor.read_i16()?;
			match StreamWord::from_raw(raw) {
				None => {
					return Err(SkaError::MalformedStream {
						at,
						reason: "negative frame marker",
					});
				}
				Some(StreamWord::End) => break,
				Some(StreamWord::Frame(frame)) => {
					if frame > window {
						if opt.strict_frame_window {
							return Err(SkaError::StreamSentinelMissing { offset, at });
						}
						diag.push(Diagnostic::StreamFrameBeyondWindow { offset, frame, window });
						break;
					}
					if current.is_some_and(|previous| frame < previous) {
						return Err(SkaError::MalformedStream {
							at,
							reason: "frame markers go backwards",
						});
					}
					current = Some(frame);
				}
				Some(StreamWord::Bone { bone, channels }) => {
					let Some(frame) = current else {
						return Err(SkaError::MalformedStream {
							at,
							reason: "bone record before first frame marker",
						});
					};
					// Each sample is prefixed by the frame its value holds until; it is derived
					// data and rebuilt on encode.
					if channels.contains(ChannelMask::SCALE) {
						cursor.read_u16()?;
						stream.push_scale(bone, frame, dequantize(cursor.read_i16s()?, scale_factor));
					}
					if channels.contains(ChannelMask::ROTATION) {
						cursor.read_u16()?;
						stream.push_rotation(bone, frame, dequantize_rotation(cursor.read_i16s()?));
					}
					if channels.contains(ChannelMask::LOCATION) {
						cursor.read_u16()?;
						stream.push_location(bone, frame, dequantize(cursor.read_i16s()?, location_factor));
					}
				}
			}
		}

		Ok(stream)
	}

	/// Encode to stream bytes for a frame window of `window`.
	///
	/// Bones whose three channels all start at frame 0 are seeded from the initial block; every
	/// other key becomes a bone record under its frame marker. Keys sharing a frame within one
	/// channel are emitted in order, one per record.
	pub fn encode(&self, window: u16) -> Result<Vec<u8>> {
		let max_frame = window.min(StreamWord::MAX_FRAME);
		let mut writer = Writer::new();
		writer.write_f32(self.scale_factor);
		writer.write_f32(self.location_factor);

		let mut records: BTreeMap<u16, Vec<Record>> = BTreeMap::new();
		for bone in self.bones() {
			let scale = channel_keys(&self.scale, bone)?;
			let rotation = channel_keys(&self.rotation, bone)?;
			let location = channel_keys(&self.location, bone)?;

			let seeded = [scale.first().map(|key| key.frame), rotation.first().map(|key| key.frame), location.first().map(|key| key.frame)] == [Some(0); 3];
			let mut next = [0_usize; 3];
			if seeded {
				let Ok(raw_bone) = i16::try_from(bone) else {
					return Err(SkaError::StreamBoneOutOfRange { bone, max: i16::MAX as u16 });
				};
				writer.write_i16(raw_bone);
				writer.write_i16s(&quantize(scale[0].value, self.scale_factor)?);
				writer.write_i16s(&quantize_rotation(rotation[0].value)?);
				writer.write_i16s(&quantize(location[0].value, self.location_factor)?);
				next = [1; 3];
			}

			loop {
				let frames = [scale.get(next[0]).map(|key| key.frame), rotation.get(next[1]).map(|key| key.frame), location.get(next[2]).map(|key| key.frame)];
				let Some(frame) = frames.iter().flatten().copied().min() else {
					break;
				};
				if frame > max_frame {
					return Err(SkaError::StreamFrameOutOfRange { frame, max: max_frame });
				}
				if bone > StreamWord::MAX_BONE {
					return Err(SkaError::StreamBoneOutOfRange {
						bone,
						max: StreamWord::MAX_BONE,
					});
				}

				let mut record = Record {
					bone,
					..Record::default()
				};
				if frames[0] == Some(frame) {
					record.scale = Some((until(scale, next[0], window), quantize(scale[next[0]].value, self.scale_factor)?));
					next[0] += 1;
				}
				if frames[1] == Some(frame) {
					record.rotation = Some((until(rotation, next[1], window), quantize_rotation(rotation[next[1]].value)?));
					next[1] += 1;
				}
				if frames[2] == Some(frame) {
					record.location = Some((until(location, next[2], window), quantize(location[next[2]].value, self.location_factor)?));
					next[2] += 1;
				}
				records.entry(frame).or_default().push(record);
			}
		}
		writer.write_i16(INITIAL_END);

		for (frame, records) in &records {
			writer.write_i16(StreamWord::Frame(*frame).to_raw());
			for record in records {
				record.write(&mut writer);
			}
		}
		writer.write_i16(StreamWord::End.to_raw());

		Ok(writer.into_bytes())
	}
}

#[derive(Debug, Default)]
struct Record {
	bone: u16,
	scale: Option<(u16, [i16; 3])>,
	rotation: Option<(u16, [i16; 4])>,
	location: Option<(u16, [i16; 3])>,
}

impl Record {
	fn write(&self, writer: &mut Writer) {
		let channels = ChannelMask::with(self.scale.is_some(), self.rotation.is_some(), self.location.is_some());
		writer.write_i16(StreamWord::Bone { bone: self.bone, channels }.to_raw());
		if let Some((until, values)) = self.scale {
			writer.write_u16(until);
			writer.write_i16s(&values);
		}
		if let Some((until, values)) = self.rotation {
			writer.write_u16(until);
			writer.write_i16s(&values);
		}
		if let Some((until, values)) = self.location {
			writer.write_u16(until);
			writer.write_i16s(&values);
		}
	}
}

fn channel_keys<T>(channel: &Channel<T>, bone: u16) -> Result<&[Key<T>]> {
	let keys = channel.get(&bone).map_or(&[][..], Vec::as_slice);
	if keys.windows(2).any(|pair| pair[1].frame < pair[0].frame) {
		return Err(SkaError::UnorderedKeys { bone });
	}
	Ok(keys)
}

/// Frame up to which the key at `index` holds: the next key's frame, or the window.
fn until<T>(keys: &[Key<T>], index: usize, window: u16) -> u16 {
	keys.get(index + 1).map_or(window, |key| key.frame)
}

fn dequantize<const N: usize>(raw: [i16; N], factor: f32) -> [f32; N] {
	raw.map(|value| f32::from(value) * factor)
}

fn dequantize_rotation(raw: [i16; 4]) -> Quaternion {
	Quaternion::from_xyzw(dequantize(raw, ROTATION_FACTOR))
}

fn quantize_value(value: f32, factor: f32) -> Result<i16> {
	if factor == 0.0 {
		return if value == 0.0 { Ok(0) } else { Err(SkaError::QuantizeOverflow { value, factor }) };
	}

	let scaled = (value / factor).round();
	if scaled >= f32::from(i16::MIN) && scaled <= f32::from(i16::MAX) {
		Ok(scaled as i16)
	} else {
		Err(SkaError::QuantizeOverflow { value, factor })
	}
}

fn quantize<const N: usize>(values: [f32; N], factor: f32) -> Result<[i16; N]> {
	let mut out = [0_i16; N];
	for (slot, value) in out.iter_mut().zip(values) {
		*slot = quantize_value(value, factor)?;
	}
	Ok(out)
}

fn quantize_rotation(value: Quaternion) -> Result<[i16; 4]> {
	quantize(value.xyzw(), ROTATION_FACTOR)
}

/// Decoded streams of one SKA file keyed by absolute offset.
///
/// Descriptors are declared first so each stream decodes once with the widest frame window of
/// every descriptor that shares its offset.
#[derive(Debug, Default)]
pub(crate) struct StreamTable {
	windows: BTreeMap<usize, u16>,
	decoded: BTreeMap<usize, Arc<KeyframeStream>>,
}

impl StreamTable {
	pub(crate) fn declare(&mut self, offset: usize, frame_count: u16) {
		let window = self.windows.entry(offset).or_insert(0);
		*window = (*window).max(frame_count);
	}

	pub(crate) fn decode_all(&mut self, bytes: &[u8], opt: &DecodeOptions, diag: &mut Diagnostics) -> Result<()> {
		for (&offset, &window) in &self.windows {
			let stream = KeyframeStream::decode(bytes, offset, window, opt, diag)?;
			self.decoded.insert(offset, Arc::new(stream));
		}
		tracing::debug!(streams = self.decoded.len(), "decoded keyframe streams");
		Ok(())
	}

	pub(crate) fn get(&self, offset: usize) -> Option<Arc<KeyframeStream>> {
		self.decoded.get(&offset).cloned()
	}
}

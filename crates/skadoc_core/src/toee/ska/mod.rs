use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::toee::bytes::{Cursor, Writer, to_i16, to_i32};
use crate::toee::header::read_records;
use crate::toee::skm::parent_precedes;
use crate::toee::stream::StreamTable;
use crate::toee::{DecodeOptions, Diagnostic, Diagnostics, KeyframeStream, Name, Quaternion, Result, Section, SectionTable, SkaError, Vec3};

/// Fixed number of stream descriptor slots in an animation header.
pub const MAX_STREAMS: usize = 10;

const BONE_SIZE: usize = 100;
const ANIMATION_SIZE: usize = 236;
const EVENT_SIZE: usize = 178;
const DESCRIPTOR_SIZE: usize = 16;

/// Skeleton bone from an animation file with its rest transform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimBone {
	/// Raw bone flags.
	pub flags: i16,
	/// Parent bone index, `-1` for roots.
	pub parent_index: i16,
	/// Bone name.
	pub name: Name<40>,
	/// Rest scale.
	pub scale: Vec3,
	/// Rest rotation.
	pub rotation: Quaternion,
	/// Rest translation.
	pub translation: Vec3,
}

impl AnimBone {
	/// Build a bone with an identity rest transform.
	pub fn new(name: &str, parent_index: i16) -> Result<Self> {
		Ok(Self {
			flags: 0,
			parent_index,
			name: Name::new(name)?,
			scale: [1.0; 3],
			rotation: Quaternion::IDENTITY,
			translation: [0.0; 3],
		})
	}

	fn read(cursor: &mut Cursor<'_>, index: usize, diag: &mut Diagnostics) -> Result<Self> {
		let flags = cursor.read_i16()?;
		let parent_index = cursor.read_i16()?;
		let name = Name::read(cursor)?;
		let reserved = [cursor.read_i32()?, cursor.read_i32()?];
		if reserved != [0, 0] {
			diag.push(Diagnostic::ReservedBoneData { bone: index, values: reserved });
		}
		let [sx, sy, sz, _] = cursor.read_f32s::<4>()?;
		let rotation = Quaternion::from_xyzw(cursor.read_f32s()?);
		let [tx, ty, tz, _] = cursor.read_f32s::<4>()?;

		Ok(Self {
			flags,
			parent_index,
			name,
			scale: [sx, sy, sz],
			rotation,
			translation: [tx, ty, tz],
		})
	}

	fn write(&self, writer: &mut Writer) -> Result<()> {
		writer.write_i16(self.flags);
		writer.write_i16(self.parent_index);
		self.name.write(writer)?;
		writer.write_zeros(8);
		writer.write_f32s(&self.scale);
		writer.write_f32(0.0);
		writer.write_f32s(&self.rotation.xyzw());
		writer.write_f32s(&self.translation);
		writer.write_f32(0.0);
		Ok(())
	}
}

/// How animation playback advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DriveType {
	/// Advances with time.
	Time,
	/// Advances with distance moved.
	Distance,
	/// Advances with rotation.
	Rotation,
	/// Value outside the known set, kept as is.
	Other(i8),
}

impl From<i8> for DriveType {
	fn from(raw: i8) -> Self {
		match raw {
			0 => Self::Time,
			1 => Self::Distance,
			2 => Self::Rotation,
			other => Self::Other(other),
		}
	}
}

impl From<DriveType> for i8 {
	fn from(value: DriveType) -> Self {
		match value {
			DriveType::Time => 0,
			DriveType::Distance => 1,
			DriveType::Rotation => 2,
			DriveType::Other(raw) => raw,
		}
	}
}

/// Timed event fired during playback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnimationEvent {
	/// Frame the event fires at.
	pub frame: i16,
	/// Event kind, e.g. `script`.
	pub event_type: Name<48>,
	/// Action text.
	pub action: Name<128>,
}

impl AnimationEvent {
	/// Build an event.
	pub fn new(frame: i16, event_type: &str, action: &str) -> Result<Self> {
		Ok(Self {
			frame,
			event_type: Name::new(event_type)?,
			action: Name::new(action)?,
		})
	}

	fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
		Ok(Self {
			frame: cursor.read_i16()?,
			event_type: Name::read(cursor)?,
			action: Name::read(cursor)?,
		})
	}

	fn write(&self, writer: &mut Writer) -> Result<()> {
		writer.write_i16(self.frame);
		self.event_type.write(writer)?;
		self.action.write(writer)
	}
}

/// Playback metadata over one keyframe stream.
///
/// Several descriptors may reference the same stream; they then hold clones of one `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamDescriptor {
	/// Frames in this use of the stream.
	pub frame_count: u16,
	/// Variation id.
	pub variation_id: i16,
	/// Playback rate in frames per second.
	pub frame_rate: f32,
	/// Distance covered per second, for distance-driven animations.
	pub dps: f32,
	/// Stream offset relative to the animation section start, as read. Recomputed on write.
	pub data_offset: i32,
	/// Decoded stream.
	pub keyframes: Arc<KeyframeStream>,
}

impl StreamDescriptor {
	/// Descriptor over `keyframes` with a zero offset, to be placed by the writer.
	pub fn new(keyframes: Arc<KeyframeStream>, frame_count: u16, frame_rate: f32) -> Self {
		Self {
			frame_count,
			variation_id: 0,
			frame_rate,
			dps: 0.0,
			data_offset: 0,
			keyframes,
		}
	}
}

/// One named animation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimationRecord {
	/// Animation name.
	pub name: Name<64>,
	/// Playback driver.
	pub drive_type: DriveType,
	/// Whether playback loops.
	pub loopable: bool,
	/// Events in file order.
	pub events: Vec<AnimationEvent>,
	/// Stream descriptors, at most [`MAX_STREAMS`].
	pub streams: Vec<StreamDescriptor>,
}

impl AnimationRecord {
	/// Empty time-driven animation.
	pub fn new(name: &str) -> Result<Self> {
		Ok(Self {
			name: Name::new(name)?,
			drive_type: DriveType::Time,
			loopable: false,
			events: Vec::new(),
			streams: Vec::new(),
		})
	}
}

#[derive(Debug, Clone, Copy)]
struct RawDescriptor {
	frame_count: u16,
	variation_id: i16,
	frame_rate: f32,
	dps: f32,
	data_offset: i32,
}

impl RawDescriptor {
	fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
		Ok(Self {
			frame_count: cursor.read_u16()?,
			variation_id: cursor.read_i16()?,
			frame_rate: cursor.read_f32()?,
			dps: cursor.read_f32()?,
			data_offset: cursor.read_i32()?,
		})
	}
}

#[derive(Debug, Clone)]
struct RawAnimation {
	name: Name<64>,
	drive_type: i8,
	loopable: i8,
	event_count: i16,
	event_offset: i32,
	descriptors: Vec<RawDescriptor>,
}

impl RawAnimation {
	fn read(cursor: &mut Cursor<'_>, index: usize) -> Result<Self> {
		let name = Name::read(cursor)?;
		let drive_type = cursor.read_i8()?;
		let loopable = cursor.read_i8()?;
		let event_count = cursor.read_i16()?;
		let event_offset = cursor.read_i32()?;
		let stream_count = cursor.read_i16()?;
		cursor.skip(2)?;

		let count = usize::try_from(stream_count).ok().filter(|count| *count <= MAX_STREAMS).ok_or(SkaError::StreamCountOutOfRange {
			animation: index,
			count: i32::from(stream_count),
			max: MAX_STREAMS,
		})?;
		let descriptors = (0..count).map(|_| RawDescriptor::read(cursor)).collect::<Result<Vec<_>>>()?;

		Ok(Self {
			name,
			drive_type,
			loopable,
			event_count,
			event_offset,
			descriptors,
		})
	}
}

/// Decoded skeletal animation file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SkaFile {
	/// Animation skeleton with rest transforms.
	pub bones: Vec<AnimBone>,
	/// Animations.
	pub animations: Vec<AnimationRecord>,
}

impl SkaFile {
	/// Decode an in-memory SKA image.
	///
	/// Descriptors that point at the same stream offset share one decoded [`KeyframeStream`].
	pub fn parse(bytes: &[u8], opt: &DecodeOptions, diag: &mut Diagnostics) -> Result<Self> {
		let header = SectionTable::<3>::parse(bytes)?;
		let [bones, variations, animations] = header.sections;

		let bones = read_records(bytes, bones, "bones", BONE_SIZE, opt, |cursor, index| AnimBone::read(cursor, index, diag))?;
		for (index, bone) in bones.iter().enumerate() {
			if !parent_precedes(bone.parent_index, index) {
				diag.push(Diagnostic::ParentOutOfOrder {
					bone: index,
					parent: bone.parent_index,
				});
			}
		}

		if variations.count != 0 {
			diag.push(Diagnostic::VariationDataIgnored { count: variations.count });
		}

		let raw = read_records(bytes, animations, "animations", ANIMATION_SIZE, opt, RawAnimation::read)?;
		let (_, section_at) = animations.locate("animations", ANIMATION_SIZE, bytes.len(), opt)?;

		let mut table = StreamTable::default();
		for item in &raw {
			for descriptor in &item.descriptors {
				table.declare(stream_at(section_at, descriptor.data_offset)?, descriptor.frame_count);
			}
		}
		table.decode_all(bytes, opt, diag)?;

		let mut records = Vec::with_capacity(raw.len());
		for (index, item) in raw.into_iter().enumerate() {
			let header_at = section_at + index * ANIMATION_SIZE;
			let events = read_events(bytes, header_at, index, &item, opt, diag)?;

			let mut streams = Vec::with_capacity(item.descriptors.len());
			for descriptor in &item.descriptors {
				let at = stream_at(section_at, descriptor.data_offset)?;
				let keyframes = table.get(at).ok_or(SkaError::StreamSentinelMissing { offset: at, at })?;
				streams.push(StreamDescriptor {
					frame_count: descriptor.frame_count,
					variation_id: descriptor.variation_id,
					frame_rate: descriptor.frame_rate,
					dps: descriptor.dps,
					data_offset: descriptor.data_offset,
					keyframes,
				});
			}

			records.push(AnimationRecord {
				name: item.name,
				drive_type: DriveType::from(item.drive_type),
				loopable: item.loopable != 0,
				events,
				streams,
			});
		}

		tracing::debug!(bones = bones.len(), animations = records.len(), "decoded ska");
		Ok(Self { bones, animations: records })
	}

	/// Read and decode an SKA file from disk.
	pub fn open(path: impl AsRef<Path>, opt: &DecodeOptions, diag: &mut Diagnostics) -> Result<Self> {
		let raw = fs::read(path)?;
		Self::parse(&raw, opt, diag)
	}

	/// Encode to an SKA image.
	///
	/// Layout: header, bones, then the animation section made of every animation header, every
	/// event array and finally each distinct stream once. The variation section is written empty
	/// at the animation section offset. Event and stream offsets are recomputed.
	pub fn write(&self) -> Result<Vec<u8>> {
		let bones_at = SectionTable::<3>::SIZE;
		let section_at = bones_at + self.bones.len() * BONE_SIZE;
		let headers_len = self.animations.len() * ANIMATION_SIZE;

		let mut event_at = Vec::with_capacity(self.animations.len());
		let mut events_len = 0;
		for animation in &self.animations {
			event_at.push(headers_len + events_len);
			events_len += animation.events.len() * EVENT_SIZE;
		}

		// Streams keyed by identity; each is stored once with the widest window that uses it.
		let mut slots: HashMap<*const KeyframeStream, usize> = HashMap::new();
		let mut unique: Vec<(&Arc<KeyframeStream>, u16)> = Vec::new();
		for (index, animation) in self.animations.iter().enumerate() {
			if animation.streams.len() > MAX_STREAMS {
				return Err(SkaError::StreamCountOutOfRange {
					animation: index,
					count: to_i32("streams", animation.streams.len())?,
					max: MAX_STREAMS,
				});
			}
			for descriptor in &animation.streams {
				let slot = *slots.entry(Arc::as_ptr(&descriptor.keyframes)).or_insert_with(|| {
					unique.push((&descriptor.keyframes, 0));
					unique.len() - 1
				});
				unique[slot].1 = unique[slot].1.max(descriptor.frame_count);
			}
		}

		let mut blobs = Vec::with_capacity(unique.len());
		let mut stream_offsets = Vec::with_capacity(unique.len());
		let mut next = headers_len + events_len;
		for (keyframes, window) in &unique {
			let blob = keyframes.encode(*window)?;
			stream_offsets.push(to_i32("stream offset", next)?);
			next += blob.len();
			blobs.push(blob);
		}

		let header = SectionTable {
			sections: [
				Section::new("bones", self.bones.len(), bones_at)?,
				Section::new("variations", 0, section_at)?,
				Section::new("animations", self.animations.len(), section_at)?,
			],
		};

		let mut writer = Writer::with_capacity(section_at + next);
		header.write(&mut writer);
		for bone in &self.bones {
			bone.write(&mut writer)?;
		}

		for (index, animation) in self.animations.iter().enumerate() {
			let header_at = index * ANIMATION_SIZE;
			animation.name.write(&mut writer)?;
			writer.write_i8(i8::from(animation.drive_type));
			writer.write_i8(i8::from(animation.loopable));
			writer.write_i16(to_i16("events", animation.events.len())?);
			let event_offset = if animation.events.is_empty() { 0 } else { event_at[index] - header_at };
			writer.write_i32(to_i32("event offset", event_offset)?);
			writer.write_i16(to_i16("streams", animation.streams.len())?);
			writer.write_i16(0);

			for descriptor in &animation.streams {
				let slot = slots.get(&Arc::as_ptr(&descriptor.keyframes)).copied().unwrap_or_default();
				writer.write_u16(descriptor.frame_count);
				writer.write_i16(descriptor.variation_id);
				writer.write_f32(descriptor.frame_rate);
				writer.write_f32(descriptor.dps);
				writer.write_i32(stream_offsets[slot]);
			}
			writer.write_zeros((MAX_STREAMS - animation.streams.len()) * DESCRIPTOR_SIZE);
		}

		for animation in &self.animations {
			for event in &animation.events {
				event.write(&mut writer)?;
			}
		}
		for blob in &blobs {
			writer.write_bytes(blob);
		}

		debug_assert_eq!(writer.pos(), section_at + next);
		tracing::debug!(animations = self.animations.len(), streams = blobs.len(), "encoded ska");
		Ok(writer.into_bytes())
	}

	/// Encode and write to disk.
	pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
		fs::write(path, self.write()?)?;
		Ok(())
	}

	/// Distinct keyframe streams in order of first reference.
	pub fn unique_streams(&self) -> Vec<&Arc<KeyframeStream>> {
		let mut out: Vec<&Arc<KeyframeStream>> = Vec::new();
		for descriptor in self.animations.iter().flat_map(|animation| &animation.streams) {
			if !out.iter().any(|seen| Arc::ptr_eq(seen, &descriptor.keyframes)) {
				out.push(&descriptor.keyframes);
			}
		}
		out
	}

	/// Find an animation by case-insensitive name.
	pub fn find_animation(&self, name: &str) -> Option<&AnimationRecord> {
		self.animations.iter().find(|animation| animation.name.as_str().eq_ignore_ascii_case(name))
	}
}

fn stream_at(section_at: usize, data_offset: i32) -> Result<usize> {
	usize::try_from(data_offset).map(|offset| section_at + offset).map_err(|_| SkaError::MalformedStream {
		at: section_at,
		reason: "negative stream data offset",
	})
}

/// Events live at `event_offset` bytes from the start of their animation header.
fn read_events(
	bytes: &[u8],
	header_at: usize,
	index: usize,
	item: &RawAnimation,
	opt: &DecodeOptions,
	diag: &mut Diagnostics,
) -> Result<Vec<AnimationEvent>> {
	if item.event_count < 0 {
		diag.push(Diagnostic::NegativeEventCount {
			animation: index,
			count: item.event_count,
		});
	}
	if item.event_count <= 0 {
		return Ok(Vec::new());
	}

	let at = isize::try_from(item.event_offset).ok().and_then(|delta| header_at.checked_add_signed(delta));
	let offset = at.and_then(|at| i32::try_from(at).ok()).unwrap_or(-1);
	let section = Section {
		count: i32::from(item.event_count),
		offset,
	};
	read_records(bytes, section, "events", EVENT_SIZE, opt, |cursor, _| AnimationEvent::read(cursor))
}

#[cfg(test)]
mod tests;

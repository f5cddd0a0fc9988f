//! Replay container format: record, save, load, playback, seeking.
//!
//! Byte layout (little-endian):
//!
//! ```text
//! [ magic  b"VBRP"                     : 4 bytes ]
//! [ version 0x00, MAJOR, MINOR, 0x00   : 4 bytes ]
//! [ checksum over everything below     : u32     ]
//! [ serve side (0 = left, 1 = right)   : u32     ]
//! [ left player name                   : NUL-terminated ]
//! [ right player name                  : NUL-terminated ]
//! [ input stream byte count            : u32     ]
//! [ input stream, one byte per tick               ]
//! [ final scores, left then right      : 2 x u32 ]
//! [ jump table entry count             : u32     ]
//! [ jump table { tick, offset }        : 2 x u32 each ]
//! ```
//!
//! Each input byte carries a 2-bit packet type in its top bits and the six
//! input flags (left player's left/right/up, then the right player's) below.
//! A savepoint is recorded every [`SAVE_POINT_PERIOD`] ticks so playback can
//! seek without replaying from tick zero.
//!
//! The checksum is CRC-32/ISO-HDLC over every byte after the checksum field,
//! jump table included. A file failing the magic, version or checksum test
//! is rejected in full; nothing is ever partially loaded.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use thiserror::Error;

use crate::codec::{read_cstr, read_u32, write_cstr, write_u32};
use crate::sim::{PlayerInput, PlayerSide};

pub const REPLAY_MAGIC: [u8; 4] = *b"VBRP";
pub const REPLAY_VERSION_MAJOR: u8 = 1;
pub const REPLAY_VERSION_MINOR: u8 = 0;

/// One savepoint every this many recorded ticks.
pub const SAVE_POINT_PERIOD: u32 = 30;

const PACKET_INPUT: u8 = 0;
const PACKET_END: u8 = 2;
const END_BYTE: u8 = PACKET_END << 6;

/// Everything that can go wrong at the replay boundary. Simulation-level
/// code never sees these; they surface only from `save`/`load`.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error(
        "corrupted replay {origin}: checksum in file {stored:#010x}, computed {computed:#010x}"
    )]
    ChecksumMismatch {
        origin: String,
        stored: u32,
        computed: u32,
    },

    #[error("unsupported replay version {major}.{minor} in {origin}")]
    VersionMismatch {
        origin: String,
        major: u8,
        minor: u8,
    },

    #[error("malformed or truncated replay {origin}")]
    MalformedHeader { origin: String },

    #[error("replay I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Jump table entry: byte offset of a tick within the input stream.
/// Entries are strictly increasing in both fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySavePoint {
    pub tick: u32,
    pub offset: u32,
}

fn pack_record(inputs: &[PlayerInput; 2]) -> u8 {
    (PACKET_INPUT << 6) | (inputs[0].pack_bits() << 3) | inputs[1].pack_bits()
}

fn unpack_record(byte: u8) -> [PlayerInput; 2] {
    [
        PlayerInput::from_bits((byte >> 3) & 0b111),
        PlayerInput::from_bits(byte & 0b111),
    ]
}

/// Record side of the replay state machine: accumulates one input record per
/// tick plus the savepoint table, then writes the container.
///
/// Playback is a separate type ([`ReplayPlayer`]); a recorder can never be
/// read and a player can never record.
#[derive(Debug)]
pub struct ReplayRecorder {
    serving_player: PlayerSide,
    player_names: [String; 2],
    data: Vec<u8>,
    save_points: Vec<ReplaySavePoint>,
    recorded_ticks: u32,
    final_scores: Option<(u32, u32)>,
}

impl ReplayRecorder {
    pub fn new(serving_player: PlayerSide, left_name: &str, right_name: &str) -> Self {
        Self {
            serving_player,
            player_names: [left_name.to_owned(), right_name.to_owned()],
            data: Vec::new(),
            save_points: Vec::new(),
            recorded_ticks: 0,
            final_scores: None,
        }
    }

    /// Append one tick's inputs. Ignored after [`finalize`](Self::finalize).
    pub fn record(&mut self, inputs: &[PlayerInput; 2]) {
        if self.final_scores.is_some() {
            return;
        }
        if self.recorded_ticks % SAVE_POINT_PERIOD == 0 {
            self.save_points.push(ReplaySavePoint {
                tick: self.recorded_ticks,
                offset: self.data.len() as u32,
            });
        }
        self.data.push(pack_record(inputs));
        self.recorded_ticks += 1;
    }

    /// Close the input stream and attach the final score. No further ticks
    /// can be recorded.
    pub fn finalize(&mut self, left_score: u32, right_score: u32) {
        if self.final_scores.is_some() {
            return;
        }
        self.data.push(END_BYTE);
        self.final_scores = Some((left_score, right_score));
    }

    pub fn recorded_ticks(&self) -> u32 {
        self.recorded_ticks
    }

    /// Write the complete container to the target stream.
    pub fn save<W: Write>(&self, target: &mut W) -> Result<(), ReplayError> {
        let mut body = Vec::new();
        write_u32(&mut body, self.serving_player.index() as u32)?;
        write_cstr(&mut body, &self.player_names[0])?;
        write_cstr(&mut body, &self.player_names[1])?;

        if self.final_scores.is_none() {
            log::warn!("saving a replay that was never finalized; scores default to 0:0");
        }
        let mut stream = self.data.clone();
        if self.final_scores.is_none() {
            stream.push(END_BYTE);
        }
        write_u32(&mut body, stream.len() as u32)?;
        body.extend_from_slice(&stream);

        let (left_score, right_score) = self.final_scores.unwrap_or((0, 0));
        write_u32(&mut body, left_score)?;
        write_u32(&mut body, right_score)?;

        write_u32(&mut body, self.save_points.len() as u32)?;
        for save_point in &self.save_points {
            write_u32(&mut body, save_point.tick)?;
            write_u32(&mut body, save_point.offset)?;
        }

        target.write_all(&REPLAY_MAGIC)?;
        target.write_all(&[0, REPLAY_VERSION_MAJOR, REPLAY_VERSION_MINOR, 0])?;
        write_u32(target, crc32(&body))?;
        target.write_all(&body)?;

        log::info!(
            "saved replay: {} ticks, {} savepoints, {} body bytes",
            self.recorded_ticks,
            self.save_points.len(),
            body.len()
        );
        Ok(())
    }

    /// Convenience wrapper writing to a file.
    pub fn save_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ReplayError> {
        let mut file = File::create(path.as_ref())?;
        self.save(&mut file)
    }
}

/// Playback side of the replay state machine: validates and loads a
/// container, then steps a read cursor through the input stream.
#[derive(Debug)]
pub struct ReplayPlayer {
    origin: String,
    version: (u8, u8),
    serving_player: PlayerSide,
    player_names: [String; 2],
    final_scores: (u32, u32),
    data: Vec<u8>,
    save_points: Vec<ReplaySavePoint>,
    cursor: usize,
}

/// Record kinds in the input stream, from the 2-bit tag of each byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    Input,
    EndOfStream,
}

impl ReplayPlayer {
    /// Read and validate a replay. Magic and version are checked before
    /// anything else; the checksum is verified over the fully read remainder
    /// before any of it is parsed. A failing file is rejected whole.
    pub fn load<R: Read>(source: &mut R, origin: &str) -> Result<Self, ReplayError> {
        let malformed = || ReplayError::MalformedHeader {
            origin: origin.to_owned(),
        };

        let mut magic = [0u8; 4];
        source.read_exact(&mut magic).map_err(|_| malformed())?;
        if magic != REPLAY_MAGIC {
            return Err(malformed());
        }

        let mut version = [0u8; 4];
        source.read_exact(&mut version).map_err(|_| malformed())?;
        if version[0] != 0 || version[3] != 0 {
            return Err(malformed());
        }
        if version[1] != REPLAY_VERSION_MAJOR {
            return Err(ReplayError::VersionMismatch {
                origin: origin.to_owned(),
                major: version[1],
                minor: version[2],
            });
        }

        let mut checksum_bytes = [0u8; 4];
        source.read_exact(&mut checksum_bytes).map_err(|_| malformed())?;
        let stored = u32::from_le_bytes(checksum_bytes);

        let mut body = Vec::new();
        source.read_to_end(&mut body)?;
        let computed = crc32(&body);
        if computed != stored {
            return Err(ReplayError::ChecksumMismatch {
                origin: origin.to_owned(),
                stored,
                computed,
            });
        }

        let mut cursor = io::Cursor::new(body.as_slice());
        let serving_player = match read_u32(&mut cursor).map_err(|_| malformed())? {
            0 => PlayerSide::Left,
            1 => PlayerSide::Right,
            _ => return Err(malformed()),
        };
        let left_name = read_cstr(&mut cursor).map_err(|_| malformed())?;
        let right_name = read_cstr(&mut cursor).map_err(|_| malformed())?;

        let stream_len = read_u32(&mut cursor).map_err(|_| malformed())? as usize;
        let stream_start = cursor.position() as usize;
        if stream_start + stream_len > body.len() {
            return Err(malformed());
        }
        let data = body[stream_start..stream_start + stream_len].to_vec();
        cursor.set_position((stream_start + stream_len) as u64);

        let final_scores = (
            read_u32(&mut cursor).map_err(|_| malformed())?,
            read_u32(&mut cursor).map_err(|_| malformed())?,
        );

        let save_point_count = read_u32(&mut cursor).map_err(|_| malformed())?;
        let mut save_points: Vec<ReplaySavePoint> =
            Vec::with_capacity(save_point_count.min(1 << 16) as usize);
        for _ in 0..save_point_count {
            let tick = read_u32(&mut cursor).map_err(|_| malformed())?;
            let offset = read_u32(&mut cursor).map_err(|_| malformed())?;
            if let Some(last) = save_points.last()
                && (tick <= last.tick || offset <= last.offset)
            {
                return Err(malformed());
            }
            save_points.push(ReplaySavePoint { tick, offset });
        }

        if cursor.position() != body.len() as u64 {
            return Err(malformed());
        }

        log::info!(
            "loaded replay {origin}: {} stream bytes, {} savepoints, version {}.{}",
            data.len(),
            save_points.len(),
            version[1],
            version[2]
        );

        Ok(Self {
            origin: origin.to_owned(),
            version: (version[1], version[2]),
            serving_player,
            player_names: [left_name, right_name],
            final_scores,
            data,
            save_points,
            cursor: 0,
        })
    }

    /// Convenience wrapper reading from a file; the path becomes the error
    /// origin.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, ReplayError> {
        let origin = path.as_ref().display().to_string();
        let mut file = File::open(path.as_ref())?;
        Self::load(&mut file, &origin)
    }

    /// Record kind at the read cursor.
    pub fn packet_type(&self) -> PacketType {
        match self.data.get(self.cursor) {
            Some(byte) if byte >> 6 == PACKET_INPUT => PacketType::Input,
            _ => PacketType::EndOfStream,
        }
    }

    /// Whether playback has consumed every input record.
    pub fn is_at_end(&self) -> bool {
        self.packet_type() == PacketType::EndOfStream
    }

    /// The next tick's inputs, advancing the cursor; `None` at end of stream.
    pub fn next_input(&mut self) -> Option<[PlayerInput; 2]> {
        let byte = *self.data.get(self.cursor)?;
        if byte >> 6 != PACKET_INPUT {
            return None;
        }
        self.cursor += 1;
        Some(unpack_record(byte))
    }

    /// Rewind to the start of the input stream.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Position playback at the given tick: jump to the nearest savepoint at
    /// or before it, then decode forward. Returns the tick actually reached
    /// (smaller than requested only when the stream ends first).
    pub fn seek_to_tick(&mut self, tick: u32) -> u32 {
        let (mut at, offset) = self
            .save_points
            .iter()
            .rev()
            .find(|save_point| save_point.tick <= tick)
            .map(|save_point| (save_point.tick, save_point.offset as usize))
            .unwrap_or((0, 0));
        self.cursor = offset;

        while at < tick {
            if self.next_input().is_none() {
                break;
            }
            at += 1;
        }
        at
    }

    pub fn serving_player(&self) -> PlayerSide {
        self.serving_player
    }

    pub fn player_name(&self, side: PlayerSide) -> &str {
        &self.player_names[side.index()]
    }

    /// Final scores, left then right.
    pub fn final_scores(&self) -> (u32, u32) {
        self.final_scores
    }

    pub fn version(&self) -> (u8, u8) {
        self.version
    }

    pub fn save_points(&self) -> &[ReplaySavePoint] {
        &self.save_points
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }
}

/// CRC-32/ISO-HDLC (the usual zlib/PNG polynomial), table-driven.
fn crc32(bytes: &[u8]) -> u32 {
    const TABLE: [u32; 256] = crc32_table();
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in bytes {
        crc = TABLE[((crc ^ byte as u32) & 0xFF) as usize] ^ (crc >> 8);
    }
    crc ^ 0xFFFF_FFFF
}

const fn crc32_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                0xEDB8_8320 ^ (crc >> 1)
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

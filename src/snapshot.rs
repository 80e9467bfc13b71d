use thiserror::Error;

use crate::game::{PLAYER_AI, PLAYER_HUMAN};
use crate::region::Region;
use crate::types::{Coordinate, GameConfig, MAX_EXTENT, MIN_EXTENT};

const MAGIC: &[u8; 4] = b"CHMP";
const VERSION: u32 = 1;
const HEADER_SIZE: usize = 20;
/// width, height, player, flags, move count (u16)
const FIXED_PAYLOAD: usize = 6;
const FLAG_GAME_OVER: u8 = 0b01;
const FLAG_AI_FIRST: u8 = 0b10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("snapshot too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("invalid snapshot magic (expected CHMP)")]
    BadMagic,

    #[error("unsupported snapshot version: expected 1, got {0}")]
    UnsupportedVersion(u32),

    #[error("CRC32 mismatch: expected {expected:#010x}, got {actual:#010x}")]
    CrcMismatch { expected: u32, actual: u32 },

    #[error("unexpected EOF while reading {0}")]
    UnexpectedEof(&'static str),

    #[error("snapshot payload has trailing bytes")]
    TrailingBytes,

    #[error("unknown flag bits {0:#04x}")]
    InvalidFlags(u8),

    #[error("board size {width}x{height} is out of range")]
    InvalidSize { width: u8, height: u8 },

    #[error("invalid player value: {0}")]
    InvalidPlayer(u8),

    #[error("corners do not form a staircase")]
    InvalidRegion,

    #[error("region does not fit the {width}x{height} board")]
    RegionOutOfBounds { width: u8, height: u8 },

    #[error("game-over flag disagrees with the remaining cells")]
    Inconsistent,
}

/// A game in progress, as stored between sessions.
///
/// Binary layout (little endian):
/// - header: magic `CHMP`, version `u32`, corner count `u32`, payload CRC32 `u32`,
///   reserved `u32`
/// - payload: width, height, current player, flags (`u8` each), move count `u16`,
///   then one `(x, y)` byte pair per corner, widest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSnapshot {
    pub config: GameConfig,
    pub current_player: u8,
    pub is_game_over: bool,
    pub move_count: u16,
    pub region: Region,
}

impl GameSnapshot {
    pub fn to_bytes(&self) -> Vec<u8> {
        let corners = self.region.corners();
        let mut flags = 0u8;
        if self.is_game_over {
            flags |= FLAG_GAME_OVER;
        }
        if self.config.ai_first {
            flags |= FLAG_AI_FIRST;
        }

        let mut payload = Vec::with_capacity(FIXED_PAYLOAD + corners.len() * 2);
        payload.push(self.config.width);
        payload.push(self.config.height);
        payload.push(self.current_player);
        payload.push(flags);
        payload.extend_from_slice(&self.move_count.to_le_bytes());
        for corner in corners {
            payload.push(corner.x);
            payload.push(corner.y);
        }

        let crc = crc32fast::hash(&payload);
        let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.extend_from_slice(&(corners.len() as u32).to_le_bytes());
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&payload);
        out
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, SnapshotError> {
        if data.len() < HEADER_SIZE {
            return Err(SnapshotError::TooShort {
                expected: HEADER_SIZE,
                actual: data.len(),
            });
        }

        if &data[0..4] != MAGIC {
            return Err(SnapshotError::BadMagic);
        }

        let version = read_u32_le(data, 4)?;
        if version != VERSION {
            return Err(SnapshotError::UnsupportedVersion(version));
        }

        let num_corners = read_u32_le(data, 8)? as usize;
        let expected_crc = read_u32_le(data, 12)?;
        let payload = &data[HEADER_SIZE..];

        let actual_crc = crc32fast::hash(payload);
        if actual_crc != expected_crc {
            return Err(SnapshotError::CrcMismatch {
                expected: expected_crc,
                actual: actual_crc,
            });
        }

        if payload.len() < FIXED_PAYLOAD {
            return Err(SnapshotError::UnexpectedEof("game fields"));
        }
        let flags = payload[3];
        if flags & !(FLAG_GAME_OVER | FLAG_AI_FIRST) != 0 {
            return Err(SnapshotError::InvalidFlags(flags));
        }

        let corner_bytes = num_corners
            .checked_mul(2)
            .ok_or(SnapshotError::UnexpectedEof("corners"))?;
        let body = &payload[FIXED_PAYLOAD..];
        if body.len() < corner_bytes {
            return Err(SnapshotError::UnexpectedEof("corners"));
        }
        if body.len() > corner_bytes {
            return Err(SnapshotError::TrailingBytes);
        }

        let corners = body
            .chunks_exact(2)
            .map(|pair| Coordinate::new(pair[0], pair[1]));
        let region = Region::from_corners(corners).ok_or(SnapshotError::InvalidRegion)?;

        let snapshot = Self {
            config: GameConfig {
                width: payload[0],
                height: payload[1],
                ai_first: flags & FLAG_AI_FIRST != 0,
            },
            current_player: payload[2],
            is_game_over: flags & FLAG_GAME_OVER != 0,
            move_count: u16::from_le_bytes([payload[4], payload[5]]),
            region,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Checks the fields against each other. `from_bytes` already calls this.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let GameConfig { width, height, .. } = self.config;
        let extents = MIN_EXTENT..=MAX_EXTENT;
        if !extents.contains(&width) || !extents.contains(&height) {
            return Err(SnapshotError::InvalidSize { width, height });
        }
        if self.current_player != PLAYER_HUMAN && self.current_player != PLAYER_AI {
            return Err(SnapshotError::InvalidPlayer(self.current_player));
        }
        if self.region.width() > width || self.region.height() > height {
            return Err(SnapshotError::RegionOutOfBounds { width, height });
        }
        if self.is_game_over != self.region.is_empty() {
            return Err(SnapshotError::Inconsistent);
        }
        Ok(())
    }
}

fn read_u32_le(data: &[u8], offset: usize) -> Result<u32, SnapshotError> {
    if offset + 4 > data.len() {
        return Err(SnapshotError::UnexpectedEof("u32"));
    }
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&data[offset..offset + 4]);
    Ok(u32::from_le_bytes(bytes))
}

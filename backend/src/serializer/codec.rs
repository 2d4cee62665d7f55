//! Binary encode/decode for replay records.
//!
//! All integers are little-endian. Vectors and strings carry a `u32` length
//! prefix. A stream starts with `b"ARNA"` and a one-byte format version,
//! followed by records, each introduced by a one-byte tag.

use crate::delta::{
    MatchFooter, MatchHeader, RgbTable, RoundDelta, SpawnedBodyTable, SpawnedProjectileTable,
    VecTable,
};
use crate::models::event::MatchEndReason;
use crate::models::robot::Team;
use crate::serializer::{ReplayRecord, SerializerError};
use std::io::{ErrorKind, Read, Write};

pub const MAGIC: [u8; 4] = *b"ARNA";
pub const STREAM_VERSION: u8 = 1;

pub const TAG_HEADER: u8 = 1;
pub const TAG_ROUND: u8 = 2;
pub const TAG_FOOTER: u8 = 3;

// ── Primitive writers ───────────────────────────────────────────

pub fn write_u8(w: &mut dyn Write, v: u8) -> Result<(), SerializerError> {
    w.write_all(&[v])?;
    Ok(())
}

pub fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), SerializerError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

pub fn write_u64_le(w: &mut dyn Write, v: u64) -> Result<(), SerializerError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

pub fn write_i32_le(w: &mut dyn Write, v: i32) -> Result<(), SerializerError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn write_len(w: &mut dyn Write, len: usize) -> Result<(), SerializerError> {
    let len = u32::try_from(len).map_err(|_| SerializerError::MalformedRecord {
        detail: format!("array of {len} elements exceeds u32 length prefix"),
    })?;
    write_u32_le(w, len)
}

pub fn write_str(w: &mut dyn Write, s: &str) -> Result<(), SerializerError> {
    write_len(w, s.len())?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

pub fn write_bytes(w: &mut dyn Write, b: &[u8]) -> Result<(), SerializerError> {
    write_len(w, b.len())?;
    w.write_all(b)?;
    Ok(())
}

pub fn write_i32s(w: &mut dyn Write, values: &[i32]) -> Result<(), SerializerError> {
    write_len(w, values.len())?;
    for &v in values {
        write_i32_le(w, v)?;
    }
    Ok(())
}

pub fn write_u32s(w: &mut dyn Write, values: &[u32]) -> Result<(), SerializerError> {
    write_len(w, values.len())?;
    for &v in values {
        write_u32_le(w, v)?;
    }
    Ok(())
}

pub fn write_u64s(w: &mut dyn Write, values: &[u64]) -> Result<(), SerializerError> {
    write_len(w, values.len())?;
    for &v in values {
        write_u64_le(w, v)?;
    }
    Ok(())
}

fn write_strs(w: &mut dyn Write, values: &[String]) -> Result<(), SerializerError> {
    write_len(w, values.len())?;
    for v in values {
        write_str(w, v)?;
    }
    Ok(())
}

// ── Primitive readers ───────────────────────────────────────────

pub fn read_u8(r: &mut dyn Read) -> Result<u8, SerializerError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub fn read_u32_le(r: &mut dyn Read) -> Result<u32, SerializerError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub fn read_u64_le(r: &mut dyn Read) -> Result<u64, SerializerError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

pub fn read_i32_le(r: &mut dyn Read) -> Result<i32, SerializerError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

/// Length prefixes are not trusted for preallocation
const MAX_PREALLOC: usize = 4096;

fn read_len(r: &mut dyn Read) -> Result<usize, SerializerError> {
    Ok(read_u32_le(r)? as usize)
}

pub fn read_str(r: &mut dyn Read) -> Result<String, SerializerError> {
    let buf = read_bytes(r)?;
    String::from_utf8(buf).map_err(|e| SerializerError::MalformedRecord {
        detail: format!("invalid UTF-8 string: {e}"),
    })
}

pub fn read_bytes(r: &mut dyn Read) -> Result<Vec<u8>, SerializerError> {
    let len = read_len(r)?;
    let mut buf = Vec::with_capacity(len.min(MAX_PREALLOC));
    Read::take(&mut *r, len as u64).read_to_end(&mut buf)?;
    if buf.len() != len {
        return Err(SerializerError::MalformedRecord {
            detail: format!("truncated byte array: got {} of {len} bytes", buf.len()),
        });
    }
    Ok(buf)
}

fn read_vec<T>(
    r: &mut dyn Read,
    mut item: impl FnMut(&mut dyn Read) -> Result<T, SerializerError>,
) -> Result<Vec<T>, SerializerError> {
    let len = read_len(r)?;
    let mut out = Vec::with_capacity(len.min(MAX_PREALLOC));
    for _ in 0..len {
        out.push(item(r)?);
    }
    Ok(out)
}

pub fn read_i32s(r: &mut dyn Read) -> Result<Vec<i32>, SerializerError> {
    read_vec(r, read_i32_le)
}

pub fn read_u32s(r: &mut dyn Read) -> Result<Vec<u32>, SerializerError> {
    read_vec(r, read_u32_le)
}

pub fn read_u64s(r: &mut dyn Read) -> Result<Vec<u64>, SerializerError> {
    read_vec(r, read_u64_le)
}

fn read_strs(r: &mut dyn Read) -> Result<Vec<String>, SerializerError> {
    read_vec(r, read_str)
}

// ── Tables ──────────────────────────────────────────────────────

fn write_vec_table(w: &mut dyn Write, t: &VecTable) -> Result<(), SerializerError> {
    write_i32s(w, &t.xs)?;
    write_i32s(w, &t.ys)
}

fn read_vec_table(r: &mut dyn Read) -> Result<VecTable, SerializerError> {
    Ok(VecTable {
        xs: read_i32s(r)?,
        ys: read_i32s(r)?,
    })
}

fn write_rgb_table(w: &mut dyn Write, t: &RgbTable) -> Result<(), SerializerError> {
    write_bytes(w, &t.red)?;
    write_bytes(w, &t.green)?;
    write_bytes(w, &t.blue)
}

fn read_rgb_table(r: &mut dyn Read) -> Result<RgbTable, SerializerError> {
    Ok(RgbTable {
        red: read_bytes(r)?,
        green: read_bytes(r)?,
        blue: read_bytes(r)?,
    })
}

fn write_bodies(w: &mut dyn Write, t: &SpawnedBodyTable) -> Result<(), SerializerError> {
    write_i32s(w, &t.robot_ids)?;
    write_bytes(w, &t.team_ids)?;
    write_bytes(w, &t.kinds)?;
    write_vec_table(w, &t.locs)
}

fn read_bodies(r: &mut dyn Read) -> Result<SpawnedBodyTable, SerializerError> {
    Ok(SpawnedBodyTable {
        robot_ids: read_i32s(r)?,
        team_ids: read_bytes(r)?,
        kinds: read_bytes(r)?,
        locs: read_vec_table(r)?,
    })
}

fn write_projectiles(
    w: &mut dyn Write,
    t: &SpawnedProjectileTable,
) -> Result<(), SerializerError> {
    write_i32s(w, &t.ids)?;
    write_bytes(w, &t.team_ids)?;
    write_vec_table(w, &t.locs)?;
    write_bytes(w, &t.directions)?;
    write_i32s(w, &t.damages)
}

fn read_projectiles(r: &mut dyn Read) -> Result<SpawnedProjectileTable, SerializerError> {
    Ok(SpawnedProjectileTable {
        ids: read_i32s(r)?,
        team_ids: read_bytes(r)?,
        locs: read_vec_table(r)?,
        directions: read_bytes(r)?,
        damages: read_i32s(r)?,
    })
}

// ── Stream preamble ─────────────────────────────────────────────

pub fn encode_preamble(w: &mut dyn Write) -> Result<(), SerializerError> {
    w.write_all(&MAGIC)?;
    write_u8(w, STREAM_VERSION)
}

pub fn decode_preamble(r: &mut dyn Read) -> Result<(), SerializerError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(SerializerError::InvalidMagic);
    }
    let version = read_u8(r)?;
    if version != STREAM_VERSION {
        return Err(SerializerError::UnsupportedVersion { found: version });
    }
    Ok(())
}

// ── Records ─────────────────────────────────────────────────────

pub fn encode_header(w: &mut dyn Write, h: &MatchHeader) -> Result<(), SerializerError> {
    write_u32_le(w, h.format_version)?;
    write_str(w, &h.config_hash)?;
    write_u64_le(w, h.seed)?;
    write_u32_le(w, h.max_rounds)?;
    write_i32_le(w, h.map_width)?;
    write_i32_le(w, h.map_height)?;
    write_i32_le(w, h.water_level)?;
    write_i32s(w, &h.elevation)?;
    write_bodies(w, &h.initial_bodies)?;
    write_bytes(w, &h.team_ids)?;
    write_u64s(w, &h.team_resources)?;
    write_u32s(w, &h.team_scores)
}

pub fn decode_header(r: &mut dyn Read) -> Result<MatchHeader, SerializerError> {
    Ok(MatchHeader {
        format_version: read_u32_le(r)?,
        config_hash: read_str(r)?,
        seed: read_u64_le(r)?,
        max_rounds: read_u32_le(r)?,
        map_width: read_i32_le(r)?,
        map_height: read_i32_le(r)?,
        water_level: read_i32_le(r)?,
        elevation: read_i32s(r)?,
        initial_bodies: read_bodies(r)?,
        team_ids: read_bytes(r)?,
        team_resources: read_u64s(r)?,
        team_scores: read_u32s(r)?,
    })
}

/// Field order follows [`RoundDelta`] declaration order
pub fn encode_round(w: &mut dyn Write, d: &RoundDelta) -> Result<(), SerializerError> {
    write_bytes(w, &d.team_ids)?;
    write_u64s(w, &d.team_resources)?;
    write_u32s(w, &d.team_scores)?;
    write_i32s(w, &d.moved_ids)?;
    write_vec_table(w, &d.moved_locs)?;
    write_bodies(w, &d.spawned_bodies)?;
    write_projectiles(w, &d.spawned_projectiles)?;
    write_i32s(w, &d.health_changed_ids)?;
    write_i32s(w, &d.health_levels)?;
    write_i32s(w, &d.died_ids)?;
    write_i32s(w, &d.died_projectile_ids)?;
    write_i32s(w, &d.action_ids)?;
    write_bytes(w, &d.actions)?;
    write_i32s(w, &d.action_targets)?;
    write_i32s(w, &d.indicator_string_ids)?;
    write_i32s(w, &d.indicator_string_indices)?;
    write_strs(w, &d.indicator_string_values)?;
    write_i32s(w, &d.indicator_dot_ids)?;
    write_vec_table(w, &d.indicator_dot_locs)?;
    write_rgb_table(w, &d.indicator_dot_rgbs)?;
    write_i32s(w, &d.indicator_line_ids)?;
    write_vec_table(w, &d.indicator_line_start_locs)?;
    write_vec_table(w, &d.indicator_line_end_locs)?;
    write_rgb_table(w, &d.indicator_line_rgbs)?;
    write_u32_le(w, d.round_id)
}

pub fn decode_round(r: &mut dyn Read) -> Result<RoundDelta, SerializerError> {
    Ok(RoundDelta {
        team_ids: read_bytes(r)?,
        team_resources: read_u64s(r)?,
        team_scores: read_u32s(r)?,
        moved_ids: read_i32s(r)?,
        moved_locs: read_vec_table(r)?,
        spawned_bodies: read_bodies(r)?,
        spawned_projectiles: read_projectiles(r)?,
        health_changed_ids: read_i32s(r)?,
        health_levels: read_i32s(r)?,
        died_ids: read_i32s(r)?,
        died_projectile_ids: read_i32s(r)?,
        action_ids: read_i32s(r)?,
        actions: read_bytes(r)?,
        action_targets: read_i32s(r)?,
        indicator_string_ids: read_i32s(r)?,
        indicator_string_indices: read_i32s(r)?,
        indicator_string_values: read_strs(r)?,
        indicator_dot_ids: read_i32s(r)?,
        indicator_dot_locs: read_vec_table(r)?,
        indicator_dot_rgbs: read_rgb_table(r)?,
        indicator_line_ids: read_i32s(r)?,
        indicator_line_start_locs: read_vec_table(r)?,
        indicator_line_end_locs: read_vec_table(r)?,
        indicator_line_rgbs: read_rgb_table(r)?,
        round_id: read_u32_le(r)?,
    })
}

fn reason_tag(reason: MatchEndReason) -> u8 {
    match reason {
        MatchEndReason::RoundLimit => 0,
        MatchEndReason::Elimination => 1,
        MatchEndReason::Aborted => 2,
        MatchEndReason::ProviderFailure => 3,
    }
}

fn reason_from_tag(tag: u8) -> Result<MatchEndReason, SerializerError> {
    match tag {
        0 => Ok(MatchEndReason::RoundLimit),
        1 => Ok(MatchEndReason::Elimination),
        2 => Ok(MatchEndReason::Aborted),
        3 => Ok(MatchEndReason::ProviderFailure),
        other => Err(SerializerError::MalformedRecord {
            detail: format!("unknown end reason {other}"),
        }),
    }
}

/// The winner is written as a team id; 0 (neutral) means no winner
pub fn encode_footer(w: &mut dyn Write, f: &MatchFooter) -> Result<(), SerializerError> {
    write_u8(w, f.winner.map(Team::id).unwrap_or(Team::Neutral.id()))?;
    write_u8(w, reason_tag(f.reason))?;
    write_u32_le(w, f.rounds_played)
}

pub fn decode_footer(r: &mut dyn Read) -> Result<MatchFooter, SerializerError> {
    let winner = match read_u8(r)? {
        0 => None,
        id => Some(Team::from_id(id).ok_or_else(|| SerializerError::MalformedRecord {
            detail: format!("unknown winner team {id}"),
        })?),
    };
    Ok(MatchFooter {
        winner,
        reason: reason_from_tag(read_u8(r)?)?,
        rounds_played: read_u32_le(r)?,
    })
}

pub fn encode_record(w: &mut dyn Write, record: &ReplayRecord) -> Result<(), SerializerError> {
    match record {
        ReplayRecord::Header(h) => {
            write_u8(w, TAG_HEADER)?;
            encode_header(w, h)
        }
        ReplayRecord::Round(d) => {
            d.validate()?;
            write_u8(w, TAG_ROUND)?;
            encode_round(w, d)
        }
        ReplayRecord::Footer(f) => {
            write_u8(w, TAG_FOOTER)?;
            encode_footer(w, f)
        }
    }
}

/// Decode the next record
///
/// Returns `Ok(None)` on clean EOF before a tag byte.
pub fn decode_record(r: &mut dyn Read) -> Result<Option<ReplayRecord>, SerializerError> {
    let mut tag = [0u8; 1];
    loop {
        match r.read(&mut tag) {
            Ok(0) => return Ok(None),
            Ok(_) => break,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(SerializerError::Io(e)),
        }
    }
    let record = match tag[0] {
        TAG_HEADER => ReplayRecord::Header(decode_header(r)?),
        TAG_ROUND => ReplayRecord::Round(decode_round(r)?),
        TAG_FOOTER => ReplayRecord::Footer(decode_footer(r)?),
        other => return Err(SerializerError::UnknownRecordTag { tag: other }),
    };
    Ok(Some(record))
}

//! JPL SPK kernel reader (DAF container, Chebyshev segment types 2 and 3)
//!
//! Kernels such as `de421.bsp` store, per target body, fixed-length time
//! intervals of Chebyshev coefficients for the position relative to a center
//! body. Positions relative to the solar-system barycenter are obtained by
//! walking the center chain.

use std::path::Path;

use crate::error::{SkyError, SkyResult};

use super::coords::{HorizontalPosition, Observer, Vec3, topocentric_horizontal};
use super::ephemeris::EphemerisProvider;
use super::time::Epoch;

const RECORD_BYTES: usize = 1024;
const WORD_BYTES: usize = 8;
const SPEED_OF_LIGHT_KM_S: f64 = 299_792.458;
const LIGHT_TIME_ITERATIONS: usize = 3;
const MAX_CHAIN_DEPTH: usize = 16;

const SOLAR_SYSTEM_BARYCENTER: i32 = 0;
const EARTH: i32 = 399;
const FRAME_J2000: i32 = 1;

/// NAIF body codes and their ephemeris names
const NAIF_BODIES: &[(i32, &str)] = &[
    (0, "solar system barycenter"),
    (1, "mercury barycenter"),
    (2, "venus barycenter"),
    (3, "earth barycenter"),
    (4, "mars barycenter"),
    (5, "jupiter barycenter"),
    (6, "saturn barycenter"),
    (7, "uranus barycenter"),
    (8, "neptune barycenter"),
    (9, "pluto barycenter"),
    (10, "sun"),
    (199, "mercury"),
    (299, "venus"),
    (301, "moon"),
    (399, "earth"),
    (499, "mars"),
    (599, "jupiter"),
    (699, "saturn"),
    (799, "uranus"),
    (899, "neptune"),
    (999, "pluto"),
];

pub fn naif_name(code: i32) -> String {
    NAIF_BODIES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("naif {}", code))
}

pub fn naif_code(name: &str) -> Option<i32> {
    let lower = name.trim().to_lowercase();
    if let Some((code, _)) = NAIF_BODIES.iter().find(|(_, n)| *n == lower) {
        return Some(*code);
    }
    lower.strip_prefix("naif ").and_then(|c| c.trim().parse().ok())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    Little,
    Big,
}

/// Bounds-checked view over the raw kernel bytes
struct DafReader<'a> {
    bytes: &'a [u8],
    order: ByteOrder,
}

impl<'a> DafReader<'a> {
    fn slice<const N: usize>(&self, offset: usize) -> SkyResult<[u8; N]> {
        self.bytes
            .get(offset..offset + N)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| SkyError::Ephemeris(format!("kernel truncated at byte {}", offset)))
    }

    fn i32_at(&self, offset: usize) -> SkyResult<i32> {
        let buf = self.slice::<4>(offset)?;
        Ok(match self.order {
            ByteOrder::Little => i32::from_le_bytes(buf),
            ByteOrder::Big => i32::from_be_bytes(buf),
        })
    }

    fn f64_at(&self, offset: usize) -> SkyResult<f64> {
        let buf = self.slice::<8>(offset)?;
        Ok(match self.order {
            ByteOrder::Little => f64::from_le_bytes(buf),
            ByteOrder::Big => f64::from_be_bytes(buf),
        })
    }

    /// Double-precision word at a 1-based DAF address
    fn word(&self, address: usize) -> SkyResult<f64> {
        if address == 0 {
            return Err(SkyError::Ephemeris("DAF address 0 is invalid".to_string()));
        }
        self.f64_at((address - 1) * WORD_BYTES)
    }

    fn words(&self, first: usize, count: usize) -> SkyResult<Vec<f64>> {
        (first..first + count).map(|a| self.word(a)).collect()
    }
}

/// One Chebyshev position segment
#[derive(Debug, Clone)]
struct Segment {
    target: i32,
    center: i32,
    start_et: f64,
    end_et: f64,
    init: f64,
    interval: f64,
    record_len: usize,
    record_count: usize,
    /// 3 for type 2 (position), 6 for type 3 (position and velocity)
    components: usize,
    coefficients: Vec<f64>,
}

impl Segment {
    fn covers(&self, et: f64) -> bool {
        et >= self.start_et && et <= self.end_et
    }

    fn position(&self, et: f64) -> Vec3 {
        let index = ((et - self.init) / self.interval).floor().max(0.0) as usize;
        let index = index.min(self.record_count - 1);
        let record = &self.coefficients[index * self.record_len..(index + 1) * self.record_len];

        let (mid, radius) = (record[0], record[1]);
        let per_axis = (self.record_len - 2) / self.components;
        let s = (et - mid) / radius;

        let axis = |i: usize| chebyshev(&record[2 + i * per_axis..2 + (i + 1) * per_axis], s);
        Vec3::new(axis(0), axis(1), axis(2))
    }
}

/// Evaluate a Chebyshev series at `s` in [-1, 1] (Clenshaw recurrence)
fn chebyshev(coefficients: &[f64], s: f64) -> f64 {
    let Some((&first, rest)) = coefficients.split_first() else {
        return 0.0;
    };
    let (mut b1, mut b2) = (0.0, 0.0);
    for &c in rest.iter().rev() {
        let b0 = 2.0 * s * b1 - b2 + c;
        b2 = b1;
        b1 = b0;
    }
    first + s * b1 - b2
}

/// Ephemeris backed by an SPK kernel loaded fully into memory
pub struct SpkEphemeris {
    segments: Vec<Segment>,
}

impl SpkEphemeris {
    /// Load a kernel from disk; any failure is reported as DataUnavailable
    pub fn load(path: impl AsRef<Path>) -> SkyResult<Self> {
        let path = path.as_ref();
        tracing::info!("Loading ephemeris from: {}", path.display());

        let bytes = std::fs::read(path).map_err(|e| {
            SkyError::DataUnavailable(format!("cannot read ephemeris {}: {}", path.display(), e))
        })?;

        let ephemeris = Self::from_bytes(&bytes).map_err(|e| {
            SkyError::DataUnavailable(format!("invalid ephemeris {}: {}", path.display(), e))
        })?;

        tracing::debug!(
            "Ephemeris {} has {} segments",
            path.display(),
            ephemeris.segments.len()
        );
        Ok(ephemeris)
    }

    pub fn from_bytes(bytes: &[u8]) -> SkyResult<Self> {
        if bytes.len() < RECORD_BYTES {
            return Err(SkyError::Ephemeris("file shorter than one DAF record".to_string()));
        }

        let id_word = String::from_utf8_lossy(&bytes[0..8]);
        if !id_word.starts_with("DAF/SPK") && !id_word.starts_with("NAIF/DAF") {
            return Err(SkyError::Ephemeris(format!("not an SPK kernel: '{}'", id_word.trim())));
        }

        let order = match &bytes[88..96] {
            b"LTL-IEEE" => ByteOrder::Little,
            b"BIG-IEEE" => ByteOrder::Big,
            // Pre-format-tag kernels: ND is always 2, which settles the byte order
            _ if i32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) == 2 => ByteOrder::Little,
            _ => ByteOrder::Big,
        };
        let reader = DafReader { bytes, order };

        let nd = reader.i32_at(8)?;
        let ni = reader.i32_at(12)?;
        if nd != 2 || ni != 6 {
            return Err(SkyError::Ephemeris(format!(
                "unexpected summary format ND={} NI={}",
                nd, ni
            )));
        }
        let summary_words = nd as usize + (ni as usize + 1) / 2;

        let mut segments = Vec::new();
        let mut record = usize::try_from(reader.i32_at(76)?)
            .map_err(|_| SkyError::Ephemeris("negative summary record pointer".to_string()))?;
        let mut visited = 0;
        let max_records = bytes.len() / RECORD_BYTES;

        while record != 0 {
            visited += 1;
            if visited > max_records || record > max_records {
                return Err(SkyError::Ephemeris("summary record chain is corrupt".to_string()));
            }

            let base = (record - 1) * RECORD_BYTES;
            let next = reader.f64_at(base)? as usize;
            let count = reader.f64_at(base + 16)? as usize;

            for i in 0..count {
                let offset = base + 3 * WORD_BYTES + i * summary_words * WORD_BYTES;
                if let Some(segment) = Self::read_segment(&reader, offset)? {
                    segments.push(segment);
                }
            }
            record = next;
        }

        if segments.is_empty() {
            return Err(SkyError::Ephemeris("kernel contains no usable segments".to_string()));
        }

        Ok(Self { segments })
    }

    fn read_segment(reader: &DafReader<'_>, offset: usize) -> SkyResult<Option<Segment>> {
        let start_et = reader.f64_at(offset)?;
        let end_et = reader.f64_at(offset + 8)?;
        let int_at = |i: usize| reader.i32_at(offset + 16 + i * 4);
        let (target, center, frame, data_type) = (int_at(0)?, int_at(1)?, int_at(2)?, int_at(3)?);
        let address = |i: usize| -> SkyResult<usize> {
            usize::try_from(int_at(i)?)
                .map_err(|_| SkyError::Ephemeris(format!("negative address in segment for {}", target)))
        };
        let (begin, end) = (address(4)?, address(5)?);

        let components = match data_type {
            2 => 3,
            3 => 6,
            other => {
                tracing::debug!("Skipping SPK segment for {} with type {}", target, other);
                return Ok(None);
            }
        };
        if frame != FRAME_J2000 {
            tracing::debug!("Skipping SPK segment for {} in frame {}", target, frame);
            return Ok(None);
        }
        if end < begin + 3 {
            return Err(SkyError::Ephemeris(format!("segment for {} is too short", target)));
        }

        let init = reader.word(end - 3)?;
        let interval = reader.word(end - 2)?;
        let record_len = reader.word(end - 1)? as usize;
        let record_count = reader.word(end)? as usize;

        if record_len <= 2 || (record_len - 2) % components != 0 || record_count == 0 || interval <= 0.0 {
            return Err(SkyError::Ephemeris(format!(
                "segment for {} has malformed directory (rsize={}, n={})",
                target, record_len, record_count
            )));
        }
        let word_count = record_len
            .checked_mul(record_count)
            .filter(|count| begin.checked_add(*count).is_some_and(|last| last <= end - 3))
            .ok_or_else(|| {
                SkyError::Ephemeris(format!("segment for {} overruns its address range", target))
            })?;

        let coefficients = reader.words(begin, word_count)?;

        Ok(Some(Segment {
            target,
            center,
            start_et,
            end_et,
            init,
            interval,
            record_len,
            record_count,
            components,
            coefficients,
        }))
    }

    /// Distinct target codes in kernel order
    pub fn targets(&self) -> Vec<i32> {
        let mut targets = Vec::new();
        for segment in &self.segments {
            if !targets.contains(&segment.target) {
                targets.push(segment.target);
            }
        }
        targets
    }

    /// Position relative to the solar-system barycenter, km, J2000 frame
    pub fn barycentric_position(&self, target: i32, et: f64) -> SkyResult<Vec3> {
        let mut position = Vec3::zeros();
        let mut body = target;

        for _ in 0..MAX_CHAIN_DEPTH {
            if body == SOLAR_SYSTEM_BARYCENTER {
                return Ok(position);
            }
            // Later segments take precedence over earlier ones
            let segment = self
                .segments
                .iter()
                .rev()
                .find(|s| s.target == body && s.covers(et))
                .ok_or_else(|| {
                    SkyError::lookup(
                        naif_name(body),
                        format!("no segment covers ET {:.1}", et),
                    )
                })?;
            position += segment.position(et);
            body = segment.center;
        }

        Err(SkyError::lookup(naif_name(target), "center chain too deep"))
    }

    /// Light-time corrected geocentric position, km, J2000 frame
    pub fn geocentric_position(&self, target: i32, epoch: &Epoch) -> SkyResult<Vec3> {
        let et = epoch.et_seconds();
        let earth = self.barycentric_position(EARTH, et)?;

        let mut light_time = 0.0;
        let mut geocentric = Vec3::zeros();
        for _ in 0..LIGHT_TIME_ITERATIONS {
            let body = self.barycentric_position(target, et - light_time)?;
            geocentric = body - earth;
            light_time = geocentric.norm() / SPEED_OF_LIGHT_KM_S;
        }
        Ok(geocentric)
    }
}

impl EphemerisProvider for SpkEphemeris {
    fn body_names(&self) -> Vec<String> {
        self.targets().into_iter().map(naif_name).collect()
    }

    fn observe(&self, body: &str, observer: &Observer, epoch: &Epoch) -> SkyResult<HorizontalPosition> {
        let code = naif_code(body).ok_or_else(|| SkyError::lookup(body, "unknown body name"))?;
        let geocentric = self.geocentric_position(code, epoch)?;
        Ok(topocentric_horizontal(geocentric, observer, epoch))
    }
}

// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Mapping from keys to the sample identifiers stored on the trigger device.
//!
//! A sample is addressed by three fields: the voice (sample bank), the row and
//! the column of the key. The device only understands a track number, so the
//! fields are packed into one decimal number according to an [`IdEncoding`].
//!
//! [`IdEncoding::FixedWidth`] always uses one digit for the voice, one for the
//! row and two for the column, so track `1203` is voice 1, row 2, column 3 and
//! every track can be split back into its fields by position.
//!
//! [`IdEncoding::Concatenated`] writes the fields next to each other without
//! padding. Voice 1, row 2, column 3 becomes `123` while column 10 becomes
//! `1210`, so the digit layout depends on the column. Within this keyboard the
//! numbers are still distinct, but a track number alone does not say where the
//! column starts, and the SD card must be named with the exact same scheme.

use std::fmt;

use serde::Deserialize;

use crate::matrix::{Key, COLS, ROWS};

// The fixed-width layout reserves one digit for the row and two for the column.
const _: () = assert!(ROWS <= 10 && COLS <= 100);

/// The highest valid MIDI note number.
const MAX_NOTE: u8 = 127;

/// Note names used when printing the sample catalog.
const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum KeymapError {
    #[error("Voice {0} is out of range (expected 1-3)")]
    Voice(u8),
    #[error("Row {0} does not fit the sample id layout (maximum 9)")]
    Row(usize),
    #[error("Column {0} does not fit the sample id layout (maximum 99)")]
    Column(usize),
    #[error("Track {0} is not a fixed width sample id")]
    Track(u16),
    #[error("Base note {0} leaves keys above the MIDI note range")]
    BaseNote(u8),
}

/// A sample bank, chosen with the 3-position voice switch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Voice {
    One = 1,
    Two = 2,
    Three = 3,
}

impl Voice {
    /// Every voice, in switch order.
    pub const ALL: [Voice; 3] = [Voice::One, Voice::Two, Voice::Three];

    /// The voice digit used in sample identifiers.
    pub fn number(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Voice {
    type Error = KeymapError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Voice::One),
            2 => Ok(Voice::Two),
            3 => Ok(Voice::Three),
            _ => Err(KeymapError::Voice(value)),
        }
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// How the fields of a sample id are packed into a track number.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IdEncoding {
    /// Voice, row and a zero-padded two digit column: `voice*1000 + row*100 + col`.
    #[default]
    FixedWidth,
    /// The unpadded decimal digits of voice, row and column written one after another.
    Concatenated,
}

impl IdEncoding {
    /// Returns the place value of the voice digit and the row/column part of the track.
    fn layout(self, row: u8, col: u8) -> (u16, u16) {
        let (row, col) = (u16::from(row), u16::from(col));
        match self {
            IdEncoding::FixedWidth => (1000, row * 100 + col),
            IdEncoding::Concatenated => {
                let col_place = if col >= 10 { 100 } else { 10 };
                (col_place * 10, row * col_place + col)
            }
        }
    }
}

/// The address of one pre-recorded sample: voice, row and column, plus the
/// track number those fields encode to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleId {
    voice: Voice,
    row: u8,
    col: u8,
    track: u16,
}

impl SampleId {
    /// Builds a sample id, validating that the fields fit the id layout.
    pub fn new(
        encoding: IdEncoding,
        voice: Voice,
        row: usize,
        col: usize,
    ) -> Result<SampleId, KeymapError> {
        let row = u8::try_from(row)
            .ok()
            .filter(|row| *row <= 9)
            .ok_or(KeymapError::Row(row))?;
        let col = u8::try_from(col)
            .ok()
            .filter(|col| *col <= 99)
            .ok_or(KeymapError::Column(col))?;
        let (place, base) = encoding.layout(row, col);
        Ok(SampleId {
            voice,
            row,
            col,
            track: u16::from(voice.number()) * place + base,
        })
    }

    /// Splits a fixed width track number back into its fields.
    pub fn decode(track: u16) -> Result<SampleId, KeymapError> {
        let voice = u8::try_from(track / 1000)
            .map_err(|_| KeymapError::Track(track))
            .and_then(|voice| Voice::try_from(voice).map_err(|_| KeymapError::Track(track)))?;
        SampleId::new(
            IdEncoding::FixedWidth,
            voice,
            usize::from(track % 1000 / 100),
            usize::from(track % 100),
        )
    }

    /// The voice field.
    pub fn voice(&self) -> Voice {
        self.voice
    }

    /// The row field.
    pub fn row(&self) -> usize {
        usize::from(self.row)
    }

    /// The column field.
    pub fn col(&self) -> usize {
        usize::from(self.col)
    }

    /// The track number sent to the device.
    pub fn track(&self) -> u16 {
        self.track
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (voice {}, row {}, col {})",
            self.track, self.voice, self.row, self.col
        )
    }
}

/// Precomputed addressing data for a single key.
#[derive(Clone, Copy, Debug, Default)]
struct Cell {
    note: u8,
    place: u16,
    base: u16,
}

/// One line of the sample catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    pub key: Key,
    pub note: u8,
    pub id: SampleId,
}

/// Resolves keys to sample ids. The per-key part of every id is computed once
/// up front; the voice digit is combined in when a key is resolved.
pub struct KeyIdMapper {
    encoding: IdEncoding,
    cells: [[Cell; COLS]; ROWS],
}

impl KeyIdMapper {
    /// Builds the key table. Keys are numbered in scan order with increasing
    /// note numbers, starting at `base_note`.
    pub fn new(encoding: IdEncoding, base_note: u8) -> Result<KeyIdMapper, KeymapError> {
        if usize::from(base_note) + ROWS * COLS - 1 > usize::from(MAX_NOTE) {
            return Err(KeymapError::BaseNote(base_note));
        }

        let mut cells = [[Cell::default(); COLS]; ROWS];
        for (note, key) in (base_note..).zip(Key::all()) {
            let (place, base) = encoding.layout(key.row() as u8, key.col() as u8);
            cells[key.row()][key.col()] = Cell { note, place, base };
        }

        Ok(KeyIdMapper { encoding, cells })
    }

    /// The encoding used for track numbers.
    pub fn encoding(&self) -> IdEncoding {
        self.encoding
    }

    /// Resolves the sample id for a key under the given voice.
    pub fn resolve(&self, voice: Voice, key: Key) -> SampleId {
        let cell = &self.cells[key.row()][key.col()];
        SampleId {
            voice,
            row: key.row() as u8,
            col: key.col() as u8,
            track: u16::from(voice.number()) * cell.place + cell.base,
        }
    }

    /// The note number assigned to a key.
    pub fn note(&self, key: Key) -> u8 {
        self.cells[key.row()][key.col()].note
    }

    /// Every key with its note and sample id for the voice, in scan order.
    pub fn catalog(&self, voice: Voice) -> Vec<CatalogEntry> {
        Key::all()
            .map(|key| CatalogEntry {
                key,
                note: self.note(key),
                id: self.resolve(voice, key),
            })
            .collect()
    }
}

/// Returns the name of a MIDI note, e.g. `G1` for note 31.
pub fn note_name(note: u8) -> String {
    let octave = i16::from(note / 12) - 1;
    format!("{}{}", NOTE_NAMES[usize::from(note % 12)], octave)
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use crate::matrix::Key;

    use super::*;

    #[test]
    fn test_voice_numbers() {
        assert_eq!(Ok(Voice::Two), Voice::try_from(2));
        assert_eq!(Err(KeymapError::Voice(0)), Voice::try_from(0));
        assert_eq!(Err(KeymapError::Voice(4)), Voice::try_from(4));
        assert_eq!(3, Voice::Three.number());
    }

    #[test]
    fn test_fixed_width_resolve() {
        let mapper = KeyIdMapper::new(IdEncoding::FixedWidth, 31).unwrap();
        let id = mapper.resolve(Voice::One, Key::new(2, 3).unwrap());
        assert_eq!(1203, id.track());
        assert_eq!((Voice::One, 2, 3), (id.voice(), id.row(), id.col()));

        let id = mapper.resolve(Voice::Three, Key::new(5, 10).unwrap());
        assert_eq!(3510, id.track());
        assert_eq!(
            mapper.resolve(Voice::Three, Key::new(5, 10).unwrap()),
            id,
            "resolve should be deterministic"
        );
    }

    #[test]
    fn test_concatenated_resolve() {
        let mapper = KeyIdMapper::new(IdEncoding::Concatenated, 31).unwrap();
        assert_eq!(
            123,
            mapper.resolve(Voice::One, Key::new(2, 3).unwrap()).track()
        );
        assert_eq!(
            203,
            mapper.resolve(Voice::Two, Key::new(0, 3).unwrap()).track()
        );
        assert_eq!(
            1210,
            mapper.resolve(Voice::One, Key::new(2, 10).unwrap()).track()
        );
    }

    #[test]
    fn test_concatenated_matches_decimal_digits() {
        let mapper = KeyIdMapper::new(IdEncoding::Concatenated, 31).unwrap();
        for voice in Voice::ALL {
            for key in Key::all() {
                let digits = format!("{}{}{}", voice.number(), key.row(), key.col());
                assert_eq!(
                    digits.parse::<u16>().unwrap(),
                    mapper.resolve(voice, key).track()
                );
            }
        }
    }

    #[test]
    fn test_injective_over_geometry() {
        for encoding in [IdEncoding::FixedWidth, IdEncoding::Concatenated] {
            let mapper = KeyIdMapper::new(encoding, 31).unwrap();
            let tracks: HashSet<u16> = Voice::ALL
                .into_iter()
                .flat_map(|voice| Key::all().map(move |key| (voice, key)))
                .map(|(voice, key)| mapper.resolve(voice, key).track())
                .collect();
            assert_eq!(3 * 6 * 11, tracks.len(), "{:?} should be injective", encoding);
        }
    }

    #[test]
    fn test_concatenated_layout_depends_on_column_width() {
        let mapper = KeyIdMapper::new(IdEncoding::Concatenated, 31).unwrap();
        let short = mapper.resolve(Voice::One, Key::new(2, 1).unwrap());
        let long = mapper.resolve(Voice::One, Key::new(2, 10).unwrap());

        // 121 and 1210 share their leading digits; only the digit count tells
        // the single digit column apart from the two digit one.
        assert_eq!(121, short.track());
        assert_eq!(1210, long.track());
        assert_eq!(long.track() / 10, short.track());

        // Splitting by the fixed width layout misreads concatenated ids.
        assert_eq!(Err(KeymapError::Track(121)), SampleId::decode(short.track()));
        // Two digit columns happen to line up with the fixed width layout.
        assert_eq!(10, SampleId::decode(long.track()).unwrap().col());

        // With more than ten rows the scheme would collide outright:
        // row 1 col 11 and row 11 col 1 both read "1111" under voice 1.
        assert_eq!(
            format!("{}{}{}", 1, 1, 11),
            format!("{}{}{}", 1, 11, 1)
        );
    }

    #[test]
    fn test_fixed_width_decode() {
        let mapper = KeyIdMapper::new(IdEncoding::FixedWidth, 31).unwrap();
        for voice in Voice::ALL {
            for key in Key::all() {
                let id = mapper.resolve(voice, key);
                assert_eq!(Ok(id), SampleId::decode(id.track()));
            }
        }
        assert_eq!(Err(KeymapError::Track(4000)), SampleId::decode(4000));
    }

    #[test]
    fn test_sample_id_validation() {
        assert_eq!(
            Err(KeymapError::Row(10)),
            SampleId::new(IdEncoding::FixedWidth, Voice::One, 10, 0)
        );
        assert_eq!(
            Err(KeymapError::Column(100)),
            SampleId::new(IdEncoding::FixedWidth, Voice::One, 0, 100)
        );
        assert_eq!(
            2999,
            SampleId::new(IdEncoding::FixedWidth, Voice::Two, 9, 99)
                .unwrap()
                .track()
        );
    }

    #[test]
    fn test_notes_follow_scan_order() {
        let mapper = KeyIdMapper::new(IdEncoding::FixedWidth, 31).unwrap();
        assert_eq!(31, mapper.note(Key::new(0, 0).unwrap()));
        assert_eq!(36, mapper.note(Key::new(5, 0).unwrap()));
        assert_eq!(37, mapper.note(Key::new(0, 1).unwrap()));
        assert_eq!(96, mapper.note(Key::new(5, 10).unwrap()));

        assert!(KeyIdMapper::new(IdEncoding::FixedWidth, 62).is_ok());
        assert_eq!(
            Err(KeymapError::BaseNote(63)),
            KeyIdMapper::new(IdEncoding::FixedWidth, 63).map(|_| ())
        );
    }

    #[test]
    fn test_catalog() {
        let mapper = KeyIdMapper::new(IdEncoding::FixedWidth, 31).unwrap();
        let catalog = mapper.catalog(Voice::Two);
        assert_eq!(66, catalog.len());
        assert_eq!(Key::new(0, 0).unwrap(), catalog[0].key);
        assert_eq!(31, catalog[0].note);
        assert_eq!(2000, catalog[0].id.track());
        assert_eq!(2510, catalog[65].id.track());
    }

    #[test]
    fn test_note_names() {
        assert_eq!("G1", note_name(31));
        assert_eq!("C4", note_name(60));
        assert_eq!("C-1", note_name(0));
        assert_eq!("C7", note_name(96));
    }
}

//! Scale quantization.
//!
//! Inbound notes are folded onto a scale by mapping the white-key position
//! of their pitch class to a scale degree. Black keys map down to the white
//! key below them, so a keyboard player gets the scale under the white keys
//! regardless of root.

/// Scale selection. `Off` passes notes through untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Scale {
    #[default]
    Off,
    Ionian,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Aeolian,
    Locrian,
    HarmonicMinor,
    MelodicMinor,
    MajorPentatonic,
    MinorPentatonic,
}

impl Scale {
    /// Map a scale-type parameter value. Out-of-range values read as Off.
    pub fn from_param(value: i16) -> Scale {
        match value {
            1 => Scale::Ionian,
            2 => Scale::Dorian,
            3 => Scale::Phrygian,
            4 => Scale::Lydian,
            5 => Scale::Mixolydian,
            6 => Scale::Aeolian,
            7 => Scale::Locrian,
            8 => Scale::HarmonicMinor,
            9 => Scale::MelodicMinor,
            10 => Scale::MajorPentatonic,
            11 => Scale::MinorPentatonic,
            _ => Scale::Off,
        }
    }

    /// Semitone offsets from the root, one per scale degree.
    fn intervals(self) -> &'static [i32] {
        match self {
            Scale::Off => &[],
            Scale::Ionian => &[0, 2, 4, 5, 7, 9, 11],
            Scale::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            Scale::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
            Scale::Lydian => &[0, 2, 4, 6, 7, 9, 11],
            Scale::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            Scale::Aeolian => &[0, 2, 3, 5, 7, 8, 10],
            Scale::Locrian => &[0, 1, 3, 5, 6, 8, 10],
            Scale::HarmonicMinor => &[0, 2, 3, 5, 7, 8, 11],
            Scale::MelodicMinor => &[0, 2, 3, 5, 7, 9, 11],
            Scale::MajorPentatonic => &[0, 2, 4, 7, 9],
            Scale::MinorPentatonic => &[0, 3, 5, 7, 10],
        }
    }
}

/// Pitch class (0-11) to white key index (0-6).
/// C=0, C#->0, D=1, D#->1, E=2, F=3, F#->3, G=4, G#->4, A=5, A#->5, B=6
const PC_TO_WHITE_KEY: [i32; 12] = [0, 0, 1, 1, 2, 3, 3, 4, 4, 5, 5, 6];

/// Quantize a MIDI note to `root` + `scale`.
///
/// White key positions map to scale degrees, wrapping an octave up for
/// pentatonic scales (7 white keys onto 5 degrees). Returns the note
/// unchanged when the scale is Off.
pub fn quantize_to_scale(note: u8, root: i16, scale: Scale) -> u8 {
    let intervals = scale.intervals();
    if intervals.is_empty() {
        return note;
    }
    let size = intervals.len() as i32;

    let pc = (note % 12) as usize;
    let octave = (note / 12) as i32;
    let white_key = PC_TO_WHITE_KEY[pc];

    let extra_octave = white_key / size;
    let degree = (white_key % size) as usize;

    let out = (octave + extra_octave) * 12 + root as i32 + intervals[degree];
    out.clamp(0, 127) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_is_identity() {
        for n in 0..=127u8 {
            assert_eq!(quantize_to_scale(n, 5, Scale::Off), n);
        }
    }

    #[test]
    fn c_major_folds_black_keys_down() {
        // C4 octave, root C: C C# D D# E F F# G G# A A# B
        let expected = [60, 60, 62, 62, 64, 65, 65, 67, 67, 69, 69, 71];
        for (pc, want) in expected.iter().enumerate() {
            assert_eq!(quantize_to_scale(60 + pc as u8, 0, Scale::Ionian), *want);
        }
    }

    #[test]
    fn pentatonic_wraps_high_degrees_up_an_octave() {
        // Major pentatonic has 5 degrees; white keys A (idx 5) and B (idx 6)
        // land on degrees 0 and 1 an octave up.
        assert_eq!(quantize_to_scale(69, 0, Scale::MajorPentatonic), 72); // A4 -> C5
        assert_eq!(quantize_to_scale(71, 0, Scale::MajorPentatonic), 74); // B4 -> D5
        // First five white keys map straight through the degree table.
        assert_eq!(quantize_to_scale(60, 0, Scale::MajorPentatonic), 60); // C -> degree 0
        assert_eq!(quantize_to_scale(67, 0, Scale::MajorPentatonic), 69); // G -> degree 4 (A)
    }

    #[test]
    fn nonzero_root_transposes() {
        // Root D (2), Aeolian: C4 is white key 0 -> degree 0 -> D4.
        assert_eq!(quantize_to_scale(60, 2, Scale::Aeolian), 62);
    }

    #[test]
    fn output_clamped_to_midi_range() {
        assert_eq!(quantize_to_scale(127, 11, Scale::Lydian), 127);
    }

    #[test]
    fn out_of_range_param_reads_as_off() {
        assert_eq!(Scale::from_param(99), Scale::Off);
        assert_eq!(Scale::from_param(-3), Scale::Off);
    }
}

//! Note names in scientific pitch notation

/// Note names within an octave, using flats for accidentals
pub const NOTES: [&str; 12] = ["C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B"];

/// Octaves that sample sets cover
pub const OCTAVES: [u8; 8] = [0, 1, 2, 3, 4, 5, 6, 7];

/// Notes of octave 0 that have samples (the bottom of a piano keyboard)
const OCTAVE_ZERO: [&str; 3] = ["A0", "Bb0", "B0"];

/// Generate every pitch of the given octaves, in octave order
///
/// Duplicate octaves are ignored and an empty slice means all of
/// [`OCTAVES`]. Octave 0 only contributes A0, Bb0 and B0; octaves above 7
/// contribute nothing.
pub fn generate_pitch_list(octaves: &[u8]) -> Vec<String> {
    let octaves = if octaves.is_empty() { &OCTAVES[..] } else { octaves };

    let mut seen = Vec::with_capacity(octaves.len());
    let mut pitches = Vec::new();
    for &octave in octaves {
        if seen.contains(&octave) {
            continue;
        }
        seen.push(octave);

        match octave {
            0 => pitches.extend(OCTAVE_ZERO.iter().map(ToString::to_string)),
            1..=7 => pitches.extend(NOTES.iter().map(|note| format!("{note}{octave}"))),
            _ => {}
        }
    }
    pitches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_octave() {
        let pitches = generate_pitch_list(&[4]);
        assert_eq!(pitches.len(), 12);
        assert_eq!(pitches.first().map(String::as_str), Some("C4"));
        assert_eq!(pitches.last().map(String::as_str), Some("B4"));
    }

    #[test]
    fn test_octave_zero_and_duplicates() {
        let pitches = generate_pitch_list(&[0, 1, 0, 9]);
        assert_eq!(&pitches[..3], &["A0", "Bb0", "B0"]);
        assert_eq!(pitches.len(), 3 + 12);
    }

    #[test]
    fn test_all_octaves() {
        let pitches = generate_pitch_list(&[]);
        assert_eq!(pitches.len(), 3 + 7 * 12);
        assert!(pitches.contains(&"Gb7".to_string()));
    }
}

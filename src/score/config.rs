//! Score loading — instruments and tracks from a YAML file.

use std::fmt;
use std::path::Path;

use super::Score;

/// An error loading a score file.
#[derive(Debug)]
pub enum ConfigError {
    /// The file could not be read.
    Io(std::io::Error),
    /// The file is not valid score YAML.
    Parse(serde_yaml::Error),
    /// A track's tempo is zero. Tempo must be positive, or every note
    /// duration degenerates to infinity.
    InvalidTempo { track: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "failed to read score file: {e}"),
            ConfigError::Parse(e) => write!(f, "failed to parse score file: {e}"),
            ConfigError::InvalidTempo { track } => {
                write!(f, "track '{track}' has a zero tempo")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::InvalidTempo { .. } => None,
        }
    }
}

impl Score {
    /// Parse a score from YAML text. Every track must carry a positive
    /// tempo.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let score: Score = serde_yaml::from_str(yaml).map_err(ConfigError::Parse)?;

        if let Some(track) = score
            .tracks
            .iter()
            .find_map(|(name, track)| (track.bpm == 0).then(|| name.clone()))
        {
            return Err(ConfigError::InvalidTempo { track });
        }

        Ok(score)
    }

    /// Load a score from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_yaml(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Waveform;
    use std::io::Write;

    const SAMPLE: &str = r#"
instruments:
  PIA:
    waveform: square
    gain: 0.6
  BAS:
    waveform: sawtooth
    pan: -0.4
tracks:
  intro:
    bpm: 120
    parts:
      - PIAC404D#48
      - BASA24X24
"#;

    #[test]
    fn parses_instruments_and_tracks() {
        let score = Score::from_yaml(SAMPLE).unwrap();

        let pia = score.instrument("PIA").unwrap();
        assert_eq!(pia.waveform, Waveform::Square);
        assert_eq!(pia.gain, Some(0.6));
        assert_eq!(pia.pan, None);

        let bas = score.instrument("BAS").unwrap();
        assert_eq!(bas.waveform, Waveform::Sawtooth);
        assert_eq!(bas.pan, Some(-0.4));

        let track = score.track("intro").unwrap();
        assert_eq!(track.bpm, 120);
        assert_eq!(track.parts.len(), 2);
    }

    #[test]
    fn empty_sections_default() {
        let score = Score::from_yaml("{}").unwrap();
        assert!(score.instruments.is_empty());
        assert!(score.tracks.is_empty());
    }

    #[test]
    fn round_trip() {
        let score = Score::from_yaml(SAMPLE).unwrap();
        let yaml = serde_yaml::to_string(&score).unwrap();
        let parsed = Score::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, score);
    }

    #[test]
    fn invalid_waveform_rejected() {
        let yaml = "instruments:\n  PIA:\n    waveform: theremin\n";
        assert!(matches!(
            Score::from_yaml(yaml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn zero_tempo_rejected() {
        let yaml = "tracks:\n  broken:\n    bpm: 0\n    parts: []\n";
        match Score::from_yaml(yaml) {
            Err(ConfigError::InvalidTempo { track }) => assert_eq!(track, "broken"),
            other => panic!("expected InvalidTempo, got {other:?}"),
        }
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let score = Score::load(file.path()).unwrap();
        assert!(score.instrument("PIA").is_some());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = Score::load("/nonexistent/score.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

use serde::{Deserialize, Serialize};

/// Background loops the visualization can play. Closed set: the model must
/// pick one of these ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioTrack {
    OrbitalDriftAmbient,
    SignalGlassGlitch,
    NeonOrbitSynthwave,
    GoldenLaunchChillhop,
    QuietGravityPiano,
    #[default]
    GravityWavesDowntempo,
}

impl AudioTrack {
    pub const ALL: [AudioTrack; 6] = [
        AudioTrack::OrbitalDriftAmbient,
        AudioTrack::SignalGlassGlitch,
        AudioTrack::NeonOrbitSynthwave,
        AudioTrack::GoldenLaunchChillhop,
        AudioTrack::QuietGravityPiano,
        AudioTrack::GravityWavesDowntempo,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            AudioTrack::OrbitalDriftAmbient => "orbital_drift_ambient",
            AudioTrack::SignalGlassGlitch => "signal_glass_glitch",
            AudioTrack::NeonOrbitSynthwave => "neon_orbit_synthwave",
            AudioTrack::GoldenLaunchChillhop => "golden_launch_chillhop",
            AudioTrack::QuietGravityPiano => "quiet_gravity_piano",
            AudioTrack::GravityWavesDowntempo => "gravity_waves_downtempo",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AudioTrack::OrbitalDriftAmbient => "Orbital Drift (Ambient)",
            AudioTrack::SignalGlassGlitch => "Signal Glass (Glitch Minimal)",
            AudioTrack::NeonOrbitSynthwave => "Neon Orbit (Modern Synthwave)",
            AudioTrack::GoldenLaunchChillhop => "Golden Launch (Chillhop)",
            AudioTrack::QuietGravityPiano => "Quiet Gravity (Cinematic Piano)",
            AudioTrack::GravityWavesDowntempo => "Gravity Waves (Downtempo)",
        }
    }

    /// One-line mood shown to the model when it picks a track.
    pub fn mood(&self) -> &'static str {
        match self {
            AudioTrack::OrbitalDriftAmbient => "ambient, reflective, human",
            AudioTrack::SignalGlassGlitch => "minimal electronic, telemetry and data",
            AudioTrack::NeonOrbitSynthwave => "modern synthwave, creative tech",
            AudioTrack::GoldenLaunchChillhop => "warm chillhop, optimistic, communicative",
            AudioTrack::QuietGravityPiano => "cinematic piano, introspective leadership",
            AudioTrack::GravityWavesDowntempo => "neutral downtempo fallback",
        }
    }

    /// Static asset path served by the frontend.
    pub fn file(&self) -> String {
        format!("/audio/{}.mp3", self.id())
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.id() == id)
    }
}

/// Catalog entry for the player.
#[derive(Debug, Clone, Serialize)]
pub struct TrackInfo {
    pub id: &'static str,
    pub title: &'static str,
    pub file: String,
}

pub fn catalog() -> Vec<TrackInfo> {
    AudioTrack::ALL
        .iter()
        .map(|t| TrackInfo {
            id: t.id(),
            title: t.title(),
            file: t.file(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_roundtrip_through_serde() {
        for track in AudioTrack::ALL {
            let json = serde_json::to_string(&track).unwrap();
            assert_eq!(json, format!("\"{}\"", track.id()));
            assert_eq!(AudioTrack::from_id(track.id()), Some(track));
        }
    }

    #[test]
    fn test_unknown_id() {
        assert_eq!(AudioTrack::from_id("lofi_beats"), None);
    }

    #[test]
    fn test_default_and_file() {
        assert_eq!(AudioTrack::default(), AudioTrack::GravityWavesDowntempo);
        assert_eq!(
            AudioTrack::default().file(),
            "/audio/gravity_waves_downtempo.mp3"
        );
    }

    #[test]
    fn test_catalog_lists_every_track_once() {
        let tracks = catalog();
        assert_eq!(tracks.len(), AudioTrack::ALL.len());
        assert_eq!(tracks[0].title, "Orbital Drift (Ambient)");
        assert_eq!(tracks[5].file, "/audio/gravity_waves_downtempo.mp3");
    }
}

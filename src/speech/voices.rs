/// Voice picked when the configuration does not name one
pub const DEFAULT_VOICE: &str = "en-US-RogerNeural - en-US (Male)";

/// Neural voices the speech-synthesis endpoint accepts
const VOICES: &[&str] = &[
    "en-CA-ClaraNeural - en-CA (Female)",
    "en-US-AndrewMultilingualNeural - en-US (Male)",
    "en-US-BrianNeural - en-US (Male)",
    "en-GB-LibbyNeural - en-GB (Female)",
    "en-US-RogerNeural - en-US (Male)",
    "en-US-MichelleNeural - en-US (Female)",
    "en-US-GuyNeural - en-US (Male)",
    "en-US-BrianMultilingualNeural - en-US (Male)",
    "en-US-SteffanNeural - en-US (Male)",
    "en-US-AvaNeural - en-US (Female)",
    "en-GB-ThomasNeural - en-GB (Male)",
    "en-US-EmmaNeural - en-US (Female)",
    "en-GB-MaisieNeural - en-GB (Female)",
    "en-CA-LiamNeural - en-CA (Male)",
    "en-GB-SoniaNeural - en-GB (Female)",
    "en-AU-WilliamNeural - en-AU (Male)",
    "en-US-EmmaMultilingualNeural - en-US (Female)",
    "en-US-AriaNeural - en-US (Female)",
    "en-US-AndrewNeural - en-US (Male)",
    "en-GB-RyanNeural - en-GB (Male)",
    "en-US-AnaNeural - en-US (Female)",
    "en-US-ChristopherNeural - en-US (Male)",
    "en-US-JennyNeural - en-US (Female)",
    "en-AU-NatashaNeural - en-AU (Female)",
    "en-US-EricNeural - en-US (Male)",
    "en-US-AvaMultilingualNeural - en-US (Female)",
];

pub fn all() -> &'static [&'static str] {
    VOICES
}

pub fn is_known(voice: &str) -> bool {
    VOICES.contains(&voice)
}

//! Capture grant adapters
//!
//! Linux capture: the display through X11 and the microphone through
//! PulseAudio. Both describe ffmpeg inputs rather than opening devices
//! themselves.

mod pulse;
mod x11;

pub use pulse::PulseMicrophoneGrant;
pub use x11::X11DisplayGrant;

//! Shared constants for the e2e test suite.

pub const REQUEST_TIMEOUT_SECS: u64 = 10;

pub const ARTIST_RAMBLERS: &str = "The Ramblers";
pub const ARTIST_SYNTH_QUEEN: &str = "Synth Queen";
pub const ARTIST_SANTA: &str = "Santa Croon";

pub const TRACK_DUSTY_ROAD: &str = "Dusty Road";
pub const TRACK_NEON_NIGHTS: &str = "Neon Nights";
pub const TRACK_SLEIGH_RUN: &str = "Sleigh Run";
pub const TRACK_BACK_PORCH: &str = "Back Porch";

//! External data clients

pub mod statcast;


pub use statcast::{parse_statcast_csv, FetchCache, RawPitch, RawPitchTable, StatcastClient};

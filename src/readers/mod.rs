pub mod city_reader;
pub mod concurrent_reader;
pub mod observation_reader;

pub use city_reader::CityReader;
pub use concurrent_reader::{ConcurrentReader, InputData};
pub use observation_reader::ObservationReader;

pub mod embed;
pub mod voice;

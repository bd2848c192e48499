use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://pixabay.com/api/";
pub const DEFAULT_OUTPUT_DIR: &str = "pixabay";
pub const DEFAULT_PER_PAGE: u8 = 40;
/// Pause between download attempts in milliseconds
pub const DEFAULT_PAUSE_MS: u64 = 50;

/// A color tag understood by the search endpoint. The service also knows
/// `grayscale` and `transparent`, which are left out of the default palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Orange,
    Yellow,
    Green,
    Turquoise,
    Blue,
    Lilac,
    Pink,
    White,
    Gray,
    Black,
    Brown,
}

impl Color {
    /// The default palette, searched in this exact order.
    pub const PALETTE: [Color; 12] = [
        Color::Red,
        Color::Orange,
        Color::Yellow,
        Color::Green,
        Color::Turquoise,
        Color::Blue,
        Color::Lilac,
        Color::Pink,
        Color::White,
        Color::Gray,
        Color::Black,
        Color::Brown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Orange => "orange",
            Color::Yellow => "yellow",
            Color::Green => "green",
            Color::Turquoise => "turquoise",
            Color::Blue => "blue",
            Color::Lilac => "lilac",
            Color::Pink => "pink",
            Color::White => "white",
            Color::Gray => "gray",
            Color::Black => "black",
            Color::Brown => "brown",
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything a fetch run needs, threaded through explicitly so tests can
/// substitute the endpoint, directory and palette.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub api_key: String,
    pub endpoint: Url,
    pub output_dir: PathBuf,
    pub per_page: u8,
    pub colors: Vec<Color>,
    pub pause: Duration,
}

impl FetchConfig {
    pub fn new(api_key: String) -> Self {
        FetchConfig {
            api_key,
            endpoint: Url::parse(DEFAULT_ENDPOINT).unwrap(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            per_page: DEFAULT_PER_PAGE,
            colors: Color::PALETTE.to_vec(),
            pause: Duration::from_millis(DEFAULT_PAUSE_MS),
        }
    }
}

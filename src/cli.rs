use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Video file to read frames from (defaults to the camera when absent)
    #[arg(long, env = "COLORBAND_INPUT")]
    pub input: Option<PathBuf>,

    /// Camera index used when no input file is given
    #[arg(long, default_value_t = 0)]
    pub camera: i32,

    /// JSON config file; overrides the individual parameter flags
    #[arg(long, env = "COLORBAND_CONFIG")]
    pub config: Option<PathBuf>,

    /// Processing loop rate in ticks per second
    #[arg(long, default_value_t = 100.0)]
    pub publish_rate: f64,

    /// Lower HSV threshold, e.g. --lower-color-boundary 110,100,100
    #[arg(long, value_delimiter = ',')]
    pub lower_color_boundary: Option<Vec<u8>>,

    /// Upper HSV threshold, e.g. --upper-color-boundary 130,255,255
    #[arg(long, value_delimiter = ',')]
    pub upper_color_boundary: Option<Vec<u8>>,

    /// BGR color for annotation boxes
    #[arg(long, value_delimiter = ',', default_values_t = vec![0u8, 255, 0])]
    pub box_color: Vec<u8>,

    /// Publish annotated copies on the visualization channel
    #[arg(long, default_value_t = false)]
    pub visualization: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

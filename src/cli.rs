use std::time::Duration;

use clap::builder::styling::AnsiColor;
use clap::builder::Styles;
use clap::Parser;

use porter_client::output::OutputFormat;
use porter_client::{ClientConfig, DEFAULT_ENDPOINT};

const fn extra_build_info() -> &'static str {
    match option_env!("CARGO_BUILD_DESC") {
        Some(e) => e,
        None => env!("CARGO_PKG_VERSION"),
    }
}
pub const VERSION: &str = extra_build_info();
const INFO_STRING: &str = "
🧬 porter version ";
const AFTER_STRING: &str = "
   ──────────────────────────────────
   secondary structure and solvent accessibility
   from the Porter/PaleAle 4.0 server";

// colouring of the help
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().bold())
    .usage(AnsiColor::BrightMagenta.on_default().bold())
    .literal(AnsiColor::BrightMagenta.on_default())
    .placeholder(AnsiColor::White.on_default());

#[derive(Parser)]
#[command(
    version = VERSION,
    about = format!("{}{}{}", INFO_STRING, VERSION, AFTER_STRING),
    arg_required_else_help = true,
    styles = STYLES
)]
pub struct Cli {
    /// the amino-acid sequence to submit, e.g. MKVLAAGIVG
    #[arg(required_unless_present = "fasta", conflicts_with = "fasta")]
    pub sequence: Option<String>,

    /// read the sequence from the first record of a FASTA file instead
    #[arg(long)]
    pub fasta: Option<String>,

    /// seconds to wait before each poll of the result page
    #[arg(short, long, value_parser = |x: &str| parse_seconds(x), default_value = "2")]
    pub wait: Duration,

    /// give up after polling for this many seconds. 0 polls until the job completes
    /// (or Ctrl-C is pressed)
    #[arg(long, value_parser = |x: &str| parse_seconds(x), default_value = "600", verbatim_doc_comment)]
    pub max_wait: Duration,

    /// give up after this many polls
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// failed polls to tolerate in a row before giving up
    #[arg(long, default_value_t = 0)]
    pub fetch_retries: u32,

    /// poll once straight away, before the first wait
    #[arg(long, action)]
    pub eager: bool,

    /// the submission endpoint of the prediction server
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// timeout for each HTTP request, in seconds
    #[arg(long, value_parser = |x: &str| parse_seconds(x), default_value = "60")]
    pub timeout: Duration,

    /// output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// the output file, standard output if not given
    #[arg(short)]
    pub output: Option<String>,
}

impl Cli {
    pub fn client_config(&self) -> ClientConfig {
        let max_wait = (!self.max_wait.is_zero()).then_some(self.max_wait);

        ClientConfig::default()
            .with_endpoint(self.endpoint.clone())
            .with_wait(self.wait)
            .with_max_wait(max_wait)
            .with_max_attempts(self.max_attempts)
            .with_fetch_retries(self.fetch_retries)
            .with_eager_first_fetch(self.eager)
            .with_request_timeout(self.timeout)
    }
}

/// Error type for parsing a number of seconds.
#[derive(Debug)]
pub struct ParseSecondsErr(String);

impl std::fmt::Display for ParseSecondsErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid duration: {}", self.0)
    }
}

impl std::error::Error for ParseSecondsErr {}

/// Parses a non-negative, possibly fractional, number of seconds.
fn parse_seconds(arg: &str) -> Result<Duration, ParseSecondsErr> {
    let secs = arg.trim().parse::<f64>().map_err(|_| {
        ParseSecondsErr(indoc::formatdoc! {"
            expected a number of seconds, got '{arg}'. For example:
              --wait 2
              --wait 0.5
            "})
    })?;

    Duration::try_from_secs_f64(secs)
        .map_err(|_| ParseSecondsErr(format!("'{arg}' is not a non-negative number of seconds")))
}
